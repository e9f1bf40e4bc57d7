//! `matchstat`: batch driver for match-statistics ingestion.
//!
//! Reads `matchstat.toml` (or the path given with `--config`), layered under
//! `MATCHSTAT_*` environment variables, and opens the SQLite store named by
//! `database_path`.
//!
//! ```
//! matchstat ingest --season 2022 data/match_414d2972.html
//! matchstat register --kind team --name "X FC" --source-id 18bb7c10
//! matchstat merge --keep <uuid> --absorb <uuid>
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use matchstat_core::{
  identity::{EntityKind, NewEntity},
  ids::{MatchId, SeasonId, SourceId},
  schema::Era,
  store::MatchStore,
};
use matchstat_ingest::{
  IngestConfig, Pipeline,
  batch::{self, BatchOptions, FileReport},
};
use matchstat_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Match statistics ingestion")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "matchstat.toml")]
  config: PathBuf,

  /// SQLite database; overrides `database_path` from the config.
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest match documents and print one JSON report per file.
  Ingest {
    /// Season every document belongs to, e.g. 2022.
    #[arg(long)]
    season: SeasonId,

    /// Expected table era (`legacy` or `modern`).
    #[arg(long)]
    era: Option<Era>,

    /// Match id, when it cannot be derived from the file name.
    #[arg(long)]
    match_id: Option<MatchId>,

    /// Register rows that match no known player or team as new entities.
    #[arg(long)]
    accept_unresolved: bool,

    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
  },

  /// Register a new player or team.
  Register {
    #[arg(long)]
    kind: EntityKind,

    #[arg(long)]
    name: String,

    #[arg(long)]
    source_id: Option<SourceId>,

    /// Team the player belongs to (requires --season).
    #[arg(long, requires = "season")]
    team: Option<Uuid>,

    #[arg(long)]
    season: Option<SeasonId>,
  },

  /// Fold one identity into another.
  Merge {
    #[arg(long)]
    keep: Uuid,

    #[arg(long)]
    absorb: Uuid,
  },
}

fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = IngestConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;
  if let Some(path) = cli.database {
    cfg.database_path = path;
  }

  let store = SqliteStore::open(&cfg.database_path)
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;

  match cli.command {
    Command::Ingest { season, era, match_id, accept_unresolved, files } => {
      if match_id.is_some() && files.len() > 1 {
        bail!("--match-id can only be used with a single file");
      }
      let pipeline = Pipeline::new(cfg, store).context("failed to build pipeline")?;
      let opts = BatchOptions { season, era, match_id, accept_unresolved };

      let mut failed = 0;
      for path in &files {
        let report = batch::ingest_file(&pipeline, path, &opts);
        if matches!(report, FileReport::Failed { .. }) {
          failed += 1;
        }
        println!("{}", serde_json::to_string(&report).context("failed to encode report")?);
      }
      tracing::info!(files = files.len(), failed, "batch finished");
    }

    Command::Register { kind, name, source_id, team, season } => {
      let mut input = NewEntity::new(kind, name);
      if let Some(id) = source_id {
        input = input.with_source_id(id);
      }
      if let (Some(team), Some(season)) = (team, season) {
        input = input.with_affiliation(team, season);
      }
      let entity = store.register_entity(input).context("failed to register entity")?;
      println!("{}", serde_json::to_string(&entity)?);
    }

    Command::Merge { keep, absorb } => {
      let summary = store
        .merge_identities(keep, absorb)
        .with_context(|| format!("failed to merge {absorb} into {keep}"))?;
      println!("{}", serde_json::to_string(&summary)?);
    }
  }

  Ok(())
}
