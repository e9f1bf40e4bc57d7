//! SQL schema for the matchstat SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entities (
    entity_id    TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,   -- 'player' | 'team'
    display_name TEXT NOT NULL,
    name_key     TEXT NOT NULL,   -- trimmed, lowercased display_name
    created_at   TEXT NOT NULL
);

-- Many source-site ids may point at one entity.
CREATE TABLE IF NOT EXISTS identity_mappings (
    source_id   TEXT PRIMARY KEY,
    entity_id   TEXT NOT NULL REFERENCES entities(entity_id),
    recorded_at TEXT NOT NULL
);

-- Player-on-team-in-season; drives the name fallback of identity lookup.
CREATE TABLE IF NOT EXISTS affiliations (
    entity_id TEXT    NOT NULL REFERENCES entities(entity_id),
    team_id   TEXT    NOT NULL REFERENCES entities(entity_id),
    season_id INTEGER NOT NULL,
    PRIMARY KEY (entity_id, team_id, season_id)
);

CREATE TABLE IF NOT EXISTS matches (
    match_id  TEXT PRIMARY KEY,   -- 8 lowercase hex characters
    season_id INTEGER NOT NULL
);

-- At most one record per (match, entity).
CREATE TABLE IF NOT EXISTS stat_records (
    record_id  TEXT PRIMARY KEY,
    match_id   TEXT    NOT NULL REFERENCES matches(match_id),
    entity_id  TEXT    NOT NULL REFERENCES entities(entity_id),
    season_id  INTEGER NOT NULL,
    created_at TEXT    NOT NULL,
    updated_at TEXT    NOT NULL,
    UNIQUE (match_id, entity_id)
);

CREATE TABLE IF NOT EXISTS stat_values (
    record_id TEXT NOT NULL REFERENCES stat_records(record_id),
    field     TEXT NOT NULL,   -- canonical field name
    state     TEXT NOT NULL,   -- 'measured' | 'blank' | 'not_tracked' | 'coercion_failed'
    value     TEXT,            -- JSON scalar; NULL unless measured
    PRIMARY KEY (record_id, field)
);

CREATE INDEX IF NOT EXISTS entities_name_idx        ON entities(kind, name_key);
CREATE INDEX IF NOT EXISTS mappings_entity_idx      ON identity_mappings(entity_id);
CREATE INDEX IF NOT EXISTS affiliations_team_idx    ON affiliations(team_id, season_id);
CREATE INDEX IF NOT EXISTS stat_records_entity_idx  ON stat_records(entity_id);

PRAGMA user_version = 1;
";
