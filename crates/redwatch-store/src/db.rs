use rusqlite::Connection;

use crate::error::Result;

/// Initialise the pipeline schema in `conn`. Safe to call on every
/// startup (idempotent).
///
/// `source_id` and `digest` get their lookup indexes from their UNIQUE
/// constraints; the explicit indexes below back the hot dispatcher and
/// fan-out queries.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS tenants (
            id                     TEXT    NOT NULL PRIMARY KEY,
            email                  TEXT    UNIQUE,
            poll_interval_minutes  INTEGER NOT NULL DEFAULT 60,
            created_at             TEXT    NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS monitored_communities (
            id                   TEXT    NOT NULL PRIMARY KEY,
            tenant_id            TEXT    NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            name                 TEXT    NOT NULL,
            status               TEXT    NOT NULL DEFAULT 'active',
            include_media_posts  INTEGER NOT NULL DEFAULT 1,
            dedupe_crossposts    INTEGER NOT NULL DEFAULT 1,
            filter_bots          INTEGER NOT NULL DEFAULT 0,
            last_polled_at       TEXT,
            created_at           TEXT    NOT NULL,
            UNIQUE (tenant_id, name)
        ) STRICT;
        CREATE INDEX IF NOT EXISTS idx_communities_name_status
            ON monitored_communities (name, status);

        CREATE TABLE IF NOT EXISTS keyword_rules (
            id                TEXT    NOT NULL PRIMARY KEY,
            tenant_id         TEXT    NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            phrases           TEXT    NOT NULL,               -- JSON array of phrase strings
            exclusions        TEXT    NOT NULL DEFAULT '[]',  -- JSON array
            proximity_window  INTEGER NOT NULL DEFAULT 15,
            require_order     INTEGER NOT NULL DEFAULT 0,
            use_stemming      INTEGER NOT NULL DEFAULT 0,
            exclusion_scope   TEXT    NOT NULL DEFAULT 'anywhere',
            is_active         INTEGER NOT NULL DEFAULT 1,
            silenced_until    TEXT,
            created_at        TEXT    NOT NULL
        ) STRICT;
        CREATE INDEX IF NOT EXISTS idx_rules_tenant ON keyword_rules (tenant_id);

        CREATE TABLE IF NOT EXISTS webhook_endpoints (
            id              TEXT    NOT NULL PRIMARY KEY,
            tenant_id       TEXT    NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            url             TEXT    NOT NULL,
            is_primary      INTEGER NOT NULL DEFAULT 1,
            is_active       INTEGER NOT NULL DEFAULT 1,
            last_tested_at  TEXT,
            created_at      TEXT    NOT NULL
        ) STRICT;
        CREATE INDEX IF NOT EXISTS idx_webhooks_tenant ON webhook_endpoints (tenant_id);

        CREATE TABLE IF NOT EXISTS content_items (
            id                 TEXT    NOT NULL PRIMARY KEY,
            source_id          TEXT    NOT NULL UNIQUE,
            community          TEXT    NOT NULL,
            kind               TEXT    NOT NULL,
            title              TEXT,
            body               TEXT    NOT NULL,
            author             TEXT    NOT NULL,
            normalized_text    TEXT    NOT NULL,
            digest             TEXT    NOT NULL UNIQUE,
            source_created_at  TEXT    NOT NULL,
            fetched_at         TEXT    NOT NULL,
            is_deleted         INTEGER NOT NULL DEFAULT 0
        ) STRICT;
        CREATE INDEX IF NOT EXISTS idx_content_fetched_at ON content_items (fetched_at);

        CREATE TABLE IF NOT EXISTS matches (
            id               TEXT    NOT NULL PRIMARY KEY,
            tenant_id        TEXT    NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            rule_id          TEXT    NOT NULL REFERENCES keyword_rules(id) ON DELETE CASCADE,
            content_id       TEXT    NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
            kind             TEXT    NOT NULL,
            community        TEXT    NOT NULL,
            matched_phrase   TEXT    NOT NULL,
            also_matched     TEXT    NOT NULL DEFAULT '[]',   -- JSON array
            snippet          TEXT    NOT NULL,
            proximity_score  REAL,
            url              TEXT    NOT NULL,
            author           TEXT    NOT NULL,
            is_deleted       INTEGER NOT NULL DEFAULT 0,
            detected_at      TEXT    NOT NULL,
            alert_sent_at    TEXT,
            alert_status     TEXT    NOT NULL DEFAULT 'pending',
            created_at       TEXT    NOT NULL
        ) STRICT;
        CREATE INDEX IF NOT EXISTS idx_matches_alert_status ON matches (alert_status);
        CREATE INDEX IF NOT EXISTS idx_matches_community    ON matches (community);
        CREATE INDEX IF NOT EXISTS idx_matches_tenant       ON matches (tenant_id);
        ",
    )?;
    Ok(())
}
