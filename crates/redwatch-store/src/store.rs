use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::*;

/// Typed operations over the pipeline's SQLite database.
///
/// Thread-safe: wraps the connection in a Mutex. Scheduled jobs open
/// their own `Store` so a long sweep never contends with the pipeline's
/// handle.
pub struct Store {
    pub(crate) conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // --- tenants -----------------------------------------------------------

    pub fn create_tenant(
        &self,
        email: Option<&str>,
        poll_interval_minutes: i64,
    ) -> Result<Tenant> {
        let db = self.conn.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        db.execute(
            "INSERT INTO tenants (id, email, poll_interval_minutes, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, email, poll_interval_minutes, now.to_rfc3339()],
        )?;
        Ok(Tenant {
            id,
            email: email.map(str::to_string),
            poll_interval_minutes,
            created_at: now,
        })
    }

    /// Cascades to the tenant's communities, rules, endpoints, and matches.
    pub fn delete_tenant(&self, id: &str) -> Result<()> {
        let db = self.conn.lock().unwrap();
        let n = db.execute("DELETE FROM tenants WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(StoreError::NotFound {
                what: "tenant",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn tenant_email(&self, id: &str) -> Result<Option<String>> {
        let db = self.conn.lock().unwrap();
        let email = db
            .query_row("SELECT email FROM tenants WHERE id = ?1", [id], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(email.flatten())
    }

    // --- monitored communities ---------------------------------------------

    pub fn add_community(&self, tenant_id: &str, name: &str) -> Result<MonitoredCommunity> {
        let db = self.conn.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        db.execute(
            "INSERT INTO monitored_communities
             (id, tenant_id, name, status, include_media_posts, dedupe_crossposts,
              filter_bots, last_polled_at, created_at)
             VALUES (?1, ?2, ?3, 'active', 1, 1, 0, NULL, ?4)",
            params![id, tenant_id, name, now.to_rfc3339()],
        )?;
        Ok(MonitoredCommunity {
            id,
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            status: CommunityStatus::Active,
            include_media_posts: true,
            dedupe_crossposts: true,
            filter_bots: false,
            last_polled_at: None,
            created_at: now,
        })
    }

    pub fn set_community_status(&self, id: &str, status: CommunityStatus) -> Result<()> {
        let db = self.conn.lock().unwrap();
        let n = db.execute(
            "UPDATE monitored_communities SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                what: "monitored community",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Distinct names of communities with at least one active monitor,
    /// across all tenants. One upstream fetch serves them all.
    pub fn distinct_active_communities(&self) -> Result<Vec<String>> {
        let db = self.conn.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT DISTINCT name FROM monitored_communities
             WHERE status = 'active' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(names)
    }

    /// Tenant ids actively monitoring the given community.
    pub fn active_tenant_ids_for_community(&self, name: &str) -> Result<Vec<String>> {
        let db = self.conn.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT DISTINCT tenant_id FROM monitored_communities
             WHERE name = ?1 AND status = 'active'",
        )?;
        let ids = stmt
            .query_map([name], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    pub fn mark_community_polled(&self, name: &str, at: DateTime<Utc>) -> Result<()> {
        let db = self.conn.lock().unwrap();
        db.execute(
            "UPDATE monitored_communities SET last_polled_at = ?1
             WHERE name = ?2 AND status = 'active'",
            params![at.to_rfc3339(), name],
        )?;
        Ok(())
    }

    // --- keyword rules -----------------------------------------------------

    pub fn add_rule(&self, rule: NewRule) -> Result<KeywordRule> {
        let db = self.conn.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        db.execute(
            "INSERT INTO keyword_rules
             (id, tenant_id, phrases, exclusions, proximity_window, require_order,
              use_stemming, exclusion_scope, is_active, silenced_until, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, NULL, ?9)",
            params![
                id,
                rule.tenant_id,
                serde_json::to_string(&rule.phrases)?,
                serde_json::to_string(&rule.exclusions)?,
                rule.proximity_window,
                rule.require_order,
                rule.use_stemming,
                rule.exclusion_scope.to_string(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(KeywordRule {
            id,
            tenant_id: rule.tenant_id,
            phrases: rule.phrases,
            exclusions: rule.exclusions,
            proximity_window: rule.proximity_window,
            require_order: rule.require_order,
            use_stemming: rule.use_stemming,
            exclusion_scope: rule.exclusion_scope,
            is_active: true,
            silenced_until: None,
            created_at: now,
        })
    }

    /// Soft delete.
    pub fn deactivate_rule(&self, id: &str) -> Result<()> {
        let db = self.conn.lock().unwrap();
        let n = db.execute("UPDATE keyword_rules SET is_active = 0 WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(StoreError::NotFound {
                what: "keyword rule",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Set (or clear with `None`) the silence window on a rule.
    pub fn silence_rule(&self, id: &str, until: Option<DateTime<Utc>>) -> Result<()> {
        let db = self.conn.lock().unwrap();
        let n = db.execute(
            "UPDATE keyword_rules SET silenced_until = ?1 WHERE id = ?2",
            params![until.map(|dt| dt.to_rfc3339()), id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                what: "keyword rule",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Rules the matcher should run for a tenant right now: active and
    /// not silenced into the future.
    pub fn active_rules(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<Vec<KeywordRule>> {
        let db = self.conn.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, tenant_id, phrases, exclusions, proximity_window, require_order,
                    use_stemming, exclusion_scope, is_active, silenced_until, created_at
             FROM keyword_rules
             WHERE tenant_id = ?1 AND is_active = 1
               AND (silenced_until IS NULL OR silenced_until <= ?2)
             ORDER BY created_at",
        )?;
        let rules = stmt
            .query_map(params![tenant_id, now.to_rfc3339()], row_to_rule)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rules)
    }

    // --- webhook endpoints -------------------------------------------------

    pub fn add_webhook(
        &self,
        tenant_id: &str,
        url: &str,
        is_primary: bool,
    ) -> Result<WebhookEndpoint> {
        let db = self.conn.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        db.execute(
            "INSERT INTO webhook_endpoints
             (id, tenant_id, url, is_primary, is_active, last_tested_at, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, NULL, ?5)",
            params![id, tenant_id, url, is_primary, now.to_rfc3339()],
        )?;
        Ok(WebhookEndpoint {
            id,
            tenant_id: tenant_id.to_string(),
            url: url.to_string(),
            is_primary,
            is_active: true,
            last_tested_at: None,
            created_at: now,
        })
    }

    pub fn set_webhook_active(&self, id: &str, active: bool) -> Result<()> {
        let db = self.conn.lock().unwrap();
        let n = db.execute(
            "UPDATE webhook_endpoints SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                what: "webhook endpoint",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Outbound URL for a tenant: the active primary endpoint when one
    /// exists, otherwise any active endpoint.
    pub fn active_webhook_url(&self, tenant_id: &str) -> Result<Option<String>> {
        let db = self.conn.lock().unwrap();
        let url = db
            .query_row(
                "SELECT url FROM webhook_endpoints
                 WHERE tenant_id = ?1 AND is_active = 1
                 ORDER BY is_primary DESC, created_at
                 LIMIT 1",
                [tenant_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(url)
    }

    // --- content items -----------------------------------------------------

    pub fn digest_exists(&self, digest: &str) -> Result<bool> {
        let db = self.conn.lock().unwrap();
        let found = db
            .query_row(
                "SELECT 1 FROM content_items WHERE digest = ?1",
                [digest],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn source_id_exists(&self, source_id: &str) -> Result<bool> {
        let db = self.conn.lock().unwrap();
        let found = db
            .query_row(
                "SELECT 1 FROM content_items WHERE source_id = ?1",
                [source_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Persist a batch of new items in one transaction. Rows colliding
    /// on `source_id` or `digest` are skipped by the unique guards and
    /// excluded from the returned list.
    pub fn insert_content_batch(&self, items: Vec<NewContentItem>) -> Result<Vec<ContentItem>> {
        let mut db = self.conn.lock().unwrap();
        let tx = db.transaction()?;
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            let id = Uuid::new_v4().to_string();
            let fetched_at = Utc::now();
            let n = tx.execute(
                "INSERT OR IGNORE INTO content_items
                 (id, source_id, community, kind, title, body, author,
                  normalized_text, digest, source_created_at, fetched_at, is_deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
                params![
                    id,
                    item.source_id,
                    item.community,
                    item.kind.to_string(),
                    item.title,
                    item.body,
                    item.author,
                    item.normalized_text,
                    item.digest,
                    item.source_created_at.to_rfc3339(),
                    fetched_at.to_rfc3339(),
                ],
            )?;
            if n == 0 {
                debug!(source_id = %item.source_id, "duplicate content skipped by unique guard");
                continue;
            }
            created.push(ContentItem {
                id,
                source_id: item.source_id,
                community: item.community,
                kind: item.kind,
                title: item.title,
                body: item.body,
                author: item.author,
                normalized_text: item.normalized_text,
                digest: item.digest,
                source_created_at: item.source_created_at,
                fetched_at,
                is_deleted: false,
            });
        }

        tx.commit()?;
        Ok(created)
    }

    /// Flip `is_deleted` when the upstream copy disappears. Returns
    /// whether a row was found.
    pub fn mark_content_deleted(&self, source_id: &str) -> Result<bool> {
        let db = self.conn.lock().unwrap();
        let n = db.execute(
            "UPDATE content_items SET is_deleted = 1 WHERE source_id = ?1",
            [source_id],
        )?;
        Ok(n > 0)
    }

    // --- matches -----------------------------------------------------------

    /// Persist match rows in one transaction, all `pending`.
    pub fn insert_matches(&self, rows: Vec<NewMatch>) -> Result<Vec<MatchRecord>> {
        let mut db = self.conn.lock().unwrap();
        let tx = db.transaction()?;
        let mut created = Vec::with_capacity(rows.len());

        for m in rows {
            let id = Uuid::new_v4().to_string();
            let now = Utc::now();
            tx.execute(
                "INSERT INTO matches
                 (id, tenant_id, rule_id, content_id, kind, community, matched_phrase,
                  also_matched, snippet, proximity_score, url, author, is_deleted,
                  detected_at, alert_sent_at, alert_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                         ?14, NULL, 'pending', ?15)",
                params![
                    id,
                    m.tenant_id,
                    m.rule_id,
                    m.content_id,
                    m.kind.to_string(),
                    m.community,
                    m.matched_phrase,
                    serde_json::to_string(&m.also_matched)?,
                    m.snippet,
                    m.proximity_score,
                    m.url,
                    m.author,
                    m.is_deleted,
                    m.detected_at.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            created.push(MatchRecord {
                id,
                tenant_id: m.tenant_id,
                rule_id: m.rule_id,
                content_id: m.content_id,
                kind: m.kind,
                community: m.community,
                matched_phrase: m.matched_phrase,
                also_matched: m.also_matched,
                snippet: m.snippet,
                proximity_score: m.proximity_score,
                url: m.url,
                author: m.author,
                is_deleted: m.is_deleted,
                detected_at: m.detected_at,
                alert_sent_at: None,
                alert_status: AlertStatus::Pending,
                created_at: now,
            });
        }

        tx.commit()?;
        Ok(created)
    }

    /// All pending matches, oldest detection first — the dispatch order.
    pub fn pending_matches(&self) -> Result<Vec<MatchRecord>> {
        let db = self.conn.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, tenant_id, rule_id, content_id, kind, community, matched_phrase,
                    also_matched, snippet, proximity_score, url, author, is_deleted,
                    detected_at, alert_sent_at, alert_status, created_at
             FROM matches
             WHERE alert_status = 'pending'
             ORDER BY detected_at",
        )?;
        let matches = stmt
            .query_map([], row_to_match)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(matches)
    }

    pub fn get_match(&self, id: &str) -> Result<MatchRecord> {
        let db = self.conn.lock().unwrap();
        db.query_row(
            "SELECT id, tenant_id, rule_id, content_id, kind, community, matched_phrase,
                    also_matched, snippet, proximity_score, url, author, is_deleted,
                    detected_at, alert_sent_at, alert_status, created_at
             FROM matches WHERE id = ?1",
            [id],
            row_to_match,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound {
            what: "match",
            id: id.to_string(),
        })
    }

    /// Apply a dispatch round's outcomes in one transaction: sent rows
    /// get `sent` + the delivery timestamp, failed rows get `failed`
    /// and keep a null `alert_sent_at`.
    pub fn finalize_alerts(
        &self,
        sent: &[String],
        failed: &[String],
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut db = self.conn.lock().unwrap();
        let tx = db.transaction()?;
        let sent_at_str = sent_at.to_rfc3339();

        for id in sent {
            tx.execute(
                "UPDATE matches SET alert_status = 'sent', alert_sent_at = ?1 WHERE id = ?2",
                params![sent_at_str, id],
            )?;
        }
        for id in failed {
            tx.execute(
                "UPDATE matches SET alert_status = 'failed' WHERE id = ?1",
                [id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

// --- row mappers -----------------------------------------------------------

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<KeywordRule> {
    let phrases_json: String = row.get(2)?;
    let exclusions_json: String = row.get(3)?;
    let scope_str: String = row.get(7)?;
    Ok(KeywordRule {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        phrases: serde_json::from_str(&phrases_json).unwrap_or_default(),
        exclusions: serde_json::from_str(&exclusions_json).unwrap_or_default(),
        proximity_window: row.get(4)?,
        require_order: row.get(5)?,
        use_stemming: row.get(6)?,
        exclusion_scope: scope_str.parse().unwrap_or_default(),
        is_active: row.get(8)?,
        silenced_until: row.get::<_, Option<String>>(9)?.map(|s| parse_ts(&s)),
        created_at: parse_ts(&row.get::<_, String>(10)?),
    })
}

fn row_to_match(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchRecord> {
    let kind_str: String = row.get(4)?;
    let also_json: String = row.get(7)?;
    let status_str: String = row.get(15)?;
    Ok(MatchRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        rule_id: row.get(2)?,
        content_id: row.get(3)?,
        kind: kind_str.parse().unwrap_or(ContentKind::Post),
        community: row.get(5)?,
        matched_phrase: row.get(6)?,
        also_matched: serde_json::from_str(&also_json).unwrap_or_default(),
        snippet: row.get(8)?,
        proximity_score: row.get(9)?,
        url: row.get(10)?,
        author: row.get(11)?,
        is_deleted: row.get(12)?,
        detected_at: parse_ts(&row.get::<_, String>(13)?),
        alert_sent_at: row.get::<_, Option<String>>(14)?.map(|s| parse_ts(&s)),
        alert_status: status_str.parse().unwrap_or(AlertStatus::Pending),
        created_at: parse_ts(&row.get::<_, String>(16)?),
    })
}
