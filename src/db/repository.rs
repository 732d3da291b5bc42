use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{ActivityEntry, Article, Category, NewArticle, NewsFilter, StoreStats, Subscriber};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Article operations

    /// Insert an article unless it is already stored.
    ///
    /// Returns `false` when the article was a duplicate: same URL when the
    /// candidate has one, same (title, source) pair otherwise. Duplicates
    /// are a normal outcome, not an error. The URL check rides on the
    /// UNIQUE constraint so existence-check and insert are one statement.
    pub async fn add_article(&self, article: NewArticle) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                if article.url.is_none() {
                    let exists: i64 = conn.query_row(
                        "SELECT EXISTS(SELECT 1 FROM news WHERE title = ?1 AND source = ?2)",
                        params![article.title, article.source.name()],
                        |row| row.get(0),
                    )?;
                    if exists != 0 {
                        return Ok(false);
                    }
                }

                let changed = conn.execute(
                    r#"INSERT INTO news (title, content, url, source, category, published_date)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(url) DO NOTHING"#,
                    params![
                        article.title,
                        article.content,
                        article.url,
                        article.source.name(),
                        article.category.as_str(),
                        article.published_date,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    /// Query stored articles, newest first.
    pub async fn list_news(&self, filter: NewsFilter, limit: Option<u32>) -> Result<Vec<Article>> {
        let (where_clause, param): (&str, Option<String>) = match filter {
            NewsFilter::All => ("", None),
            NewsFilter::Unviewed => (" WHERE viewed = 0", None),
            NewsFilter::Viewed => (" WHERE viewed = 1", None),
            NewsFilter::Unsent => (" WHERE sent_to_telegram = 0", None),
            NewsFilter::Sent => (" WHERE sent_to_telegram = 1", None),
            NewsFilter::Category(c) => (" WHERE category = ?1", Some(c.as_str().to_string())),
            NewsFilter::Source(s) => (" WHERE source = ?1", Some(s.name().to_string())),
        };

        // id breaks ties within the same created_at second
        let mut sql = format!(
            "SELECT id, title, content, url, source, category, location, published_date, \
             created_at, sent_to_telegram, viewed \
             FROM news{where_clause} ORDER BY created_at DESC, id DESC"
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let articles = match &param {
                    Some(p) => stmt
                        .query_map(params![p], article_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?,
                    None => stmt
                        .query_map([], article_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?,
                };
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Mark an article as seen by a user. Idempotent and monotonic; returns
    /// `false` only when the id does not exist.
    pub async fn mark_viewed(&self, id: i64) -> Result<bool> {
        let found = self
            .conn
            .call(move |conn| {
                let changed =
                    conn.execute("UPDATE news SET viewed = 1 WHERE id = ?1", params![id])?;
                Ok(changed > 0)
            })
            .await?;
        Ok(found)
    }

    /// Mark an article as delivered by the distribution layer. Idempotent
    /// and monotonic; returns `false` only when the id does not exist.
    pub async fn mark_sent(&self, id: i64) -> Result<bool> {
        let found = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE news SET sent_to_telegram = 1 WHERE id = ?1",
                    params![id],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(found)
    }

    /// Aggregate counters, computed on every call.
    pub async fn stats(&self) -> Result<StoreStats> {
        let stats = self
            .conn
            .call(|conn| {
                let total: i64 = conn.query_row("SELECT COUNT(*) FROM news", [], |r| r.get(0))?;

                let mut stmt = conn.prepare(
                    "SELECT category, COUNT(*) FROM news WHERE category IS NOT NULL \
                     GROUP BY category ORDER BY COUNT(*) DESC",
                )?;
                let per_category = stmt
                    .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let mut stmt = conn.prepare(
                    "SELECT source, COUNT(*) FROM news GROUP BY source ORDER BY COUNT(*) DESC",
                )?;
                let per_source = stmt
                    .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let unviewed: i64 =
                    conn.query_row("SELECT COUNT(*) FROM news WHERE viewed = 0", [], |r| {
                        r.get(0)
                    })?;
                let unsent: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM news WHERE sent_to_telegram = 0",
                    [],
                    |r| r.get(0),
                )?;

                Ok(StoreStats {
                    total,
                    per_category,
                    per_source,
                    unviewed,
                    unsent,
                })
            })
            .await?;
        Ok(stats)
    }

    // Activity log

    /// Append to the audit trail. Never read by the pipeline itself.
    pub async fn log_activity(&self, activity: String, details: Option<String>) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO activity_log (activity, details) VALUES (?1, ?2)",
                    params![activity, details],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn recent_activities(&self, limit: u32) -> Result<Vec<ActivityEntry>> {
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT activity, details, timestamp FROM activity_log \
                     ORDER BY timestamp DESC, id DESC LIMIT ?1",
                )?;
                let entries = stmt
                    .query_map(params![limit], |row| {
                        Ok(ActivityEntry {
                            activity: row.get(0)?,
                            details: row.get(1)?,
                            timestamp: row
                                .get::<_, String>(2)
                                .ok()
                                .and_then(|s| parse_datetime(&s))
                                .unwrap_or_else(Utc::now),
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    // Subscriber registry (owned by the distribution layer)

    pub async fn upsert_subscriber(
        &self,
        user_id: String,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO active_users (user_id, username, first_name, last_name)
                       VALUES (?1, ?2, ?3, ?4)
                       ON CONFLICT(user_id) DO UPDATE SET
                           username = excluded.username,
                           first_name = excluded.first_name,
                           last_name = excluded.last_name,
                           is_active = 1,
                           last_activity = datetime('now')"#,
                    params![user_id, username, first_name, last_name],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn active_subscribers(&self) -> Result<Vec<Subscriber>> {
        let subscribers = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id, username, first_name, last_name, is_active \
                     FROM active_users WHERE is_active = 1",
                )?;
                let subscribers = stmt
                    .query_map([], |row| {
                        Ok(Subscriber {
                            user_id: row.get(0)?,
                            username: row.get(1)?,
                            first_name: row.get(2)?,
                            last_name: row.get(3)?,
                            is_active: row.get::<_, i64>(4)? != 0,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(subscribers)
            })
            .await?;
        Ok(subscribers)
    }

    /// Stop notifying a user. Returns `false` when the user is unknown.
    pub async fn deactivate_subscriber(&self, user_id: String) -> Result<bool> {
        let found = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE active_users SET is_active = 0 WHERE user_id = ?1",
                    params![user_id],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(found)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        url: row.get(3)?,
        source: row.get(4)?,
        category: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| Category::parse(&s))
            .unwrap_or(Category::Geral),
        location: row.get(6)?,
        published_date: row.get(7)?,
        created_at: row
            .get::<_, String>(8)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        sent_to_telegram: row.get::<_, i64>(9)? != 0,
        viewed: row.get::<_, i64>(10)? != 0,
    })
}
