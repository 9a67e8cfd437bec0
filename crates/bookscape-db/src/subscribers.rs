use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::unique_violation;
use crate::models::SubscriberRow;
use crate::{Database, DbError, Result};

/// Storage for newsletter subscribers. Implemented durably by `Database` and
/// in memory by `MemorySubscriberStore`; emails are unique within one store.
pub trait SubscriberStore: Send + Sync {
    fn find_subscriber(&self, email: &str) -> Result<Option<SubscriberRow>>;

    /// Insert a new subscriber. Fails with `DbError::Duplicate` if the email
    /// is already present.
    fn insert_subscriber(&self, subscriber: &SubscriberRow) -> Result<()>;

    /// Overwrite name, active flag and `updated_at` of an existing subscriber.
    fn update_subscriber(&self, subscriber: &SubscriberRow) -> Result<()>;

    /// Atomically insert unless the email is present. Returns whether the
    /// subscriber was inserted.
    fn insert_subscriber_if_absent(&self, subscriber: SubscriberRow) -> Result<bool>;

    fn subscriber_count(&self) -> Result<usize>;
}

impl SubscriberStore for Database {
    fn find_subscriber(&self, email: &str) -> Result<Option<SubscriberRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT email, name, is_active, subscribed_at, updated_at
                     FROM subscribers WHERE email = ?1",
                    [email],
                    RawSubscriber::from_row,
                )
                .optional()?;
            row.map(RawSubscriber::decode).transpose()
        })
    }

    fn insert_subscriber(&self, subscriber: &SubscriberRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO subscribers (email, name, is_active, subscribed_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    subscriber.email,
                    subscriber.name,
                    subscriber.is_active,
                    subscriber.subscribed_at.to_rfc3339(),
                    subscriber.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| unique_violation(e, "subscriber"))?;
            Ok(())
        })
    }

    fn update_subscriber(&self, subscriber: &SubscriberRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE subscribers SET name = ?2, is_active = ?3, updated_at = ?4 WHERE email = ?1",
                params![
                    subscriber.email,
                    subscriber.name,
                    subscriber.is_active,
                    subscriber.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn insert_subscriber_if_absent(&self, subscriber: SubscriberRow) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO subscribers (email, name, is_active, subscribed_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    subscriber.email,
                    subscriber.name,
                    subscriber.is_active,
                    subscriber.subscribed_at.to_rfc3339(),
                    subscriber.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(inserted == 1)
        })
    }

    fn subscriber_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM subscribers", [], |r| r.get(0))?;
            Ok(n as usize)
        })
    }
}

struct RawSubscriber {
    email: String,
    name: Option<String>,
    is_active: bool,
    subscribed_at: String,
    updated_at: String,
}

impl RawSubscriber {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            email: row.get(0)?,
            name: row.get(1)?,
            is_active: row.get(2)?,
            subscribed_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn decode(self) -> Result<SubscriberRow> {
        Ok(SubscriberRow {
            subscribed_at: parse_timestamp(&self.subscribed_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            email: self.email,
            name: self.name,
            is_active: self.is_active,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("timestamp {s:?}: {e}")))
}
