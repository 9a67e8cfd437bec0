//! Database row types. These map directly to SQLite rows and are kept apart
//! from the bookscape-types API models so the db layer stays independent.

use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password: String,
}

#[derive(Debug)]
pub struct BookingRow {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub id_type: String,
    pub checkin: String,
    pub checkout: String,
    pub guests: i64,
    pub total_amount: f64,
    pub status: String,
    pub payment_status: String,
    pub booking_date: String,
}

/// A newsletter subscriber. The same shape is stored durably and in the
/// in-memory fallback list.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberRow {
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriberRow {
    pub fn new(email: &str, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            email: email.to_string(),
            name,
            is_active: true,
            subscribed_at: now,
            updated_at: now,
        }
    }
}
