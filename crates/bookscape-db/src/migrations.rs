use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Database: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE bookings (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                name            TEXT NOT NULL,
                email           TEXT NOT NULL,
                phone           TEXT NOT NULL,
                id_type         TEXT NOT NULL
                    CHECK (id_type IN ('Aadhar', 'Passport', 'Driving License', 'PAN')),
                id_number       TEXT NOT NULL,
                country         TEXT NOT NULL,
                address         TEXT NOT NULL,
                checkin         TEXT NOT NULL,
                checkout        TEXT NOT NULL,
                guests          INTEGER NOT NULL CHECK (guests >= 1),
                special_request TEXT,
                total_amount    REAL NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'confirmed', 'cancelled', 'completed')),
                payment_status  TEXT NOT NULL DEFAULT 'pending'
                    CHECK (payment_status IN ('pending', 'paid', 'failed')),
                booking_date    TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_bookings_user ON bookings(user_id);

            CREATE TABLE contacts (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL,
                message     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE subscribers (
                email           TEXT PRIMARY KEY,
                name            TEXT,
                is_active       INTEGER NOT NULL DEFAULT 1,
                subscribed_at   TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        info!("Database migrations complete");
    }

    Ok(())
}
