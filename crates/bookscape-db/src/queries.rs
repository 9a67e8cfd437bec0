use bookscape_types::models::Booking;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::unique_violation;
use crate::models::{BookingRow, UserRow};
use crate::{Database, Result};

impl Database {
    // -- Users --

    /// Insert a user. A taken email comes back as `DbError::Duplicate("email")`.
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO users (id, name, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id, name, email, password_hash, now],
            )
            .map_err(|e| unique_violation(e, "email"))?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Bookings --

    pub fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.with_conn(|conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO bookings (
                    id, user_id, name, email, phone, id_type, id_number, country, address,
                    checkin, checkout, guests, special_request, total_amount,
                    status, payment_status, booking_date, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)",
                params![
                    booking.id.to_string(),
                    booking.user_id.to_string(),
                    booking.name,
                    booking.email,
                    booking.phone,
                    booking.id_type.as_str(),
                    booking.id_number,
                    booking.country,
                    booking.address,
                    booking.checkin.to_rfc3339(),
                    booking.checkout.to_rfc3339(),
                    booking.guests,
                    booking.special_request,
                    booking.total_amount,
                    booking.status.as_str(),
                    booking.payment_status.as_str(),
                    booking.booking_date.to_rfc3339(),
                    now,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_booking(&self, id: &str) -> Result<Option<BookingRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, email, id_type, checkin, checkout, guests, total_amount,
                            status, payment_status, booking_date
                     FROM bookings WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(BookingRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            email: row.get(2)?,
                            id_type: row.get(3)?,
                            checkin: row.get(4)?,
                            checkout: row.get(5)?,
                            guests: row.get(6)?,
                            total_amount: row.get(7)?,
                            status: row.get(8)?,
                            payment_status: row.get(9)?,
                            booking_date: row.get(10)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn count_bookings(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "bookings"))
    }

    // -- Contacts --

    pub fn insert_contact(&self, id: &str, name: &str, email: &str, message: &str) -> Result<()> {
        self.with_conn(|conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO contacts (id, name, email, message, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id, name, email, message, now],
            )?;
            Ok(())
        })
    }

    pub fn count_contacts(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "contacts"))
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, name, email, password FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn count(conn: &Connection, table: &'static str) -> Result<u64> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use bookscape_types::models::{BookingStatus, IdType, PaymentStatus};
    use uuid::Uuid;

    fn sample_booking(user_id: Uuid) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id,
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone: "+91 98450 00000".into(),
            id_type: IdType::DrivingLicense,
            id_number: "KA01 2020".into(),
            country: "India".into(),
            address: "12 MG Road, Bengaluru".into(),
            checkin: now,
            checkout: now + chrono::Duration::days(2),
            guests: 2,
            special_request: None,
            total_amount: 240.0,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Paid,
            booking_date: now,
        }
    }

    #[test]
    fn duplicate_email_is_reported_as_duplicate() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "Asha", "asha@example.com", "hash").unwrap();

        let err = db.create_user("u2", "Other", "asha@example.com", "hash").unwrap_err();
        assert!(matches!(err, DbError::Duplicate("email")));

        let user = db.get_user_by_email("asha@example.com").unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn booking_round_trips_its_labels() {
        let db = Database::open_in_memory().unwrap();
        let user_id = Uuid::new_v4();
        db.create_user(&user_id.to_string(), "Asha", "asha@example.com", "hash").unwrap();

        let booking = sample_booking(user_id);
        db.insert_booking(&booking).unwrap();

        let row = db.get_booking(&booking.id.to_string()).unwrap().unwrap();
        assert_eq!(row.user_id, user_id.to_string());
        assert_eq!(row.id_type, "Driving License");
        assert_eq!(row.status, "pending");
        assert_eq!(row.payment_status, "paid");
        assert_eq!(row.guests, 2);
        assert_eq!(db.count_bookings().unwrap(), 1);
    }

    #[test]
    fn booking_requires_an_existing_user() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert_booking(&sample_booking(Uuid::new_v4())).unwrap_err();
        assert!(!err.is_connectivity());
        assert_eq!(db.count_bookings().unwrap(), 0);
    }

    #[test]
    fn contacts_are_not_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        db.insert_contact("c1", "Asha", "asha@example.com", "Hello").unwrap();
        db.insert_contact("c2", "Asha", "asha@example.com", "Hello again").unwrap();

        assert_eq!(db.count_contacts().unwrap(), 2);
    }
}
