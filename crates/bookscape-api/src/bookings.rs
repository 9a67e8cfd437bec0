use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use bookscape_db::Database;
use bookscape_types::api::{BookingRequest, BookingResponse};
use bookscape_types::models::{Booking, BookingStatus, IdType, PaymentStatus};

use crate::error::ApiError;
use crate::validate::{normalize_email, optional, required};
use crate::{AppState, run_blocking};

/// Record a booking for an existing account. Payment is settled before the
/// request reaches us, so every booking is stored as paid.
pub fn create_booking(db: &Database, req: &BookingRequest) -> Result<Uuid, ApiError> {
    let email = normalize_email(&req.email);
    let user = db
        .get_user_by_email(&email)?
        .ok_or(ApiError::NotFound("User not found"))?;
    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|_| ApiError::Internal(format!("malformed user id {}", user.id)))?;

    let booking = build_booking(user_id, email, req)?;
    db.insert_booking(&booking)?;

    info!(booking_id = %booking.id, %user_id, "Booking created");
    Ok(booking.id)
}

fn build_booking(user_id: Uuid, email: String, req: &BookingRequest) -> Result<Booking, ApiError> {
    let id_type = IdType::from_label(req.id_type.trim()).ok_or_else(|| {
        let allowed: Vec<_> = IdType::ALL.iter().map(IdType::as_str).collect();
        ApiError::Validation(format!("idType must be one of: {}", allowed.join(", ")))
    })?;

    let guests = req
        .guests
        .filter(|g| *g >= 1)
        .and_then(|g| u32::try_from(g).ok())
        .ok_or_else(|| ApiError::Validation("guests must be at least 1".into()))?;

    let total_amount = req
        .total_amount
        .filter(|a| a.is_finite() && *a >= 0.0)
        .ok_or_else(|| ApiError::Validation("totalAmount is required".into()))?;

    Ok(Booking {
        id: Uuid::new_v4(),
        user_id,
        name: required(&req.name, "name")?,
        email,
        phone: required(&req.phone, "phone")?,
        id_type,
        id_number: required(&req.id_number, "idNumber")?,
        country: required(&req.country, "country")?,
        address: required(&req.address, "address")?,
        checkin: parse_stay_date(&req.checkin, "checkin")?,
        checkout: parse_stay_date(&req.checkout, "checkout")?,
        guests,
        special_request: optional(req.special_request.as_deref()),
        total_amount,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Paid,
        booking_date: Utc::now(),
    })
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_stay_date(raw: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "{field} must be a date (YYYY-MM-DD) or an RFC 3339 timestamp"
            ))
        })
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let booking_id = run_blocking(move || create_booking(&state.db, &req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            message: "Booking created successfully".into(),
            booking_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn db_with_user(email: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&Uuid::new_v4().to_string(), "Asha", email, "hash")
            .unwrap();
        db
    }

    fn request(email: &str) -> BookingRequest {
        BookingRequest {
            name: "Asha Rao".into(),
            email: email.into(),
            phone: "+91 98450 00000".into(),
            id_type: "Passport".into(),
            id_number: "P1234567".into(),
            country: "India".into(),
            address: "12 MG Road, Bengaluru".into(),
            checkin: "2025-03-01".into(),
            checkout: "2025-03-04T11:00:00+05:30".into(),
            guests: Some(2),
            special_request: Some("  ".into()),
            total_amount: Some(360.0),
        }
    }

    #[test]
    fn booking_is_stored_as_paid_and_pending() {
        let db = db_with_user("asha@example.com");
        let id = create_booking(&db, &request("Asha@Example.com")).unwrap();

        let row = db.get_booking(&id.to_string()).unwrap().unwrap();
        assert_eq!(row.payment_status, "paid");
        assert_eq!(row.status, "pending");
        assert_eq!(row.email, "asha@example.com");
        assert_eq!(row.id_type, "Passport");
        assert_eq!(row.guests, 2);
        assert_eq!(row.total_amount, 360.0);
    }

    #[test]
    fn unknown_user_is_not_found_and_writes_nothing() {
        let db = db_with_user("asha@example.com");
        let mut req = request("ghost@example.com");
        req.guests = Some(0);

        let err = create_booking(&db, &req).unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User not found")));
        assert_eq!(db.count_bookings().unwrap(), 0);
    }

    #[test]
    fn invalid_fields_are_rejected_without_a_write() {
        let db = db_with_user("asha@example.com");

        let mut req = request("asha@example.com");
        req.guests = Some(0);
        assert!(matches!(create_booking(&db, &req), Err(ApiError::Validation(_))));

        let mut req = request("asha@example.com");
        req.id_type = "Voter ID".into();
        assert!(matches!(create_booking(&db, &req), Err(ApiError::Validation(_))));

        let mut req = request("asha@example.com");
        req.checkin = "next tuesday".into();
        assert!(matches!(create_booking(&db, &req), Err(ApiError::Validation(_))));

        let mut req = request("asha@example.com");
        req.total_amount = None;
        assert!(matches!(create_booking(&db, &req), Err(ApiError::Validation(_))));

        let mut req = request("asha@example.com");
        req.phone = String::new();
        assert!(matches!(create_booking(&db, &req), Err(ApiError::Validation(_))));

        assert_eq!(db.count_bookings().unwrap(), 0);
    }

    #[test]
    fn stay_dates_accept_plain_dates_and_timestamps() {
        let d = parse_stay_date("2025-03-01", "checkin").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2025, 3, 1, 0));

        let t = parse_stay_date("2025-03-04T11:00:00+05:30", "checkout").unwrap();
        assert_eq!((t.day(), t.hour(), t.minute()), (4, 5, 30));

        assert!(parse_stay_date("", "checkin").is_err());
    }

    #[test]
    fn blank_special_request_is_dropped() {
        let booking = build_booking(Uuid::new_v4(), "a@x.com".into(), &request("a@x.com")).unwrap();
        assert_eq!(booking.special_request, None);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
    }
}
