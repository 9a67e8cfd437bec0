use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::User;

// Request bodies default every field so that a missing key reaches the
// handler's own validation and comes back as `{"error": ...}`.

// -- Accounts --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
}

// -- Newsletter --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubscribeRequest {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UnsubscribeRequest {
    pub email: String,
}

// -- Bookings --

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub id_type: String,
    pub id_number: String,
    pub country: String,
    pub address: String,
    pub checkin: String,
    pub checkout: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub guests: Option<i64>,
    pub special_request: Option<String>,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub total_amount: Option<f64>,
}

/// Form clients send numbers as strings. Anything that is neither a number
/// nor a string holding one reads as absent.
fn number_or_numeric_string<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose<T> {
        Number(T),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Loose::<T>::deserialize(deserializer)? {
        Loose::Number(n) => Some(n),
        Loose::Text(s) => s.trim().parse().ok(),
        Loose::Other(_) => None,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub message: String,
    pub booking_id: uuid::Uuid,
}

// -- Contact --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

// -- Shared --

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_request_reads_camel_case_and_tolerates_missing_fields() {
        let req: BookingRequest = serde_json::from_str(
            r#"{"name":"Asha","idType":"PAN","totalAmount":120.5,"guests":2}"#,
        )
        .unwrap();
        assert_eq!(req.id_type, "PAN");
        assert_eq!(req.total_amount, Some(120.5));
        assert_eq!(req.guests, Some(2));
        assert!(req.email.is_empty());
        assert!(req.special_request.is_none());
    }

    #[test]
    fn booking_request_accepts_numeric_strings() {
        let req: BookingRequest =
            serde_json::from_str(r#"{"guests":"2","totalAmount":" 360.5 "}"#).unwrap();
        assert_eq!(req.guests, Some(2));
        assert_eq!(req.total_amount, Some(360.5));

        let req: BookingRequest =
            serde_json::from_str(r#"{"guests":"two","totalAmount":null}"#).unwrap();
        assert_eq!(req.guests, None);
        assert_eq!(req.total_amount, None);

        let req: BookingRequest =
            serde_json::from_str(r#"{"guests":[2],"totalAmount":{"amount":1}}"#).unwrap();
        assert_eq!(req.guests, None);
        assert_eq!(req.total_amount, None);
    }

    #[test]
    fn booking_response_uses_booking_id_key() {
        let id = uuid::Uuid::new_v4();
        let json = serde_json::to_value(BookingResponse {
            message: "ok".into(),
            booking_id: id,
        })
        .unwrap();
        assert_eq!(json["bookingId"], id.to_string());
    }
}
