use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of an account. The password hash never leaves the db layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Identity document presented at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdType {
    Aadhar,
    Passport,
    #[serde(rename = "Driving License")]
    DrivingLicense,
    #[serde(rename = "PAN")]
    Pan,
}

impl IdType {
    pub const ALL: [IdType; 4] = [
        IdType::Aadhar,
        IdType::Passport,
        IdType::DrivingLicense,
        IdType::Pan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Aadhar => "Aadhar",
            IdType::Passport => "Passport",
            IdType::DrivingLicense => "Driving License",
            IdType::Pan => "PAN",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Booking lifecycle. Only `Pending` is ever written; the other states exist
/// for downstream tooling that manages reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// A validated booking, ready to persist.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub id_type: IdType,
    pub id_number: String,
    pub country: String,
    pub address: String,
    pub checkin: DateTime<Utc>,
    pub checkout: DateTime<Utc>,
    pub guests: u32,
    pub special_request: Option<String>,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub booking_date: DateTime<Utc>,
}
