use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use bookscape_db::Database;
use bookscape_types::api::{ContactRequest, MessageResponse};

use crate::error::ApiError;
use crate::validate::normalize_email;
use crate::{AppState, run_blocking};

/// Store a contact-form message. Messages are write-only and never deduplicated.
pub fn submit_contact(db: &Database, req: &ContactRequest) -> Result<Uuid, ApiError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);
    let message = req.message.trim();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let id = Uuid::new_v4();
    db.insert_contact(&id.to_string(), name, &email, message)?;

    info!(contact_id = %id, "Contact message stored");
    Ok(id)
}

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    run_blocking(move || submit_contact(&state.db, &req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Message submitted successfully!")),
    ))
}
