use std::sync::Arc;

use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{info, warn};

use bookscape_db::models::SubscriberRow;
use bookscape_db::{DbError, SubscriberStore};
use bookscape_types::api::{MessageResponse, SubscribeRequest, UnsubscribeRequest};

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::error::ApiError;
use crate::validate::{looks_like_email, normalize_email, optional};
use crate::{AppState, run_blocking};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    Reactivated,
    /// Written to the in-memory fallback; gone after a restart.
    SubscribedTemporarily,
}

impl SubscribeOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SubscribeOutcome::Subscribed => "Subscribed successfully",
            SubscribeOutcome::Reactivated => "Subscription reactivated successfully",
            SubscribeOutcome::SubscribedTemporarily => {
                "Subscribed successfully (temporary storage - database unavailable)"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SubscribeOutcome::Reactivated => StatusCode::OK,
            SubscribeOutcome::Subscribed | SubscribeOutcome::SubscribedTemporarily => {
                StatusCode::CREATED
            }
        }
    }
}

/// Newsletter subscriptions over a durable store, degrading to a volatile
/// fallback while the durable store is unreachable. Fallback records are
/// never copied back.
pub struct SubscriptionManager {
    primary: Arc<dyn SubscriberStore>,
    fallback: Arc<dyn SubscriberStore>,
    breaker: CircuitBreaker,
}

impl SubscriptionManager {
    pub fn new(
        primary: Arc<dyn SubscriberStore>,
        fallback: Arc<dyn SubscriberStore>,
        breaker: BreakerConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            breaker: CircuitBreaker::new("subscribers", breaker),
        }
    }

    #[cfg(test)]
    fn circuit_state(&self) -> crate::breaker::CircuitState {
        self.breaker.state()
    }

    pub fn subscribe(&self, email: &str, name: Option<&str>) -> Result<SubscribeOutcome, ApiError> {
        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Err(ApiError::Validation(
                "Please provide a valid email address".into(),
            ));
        }
        let name = optional(name);

        if !self.breaker.allow() {
            warn!(%email, "Subscriber store circuit open, using fallback storage");
            return self.subscribe_fallback(&email, name);
        }

        match self.subscribe_primary(&email, name.clone()) {
            Err(ApiError::Database(e)) if e.is_connectivity() => {
                self.breaker.record_failure();
                warn!(error = %e, "Database connection failed, using fallback storage");
                self.subscribe_fallback(&email, name)
            }
            result => {
                self.breaker.record_success();
                result
            }
        }
    }

    /// Deactivate a durable subscription so a later subscribe reactivates it.
    pub fn unsubscribe(&self, email: &str) -> Result<(), ApiError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ApiError::Validation("email is required".into()));
        }

        let mut existing = self
            .primary
            .find_subscriber(&email)
            .map_err(ApiError::Database)?
            .filter(|s| s.is_active)
            .ok_or(ApiError::NotFound("Subscriber not found"))?;

        existing.is_active = false;
        existing.updated_at = Utc::now();
        self.primary
            .update_subscriber(&existing)
            .map_err(ApiError::Database)?;

        info!(%email, "Subscription deactivated");
        Ok(())
    }

    fn subscribe_primary(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<SubscribeOutcome, ApiError> {
        let existing = self
            .primary
            .find_subscriber(email)
            .map_err(ApiError::Database)?;

        match existing {
            Some(sub) if sub.is_active => Err(ApiError::AlreadySubscribed),
            Some(mut sub) => {
                sub.is_active = true;
                if name.is_some() {
                    sub.name = name;
                }
                sub.updated_at = Utc::now();
                self.primary
                    .update_subscriber(&sub)
                    .map_err(ApiError::Database)?;
                info!(%email, "Subscription reactivated");
                Ok(SubscribeOutcome::Reactivated)
            }
            None => match self.primary.insert_subscriber(&SubscriberRow::new(email, name)) {
                Ok(()) => {
                    info!(%email, "New subscriber added");
                    Ok(SubscribeOutcome::Subscribed)
                }
                Err(DbError::Duplicate(_)) => Err(ApiError::AlreadySubscribed),
                Err(e) => Err(ApiError::Database(e)),
            },
        }
    }

    fn subscribe_fallback(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<SubscribeOutcome, ApiError> {
        if !self
            .fallback
            .insert_subscriber_if_absent(SubscriberRow::new(email, name))?
        {
            return Err(ApiError::AlreadySubscribed);
        }

        let total = self.fallback.subscriber_count()?;
        info!(%email, total, "Subscriber added to temporary storage");
        Ok(SubscribeOutcome::SubscribedTemporarily)
    }
}

pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let outcome =
        run_blocking(move || state.subscriptions.subscribe(&req.email, req.name.as_deref()))
            .await?;

    Ok((outcome.status(), Json(MessageResponse::new(outcome.message()))))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    payload: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    run_blocking(move || state.subscriptions.unsubscribe(&req.email)).await?;

    Ok(Json(MessageResponse::new("Unsubscribed successfully")))
}
