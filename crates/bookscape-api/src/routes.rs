use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{AppState, auth, bookings, contact, subscribe};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api/signup", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/subscribe", post(subscribe::subscribe))
        .route("/api/unsubscribe", post(subscribe::unsubscribe))
        .route("/api/booking", post(bookings::create))
        .route("/api/contact", post(contact::submit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome to BookScape Backend!"
}
