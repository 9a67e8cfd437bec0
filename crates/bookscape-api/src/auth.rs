use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use bookscape_db::{Database, DbError};
use bookscape_types::api::{LoginRequest, LoginResponse, MessageResponse, SignupRequest};
use bookscape_types::models::User;

use crate::error::ApiError;
use crate::validate::{normalize_email, required};
use crate::{AppState, run_blocking};

/// Create an account. Email is the unique key.
pub fn register_account(db: &Database, req: &SignupRequest) -> Result<Uuid, ApiError> {
    let name = required(&req.name, "name")?;
    let email = normalize_email(&required(&req.email, "email")?);
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    if db.get_user_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict);
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    // A concurrent signup can still win the insert.
    db.create_user(&user_id.to_string(), &name, &email, &password_hash)
        .map_err(|e| match e {
            DbError::Duplicate(_) => ApiError::Conflict,
            other => ApiError::Store(other),
        })?;

    info!(%user_id, "User registered");
    Ok(user_id)
}

/// Check credentials and return the public view of the account.
pub fn authenticate(db: &Database, req: &LoginRequest) -> Result<User, ApiError> {
    let email = normalize_email(&req.email);
    let user = db
        .get_user_by_email(&email)?
        .ok_or(ApiError::NotFound("User not found"))?;

    if !verify_password(&req.password, &user.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let id: Uuid = user
        .id
        .parse()
        .map_err(|_| ApiError::Internal(format!("malformed user id {}", user.id)))?;

    Ok(User {
        id,
        name: user.name,
        email: user.email,
    })
}

/// Argon2id with a fresh random salt, encoded as a PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(format!("stored password hash unreadable: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    run_blocking(move || register_account(&state.db, &req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let user = run_blocking(move || authenticate(&state.db, &req)).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn register_then_login() {
        let db = Database::open_in_memory().unwrap();
        let id = register_account(&db, &signup("Asha", "asha@example.com", "password123")).unwrap();

        let user = authenticate(&db, &login_req("asha@example.com", "password123")).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "Asha");
        assert_eq!(user.email, "asha@example.com");
    }

    #[test]
    fn stored_password_is_hashed() {
        let db = Database::open_in_memory().unwrap();
        register_account(&db, &signup("Asha", "asha@example.com", "password123")).unwrap();

        let row = db.get_user_by_email("asha@example.com").unwrap().unwrap();
        assert_ne!(row.password, "password123");
        assert!(row.password.starts_with("$argon2id$"));
    }

    #[test]
    fn duplicate_signup_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        register_account(&db, &signup("Asha", "asha@example.com", "password123")).unwrap();

        let err =
            register_account(&db, &signup("Asha 2", " ASHA@example.com", "other")).unwrap_err();
        assert!(matches!(err, ApiError::Conflict));
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let db = Database::open_in_memory().unwrap();
        register_account(&db, &signup("Asha", "asha@example.com", "password123")).unwrap();

        let err = authenticate(&db, &login_req("asha@example.com", "password124")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
        let err = authenticate(&db, &login_req("asha@example.com", "")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[test]
    fn unknown_email_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = authenticate(&db, &login_req("ghost@example.com", "x")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User not found")));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = register_account(&db, &signup(" ", "asha@example.com", "pw")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = register_account(&db, &signup("Asha", "asha@example.com", "")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(db.get_user_by_email("asha@example.com").unwrap().is_none());
    }
}
