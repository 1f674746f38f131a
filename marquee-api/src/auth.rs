use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use marquee_core::User;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::issue_token;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

const MAX_FIELD_LEN: usize = 30;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/register/", post(register))
        .route("/accounts/login/", post(login))
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        let username_len = self.username.chars().count();
        if username_len == 0 || username_len > MAX_FIELD_LEN {
            return Err(AppError::ValidationError(format!(
                "Username must be between 1 and {MAX_FIELD_LEN} characters."
            )));
        }

        let password_len = self.password.chars().count();
        if password_len == 0 || password_len > MAX_FIELD_LEN {
            return Err(AppError::ValidationError(format!(
                "Password must be between 1 and {MAX_FIELD_LEN} characters."
            )));
        }

        if !is_valid_email(&self.email) {
            return Err(AppError::ValidationError("Enter a valid email address.".to_string()));
        }
        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    req.validate()?;

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))?;
    let user = User::new(req.username, req.email, password_hash);
    state.users.create_user(&user).await?;
    info!("User registered: {} ({})", user.username, user.id);

    let token = issue_token(&state.auth, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful and Logging in".to_string(),
            token,
            user_id: user.id,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::AuthenticationError("Invalid username or password".to_string());

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, user.password_hash.expose()) {
        return Err(invalid());
    }

    let token = issue_token(&state.auth, &user)?;
    Ok(Json(AuthResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("a@b@c"));
    }

    #[test]
    fn test_field_lengths() {
        let req = RegisterRequest {
            username: "x".repeat(31),
            email: "x@example.com".into(),
            password: "pw".into(),
        };
        assert!(matches!(req.validate(), Err(AppError::ValidationError(_))));

        let req = RegisterRequest {
            username: "ana".into(),
            email: "ana@example.com".into(),
            password: String::new(),
        };
        assert!(matches!(req.validate(), Err(AppError::ValidationError(_))));
    }
}
