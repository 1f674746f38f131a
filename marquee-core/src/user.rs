use chrono::{DateTime, Utc};
use marquee_shared::Masked;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Masked<String>,
    #[serde(skip_serializing)]
    pub password_hash: Masked<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email: Masked(email),
            password_hash: Masked(password_hash),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Username already exists")]
    UsernameTaken(String),

    #[error("Account storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_debug_hides_secrets() {
        let user = User::new("ana".into(), "ana@example.com".into(), "salt$hash".into());
        let debug = format!("{:?}", user);
        assert!(!debug.contains("ana@example.com"));
        assert!(!debug.contains("salt$hash"));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "ana@example.com");
        assert!(json.get("password_hash").is_none());
    }
}
