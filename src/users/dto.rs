use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::User;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request body for PATCH /users/me.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to clients. Never carries the password.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_serialization() {
        let response = UserResponse {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Reagan".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn create_request_name_defaults_to_empty() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"email":"test@example.com","password":"test123"}"#).unwrap();
        assert_eq!(req.name, "");
    }

    #[test]
    fn update_me_fields_are_optional() {
        let req: UpdateMeRequest = serde_json::from_str(r#"{"name":"New Name"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("New Name"));
        assert!(req.password.is_none());
    }
}
