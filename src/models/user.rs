//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::Role;

/// User account
///
/// Token columns hold SHA-256 digests of the issued tokens, never the tokens.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,

    // Account state
    pub is_active: bool,
    pub is_verified: bool,

    // Session
    pub token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_expires_at: Option<DateTime<Utc>>,

    pub last_login_at: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// New active, unverified account without a session
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            avatar: None,
            is_active: true,
            is_verified: false,
            token: None,
            token_expires_at: None,
            refresh_token: None,
            refresh_expires_at: None,
            last_login_at: None,
            email_verified_at: None,
            password_changed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 3, max = 100))]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

/// Self-profile update; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(url, length(max = 500))]
    pub avatar: Option<String>,
    #[validate(length(max = 100))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Apply profile fields; the password is re-hashed by the caller
    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
    }

    /// New password, if one was supplied and is non-empty
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// User ↔ role edge management request
#[derive(Debug, Deserialize, Validate)]
pub struct UserRolesRequest {
    #[validate(length(min = 1, max = 100))]
    pub role_ids: Vec<Uuid>,
}

/// User response (without credentials or session data)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            avatar: user.avatar,
            is_active: user.is_active,
            is_verified: user.is_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User with roles
#[derive(Debug, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: UserResponse,
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let mut user = User::new(
            "captain".to_string(),
            "captain@example.com".to_string(),
            "hash".to_string(),
        );
        user.first_name = "Jack".to_string();
        user.last_name = "Aubrey".to_string();
        user.phone = Some("+44 1234".to_string());
        user
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert!(user.token.is_none());
        assert!(user.refresh_token.is_none());
        assert!(user.deleted_at.is_none());
    }

    #[test]
    fn test_partial_update_touches_only_present_fields() {
        let mut target = user();
        let req = UpdateUserRequest {
            last_name: Some("Maturin".to_string()),
            ..Default::default()
        };

        req.apply(&mut target);

        assert_eq!(target.last_name, "Maturin");
        assert_eq!(target.first_name, "Jack");
        assert_eq!(target.phone.as_deref(), Some("+44 1234"));
        assert!(req.new_password().is_none());
    }

    #[test]
    fn test_empty_password_is_ignored() {
        let req = UpdateUserRequest {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(req.new_password().is_none());

        let req = UpdateUserRequest {
            password: Some("n3w-secret".to_string()),
            ..Default::default()
        };
        assert_eq!(req.new_password(), Some("n3w-secret"));
    }

    #[test]
    fn test_response_hides_credentials() {
        let mut u = user();
        u.token = Some("digest".to_string());
        let body = serde_json::to_value(UserResponse::from(u)).unwrap();

        assert!(body.get("password_hash").is_none());
        assert!(body.get("token").is_none());
        assert!(body.get("refresh_token").is_none());
        assert_eq!(body["username"], "captain");
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterUserRequest {
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
    }
}
