use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::error::ApiError;

/// User record in the database. Identity is the email address.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: OffsetDateTime,
}

/// Optional attributes supplied alongside email/password at creation.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Default for UserFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

impl UserFields {
    /// Forces the staff and superuser flags regardless of what was supplied.
    pub fn as_superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }
}

/// Rejects empty or malformed emails and lowercases the domain part.
/// Local-part case is preserved.
pub fn validated_email(email: &str) -> Result<String, ApiError> {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }

    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("email must be set".into()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::Validation("enter a valid email address".into()));
    }
    let (local, domain) = email.rsplit_once('@').expect("regex guarantees an @");
    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

impl User {
    /// Create a user: normalize the email, hash the password, insert.
    /// Duplicate emails come back as a validation error, not a 500.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password: &str,
        fields: UserFields,
    ) -> Result<User, ApiError> {
        let email = validated_email(email)?;
        let password_hash = hash_password(password)?;

        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, is_active, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            "#,
        )
        .bind(&email)
        .bind(&fields.name)
        .bind(&password_hash)
        .bind(fields.is_active)
        .bind(fields.is_staff)
        .bind(fields.is_superuser)
        .fetch_one(db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(ApiError::Validation(
                "user with this email already exists".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Same as [`User::create`] with staff and superuser flags forced true.
    pub async fn create_superuser(
        db: &PgPool,
        email: &str,
        password: &str,
        fields: UserFields,
    ) -> Result<User, ApiError> {
        User::create(db, email, password, fields.as_superuser()).await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Update name and/or password for the authenticated owner. Fields left
    /// `None` keep their current value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<User, ApiError> {
        let password_hash = match new_password {
            Some(p) => Some(hash_password(p)?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash)
            WHERE id = $1
            RETURNING id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(password_hash)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound)?;
        Ok(user)
    }
}
