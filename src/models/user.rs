//! User model, roles and identity claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Librarian,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        }
    }

    /// Librarians and admins manage the catalog and lending desk
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Librarian | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "librarian" => Ok(Role::Librarian),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }
}

/// Short user representation nested in loan responses
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Create user request (admin provisioning; credentials live with the
/// identity provider)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Substring match on name or email
    pub search: Option<String>,
    pub blocked: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Block/unblock request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBlocked {
    pub is_blocked: bool,
}

/// Bearer identity claims.
///
/// Tokens are minted by the identity provider sharing the signing secret;
/// this server only decodes and trusts them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Encode claims into a JWT (used by tests and tooling)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Decode and verify a JWT
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Librarian or admin required
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian privileges required".to_string(),
            ))
        }
    }

    /// Admin required
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    /// Staff may act for any user; everyone else only for themselves
    pub fn require_self_or_staff(&self, user_id: i32) -> Result<(), AppError> {
        if self.is_staff() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Cannot act on behalf of another user".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, user_id: i32) -> UserClaims {
        UserClaims {
            sub: format!("user-{}", user_id),
            user_id,
            role,
            exp: 4102444800, // 2100-01-01
            iat: 0,
        }
    }

    #[test]
    fn token_round_trip() {
        let c = claims(Role::Librarian, 7);
        let token = c.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.role, Role::Librarian);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = claims(Role::User, 1).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn self_or_staff_policy() {
        assert!(claims(Role::User, 3).require_self_or_staff(3).is_ok());
        assert!(claims(Role::User, 3).require_self_or_staff(4).is_err());
        assert!(claims(Role::Librarian, 3).require_self_or_staff(4).is_ok());
        assert!(claims(Role::Admin, 3).require_admin().is_ok());
        assert!(claims(Role::Librarian, 3).require_admin().is_err());
    }
}
