//! User model, roles and the request principal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Administrator,
    LibraryStaff,
    Student,
}

impl Role {
    /// Stored form of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::LibraryStaff => "Library Staff",
            Role::Student => "Student",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Administrator | Role::LibraryStaff)
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
        match s.to_lowercase().replace(' ', "").replace('_', "").as_str() {
            "administrator" | "admin" => Ok(Role::Administrator),
            "librarystaff" | "staff" => Ok(Role::LibraryStaff),
            "student" => Ok(Role::Student),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    username: String,
    password_hash: String,
    full_name: String,
    email: Option<String>,
    role: String,
    created_date: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            email: row.email,
            role: row.role.parse().unwrap_or(Role::Student),
            created_date: row.created_date,
        }
    }
}

/// Stored user account
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub username: String,
    /// SHA-256 digest of the password, hex encoded
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_date: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Defaults to Student
    pub role: Option<Role>,
}

impl RegisterUser {
    /// Trim free-text fields; a blank email counts as absent
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.full_name = self.full_name.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authenticated identity performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
            role,
        }
    }

    /// Any authenticated account may browse the catalog
    pub fn require_read_catalog(&self) -> Result<(), AppError> {
        Ok(())
    }

    pub fn require_write_catalog(&self) -> Result<(), AppError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to modify the catalog".to_string()))
        }
    }

    pub fn require_manage_loans(&self) -> Result<(), AppError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to manage loans".to_string()))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal {
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

/// JWT claims carrying a principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalClaims {
    pub sub: String,
    pub full_name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl PrincipalClaims {
    pub fn new(principal: &Principal, ttl_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: principal.username.clone(),
            full_name: principal.full_name.clone(),
            role: principal.role,
            exp: now + (ttl_hours as i64 * 3600),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn principal(self) -> Principal {
        Principal {
            username: self.sub,
            full_name: self.full_name,
            role: self.role,
        }
    }
}
