//! services/api/src/services/auth.rs
//!
//! Account registration, password checks, and JWT issuance/verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use lms_core::{
    access::permissions_for,
    domain::{NewUser, ProfileUpdate, Role, User},
    ports::{DatabaseService, PortError},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{not_found, ServiceError, ServiceResult};

//=========================================================================================
// Token Claims and Views
//=========================================================================================

/// The signed payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl AuthUser {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            email: user.email.clone(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role.to_string(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserProfile,
}

/// Everything a registration request may carry.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

//=========================================================================================
// Password Helpers
//=========================================================================================

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ServiceError::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, hashed: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ServiceError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"))
        .is_match(email)
}

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct AuthService {
    db: Arc<dyn DatabaseService>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(db: Arc<dyn DatabaseService>, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            db,
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }

    pub async fn register(&self, registration: Registration) -> ServiceResult<RegisteredUser> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_string();
        if username.is_empty() || registration.password.is_empty() {
            return Err(ServiceError::Invalid(
                "Username and password are required".to_string(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(ServiceError::Invalid("Invalid email address".to_string()));
        }
        let role = match registration.role.as_deref() {
            None => Role::default(),
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|_| ServiceError::Invalid("Invalid role".to_string()))?,
        };

        if self.db.username_exists(&username).await? {
            debug!("Registration rejected, username {} taken", username);
            return Err(ServiceError::Conflict("Username already exists".to_string()));
        }
        if self.db.find_user_id_by_email(&email).await?.is_some() {
            debug!("Registration rejected, email {} taken", email);
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let new_user = NewUser {
            username,
            email,
            hashed_password: hash_password(&registration.password)?,
            role,
            first_name: registration.first_name.unwrap_or_default(),
            last_name: registration.last_name.unwrap_or_default(),
            phone_number: registration.phone_number.filter(|p| !p.is_empty()),
        };

        // A concurrent registration can still win the race; the unique index decides.
        let user = self.db.create_user(new_user).await.map_err(|e| match e {
            PortError::Conflict(constraint) if constraint.contains("email") => {
                ServiceError::Conflict("Email already registered".to_string())
            }
            PortError::Conflict(_) => ServiceError::Conflict("Username already exists".to_string()),
            other => ServiceError::Port(other),
        })?;

        info!("Registered user {} ({})", user.username, user.role);
        Ok(RegisteredUser {
            user_id: user.id,
            username: user.username,
            role: user.role.to_string(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let creds = self
            .db
            .get_credentials_by_username(username)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => ServiceError::Unauthorized("User not found".to_string()),
                other => ServiceError::Port(other),
            })?;

        if !verify_password(password, &creds.hashed_password)? {
            debug!("Invalid password for {}", username);
            return Err(ServiceError::Unauthorized("Invalid password".to_string()));
        }

        let token = self.issue_token(&creds.user)?;
        Ok(LoginOutcome {
            token,
            user: UserProfile::from(&creds.user),
        })
    }

    /// Signs an HS256 token carrying the user's id and role.
    pub fn issue_token(&self, user: &User) -> ServiceResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("Failed to sign token: {:?}", e);
            ServiceError::Internal("Failed to issue token".to_string())
        })
    }

    pub fn decode_token(&self, token: &str) -> ServiceResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ServiceError::Unauthorized("Token expired".to_string()),
            _ => ServiceError::Unauthorized("Invalid token".to_string()),
        })
    }

    /// Decodes the token and re-reads the user, so role changes apply immediately.
    pub async fn verify_token(&self, token: &str) -> ServiceResult<AuthUser> {
        let claims = self.decode_token(token)?;
        let user = self.db.get_user(claims.sub).await.map_err(|e| match e {
            PortError::NotFound(_) => ServiceError::Unauthorized("User not found".to_string()),
            other => ServiceError::Port(other),
        })?;
        Ok(AuthUser::from_user(&user))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let creds = self
            .db
            .get_credentials(user_id)
            .await
            .map_err(not_found("User not found"))?;
        if !verify_password(old_password, &creds.hashed_password)? {
            return Err(ServiceError::Invalid(
                "Current password is incorrect".to_string(),
            ));
        }
        if new_password.is_empty() {
            return Err(ServiceError::Invalid("New password is required".to_string()));
        }
        self.db
            .update_password(user_id, &hash_password(new_password)?)
            .await
            .map_err(not_found("User not found"))?;
        info!("Password changed for user {}", user_id);
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<UserProfile> {
        let mut user = self
            .db
            .get_user(user_id)
            .await
            .map_err(not_found("User not found"))?;
        if update.is_empty() {
            return Ok(UserProfile::from(&user));
        }

        if let Some(email) = &update.email {
            if !is_valid_email(email) {
                return Err(ServiceError::Invalid("Invalid email address".to_string()));
            }
            if let Some(owner) = self.db.find_user_id_by_email(email).await? {
                if owner != user_id {
                    return Err(ServiceError::Conflict("Email already registered".to_string()));
                }
            }
        }

        update.apply_to(&mut user);
        let saved = self.db.save_user(&user).await.map_err(|e| match e {
            PortError::Conflict(_) => ServiceError::Conflict("Email already registered".to_string()),
            other => not_found("User not found")(other),
        })?;
        Ok(UserProfile::from(&saved))
    }

    pub fn permissions(&self, role: Role) -> Vec<&'static str> {
        permissions_for(role).iter().map(|p| p.as_str()).collect()
    }
}
