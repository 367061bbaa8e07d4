//! Authentication service
//!
//! Handles user registration, password login and access-token validation.

use std::sync::{Arc, OnceLock};

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{NewUser, User, UserId};
use crate::domain::ports::UserRepository;
use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 100;

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Service for registering and authenticating users
pub struct AuthService<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
    secret_key: String,
    token_ttl: Duration,
}

impl<UR> AuthService<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>, secret_key: String, token_ttl_minutes: i64) -> Self {
        Self {
            users,
            secret_key,
            token_ttl: Duration::minutes(token_ttl_minutes),
        }
    }

    /// Register a new user
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let new_user = NewUser {
            name,
            email,
            password_hash: hash_password(password).await?,
        };

        let user = self.users.create(&new_user).await?;
        tracing::info!(user_id = %user.id, "Registered user");

        Ok(user)
    }

    /// Check credentials and issue an access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let invalid = || AppError::BadRequest("Incorrect email or password".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !user.is_active || !verify_password(password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "Rejected login");
            return Err(invalid());
        }

        self.issue_token(&user.id)
    }

    /// Resolve a bearer token to an active user
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;
        let user_id = claims
            .sub
            .parse()
            .map(UserId)
            .map_err(|_| AppError::Unauthorized)?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Sign an HS256 access token for the user
    pub fn issue_token(&self, user_id: &UserId) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.token_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_key.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            AppError::Unauthorized
        })
    }
}

/// Hash a password for storage (Argon2id, PHC string format)
///
/// Argon2 is memory- and CPU-hard, so the work runs on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || argon2_hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Check a password against a stored hash, on the blocking pool
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || argon2_verify(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}

fn argon2_hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn argon2_verify(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Normalize and check an email address
pub fn validate_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !email_pattern().is_match(&email) {
        return Err(AppError::BadRequest(format!("Invalid email address: {}", email)));
    }
    Ok(email)
}

pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_user, InMemoryUserRepository};

    fn create_service(users: InMemoryUserRepository) -> AuthService<InMemoryUserRepository> {
        AuthService::new(Arc::new(users), "test-secret-key".to_string(), 30)
    }

    #[tokio::test]
    async fn password_hash_roundtrip() {
        let hash = hash_password("hunter22").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string").await.unwrap());
    }

    #[test]
    fn email_validation() {
        assert_eq!(
            validate_email("  Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn name_validation() {
        assert_eq!(validate_name("  Ada ").unwrap(), "Ada");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(101)).is_err());
    }

    #[tokio::test]
    async fn register_success() {
        let service = create_service(InMemoryUserRepository::new());

        let user = service
            .register("Ada", "ada@example.com", "correct-horse")
            .await
            .unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
        assert!(verify_password("correct-horse", &user.password_hash)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let existing = test_user();
        let service = create_service(InMemoryUserRepository::new().with_user(existing.clone()));

        let err = service
            .register("Other", &existing.email.to_uppercase(), "password1")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Email already registered"));
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let service = create_service(InMemoryUserRepository::new());
        let err = service
            .register("Ada", "ada@example.com", "abc")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least 6"));
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let service = create_service(InMemoryUserRepository::new());
        let user = service
            .register("Ada", "ada@example.com", "correct-horse")
            .await
            .unwrap();

        let token = service
            .login("ADA@example.com", "correct-horse")
            .await
            .unwrap();
        let authenticated = service.authenticate(&token).await.unwrap();

        assert_eq!(authenticated.id, user.id);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let service = create_service(InMemoryUserRepository::new());
        service
            .register("Ada", "ada@example.com", "correct-horse")
            .await
            .unwrap();

        let err = service
            .login("ada@example.com", "battery-staple")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Incorrect email or password"));
    }

    #[tokio::test]
    async fn login_rejects_unknown_email() {
        let service = create_service(InMemoryUserRepository::new());
        assert!(service.login("ghost@example.com", "whatever").await.is_err());
    }

    #[tokio::test]
    async fn disabled_user_cannot_login_or_authenticate() {
        let service = create_service(InMemoryUserRepository::new());
        let user = service
            .register("Ada", "ada@example.com", "correct-horse")
            .await
            .unwrap();
        let token = service.issue_token(&user.id).unwrap();

        service.users.deactivate(&user.id).await.unwrap();

        assert!(service.login("ada@example.com", "correct-horse").await.is_err());
        assert!(matches!(
            service.authenticate(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_foreign_signature() {
        let users = InMemoryUserRepository::new();
        let service = create_service(users);
        let forger = AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            "another-secret".to_string(),
            30,
        );
        let token = forger.issue_token(&UserId::new()).unwrap();

        assert!(matches!(
            service.authenticate(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_expired_token() {
        let user = test_user();
        let service = AuthService::new(
            Arc::new(InMemoryUserRepository::new().with_user(user.clone())),
            "test-secret-key".to_string(),
            -10,
        );
        let token = service.issue_token(&user.id).unwrap();

        assert!(matches!(
            service.authenticate(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_garbage() {
        let service = create_service(InMemoryUserRepository::new());
        assert!(service.authenticate("not.a.jwt").await.is_err());
    }
}
