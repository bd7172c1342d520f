//! User registration, login, and session lookup
//!
//! Users live in a [`UserStore`] (Supabase in production, in-memory
//! otherwise). Sessions are signed, expiring tokens from [`TokenSigner`].

pub mod memory;
pub mod password;
pub mod supabase;
pub mod token;

pub use memory::MemoryUserStore;
pub use supabase::SupabaseUserStore;
pub use token::{Claims, TokenSigner};

use crate::models::{NewUser, UserProfile, UserRecord};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

const MIN_PASSWORD_LEN: usize = 6;
const MIN_PHONE_DIGITS: usize = 8;
const DEFAULT_PLAN: &str = "free";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;
    async fn insert(&self, user: NewUser) -> Result<UserRecord>;
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Name, email, phone and password are required.")]
    MissingRegistrationFields,

    #[error("Email and password are required.")]
    MissingCredentials,

    #[error("Password must be at least 6 characters.")]
    WeakPassword,

    #[error("Please provide a valid phone number.")]
    InvalidPhone,

    #[error("A user with this email is already registered.")]
    EmailTaken,

    #[error("Incorrect email or password.")]
    InvalidCredentials,

    #[error("Token not provided.")]
    MissingToken,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("User not found.")]
    UserNotFound,

    #[error("User store unavailable: {0}")]
    Store(#[from] crate::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus the profile it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Key stretching is CPU bound, keep it off the async workers.
async fn hashed(plain: &str) -> Result<String> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| crate::Error::Invariant(format!("Password hashing task failed: {}", e)))
}

async fn verified(plain: &str, stored: &str) -> Result<bool> {
    let (plain, stored) = (plain.to_string(), stored.to_string());
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &stored))
        .await
        .map_err(|e| crate::Error::Invariant(format!("Password check task failed: {}", e)))
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenSigner,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenSigner) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, input: RegisterInput) -> std::result::Result<Session, AuthError> {
        let (Some(name), Some(email), Some(phone)) = (
            present(&input.name),
            present(&input.email),
            present(&input.phone),
        ) else {
            return Err(AuthError::MissingRegistrationFields);
        };
        let password = input
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingRegistrationFields)?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
            return Err(AuthError::InvalidPhone);
        }

        let email = normalize_email(email);
        info!("Registering new user {}", email);

        if self.store.find_by_email(&email).await?.is_some() {
            warn!("Registration rejected, email already in use: {}", email);
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hashed(password).await?;
        let record = self
            .store
            .insert(NewUser {
                name: name.to_string(),
                email,
                phone: phone.to_string(),
                password_hash,
                plan: DEFAULT_PLAN.to_string(),
            })
            .await
            .map_err(|e| match e {
                crate::Error::DuplicateEmail(email) => {
                    warn!("Registration lost insert race for {}", email);
                    AuthError::EmailTaken
                }
                e => {
                    error!("Failed to insert user: {}", e);
                    AuthError::Store(e)
                }
            })?;

        info!("User created: {}", record.id);
        self.session_for(record)
    }

    pub async fn login(&self, input: LoginInput) -> std::result::Result<Session, AuthError> {
        let (Some(email), Some(password)) = (
            present(&input.email),
            input.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingCredentials);
        };

        let email = normalize_email(email);
        info!("Login attempt for {}", email);

        let record = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verified(password, &record.password_hash).await? {
            warn!("Wrong password for user {}", record.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("Login succeeded for user {}", record.id);
        self.session_for(record)
    }

    /// Resolve the user behind an `Authorization: Bearer <token>` header value.
    pub async fn current_user(
        &self,
        authorization: Option<&str>,
    ) -> std::result::Result<UserProfile, AuthError> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            AuthError::InvalidToken
        })?;

        self.store
            .find_by_id(&claims.sub)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    fn session_for(&self, record: UserRecord) -> std::result::Result<Session, AuthError> {
        let token = self.tokens.issue(&record)?;
        Ok(Session {
            token,
            user: record.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service() -> (AuthService, MemoryUserStore) {
        let store = MemoryUserStore::new();
        let service = AuthService::new(
            Arc::new(store.clone()),
            TokenSigner::new("test-secret", Duration::from_secs(3600)),
        );
        (service, store)
    }

    fn registration(email: &str) -> RegisterInput {
        RegisterInput {
            name: Some("Ana".to_string()),
            email: Some(email.to_string()),
            password: Some("secret123".to_string()),
            phone: Some("(11) 99999-9999".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_hashes_password() {
        let (service, store) = service();

        let session = service
            .register(registration("Ana@Example.COM"))
            .await
            .unwrap();

        assert_eq!(session.user.email, "ana@example.com");
        assert_eq!(session.user.plan, "free");
        let stored = store
            .find_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "secret123");
        assert!(password::verify_password("secret123", &stored.password_hash));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, _) = service();

        let missing = RegisterInput {
            phone: None,
            ..registration("a@b.c")
        };
        assert!(matches!(
            service.register(missing).await,
            Err(AuthError::MissingRegistrationFields)
        ));

        let weak = RegisterInput {
            password: Some("12345".to_string()),
            ..registration("a@b.c")
        };
        assert!(matches!(
            service.register(weak).await,
            Err(AuthError::WeakPassword)
        ));

        let phone = RegisterInput {
            phone: Some("123-45".to_string()),
            ..registration("a@b.c")
        };
        assert!(matches!(
            service.register(phone).await,
            Err(AuthError::InvalidPhone)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let (service, store) = service();
        service.register(registration("ana@example.com")).await.unwrap();

        let err = service
            .register(registration("ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(store.len(), 1);
    }

    /// Store whose lookups miss, as when a concurrent registration for the
    /// same email commits between the lookup and the insert.
    struct LateConflictStore(MemoryUserStore);

    #[async_trait]
    impl UserStore for LateConflictStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>> {
            Ok(None)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
            self.0.find_by_id(id).await
        }

        async fn insert(&self, user: NewUser) -> Result<UserRecord> {
            self.0.insert(user).await
        }
    }

    #[tokio::test]
    async fn test_register_maps_insert_conflict_to_email_taken() {
        let store = MemoryUserStore::new();
        let service = AuthService::new(
            Arc::new(LateConflictStore(store.clone())),
            TokenSigner::new("test-secret", Duration::from_secs(3600)),
        );
        service.register(registration("ana@example.com")).await.unwrap();

        let err = service
            .register(registration("ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_login_and_current_user() {
        let (service, _) = service();
        service.register(registration("ana@example.com")).await.unwrap();

        let session = service
            .login(LoginInput {
                email: Some("ANA@example.com".to_string()),
                password: Some("secret123".to_string()),
            })
            .await
            .unwrap();

        let header = format!("Bearer {}", session.token);
        let user = service.current_user(Some(&header)).await.unwrap();
        assert_eq!(user, session.user);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (service, _) = service();
        service.register(registration("ana@example.com")).await.unwrap();

        let wrong = service
            .login(LoginInput {
                email: Some("ana@example.com".to_string()),
                password: Some("nope-nope".to_string()),
            })
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let unknown = service
            .login(LoginInput {
                email: Some("bob@example.com".to_string()),
                password: Some("secret123".to_string()),
            })
            .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));

        let missing = service.login(LoginInput::default()).await;
        assert!(matches!(missing, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_current_user_rejects_bad_headers() {
        let (service, _) = service();

        assert!(matches!(
            service.current_user(None).await,
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            service.current_user(Some("Basic abc")).await,
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            service.current_user(Some("Bearer not-a-jwt")).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_current_user_for_deleted_user() {
        let (service, _) = service();
        let ghost = UserRecord {
            id: "ghost".to_string(),
            name: "Ghost".to_string(),
            email: "ghost@example.com".to_string(),
            phone: "11999999999".to_string(),
            password_hash: String::new(),
            plan: "free".to_string(),
            created_at: chrono::Utc::now(),
        };
        let token = service.tokens.issue(&ghost).unwrap();

        let header = format!("Bearer {}", token);
        assert!(matches!(
            service.current_user(Some(&header)).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
