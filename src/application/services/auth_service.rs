//! Authentication Service
//!
//! Handles registration, login, opaque sessions, email verification and
//! per-request identity resolution.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};

use crate::application::dto::request::{LoginRequest, RegisterRequest};
use crate::config::SessionSettings;
use crate::domain::{
    generate_token, hash_token, Identity, NewSession, NewUser, SessionRepository, User,
    UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// A freshly issued session. `token` is only ever shown to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    id_generator: Arc<SnowflakeGenerator>,
    settings: SessionSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        id_generator: Arc<SnowflakeGenerator>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            users,
            sessions,
            id_generator,
            settings,
        }
    }

    /// Create the account and log it in.
    pub async fn register(
        &self,
        req: RegisterRequest,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let password_hash = hash_password(&req.password)?;

        let user = self
            .users
            .create(&NewUser {
                id: self.id_generator.generate(),
                username: req.username.trim().to_string(),
                email: normalize_email(&req.email),
                password_hash,
                display_name: req.display_name.trim().to_string(),
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        self.issue_session(user, user_agent).await
    }

    pub async fn login(
        &self,
        req: LoginRequest,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let user = self
            .users
            .find_by_email(&normalize_email(&req.email))
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(invalid_credentials());
        }

        tracing::info!(user_id = user.id, "User logged in");
        self.issue_session(user, user_agent).await
    }

    /// Delete the presented session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions.delete_by_token_hash(&hash_token(token)).await?;
        Ok(())
    }

    /// Issue a new verification token. Delivery happens outside this service;
    /// the token is handed to the log.
    pub async fn resend_verification(&self, user_id: i64) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if user.email_verified {
            return Err(AppError::BadRequest("Email is already verified".into()));
        }

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.settings.verification_ttl_hours);
        self.users
            .create_verification(user.id, &hash_token(&token), expires_at)
            .await?;

        tracing::info!(user_id = user.id, "Verification email queued");
        tracing::debug!(user_id = user.id, token = %token, "Verification token");
        Ok(())
    }

    pub async fn confirm_verification(&self, token: &str) -> Result<(), AppError> {
        let user_id = self
            .users
            .consume_verification(&hash_token(token.trim()))
            .await?
            .ok_or_else(|| {
                AppError::invalid_field("token", "Invalid or expired verification token")
            })?;

        tracing::info!(user_id, "Email verified");
        Ok(())
    }

    /// Resolve the caller. The cookie is tried first and yields the full
    /// profile; the bearer token yields the id only.
    pub async fn resolve(
        &self,
        cookie: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<Identity, AppError> {
        if let Some(token) = cookie.filter(|t| !t.is_empty()) {
            if let Some(session) = self.sessions.find_active(&hash_token(token)).await? {
                return match self.users.find_by_id(session.user_id).await? {
                    Some(user) => Ok(Identity::Resolved(user)),
                    None => {
                        tracing::warn!(
                            session_id = session.id,
                            user_id = session.user_id,
                            "Session refers to a missing user"
                        );
                        Ok(Identity::Anonymous)
                    }
                };
            }
        }

        if let Some(token) = bearer.filter(|t| !t.is_empty()) {
            if let Some(session) = self.sessions.find_active(&hash_token(token)).await? {
                return Ok(Identity::ResolvedMinimal(session.user_id));
            }
        }

        Ok(Identity::Anonymous)
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        self.sessions.delete_expired().await
    }

    async fn issue_session(
        &self,
        user: User,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.settings.ttl_hours);

        self.sessions
            .create(&NewSession {
                id: self.id_generator.generate(),
                user_id: user.id,
                token_hash: hash_token(&token),
                user_agent,
                expires_at,
            })
            .await?;

        Ok(IssuedSession {
            user,
            token,
            expires_at,
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::server_error(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::server_error(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::{MockSessionRepository, MockUserRepository, Session};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use mockall::predicate::eq;

    fn session(user_id: i64) -> Session {
        let now = Utc::now();
        Session {
            id: 1,
            user_id,
            token_hash: "h".into(),
            user_agent: None,
            expires_at: now + Duration::hours(1),
            created_at: now,
        }
    }

    fn service(users: MockUserRepository, sessions: MockSessionRepository) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(sessions),
            Arc::new(SnowflakeGenerator::default()),
            Settings::for_tests().session,
        )
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[tokio::test]
    async fn cookie_session_resolves_full_profile() {
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_find_active()
            .withf(|hash| hash == hash_token("cookie-token"))
            .returning(|_| Ok(Some(session(7))));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().with(eq(7)).returning(|id| {
            Ok(Some(User {
                id,
                ..Default::default()
            }))
        });

        let identity = service(users, sessions)
            .resolve(Some("cookie-token"), None)
            .await
            .unwrap();

        assert!(matches!(identity, Identity::Resolved(ref u) if u.id == 7));
    }

    #[tokio::test]
    async fn bearer_session_resolves_id_only() {
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_find_active()
            .returning(|_| Ok(Some(session(9))));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();

        let identity = service(users, sessions)
            .resolve(None, Some("bearer-token"))
            .await
            .unwrap();

        assert_eq!(identity, Identity::ResolvedMinimal(9));
    }

    #[tokio::test]
    async fn orphaned_session_is_anonymous() {
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_find_active()
            .returning(|_| Ok(Some(session(3))));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let identity = service(users, sessions)
            .resolve(Some("stale"), None)
            .await
            .unwrap();

        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut sessions = MockSessionRepository::new();
        sessions.expect_create().never();

        let email: String = SafeEmail().fake();
        let err = service(users, sessions)
            .login(
                LoginRequest {
                    email,
                    password: "whatever1".into(),
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid credentials"));
    }

    #[tokio::test]
    async fn verified_user_cannot_request_another_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|id| {
            Ok(Some(User {
                id,
                email_verified: true,
                ..Default::default()
            }))
        });
        users.expect_create_verification().never();

        let err = service(users, MockSessionRepository::new())
            .resend_verification(4)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
