//! Authentication provider

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::watch;

use crate::{
    config::{AccountConfig, AuthConfig},
    error::{AppError, AppResult},
    models::{user::SessionClaims, UserIdentity},
};

/// Source of the current user identity. The dashboard only reads it.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;

    /// Receives the new identity on every sign-in / sign-out
    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>>;

    /// E-mail recorded on log entries
    fn actor(&self) -> String {
        self.current_user()
            .map(|user| user.email)
            .unwrap_or_else(|| "System".to_string())
    }
}

/// Signed-in user and the bearer token issued for the session
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserIdentity,
    pub token: String,
}

/// Single-session provider backed by the configured accounts
pub struct LocalAuthProvider {
    accounts: Vec<AccountConfig>,
    jwt_secret: String,
    jwt_expiration_hours: u64,
    state: watch::Sender<Option<UserIdentity>>,
    /// Id of the live session; tokens carrying any other id are rejected
    session_id: Mutex<Option<String>>,
}

impl LocalAuthProvider {
    pub fn new(config: &AuthConfig) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: config.accounts.clone(),
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiration_hours: config.jwt_expiration_hours,
            state,
            session_id: Mutex::new(None),
        }
    }

    /// Verify credentials, make the account the current user and issue a token.
    /// A new sign-in replaces the previous session.
    pub fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let account = self
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| AppError::Authentication("No account found with this email".to_string()))?;

        if !verify_password(&account.password_hash, password)? {
            tracing::warn!(email = %email, "Rejected sign-in");
            return Err(AppError::Authentication("Incorrect password".to_string()));
        }

        let user = UserIdentity {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
        };
        let sid: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.uid.clone(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            sid: sid.clone(),
            exp: (now + Duration::hours(self.jwt_expiration_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };
        let token = claims
            .create_token(&self.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        *self.lock_session() = Some(sid);
        tracing::info!(email = %user.email, "User signed in");
        self.state.send_replace(Some(user.clone()));
        Ok(Session { user, token })
    }

    /// Resolve a bearer token to the signed-in user
    pub fn authenticate(&self, token: &str) -> AppResult<UserIdentity> {
        let claims = SessionClaims::from_token(token, &self.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;
        if self.lock_session().as_deref() != Some(claims.sid.as_str()) {
            return Err(AppError::Authentication("Session has ended".to_string()));
        }
        Ok(claims.identity())
    }

    pub fn sign_out(&self) {
        *self.lock_session() = None;
        if let Some(user) = self.state.send_replace(None) {
            tracing::info!(email = %user.email, "User signed out");
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<String>> {
        self.session_id.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuthProvider for LocalAuthProvider {
    fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.state.subscribe()
    }
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2, for populating `auth.accounts`
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
