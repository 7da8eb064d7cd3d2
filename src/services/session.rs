//! Login sessions for lab users.
//!
//! A [`Session`] holds at most one authenticated user and never expires.
//! The HTTP surface serves many browser tabs, so [`SessionRegistry`] keeps
//! one `Session` per issued token, keyed by the SHA-256 hash of that token.

use std::collections::HashMap;

use secrecy::SecretString;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::secrets_match;
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, User, UserAccount};

/// Session token prefix.
const TOKEN_PREFIX: &str = "lab_";

/// Mock user table checked at login.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    accounts: Vec<UserAccount>,
}

impl CredentialStore {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    /// Return the user whose username and password both match.
    ///
    /// Unknown usernames and wrong passwords give the same error.
    pub fn verify(&self, username: &str, password: &SecretString) -> AppResult<User> {
        let username = username.trim();
        self.accounts
            .iter()
            .find(|a| a.username == username && secrets_match(&a.password, password))
            .map(|a| a.user.clone())
            .ok_or_else(|| AppError::Auth("invalid username or password".to_string()))
    }
}

/// The authenticated user of one browser session.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate and replace whoever was logged in before.
    ///
    /// A failed login leaves the session as it was.
    pub fn login(
        &mut self,
        credentials: &CredentialStore,
        request: &LoginRequest,
    ) -> AppResult<User> {
        let user = credentials.verify(&request.username, &request.password)?;
        self.user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// Hash a session token using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_token() -> String {
    format!(
        "{}{}{}",
        TOKEN_PREFIX,
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Live sessions, one per issued token.
pub struct SessionRegistry {
    credentials: CredentialStore,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Log in and issue a fresh token for the new session.
    pub async fn login(&self, request: &LoginRequest) -> AppResult<(String, User)> {
        let mut session = Session::new();
        let user = match session.login(&self.credentials, request) {
            Ok(user) => user,
            Err(e) => {
                warn!("Failed login attempt for username '{}'", request.username.trim());
                return Err(e);
            }
        };

        let token = generate_token();
        self.sessions
            .write()
            .await
            .insert(hash_token(&token), session);

        info!("User logged in: id={}, role={}", user.id, user.role);
        Ok((token, user))
    }

    /// User behind a token, if the session is still logged in.
    pub async fn resolve(&self, token: &str) -> Option<User> {
        self.sessions
            .read()
            .await
            .get(&hash_token(token))
            .and_then(|s| s.current_user().cloned())
    }

    /// End the session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) {
        if let Some(mut session) = self.sessions.write().await.remove(&hash_token(token)) {
            if let Some(user) = session.current_user() {
                info!("User logged out: id={}", user.id);
            }
            session.logout();
        }
    }
}
