use std::sync::Mutex;

use tracing::{info, warn};

use crate::api_client::{ApiClient, LoginRequest, LoginResponse, RegisterRequest, User};
use crate::error::ApiError;

/// Where the session currently stands. `Authenticating` only lasts for the
/// duration of an in-flight login; a failed login lands back in `Anonymous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Wraps the dispatcher's login/register calls and feeds a successful
/// login's token into the shared token store.
///
/// Racing logins are last-write-wins at the store level; the surrounding
/// application is expected to serialize attempts (disable the submit action
/// while one is in flight).
pub struct AuthSession {
    client: ApiClient,
    state: Mutex<SessionState>,
}

impl AuthSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::Anonymous),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// `POST /auth/login`. On success the returned token replaces whatever
    /// the store held and the session becomes `Authenticated`. On any
    /// dispatcher error the session returns to `Anonymous` and the
    /// classified error is forwarded unchanged, so the caller can still tell
    /// "server unreachable" from "bad credentials" from "malformed response".
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        *self.state.lock().unwrap() = SessionState::Authenticating;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.client.login(&request).await {
            Ok(response) => {
                self.client.tokens().set(&response.access_token);
                *self.state.lock().unwrap() = SessionState::Authenticated;
                info!(target: "auth", "login succeeded for {}", email);
                Ok(response)
            }
            Err(e) => {
                *self.state.lock().unwrap() = SessionState::Anonymous;
                warn!(target: "auth", "login failed for {}: {}", email, e);
                Err(e)
            }
        }
    }

    /// `POST /auth/register`. Does not authenticate and does not touch the
    /// session state or the token store; same error taxonomy as login.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let request = RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        };
        let user = self.client.register(&request).await?;
        info!(target: "auth", "registered user {} (id {})", user.email, user.id);
        Ok(user)
    }

    /// Drop the token and return to `Anonymous`. The trigger is external
    /// (the surrounding application decides when to log out).
    pub fn logout(&self) {
        self.client.tokens().clear();
        *self.state.lock().unwrap() = SessionState::Anonymous;
        info!(target: "auth", "session cleared");
    }
}
