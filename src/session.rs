//! Current user and credential state

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::{ApiError, CredentialStore};
use crate::services::AuthService;
use crate::types::{AuthResponse, User};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_authenticated: bool,
}

/// Holds who is logged in. The only writer of the credential store.
#[derive(Clone)]
pub struct AuthStore {
    service: AuthService,
    credentials: Arc<dyn CredentialStore>,
    state: Arc<RwLock<AuthState>>,
}

impl AuthStore {
    pub fn new(service: AuthService, credentials: Arc<dyn CredentialStore>) -> Self {
        let state = AuthState {
            token: credentials.token(),
            ..AuthState::default()
        };
        Self {
            service,
            credentials,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    /// Validate the stored token against the backend.
    /// An invalid token is dropped from the credential store.
    pub async fn check_auth(&self) -> Result<User, String> {
        self.begin().await;

        match self.service.current_user().await {
            Ok(user) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.user = Some(user.clone());
                state.is_authenticated = true;
                state.error = None;
                tracing::info!("Authenticated as {}", user.username);
                Ok(user)
            }
            Err(e) => {
                tracing::info!("Stored credentials rejected: {}", e);
                self.forget_token();
                let mut state = self.state.write().await;
                state.loading = false;
                state.user = None;
                state.token = None;
                state.is_authenticated = false;
                Err("Not authenticated".to_string())
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, String> {
        self.begin().await;
        let result = self.service.login(email, password).await;
        self.finish(result, ApiError::user_message, "Login failed")
            .await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, String> {
        self.begin().await;
        let result = self.service.register(username, email, password).await;
        // Registration reports field-level validation messages first
        self.finish(result, ApiError::validation_message, "Registration failed")
            .await
    }

    pub async fn logout(&self) {
        self.forget_token();
        let mut state = self.state.write().await;
        if let Some(user) = state.user.take() {
            tracing::info!("Logged out {}", user.username);
        }
        state.token = None;
        state.is_authenticated = false;
        state.error = None;
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(
        &self,
        result: Result<AuthResponse, ApiError>,
        describe: fn(&ApiError) -> String,
        fallback: &str,
    ) -> Result<User, String> {
        match result {
            Ok(AuthResponse { user, token }) => {
                if let Err(e) = self.credentials.set_token(&token) {
                    tracing::warn!("Failed to persist token, session will not survive restart: {}", e);
                }
                let mut state = self.state.write().await;
                state.loading = false;
                state.user = Some(user.clone());
                state.token = Some(token);
                state.is_authenticated = true;
                state.error = None;
                tracing::info!("Signed in as {}", user.username);
                Ok(user)
            }
            Err(e) => {
                let mut message = describe(&e);
                if message.is_empty() {
                    message = fallback.to_string();
                }
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = Some(message.clone());
                state.is_authenticated = false;
                Err(message)
            }
        }
    }

    fn forget_token(&self) {
        if let Err(e) = self.credentials.clear_token() {
            tracing::warn!("Failed to remove stored token: {}", e);
        }
    }
}
