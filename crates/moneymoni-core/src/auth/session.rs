use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::api::{error_message, ApiClient, ApiError};
use crate::cache::{CachedData, QueryCache};
use crate::models::{Session, ValidationError};
use crate::router::Route;

use super::storage::{LocalStore, AUTH_FLAG_KEY};

/// Where the client stands with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// The persisted flag says we were logged in; the server has not
    /// confirmed it yet.
    Restored,
    Authenticated,
}

/// Owns the API client and the login state. The application shell holds the
/// only instance and is the only writer.
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    store: LocalStore,
    state: AuthState,
    current: Option<CachedData<Session>>,
    last_error: Option<String>,
}

impl SessionManager {
    /// Build the manager, taking the initial state from the persisted flag.
    pub fn restore(api: ApiClient, store: LocalStore) -> Self {
        let state = match store.get(AUTH_FLAG_KEY) {
            Some("true") => AuthState::Restored,
            _ => AuthState::Unauthenticated,
        };
        debug!(?state, "Restored auth state from local storage");
        Self {
            api,
            store,
            state,
            current: None,
            last_error: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// The cached session. Only populated after login or `refresh`.
    pub fn current_session(&self) -> Option<&Session> {
        match self.state {
            AuthState::Authenticated => self.current.as_ref().map(|c| &c.data),
            _ => None,
        }
    }

    /// When the cached session was last fetched.
    pub fn session_age(&self) -> Option<String> {
        self.current.as_ref().map(|c| c.age_display())
    }

    /// Message from the last failed login, for the login form.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Log in with a household PIN.
    pub async fn login(&mut self, pin: &str) -> Result<Session> {
        self.last_error = None;

        if pin.trim().is_empty() {
            self.state = AuthState::Unauthenticated;
            let err: anyhow::Error = ApiError::Validation(ValidationError::required("pin")).into();
            self.last_error = Some(error_message(&err, "PIN is required"));
            return Err(err);
        }

        let response = match self.api.login(pin).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Login failed");
                self.clear_local();
                self.last_error = Some(error_message(&e, "Login failed"));
                return Err(e);
            }
        };

        self.api.set_token(response.access_token.clone());
        self.state = AuthState::Authenticated;
        self.persist_flag();

        let session = match self.api.me().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Session lookup after login failed, using login response");
                Session::from_login(&response, Utc::now())
            }
        };
        info!(
            user_type = %session.user_type,
            expires_in_minutes = session.minutes_until_expiry(),
            "Logged in"
        );
        self.current = Some(CachedData::new(session.clone()));
        Ok(session)
    }

    /// Log out. Local state is cleared whether or not the backend call
    /// succeeds.
    pub async fn logout(&mut self, cache: &mut QueryCache) {
        match self.api.logout().await {
            Ok(_) => info!("Logged out"),
            Err(e) => warn!(error = %e, "Logout request failed, clearing local session anyway"),
        }
        cache.clear();
        self.clear_local();
        if let Some(navigator) = self.api.navigator() {
            navigator.navigate(Route::Login);
        }
    }

    /// Fetch the session from `GET /auth/me`. Any failure leaves the manager
    /// unauthenticated.
    pub async fn refresh(&mut self) -> Result<Session> {
        match self.api.me().await {
            Ok(session) if session.authenticated => {
                self.state = AuthState::Authenticated;
                self.persist_flag();
                self.current = Some(CachedData::new(session.clone()));
                Ok(session)
            }
            Ok(_) => {
                self.clear_local();
                Err(ApiError::Unauthorized("Session is not authenticated".to_string()).into())
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                self.clear_local();
                Err(e)
            }
        }
    }

    /// Confirm a restored hint against the server. Other states are returned
    /// unchanged.
    pub async fn reconcile(&mut self) -> AuthState {
        if self.state != AuthState::Restored {
            return self.state;
        }
        match self.refresh().await {
            Ok(_) => info!("Restored session confirmed"),
            Err(e) => info!(error = %e, "Restored session rejected"),
        }
        self.state
    }

    /// React to a 401 reported by the HTTP client.
    pub fn handle_unauthorized(&mut self) {
        if self.state != AuthState::Unauthenticated {
            warn!("Session no longer accepted by the server");
        }
        self.clear_local();
    }

    /// Route an error from any request through the 401 handling. Returns
    /// true when the error was an authentication failure.
    pub fn observe_error(&mut self, err: &anyhow::Error) -> bool {
        let unauthorized = err
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_unauthorized);
        if unauthorized {
            self.handle_unauthorized();
        }
        unauthorized
    }

    fn persist_flag(&mut self) {
        if let Err(e) = self.store.set(AUTH_FLAG_KEY, "true") {
            warn!(error = %e, "Failed to persist auth flag");
        }
    }

    fn clear_local(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.current = None;
        self.api.clear_token();
        if let Err(e) = self.store.remove(AUTH_FLAG_KEY) {
            warn!(error = %e, "Failed to clear auth flag");
        }
    }
}
