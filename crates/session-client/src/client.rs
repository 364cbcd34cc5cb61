//! Session client.

use crate::documents::{
    GET_ME_DOCUMENT, GET_ME_OPERATION, LOGIN_DOCUMENT, LOGIN_OPERATION, REGISTER_DOCUMENT,
    REGISTER_OPERATION,
};
use crate::{RegisterInput, Session, SessionResult, User};
use auth_pipeline::{AuthPipeline, PipelineError};
use credential_storage::{CredentialKind, CredentialPair};
use gql_transport::{FetchPolicy, Operation};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback invoked with a snapshot after every session change.
pub type SessionCallback = Box<dyn Fn(&Session) + Send + Sync>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedCredentials<U> {
    access_token: String,
    refresh_token: String,
    user: Option<U>,
}

#[derive(Deserialize)]
struct LoginUser {
    email: Option<String>,
}

#[derive(Deserialize)]
struct LoginData {
    login: Option<IssuedCredentials<LoginUser>>,
}

#[derive(Deserialize)]
struct RegisterData {
    register: Option<IssuedCredentials<User>>,
}

#[derive(Deserialize)]
struct MeData {
    me: Option<User>,
}

struct Shared {
    session: Mutex<Session>,
    callback: Mutex<Option<SessionCallback>>,
}

impl Shared {
    fn update(&self, apply: impl FnOnce(&mut Session)) {
        let snapshot = {
            let mut session = self.session.lock();
            apply(&mut session);
            session.clone()
        };

        let callback = self.callback.lock();
        if let Some(callback) = callback.as_ref() {
            callback(&snapshot);
        }
    }
}

/// Marks the session as loading until dropped.
struct LoadingGuard<'a>(&'a Shared);

impl<'a> LoadingGuard<'a> {
    fn begin(shared: &'a Shared) -> Self {
        shared.update(|s| s.is_loading = true);
        Self(shared)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.update(|s| s.is_loading = false);
    }
}

/// Owns the session and performs the calls that change it.
pub struct SessionClient {
    pipeline: Arc<AuthPipeline>,
    shared: Arc<Shared>,
}

impl SessionClient {
    /// Create a client over `pipeline`.
    ///
    /// The session starts authenticated if an access credential is stored;
    /// [`check_auth`](Self::check_auth) confirms it with the server.
    pub fn new(pipeline: Arc<AuthPipeline>) -> Self {
        let session = Session {
            user: None,
            is_authenticated: pipeline.store().has(CredentialKind::Access),
            is_loading: false,
        };
        let shared = Arc::new(Shared {
            session: Mutex::new(session),
            callback: Mutex::new(None),
        });

        let listener = shared.clone();
        pipeline.on_session_expired(move || {
            info!("Session expired, signing out");
            listener.update(Session::reset);
        });

        Self { pipeline, shared }
    }

    /// Set a callback to be notified of session changes.
    pub fn set_state_callback(&self, callback: SessionCallback) {
        *self.shared.callback.lock() = Some(callback);
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.shared.session.lock().clone()
    }

    pub fn pipeline(&self) -> &Arc<AuthPipeline> {
        &self.pipeline
    }

    /// Sign in with email and password.
    ///
    /// The returned user only carries the email; call
    /// [`check_auth`](Self::check_auth) to load the full profile.
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<User> {
        let _loading = LoadingGuard::begin(&self.shared);

        let operation = Operation::mutation(LOGIN_OPERATION, LOGIN_DOCUMENT)
            .with_variable("email", email)
            .with_variable("password", password);

        let data: LoginData = self
            .pipeline
            .execute_as(operation)
            .await
            .inspect_err(|e| warn!(error = %e, "Login failed"))?;
        let issued = data
            .login
            .ok_or_else(|| PipelineError::EmptyResponse(LOGIN_OPERATION.to_string()))?;

        let user = User {
            id: String::new(),
            email: issued
                .user
                .and_then(|u| u.email)
                .unwrap_or_else(|| email.to_string()),
            first_name: None,
            last_name: None,
        };
        self.start_session(
            CredentialPair::new(issued.access_token, issued.refresh_token),
            user.clone(),
        );

        info!(email = %user.email, "Logged in");
        Ok(user)
    }

    /// Create an account and sign in as it.
    pub async fn register(&self, input: &RegisterInput) -> SessionResult<User> {
        let _loading = LoadingGuard::begin(&self.shared);

        let variables = serde_json::to_value(input).map_err(PipelineError::from)?;
        let operation =
            Operation::mutation(REGISTER_OPERATION, REGISTER_DOCUMENT).with_variable("input", variables);

        let data: RegisterData = self
            .pipeline
            .execute_as(operation)
            .await
            .inspect_err(|e| warn!(error = %e, "Registration failed"))?;
        let issued = data
            .register
            .ok_or_else(|| PipelineError::EmptyResponse(REGISTER_OPERATION.to_string()))?;
        let user = issued
            .user
            .ok_or_else(|| PipelineError::EmptyResponse(REGISTER_OPERATION.to_string()))?;

        self.start_session(
            CredentialPair::new(issued.access_token, issued.refresh_token),
            user.clone(),
        );

        info!(user_id = %user.id, email = %user.email, "Registered");
        Ok(user)
    }

    fn start_session(&self, pair: CredentialPair, user: User) {
        let store = self.pipeline.store();
        store.set_pair(&pair);
        self.pipeline.invalidate_cache();

        // Authenticated only if the pair actually persisted.
        if store.pair().as_ref() != Some(&pair) {
            warn!("Issued credentials could not be stored, staying signed out");
            self.shared.update(Session::reset);
            return;
        }
        self.shared.update(|s| {
            s.user = Some(user);
            s.is_authenticated = true;
        });
    }

    /// Sign out locally. Safe to call at any time, any number of times.
    pub fn logout(&self) {
        self.pipeline.store().clear();
        self.pipeline.invalidate_cache();
        self.shared.update(Session::reset);
        info!("Logged out");
    }

    /// Ask the server who the stored credentials belong to.
    ///
    /// Never fails: any error leaves the session signed out. Credentials are
    /// cleared only when the server rejected them.
    pub async fn check_auth(&self) -> bool {
        if !self.pipeline.store().has(CredentialKind::Access) {
            debug!("No access token stored, skipping session check");
            self.shared.update(Session::reset);
            return false;
        }

        let _loading = LoadingGuard::begin(&self.shared);

        let operation = Operation::query(GET_ME_OPERATION, GET_ME_DOCUMENT)
            .with_fetch_policy(FetchPolicy::NetworkOnly);

        match self.pipeline.execute_as::<MeData>(operation).await {
            Ok(MeData { me: Some(user) }) => {
                debug!(user_id = %user.id, "Session confirmed");
                self.shared.update(|s| {
                    s.user = Some(user);
                    s.is_authenticated = true;
                });
                return true;
            }
            Ok(MeData { me: None }) => {
                info!("Server returned no user for stored credentials");
            }
            Err(e) => {
                warn!(error = %e, "Authentication check failed");
                if e.is_unauthenticated() {
                    self.pipeline.store().clear();
                    self.pipeline.invalidate_cache();
                }
            }
        }

        self.shared.update(Session::reset);
        false
    }
}
