use std::sync::Arc;

use shared::{
    domain::{AccountKind, User},
    protocol::UpdateWorkerRequest,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    auth::{AuthApi, AuthOutcome, Credentials, Registration},
    error::{ClientError, ClientResult},
    fence::RequestFence,
    storage::{self, SessionStore},
};

pub const PUBLIC_ROUTES: [&str; 3] = ["/selection", "/login", "/register"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Active,
    PendingApproval,
}

impl AccessLevel {
    fn for_user(user: &User) -> Self {
        if user.is_pending_approval() {
            Self::PendingApproval
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Bootstrapping,
    Anonymous,
    /// `degraded` is set when the user came from the local cache because the
    /// profile refresh failed.
    Authenticated { access: AccessLevel, degraded: bool },
}

/// Navigation decision handed back to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Home,
    Selection,
    Login { kind: AccountKind },
    PendingApproval,
    Profile,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Selection => "/selection",
            Self::Login {
                kind: AccountKind::Worker,
            } => "/login?type=worker",
            Self::Login {
                kind: AccountKind::Company,
            } => "/login?type=company",
            Self::PendingApproval => "/pending-approval",
            Self::Profile => "/profile",
        }
    }

    fn after_sign_in(user: &User) -> Self {
        match AccessLevel::for_user(user) {
            AccessLevel::PendingApproval => Self::PendingApproval,
            AccessLevel::Active => Self::Profile,
        }
    }
}

/// Route without its query string or fragment.
fn route_path(route: &str) -> &str {
    route.split(['?', '#']).next().unwrap_or_default()
}

pub fn is_public_route(route: &str) -> bool {
    let path = route_path(route);
    path.is_empty() || path == "/" || PUBLIC_ROUTES.iter().any(|p| path.starts_with(p))
}

/// Routes only a company account may open.
fn is_company_route(route: &str) -> bool {
    let path = route_path(route);
    path.starts_with("/search") || path.starts_with("/worker/") || path.starts_with("/evaluate")
}

struct SessionInner {
    state: SessionState,
    token: Option<String>,
    user: Option<User>,
    loading: bool,
}

impl SessionInner {
    fn authenticate(&mut self, token: String, user: User, degraded: bool) {
        self.state = SessionState::Authenticated {
            access: AccessLevel::for_user(&user),
            degraded,
        };
        self.token = Some(token);
        self.user = Some(user);
    }

    fn clear(&mut self) {
        self.state = SessionState::Anonymous;
        self.token = None;
        self.user = None;
        self.loading = false;
    }
}

/// Owns the authenticated session for one client instance.
///
/// Background refreshes (bootstrap, profile refresh) take a fence ticket and
/// only commit if no sign-in or logout completed meanwhile. Sign-in and logout
/// always commit and invalidate outstanding refreshes. Bootstrap and profile
/// refresh are fenced separately so that neither can strand the other.
pub struct SessionController {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    inner: RwLock<SessionInner>,
    fence: RequestFence,
    profile_fence: RequestFence,
}

impl SessionController {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            inner: RwLock::new(SessionInner {
                state: SessionState::Bootstrapping,
                token: None,
                user: None,
                loading: true,
            }),
            fence: RequestFence::new(),
            profile_fence: RequestFence::new(),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.user.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.state().await, SessionState::Authenticated { .. })
    }

    /// Restores the session from storage. Never fails: backend errors fall
    /// back to the cached user, or to the anonymous state. Returns a redirect
    /// when the resulting state may not stay on `current_route`.
    pub async fn bootstrap(&self, current_route: &str) -> Option<Destination> {
        let ticket = self.fence.issue();
        {
            let mut inner = self.inner.write().await;
            inner.state = SessionState::Bootstrapping;
            inner.loading = true;
        }

        let stored_token = storage::load_token(self.store.as_ref()).unwrap_or_else(|err| {
            warn!("session: could not read stored token: {err:#}");
            None
        });

        let Some(token) = stored_token else {
            let mut inner = self.inner.write().await;
            if self.fence.is_current(ticket) {
                inner.clear();
            }
            drop(inner);
            return self.guard(current_route).await;
        };

        let fetched = self.api.fetch_profile(&token).await;

        let mut inner = self.inner.write().await;
        if !self.fence.is_current(ticket) {
            debug!("session: bootstrap result superseded");
            return None;
        }

        match fetched {
            Ok(user) => {
                if let Err(err) = storage::save_user(self.store.as_ref(), &user) {
                    warn!("session: could not cache refreshed user: {err:#}");
                }
                info!(user_id = %user.id, "session: restored from stored token");
                inner.authenticate(token, user, false);
            }
            Err(err) => {
                let cached = storage::load_cached_user(self.store.as_ref()).unwrap_or_else(|e| {
                    warn!("session: could not read cached user: {e:#}");
                    None
                });
                match cached {
                    Some(user) => {
                        warn!(user_id = %user.id, "session: profile refresh failed ({err}), using cached user");
                        inner.authenticate(token, user, true);
                    }
                    None => {
                        warn!("session: stored token rejected ({err}), clearing session");
                        if let Err(e) = storage::clear_session(self.store.as_ref()) {
                            warn!("session: could not clear stale token: {e:#}");
                        }
                        inner.clear();
                    }
                }
            }
        }
        inner.loading = false;
        drop(inner);

        self.guard(current_route).await
    }

    /// Route gate for the current state: anonymous sessions may only open
    /// public routes, pending accounts only the pending-approval view, and
    /// company-only routes send workers back to their profile.
    pub async fn guard(&self, route: &str) -> Option<Destination> {
        let inner = self.inner.read().await;
        match (inner.state, inner.user.as_ref()) {
            (SessionState::Bootstrapping, _) => None,
            (SessionState::Anonymous, _) | (SessionState::Authenticated { .. }, None) => {
                (!is_public_route(route)).then_some(Destination::Selection)
            }
            (
                SessionState::Authenticated {
                    access: AccessLevel::PendingApproval,
                    ..
                },
                _,
            ) => (!is_public_route(route)
                && !route_path(route).starts_with(Destination::PendingApproval.path()))
                .then_some(Destination::PendingApproval),
            (SessionState::Authenticated { .. }, Some(user)) => {
                (is_company_route(route) && user.kind != AccountKind::Company)
                    .then_some(Destination::Profile)
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<Destination> {
        self.begin_action().await;
        let result = self.api.login(credentials).await;
        self.finish_sign_in(result).await
    }

    pub async fn register(&self, registration: &Registration) -> ClientResult<Destination> {
        self.begin_action().await;
        let result = self.api.register(registration).await;
        self.finish_sign_in(result).await
    }

    async fn begin_action(&self) {
        self.inner.write().await.loading = true;
    }

    async fn finish_sign_in(&self, result: ClientResult<AuthOutcome>) -> ClientResult<Destination> {
        let mut inner = self.inner.write().await;
        inner.loading = false;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("session: sign-in failed: {err}");
                return Err(err);
            }
        };

        self.invalidate_refreshes();
        if let Err(err) = storage::save_session(self.store.as_ref(), &outcome.token, &outcome.user)
        {
            warn!("session: could not persist session: {err:#}");
        }
        let destination = Destination::after_sign_in(&outcome.user);
        info!(user_id = %outcome.user.id, destination = destination.path(), "session: signed in");
        inner.authenticate(outcome.token, outcome.user, false);
        Ok(destination)
    }

    fn invalidate_refreshes(&self) {
        self.fence.invalidate();
        self.profile_fence.invalidate();
    }

    /// Clears the session. Workers land on the worker login, everyone else on
    /// the account-kind selection.
    pub async fn logout(&self) -> Destination {
        let kind = self.clear().await;
        match kind {
            Some(AccountKind::Worker) => Destination::Login {
                kind: AccountKind::Worker,
            },
            _ => Destination::Selection,
        }
    }

    pub async fn logout_to_selection(&self) -> Destination {
        self.clear().await;
        Destination::Selection
    }

    async fn clear(&self) -> Option<AccountKind> {
        self.invalidate_refreshes();
        let mut inner = self.inner.write().await;
        let kind = inner.user.as_ref().map(|u| u.kind);
        inner.clear();
        if let Err(err) = storage::clear_session(self.store.as_ref()) {
            warn!("session: could not clear stored session: {err:#}");
        }
        info!("session: logged out");
        kind
    }

    /// Re-fetches the profile behind the current token and replaces the user.
    pub async fn refresh_profile(&self) -> ClientResult<User> {
        let token = self.token().await.ok_or(ClientError::NotAuthenticated)?;
        let ticket = self.profile_fence.issue();
        let user = self.api.fetch_profile(&token).await?;

        let mut inner = self.inner.write().await;
        if self.profile_fence.is_current(ticket) && inner.token.as_deref() == Some(token.as_str()) {
            if let Err(err) = storage::save_user(self.store.as_ref(), &user) {
                warn!("session: could not cache refreshed user: {err:#}");
            }
            inner.authenticate(token, user.clone(), false);
        } else {
            debug!("session: profile refresh superseded");
        }
        Ok(user)
    }

    pub async fn update_bio(&self, bio: &str) -> ClientResult<User> {
        let user = self.user().await.ok_or(ClientError::NotAuthenticated)?;
        if user.kind != AccountKind::Worker {
            return Err(ClientError::Validation(
                "Apenas profissionais possuem biografia editável".to_string(),
            ));
        }
        let token = self.token().await.ok_or(ClientError::NotAuthenticated)?;
        let update = UpdateWorkerRequest {
            nome_completo: user.name.clone(),
            email: user.email.clone(),
            cidade: user.city.clone(),
            sobre: Some(bio.trim().to_string()),
        };
        self.api
            .update_worker_profile(&token, &user.id, &update)
            .await?;
        self.refresh_profile().await
    }

    /// Drops in-memory state and makes in-flight refreshes stale. Storage is
    /// left untouched so the next bootstrap can restore the session.
    pub async fn teardown(&self) {
        self.invalidate_refreshes();
        let mut inner = self.inner.write().await;
        inner.state = SessionState::Bootstrapping;
        inner.token = None;
        inner.user = None;
        inner.loading = true;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
