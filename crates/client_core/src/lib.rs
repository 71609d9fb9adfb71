use std::sync::Arc;

use anyhow::Result;
use tracing::info;

pub mod auth;
pub mod config;
pub mod error;
pub mod evaluations;
pub mod fence;
pub mod http;
pub mod profile;
pub mod reviews;
pub mod session;
pub mod storage;
pub mod workers;

pub use auth::{AuthApi, Credentials, PhotoUpload, Registration};
pub use config::{load_settings, Settings};
pub use error::{ClientError, ClientResult};
pub use evaluations::{Audience, EvaluationApi, EvaluationBoard, NewEvaluation};
pub use http::HttpBackend;
pub use profile::{CompanyProfile, ProfileController, ProfileView, WorkerProfile};
pub use reviews::{MetricScale, Rating, Review, ReviewSummary};
pub use session::{Destination, SessionController, SessionState};
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
pub use workers::{WorkerDirectory, WorkerSearch, WorkerSummary};

/// Application root: owns the backend handle and the session, and hands out
/// controllers wired to them.
pub struct ClientContext {
    settings: Settings,
    auth: Arc<dyn AuthApi>,
    evaluations: Arc<dyn EvaluationApi>,
    directory: Arc<dyn WorkerDirectory>,
    session: Arc<SessionController>,
}

impl ClientContext {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match &settings.session_path {
            Some(path) => Arc::new(FileSessionStore::open(path)?),
            None => Arc::new(MemorySessionStore::new()),
        };
        let backend = Arc::new(HttpBackend::from_settings(&settings)?);
        Ok(Self::with_dependencies(
            settings,
            store,
            backend.clone(),
            backend.clone(),
            backend,
        ))
    }

    pub fn with_dependencies(
        settings: Settings,
        store: Arc<dyn SessionStore>,
        auth: Arc<dyn AuthApi>,
        evaluations: Arc<dyn EvaluationApi>,
        directory: Arc<dyn WorkerDirectory>,
    ) -> Self {
        let session = Arc::new(SessionController::new(auth.clone(), store));
        Self {
            settings,
            auth,
            evaluations,
            directory,
            session,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn auth(&self) -> Arc<dyn AuthApi> {
        self.auth.clone()
    }

    pub fn session(&self) -> Arc<SessionController> {
        self.session.clone()
    }

    /// Restores any stored session; returns a redirect for `current_route`
    /// when the restored state does not allow it.
    pub async fn init(&self, current_route: &str) -> Option<Destination> {
        let redirect = self.session.bootstrap(current_route).await;
        info!(
            state = ?self.session.state().await,
            redirect = redirect.map(|d| d.path()),
            "context: initialized"
        );
        redirect
    }

    pub async fn teardown(&self) {
        self.session.teardown().await;
        info!("context: torn down");
    }

    pub fn evaluation_board(&self, audience: Audience) -> EvaluationBoard {
        EvaluationBoard::new(self.evaluations.clone(), self.session.clone(), audience)
    }

    pub fn profile_controller(&self) -> ProfileController {
        ProfileController::new(
            self.session.clone(),
            self.evaluations.clone(),
            self.directory.clone(),
        )
    }

    pub fn worker_search(&self) -> WorkerSearch {
        WorkerSearch::new(
            self.directory.clone(),
            self.session.clone(),
            self.settings.search_debounce,
        )
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
