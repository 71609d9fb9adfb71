use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{AccountStatus, UserId},
    protocol::{SearchQuery, WorkerDetails},
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    error::ClientResult,
    fence::RequestFence,
    http::HttpBackend,
    session::SessionController,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub status: Option<AccountStatus>,
    pub face_photo_url: Option<String>,
}

impl From<WorkerDetails> for WorkerSummary {
    fn from(details: WorkerDetails) -> Self {
        Self {
            id: details.id,
            full_name: details.nome_completo,
            email: details.email,
            city: details.cidade,
            bio: details.sobre,
            status: details.status,
            face_photo_url: details.foto_rosto_url,
        }
    }
}

#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Free-text search; the backend accepts it without a token.
    async fn search(&self, token: Option<&str>, term: &str) -> ClientResult<Vec<WorkerSummary>>;
    async fn worker(&self, token: &str, worker_id: &UserId) -> ClientResult<WorkerSummary>;
}

#[async_trait]
impl WorkerDirectory for HttpBackend {
    async fn search(&self, token: Option<&str>, term: &str) -> ClientResult<Vec<WorkerSummary>> {
        let found: Vec<WorkerDetails> = self
            .get_json_with_query(
                "/funcionarios/buscar",
                token,
                &SearchQuery {
                    termo: term.to_string(),
                },
            )
            .await?;
        Ok(found.into_iter().map(WorkerSummary::from).collect())
    }

    async fn worker(&self, token: &str, worker_id: &UserId) -> ClientResult<WorkerSummary> {
        let details: WorkerDetails = self
            .get_json(&format!("/funcionarios/{worker_id}"), Some(token))
            .await?;
        Ok(details.into())
    }
}

/// Search-as-you-type: a query is dispatched only if no newer query arrives
/// within the debounce window, and only the latest response is kept.
pub struct WorkerSearch {
    directory: Arc<dyn WorkerDirectory>,
    session: Arc<SessionController>,
    debounce: Duration,
    fence: RequestFence,
    results: RwLock<Vec<WorkerSummary>>,
}

impl WorkerSearch {
    pub fn new(
        directory: Arc<dyn WorkerDirectory>,
        session: Arc<SessionController>,
        debounce: Duration,
    ) -> Self {
        Self {
            directory,
            session,
            debounce,
            fence: RequestFence::new(),
            results: RwLock::new(Vec::new()),
        }
    }

    pub async fn results(&self) -> Vec<WorkerSummary> {
        self.results.read().await.clone()
    }

    /// Returns `None` when a newer query superseded this one, either during
    /// the debounce wait or while the request was in flight.
    pub async fn query(&self, text: &str) -> ClientResult<Option<Vec<WorkerSummary>>> {
        let ticket = self.fence.issue();
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.fence.is_current(ticket) {
            debug!("search: keystroke superseded before dispatch");
            return Ok(None);
        }

        let term = text.trim();
        if term.is_empty() {
            self.results.write().await.clear();
            return Ok(Some(Vec::new()));
        }

        let token = self.session.token().await;
        let found = self.directory.search(token.as_deref(), term).await?;

        let mut results = self.results.write().await;
        if !self.fence.is_current(ticket) {
            debug!(term, "search: stale response dropped");
            return Ok(None);
        }
        *results = found.clone();
        Ok(Some(found))
    }
}

#[cfg(test)]
#[path = "tests/workers_tests.rs"]
mod tests;
