use std::sync::Arc;

use serde::Serialize;
use shared::domain::{AccountKind, User, UserId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    error::{ClientError, ClientResult},
    evaluations::EvaluationApi,
    fence::RequestFence,
    reviews::{summarize, Review},
    session::SessionController,
    workers::{WorkerDirectory, WorkerSummary},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerProfile {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub average_rating: f64,
    pub total_reviews: usize,
    pub reviews: Vec<Review>,
}

impl WorkerProfile {
    fn compose(
        user_id: UserId,
        full_name: String,
        email: String,
        cpf: Option<String>,
        city: Option<String>,
        bio: Option<String>,
        reviews: Vec<Review>,
    ) -> Self {
        let summary = summarize(&reviews);
        Self {
            user_id,
            full_name,
            email,
            cpf,
            city,
            bio,
            average_rating: summary.average_rating,
            total_reviews: summary.total_reviews,
            reviews,
        }
    }

    pub fn from_user(user: User, reviews: Vec<Review>) -> Self {
        Self::compose(
            user.id, user.name, user.email, user.cpf, user.city, user.bio, reviews,
        )
    }

    pub fn from_summary(worker: WorkerSummary, reviews: Vec<Review>) -> Self {
        Self::compose(
            worker.id,
            worker.full_name,
            worker.email,
            None,
            worker.city,
            worker.bio,
            reviews,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyProfile {
    pub user_id: UserId,
    pub company_name: String,
    pub cnpj: String,
    pub email: String,
    pub description: Option<String>,
    pub total_authored: usize,
    pub authored: Vec<Review>,
}

impl CompanyProfile {
    pub fn from_user(user: User, authored: Vec<Review>) -> Self {
        Self {
            user_id: user.id,
            company_name: user.name,
            cnpj: user.cnpj.unwrap_or_default(),
            email: user.email,
            description: user.bio,
            total_authored: authored.len(),
            authored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileView {
    Worker(WorkerProfile),
    Company(CompanyProfile),
}

/// Builds profile read models from the session user and evaluation data.
pub struct ProfileController {
    session: Arc<SessionController>,
    evaluations: Arc<dyn EvaluationApi>,
    directory: Arc<dyn WorkerDirectory>,
    fence: RequestFence,
    current: RwLock<Option<ProfileView>>,
}

impl ProfileController {
    pub fn new(
        session: Arc<SessionController>,
        evaluations: Arc<dyn EvaluationApi>,
        directory: Arc<dyn WorkerDirectory>,
    ) -> Self {
        Self {
            session,
            evaluations,
            directory,
            fence: RequestFence::new(),
            current: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> Option<ProfileView> {
        self.current.read().await.clone()
    }

    /// Profile of the signed-in account.
    pub async fn load(&self) -> ClientResult<ProfileView> {
        let user = self.session.user().await.ok_or(ClientError::NotAuthenticated)?;
        let token = self.session.token().await.ok_or(ClientError::NotAuthenticated)?;
        let ticket = self.fence.issue();

        let view = match user.kind {
            AccountKind::Worker => {
                let reviews = self.evaluations.received(&token).await?;
                ProfileView::Worker(WorkerProfile::from_user(user, reviews))
            }
            AccountKind::Company => {
                let authored = self.evaluations.authored(&token).await?;
                ProfileView::Company(CompanyProfile::from_user(user, authored))
            }
        };

        let mut current = self.current.write().await;
        if self.fence.is_current(ticket) {
            *current = Some(view.clone());
        } else {
            debug!("profile: stale response dropped");
        }
        Ok(view)
    }

    /// Public profile of any worker, as a company sees it.
    pub async fn load_worker(&self, worker_id: &UserId) -> ClientResult<WorkerProfile> {
        let token = self.session.token().await.ok_or(ClientError::NotAuthenticated)?;
        let worker = self.directory.worker(&token, worker_id).await?;
        let history = self.evaluations.worker_history(&token, worker_id).await?;
        Ok(WorkerProfile::from_summary(worker, history))
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
