use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{AccountKind, EvaluationId, UserId},
    protocol::{CreateEvaluationRequest, EvaluationDetails, ReplyRequest},
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    error::{ClientError, ClientResult},
    fence::RequestFence,
    http::HttpBackend,
    reviews::{
        can_evaluate, decode_reviews, rounded_star_mean, summarize, validate_reply, Review,
        ReviewSummary,
    },
    session::SessionController,
};

#[async_trait]
pub trait EvaluationApi: Send + Sync {
    /// Evaluations received by the authenticated worker.
    async fn received(&self, token: &str) -> ClientResult<Vec<Review>>;
    /// Evaluations written by the authenticated company.
    async fn authored(&self, token: &str) -> ClientResult<Vec<Review>>;
    async fn worker_history(&self, token: &str, worker_id: &UserId) -> ClientResult<Vec<Review>>;
    async fn create(&self, token: &str, request: &CreateEvaluationRequest) -> ClientResult<()>;
    async fn reply(
        &self,
        token: &str,
        evaluation_id: &EvaluationId,
        request: &ReplyRequest,
    ) -> ClientResult<()>;
}

#[async_trait]
impl EvaluationApi for HttpBackend {
    async fn received(&self, token: &str) -> ClientResult<Vec<Review>> {
        let dtos: Vec<EvaluationDetails> = self.get_json("/avaliacoes/minhas", Some(token)).await?;
        Ok(decode_reviews(dtos, self.metric_scale()))
    }

    async fn authored(&self, token: &str) -> ClientResult<Vec<Review>> {
        let dtos: Vec<EvaluationDetails> = self
            .get_json("/avaliacoes/minhas-avaliacoes", Some(token))
            .await?;
        Ok(decode_reviews(dtos, self.metric_scale()))
    }

    async fn worker_history(&self, token: &str, worker_id: &UserId) -> ClientResult<Vec<Review>> {
        let dtos: Vec<EvaluationDetails> = self
            .get_json(&format!("/avaliacoes/funcionario/{worker_id}"), Some(token))
            .await?;
        Ok(decode_reviews(dtos, self.metric_scale()))
    }

    async fn create(&self, token: &str, request: &CreateEvaluationRequest) -> ClientResult<()> {
        self.post_json_ignoring_body("/avaliacoes/criar", Some(token), request)
            .await
    }

    async fn reply(
        &self,
        token: &str,
        evaluation_id: &EvaluationId,
        request: &ReplyRequest,
    ) -> ClientResult<()> {
        self.post_json_ignoring_body(
            &format!("/avaliacoes/{evaluation_id}/responder"),
            Some(token),
            request,
        )
        .await
    }
}

/// Which evaluation list a board tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Received,
    Authored,
    History(UserId),
}

/// A company's evaluation of a worker, each metric on the 1–5 scale.
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub worker_id: UserId,
    pub assiduity: u8,
    pub technical: u8,
    pub behavioral: u8,
    pub comment: String,
}

impl NewEvaluation {
    fn validate(&self) -> ClientResult<()> {
        for (name, value) in [
            ("assiduidade", self.assiduity),
            ("técnica", self.technical),
            ("comportamental", self.behavioral),
        ] {
            if !(1..=5).contains(&value) {
                return Err(ClientError::Validation(format!(
                    "A nota de {name} deve estar entre 1 e 5"
                )));
            }
        }
        if self.comment.trim().is_empty() {
            return Err(ClientError::Validation(
                "A descrição/comentário é obrigatória".to_string(),
            ));
        }
        Ok(())
    }

    fn into_request(self, company_id: UserId) -> CreateEvaluationRequest {
        CreateEvaluationRequest {
            funcionario_id: self.worker_id,
            empresa_id: company_id,
            nota: rounded_star_mean(self.assiduity, self.technical, self.behavioral),
            nota_assiduidade: self.assiduity,
            nota_tecnica: self.technical,
            nota_comportamental: self.behavioral,
            descricao: self.comment.trim().to_string(),
        }
    }
}

/// Holds one evaluation list and runs the reply/submit workflows against it.
/// Every mutation is followed by a refetch; the list is never patched locally.
pub struct EvaluationBoard {
    api: Arc<dyn EvaluationApi>,
    session: Arc<SessionController>,
    audience: Audience,
    reviews: RwLock<Vec<Review>>,
    fence: RequestFence,
}

impl EvaluationBoard {
    pub fn new(
        api: Arc<dyn EvaluationApi>,
        session: Arc<SessionController>,
        audience: Audience,
    ) -> Self {
        Self {
            api,
            session,
            audience,
            reviews: RwLock::new(Vec::new()),
            fence: RequestFence::new(),
        }
    }

    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    pub async fn reviews(&self) -> Vec<Review> {
        self.reviews.read().await.clone()
    }

    pub async fn summary(&self) -> ReviewSummary {
        summarize(&self.reviews.read().await)
    }

    pub async fn refresh(&self) -> ClientResult<Vec<Review>> {
        let token = self.session.token().await.ok_or(ClientError::NotAuthenticated)?;
        let ticket = self.fence.issue();
        let fetched = match &self.audience {
            Audience::Received => self.api.received(&token).await?,
            Audience::Authored => self.api.authored(&token).await?,
            Audience::History(worker_id) => self.api.worker_history(&token, worker_id).await?,
        };

        let mut guard = self.reviews.write().await;
        if self.fence.is_current(ticket) {
            *guard = fetched.clone();
        } else {
            debug!(audience = ?self.audience, "evaluations: stale response dropped");
        }
        Ok(fetched)
    }

    /// Whether `company_id` may still evaluate the worker whose history this
    /// board holds.
    pub async fn can_submit_for(&self, company_id: &UserId) -> bool {
        can_evaluate(&self.reviews.read().await, company_id)
    }

    pub async fn reply(&self, evaluation_id: &EvaluationId, text: &str) -> ClientResult<Vec<Review>> {
        let resposta = validate_reply(text)?;
        let already_replied = self
            .reviews
            .read()
            .await
            .iter()
            .any(|review| &review.id == evaluation_id && review.has_reply());
        if already_replied {
            return Err(ClientError::AlreadyReplied(evaluation_id.to_string()));
        }

        let token = self.session.token().await.ok_or(ClientError::NotAuthenticated)?;
        self.api
            .reply(&token, evaluation_id, &ReplyRequest { resposta })
            .await?;
        info!(evaluation_id = %evaluation_id, "evaluations: reply submitted");
        self.refresh().await
    }

    /// Submits a company evaluation after checking the worker's history for
    /// an earlier one by the same company.
    pub async fn submit(&self, evaluation: NewEvaluation) -> ClientResult<Vec<Review>> {
        evaluation.validate()?;
        let user = self.session.user().await.ok_or(ClientError::NotAuthenticated)?;
        if user.kind != AccountKind::Company {
            return Err(ClientError::Validation(
                "Apenas empresas podem avaliar profissionais".to_string(),
            ));
        }
        let token = self.session.token().await.ok_or(ClientError::NotAuthenticated)?;

        let history = self
            .api
            .worker_history(&token, &evaluation.worker_id)
            .await?;
        if !can_evaluate(&history, &user.id) {
            return Err(ClientError::DuplicateEvaluation);
        }

        let worker_id = evaluation.worker_id.clone();
        self.api
            .create(&token, &evaluation.into_request(user.id.clone()))
            .await?;
        info!(company_id = %user.id, worker_id = %worker_id, "evaluations: evaluation submitted");
        self.refresh().await
    }
}

#[cfg(test)]
#[path = "tests/evaluations_tests.rs"]
mod tests;
