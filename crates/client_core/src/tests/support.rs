//! In-process doubles shared by the controller tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{AccountKind, AccountStatus, EvaluationId, User, UserId},
    protocol::{CreateEvaluationRequest, ReplyRequest, UpdateWorkerRequest},
};
use tokio::sync::Notify;

use crate::{
    auth::{AuthApi, AuthOutcome, Credentials, Registration},
    error::{ClientError, ClientResult},
    evaluations::EvaluationApi,
    reviews::{Party, Rating, Review},
    session::SessionController,
    storage::{MemorySessionStore, SessionStore},
    workers::{WorkerDirectory, WorkerSummary},
};

pub fn worker(id: &str, name: &str) -> User {
    User {
        id: UserId::new(id),
        name: name.into(),
        email: format!("{id}@example.com"),
        kind: AccountKind::Worker,
        cpf: Some("52998224725".into()),
        cnpj: None,
        city: Some("Recife".into()),
        bio: None,
        status: Some(AccountStatus::Active),
    }
}

pub fn company(id: &str, name: &str) -> User {
    User {
        id: UserId::new(id),
        name: name.into(),
        email: format!("{id}@example.com"),
        kind: AccountKind::Company,
        cpf: None,
        cnpj: Some("11222333000181".into()),
        city: None,
        bio: None,
        status: None,
    }
}

/// Holds a fake call until released, announcing when it is entered.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct FakeAuthState {
    users_by_token: HashMap<String, User>,
    accounts: HashMap<String, (String, String)>,
    fetch_calls: usize,
    registered: Vec<AccountKind>,
    updates: Vec<UpdateWorkerRequest>,
}

/// Token-keyed account table standing in for the backend auth endpoints.
#[derive(Default)]
pub struct FakeAuth {
    state: Mutex<FakeAuthState>,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `user` so that `token` resolves to it and the email/password
    /// pair logs in with it.
    pub fn add_account(&self, token: &str, password: &str, user: User) {
        let mut state = self.state.lock().expect("fake auth lock");
        state
            .accounts
            .insert(user.email.clone(), (password.to_string(), token.to_string()));
        state.users_by_token.insert(token.to_string(), user);
    }

    /// Makes `token` unknown to subsequent profile fetches.
    pub fn revoke(&self, token: &str) {
        self.state
            .lock()
            .expect("fake auth lock")
            .users_by_token
            .remove(token);
    }

    pub fn set_gate(&self, gate: Arc<Gate>) {
        *self.gate.lock().expect("gate lock") = Some(gate);
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().expect("fake auth lock").fetch_calls
    }

    pub fn registered(&self) -> Vec<AccountKind> {
        self.state.lock().expect("fake auth lock").registered.clone()
    }

    pub fn updates(&self) -> Vec<UpdateWorkerRequest> {
        self.state.lock().expect("fake auth lock").updates.clone()
    }

    fn outcome_for(&self, credentials: &Credentials) -> ClientResult<AuthOutcome> {
        let state = self.state.lock().expect("fake auth lock");
        match state.accounts.get(&credentials.email) {
            Some((password, token)) if *password == credentials.password => Ok(AuthOutcome {
                token: token.clone(),
                user: state.users_by_token[token].clone(),
            }),
            _ => Err(ClientError::Unauthorized {
                message: Some("Credenciais inválidas".into()),
            }),
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthOutcome> {
        self.outcome_for(credentials)
    }

    async fn register(&self, registration: &Registration) -> ClientResult<AuthOutcome> {
        let credentials = registration.credentials();
        {
            let mut state = self.state.lock().expect("fake auth lock");
            state.registered.push(registration.kind());
            let user = match registration {
                Registration::Worker(w) => User {
                    status: Some(AccountStatus::PendingValidation),
                    ..worker("new-worker", &w.full_name)
                },
                Registration::Company(c) => company("new-company", &c.trade_name),
            };
            let user = User {
                email: credentials.email.clone(),
                ..user
            };
            let token = format!("token-{}", user.id);
            state.accounts.insert(
                credentials.email.clone(),
                (credentials.password.clone(), token.clone()),
            );
            state.users_by_token.insert(token, user);
        }
        self.outcome_for(&credentials)
    }

    async fn fetch_profile(&self, token: &str) -> ClientResult<User> {
        let gate = self.gate.lock().expect("gate lock").clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let mut state = self.state.lock().expect("fake auth lock");
        state.fetch_calls += 1;
        state
            .users_by_token
            .get(token)
            .cloned()
            .ok_or(ClientError::Unauthorized { message: None })
    }

    async fn update_worker_profile(
        &self,
        token: &str,
        worker_id: &UserId,
        update: &UpdateWorkerRequest,
    ) -> ClientResult<User> {
        let mut state = self.state.lock().expect("fake auth lock");
        state.updates.push(update.clone());
        let user = state
            .users_by_token
            .get_mut(token)
            .filter(|user| &user.id == worker_id)
            .ok_or(ClientError::Unauthorized { message: None })?;
        user.bio = update.sobre.clone();
        Ok(user.clone())
    }
}

/// Session already signed in as `user`, backed by an in-memory store.
pub async fn signed_in_session(user: User) -> (Arc<SessionController>, Arc<FakeAuth>) {
    let auth = FakeAuth::new();
    let token = format!("token-{}", user.id);
    let credentials = Credentials {
        email: user.email.clone(),
        password: "secret".into(),
    };
    auth.add_account(&token, "secret", user);
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let session = Arc::new(SessionController::new(auth.clone(), store));
    session.login(&credentials).await.expect("login");
    (session, auth)
}

pub fn anonymous_session() -> Arc<SessionController> {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    Arc::new(SessionController::new(FakeAuth::new(), store))
}

pub fn review(id: &str, author: Option<&str>, score: f64) -> Review {
    Review {
        id: EvaluationId::new(id),
        author: Party {
            id: author.map(UserId::new),
            name: author.unwrap_or("Empresa").to_string(),
        },
        target: Party {
            id: Some(UserId::new("w-1")),
            name: "Ana Souza".into(),
        },
        rating: Rating::direct(score),
        comment: "Bom trabalho".into(),
        reply: None,
        created_at: None,
    }
}

#[derive(Default)]
struct FakeEvaluationsState {
    received: Vec<Review>,
    authored: Vec<Review>,
    history: HashMap<UserId, Vec<Review>>,
    created: Vec<CreateEvaluationRequest>,
    replies: Vec<(EvaluationId, String)>,
    list_calls: usize,
}

/// Evaluation lists kept in memory; mutations show up on the next listing.
#[derive(Default)]
pub struct FakeEvaluations {
    state: Mutex<FakeEvaluationsState>,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeEvaluations {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_received(&self, reviews: Vec<Review>) {
        self.state.lock().expect("fake evaluations lock").received = reviews;
    }

    pub fn set_authored(&self, reviews: Vec<Review>) {
        self.state.lock().expect("fake evaluations lock").authored = reviews;
    }

    pub fn set_history(&self, worker_id: &str, reviews: Vec<Review>) {
        self.state
            .lock()
            .expect("fake evaluations lock")
            .history
            .insert(UserId::new(worker_id), reviews);
    }

    /// The next `received` call snapshots its answer, then waits on `gate`.
    pub fn gate_next_listing(&self, gate: Arc<Gate>) {
        *self.gate.lock().expect("gate lock") = Some(gate);
    }

    pub fn created(&self) -> Vec<CreateEvaluationRequest> {
        self.state.lock().expect("fake evaluations lock").created.clone()
    }

    pub fn replies(&self) -> Vec<(EvaluationId, String)> {
        self.state.lock().expect("fake evaluations lock").replies.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().expect("fake evaluations lock").list_calls
    }
}

#[async_trait]
impl EvaluationApi for FakeEvaluations {
    async fn received(&self, _token: &str) -> ClientResult<Vec<Review>> {
        let snapshot = {
            let mut state = self.state.lock().expect("fake evaluations lock");
            state.list_calls += 1;
            state.received.clone()
        };
        let gate = self.gate.lock().expect("gate lock").take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(snapshot)
    }

    async fn authored(&self, _token: &str) -> ClientResult<Vec<Review>> {
        let mut state = self.state.lock().expect("fake evaluations lock");
        state.list_calls += 1;
        Ok(state.authored.clone())
    }

    async fn worker_history(&self, _token: &str, worker_id: &UserId) -> ClientResult<Vec<Review>> {
        let mut state = self.state.lock().expect("fake evaluations lock");
        state.list_calls += 1;
        Ok(state.history.get(worker_id).cloned().unwrap_or_default())
    }

    async fn create(&self, _token: &str, request: &CreateEvaluationRequest) -> ClientResult<()> {
        let mut state = self.state.lock().expect("fake evaluations lock");
        let mut created = review(
            &format!("new-{}", state.created.len()),
            Some(request.empresa_id.as_str()),
            f64::from(request.nota),
        );
        created.target.id = Some(request.funcionario_id.clone());
        state
            .history
            .entry(request.funcionario_id.clone())
            .or_default()
            .push(created);
        state.created.push(request.clone());
        Ok(())
    }

    async fn reply(
        &self,
        _token: &str,
        evaluation_id: &EvaluationId,
        request: &ReplyRequest,
    ) -> ClientResult<()> {
        let mut state = self.state.lock().expect("fake evaluations lock");
        state
            .replies
            .push((evaluation_id.clone(), request.resposta.clone()));
        if let Some(review) = state.received.iter_mut().find(|r| &r.id == evaluation_id) {
            review.reply = Some(request.resposta.clone());
        }
        Ok(())
    }
}

/// Worker directory over a fixed list; search matches on name substrings.
#[derive(Default)]
pub struct FakeDirectory {
    workers: Vec<WorkerSummary>,
    searches: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn with_workers(workers: Vec<WorkerSummary>) -> Arc<Self> {
        Arc::new(Self {
            workers,
            searches: Mutex::new(Vec::new()),
        })
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().expect("fake directory lock").clone()
    }
}

pub fn worker_summary(id: &str, name: &str) -> WorkerSummary {
    WorkerSummary {
        id: UserId::new(id),
        full_name: name.into(),
        email: format!("{id}@example.com"),
        city: Some("Recife".into()),
        bio: Some("Eletricista".into()),
        status: Some(AccountStatus::Active),
        face_photo_url: None,
    }
}

#[async_trait]
impl WorkerDirectory for FakeDirectory {
    async fn search(&self, _token: Option<&str>, term: &str) -> ClientResult<Vec<WorkerSummary>> {
        self.searches
            .lock()
            .expect("fake directory lock")
            .push(term.to_string());
        let needle = term.to_lowercase();
        Ok(self
            .workers
            .iter()
            .filter(|w| w.full_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn worker(&self, _token: &str, worker_id: &UserId) -> ClientResult<WorkerSummary> {
        self.workers
            .iter()
            .find(|w| &w.id == worker_id)
            .cloned()
            .ok_or(ClientError::Rejected {
                status: reqwest::StatusCode::NOT_FOUND,
                message: Some("Funcionário não encontrado".into()),
            })
    }
}
