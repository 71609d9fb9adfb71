use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::{
    domain::{AccountKind, User, UserId},
    protocol::{
        CompanyDetails, CompanyRegistrationRequest, LoginRequest, TokenResponse,
        UpdateWorkerRequest, WorkerDetails, WorkerRegistrationRequest,
    },
};
use tracing::{debug, info};

use crate::{
    error::{ClientError, ClientResult},
    http::HttpBackend,
};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Image captured by the front end, sent inline as a data URL.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone)]
pub struct WorkerRegistration {
    pub full_name: String,
    pub cpf: String,
    pub email: String,
    pub password: String,
    pub face_photo: PhotoUpload,
    pub document_photo: PhotoUpload,
    pub city: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompanyRegistration {
    pub legal_name: String,
    pub trade_name: String,
    pub cnpj: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub enum Registration {
    Worker(WorkerRegistration),
    Company(CompanyRegistration),
}

impl Registration {
    pub fn kind(&self) -> AccountKind {
        match self {
            Self::Worker(_) => AccountKind::Worker,
            Self::Company(_) => AccountKind::Company,
        }
    }

    pub fn credentials(&self) -> Credentials {
        let (email, password) = match self {
            Self::Worker(w) => (&w.email, &w.password),
            Self::Company(c) => (&c.email, &c.password),
        };
        Credentials {
            email: email.clone(),
            password: password.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub token: String,
    pub user: User,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthOutcome>;
    async fn register(&self, registration: &Registration) -> ClientResult<AuthOutcome>;
    /// Resolves the account behind `token`, whichever kind it is.
    async fn fetch_profile(&self, token: &str) -> ClientResult<User>;
    async fn update_worker_profile(
        &self,
        token: &str,
        worker_id: &UserId,
        update: &UpdateWorkerRequest,
    ) -> ClientResult<User>;
}

pub fn user_from_worker(details: WorkerDetails) -> User {
    User {
        id: details.id,
        name: details.nome_completo,
        email: details.email,
        kind: AccountKind::Worker,
        cpf: details.cpf,
        cnpj: None,
        city: details.cidade,
        bio: details.sobre,
        status: details.status,
    }
}

pub fn user_from_company(details: CompanyDetails) -> User {
    let name = details
        .nome_fantasia
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(details.razao_social);
    User {
        id: details.id,
        name,
        email: details.email,
        kind: AccountKind::Company,
        cpf: None,
        cnpj: Some(details.cnpj),
        city: None,
        bio: None,
        status: details.status,
    }
}

/// Transport failures end the lookup; any backend answer means "not this kind".
fn lookup_failed_for_kind(err: &ClientError) -> bool {
    !matches!(err, ClientError::Transport(_))
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthOutcome> {
        let response: TokenResponse = self
            .post_json(
                "/login",
                None,
                &LoginRequest {
                    email: credentials.email.clone(),
                    senha: credentials.password.clone(),
                },
            )
            .await?;
        let user = self.fetch_profile(&response.token).await?;
        info!(user_id = %user.id, kind = ?user.kind, "auth: login succeeded");
        Ok(AuthOutcome {
            token: response.token,
            user,
        })
    }

    async fn register(&self, registration: &Registration) -> ClientResult<AuthOutcome> {
        match registration {
            Registration::Worker(worker) => {
                let request = WorkerRegistrationRequest {
                    nome_completo: worker.full_name.clone(),
                    cpf: worker.cpf.clone(),
                    email: worker.email.clone(),
                    senha: worker.password.clone(),
                    foto_rosto_url: worker.face_photo.to_data_url(),
                    foto_documento_url: worker.document_photo.to_data_url(),
                    cidade: worker.city.clone(),
                    sobre: worker.bio.clone(),
                };
                let created: WorkerDetails = self
                    .post_json("/funcionarios/cadastro", None, &request)
                    .await?;
                info!(user_id = %created.id, "auth: worker registered");
            }
            Registration::Company(company) => {
                let request = CompanyRegistrationRequest {
                    razao_social: company.legal_name.clone(),
                    nome_fantasia: company.trade_name.clone(),
                    cnpj: company.cnpj.clone(),
                    email: company.email.clone(),
                    senha: company.password.clone(),
                };
                self.post_json_ignoring_body("/empresas/cadastro", None, &request)
                    .await?;
                info!("auth: company registered");
            }
        }

        self.login(&registration.credentials()).await
    }

    async fn fetch_profile(&self, token: &str) -> ClientResult<User> {
        match self
            .get_json::<WorkerDetails>("/funcionarios/me", Some(token))
            .await
        {
            Ok(details) => return Ok(user_from_worker(details)),
            Err(err) if lookup_failed_for_kind(&err) => {
                debug!("auth: worker lookup failed ({err}), trying company profile");
            }
            Err(err) => return Err(err),
        }

        let details: CompanyDetails = self.get_json("/empresas/me", Some(token)).await?;
        Ok(user_from_company(details))
    }

    async fn update_worker_profile(
        &self,
        token: &str,
        worker_id: &UserId,
        update: &UpdateWorkerRequest,
    ) -> ClientResult<User> {
        let details: WorkerDetails = self
            .put_json(&format!("/funcionarios/{worker_id}"), Some(token), update)
            .await?;
        Ok(user_from_worker(details))
    }
}
