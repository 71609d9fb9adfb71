use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountStatus, EvaluationId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerDetails {
    pub id: UserId,
    pub nome_completo: String,
    pub email: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub sobre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto_rosto_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    pub id: UserId,
    pub razao_social: String,
    #[serde(default)]
    pub nome_fantasia: Option<String>,
    pub cnpj: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRegistrationRequest {
    pub nome_completo: String,
    pub cpf: String,
    pub email: String,
    pub senha: String,
    pub foto_rosto_url: String,
    pub foto_documento_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sobre: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRegistrationRequest {
    pub razao_social: String,
    pub nome_fantasia: String,
    pub cnpj: String,
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkerRequest {
    pub nome_completo: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sobre: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetrics {
    #[serde(alias = "assiduidade")]
    pub nota_assiduidade: f64,
    #[serde(alias = "tecnica")]
    pub nota_tecnica: f64,
    #[serde(alias = "comportamental")]
    pub nota_comportamental: f64,
}

/// Evaluation as returned by every `/avaliacoes` listing.
///
/// Older backends send a single `nota`, newer ones send `metricas`; exactly
/// one of them is expected to be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetails {
    pub id: EvaluationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empresa_id: Option<UserId>,
    #[serde(default)]
    pub nome_empresa: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funcionario_id: Option<UserId>,
    #[serde(default)]
    pub nome_funcionario: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nota: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metricas: Option<EvaluationMetrics>,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub resposta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_avaliacao: Option<String>,
}

impl EvaluationDetails {
    /// Accepts both zone-less `LocalDateTime` output and RFC 3339 timestamps.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        let raw = self.data_avaliacao.as_deref()?.trim();
        raw.parse::<NaiveDateTime>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub funcionario_id: UserId,
    pub empresa_id: UserId,
    pub nota: u8,
    pub nota_assiduidade: u8,
    pub nota_tecnica: u8,
    pub nota_comportamental: u8,
    pub descricao: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub resposta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub termo: String,
}
