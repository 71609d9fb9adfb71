use reqwest::StatusCode;
use shared::error::{ApiError, ErrorCode, FieldError};
use thiserror::Error;

pub const GENERIC_FAILURE_MESSAGE: &str = "Não foi possível completar a operação.";

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not authorized: {}", message.as_deref().unwrap_or("no message"))]
    Unauthorized { message: Option<String> },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("this company has already evaluated the worker")]
    DuplicateEvaluation,
    #[error("evaluation {0} already has a reply")]
    AlreadyReplied(String),
    #[error("backend rejected request ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("backend failure ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Server {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Builds the error for a non-success response, keeping whatever message
    /// the backend put in the body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_backend_message(body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Unauthorized { message }
        } else if status.is_server_error() {
            Self::Server { status, message }
        } else {
            Self::Rejected { status, message }
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::Transport,
            Self::Unauthorized { .. } | Self::NotAuthenticated => ErrorCode::Unauthorized,
            Self::Validation(_) => ErrorCode::Validation,
            Self::DuplicateEvaluation | Self::AlreadyReplied(_) => ErrorCode::BusinessRule,
            Self::Rejected { status, .. } if *status == StatusCode::NOT_FOUND => {
                ErrorCode::NotFound
            }
            Self::Rejected { .. } => ErrorCode::BusinessRule,
            Self::Server { .. } | Self::Decode(_) => ErrorCode::Internal,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::NotAuthenticated)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Text suitable for showing to the person using the client.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized {
                message: Some(message),
            }
            | Self::Rejected {
                message: Some(message),
                ..
            }
            | Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Validation(message) => message.clone(),
            Self::DuplicateEvaluation => "Sua empresa já avaliou este funcionário.".to_string(),
            Self::AlreadyReplied(_) => "Esta avaliação já foi respondida.".to_string(),
            Self::NotAuthenticated => "Faça login para continuar.".to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::new(self.code(), self.user_message())
    }
}

fn extract_backend_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(message)) => non_empty(message),
        Ok(value @ serde_json::Value::Array(_)) => {
            let fields: Vec<FieldError> = serde_json::from_value(value).ok()?;
            let joined = fields
                .iter()
                .map(|field| format!("{}: {}", field.campo, field.mensagem))
                .collect::<Vec<_>>()
                .join("; ");
            non_empty(joined)
        }
        Ok(serde_json::Value::Object(map)) => ["message", "mensagem", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .and_then(|message| non_empty(message.to_string())),
        Ok(_) => None,
        Err(_) => non_empty(trimmed.to_string()),
    }
}

fn non_empty(message: String) -> Option<String> {
    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_business_rule_message_is_kept() {
        let err = ClientError::from_response(
            StatusCode::BAD_REQUEST,
            "Sua empresa já avaliou este funcionário.",
        );
        assert_eq!(err.code(), ErrorCode::BusinessRule);
        assert_eq!(err.user_message(), "Sua empresa já avaliou este funcionário.");
    }

    #[test]
    fn validation_field_list_is_joined() {
        let err = ClientError::from_response(
            StatusCode::BAD_REQUEST,
            r#"[{"campo":"cpf","mensagem":"CPF inválido"},{"campo":"email","mensagem":"Email inválido"}]"#,
        );
        assert_eq!(err.user_message(), "cpf: CPF inválido; email: Email inválido");
    }

    #[test]
    fn empty_body_falls_back_to_generic_message() {
        let err = ClientError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "  ");
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn forbidden_maps_to_unauthorized() {
        let err = ClientError::from_response(StatusCode::FORBIDDEN, "");
        assert!(err.is_auth_failure());
        assert_eq!(err.to_api_error().code, ErrorCode::Unauthorized);
    }

    #[test]
    fn api_error_carries_code_and_user_message() {
        let duplicate = ClientError::DuplicateEvaluation.to_api_error();
        assert_eq!(duplicate.code, ErrorCode::BusinessRule);
        assert_eq!(duplicate.message, "Sua empresa já avaliou este funcionário.");

        let missing = ClientError::from_response(StatusCode::NOT_FOUND, "").to_api_error();
        assert_eq!(missing.code, ErrorCode::NotFound);
        assert_eq!(missing.message, GENERIC_FAILURE_MESSAGE);

        let invalid = ClientError::Validation("A resposta não pode estar vazia".into()).to_api_error();
        assert_eq!(invalid.code, ErrorCode::Validation);
        assert_eq!(
            serde_json::to_value(&invalid).expect("json")["code"],
            "validation"
        );
    }

    #[test]
    fn object_body_uses_message_field() {
        let err = ClientError::from_response(StatusCode::NOT_FOUND, r#"{"message":"Funcionário não encontrado"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Funcionário não encontrado");
    }
}
