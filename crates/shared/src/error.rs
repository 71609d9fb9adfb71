use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    Unauthorized,
    Validation,
    BusinessRule,
    NotFound,
    Internal,
}

/// Displayable error payload handed to front ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Bean-validation failure entry returned by the backend on HTTP 400.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub campo: String,
    pub mensagem: String,
}
