use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(EvaluationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Worker,
    Company,
}

/// Approval state reported by the backend for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    PendingValidation,
    Active,
    Rejected,
    Inactive,
    Other(String),
}

impl AccountStatus {
    pub fn as_wire(&self) -> &str {
        match self {
            Self::PendingValidation => "PENDENTE_VALIDACAO",
            Self::Active => "ATIVO",
            Self::Rejected => "REJEITADO",
            Self::Inactive => "INATIVO",
            Self::Other(raw) => raw,
        }
    }

    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "PENDENTE_VALIDACAO" => Self::PendingValidation,
            "ATIVO" => Self::Active,
            "REJEITADO" => Self::Rejected,
            "INATIVO" => Self::Inactive,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingValidation)
    }
}

impl Serialize for AccountStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for AccountStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Unified account record for both workers and companies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub kind: AccountKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

impl User {
    pub fn is_worker(&self) -> bool {
        self.kind == AccountKind::Worker
    }

    pub fn is_pending_approval(&self) -> bool {
        self.status.as_ref().is_some_and(AccountStatus::is_pending)
    }
}
