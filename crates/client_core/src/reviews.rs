//! Rating normalization and reputation statistics.
//!
//! Evaluations reach the client in one of two shapes: a single direct score,
//! or three sub-metrics (assiduity, technical, behavioral). The shape is
//! resolved into [`Rating`] when a listing is decoded, so everything here is
//! exhaustive over the two cases.

use chrono::NaiveDateTime;
use serde::Serialize;
use shared::{
    domain::{EvaluationId, UserId},
    protocol::{EvaluationDetails, EvaluationMetrics},
};
use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Scale of a sub-metric triple.
///
/// When no scale is configured it is guessed per evaluation: a triple whose
/// three values all fall in 1..=5 is read as stars, anything else as percent.
/// Low percent scores such as `{5, 5, 4}` are therefore read as stars (4.7
/// instead of 5); pin `metric_scale` when the backend's scale is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScale {
    /// 0–100, averaged and rounded to the nearest integer.
    Percent,
    /// 1–5, averaged and rounded to one decimal place.
    Stars,
}

impl MetricScale {
    fn detect(metrics: &EvaluationMetrics) -> Self {
        let in_star_range = |v: f64| (1.0..=5.0).contains(&v);
        if in_star_range(metrics.nota_assiduidade)
            && in_star_range(metrics.nota_tecnica)
            && in_star_range(metrics.nota_comportamental)
        {
            Self::Stars
        } else {
            Self::Percent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Rating {
    Direct {
        score: f64,
    },
    SubMetrics {
        assiduity: f64,
        technical: f64,
        behavioral: f64,
        scale: MetricScale,
    },
}

impl Rating {
    pub fn direct(score: f64) -> Self {
        Self::Direct { score }
    }

    pub fn sub_metrics(assiduity: f64, technical: f64, behavioral: f64, scale: MetricScale) -> Self {
        Self::SubMetrics {
            assiduity,
            technical,
            behavioral,
            scale,
        }
    }

    /// Normalized score. Direct scores are returned untouched; sub-metric
    /// means are rounded according to their scale.
    pub fn value(&self) -> f64 {
        match *self {
            Self::Direct { score } => score,
            Self::SubMetrics {
                assiduity,
                technical,
                behavioral,
                scale,
            } => {
                let mean = (assiduity + technical + behavioral) / 3.0;
                match scale {
                    MetricScale::Percent => mean.round(),
                    MetricScale::Stars => (mean * 10.0).round() / 10.0,
                }
            }
        }
    }

    fn from_details(dto: &EvaluationDetails, scale_hint: Option<MetricScale>) -> Self {
        match (&dto.metricas, dto.nota) {
            (Some(metrics), _) => Self::sub_metrics(
                metrics.nota_assiduidade,
                metrics.nota_tecnica,
                metrics.nota_comportamental,
                scale_hint.unwrap_or_else(|| MetricScale::detect(metrics)),
            ),
            (None, Some(score)) => Self::direct(score),
            (None, None) => {
                warn!(evaluation_id = %dto.id, "reviews: evaluation carries no score, using 0");
                Self::direct(0.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

pub fn score_band(rating: &Rating) -> ScoreBand {
    let value = rating.value();
    let (high, medium) = match rating {
        Rating::SubMetrics {
            scale: MetricScale::Percent,
            ..
        } => (80.0, 50.0),
        _ => (4.0, 2.5),
    };
    if value >= high {
        ScoreBand::High
    } else if value >= medium {
        ScoreBand::Medium
    } else {
        ScoreBand::Low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Party {
    pub id: Option<UserId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: EvaluationId,
    pub author: Party,
    pub target: Party,
    pub rating: Rating,
    pub comment: String,
    pub reply: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl Review {
    pub fn score(&self) -> f64 {
        self.rating.value()
    }

    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

pub fn decode_review(dto: EvaluationDetails, scale_hint: Option<MetricScale>) -> Review {
    let rating = Rating::from_details(&dto, scale_hint);
    let created_at = dto.created_at();
    Review {
        id: dto.id,
        author: Party {
            id: dto.empresa_id,
            name: dto.nome_empresa,
        },
        target: Party {
            id: dto.funcionario_id,
            name: dto.nome_funcionario,
        },
        rating,
        comment: dto.descricao,
        reply: dto.resposta,
        created_at,
    }
}

pub fn decode_reviews(
    dtos: Vec<EvaluationDetails>,
    scale_hint: Option<MetricScale>,
) -> Vec<Review> {
    dtos.into_iter()
        .map(|dto| decode_review(dto, scale_hint))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub total_reviews: usize,
    pub average_rating: f64,
}

pub fn summarize(reviews: &[Review]) -> ReviewSummary {
    let total_reviews = reviews.len();
    let average_rating = if total_reviews > 0 {
        reviews.iter().map(Review::score).sum::<f64>() / total_reviews as f64
    } else {
        0.0
    };
    ReviewSummary {
        total_reviews,
        average_rating,
    }
}

/// False when `company_id` already authored one of `existing`. Reviews whose
/// author id is unknown never match; display names are not compared.
pub fn can_evaluate(existing: &[Review], company_id: &UserId) -> bool {
    !existing
        .iter()
        .any(|review| review.author.id.as_ref() == Some(company_id))
}

pub fn validate_reply(text: &str) -> ClientResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(
            "A resposta não pode estar vazia".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Star value sent as `nota` alongside the sub-metrics on creation.
pub fn rounded_star_mean(assiduity: u8, technical: u8, behavioral: u8) -> u8 {
    let mean = (f64::from(assiduity) + f64::from(technical) + f64::from(behavioral)) / 3.0;
    mean.round() as u8
}

#[cfg(test)]
#[path = "tests/reviews_tests.rs"]
mod tests;
