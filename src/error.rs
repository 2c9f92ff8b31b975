//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::pricing::responses::ErrorResponse;
use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Session not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Pricing(PricingError::Distance(_)) => "distance_unavailable",
            AppError::Pricing(PricingError::IncompleteInput) => "incomplete_input",
            AppError::Pricing(PricingError::Superseded) => "superseded",
            AppError::Pricing(_) => "pricing",
            AppError::Upstream(_) => "upstream",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), None),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone(), None),
            AppError::Pricing(e) => {
                let status = match e {
                    PricingError::Distance(_) => StatusCode::BAD_GATEWAY,
                    PricingError::IncompleteInput | PricingError::UnknownTier(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    PricingError::Superseded => StatusCode::CONFLICT,
                    PricingError::Configuration { .. } => {
                        tracing::error!("Pricing configuration error: {}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let details = match e {
                    PricingError::Distance(failure) => {
                        Some(serde_json::json!({ "reason": failure.code() }))
                    }
                    _ => None,
                };
                (status, e.user_message(), details)
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string(), None)
            }
            AppError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string(), None)
            }
        };

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
