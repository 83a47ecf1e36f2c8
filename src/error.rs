use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::schemas::UserId;
use crate::store::StoreError;

/// Everything the engine can refuse or fail with. Validation errors are
/// returned synchronously by the component that owns the rule and are never
/// retried; store failures pass through unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("an expense needs at least one participant")]
    InvalidExpense,

    #[error("a settlement cannot pay yourself")]
    InvalidSettlement,

    #[error("user {0} is not a member of this group")]
    NotAMember(UserId),

    #[error("only the payer can delete an expense")]
    NotExpensePayer,

    #[error("user {0} is already a member of this group")]
    AlreadyAMember(UserId),

    #[error("couldn't find the requested resource")]
    NotFound,

    #[error("ledger store failure: {0}")]
    Persistence(StoreError),

    #[error("group balances no longer sum to zero")]
    InvariantViolation,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::GroupNotFound => ApiError::NotFound,
            other => ApiError::Persistence(other),
        }
    }
}

impl ApiError {
    pub fn to_response(&self) -> HttpResponse {
        match self {
            ApiError::InvalidAmount => {
                json_error(StatusCode::BAD_REQUEST, "invalid_amount", self.to_string())
            }
            ApiError::InvalidExpense => {
                json_error(StatusCode::BAD_REQUEST, "invalid_expense", self.to_string())
            }
            ApiError::InvalidSettlement => {
                json_error(StatusCode::BAD_REQUEST, "invalid_settlement", self.to_string())
            }
            ApiError::NotAMember(_) => {
                json_error(StatusCode::FORBIDDEN, "not_a_member", self.to_string())
            }
            ApiError::NotExpensePayer => {
                json_error(StatusCode::FORBIDDEN, "not_expense_payer", self.to_string())
            }
            ApiError::AlreadyAMember(_) => {
                json_error(StatusCode::CONFLICT, "already_a_member", self.to_string())
            }
            ApiError::NotFound => {
                json_error(StatusCode::NOT_FOUND, "not_found", self.to_string())
            }
            ApiError::Persistence(err) => {
                tracing::error!(error = %err, "ledger store failure");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "persistence_error",
                    self.to_string(),
                )
            }
            ApiError::InvariantViolation => {
                // A nonzero balance sum means ledger corruption, not bad
                // user input. Loud on purpose.
                tracing::error!("zero-sum invariant violated, ledger is corrupt");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "invariant_violation",
                    self.to_string(),
                )
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "error": code,
        "message": message.into(),
    }))
}
