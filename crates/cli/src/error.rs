// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dorm_lottery_api::ApiError;
use dorm_lottery_persistence::PersistenceError;
use serde::Serialize;
use tracing::error;

/// Process exit codes.
pub mod exit {
    pub const USAGE: u8 = 2;
    pub const DENIED: u8 = 3;
    pub const NOT_FOUND: u8 = 4;
    pub const REJECTED: u8 = 5;
    pub const INTERNAL: u8 = 70;
    /// Temporary failure; the same command may succeed if retried.
    pub const BUSY: u8 = 75;
}

/// JSON body written to stderr on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub retryable: bool,
    pub message: String,
}

/// A failed command with the exit code it maps to.
#[derive(Debug)]
pub struct CliError {
    pub exit_code: u8,
    pub retryable: bool,
    pub message: String,
}

impl CliError {
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            exit_code: exit::USAGE,
            retryable: false,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: true,
            retryable: self.retryable,
            message: self.message.clone(),
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        let exit_code: u8 = match err {
            ApiError::AuthenticationFailed { .. }
            | ApiError::Unauthorized { .. }
            | ApiError::Forbidden { .. }
            | ApiError::NotEligible { .. }
            | ApiError::NotEligibleTarget { .. } => exit::DENIED,
            ApiError::NotFound { .. } => exit::NOT_FOUND,
            ApiError::InvalidInput { .. } | ApiError::InvalidRoomType { .. } => exit::USAGE,
            ApiError::Busy { .. } => exit::BUSY,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                exit::INTERNAL
            }
            ApiError::TypeMismatch { .. }
            | ApiError::RoomUnavailable { .. }
            | ApiError::Conflict { .. }
            | ApiError::NoOp { .. }
            | ApiError::AlreadyConfirmed { .. }
            | ApiError::SelectionConfirmed { .. }
            | ApiError::AlreadyPublished { .. }
            | ApiError::AlreadyDrawn { .. }
            | ApiError::CapacityExceeded { .. }
            | ApiError::NoParticipants { .. }
            | ApiError::DomainRuleViolation { .. } => exit::REJECTED,
        };
        Self {
            exit_code,
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for CliError {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "Persistence error");
        Self {
            exit_code: exit::INTERNAL,
            retryable: false,
            message: format!("Persistence error: {err}"),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            exit_code: exit::INTERNAL,
            retryable: false,
            message: format!("Failed to encode output: {err}"),
        }
    }
}
