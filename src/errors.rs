/*!
 * Error types for the tagguard library.
 *
 * This module contains the error taxonomy shared by the abstraction,
 * translation and repair stages, using the thiserror crate for
 * ergonomic error definitions.
 */

use std::time::Duration;

use thiserror::Error;

use crate::validation::QaDetails;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The service did not answer within the configured deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The service stopped generating before the answer was complete
    #[error("Response truncated: {0}")]
    Truncated(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::ConnectionError(_)
            | ProviderError::RateLimitExceeded(_)
            | ProviderError::Timeout(_) => true,
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur while abstracting or translating a segment
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// The raw segment could not be tokenized
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    /// The text generation service failed
    #[error("Provider error: {0}")]
    Service(#[from] ProviderError),

    /// The candidate target does not carry the required tokens
    #[error("Token mismatch: {0}")]
    TokenMismatch(QaDetails),

    /// The unit has no target to work on
    #[error("Unit {0} has no target")]
    NoTarget(String),

    /// No request produced a valid target; `candidate` is the closest one
    #[error("Candidate rejected: {details}")]
    Rejected {
        /// Abstracted target with the smallest token diff, never committed as is
        candidate: String,
        /// QA details of that candidate
        details: QaDetails,
    },
}

/// Errors produced by the repair loop
#[derive(Error, Debug, Clone)]
pub enum RepairError {
    /// Every attempt failed validation or the service
    #[error("Repair budget exhausted after {attempts} attempt(s): {last_details}")]
    BudgetExhausted {
        /// Number of requests issued
        attempts: u32,
        /// QA details of the latest failed candidate
        last_details: QaDetails,
    },

    /// The unit is not in a state repair can work on
    #[error("Unit is not repairable: {0}")]
    NotRepairable(String),
}

/// Errors raised by the unit store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No unit is registered under this id
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// A unit with this id already exists
    #[error("Duplicate unit id: {0}")]
    DuplicateUnit(String),

    /// The unit's source markup could not be abstracted
    #[error("Unit {0} is untranslatable")]
    Untranslatable(String),

    /// The unit changed since it was checked out
    #[error("Stale commit for unit {id}: checked out at revision {expected}, now at {found}")]
    StaleRevision {
        /// Unit id
        id: String,
        /// Revision seen at checkout
        expected: u64,
        /// Current revision
        found: u64,
    },

    /// Strict export refused because units are still in error
    #[error("Export blocked: {} unit(s) have QA errors ({})", .0.len(), .0.join(", "))]
    ExportBlocked(Vec<String>),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the repair loop
    #[error("Repair error: {0}")]
    Repair(#[from] RepairError),

    /// Error from the unit store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
