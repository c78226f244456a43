//! Error types for the settlement engine.

use crate::currency::Rupiah;
use thiserror::Error;

/// Result type alias for settlement operations
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Errors that can occur during a settlement attempt.
///
/// None of these are fatal to the process; each is scoped to the single
/// attempt that raised it.
#[derive(Error, Debug)]
pub enum SettlementError {
    /// Tendered cash does not cover the fee. Raised before any network call.
    #[error("tendered amount {tendered} does not cover the {fee} fee")]
    InsufficientAmount { tendered: Rupiah, fee: Rupiah },

    /// `submit` was called before any tendered amount was entered.
    #[error("no tendered amount entered")]
    AmountMissing,

    /// The session already settled; nothing left to do.
    #[error("session for plate {0} has already settled")]
    AlreadySettled(String),

    /// A submission is still in flight; new submissions are blocked until
    /// it resolves.
    #[error("a submission is already in flight for plate {0}")]
    SubmissionInFlight(String),

    /// No parked session exists for the requested plate.
    #[error("no parked session for plate {0}")]
    NotParked(String),

    /// The payment endpoint could not be reached, timed out, answered
    /// non-2xx, or returned unparseable JSON. Retryable.
    #[error("payment request failed: {0}")]
    Transport(String),

    /// The backend answered but refused to open the gate. The server
    /// message, when present, is passed through verbatim. Retryable.
    #[error("payment rejected: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },

    /// Failed to write listing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing CLI argument
    #[error("missing argument. Usage: gate-settlement <list | fee <plate> | settle <plate> <tendered>>")]
    MissingArgument,

    /// Unknown CLI command
    #[error("unknown command '{0}'. Usage: gate-settlement <list | fee <plate> | settle <plate> <tendered>>")]
    UnknownCommand(String),

    /// Unparseable tendered amount on the CLI
    #[error("invalid amount '{0}': expected a whole-rupiah integer")]
    InvalidAmount(String),
}

impl SettlementError {
    /// Whether a fresh submission may reasonably succeed.
    ///
    /// Transport failures and gate refusals are scoped to one request;
    /// validation errors will fail the same way until the input changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SettlementError::Transport(_) | SettlementError::Rejected { .. }
        )
    }
}

// reqwest's error type cannot be constructed outside reqwest, which would
// make transport failures impossible to stub in tests; carry the rendered
// message instead.
impl From<reqwest::Error> for SettlementError {
    fn from(err: reqwest::Error) -> Self {
        SettlementError::Transport(err.to_string())
    }
}
