use crate::storage::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },

    #[error("Receiver balance overflow: balance {balance}, value {value}")]
    BalanceOverflow { balance: u64, value: u64 },

    #[error("Spender not allowed to transfer this amount: allowed {allowed}, need {need}")]
    AllowanceExceeded { allowed: u64, need: u64 },

    #[error("Store iteration failed: {0}")]
    StoreIteration(StoreError),

    #[error("Store I/O failed: {0}")]
    StoreIo(StoreError),

    #[error("Token has not been issued")]
    NotInitialized,
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::StoreIo(err)
    }
}

/// Programmatic discriminant of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MalformedRequest,
    IdentityError,
    InsufficientBalance,
    BalanceOverflow,
    AllowanceExceeded,
    StoreIterationError,
    StoreIoError,
    NotInitialized,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::IdentityError => "IDENTITY_ERROR",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::AllowanceExceeded => "ALLOWANCE_EXCEEDED",
            Self::StoreIterationError => "STORE_ITERATION_ERROR",
            Self::StoreIoError => "STORE_IO_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
        }
    }
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest(_) => ErrorKind::MalformedRequest,
            Self::Identity(_) => ErrorKind::IdentityError,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::BalanceOverflow { .. } => ErrorKind::BalanceOverflow,
            Self::AllowanceExceeded { .. } => ErrorKind::AllowanceExceeded,
            Self::StoreIteration(_) => ErrorKind::StoreIterationError,
            Self::StoreIo(_) => ErrorKind::StoreIoError,
            Self::NotInitialized => ErrorKind::NotInitialized,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientBalance { have: 10, need: 20 };
        assert_eq!(err.to_string(), "Insufficient balance: have 10, need 20");

        let err = LedgerError::NotInitialized;
        assert_eq!(err.to_string(), "Token has not been issued");
    }

    #[test]
    fn test_store_error_converts_to_io_kind() {
        let err: LedgerError = StoreError::Backend("disk gone".into()).into();
        assert_eq!(err.kind(), ErrorKind::StoreIoError);
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_kind_codes_serialize_like_as_str() {
        let kinds = [
            ErrorKind::MalformedRequest,
            ErrorKind::IdentityError,
            ErrorKind::InsufficientBalance,
            ErrorKind::BalanceOverflow,
            ErrorKind::AllowanceExceeded,
            ErrorKind::StoreIterationError,
            ErrorKind::StoreIoError,
            ErrorKind::NotInitialized,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
