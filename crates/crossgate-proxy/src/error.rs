//! Error taxonomy of the proxy pipeline
//!
//! Everything here is fatal: the call aborts and no state is committed.
//! Expected conditions (underfunded transfers, unknown assets, unresolvable
//! accounts) are deliberately not errors — they must not poison the
//! sequence counter — and surface as [`crate::Outcome`] variants instead.

use thiserror::Error;

use crossgate_crypto::CryptoError;
use crossgate_store::StoreError;
use crossgate_types::{AccountName, AmountError, CodecError, ProcessId, Symbol};

/// Fatal pipeline errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    #[error("Quorum verification failed: {0}")]
    Quorum(#[from] CryptoError),

    #[error("Malformed payload: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("Invalid process id: event carries {actual}, proxy is bound to {expected}")]
    WrongProcess {
        expected: ProcessId,
        actual: ProcessId,
    },

    #[error("Bad nonce: {nonce} is behind the low-water mark {next}")]
    StaleNonce { nonce: u64, next: u64 },

    #[error("Event {nonce} already submitted")]
    DuplicateNonce { nonce: u64 },

    #[error("Error event {nonce} already recorded")]
    DuplicateErrorEvent { nonce: u64 },

    #[error("Unauthorized caller {0}")]
    Unauthorized(AccountName),

    #[error("Account cache already initialized")]
    AlreadyInitialized,

    #[error("Account cache not initialized")]
    NotInitialized,

    #[error("Pending event {nonce} not found")]
    PendingNotFound { nonce: u64 },

    #[error("No error event to retry")]
    NoErrorEvent,

    #[error("Out-of-band payload must not be empty")]
    EmptyOriginExtra,

    #[error("Fee must be greater than zero")]
    NonPositiveFee,

    #[error("Asset {0} is not registered")]
    AssetNotRegistered(Symbol),

    #[error("Asset {0} already registered")]
    AssetAlreadyRegistered(Symbol),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// How a successful call disposed of its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Asset issued and any embedded instruction dispatched.
    Resolved,
    /// Stored awaiting its out-of-band payload.
    DeferredPending,
    /// Stored with an upstream failure reason awaiting manual replay.
    DeferredError,
    /// A compensating transfer request was re-emitted upstream.
    Refunded,
    /// Quiet success with no further action and no record kept.
    Dropped(DropReason),
}

/// Why an event was quietly dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Transfer amount does not cover the fee schedule.
    InsufficientFee,
    /// The external asset has no registered local symbol.
    UnregisteredAsset,
    /// Multi-member events are not supported.
    UnsupportedMembers,
    /// No account binding exists and provisioning conditions were not met.
    UnresolvedAccount,
    /// Indirect extra too short to carry its 32-byte commitment.
    MalformedExtra,
    /// Out-of-band payload does not hash to the embedded commitment.
    CommitmentMismatch,
}
