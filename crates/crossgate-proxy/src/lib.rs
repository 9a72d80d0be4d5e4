//! Crossgate Proxy - the receiving side of the value-transfer bridge
//!
//! A relay submits quorum-signed, strictly-sequenced events from the source
//! network. The proxy admits each event exactly once and in order, applies
//! fee and expiration policy, lazily provisions local accounts, mints the
//! wrapped asset, and optionally forwards an instruction embedded in the
//! event on behalf of the funded account.
//!
//! # Execution model
//!
//! Each inbound call runs to completion with exclusive access to the whole
//! `ProxyState` before the next one; deferral is a durable state transition
//! (`PendingEvent`, `ErrorEvent`), never a blocked computation. Outbound
//! side effects are requested synchronously through an [`OutboundSink`] and
//! execute asynchronously; nothing is awaited or compensated afterwards, so
//! ordering and replay safety are settled entirely at admission time.
//!
//! # Failure classes
//!
//! - **Fatal** ([`ProxyError`]): bad quorum, wrong process, replayed or
//!   duplicated nonce, amount ceiling, missing record on retry. The call
//!   aborts and no state is committed.
//! - **Soft** ([`Outcome::Dropped`]): insufficient fee, unregistered asset,
//!   unresolvable account, mismatched payload commitment. The call succeeds
//!   and the event is gone.
//! - **Deferred** ([`Outcome::DeferredPending`], [`Outcome::DeferredError`]):
//!   a recovery record is written and waits for a manual retry call.
//! - **Refund** ([`Outcome::Refunded`]): a compensating transfer request is
//!   re-emitted upstream.

pub mod account;
pub mod config;
pub mod error;
pub mod outbound;
pub mod policy;
pub mod proxy;
pub mod registry;
pub mod sequencer;
pub mod state;

pub use account::*;
pub use config::*;
pub use error::*;
pub use outbound::*;
pub use proxy::*;
pub use state::*;
