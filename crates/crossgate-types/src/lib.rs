//! Crossgate Types - Canonical domain types for the bridge proxy
//!
//! This crate contains the foundational types for Crossgate with zero
//! dependencies on other crossgate crates:
//!
//! - Identity types (ProcessId, AssetId, MemberId, AccountName, Symbol)
//! - Quantities with the 2^62 − 1 amount ceiling of the local asset engine
//! - The signed event wire format and its byte-exact codec
//! - The out-of-band operation payload and embedded instruction codecs
//!
//! # Invariants
//!
//! 1. Amounts never reach 2^62 at any processing step
//! 2. The signed span of an event is the serialized prefix up to but
//!    excluding the signature list
//! 3. Codec round-trips are lossless within the declared length bounds

pub mod asset;
pub mod codec;
pub mod error;
pub mod event;
pub mod ids;
pub mod instruction;
pub mod operation;

pub use asset::*;
pub use codec::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use instruction::*;
pub use operation::*;
