//! Proxy configuration

use crossgate_types::{AccountName, ProcessId, Symbol};

/// Seconds before an event is considered expired and refunded.
pub const WORK_EXPIRATION_SECS: u64 = 3 * 60;

/// Maximum supply used when lazily registering a wrapped token.
pub const MAX_SUPPLY: i64 = 100_000_000_000_000;

/// Static configuration of one proxy instance.
///
/// The proxy is bound to exactly one source-network process; events carrying
/// any other process id are rejected outright.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// The source-network process this instance receives events for.
    pub process: ProcessId,
    /// The proxy's own account; holds admin authority.
    pub contract: AccountName,
    /// The relay identity allowed to submit events.
    pub publisher: AccountName,
    /// The wrapped-token contract minting local assets.
    pub token_contract: AccountName,
    /// Account paying for newly provisioned accounts.
    pub account_creator: AccountName,
    /// Owner authority installed on newly provisioned accounts.
    pub account_owner: AccountName,
    /// Fixed tail of provisioned account names.
    pub account_suffix: String,
    /// The only symbol accepted for first-sight account provisioning.
    pub bootstrap_symbol: Symbol,
    /// Expiration window applied to every admitted event.
    pub expiration_secs: u64,
    /// Supply ceiling for lazily registered wrapped tokens.
    pub max_supply: i64,
}

impl ProxyConfig {
    pub fn new(process: ProcessId) -> Self {
        Self {
            process,
            contract: AccountName::from("crossgateprx"),
            publisher: AccountName::from("crossgaterly"),
            token_contract: AccountName::from("crossgatewtk"),
            account_creator: AccountName::from("crossgateprx"),
            account_owner: AccountName::from("crossgateown"),
            account_suffix: "cgt".to_string(),
            bootstrap_symbol: Symbol::from("CGEOS"),
            expiration_secs: WORK_EXPIRATION_SECS,
            max_supply: MAX_SUPPLY,
        }
    }
}
