//! Deterministic account provisioning
//!
//! Account names are drawn from a base-31 alphabet over a fixed-width
//! 9-character region followed by a fixed tail, generated from a counter
//! that never wraps in practice (31^9 names). A two-slot cache keeps one
//! account pre-created ahead of demand so provisioning never waits on
//! account-creation latency: `current` is handed out, `next` was requested
//! one provisioning earlier, and a fresh `next` is requested now.

use tracing::{info, warn};

use crossgate_types::{AccountName, TxEvent};

use crate::{
    policy, AccountCache, OutboundRequest, OutboundSink, ProxyConfig, ProxyError, ProxyState,
    Result,
};

const ALPHABET: &[u8; 31] = b"abcdefghijklmnopqrstuvwxyz12345";
const REGION_WIDTH: usize = 9;

/// Render the account name for an allocation counter value.
pub fn account_name_from_id(id: u64, suffix: &str) -> AccountName {
    let mut region = [b'a'; REGION_WIDTH];
    let mut value = id;
    let mut i = 0;
    loop {
        region[i] = ALPHABET[(value % 31) as usize];
        value /= 31;
        if value == 0 {
            break;
        }
        i += 1;
    }
    region.reverse();

    let mut name = String::with_capacity(REGION_WIDTH + suffix.len());
    name.extend(region.iter().map(|&b| b as char));
    name.push_str(suffix);
    AccountName(name)
}

/// Resolve the local account for the event's member, provisioning one on
/// first sight when the creation conditions hold.
///
/// `None` means no binding exists and none could be created: the event is
/// dropped by the caller with no refund (preserved source policy).
pub(crate) fn resolve_or_provision<S: OutboundSink>(
    state: &mut ProxyState,
    config: &ProxyConfig,
    sink: &S,
    event: &mut TxEvent,
) -> Result<Option<AccountName>> {
    let member = event.members[0];
    if let Some(account) = state.account_for_member(&member) {
        return Ok(Some(account));
    }

    let Some(symbol) = state.symbol_for_asset(&event.asset) else {
        return Ok(None);
    };
    if symbol != config.bootstrap_symbol {
        warn!(nonce = event.nonce, %symbol, "asset cannot pay for account creation");
        return Ok(None);
    }

    let fee = state
        .create_account_fee
        .get()
        .map(|f| f.amount)
        .unwrap_or(0);
    if event.amount < fee as u128 {
        warn!(nonce = event.nonce, amount = event.amount, fee, "not enough fee for creating an account");
        return Ok(None);
    }
    if fee > 0 {
        event.amount -= fee as u128;
        policy::add_fee(state, &symbol, fee);
    }

    let account = take_next_account(state, config, sink)?;
    state.bind_account(account.clone(), member)?;
    info!(%member, %account, "provisioned account");
    Ok(Some(account))
}

/// Advance the two-slot cache by one and return the slot that was already
/// created one provisioning ago.
fn take_next_account<S: OutboundSink>(
    state: &mut ProxyState,
    config: &ProxyConfig,
    sink: &S,
) -> Result<AccountName> {
    let cache = state
        .account_cache
        .get_mut()
        .ok_or(ProxyError::NotInitialized)?;

    let taken = std::mem::replace(&mut cache.current, cache.next.clone());
    cache.next = account_name_from_id(cache.counter, &config.account_suffix);
    cache.counter += 1;

    let created = cache.next.clone();
    sink.submit(OutboundRequest::CreateAccount {
        creator: config.account_creator.clone(),
        owner: config.account_owner.clone(),
        account: created,
    });
    Ok(taken)
}

/// Seed the cache and pre-create both slots. One-time.
pub(crate) fn initialize_cache<S: OutboundSink>(
    state: &mut ProxyState,
    config: &ProxyConfig,
    sink: &S,
) -> Result<()> {
    if state.account_cache.is_initialized() {
        return Err(ProxyError::AlreadyInitialized);
    }

    let current = account_name_from_id(0, &config.account_suffix);
    let next = account_name_from_id(1, &config.account_suffix);
    for account in [&current, &next] {
        sink.submit(OutboundRequest::CreateAccount {
            creator: config.account_creator.clone(),
            owner: config.account_owner.clone(),
            account: account.clone(),
        });
    }
    state
        .account_cache
        .initialize(AccountCache {
            counter: 2,
            current,
            next,
        })
        .map_err(ProxyError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_generation_matches_known_values() {
        assert_eq!(account_name_from_id(0, "cgt").as_str(), "aaaaaaaaacgt");
        assert_eq!(account_name_from_id(30, "cgt").as_str(), "aaaaaaaa5cgt");
        assert_eq!(account_name_from_id(31, "cgt").as_str(), "aaaaaaabacgt");
        assert_eq!(account_name_from_id(32, "cgt").as_str(), "aaaaaaabbcgt");
    }

    #[test]
    fn name_generation_is_injective_over_a_range() {
        let mut seen = std::collections::BTreeSet::new();
        for id in 0..10_000u64 {
            assert!(seen.insert(account_name_from_id(id, "cgt")), "id {id}");
        }
    }

    #[test]
    fn cache_initializes_once_and_pre_creates_two_slots() {
        let mut state = ProxyState::default();
        let config = ProxyConfig::new(crossgate_types::ProcessId(uuid::Uuid::nil()));
        let sink = crate::RecordingSink::new();

        initialize_cache(&mut state, &config, &sink).unwrap();
        assert_eq!(sink.len(), 2);
        assert!(matches!(
            initialize_cache(&mut state, &config, &sink),
            Err(ProxyError::AlreadyInitialized)
        ));

        let cache = state.account_cache.get().unwrap();
        assert_eq!(cache.current.as_str(), "aaaaaaaaacgt");
        assert_eq!(cache.next.as_str(), "aaaaaaaabcgt");
        assert_eq!(cache.counter, 2);
    }

    #[test]
    fn take_next_returns_the_pre_created_slot() {
        let mut state = ProxyState::default();
        let config = ProxyConfig::new(crossgate_types::ProcessId(uuid::Uuid::nil()));
        let sink = crate::RecordingSink::new();
        initialize_cache(&mut state, &config, &sink).unwrap();
        sink.take();

        let first = take_next_account(&mut state, &config, &sink).unwrap();
        assert_eq!(first.as_str(), "aaaaaaaaacgt");
        let second = take_next_account(&mut state, &config, &sink).unwrap();
        assert_eq!(second.as_str(), "aaaaaaaabcgt");

        // Each take requested creation of exactly one fresh slot.
        assert_eq!(sink.len(), 2);
    }
}
