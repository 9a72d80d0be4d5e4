//! Persisted proxy state
//!
//! One table per entity, each keyed by a domain value, with unique and
//! non-unique secondary indices where a second lookup path exists. The
//! whole state is explicitly owned and injected into the [`crate::Proxy`]
//! constructor; tests build it in memory.

use serde::{Deserialize, Serialize};

use crossgate_crypto::PublicKey;
use crossgate_store::{Counters, Index, MultiIndex, Record, Singleton, StoreResult, Table};
use crossgate_types::{AccountName, AssetId, MemberId, Quantity, Symbol, TxEvent};

/// Counter key of the nonce low-water mark.
pub const KEY_NONCE: u64 = 1;

/// Counter key of the outbound transfer-request id.
pub const KEY_TX_OUT: u64 = 2;

/// One marker per sequence number already seen above the low-water mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedMarker {
    pub nonce: u64,
}

impl Record for SubmittedMarker {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.nonce
    }
}

/// An admitted event whose out-of-band payload has not arrived yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub event: TxEvent,
    pub account: AccountName,
    pub extra_hash: [u8; 32],
}

impl Record for PendingEvent {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.event.nonce
    }
}

/// An admitted event the relay reported as failed upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub event: TxEvent,
    pub reason: String,
    pub origin_extra: Vec<u8>,
}

impl Record for ErrorEvent {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.event.nonce
    }
}

/// The 1:1, first-write-wins binding of a source member to a local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBinding {
    pub account: AccountName,
    pub member: MemberId,
}

impl Record for AccountBinding {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.account.clone()
    }
}

/// Admin-managed mapping of a source asset to its local symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistration {
    pub symbol: Symbol,
    pub asset_id: AssetId,
}

impl Record for AssetRegistration {
    type Key = Symbol;

    fn primary_key(&self) -> Symbol {
        self.symbol.clone()
    }
}

/// Fixed fee charged per transfer of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFee {
    pub fee: Quantity,
}

impl Record for TransferFee {
    type Key = Symbol;

    fn primary_key(&self) -> Symbol {
        self.fee.symbol.clone()
    }
}

/// Running total of fees deducted per symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalFee {
    pub total: Quantity,
}

impl Record for TotalFee {
    type Key = Symbol;

    fn primary_key(&self) -> Symbol {
        self.total.symbol.clone()
    }
}

/// A wrapped token already registered with the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistration {
    pub symbol: Symbol,
    pub max_supply: i64,
}

impl Record for TokenRegistration {
    type Key = Symbol;

    fn primary_key(&self) -> Symbol {
        self.symbol.clone()
    }
}

/// Two-slot account buffer: `current` is handed out on provisioning while
/// `next` was already requested for creation one call earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCache {
    pub counter: u64,
    pub current: AccountName,
    pub next: AccountName,
}

/// All persisted state of one proxy instance.
#[derive(Debug, Clone, Default)]
pub struct ProxyState {
    pub counters: Counters,
    pub submitted: Table<SubmittedMarker>,
    pub pending: Table<PendingEvent>,
    pub pending_by_hash: MultiIndex<[u8; 32], u64>,
    pub pending_by_account: MultiIndex<AccountName, u64>,
    pub errors: Table<ErrorEvent>,
    pub accounts: Table<AccountBinding>,
    pub accounts_by_member: Index<MemberId, AccountName>,
    pub assets: Table<AssetRegistration>,
    pub assets_by_id: Index<AssetId, Symbol>,
    pub transfer_fees: Table<TransferFee>,
    pub total_fees: Table<TotalFee>,
    pub create_account_fee: Singleton<Quantity>,
    pub tokens: Table<TokenRegistration>,
    pub account_cache: Singleton<AccountCache>,
    /// Signer roster; read at verification time, rotated out of band.
    pub signers: Vec<PublicKey>,
}

impl ProxyState {
    pub fn new(signers: Vec<PublicKey>) -> Self {
        Self {
            signers,
            ..Self::default()
        }
    }

    /// Local symbol registered for a source asset id.
    pub fn symbol_for_asset(&self, asset: &AssetId) -> Option<Symbol> {
        self.assets_by_id.get(asset).cloned()
    }

    /// Local account bound to a source member.
    pub fn account_for_member(&self, member: &MemberId) -> Option<AccountName> {
        self.accounts_by_member.get(member).cloned()
    }

    /// Transfer fee for a symbol; absence means zero.
    pub fn transfer_fee(&self, symbol: &Symbol) -> i64 {
        self.transfer_fees
            .get(symbol)
            .map(|f| f.fee.amount)
            .unwrap_or(0)
    }

    /// Running fee total for a symbol.
    pub fn total_fee(&self, symbol: &Symbol) -> i64 {
        self.total_fees
            .get(symbol)
            .map(|f| f.total.amount)
            .unwrap_or(0)
    }

    /// Insert a pending event and maintain its secondary indices. Distinct
    /// events may commit to the same hash; both are stored.
    pub fn insert_pending(&mut self, record: PendingEvent) -> StoreResult<()> {
        let nonce = record.event.nonce;
        self.pending_by_hash.insert(record.extra_hash, nonce);
        self.pending_by_account.insert(record.account.clone(), nonce);
        self.pending.insert(record)
    }

    /// Remove a pending event and its secondary indices.
    pub fn remove_pending(&mut self, nonce: u64) -> Option<PendingEvent> {
        let record = self.pending.remove(&nonce)?;
        self.pending_by_hash.remove(&record.extra_hash, &nonce);
        self.pending_by_account.remove(&record.account, &nonce);
        Some(record)
    }

    /// Bind a member to an account, both directions, first write wins.
    pub fn bind_account(&mut self, account: AccountName, member: MemberId) -> StoreResult<()> {
        self.accounts_by_member.insert(member, account.clone())?;
        self.accounts.insert(AccountBinding { account, member })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crossgate_types::{EventSignature, ProcessId};

    use super::*;

    fn dummy_event(nonce: u64) -> TxEvent {
        TxEvent {
            nonce,
            process: ProcessId(Uuid::nil()),
            asset: AssetId(Uuid::nil()),
            members: vec![MemberId(Uuid::nil())],
            threshold: 1,
            amount: 1,
            extra: Vec::new(),
            timestamp: 0,
            signatures: vec![EventSignature([0; 65])],
        }
    }

    #[test]
    fn pending_indices_follow_the_table() {
        let mut state = ProxyState::default();
        let account = AccountName::from("aaaaaaaaacgt");
        state
            .insert_pending(PendingEvent {
                event: dummy_event(9),
                account: account.clone(),
                extra_hash: [7; 32],
            })
            .unwrap();

        assert_eq!(
            state.pending_by_hash.get(&[7; 32]).copied().collect::<Vec<_>>(),
            vec![9]
        );
        assert!(state.pending_by_account.contains(&account));

        let removed = state.remove_pending(9).unwrap();
        assert_eq!(removed.event.nonce, 9);
        assert!(!state.pending_by_hash.contains(&[7; 32]));
        assert!(!state.pending_by_account.contains(&account));
    }

    #[test]
    fn pending_events_may_share_a_commitment() {
        let mut state = ProxyState::default();
        let account = AccountName::from("aaaaaaaaacgt");
        for nonce in [3, 5] {
            state
                .insert_pending(PendingEvent {
                    event: dummy_event(nonce),
                    account: account.clone(),
                    extra_hash: [7; 32],
                })
                .unwrap();
        }

        assert_eq!(
            state.pending_by_hash.get(&[7; 32]).copied().collect::<Vec<_>>(),
            vec![3, 5]
        );

        state.remove_pending(3).unwrap();
        assert_eq!(
            state.pending_by_hash.get(&[7; 32]).copied().collect::<Vec<_>>(),
            vec![5]
        );
        assert!(state.pending_by_account.contains(&account));
    }

    #[test]
    fn account_binding_is_first_write_wins() {
        let mut state = ProxyState::default();
        let member = MemberId(Uuid::new_v4());
        state
            .bind_account(AccountName::from("aaaaaaaaacgt"), member)
            .unwrap();
        assert!(state
            .bind_account(AccountName::from("aaaaaaaabcgt"), member)
            .is_err());
        assert_eq!(
            state.account_for_member(&member),
            Some(AccountName::from("aaaaaaaaacgt"))
        );
    }
}
