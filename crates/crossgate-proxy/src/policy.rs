//! Fee and expiration policy
//!
//! Applied uniformly to every admitted event before routing. Fee failures
//! are soft: the relay is expected not to resubmit a dropped event, so no
//! record is kept. Expiration triggers an unconditional refund request.

use chrono::Utc;
use tracing::warn;

use crossgate_types::{Quantity, Symbol, TxEvent};

use crate::{ProxyState, TotalFee};

/// Outcome of the fee gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FeeCheck {
    /// Fee (possibly zero) applied; the event's amount is now net of it.
    Continue,
    /// The asset has no registered symbol; nothing to charge or issue.
    UnknownAsset,
    /// The amount does not cover the fee; it was swallowed into the totals.
    Underfunded,
}

/// Deduct the transfer fee from `event.amount` and accumulate it.
pub(crate) fn apply_fee(state: &mut ProxyState, event: &mut TxEvent) -> FeeCheck {
    let Some(symbol) = state.symbol_for_asset(&event.asset) else {
        return FeeCheck::UnknownAsset;
    };

    let fee = state.transfer_fee(&symbol);
    if fee == 0 {
        return FeeCheck::Continue;
    }

    if event.amount <= fee as u128 {
        // The whole transfer is swallowed as fee, like any other deduction.
        add_fee(state, &symbol, event.amount as i64);
        warn!(nonce = event.nonce, %symbol, amount = event.amount, fee, "transfer amount does not cover the fee");
        return FeeCheck::Underfunded;
    }

    add_fee(state, &symbol, fee);
    event.amount -= fee as u128;
    FeeCheck::Continue
}

/// Accumulate a deducted fee into the per-symbol running total.
pub(crate) fn add_fee(state: &mut ProxyState, symbol: &Symbol, amount: i64) {
    match state.total_fees.get_mut(symbol) {
        Some(record) => record.total.amount += amount,
        None => state.total_fees.upsert(TotalFee {
            total: Quantity::new(amount, symbol.clone()),
        }),
    }
}

/// Whether an event's work window has closed.
pub(crate) fn is_expired(event: &TxEvent, expiration_secs: u64) -> bool {
    let expiration = event.timestamp_secs() + expiration_secs;
    expiration <= Utc::now().timestamp() as u64
}
