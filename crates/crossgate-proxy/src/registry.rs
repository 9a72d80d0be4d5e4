//! Admin-managed reference data: asset registrations and fee schedules
//!
//! Mutations run off the hot path and require the contract's own authority
//! (checked by the entry points in `proxy`); the pipeline only reads.

use crossgate_types::{AssetId, Quantity, Symbol};

use crate::{AssetRegistration, ProxyError, ProxyState, Result, TransferFee};

pub(crate) fn register_asset(state: &mut ProxyState, asset_id: AssetId, symbol: Symbol) -> Result<()> {
    if state.assets.contains(&symbol) {
        return Err(ProxyError::AssetAlreadyRegistered(symbol));
    }
    state.assets_by_id.insert(asset_id, symbol.clone())?;
    state.assets.insert(AssetRegistration { symbol, asset_id })?;
    Ok(())
}

pub(crate) fn unregister_asset(state: &mut ProxyState, symbol: &Symbol) -> Result<()> {
    let record = state
        .assets
        .remove(symbol)
        .ok_or_else(|| ProxyError::AssetNotRegistered(symbol.clone()))?;
    state.assets_by_id.remove(&record.asset_id);
    Ok(())
}

pub(crate) fn set_transfer_fee(state: &mut ProxyState, fee: Quantity) -> Result<()> {
    if fee.amount <= 0 {
        return Err(ProxyError::NonPositiveFee);
    }
    if !state.assets.contains(&fee.symbol) {
        return Err(ProxyError::AssetNotRegistered(fee.symbol));
    }
    state.transfer_fees.upsert(TransferFee { fee });
    Ok(())
}

pub(crate) fn set_create_account_fee(state: &mut ProxyState, fee: Quantity) -> Result<()> {
    if fee.amount <= 0 {
        return Err(ProxyError::NonPositiveFee);
    }
    state.create_account_fee.set(fee);
    Ok(())
}
