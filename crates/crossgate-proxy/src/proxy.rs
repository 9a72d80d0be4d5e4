//! Entry points and the event router
//!
//! Pipeline order for a submitted event: authenticate the signed span
//! (quorum, process id, amount ceiling), admit the nonce, apply the fee,
//! then route — expiration, account resolution, extra-payload branch,
//! asset issuance, instruction dispatch. Authentication and sequencing
//! failures abort before anything is committed; policy and resolution
//! failures are soft so an expected condition never poisons the sequence
//! counter.

use tracing::{info, warn};

use crossgate_crypto::{matches_commitment, verify_quorum};
use crossgate_types::{
    AccountName, AssetId, CodecError, Instruction, MemberId, Operation, Quantity, Symbol,
    TxEvent, EXTRA_DIRECT, EXTRA_INDIRECT, MAX_AMOUNT,
};

use crate::policy::FeeCheck;
use crate::{
    account, policy, registry, sequencer, DropReason, ErrorEvent, Outcome, OutboundRequest,
    OutboundSink, PendingEvent, ProxyConfig, ProxyError, ProxyState, Result, TokenRegistration,
    TxRequest, KEY_TX_OUT,
};

/// How the extra payload decoded.
enum InstructionDecode {
    /// Nothing to forward.
    None,
    /// A well-formed instruction to dispatch after issuance.
    Forward(Instruction),
    /// Undecodable instruction payload: refund and stop.
    Invalid,
    /// Out-of-band payload does not hash to the embedded commitment.
    Mismatch,
}

/// The bridge proxy: all state transitions go through these entry points,
/// one call at a time, each running to completion.
pub struct Proxy<S: OutboundSink> {
    config: ProxyConfig,
    state: ProxyState,
    sink: S,
}

impl<S: OutboundSink> Proxy<S> {
    pub fn new(config: ProxyConfig, state: ProxyState, sink: S) -> Self {
        Self {
            config,
            state,
            sink,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn state(&self) -> &ProxyState {
        &self.state
    }

    /// One-time: seed the account cache and pre-create both slots.
    pub fn initialize(&mut self, caller: &AccountName) -> Result<()> {
        self.require(caller, &self.config.contract)?;
        account::initialize_cache(&mut self.state, &self.config, &self.sink)?;
        info!("account cache initialized");
        Ok(())
    }

    /// Primary entry: admit and route one signed event.
    pub fn submit_event(
        &mut self,
        caller: &AccountName,
        event_bytes: &[u8],
        origin_extra: Option<&[u8]>,
    ) -> Result<Outcome> {
        self.require(caller, &self.config.publisher)?;
        let mut event = self.authenticate(event_bytes)?;
        sequencer::admit(&mut self.state, event.nonce)?;

        match policy::apply_fee(&mut self.state, &mut event) {
            FeeCheck::Continue => {}
            FeeCheck::UnknownAsset => {
                warn!(nonce = event.nonce, asset = %event.asset, "event for unregistered asset");
                return Ok(Outcome::Dropped(DropReason::UnregisteredAsset));
            }
            FeeCheck::Underfunded => return Ok(Outcome::Dropped(DropReason::InsufficientFee)),
        }

        self.handle_event(event, normalize(origin_extra))
    }

    /// Error-path variant: the relay reports an upstream failure reason.
    ///
    /// The nonce is parked (recorded, not advanced) and the event is stored
    /// for manual replay unless policy disposes of it first.
    pub fn submit_error_event(
        &mut self,
        caller: &AccountName,
        event_bytes: &[u8],
        reason: &str,
        origin_extra: Option<&[u8]>,
    ) -> Result<Outcome> {
        self.require(caller, &self.config.publisher)?;
        let mut event = self.authenticate(event_bytes)?;
        sequencer::record(&mut self.state, event.nonce)?;

        match policy::apply_fee(&mut self.state, &mut event) {
            FeeCheck::Continue => {}
            FeeCheck::UnknownAsset => {
                warn!(nonce = event.nonce, asset = %event.asset, "error event for unregistered asset");
                return Ok(Outcome::Dropped(DropReason::UnregisteredAsset));
            }
            FeeCheck::Underfunded => return Ok(Outcome::Dropped(DropReason::InsufficientFee)),
        }

        if policy::is_expired(&event, self.config.expiration_secs) {
            self.refund(&event, "expired, refund");
            return Ok(Outcome::Refunded);
        }

        if self.state.errors.contains(&event.nonce) {
            return Err(ProxyError::DuplicateErrorEvent { nonce: event.nonce });
        }
        let nonce = event.nonce;
        self.state.errors.insert(ErrorEvent {
            event,
            reason: reason.to_string(),
            origin_extra: origin_extra.unwrap_or_default().to_vec(),
        })?;
        warn!(nonce, reason, "event deferred with upstream failure");
        Ok(Outcome::DeferredError)
    }

    /// Supply the missing out-of-band payload for a deferred-pending event.
    /// The pending record is consumed regardless of the outcome.
    pub fn retry_pending(
        &mut self,
        caller: &AccountName,
        nonce: u64,
        origin_extra: &[u8],
    ) -> Result<Outcome> {
        self.require_some_caller(caller)?;
        if origin_extra.is_empty() {
            return Err(ProxyError::EmptyOriginExtra);
        }
        let pending = self
            .state
            .remove_pending(nonce)
            .ok_or(ProxyError::PendingNotFound { nonce })?;
        self.handle_event(pending.event, Some(origin_extra))
    }

    /// Expire the oldest deferred-pending event if it aged out; otherwise
    /// replay the oldest deferred-error event. Either record is consumed
    /// regardless of the outcome.
    pub fn retry_error_or_expire_pending(&mut self, caller: &AccountName) -> Result<Outcome> {
        self.require_some_caller(caller)?;

        let expired_pending = self
            .state
            .pending
            .first()
            .filter(|p| policy::is_expired(&p.event, self.config.expiration_secs))
            .map(|p| p.event.nonce);
        if let Some(nonce) = expired_pending {
            if let Some(record) = self.state.remove_pending(nonce) {
                self.refund(&record.event, "expired, refund");
                return Ok(Outcome::Refunded);
            }
        }

        let error_event = self
            .state
            .errors
            .pop_first()
            .ok_or(ProxyError::NoErrorEvent)?;
        if policy::is_expired(&error_event.event, self.config.expiration_secs) {
            self.refund(&error_event.event, "expired, refund");
            return Ok(Outcome::Refunded);
        }
        let origin_extra = if error_event.origin_extra.is_empty() {
            None
        } else {
            Some(error_event.origin_extra.as_slice())
        };
        self.handle_event(error_event.event.clone(), origin_extra)
    }

    /// Withdrawal path: a local transfer into a bound account retires the
    /// wrapped amount and re-emits the intent upstream to the bound member.
    /// A deposit to the proxy itself is addressed by a uuid memo instead,
    /// so unbound holders can withdraw too.
    pub fn on_transfer(
        &mut self,
        caller: &AccountName,
        from: &AccountName,
        to: &AccountName,
        quantity: Quantity,
        memo: &str,
    ) -> Result<()> {
        self.require(caller, &self.config.token_contract)?;
        if from == &self.config.contract {
            return Ok(());
        }
        let member = if let Some(binding) = self.state.accounts.get(to) {
            binding.member
        } else if to == &self.config.contract {
            match MemberId::from_memo(memo) {
                Some(member) => member,
                None => {
                    warn!(%from, memo, "deposit carries no addressable memo");
                    return Ok(());
                }
            }
        } else {
            return Ok(());
        };

        let asset_id = self
            .state
            .assets
            .get(&quantity.symbol)
            .map(|a| a.asset_id)
            .ok_or_else(|| ProxyError::AssetNotRegistered(quantity.symbol.clone()))?;

        self.sink.submit(OutboundRequest::Retire {
            contract: self.config.token_contract.clone(),
            quantity: quantity.clone(),
            memo: "retire".to_string(),
        });

        let mut memo = memo.to_string();
        memo.truncate(128);
        let id = self.state.counters.advance(KEY_TX_OUT, 1);
        self.sink
            .submit(OutboundRequest::TransferRequest(TxRequest {
                nonce: id,
                contract: self.config.contract.clone(),
                process: self.config.process,
                asset: asset_id,
                members: vec![member],
                threshold: 1,
                amount: quantity.amount as u128,
                extra: memo.into_bytes(),
            }));
        info!(%to, %member, %quantity, "withdrawal requested upstream");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Admin reference-data mutation, off the hot path
    // ------------------------------------------------------------------

    pub fn register_asset(
        &mut self,
        caller: &AccountName,
        asset_id: AssetId,
        symbol: Symbol,
    ) -> Result<()> {
        self.require(caller, &self.config.contract)?;
        registry::register_asset(&mut self.state, asset_id, symbol)
    }

    pub fn unregister_asset(&mut self, caller: &AccountName, symbol: &Symbol) -> Result<()> {
        self.require(caller, &self.config.contract)?;
        registry::unregister_asset(&mut self.state, symbol)
    }

    pub fn set_transfer_fee(&mut self, caller: &AccountName, fee: Quantity) -> Result<()> {
        self.require(caller, &self.config.contract)?;
        registry::set_transfer_fee(&mut self.state, fee)
    }

    pub fn set_create_account_fee(&mut self, caller: &AccountName, fee: Quantity) -> Result<()> {
        self.require(caller, &self.config.contract)?;
        registry::set_create_account_fee(&mut self.state, fee)
    }

    // ------------------------------------------------------------------
    // Router internals
    // ------------------------------------------------------------------

    /// Decode and authenticate one submission against the current roster.
    ///
    /// All fatal shape checks happen here, before the sequencer or the fee
    /// schedule commit anything: an aborted submission must leave the nonce
    /// position intact.
    fn authenticate(&self, event_bytes: &[u8]) -> Result<TxEvent> {
        let (event, signed_len) = TxEvent::decode(event_bytes)?;
        verify_quorum(
            &event_bytes[..signed_len],
            &event.signatures,
            &self.state.signers,
        )?;
        if event.process != self.config.process {
            return Err(ProxyError::WrongProcess {
                expected: self.config.process,
                actual: event.process,
            });
        }
        if event.amount > MAX_AMOUNT {
            return Err(crossgate_types::AmountError::TooLarge {
                amount: event.amount,
            }
            .into());
        }
        Ok(event)
    }

    /// Steps after admission and fee: expiration, resolution, extra-payload
    /// branch, issuance, dispatch.
    fn handle_event(&mut self, mut event: TxEvent, origin_extra: Option<&[u8]>) -> Result<Outcome> {
        if policy::is_expired(&event, self.config.expiration_secs) {
            self.refund(&event, "expired, refund");
            return Ok(Outcome::Refunded);
        }

        if event.members.len() != 1 {
            warn!(nonce = event.nonce, members = event.members.len(), "multi-member events are not supported");
            return Ok(Outcome::Dropped(DropReason::UnsupportedMembers));
        }

        let Some(account) =
            account::resolve_or_provision(&mut self.state, &self.config, &self.sink, &mut event)?
        else {
            warn!(nonce = event.nonce, member = %event.members[0], "no account and provisioning conditions not met");
            return Ok(Outcome::Dropped(DropReason::UnresolvedAccount));
        };

        // Indirect extra with no payload supplied yet: defer on the
        // embedded commitment and wait for retry_pending.
        if origin_extra.is_none() && event.extra_kind() == Some(EXTRA_INDIRECT) {
            let extra_hash = match event.extra_commitment() {
                Ok(hash) => hash,
                Err(_) => {
                    warn!(nonce = event.nonce, "indirect extra too short for its commitment");
                    return Ok(Outcome::Dropped(DropReason::MalformedExtra));
                }
            };
            let nonce = event.nonce;
            self.state.insert_pending(PendingEvent {
                event,
                account,
                extra_hash,
            })?;
            info!(nonce, "event deferred awaiting its out-of-band payload");
            return Ok(Outcome::DeferredPending);
        }

        let instruction = match self.decode_instruction(&event, origin_extra)? {
            InstructionDecode::Forward(instruction) => Some(instruction),
            InstructionDecode::None => None,
            InstructionDecode::Invalid => {
                self.refund(&event, "invalid instruction payload, refund");
                return Ok(Outcome::Refunded);
            }
            InstructionDecode::Mismatch => {
                warn!(nonce = event.nonce, "out-of-band payload does not match its commitment");
                return Ok(Outcome::Dropped(DropReason::CommitmentMismatch));
            }
        };

        if !self.issue_asset(&event, &account) {
            return Ok(Outcome::Dropped(DropReason::UnregisteredAsset));
        }

        if let Some(instruction) = instruction {
            self.sink.submit(OutboundRequest::ForwardInstruction {
                authorizer: account.clone(),
                instruction,
            });
        }

        info!(nonce = event.nonce, %account, "event resolved");
        Ok(Outcome::Resolved)
    }

    fn decode_instruction(
        &self,
        event: &TxEvent,
        origin_extra: Option<&[u8]>,
    ) -> Result<InstructionDecode> {
        let Some(payload) = origin_extra else {
            return match event.extra.split_first() {
                // Empty extra is a plain transfer to the resolved account.
                None => Ok(InstructionDecode::None),
                Some((&EXTRA_DIRECT, body)) => Ok(decode_forwarded(body)),
                Some((&other, _)) => Err(CodecError::BadDiscriminator(other).into()),
            };
        };

        match event.extra_kind() {
            Some(EXTRA_INDIRECT) => {}
            Some(other) => return Err(CodecError::BadDiscriminator(other).into()),
            None => {
                return Err(CodecError::UnexpectedEof {
                    offset: 0,
                    needed: 1,
                }
                .into())
            }
        }
        let commitment = event.extra_commitment()?;
        if !matches_commitment(payload, &commitment) {
            return Ok(InstructionDecode::Mismatch);
        }

        let operation = Operation::decode(payload)?;
        match operation.extra.first() {
            Some(&EXTRA_DIRECT) => Ok(decode_forwarded(&operation.extra[1..])),
            Some(&other) => Err(CodecError::BadDiscriminator(other).into()),
            None => Ok(InstructionDecode::None),
        }
    }

    /// Mint the net amount to this contract and transfer it onward.
    /// `false` means the asset has no registered symbol; nothing happens.
    fn issue_asset(&mut self, event: &TxEvent, account: &AccountName) -> bool {
        let Some(symbol) = self.state.symbol_for_asset(&event.asset) else {
            warn!(nonce = event.nonce, asset = %event.asset, "no local symbol to issue");
            return false;
        };
        // The ceiling was enforced before this point.
        let quantity = Quantity::new(event.amount as i64, symbol.clone());

        if !self.state.tokens.contains(&symbol) {
            self.sink.submit(OutboundRequest::RegisterToken {
                contract: self.config.token_contract.clone(),
                symbol: symbol.clone(),
                max_supply: self.config.max_supply,
            });
            self.state.tokens.upsert(TokenRegistration {
                symbol,
                max_supply: self.config.max_supply,
            });
        }

        self.sink.submit(OutboundRequest::Mint {
            contract: self.config.token_contract.clone(),
            to: self.config.contract.clone(),
            quantity: quantity.clone(),
        });
        self.sink.submit(OutboundRequest::TransferToken {
            contract: self.config.token_contract.clone(),
            from: self.config.contract.clone(),
            to: account.clone(),
            quantity,
            memo: "bridge transfer".to_string(),
        });
        true
    }

    /// Re-emit the (post-fee) transfer intent upstream.
    fn refund(&mut self, event: &TxEvent, memo: &str) {
        let id = self.state.counters.advance(KEY_TX_OUT, 1);
        self.sink
            .submit(OutboundRequest::TransferRequest(TxRequest {
                nonce: id,
                contract: self.config.contract.clone(),
                process: event.process,
                asset: event.asset,
                members: event.members.clone(),
                threshold: event.threshold,
                amount: event.amount,
                extra: memo.as_bytes().to_vec(),
            }));
        info!(nonce = event.nonce, memo, "requested upstream refund");
    }

    fn require(&self, caller: &AccountName, expected: &AccountName) -> Result<()> {
        if caller != expected {
            return Err(ProxyError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    /// Retries are open to any authenticated account.
    fn require_some_caller(&self, caller: &AccountName) -> Result<()> {
        if caller.is_empty() {
            return Err(ProxyError::Unauthorized(caller.clone()));
        }
        Ok(())
    }
}

fn decode_forwarded(bytes: &[u8]) -> InstructionDecode {
    match Instruction::decode(bytes) {
        Ok(Some(instruction)) => InstructionDecode::Forward(instruction),
        Ok(None) => InstructionDecode::None,
        Err(_) => InstructionDecode::Invalid,
    }
}

fn normalize(origin_extra: Option<&[u8]>) -> Option<&[u8]> {
    origin_extra.filter(|extra| !extra.is_empty())
}
