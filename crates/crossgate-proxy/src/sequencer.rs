//! Nonce admission and the out-of-order window
//!
//! The low-water mark `next` is the smallest nonce not yet fully admitted.
//! Nonces at or above the mark (the comparison is inclusive: `nonce == next`
//! re-admits the exact mark position and advances it) enter the window as
//! [`SubmittedMarker`] records; the mark fast-forwards through contiguous
//! runs and stale markers at or behind it are pruned, keeping the window
//! bounded.

use crate::{ProxyError, ProxyState, Result, SubmittedMarker, KEY_NONCE};

/// The current low-water mark, seeding it on first access.
///
/// Nonces start at 1; nonce 0 belongs to the process-registration handshake
/// and never reaches this contract.
pub(crate) fn low_water_mark(state: &mut ProxyState) -> u64 {
    state.counters.read_or_seed(KEY_NONCE, 1)
}

/// Admit a nonce for full processing and advance the mark through any
/// contiguous run it completes.
pub(crate) fn admit(state: &mut ProxyState, nonce: u64) -> Result<()> {
    let next = low_water_mark(state);
    if nonce < next {
        return Err(ProxyError::StaleNonce { nonce, next });
    }
    if state.submitted.contains(&nonce) {
        return Err(ProxyError::DuplicateNonce { nonce });
    }
    state.submitted.insert(SubmittedMarker { nonce })?;

    let mut mark = next;
    while state.submitted.remove(&mark).is_some() {
        mark = state.counters.advance(KEY_NONCE, 2);
    }

    // Stale markers at or behind the advanced mark are unreachable; prune.
    while let Some(first) = state.submitted.first() {
        if first.nonce > mark {
            break;
        }
        let stale = first.nonce;
        state.submitted.remove(&stale);
    }

    Ok(())
}

/// Record a nonce as seen without advancing the mark (error-path events
/// park at their position until manually replayed).
pub(crate) fn record(state: &mut ProxyState, nonce: u64) -> Result<()> {
    let next = low_water_mark(state);
    if nonce < next {
        return Err(ProxyError::StaleNonce { nonce, next });
    }
    if state.submitted.contains(&nonce) {
        return Err(ProxyError::DuplicateNonce { nonce });
    }
    state.submitted.insert(SubmittedMarker { nonce })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark_of(state: &mut ProxyState) -> u64 {
        low_water_mark(state)
    }

    #[test]
    fn in_order_run_advances_the_mark() {
        let mut state = ProxyState::default();
        for nonce in 1..=5 {
            admit(&mut state, nonce).unwrap();
        }
        assert_eq!(mark_of(&mut state), 6);
        assert!(state.submitted.is_empty());
    }

    #[test]
    fn gaps_buffer_until_filled() {
        let mut state = ProxyState::default();
        admit(&mut state, 3).unwrap();
        admit(&mut state, 2).unwrap();
        assert_eq!(mark_of(&mut state), 1);
        assert_eq!(state.submitted.len(), 2);

        admit(&mut state, 1).unwrap();
        assert_eq!(mark_of(&mut state), 4);
        assert!(state.submitted.is_empty());
    }

    #[test]
    fn replay_behind_the_mark_is_fatal() {
        let mut state = ProxyState::default();
        for nonce in 1..=3 {
            admit(&mut state, nonce).unwrap();
        }
        assert!(matches!(
            admit(&mut state, 2),
            Err(ProxyError::StaleNonce { nonce: 2, next: 4 })
        ));
    }

    #[test]
    fn duplicate_in_the_window_is_fatal() {
        let mut state = ProxyState::default();
        admit(&mut state, 5).unwrap();
        assert!(matches!(
            admit(&mut state, 5),
            Err(ProxyError::DuplicateNonce { nonce: 5 })
        ));
    }

    #[test]
    fn the_exact_mark_is_admissible() {
        let mut state = ProxyState::default();
        assert_eq!(mark_of(&mut state), 1);
        admit(&mut state, 1).unwrap();
        assert_eq!(mark_of(&mut state), 2);
    }

    #[test]
    fn convergence_is_order_independent() {
        // Every permutation of 1..=6 must land on the same mark.
        let orders: [[u64; 6]; 4] = [
            [1, 2, 3, 4, 5, 6],
            [6, 5, 4, 3, 2, 1],
            [2, 4, 6, 1, 3, 5],
            [3, 1, 6, 2, 5, 4],
        ];
        for order in orders {
            let mut state = ProxyState::default();
            for nonce in order {
                admit(&mut state, nonce).unwrap();
            }
            assert_eq!(mark_of(&mut state), 7, "order {order:?}");
            assert!(state.submitted.is_empty(), "order {order:?}");
        }
    }

    #[test]
    fn recorded_nonce_holds_the_mark() {
        let mut state = ProxyState::default();
        record(&mut state, 1).unwrap();
        assert_eq!(mark_of(&mut state), 1);

        // The same position cannot be recorded or admitted twice.
        assert!(record(&mut state, 1).is_err());

        // A later admission at the mark consumes the parked marker first.
        admit(&mut state, 2).unwrap();
        assert_eq!(mark_of(&mut state), 3);
    }
}
