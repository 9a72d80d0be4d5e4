//! Outbound requests to external collaborators
//!
//! Every side effect of the pipeline — account creation, token operations,
//! instruction forwarding, upstream transfer requests — is requested
//! synchronously through an [`OutboundSink`] and executed asynchronously by
//! whatever consumes the sink. Nothing is awaited and nothing can be
//! compensated after submission.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crossgate_types::{AccountName, AssetId, Instruction, MemberId, ProcessId, Quantity, Symbol};

/// A transfer intent re-emitted upstream (refunds and withdrawals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub nonce: u64,
    pub contract: AccountName,
    pub process: ProcessId,
    pub asset: AssetId,
    pub members: Vec<MemberId>,
    pub threshold: i32,
    pub amount: u128,
    pub extra: Vec<u8>,
}

/// A fire-and-forget request to an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundRequest {
    CreateAccount {
        creator: AccountName,
        owner: AccountName,
        account: AccountName,
    },
    RegisterToken {
        contract: AccountName,
        symbol: Symbol,
        max_supply: i64,
    },
    Mint {
        contract: AccountName,
        to: AccountName,
        quantity: Quantity,
    },
    TransferToken {
        contract: AccountName,
        from: AccountName,
        to: AccountName,
        quantity: Quantity,
        memo: String,
    },
    Retire {
        contract: AccountName,
        quantity: Quantity,
        memo: String,
    },
    ForwardInstruction {
        authorizer: AccountName,
        instruction: Instruction,
    },
    TransferRequest(TxRequest),
}

/// Where the pipeline drops its outbound requests.
pub trait OutboundSink: Send {
    fn submit(&self, request: OutboundRequest);
}

/// Sink that records requests in memory; the test harness inspects it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<OutboundRequest> {
        std::mem::take(&mut *self.requests.lock())
    }

    pub fn snapshot(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

impl OutboundSink for RecordingSink {
    fn submit(&self, request: OutboundRequest) {
        self.requests.lock().push(request);
    }
}

/// Sink backed by an unbounded channel; pairs with [`run_dispatcher`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundRequest>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutboundSink for ChannelSink {
    fn submit(&self, request: OutboundRequest) {
        // Fire and forget: a closed dispatcher only loses the request,
        // exactly like a dropped action on the wire.
        let _ = self.tx.send(request);
    }
}

/// Executes outbound requests against the real collaborators.
#[async_trait]
pub trait OutboundHandler: Send + Sync {
    async fn handle(&self, request: OutboundRequest);
}

/// Drain a [`ChannelSink`]'s receiver into a handler until the sink closes.
pub async fn run_dispatcher<H: OutboundHandler>(
    mut rx: mpsc::UnboundedReceiver<OutboundRequest>,
    handler: H,
) {
    while let Some(request) = rx.recv().await {
        debug!(?request, "dispatching outbound request");
        handler.handle(request).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingHandler {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OutboundHandler for CountingHandler {
        async fn handle(&self, _request: OutboundRequest) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn retire_request(n: i64) -> OutboundRequest {
        OutboundRequest::Retire {
            contract: AccountName::from("crossgatewtk"),
            quantity: Quantity::new(n, Symbol::from("CBTC")),
            memo: "retire".to_string(),
        }
    }

    #[test]
    fn recording_sink_drains() {
        let sink = RecordingSink::new();
        sink.submit(retire_request(1));
        sink.submit(retire_request(2));
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn dispatcher_sees_every_request() {
        let (sink, rx) = ChannelSink::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler { seen: seen.clone() };
        let dispatcher = tokio::spawn(run_dispatcher(rx, handler));

        for n in 0..5 {
            sink.submit(retire_request(n));
        }
        drop(sink);

        dispatcher.await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn submitting_after_dispatcher_is_gone_is_silent() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.submit(retire_request(1));
    }
}
