//! A pending authentication or logout attempt.

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::callback::CallbackPayload;
use crate::error::WebAuthError;

/// Outcome delivered through a transaction's result sink, exactly once.
///
/// Cancellation is `Err(WebAuthError::UserCancelled)`.
pub type TransactionResult = std::result::Result<CallbackPayload, WebAuthError>;

/// One-shot completion sink for a transaction.
pub type ResultSink = Box<dyn FnOnce(TransactionResult) + Send + 'static>;

/// Whether an attempt is an interactive login or a session logout.
///
/// Logout callbacks carry no state token, so the store resolves them without
/// the state cross-check it applies to logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Login,
    Logout,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Login => "login",
            TransactionKind::Logout => "logout",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pending login/logout attempt awaiting a callback or cancellation.
///
/// Resolution consumes the transaction, so the sink can never be invoked
/// twice. The cancel hook asks the external presenter to dismiss its UI; it
/// is separate from resolution and may run zero or one times.
pub struct Transaction {
    id: Uuid,
    kind: TransactionKind,
    expected_state: String,
    started_at: DateTime<Utc>,
    sink: ResultSink,
    cancel_hook: Option<Box<dyn Fn() + Send>>,
}

impl Transaction {
    /// Create a transaction delivering its result to `sink`.
    pub fn new(
        kind: TransactionKind,
        expected_state: impl Into<String>,
        sink: impl FnOnce(TransactionResult) + Send + 'static,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            expected_state: expected_state.into(),
            started_at: Utc::now(),
            sink: Box::new(sink),
            cancel_hook: None,
        }
    }

    /// Create a transaction delivering its result through a oneshot channel.
    ///
    /// The receiver completes with an error if the transaction is dropped
    /// unresolved (e.g. by [`TransactionStore::clear`]).
    ///
    /// [`TransactionStore::clear`]: crate::store::TransactionStore::clear
    pub fn channel(
        kind: TransactionKind,
        expected_state: impl Into<String>,
    ) -> (Self, oneshot::Receiver<TransactionResult>) {
        let (tx, rx) = oneshot::channel();
        let transaction = Self::new(kind, expected_state, move |result| {
            // receiver may have been dropped; nothing left to notify
            let _ = tx.send(result);
        });
        (transaction, rx)
    }

    /// Attach a hook that dismisses externally-presented UI.
    pub fn with_cancel_hook(mut self, hook: impl Fn() + Send + 'static) -> Self {
        self.cancel_hook = Some(Box::new(hook));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn expected_state(&self) -> &str {
        &self.expected_state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Deliver the final outcome. Consumes the transaction.
    pub(crate) fn resolve(self, result: TransactionResult) {
        debug!(
            id = %self.id,
            kind = %self.kind,
            outcome = if result.is_ok() { "success" } else { "failure" },
            "resolving transaction"
        );
        (self.sink)(result);
    }

    /// Ask the presenter to dismiss its UI, if a hook was attached.
    pub(crate) fn dismiss(&self) {
        if let Some(hook) = &self.cancel_hook {
            hook();
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("expected_state", &self.expected_state)
            .field("started_at", &self.started_at)
            .field("cancel_hook", &self.cancel_hook.as_ref().map(|_| ".."))
            .finish()
    }
}
