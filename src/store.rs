//! Single-slot transaction store.
//!
//! Holds at most one pending [`Transaction`] and linearizes `store`,
//! `resume`, `cancel`, and `clear` against each other: each is one
//! lock-guarded read-modify-write of the slot. Sinks and cancel hooks run
//! after the guard is released, so a re-entrant sink cannot deadlock. No
//! operation suspends.

use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::callback::{self, CallbackPayload};
use crate::error::WebAuthError;
use crate::transaction::{Transaction, TransactionKind};

static SHARED_STORE: OnceLock<Arc<TransactionStore>> = OnceLock::new();

/// Registry of the single in-flight login/logout attempt.
///
/// Explicitly constructed and injectable; [`TransactionStore::shared`] offers
/// a process-wide default for hosts that route OS URL activations through a
/// single entry point.
///
/// # Example
/// ```
/// use webauth::store::TransactionStore;
/// use webauth::transaction::{Transaction, TransactionKind};
///
/// let store = TransactionStore::new();
/// let (transaction, _rx) = Transaction::channel(TransactionKind::Login, "state-1");
/// store.store(transaction);
/// assert!(store.is_pending());
/// ```
#[derive(Debug, Default)]
pub struct TransactionStore {
    current: Mutex<Option<Transaction>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the process-wide default store.
    pub fn shared() -> Arc<TransactionStore> {
        Arc::clone(SHARED_STORE.get_or_init(|| Arc::new(TransactionStore::new())))
    }

    /// Install `transaction` as the current one.
    ///
    /// A transaction already pending is not silently abandoned: its presenter
    /// UI is dismissed and its sink resolved as cancelled before the new one
    /// takes the slot.
    pub fn store(&self, transaction: Transaction) {
        debug!(
            id = %transaction.id(),
            kind = %transaction.kind(),
            "storing transaction"
        );
        let replaced = self.current.lock().unwrap().replace(transaction);
        if let Some(old) = replaced {
            warn!(
                id = %old.id(),
                kind = %old.kind(),
                "replacing a pending transaction; resolving the old one as cancelled"
            );
            old.dismiss();
            old.resolve(Err(WebAuthError::UserCancelled));
        }
    }

    /// Route a callback URL to the pending transaction.
    ///
    /// Returns `false` (unhandled) when nothing is pending, or when a login
    /// is pending and the URL carries no query/fragment data — unrelated URL
    /// activations pass through with the state unchanged.
    ///
    /// Otherwise the pending transaction is resolved — success, provider
    /// error, state mismatch, or malformed callback — the store goes idle,
    /// and `true` is returned.
    pub fn resume(&self, url: &Url) -> bool {
        let payload = callback::parse(url);
        let transaction = {
            let mut guard = self.current.lock().unwrap();
            let Some(transaction) = guard.take() else {
                debug!("resume with no pending transaction; ignoring");
                return false;
            };
            if transaction.kind() == TransactionKind::Login && payload.is_none() {
                debug!(url = %url, "callback URL carries no response data; ignoring");
                *guard = Some(transaction);
                return false;
            }
            transaction
        };

        let result = match transaction.kind() {
            // A logout callback is just the return redirect; any payload
            // (usually none) means the session was cleared.
            TransactionKind::Logout => Ok(payload.unwrap_or_default()),
            TransactionKind::Login => {
                validate_login_callback(transaction.expected_state(), payload.unwrap_or_default())
            }
        };
        transaction.resolve(result);
        true
    }

    /// Cancel the pending transaction if `id` matches it.
    ///
    /// Dismisses the presenter UI and resolves the sink as cancelled.
    /// Cancelling anything that is not current — including a transaction
    /// already resolved — is a no-op returning `false`.
    pub fn cancel(&self, id: Uuid) -> bool {
        let taken = {
            let mut guard = self.current.lock().unwrap();
            match guard.as_ref() {
                Some(current) if current.id() == id => guard.take(),
                _ => None,
            }
        };
        match taken {
            Some(transaction) => {
                debug!(id = %id, "cancelling pending transaction");
                transaction.dismiss();
                transaction.resolve(Err(WebAuthError::UserCancelled));
                true
            }
            None => {
                debug!(id = %id, "cancel for a transaction that is not current; ignoring");
                false
            }
        }
    }

    /// Cancel whatever transaction is pending, regardless of id.
    ///
    /// Used when a new attempt replaces one still in flight: the old UI is
    /// dismissed and the old sink resolved as cancelled before the new
    /// surface launches, so a callback landing in between is unhandled
    /// rather than matched against the old state.
    pub fn cancel_pending(&self) -> bool {
        let taken = self.current.lock().unwrap().take();
        match taken {
            Some(transaction) => {
                debug!(
                    id = %transaction.id(),
                    kind = %transaction.kind(),
                    "cancelling pending transaction ahead of a replacement"
                );
                transaction.dismiss();
                transaction.resolve(Err(WebAuthError::UserCancelled));
                true
            }
            None => false,
        }
    }

    /// Forcibly empty the slot without resolving the sink.
    ///
    /// Reset/teardown escape hatch; a channel-backed transaction's receiver
    /// observes the drop as a closed channel.
    pub fn clear(&self) {
        let dropped = self.current.lock().unwrap().take();
        if let Some(transaction) = dropped {
            debug!(
                id = %transaction.id(),
                "clearing pending transaction without resolution"
            );
        }
    }

    pub fn is_pending(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    /// Id of the pending transaction, if any.
    pub fn pending_id(&self) -> Option<Uuid> {
        self.current.lock().unwrap().as_ref().map(Transaction::id)
    }
}

/// Apply the login callback checks, strictest first.
fn validate_login_callback(
    expected_state: &str,
    payload: CallbackPayload,
) -> Result<CallbackPayload, WebAuthError> {
    match payload.state() {
        None => {
            return Err(WebAuthError::MalformedCallback(
                "callback is missing the state parameter".to_string(),
            ));
        }
        Some(actual) if actual != expected_state => {
            return Err(WebAuthError::StateMismatch {
                expected: expected_state.to_string(),
                actual: Some(actual.to_string()),
            });
        }
        Some(_) => {}
    }
    if let Some(code) = payload.error() {
        return Err(WebAuthError::Provider {
            code: code.to_string(),
            description: payload.error_description().map(String::from),
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn callback_url(query: &str) -> Url {
        Url::parse(&format!(
            "app://samples.auth0.com/ios/app/callback{query}"
        ))
        .unwrap()
    }

    fn recording_transaction(
        state: &str,
    ) -> (Transaction, Arc<Mutex<Vec<TransactionResult>>>) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink_results = Arc::clone(&results);
        let transaction = Transaction::new(TransactionKind::Login, state, move |result| {
            sink_results.lock().unwrap().push(result);
        });
        (transaction, results)
    }

    #[test]
    fn resume_with_nothing_pending_is_unhandled() {
        let store = TransactionStore::new();
        assert!(!store.resume(&callback_url("?code=abc&state=xyz")));
    }

    #[test]
    fn resume_resolves_pending_login_with_success() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("xyz");
        store.store(transaction);

        assert!(store.resume(&callback_url("?code=abc&state=xyz")));
        assert!(!store.is_pending());

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        let payload = results[0].as_ref().unwrap();
        assert_eq!(payload.code(), Some("abc"));
        assert_eq!(payload.state(), Some("xyz"));
    }

    #[test]
    fn resume_reports_state_mismatch_as_failure() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("expected");
        store.store(transaction);

        assert!(store.resume(&callback_url("?code=abc&state=forged")));
        assert!(!store.is_pending());

        let results = results.lock().unwrap();
        assert!(matches!(
            results[0],
            Err(WebAuthError::StateMismatch { .. })
        ));
    }

    #[test]
    fn resume_reports_missing_state_as_malformed() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("expected");
        store.store(transaction);

        assert!(store.resume(&callback_url("?code=abc")));
        let results = results.lock().unwrap();
        assert!(matches!(
            results[0],
            Err(WebAuthError::MalformedCallback(_))
        ));
    }

    #[test]
    fn resume_reports_provider_error() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("xyz");
        store.store(transaction);

        assert!(store.resume(&callback_url(
            "?state=xyz&error=access_denied&error_description=nope"
        )));
        let results = results.lock().unwrap();
        match &results[0] {
            Err(WebAuthError::Provider { code, description }) => {
                assert_eq!(code, "access_denied");
                assert_eq!(description.as_deref(), Some("nope"));
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[test]
    fn bare_url_passes_through_leaving_login_pending() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("xyz");
        store.store(transaction);

        assert!(!store.resume(&callback_url("")));
        assert!(store.is_pending());
        assert!(results.lock().unwrap().is_empty());
    }

    #[test]
    fn bare_url_resolves_pending_logout() {
        let store = TransactionStore::new();
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink_results = Arc::clone(&results);
        store.store(Transaction::new(
            TransactionKind::Logout,
            "unused",
            move |result| sink_results.lock().unwrap().push(result),
        ));

        assert!(store.resume(&callback_url("")));
        assert!(!store.is_pending());
        let results = results.lock().unwrap();
        assert!(results[0].is_ok());
    }

    #[test]
    fn cancel_resolves_current_as_cancelled_and_dismisses() {
        let store = TransactionStore::new();
        let dismissals = Arc::new(AtomicUsize::new(0));
        let dismissals_clone = Arc::clone(&dismissals);
        let (transaction, results) = recording_transaction("xyz");
        let transaction = transaction.with_cancel_hook(move || {
            dismissals_clone.fetch_add(1, Ordering::SeqCst);
        });
        let id = transaction.id();
        store.store(transaction);

        assert!(store.cancel(id));
        assert!(!store.is_pending());
        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
        assert!(matches!(
            results.lock().unwrap()[0],
            Err(WebAuthError::UserCancelled)
        ));
    }

    #[test]
    fn second_cancel_is_a_noop() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("xyz");
        let id = transaction.id();
        store.store(transaction);

        assert!(store.cancel(id));
        assert!(!store.cancel(id));
        // sink invoked exactly once
        assert_eq!(results.lock().unwrap().len(), 1);
    }

    #[test]
    fn cancel_of_non_current_transaction_is_a_noop() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("xyz");
        store.store(transaction);

        assert!(!store.cancel(Uuid::new_v4()));
        assert!(store.is_pending());
        assert!(results.lock().unwrap().is_empty());
    }

    #[test]
    fn storing_over_a_pending_transaction_cancels_the_old_one() {
        let store = TransactionStore::new();
        let dismissals = Arc::new(AtomicUsize::new(0));
        let dismissals_clone = Arc::clone(&dismissals);
        let (old, old_results) = recording_transaction("old-state");
        let old = old.with_cancel_hook(move || {
            dismissals_clone.fetch_add(1, Ordering::SeqCst);
        });
        store.store(old);

        let (new, new_results) = recording_transaction("new-state");
        let new_id = new.id();
        store.store(new);

        // old one was dismissed and resolved as cancelled
        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
        assert!(matches!(
            old_results.lock().unwrap()[0],
            Err(WebAuthError::UserCancelled)
        ));

        // only the new one is current
        assert_eq!(store.pending_id(), Some(new_id));
        assert!(new_results.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_pending_resolves_current_without_an_id() {
        let store = TransactionStore::new();
        let dismissals = Arc::new(AtomicUsize::new(0));
        let dismissals_clone = Arc::clone(&dismissals);
        let (transaction, results) = recording_transaction("xyz");
        let transaction = transaction.with_cancel_hook(move || {
            dismissals_clone.fetch_add(1, Ordering::SeqCst);
        });
        store.store(transaction);

        assert!(store.cancel_pending());
        assert!(!store.is_pending());
        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
        assert!(matches!(
            results.lock().unwrap()[0],
            Err(WebAuthError::UserCancelled)
        ));
    }

    #[test]
    fn cancel_pending_on_an_idle_store_is_a_noop() {
        let store = TransactionStore::new();
        assert!(!store.cancel_pending());
    }

    #[test]
    fn clear_drops_without_resolving() {
        let store = TransactionStore::new();
        let (transaction, results) = recording_transaction("xyz");
        store.store(transaction);

        store.clear();
        assert!(!store.is_pending());
        assert!(results.lock().unwrap().is_empty());
    }

    #[test]
    fn resume_after_cancel_is_unhandled() {
        let store = TransactionStore::new();
        let (transaction, _results) = recording_transaction("xyz");
        let id = transaction.id();
        store.store(transaction);
        store.cancel(id);

        assert!(!store.resume(&callback_url("?code=abc&state=xyz")));
    }

    #[test]
    fn shared_store_returns_the_same_instance() {
        let a = TransactionStore::shared();
        let b = TransactionStore::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn operations_are_serialized_across_threads() {
        let store = Arc::new(TransactionStore::new());
        let resolutions = Arc::new(AtomicUsize::new(0));

        let resolutions_clone = Arc::clone(&resolutions);
        let transaction = Transaction::new(TransactionKind::Login, "xyz", move |_| {
            resolutions_clone.fetch_add(1, Ordering::SeqCst);
        });
        let id = transaction.id();
        store.store(transaction);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                if i % 2 == 0 {
                    store.resume(&Url::parse("app://cb?code=abc&state=xyz").unwrap())
                } else {
                    store.cancel(id)
                }
            }));
        }
        let handled: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        // exactly one competitor wins; the sink fires exactly once
        assert_eq!(handled, 1);
        assert_eq!(resolutions.load(Ordering::SeqCst), 1);
        assert!(!store.is_pending());
    }
}
