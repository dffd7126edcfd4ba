//! Boundary traits for the external browser surface.

use url::Url;

use crate::error::Result;

/// External collaborator that shows the authorization URL to the user.
///
/// Implementations wrap whatever the host platform offers (system browser,
/// in-app web session). Completion never comes back through this trait: the
/// host delivers the callback URL to [`TransactionStore::resume`], or maps a
/// user dismissal to [`TransactionStore::cancel`].
///
/// [`TransactionStore::resume`]: crate::store::TransactionStore::resume
/// [`TransactionStore::cancel`]: crate::store::TransactionStore::cancel
pub trait Presenter: Send + Sync {
    /// Display `url` and arrange for `redirect_url` activations to reach the
    /// application. Launch failures are synchronous.
    fn present(&self, url: &Url, redirect_url: &Url) -> Result<Box<dyn PresentedSession>>;
}

/// Handle on a presented surface; lets the store dismiss it on cancellation.
pub trait PresentedSession: Send + Sync {
    fn dismiss(&self);
}

/// Presenter that shows nothing and whose sessions ignore dismissal.
///
/// For headless flows and tests where the caller drives `resume` directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

struct NullSession;

impl PresentedSession for NullSession {
    fn dismiss(&self) {}
}

impl Presenter for NullPresenter {
    fn present(&self, _url: &Url, _redirect_url: &Url) -> Result<Box<dyn PresentedSession>> {
        Ok(Box::new(NullSession))
    }
}
