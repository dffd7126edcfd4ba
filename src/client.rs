//! Entry-point facade tying configuration, store, and presenter together.

use std::sync::Arc;

use url::Url;

use crate::config::ClientConfig;
use crate::presenter::Presenter;
use crate::redirect::Platform;
use crate::request::{LoginRequest, LogoutRequest};
use crate::store::TransactionStore;

/// Web-based authentication client for one application.
///
/// Holds the pieces every attempt needs — tenant configuration, the app's
/// bundle/package identifier, the runtime platform, a transaction store, and
/// a presenter — and hands out per-attempt request builders.
///
/// Uses the process-wide [`TransactionStore::shared`] by default so OS URL
/// activations can be routed through any instance; inject a store with
/// [`WebAuth::with_store`] for isolation (tests, multi-tenant hosts).
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use webauth::client::WebAuth;
/// use webauth::config::ClientConfig;
/// use webauth::presenter::NullPresenter;
/// use webauth::redirect::Platform;
///
/// # async fn example() -> webauth::error::Result<()> {
/// let config = ClientConfig::new("client-id", "samples.auth0.com")?;
/// let auth = WebAuth::new(config, "com.example.app", Platform::Ios, Arc::new(NullPresenter));
///
/// let session = auth.login().scope("openid profile").start()?;
/// // ... OS delivers the callback URL to auth.resume(&url) ...
/// let payload = session.finish().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WebAuth {
    config: ClientConfig,
    app_id: String,
    platform: Platform,
    store: Arc<TransactionStore>,
    presenter: Arc<dyn Presenter>,
}

impl WebAuth {
    pub fn new(
        config: ClientConfig,
        app_id: impl Into<String>,
        platform: Platform,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            config,
            app_id: app_id.into(),
            platform,
            store: TransactionStore::shared(),
            presenter,
        }
    }

    /// Use an explicit transaction store instead of the shared one.
    pub fn with_store(mut self, store: Arc<TransactionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TransactionStore> {
        &self.store
    }

    /// Begin configuring an interactive login.
    pub fn login(&self) -> LoginRequest {
        LoginRequest::new(
            self.config.clone(),
            self.app_id.clone(),
            self.platform,
            Arc::clone(&self.store),
            Arc::clone(&self.presenter),
        )
    }

    /// Begin configuring a logout (clear-session) round trip.
    pub fn logout(&self) -> LogoutRequest {
        LogoutRequest::new(
            self.config.clone(),
            self.app_id.clone(),
            self.platform,
            Arc::clone(&self.store),
            Arc::clone(&self.presenter),
        )
    }

    /// Route a callback URL delivered by the OS to the pending attempt.
    ///
    /// Returns `false` when the URL was not for a pending attempt.
    pub fn resume(&self, url: &Url) -> bool {
        self.store.resume(url)
    }
}

impl std::fmt::Debug for WebAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebAuth")
            .field("config", &self.config)
            .field("app_id", &self.app_id)
            .field("platform", &self.platform)
            .field("presenter", &"..")
            .finish()
    }
}
