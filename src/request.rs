//! Fluent login/logout request builders.
//!
//! A request is a per-attempt configuration snapshot: every setter consumes
//! and returns the request, and `start()` consumes it for good, so two
//! concurrent attempts can never share mutable builder state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::authorize;
use crate::callback::CallbackPayload;
use crate::config::ClientConfig;
use crate::error::{Result, WebAuthError};
use crate::parameters::ParameterSet;
use crate::pkce::{self, Challenge};
use crate::presenter::Presenter;
use crate::redirect::{self, Platform};
use crate::store::TransactionStore;
use crate::transaction::{Transaction, TransactionKind, TransactionResult};

/// Scope requested when the caller sets none.
const DEFAULT_SCOPE: &str = "openid profile email";
/// Default clock-skew tolerance handed to the token-validation collaborator.
const DEFAULT_LEEWAY_MS: u64 = 60_000;

/// Builder for one interactive login attempt.
///
/// Obtained from [`WebAuth::login`](crate::client::WebAuth::login).
pub struct LoginRequest {
    config: ClientConfig,
    app_id: String,
    platform: Platform,
    store: Arc<TransactionStore>,
    presenter: Arc<dyn Presenter>,
    connection: Option<String>,
    scope: Option<String>,
    audience: Option<String>,
    organization: Option<String>,
    invitation: Option<String>,
    state: Option<String>,
    max_age_ms: Option<u64>,
    connection_scope: Option<String>,
    leeway_ms: u64,
    issuer: Option<String>,
    redirect_url: Option<Url>,
    extra: HashMap<String, String>,
}

impl LoginRequest {
    pub(crate) fn new(
        config: ClientConfig,
        app_id: String,
        platform: Platform,
        store: Arc<TransactionStore>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            config,
            app_id,
            platform,
            store,
            presenter,
            connection: None,
            scope: None,
            audience: None,
            organization: None,
            invitation: None,
            state: None,
            max_age_ms: None,
            connection_scope: None,
            leeway_ms: DEFAULT_LEEWAY_MS,
            issuer: None,
            redirect_url: None,
            extra: HashMap::new(),
        }
    }

    /// Name of the identity-provider connection to use.
    pub fn connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    /// Requested scopes, space-delimited. Replaces the default scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// API audience for the issued access token.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Organization context for the login.
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Organization invitation ticket.
    pub fn organization_invitation(mut self, invitation: impl Into<String>) -> Self {
        self.invitation = Some(invitation.into());
        self
    }

    /// Extract `organization` and `invitation` from an invitation link.
    pub fn invitation_url(mut self, url: &Url) -> Result<Self> {
        let mut organization = None;
        let mut invitation = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "organization" => organization = Some(value.into_owned()),
                "invitation" => invitation = Some(value.into_owned()),
                _ => {}
            }
        }
        match (organization, invitation) {
            (Some(organization), Some(invitation)) => {
                self.organization = Some(organization);
                self.invitation = Some(invitation);
                Ok(self)
            }
            _ => Err(WebAuthError::Configuration(format!(
                "invitation URL is missing organization/invitation parameters: {url}"
            ))),
        }
    }

    /// Override the generated anti-forgery state token.
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Maximum SSO session age in milliseconds.
    pub fn max_age(mut self, max_age_ms: u64) -> Self {
        self.max_age_ms = Some(max_age_ms);
        self
    }

    /// Connection-specific scopes (social connections), comma-joined.
    pub fn connection_scope<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = scopes
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .join(",");
        self.connection_scope = Some(joined);
        self
    }

    /// Clock-skew tolerance in milliseconds for downstream token validation.
    pub fn leeway(mut self, leeway_ms: u64) -> Self {
        self.leeway_ms = leeway_ms;
        self
    }

    /// Expected token issuer for downstream token validation.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Use a fully custom redirect URL instead of the computed callback URI.
    pub fn redirect_url(mut self, url: Url) -> Self {
        self.redirect_url = Some(url);
        self
    }

    /// Merge a free-form parameter map. Applied last; `scope` unions instead
    /// of overwriting (see [`ParameterSet::merge`]).
    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Start the attempt, delivering the outcome through a oneshot channel.
    ///
    /// Builds the authorize URL, launches the presenter, and installs the
    /// transaction — replacing (and cancelling) any attempt still pending.
    pub fn start(self) -> Result<LoginSession> {
        let store = Arc::clone(&self.store);
        let (tx, rx) = oneshot::channel();
        let attempt = self.start_with_callback(move |result| {
            // receiver may have been dropped; nothing left to notify
            let _ = tx.send(result);
        })?;
        Ok(LoginSession {
            attempt,
            store,
            result: rx,
        })
    }

    /// Start the attempt, delivering the outcome to `sink` (invoked exactly
    /// once, from whichever task resolves the transaction).
    pub fn start_with_callback(
        self,
        sink: impl FnOnce(TransactionResult) + Send + 'static,
    ) -> Result<StartedLogin> {
        let redirect_url = match self.redirect_url {
            Some(url) => url,
            None => redirect::build(&self.config, self.platform, &self.app_id)?,
        };

        let challenge = Challenge::generate();
        let defaults = ParameterSet::new()
            .set("response_type", "code")
            .set("client_id", self.config.client_id())
            .set("redirect_uri", redirect_url.as_str())
            .set("scope", DEFAULT_SCOPE)
            .set("state", pkce::generate_state())
            .set("code_challenge", challenge.challenge.as_str())
            .set("code_challenge_method", challenge.method);

        let overrides = ParameterSet::new()
            .set_opt("connection", self.connection)
            .set_opt("scope", self.scope)
            .set_opt("audience", self.audience)
            .set_opt("organization", self.organization)
            .set_opt("invitation", self.invitation)
            .set_opt("max_age", self.max_age_ms.map(|ms| ms.to_string()))
            .set_opt("connection_scope", self.connection_scope)
            .set_opt("state", self.state);

        let merged = ParameterSet::merge(defaults, overrides, &self.extra);
        // always present: the defaults carry a generated state
        let expected_state = merged.get("state").unwrap_or_default().to_string();

        let authorize_url = authorize::build(self.config.base_url(), &merged)?;

        info!(
            domain = self.config.domain(),
            client_id = self.config.client_id(),
            "starting interactive login"
        );

        // an attempt still pending reads as a cancellation before the new
        // surface launches; a callback landing in between is unhandled
        // rather than matched against the old state
        self.store.cancel_pending();

        let session = self.presenter.present(&authorize_url, &redirect_url)?;
        let transaction = Transaction::new(TransactionKind::Login, expected_state.as_str(), sink)
            .with_cancel_hook(move || session.dismiss());
        let transaction_id = transaction.id();
        self.store.store(transaction);

        Ok(StartedLogin {
            transaction_id,
            state: expected_state,
            code_verifier: challenge.verifier,
            authorize_url,
            redirect_url,
            leeway_ms: self.leeway_ms,
            issuer: self
                .issuer
                .unwrap_or_else(|| self.config.base_url().to_string()),
        })
    }
}

/// Details of a started login attempt.
///
/// `code_verifier`, `leeway_ms`, and `issuer` are inputs for the external
/// token-exchange/validation collaborators; this crate does not consume them.
#[derive(Debug, Clone)]
pub struct StartedLogin {
    pub transaction_id: Uuid,
    pub state: String,
    pub code_verifier: String,
    pub authorize_url: Url,
    pub redirect_url: Url,
    pub leeway_ms: u64,
    pub issuer: String,
}

/// Handle on a started login attempt with an awaitable outcome.
#[derive(Debug)]
pub struct LoginSession {
    attempt: StartedLogin,
    store: Arc<TransactionStore>,
    result: oneshot::Receiver<TransactionResult>,
}

impl LoginSession {
    pub fn attempt(&self) -> &StartedLogin {
        &self.attempt
    }

    /// Cancel this attempt if it is still the pending one.
    pub fn cancel(&self) -> bool {
        self.store.cancel(self.attempt.transaction_id)
    }

    /// Await the provider callback (or cancellation).
    ///
    /// Errors with [`WebAuthError::NoPendingTransaction`] if the transaction
    /// was cleared from the store without being resolved.
    pub async fn finish(self) -> Result<CallbackPayload> {
        match self.result.await {
            Ok(result) => result,
            Err(_) => Err(WebAuthError::NoPendingTransaction),
        }
    }
}

/// Builder for one logout (clear-session) attempt.
///
/// Obtained from [`WebAuth::logout`](crate::client::WebAuth::logout). Builds
/// the provider's `/v2/logout` URL and tracks the round trip in the same
/// transaction store as logins.
pub struct LogoutRequest {
    config: ClientConfig,
    app_id: String,
    platform: Platform,
    store: Arc<TransactionStore>,
    presenter: Arc<dyn Presenter>,
    return_to: Option<Url>,
    federated: bool,
}

impl LogoutRequest {
    pub(crate) fn new(
        config: ClientConfig,
        app_id: String,
        platform: Platform,
        store: Arc<TransactionStore>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            config,
            app_id,
            platform,
            store,
            presenter,
            return_to: None,
            federated: false,
        }
    }

    /// URL the provider redirects back to; defaults to the computed callback URI.
    pub fn return_to(mut self, url: Url) -> Self {
        self.return_to = Some(url);
        self
    }

    /// Also log out of the federated identity provider.
    pub fn federated(mut self) -> Self {
        self.federated = true;
        self
    }

    pub fn start(self) -> Result<LogoutSession> {
        let return_to = match self.return_to {
            Some(url) => url,
            None => redirect::build(&self.config, self.platform, &self.app_id)?,
        };

        let mut logout_url = self.config.base_url().clone();
        logout_url
            .path_segments_mut()
            .map_err(|_| {
                WebAuthError::Configuration(format!(
                    "base URL cannot have a path: {}",
                    self.config.base_url()
                ))
            })?
            .pop_if_empty()
            .extend(["v2", "logout"]);
        {
            let mut query = logout_url.query_pairs_mut();
            query.append_pair("client_id", self.config.client_id());
            query.append_pair("returnTo", return_to.as_str());
            if self.federated {
                query.append_key_only("federated");
            }
        }

        info!(domain = self.config.domain(), "starting logout");

        // same ordering as login: resolve any pending attempt as cancelled
        // before the new surface launches
        self.store.cancel_pending();

        let session = self.presenter.present(&logout_url, &return_to)?;
        let (transaction, rx) = Transaction::channel(TransactionKind::Logout, pkce::generate_state());
        let transaction = transaction.with_cancel_hook(move || session.dismiss());
        let transaction_id = transaction.id();
        let store = Arc::clone(&self.store);
        store.store(transaction);

        Ok(LogoutSession {
            transaction_id,
            logout_url,
            return_to,
            store,
            result: rx,
        })
    }
}

/// Handle on a started logout attempt.
#[derive(Debug)]
pub struct LogoutSession {
    transaction_id: Uuid,
    logout_url: Url,
    return_to: Url,
    store: Arc<TransactionStore>,
    result: oneshot::Receiver<TransactionResult>,
}

impl LogoutSession {
    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    pub fn logout_url(&self) -> &Url {
        &self.logout_url
    }

    pub fn return_to(&self) -> &Url {
        &self.return_to
    }

    pub fn cancel(&self) -> bool {
        self.store.cancel(self.transaction_id)
    }

    /// Await the provider's return redirect (or cancellation).
    pub async fn finish(self) -> Result<()> {
        match self.result.await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(WebAuthError::NoPendingTransaction),
        }
    }
}
