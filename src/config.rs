//! Client configuration: client id plus the identity-provider domain.

use url::Url;

use crate::error::{Result, WebAuthError};

/// Environment variable holding the OAuth client id.
pub const ENV_CLIENT_ID: &str = "WEBAUTH_CLIENT_ID";
/// Environment variable holding the identity-provider domain.
pub const ENV_DOMAIN: &str = "WEBAUTH_DOMAIN";

/// Immutable client configuration for an identity provider tenant.
///
/// The domain may be given bare (`samples.auth0.com`), with a subpath
/// (`samples.auth0.com/tenant`), or as a full `https` URL. It is normalized
/// to an absolute `https` base URL at construction time; a malformed domain
/// is a synchronous [`WebAuthError::Configuration`] error.
///
/// # Example
/// ```
/// use webauth::config::ClientConfig;
///
/// let config = ClientConfig::new("client-id", "samples.auth0.com")?;
/// assert_eq!(config.base_url().as_str(), "https://samples.auth0.com/");
/// # Ok::<(), webauth::error::WebAuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    client_id: String,
    base_url: Url,
}

impl ClientConfig {
    /// Create a configuration from a client id and a domain string.
    pub fn new(client_id: impl Into<String>, domain: impl AsRef<str>) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(WebAuthError::Configuration(
                "client id must not be empty".to_string(),
            ));
        }
        let base_url = normalize_domain(domain.as_ref())?;
        Ok(Self {
            client_id,
            base_url,
        })
    }

    /// Create a configuration from `WEBAUTH_CLIENT_ID` / `WEBAUTH_DOMAIN`.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var(ENV_CLIENT_ID)
            .map_err(|_| WebAuthError::Configuration(format!("{ENV_CLIENT_ID} is not set")))?;
        let domain = std::env::var(ENV_DOMAIN)
            .map_err(|_| WebAuthError::Configuration(format!("{ENV_DOMAIN} is not set")))?;
        Self::new(client_id, domain)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Absolute `https` base URL of the tenant, subpath preserved.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host portion of the configured domain.
    pub fn domain(&self) -> &str {
        // normalize_domain guarantees a host
        self.base_url.host_str().unwrap_or_default()
    }

    /// Subpath of the base URL with no leading/trailing slashes, if any.
    pub fn subpath(&self) -> Option<&str> {
        let trimmed = self.base_url.path().trim_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Normalize a domain string into an absolute `https` base URL.
fn normalize_domain(domain: &str) -> Result<Url> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(WebAuthError::Configuration(
            "domain must not be empty".to_string(),
        ));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate)?;
    if url.scheme() != "https" {
        return Err(WebAuthError::Configuration(format!(
            "domain must use https, got {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(WebAuthError::Configuration(format!(
            "domain has no host: {trimmed}"
        )));
    }
    Ok(url)
}
