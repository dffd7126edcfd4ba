//! Callback (redirect) URI construction.

use url::Url;

use crate::config::ClientConfig;
use crate::error::{Result, WebAuthError};

/// Runtime platform family, used as a path segment in the callback URI.
///
/// A value rather than a compile-time branch so the same code path serves
/// every platform and tests can exercise all shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Macos,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Macos => "macos",
            Platform::Android => "android",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the custom-scheme callback URI for an app:
/// `{app_id}://{domain}[/{subpath}]/{platform}/{app_id}/callback`.
///
/// `app_id` is the host application's bundle/package identifier; it serves
/// both as the URI scheme and as a path segment. Any subpath on the
/// configured base URL is preserved between the domain and the platform
/// segment.
pub fn build(config: &ClientConfig, platform: Platform, app_id: &str) -> Result<Url> {
    let app_id = app_id.trim();
    if app_id.is_empty() {
        return Err(WebAuthError::Configuration(
            "app identifier must not be empty".to_string(),
        ));
    }
    if app_id.contains(['/', ':']) {
        return Err(WebAuthError::Configuration(format!(
            "app identifier is not a valid URI scheme: {app_id}"
        )));
    }

    let mut uri = format!("{}://{}", app_id, config.domain());
    if let Some(subpath) = config.subpath() {
        uri.push('/');
        uri.push_str(subpath);
    }
    uri.push('/');
    uri.push_str(platform.as_str());
    uri.push('/');
    uri.push_str(app_id);
    uri.push_str("/callback");

    Url::parse(&uri).map_err(|e| {
        WebAuthError::Configuration(format!("invalid redirect URI {uri}: {e}"))
    })
}
