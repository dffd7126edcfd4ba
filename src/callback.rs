//! Callback URL parsing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Provider response data extracted from a callback URL.
///
/// Holds every query (or fragment) pair from the callback; well-known
/// parameters have accessors. This is the success payload delivered through
/// the transaction's result sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackPayload {
    values: HashMap<String, String>,
}

impl CallbackPayload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Authorization code, when the provider returned one.
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// Round-tripped anti-forgery state token.
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// Provider error code (e.g. `access_denied`).
    pub fn error(&self) -> Option<&str> {
        self.get("error")
    }

    pub fn error_description(&self) -> Option<&str> {
        self.get("error_description")
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackPayload {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parse a callback URL into a payload.
///
/// The query string is consulted first; when it carries no pairs the
/// fragment is parsed instead (providers using `response_mode=fragment`).
/// Returns `None` for a URL with neither, so unrelated URL activations can
/// pass through untouched.
pub fn parse(url: &Url) -> Option<CallbackPayload> {
    let mut values: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if values.is_empty() {
        if let Some(fragment) = url.fragment() {
            values = url::form_urlencoded::parse(fragment.as_bytes())
                .into_owned()
                .collect();
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(CallbackPayload { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn parses_query_parameters() {
        let payload = parse(&url(
            "app://samples.auth0.com/ios/app/callback?code=abc&state=xyz",
        ))
        .unwrap();
        assert_eq!(payload.code(), Some("abc"));
        assert_eq!(payload.state(), Some("xyz"));
    }

    #[test]
    fn falls_back_to_fragment_parameters() {
        let payload = parse(&url(
            "app://samples.auth0.com/ios/app/callback#code=abc&state=xyz",
        ))
        .unwrap();
        assert_eq!(payload.code(), Some("abc"));
        assert_eq!(payload.state(), Some("xyz"));
    }

    #[test]
    fn query_takes_precedence_over_fragment() {
        let payload = parse(&url(
            "app://samples.auth0.com/callback?code=fromquery#code=fromfragment",
        ))
        .unwrap();
        assert_eq!(payload.code(), Some("fromquery"));
    }

    #[test]
    fn bare_url_yields_none() {
        assert!(parse(&url("app://samples.auth0.com/ios/app/callback")).is_none());
        assert!(parse(&url("app://samples.auth0.com/callback#")).is_none());
    }

    #[test]
    fn provider_error_parameters_are_exposed() {
        let payload = parse(&url(
            "app://cb?error=access_denied&error_description=user%20declined",
        ))
        .unwrap();
        assert_eq!(payload.error(), Some("access_denied"));
        assert_eq!(payload.error_description(), Some("user declined"));
    }

    #[test]
    fn payload_serializes_as_a_plain_json_map() {
        let payload = parse(&url("app://cb?code=abc&state=xyz")).unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"code": "abc", "state": "xyz"}));

        let back: CallbackPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        let payload = parse(&url("app://cb?login_hint=first%2Blast%40host.com&state=s")).unwrap();
        assert_eq!(payload.get("login_hint"), Some("first+last@host.com"));
    }
}
