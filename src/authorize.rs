//! Authorization URL construction.

use url::Url;

use crate::error::{Result, WebAuthError};
use crate::parameters::ParameterSet;

/// Endpoint appended to the tenant base URL.
const AUTHORIZE_PATH: &str = "authorize";

/// Build the authorization URL for a merged parameter set.
///
/// `/authorize` is appended to the base URL's existing path, so a tenant
/// configured with a subpath keeps it. Every parameter is emitted as exactly
/// one percent-encoded query item; a literal `+` inside a value becomes
/// `%2B`, never a space.
pub fn build(base_url: &Url, parameters: &ParameterSet) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| {
            WebAuthError::Configuration(format!("base URL cannot have a path: {base_url}"))
        })?
        .pop_if_empty()
        .push(AUTHORIZE_PATH);
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in parameters.iter() {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}
