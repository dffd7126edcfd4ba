//! webauth — client-side OAuth2/OIDC redirect login for native apps.
//!
//! Builds the authorization URL for an identity provider, tracks exactly one
//! in-flight login/logout attempt, matches the provider's asynchronous
//! callback back to that attempt, and reports success, failure, or
//! cancellation to the caller that started it. Presenting the browser
//! surface, exchanging the authorization code for tokens, and storing
//! credentials are the host's responsibility, behind the
//! [`presenter::Presenter`] boundary.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use webauth::prelude::*;
//!
//! # async fn example(presenter: Arc<dyn Presenter>) -> webauth::error::Result<()> {
//! let config = ClientConfig::new("client-id", "samples.auth0.com")?;
//! let auth = WebAuth::new(config, "com.example.app", Platform::Ios, presenter);
//!
//! let session = auth.login()
//!     .scope("openid profile email")
//!     .audience("https://api.example.com")
//!     .start()?;
//!
//! // The OS hands incoming callback URLs to `auth.resume(&url)`.
//! let payload = session.finish().await?;
//! println!("authorization code: {:?}", payload.code());
//! # Ok(())
//! # }
//! ```

pub mod authorize;
pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod parameters;
pub mod pkce;
pub mod prelude;
pub mod presenter;
pub mod redirect;
pub mod request;
pub mod store;
pub mod transaction;
