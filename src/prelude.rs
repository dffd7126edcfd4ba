//! Convenience re-exports for common use.

pub use crate::callback::CallbackPayload;
pub use crate::client::WebAuth;
pub use crate::config::ClientConfig;
pub use crate::error::{Result, WebAuthError};
pub use crate::parameters::ParameterSet;
pub use crate::presenter::{NullPresenter, PresentedSession, Presenter};
pub use crate::redirect::Platform;
pub use crate::request::{LoginRequest, LoginSession, LogoutRequest, LogoutSession, StartedLogin};
pub use crate::store::TransactionStore;
pub use crate::transaction::{Transaction, TransactionKind, TransactionResult};
