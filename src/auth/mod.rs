//! Account registration, login and token lifecycle for residents and admins.
//!
//! [`AuthService`] runs the flows over any [`Store`]; handlers in
//! [`crate::rukun`] only translate HTTP into service calls and back.

pub mod account;
pub mod error;
pub mod password;
pub mod service;
pub mod state;
pub mod storage;
pub mod token;
pub mod types;
pub mod validate;

pub use account::{Account, AccountClass, AccountKind};
pub use error::AuthError;
pub use service::AuthService;
pub use state::TokenConfig;
pub use storage::{PgStore, Store};
pub use token::{Claims, TokenIssuer};
