//! Account and session endpoints: registration, email verification, password
//! and social login, logout, and password change.

pub mod error;
pub mod login;
pub mod oauth;
pub mod register;
pub mod sessions;
pub mod state;
pub mod types;

mod storage;
mod utils;

pub use self::sessions::{SessionStore, SESSION_COOKIE_NAME};
pub use self::state::{AuthConfig, AuthState};
