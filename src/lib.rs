//! # Deepwork backend
//!
//! Backend for the Deep Work Timer study-session tracker. This crate covers the
//! account and session slice: password login, GitHub/Google social login, email
//! verification, session cookies, and password changes.
//!
//! ## Storage
//!
//! - **Users** live in `PostgreSQL`; username and email uniqueness is enforced by
//!   unique indexes, so concurrent duplicate registrations are resolved by the
//!   database rejecting the second writer.
//! - **Sessions** live in Redis as `session:{token}` keys with a 30-day TTL.
//!   Tokens are opaque 256-bit random values; the client holds them in an
//!   `HttpOnly` cookie.
//!
//! ## Authentication
//!
//! Every request passes through a middleware that resolves the session cookie
//! into an [`api::context::AuthContext`]. An absent or expired session leaves the
//! context unauthenticated; individual handlers decide whether that is an error.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
