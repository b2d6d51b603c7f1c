//! Web middleware
//!
//! Session resolution plus the two authorization tiers.

pub mod session;

pub use session::{require_admin, require_member, resolve_session};
