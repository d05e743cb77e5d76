//! Security module for kbdesk.
//!
//! Provides the shared-secret [`AuthPolicy`](kbdesk_core::AuthPolicy) that
//! gates every knowledge mutation.

pub mod shared_secret;

pub use shared_secret::{SharedSecretPolicy, constant_time_eq};
