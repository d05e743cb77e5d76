//! # kbdesk Core
//!
//! Domain types, traits, and error definitions for the kbdesk knowledge-base
//! assistant. This crate has **zero framework dependencies**: it defines the
//! domain model that the store, provider, security and gateway crates
//! implement against.
//!
//! Every seam is a trait here:
//! - [`KnowledgeStore`] - persistence of knowledge entries
//! - [`Provider`] - the external generation endpoint
//! - [`AuthPolicy`] - the admin gate in front of every mutation

pub mod auth;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use auth::{AuthPolicy, Credential};
pub use error::{Error, ImportError, ProviderError, Result, StoreError};
pub use knowledge::{KnowledgeEntry, KnowledgeRecord, KnowledgeStore, NewKnowledge};
pub use message::{ChatTurn, Message, Role, TurnRole};
pub use provider::Provider;
pub use session::ChatSession;
