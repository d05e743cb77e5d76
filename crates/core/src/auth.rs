//! AuthPolicy trait - the admin gate in front of knowledge mutations.
//!
//! The store's business logic only ever asks "is this credential allowed
//! to mutate?". Which credential scheme answers that lives behind this
//! trait, so it can change without touching the store.

/// A credential presented by a caller. Borrowed from the request body.
#[derive(Clone, Copy)]
pub struct Credential<'a>(pub Option<&'a str>);

impl<'a> Credential<'a> {
    pub fn new(secret: &'a str) -> Self {
        Self(Some(secret))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_option(secret: Option<&'a str>) -> Self {
        Self(secret)
    }

    pub fn secret(&self) -> Option<&'a str> {
        self.0
    }
}

impl std::fmt::Debug for Credential<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential([REDACTED])"),
            None => f.write_str("Credential(None)"),
        }
    }
}

/// Decides whether a credential may mutate the knowledge base.
pub trait AuthPolicy: Send + Sync {
    /// A human-readable name for logs.
    fn name(&self) -> &str;

    /// `true` if the credential is accepted.
    fn allows(&self, credential: Credential<'_>) -> bool;
}
