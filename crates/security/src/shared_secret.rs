//! Shared admin secret.
//!
//! One configured password, compared by exact equality. No identities,
//! hashing or rotation. With no password configured every mutation is
//! denied.

use kbdesk_config::AppConfig;
use kbdesk_core::auth::{AuthPolicy, Credential};
use tracing::warn;

pub struct SharedSecretPolicy {
    secret: Option<String>,
}

impl SharedSecretPolicy {
    pub fn new(secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            warn!("No admin password configured; knowledge mutations are disabled");
        }
        Self { secret }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.admin_password.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for SharedSecretPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretPolicy")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl AuthPolicy for SharedSecretPolicy {
    fn name(&self) -> &str {
        "shared_secret"
    }

    fn allows(&self, credential: Credential<'_>) -> bool {
        let (Some(expected), Some(presented)) = (self.secret.as_deref(), credential.secret()) else {
            return false;
        };
        constant_time_eq(expected.as_bytes(), presented.as_bytes())
    }
}

/// Byte comparison whose running time depends only on the lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_allowed() {
        let policy = SharedSecretPolicy::new(Some("s3cret".into()));
        assert!(policy.allows(Credential::new("s3cret")));
    }

    #[test]
    fn wrong_or_missing_password_denied() {
        let policy = SharedSecretPolicy::new(Some("s3cret".into()));
        assert!(!policy.allows(Credential::new("s3cre")));
        assert!(!policy.allows(Credential::new("S3CRET")));
        assert!(!policy.allows(Credential::new("")));
        assert!(!policy.allows(Credential::none()));
    }

    #[test]
    fn comparison_is_exact() {
        let policy = SharedSecretPolicy::new(Some("s3cret".into()));
        assert!(!policy.allows(Credential::new(" s3cret")));
    }

    #[test]
    fn unconfigured_policy_denies_everything() {
        let policy = SharedSecretPolicy::new(None);
        assert!(!policy.is_configured());
        assert!(!policy.allows(Credential::new("anything")));
        assert!(!policy.allows(Credential::new("")));

        let empty = SharedSecretPolicy::new(Some(String::new()));
        assert!(!empty.allows(Credential::new("")));
    }

    #[test]
    fn from_config_reads_admin_password() {
        let mut config = AppConfig::default();
        config.admin_password = Some("pw".into());
        assert!(SharedSecretPolicy::from_config(&config).allows(Credential::new("pw")));
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", SharedSecretPolicy::new(Some("hunter2".into())));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
