//! Per-attempt signaling identity generation.

use crate::random::RandomProvider;

/// Identity a connection attempt registers under with the signaling service.
///
/// A fresh identity is generated for every attempt, so a reconnect can never
/// collide with a stale registration the remote side still tracks. The text
/// form is `prefix` + `-` + a 128-bit random token rendered as 32 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalingIdentity(String);

impl SignalingIdentity {
    /// Generate a fresh identity for one connection attempt.
    pub fn generate<R: RandomProvider>(prefix: &str, random: &R) -> Self {
        let first: u64 = random.random();
        let second: u64 = random.random();
        Self(format!("{}-{:016x}{:016x}", prefix, first, second))
    }

    /// View the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalingIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::TokioRandomProvider;

    #[test]
    fn identities_carry_prefix_and_token() {
        let random = TokioRandomProvider::new();
        let identity = SignalingIdentity::generate("cam7", &random);

        let text = identity.as_str();
        assert!(text.starts_with("cam7-"));

        let token = &text["cam7-".len()..];
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identities_differ_across_generations() {
        let random = TokioRandomProvider::new();
        let a = SignalingIdentity::generate("cam", &random);
        let b = SignalingIdentity::generate("cam", &random);
        assert_ne!(a, b);
    }

    #[test]
    fn display_matches_as_str() {
        let random = TokioRandomProvider::new();
        let identity = SignalingIdentity::generate("cam", &random);
        assert_eq!(identity.to_string(), identity.as_str());
    }
}
