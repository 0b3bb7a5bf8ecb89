use std::fmt;

use headers::Authorization;
use headers::authorization::Bearer;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secure wrapper for credential values that zeroes memory on drop.
///
/// Stored session tokens travel through this type so they never show up in
/// `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns a reference to the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the wrapper and returns the inner String.
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Builds the typed `Authorization: Bearer <token>` header.
    ///
    /// Returns `None` if the token holds characters that are not valid in a header.
    pub(crate) fn bearer(&self) -> Option<Authorization<Bearer>> {
        Authorization::bearer(self.as_str()).ok()
    }

    fn mask(value: &str) -> String {
        let visible = value.chars().take(4).collect::<String>();
        if value.chars().count() <= 8 {
            "*".repeat(value.chars().count())
        } else {
            format!("{visible}...")
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecureString").field(&"[REDACTED]").finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_redact_debug_output() {
        let token = SecureString::from("eyJhbGciOiJIUzI1NiJ9.payload");

        let debug = format!("{token:?}");

        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn should_mask_display_output() {
        assert_eq!(SecureString::from("short").to_string(), "*****");
        assert_eq!(
            SecureString::from("a-much-longer-token").to_string(),
            "a-mu..."
        );
    }

    #[test]
    fn should_build_bearer_header() {
        let token = SecureString::from("abc123");

        let header = token.bearer().expect("valid bearer token");

        assert_eq!(header.token(), "abc123");
    }

    #[test]
    fn should_reject_token_with_newline() {
        let token = SecureString::from("abc\n123");

        assert!(token.bearer().is_none());
    }

    #[test]
    fn should_round_trip_through_json_as_plain_string() {
        let token = SecureString::from("abc");

        let json = serde_json::to_string(&token).expect("serialize");

        assert_eq!(json, "\"abc\"");
    }
}
