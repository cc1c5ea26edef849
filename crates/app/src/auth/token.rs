//! Secret strings: passwords and session tokens.

use std::fmt;

use zeroize::Zeroize;

/// A string that is redacted in `Debug` output and wiped on drop.
#[derive(Clone)]
pub struct Secret(String);

/// Bearer token issued by the auth API for a signed-in user.
pub type AccessToken = Secret;

/// User password, only ever sent to the auth API.
pub type Password = Secret;

impl Secret {
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length in characters, for policy checks.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(**redacted**)")?;
        Ok(())
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let secret = Secret::new("hunter22".to_string());

        assert_eq!(format!("{secret:?}"), "Secret(**redacted**)");
        assert_eq!(secret.expose(), "hunter22");
    }

    #[test]
    fn char_count_counts_characters_not_bytes() {
        assert_eq!(Secret::new("senhaçã".to_string()).char_count(), 7);
    }
}
