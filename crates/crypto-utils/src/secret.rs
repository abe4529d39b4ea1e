use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A fixed-size secret buffer (private scalars, chain codes) zeroed on drop.
///
/// Deliberately implements neither `Clone` nor `Serialize`; `Debug` is
/// redacted.
#[derive(Zeroize)]
pub struct SecretKeyBytes<const N: usize>([u8; N]);

impl<const N: usize> Drop for SecretKeyBytes<N> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<const N: usize> ZeroizeOnDrop for SecretKeyBytes<N> {}

impl<const N: usize> SecretKeyBytes<N> {
    /// Takes ownership of `bytes`. The caller's copy should be zeroized.
    pub fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub fn expose(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> fmt::Debug for SecretKeyBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKeyBytes<{N}>(<redacted>)")
    }
}

/// A mnemonic phrase held in a zeroize-on-drop `String`.
///
/// Whitespace is normalized to single spaces on construction so the phrase
/// can be handed to BIP-39 parsing without intermediate copies.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretPhrase(String);

impl SecretPhrase {
    pub fn new(phrase: &str) -> Self {
        let mut normalized = String::with_capacity(phrase.len());
        for word in phrase.split_whitespace() {
            if !normalized.is_empty() {
                normalized.push(' ');
            }
            normalized.push_str(&word.to_lowercase());
        }
        Self(normalized)
    }

    pub fn word_count(&self) -> usize {
        self.0.split(' ').filter(|w| !w.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for SecretPhrase {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretPhrase {
    fn from(mut data: String) -> Self {
        let phrase = Self::new(&data);
        data.zeroize();
        phrase
    }
}

impl fmt::Debug for SecretPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretPhrase({} words)", self.word_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bytes_expose() {
        let key = SecretKeyBytes::new([7u8; 32]);
        assert_eq!(key.expose(), &[7u8; 32]);
    }

    #[test]
    fn key_bytes_manual_zeroize() {
        let mut key = SecretKeyBytes::new([0xAA; 32]);
        key.zeroize();
        assert_eq!(key.expose(), &[0u8; 32]);
    }

    #[test]
    fn key_bytes_debug_is_redacted() {
        let key = SecretKeyBytes::new([0xAB; 32]);
        let debug = format!("{key:?}");
        assert!(!debug.contains("171"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn phrase_normalizes_whitespace_and_case() {
        let phrase = SecretPhrase::new("  Abandon\tabandon \n ABOUT ");
        assert_eq!(&*phrase, "abandon abandon about");
        assert_eq!(phrase.word_count(), 3);
    }

    #[test]
    fn phrase_from_string() {
        let phrase: SecretPhrase = String::from("zoo zoo").into();
        assert_eq!(&*phrase, "zoo zoo");
    }

    #[test]
    fn phrase_debug_hides_words() {
        let phrase = SecretPhrase::new("abandon ability able");
        let debug = format!("{phrase:?}");
        assert!(!debug.contains("abandon"));
        assert!(debug.contains("3 words"));
    }

    #[test]
    fn empty_phrase() {
        let phrase = SecretPhrase::new("   ");
        assert!(phrase.is_empty());
        assert_eq!(phrase.word_count(), 0);
    }
}
