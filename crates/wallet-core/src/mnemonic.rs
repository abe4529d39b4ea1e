use bip39::{Language, Mnemonic};
use crypto_utils::entropy::mnemonic_entropy;
use crypto_utils::secret::SecretPhrase;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Entropy used when the caller does not ask for a specific size (12 words).
pub const DEFAULT_ENTROPY_BITS: usize = 128;

/// Generate a BIP-39 English mnemonic from OS entropy.
///
/// `entropy_bits` must be one of 128, 160, 192, 224 or 256 (12 to 24 words).
pub fn generate_mnemonic(entropy_bits: usize) -> Result<SecretPhrase, WalletError> {
    let entropy = mnemonic_entropy(entropy_bits)?;
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(SecretPhrase::from(mnemonic.to_string()))
}

/// Wordlist and checksum check.
pub fn validate_mnemonic(phrase: &str) -> bool {
    let phrase = SecretPhrase::new(phrase);
    Mnemonic::parse_in_normalized(Language::English, &phrase).is_ok()
}

/// Derive the 64-byte BIP-39 seed. The returned buffer is zeroed on drop.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let phrase = SecretPhrase::new(phrase);
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, &phrase)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Get the word list for autocomplete
pub fn word_list() -> &'static [&'static str] {
    Language::English.word_list()
}

pub fn is_valid_bip39_word(word: &str) -> bool {
    Language::English.find_word(word).is_some()
}
