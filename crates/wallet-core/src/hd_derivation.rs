use bip32::{DerivationPath, XPrv};
use chain_btc::network::BtcNetwork;
use crypto_utils::secret::SecretKeyBytes;
use k256::ecdsa::SigningKey;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::mnemonic::mnemonic_to_seed;

/// BIP-44 path `m/44'/coin'/account'/0/index`; coin type 0 on mainnet, 1 on
/// testnet.
pub fn default_derivation_path(network: BtcNetwork, account: u32, index: u32) -> String {
    format!("m/44'/{}'/{}'/0/{}", network.coin_type(), account, index)
}

pub fn parse_derivation_path(path: &str) -> Result<DerivationPath, WalletError> {
    path.trim()
        .parse()
        .map_err(|e: bip32::Error| WalletError::DerivationFailed(format!("{path}: {e}")))
}

/// A secp256k1 key pair derived for a single operation.
///
/// The private scalar lives in a buffer that is zeroed on drop. Not `Clone`,
/// not serializable.
#[derive(Debug)]
pub struct KeyPair {
    pub private_key: SecretKeyBytes<32>,
    pub public_key: [u8; 33],
    pub derivation_path: String,
}

/// Derive the key pair at `path` from a BIP-32 seed.
pub fn derive_key_from_seed(seed: &[u8], path: &str) -> Result<KeyPair, WalletError> {
    let parsed = parse_derivation_path(path)?;

    let xprv = XPrv::derive_from_path(seed, &parsed)
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;

    let mut private_key_bytes: [u8; 32] = xprv.to_bytes().into();
    let signing_key = SigningKey::from_bytes(&private_key_bytes.into())
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;

    let public_key: [u8; 33] = signing_key
        .verifying_key()
        .to_sec1_bytes()
        .as_ref()
        .try_into()
        .map_err(|_| WalletError::DerivationFailed("Invalid public key length".into()))?;

    let private_key = SecretKeyBytes::new(private_key_bytes);
    private_key_bytes.zeroize();

    Ok(KeyPair {
        private_key,
        public_key,
        derivation_path: parsed.to_string(),
    })
}

/// Derive the key pair at `path` from a mnemonic (empty BIP-39 passphrase).
pub fn derive_key_pair(phrase: &str, path: &str) -> Result<KeyPair, WalletError> {
    let seed = mnemonic_to_seed(phrase, "")?;
    derive_key_from_seed(&seed[..], path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_default_paths() {
        assert_eq!(default_derivation_path(BtcNetwork::Mainnet, 0, 0), "m/44'/0'/0'/0/0");
        assert_eq!(default_derivation_path(BtcNetwork::Testnet, 2, 7), "m/44'/1'/2'/0/7");
    }

    #[test]
    fn test_derive_btc_key() {
        let key = derive_key_pair(TEST_MNEMONIC, "m/44'/0'/0'/0/0").unwrap();
        assert_eq!(key.derivation_path, "m/44'/0'/0'/0/0");
        assert!(key.public_key[0] == 0x02 || key.public_key[0] == 0x03);
        assert_ne!(key.private_key.expose(), &[0u8; 32]);
    }

    #[test]
    fn test_derivation_deterministic() {
        let key1 = derive_key_pair(TEST_MNEMONIC, "m/44'/0'/0'/0/0").unwrap();
        let key2 = derive_key_pair(TEST_MNEMONIC, "m/44'/0'/0'/0/0").unwrap();
        assert_eq!(key1.private_key.expose(), key2.private_key.expose());
        assert_eq!(key1.public_key, key2.public_key);
    }

    #[test]
    fn test_different_indices_different_keys() {
        let key0 = derive_key_pair(TEST_MNEMONIC, "m/44'/0'/0'/0/0").unwrap();
        let key1 = derive_key_pair(TEST_MNEMONIC, "m/44'/0'/0'/0/1").unwrap();
        assert_ne!(key0.public_key, key1.public_key);
    }

    #[test]
    fn test_coin_type_changes_key() {
        let main = derive_key_pair(TEST_MNEMONIC, &default_derivation_path(BtcNetwork::Mainnet, 0, 0)).unwrap();
        let test = derive_key_pair(TEST_MNEMONIC, &default_derivation_path(BtcNetwork::Testnet, 0, 0)).unwrap();
        assert_ne!(main.public_key, test.public_key);
    }

    #[test]
    fn test_invalid_path() {
        for path in ["", "44'/0'/0'", "m/abc", "m/44'/0'/0'/0/x"] {
            assert!(
                matches!(derive_key_pair(TEST_MNEMONIC, path), Err(WalletError::DerivationFailed(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn test_invalid_mnemonic() {
        assert!(matches!(
            derive_key_pair("not a mnemonic", "m/44'/0'/0'/0/0"),
            Err(WalletError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let key = derive_key_pair(TEST_MNEMONIC, "m/44'/0'/0'/0/0").unwrap();
        assert!(format!("{key:?}").contains("redacted"));
    }
}
