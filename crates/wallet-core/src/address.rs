use chain_btc::address::pubkey_to_p2pkh_address;
use chain_btc::network::BtcNetwork;
use crypto_utils::secret::SecretPhrase;

use crate::error::WalletError;
use crate::hd_derivation::{default_derivation_path, derive_key_pair};
use crate::mnemonic::{generate_mnemonic, validate_mnemonic, DEFAULT_ENTROPY_BITS};
use crate::types::{DerivedAddress, WalletRecord};

/// P2PKH address for `phrase` at `path` on `network`. Pure and deterministic.
pub fn derive_address(phrase: &str, path: &str, network: BtcNetwork) -> Result<String, WalletError> {
    let key = derive_key_pair(phrase, path)?;
    Ok(pubkey_to_p2pkh_address(&key.public_key, network)?)
}

pub fn derive_btc_address(
    phrase: &str,
    path: &str,
    network: BtcNetwork,
) -> Result<DerivedAddress, WalletError> {
    let key = derive_key_pair(phrase, path)?;
    let address = pubkey_to_p2pkh_address(&key.public_key, network)?;
    Ok(DerivedAddress {
        network,
        address,
        derivation_path: key.derivation_path.clone(),
    })
}

/// Validate an existing mnemonic and build a wallet record for it.
pub fn import_from_mnemonic(
    name: &str,
    phrase: &str,
    path: &str,
    network: BtcNetwork,
) -> Result<WalletRecord, WalletError> {
    if !validate_mnemonic(phrase) {
        return Err(WalletError::InvalidMnemonic("wordlist or checksum check failed".into()));
    }
    let derived = derive_btc_address(phrase, path, network)?;
    tracing::info!(%network, address = %derived.address, "wallet imported");
    Ok(WalletRecord::new(name, derived))
}

/// New 12-word mnemonic plus the record for its first receive address.
///
/// The phrase is returned for one-time display and must not be stored with
/// the record.
pub fn generate_wallet(
    name: &str,
    network: BtcNetwork,
) -> Result<(SecretPhrase, WalletRecord), WalletError> {
    let phrase = generate_mnemonic(DEFAULT_ENTROPY_BITS)?;
    let path = default_derivation_path(network, 0, 0);
    let derived = derive_btc_address(&phrase, &path, network)?;
    tracing::info!(%network, address = %derived.address, "wallet generated");
    Ok((phrase, WalletRecord::new(name, derived)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_bip44_vector() {
        let address = derive_address(TEST_MNEMONIC, "m/44'/0'/0'/0/0", BtcNetwork::Mainnet).unwrap();
        assert_eq!(address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    }

    #[test]
    fn test_testnet_prefix() {
        let path = default_derivation_path(BtcNetwork::Testnet, 0, 0);
        let address = derive_address(TEST_MNEMONIC, &path, BtcNetwork::Testnet).unwrap();
        assert!(address.starts_with('m') || address.starts_with('n'), "{address}");
    }

    #[test]
    fn test_import_builds_empty_record() {
        let record = import_from_mnemonic("Main", TEST_MNEMONIC, "m/44'/0'/0'/0/0", BtcNetwork::Mainnet).unwrap();
        assert_eq!(record.address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
        assert_eq!(record.derivation_path, "m/44'/0'/0'/0/0");
        assert_eq!(record.balance.total, 0);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("abandon"));
    }

    #[test]
    fn test_import_rejects_bad_phrase() {
        let err = import_from_mnemonic("x", "abandon abandon", "m/44'/0'/0'/0/0", BtcNetwork::Mainnet);
        assert!(matches!(err, Err(WalletError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_generate_wallet_round_trip() {
        let (phrase, record) = generate_wallet("Fresh", BtcNetwork::Testnet).unwrap();
        assert_eq!(phrase.word_count(), 12);
        assert_eq!(record.network, BtcNetwork::Testnet);
        assert_eq!(record.derivation_path, "m/44'/1'/0'/0/0");
        let again = derive_address(&phrase, &record.derivation_path, BtcNetwork::Testnet).unwrap();
        assert_eq!(again, record.address);
    }
}
