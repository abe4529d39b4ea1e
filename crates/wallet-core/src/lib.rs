//! Self-custodial Bitcoin wallet core.
//!
//! Key derivation from BIP-39 mnemonics, wallet records, the staged send
//! flow and wallet refresh. Chain access lives in `chain-data`, lot
//! accounting in `cost-basis`; the types callers need from both are
//! re-exported here.

pub mod address;
pub mod error;
pub mod hd_derivation;
pub mod logging;
pub mod mnemonic;
pub mod refresh;
pub mod send;
pub mod types;

pub use address::{derive_address, derive_btc_address, generate_wallet, import_from_mnemonic};
pub use error::WalletError;
pub use hd_derivation::{default_derivation_path, derive_key_pair, KeyPair};
pub use logging::init_logging;
pub use mnemonic::{
    generate_mnemonic, is_valid_bip39_word, mnemonic_to_seed, validate_mnemonic, word_list,
    DEFAULT_ENTROPY_BITS,
};
pub use refresh::{portfolio, refresh_wallets, RefreshReport};
pub use send::{
    btc_to_sat, build_and_sign, build_and_sign_with_utxos, sat_to_btc, send, SendReceipt,
    SendRequest, SendStage, SignedSend,
};
pub use types::{DerivedAddress, WalletRecord};

pub use chain_btc::address::{decode_address, validate_address, AddressInfo, AddressKind};
pub use chain_btc::network::BtcNetwork;
pub use chain_btc::utxo::Utxo;
pub use chain_data::{
    Balance, ChainDataGateway, ChainDataSource, EnhancedTransaction, FeeEstimates, Fetched,
    Freshness, GatewayConfig, ResponseCache, TxDirection,
};
pub use cost_basis::{
    AverageLots, CostBasisLedger, CostBasisMethod, DisposalResult, FlatPrice, PortfolioSummary,
    PriceOracle,
};
pub use crypto_utils::secret::SecretPhrase;
