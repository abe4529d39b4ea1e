use rand::RngCore;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Entropy sizes accepted by BIP-39 (12, 15, 18, 21 and 24 words).
pub const MNEMONIC_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// Draw `bits` of mnemonic entropy from the operating system CSPRNG.
///
/// The returned buffer is zeroed when dropped.
pub fn mnemonic_entropy(bits: usize) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if !MNEMONIC_ENTROPY_BITS.contains(&bits) {
        return Err(CryptoError::UnsupportedEntropy(bits));
    }
    let mut buf = Zeroizing::new(vec![0u8; bits / 8]);
    OsRng.fill_bytes(&mut buf);
    Ok(buf)
}

/// Generates a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}
