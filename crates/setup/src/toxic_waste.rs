//! Entropy for phase 2 contributions

use rand::{CryptoRng, Rng};
use std::fmt;

/// Bytes of randomness behind each contribution or beacon.
pub const ENTROPY_BYTES: usize = 32;

/// Random hex string handed to `snarkjs zkey contribute` or used as a beacon hash.
///
/// The value is toxic waste for the contribution it feeds, so `Debug` does
/// not print it.
#[derive(Clone, PartialEq, Eq)]
pub struct Entropy(String);

impl Entropy {
    pub fn new<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; ENTROPY_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Entropy(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_entropy_is_fixed_length_hex() {
        let entropy = Entropy::new(&mut OsRng);
        assert_eq!(entropy.as_hex().len(), ENTROPY_BYTES * 2);
        assert!(entropy.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entropy_differs_between_draws() {
        let a = Entropy::new(&mut OsRng);
        let b = Entropy::new(&mut OsRng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_hides_value() {
        let entropy = Entropy::new(&mut OsRng);
        assert!(!format!("{entropy:?}").contains(entropy.as_hex()));
    }
}
