// rsa_chat/chat_crypto/src/rsa.rs

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::params::CipherParameters;

/// Public half of a key pair: encrypts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKey {
    pub e: u64,
    pub n: u64,
}

/// Private half of a key pair: decrypts. Never published to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrivateKey {
    pub d: u64,
    pub n: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Key pair for the default 61 x 53, e = 17 parameters.
    pub fn generate() -> Result<KeyPair> {
        generate_key_pair(&CipherParameters::default())
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

/// Derives the key pair for `params`.
///
/// Deterministic: the same parameters always give the same pair. `d` is the
/// modular inverse of `e` modulo phi, which is also the smallest positive
/// integer with `d * e = 1 (mod phi)`.
pub fn generate_key_pair(params: &CipherParameters) -> Result<KeyPair> {
    params.validate()?;
    // validate() guarantees both fit.
    let (n, phi) = match (params.modulus(), params.phi()) {
        (Some(n), Some(phi)) => (n, phi),
        _ => return Err(ChatError::InvalidParameters("modulus overflow".to_string())),
    };

    if params.e.gcd(&phi) != 1 {
        return Err(ChatError::NoModularInverse { e: params.e, phi });
    }
    let d = modinv(params.e, phi).ok_or(ChatError::NoModularInverse { e: params.e, phi })?;

    debug!(p = params.p, q = params.q, e = params.e, n, "generated key pair");
    Ok(KeyPair {
        public_key: PublicKey { e: params.e, n },
        private_key: PrivateKey { d, n },
    })
}

fn extended_gcd_signed(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        (b.clone(), BigInt::zero(), BigInt::one())
    } else {
        let (g, x1, y1) = extended_gcd_signed(&(b % a), a);
        (g, y1 - (b / a) * &x1, x1)
    }
}

/// Inverse of `a` modulo `m`, normalised into `[1, m)`.
fn modinv(a: u64, m: u64) -> Option<u64> {
    if m <= 1 {
        return None;
    }
    let a_signed = BigInt::from(a);
    let m_signed = BigInt::from(m);
    let (g, x, _) = extended_gcd_signed(&a_signed, &m_signed);
    if !g.is_one() {
        return None;
    }
    let normalised = (x % &m_signed + &m_signed) % &m_signed;
    normalised.to_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pair_matches_legacy_values() {
        let keys = KeyPair::generate().unwrap();
        assert_eq!(keys.public_key(), &PublicKey { e: 17, n: 3233 });
        assert_eq!(keys.private_key(), &PrivateKey { d: 2753, n: 3233 });
    }

    #[test]
    fn d_is_the_smallest_valid_inverse() {
        let params = CipherParameters::default();
        let phi = params.phi().unwrap();
        let keys = generate_key_pair(&params).unwrap();
        let d = keys.private_key().d;

        assert_eq!((d * params.e) % phi, 1);
        let linear = (1..phi).find(|k| (k * params.e) % phi == 1).unwrap();
        assert_eq!(d, linear);
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(KeyPair::generate().unwrap(), KeyPair::generate().unwrap());
    }

    #[test]
    fn substituted_parameters() {
        let params = CipherParameters::new(1_000_003, 999_983, 65_537);
        let keys = generate_key_pair(&params).unwrap();
        let phi = params.phi().unwrap() as u128;
        assert_eq!(keys.public_key().n, 1_000_003 * 999_983);
        assert_eq!(
            (keys.private_key().d as u128 * 65_537) % phi,
            1
        );
    }

    #[test]
    fn non_coprime_exponent_has_no_inverse() {
        // phi = 3120 is divisible by 3.
        let err = generate_key_pair(&CipherParameters::new(61, 53, 3)).unwrap_err();
        assert!(matches!(err, ChatError::NoModularInverse { e: 3, phi: 3120 }));
    }

    #[test]
    fn invalid_parameters_are_reported_before_inversion() {
        assert!(matches!(
            generate_key_pair(&CipherParameters::new(4, 53, 17)),
            Err(ChatError::InvalidParameters(_))
        ));
    }

    #[test]
    fn modinv_small_cases() {
        assert_eq!(modinv(3, 11), Some(4));
        assert_eq!(modinv(10, 17), Some(12));
        assert_eq!(modinv(6, 9), None);
        assert_eq!(modinv(1, 1), None);
    }
}
