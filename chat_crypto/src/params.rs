// rsa_chat/chat_crypto/src/params.rs

use serde::{Deserialize, Serialize};

use crate::cipher::mod_pow;
use crate::error::{ChatError, Result};

/// Legacy primes and public exponent every participant shares.
pub const DEFAULT_P: u64 = 61;
pub const DEFAULT_Q: u64 = 53;
pub const DEFAULT_E: u64 = 17;

// Bases that make Miller-Rabin exact for every u64.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Public parameters fed into key generation.
///
/// The defaults reproduce the fixed 61 x 53 modulus with `e = 17`. Other
/// values can be substituted (e.g. from the app's TOML config) as long as
/// they pass [`CipherParameters::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherParameters {
    pub p: u64,
    pub q: u64,
    pub e: u64,
}

impl Default for CipherParameters {
    fn default() -> Self {
        Self {
            p: DEFAULT_P,
            q: DEFAULT_Q,
            e: DEFAULT_E,
        }
    }
}

impl CipherParameters {
    pub fn new(p: u64, q: u64, e: u64) -> Self {
        Self { p, q, e }
    }

    /// `n = p * q`, or `None` when the product overflows.
    pub fn modulus(&self) -> Option<u64> {
        self.p.checked_mul(self.q)
    }

    /// Euler's totient `(p - 1)(q - 1)`.
    pub fn phi(&self) -> Option<u64> {
        self.p
            .checked_sub(1)?
            .checked_mul(self.q.checked_sub(1)?)
    }

    /// Checks everything except invertibility of `e`, which key generation
    /// reports separately as [`ChatError::NoModularInverse`].
    pub fn validate(&self) -> Result<()> {
        if !is_prime(self.p) {
            return Err(ChatError::InvalidParameters(format!("p = {} is not prime", self.p)));
        }
        if !is_prime(self.q) {
            return Err(ChatError::InvalidParameters(format!("q = {} is not prime", self.q)));
        }
        if self.p == self.q {
            return Err(ChatError::InvalidParameters("p and q must be distinct".to_string()));
        }
        let phi = match (self.modulus(), self.phi()) {
            (Some(_), Some(phi)) => phi,
            _ => {
                return Err(ChatError::InvalidParameters(format!(
                    "modulus {} x {} does not fit in 64 bits",
                    self.p, self.q
                )))
            }
        };
        if self.e <= 1 || self.e >= phi {
            return Err(ChatError::InvalidParameters(format!(
                "public exponent {} must lie strictly between 1 and phi = {}",
                self.e, phi
            )));
        }
        Ok(())
    }
}

/// Deterministic Miller-Rabin over u64.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &w in WITNESSES.iter() {
        if n == w {
            return true;
        }
        if n % w == 0 {
            return false;
        }
    }

    let n_minus_one = n - 1;
    let mut d = n_minus_one;
    let mut s = 0u32;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in WITNESSES.iter() {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = mod_pow(x, 2, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
