//! MK-CKKS key material.
//!
//! Every party shares one common reference string `a`; a party's public
//! key is the RLWE sample `b = -s*a + e` under that CRS.

use crate::rings::RnsPoly;

/// Common reference string: one uniform ring element in evaluation format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    pub a: RnsPoly,
}

/// Gaussian secret `s`, evaluation format. Never leaves its owner.
#[derive(Clone)]
pub struct SecretKey {
    pub s: RnsPoly,
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").finish_non_exhaustive()
    }
}

/// Public key `(b, a)` bound to the round's CRS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// `b = -(s * a) + e`
    pub b: RnsPoly,
    /// The CRS element.
    pub a: RnsPoly,
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub secret: SecretKey,
}
