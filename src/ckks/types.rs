use crate::rings::RnsPoly;

/// Textbook two-component ciphertext: `c0 + c1*s ~ m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkCiphertext {
    pub c0: RnsPoly,
    pub c1: RnsPoly,
}

/// Output of the fused encrypt-and-partially-decrypt step.
///
/// `d = c1*s + e*` replaces the raw `c1`, so `c0 + d ~ m` for the single
/// contributing party and `sum(c0_i + d_i) ~ sum(m_i)` across parties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialShare {
    pub c0: RnsPoly,
    pub d: RnsPoly,
}
