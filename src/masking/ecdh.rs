//! P-384 key agreement for pairwise masks.
//!
//! Public keys travel as DER-encoded SubjectPublicKeyInfo, which is
//! canonical: equal keys always serialize to equal bytes.

use p384::{
    PublicKey, SecretKey,
    ecdh::diffie_hellman,
    elliptic_curve::zeroize::Zeroize,
    pkcs8::{DecodePublicKey, EncodePublicKey},
};
use rand::Rng;

use super::{
    ClientId,
    errors::{MaskingError, MaskingResult},
};

/// Length of a P-384 scalar and of the raw shared x-coordinate.
pub const SCALAR_BYTES: usize = 48;

const MAX_KEYGEN_ATTEMPTS: usize = 64;

/// A party's ECDH key pair. The secret scalar is zeroized on drop by
/// `p384::SecretKey`.
pub struct EcdhKeyPair {
    secret: SecretKey,
    public_der: Vec<u8>,
}

impl std::fmt::Debug for EcdhKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdhKeyPair")
            .field("public_der_len", &self.public_der.len())
            .finish_non_exhaustive()
    }
}

impl EcdhKeyPair {
    /// Draws a fresh scalar from `rng`, rejecting the negligible fraction of
    /// 384-bit strings that are zero or not below the group order.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> MaskingResult<Self> {
        let mut bytes = [0u8; SCALAR_BYTES];
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            rng.fill(&mut bytes[..]);
            let candidate = SecretKey::from_slice(&bytes);
            bytes.zeroize();
            if let Ok(secret) = candidate {
                return Self::from_secret(secret);
            }
        }
        Err(MaskingError::CryptoPrimitiveFailure {
            context: "ECDH key generation",
            message: format!("no valid scalar after {MAX_KEYGEN_ATTEMPTS} attempts"),
        })
    }

    fn from_secret(secret: SecretKey) -> MaskingResult<Self> {
        let public_der = secret
            .public_key()
            .to_public_key_der()
            .map_err(|err| MaskingError::CryptoPrimitiveFailure {
                context: "ECDH public key encoding",
                message: err.to_string(),
            })?
            .as_bytes()
            .to_vec();
        Ok(Self { secret, public_der })
    }

    /// DER SubjectPublicKeyInfo of the public point.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    /// Raw ECDH output (affine x-coordinate) with the peer's public key.
    pub fn shared_secret(&self, peer: &PublicKey) -> SharedSecret {
        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        let mut bytes = [0u8; SCALAR_BYTES];
        bytes.copy_from_slice(shared.raw_secret_bytes().as_slice());
        SharedSecret(bytes)
    }

    /// Decodes `peer_der` and derives the shared secret with it.
    pub fn shared_secret_with(
        &self,
        peer_id: ClientId,
        peer_der: &[u8],
    ) -> MaskingResult<SharedSecret> {
        let peer = decode_public_key(peer_id, peer_der)?;
        Ok(self.shared_secret(&peer))
    }
}

pub fn decode_public_key(client_id: ClientId, der: &[u8]) -> MaskingResult<PublicKey> {
    PublicKey::from_public_key_der(der).map_err(|err| MaskingError::Deserialization {
        client_id,
        message: err.to_string(),
    })
}

/// Raw pairwise secret. Zeroized on drop.
pub struct SharedSecret([u8; SCALAR_BYTES]);

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn shared_secret_is_symmetric() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let alice = EcdhKeyPair::generate(&mut rng).unwrap();
        let bob = EcdhKeyPair::generate(&mut rng).unwrap();

        let ab = alice.shared_secret_with(2, bob.public_key_der()).unwrap();
        let ba = bob.shared_secret_with(1, alice.public_key_der()).unwrap();
        assert_eq!(ab.as_bytes(), ba.as_bytes());
        assert_eq!(ab.as_bytes().len(), SCALAR_BYTES);
    }

    #[test]
    fn distinct_pairs_get_distinct_secrets() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let a = EcdhKeyPair::generate(&mut rng).unwrap();
        let b = EcdhKeyPair::generate(&mut rng).unwrap();
        let c = EcdhKeyPair::generate(&mut rng).unwrap();
        let ab = a.shared_secret_with(2, b.public_key_der()).unwrap();
        let ac = a.shared_secret_with(3, c.public_key_der()).unwrap();
        assert_ne!(ab.as_bytes(), ac.as_bytes());
    }

    #[test]
    fn public_key_serialization_is_canonical() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let pair = EcdhKeyPair::generate(&mut rng).unwrap();
        let decoded = decode_public_key(1, pair.public_key_der()).unwrap();
        let reencoded = decoded.to_public_key_der().unwrap();
        assert_eq!(reencoded.as_bytes(), pair.public_key_der());
        // SPKI for an uncompressed P-384 point.
        assert_eq!(pair.public_key_der().len(), 120);
    }

    #[test]
    fn same_seed_gives_same_key() {
        let a = EcdhKeyPair::generate(&mut ChaCha20Rng::seed_from_u64(14)).unwrap();
        let b = EcdhKeyPair::generate(&mut ChaCha20Rng::seed_from_u64(14)).unwrap();
        assert_eq!(a.public_key_der(), b.public_key_der());
    }

    #[test]
    fn garbage_key_is_a_deserialization_error() {
        let mut rng = ChaCha20Rng::seed_from_u64(15);
        let pair = EcdhKeyPair::generate(&mut rng).unwrap();
        let err = pair.shared_secret_with(7, &[0x30, 0x03, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, MaskingError::Deserialization { client_id: 7, .. }));
    }

    #[test]
    fn shared_secret_debug_hides_the_bytes() {
        let mut rng = ChaCha20Rng::seed_from_u64(16);
        let a = EcdhKeyPair::generate(&mut rng).unwrap();
        let b = EcdhKeyPair::generate(&mut rng).unwrap();
        let secret = a.shared_secret_with(2, b.public_key_der()).unwrap();
        assert_eq!(format!("{secret:?}"), "SharedSecret { .. }");
    }
}
