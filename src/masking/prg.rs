//! Expands a pairwise secret into a ring element with ChaCha20.
//!
//! Key: first 32 bytes of the secret (zero-padded if shorter). Nonce: 12
//! zero bytes, block counter 0, i.e. the same stream as a 16-byte all-zero
//! IV in the OpenSSL convention. The stream is consumed as little-endian
//! `u64` words, `N` per tower in tower order, each reduced modulo that
//! tower's prime. The words are used directly as evaluation-format values.

use std::sync::Arc;

use chacha20::{
    ChaCha20,
    cipher::{KeyIvInit, StreamCipher},
};

use super::errors::MaskingResult;
use crate::rings::{Format, RnsBasis, RnsPoly};

pub const KEY_BYTES: usize = 32;
pub const NONCE_BYTES: usize = 12;

fn cipher_for(secret: &[u8]) -> ChaCha20 {
    let mut key = [0u8; KEY_BYTES];
    let take = secret.len().min(KEY_BYTES);
    key[..take].copy_from_slice(&secret[..take]);
    let nonce = [0u8; NONCE_BYTES];
    ChaCha20::new(&key.into(), &nonce.into())
}

/// Deterministically maps `secret` to a ring element over `basis`.
/// Consumes exactly `T * N * 8` bytes of keystream.
pub fn expand_to_ring_element(secret: &[u8], basis: Arc<RnsBasis>) -> MaskingResult<RnsPoly> {
    let mut cipher = cipher_for(secret);
    let n = basis.degree();
    let mut buffer = vec![0u8; n * 8];

    let towers = basis
        .moduli()
        .iter()
        .map(|&q| {
            buffer.fill(0);
            cipher.apply_keystream(&mut buffer);
            buffer
                .chunks_exact(8)
                .map(|chunk| {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(chunk);
                    u64::from_le_bytes(word) % q
                })
                .collect::<Vec<u64>>()
        })
        .collect();

    Ok(RnsPoly::from_towers(towers, basis, Format::Evaluation)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::generate_ntt_primes;

    fn basis() -> Arc<RnsBasis> {
        let n = 1024u64;
        let mut moduli = generate_ntt_primes(60, 1, n).unwrap();
        moduli.extend(generate_ntt_primes(50, 1, n).unwrap());
        Arc::new(RnsBasis::new(n as usize, moduli).unwrap())
    }

    #[test]
    fn expansion_is_deterministic() {
        let secret = [7u8; 48];
        let a = expand_to_ring_element(&secret, basis()).unwrap();
        let b = expand_to_ring_element(&secret, basis()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.format(), Format::Evaluation);
    }

    #[test]
    fn only_first_32_bytes_are_keyed() {
        let mut secret_a = [1u8; 48];
        let mut secret_b = [1u8; 48];
        secret_a[40] = 9;
        secret_b[40] = 10;
        assert_eq!(
            expand_to_ring_element(&secret_a, basis()).unwrap(),
            expand_to_ring_element(&secret_b, basis()).unwrap()
        );
        secret_b[0] = 2;
        assert_ne!(
            expand_to_ring_element(&secret_a, basis()).unwrap(),
            expand_to_ring_element(&secret_b, basis()).unwrap()
        );
    }

    #[test]
    fn values_are_reduced_per_tower() {
        let basis = basis();
        let poly = expand_to_ring_element(&[0xAB; 48], basis.clone()).unwrap();
        for (tower, &q) in poly.towers().iter().zip(basis.moduli()) {
            assert!(tower.iter().all(|&c| c < q));
        }
    }

    #[test]
    fn towers_follow_one_continuous_stream() {
        let basis = basis();
        let secret = [3u8; 48];
        let poly = expand_to_ring_element(&secret, basis.clone()).unwrap();

        let mut cipher = cipher_for(&secret);
        let mut stream = vec![0u8; 2 * basis.degree() * 8];
        cipher.apply_keystream(&mut stream);
        let word = |i: usize| {
            let mut w = [0u8; 8];
            w.copy_from_slice(&stream[i * 8..i * 8 + 8]);
            u64::from_le_bytes(w)
        };

        let q0 = basis.moduli()[0];
        let q1 = basis.moduli()[1];
        assert_eq!(poly.tower(0)[0], word(0) % q0);
        assert_eq!(poly.tower(0)[5], word(5) % q0);
        assert_eq!(poly.tower(1)[0], word(basis.degree()) % q1);
    }

    #[test]
    fn keystream_matches_rfc_8439_zero_vector() {
        // RFC 8439 A.1 test vector #1: all-zero key and nonce, counter 0.
        let mut cipher = cipher_for(&[0u8; 32]);
        let mut block = [0u8; 16];
        cipher.apply_keystream(&mut block);
        assert_eq!(
            block,
            [
                0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90, 0x40, 0x5d, 0x6a, 0xe5, 0x53,
                0x86, 0xbd, 0x28
            ]
        );
    }

    #[test]
    fn short_secrets_are_zero_padded() {
        let short = expand_to_ring_element(&[5u8; 16], basis()).unwrap();
        let mut padded = [0u8; 32];
        padded[..16].copy_from_slice(&[5u8; 16]);
        assert_eq!(short, expand_to_ring_element(&padded, basis()).unwrap());
    }
}
