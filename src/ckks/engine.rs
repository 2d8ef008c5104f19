use std::sync::Arc;

use rand::Rng;
use tracing::instrument;

use super::{
    CkksResult, CryptoContext,
    keys::{Crs, KeyPair, PublicKey, SecretKey},
    types::{MkCiphertext, PartialShare},
};
use crate::{
    encoding::Plaintext,
    rings::{Format, RingError, RnsPoly},
};

impl CryptoContext {
    fn sample_error<R: Rng + ?Sized>(&self, rng: &mut R) -> RnsPoly {
        RnsPoly::sample_gaussian(self.params().error_std, self.basis().clone(), rng)
    }

    fn sample_smudging<R: Rng + ?Sized>(&self, rng: &mut R) -> RnsPoly {
        RnsPoly::sample_gaussian(self.params().smudging_std, self.basis().clone(), rng)
    }

    fn ensure_same_basis(&self, poly: &RnsPoly) -> CkksResult<()> {
        if !Arc::ptr_eq(poly.basis(), self.basis()) && **poly.basis() != **self.basis() {
            return Err(RingError::ParameterMismatch.into());
        }
        Ok(())
    }

    /// Rejects operands built over a different basis or left in coefficient
    /// format.
    fn ensure_native(&self, poly: &RnsPoly) -> CkksResult<()> {
        self.ensure_same_basis(poly)?;
        if poly.format() != Format::Evaluation {
            return Err(RingError::FormatMismatch {
                expected: Format::Evaluation,
                actual: poly.format(),
            }
            .into());
        }
        Ok(())
    }

    /// Samples the common reference string.
    pub fn generate_crs<R: Rng + ?Sized>(&self, rng: &mut R) -> Crs {
        Crs {
            a: RnsPoly::sample_uniform(self.basis().clone(), rng),
        }
    }

    /// Single-party keygen against a shared CRS: `b = -s*a + e`.
    #[instrument(level = "debug", skip_all)]
    pub fn keygen<R: Rng + ?Sized>(&self, crs: &Crs, rng: &mut R) -> CkksResult<KeyPair> {
        self.ensure_native(&crs.a)?;
        let s = self.sample_error(rng);
        let e = self.sample_error(rng);

        let b = -(&s * &crs.a) + &e;

        Ok(KeyPair {
            public: PublicKey {
                b,
                a: crs.a.clone(),
            },
            secret: SecretKey { s },
        })
    }

    /// Packs `values` into the context's batch.
    pub fn encode(&self, values: &[f64]) -> CkksResult<Plaintext> {
        Ok(self
            .encoder()
            .encode(values, self.batch_size(), self.basis().clone())?)
    }

    /// Textbook encryption: `c0 = v*b + m + e0`, `c1 = v*a + e1`.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        public_key: &PublicKey,
        plaintext: &Plaintext,
        rng: &mut R,
    ) -> CkksResult<MkCiphertext> {
        self.ensure_native(&public_key.b)?;
        self.ensure_native(&public_key.a)?;
        let mut m = plaintext.poly.clone();
        m.to_evaluation();
        self.ensure_native(&m)?;

        let v = self.sample_error(rng);
        let e0 = self.sample_error(rng);
        let e1 = self.sample_error(rng);

        let c0 = &v * &public_key.b + &m + &e0;
        let c1 = &v * &public_key.a + &e1;
        Ok(MkCiphertext { c0, c1 })
    }

    /// One party's decryption share for `c1`: `c1*s + e*`, with `e*` drawn
    /// from the wider smudging distribution.
    pub fn partial_decrypt<R: Rng + ?Sized>(
        &self,
        c1: &RnsPoly,
        secret_key: &SecretKey,
        rng: &mut R,
    ) -> CkksResult<RnsPoly> {
        self.ensure_native(c1)?;
        self.ensure_native(&secret_key.s)?;
        let smudge = self.sample_smudging(rng);
        Ok(c1 * &secret_key.s + &smudge)
    }

    /// Encrypts and immediately partially decrypts under the same key,
    /// returning `(c0, d)`. The intermediate `c1` never leaves this call.
    #[instrument(level = "debug", skip_all)]
    pub fn encrypt_with_partial_decryption<R: Rng + ?Sized>(
        &self,
        key_pair: &KeyPair,
        plaintext: &Plaintext,
        rng: &mut R,
    ) -> CkksResult<PartialShare> {
        let MkCiphertext { c0, c1 } = self.encrypt(&key_pair.public, plaintext, rng)?;
        let d = self.partial_decrypt(&c1, &key_pair.secret, rng)?;
        Ok(PartialShare { c0, d })
    }

    /// Decodes an aggregated polynomial `P ~ encode(sum x_i)` and truncates
    /// to `len` values.
    pub fn decode_aggregate(&self, aggregate: &RnsPoly, len: usize) -> CkksResult<Vec<f64>> {
        self.ensure_same_basis(aggregate)?;
        Ok(self.encoder().decode(aggregate, self.batch_size(), len)?)
    }
}
