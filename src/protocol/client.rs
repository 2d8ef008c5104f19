use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, uniform::Uniform};
use tracing::{debug, instrument};

use super::{
    errors::{AggregationError, AggregationResult},
    share::ClientShare,
    timings::{ClientTimings, KeyGenTimings, timed},
};
use crate::{
    ckks::{Crs, CryptoContext, KeyPair, PublicKey},
    masking::{ClientId, EcdhKeyPair, PublicKeyDirectory, generate_mask},
};

/// Samples `len` values uniformly from `[min, max)`.
///
/// # Panics
///
/// Panics if the range is empty or not finite.
pub fn generate_data<R: Rng + ?Sized>(len: usize, min: f64, max: f64, rng: &mut R) -> Vec<f64> {
    let distribution = Uniform::new(min, max)
        .unwrap_or_else(|_| panic!("generate_data: invalid range [{min}, {max})"));
    distribution.sample_iter(rng).take(len).collect()
}

/// A share prepared for the server together with what it cost.
#[derive(Debug, Clone)]
pub struct ClientResult {
    pub share: ClientShare,
    pub timings: ClientTimings,
}

struct RoundKeys {
    ckks: KeyPair,
    ecdh: EcdhKeyPair,
    timings: KeyGenTimings,
}

/// One data owner. Holds its per-round key material and input vector;
/// neither secret key ever leaves this struct.
pub struct Client {
    id: ClientId,
    rng: ChaCha20Rng,
    keys: Option<RoundKeys>,
    data: Vec<f64>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("has_keys", &self.keys.is_some())
            .field("data_len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client seeded from the operating system.
    pub fn new(id: ClientId) -> Self {
        Self::with_rng(id, ChaCha20Rng::from_os_rng())
    }

    pub fn with_rng(id: ClientId, rng: ChaCha20Rng) -> Self {
        Self {
            id,
            rng,
            keys: None,
            data: Vec::new(),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Fresh MK-CKKS keys under `crs` and a fresh ECDH pair. Replaces any
    /// keys from an earlier round.
    #[instrument(level = "debug", skip_all, fields(client_id = self.id))]
    pub fn generate_keys(
        &mut self,
        ctx: &CryptoContext,
        crs: &Crs,
    ) -> AggregationResult<KeyGenTimings> {
        let start = Instant::now();
        let (ckks, mkckks) = timed(|| ctx.keygen(crs, &mut self.rng));
        let ckks = ckks?;
        let (ecdh, ecdh_time) = timed(|| EcdhKeyPair::generate(&mut self.rng));
        let ecdh = ecdh?;

        let timings = KeyGenTimings {
            mkckks,
            ecdh: ecdh_time,
            total: start.elapsed(),
        };
        self.keys = Some(RoundKeys {
            ckks,
            ecdh,
            timings,
        });
        Ok(timings)
    }

    pub fn set_data(&mut self, data: Vec<f64>) {
        self.data = data;
    }

    /// Replaces the input with `len` values drawn from `[min, max)`.
    pub fn generate_data(&mut self, len: usize, min: f64, max: f64) {
        self.data = generate_data(len, min, max, &mut self.rng);
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    fn keys(&self) -> AggregationResult<&RoundKeys> {
        self.keys
            .as_ref()
            .ok_or(AggregationError::MissingKeys { client_id: self.id })
    }

    /// Serialized ECDH public key for the round's directory.
    pub fn public_ecdh_key(&self) -> AggregationResult<&[u8]> {
        Ok(self.keys()?.ecdh.public_key_der())
    }

    pub fn mkckks_public_key(&self) -> AggregationResult<&PublicKey> {
        Ok(&self.keys()?.ckks.public)
    }

    pub fn keygen_timings(&self) -> Option<KeyGenTimings> {
        self.keys.as_ref().map(|keys| keys.timings)
    }

    /// Encrypts the current data, folds in the partial decryption and adds
    /// the pairwise mask: `(c0, d + r_i)`.
    ///
    /// `directory` must hold every participant of the round, this client
    /// included.
    #[instrument(level = "debug", skip_all, fields(client_id = self.id))]
    pub fn prepare_share(
        &mut self,
        ctx: &CryptoContext,
        directory: &PublicKeyDirectory,
    ) -> AggregationResult<ClientResult> {
        if self.data.len() > ctx.batch_size() {
            return Err(AggregationError::DataTooLong {
                got: self.data.len(),
                max: ctx.batch_size(),
            });
        }
        let Self {
            id,
            rng,
            keys,
            data,
        } = self;
        let keys = keys
            .as_ref()
            .ok_or(AggregationError::MissingKeys { client_id: *id })?;

        let start = Instant::now();
        let (partial, encrypt) = timed(|| -> AggregationResult<_> {
            let plaintext = ctx.encode(data)?;
            Ok(ctx.encrypt_with_partial_decryption(&keys.ckks, &plaintext, rng)?)
        });
        let partial = partial?;

        let (mask, mask_gen) =
            timed(|| generate_mask(*id, &keys.ecdh, directory, ctx.basis().clone()));
        let mask = mask?;

        let share = ClientShare {
            c0: partial.c0,
            d_masked: partial.d + &mask,
        };
        let timings = ClientTimings {
            keygen: keys.timings,
            encrypt,
            mask_gen,
            total: keys.timings.total + start.elapsed(),
        };
        debug!(client_id = *id, ?encrypt, ?mask_gen, "share prepared");
        Ok(ClientResult { share, timings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CryptoContext {
        CryptoContext::builder().data_length(4).build().unwrap()
    }

    #[test]
    fn generated_data_stays_in_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let data = generate_data(1000, -999.0, 999.0, &mut rng);
        assert_eq!(data.len(), 1000);
        assert!(data.iter().all(|&x| (-999.0..999.0).contains(&x)));
    }

    #[test]
    #[should_panic(expected = "invalid range")]
    fn empty_range_panics() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        generate_data(4, 1.0, 1.0, &mut rng);
    }

    #[test]
    fn share_before_keys_is_rejected() {
        let ctx = context();
        let mut client = Client::with_rng(7, ChaCha20Rng::seed_from_u64(1));
        client.set_data(vec![1.0]);
        assert_eq!(
            client.prepare_share(&ctx, &PublicKeyDirectory::new()).unwrap_err(),
            AggregationError::MissingKeys { client_id: 7 }
        );
        assert!(client.public_ecdh_key().is_err());
        assert!(client.keygen_timings().is_none());
    }

    #[test]
    fn oversized_data_is_rejected() {
        let ctx = context();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let crs = ctx.generate_crs(&mut rng);
        let mut client = Client::with_rng(1, rng);
        client.generate_keys(&ctx, &crs).unwrap();
        client.set_data(vec![0.0; ctx.batch_size() + 1]);
        assert_eq!(
            client.prepare_share(&ctx, &PublicKeyDirectory::new()).unwrap_err(),
            AggregationError::DataTooLong {
                got: ctx.batch_size() + 1,
                max: ctx.batch_size()
            }
        );
    }

    #[test]
    fn lone_client_share_decrypts_to_its_data() {
        let ctx = context();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let crs = ctx.generate_crs(&mut rng);
        let mut client = Client::with_rng(0, rng);
        let keygen = client.generate_keys(&ctx, &crs).unwrap();
        assert!(keygen.total >= keygen.mkckks);

        let mut directory = PublicKeyDirectory::new();
        directory
            .insert(0, client.public_ecdh_key().unwrap().to_vec())
            .unwrap();
        client.set_data(vec![1.5, -2.25, 3.0]);

        let result = client.prepare_share(&ctx, &directory).unwrap();
        assert_eq!(result.timings.keygen, keygen);
        assert!(result.timings.total >= result.timings.encrypt);

        let sum = result.share.c0 + &result.share.d_masked;
        let values = ctx.decode_aggregate(&sum, 3).unwrap();
        for (got, want) in values.iter().zip([1.5, -2.25, 3.0]) {
            approx::assert_abs_diff_eq!(*got, want, epsilon = 1e-3);
        }
    }

    #[test]
    fn share_requires_own_directory_entry() {
        let ctx = context();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let crs = ctx.generate_crs(&mut rng);
        let mut client = Client::with_rng(3, rng);
        client.generate_keys(&ctx, &crs).unwrap();
        client.set_data(vec![1.0]);
        assert_eq!(
            client.prepare_share(&ctx, &PublicKeyDirectory::new()).unwrap_err(),
            AggregationError::MissingPeer { client_id: 3 }
        );
    }
}
