//! One aggregation round end to end: context, keys, directory, shares,
//! aggregate.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::{info, instrument};

use super::{
    client::{Client, generate_data},
    comm::CommunicationCost,
    errors::{AggregationError, AggregationResult},
    server::Server,
    share::{ClientShare, ciphertext_to_bytes},
    timings::{ClientTimings, ServerTimings},
};
use crate::{
    ckks::{CkksError, CryptoContext},
    masking::{ClientId, PublicKeyDirectory},
};

pub const DEFAULT_VALUE_RANGE: (f64, f64) = (-999.0, 999.0);

#[derive(Debug, Clone, PartialEq)]
pub struct RoundConfig {
    pub num_clients: usize,
    pub data_length: usize,
    /// Client inputs are drawn uniformly from `[min, max)`.
    pub value_range: (f64, f64),
    /// Fixes every random choice of the round when set.
    pub seed: Option<u64>,
    /// Run client key generation and share preparation on the rayon pool.
    pub parallel: bool,
}

impl RoundConfig {
    pub fn new(num_clients: usize, data_length: usize) -> Self {
        Self {
            num_clients,
            data_length,
            value_range: DEFAULT_VALUE_RANGE,
            seed: None,
            parallel: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_value_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = (min, max);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientReport {
    pub client_id: ClientId,
    pub timings: ClientTimings,
}

#[derive(Debug, Clone)]
pub struct RoundReport {
    pub ring_dim: usize,
    pub data_length: usize,
    /// Decoded aggregate.
    pub values: Vec<f64>,
    /// Plaintext sum of all inputs.
    pub expected: Vec<f64>,
    pub max_abs_error: f64,
    pub clients: Vec<ClientReport>,
    pub server: ServerTimings,
    pub communication: CommunicationCost,
}

/// Builds a context for `config`, draws random inputs and runs the round.
pub fn run_round(config: &RoundConfig) -> AggregationResult<RoundReport> {
    let (min, max) = config.value_range;
    if !(min.is_finite() && max.is_finite() && min < max) {
        return Err(AggregationError::Ckks(CkksError::InvalidParameter {
            message: format!("value range [{min}, {max}) must be finite and non-empty"),
        }));
    }
    let ctx = CryptoContext::builder()
        .data_length(config.data_length)
        .build()?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_os_rng(),
    };
    let inputs: Vec<Vec<f64>> = (0..config.num_clients)
        .map(|_| generate_data(config.data_length, min, max, &mut rng))
        .collect();
    run_round_with_inputs(&ctx, inputs, config.parallel, &mut rng)
}

/// Client `i` (id `i`) contributes `inputs[i]`. All randomness, including
/// every client's private stream, is derived from `rng`.
#[instrument(level = "info", skip_all, fields(clients = inputs.len(), ring_dim = ctx.ring_dim()))]
pub fn run_round_with_inputs(
    ctx: &CryptoContext,
    inputs: Vec<Vec<f64>>,
    parallel: bool,
    rng: &mut ChaCha20Rng,
) -> AggregationResult<RoundReport> {
    let data_length = inputs.iter().map(Vec::len).max().unwrap_or(0);
    if inputs.is_empty() {
        return Err(AggregationError::EmptyAggregate);
    }
    if data_length > ctx.batch_size() {
        return Err(AggregationError::DataTooLong {
            got: data_length,
            max: ctx.batch_size(),
        });
    }
    let expected = plaintext_sum(&inputs, data_length);

    let crs = ctx.generate_crs(rng);
    let mut clients: Vec<Client> = (0..inputs.len())
        .map(|i| Client::with_rng(i as ClientId, ChaCha20Rng::from_rng(&mut *rng)))
        .collect();
    for_each_client(&mut clients, parallel, |client| {
        client.generate_keys(ctx, &crs)
    })?;

    let mut directory = PublicKeyDirectory::new();
    for client in &clients {
        directory.insert(client.id(), client.public_ecdh_key()?.to_vec())?;
    }
    ensure_roster(&directory, &clients)?;
    info!(
        clients = clients.len(),
        setup_bytes = directory.total_key_bytes(),
        "keys generated"
    );

    for (client, data) in clients.iter_mut().zip(inputs) {
        client.set_data(data);
    }
    let results = for_each_client(&mut clients, parallel, |client| {
        client.prepare_share(ctx, &directory)
    })?;
    info!("shares prepared");

    let mut server = Server::new();
    let mut reports = Vec::with_capacity(results.len());
    let mut uplink_bytes = 0;
    for (client, result) in clients.iter().zip(results) {
        let bytes = result.share.to_bytes()?;
        uplink_bytes = uplink_bytes.max(bytes.len());
        server.collect_share(ClientShare::from_bytes(&bytes, ctx)?);
        reports.push(ClientReport {
            client_id: client.id(),
            timings: result.timings,
        });
    }

    let ciphertext_bytes = reference_ciphertext_len(ctx, &clients[0], rng)?;
    let communication = CommunicationCost::new(
        clients.len(),
        data_length,
        ctx.ring_dim(),
        ciphertext_bytes,
        uplink_bytes,
        &directory,
    );

    let result = server.finalize(ctx, data_length)?;
    let max_abs_error = max_abs_error(&result.values, &expected);
    info!(max_abs_error, "round complete");

    Ok(RoundReport {
        ring_dim: ctx.ring_dim(),
        data_length,
        values: result.values,
        expected,
        max_abs_error,
        clients: reports,
        server: result.timings,
        communication,
    })
}

/// Fails with `MissingPeer` for the first client without a directory entry.
fn ensure_roster(directory: &PublicKeyDirectory, clients: &[Client]) -> AggregationResult<()> {
    Ok(directory.require_all(clients.iter().map(Client::id))?)
}

fn for_each_client<T, F>(
    clients: &mut [Client],
    parallel: bool,
    f: F,
) -> AggregationResult<Vec<T>>
where
    T: Send,
    F: Fn(&mut Client) -> AggregationResult<T> + Send + Sync,
{
    if parallel {
        clients.par_iter_mut().map(f).collect()
    } else {
        clients.iter_mut().map(f).collect()
    }
}

/// Serialized size of a textbook `(c0, c1)` encryption of zeros.
fn reference_ciphertext_len(
    ctx: &CryptoContext,
    client: &Client,
    rng: &mut ChaCha20Rng,
) -> AggregationResult<usize> {
    let plaintext = ctx.encode(&[])?;
    let ciphertext = ctx.encrypt(client.mkckks_public_key()?, &plaintext, rng)?;
    Ok(ciphertext_to_bytes(&ciphertext)?.len())
}

/// Slot-wise sum, shorter inputs padded with zeros.
pub fn plaintext_sum(inputs: &[Vec<f64>], len: usize) -> Vec<f64> {
    let mut sum = vec![0.0; len];
    for input in inputs {
        for (acc, &x) in sum.iter_mut().zip(input) {
            *acc += x;
        }
    }
    sum
}

pub fn max_abs_error(values: &[f64], expected: &[f64]) -> f64 {
    values
        .iter()
        .zip(expected)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
