use tracing::{debug, info, instrument};

use super::{
    errors::{AggregationError, AggregationResult},
    share::ClientShare,
    timings::{ServerTimings, timed},
};
use crate::{
    ckks::CryptoContext,
    rings::{Format, RnsPoly},
};

/// Decoded aggregate and what it cost the server.
#[derive(Debug, Clone)]
pub struct ServerResult {
    pub values: Vec<f64>,
    pub timings: ServerTimings,
}

/// Untrusted aggregator. Holds received shares and nothing secret.
#[derive(Debug, Default)]
pub struct Server {
    shares: Vec<ClientShare>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares may arrive in any order.
    pub fn collect_share(&mut self, share: ClientShare) {
        self.shares.push(share);
        debug!(received = self.shares.len(), "share collected");
    }

    pub fn share_count(&self) -> usize {
        self.shares.len()
    }

    /// `sum(c0_i) + sum(d_masked_i)`. The masks cancel, leaving an encoding
    /// of the sum of all inputs plus noise.
    pub fn aggregate(&self, ctx: &CryptoContext) -> AggregationResult<RnsPoly> {
        if self.shares.is_empty() {
            return Err(AggregationError::EmptyAggregate);
        }
        let mut c0_sum = RnsPoly::zero(ctx.basis().clone(), Format::Evaluation);
        let mut d_sum = c0_sum.clone();
        for share in &self.shares {
            share.check_against(ctx)?;
            c0_sum += &share.c0;
            d_sum += &share.d_masked;
        }
        Ok(c0_sum + &d_sum)
    }

    /// Aggregates and decodes the first `data_length` slots. Consumes the
    /// collected shares.
    #[instrument(level = "debug", skip_all, fields(shares = self.shares.len()))]
    pub fn finalize(
        self,
        ctx: &CryptoContext,
        data_length: usize,
    ) -> AggregationResult<ServerResult> {
        if data_length > ctx.batch_size() {
            return Err(AggregationError::DataTooLong {
                got: data_length,
                max: ctx.batch_size(),
            });
        }
        let (aggregate, aggregate_time) = timed(|| self.aggregate(ctx));
        let aggregate = aggregate?;
        let (values, decode_time) = timed(|| ctx.decode_aggregate(&aggregate, data_length));
        let values = values?;

        let timings = ServerTimings {
            aggregate: aggregate_time,
            decode: decode_time,
            total: aggregate_time + decode_time,
        };
        info!(
            shares = self.shares.len(),
            aggregate_ms = super::timings::millis(aggregate_time),
            decode_ms = super::timings::millis(decode_time),
            "aggregate decoded"
        );
        Ok(ServerResult { values, timings })
    }
}
