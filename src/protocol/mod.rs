//! Client and server roles of secure aggregation and the round driver.
//!
//! Each client encrypts its vector under its own MK-CKKS key, folds its
//! partial decryption into the second component and hides that component
//! behind a pairwise mask. The server only ever sees `(c0_i, d_i + r_i)`;
//! summing all shares cancels the masks and leaves an encoding of the sum.

pub mod client;
pub mod comm;
pub mod driver;
pub mod errors;
pub mod server;
pub mod share;
pub mod timings;

pub use client::{Client, ClientResult, generate_data};
pub use comm::CommunicationCost;
pub use driver::{
    ClientReport, RoundConfig, RoundReport, max_abs_error, plaintext_sum, run_round,
    run_round_with_inputs,
};
pub use errors::{AggregationError, AggregationResult};
pub use server::{Server, ServerResult};
pub use share::{ClientShare, ciphertext_from_bytes, ciphertext_to_bytes, pair_wire_len};
pub use timings::{ClientTimings, KeyGenTimings, ServerTimings, millis};
