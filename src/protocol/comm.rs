//! Byte accounting for one round.

use crate::masking::PublicKeyDirectory;

/// Size of a decoded or plaintext value on the wire.
pub const VALUE_BYTES: usize = std::mem::size_of::<f64>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommunicationCost {
    pub num_clients: usize,
    pub data_length: usize,
    pub ring_dim: usize,
    pub plaintext_bytes: usize,
    pub ciphertext_bytes: usize,
    pub client_uplink_bytes: usize,
    /// All ECDH public keys, broadcast once per round.
    pub setup_bytes: usize,
    pub final_downlink_bytes: usize,
}

impl CommunicationCost {
    pub fn new(
        num_clients: usize,
        data_length: usize,
        ring_dim: usize,
        ciphertext_bytes: usize,
        client_uplink_bytes: usize,
        directory: &PublicKeyDirectory,
    ) -> Self {
        Self {
            num_clients,
            data_length,
            ring_dim,
            plaintext_bytes: data_length * VALUE_BYTES,
            ciphertext_bytes,
            client_uplink_bytes,
            setup_bytes: directory.total_key_bytes(),
            final_downlink_bytes: data_length * VALUE_BYTES,
        }
    }

    pub fn ciphertext_expansion(&self) -> f64 {
        self.ciphertext_bytes as f64 / self.plaintext_bytes as f64
    }

    /// One client's amortized share of setup and downlink plus its own
    /// uplink. Amortized terms round down.
    pub fn per_client_bytes(&self) -> usize {
        let n = self.num_clients.max(1);
        self.setup_bytes / n + self.client_uplink_bytes + self.final_downlink_bytes / n
    }

    pub fn comm_expansion(&self) -> f64 {
        self.per_client_bytes() as f64 / self.plaintext_bytes as f64
    }
}
