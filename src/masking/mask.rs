use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use super::{
    ClientId,
    ecdh::EcdhKeyPair,
    errors::{MaskingError, MaskingResult},
    prg::expand_to_ring_element,
};
use crate::rings::{Format, RnsBasis, RnsPoly};

/// Serialized ECDH public keys indexed by client id.
///
/// Ordered by id so iteration and the sign rule agree on every client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicKeyDirectory {
    keys: BTreeMap<ClientId, Vec<u8>>,
}

impl PublicKeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, client_id: ClientId, public_key: Vec<u8>) -> MaskingResult<()> {
        if self.keys.contains_key(&client_id) {
            return Err(MaskingError::DuplicateClient { client_id });
        }
        self.keys.insert(client_id, public_key);
        Ok(())
    }

    pub fn get(&self, client_id: ClientId) -> MaskingResult<&[u8]> {
        self.keys
            .get(&client_id)
            .map(Vec::as_slice)
            .ok_or(MaskingError::MissingPeer { client_id })
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.keys.contains_key(&client_id)
    }

    /// Fails with the first id in `expected` that has no entry.
    pub fn require_all(&self, expected: impl IntoIterator<Item = ClientId>) -> MaskingResult<()> {
        expected
            .into_iter()
            .try_for_each(|client_id| self.get(client_id).map(|_| ()))
    }

    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.keys.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &[u8])> + '_ {
        self.keys.iter().map(|(&id, key)| (id, key.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sum of all serialized key lengths, i.e. the broadcast setup cost.
    pub fn total_key_bytes(&self) -> usize {
        self.keys.values().map(Vec::len).sum()
    }
}

/// Builds client `own_id`'s pairwise mask
/// `r_i = sum_{j > i} (-p_ij) + sum_{j < i} (+p_ij)` over every other entry
/// in `directory`.
///
/// Summed over all clients of the same directory the masks cancel exactly.
/// A directory holding only `own_id` yields the zero mask.
pub fn generate_mask(
    own_id: ClientId,
    keys: &EcdhKeyPair,
    directory: &PublicKeyDirectory,
    basis: Arc<RnsBasis>,
) -> MaskingResult<RnsPoly> {
    directory.get(own_id)?;

    let mut mask = RnsPoly::zero(basis.clone(), Format::Evaluation);
    for (peer_id, peer_der) in directory.iter().filter(|&(id, _)| id != own_id) {
        let secret = keys.shared_secret_with(peer_id, peer_der)?;
        let pairwise = expand_to_ring_element(secret.as_bytes(), basis.clone())?;
        if own_id < peer_id {
            mask -= &pairwise;
        } else {
            mask += &pairwise;
        }
    }
    debug!(client_id = own_id, peers = directory.len() - 1, "pairwise mask ready");
    Ok(mask)
}
