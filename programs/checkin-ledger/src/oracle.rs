//! Decryption oracle boundary and cleartext payload formats.
//!
//! Requests are fire-and-forget: the oracle hands back a request id and the
//! answer arrives later through a callback instruction. Every callback
//! carries a proof that must verify before any payload is decoded.

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use crate::errors::CheckinError;
use crate::events::DecryptionRequested;
use crate::state::RevealedCheckin;

/// Domain separator for gateway attestations.
pub const ATTESTATION_DOMAIN: &[u8] = b"checkin-ledger/attestation";

/// Which callback instruction the gateway must invoke with the result.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum CallbackSelector {
    RevealCallback,
    AggregateCallback,
}

pub trait DecryptionOracle {
    /// Queue decryption of `handles`; returns the oracle-assigned request id.
    fn request_decryption(
        &mut self,
        handles: &[[u8; 32]],
        callback: CallbackSelector,
    ) -> Result<u64>;

    /// Whether `proof` authenticates `cleartexts` as the answer to `request_id`.
    fn verify_proof(&self, request_id: u64, cleartexts: &[u8], proof: &[u8; 32]) -> bool;
}

/// Digest the gateway attaches to each answer.
///
/// Unkeyed: anyone can compute it from public data. It binds the cleartext
/// to the request id but authenticates nothing on its own.
pub fn attestation_digest(request_id: u64, cleartexts: &[u8]) -> [u8; 32] {
    hashv(&[ATTESTATION_DOMAIN, &request_id.to_le_bytes(), cleartexts]).to_bytes()
}

/// On-chain oracle backed by the configured gateway authority.
///
/// Request ids are drawn from the ledger config counter; the handler writes
/// [`GatewayOracle::next_request_id`] back once the instruction succeeds.
pub struct GatewayOracle {
    gateway: Pubkey,
    caller: Pubkey,
    next_request_id: u64,
    requests: Vec<DecryptionRequested>,
}

impl GatewayOracle {
    pub fn new(gateway: Pubkey, caller: Pubkey, next_request_id: u64) -> Self {
        Self {
            gateway,
            caller,
            next_request_id,
            requests: Vec::new(),
        }
    }

    pub fn next_request_id(&self) -> u64 {
        self.next_request_id
    }

    pub fn drain_requests(&mut self) -> Vec<DecryptionRequested> {
        std::mem::take(&mut self.requests)
    }
}

impl DecryptionOracle for GatewayOracle {
    fn request_decryption(
        &mut self,
        handles: &[[u8; 32]],
        callback: CallbackSelector,
    ) -> Result<u64> {
        let request_id = self.next_request_id;
        self.next_request_id = request_id
            .checked_add(1)
            .ok_or(CheckinError::ArithmeticOverflow)?;

        self.requests.push(DecryptionRequested {
            request_id,
            handles: handles.to_vec(),
            callback,
        });

        Ok(request_id)
    }

    /// Authenticity comes from the signer check: the callback must be signed
    /// by the configured gateway. The digest comparison only ties the proof
    /// to this request id and these exact cleartexts.
    fn verify_proof(&self, request_id: u64, cleartexts: &[u8], proof: &[u8; 32]) -> bool {
        self.caller == self.gateway && attestation_digest(request_id, cleartexts) == *proof
    }
}

// ============================================================
// Cleartext Payloads
// ============================================================

/// Decrypted fields of a single check-in, as labelled by the gateway.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct RevealPayload {
    pub category: String,
    pub note: String,
    pub day: u32,
}

impl RevealPayload {
    pub fn decode(cleartexts: &[u8]) -> Result<Self> {
        let payload = Self::try_from_slice(cleartexts)
            .map_err(|_| error!(CheckinError::MalformedCleartext))?;

        require!(
            payload.category.len() <= RevealedCheckin::MAX_CATEGORY_LEN
                && payload.note.len() <= RevealedCheckin::MAX_NOTE_LEN,
            CheckinError::MalformedCleartext
        );

        Ok(payload)
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(&mut out)?;
        Ok(out)
    }
}

/// Decrypted value of a single aggregate counter.
pub fn decode_count(cleartexts: &[u8]) -> Result<u64> {
    u64::try_from_slice(cleartexts).map_err(|_| error!(CheckinError::MalformedCleartext))
}

pub fn encode_count(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}
