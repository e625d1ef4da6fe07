use anchor_lang::prelude::*;

use crate::oracle::CallbackSelector;
use crate::state::RequestKind;

// ============================================================
// Ledger Events
// ============================================================

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinSubmitted {
    pub checkin_id: u64,
    pub submitter: Pubkey,
    pub created_at: i64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatesBumped {
    pub category: u32,
    pub day: u32,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinRevoked {
    pub checkin_id: u64,
    pub submitter: Pubkey,
}

// ============================================================
// Decryption Events
// ============================================================

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealRequested {
    pub checkin_id: u64,
    pub request_id: u64,
    pub requester: Pubkey,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDecryptionRequested {
    pub request_id: u64,
    pub kind: RequestKind,
    pub subject: u64,
}

/// Plaintext of a single record, published once.
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinRevealed {
    pub checkin_id: u64,
    pub request_id: u64,
    pub category: String,
    pub note: String,
    pub day: u32,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDecrypted {
    pub request_id: u64,
    pub kind: RequestKind,
    pub subject: u64,
    pub value: u64,
}

// ============================================================
// Admin Events
// ============================================================

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipTransferred {
    pub previous_owner: Pubkey,
    pub new_owner: Pubkey,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayUpdated {
    pub previous_gateway: Pubkey,
    pub new_gateway: Pubkey,
}

// ============================================================
// Off-chain Work Items
// ============================================================

/// Picked up by the gateway; answered through a callback instruction.
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionRequested {
    pub request_id: u64,
    pub handles: Vec<[u8; 32]>,
    pub callback: CallbackSelector,
}

/// One node of the symbolic operation graph evaluated by the coprocessor.
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherOpRecorded {
    pub op: u8,
    pub lhs: [u8; 32],
    pub rhs: [u8; 32],
    pub clear: u64,
    pub result: [u8; 32],
}
