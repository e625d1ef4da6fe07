//! Address derivation for every ledger account, for clients and tests.

use anchor_lang::prelude::*;

use crate::state::{
    AggregateCounter, AggregateIndex, CheckinRecord, CounterKind, GuardrailEntry, LedgerConfig,
    PendingRequest, RevealedCheckin,
};

pub fn config_address() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[LedgerConfig::SEED_PREFIX], &crate::ID)
}

pub fn index_address() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AggregateIndex::SEED_PREFIX], &crate::ID)
}

pub fn checkin_address(checkin_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[CheckinRecord::SEED_PREFIX, checkin_id.to_le_bytes().as_ref()],
        &crate::ID,
    )
}

pub fn revealed_address(checkin_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[RevealedCheckin::SEED_PREFIX, checkin_id.to_le_bytes().as_ref()],
        &crate::ID,
    )
}

pub fn guardrail_address(identity: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[GuardrailEntry::SEED_PREFIX, identity.as_ref()], &crate::ID)
}

pub fn counter_address(kind: CounterKind, key: u32) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            AggregateCounter::SEED_PREFIX,
            kind.seed(),
            key.to_le_bytes().as_ref(),
        ],
        &crate::ID,
    )
}

pub fn pending_address(request_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[PendingRequest::SEED_PREFIX, request_id.to_le_bytes().as_ref()],
        &crate::ID,
    )
}
