//! In-memory host for the ledger program.
//!
//! Accounts live in maps keyed the way they are addressed on chain. Every
//! instruction runs against a copy of the state that is only committed when
//! the instruction succeeds, matching the all-or-nothing semantics of a
//! transaction. The mock coprocessor evaluates handles to plaintext, so these
//! tests can check decrypted counts; `tests/program.rs` covers the account
//! contexts through a real bank.

#![allow(dead_code)]

use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use checkin_ledger::cipher::{CipherEngine, CipherHandle};
use checkin_ledger::errors::CheckinError;
use checkin_ledger::events::{
    AggregateDecrypted, AggregateDecryptionRequested, AggregatesBumped, CheckinRevealed,
    CheckinRevoked, CheckinSubmitted, GatewayUpdated, OwnershipTransferred, RevealRequested,
};
use checkin_ledger::oracle::{
    attestation_digest, encode_count, CallbackSelector, DecryptionOracle, RevealPayload,
};
use checkin_ledger::state::{
    AggregateCounter, AggregateIndex, AggregateTarget, CheckinHead, CheckinRecord, CounterKind,
    EncryptedFields, GuardrailEntry, LedgerConfig, PendingRequest, RevealedCheckin,
};
use checkin_ledger::{ledger, pda, router};

pub const DAY: u32 = 20250101;
pub const CATEGORY: u64 = 7;
pub const NOTE: u64 = 42;
pub const NOW: i64 = 1_735_689_600;

// ============================================================
// Mock Coprocessor
// ============================================================

/// Stand-in for the FHE coprocessor and its decryption gateway.
///
/// Handles are random-looking digests mapped to their plaintexts, so tests
/// can decrypt anything the ledger produced. Answers are attested with the
/// same digest the on-chain oracle checks.
#[derive(Clone, Debug, Default)]
pub struct Coprocessor {
    plaintexts: BTreeMap<[u8; 32], u64>,
    issued: u64,
    gateway: Pubkey,
    caller: Pubkey,
    next_request_id: u64,
    requests: BTreeMap<u64, (Vec<[u8; 32]>, CallbackSelector)>,
}

impl Coprocessor {
    pub fn new(gateway: Pubkey) -> Self {
        Self {
            gateway,
            next_request_id: 1,
            ..Default::default()
        }
    }

    fn fresh(&mut self, value: u64) -> CipherHandle {
        self.issued += 1;
        let handle = hashv(&[b"mock-coprocessor", &self.issued.to_le_bytes()]).to_bytes();
        self.plaintexts.insert(handle, value);
        CipherHandle(handle)
    }

    pub fn decrypt(&self, handle: &CipherHandle) -> Option<u64> {
        self.plaintexts.get(handle.as_bytes()).copied()
    }

    /// Client-side encryption of a check-in's fields.
    pub fn encrypt_fields(&mut self, category: u64, note: u64, day: u64) -> EncryptedFields {
        EncryptedFields {
            category: self.encrypt_u64(category),
            note: self.encrypt_u64(note),
            day: self.encrypt_u64(day),
        }
    }

    pub fn requested(&self, request_id: u64) -> Option<&(Vec<[u8; 32]>, CallbackSelector)> {
        self.requests.get(&request_id)
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    fn plaintext_of(&self, transport: &[u8; 32]) -> u64 {
        self.plaintexts
            .get(transport)
            .copied()
            .expect("handle was never produced by the coprocessor")
    }

    /// Decrypt a reveal request and label its codes the way the gateway does.
    pub fn answer_reveal(&self, request_id: u64) -> (Vec<u8>, [u8; 32]) {
        let (handles, callback) = self.requests.get(&request_id).expect("unknown request");
        assert_eq!(*callback, CallbackSelector::RevealCallback);

        let payload = RevealPayload {
            category: format!("category-{}", self.plaintext_of(&handles[0])),
            note: format!("note-{}", self.plaintext_of(&handles[1])),
            day: self.plaintext_of(&handles[2]) as u32,
        };
        let cleartexts = payload.encode().expect("payload encodes");
        let proof = attestation_digest(request_id, &cleartexts);
        (cleartexts, proof)
    }

    /// Decrypt an aggregate request.
    pub fn answer_aggregate(&self, request_id: u64) -> (Vec<u8>, [u8; 32]) {
        let (handles, callback) = self.requests.get(&request_id).expect("unknown request");
        assert_eq!(*callback, CallbackSelector::AggregateCallback);

        let cleartexts = encode_count(self.plaintext_of(&handles[0]));
        let proof = attestation_digest(request_id, &cleartexts);
        (cleartexts, proof)
    }
}

impl CipherEngine for Coprocessor {
    fn encrypt_u64(&mut self, value: u64) -> CipherHandle {
        self.fresh(value)
    }

    fn encrypt_bool(&mut self, value: bool) -> CipherHandle {
        self.fresh(u64::from(value))
    }

    fn add(&mut self, lhs: &CipherHandle, rhs: &CipherHandle) -> CipherHandle {
        let value = self.plaintext_of(lhs.as_bytes()).wrapping_add(self.plaintext_of(rhs.as_bytes()));
        self.fresh(value)
    }

    fn sub(&mut self, lhs: &CipherHandle, rhs: &CipherHandle) -> CipherHandle {
        let value = self.plaintext_of(lhs.as_bytes()).wrapping_sub(self.plaintext_of(rhs.as_bytes()));
        self.fresh(value)
    }

    fn is_initialized(&self, handle: &CipherHandle) -> bool {
        self.plaintexts.contains_key(handle.as_bytes())
    }
}

impl DecryptionOracle for Coprocessor {
    fn request_decryption(
        &mut self,
        handles: &[[u8; 32]],
        callback: CallbackSelector,
    ) -> Result<u64> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.requests.insert(request_id, (handles.to_vec(), callback));
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: u64, cleartexts: &[u8], proof: &[u8; 32]) -> bool {
        self.caller == self.gateway && attestation_digest(request_id, cleartexts) == *proof
    }
}

// ============================================================
// Ledger Host
// ============================================================

#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub config: LedgerConfig,
    pub index: AggregateIndex,
    pub records: BTreeMap<u64, CheckinRecord>,
    pub revealed: BTreeMap<u64, RevealedCheckin>,
    pub guardrails: BTreeMap<Pubkey, GuardrailEntry>,
    pub counters: BTreeMap<Pubkey, AggregateCounter>,
    pub pending: BTreeMap<u64, PendingRequest>,
}

impl LedgerState {
    /// Serialized image of every account, for byte-for-byte comparisons.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.config.serialize(&mut out).unwrap();
        self.index.serialize(&mut out).unwrap();
        for (id, record) in &self.records {
            id.serialize(&mut out).unwrap();
            record.serialize(&mut out).unwrap();
        }
        for (id, mirror) in &self.revealed {
            id.serialize(&mut out).unwrap();
            mirror.serialize(&mut out).unwrap();
        }
        for (identity, entry) in &self.guardrails {
            identity.serialize(&mut out).unwrap();
            entry.serialize(&mut out).unwrap();
        }
        for (address, counter) in &self.counters {
            address.serialize(&mut out).unwrap();
            counter.serialize(&mut out).unwrap();
        }
        for (id, pending) in &self.pending {
            id.serialize(&mut out).unwrap();
            pending.serialize(&mut out).unwrap();
        }
        out
    }
}

pub struct TestLedger {
    pub owner: Pubkey,
    pub gateway: Pubkey,
    pub state: LedgerState,
    pub coprocessor: Coprocessor,
}

impl TestLedger {
    pub fn new() -> Self {
        let owner = Pubkey::new_unique();
        let gateway = Pubkey::new_unique();
        let mut coprocessor = Coprocessor::new(gateway);

        let (_, config_bump) = pda::config_address();
        let (_, index_bump) = pda::index_address();
        let global_counter = coprocessor.encrypt_u64(0);

        let state = LedgerState {
            config: LedgerConfig::new(owner, gateway, config_bump),
            index: AggregateIndex::new(global_counter, index_bump),
            ..Default::default()
        };

        Self {
            owner,
            gateway,
            state,
            coprocessor,
        }
    }

    /// Run `op` on a copy of the state and commit it only on success.
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut LedgerState, &mut Coprocessor) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.clone();
        let mut coprocessor = self.coprocessor.clone();

        let out = op(&mut state, &mut coprocessor)?;

        self.state = state;
        self.coprocessor = coprocessor;
        Ok(out)
    }

    // Instructions

    pub fn submit(
        &mut self,
        submitter: Pubkey,
        fields: EncryptedFields,
        clear_day: u32,
    ) -> Result<CheckinSubmitted> {
        self.transact(|state, coprocessor| {
            let id = state.config.next_checkin_id;
            let mut record = CheckinRecord::default();
            let guardrail = state.guardrails.entry(submitter).or_default();

            let event = ledger::submit_checkin(
                coprocessor,
                &mut state.config,
                &mut state.index,
                guardrail,
                &mut record,
                submitter,
                fields,
                clear_day,
                NOW,
            )?;

            state.records.insert(id, record);
            Ok(event)
        })
    }

    /// Encrypt `category`/`NOTE`/`clear_day` and submit them.
    pub fn submit_clear(
        &mut self,
        submitter: Pubkey,
        category: u64,
        clear_day: u32,
    ) -> Result<CheckinSubmitted> {
        let fields = self
            .coprocessor
            .encrypt_fields(category, NOTE, u64::from(clear_day));
        self.submit(submitter, fields, clear_day)
    }

    pub fn bump(&mut self, clear_category: u32, clear_day: u32) -> Result<AggregatesBumped> {
        self.transact(|state, coprocessor| {
            let (category_address, _) = pda::counter_address(CounterKind::Category, clear_category);
            let (day_address, _) = pda::counter_address(CounterKind::Day, clear_day);
            let mut category_counter = state
                .counters
                .get(&category_address)
                .cloned()
                .unwrap_or_default();
            let mut day_counter = state.counters.get(&day_address).cloned().unwrap_or_default();

            let event = ledger::bump_aggregates(
                coprocessor,
                &mut state.index,
                &mut category_counter,
                &mut day_counter,
                clear_category,
                clear_day,
            )?;

            state.counters.insert(category_address, category_counter);
            state.counters.insert(day_address, day_counter);
            Ok(event)
        })
    }

    pub fn revoke(
        &mut self,
        caller: Pubkey,
        checkin_id: u64,
        clear_category: u32,
        clear_day: u32,
    ) -> Result<CheckinRevoked> {
        self.revoke_with(caller, checkin_id, clear_category, clear_day, true)
    }

    /// Revoke, optionally leaving the counter accounts out of the call.
    pub fn revoke_with(
        &mut self,
        caller: Pubkey,
        checkin_id: u64,
        clear_category: u32,
        clear_day: u32,
        pass_counters: bool,
    ) -> Result<CheckinRevoked> {
        self.transact(|state, coprocessor| {
            let record = state
                .records
                .get_mut(&checkin_id)
                .ok_or(CheckinError::NotFound)?;

            let (category_address, _) = pda::counter_address(CounterKind::Category, clear_category);
            let (day_address, _) = pda::counter_address(CounterKind::Day, clear_day);
            let (mut category_counter, mut day_counter) = if pass_counters {
                (
                    state.counters.remove(&category_address),
                    state.counters.remove(&day_address),
                )
            } else {
                (None, None)
            };

            let event = ledger::revoke_checkin(
                coprocessor,
                &mut state.index,
                record,
                category_counter.as_mut(),
                day_counter.as_mut(),
                clear_category,
                clear_day,
                caller,
            )?;

            if let Some(counter) = category_counter {
                state.counters.insert(category_address, counter);
            }
            if let Some(counter) = day_counter {
                state.counters.insert(day_address, counter);
            }
            Ok(event)
        })
    }

    pub fn request_reveal(&mut self, caller: Pubkey, checkin_id: u64) -> Result<RevealRequested> {
        self.transact(|state, coprocessor| {
            let record = state
                .records
                .get(&checkin_id)
                .ok_or(CheckinError::NotFound)?;
            let mut pending = PendingRequest::default();

            let event = router::request_reveal(coprocessor, record, &mut pending, caller, NOW)?;

            state.pending.insert(event.request_id, pending);
            Ok(event)
        })
    }

    pub fn request_aggregate(
        &mut self,
        target: AggregateTarget,
    ) -> Result<AggregateDecryptionRequested> {
        self.transact(|state, coprocessor| {
            let counter = target
                .counter_key()
                .map(|(kind, key)| pda::counter_address(kind, key).0)
                .and_then(|address| state.counters.get(&address));
            let mut pending = PendingRequest::default();

            let event = router::request_aggregate(
                coprocessor,
                &state.index,
                target,
                counter,
                &mut pending,
                NOW,
            )?;

            state.pending.insert(event.request_id, pending);
            Ok(event)
        })
    }

    pub fn reveal_callback(
        &mut self,
        caller: Pubkey,
        request_id: u64,
        cleartexts: &[u8],
        proof: &[u8; 32],
    ) -> Result<CheckinRevealed> {
        self.transact(|state, coprocessor| {
            coprocessor.gateway = state.config.gateway;
            coprocessor.caller = caller;

            let pending = state
                .pending
                .get_mut(&request_id)
                .ok_or(CheckinError::UnknownRequest)?;
            // an aggregate subject does not name a record
            let record = state
                .records
                .get_mut(&pending.subject)
                .ok_or(CheckinError::UnknownRequest)?;
            let mut mirror = state
                .revealed
                .get(&pending.subject)
                .cloned()
                .unwrap_or_default();

            let event = router::on_reveal_callback(
                &*coprocessor,
                pending,
                record,
                &mut mirror,
                request_id,
                cleartexts,
                proof,
                NOW,
            )?;

            state.revealed.insert(event.checkin_id, mirror);
            Ok(event)
        })
    }

    pub fn aggregate_callback(
        &mut self,
        caller: Pubkey,
        request_id: u64,
        cleartexts: &[u8],
        proof: &[u8; 32],
    ) -> Result<AggregateDecrypted> {
        self.transact(|state, coprocessor| {
            coprocessor.gateway = state.config.gateway;
            coprocessor.caller = caller;

            let pending = state
                .pending
                .get_mut(&request_id)
                .ok_or(CheckinError::UnknownRequest)?;

            router::on_aggregate_callback(&*coprocessor, pending, request_id, cleartexts, proof)
        })
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Pubkey,
        new_owner: Pubkey,
    ) -> Result<OwnershipTransferred> {
        self.transact(|state, _| state.config.transfer_ownership(caller, new_owner))
    }

    pub fn set_gateway(&mut self, caller: Pubkey, new_gateway: Pubkey) -> Result<GatewayUpdated> {
        self.transact(|state, _| state.config.set_gateway(caller, new_gateway))
    }

    // Gateway round trips

    /// Request a reveal and deliver the gateway's answer.
    pub fn reveal(&mut self, caller: Pubkey, checkin_id: u64) -> Result<CheckinRevealed> {
        let request = self.request_reveal(caller, checkin_id)?;
        let (cleartexts, proof) = self.coprocessor.answer_reveal(request.request_id);
        self.reveal_callback(self.gateway, request.request_id, &cleartexts, &proof)
    }

    /// Request an aggregate and deliver the gateway's answer.
    pub fn decrypt_aggregate(&mut self, target: AggregateTarget) -> Result<AggregateDecrypted> {
        let request = self.request_aggregate(target)?;
        let (cleartexts, proof) = self.coprocessor.answer_aggregate(request.request_id);
        self.aggregate_callback(self.gateway, request.request_id, &cleartexts, &proof)
    }

    // Read accessors

    pub fn head(&self, checkin_id: u64) -> Option<CheckinHead> {
        self.state.records.get(&checkin_id).map(CheckinRecord::head)
    }

    pub fn mirror(&self, checkin_id: u64) -> Option<&RevealedCheckin> {
        self.state.revealed.get(&checkin_id)
    }

    pub fn pending(&self, request_id: u64) -> Option<&PendingRequest> {
        self.state.pending.get(&request_id)
    }

    pub fn global_total(&self) -> u64 {
        self.coprocessor
            .decrypt(&self.state.index.global_counter())
            .expect("global counter is always initialized")
    }

    /// Plaintext of a keyed counter, `None` when the key was never bumped.
    pub fn count(&self, kind: CounterKind, key: u32) -> Option<u64> {
        let (address, _) = pda::counter_address(kind, key);
        let counter = self.state.counters.get(&address)?;
        let handle = counter.handle().ok()?;
        self.coprocessor.decrypt(&handle)
    }

    pub fn record_revoked_plaintext(&self, checkin_id: u64) -> Option<u64> {
        let record = self.state.records.get(&checkin_id)?;
        self.coprocessor.decrypt(&record.revoked)
    }
}
