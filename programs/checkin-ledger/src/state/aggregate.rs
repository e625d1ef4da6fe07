use anchor_lang::prelude::*;

use crate::cipher::{CipherEngine, CipherHandle};
use crate::errors::CheckinError;

/// Which clear key space a keyed counter belongs to.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug, Hash)]
pub enum CounterKind {
    #[default]
    Category,
    Day,
}

impl CounterKind {
    /// Seed component distinguishing category counters from day counters.
    pub fn seed(&self) -> &'static [u8] {
        match self {
            CounterKind::Category => b"c",
            CounterKind::Day => b"d",
        }
    }
}

/// Enumeration of every aggregate key ever observed, plus the global counter.
/// Seeds: [b"aggregate_index"]
#[account]
#[derive(Default, Debug)]
pub struct AggregateIndex {
    /// Encrypted count of live (non-revoked) check-ins
    pub global_counter: CipherHandle,
    /// Category codes with an initialized counter, in first-seen order
    pub category_codes: Vec<u32>,
    /// Day buckets with an initialized counter, in first-seen order
    pub day_buckets: Vec<u32>,
    /// PDA bump seed
    pub bump: u8,
}

impl AggregateIndex {
    pub const MAX_CATEGORY_CODES: usize = 64;
    pub const MAX_DAY_BUCKETS: usize = 400;

    pub const SIZE: usize = 8 + // discriminator
        CipherHandle::LEN + // global_counter
        4 + 4 * Self::MAX_CATEGORY_CODES + // category_codes
        4 + 4 * Self::MAX_DAY_BUCKETS + // day_buckets
        1; // bump
    // Total: 1905 bytes

    pub const SEED_PREFIX: &'static [u8] = b"aggregate_index";

    pub fn new(global_counter: CipherHandle, bump: u8) -> Self {
        Self {
            global_counter,
            category_codes: Vec::new(),
            day_buckets: Vec::new(),
            bump,
        }
    }

    pub fn global_counter(&self) -> CipherHandle {
        self.global_counter
    }

    pub fn category_codes(&self) -> &[u32] {
        &self.category_codes
    }

    pub fn day_buckets(&self) -> &[u32] {
        &self.day_buckets
    }

    pub fn keys(&self, kind: CounterKind) -> &[u32] {
        match kind {
            CounterKind::Category => &self.category_codes,
            CounterKind::Day => &self.day_buckets,
        }
    }

    pub fn is_known(&self, kind: CounterKind, key: u32) -> bool {
        self.keys(kind).contains(&key)
    }

    /// Whether `register(kind, key)` would succeed.
    pub fn can_register(&self, kind: CounterKind, key: u32) -> bool {
        let capacity = match kind {
            CounterKind::Category => Self::MAX_CATEGORY_CODES,
            CounterKind::Day => Self::MAX_DAY_BUCKETS,
        };
        self.is_known(kind, key) || self.keys(kind).len() < capacity
    }

    fn register(&mut self, kind: CounterKind, key: u32) -> Result<()> {
        if self.is_known(kind, key) {
            return Ok(());
        }
        require!(self.can_register(kind, key), CheckinError::KeyCapacityExceeded);

        match kind {
            CounterKind::Category => self.category_codes.push(key),
            CounterKind::Day => self.day_buckets.push(key),
        }
        Ok(())
    }

    pub fn increment_global<E: CipherEngine>(&mut self, engine: &mut E) {
        let one = engine.encrypt_u64(1);
        self.global_counter = engine.add(&self.global_counter, &one);
    }

    pub fn decrement_global<E: CipherEngine>(&mut self, engine: &mut E) {
        let one = engine.encrypt_u64(1);
        self.global_counter = engine.sub(&self.global_counter, &one);
    }
}

/// Encrypted running count for one category code or day bucket.
/// Seeds: [b"aggregate", kind.seed(), key.to_le_bytes()]
#[account]
#[derive(Default, Debug)]
pub struct AggregateCounter {
    pub kind: CounterKind,
    pub key: u32,
    /// Encrypted count; meaningless until `known`
    pub handle: CipherHandle,
    /// Set once the counter was initialized to an encrypted zero
    pub known: bool,
    /// PDA bump seed
    pub bump: u8,
}

impl AggregateCounter {
    pub const SIZE: usize = 8 + // discriminator
        1 +  // kind
        4 +  // key
        CipherHandle::LEN + // handle
        1 +  // known
        1;   // bump
    // Total: 47 bytes

    pub const SEED_PREFIX: &'static [u8] = b"aggregate";

    pub fn is_known(&self) -> bool {
        self.known
    }

    pub fn matches(&self, kind: CounterKind, key: u32) -> bool {
        self.kind == kind && self.key == key
    }

    /// Encrypted count; unknown counters must not be read.
    pub fn handle(&self) -> Result<CipherHandle> {
        require!(self.known, CheckinError::UnknownKey);
        Ok(self.handle)
    }

    pub fn increment<E: CipherEngine>(&mut self, engine: &mut E) -> Result<()> {
        require!(self.known, CheckinError::UnknownKey);
        let one = engine.encrypt_u64(1);
        self.handle = engine.add(&self.handle, &one);
        Ok(())
    }

    pub fn decrement<E: CipherEngine>(&mut self, engine: &mut E) -> Result<()> {
        require!(self.known, CheckinError::UnknownKey);
        let one = engine.encrypt_u64(1);
        self.handle = engine.sub(&self.handle, &one);
        Ok(())
    }
}

/// Register `key` in the index and initialize its counter to an encrypted zero.
///
/// Idempotent: a counter that is already known keeps its value. Returns
/// whether the counter was initialized by this call.
pub fn ensure_known<E: CipherEngine>(
    engine: &mut E,
    index: &mut AggregateIndex,
    counter: &mut AggregateCounter,
    kind: CounterKind,
    key: u32,
) -> Result<bool> {
    if counter.known {
        require!(counter.matches(kind, key), CheckinError::CounterMismatch);
        return Ok(false);
    }

    index.register(kind, key)?;

    counter.kind = kind;
    counter.key = key;
    counter.handle = engine.encrypt_u64(0);
    counter.known = true;

    Ok(true)
}
