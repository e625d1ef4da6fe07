use anchor_lang::prelude::*;

use crate::state::CounterKind;

/// What an outstanding decryption request resolves to.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum RequestKind {
    /// Never issued
    #[default]
    Invalid,
    Reveal,
    GlobalTotal,
    CategoryCount,
    DayCount,
}

impl RequestKind {
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            RequestKind::GlobalTotal | RequestKind::CategoryCount | RequestKind::DayCount
        )
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum RequestStatus {
    #[default]
    Issued,
    Fulfilled,
}

/// Aggregate a caller asks to decrypt.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AggregateTarget {
    GlobalTotal,
    Category(u32),
    Day(u32),
}

impl AggregateTarget {
    pub fn kind(&self) -> RequestKind {
        match self {
            AggregateTarget::GlobalTotal => RequestKind::GlobalTotal,
            AggregateTarget::Category(_) => RequestKind::CategoryCount,
            AggregateTarget::Day(_) => RequestKind::DayCount,
        }
    }

    /// Subject recorded on the pending request; 0 for the global total.
    pub fn subject(&self) -> u64 {
        match self {
            AggregateTarget::GlobalTotal => 0,
            AggregateTarget::Category(code) => u64::from(*code),
            AggregateTarget::Day(bucket) => u64::from(*bucket),
        }
    }

    /// Keyed counter backing this target, if any.
    pub fn counter_key(&self) -> Option<(CounterKind, u32)> {
        match self {
            AggregateTarget::GlobalTotal => None,
            AggregateTarget::Category(code) => Some((CounterKind::Category, *code)),
            AggregateTarget::Day(bucket) => Some((CounterKind::Day, *bucket)),
        }
    }
}

/// Correlates a decryption request id with its intent.
/// Kept as a terminal `Fulfilled` entry after the callback.
/// Seeds: [b"pending", request_id.to_le_bytes()]
#[account]
#[derive(Default, Debug)]
pub struct PendingRequest {
    pub request_id: u64,
    pub kind: RequestKind,
    /// Record id, category code, day bucket, or 0 for the global total
    pub subject: u64,
    pub status: RequestStatus,
    pub issued_at: i64,
    /// PDA bump seed
    pub bump: u8,
}

impl PendingRequest {
    pub const SIZE: usize = 8 + // discriminator
        8 +  // request_id
        1 +  // kind
        8 +  // subject
        1 +  // status
        8 +  // issued_at
        1;   // bump
    // Total: 35 bytes

    pub const SEED_PREFIX: &'static [u8] = b"pending";

    pub fn issue(&mut self, request_id: u64, kind: RequestKind, subject: u64, now: i64) {
        self.request_id = request_id;
        self.kind = kind;
        self.subject = subject;
        self.status = RequestStatus::Issued;
        self.issued_at = now;
    }

    /// Whether this entry was issued for `request_id` and awaits its callback.
    pub fn is_outstanding(&self, request_id: u64) -> bool {
        self.kind != RequestKind::Invalid
            && self.request_id == request_id
            && self.status == RequestStatus::Issued
    }

    pub fn fulfil(&mut self) {
        self.status = RequestStatus::Fulfilled;
    }
}
