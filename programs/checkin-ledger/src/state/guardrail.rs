use anchor_lang::prelude::*;

/// Last accepted day bucket for one identity.
/// Created on the identity's first submission and overwritten afterwards.
/// Seeds: [b"guardrail", identity.key()]
#[account]
#[derive(Default, Debug)]
pub struct GuardrailEntry {
    /// Identity this entry guards
    pub identity: Pubkey,
    /// Clear day index of the last accepted submission
    pub last_day: u32,
    /// Whether `last_day` holds a real value; day 0 is a legitimate index
    pub has_submitted: bool,
    /// PDA bump seed
    pub bump: u8,
}

impl GuardrailEntry {
    pub const SIZE: usize = 8 + // discriminator
        32 + // identity
        4 +  // last_day
        1 +  // has_submitted
        1;   // bump
    // Total: 46 bytes

    pub const SEED_PREFIX: &'static [u8] = b"guardrail";

    pub fn may_accept(&self, clear_day: u32) -> bool {
        !self.has_submitted || self.last_day != clear_day
    }

    pub fn record(&mut self, identity: Pubkey, clear_day: u32) {
        self.identity = identity;
        self.last_day = clear_day;
        self.has_submitted = true;
    }
}
