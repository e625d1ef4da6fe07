use anchor_lang::prelude::*;

use crate::errors::CheckinError;
use crate::events::{GatewayUpdated, OwnershipTransferred};

/// Singleton ledger configuration and admin capability.
/// Seeds: [b"ledger_config"]
#[account]
#[derive(Default, Debug)]
pub struct LedgerConfig {
    /// Admin who can transfer ownership and rotate the gateway
    pub owner: Pubkey,
    /// Decryption gateway authority that signs callbacks
    pub gateway: Pubkey,
    /// Id assigned to the next check-in (starts at 1)
    pub next_checkin_id: u64,
    /// Id assigned to the next decryption request (starts at 1)
    pub next_request_id: u64,
    /// Nonce mixed into symbolic handle derivation
    pub cipher_nonce: u64,
    /// PDA bump seed
    pub bump: u8,
}

impl LedgerConfig {
    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        32 + // gateway
        8 +  // next_checkin_id
        8 +  // next_request_id
        8 +  // cipher_nonce
        1;   // bump
    // Total: 97 bytes

    pub const SEED_PREFIX: &'static [u8] = b"ledger_config";

    pub fn new(owner: Pubkey, gateway: Pubkey, bump: u8) -> Self {
        Self {
            owner,
            gateway,
            next_checkin_id: 1,
            next_request_id: 1,
            cipher_nonce: 0,
            bump,
        }
    }

    /// Reserve the next check-in id.
    pub fn allocate_checkin_id(&mut self) -> Result<u64> {
        let id = self.next_checkin_id;
        self.next_checkin_id = id
            .checked_add(1)
            .ok_or(CheckinError::ArithmeticOverflow)?;
        Ok(id)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Pubkey,
        new_owner: Pubkey,
    ) -> Result<OwnershipTransferred> {
        require_keys_eq!(caller, self.owner, CheckinError::NotAuthorized);
        require!(new_owner != Pubkey::default(), CheckinError::InvalidTarget);

        let previous_owner = self.owner;
        self.owner = new_owner;

        Ok(OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }

    pub fn set_gateway(&mut self, caller: Pubkey, new_gateway: Pubkey) -> Result<GatewayUpdated> {
        require_keys_eq!(caller, self.owner, CheckinError::NotAuthorized);
        require!(new_gateway != Pubkey::default(), CheckinError::InvalidTarget);

        let previous_gateway = self.gateway;
        self.gateway = new_gateway;

        Ok(GatewayUpdated {
            previous_gateway,
            new_gateway,
        })
    }
}
