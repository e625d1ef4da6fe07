use anchor_lang::prelude::*;

use crate::cipher::CipherHandle;
use crate::errors::CheckinError;
use crate::state::OnceFlag;

/// The three encrypted fields a submitter provides.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct EncryptedFields {
    pub category: CipherHandle,
    pub note: CipherHandle,
    pub day: CipherHandle,
}

impl EncryptedFields {
    pub fn transport_handles(&self) -> [[u8; 32]; 3] {
        [self.category.0, self.note.0, self.day.0]
    }
}

/// Public head of a record: everything an observer may read in the clear.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CheckinHead {
    pub id: u64,
    pub submitter: Pubkey,
    pub created_at: i64,
    pub revealed: bool,
}

/// One check-in submission with encrypted fields.
/// Seeds: [b"checkin", id.to_le_bytes()]
#[account]
#[derive(Default, Debug)]
pub struct CheckinRecord {
    /// Ledger-wide unique id, never reused
    pub id: u64,
    /// Identity that submitted the record
    pub submitter: Pubkey,
    /// Encrypted category code
    pub category: CipherHandle,
    /// Encrypted note code
    pub note: CipherHandle,
    /// Encrypted day bucket
    pub day: CipherHandle,
    /// Submission timestamp (Unix seconds)
    pub created_at: i64,
    /// Encrypted revocation flag
    pub revoked: CipherHandle,
    /// Latched when the record is revoked
    pub revocation: OnceFlag,
    /// Latched when the record is revealed
    pub revealed: OnceFlag,
    /// PDA bump seed
    pub bump: u8,
}

impl CheckinRecord {
    pub const SIZE: usize = 8 + // discriminator
        8 +  // id
        32 + // submitter
        CipherHandle::LEN * 3 + // category, note, day
        8 +  // created_at
        CipherHandle::LEN + // revoked
        OnceFlag::SIZE + // revocation
        OnceFlag::SIZE + // revealed
        1;   // bump
    // Total: 187 bytes

    pub const SEED_PREFIX: &'static [u8] = b"checkin";

    pub fn head(&self) -> CheckinHead {
        CheckinHead {
            id: self.id,
            submitter: self.submitter,
            created_at: self.created_at,
            revealed: self.revealed.is_set(),
        }
    }

    pub fn encrypted_fields(&self) -> EncryptedFields {
        EncryptedFields {
            category: self.category,
            note: self.note,
            day: self.day,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revocation.is_set()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed.is_set()
    }

    /// Decode a record fetched by address. An absent or foreign account is `NotFound`.
    pub fn load(data: Option<&[u8]>) -> Result<Self> {
        let mut data = data
            .filter(|data| !data.is_empty())
            .ok_or(CheckinError::NotFound)?;
        Self::try_deserialize(&mut data).map_err(|_| error!(CheckinError::NotFound))
    }
}

/// Plaintext mirror of a revealed record. Written once by the reveal callback.
/// Seeds: [b"revealed", checkin_id.to_le_bytes()]
#[account]
#[derive(Default, Debug)]
pub struct RevealedCheckin {
    pub checkin_id: u64,
    pub category: String,
    pub note: String,
    pub day: u32,
    /// Timestamp of the reveal callback
    pub revealed_at: i64,
    /// PDA bump seed
    pub bump: u8,
}

impl RevealedCheckin {
    pub const MAX_CATEGORY_LEN: usize = 32;
    pub const MAX_NOTE_LEN: usize = 128;

    pub const SIZE: usize = 8 + // discriminator
        8 +  // checkin_id
        4 + Self::MAX_CATEGORY_LEN + // category
        4 + Self::MAX_NOTE_LEN + // note
        4 +  // day
        8 +  // revealed_at
        1;   // bump
    // Total: 197 bytes

    pub const SEED_PREFIX: &'static [u8] = b"revealed";
}
