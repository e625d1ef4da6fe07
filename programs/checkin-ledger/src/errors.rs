use anchor_lang::prelude::*;

#[error_code]
pub enum CheckinError {
    #[msg("Identity already checked in for this day")]
    DuplicateSubmission,

    #[msg("Check-in record not found")]
    NotFound,

    #[msg("Caller is not authorized for this action")]
    NotAuthorized,

    #[msg("Check-in record has already been revealed")]
    AlreadyRevealed,

    #[msg("Aggregate key has never been initialized")]
    UnknownKey,

    #[msg("Decryption request is unknown or not pending")]
    UnknownRequest,

    #[msg("Decryption proof failed verification")]
    InvalidProof,

    #[msg("Invalid target identity")]
    InvalidTarget,

    // Latch and payload errors
    #[msg("Check-in record has already been revoked")]
    AlreadyRevoked,

    #[msg("Ciphertext handle is not initialized")]
    InvalidCiphertext,

    #[msg("Decrypted cleartext payload is malformed")]
    MalformedCleartext,

    // Aggregate index errors
    #[msg("Aggregate index is full")]
    KeyCapacityExceeded,

    #[msg("Counter account required for a known aggregate key")]
    CounterAccountMissing,

    #[msg("Counter account does not match the aggregate key")]
    CounterMismatch,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}
