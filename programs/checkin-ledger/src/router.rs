//! Decryption request routing.
//!
//! Issuing a request records a [`PendingRequest`] naming what the answer is
//! for. Callbacks look that entry up, verify the gateway proof, and only then
//! decode and apply the cleartext. Per request id the state machine is
//! `Issued -> Fulfilled`; there are no retries, cancellations or timeouts.

use anchor_lang::prelude::*;

use crate::errors::CheckinError;
use crate::events::{
    AggregateDecrypted, AggregateDecryptionRequested, CheckinRevealed, RevealRequested,
};
use crate::oracle::{decode_count, CallbackSelector, DecryptionOracle, RevealPayload};
use crate::state::{
    AggregateCounter, AggregateIndex, AggregateTarget, CheckinRecord, PendingRequest,
    RequestKind, RevealedCheckin,
};

/// Ask the oracle to decrypt one record's fields for its submitter.
pub fn request_reveal<O: DecryptionOracle>(
    oracle: &mut O,
    record: &CheckinRecord,
    pending: &mut PendingRequest,
    caller: Pubkey,
    now: i64,
) -> Result<RevealRequested> {
    require_keys_eq!(caller, record.submitter, CheckinError::NotAuthorized);
    require!(!record.is_revealed(), CheckinError::AlreadyRevealed);

    let handles = record.encrypted_fields().transport_handles();
    let request_id = oracle.request_decryption(&handles, CallbackSelector::RevealCallback)?;

    pending.issue(request_id, RequestKind::Reveal, record.id, now);

    Ok(RevealRequested {
        checkin_id: record.id,
        request_id,
        requester: caller,
    })
}

/// Ask the oracle to decrypt the global total or one keyed counter.
pub fn request_aggregate<O: DecryptionOracle>(
    oracle: &mut O,
    index: &AggregateIndex,
    target: AggregateTarget,
    counter: Option<&AggregateCounter>,
    pending: &mut PendingRequest,
    now: i64,
) -> Result<AggregateDecryptionRequested> {
    let handle = match target.counter_key() {
        None => index.global_counter(),
        Some((kind, key)) => {
            let counter = counter
                .filter(|counter| counter.is_known() && counter.matches(kind, key))
                .ok_or(CheckinError::UnknownKey)?;
            counter.handle()?
        }
    };

    let request_id =
        oracle.request_decryption(&[handle.0], CallbackSelector::AggregateCallback)?;

    let kind = target.kind();
    let subject = target.subject();
    pending.issue(request_id, kind, subject, now);

    Ok(AggregateDecryptionRequested {
        request_id,
        kind,
        subject,
    })
}

/// Apply a verified reveal answer: write the plaintext mirror and seal the record.
///
/// Honored even if the record was revoked after the request was issued. A
/// second delivery for the same record fails with `AlreadyRevealed`.
#[allow(clippy::too_many_arguments)]
pub fn on_reveal_callback<O: DecryptionOracle>(
    oracle: &O,
    pending: &mut PendingRequest,
    record: &mut CheckinRecord,
    mirror: &mut RevealedCheckin,
    request_id: u64,
    cleartexts: &[u8],
    proof: &[u8; 32],
    now: i64,
) -> Result<CheckinRevealed> {
    require!(
        pending.kind == RequestKind::Reveal
            && pending.request_id == request_id
            && pending.subject == record.id,
        CheckinError::UnknownRequest
    );
    require!(
        oracle.verify_proof(request_id, cleartexts, proof),
        CheckinError::InvalidProof
    );

    let payload = RevealPayload::decode(cleartexts)?;

    require!(!record.is_revealed(), CheckinError::AlreadyRevealed);

    mirror.checkin_id = record.id;
    mirror.category = payload.category.clone();
    mirror.note = payload.note.clone();
    mirror.day = payload.day;
    mirror.revealed_at = now;

    record
        .revealed
        .set()
        .map_err(|_| error!(CheckinError::AlreadyRevealed))?;
    pending.fulfil();

    Ok(CheckinRevealed {
        checkin_id: record.id,
        request_id,
        category: payload.category,
        note: payload.note,
        day: payload.day,
    })
}

/// Surface a verified aggregate count. Counters are not touched.
pub fn on_aggregate_callback<O: DecryptionOracle>(
    oracle: &O,
    pending: &mut PendingRequest,
    request_id: u64,
    cleartexts: &[u8],
    proof: &[u8; 32],
) -> Result<AggregateDecrypted> {
    require!(
        pending.kind.is_aggregate() && pending.is_outstanding(request_id),
        CheckinError::UnknownRequest
    );
    require!(
        oracle.verify_proof(request_id, cleartexts, proof),
        CheckinError::InvalidProof
    );

    let value = decode_count(cleartexts)?;
    pending.fulfil();

    Ok(AggregateDecrypted {
        request_id,
        kind: pending.kind,
        subject: pending.subject,
        value,
    })
}
