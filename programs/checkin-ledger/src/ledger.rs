//! Check-in record store and aggregate counter maintenance.
//!
//! Every function validates before it mutates, so a failed call leaves the
//! accounts it was handed untouched.

use anchor_lang::prelude::*;

use crate::cipher::CipherEngine;
use crate::errors::CheckinError;
use crate::events::{AggregatesBumped, CheckinRevoked, CheckinSubmitted};
use crate::state::{
    ensure_known, AggregateCounter, AggregateIndex, CheckinRecord, CounterKind, EncryptedFields,
    GuardrailEntry, LedgerConfig,
};

/// Store a new encrypted check-in and count it in the global total.
///
/// The clear `clear_day` only feeds the one-per-day guardrail; nothing ties
/// it to the encrypted `fields.day`.
#[allow(clippy::too_many_arguments)]
pub fn submit_checkin<E: CipherEngine>(
    engine: &mut E,
    config: &mut LedgerConfig,
    index: &mut AggregateIndex,
    guardrail: &mut GuardrailEntry,
    record: &mut CheckinRecord,
    submitter: Pubkey,
    fields: EncryptedFields,
    clear_day: u32,
    now: i64,
) -> Result<CheckinSubmitted> {
    require!(
        guardrail.may_accept(clear_day),
        CheckinError::DuplicateSubmission
    );
    require!(
        engine.is_initialized(&fields.category)
            && engine.is_initialized(&fields.note)
            && engine.is_initialized(&fields.day),
        CheckinError::InvalidCiphertext
    );

    let id = config.allocate_checkin_id()?;

    record.id = id;
    record.submitter = submitter;
    record.category = fields.category;
    record.note = fields.note;
    record.day = fields.day;
    record.created_at = now;
    record.revoked = engine.encrypt_bool(false);

    index.increment_global(engine);
    guardrail.record(submitter, clear_day);

    Ok(CheckinSubmitted {
        checkin_id: id,
        submitter,
        created_at: now,
    })
}

/// Count one contribution under a clear category code and day bucket.
///
/// Creates either counter on first use. Always increments: bumping the same
/// keys twice counts twice.
pub fn bump_aggregates<E: CipherEngine>(
    engine: &mut E,
    index: &mut AggregateIndex,
    category_counter: &mut AggregateCounter,
    day_counter: &mut AggregateCounter,
    clear_category: u32,
    clear_day: u32,
) -> Result<AggregatesBumped> {
    require!(
        index.can_register(CounterKind::Category, clear_category)
            && index.can_register(CounterKind::Day, clear_day),
        CheckinError::KeyCapacityExceeded
    );
    for (counter, kind, key) in [
        (&*category_counter, CounterKind::Category, clear_category),
        (&*day_counter, CounterKind::Day, clear_day),
    ] {
        require!(
            !counter.is_known() || counter.matches(kind, key),
            CheckinError::CounterMismatch
        );
    }

    ensure_known(
        engine,
        index,
        category_counter,
        CounterKind::Category,
        clear_category,
    )?;
    ensure_known(engine, index, day_counter, CounterKind::Day, clear_day)?;

    category_counter.increment(engine)?;
    day_counter.increment(engine)?;

    Ok(AggregatesBumped {
        category: clear_category,
        day: clear_day,
    })
}

/// Revoke a record and withdraw it from every aggregate it was counted in.
///
/// Keyed counters are decremented only when the index knows their key; a
/// key that was never bumped is skipped. A known key must come with its
/// counter so a caller cannot dodge the decrement by omitting it.
#[allow(clippy::too_many_arguments)]
pub fn revoke_checkin<E: CipherEngine>(
    engine: &mut E,
    index: &mut AggregateIndex,
    record: &mut CheckinRecord,
    mut category_counter: Option<&mut AggregateCounter>,
    mut day_counter: Option<&mut AggregateCounter>,
    clear_category: u32,
    clear_day: u32,
    caller: Pubkey,
) -> Result<CheckinRevoked> {
    require_keys_eq!(caller, record.submitter, CheckinError::NotAuthorized);
    require!(!record.is_revoked(), CheckinError::AlreadyRevoked);

    for (counter, kind, key) in [
        (category_counter.as_deref(), CounterKind::Category, clear_category),
        (day_counter.as_deref(), CounterKind::Day, clear_day),
    ] {
        match counter {
            Some(counter) if counter.is_known() => {
                require!(counter.matches(kind, key), CheckinError::CounterMismatch)
            }
            _ => require!(
                !index.is_known(kind, key),
                CheckinError::CounterAccountMissing
            ),
        }
    }

    record
        .revocation
        .set()
        .map_err(|_| error!(CheckinError::AlreadyRevoked))?;
    record.revoked = engine.encrypt_bool(true);

    index.decrement_global(engine);
    for counter in [category_counter.as_deref_mut(), day_counter.as_deref_mut()]
        .into_iter()
        .flatten()
    {
        if counter.is_known() {
            counter.decrement(engine)?;
        }
    }

    Ok(CheckinRevoked {
        checkin_id: record.id,
        submitter: record.submitter,
    })
}
