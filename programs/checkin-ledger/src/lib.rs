use anchor_lang::prelude::*;

pub mod cipher;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod oracle;
pub mod pda;
pub mod router;
pub mod state;

use cipher::{CipherEngine, CipherHandle, SymbolicEngine};
use errors::CheckinError;
use oracle::GatewayOracle;
use state::{
    AggregateCounter, AggregateIndex, AggregateTarget, CheckinRecord, CounterKind,
    EncryptedFields, GuardrailEntry, LedgerConfig, PendingRequest, RequestKind, RevealedCheckin,
};

declare_id!("4qnzGYvhNuytgfSxarB6cRqs453ostgbvtCGk9JGt2qP");

#[program]
pub mod checkin_ledger {
    use super::*;

    // ============================================================
    // Setup & Administration
    // ============================================================

    pub fn initialize(ctx: Context<Initialize>, gateway: Pubkey) -> Result<()> {
        require!(gateway != Pubkey::default(), CheckinError::InvalidTarget);

        let mut engine = SymbolicEngine::new(0);
        let global_counter = engine.encrypt_u64(0);

        let mut config = LedgerConfig::new(ctx.accounts.owner.key(), gateway, ctx.bumps.config);
        config.cipher_nonce = engine.nonce();
        ctx.accounts.config.set_inner(config);
        ctx.accounts
            .index
            .set_inner(AggregateIndex::new(global_counter, ctx.bumps.index));

        emit_cipher_ops(&mut engine);
        msg!("Ledger initialized with gateway {}", gateway);

        Ok(())
    }

    pub fn transfer_ownership(ctx: Context<UpdateConfig>, new_owner: Pubkey) -> Result<()> {
        let event = ctx
            .accounts
            .config
            .transfer_ownership(ctx.accounts.owner.key(), new_owner)?;

        msg!("Ownership transferred to {}", new_owner);
        emit!(event);

        Ok(())
    }

    pub fn set_gateway(ctx: Context<UpdateConfig>, new_gateway: Pubkey) -> Result<()> {
        let event = ctx
            .accounts
            .config
            .set_gateway(ctx.accounts.owner.key(), new_gateway)?;

        msg!("Gateway rotated to {}", new_gateway);
        emit!(event);

        Ok(())
    }

    // ============================================================
    // Check-in Ledger
    // ============================================================

    pub fn submit_checkin(
        ctx: Context<SubmitCheckin>,
        category: CipherHandle,
        note: CipherHandle,
        day: CipherHandle,
        clear_day: u32,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let mut engine = SymbolicEngine::new(ctx.accounts.config.cipher_nonce);

        let event = ledger::submit_checkin(
            &mut engine,
            &mut ctx.accounts.config,
            &mut ctx.accounts.index,
            &mut ctx.accounts.guardrail,
            &mut ctx.accounts.record,
            ctx.accounts.submitter.key(),
            EncryptedFields {
                category,
                note,
                day,
            },
            clear_day,
            now,
        )?;

        ctx.accounts.guardrail.bump = ctx.bumps.guardrail;
        ctx.accounts.record.bump = ctx.bumps.record;
        ctx.accounts.config.cipher_nonce = engine.nonce();

        emit_cipher_ops(&mut engine);
        msg!("Check-in {} submitted", event.checkin_id);
        emit!(event);

        Ok(())
    }

    pub fn bump_aggregates(
        ctx: Context<BumpAggregates>,
        clear_category: u32,
        clear_day: u32,
    ) -> Result<()> {
        let mut engine = SymbolicEngine::new(ctx.accounts.config.cipher_nonce);

        let event = ledger::bump_aggregates(
            &mut engine,
            &mut ctx.accounts.index,
            &mut ctx.accounts.category_counter,
            &mut ctx.accounts.day_counter,
            clear_category,
            clear_day,
        )?;

        ctx.accounts.category_counter.bump = ctx.bumps.category_counter;
        ctx.accounts.day_counter.bump = ctx.bumps.day_counter;
        ctx.accounts.config.cipher_nonce = engine.nonce();

        emit_cipher_ops(&mut engine);
        msg!("Aggregates bumped for category {} day {}", clear_category, clear_day);
        emit!(event);

        Ok(())
    }

    pub fn revoke_checkin(
        ctx: Context<RevokeCheckin>,
        checkin_id: u64,
        clear_category: u32,
        clear_day: u32,
    ) -> Result<()> {
        let mut engine = SymbolicEngine::new(ctx.accounts.config.cipher_nonce);

        let event = ledger::revoke_checkin(
            &mut engine,
            &mut ctx.accounts.index,
            &mut ctx.accounts.record,
            ctx.accounts.category_counter.as_deref_mut(),
            ctx.accounts.day_counter.as_deref_mut(),
            clear_category,
            clear_day,
            ctx.accounts.submitter.key(),
        )?;

        ctx.accounts.config.cipher_nonce = engine.nonce();

        emit_cipher_ops(&mut engine);
        msg!("Check-in {} revoked", checkin_id);
        emit!(event);

        Ok(())
    }

    // ============================================================
    // Decryption Requests
    // ============================================================

    pub fn request_reveal(ctx: Context<RequestReveal>, checkin_id: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let mut oracle = GatewayOracle::new(
            ctx.accounts.config.gateway,
            ctx.accounts.submitter.key(),
            ctx.accounts.config.next_request_id,
        );

        let event = router::request_reveal(
            &mut oracle,
            &ctx.accounts.record,
            &mut ctx.accounts.pending,
            ctx.accounts.submitter.key(),
            now,
        )?;

        ctx.accounts.pending.bump = ctx.bumps.pending;
        ctx.accounts.config.next_request_id = oracle.next_request_id();

        emit_decryption_requests(&mut oracle);
        msg!(
            "Reveal of check-in {} requested as {}",
            checkin_id,
            event.request_id
        );
        emit!(event);

        Ok(())
    }

    pub fn request_aggregate(ctx: Context<RequestAggregate>, target: AggregateTarget) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let mut oracle = GatewayOracle::new(
            ctx.accounts.config.gateway,
            ctx.accounts.requester.key(),
            ctx.accounts.config.next_request_id,
        );

        let event = router::request_aggregate(
            &mut oracle,
            &ctx.accounts.index,
            target,
            ctx.accounts.counter.as_deref(),
            &mut ctx.accounts.pending,
            now,
        )?;

        ctx.accounts.pending.bump = ctx.bumps.pending;
        ctx.accounts.config.next_request_id = oracle.next_request_id();

        emit_decryption_requests(&mut oracle);
        msg!("Aggregate {:?} requested as {}", target, event.request_id);
        emit!(event);

        Ok(())
    }

    // ============================================================
    // Gateway Callbacks
    // ============================================================

    pub fn reveal_callback(
        ctx: Context<RevealCallback>,
        request_id: u64,
        cleartexts: Vec<u8>,
        proof: [u8; 32],
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let oracle = GatewayOracle::new(
            ctx.accounts.config.gateway,
            ctx.accounts.gateway.key(),
            ctx.accounts.config.next_request_id,
        );

        let event = router::on_reveal_callback(
            &oracle,
            &mut ctx.accounts.pending,
            &mut ctx.accounts.record,
            &mut ctx.accounts.revealed,
            request_id,
            &cleartexts,
            &proof,
            now,
        )?;

        ctx.accounts.revealed.bump = ctx.bumps.revealed;

        msg!("Check-in {} revealed", event.checkin_id);
        emit!(event);

        Ok(())
    }

    pub fn aggregate_callback(
        ctx: Context<AggregateCallback>,
        request_id: u64,
        cleartexts: Vec<u8>,
        proof: [u8; 32],
    ) -> Result<()> {
        let oracle = GatewayOracle::new(
            ctx.accounts.config.gateway,
            ctx.accounts.gateway.key(),
            ctx.accounts.config.next_request_id,
        );

        let event = router::on_aggregate_callback(
            &oracle,
            &mut ctx.accounts.pending,
            request_id,
            &cleartexts,
            &proof,
        )?;

        msg!(
            "Aggregate {:?}/{} decrypted: {}",
            event.kind,
            event.subject,
            event.value
        );
        emit!(event);

        Ok(())
    }
}

fn emit_cipher_ops(engine: &mut SymbolicEngine) {
    for op in engine.drain_ops() {
        emit!(op);
    }
}

fn emit_decryption_requests(oracle: &mut GatewayOracle) {
    for request in oracle.drain_requests() {
        emit!(request);
    }
}

// ============================================================
// Account Contexts - Setup & Administration
// ============================================================

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = LedgerConfig::SIZE,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        init,
        payer = owner,
        space = AggregateIndex::SIZE,
        seeds = [AggregateIndex::SEED_PREFIX],
        bump,
    )]
    pub index: Account<'info, AggregateIndex>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,
}

// ============================================================
// Account Contexts - Check-in Ledger
// ============================================================

#[derive(Accounts)]
pub struct SubmitCheckin<'info> {
    #[account(mut)]
    pub submitter: Signer<'info>,

    #[account(
        mut,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        mut,
        seeds = [AggregateIndex::SEED_PREFIX],
        bump = index.bump,
    )]
    pub index: Box<Account<'info, AggregateIndex>>,

    #[account(
        init_if_needed,
        payer = submitter,
        space = GuardrailEntry::SIZE,
        seeds = [GuardrailEntry::SEED_PREFIX, submitter.key().as_ref()],
        bump,
    )]
    pub guardrail: Account<'info, GuardrailEntry>,

    #[account(
        init,
        payer = submitter,
        space = CheckinRecord::SIZE,
        seeds = [CheckinRecord::SEED_PREFIX, config.next_checkin_id.to_le_bytes().as_ref()],
        bump,
    )]
    pub record: Account<'info, CheckinRecord>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(clear_category: u32, clear_day: u32)]
pub struct BumpAggregates<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        mut,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        mut,
        seeds = [AggregateIndex::SEED_PREFIX],
        bump = index.bump,
    )]
    pub index: Box<Account<'info, AggregateIndex>>,

    #[account(
        init_if_needed,
        payer = payer,
        space = AggregateCounter::SIZE,
        seeds = [
            AggregateCounter::SEED_PREFIX,
            CounterKind::Category.seed(),
            clear_category.to_le_bytes().as_ref()
        ],
        bump,
    )]
    pub category_counter: Account<'info, AggregateCounter>,

    #[account(
        init_if_needed,
        payer = payer,
        space = AggregateCounter::SIZE,
        seeds = [
            AggregateCounter::SEED_PREFIX,
            CounterKind::Day.seed(),
            clear_day.to_le_bytes().as_ref()
        ],
        bump,
    )]
    pub day_counter: Account<'info, AggregateCounter>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(checkin_id: u64, clear_category: u32, clear_day: u32)]
pub struct RevokeCheckin<'info> {
    pub submitter: Signer<'info>,

    #[account(
        mut,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        mut,
        seeds = [AggregateIndex::SEED_PREFIX],
        bump = index.bump,
    )]
    pub index: Box<Account<'info, AggregateIndex>>,

    #[account(
        mut,
        seeds = [CheckinRecord::SEED_PREFIX, checkin_id.to_le_bytes().as_ref()],
        bump = record.bump,
    )]
    pub record: Account<'info, CheckinRecord>,

    /// Required whenever the category code is known to the index
    #[account(
        mut,
        seeds = [
            AggregateCounter::SEED_PREFIX,
            CounterKind::Category.seed(),
            clear_category.to_le_bytes().as_ref()
        ],
        bump,
    )]
    pub category_counter: Option<Account<'info, AggregateCounter>>,

    /// Required whenever the day bucket is known to the index
    #[account(
        mut,
        seeds = [
            AggregateCounter::SEED_PREFIX,
            CounterKind::Day.seed(),
            clear_day.to_le_bytes().as_ref()
        ],
        bump,
    )]
    pub day_counter: Option<Account<'info, AggregateCounter>>,
}

// ============================================================
// Account Contexts - Decryption Requests
// ============================================================

#[derive(Accounts)]
#[instruction(checkin_id: u64)]
pub struct RequestReveal<'info> {
    #[account(mut)]
    pub submitter: Signer<'info>,

    #[account(
        mut,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        seeds = [CheckinRecord::SEED_PREFIX, checkin_id.to_le_bytes().as_ref()],
        bump = record.bump,
    )]
    pub record: Account<'info, CheckinRecord>,

    #[account(
        init,
        payer = submitter,
        space = PendingRequest::SIZE,
        seeds = [PendingRequest::SEED_PREFIX, config.next_request_id.to_le_bytes().as_ref()],
        bump,
    )]
    pub pending: Account<'info, PendingRequest>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RequestAggregate<'info> {
    #[account(mut)]
    pub requester: Signer<'info>,

    #[account(
        mut,
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        seeds = [AggregateIndex::SEED_PREFIX],
        bump = index.bump,
    )]
    pub index: Box<Account<'info, AggregateIndex>>,

    /// Keyed counter for category/day targets; checked against the target
    pub counter: Option<Account<'info, AggregateCounter>>,

    #[account(
        init,
        payer = requester,
        space = PendingRequest::SIZE,
        seeds = [PendingRequest::SEED_PREFIX, config.next_request_id.to_le_bytes().as_ref()],
        bump,
    )]
    pub pending: Account<'info, PendingRequest>,

    pub system_program: Program<'info, System>,
}

// ============================================================
// Account Contexts - Gateway Callbacks
// ============================================================

#[derive(Accounts)]
#[instruction(request_id: u64)]
pub struct RevealCallback<'info> {
    /// Must be the configured gateway for the proof to verify
    #[account(mut)]
    pub gateway: Signer<'info>,

    #[account(
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        mut,
        seeds = [PendingRequest::SEED_PREFIX, request_id.to_le_bytes().as_ref()],
        bump = pending.bump,
        constraint = pending.kind == RequestKind::Reveal @ CheckinError::UnknownRequest,
    )]
    pub pending: Account<'info, PendingRequest>,

    #[account(
        mut,
        seeds = [CheckinRecord::SEED_PREFIX, pending.subject.to_le_bytes().as_ref()],
        bump = record.bump,
    )]
    pub record: Account<'info, CheckinRecord>,

    /// Left in place by an earlier answer; the record latch rejects a second one
    #[account(
        init_if_needed,
        payer = gateway,
        space = RevealedCheckin::SIZE,
        seeds = [RevealedCheckin::SEED_PREFIX, pending.subject.to_le_bytes().as_ref()],
        bump,
    )]
    pub revealed: Account<'info, RevealedCheckin>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(request_id: u64)]
pub struct AggregateCallback<'info> {
    /// Must be the configured gateway for the proof to verify
    pub gateway: Signer<'info>,

    #[account(
        seeds = [LedgerConfig::SEED_PREFIX],
        bump = config.bump,
    )]
    pub config: Account<'info, LedgerConfig>,

    #[account(
        mut,
        seeds = [PendingRequest::SEED_PREFIX, request_id.to_le_bytes().as_ref()],
        bump = pending.bump,
        constraint = pending.kind.is_aggregate() @ CheckinError::UnknownRequest,
    )]
    pub pending: Account<'info, PendingRequest>,
}
