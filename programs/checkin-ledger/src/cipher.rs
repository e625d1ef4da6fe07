//! Ciphertext handles and the homomorphic engine boundary.
//!
//! The ledger never decrypts anything. It stores 32-byte handles and asks a
//! [`CipherEngine`] to combine them. On-chain the engine is symbolic: every
//! operation yields a fresh handle and a [`CipherOpRecorded`] event, and the
//! off-chain coprocessor evaluates the resulting operation graph.

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use crate::events::CipherOpRecorded;

/// Domain separator for symbolic handle derivation.
pub const HANDLE_DOMAIN: &[u8] = b"checkin-ledger/handle";

/// Opaque reference to an encrypted integer or boolean.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct CipherHandle(pub [u8; 32]);

impl CipherHandle {
    pub const LEN: usize = 32;

    /// The all-zero handle; never produced by an engine.
    pub const UNSET: Self = Self([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for CipherHandle {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Operations the engine knows how to evaluate. The discriminant is the
/// `op` byte carried by [`CipherOpRecorded`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum CipherOp {
    TrivialU64 = 0,
    TrivialBool = 1,
    Add = 2,
    Sub = 3,
}

/// Homomorphic arithmetic over opaque handles.
pub trait CipherEngine {
    fn encrypt_u64(&mut self, value: u64) -> CipherHandle;

    fn encrypt_bool(&mut self, value: bool) -> CipherHandle;

    fn add(&mut self, lhs: &CipherHandle, rhs: &CipherHandle) -> CipherHandle;

    fn sub(&mut self, lhs: &CipherHandle, rhs: &CipherHandle) -> CipherHandle;

    fn is_initialized(&self, handle: &CipherHandle) -> bool {
        *handle != CipherHandle::UNSET
    }

    fn to_transport(&self, handle: &CipherHandle) -> [u8; 32] {
        handle.0
    }
}

/// On-chain engine deriving handles as
/// `sha256(domain || op || lhs || rhs || clear || nonce)`.
pub struct SymbolicEngine {
    nonce: u64,
    ops: Vec<CipherOpRecorded>,
}

impl SymbolicEngine {
    pub fn new(nonce: u64) -> Self {
        Self {
            nonce,
            ops: Vec::new(),
        }
    }

    /// Nonce to persist back into the ledger config.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Operations recorded since construction, in evaluation order.
    pub fn drain_ops(&mut self) -> Vec<CipherOpRecorded> {
        std::mem::take(&mut self.ops)
    }

    fn derive(
        &mut self,
        op: CipherOp,
        lhs: &CipherHandle,
        rhs: &CipherHandle,
        clear: u64,
    ) -> CipherHandle {
        let nonce = self.nonce;
        // wraps after 2^64 operations; handles stay distinct through the op tag and operands
        self.nonce = self.nonce.wrapping_add(1);

        let result = CipherHandle(
            hashv(&[
                HANDLE_DOMAIN,
                &[op as u8],
                &lhs.0,
                &rhs.0,
                &clear.to_le_bytes(),
                &nonce.to_le_bytes(),
            ])
            .to_bytes(),
        );

        self.ops.push(CipherOpRecorded {
            op: op as u8,
            lhs: lhs.0,
            rhs: rhs.0,
            clear,
            result: result.0,
        });

        result
    }
}

impl CipherEngine for SymbolicEngine {
    fn encrypt_u64(&mut self, value: u64) -> CipherHandle {
        self.derive(
            CipherOp::TrivialU64,
            &CipherHandle::UNSET,
            &CipherHandle::UNSET,
            value,
        )
    }

    fn encrypt_bool(&mut self, value: bool) -> CipherHandle {
        self.derive(
            CipherOp::TrivialBool,
            &CipherHandle::UNSET,
            &CipherHandle::UNSET,
            value as u64,
        )
    }

    fn add(&mut self, lhs: &CipherHandle, rhs: &CipherHandle) -> CipherHandle {
        self.derive(CipherOp::Add, lhs, rhs, 0)
    }

    fn sub(&mut self, lhs: &CipherHandle, rhs: &CipherHandle) -> CipherHandle {
        self.derive(CipherOp::Sub, lhs, rhs, 0)
    }
}
