use anchor_lang::prelude::*;

/// One-way latch: starts unset and can be set exactly once.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct OnceFlag {
    set: bool,
}

/// Returned by [`OnceFlag::set`] when the latch was already set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AlreadySet;

impl OnceFlag {
    pub const SIZE: usize = 1;

    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn set(&mut self) -> std::result::Result<(), AlreadySet> {
        if self.set {
            return Err(AlreadySet);
        }
        self.set = true;
        Ok(())
    }
}
