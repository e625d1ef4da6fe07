pub mod aggregate;
pub mod checkin;
pub mod config;
pub mod flag;
pub mod guardrail;
pub mod pending;

pub use aggregate::*;
pub use checkin::*;
pub use config::*;
pub use flag::*;
pub use guardrail::*;
pub use pending::*;
