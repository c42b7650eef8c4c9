//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per table; all public functions are re-exported here.

mod action_log;
mod doctor;
mod feature_flag;
mod medicine;
mod reminder;
mod user;

pub use action_log::*;
pub use doctor::*;
pub use feature_flag::*;
pub use medicine::*;
pub use reminder::*;
pub use user::*;
