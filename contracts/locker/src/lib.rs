pub mod execute;
pub mod instantiate;
pub mod query;
pub mod state;

pub mod error;

mod delegation;
mod epochs;
mod ledger;
mod rewards;
