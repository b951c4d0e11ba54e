//! Election state machine, vote bookkeeping and review projections for the
//! Data Access Committee.

pub mod services;

pub use services::*;
