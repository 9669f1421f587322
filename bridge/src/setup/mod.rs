//! Setup module

pub mod wizard;
