//! Entity projection module

pub mod registry;
pub mod switch;
