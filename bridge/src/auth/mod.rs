//! Authentication module

pub mod configurator;
pub mod login;
pub mod store;
pub mod tokens;
