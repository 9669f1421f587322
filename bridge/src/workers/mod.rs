//! Background workers

pub mod poller;
pub mod renderer;
