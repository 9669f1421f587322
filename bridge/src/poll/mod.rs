//! Polling module

pub mod updater;
