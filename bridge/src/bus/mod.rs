//! Update signal bus

pub mod dispatcher;
