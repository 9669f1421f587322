//! Skydrop Bridge Library
//!
//! Core modules for the Skydrop smart-home bridge.

pub mod app;
pub mod auth;
pub mod bus;
pub mod entity;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod poll;
pub mod session;
pub mod setup;
pub mod storage;
pub mod utils;
pub mod workers;
