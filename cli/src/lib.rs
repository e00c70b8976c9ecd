//! Bia CLI library.
//!
//! This crate provides the command-line host for the Bia runtime bridge.
//! The public modules are primarily exposed for testing purposes.

pub mod cli;
pub mod commands;
pub mod common;
