//! Relay CLI library: command implementations behind the `relay` binary.

pub mod commands;
