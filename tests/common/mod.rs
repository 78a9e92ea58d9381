//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod fake_shell;
pub mod test_server;
