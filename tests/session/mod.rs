//! Session lifecycle integration tests
//!
//! Drive the supervisor through fake connections: backoff timing,
//! generation turnover, fatal connect failures, and operator shutdown.

pub mod reconnect_tests;
pub mod shutdown_tests;
