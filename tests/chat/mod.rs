//! Inbound line handling over a live session

pub mod dispatch_tests;
