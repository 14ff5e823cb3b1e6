//! Test module organization.
//!
//! This module organizes all integration tests for the DRAM channel simulator.





/// Configuration parsing and validation tests.
mod config_tests;


/// End-to-end simulation tests.
mod integration_tests;


/// Command queue and admission policy tests.
mod queue_tests;
