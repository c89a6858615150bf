//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible draws.
//! CRITICAL: All simulated detector noise MUST go through this module so that
//! two runs over the same check produce the same verdicts.

mod xorshift;

pub use xorshift::RngManager;
