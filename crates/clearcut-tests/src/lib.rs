//! Integration test crate for ClearCut.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple clearcut crates to verify they work together.

#[cfg(test)]
mod timeline;

#[cfg(test)]
mod properties;

#[cfg(test)]
mod export;
