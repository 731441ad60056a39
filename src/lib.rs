//! Steady-state HOx radical solver
//!
//! Re-exports [`rshox_core`] and, with the `python` feature, builds the
//! `rshox._lib` extension module.

pub use rshox_core::*;

#[cfg(feature = "python")]
mod python;
