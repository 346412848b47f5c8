//! Speech synthesis engines.
//!
//! This module contains implementations of [`crate::SynthesisEngine`].
//!
//! # Available Engines
//!
//! - `espeak` - espeak-ng command-line synthesis (espeak-ng required at runtime)

pub mod espeak;

pub use espeak::{EspeakConfig, EspeakEngine};
