//! # Preprocessing
//! ## The Big Picture
//!
//! `segmenta-preprocessing` is a crate in the `segmenta` ecosystem, a collection of crates
//! for unsupervised segmentation of tabular data.
//!
//! ## Current state
//! `segmenta-preprocessing` provides a pure Rust implementation of:
//! * Standard scaling
//! * Min-max scaling, optionally into a custom range
//!
//! Both scalers treat features without any variation as constant: they are never divided by a
//! zero spread and end up at the lower end of the target range.

pub mod error;
pub mod linear_scaling;

pub use error::{PreprocessingError, Result};
pub use linear_scaling::{FittedLinearScaler, LinearScaler, ScalingMethod};
