#![doc = include_str!("../README.md")]

mod error;
mod pca;

pub use error::{ReductionError, Result};
pub use pca::{Pca, PcaParams, PcaValidParams};
