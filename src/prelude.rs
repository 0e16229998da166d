//! Segmenta prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::dataset::{DatasetBase, Float, Records};

#[doc(no_inline)]
pub use crate::metrics_clustering::{CalinskiHarabaszScore, DaviesBouldinScore, SilhouetteScore};

#[doc(no_inline)]
pub use crate::correlation::PearsonCorrelation;
