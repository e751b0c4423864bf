//! Disease likelihood estimation from a medication list.
//!
//! A small random forest is trained on the sample records, then its
//! per-disease probabilities are adjusted with the medication → disease
//! reference table (duration and adherence scaling, plus diseases the
//! forest never saw).

pub mod engine;
pub mod features;
pub mod forest;
pub mod reference;
pub mod types;

pub use engine::DiseasePredictionModel;
pub use reference::{DiseaseMapping, ReferenceData};
pub use types::*;
