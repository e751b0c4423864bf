pub mod enums;
pub mod medication;

pub use enums::*;
pub use medication::*;

/// Errors raised while interpreting model values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
