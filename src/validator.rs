#![forbid(unsafe_code)]

//! Parameter validation and typed values

pub mod parameter_validator;
pub mod value;

pub use parameter_validator::{
    ParameterValidator, ResolvedDirective, ResolvedValue, Validated, ValidationMode, coerce,
};
pub use value::{TypedValue, format_number};
