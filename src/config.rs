//! Configuration file parsing and validation

pub mod decorators_toml;

pub use decorators_toml::{
    CONFIG_FILE, ColorOption, Config, DEFAULT_STANDARD_VERSION, DecoratorsMeta, OutputConfig,
    OutputFormat, PolicyConfig,
};
