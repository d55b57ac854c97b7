//! Test utilities for prompt-decorators integration tests

#![allow(dead_code)]

use prompt_decorators::registry::{RegistryBuilder, RegistrySnapshot};
use prompt_decorators::version::Version;
use std::path::PathBuf;

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Extract Some value or panic with context
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(v) => v,
            None => panic!("assertion failed: expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(v) => v,
            None => panic!("{}: got None", $msg),
        }
    };
}

/// The checked-in fixture registry
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("decorators")
}

/// Fixture registry loaded under the given standard version
pub fn fixture_snapshot(standard: Version) -> RegistrySnapshot {
    let mut builder = RegistryBuilder::new(standard);
    assert_ok!(builder.load_dir(&fixtures_dir()), "fixture registry should load");
    builder.build()
}

/// Fixture registry under standard 1.0.0
pub fn default_snapshot() -> RegistrySnapshot {
    fixture_snapshot(Version::new(1, 0, 0))
}
