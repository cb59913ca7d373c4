//! Exit codes for the CLI

#![allow(dead_code)]

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// One or more capabilities failed but every target completed
pub const CAPABILITY_FAILURES: i32 = 3;

/// One or more targets failed fatally
pub const TARGET_FAILURES: i32 = 4;
