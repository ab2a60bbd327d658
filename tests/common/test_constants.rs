//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Project identifier used by scripted lifecycle runs.
pub const PROJECT_ID: &str = "11111111-2222-3333-4444-555555555555";

/// Distribution selected when no override is provided.
pub const DEFAULT_DISTRO: &str = "ubuntu";

/// Plan class selected when no override is provided.
pub const DEFAULT_PLAN_CLASS: &str = "c2.medium.x86";

/// Facility feature selected when no override is provided.
pub const DEFAULT_FACILITY_FEATURE: &str = "global_ipv4";
