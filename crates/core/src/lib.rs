//! fwgate-core
//!
//! Post-build verification for embedded firmware images: a flash/RAM budget
//! analyzer and a coverage gate, both driven by an immutable [`config::VerifyConfig`].
//!
//! External executables (`nm`, `gcovr`) sit behind the [`services::size::SymbolLister`]
//! and [`services::coverage::CoverageTool`] traits so the policy logic can be
//! exercised without them installed.

pub mod config;
pub mod layout;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
