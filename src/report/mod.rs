//! Report renderers for scan results.
//!
//! - [`terminal`] — colored summary box and conflict table; respects `--verbose` / `--quiet`.
//!
//! JSON output is the serialized [`license_compat::models::ScanResult`] and needs no renderer.

pub mod terminal;
