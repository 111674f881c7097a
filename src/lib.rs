//! ==============================================================================
//! lib.rs - proximity host
//! ==============================================================================
//!
//! periodically scans for ble beacons, tiers each by signal strength, and
//! keeps the latest snapshot plus a bounded scan history for the dashboard.
//!
//! ```text
//!     scanner ──► controller ──► ScanState ◄── web
//!                   │   ▲
//!            proximity  clock
//! ```
//!
//! ==============================================================================

pub mod clock;
pub mod config;
pub mod controller;
pub mod domain;
pub mod proximity;
pub mod scanner;
pub mod web;
