//! Geotrail - adaptive location tracking with offline buffering
//!
//! A tracker samples the wearer's position on a timer, uploads it to a remote
//! store when they have moved, and backs off when they stand still or the
//! network is down. Samples that can't be delivered wait in a bounded
//! offline buffer and are drained in batches once the store is reachable
//! again.
//!
//! # Layout
//!
//! - [`upload`]: the controller state machine, offline buffer, interval policy
//! - [`session`]: the task that owns a controller and drives it from a
//!   [`source::LocationSource`]
//! - [`store`], [`stats`], [`clock`]: the collaborators the controller talks to
//! - [`config`], [`logging`]: ambient setup used by the CLI

pub mod clock;
pub mod config;
pub mod location;
pub mod logging;
pub mod session;
pub mod source;
pub mod stats;
pub mod store;
pub mod upload;

/// Version of the library, as declared in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
