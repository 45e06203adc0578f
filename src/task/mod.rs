//! Task lifecycle management.
//!
//! Tasks are created active with a title and an activation date, listed by
//! status with a weekend annotation, edited, marked done, and deleted. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
