//! Todo list: a task-tracking HTTP service.
//!
//! Clients create, list, update, mark done and delete tasks, each carrying a
//! title and a scheduled activation date.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: task records, titles, dates and identifiers
//! - **Ports**: the storage trait the lifecycle service depends on
//! - **Adapters**: in-memory and `PostgreSQL` storage
//!
//! # Modules
//!
//! - [`task`]: task lifecycle and query layer
//! - [`http`]: axum router over the lifecycle service
//! - [`config`]: YAML configuration with environment overrides
//! - [`telemetry`]: explicitly constructed logger handle

pub mod config;
pub mod http;
pub mod task;
pub mod telemetry;
