//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the service is up.
//!
//! # Tasks
//! - Index maintenance: delivers pending expirations and prunes stale keys

mod maintenance;

pub use maintenance::spawn_maintenance_task;
