//! Common library for the daily check-in services
//!
//! This crate provides the functionality shared by the API and the notifier:
//! the domain models, the attendance engine with its storage and clock
//! seams, database and Redis connectivity, and error handling.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use common::{
//!     attendance::AttendanceEngine,
//!     clock::SystemClock,
//!     database::{DatabaseConfig, init_pool},
//!     store::PgAttendanceStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_pool(&DatabaseConfig::from_env()?).await?;
//!     let engine = AttendanceEngine::new(
//!         Arc::new(PgAttendanceStore::new(pool)),
//!         Arc::new(SystemClock),
//!     );
//!     for missed in engine.list_users_who_missed_yesterday().await? {
//!         println!("{} has {} contacts", missed.user.username, missed.contacts.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod attendance;
pub mod cache;
pub mod clock;
pub mod database;
pub mod error;
pub mod models;
pub mod store;
