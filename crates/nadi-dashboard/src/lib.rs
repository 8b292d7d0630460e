//! Data access for the NADI admin dashboard
//!
//! Ties the data model, the data source and the query cache together:
//!
//! - [`queries`]: one query wrapper per list view and one mutation wrapper
//!   per write, each taking the data source explicitly
//! - [`keys`]: the query-key scheme mutations invalidate by
//! - [`AppContext`]: the explicitly constructed source, cache and notifier
//! - [`Dashboard`]: observers and access-checked mutations for one session
//! - [`DashboardConfig`]: TOML configuration with environment overrides
//!
//! # Example
//!
//! ```rust,ignore
//! let config = DashboardConfig::load(Some(Path::new("nadi.toml")))?;
//! let context = AppContext::from_config(&config)?;
//! let dashboard = Dashboard::new(context.clone(), config.session()?);
//!
//! let mut closures = dashboard.closures(Some(site), ClosureRange::all());
//! let view = closures.settled().await;
//!
//! dashboard.create_closure(NewClosure::new(Some(site), "Raya", start, end)).await?;
//! let view = closures.settled_after(view.revision).await;
//!
//! context.shutdown();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod keys;
pub mod queries;
pub mod telemetry;

pub use config::{ConfigError, DashboardConfig, LoggingConfig};
pub use context::AppContext;
pub use dashboard::Dashboard;
pub use error::{MutationError, RemoteFetchError, RemoteWriteError, WriteOp};
pub use telemetry::init_tracing;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
