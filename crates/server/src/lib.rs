//! Seedline Server - HTTP ingestion and reporting API
//!
//! Exposes the seedline ingestion pipeline over REST:
//!
//! - **Bulk ingestion**: customers (validated, secret-derived on a bounded
//!   worker pool, duplicates skipped) and transactions
//! - **Reporting**: limited listings, trailing-12-month totals, per-customer
//!   date-range queries
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /customers/multi` - Bulk-create customers, `201` with counts
//! - `GET /customers` - All customers with trailing-12-month totals
//! - `GET /customers/limit/{num}` - At most `num` customers
//! - `DELETE /customers/reset` - Remove all customers and transactions
//! - `POST /transactions/multi` - Bulk-create transactions, `201` with counts
//! - `GET /customers/{id}/transactions/date?from=&to=` - Date-range query
//! - `GET /`, `/health`, `/ready`, `/metrics`, `/metadata`

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
