//! Seedline Generator - synthetic data front end for `seedline-server`
//!
//! - `POST /generate/customer?num=N` runs the adaptive retry loop: generate
//!   `N` customers, submit them, regenerate exactly the failed count until
//!   nothing fails or progress stalls for `stagnation_limit` rounds.
//! - `POST /generate/transactions?transactions_num=&customers_num=` fetches a
//!   customer pool from the backend, generates transactions over it in
//!   parallel and submits them in batches.

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use client::BackendClient;
pub use config::GeneratorConfig;
pub use error::{GeneratorError, GeneratorResult};
pub use server::{build_router, start_server};
pub use state::GeneratorState;
