//! # Pet Scout Sighting Board
//!
//! ## Overview
//! This library implements a transient, in-memory bulletin board that lets many
//! independent game clients crowdsource sightings of valuable pets tied to
//! specific server instances, and lets other clients query for the best
//! currently-known instance matching a name/value filter.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `store`: the report store with time-based expiry, ranked search, and statistics
//! - `sweeper`: periodic background task reclaiming expired reports
//! - `api`: REST API endpoints translating HTTP requests into store calls
//! - `config`: configuration management and settings
//! - `errors`: centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: sighting reports (JSON), search queries (query strings)
//! - **Output**: ranked server-instance matches with derived report ages
//! - **Lifetime**: everything is volatile; the board resets on process restart
//!
//! ## Usage
//! ```rust,no_run
//! use pet_scout::store::{NewReport, ReportStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = ReportStore::new();
//!     store
//!         .insert(NewReport {
//!             job_id: "srv-1".to_string(),
//!             pet_name: "Giant Cat".to_string(),
//!             value: 1_500_000.0,
//!             player_name: "Scout".to_string(),
//!         })
//!         .await;
//!     let outcome = store.search("cat", 0.0).await;
//!     println!("Found {} matches", outcome.total_matches);
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod errors;
pub mod store;
pub mod sweeper;

// Re-exports for convenience
pub use config::Config;
pub use errors::{Result, ScoutError};
pub use store::{NewReport, ReportStore, SearchOutcome, StatsSnapshot};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One timestamped sighting of a named pet inside a specific server instance.
///
/// Created only by a successful insert, never mutated, and destroyed only by
/// expiry sweep or an explicit clear. Wire field names are camelCase for
/// compatibility with the game clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Opaque identifier of the server instance the pet was sighted in
    pub job_id: String,
    /// Pet name as reported; matched case-insensitively as a substring
    pub pet_name: String,
    /// Reported value score
    pub value: f64,
    /// Reporting player, `"Anonymous"` when the client omitted one
    pub player_name: String,
    /// Epoch milliseconds assigned from the server clock at insertion
    #[serde(rename = "timestamp")]
    pub observed_at: i64,
}

/// Application state shared across handlers and background tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub store: Arc<store::ReportStore>,
}
