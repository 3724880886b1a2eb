//! # Report Store Module
//!
//! ## Purpose
//! The authoritative, in-memory collection of live sighting reports. Implements
//! insert, time-based expiry, substring+threshold search with ranking, aggregate
//! statistics, and clear-all. This module is the entire hard core of the system;
//! everything else is plumbing around it.
//!
//! ## Input/Output Specification
//! - **Input**: validated sighting payloads, search filters
//! - **Output**: ranked matches with derived ages, statistics snapshots
//! - **Invariant**: every live report satisfies `now - observed_at < EXPIRY_WINDOW`
//!   at the instant any operation completes
//!
//! ## Key Features
//! - One shared sweep primitive invoked at the top of every operation, so the
//!   expiry invariant holds at every observation point (lazily) in addition to
//!   the proactive background sweeper
//! - Stable descending sort by value; ties keep insertion order
//! - Coarse single lock: operations never await or touch I/O while holding it,
//!   so every call is short and the store is linearizable
//!
//! Time-dependent logic lives in synchronous `*_at(now_ms)` methods on the inner
//! state so unit tests can pin the clock; the public async surface reads the
//! wall clock and delegates.

use crate::Report;
use chrono::Utc;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Reports older than this are no longer live
pub const EXPIRY_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Search responses carry at most this many ranked hits
pub const MAX_RESULTS: usize = 10;

/// Reporter name recorded when the client omits one
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// Validated insert payload; `observed_at` is assigned by the store, never the caller
#[derive(Debug, Clone)]
pub struct NewReport {
    pub job_id: String,
    pub pet_name: String,
    pub value: f64,
    pub player_name: String,
}

/// A ranked search match annotated with its age at query time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(flatten)]
    pub report: Report,
    /// Whole minutes elapsed since the sighting was recorded
    pub minutes_ago: i64,
}

/// A live report annotated with ages derived at read time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveReport {
    #[serde(flatten)]
    pub report: Report,
    /// Whole minutes elapsed since the sighting was recorded
    pub minutes_ago: i64,
    /// Whole minutes until the report falls out of the live set
    pub expires_in_minutes: i64,
}

/// Result of a search invocation. Zero matches is a normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Top matches, descending by value, at most [`MAX_RESULTS`]
    pub hits: Vec<SearchHit>,
    /// Total match count, which may exceed the number of hits returned
    pub total_matches: usize,
    /// Post-sweep live count considered by this search
    pub reports_checked: usize,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        !self.hits.is_empty()
    }
}

/// Aggregate statistics recomputed over the live set on every call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_reports: usize,
    pub unique_servers: usize,
    pub unique_players: usize,
    pub unique_pets: usize,
    /// Arithmetic mean of report values, floored to an integer; 0 when empty
    pub average_value: i64,
    /// Maximum report value; 0 when empty
    pub max_value: f64,
    /// Lifetime search count, including searches that found nothing
    pub total_searches: u64,
    /// Process uptime in whole seconds
    pub uptime: u64,
}

/// The shared report store. All access goes through one internal lock.
pub struct ReportStore {
    inner: Mutex<Inner>,
    started_at: Instant,
}

#[derive(Default)]
struct Inner {
    /// Insertion-ordered live set; order doubles as the ranking tie-break
    reports: VecDeque<Report>,
    search_count: u64,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl ReportStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            started_at: Instant::now(),
        }
    }

    /// Append a new report stamped with the current server clock.
    /// Sweeps first; returns the post-insert live count.
    pub async fn insert(&self, new: NewReport) -> usize {
        let mut inner = self.inner.lock().await;
        let total = inner.insert_at(new, now_ms());
        tracing::debug!("report recorded, {} live", total);
        total
    }

    /// Filter the live set by case-insensitive substring and value threshold,
    /// rank descending by value, and return the top matches.
    pub async fn search(&self, query: &str, min_value: f64) -> SearchOutcome {
        let mut inner = self.inner.lock().await;
        let outcome = inner.search_at(query, min_value, now_ms());
        tracing::debug!(
            "search #{} for \"{}\" (min {}): {} of {} reports matched",
            inner.search_count,
            query,
            min_value,
            outcome.total_matches,
            outcome.reports_checked
        );
        outcome
    }

    /// All live reports in insertion order, with derived ages
    pub async fn list_live(&self) -> Vec<LiveReport> {
        self.inner.lock().await.list_live_at(now_ms())
    }

    /// Aggregate statistics over the live set
    pub async fn stats(&self) -> StatsSnapshot {
        self.inner
            .lock()
            .await
            .stats_at(now_ms(), self.uptime_seconds())
    }

    /// Empty the collection and reset the search counter.
    /// Returns the number of reports removed.
    pub async fn clear_all(&self) -> usize {
        self.inner.lock().await.clear()
    }

    /// Run the expiry sweep on its own, outside any other operation.
    /// Returns the number of reports reclaimed.
    pub async fn sweep_now(&self) -> usize {
        self.inner.lock().await.sweep_at(now_ms())
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Remove every report whose age has reached the expiry window.
    /// Idempotent: sweeping twice with no intervening insert is a no-op.
    fn sweep_at(&mut self, now_ms: i64) -> usize {
        let horizon = EXPIRY_WINDOW.as_millis() as i64;
        let before = self.reports.len();
        self.reports.retain(|r| now_ms - r.observed_at < horizon);
        before - self.reports.len()
    }

    fn insert_at(&mut self, new: NewReport, now_ms: i64) -> usize {
        self.sweep_at(now_ms);
        self.reports.push_back(Report {
            job_id: new.job_id,
            pet_name: new.pet_name,
            value: new.value,
            player_name: new.player_name,
            observed_at: now_ms,
        });
        self.reports.len()
    }

    fn search_at(&mut self, query: &str, min_value: f64, now_ms: i64) -> SearchOutcome {
        // counted even when nothing matches
        self.search_count += 1;
        self.sweep_at(now_ms);

        let needle = query.to_lowercase();
        let mut matches: Vec<&Report> = self
            .reports
            .iter()
            .filter(|r| r.pet_name.to_lowercase().contains(&needle) && r.value >= min_value)
            .collect();

        // stable sort: equal values keep insertion order, first inserted wins
        matches.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

        let total_matches = matches.len();
        let hits = matches
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| SearchHit {
                minutes_ago: minutes_between(r.observed_at, now_ms),
                report: r.clone(),
            })
            .collect();

        SearchOutcome {
            hits,
            total_matches,
            reports_checked: self.reports.len(),
        }
    }

    fn list_live_at(&mut self, now_ms: i64) -> Vec<LiveReport> {
        self.sweep_at(now_ms);
        let horizon = EXPIRY_WINDOW.as_millis() as i64;
        self.reports
            .iter()
            .map(|r| LiveReport {
                minutes_ago: minutes_between(r.observed_at, now_ms),
                expires_in_minutes: (horizon - (now_ms - r.observed_at)) / 60_000,
                report: r.clone(),
            })
            .collect()
    }

    fn stats_at(&mut self, now_ms: i64, uptime: u64) -> StatsSnapshot {
        self.sweep_at(now_ms);

        let unique_servers = distinct(self.reports.iter().map(|r| r.job_id.as_str()));
        let unique_players = distinct(self.reports.iter().map(|r| r.player_name.as_str()));
        let unique_pets = distinct(self.reports.iter().map(|r| r.pet_name.as_str()));

        let (average_value, max_value) = if self.reports.is_empty() {
            (0, 0.0)
        } else {
            let sum: f64 = self.reports.iter().map(|r| r.value).sum();
            let max = self
                .reports
                .iter()
                .map(|r| r.value)
                .fold(f64::NEG_INFINITY, f64::max);
            ((sum / self.reports.len() as f64).floor() as i64, max)
        };

        StatsSnapshot {
            total_reports: self.reports.len(),
            unique_servers,
            unique_players,
            unique_pets,
            average_value,
            max_value,
            total_searches: self.search_count,
            uptime,
        }
    }

    fn clear(&mut self) -> usize {
        let removed = self.reports.len();
        self.reports.clear();
        self.search_count = 0;
        removed
    }
}

fn minutes_between(observed_at: i64, now_ms: i64) -> i64 {
    (now_ms - observed_at) / 60_000
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<HashSet<_>>().len()
}
