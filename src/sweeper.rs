//! # Expiry Sweeper Module
//!
//! ## Purpose
//! Periodic background task that invokes the store's sweep independent of
//! request traffic, so memory is reclaimed even during idle periods between
//! queries. It performs no filtering logic itself; it delegates entirely to
//! [`ReportStore::sweep_now`].

use crate::store::ReportStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the periodic sweep task. The returned handle is aborted on shutdown.
pub fn spawn(store: Arc<ReportStore>, period: Duration) -> JoinHandle<()> {
    info!("expiry sweeper running every {}s", period.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // the first tick completes immediately; skip it so the task settles into the period
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reclaimed = store.sweep_now().await;
            if reclaimed > 0 {
                info!("expiry sweep reclaimed {} reports", reclaimed);
            } else {
                debug!("expiry sweep found nothing to reclaim");
            }
        }
    })
}
