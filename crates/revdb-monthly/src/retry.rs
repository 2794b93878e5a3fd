//! Cross-run retry accounting for failed (client, month) pairs.
//!
//! The tracking file maps client id → `YYYY-MM` → attempt record. It is read
//! once before a run and rewritten once after it; a missing or unreadable
//! file is treated as empty.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use revdb_core::Client;
use serde::{Deserialize, Serialize};

use crate::summary::FailedClientInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryEntry {
    pub month: String,
    pub attempts: u32,
    #[serde(default)]
    pub last_error: String,
}

/// client id → month → entry. Map keys serialize as JSON strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryTracking(pub BTreeMap<i64, BTreeMap<String, RetryEntry>>);

impl RetryTracking {
    #[must_use]
    pub fn entry(&self, client_id: i64, month: &str) -> Option<&RetryEntry> {
        self.0.get(&client_id).and_then(|months| months.get(month))
    }

    #[must_use]
    pub fn attempts(&self, client_id: i64, month: &str) -> u32 {
        self.entry(client_id, month).map_or(0, |e| e.attempts)
    }

    /// Adds one attempt for every failed client and records its latest error.
    pub fn record_failures(&mut self, month: &str, failures: &[FailedClientInfo]) {
        for failed in failures {
            let entry = self
                .0
                .entry(failed.client_id)
                .or_default()
                .entry(month.to_owned())
                .or_insert_with(|| RetryEntry {
                    month: month.to_owned(),
                    ..RetryEntry::default()
                });
            entry.attempts += 1;
            entry.last_error.clone_from(&failed.error);
        }
    }

    /// Every tracked client for `month`, in client-id order.
    #[must_use]
    pub fn for_month(&self, month: &str) -> Vec<(i64, &RetryEntry)> {
        self.0
            .iter()
            .filter_map(|(id, months)| months.get(month).map(|e| (*id, e)))
            .collect()
    }
}

/// Result of narrowing a client list to retry candidates.
#[derive(Debug, Default)]
pub struct RetrySelection {
    /// Previously failed for the month and still under the cap.
    pub eligible: Vec<Client>,
    /// Previously failed and at or over the cap, with their attempt count.
    pub exhausted: Vec<(Client, u32)>,
}

/// Splits `clients` for a retry-only run. Clients with no recorded failure
/// for `month` are in neither list.
#[must_use]
pub fn select_retry_clients(
    clients: Vec<Client>,
    tracking: &RetryTracking,
    month: &str,
    max_attempts: u32,
) -> RetrySelection {
    let mut selection = RetrySelection::default();
    for client in clients {
        let Some(entry) = tracking.entry(client.id, month) else {
            continue;
        };
        if entry.attempts < max_attempts {
            selection.eligible.push(client);
        } else {
            selection.exhausted.push((client, entry.attempts));
        }
    }
    selection
}

/// Reads and writes the tracking file.
#[derive(Debug, Clone)]
pub struct RetryTracker {
    path: PathBuf,
}

impl RetryTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the tracking file. Never fails: a missing file is empty, and an
    /// unreadable or corrupt one is logged and treated as empty.
    #[must_use]
    pub fn load(&self) -> RetryTracking {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return RetryTracking::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read retry tracking file");
                return RetryTracking::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "could not parse retry tracking file");
            RetryTracking::default()
        })
    }

    /// Writes `tracking` as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from writing the file.
    pub fn try_save(&self, tracking: &RetryTracking) -> io::Result<()> {
        let json = serde_json::to_string_pretty(tracking).map_err(io::Error::other)?;
        std::fs::write(&self.path, json)
    }

    /// [`Self::try_save`], logging instead of failing.
    pub fn save(&self, tracking: &RetryTracking) {
        if let Err(e) = self.try_save(tracking) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write retry tracking file");
        }
    }
}
