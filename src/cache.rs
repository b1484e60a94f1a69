//! Parse cache keyed by the SHA-256 digest of the uploaded bytes.
//!
//! Only the most recent upload is kept. Loading different content replaces
//! (and so invalidates) the previous entry.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::TelemetryLog;
use crate::parser::parse_log;

/// Hex-encoded SHA-256 of a log's raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

#[derive(Debug, Default)]
pub struct ParseCache {
    entry: Option<(ContentKey, Arc<TelemetryLog>)>,
    hits: u64,
    misses: u64,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed log for `bytes`, parsing only when the content
    /// differs from the cached upload.
    pub fn get_or_parse(&mut self, bytes: &[u8]) -> Result<(ContentKey, Arc<TelemetryLog>)> {
        let key = ContentKey::of(bytes);

        if let Some((cached_key, log)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                debug!(key = %key, "Parse cache hit");
                return Ok((key, Arc::clone(log)));
            }
        }

        self.misses += 1;
        let log = Arc::new(parse_log(bytes)?);
        if let Some((old, _)) = self.entry.replace((key.clone(), Arc::clone(&log))) {
            info!(old = %old, new = %key, "New upload replaced cached log");
        } else {
            debug!(key = %key, readings = log.readings.len(), "Cached parsed log");
        }
        Ok((key, log))
    }

    pub fn current(&self) -> Option<Arc<TelemetryLog>> {
        self.entry.as_ref().map(|(_, log)| Arc::clone(log))
    }

    pub fn current_key(&self) -> Option<&ContentKey> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
