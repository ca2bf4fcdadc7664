//! Ordering for search requests answered out of band.
//!
//! A search backend that answers later (over the network, on another thread)
//! may respond out of order. Only the response to the most recent request is
//! applied; everything older is dropped.

use derive_more::Display;
use tracing::debug;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[display("request#{_0}")]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token newer than every token issued before.
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Marks the response for `token` as applied if it answers the latest
    /// request, returning whether it should be used.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        if token.0 != self.issued || token.0 <= self.applied {
            debug!("Discard stale response for {}", token);
            return false;
        }
        self.applied = token.0;
        true
    }

    /// Marks results produced in place as applied, so every response still
    /// in flight is stale.
    pub fn supersede(&mut self) {
        let token = self.issue();
        self.applied = token.0;
    }
}

/// A search issued against the current input text, awaiting its results.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingSearch {
    pub token: RequestToken,
    pub query: String,
}
