//! Reset/Generation Protocol.
//!
//! Every change of the active field type starts a new generation. Fetch
//! tickets carry the generation they were issued in, and anything tagged
//! with an older generation is dropped on arrival without being inspected.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{EditorError, Result};

/// Monotonic session generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub const fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Lifecycle phase of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Active,
    /// Between dropping the old type's state and installing the new one
    Switching,
    /// Saved or cancelled; terminal
    Closed,
}

#[derive(Debug, Clone)]
pub struct GenerationTracker {
    generation: Generation,
    phase: Phase,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self {
            generation: Generation::default(),
            phase: Phase::Active,
        }
    }

    pub fn current(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Fail with `SessionClosed` once the session is closed.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(EditorError::SessionClosed);
        }
        Ok(())
    }

    /// Enter `Switching` and allocate the next generation.
    pub fn begin_switch(&mut self) -> Result<Generation> {
        self.ensure_open()?;
        let from = self.generation;
        self.generation = from.next();
        self.phase = Phase::Switching;
        debug!(%from, to = %self.generation, "generation switch started");
        Ok(self.generation)
    }

    /// Return to `Active` under the new generation.
    pub fn finish_switch(&mut self) {
        if self.phase == Phase::Switching {
            self.phase = Phase::Active;
        }
    }

    pub fn close(&mut self) {
        if !self.is_closed() {
            debug!(generation = %self.generation, "session closed");
        }
        self.phase = Phase::Closed;
    }

    /// True if work tagged with `generation` may still be applied.
    pub fn accepts(&self, generation: Generation) -> bool {
        !self.is_closed() && generation == self.generation
    }
}

impl Default for GenerationTracker {
    fn default() -> Self {
        Self::new()
    }
}
