//! Cooperative wall-clock budget.
//!
//! Every stage that touches all pixels of an image calls [`Deadline::check`]
//! once per row. All intermediate buffers are call-local, so abandoning a
//! stage halfway leaves nothing inconsistent behind.

use std::time::{Duration, Instant};

/// The per-call time budget ran out.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("time budget of {budget_ms} ms exhausted")]
pub struct Expired {
    pub budget_ms: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Budget starting now.
    pub fn after(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget: Some(budget),
        }
    }

    /// A deadline that never expires. Handy for tests and offline tools.
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            budget: None,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.budget.map(|b| b.saturating_sub(self.elapsed()))
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        match self.budget {
            Some(b) => self.elapsed() >= b,
            None => false,
        }
    }

    #[inline]
    pub fn check(&self) -> Result<(), Expired> {
        if self.is_expired() {
            Err(Expired {
                budget_ms: self.budget.map_or(0, |b| b.as_millis() as u64),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::unbounded()
    }
}
