// budget.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Operation budget for decoding and encoding
use crate::error::{Error, Result};
use std::time::{Duration, Instant};

/// Deadline bounding a decode or encode operation.
///
/// Checked between blocks while decoding and between frames while encoding,
/// so a pathological input fails with `BudgetExceeded` instead of hanging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Budget {
    /// Deadline, or `None` for no limit
    deadline: Option<Instant>,
}

impl Budget {
    /// Create a budget with no limit
    pub fn unlimited() -> Self {
        Budget { deadline: None }
    }

    /// Create a budget expiring after a timeout, starting now
    pub fn with_timeout(timeout: Duration) -> Self {
        Budget {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Check if the budget is limited
    pub fn is_limited(&self) -> bool {
        self.deadline.is_some()
    }

    /// Check the budget, failing if the deadline has passed
    pub fn check(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(Error::BudgetExceeded)
            }
            _ => Ok(()),
        }
    }
}
