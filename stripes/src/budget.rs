use crate::error::{Error, Result};

/// Counts skipped records for one phase run.
#[derive(Debug, Clone)]
pub struct ErrorBudget {
    skipped: usize,
    allowed: usize,
}

impl ErrorBudget {
    pub fn new(allowed: usize) -> Self {
        Self {
            skipped: 0,
            allowed,
        }
    }

    /// Count one skip, then [`check`](Self::check).
    pub fn record_skip(&mut self) -> Result<()> {
        self.skipped += 1;
        self.check()
    }

    pub fn check(&self) -> Result<()> {
        if self.skipped > self.allowed {
            return Err(Error::BudgetExceeded {
                skipped: self.skipped,
                allowed: self.allowed,
            });
        }
        Ok(())
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn allowed(&self) -> usize {
        self.allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tolerance_fails_on_first_skip() {
        let mut budget = ErrorBudget::new(0);
        assert!(budget.check().is_ok());
        assert!(matches!(
            budget.record_skip(),
            Err(Error::BudgetExceeded {
                skipped: 1,
                allowed: 0
            })
        ));
    }

    #[test]
    fn test_fails_on_skip_after_tolerance() {
        let mut budget = ErrorBudget::new(3);
        for _ in 0..3 {
            budget.record_skip().unwrap();
        }
        assert_eq!(budget.skipped(), 3);
        assert!(budget.record_skip().is_err());
        assert!(budget.check().is_err());
    }
}
