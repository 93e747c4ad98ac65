//! Bounded busy-waiting on hardware flags.

use crate::error::XferError;

/// How long a hardware wait may spin before giving up.
///
/// The default is [`WaitBudget::Infinite`]: a peripheral that never raises
/// the awaited flag blocks the caller forever, exactly like the bare
/// register loop. Latency-bounded callers pick [`WaitBudget::Polls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitBudget {
    /// Spin until the condition holds.
    #[default]
    Infinite,
    /// Give up with [`XferError::Timeout`] after this many unsuccessful polls.
    Polls(u32),
}

impl WaitBudget {
    /// Poll `ready` until it returns `true` or the budget runs out.
    ///
    /// `ready` is always evaluated at least once, so a condition that already
    /// holds succeeds even with `Polls(0)`.
    pub fn poll<F>(self, mut ready: F) -> Result<(), XferError>
    where
        F: FnMut() -> bool,
    {
        match self {
            Self::Infinite => {
                while !ready() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            Self::Polls(limit) => {
                let mut remaining = limit;
                loop {
                    if ready() {
                        return Ok(());
                    }
                    if remaining == 0 {
                        warn!("wait budget of {} polls exhausted", limit);
                        return Err(XferError::Timeout);
                    }
                    remaining = remaining.saturating_sub(1);
                    core::hint::spin_loop();
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_infinite() {
        assert_eq!(WaitBudget::default(), WaitBudget::Infinite);
    }

    #[test]
    fn test_ready_immediately() {
        assert_eq!(WaitBudget::Polls(0).poll(|| true), Ok(()));
        assert_eq!(WaitBudget::Infinite.poll(|| true), Ok(()));
    }

    #[test]
    fn test_budget_counts_polls() {
        let mut calls = 0u32;
        let result = WaitBudget::Polls(4).poll(|| {
            calls += 1;
            false
        });
        assert_eq!(result, Err(XferError::Timeout));
        // initial check plus one per remaining poll
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_infinite_waits_for_condition() {
        let mut calls = 0u32;
        let result = WaitBudget::Infinite.poll(|| {
            calls += 1;
            calls == 100
        });
        assert_eq!(result, Ok(()));
        assert_eq!(calls, 100);
    }
}
