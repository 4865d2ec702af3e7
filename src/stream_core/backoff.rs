use std::time::Duration;
use tokio::time::sleep;

/// Fixed-delay retry budget for transient stream faults. The counter spans
/// the process lifetime: a successful reconnect does not refill it.
#[derive(Debug)]
pub struct FixedBackoff {
    delay_secs: u64,
    max_retries: u32,
    current_attempt: u32,
}

#[derive(Debug)]
pub struct RetryBudgetExhausted;

impl std::fmt::Display for RetryBudgetExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Maximum retry attempts exceeded")
    }
}

impl std::error::Error for RetryBudgetExhausted {}

impl FixedBackoff {
    pub fn new(delay_secs: u64, max_retries: u32) -> Self {
        Self {
            delay_secs,
            max_retries,
            current_attempt: 0,
        }
    }

    /// Wait out the retry delay, or fail once the budget is spent.
    pub async fn sleep(&mut self) -> Result<(), RetryBudgetExhausted> {
        if self.current_attempt >= self.max_retries {
            return Err(RetryBudgetExhausted);
        }

        log::warn!(
            "⏳ Retry attempt {} of {} in {}s",
            self.current_attempt + 1,
            self.max_retries,
            self.delay_secs
        );

        sleep(Duration::from_secs(self.delay_secs)).await;
        self.current_attempt += 1;
        Ok(())
    }

    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }
}
