use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::ToolError;

const FAILURE_THRESHOLD: u32 = 5;
const RECOVERY_TIME: Duration = Duration::from_secs(60);

#[derive(Default)]
struct BreakerEntry {
    failures: u32,
    last_failure: Option<Instant>,
    is_open: bool,
}

/// Per-tool-name circuit breaker state, shared across every call site that
/// invokes the same tool via an `Arc` rather than a process global.
#[derive(Clone, Default)]
pub struct CircuitBreaker {
    state: Arc<Mutex<HashMap<String, BreakerEntry>>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Err` if the breaker is open and still cooling down. A breaker
    /// whose cooldown has elapsed is left open in storage but allowed
    /// through once (half-open probe); [`Self::record_success`] or
    /// [`Self::record_failure`] then decides the next state.
    pub fn check(&self, tool_name: &str) -> Result<(), ToolError> {
        let state = self.state.lock().unwrap();
        let Some(entry) = state.get(tool_name) else {
            return Ok(());
        };
        if !entry.is_open {
            return Ok(());
        }
        let Some(last_failure) = entry.last_failure else {
            return Ok(());
        };
        let elapsed = last_failure.elapsed();
        if elapsed < RECOVERY_TIME {
            let remaining = (RECOVERY_TIME - elapsed).as_secs();
            return Err(ToolError::circuit_open(tool_name, remaining));
        }
        info!(tool = tool_name, "circuit breaker half-open, allowing probe");
        Ok(())
    }

    pub fn record_success(&self, tool_name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.get_mut(tool_name) {
            if entry.failures > 0 {
                info!(tool = tool_name, "circuit breaker closed, service recovered");
            }
            entry.failures = 0;
            entry.is_open = false;
        }
    }

    pub fn record_failure(&self, tool_name: &str) {
        let mut state = self.state.lock().unwrap();
        let entry = state.entry(tool_name.to_string()).or_default();
        entry.failures += 1;
        entry.last_failure = Some(Instant::now());
        if entry.failures >= FAILURE_THRESHOLD {
            if !entry.is_open {
                warn!(tool = tool_name, failures = entry.failures, "circuit breaker tripped");
            }
            entry.is_open = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_threshold_failures() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD {
            cb.record_failure("kube");
        }
        assert!(cb.check("kube").is_err());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD - 1 {
            cb.record_failure("kube");
        }
        cb.record_success("kube");
        cb.record_failure("kube");
        assert!(cb.check("kube").is_ok());
    }
}
