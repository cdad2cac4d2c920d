//! Request timing measurement.

use crate::models::Timing;
use chrono::Utc;
use std::time::Instant;

/// Measures one request from just before it is sent to just after its body
/// has been read.
///
/// Wall-clock timestamps are recorded for display; the duration itself comes
/// from a monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: i64,
    instant: Instant,
}

impl Stopwatch {
    /// Starts measuring.
    pub fn start() -> Self {
        Self {
            started_at: Utc::now().timestamp_millis(),
            instant: Instant::now(),
        }
    }

    /// Milliseconds elapsed so far.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.instant.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Stops measuring and returns the timing span.
    pub fn finish(&self) -> Timing {
        let duration = self.elapsed_ms();
        Timing::Span {
            start: self.started_at,
            end: Utc::now().timestamp_millis(),
            duration,
        }
    }
}

/// Formats a duration in milliseconds for display.
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{} ms", ms)
    } else {
        format!("{:.2} s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_produces_span() {
        let stopwatch = Stopwatch::start();
        std::thread::sleep(std::time::Duration::from_millis(5));

        match stopwatch.finish() {
            Timing::Span { start, end, duration } => {
                assert!(end >= start);
                assert!(duration >= 5);
            }
            other => panic!("Expected span, got {:?}", other),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(250), "250 ms");
        assert_eq!(format_duration_ms(1500), "1.50 s");
    }
}
