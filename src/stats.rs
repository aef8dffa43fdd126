//! Rolling cull-time statistics.
//!
//! The engine feeds one sample per tick (microseconds spent culling). At
//! each window boundary the previous window's average and maximum become
//! visible, and the engine re-selects its reveal-timer increment from the
//! maximum. Spikes, not averages, are what overrun a tick budget.

#[derive(Debug)]
pub(crate) struct RollingStats {
    window_len: u64,
    ticks_in_window: u64,
    window_total_micros: u64,
    window_max_micros: u64,
    pub last_window_avg: u64,
    pub last_window_max: u64,
    pub total_micros: u64,
    pub total_ticks: u64,
}

impl RollingStats {
    pub fn new(window_len: u64) -> Self {
        Self {
            window_len,
            ticks_in_window: 0,
            window_total_micros: 0,
            window_max_micros: 0,
            last_window_avg: 0,
            last_window_max: 0,
            total_micros: 0,
            total_ticks: 0,
        }
    }

    /// Record one tick's cull time. Returns true when this sample closed a
    /// window and the `last_window_*` fields were refreshed.
    pub fn record(&mut self, micros: u64) -> bool {
        self.total_micros += micros;
        self.total_ticks += 1;
        self.window_total_micros += micros;
        self.window_max_micros = self.window_max_micros.max(micros);
        self.ticks_in_window += 1;
        if self.ticks_in_window < self.window_len {
            return false;
        }
        self.last_window_avg = self.window_total_micros / self.window_len;
        self.last_window_max = self.window_max_micros;
        self.ticks_in_window = 0;
        self.window_total_micros = 0;
        self.window_max_micros = 0;
        true
    }

    pub fn report(&self, tick: u64, timer_increment: u32) {
        eprintln!(
            "cull stats @tick {}: window avg {}us max {}us, lifetime avg {}us, timer increment {}",
            tick,
            self.last_window_avg,
            self.last_window_max,
            self.total_micros / self.total_ticks.max(1),
            timer_increment
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_boundaries_publish_avg_and_max() {
        let mut stats = RollingStats::new(4);
        assert!(!stats.record(10));
        assert!(!stats.record(30));
        assert!(!stats.record(20));
        assert!(stats.record(100));
        assert_eq!(stats.last_window_avg, 40);
        assert_eq!(stats.last_window_max, 100);

        // Next window starts clean.
        assert!(!stats.record(1));
        assert!(!stats.record(1));
        assert!(!stats.record(1));
        assert!(stats.record(1));
        assert_eq!(stats.last_window_avg, 1);
        assert_eq!(stats.last_window_max, 1);
        assert_eq!(stats.total_ticks, 8);
    }
}
