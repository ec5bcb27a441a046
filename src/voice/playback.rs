//! Gapless playback scheduling with barge-in.

use std::collections::HashSet;

use crate::device::BufferId;

/// Where and when a buffer was placed on the output clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBuffer {
    pub id: BufferId,
    pub start_at: f64,
    pub duration: f64,
}

/// Playback cursor plus the set of buffers that have not finished yet.
///
/// Each buffer starts at `max(cursor, now)` and advances the cursor by its
/// duration, so consecutive chunks play back to back without overlap. The
/// cursor only moves backwards on [`PlaybackScheduler::interrupt`].
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    next_start_time: f64,
    live: HashSet<BufferId>,
    next_id: BufferId,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_idle(&self) -> bool {
        self.live.is_empty()
    }

    /// Place a buffer of `duration` seconds, with the output clock at `now`.
    pub fn schedule(&mut self, duration: f64, now: f64) -> ScheduledBuffer {
        self.next_start_time = self.next_start_time.max(now);
        let start_at = self.next_start_time;
        self.next_start_time += duration;

        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);

        ScheduledBuffer {
            id,
            start_at,
            duration,
        }
    }

    /// Record that `id` finished playing. Returns `true` when this removal
    /// emptied the live set (the assistant stopped talking). Unknown ids,
    /// e.g. buffers already discarded by an interruption, return `false`.
    pub fn finish(&mut self, id: BufferId) -> bool {
        self.live.remove(&id) && self.live.is_empty()
    }

    /// Discard every live buffer and reset the cursor to zero. Returns the
    /// ids the caller must stop on the output device.
    pub fn interrupt(&mut self) -> Vec<BufferId> {
        self.next_start_time = 0.0;
        let mut ids: Vec<BufferId> = self.live.drain().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: f64 = 4096.0 / 24_000.0;

    #[test]
    fn sequential_buffers_have_no_gap_or_overlap() {
        let mut s = PlaybackScheduler::new();
        let first = s.schedule(CHUNK, 0.0);
        let second = s.schedule(CHUNK, 0.05);
        assert_eq!(first.start_at, 0.0);
        assert_eq!(second.start_at, first.start_at + first.duration);
    }

    #[test]
    fn late_chunk_starts_at_current_clock() {
        let mut s = PlaybackScheduler::new();
        s.schedule(CHUNK, 0.0);
        let late = s.schedule(CHUNK, 5.0);
        assert_eq!(late.start_at, 5.0);
        assert_eq!(s.next_start_time(), 5.0 + CHUNK);
    }

    #[test]
    fn cursor_never_decreases_without_interrupt() {
        let mut s = PlaybackScheduler::new();
        let mut last = s.next_start_time();
        for (i, now) in [0.0, 0.01, 3.0, 1.0, 2.5, 10.0, 9.0].into_iter().enumerate() {
            s.schedule(CHUNK * (i as f64 + 1.0) / 4.0, now);
            assert!(s.next_start_time() >= last);
            last = s.next_start_time();
        }
    }

    #[test]
    fn finishing_last_buffer_reports_idle() {
        let mut s = PlaybackScheduler::new();
        let a = s.schedule(CHUNK, 0.0);
        let b = s.schedule(CHUNK, 0.0);
        assert!(!s.finish(a.id));
        assert!(s.finish(b.id));
        assert!(s.is_idle());
    }

    #[test]
    fn interrupt_clears_everything_and_resets_cursor() {
        let mut s = PlaybackScheduler::new();
        for _ in 0..5 {
            s.schedule(CHUNK, 1.0);
        }
        let stopped = s.interrupt();
        assert_eq!(stopped.len(), 5);
        assert_eq!(s.live_count(), 0);
        assert_eq!(s.next_start_time(), 0.0);
    }

    #[test]
    fn completion_after_interrupt_is_ignored() {
        let mut s = PlaybackScheduler::new();
        let a = s.schedule(CHUNK, 0.0);
        s.interrupt();
        assert!(!s.finish(a.id));
    }

    #[test]
    fn ids_are_not_reused_after_interrupt() {
        let mut s = PlaybackScheduler::new();
        let a = s.schedule(CHUNK, 0.0);
        s.interrupt();
        let b = s.schedule(CHUNK, 0.0);
        assert_ne!(a.id, b.id);
    }
}
