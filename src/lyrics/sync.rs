use crate::lyrics::merge::MergedLine;

/// Tracks which lyric line is active for a playback position.
///
/// Before the first line the active index is 0, never "none".
#[derive(Debug, Clone, Default)]
pub struct LyricSync {
    lines: Vec<MergedLine>,
    active: usize,
}

impl LyricSync {
    /// `lines` must be sorted by time.
    pub fn new(lines: Vec<MergedLine>) -> Self {
        Self { lines, active: 0 }
    }

    /// Recompute for `position_secs`. Returns the new index only when it changed.
    pub fn update(&mut self, position_secs: f64) -> Option<usize> {
        let ms = (position_secs.max(0.0) * 1000.0) as u64;
        let next = self
            .lines
            .partition_point(|l| l.time_ms <= ms)
            .saturating_sub(1);
        if next == self.active {
            return None;
        }
        self.active = next;
        Some(next)
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_line(&self) -> Option<&MergedLine> {
        self.lines.get(self.active)
    }

    pub fn lines(&self) -> &[MergedLine] {
        &self.lines
    }

    /// First row to draw so the active line sits in the middle of `visible_rows`.
    pub fn scroll_offset(&self, visible_rows: usize) -> usize {
        self.active.saturating_sub(visible_rows / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync(times: &[u64]) -> LyricSync {
        LyricSync::new(
            times
                .iter()
                .map(|&t| MergedLine {
                    time_ms: t,
                    text: format!("at {t}"),
                    translation: None,
                })
                .collect(),
        )
    }

    #[test]
    fn picks_last_line_not_after_position() {
        let mut s = sync(&[1_000, 3_000, 3_000, 8_000]);
        assert_eq!(s.update(3.5), Some(2));
        assert_eq!(s.update(9.0), Some(3));
        assert_eq!(s.update(1.0), Some(0));
    }

    #[test]
    fn reports_only_changes() {
        let mut s = sync(&[1_000, 3_000]);
        assert_eq!(s.update(1.2), None);
        assert_eq!(s.update(3.0), Some(1));
        assert_eq!(s.update(3.2), None);
        assert_eq!(s.active(), 1);
    }

    #[test]
    fn stays_at_zero_before_first_line() {
        let mut s = sync(&[5_000, 6_000]);
        assert_eq!(s.update(5.5), None);
        assert_eq!(s.update(6.5), Some(1));
        assert_eq!(s.update(1.0), Some(0));
        assert_eq!(s.update(0.0), None);
        assert_eq!(s.active_line().unwrap().time_ms, 5_000);
    }

    #[test]
    fn empty_lyrics_never_move() {
        let mut s = LyricSync::default();
        assert_eq!(s.update(10.0), None);
        assert!(s.active_line().is_none());
    }

    #[test]
    fn centres_active_line() {
        let mut s = sync(&(0..40).map(|i| i * 1_000).collect::<Vec<_>>());
        assert_eq!(s.scroll_offset(10), 0);
        s.update(20.0);
        assert_eq!(s.scroll_offset(10), 15);
    }
}
