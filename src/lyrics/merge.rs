use crate::lyrics::LyricLine;

/// Max distance between a line and its translation.
pub const TOLERANCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedLine {
    pub time_ms: u64,
    pub text: String,
    pub translation: Option<String>,
}

impl MergedLine {
    pub fn seconds(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// Pair each primary line with the first secondary line within [`TOLERANCE_MS`].
/// Unpaired secondary lines are dropped.
pub fn merge(primary: &[LyricLine], secondary: &[LyricLine]) -> Vec<MergedLine> {
    primary
        .iter()
        .map(|line| MergedLine {
            time_ms: line.time_ms,
            text: line.text.clone(),
            translation: secondary
                .iter()
                .find(|s| s.time_ms.abs_diff(line.time_ms) <= TOLERANCE_MS)
                .map(|s| s.text.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_within_tolerance_only() {
        let primary = vec![LyricLine::new(10_000, "hello"), LyricLine::new(20_000, "world")];
        let secondary = vec![LyricLine::new(10_400, "ni hao"), LyricLine::new(20_600, "shi jie")];
        let merged = merge(&primary, &secondary);
        assert_eq!(merged[0].translation.as_deref(), Some("ni hao"));
        assert_eq!(merged[1].translation, None);
        assert_eq!(merged[1].time_ms, 20_000);
    }

    #[test]
    fn first_candidate_wins_and_extras_drop() {
        let primary = vec![LyricLine::new(5_000, "a")];
        let secondary = vec![
            LyricLine::new(4_600, "early"),
            LyricLine::new(5_000, "exact"),
            LyricLine::new(9_000, "orphan"),
        ];
        let merged = merge(&primary, &secondary);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].translation.as_deref(), Some("early"));
    }

    #[test]
    fn boundary_is_inclusive() {
        let merged = merge(&[LyricLine::new(1_000, "a")], &[LyricLine::new(1_500, "b")]);
        assert_eq!(merged[0].translation.as_deref(), Some("b"));
    }
}
