pub mod help;
pub mod library;
pub mod lyrics;
pub mod now_playing;
pub mod queue;
pub mod root;
pub mod sidebar;
pub mod track_list;

/// Cut to `max_len` characters, ending in "..." when something was dropped.
pub(crate) fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

/// `mm:ss`
pub(crate) fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_str("晴天 - 周杰伦", 5), "晴天...");
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abcdef", 2), "ab");
        assert_eq!(truncate_str("abc", 0), "");
    }

    #[test]
    fn clock_formats_minutes() {
        assert_eq!(clock(0.0), "00:00");
        assert_eq!(clock(125.9), "02:05");
        assert_eq!(clock(-3.0), "00:00");
    }
}
