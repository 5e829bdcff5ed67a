//! Nerd Font glyphs. Requires a Nerd Font (https://www.nerdfonts.com).

use crate::app::state::Screen;
use crate::player::PlayMode;

#[derive(Debug, Clone)]
pub struct Icons {
    pub play: &'static str,
    pub pause: &'static str,
    pub next: &'static str,
    pub prev: &'static str,

    pub volume_mute: &'static str,
    pub volume_low: &'static str,
    pub volume_high: &'static str,

    pub sequential: &'static str,
    pub shuffle: &'static str,
    pub reverse: &'static str,

    pub search: &'static str,
    pub queue: &'static str,
    pub lyrics: &'static str,
    pub daily: &'static str,
    pub library: &'static str,
    pub help: &'static str,

    pub success: &'static str,
    pub error: &'static str,
    pub music: &'static str,
    pub playlist: &'static str,
    pub user: &'static str,
    pub selected: &'static str,

    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub progress_head: &'static str,
}

impl Icons {
    pub const fn nerd() -> Self {
        Self {
            play: "\u{f04b}",        // nf-fa-play
            pause: "\u{f04c}",       // nf-fa-pause
            next: "\u{f051}",        // nf-fa-step_forward
            prev: "\u{f048}",        // nf-fa-step_backward

            volume_mute: "\u{f026}", // nf-fa-volume_off
            volume_low: "\u{f027}",  // nf-fa-volume_down
            volume_high: "\u{f028}", // nf-fa-volume_up

            sequential: "\u{f456}",  // nf-md-repeat
            shuffle: "\u{f49d}",     // nf-md-shuffle
            reverse: "\u{f0e2}",     // nf-fa-undo

            search: "\u{f002}",      // nf-fa-search
            queue: "\u{f03a}",       // nf-fa-list
            lyrics: "\u{f15c}",      // nf-fa-file_text_o
            daily: "\u{f073}",       // nf-fa-calendar
            library: "\u{f02d}",     // nf-fa-book
            help: "\u{f059}",        // nf-fa-question_circle

            success: "\u{f00c}",     // nf-fa-check
            error: "\u{f00d}",       // nf-fa-times
            music: "\u{f001}",       // nf-fa-music
            playlist: "\u{f0cb}",    // nf-fa-list_ol
            user: "\u{f007}",        // nf-fa-user
            selected: "\u{f054}",    // nf-fa-chevron_right

            progress_full: "━",
            progress_empty: "─",
            progress_head: "●",
        }
    }

    pub fn screen(&self, screen: Screen) -> &'static str {
        match screen {
            Screen::Search => self.search,
            Screen::Queue => self.queue,
            Screen::Lyrics => self.lyrics,
            Screen::Daily => self.daily,
            Screen::Library => self.library,
            Screen::Help => self.help,
        }
    }

    pub fn mode(&self, mode: PlayMode) -> &'static str {
        match mode {
            PlayMode::Sequential => self.sequential,
            PlayMode::Shuffle => self.shuffle,
            PlayMode::Reverse => self.reverse,
        }
    }
}

/// Loading spinner frames
pub struct LoadingSpinner;

impl LoadingSpinner {
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        Self::BRAILLE[tick as usize % Self::BRAILLE.len()]
    }
}
