use rand::Rng;
use serde::{Deserialize, Serialize};

/// How next/previous pick the following track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    #[default]
    #[serde(rename = "sequence")]
    Sequential,
    #[serde(rename = "shuffle")]
    Shuffle,
    #[serde(rename = "reverse")]
    Reverse,
}

impl PlayMode {
    /// Sequential → Shuffle → Reverse → Sequential.
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::Sequential => PlayMode::Shuffle,
            PlayMode::Shuffle => PlayMode::Reverse,
            PlayMode::Reverse => PlayMode::Sequential,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Sequential => "sequence",
            PlayMode::Shuffle => "shuffle",
            PlayMode::Reverse => "reverse",
        }
    }

    /// Index after `current` in a list of `len`. `None` only for an empty list.
    pub fn next_index<R: Rng + ?Sized>(self, current: Option<usize>, len: usize, rng: &mut R) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(match self {
            PlayMode::Sequential => forward(current, len),
            PlayMode::Reverse => backward(current, len),
            PlayMode::Shuffle => draw(current, len, rng),
        })
    }

    /// Index before `current`. Reverse mirrors Sequential.
    pub fn prev_index<R: Rng + ?Sized>(self, current: Option<usize>, len: usize, rng: &mut R) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(match self {
            PlayMode::Sequential => backward(current, len),
            PlayMode::Reverse => forward(current, len),
            PlayMode::Shuffle => draw(current, len, rng),
        })
    }
}

// With no focus, forward starts at the head and backward at the tail.
fn forward(current: Option<usize>, len: usize) -> usize {
    current.map_or(0, |i| (i + 1) % len)
}

fn backward(current: Option<usize>, len: usize) -> usize {
    current.map_or(len - 1, |i| (i + len - 1) % len)
}

fn draw<R: Rng + ?Sized>(current: Option<usize>, len: usize, rng: &mut R) -> usize {
    loop {
        let i = rng.random_range(0..len);
        if len == 1 || Some(i) != current {
            return i;
        }
    }
}
