/// Why the transport refused to start playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackRejection {
    #[error("playback was aborted, press space to start it")]
    Aborted,
    #[error("autoplay was blocked, press space to start playback")]
    Blocked,
}

/// The single error a [`Player`](super::Player) holds. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("{0}")]
    Upstream(String),
    #[error("could not get a stream for \"{name}\": {reason}")]
    NoStream { name: String, reason: String },
    #[error(transparent)]
    Playback(#[from] PlaybackRejection),
    #[error("playback failed: {0}")]
    Transport(String),
}

impl PlayerError {
    /// Recoverable by the user pressing play again.
    pub fn needs_manual_start(&self) -> bool {
        matches!(self, PlayerError::Playback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_track() {
        let e = PlayerError::NoStream {
            name: "Sunny".into(),
            reason: "no playable source".into(),
        };
        assert!(e.to_string().contains("\"Sunny\""));
        assert!(!e.needs_manual_start());
    }

    #[test]
    fn rejections_are_distinct() {
        let aborted: PlayerError = PlaybackRejection::Aborted.into();
        let blocked: PlayerError = PlaybackRejection::Blocked.into();
        assert_ne!(aborted.to_string(), blocked.to_string());
        assert!(blocked.needs_manual_start());
    }
}
