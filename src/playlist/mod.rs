use crate::netease::Track;

/// Ordered tracks, unique by id, with an optional focus index.
///
/// Focus is either `None` or a valid index; every mutation keeps it that way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
    index: Option<usize>,
}

/// What happened to focus after a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Focus was elsewhere; index adjusted if needed.
    Unfocused,
    /// The focused track was removed; focus moved to this index.
    FocusMoved(usize),
    /// The focused track was removed and nothing is left.
    Emptied,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from restored parts. A repeated id or an index that does not point into the list
    /// yields `None`.
    pub fn from_parts(tracks: Vec<Track>, index: Option<usize>) -> Option<Self> {
        let mut pl = Self::new();
        for t in tracks {
            if let (_, true) = pl.insert(t) {
                return None;
            }
        }
        match index {
            Some(i) if i >= pl.len() => None,
            _ => {
                pl.index = index;
                Some(pl)
            }
        }
    }

    /// Insert `track` unless its id is present. Returns its position and whether it already existed.
    /// Focus is not changed.
    pub fn insert(&mut self, track: Track) -> (usize, bool) {
        match self.position(&track.id) {
            Some(i) => (i, true),
            None => {
                self.tracks.push(track);
                (self.tracks.len() - 1, false)
            }
        }
    }

    /// Replace everything. Focus goes to 0, or `None` when `tracks` is empty.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks.clear();
        for t in tracks {
            self.push_unique(t);
        }
        self.index = if self.tracks.is_empty() { None } else { Some(0) };
    }

    /// Remove `index`. Out of range is a no-op returning `None`.
    pub fn remove(&mut self, index: usize) -> Option<(Track, Removal)> {
        if index >= self.tracks.len() {
            return None;
        }
        let track = self.tracks.remove(index);
        let outcome = match self.index {
            Some(cur) if index < cur => {
                self.index = Some(cur - 1);
                Removal::Unfocused
            }
            Some(cur) if index == cur => {
                if self.tracks.is_empty() {
                    self.index = None;
                    Removal::Emptied
                } else {
                    // The slot now holds what used to be next; wrap past the end.
                    let next = if index < self.tracks.len() { index } else { 0 };
                    self.index = Some(next);
                    Removal::FocusMoved(next)
                }
            }
            _ => Removal::Unfocused,
        };
        Some((track, outcome))
    }

    pub fn focus(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.index = Some(index);
        self.tracks.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&Track> {
        self.index.and_then(|i| self.tracks.get(i))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn push_unique(&mut self, track: Track) {
        if self.position(&track.id).is_none() {
            self.tracks.push(track);
        }
    }
}

#[cfg(test)]
pub(crate) fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Song {id}"),
        duration: 180_000,
        authors: vec!["Artist".to_string()],
        album_pic: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> Playlist {
        let mut pl = Playlist::new();
        pl.replace(ids.iter().map(|id| track(id)).collect());
        pl
    }

    fn ids(pl: &Playlist) -> Vec<&str> {
        pl.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn insert_dedups_by_id() {
        let mut pl = list(&["a", "b"]);
        assert_eq!(pl.insert(track("c")), (2, false));
        assert_eq!(pl.insert(track("a")), (0, true));
        assert_eq!(pl.len(), 3);
        assert_eq!(pl.index(), Some(0));
    }

    #[test]
    fn replace_dedups_and_focuses_first() {
        let mut pl = Playlist::new();
        pl.replace(vec![track("a"), track("b"), track("a")]);
        assert_eq!(ids(&pl), vec!["a", "b"]);
        assert_eq!(pl.index(), Some(0));

        pl.replace(Vec::new());
        assert!(pl.is_empty());
        assert_eq!(pl.index(), None);
    }

    #[test]
    fn remove_before_focus_keeps_identity() {
        let mut pl = list(&["a", "b", "c"]);
        pl.focus(2);
        let (_, outcome) = pl.remove(0).unwrap();
        assert_eq!(outcome, Removal::Unfocused);
        assert_eq!(pl.current().unwrap().id, "c");
    }

    #[test]
    fn remove_after_focus_leaves_index() {
        let mut pl = list(&["a", "b", "c"]);
        pl.focus(0);
        pl.remove(2).unwrap();
        assert_eq!(pl.index(), Some(0));
    }

    #[test]
    fn remove_focused_moves_to_sequential_next() {
        let mut pl = list(&["a", "b", "c"]);
        pl.focus(1);
        let (removed, outcome) = pl.remove(1).unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(outcome, Removal::FocusMoved(1));
        assert_eq!(pl.current().unwrap().id, "c");
        assert_eq!(pl.len(), 2);
    }

    #[test]
    fn remove_focused_last_wraps_to_start() {
        let mut pl = list(&["a", "b", "c"]);
        pl.focus(2);
        let (_, outcome) = pl.remove(2).unwrap();
        assert_eq!(outcome, Removal::FocusMoved(0));
        assert_eq!(pl.current().unwrap().id, "a");
    }

    #[test]
    fn remove_only_track_empties() {
        let mut pl = list(&["a"]);
        assert_eq!(pl.remove(0).unwrap().1, Removal::Emptied);
        assert_eq!(pl.index(), None);
        assert!(pl.remove(0).is_none());
    }

    #[test]
    fn from_parts_validates_index() {
        let tracks = vec![track("a"), track("b")];
        assert!(Playlist::from_parts(tracks.clone(), Some(2)).is_none());
        let pl = Playlist::from_parts(tracks.clone(), Some(1)).unwrap();
        assert_eq!(pl.current().unwrap().id, "b");
        let pl = Playlist::from_parts(tracks, None).unwrap();
        assert_eq!(pl.index(), None);
    }

    #[test]
    fn from_parts_rejects_repeated_ids() {
        let tracks = vec![track("a"), track("b"), track("a")];
        assert!(Playlist::from_parts(tracks.clone(), Some(0)).is_none());
        assert!(Playlist::from_parts(tracks, None).is_none());
    }

    #[test]
    fn focus_out_of_range_is_noop() {
        let mut pl = list(&["a"]);
        assert!(pl.focus(3).is_none());
        assert_eq!(pl.index(), Some(0));
    }
}
