use super::state::{Screen, SearchFocus};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    NextScreen,
    PrevScreen,
    SetScreen(Screen),
    SetSearchFocus(SearchFocus),

    ListUp,
    ListDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,
    Refresh,
    Resize,

    // Search input
    InputChar(char),
    Backspace,
    ClearInput,
    StartSearch,

    /// Enter: play the selection, open the selected playlist, or jump within the queue.
    Activate,
    /// Add the selection to the queue without interrupting playback.
    Enqueue,
    /// Make the visible track list the queue.
    ReplaceQueue,
    RemoveSelected,
    CloseCollection,

    PlayNext,
    PlayPrev,
    ToggleMode,
    TogglePause,
    VolumeUp,
    VolumeDown,
    SeekForward,
    SeekBack,
    DismissError,
}
