/// Cross-view ephemeral state
///
/// Holds the one value that survives a navigation: the selection key
/// written by the heroes view and read by the skins view when it is
/// activated. Lives in memory only, for the lifetime of the process.

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selection: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the selection key before navigating away
    pub fn set_selection(&mut self, value: impl Into<String>) {
        let value = value.into();
        debug!(selection = %value, "Selection stored");
        self.selection = Some(value);
    }

    /// Current selection key, if any view has written one
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }
}
