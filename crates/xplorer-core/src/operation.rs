//! Operation tags.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The kind of file operation staged in the clipboard or running in the engine.
///
/// This is a pure tag: the paths an operation works on live in the clipboard
/// or are passed to the engine directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    #[strum(to_string = "None")]
    None,
    #[strum(to_string = "Copy")]
    Copy,
    #[strum(to_string = "Cut")]
    Cut,
    #[strum(to_string = "Delete")]
    Delete,
}

impl Operation {
    /// Whether this tag can be staged in the clipboard.
    pub fn is_clipboard(self) -> bool {
        matches!(self, Self::Copy | Self::Cut)
    }

    /// Past-tense verb used in completion messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::None => "Processed",
            Self::Copy => "Copied",
            Self::Cut => "Moved",
            Self::Delete => "Deleted",
        }
    }
}
