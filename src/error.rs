use std::error::Error;
use std::fmt;

/// Why a piece of subtitle input could not be used as-is.
///
/// Issues never abort a parse. A malformed timestamp still yields a cue
/// (starting at zero), the other kinds drop the entry they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    MalformedTimestamp { entry: usize, text: String },
    MissingTimingLine { entry: usize, text: String },
    MissingSeparator { entry: usize, text: String },
    UnmatchedLine { entry: usize, text: String },
}

impl ParseIssue {
    /// The 1-based block (SRT) or line (bracketed) number the issue was found in.
    pub fn entry(&self) -> usize {
        match self {
            ParseIssue::MalformedTimestamp { entry, .. }
            | ParseIssue::MissingTimingLine { entry, .. }
            | ParseIssue::MissingSeparator { entry, .. }
            | ParseIssue::UnmatchedLine { entry, .. } => *entry,
        }
    }

    pub(crate) fn with_entry(self, entry: usize) -> Self {
        match self {
            ParseIssue::MalformedTimestamp { text, .. } => {
                ParseIssue::MalformedTimestamp { entry, text }
            }
            ParseIssue::MissingTimingLine { text, .. } => {
                ParseIssue::MissingTimingLine { entry, text }
            }
            ParseIssue::MissingSeparator { text, .. } => ParseIssue::MissingSeparator { entry, text },
            ParseIssue::UnmatchedLine { text, .. } => ParseIssue::UnmatchedLine { entry, text },
        }
    }
}

impl Error for ParseIssue {}

impl fmt::Display for ParseIssue {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseIssue::MalformedTimestamp { entry, text } => {
                write!(fmt, "entry {}: malformed timestamp '{}', using 0", entry, text)
            }
            ParseIssue::MissingTimingLine { entry, text } => {
                write!(fmt, "entry {}: no timing line in block '{}'", entry, text)
            }
            ParseIssue::MissingSeparator { entry, text } => {
                write!(fmt, "entry {}: timing line '{}' has no ' --> '", entry, text)
            }
            ParseIssue::UnmatchedLine { entry, text } => {
                write!(fmt, "entry {}: unrecognised line '{}'", entry, text)
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum PlayerError {
    NoSuchCue { index: usize, len: usize },
    NoSubtitles,
    NoMedia,
}

impl Error for PlayerError {}

impl fmt::Display for PlayerError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlayerError::NoSuchCue { index, len } => {
                write!(fmt, "cue {} does not exist ({} cues loaded)", index, len)
            }
            PlayerError::NoSubtitles => write!(fmt, "no subtitles are loaded"),
            PlayerError::NoMedia => write!(fmt, "no media is loaded"),
        }
    }
}
