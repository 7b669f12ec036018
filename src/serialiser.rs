use crate::cue::Cue;
use crate::layout::PaneSplit;
use crate::sync::{CueEntry, HighlightChange};
use crate::time::format_timestamp;

use std::io::{self, Write};

/// Where the player shows its cue list and highlight state.
pub trait Presenter {
    /// Replaces whatever list was shown before. Every entry starts out inactive.
    fn show_cues(&mut self, entries: &[CueEntry<'_>]) -> io::Result<()>;
    /// Called after every position update with the full flag set and the flips.
    fn highlight(&mut self, active: &[bool], changes: &[HighlightChange]) -> io::Result<()>;
    fn layout(&mut self, split: PaneSplit) -> io::Result<()>;
}

/// Prints the cue list once and then one line per highlight transition.
pub struct TerminalPresenter<W: Write> {
    out: W,
    texts: Vec<String>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            texts: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_cues(&mut self, entries: &[CueEntry<'_>]) -> io::Result<()> {
        self.texts = entries.iter().map(|e| one_line(e.text)).collect();
        write_entries(&mut self.out, entries)?;
        self.out.flush()
    }

    fn highlight(&mut self, _active: &[bool], changes: &[HighlightChange]) -> io::Result<()> {
        for change in changes {
            let marker = if change.active { ">>" } else { "  " };
            let text = self.texts.get(change.index).map_or("", String::as_str);
            writeln!(self.out, "{} [{}] {}", marker, change.index, text)?;
        }
        self.out.flush()
    }

    fn layout(&mut self, split: PaneSplit) -> io::Result<()> {
        writeln!(
            self.out,
            "layout: media {:.1}% | subtitles {:.1}%",
            split.media, split.subtitles
        )
    }
}

/// One line per cue: index, interval, and text with line breaks shown as ` / `.
pub fn write_entries<W: Write>(buf: &mut W, entries: &[CueEntry<'_>]) -> io::Result<()> {
    for entry in entries {
        writeln!(
            buf,
            "[{}] {} - {}  {}",
            entry.index,
            format_timestamp(entry.start),
            format_timestamp(entry.end),
            one_line(entry.text)
        )?;
    }
    Ok(())
}

/// Writes cues as a freshly numbered SRT file.
pub fn write_srt<W: Write>(buf: &mut W, cues: &[Cue]) -> io::Result<()> {
    for (idx, cue) in cues.iter().enumerate() {
        writeln!(buf, "{}", idx + 1)?;
        writeln!(
            buf,
            "{} --> {}",
            format_timestamp(cue.start),
            format_timestamp(cue.end)
        )?;
        for line in cue.text.lines() {
            writeln!(buf, "{}", line)?;
        }
        writeln!(buf)?;
    }
    Ok(())
}

fn one_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" / ")
}
