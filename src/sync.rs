use crate::cue::{Cue, CueSequence};
use crate::error::PlayerError;

/// A cue as handed to the presentation layer, keyed by its sequence index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueEntry<'a> {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightChange {
    pub index: usize,
    pub active: bool,
}

pub fn cue_entries(cues: &[Cue]) -> impl Iterator<Item = CueEntry<'_>> {
    cues.iter().enumerate().map(|(index, cue)| CueEntry {
        index,
        start: cue.start,
        end: cue.end,
        text: &cue.text,
    })
}

/// Indices of every cue whose `[start, end]` interval contains `position`.
pub fn active_at(cues: &[Cue], position: f64) -> Vec<usize> {
    cues.iter()
        .enumerate()
        .filter(|(_, cue)| cue.contains(position))
        .map(|(idx, _)| idx)
        .collect()
}

/// Tracks which cues are active for the last position seen.
///
/// Every update re-evaluates all cues. Overlapping and out-of-order cues get
/// plain interval containment, nothing more.
#[derive(Debug)]
pub struct Synchronizer {
    cues: CueSequence,
    active: Vec<bool>,
}

impl Synchronizer {
    pub fn new(cues: CueSequence) -> Self {
        let active = vec![false; cues.len()];
        Self {
            cues,
            active,
        }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn entries(&self) -> impl Iterator<Item = CueEntry<'_>> {
        cue_entries(&self.cues)
    }

    pub fn into_cues(self) -> CueSequence {
        self.cues
    }

    pub fn active_flags(&self) -> &[bool] {
        &self.active
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, active)| **active)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Recomputes every cue's flag for `position` and returns the ones that flipped.
    pub fn update(&mut self, position: f64) -> Vec<HighlightChange> {
        let mut changes = Vec::new();
        for (index, (cue, active)) in self.cues.iter().zip(self.active.iter_mut()).enumerate() {
            let now = cue.contains(position);
            if now != *active {
                *active = now;
                changes.push(HighlightChange { index, active: now });
            }
        }
        changes
    }

    /// Where selecting cue `index` should move playback to.
    ///
    /// `None` when the cue's start is not a finite number.
    pub fn seek_target(&self, index: usize) -> Result<Option<f64>, PlayerError> {
        let cue = self.cues.get(index).ok_or(PlayerError::NoSuchCue {
            index,
            len: self.cues.len(),
        })?;
        Ok(Some(cue.start).filter(|start| start.is_finite()))
    }
}
