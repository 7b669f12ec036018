use crate::cue::{Cue, CueSequence};
use crate::error::{ParseIssue, PlayerError};
use crate::layout::DividerDrag;
use crate::media::{MediaElement, MediaKind, Subscription};
use crate::parser::{Parser, SubtitleFormat};
use crate::serialiser::Presenter;
use crate::sync::{cue_entries, Synchronizer};

use std::io;
use std::mem;

use anyhow::Result;
use log::{debug, info, warn};

/// One media element paired with one cue sequence.
///
/// The session holds the element's position subscription for as long as it
/// lives; `close` hands the id back before returning the parts.
pub struct PlayerSession {
    media: Box<dyn MediaElement>,
    sync: Synchronizer,
    subscription: Subscription,
}

impl PlayerSession {
    pub fn open(mut media: Box<dyn MediaElement>, cues: CueSequence) -> Self {
        let subscription = media.subscribe();
        debug!(
            "Opened session {} ({:?}, {} cues)",
            subscription.id(),
            media.kind(),
            cues.len()
        );
        Self {
            media,
            sync: Synchronizer::new(cues),
            subscription,
        }
    }

    pub fn close(mut self) -> (Box<dyn MediaElement>, CueSequence) {
        let id = self.subscription.id();
        self.media.unsubscribe(id);
        debug!("Closed session {}", id);
        (self.media, self.sync.into_cues())
    }

    pub fn cues(&self) -> &[Cue] {
        self.sync.cues()
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn media(&self) -> &dyn MediaElement {
        self.media.as_ref()
    }

    pub fn media_mut(&mut self) -> &mut dyn MediaElement {
        self.media.as_mut()
    }

    /// Applies every queued position update, telling `presenter` after each one.
    pub fn pump<P: Presenter>(&mut self, presenter: &mut P) -> io::Result<usize> {
        let updates = self.subscription.drain();
        for position in &updates {
            let changes = self.sync.update(*position);
            presenter.highlight(self.sync.active_flags(), &changes)?;
        }
        Ok(updates.len())
    }

    /// Seeks to the start of cue `index` and starts playing.
    pub fn select(&mut self, index: usize) -> Result<Option<f64>, PlayerError> {
        let target = self.sync.seek_target(index)?;
        if let Some(start) = target {
            self.media.seek(start);
            self.media.play();
        }
        Ok(target)
    }
}

/// What a loaded subtitle file turned into.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleSummary {
    pub format: SubtitleFormat,
    pub cues: usize,
    pub issues: Vec<ParseIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The player acted on the key; the host should not handle it too.
    Consumed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub media: Option<MediaKind>,
    pub position: Option<f64>,
    pub paused: Option<bool>,
    pub cues: usize,
    pub active: Vec<usize>,
}

const MAX_WAIT_STEPS: usize = 100_000;

enum Binding {
    Idle,
    MediaOnly(Box<dyn MediaElement>),
    SubtitlesOnly(CueSequence),
    Paired(PlayerSession),
}

/// Routes host events to the current session. There is at most one media
/// element and one cue sequence at a time; loading either replaces the session.
pub struct Player<P: Presenter> {
    parser: Parser,
    presenter: P,
    binding: Binding,
    divider: DividerDrag,
}

impl<P: Presenter> Player<P> {
    pub fn new(presenter: P) -> Result<Self> {
        Ok(Self {
            parser: Parser::new()?,
            presenter,
            binding: Binding::Idle,
            divider: DividerDrag::default(),
        })
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Loads a media file if `content_type` is audio or video; anything else is ignored.
    pub fn load_media<F>(&mut self, content_type: &str, open: F) -> Result<Option<MediaKind>>
    where
        F: FnOnce(MediaKind) -> Box<dyn MediaElement>,
    {
        let kind = match MediaKind::from_content_type(content_type) {
            Some(kind) => kind,
            None => {
                info!("Ignoring media with content type '{}'", content_type);
                return Ok(None);
            }
        };
        let media = open(kind);

        let (binding, rebound) = match mem::replace(&mut self.binding, Binding::Idle) {
            Binding::Idle | Binding::MediaOnly(_) => (Binding::MediaOnly(media), false),
            Binding::SubtitlesOnly(cues) => (Binding::Paired(PlayerSession::open(media, cues)), true),
            Binding::Paired(session) => {
                let (_, cues) = session.close();
                (Binding::Paired(PlayerSession::open(media, cues)), true)
            }
        };
        self.binding = binding;
        info!("Loaded {:?} media", kind);

        if rebound {
            self.render()?;
        }
        Ok(Some(kind))
    }

    pub fn load_subtitles(&mut self, raw: &str) -> Result<SubtitleSummary> {
        let parsed = self.parser.parse_subtitles(raw);
        let summary = SubtitleSummary {
            format: parsed.format,
            cues: parsed.cues.len(),
            issues: parsed.issues.clone(),
        };
        if !parsed.issues.is_empty() {
            warn!(
                "Skipped {} subtitle entries, {} issues in total",
                parsed.skipped(),
                parsed.issues.len()
            );
        }
        info!("Loaded {} cues ({:?})", summary.cues, summary.format);

        self.binding = match mem::replace(&mut self.binding, Binding::Idle) {
            Binding::Idle | Binding::SubtitlesOnly(_) => Binding::SubtitlesOnly(parsed.cues),
            Binding::MediaOnly(media) => Binding::Paired(PlayerSession::open(media, parsed.cues)),
            Binding::Paired(session) => {
                let (media, _) = session.close();
                Binding::Paired(PlayerSession::open(media, parsed.cues))
            }
        };
        self.render()?;
        Ok(summary)
    }

    /// Seeks to the start of cue `index` and starts playback.
    pub fn select(&mut self, index: usize) -> Result<()> {
        match &mut self.binding {
            Binding::Paired(session) => {
                if let Some(start) = session.select(index)? {
                    info!("Selected cue {}, playing from {:.3}", index, start);
                }
            }
            Binding::SubtitlesOnly(_) => return Err(PlayerError::NoMedia.into()),
            Binding::Idle | Binding::MediaOnly(_) => return Err(PlayerError::NoSubtitles.into()),
        }
        self.pump()
    }

    /// Space toggles playback when there is something to play.
    pub fn handle_key(&mut self, code: &str) -> KeyOutcome {
        if code != "Space" && code != " " {
            return KeyOutcome::Ignored;
        }
        match self.media_mut() {
            Some(media) => {
                if media.is_paused() {
                    media.play();
                } else {
                    media.pause();
                }
                debug!("Playback {}", if media.is_paused() { "paused" } else { "resumed" });
                KeyOutcome::Consumed
            }
            None => KeyOutcome::Ignored,
        }
    }

    /// Lets `elapsed` seconds pass on the media clock and applies the resulting updates.
    pub fn advance(&mut self, elapsed: f64) -> Result<()> {
        if let Some(media) = self.media_mut() {
            media.advance(elapsed);
        }
        self.pump()
    }

    /// Lets `secs` pass in steps of at most `tick`, pumping after each step.
    /// Stops early once playback pauses, and never takes more than
    /// `MAX_WAIT_STEPS` steps.
    pub fn wait(&mut self, secs: f64, tick: f64) -> Result<()> {
        if !(secs > 0.0) || !(tick > 0.0) {
            return Ok(());
        }
        let steps = (secs / tick).ceil().min(MAX_WAIT_STEPS as f64) as usize;
        let step = secs / steps as f64;
        for _ in 0..steps {
            if !self.is_playing() {
                break;
            }
            self.advance(step)?;
        }
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.status().paused == Some(false)
    }

    /// Moves the playback position without changing the play state.
    pub fn seek(&mut self, position: f64) -> Result<()> {
        match self.media_mut() {
            Some(media) => media.seek(position),
            None => return Err(PlayerError::NoMedia.into()),
        }
        self.pump()
    }

    pub fn pump(&mut self) -> Result<()> {
        if let Binding::Paired(session) = &mut self.binding {
            session.pump(&mut self.presenter)?;
        }
        Ok(())
    }

    pub fn begin_divider_drag(&mut self) {
        self.divider.begin();
    }

    pub fn move_divider(
        &mut self,
        client_x: f64,
        container_left: f64,
        container_width: f64,
    ) -> Result<()> {
        if let Some(split) = self
            .divider
            .move_to(client_x, container_left, container_width)
        {
            self.presenter.layout(split)?;
        }
        Ok(())
    }

    pub fn end_divider_drag(&mut self) -> Result<()> {
        if self.divider.is_dragging() {
            let split = self.divider.end();
            self.presenter.layout(split)?;
        }
        Ok(())
    }

    pub fn status(&self) -> Status {
        let (media, cues, active): (Option<&dyn MediaElement>, usize, Vec<usize>) =
            match &self.binding {
                Binding::Idle => (None, 0, Vec::new()),
                Binding::MediaOnly(media) => (Some(media.as_ref()), 0, Vec::new()),
                Binding::SubtitlesOnly(cues) => (None, cues.len(), Vec::new()),
                Binding::Paired(session) => (
                    Some(session.media()),
                    session.cues().len(),
                    session.synchronizer().active_indices(),
                ),
            };
        Status {
            media: media.map(|m| m.kind()),
            position: media.map(|m| m.current_time()),
            paused: media.map(|m| m.is_paused()),
            cues,
            active,
        }
    }

    fn media_mut(&mut self) -> Option<&mut dyn MediaElement> {
        match &mut self.binding {
            Binding::MediaOnly(media) => Some(media.as_mut()),
            Binding::Paired(session) => Some(session.media_mut()),
            Binding::Idle | Binding::SubtitlesOnly(_) => None,
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let cues: &[Cue] = match &self.binding {
            Binding::SubtitlesOnly(cues) => cues,
            Binding::Paired(session) => session.cues(),
            Binding::Idle | Binding::MediaOnly(_) => &[],
        };
        let entries: Vec<_> = cue_entries(cues).collect();
        self.presenter.show_cues(&entries)
    }
}
