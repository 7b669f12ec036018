use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// `audio/*` and `video/*` are playable, every other content type is not.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().split('/').next() {
            Some(t) if t.eq_ignore_ascii_case("audio") => Some(MediaKind::Audio),
            Some(t) if t.eq_ignore_ascii_case("video") => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Best-effort content type for a media file, going by its extension.
pub fn guess_content_type<P: AsRef<Path>>(path: P) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "m4a" | "aac" => "audio/aac",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        _ => return None,
    };
    Some(content_type)
}

/// A live feed of playback positions from one media element.
///
/// Dropping it is enough for the element to stop sending, but sessions hand
/// the id back through `MediaElement::unsubscribe` when they close.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    updates: Receiver<f64>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Every position published since the last call, oldest first.
    pub fn drain(&self) -> Vec<f64> {
        self.updates.try_iter().collect()
    }
}

pub trait MediaElement {
    fn kind(&self) -> MediaKind;
    fn current_time(&self) -> f64;
    fn seek(&mut self, position: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Lets `elapsed` seconds of wall-clock time pass for the element.
    fn advance(&mut self, elapsed: f64);
    fn subscribe(&mut self) -> Subscription;
    fn unsubscribe(&mut self, id: u64);
}

/// A media element without a decoder: a clock that runs while playing.
#[derive(Debug)]
pub struct SimulatedMedia {
    source: String,
    kind: MediaKind,
    duration: Option<f64>,
    position: f64,
    paused: bool,
    listeners: Vec<(u64, Sender<f64>)>,
    next_id: u64,
}

impl SimulatedMedia {
    pub fn new(source: impl Into<String>, kind: MediaKind, duration: Option<f64>) -> Self {
        Self {
            source: source.into(),
            kind,
            duration: duration.filter(|d| d.is_finite() && *d >= 0.0),
            position: 0.0,
            paused: true,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn clamp(&self, position: f64) -> f64 {
        let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn ended(&self) -> bool {
        self.duration.map_or(false, |d| self.position >= d)
    }

    fn publish(&mut self) {
        let position = self.position;
        trace!("{}: position {:.3}", self.source, position);
        self.listeners.retain(|(_, tx)| tx.send(position).is_ok());
    }
}

impl MediaElement for SimulatedMedia {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, position: f64) {
        self.position = self.clamp(position);
        debug!("{}: seeked to {:.3}", self.source, self.position);
        self.publish();
    }

    fn play(&mut self) {
        self.paused = false;
        if self.ended() {
            self.position = 0.0;
            debug!("{}: restarted from the beginning", self.source);
            self.publish();
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn advance(&mut self, elapsed: f64) {
        if self.paused || !(elapsed > 0.0) {
            return;
        }
        self.position = self.clamp(self.position + elapsed);
        if self.ended() {
            self.paused = true;
        }
        self.publish();
    }

    fn subscribe(&mut self) -> Subscription {
        let (tx, updates) = mpsc::channel();
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, tx));
        trace!("{}: {} listeners", self.source, self.listeners.len());
        Subscription { id, updates }
    }

    fn unsubscribe(&mut self, id: u64) {
        self.listeners.retain(|(listener, _)| *listener != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("audio/mpeg"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_content_type("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_content_type("Video/webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_content_type("text/plain"), None);
        assert_eq!(MediaKind::from_content_type("audiox/foo"), None);
        assert_eq!(MediaKind::from_content_type(""), None);
    }

    #[test]
    fn guesses_content_type_from_extension() {
        assert_eq!(guess_content_type("song.MP3"), Some("audio/mpeg"));
        assert_eq!(guess_content_type("/tmp/clip.webm"), Some("video/webm"));
        assert_eq!(guess_content_type("notes.srt"), None);
        assert_eq!(guess_content_type("noext"), None);
    }

    #[test]
    fn clock_runs_only_while_playing() {
        let mut media = SimulatedMedia::new("clip", MediaKind::Video, None);
        media.advance(1.0);
        assert_eq!(media.current_time(), 0.0);

        media.play();
        media.advance(0.25);
        media.advance(0.25);
        assert_eq!(media.current_time(), 0.5);

        media.pause();
        media.advance(1.0);
        assert_eq!(media.current_time(), 0.5);
    }

    #[test]
    fn stops_at_duration_and_restarts() {
        let mut media = SimulatedMedia::new("clip", MediaKind::Audio, Some(2.0));
        media.play();
        media.advance(5.0);
        assert_eq!(media.current_time(), 2.0);
        assert!(media.is_paused());

        let updates = media.subscribe();
        media.play();
        assert_eq!(media.current_time(), 0.0);
        assert!(!media.is_paused());
        assert_eq!(updates.drain(), vec![0.0]);
    }

    #[test]
    fn subscribers_receive_updates_until_detached() {
        let mut media = SimulatedMedia::new("clip", MediaKind::Video, None);
        let first = media.subscribe();
        let second = media.subscribe();

        media.seek(3.0);
        media.play();
        media.advance(0.5);
        assert_eq!(first.drain(), vec![3.0, 3.5]);

        media.unsubscribe(first.id());
        media.advance(0.5);
        assert!(first.drain().is_empty());
        assert_eq!(second.drain(), vec![3.0, 3.5, 4.0]);
        assert_eq!(media.listener_count(), 1);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let mut media = SimulatedMedia::new("clip", MediaKind::Video, None);
        drop(media.subscribe());
        media.seek(1.0);

        assert_eq!(media.listener_count(), 0);
    }
}
