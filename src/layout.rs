/// Widths of the media and subtitle panes, in percent of the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneSplit {
    pub media: f64,
    pub subtitles: f64,
}

impl PaneSplit {
    pub fn from_media_percent(percent: f64) -> Self {
        let media = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            50.0
        };
        Self {
            media,
            subtitles: 100.0 - media,
        }
    }
}

impl Default for PaneSplit {
    fn default() -> Self {
        Self::from_media_percent(50.0)
    }
}

/// The divider between the two panes. Only moves between `begin` and `end` count.
#[derive(Debug, Default)]
pub struct DividerDrag {
    dragging: bool,
    split: PaneSplit,
}

impl DividerDrag {
    pub fn begin(&mut self) {
        self.dragging = true;
    }

    pub fn move_to(
        &mut self,
        client_x: f64,
        container_left: f64,
        container_width: f64,
    ) -> Option<PaneSplit> {
        if !self.dragging || !(container_width > 0.0) {
            return None;
        }
        let percent = (client_x - container_left) / container_width * 100.0;
        self.split = PaneSplit::from_media_percent(percent);
        Some(self.split)
    }

    /// Finishes the drag, leaving the last split in place.
    pub fn end(&mut self) -> PaneSplit {
        self.dragging = false;
        self.split
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn split(&self) -> PaneSplit {
        self.split
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_are_ignored_until_drag_begins() {
        let mut divider = DividerDrag::default();

        assert_eq!(divider.move_to(300.0, 0.0, 1000.0), None);
        assert_eq!(divider.split(), PaneSplit::default());
    }

    #[test]
    fn split_follows_pointer_relative_to_container() {
        let mut divider = DividerDrag::default();
        divider.begin();

        let split = divider.move_to(500.0, 100.0, 1000.0).unwrap();
        assert_eq!(split.media, 40.0);
        assert_eq!(split.subtitles, 60.0);

        let split = divider.end();
        assert_eq!(split.media, 40.0);
        assert!(!divider.is_dragging());
        assert_eq!(divider.move_to(900.0, 100.0, 1000.0), None);
    }

    #[test]
    fn split_is_clamped() {
        let mut divider = DividerDrag::default();
        divider.begin();

        assert_eq!(divider.move_to(-50.0, 0.0, 200.0).unwrap().media, 0.0);
        assert_eq!(divider.move_to(450.0, 0.0, 200.0).unwrap().subtitles, 0.0);
        assert_eq!(divider.move_to(10.0, 0.0, 0.0), None);
    }
}
