/// One subtitle entry. `start <= end` is expected but not enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Cue {
    /// Closed interval containment: a cue is active at both its start and its end.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }
}

/// Cues in source order. The index is what ties a cue to its presented entry.
pub type CueSequence = Vec<Cue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive() {
        let cue = Cue {
            start: 1.0,
            end: 4.0,
            text: "Hello".to_string(),
        };

        assert!(!cue.contains(0.999));
        assert!(cue.contains(1.0));
        assert!(cue.contains(2.5));
        assert!(cue.contains(4.0));
        assert!(!cue.contains(4.001));
    }

    #[test]
    fn inverted_cue_is_never_active() {
        let cue = Cue {
            start: 5.0,
            end: 2.0,
            text: String::new(),
        };

        assert!(!cue.contains(3.0));
        assert!(!cue.contains(5.0));
    }
}
