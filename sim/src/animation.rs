use engine::collab::AnimationDriver;

// Tracks which named clip is playing and how long it has run.
#[derive(Debug, Clone)]
pub struct ClipMixer {
    clips: Vec<&'static str>,
    current: Option<&'static str>,
    clip_time: f32,
}

impl ClipMixer {
    #[must_use]
    pub fn new(clips: &[&'static str]) -> Self {
        Self {
            clips: clips.to_vec(),
            current: None,
            clip_time: 0.0,
        }
    }

    #[must_use]
    pub const fn current(&self) -> Option<&'static str> {
        self.current
    }

    #[must_use]
    pub const fn clip_time(&self) -> f32 {
        self.clip_time
    }
}

impl AnimationDriver for ClipMixer {
    fn transition_to_animation(&mut self, name: &str) -> bool {
        let Some(&clip) = self.clips.iter().find(|&&c| c == name) else {
            return false;
        };
        if self.current != Some(clip) {
            self.current = Some(clip);
            self.clip_time = 0.0;
        }
        true
    }

    fn update(&mut self, dt: f32) {
        if self.current.is_some() {
            self.clip_time += dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_clips_restarts_the_clock() {
        let mut mixer = ClipMixer::new(&["walk", "run"]);
        assert!(mixer.transition_to_animation("walk"));
        mixer.update(0.5);
        assert!(mixer.transition_to_animation("walk"));
        assert_eq!(mixer.clip_time(), 0.5);
        assert!(mixer.transition_to_animation("run"));
        assert_eq!(mixer.clip_time(), 0.0);
        assert!(!mixer.transition_to_animation("stunned"));
        assert_eq!(mixer.current(), Some("run"));
    }
}
