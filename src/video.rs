//! Video quality switcher.
//!
//! Holds one media element per variant: quality tiers ordered high → low,
//! followed by the looping "loading" placeholder and the "boot" placeholder.
//! Exactly one variant is shown at a time. Switching between real tiers keeps
//! the playback position so a quality change never restarts the clip.

/// Errors raised by a media backend. They never escape the switcher: every
/// failure is logged and playback is allowed to diverge from intent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("media {op} rejected: {reason}")]
    Rejected { op: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VideoError {
    /// Need at least one quality tier plus the loading and boot placeholders.
    #[error("need at least 3 video sources (tiers + loading + boot), got {0}")]
    TooFewSources(usize),
}

/// A single playable, hideable media element.
pub trait MediaElement {
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self) -> Result<(), MediaError>;
    /// Reload from source (resets the element's own position).
    fn load(&mut self) -> Result<(), MediaError>;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn is_paused(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
}

/// The capability scenes get: pick a variant and start/stop it.
pub trait VideoControl {
    fn change(&mut self, to: usize);
    fn play(&mut self);
    fn pause(&mut self);
    /// Number of real quality tiers (N).
    fn tiers(&self) -> usize;
    /// Index of the loading placeholder (== N).
    fn loading(&self) -> usize;
}

pub struct VideoSwitcher<M: MediaElement> {
    videos: Vec<M>,
    current: usize,
    time: f64, // shared position (seconds) carried across tier switches
}

fn warn_on_err(op: &str, res: Result<(), MediaError>) {
    if let Err(e) = res {
        log::warn!("{op} error: {e}");
    }
}

impl<M: MediaElement> VideoSwitcher<M> {
    pub fn new(videos: Vec<M>) -> Result<Self, VideoError> {
        if videos.len() < 3 {
            return Err(VideoError::TooFewSources(videos.len()));
        }
        let boot = videos.len() - 1;
        let mut sw = Self {
            videos,
            current: boot,
            time: 0.0,
        };
        sw.load();
        Ok(sw)
    }

    pub fn tiers(&self) -> usize {
        self.videos.len() - 2
    }

    pub fn loading(&self) -> usize {
        self.videos.len() - 2
    }

    pub fn boot(&self) -> usize {
        self.videos.len() - 1
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Shared playback position in seconds.
    pub fn position(&self) -> f64 {
        self.time
    }

    pub fn videos(&self) -> &[M] {
        &self.videos
    }

    fn hide_all(&mut self) {
        for v in self.videos.iter_mut() {
            warn_on_err("pause", v.pause());
            v.set_visible(false);
        }
    }

    /// Show and start the selected variant; every other variant is paused and hidden.
    pub fn play(&mut self) {
        self.hide_all();
        let vid = &mut self.videos[self.current];
        vid.set_visible(true);
        warn_on_err("play", vid.play());
    }

    /// Show the selected variant paused.
    pub fn pause(&mut self) {
        self.hide_all();
        let vid = &mut self.videos[self.current];
        vid.set_visible(true);
        warn_on_err("pause", vid.pause());
    }

    pub fn load(&mut self) {
        self.hide_all();
        let vid = &mut self.videos[self.current];
        vid.set_visible(true);
        warn_on_err("load", vid.load());
    }

    /// Reload every variant and go back to the boot placeholder.
    pub fn reset(&mut self) {
        for v in self.videos.iter_mut() {
            warn_on_err("load", v.load());
            v.set_visible(false);
        }
        self.current = self.boot();
        self.load();
    }

    /// Switch the visible variant, carrying the playback position over.
    pub fn change(&mut self, to: usize) {
        if to == self.current {
            return;
        }
        if to >= self.videos.len() {
            log::warn!("ignoring switch to unknown video variant {to}");
            return;
        }
        let from = self.current;
        self.current = to;

        // Only real tiers are on the shared timeline.
        if from < self.tiers() {
            self.time = self.videos[from].current_time();
        }
        let was_playing = !self.videos[from].is_paused();

        let tvid = &mut self.videos[to];
        tvid.set_current_time(self.time);
        if was_playing {
            warn_on_err("play", tvid.play());
        } else {
            warn_on_err("pause", tvid.pause());
        }
        tvid.set_visible(true);

        let fvid = &mut self.videos[from];
        fvid.set_visible(false);
        warn_on_err("pause", fvid.pause());
    }
}

impl<M: MediaElement> VideoControl for VideoSwitcher<M> {
    fn change(&mut self, to: usize) {
        VideoSwitcher::change(self, to)
    }
    fn play(&mut self) {
        VideoSwitcher::play(self)
    }
    fn pause(&mut self) {
        VideoSwitcher::pause(self)
    }
    fn tiers(&self) -> usize {
        VideoSwitcher::tiers(self)
    }
    fn loading(&self) -> usize {
        VideoSwitcher::loading(self)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn visible_count(sw: &VideoSwitcher<FakeMedia>) -> usize {
        sw.videos().iter().filter(|v| v.visible).count()
    }

    #[test]
    fn test_new_selects_boot() {
        let sw = switcher(4);
        assert_eq!(sw.tiers(), 4);
        assert_eq!(sw.loading(), 4);
        assert_eq!(sw.boot(), 5);
        assert_eq!(sw.current(), 5);
        assert_eq!(visible_count(&sw), 1);
        assert!(sw.videos()[5].visible);
    }

    #[test]
    fn test_too_few_sources() {
        let res = VideoSwitcher::new(vec![FakeMedia::new(), FakeMedia::new()]);
        assert_eq!(res.err(), Some(VideoError::TooFewSources(2)));
    }

    #[test]
    fn test_change_carries_position_while_playing() {
        let mut sw = switcher(4);
        sw.change(0);
        sw.play();
        sw.videos[0].time = 12.3;
        sw.change(1);
        let v1 = &sw.videos()[1];
        assert!((v1.time - 12.3).abs() < 1e-9);
        assert!(!v1.paused);
        assert!(v1.visible);
        let v0 = &sw.videos()[0];
        assert!(v0.paused);
        assert!(!v0.visible);
        assert!((sw.position() - 12.3).abs() < 1e-9);
        assert_eq!(visible_count(&sw), 1);
    }

    #[test]
    fn test_change_to_same_is_noop() {
        let mut sw = switcher(3);
        sw.change(1);
        let before: Vec<_> = sw.videos().iter().map(|v| v.calls.len()).collect();
        sw.change(1);
        let after: Vec<_> = sw.videos().iter().map(|v| v.calls.len()).collect();
        assert_eq!(before, after);
        assert_eq!(sw.current(), 1);
    }

    #[test]
    fn test_placeholder_does_not_capture_position() {
        let mut sw = switcher(3);
        sw.change(0);
        sw.videos[0].time = 5.0;
        sw.change(sw.loading());
        assert!((sw.position() - 5.0).abs() < 1e-9);
        // the loading loop advances on its own
        let loading = sw.loading();
        sw.videos[loading].time = 99.0;
        sw.change(2);
        assert!((sw.position() - 5.0).abs() < 1e-9);
        assert!((sw.videos()[2].time - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_change_while_paused_stays_paused() {
        let mut sw = switcher(3);
        sw.change(0);
        sw.change(2);
        assert!(sw.videos()[2].paused);
        assert!(sw.videos()[2].visible);
    }

    #[test]
    fn test_every_target_leaves_one_visible() {
        let mut sw = switcher(4);
        sw.play();
        for t in [0, 3, 4, 1, 5, 2, 0] {
            sw.change(t);
            assert_eq!(visible_count(&sw), 1);
            assert!(sw.videos()[t].visible);
        }
    }

    #[test]
    fn test_play_rejection_is_swallowed() {
        let mut sw = switcher(2);
        sw.change(0);
        sw.videos[0].reject_play = true;
        sw.play();
        assert!(sw.videos()[0].paused);
        assert!(sw.videos()[0].visible);
    }

    #[test]
    fn test_reset_returns_to_boot() {
        let mut sw = switcher(3);
        sw.change(1);
        sw.play();
        sw.videos[1].time = 7.0;
        sw.change(2);
        sw.reset();
        assert_eq!(sw.current(), sw.boot());
        assert_eq!(visible_count(&sw), 1);
        assert!(sw.videos().iter().all(|v| v.paused));

        // the shared position survives: the next tier resumes where play stopped
        assert!((sw.position() - 7.0).abs() < 1e-9);
        sw.change(0);
        assert!((sw.videos()[0].time - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_target_ignored() {
        let mut sw = switcher(2);
        sw.change(10);
        assert_eq!(sw.current(), sw.boot());
    }
}
