//! Scene state machines.
//!
//! Every game mode is a [`Scene`] with the four lifecycle hooks
//! (`init → preload → create`, then `update` once per frame) plus reset,
//! keyboard and drawing entry points. Scenes never hold references back to
//! the container: each call receives a [`SceneContext`] with the narrow
//! capabilities it may use (video switching, the controls panel, dice).

use crate::controls::{Controls, Difficulty};
use crate::render::Renderer;
use crate::rng::RandomSource;
use crate::video::VideoControl;

pub mod demo;
pub mod flappy;
pub mod karaoke;

pub use demo::DemoScene;
pub use flappy::{FlappyConfig, FlappyScene};
pub use karaoke::{KaraokeConfig, KaraokeScene};

/// Keys the scenes react to. Everything else is `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Space,
    Up,
    Down,
    Left,
    Right,
    Tab,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Key {
        match key {
            " " | "Spacebar" => Key::Space,
            "ArrowUp" | "Up" => Key::Up,
            "ArrowDown" | "Down" => Key::Down,
            "ArrowLeft" | "Left" => Key::Left,
            "ArrowRight" | "Right" => Key::Right,
            "Tab" => Key::Tab,
            _ => Key::Other,
        }
    }
}

/// Settings read from the controls once per frame and latched by scenes when
/// a round starts.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
}

/// Image keys a scene wants loaded before `create`.
#[derive(Debug, Default, Clone)]
pub struct AssetManifest {
    images: Vec<(&'static str, &'static str)>, // (key, url)
}

impl AssetManifest {
    pub fn image(&mut self, key: &'static str, url: &'static str) {
        if !self.images.iter().any(|(k, _)| *k == key) {
            self.images.push((key, url));
        }
    }

    pub fn images(&self) -> &[(&'static str, &'static str)] {
        &self.images
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.iter().any(|(k, _)| *k == key)
    }
}

pub struct SceneContext<'a> {
    pub video: &'a mut dyn VideoControl,
    pub controls: &'a mut Controls,
    pub rng: &'a mut dyn RandomSource,
    pub session: SessionConfig,
    pub now: f64, // ms, monotonic
}

pub trait Scene {
    fn name(&self) -> &'static str;

    /// First activation, before assets are requested.
    fn init(&mut self) {}

    fn preload(&self, _assets: &mut AssetManifest) {}

    /// Build the scene's static layout. `tiers` is the number of quality tiers.
    fn create(&mut self, tiers: usize);

    fn update(&mut self, ctx: &mut SceneContext<'_>, time: f64, delta: f64);

    fn reset(&mut self);

    /// Returns true when the browser default for this key should be suppressed.
    fn key_down(&mut self, key: Key, ctx: &mut SceneContext<'_>) -> bool;

    fn render(&self, r: &mut dyn Renderer);
}

/// Shared start/end bookkeeping for the timed games.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RoundClock {
    pub started: bool,
    pub first_start: bool, // true once the first started frame ran
    pub ended: bool,
    pub timer: f64, // ms remaining
    pub duration: f64,
}

impl RoundClock {
    pub fn new(duration: f64) -> Self {
        Self {
            started: false,
            first_start: false,
            ended: false,
            timer: duration,
            duration,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.duration);
    }

    /// Count down; returns true on the tick that ends the round.
    pub fn tick(&mut self, delta: f64) -> bool {
        self.timer -= delta;
        if self.timer <= 0.0 {
            self.timer = 0.0;
            self.started = false;
            self.ended = true;
            return true;
        }
        false
    }

    /// True exactly once, on the first frame after a start.
    pub fn latch_first_start(&mut self) -> bool {
        if self.first_start {
            return false;
        }
        self.first_start = true;
        true
    }
}

/// End-of-round side effects shared by the timed games.
pub(crate) fn finish_round(ctx: &mut SceneContext<'_>, scene: &str) {
    ctx.video.pause();
    ctx.controls.enable_score_submit();
    log::info!("{scene}: round over, score {}", ctx.controls.score().round());
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom(" "), Key::Space);
        assert_eq!(Key::from_dom("ArrowUp"), Key::Up);
        assert_eq!(Key::from_dom("ArrowDown"), Key::Down);
        assert_eq!(Key::from_dom("Tab"), Key::Tab);
        assert_eq!(Key::from_dom("a"), Key::Other);
    }

    #[test]
    fn test_round_clock_ends_once() {
        let mut c = RoundClock::new(2000.0);
        c.started = true;
        assert!(c.latch_first_start());
        assert!(!c.latch_first_start());
        assert!(!c.tick(1000.0));
        assert!(c.tick(1500.0));
        assert_eq!(c.timer, 0.0);
        assert!(c.ended && !c.started);
        c.reset();
        assert_eq!(c.timer, 2000.0);
        assert!(!c.ended && !c.first_start);
    }

    #[test]
    fn test_manifest_dedups() {
        let mut m = AssetManifest::default();
        m.image("play", "./assets/play.png");
        m.image("play", "./assets/play.png");
        assert_eq!(m.images().len(), 1);
        assert!(m.contains("play"));
    }
}
