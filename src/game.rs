//! Game container: owns the video switcher, the controls model and the three
//! scenes, routes frames and keys to the active scene and handles mode
//! switching and resets.

use crate::controls::{Controls, GameMode};
use crate::render::Renderer;
use crate::rng::{RandomSource, Rng};
use crate::scene::{
    AssetManifest, DemoScene, FlappyScene, Key, KaraokeScene, Scene, SceneContext, SessionConfig,
};
use crate::scoreboard::ScoreSubmission;
use crate::video::{MediaElement, VideoSwitcher};

/// Longest frame the loop will feed to a scene. A tab that was hidden for a
/// while resumes with one capped frame instead of eating the round timer.
pub const MAX_FRAME_DELTA: f64 = 250.0;

/// Milliseconds to simulate for a frame at `now`, given the previous frame time.
pub fn frame_delta(last: Option<f64>, now: f64) -> f64 {
    last.map_or(0.0, |prev| (now - prev).clamp(0.0, MAX_FRAME_DELTA))
}

pub struct GameContainer<M: MediaElement, R: RandomSource = Rng> {
    video: VideoSwitcher<M>,
    controls: Controls,
    rng: R,
    scenes: [Box<dyn Scene>; 3], // indexed by GameMode::index
    created: [bool; 3],
    assets: AssetManifest,
}

impl<M: MediaElement> GameContainer<M, Rng> {
    pub fn new(video: VideoSwitcher<M>) -> Self {
        Self::with_rng(video, Rng::from_entropy())
    }
}

impl<M: MediaElement, R: RandomSource> GameContainer<M, R> {
    pub fn with_rng(video: VideoSwitcher<M>, rng: R) -> Self {
        let tiers = video.tiers();
        Self::with_scenes(
            video,
            rng,
            [
                Box::new(DemoScene::new(tiers)),
                Box::new(FlappyScene::default()),
                Box::new(KaraokeScene::default()),
            ],
        )
    }

    /// Build with custom scene instances (one per `GameMode`, in `GameMode::ALL` order).
    pub fn with_scenes(video: VideoSwitcher<M>, rng: R, scenes: [Box<dyn Scene>; 3]) -> Self {
        let mut game = Self {
            video,
            controls: Controls::new(),
            rng,
            scenes,
            created: [false; 3],
            assets: AssetManifest::default(),
        };
        game.activate(GameMode::Demo);
        game
    }

    pub fn video(&self) -> &VideoSwitcher<M> {
        &self.video
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub fn mode(&self) -> GameMode {
        self.controls.mode()
    }

    /// Every image any activated scene asked for.
    pub fn assets(&self) -> &AssetManifest {
        &self.assets
    }

    fn activate(&mut self, mode: GameMode) {
        self.controls.set_mode(mode);
        let idx = mode.index();
        if !self.created[idx] {
            let tiers = self.video.tiers();
            let scene = &mut self.scenes[idx];
            scene.init();
            scene.preload(&mut self.assets);
            scene.create(tiers);
            self.created[idx] = true;
            log::info!("scene {} created", scene.name());
        }
    }

    /// Change game mode and start it fresh.
    pub fn switch_mode(&mut self, mode: GameMode) {
        log::info!("switching to {}", mode.key());
        self.activate(mode);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.video.reset();
        self.controls.reset();
        let idx = self.controls.mode().index();
        self.scenes[idx].reset();
    }

    /// One frame. `time` is the frame timestamp in ms, `delta` the ms since the last frame.
    pub fn tick(&mut self, time: f64, delta: f64) {
        let idx = self.controls.mode().index();
        let mut ctx = SceneContext {
            session: SessionConfig {
                difficulty: self.controls.difficulty(),
            },
            video: &mut self.video,
            controls: &mut self.controls,
            rng: &mut self.rng,
            now: time,
        };
        self.scenes[idx].update(&mut ctx, time, delta);
    }

    /// Route a key press; returns true when the browser default should be suppressed.
    pub fn key_down(&mut self, key: Key, now: f64) -> bool {
        let idx = self.controls.mode().index();
        let mut ctx = SceneContext {
            session: SessionConfig {
                difficulty: self.controls.difficulty(),
            },
            video: &mut self.video,
            controls: &mut self.controls,
            rng: &mut self.rng,
            now,
        };
        self.scenes[idx].key_down(key, &mut ctx)
    }

    pub fn render(&self, r: &mut dyn Renderer) {
        self.scenes[self.controls.mode().index()].render(r);
    }

    pub fn submit_score(&mut self) -> Option<ScoreSubmission> {
        let sub = self.controls.submit();
        if let Some(s) = &sub {
            log::info!("submitting {} for {} in {}", s.score, s.name, s.game);
        }
        sub
    }
}
