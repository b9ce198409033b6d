//! Manual quality picker: the player moves a cursor over the tier guide lines
//! and toggles playback.

use super::{AssetManifest, Key, Scene, SceneContext};
use crate::physics::Rect;
use crate::render::{self, BLACK, BLUE, Line, Renderer};
use crate::WIDTH;

const POINTER_X: f64 = WIDTH / 3.0;
const POINTER_SIZE: f64 = 48.0;

pub struct DemoScene {
    lines: Vec<Line>,
    tiers: usize,
    playing: bool,
    current: usize, // selected tier, 0 = best
}

impl DemoScene {
    pub fn new(tiers: usize) -> Self {
        Self {
            lines: Vec::new(),
            tiers,
            playing: false,
            current: tiers.saturating_sub(1),
        }
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn current(&self) -> usize {
        self.current
    }

    fn pointer_y(&self) -> f64 {
        self.lines.get(self.current).map(|l| l.y1).unwrap_or(0.0)
    }
}

impl Scene for DemoScene {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn preload(&self, assets: &mut AssetManifest) {
        assets.image("play", "./assets/play.png");
        assets.image("pause", "./assets/pause.png");
    }

    fn create(&mut self, tiers: usize) {
        self.tiers = tiers;
        self.lines = render::tier_lines(tiers);
        self.current = self.current.min(tiers.saturating_sub(1));
    }

    fn update(&mut self, _ctx: &mut SceneContext<'_>, _time: f64, _delta: f64) {
        // Nothing advances on its own here; all state changes come from keys.
    }

    fn reset(&mut self) {
        self.playing = false;
        self.current = self.tiers.saturating_sub(1);
    }

    fn key_down(&mut self, key: Key, ctx: &mut SceneContext<'_>) -> bool {
        let mut index = self.current;
        match key {
            Key::Space => {
                self.playing = !self.playing;
                if self.playing {
                    ctx.video.change(self.current);
                    ctx.video.play();
                } else {
                    let loading = ctx.video.loading();
                    ctx.video.change(loading);
                }
            }
            Key::Up => index = self.current.saturating_sub(1),
            Key::Down => index = (self.current + 1).min(self.tiers.saturating_sub(1)),
            _ => return false,
        }
        if index != self.current {
            ctx.video.change(index);
            self.current = index;
        }
        true
    }

    fn render(&self, r: &mut dyn Renderer) {
        r.clear(BLUE);
        let current_y = render::draw_tier_lines(r, &self.lines, self.current);
        if let Some(first) = self.lines.first() {
            r.draw_text("High Quality", 10.0, first.y1, 30.0, BLACK);
        }
        if self.lines.len() > 1 {
            if let Some(last) = self.lines.last() {
                r.draw_text("Low Quality", 10.0, last.y1, 30.0, BLACK);
            }
        }
        let sprite = if self.playing { "play" } else { "pause" };
        r.draw_image(
            sprite,
            &Rect::centered(POINTER_X, current_y, POINTER_SIZE, POINTER_SIZE),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::RecordingRenderer;
    use crate::scene::testing::Harness;

    fn demo(h: &Harness) -> DemoScene {
        let tiers = h.video.tiers();
        let mut d = DemoScene::new(tiers);
        d.create(tiers);
        d
    }

    #[test]
    fn test_starts_at_lowest_tier() {
        let h = Harness::new(4, &[0.5]);
        let d = demo(&h);
        assert_eq!(d.current(), 3);
        assert!(!d.playing());
    }

    #[test]
    fn test_space_toggles_playback() {
        let mut h = Harness::new(4, &[0.5]);
        let mut d = demo(&h);
        assert!(h.key(&mut d, Key::Space));
        assert!(d.playing());
        assert_eq!(h.video.current(), 3);
        assert!(!h.video.videos()[3].paused);

        h.key(&mut d, Key::Space);
        assert!(!d.playing());
        assert_eq!(h.video.current(), h.video.loading());
        // loading inherits the playing state of the tier it replaced
        assert!(!h.video.videos()[h.video.loading()].paused);
    }

    #[test]
    fn test_up_down_clamp_and_switch() {
        let mut h = Harness::new(3, &[0.5]);
        let mut d = demo(&h);
        h.key(&mut d, Key::Down);
        assert_eq!(d.current(), 2);
        assert_eq!(h.video.current(), h.video.boot(), "no change without movement");

        h.key(&mut d, Key::Up);
        assert_eq!(d.current(), 1);
        assert_eq!(h.video.current(), 1, "switch happens even while paused");
        h.key(&mut d, Key::Up);
        h.key(&mut d, Key::Up);
        assert_eq!(d.current(), 0);
    }

    #[test]
    fn test_other_keys_pass_through() {
        let mut h = Harness::new(3, &[0.5]);
        let mut d = demo(&h);
        assert!(!h.key(&mut d, Key::Tab));
    }

    #[test]
    fn test_reset() {
        let mut h = Harness::new(3, &[0.5]);
        let mut d = demo(&h);
        h.key(&mut d, Key::Up);
        h.key(&mut d, Key::Space);
        d.reset();
        assert!(!d.playing());
        assert_eq!(d.current(), 2);
    }

    #[test]
    fn test_render_highlights_current() {
        let h = Harness::new(4, &[0.5]);
        let d = demo(&h);
        let mut r = RecordingRenderer::default();
        d.render(&mut r);
        assert_eq!(r.lines.len(), 4);
        assert_eq!(r.lines.iter().filter(|(_, c)| *c == crate::render::RED).count(), 1);
        assert_eq!(r.images[0].0, "pause");
        assert!(r.texts.contains(&"High Quality".to_string()));
    }
}
