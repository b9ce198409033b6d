//! "Bit Rate Optimizer": the player rides one of the tier guide lines while
//! error zones scroll in from the right. Higher tiers score more but are
//! blocked more often; hitting a zone buffers (longer on lower tiers), and
//! angry-user markers on the bottom line cost points.

use std::collections::VecDeque;

use super::{AssetManifest, Key, RoundClock, Scene, SceneContext, finish_round};
use crate::physics::{Body, Rect};
use crate::render::{self, BLACK, BLUE, Line, RED, Renderer};
use crate::{HEIGHT, WIDTH};

const POINTER_X: f64 = WIDTH / 5.0;
const POINTER_SIZE: f64 = 32.0;

const ERROR_START: f64 = WIDTH;
const ERROR_BUFFER: f64 = 50.0; // spawn when the newest zone is this close to the right edge
const ERROR_SPACER: f64 = 100.0; // zone width and gap between zones
const ZONE_OVERHANG: f64 = 20.0; // zones reach a bit below their target line

const USER_SIZE: f64 = 48.0;
const USER_LIFT: f64 = 50.0; // above the bottom guide line

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KaraokeConfig {
    pub game_time: f64,    // ms
    pub error_chance: f64, // per-tier chance that an error zone stops there
    pub buffer_time: f64,  // ms per tier below the top (N - current)
    pub zone_speed: f64,   // px/s before the difficulty modifier
    pub user_chance: f64,
    /// Zones ending on this tier never come with an angry user.
    pub user_excluded_tier: Option<usize>,
    pub user_penalty: f64,
}

impl Default for KaraokeConfig {
    fn default() -> Self {
        Self {
            game_time: 60.0 * 1000.0,
            error_chance: 0.5,
            buffer_time: 200.0,
            zone_speed: 100.0,
            user_chance: 0.5,
            user_excluded_tier: Some(2),
            user_penalty: 50.0,
        }
    }
}

/// Cumulative probability of an error zone reaching down to each tier.
/// Non-decreasing; the last entry is always 1.
pub fn cumulative_chances(tiers: usize, base: f64) -> Vec<f64> {
    let mut chances: Vec<f64> = Vec::with_capacity(tiers);
    for i in 0..tiers {
        let c = if i + 1 == tiers {
            1.0
        } else if i == 0 {
            base
        } else {
            let prev = chances[i - 1];
            prev + (1.0 - prev) * base
        };
        chances.push(c);
    }
    chances
}

/// First bucket whose cumulative chance covers `roll`.
pub fn pick_tier(chances: &[f64], roll: f64) -> usize {
    chances
        .iter()
        .position(|&c| c >= roll)
        .unwrap_or(chances.len().saturating_sub(1))
}

pub struct KaraokeScene {
    config: KaraokeConfig,
    tiers: usize,
    lines: Vec<Line>,
    chances: Vec<f64>,
    pointer: Body,
    errors: VecDeque<Body>, // oldest first
    users: VecDeque<Body>,  // oldest first
    current: usize,
    clock: RoundClock,
    buffer_time: f64,
    diff_mod: f64,
}

impl KaraokeScene {
    pub fn new(config: KaraokeConfig) -> Self {
        Self {
            config,
            tiers: 0,
            lines: Vec::new(),
            chances: Vec::new(),
            pointer: Body::new(Rect::default()),
            errors: VecDeque::new(),
            users: VecDeque::new(),
            current: 0,
            clock: RoundClock::new(config.game_time),
            buffer_time: 0.0,
            diff_mod: 1.0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn started(&self) -> bool {
        self.clock.started
    }

    pub fn ended(&self) -> bool {
        self.clock.ended
    }

    pub fn timer(&self) -> f64 {
        self.clock.timer
    }

    pub fn chances(&self) -> &[f64] {
        &self.chances
    }

    pub fn errors(&self) -> &VecDeque<Body> {
        &self.errors
    }

    pub fn users(&self) -> &VecDeque<Body> {
        &self.users
    }

    fn line_y(&self, tier: usize) -> f64 {
        self.lines.get(tier).map(|l| l.y1).unwrap_or(0.0)
    }

    fn place_pointer(&mut self) {
        let y = self.line_y(self.current);
        self.pointer.rect = Rect::centered(POINTER_X, y, POINTER_SIZE, POINTER_SIZE);
    }

    fn spawn_error(&mut self, ctx: &mut SceneContext<'_>) {
        let roll = ctx.rng.next_f64();
        let user_roll = ctx.rng.next_f64();
        let index = pick_tier(&self.chances, roll);

        let mut nx = ERROR_START;
        if let Some(newest) = self.errors.back() {
            if newest.rect.right() > ERROR_START {
                nx = newest.rect.right() + ERROR_SPACER;
            }
        }

        // A zone on the last tier is empty: every line is safe.
        let height = if index + 1 < self.tiers {
            self.line_y(index) + ZONE_OVERHANG
        } else {
            0.0
        };
        let vx = -self.config.zone_speed * self.diff_mod;

        let mut zone = Body::new(Rect::new(nx, 0.0, ERROR_SPACER, height));
        zone.vx = vx;
        self.errors.push_back(zone);
        log::debug!("karaoke: error zone down to tier {index} at x={nx:.0}");

        if self.config.user_excluded_tier != Some(index)
            && user_roll > 1.0 - self.config.user_chance
        {
            let bottom = self.line_y(self.tiers.saturating_sub(1));
            let mut user = Body::new(Rect::new(nx, bottom - USER_LIFT, USER_SIZE, USER_SIZE));
            user.vx = vx;
            self.users.push_back(user);
        }
    }

    fn play_round(&mut self, ctx: &mut SceneContext<'_>, delta: f64) {
        if self.clock.latch_first_start() {
            self.diff_mod = ctx.session.difficulty.modifier();
            log::info!("karaoke: round started (difficulty x{})", self.diff_mod);
        }

        if self.clock.tick(delta) {
            finish_round(ctx, self.name());
            return;
        }

        let tiers_below_top = (self.tiers - self.current) as f64;

        self.buffer_time -= delta;
        if self.pointer.overlaps_any(self.errors.iter()) {
            self.buffer_time = self
                .buffer_time
                .max(self.config.buffer_time * tiers_below_top);
        }

        if self.buffer_time > 0.0 {
            let loading = ctx.video.loading();
            ctx.video.change(loading);
        } else {
            ctx.video.change(self.current);
            ctx.controls
                .add_score(delta * self.diff_mod * tiers_below_top / 1000.0);
        }

        let pointer = self.pointer.rect;
        if let Some(user) = self.users.iter_mut().find(|u| u.overlaps(&pointer)) {
            user.visible = false;
            user.rect.y = HEIGHT * 2.0;
            ctx.controls.add_score(-self.config.user_penalty);
        }

        let spawn = match self.errors.back() {
            None => true,
            Some(newest) => newest.rect.right() < WIDTH + ERROR_BUFFER,
        };
        if spawn {
            self.spawn_error(ctx);
        }

        if self
            .errors
            .front()
            .is_some_and(|e| e.rect.right() < -ERROR_SPACER)
        {
            self.errors.pop_front();
        }
        if self
            .users
            .front()
            .is_some_and(|u| u.rect.right() < -ERROR_SPACER)
        {
            self.users.pop_front();
        }
    }
}

impl Default for KaraokeScene {
    fn default() -> Self {
        Self::new(KaraokeConfig::default())
    }
}

impl Scene for KaraokeScene {
    fn name(&self) -> &'static str {
        "karaoke"
    }

    fn preload(&self, assets: &mut AssetManifest) {
        assets.image("play", "./assets/play.png");
        assets.image("angry", "./assets/angry.png");
    }

    fn create(&mut self, tiers: usize) {
        self.tiers = tiers;
        self.lines = render::tier_lines(tiers);
        self.chances = cumulative_chances(tiers, self.config.error_chance);
        self.current = self.current.min(tiers.saturating_sub(1));
        self.place_pointer();
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _time: f64, delta: f64) {
        self.place_pointer();
        for b in self.errors.iter_mut().chain(self.users.iter_mut()) {
            b.step(delta);
        }

        if self.clock.started {
            self.play_round(ctx, delta);
        } else {
            for b in self.errors.iter_mut().chain(self.users.iter_mut()) {
                b.stop();
            }
        }
    }

    fn reset(&mut self) {
        self.current = 0;
        self.clock.reset();
        self.buffer_time = 0.0;
        self.errors.clear();
        self.users.clear();
        self.diff_mod = 1.0;
        self.place_pointer();
    }

    fn key_down(&mut self, key: Key, ctx: &mut SceneContext<'_>) -> bool {
        let ended = self.clock.ended;
        let mut index = self.current;
        match key {
            Key::Space if !ended => {
                self.clock.started = true;
                ctx.video.change(self.current);
                ctx.video.play();
            }
            Key::Up if !ended => index = self.current.saturating_sub(1),
            Key::Down if !ended => {
                index = (self.current + 1).min(self.tiers.saturating_sub(1))
            }
            Key::Left | Key::Right | Key::Tab => return true,
            _ => return false,
        }
        if index != self.current {
            if self.clock.started {
                ctx.video.change(index);
            }
            self.current = index;
        }
        true
    }

    fn render(&self, r: &mut dyn Renderer) {
        r.clear(BLUE);
        let current_y = render::draw_tier_lines(r, &self.lines, self.current);
        for e in &self.errors {
            r.fill_rect(&e.rect, RED, 0.5);
        }
        for u in self.users.iter().filter(|u| u.visible) {
            r.draw_image("angry", &u.rect);
        }
        r.draw_image(
            "play",
            &Rect::centered(POINTER_X, current_y, POINTER_SIZE, POINTER_SIZE),
        );
        r.draw_text(&render::timer_text(self.clock.timer), 10.0, 20.0, 30.0, BLACK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Difficulty;
    use crate::render::testing::RecordingRenderer;
    use crate::scene::testing::Harness;

    fn scene(config: KaraokeConfig) -> KaraokeScene {
        let mut s = KaraokeScene::new(config);
        s.create(4);
        s
    }

    fn blanket() -> Body {
        Body::new(Rect::new(0.0, 0.0, WIDTH, HEIGHT))
    }

    #[test]
    fn test_cumulative_chances() {
        let c = cumulative_chances(4, 0.5);
        assert_eq!(c, vec![0.5, 0.75, 0.875, 1.0]);
        assert_eq!(cumulative_chances(1, 0.5), vec![1.0]);
        assert!(cumulative_chances(0, 0.5).is_empty());
        for n in 1..10 {
            let c = cumulative_chances(n, 0.3);
            assert!(c.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(*c.last().unwrap(), 1.0);
        }
    }

    #[test]
    fn test_pick_tier_buckets() {
        let c = cumulative_chances(4, 0.5);
        assert_eq!(pick_tier(&c, 0.0), 0);
        assert_eq!(pick_tier(&c, 0.5), 0);
        assert_eq!(pick_tier(&c, 0.6), 1);
        assert_eq!(pick_tier(&c, 0.8), 2);
        assert_eq!(pick_tier(&c, 0.99), 3);
    }

    #[test]
    fn test_space_starts_and_syncs_video() {
        let mut h = Harness::new(4, &[0.6, 0.9]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Down);
        assert_eq!(s.current(), 1);
        assert_eq!(h.video.current(), h.video.boot(), "no sync before start");

        assert!(h.key(&mut s, Key::Space));
        assert!(s.started());
        assert_eq!(h.video.current(), 1);
        assert!(!h.video.videos()[1].paused);

        h.key(&mut s, Key::Up);
        assert_eq!(h.video.current(), 0, "moving while started re-syncs");
    }

    #[test]
    fn test_score_rate_scales_with_tier_and_difficulty() {
        let mut h = Harness::new(4, &[0.99, 0.0]);
        h.controls.set_difficulty(Difficulty::Medium);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        h.tick(&mut s, 100.0);
        // tier 0 of 4, x2
        assert!((h.controls.score() - 0.8).abs() < 1e-9);
        h.key(&mut s, Key::Down);
        h.key(&mut s, Key::Down);
        h.key(&mut s, Key::Down);
        h.tick(&mut s, 100.0);
        assert!((h.controls.score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_zone_buffers_longer_on_low_tiers() {
        let mut h = Harness::new(4, &[0.99, 0.0]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        s.errors.push_back(blanket());
        h.tick(&mut s, 16.0);
        assert_eq!(s.buffer_time, 800.0);
        assert_eq!(h.video.current(), h.video.loading());
        assert_eq!(h.controls.score(), 0.0);

        s.reset();
        h.key(&mut s, Key::Space);
        for _ in 0..3 {
            h.key(&mut s, Key::Down);
        }
        s.buffer_time = 0.0;
        s.errors.push_back(blanket());
        h.tick(&mut s, 16.0);
        assert_eq!(s.buffer_time, 200.0);
    }

    #[test]
    fn test_buffer_is_only_extended() {
        let mut h = Harness::new(4, &[0.99, 0.0]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        for _ in 0..3 {
            h.key(&mut s, Key::Down);
        }
        s.buffer_time = 516.0;
        s.errors.push_back(blanket());
        h.tick(&mut s, 16.0);
        assert_eq!(s.buffer_time, 500.0);
    }

    #[test]
    fn test_angry_user_costs_points_once() {
        let mut h = Harness::new(4, &[0.99, 0.0]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        for _ in 0..3 {
            h.key(&mut s, Key::Down);
        }
        let y = s.line_y(3);
        s.users
            .push_back(Body::new(Rect::centered(POINTER_X, y, USER_SIZE, USER_SIZE)));
        s.users
            .push_back(Body::new(Rect::centered(POINTER_X, y, USER_SIZE, USER_SIZE)));
        h.tick(&mut s, 100.0);
        // +0.1 for tier 3 of 4, -50 for exactly one user
        assert!((h.controls.score() - (0.1 - 50.0)).abs() < 1e-9);
        assert!(!s.users()[0].visible);
        assert_eq!(s.users()[0].rect.y, HEIGHT * 2.0);
        assert!(s.users()[1].visible);
    }

    #[test]
    fn test_spawn_zone_and_user() {
        let mut h = Harness::new(4, &[0.6, 0.9]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        h.tick(&mut s, 16.0);
        let zone = s.errors()[0];
        assert_eq!(zone.rect.x, ERROR_START);
        assert_eq!(zone.rect.w, ERROR_SPACER);
        assert!((zone.rect.h - (s.line_y(1) + ZONE_OVERHANG)).abs() < 1e-9);
        assert_eq!(zone.vx, -100.0);
        assert_eq!(s.users().len(), 1);
        assert_eq!(s.users()[0].rect.y, s.line_y(3) - USER_LIFT);
    }

    #[test]
    fn test_excluded_tier_never_gets_user() {
        let mut h = Harness::new(4, &[0.8, 0.9]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        h.tick(&mut s, 16.0);
        assert_eq!(s.errors().len(), 1);
        assert!(s.users().is_empty());

        let mut h = Harness::new(4, &[0.8, 0.9]);
        let mut s = scene(KaraokeConfig {
            user_excluded_tier: None,
            ..Default::default()
        });
        h.key(&mut s, Key::Space);
        h.tick(&mut s, 16.0);
        assert_eq!(s.users().len(), 1);
    }

    #[test]
    fn test_top_bucket_zone_is_empty() {
        let mut h = Harness::new(4, &[0.95, 0.1]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        h.tick(&mut s, 16.0);
        assert_eq!(s.errors()[0].rect.h, 0.0);
        assert!(s.users().is_empty());
    }

    #[test]
    fn test_frozen_after_round_ends() {
        let mut h = Harness::new(4, &[0.6, 0.9]);
        let mut s = scene(KaraokeConfig {
            game_time: 500.0,
            ..Default::default()
        });
        h.key(&mut s, Key::Space);
        for _ in 0..4 {
            h.tick(&mut s, 100.0);
        }
        assert!(!s.errors().is_empty());
        h.tick(&mut s, 100.0);
        assert!(s.ended());
        assert!(h.controls.submit_enabled());
        let score = h.controls.score();

        h.tick(&mut s, 100.0);
        let xs: Vec<f64> = s.errors().iter().map(|e| e.rect.x).collect();
        h.tick(&mut s, 100.0);
        let xs_later: Vec<f64> = s.errors().iter().map(|e| e.rect.x).collect();
        assert_eq!(xs, xs_later);
        assert!(s.errors().iter().chain(s.users().iter()).all(|b| b.vx == 0.0));
        assert_eq!(h.controls.score(), score);

        // keys are dead after the end
        assert!(!h.key(&mut s, Key::Space));
        assert!(!h.key(&mut s, Key::Up));
        assert!(!s.started());
    }

    #[test]
    fn test_zones_stay_fifo_and_despawn() {
        let mut h = Harness::new(4, &[0.3, 0.7, 0.95, 0.2, 0.6, 0.8]);
        h.controls.set_difficulty(Difficulty::Hard);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        let mut max_len = 0;
        for _ in 0..400 {
            h.tick(&mut s, 50.0);
            let xs: Vec<f64> = s.errors().iter().map(|e| e.rect.x).collect();
            assert!(xs.windows(2).all(|w| w[0] <= w[1]), "zones out of order: {xs:?}");
            let us: Vec<f64> = s.users().iter().map(|u| u.rect.x).collect();
            assert!(us.windows(2).all(|w| w[0] <= w[1]));
            max_len = max_len.max(s.errors().len());
        }
        // 400 ticks at 300 px/s scroll 6000 px, far more than fits on screen
        assert!(max_len < 20);
        assert!(s.errors().front().unwrap().rect.right() >= -ERROR_SPACER - 15.0);
    }

    #[test]
    fn test_reset() {
        let mut h = Harness::new(4, &[0.6, 0.9]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        h.key(&mut s, Key::Down);
        h.tick(&mut s, 100.0);
        s.reset();
        assert_eq!(s.current(), 0);
        assert!(!s.started() && !s.ended());
        assert_eq!(s.timer(), 60_000.0);
        assert!(s.errors().is_empty() && s.users().is_empty());
    }

    #[test]
    fn test_render() {
        let mut h = Harness::new(4, &[0.6, 0.9]);
        let mut s = scene(KaraokeConfig::default());
        h.key(&mut s, Key::Space);
        h.tick(&mut s, 16.0);
        let mut r = RecordingRenderer::default();
        s.render(&mut r);
        assert_eq!(r.lines.len(), 4);
        assert_eq!(r.rects.len(), 1);
        let keys: Vec<&str> = r.images.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["angry", "play"]);
    }
}
