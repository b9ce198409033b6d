//! "Flappy ABR": keep the bird between the pipes for one minute.
//!
//! Touching the ceiling (or a ceiling pipe) starts a buffering window that
//! shows the loading placeholder; touching the ground (or a ground pipe)
//! drops the video to the lowest tier. Clean flight plays the best tier and
//! earns points.

use std::collections::VecDeque;

use super::{AssetManifest, Key, RoundClock, Scene, SceneContext, finish_round};
use crate::physics::{Body, Rect};
use crate::render::{self, BLACK, BLUE, GREEN, RED, Renderer};
use crate::{HEIGHT, WIDTH};

const BAND_HEIGHT: f64 = HEIGHT / 20.0; // ceiling / ground strip
const BIRD_SIZE: f64 = 34.0;
const BIRD_FPS: f64 = 12.0;
const MAX_STEP: f64 = 1000.0 / 60.0; // ms per physics sub-step

const PIPE_START: f64 = 500.0;
const PIPE_BUFFER: f64 = 100.0; // spawn when the newest pipe is this close to the right edge
const PIPE_SPACER: f64 = 100.0;
const PIPE_WIDTH: f64 = 100.0;
const PIPE_GAP_MIN: i64 = 100;
const PIPE_GAP_EXTRA: i64 = 100;

/// Tunables for the Flappy round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlappyConfig {
    pub game_time: f64,     // ms
    pub jump_velocity: f64, // px/s, also the max fall speed
    pub jump_cooldown: f64, // ms between jumps
    pub gravity: f64,       // px/s gained per ms
    pub pipe_speed: f64,    // px/s before the difficulty modifier
    pub buffer_time: f64,   // ms of penalty after a hit
}

impl Default for FlappyConfig {
    fn default() -> Self {
        Self {
            game_time: 60.0 * 1000.0,
            jump_velocity: 300.0,
            jump_cooldown: 500.0,
            gravity: 0.5918,
            pipe_speed: 100.0,
            buffer_time: 200.0,
        }
    }
}

/// Ceiling pipe and ground pipe sharing one x position.
#[derive(Clone, Copy, Debug)]
pub struct PipePair {
    pub ceiling: Body,
    pub ground: Body,
}

impl PipePair {
    fn bodies_mut(&mut self) -> [&mut Body; 2] {
        [&mut self.ceiling, &mut self.ground]
    }
}

/// What the bird touched during one frame.
#[derive(Clone, Copy, Debug, Default)]
struct Contact {
    ceiling: bool, // ceiling band or a ceiling pipe
    ground: bool,  // ground band or a ground pipe
}

pub struct FlappyScene {
    config: FlappyConfig,
    tiers: usize,
    bird: Body,
    ceiling: Rect,
    ground: Rect,
    pipes: VecDeque<PipePair>, // oldest (leftmost) first
    clock: RoundClock,
    last_jump: Option<f64>,
    buffer_time: f64,
    lq_time: f64,
    diff_mod: f64,
    anim_ms: f64,
}

fn bird_start() -> Body {
    Body::new(Rect::centered(WIDTH / 3.0, HEIGHT / 2.0, BIRD_SIZE, BIRD_SIZE))
}

impl FlappyScene {
    pub fn new(config: FlappyConfig) -> Self {
        Self {
            config,
            tiers: 0,
            bird: bird_start(),
            ceiling: Rect::new(0.0, 0.0, WIDTH, BAND_HEIGHT),
            ground: Rect::new(0.0, HEIGHT - BAND_HEIGHT, WIDTH, BAND_HEIGHT),
            pipes: VecDeque::new(),
            clock: RoundClock::new(config.game_time),
            last_jump: None,
            buffer_time: 0.0,
            lq_time: 0.0,
            diff_mod: 1.0,
            anim_ms: 0.0,
        }
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

    pub fn bird(&self) -> &Body {
        &self.bird
    }

    pub fn pipes(&self) -> &VecDeque<PipePair> {
        &self.pipes
    }

    fn spawn_pipes(&mut self, ctx: &mut SceneContext<'_>) {
        let gap_pos = ctx.rng.next_f64();
        let width_roll = ctx.rng.next_f64();
        let gap = PIPE_GAP_MIN + ctx.rng.between(0, PIPE_GAP_EXTRA);

        // Keep spacing after the previous pair's trailing edge.
        let mut nx = PIPE_START;
        if let Some(end) = self.pipes.back() {
            if end.ceiling.rect.right() > PIPE_START {
                nx = end.ceiling.rect.right() + PIPE_SPACER;
            }
        }

        let w = PIPE_WIDTH + PIPE_WIDTH * width_roll;
        let ceiling_h = gap_pos / 2.0 * HEIGHT;
        let gap = gap as f64;
        let pair = PipePair {
            ceiling: Body::new(Rect::new(nx, 0.0, w, ceiling_h)),
            ground: Body::new(Rect::new(nx, ceiling_h + gap, w, HEIGHT - gap)),
        };
        log::debug!("flappy: pipes at x={nx:.0} w={w:.0} gap={gap}");
        self.pipes.push_back(pair);
    }

    /// FIFO upkeep: only the oldest pair can leave, only the newest decides spawning.
    fn maintain_pipes(&mut self, ctx: &mut SceneContext<'_>) {
        if self
            .pipes
            .front()
            .is_some_and(|p| p.ceiling.rect.right() < 0.0)
        {
            self.pipes.pop_front();
        }
        let spawn = match self.pipes.back() {
            None => true,
            Some(p) => p.ceiling.rect.right() < WIDTH + PIPE_BUFFER,
        };
        if spawn {
            self.spawn_pipes(ctx);
        }
    }

    /// Move the bird and pipes over `delta` in steps of at most `MAX_STEP` so a
    /// long frame cannot carry the bird through a band.
    fn advance(&mut self, delta: f64) -> Contact {
        let mut contact = Contact::default();
        let mut left = delta;
        while left > 0.0 {
            let dt = left.min(MAX_STEP);
            left -= dt;

            self.bird.step(dt);
            for p in self.pipes.iter_mut() {
                for b in p.bodies_mut() {
                    b.step(dt);
                }
            }

            contact.ceiling |= self.bird.collide_above(&self.ceiling)
                || self.bird.overlaps_any(self.pipes.iter().map(|p| &p.ceiling));
            contact.ground |= self.bird.collide_below(&self.ground)
                || self.bird.overlaps_any(self.pipes.iter().map(|p| &p.ground));

            self.bird.vy = (self.bird.vy + self.config.gravity * dt).min(self.config.jump_velocity);
        }
        contact
    }

    fn play_round(&mut self, ctx: &mut SceneContext<'_>, delta: f64) {
        if self.clock.latch_first_start() {
            ctx.video.change(0);
            ctx.video.play();
            self.diff_mod = ctx.session.difficulty.modifier();
            log::info!("flappy: round started (difficulty x{})", self.diff_mod);
        }

        let speed = -self.config.pipe_speed * self.diff_mod;
        for p in self.pipes.iter_mut() {
            for b in p.bodies_mut() {
                b.vx = speed;
            }
        }

        let contact = self.advance(delta);

        if self.clock.tick(delta) {
            finish_round(ctx, self.name());
            return;
        }

        self.buffer_time -= delta;
        if contact.ceiling {
            self.buffer_time = self.config.buffer_time;
        }

        self.lq_time -= delta;
        if contact.ground {
            self.lq_time = self.config.buffer_time;
        }

        if self.buffer_time > 0.0 {
            let loading = ctx.video.loading();
            ctx.video.change(loading);
        } else if self.lq_time > 0.0 {
            let lowest = ctx.video.tiers() - 1;
            ctx.video.change(lowest);
        } else {
            ctx.video.change(0);
            ctx.controls.add_score(delta * self.diff_mod / 1000.0);
        }
    }
}

impl Default for FlappyScene {
    fn default() -> Self {
        Self::new(FlappyConfig::default())
    }
}

impl Scene for FlappyScene {
    fn name(&self) -> &'static str {
        "flappy"
    }

    fn preload(&self, assets: &mut AssetManifest) {
        assets.image("bird1", "./assets/bird1.png");
        assets.image("bird2", "./assets/bird2.png");
    }

    fn create(&mut self, tiers: usize) {
        self.tiers = tiers;
        self.bird = bird_start();
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _time: f64, delta: f64) {
        self.anim_ms += delta;

        if self.clock.started {
            self.play_round(ctx, delta);
        } else {
            self.bird.vy = 0.0;
            for p in self.pipes.iter_mut() {
                for b in p.bodies_mut() {
                    b.stop();
                }
            }
        }

        self.maintain_pipes(ctx);
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.last_jump = None;
        self.buffer_time = 0.0;
        self.lq_time = 0.0;
        self.diff_mod = 1.0;
        self.anim_ms = 0.0;
        self.pipes.clear();
        self.bird = bird_start();
    }

    fn key_down(&mut self, key: Key, ctx: &mut SceneContext<'_>) -> bool {
        match key {
            Key::Space if !self.clock.ended => {
                self.clock.started = true;
                let ready = self
                    .last_jump
                    .is_none_or(|t| ctx.now - t > self.config.jump_cooldown);
                if ready {
                    self.bird.vy = -self.config.jump_velocity;
                    self.last_jump = Some(ctx.now);
                }
                true
            }
            Key::Up | Key::Down | Key::Left | Key::Right | Key::Tab => true,
            _ => false,
        }
    }

    fn render(&self, r: &mut dyn Renderer) {
        r.clear(BLUE);
        for p in &self.pipes {
            r.fill_rect(&p.ceiling.rect, RED, 0.5);
            r.fill_rect(&p.ground.rect, GREEN, 0.5);
        }
        r.fill_rect(&self.ceiling, RED, 1.0);
        r.fill_rect(&self.ground, GREEN, 1.0);

        let frame = (self.anim_ms * BIRD_FPS / 1000.0) as u64 % 2;
        let sprite = if frame == 0 { "bird1" } else { "bird2" };
        r.draw_image(sprite, &self.bird.rect);

        r.draw_text(&render::timer_text(self.clock.timer), 10.0, 20.0, 30.0, BLACK);
    }
}
