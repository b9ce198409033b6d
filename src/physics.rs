//! Minimal arcade physics: axis-aligned boxes moving at a constant velocity.
//! Positions are in stage pixels, velocities in px/s, time steps in ms.

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f64, // left
    pub y: f64, // top
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Box of size `w`×`h` centred on (`cx`, `cy`).
    pub fn centered(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.h / 2.0
    }

    /// Strict intersection; zero-area boxes never overlap anything.
    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.w <= 0.0 || self.h <= 0.0 || other.w <= 0.0 || other.h <= 0.0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Body {
    pub rect: Rect,
    pub vx: f64,
    pub vy: f64,
    pub visible: bool,
}

impl Body {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            vx: 0.0,
            vy: 0.0,
            visible: true,
        }
    }

    /// Integrate position over `delta_ms`.
    pub fn step(&mut self, delta_ms: f64) {
        let dt = delta_ms / 1000.0;
        self.rect.x += self.vx * dt;
        self.rect.y += self.vy * dt;
    }

    pub fn stop(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.rect.overlaps(other)
    }

    pub fn overlaps_any<'a>(&self, others: impl IntoIterator<Item = &'a Body>) -> bool {
        others.into_iter().any(|o| self.overlaps(&o.rect))
    }

    /// Push the body out of a static band above it (ceiling). Returns true on contact.
    pub fn collide_above(&mut self, band: &Rect) -> bool {
        if self.rect.y < band.bottom() && self.rect.overlaps(band) {
            self.rect.y = band.bottom();
            self.vy = self.vy.max(0.0);
            return true;
        }
        false
    }

    /// Push the body out of a static band below it (ground). Returns true on contact.
    pub fn collide_below(&mut self, band: &Rect) -> bool {
        if self.rect.bottom() > band.y && self.rect.overlaps(band) {
            self.rect.y = band.y - self.rect.h;
            self.vy = self.vy.min(0.0);
            return true;
        }
        false
    }
}
