//! Drawing surface used by scenes. The browser implementation wraps a 2D
//! canvas context (see `web`); tests can record calls instead.

use crate::physics::Rect;
use crate::{HEIGHT, MARGIN, WIDTH};

/// 0xRRGGBB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub fn css(self, alpha: f64) -> String {
        let r = (self.0 >> 16) & 0xff;
        let g = (self.0 >> 8) & 0xff;
        let b = self.0 & 0xff;
        if alpha >= 1.0 {
            format!("#{:06x}", self.0 & 0xff_ffff)
        } else {
            format!("rgba({r},{g},{b},{alpha})")
        }
    }
}

pub const YELLOW: Color = Color(0xf8f400);
pub const BLACK: Color = Color(0x000000);
pub const RED: Color = Color(0xe60115);
pub const BLUE: Color = Color(0x2cbbe5);
pub const GREEN: Color = Color(0x00a962);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

pub trait Renderer {
    fn clear(&mut self, background: Color);
    fn stroke_line(&mut self, line: &Line, width: f64, color: Color);
    fn fill_rect(&mut self, rect: &Rect, color: Color, alpha: f64);
    /// Draw a preloaded image (see `AssetManifest`) into `rect`.
    fn draw_image(&mut self, key: &str, rect: &Rect);
    fn draw_text(&mut self, text: &str, x: f64, y: f64, size: f64, color: Color);
}

/// One horizontal guide line per quality tier, tier 0 (best) at the top.
pub fn tier_lines(tiers: usize) -> Vec<Line> {
    let spacing = if tiers > 1 {
        (HEIGHT - 2.0 * MARGIN) / (tiers - 1) as f64
    } else {
        0.0
    };
    (0..tiers)
        .map(|i| {
            let y = MARGIN + i as f64 * spacing;
            Line {
                x1: 0.0,
                y1: y,
                x2: WIDTH,
                y2: y,
            }
        })
        .collect()
}

/// Guide lines with the selected tier highlighted; returns the selected line's y.
pub fn draw_tier_lines(r: &mut dyn Renderer, lines: &[Line], current: usize) -> f64 {
    let mut current_y = 0.0;
    for (i, l) in lines.iter().enumerate() {
        if i == current {
            r.stroke_line(l, 4.0, RED);
            current_y = l.y1;
        } else {
            r.stroke_line(l, 4.0, YELLOW);
        }
    }
    current_y
}

pub fn timer_text(timer_ms: f64) -> String {
    format!("Time left: {}s", (timer_ms / 1000.0).round() as i64)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Renderer that records what was drawn.
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub lines: Vec<(Line, Color)>,
        pub rects: Vec<(Rect, Color)>,
        pub images: Vec<(String, Rect)>,
        pub texts: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn clear(&mut self, _background: Color) {
            *self = Self::default();
        }
        fn stroke_line(&mut self, line: &Line, _width: f64, color: Color) {
            self.lines.push((*line, color));
        }
        fn fill_rect(&mut self, rect: &Rect, color: Color, _alpha: f64) {
            self.rects.push((*rect, color));
        }
        fn draw_image(&mut self, key: &str, rect: &Rect) {
            self.images.push((key.to_string(), *rect));
        }
        fn draw_text(&mut self, text: &str, _x: f64, _y: f64, _size: f64, _color: Color) {
            self.texts.push(text.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_lines_span_margins() {
        let lines = tier_lines(4);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].y1, MARGIN);
        assert!((lines[3].y1 - (HEIGHT - MARGIN)).abs() < 1e-9);
        assert!(lines.windows(2).all(|w| w[0].y1 < w[1].y1));
    }

    #[test]
    fn test_single_tier_line() {
        let lines = tier_lines(1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].y1, MARGIN);
    }

    #[test]
    fn test_color_css() {
        assert_eq!(RED.css(1.0), "#e60115");
        assert_eq!(GREEN.css(0.5), "rgba(0,169,98,0.5)");
    }

    #[test]
    fn test_timer_text() {
        assert_eq!(timer_text(60_000.0), "Time left: 60s");
        assert_eq!(timer_text(1_400.0), "Time left: 1s");
    }
}
