//! ABR Arcade core crate.
//!
//! Three small canvas games (a manual quality picker, a flappy-bird runner and
//! a karaoke-style lane game) drive a stack of `<video>` elements so players
//! can feel what adaptive-bitrate switching looks like. Gameplay, video
//! switching and scoring are plain Rust and run natively in tests; the `web`
//! module binds them to the browser. The optional `server` feature adds the
//! scoreboard HTTP service.

use wasm_bindgen::prelude::*;

pub mod controls;
pub mod game;
pub mod physics;
pub mod render;
pub mod rng;
pub mod scene;
pub mod scoreboard;
pub mod video;

#[cfg(feature = "server")]
pub mod server;

#[cfg(target_arch = "wasm32")]
mod web;

pub use controls::{Controls, Difficulty, GameMode};
pub use game::GameContainer;
pub use scene::{Key, Scene};
pub use video::{MediaElement, VideoSwitcher};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// -----------------------------------------------------------------------------
// Stage geometry (canvas pixels)
// -----------------------------------------------------------------------------

pub const WIDTH: f64 = 888.0;
pub const HEIGHT: f64 = 400.0;
/// Top and bottom inset of the tier guide lines.
pub const MARGIN: f64 = 75.0;

/// Quality tiers high → low, then the loading and boot placeholders.
pub const DEFAULT_VIDEO_SOURCES: &[&str] = &[
    "./videos/360p.mp4",
    "./videos/180p.mp4",
    "./videos/90p.mp4",
    "./videos/44p.mp4",
    "./videos/loading.mp4",
    "./videos/loading.mp4",
];

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    let _ = console_log::init_with_level(log::Level::Info);
}

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

/// Mount the game into `#video`, `#controls` and `#abr` and start the frame loop.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    #[cfg(target_arch = "wasm32")]
    {
        web::start()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Err(JsValue::from_str("start_game needs a browser"))
    }
}
