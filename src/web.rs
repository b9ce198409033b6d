//! Browser glue: `<video>` elements, the 2D canvas, the controls panel DOM,
//! keyboard input and the animation frame loop.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Headers, HtmlButtonElement, HtmlCanvasElement,
    HtmlImageElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlVideoElement,
    Request, RequestInit, window,
};

use crate::controls::{Controls, Difficulty, GameMode};
use crate::game::{GameContainer, frame_delta};
use crate::physics::Rect;
use crate::render::{Color, Line, Renderer};
use crate::scene::{AssetManifest, Key};
use crate::scoreboard::ScoreSubmission;
use crate::video::{MediaElement, MediaError, VideoSwitcher};
use crate::{DEFAULT_VIDEO_SOURCES, HEIGHT, WIDTH};

const BLANK_POSTER: &str = "./videos/blank.png";
const BOOT_POSTER: &str = "./videos/logo.png";
const SCORE_URL: &str = "./scoreboard/post";

fn js_err(msg: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&msg.to_string())
}

// --- Video -------------------------------------------------------------------

pub(crate) struct WebVideo {
    el: HtmlVideoElement,
    // play() resolves asynchronously; rejections (autoplay policy etc.) land here
    on_reject: Closure<dyn FnMut(JsValue)>,
}

impl WebVideo {
    fn create(doc: &Document, src: &str, poster: &str, looping: bool) -> Result<Self, JsValue> {
        let el: HtmlVideoElement = doc.create_element("video")?.dyn_into()?;
        el.set_src(src);
        el.set_poster(poster);
        el.set_muted(true);
        el.set_loop(looping);
        el.style().set_property("display", "none")?;

        let label = src.to_string();
        let on_reject = Closure::wrap(Box::new(move |err: JsValue| {
            log::warn!("{label}: play rejected: {err:?}");
        }) as Box<dyn FnMut(JsValue)>);

        Ok(Self { el, on_reject })
    }
}

fn rejected(op: &'static str, err: JsValue) -> MediaError {
    MediaError::Rejected {
        op,
        reason: format!("{err:?}"),
    }
}

impl MediaElement for WebVideo {
    fn play(&mut self) -> Result<(), MediaError> {
        let promise: js_sys::Promise = self.el.play().map_err(|e| rejected("play", e))?;
        let _ = promise.catch(&self.on_reject);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        self.el.pause().map_err(|e| rejected("pause", e))
    }

    fn load(&mut self) -> Result<(), MediaError> {
        self.el.load();
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.el.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.el.set_current_time(seconds);
    }

    fn is_paused(&self) -> bool {
        self.el.paused()
    }

    fn set_visible(&mut self, visible: bool) {
        let display = if visible { "block" } else { "none" };
        if let Err(e) = self.el.style().set_property("display", display) {
            log::warn!("video display: {e:?}");
        }
    }
}

/// One element per source. The last two are the loading and boot placeholders.
fn build_videos(doc: &Document, parent: &Element, sources: &[&str]) -> Result<Vec<WebVideo>, JsValue> {
    let n = sources.len();
    let mut videos = Vec::with_capacity(n);
    for (i, src) in sources.iter().enumerate() {
        let placeholder = i + 2 >= n;
        let poster = if i + 1 == n { BOOT_POSTER } else { BLANK_POSTER };
        let v = WebVideo::create(doc, src, poster, placeholder)?;
        parent.append_child(&v.el)?;
        videos.push(v);
    }
    Ok(videos)
}

// --- Canvas ------------------------------------------------------------------

struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    images: HashMap<&'static str, HtmlImageElement>,
}

impl CanvasRenderer {
    fn new(ctx: CanvasRenderingContext2d) -> Self {
        ctx.set_text_baseline("middle");
        Self {
            ctx,
            images: HashMap::new(),
        }
    }

    /// Start fetching any image in `assets` not requested yet.
    fn load_images(&mut self, assets: &AssetManifest) -> Result<(), JsValue> {
        for &(key, url) in assets.images() {
            if self.images.contains_key(key) {
                continue;
            }
            let img = HtmlImageElement::new()?;
            img.set_src(url);
            self.images.insert(key, img);
        }
        Ok(())
    }
}

impl Renderer for CanvasRenderer {
    fn clear(&mut self, background: Color) {
        self.ctx.set_fill_style_str(&background.css(1.0));
        self.ctx.fill_rect(0.0, 0.0, WIDTH, HEIGHT);
    }

    fn stroke_line(&mut self, line: &Line, width: f64, color: Color) {
        self.ctx.begin_path();
        self.ctx.move_to(line.x1, line.y1);
        self.ctx.line_to(line.x2, line.y2);
        self.ctx.set_line_width(width);
        self.ctx.set_stroke_style_str(&color.css(1.0));
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color, alpha: f64) {
        self.ctx.set_fill_style_str(&color.css(alpha));
        self.ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
    }

    fn draw_image(&mut self, key: &str, rect: &Rect) {
        // not loaded yet: skip the frame rather than block
        let Some(img) = self.images.get(key).filter(|i| i.complete()) else {
            return;
        };
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(img, rect.x, rect.y, rect.w, rect.h)
            .ok();
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, size: f64, color: Color) {
        self.ctx.set_font(&format!("{size}px sans-serif"));
        self.ctx.set_fill_style_str(&color.css(1.0));
        self.ctx.fill_text(text, x, y).ok();
    }
}

// --- Controls panel ----------------------------------------------------------

struct ControlsPanel {
    score: Element,
    name: HtmlInputElement,
    submit: HtmlButtonElement,
    mode: HtmlSelectElement,
    difficulty: HtmlSelectElement,
    reset: HtmlButtonElement,
}

fn button(doc: &Document, text: &str) -> Result<HtmlButtonElement, JsValue> {
    let b: HtmlButtonElement = doc.create_element("button")?.dyn_into()?;
    b.set_text_content(Some(text));
    b.class_list().add_1("controls-button")?;
    Ok(b)
}

fn select(doc: &Document, options: &[(&str, &str)]) -> Result<HtmlSelectElement, JsValue> {
    let s: HtmlSelectElement = doc.create_element("select")?.dyn_into()?;
    s.class_list().add_1("controls-input")?;
    for &(value, text) in options {
        let opt = HtmlOptionElement::new_with_text_and_value(text, value)?;
        s.append_child(&opt)?;
    }
    Ok(s)
}

impl ControlsPanel {
    fn build(doc: &Document, parent: &Element) -> Result<Self, JsValue> {
        let score = doc.create_element("div")?;
        score.class_list().add_1("controls-message")?;
        score.set_text_content(Some("Score: 0"));

        let name: HtmlInputElement = doc.create_element("input")?.dyn_into()?;
        name.class_list().add_1("controls-input")?;
        name.set_placeholder("Name");
        name.set_disabled(true);

        let submit = button(doc, "Submit Score")?;
        submit.set_disabled(true);

        let modes: Vec<(&str, &str)> = GameMode::ALL.iter().map(|m| (m.key(), m.label())).collect();
        let mode = select(doc, &modes)?;

        let diffs: Vec<(&str, &str)> = Difficulty::ALL
            .iter()
            .map(|d| (d.label(), d.label()))
            .collect();
        let difficulty = select(doc, &diffs)?;

        let reset = button(doc, "Reset")?;

        parent.append_child(&score)?;
        parent.append_child(&name)?;
        parent.append_child(&submit)?;
        parent.append_child(&doc.create_element("br")?)?;
        parent.append_child(&doc.create_element("br")?)?;
        parent.append_child(&mode)?;
        parent.append_child(&difficulty)?;
        parent.append_child(&reset)?;

        Ok(Self {
            score,
            name,
            submit,
            mode,
            difficulty,
            reset,
        })
    }

    fn sync(&self, controls: &Controls) {
        self.score.set_text_content(Some(&controls.score_text()));
        let locked = !controls.submit_enabled();
        if self.name.disabled() != locked {
            self.name.set_disabled(locked);
            self.submit.set_disabled(locked);
        }
    }
}

// --- Global state ------------------------------------------------------------

struct WebGame {
    game: GameContainer<WebVideo>,
    renderer: CanvasRenderer,
    panel: ControlsPanel,
    last_frame: Option<f64>,
}

thread_local! {
    static GAME: RefCell<Option<WebGame>> = const { RefCell::new(None) };
}

fn with_game(f: impl FnOnce(&mut WebGame)) {
    GAME.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut() {
            f(state);
        }
    });
}

fn require(doc: &Document, id: &str) -> Result<Element, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| js_err(format!("no #{id} parent element")))
}

pub(crate) fn start() -> Result<(), JsValue> {
    if GAME.with(|cell| cell.borrow().is_some()) {
        log::warn!("game already running");
        return Ok(());
    }

    let win = window().ok_or_else(|| js_err("no window"))?;
    let doc = win.document().ok_or_else(|| js_err("no document"))?;

    let video_parent = require(&doc, "video")?;
    let controls_parent = require(&doc, "controls")?;
    let game_parent = require(&doc, "abr")?;

    let videos = build_videos(&doc, &video_parent, DEFAULT_VIDEO_SOURCES)?;
    let switcher = VideoSwitcher::new(videos).map_err(js_err)?;

    let panel = ControlsPanel::build(&doc, &controls_parent)?;

    let canvas: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
    canvas.set_width(WIDTH as u32);
    canvas.set_height(HEIGHT as u32);
    game_parent.append_child(&canvas)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| js_err("no 2d context"))?
        .dyn_into()?;

    let game = GameContainer::new(switcher);
    let mut renderer = CanvasRenderer::new(ctx);
    renderer.load_images(game.assets())?;

    attach_panel_listeners(&panel)?;
    attach_keyboard(&doc)?;

    GAME.with(|cell| {
        cell.replace(Some(WebGame {
            game,
            renderer,
            panel,
            last_frame: None,
        }))
    });
    log::info!("abr arcade started with {} tiers", DEFAULT_VIDEO_SOURCES.len() - 2);

    start_loop();
    Ok(())
}

// --- Input -------------------------------------------------------------------

fn attach_keyboard(doc: &Document) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
        // typing a name must not steer the game
        let in_input = evt
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .is_some();
        if in_input {
            return;
        }
        let key = Key::from_dom(&evt.key());
        let now = window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0);
        let mut prevent = false;
        with_game(|s| prevent = s.game.key_down(key, now));
        if prevent {
            evt.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);
    doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn listen(target: &web_sys::EventTarget, event: &str, f: impl FnMut() + 'static) -> Result<(), JsValue> {
    let mut f = f;
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| f()) as Box<dyn FnMut(_)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn attach_panel_listeners(panel: &ControlsPanel) -> Result<(), JsValue> {
    let name = panel.name.clone();
    listen(&panel.name, "input", move || {
        let value = name.value();
        with_game(|s| s.game.controls_mut().set_name(value));
    })?;

    let name = panel.name.clone();
    listen(&panel.submit, "click", move || {
        with_game(|s| {
            if let Some(sub) = s.game.submit_score() {
                name.set_value("");
                if let Err(e) = post_score(&sub) {
                    log::warn!("score submission failed: {e:?}");
                }
            }
        });
    })?;

    let mode = panel.mode.clone();
    listen(&panel.mode, "change", move || {
        let Some(m) = GameMode::from_key(&mode.value()) else {
            log::warn!("unknown game mode {:?}", mode.value());
            return;
        };
        with_game(|s| {
            s.game.switch_mode(m);
            if let Err(e) = s.renderer.load_images(s.game.assets()) {
                log::warn!("image load: {e:?}");
            }
            s.last_frame = None;
        });
    })?;

    let difficulty = panel.difficulty.clone();
    listen(&panel.difficulty, "change", move || {
        let d = Difficulty::from_label(&difficulty.value());
        with_game(|s| s.game.controls_mut().set_difficulty(d));
    })?;

    listen(&panel.reset, "click", move || {
        with_game(|s| {
            s.game.reset();
            s.last_frame = None;
        });
    })?;

    Ok(())
}

/// Fire-and-forget POST of a finished round. Network failures only get logged.
fn post_score(sub: &ScoreSubmission) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| js_err("no window"))?;
    let body = serde_json::to_string(sub).map_err(js_err)?;

    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&body));
    let req = Request::new_with_str_and_init(SCORE_URL, &init)?;

    let on_err = Closure::wrap(Box::new(|err: JsValue| {
        log::warn!("score submission failed: {err:?}");
    }) as Box<dyn FnMut(JsValue)>);
    let _ = win.fetch_with_request(&req).catch(&on_err);
    on_err.forget();
    Ok(())
}

// --- Frame loop --------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn frame(state: &mut WebGame, ts: f64) {
    let delta = frame_delta(state.last_frame, ts);
    state.last_frame = Some(ts);
    state.game.tick(ts, delta);
    state.game.render(&mut state.renderer);
    state.panel.sync(state.game.controls());
}

fn request_frame(cb: &FrameCallback) {
    let Some(w) = window() else { return };
    if let Some(closure) = cb.borrow().as_ref() {
        if let Err(e) = w.request_animation_frame(closure.as_ref().unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {e:?}");
        }
    }
}

fn start_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        with_game(|state| frame(state, ts));
        request_frame(&f);
    }) as Box<dyn FnMut(f64)>));
    request_frame(&g);
}
