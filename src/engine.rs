use crate::browser;
use crate::engine::input::KeyState;
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - we control the closure creation and specify the expected type
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

pub mod input;

// TABLE:
// ┌──────────────────────── Boot Sequence ─────────────────────────────────┐
// │  GameLoop::start                                                       │
// │   ├─ loader.on_initialize(screen)        window resize -> on_resize    │
// │   ├─ requestAnimationFrame loop ──┬─ Stage::Loading : loader hooks     │
// │   │                               └─ Stage::Running : game hooks       │
// │   ├─ game.initialize(&tracker)     tracker.progress() -> on_update     │
// │   ├─ loader.on_user_action()       waits for the player                │
// │   └─ loader.dispose()              Stage::Loading -> Stage::Running    │
// └────────────────────────────────────────────────────────────────────────┘

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self, tracker: &LoadTracker) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);
}

/// Extension point for whatever is drawn while resources are loading.
///
/// Hooks take `&self` : the loop closure and the async boot sequence both
/// hold the loader, so implementors keep their state behind `Cell`/`RefCell`.
#[async_trait(?Send)]
pub trait Loader {
    fn on_initialize(&self, screen: Screen) -> Result<()>;
    fn on_resize(&self, screen: Screen) -> Result<()>;
    /// runs once per fixed step with the latest load progress in [0, 1]
    fn on_update(&self, delta_ms: f32, progress: f32);
    fn on_draw(&self, renderer: &Renderer);
    /// resolves once the player is ready to leave the loading screen
    async fn on_user_action(&self) -> Result<()>;
    /// teardown, safe to call more than once
    fn dispose(&self);
}

// length of a frame in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

enum Stage {
    Loading,
    Running(Box<dyn Game>),
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static, loader: Rc<dyn Loader>) -> Result<()> {
        let canvas = browser::canvas()?;
        loader.on_initialize(Screen::measure(&canvas))?;
        watch_resize(canvas, loader.clone())?;

        let tracker = LoadTracker::default();
        let stage = Rc::new(RefCell::new(Stage::Loading));
        let mut keyevent_receiver = input::prepare_input()?;
        let mut keystate = KeyState::new();
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer::new(browser::context()?);

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        let loop_stage = stage.clone();
        let loop_loader = loader.clone();
        let loop_tracker = tracker.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut keyevent_receiver);
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            {
                let mut stage = loop_stage.borrow_mut();
                while game_loop.accumulated_delta > FRAME_SIZE {
                    match &mut *stage {
                        Stage::Loading => loop_loader.on_update(FRAME_SIZE, loop_tracker.progress()),
                        Stage::Running(game) => game.update(&keystate),
                    }
                    game_loop.accumulated_delta -= FRAME_SIZE;
                }
                game_loop.last_frame = perf;
                match &*stage {
                    Stage::Loading => loop_loader.on_draw(&renderer),
                    Stage::Running(game) => game.draw(&renderer),
                }
            }
            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    error!("GameLoop stopped : {:#?}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        let game = game.initialize(&tracker).await?;
        tracker.finish();
        loader.on_user_action().await?;
        loader.dispose();
        *stage.borrow_mut() = Stage::Running(game);
        log!("resources loaded");

        Ok(())
    }
}

fn watch_resize(canvas: HtmlCanvasElement, loader: Rc<dyn Loader>) -> Result<()> {
    let on_resize = browser::closure_wrap(Box::new(move || {
        if let Err(err) = loader.on_resize(Screen::measure(&canvas)) {
            error!("resize failed : {:#?}", err);
        }
    }) as Box<dyn FnMut()>);
    let window = browser::window()?;
    browser::add_event_listener(&window, "resize", &on_resize)?;
    // lives as long as the page
    on_resize.forget();
    Ok(())
}

// ==================== Load Progress ====================
/// Shared counter of registered vs loaded resources
/// - clones share the same counts
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    loaded: Rc<Cell<usize>>,
    total: Rc<Cell<usize>>,
    finished: Rc<Cell<bool>>,
}

impl LoadTracker {
    /// Registers one resource now, counts it as loaded once `future` succeeds
    pub fn track<T>(
        &self,
        future: impl Future<Output = Result<T>>,
    ) -> impl Future<Output = Result<T>> {
        self.total.set(self.total.get() + 1);
        let loaded = self.loaded.clone();
        async move {
            let result = future.await;
            if result.is_ok() {
                loaded.set(loaded.get() + 1);
            }
            result
        }
    }

    /// Normalized progress in [0, 1]
    /// - nothing registered yet reads as 0 until `finish`
    pub fn progress(&self) -> f32 {
        if self.finished.get() {
            return 1.0;
        }
        match self.total.get() {
            0 => 0.0,
            total => (self.loaded.get() as f32 / total as f32).min(1.0),
        }
    }

    pub fn finish(&self) {
        self.finished.set(true);
    }
}

// ==================== Geometry ====================
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Canvas pixel size plus where the canvas sits on the page
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
    pub bounds: Rect,
}

impl Screen {
    pub fn measure(canvas: &HtmlCanvasElement) -> Self {
        let bounds = canvas.get_bounding_client_rect();
        Screen {
            width: canvas.width() as f32,
            height: canvas.height() as f32,
            bounds: Rect::new(
                bounds.x() as f32,
                bounds.y() as f32,
                bounds.width() as f32,
                bounds.height() as f32,
            ),
        }
    }
}

// ==================== Color ====================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// `#RRGGBB` or `#RRGGBBAA`, leading `#` optional
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(anyhow!("'{}' is not a #RRGGBB or #RRGGBBAA color", hex));
        }
        let byte = |index: usize| {
            u8::from_str_radix(&digits[index..index + 2], 16)
                .map_err(|err| anyhow!("bad color channel in '{}' : {}", hex, err))
        };
        let alpha = match digits.len() {
            8 => byte(6)? as f32 / 255.0,
            _ => 1.0,
        };
        Ok(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: alpha,
        })
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Color {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_hex(&self) -> String {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        if alpha == u8::MAX {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, alpha)
        }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

// ==================== Renderer ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Renderer { context }
    }

    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x.into(),
            rect.y.into(),
            rect.width.into(),
            rect.height.into(),
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context.fill_rect(
            rect.x.into(),
            rect.y.into(),
            rect.width.into(),
            rect.height.into(),
        );
    }

    /// Rounded rectangle, filled and/or outlined
    pub fn round_rect(
        &self,
        rect: &Rect,
        radius: f32,
        stroke: Option<&Color>,
        fill: Option<&Color>,
        line_width: f32,
    ) {
        let r: f64 = clamp_radius(rect, radius).into();
        let (x, y) = (f64::from(rect.x), f64::from(rect.y));
        let (w, h) = (f64::from(rect.width), f64::from(rect.height));
        let ctx = &self.context;

        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.line_to(x + w - r, y);
        ctx.quadratic_curve_to(x + w, y, x + w, y + r);
        ctx.line_to(x + w, y + h - r);
        ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
        ctx.line_to(x + r, y + h);
        ctx.quadratic_curve_to(x, y + h, x, y + h - r);
        ctx.line_to(x, y + r);
        ctx.quadratic_curve_to(x, y, x + r, y);
        ctx.close_path();

        if let Some(fill) = fill {
            ctx.set_fill_style_str(&fill.to_css());
            ctx.fill();
        }
        if let Some(stroke) = stroke {
            ctx.set_line_width(line_width.into());
            ctx.set_stroke_style_str(&stroke.to_css());
            ctx.stroke();
        }
    }

    pub fn draw_entire_image(&self, image: &HtmlImageElement, position: &Point) {
        if let Err(err) = self.context.draw_image_with_html_image_element(
            image,
            position.x.into(),
            position.y.into(),
        ) {
            error!("Could not draw image {} : {:#?}", image.src(), err);
        }
    }
}

/// corners can't be rounder than half the shortest side
fn clamp_radius(rect: &Rect, radius: f32) -> f32 {
    radius
        .min(rect.width / 2.0)
        .min(rect.height / 2.0)
        .max(0.0)
}

// ==================== Timers & Images ====================
/// Resolves after `millis`, backed by `setTimeout`
pub async fn delay(millis: i32) -> Result<()> {
    let (tx, rx) = channel::<()>();
    browser::set_timeout(millis, move || {
        let _ = tx.send(());
    })?;
    rx.await
        .map_err(|_| anyhow!("delay of {}ms was cancelled", millis))
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::create_html_image_element()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result : Result<(), Error>
    // - second ? yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use futures::executor::block_on;

    #[test]
    fn tracker_reads_zero_before_anything_is_registered() {
        let tracker = LoadTracker::default();
        assert_relative_eq!(tracker.progress(), 0.0);
        tracker.finish();
        assert_relative_eq!(tracker.progress(), 1.0);
    }

    #[test]
    fn tracker_counts_only_successful_loads() {
        let tracker = LoadTracker::default();
        let first = tracker.track(async { Ok(1) });
        let second = tracker.track(async { Err::<i32, _>(anyhow!("404")) });
        let third = tracker.track(async { Ok(3) });
        let fourth = tracker.track(async { Ok(4) });
        assert_relative_eq!(tracker.progress(), 0.0);

        assert_eq!(block_on(first).ok(), Some(1));
        assert_relative_eq!(tracker.progress(), 0.25);
        assert!(block_on(second).is_err());
        assert_relative_eq!(tracker.progress(), 0.25);
        let _ = block_on(futures::future::join(third, fourth));
        assert_relative_eq!(tracker.progress(), 0.75);
    }

    #[test]
    fn tracker_clones_share_counts() {
        let tracker = LoadTracker::default();
        let view = tracker.clone();
        block_on(tracker.track(async { Ok(()) })).unwrap();
        assert_relative_eq!(view.progress(), 1.0);
    }

    #[test]
    fn color_parses_rgb_and_rgba_hex() {
        let grey = Color::from_hex("#222222").unwrap();
        assert_eq!((grey.r, grey.g, grey.b), (0x22, 0x22, 0x22));
        assert_relative_eq!(grey.a, 1.0);

        let translucent = Color::from_hex("FFFFFF80").unwrap();
        assert_eq!(translucent.r, 255);
        assert_relative_eq!(translucent.a, 128.0 / 255.0);
    }

    #[test]
    fn color_rejects_malformed_hex() {
        assert!(Color::from_hex("#FFF").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn color_alpha_is_clamped_and_serialized() {
        let color = Color::WHITE.with_alpha(-0.5);
        assert_relative_eq!(color.a, 0.0);
        assert_eq!(color.to_css(), "rgba(255, 255, 255, 0)");
        assert_eq!(Color::WHITE.to_hex(), "#FFFFFF");
        assert_eq!(Color::rgb(0, 0, 0).with_alpha(0.0).to_hex(), "#00000000");
    }

    #[test]
    fn corner_radius_fits_inside_rect() {
        let bar = Rect::new(0.0, 0.0, 200.0, 10.0);
        assert_relative_eq!(clamp_radius(&bar, 10.0), 5.0);
        assert_relative_eq!(clamp_radius(&bar, 2.0), 2.0);
        let empty = Rect::new(0.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(clamp_radius(&empty, 5.0), 0.0);
    }
}
