// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                         Loading Overlay Layout                           │
// ├────────────────────┬─────────────────────────────────────────────────────┤
// │ loader/            │ LoadingOverlay, the engine's Loader implementation  │
// │ ├── state.rs       │ phase machine : Loading -> ... -> Disposed          │
// │ ├── progress_bar.rs│ bar geometry + canvas drawing                       │
// │ ├── instructions.rs│ which instruction line is showing                   │
// │ ├── style.rs       │ VisualStyle (loader.json) + HexColor                │
// │ └── dom.rs         │ title / attribution / instructions / play button    │
// └────────────────────┴─────────────────────────────────────────────────────┘
pub mod dom;
pub mod instructions;
pub mod progress_bar;
pub mod state;
pub mod style;

use self::dom::OverlayDom;
use self::instructions::InstructionCycle;
use self::progress_bar::ProgressBar;
use self::state::{Event, OverlayStateMachine, Phase};
use self::style::VisualStyle;
use crate::engine::input::{self, ActivationListener, Modality};
use crate::engine::{self, Loader, Rect, Renderer, Screen};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{self, Either, Shared};
use futures::{pin_mut, FutureExt};
use std::cell::{Cell, RefCell};
use std::future::Future;

// pauses around the play button, in milliseconds
const PLAY_BUTTON_DELAY_MS: i32 = 200;

/// Loading screen drawn over the game canvas
/// - canvas : progress bar, then its fade out
/// - DOM    : title, attribution, cycling instructions, play button
///
/// Every hook takes `&self`, borrows never outlive a single call so the
/// render loop and `on_user_action` can interleave.
pub struct LoadingOverlay {
    style: VisualStyle,
    bar: ProgressBar,
    machine: Cell<OverlayStateMachine>,
    cycle: Cell<InstructionCycle>,
    screen: Cell<Screen>,
    dom: OverlayDom,
    instructions_shown: RefCell<Option<oneshot::Sender<()>>>,
    instructions_receiver: RefCell<Option<oneshot::Receiver<()>>>,
    activation: RefCell<Option<ActivationListener>>,
    // dropped on dispose, every pending wait in `on_user_action` races it
    dispose_signal: RefCell<Option<oneshot::Sender<()>>>,
    disposed: Shared<oneshot::Receiver<()>>,
}

impl LoadingOverlay {
    pub fn new(style: VisualStyle) -> Result<Self> {
        let dom = OverlayDom::new(&style).context("Could not build the loading overlay")?;
        let (tx, rx) = oneshot::channel();
        let (dispose_signal, disposed) = oneshot::channel();
        Ok(LoadingOverlay {
            bar: ProgressBar::from_style(&style),
            cycle: Cell::new(InstructionCycle::new(style.instructions.len())),
            machine: Cell::new(OverlayStateMachine::default()),
            screen: Cell::new(Screen::default()),
            dom,
            style,
            instructions_shown: RefCell::new(Some(tx)),
            instructions_receiver: RefCell::new(Some(rx)),
            activation: RefCell::new(None),
            dispose_signal: RefCell::new(Some(dispose_signal)),
            disposed: disposed.shared(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.machine.get().phase()
    }

    pub fn dom(&self) -> &OverlayDom {
        &self.dom
    }

    /// Feeds one event to the state machine, returns the new phase on a change
    fn handle(&self, event: Event) -> Option<Phase> {
        let before = self.machine.get();
        let after = before.transition(event);
        self.machine.set(after);
        (after.phase() != before.phase()).then(|| after.phase())
    }

    fn on_phase_change(&self, phase: Phase) {
        log!("loading overlay : {:?}", phase);
        match phase {
            Phase::Instructions => {
                if let Err(err) = self.dom.show_instructions() {
                    error!("{:#?}", err);
                }
                if let Some(tx) = self.instructions_shown.borrow_mut().take() {
                    let _ = tx.send(());
                }
            }
            Phase::Disposed => {
                self.activation.borrow_mut().take();
                self.instructions_shown.borrow_mut().take();
                self.dispose_signal.borrow_mut().take();
                self.dom.dispose();
            }
            Phase::Loading | Phase::Fading | Phase::PlayButtonVisible => {}
        }
    }

    fn apply(&self, event: Event) -> Option<Phase> {
        let changed = self.handle(event);
        if let Some(phase) = changed {
            self.on_phase_change(phase);
        }
        changed
    }

    fn cycle_instructions(&self, delta_ms: f32) {
        let mut cycle = self.cycle.get();
        if cycle.advance(delta_ms) {
            if let Some(text) = cycle.current(&self.style.instructions) {
                self.dom.set_instruction(text);
            }
        }
        self.cycle.set(cycle);
    }

    fn poll_gamepads(&self) {
        if let Some(listener) = self.activation.borrow().as_ref() {
            if listener.is_pending() && input::any_gamepad_button_pressed() {
                listener.notify(Modality::Gamepad);
            }
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.phase() == Phase::Disposed {
            return Err(anyhow!("LoadingOverlay: disposed while waiting for the player"));
        }
        Ok(())
    }

    /// Runs `wait` to completion unless the overlay is disposed first
    async fn unless_disposed<F: Future>(&self, wait: F) -> Result<F::Output> {
        pin_mut!(wait);
        match future::select(wait, self.disposed.clone()).await {
            Either::Left((output, _)) => {
                self.ensure_live()?;
                Ok(output)
            }
            Either::Right(_) => Err(anyhow!(
                "LoadingOverlay: disposed while waiting for the player"
            )),
        }
    }

    async fn wait_for_instructions(&self) -> Result<()> {
        let shown = self
            .instructions_receiver
            .borrow_mut()
            .take()
            .ok_or_else(|| anyhow!("LoadingOverlay: user action is already being awaited"))?;
        shown
            .await
            .map_err(|_| anyhow!("LoadingOverlay: disposed before the instructions were shown"))
    }

    async fn wait_for_activation(&self) -> Result<Modality> {
        // no listener may outlive the overlay
        self.ensure_live()?;
        let (listener, activated) = ActivationListener::listen()?;
        *self.activation.borrow_mut() = Some(listener);
        let modality = self.unless_disposed(activated).await;
        // drops the listener, removing its DOM handlers
        self.activation.borrow_mut().take();
        modality?.map_err(|_| anyhow!("LoadingOverlay: input listener was dropped"))
    }

    /// Shows the play button and waits for it to be clicked.
    /// When clicked, the button is hidden and the overlay is disposed.
    async fn show_play_button(&self) -> Result<()> {
        self.dom.show_play_button()?;
        self.unless_disposed(engine::delay(PLAY_BUTTON_DELAY_MS))
            .await??;
        self.dom.attach_play_button()?;

        let clicked = self.dom.play_clicked()?;
        self.unless_disposed(clicked)
            .await?
            .map_err(|_| anyhow!("LoadingOverlay: play button listener was dropped"))?;

        self.apply(Event::PlayClicked);
        self.dom.hide_play_button()
    }
}

#[async_trait(?Send)]
impl Loader for LoadingOverlay {
    fn on_initialize(&self, screen: Screen) -> Result<()> {
        self.on_resize(screen)
    }

    fn on_resize(&self, screen: Screen) -> Result<()> {
        // a disposed overlay must not come back
        if self.phase() == Phase::Disposed {
            return Ok(());
        }
        self.screen.set(screen);
        self.dom.position_and_size(&screen)
    }

    fn on_update(&self, delta_ms: f32, progress: f32) {
        self.apply(Event::Progress(progress));
        self.apply(Event::Update(delta_ms));
        match self.phase() {
            Phase::Instructions => {
                self.cycle_instructions(delta_ms);
                self.poll_gamepads();
            }
            Phase::PlayButtonVisible => self.cycle_instructions(delta_ms),
            Phase::Loading | Phase::Fading | Phase::Disposed => {}
        }
    }

    fn on_draw(&self, renderer: &Renderer) {
        let screen = self.screen.get();
        let machine = self.machine.get();
        let background = Rect::new(0.0, 0.0, screen.width, screen.height);
        let bar_color = &self.style.bar_color.0;

        match machine.phase() {
            Phase::Loading => {
                renderer.fill_rect(&background, &self.style.background_color.0);
                self.bar
                    .draw_loading(renderer, &screen, machine.progress(), bar_color);
            }
            Phase::Fading => {
                renderer.fill_rect(&background, &self.style.background_color.0);
                self.bar
                    .draw_fading(renderer, &screen, machine.opacity(), bar_color);
            }
            Phase::Instructions | Phase::PlayButtonVisible => {
                renderer.fill_rect(&background, &self.style.background_color.0);
            }
            Phase::Disposed => {}
        }
    }

    async fn on_user_action(&self) -> Result<()> {
        self.wait_for_instructions().await?;
        let modality = self.wait_for_activation().await?;
        log!("player activated with {:?}", modality);
        self.apply(Event::UserAction);
        self.unless_disposed(engine::delay(PLAY_BUTTON_DELAY_MS))
            .await??;
        self.show_play_button().await
    }

    fn dispose(&self) {
        self.apply(Event::Dispose);
    }
}
