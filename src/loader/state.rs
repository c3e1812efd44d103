// ==================== Constants ====================
// wait after progress hits 1.0 before the bar starts fading
pub const FADE_DELAY_MS: f32 = 1000.0;
// one opacity decrement per update step
pub const FADE_STEPS: u32 = 100;
// wait after the bar is fully transparent before showing instructions
pub const INSTRUCTIONS_DELAY_MS: f32 = 500.0;

/// ELI5:
/// ┌──────────────── Overlay Transition Flow ───────────────────────┐
/// │  From State     →  Event        →  To State                    │
/// ├────────────────────────────────────────────────────────────────┤
/// │  Loading        →  Update       →  Fading        (1.0 + delay) │
/// │  Fading         →  Update       →  Instructions  (0.0 + delay) │
/// │  Instructions   →  UserAction   →  PlayButtonVisible           │
/// │  PlayButton...  →  PlayClicked  →  Disposed                    │
/// │  -------           ------                                      │
/// │  any            →  Dispose      →  Disposed                    │
/// │  Disposed       →  anything     →  Disposed                    │
/// └────────────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Progress(f32),
    Update(f32),
    UserAction,
    PlayClicked,
    Dispose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Fading,
    Instructions,
    PlayButtonVisible,
    Disposed,
}

// phase markers, only used at the type level
#[derive(Debug, Copy, Clone)]
pub struct Loading;
#[derive(Debug, Copy, Clone)]
pub struct Fading;
#[derive(Debug, Copy, Clone)]
pub struct Instructions;
#[derive(Debug, Copy, Clone)]
pub struct PlayButtonVisible;
#[derive(Debug, Copy, Clone)]
pub struct Disposed;

pub enum IsLoading {
    Done(OverlayState<Fading>),
    InProgress(OverlayState<Loading>),
}

pub enum IsFading {
    Done(OverlayState<Instructions>),
    InProgress(OverlayState<Fading>),
}

/// Shared data for every phase
/// - progress : highest load progress seen, in [0, 1]
/// - remaining_fade_steps : opacity = remaining / FADE_STEPS
/// - timer_ms : time spent waiting in the current phase
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OverlayContext {
    pub progress: f32,
    pub remaining_fade_steps: u32,
    pub timer_ms: f32,
}

impl OverlayContext {
    pub fn opacity(&self) -> f32 {
        self.remaining_fade_steps as f32 / FADE_STEPS as f32
    }

    /// clamped to [0, 1] and never lower than before, NaN is ignored
    fn with_progress(mut self, progress: f32) -> Self {
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
        self
    }

    fn tick(mut self, delta_ms: f32) -> Self {
        self.timer_ms += delta_ms.max(0.0);
        self
    }

    fn on_state_transition(mut self) -> Self {
        self.timer_ms = 0.0;
        self
    }
}

#[derive(Debug, Copy, Clone)]
pub struct OverlayState<S> {
    context: OverlayContext,
    _state: S,
}

impl<S> OverlayState<S> {
    pub fn context(&self) -> &OverlayContext {
        &self.context
    }

    pub fn dispose(self) -> OverlayState<Disposed> {
        OverlayState {
            context: self.context.on_state_transition(),
            _state: Disposed,
        }
    }
}

impl OverlayState<Loading> {
    pub fn new() -> Self {
        OverlayState {
            context: OverlayContext {
                progress: 0.0,
                remaining_fade_steps: FADE_STEPS,
                timer_ms: 0.0,
            },
            _state: Loading,
        }
    }

    pub fn set_progress(mut self, progress: f32) -> Self {
        self.context = self.context.with_progress(progress);
        self
    }

    /// the delay only starts counting once everything is loaded
    pub fn update(mut self, delta_ms: f32) -> IsLoading {
        if self.context.progress < 1.0 {
            return IsLoading::InProgress(self);
        }
        self.context = self.context.tick(delta_ms);
        if self.context.timer_ms >= FADE_DELAY_MS {
            IsLoading::Done(self.fade())
        } else {
            IsLoading::InProgress(self)
        }
    }

    fn fade(self) -> OverlayState<Fading> {
        OverlayState {
            context: self.context.on_state_transition(),
            _state: Fading,
        }
    }
}

impl Default for OverlayState<Loading> {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayState<Fading> {
    /// Returns an enum because Fading can:
    /// - End      (Done)
    /// - Continue (InProgress)
    pub fn update(mut self, delta_ms: f32) -> IsFading {
        if self.context.remaining_fade_steps > 0 {
            self.context.remaining_fade_steps -= 1;
            return IsFading::InProgress(self);
        }
        self.context = self.context.tick(delta_ms);
        if self.context.timer_ms >= INSTRUCTIONS_DELAY_MS {
            IsFading::Done(self.reveal_instructions())
        } else {
            IsFading::InProgress(self)
        }
    }

    fn reveal_instructions(self) -> OverlayState<Instructions> {
        OverlayState {
            context: self.context.on_state_transition(),
            _state: Instructions,
        }
    }
}

impl OverlayState<Instructions> {
    pub fn activate(self) -> OverlayState<PlayButtonVisible> {
        OverlayState {
            context: self.context.on_state_transition(),
            _state: PlayButtonVisible,
        }
    }
}

impl OverlayState<PlayButtonVisible> {
    pub fn click(self) -> OverlayState<Disposed> {
        self.dispose()
    }
}

#[derive(Debug, Copy, Clone)]
pub enum OverlayStateMachine {
    Loading(OverlayState<Loading>),
    Fading(OverlayState<Fading>),
    Instructions(OverlayState<Instructions>),
    PlayButtonVisible(OverlayState<PlayButtonVisible>),
    Disposed(OverlayState<Disposed>),
}

impl Default for OverlayStateMachine {
    fn default() -> Self {
        OverlayStateMachine::Loading(OverlayState::new())
    }
}

impl From<OverlayState<Loading>> for OverlayStateMachine {
    fn from(state: OverlayState<Loading>) -> Self {
        OverlayStateMachine::Loading(state)
    }
}

impl From<OverlayState<Fading>> for OverlayStateMachine {
    fn from(state: OverlayState<Fading>) -> Self {
        OverlayStateMachine::Fading(state)
    }
}

impl From<OverlayState<Instructions>> for OverlayStateMachine {
    fn from(state: OverlayState<Instructions>) -> Self {
        OverlayStateMachine::Instructions(state)
    }
}

impl From<OverlayState<PlayButtonVisible>> for OverlayStateMachine {
    fn from(state: OverlayState<PlayButtonVisible>) -> Self {
        OverlayStateMachine::PlayButtonVisible(state)
    }
}

impl From<OverlayState<Disposed>> for OverlayStateMachine {
    fn from(state: OverlayState<Disposed>) -> Self {
        OverlayStateMachine::Disposed(state)
    }
}

impl From<IsLoading> for OverlayStateMachine {
    fn from(is_loading: IsLoading) -> Self {
        match is_loading {
            IsLoading::Done(fading) => fading.into(),
            IsLoading::InProgress(loading) => loading.into(),
        }
    }
}

impl From<IsFading> for OverlayStateMachine {
    fn from(is_fading: IsFading) -> Self {
        match is_fading {
            IsFading::Done(instructions) => instructions.into(),
            IsFading::InProgress(fading) => fading.into(),
        }
    }
}

impl OverlayStateMachine {
    pub fn transition(self, event: Event) -> Self {
        match (self, event) {
            (Self::Disposed(_), _) => self,
            (Self::Loading(state), Event::Progress(progress)) => state.set_progress(progress).into(),
            (Self::Loading(state), Event::Update(delta_ms)) => state.update(delta_ms).into(),
            (Self::Fading(state), Event::Update(delta_ms)) => state.update(delta_ms).into(),
            (Self::Instructions(state), Event::UserAction) => state.activate().into(),
            (Self::PlayButtonVisible(state), Event::PlayClicked) => state.click().into(),
            (Self::Loading(state), Event::Dispose) => state.dispose().into(),
            (Self::Fading(state), Event::Dispose) => state.dispose().into(),
            (Self::Instructions(state), Event::Dispose) => state.dispose().into(),
            (Self::PlayButtonVisible(state), Event::Dispose) => state.dispose().into(),
            // out of order events (a click before the button exists, progress
            // after loading finished) leave the overlay where it is
            _ => self,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Loading(_) => Phase::Loading,
            Self::Fading(_) => Phase::Fading,
            Self::Instructions(_) => Phase::Instructions,
            Self::PlayButtonVisible(_) => Phase::PlayButtonVisible,
            Self::Disposed(_) => Phase::Disposed,
        }
    }

    pub fn context(&self) -> &OverlayContext {
        match self {
            Self::Loading(state) => state.context(),
            Self::Fading(state) => state.context(),
            Self::Instructions(state) => state.context(),
            Self::PlayButtonVisible(state) => state.context(),
            Self::Disposed(state) => state.context(),
        }
    }

    pub fn progress(&self) -> f32 {
        self.context().progress
    }

    pub fn opacity(&self) -> f32 {
        self.context().opacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const STEP: f32 = 10.0;

    /// feeds `events` and records every phase change
    fn drive(
        mut machine: OverlayStateMachine,
        events: impl IntoIterator<Item = Event>,
    ) -> (OverlayStateMachine, Vec<Phase>) {
        let mut entered = Vec::new();
        for event in events {
            let before = machine.phase();
            machine = machine.transition(event);
            if machine.phase() != before {
                entered.push(machine.phase());
            }
        }
        (machine, entered)
    }

    fn updates(count: usize) -> impl Iterator<Item = Event> {
        std::iter::repeat(Event::Update(STEP)).take(count)
    }

    fn faded_out() -> OverlayStateMachine {
        let loaded = OverlayStateMachine::default().transition(Event::Progress(1.0));
        let (machine, _) = drive(loaded, updates(10_000));
        assert_eq!(machine.phase(), Phase::Instructions);
        machine
    }

    #[test]
    fn starts_loading_fully_opaque() {
        let machine = OverlayStateMachine::default();
        assert_eq!(machine.phase(), Phase::Loading);
        assert_relative_eq!(machine.progress(), 0.0);
        assert_relative_eq!(machine.opacity(), 1.0);
    }

    #[test]
    fn progress_is_clamped_and_never_goes_back() {
        let (machine, _) = drive(
            OverlayStateMachine::default(),
            [
                Event::Progress(0.5),
                Event::Progress(0.3),
                Event::Progress(f32::NAN),
            ],
        );
        assert_relative_eq!(machine.progress(), 0.5);

        let machine = machine.transition(Event::Progress(7.0));
        assert_relative_eq!(machine.progress(), 1.0);

        let machine = OverlayStateMachine::default().transition(Event::Progress(-2.0));
        assert_relative_eq!(machine.progress(), 0.0);
    }

    #[test]
    fn waits_while_progress_is_below_one() {
        let partial = OverlayStateMachine::default().transition(Event::Progress(0.99));
        let (machine, entered) = drive(partial, updates(1_000));
        assert_eq!(machine.phase(), Phase::Loading);
        assert!(entered.is_empty());
    }

    #[test]
    fn fades_only_after_the_delay() {
        let loaded = OverlayStateMachine::default().transition(Event::Progress(1.0));
        let almost = (FADE_DELAY_MS / STEP) as usize - 1;
        let (machine, _) = drive(loaded, updates(almost));
        assert_eq!(machine.phase(), Phase::Loading);

        let machine = machine.transition(Event::Update(STEP));
        assert_eq!(machine.phase(), Phase::Fading);
        assert_relative_eq!(machine.opacity(), 1.0);
    }

    #[test]
    fn enters_fading_exactly_once() {
        // progress keeps being reported as 1.0 every frame, like the engine does
        let events = (0..2_000).flat_map(|_| [Event::Progress(1.0), Event::Update(STEP)]);
        let (machine, entered) = drive(OverlayStateMachine::default(), events);
        let fades = entered.iter().filter(|phase| **phase == Phase::Fading).count();
        assert_eq!(fades, 1);
        assert_eq!(entered, vec![Phase::Fading, Phase::Instructions]);
        assert_eq!(machine.phase(), Phase::Instructions);
    }

    #[test]
    fn opacity_strictly_decreases_to_zero() {
        let loaded = OverlayStateMachine::default().transition(Event::Progress(1.0));
        let (mut machine, _) = drive(loaded, updates((FADE_DELAY_MS / STEP) as usize));
        assert_eq!(machine.phase(), Phase::Fading);

        let mut opacities = vec![machine.opacity()];
        while machine.opacity() > 0.0 {
            machine = machine.transition(Event::Update(STEP));
            assert_eq!(machine.phase(), Phase::Fading);
            opacities.push(machine.opacity());
        }

        assert_eq!(opacities.len(), FADE_STEPS as usize + 1);
        assert!(opacities.windows(2).all(|pair| pair[1] < pair[0]));
        assert!(opacities.iter().all(|opacity| *opacity >= 0.0));
        assert_relative_eq!(*opacities.last().unwrap(), 0.0);
    }

    #[test]
    fn instructions_wait_after_the_fade() {
        let loaded = OverlayStateMachine::default().transition(Event::Progress(1.0));
        let to_fading = (FADE_DELAY_MS / STEP) as usize;
        let to_transparent = FADE_STEPS as usize;
        let almost = (INSTRUCTIONS_DELAY_MS / STEP) as usize - 1;
        let (machine, _) = drive(loaded, updates(to_fading + to_transparent + almost));
        assert_eq!(machine.phase(), Phase::Fading);
        assert_relative_eq!(machine.opacity(), 0.0);

        let machine = machine.transition(Event::Update(STEP));
        assert_eq!(machine.phase(), Phase::Instructions);
        assert_relative_eq!(machine.opacity(), 0.0);
    }

    #[test]
    fn user_action_is_ignored_until_instructions_show() {
        let machine = OverlayStateMachine::default().transition(Event::UserAction);
        assert_eq!(machine.phase(), Phase::Loading);

        let machine = faded_out().transition(Event::UserAction);
        assert_eq!(machine.phase(), Phase::PlayButtonVisible);
    }

    #[test]
    fn play_click_disposes_exactly_once() {
        let early_click = faded_out().transition(Event::PlayClicked);
        assert_eq!(early_click.phase(), Phase::Instructions);

        let (machine, entered) = drive(
            early_click,
            [
                Event::UserAction,
                Event::PlayClicked,
                Event::PlayClicked,
                Event::Dispose,
                Event::UserAction,
                Event::Update(STEP),
            ],
        );
        assert_eq!(entered, vec![Phase::PlayButtonVisible, Phase::Disposed]);
        assert_eq!(machine.phase(), Phase::Disposed);
    }

    #[test]
    fn teardown_disposes_from_any_live_phase() {
        let loading = OverlayStateMachine::default();
        let fading = {
            let loaded = loading.transition(Event::Progress(1.0));
            drive(loaded, updates((FADE_DELAY_MS / STEP) as usize)).0
        };
        let instructions = faded_out();
        let play = instructions.transition(Event::UserAction);

        for machine in [loading, fading, instructions, play] {
            let (machine, entered) = drive(machine, [Event::Dispose, Event::Dispose]);
            assert_eq!(entered, vec![Phase::Disposed]);
            assert_eq!(machine.phase(), Phase::Disposed);
        }
    }

    #[test]
    fn nothing_leaves_disposed() {
        let disposed = OverlayStateMachine::default().transition(Event::Dispose);
        let (machine, entered) = drive(
            disposed,
            [
                Event::Progress(1.0),
                Event::Update(FADE_DELAY_MS * 10.0),
                Event::UserAction,
                Event::PlayClicked,
            ],
        );
        assert!(entered.is_empty());
        assert_eq!(machine.phase(), Phase::Disposed);
    }
}
