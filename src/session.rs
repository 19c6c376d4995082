use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::config::ViewConfig;
use crate::countdown::CountdownTimer;
use crate::detection::{CoordinateSpace, Detection};
use crate::error::ViewError;
use crate::overlay::Highlight;
use crate::panel::PanelText;
use crate::phase::{GamePhase, Observation, PhaseMachine};
use crate::polling::{LoopToken, PollingLoop};
use crate::snapshot::{GameSnapshot, RoundStart};
use crate::stream::{Bound, MediaTracks, StreamController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopKind {
    Detections,
    GameState,
    Countdown,
}

/// Camera source, detector and game controller behind one view.
pub(crate) trait Remote: Clone {
    type Stream: MediaTracks;

    async fn stream(&self, camera: &str) -> Result<Self::Stream, ViewError>;
    async fn detections(&self, camera: &str) -> Result<Vec<Detection>, ViewError>;
    async fn command(&self, action: &str) -> Result<Value, ViewError>;
    async fn start_round(&self, action: &str) -> Result<(), ViewError>;
}

pub(crate) trait Screen {
    type Stream;

    fn now_ms(&self) -> f64;
    fn show(&self, text: &PanelText);
    fn set_status(&self, status: &str, message: &str);
    fn set_source(&self, stream: Option<&Self::Stream>);
    fn repaint(&mut self, detections: &[Detection], highlight: Option<Highlight<'_>>);
    fn clear_overlay(&mut self);
    // The returned timer is dropped when its loop stops.
    fn schedule(&self, kind: LoopKind, token: LoopToken, delay_ms: u32) -> Option<Timeout>;
}

pub(crate) struct Session<R: Remote, S> {
    config: ViewConfig,
    remote: R,
    screen: S,
    stream: StreamController<R::Stream>,
    detections: Vec<Detection>,
    machine: PhaseMachine,
    countdown: CountdownTimer,
    detection_loop: PollingLoop,
    game_loop: PollingLoop,
    countdown_loop: PollingLoop,
    disposed: bool,
}

impl<R, S> Session<R, S>
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    pub fn new(config: ViewConfig, remote: R, screen: S) -> Self {
        Self {
            remote,
            screen,
            stream: StreamController::default(),
            detections: Vec::new(),
            machine: PhaseMachine::new(),
            countdown: CountdownTimer::new(config.round_ms()),
            detection_loop: PollingLoop::new("detections", config.detection_interval_ms),
            game_loop: PollingLoop::new("game state", config.game_state_interval_ms),
            countdown_loop: PollingLoop::new("countdown", config.countdown_interval_ms),
            disposed: false,
            config,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    pub fn score(&self) -> u32 {
        self.machine.score()
    }

    pub fn remaining(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    pub fn active_camera(&self) -> Option<&str> {
        self.stream.active_camera()
    }

    fn loop_ref(&self, kind: LoopKind) -> &PollingLoop {
        match kind {
            LoopKind::Detections => &self.detection_loop,
            LoopKind::GameState => &self.game_loop,
            LoopKind::Countdown => &self.countdown_loop,
        }
    }

    fn loop_mut(&mut self, kind: LoopKind) -> &mut PollingLoop {
        match kind {
            LoopKind::Detections => &mut self.detection_loop,
            LoopKind::GameState => &mut self.game_loop,
            LoopKind::Countdown => &mut self.countdown_loop,
        }
    }

    fn start_loop(&mut self, kind: LoopKind) {
        let token = self.loop_mut(kind).start();
        debug!("{} loop started", self.loop_ref(kind).name());
        self.arm(kind, token);
    }

    fn arm(&mut self, kind: LoopKind, token: LoopToken) {
        let delay = self.loop_ref(kind).interval_ms();
        if let Some(timeout) = self.screen.schedule(kind, token, delay) {
            self.loop_mut(kind).park(token, timeout);
        }
    }

    pub fn show_panel(&self) {
        self.screen.show(&PanelText::new(
            self.machine.phase(),
            self.machine.score(),
            self.machine.target(),
            self.countdown.remaining(),
        ));
    }

    pub fn set_status(&self, status: &str, message: &str) {
        self.screen.set_status(status, message);
    }

    fn surface(&self, err: &ViewError) {
        if err.is_surfaced() {
            error!("{}", err);
        } else {
            warn!("{}", err);
        }
        self.screen.set_status("error", &err.to_string());
    }

    fn repaint(&mut self) {
        let highlight = self.machine.target().map(|item| Highlight {
            item,
            min_confidence: self.config.hit_confidence,
        });
        self.screen.repaint(&self.detections, highlight);
    }

    // The detection loop goes first so an in-flight batch for the old
    // camera is discarded when it lands.
    fn unbind_camera(&mut self) {
        self.detection_loop.stop();
        self.detections.clear();
        self.screen.clear_overlay();
        self.screen.set_source(None);
    }

    fn apply_snapshot(&mut self, snapshot: &GameSnapshot) {
        match self.machine.observe(snapshot) {
            Observation::Over { final_score } => {
                info!("round over, final score {}", final_score);
                self.game_loop.stop();
                self.countdown_loop.stop();
                self.countdown.rebase(RoundStart::None);
            }
            Observation::Running {
                entered,
                new_target,
                round_start,
            } => {
                if entered {
                    info!("round running, score {}", snapshot.score);
                }
                if let Some(item) = new_target {
                    info!("target: {}", item);
                }
                if self.countdown.rebase(round_start) {
                    self.countdown.tick(self.screen.now_ms());
                }
            }
            Observation::Ignored => debug!("snapshot without transition: {:?}", snapshot),
        }
        self.show_panel();
    }

    pub fn stop_game(&mut self) {
        if self.machine.phase() != GamePhase::Idle {
            info!("game stopped while {}", self.machine.phase().name());
        }
        self.machine.reset();
        self.game_loop.stop();
        self.countdown_loop.stop();
        self.countdown.clear();
        self.show_panel();
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.detection_loop.stop();
        self.game_loop.stop();
        self.countdown_loop.stop();
        self.stream.stop();
        self.detections.clear();
        self.screen.set_source(None);
        self.screen.clear_overlay();
        info!("view disposed");
    }
}

pub(crate) async fn run_tick<R, S>(state: Rc<RefCell<Session<R, S>>>, kind: LoopKind, token: LoopToken)
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    match kind {
        LoopKind::Detections => detection_tick(&state, token).await,
        LoopKind::GameState => game_state_tick(&state, token).await,
        LoopKind::Countdown => countdown_tick(&state, token),
    }

    let mut st = state.borrow_mut();
    if st.loop_ref(kind).is_current(token) {
        st.arm(kind, token);
    }
}

async fn detection_tick<R, S>(state: &Rc<RefCell<Session<R, S>>>, token: LoopToken)
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    let (remote, camera) = {
        let mut st = state.borrow_mut();
        let Some(camera) = st.stream.active_camera().map(str::to_string) else {
            return;
        };
        if !st.detection_loop.try_begin(token) {
            return;
        }
        (st.remote.clone(), camera)
    };

    let fetched = remote.detections(&camera).await;

    let mut st = state.borrow_mut();
    if !st.detection_loop.finish(token) {
        debug!("discarding detections for {} from a stopped loop", camera);
        return;
    }
    match fetched {
        Ok(batch) => {
            debug!(
                "{} detections from {} ({:?})",
                batch.len(),
                camera,
                CoordinateSpace::of_batch(&batch)
            );
            st.detections = batch;
            st.repaint();
        }
        Err(err) => warn!("detection fetch for {}: {}", camera, err),
    }
}

async fn game_state_tick<R, S>(state: &Rc<RefCell<Session<R, S>>>, token: LoopToken)
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    let (remote, action) = {
        let mut st = state.borrow_mut();
        if !st.game_loop.try_begin(token) {
            return;
        }
        (st.remote.clone(), st.config.poll_action.clone())
    };

    let fetched = remote.command(&action).await;

    let mut st = state.borrow_mut();
    if !st.game_loop.finish(token) {
        debug!("discarding snapshot from a stopped loop");
        return;
    }
    match fetched.and_then(|reply| GameSnapshot::from_value(&reply)) {
        Ok(snapshot) => st.apply_snapshot(&snapshot),
        Err(err @ ViewError::Decode { .. }) => warn!("ignoring snapshot: {}", err),
        Err(err) => warn!("game state fetch: {}", err),
    }
}

fn countdown_tick<R, S>(state: &Rc<RefCell<Session<R, S>>>, token: LoopToken)
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    let mut st = state.borrow_mut();
    if !st.countdown_loop.try_begin(token) {
        return;
    }
    let now = st.screen.now_ms();
    st.countdown.tick(now);
    st.show_panel();
    st.countdown_loop.finish(token);
}

pub(crate) async fn select_camera<R, S>(state: Rc<RefCell<Session<R, S>>>, camera: String) -> Result<(), ViewError>
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    let (ticket, remote) = {
        let mut st = state.borrow_mut();
        if st.disposed {
            warn!("selectCamera({}) after dispose", camera);
            return Ok(());
        }
        st.unbind_camera();
        let ticket = st.stream.begin(&camera);
        st.set_status("connecting", &format!("Connecting to {}", camera));
        (ticket, st.remote.clone())
    };
    info!("selecting camera {}", camera);

    let acquired = remote.stream(&camera).await;

    let mut st = state.borrow_mut();
    let stream = match acquired {
        Ok(stream) => stream,
        Err(err) => {
            if !st.stream.abandon(&ticket) {
                debug!("stale stream failure for {}: {}", camera, err);
                return Ok(());
            }
            st.surface(&err);
            return Err(err);
        }
    };

    match st.stream.finish(&ticket, stream) {
        Bound::Superseded => {
            debug!("camera {} superseded before its stream arrived", camera);
        }
        Bound::Active => {
            st.screen.set_source(st.stream.active_stream());
            st.start_loop(LoopKind::Detections);
            st.set_status("live", &format!("Live: {}", camera));
        }
    }
    Ok(())
}

pub(crate) async fn start_game<R, S>(state: Rc<RefCell<Session<R, S>>>) -> Result<(), ViewError>
where
    R: Remote,
    S: Screen<Stream = R::Stream>,
{
    let (remote, action, token) = {
        let mut st = state.borrow_mut();
        if st.disposed {
            warn!("startGame after dispose");
            return Ok(());
        }
        if !st.machine.begin() {
            info!("start ignored while {}", st.machine.phase().name());
            return Ok(());
        }
        st.countdown.clear();
        st.countdown_loop.stop();
        let token = st.game_loop.start();
        st.show_panel();
        (st.remote.clone(), st.config.start_action.clone(), token)
    };
    info!("requesting a new round");

    let sent = remote.start_round(&action).await;

    let mut st = state.borrow_mut();
    if !st.game_loop.is_current(token) {
        debug!("start superseded before the controller answered");
        return Ok(());
    }
    match sent {
        Ok(()) => {
            st.arm(LoopKind::GameState, token);
            st.start_loop(LoopKind::Countdown);
            Ok(())
        }
        Err(err) => {
            st.stop_game();
            st.surface(&err);
            Err(err)
        }
    }
}
