//! Drives one update cycle per collector tick and owns session shutdown.

use crate::chart::{Engine, Frame};
use crate::error::{Error, Result};
use crate::render::{ChartId, RenderBoundary, Widget};
use crate::sampler::Sample;
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// User-requested shutdown.
    Quit { reason: String },
    /// Unrecoverable error during update or render.
    Fatal { message: String, backtrace: String },
}

impl Completion {
    /// Human-readable reason for the top-level shutdown path.
    pub fn reason(&self) -> String {
        match self {
            Completion::Quit { reason } => reason.clone(),
            Completion::Fatal { message, backtrace } => format!("{message}\n\n{backtrace}\n"),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Completion::Fatal { .. })
    }
}

/// Sending half of the completion channel. Sending consumes it, so at most
/// one value is ever delivered.
#[derive(Debug)]
pub struct CompletionSender(SyncSender<Completion>);

impl CompletionSender {
    pub fn send(self, completion: Completion) {
        if self.0.send(completion).is_err() {
            tracing::warn!("completion receiver dropped before session ended");
        }
    }
}

#[derive(Debug)]
pub struct CompletionReceiver(Receiver<Completion>);

impl CompletionReceiver {
    /// Blocks until the session ends. `None` if the sender was dropped unused.
    pub fn wait(&self) -> Option<Completion> {
        self.0.recv().ok()
    }

    pub fn try_wait(&self) -> Option<Completion> {
        match self.0.try_recv() {
            Ok(c) => Some(c),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// One-shot channel carrying the session's end reason.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = mpsc::sync_channel(1);
    (CompletionSender(tx), CompletionReceiver(rx))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpState {
    /// Waiting for the next tick.
    Idle,
    /// Folding a tick into the engine.
    Updating,
    /// Frame pushed to the boundary.
    Rendered,
    /// Ended by a runtime fault. Terminal.
    Fatal,
    /// Ended by a user quit. Terminal.
    Closed,
}

/// Owns the engine and the rendering boundary for one session.
///
/// Must be driven from a single thread; it does no locking of its own.
pub struct Pump<B: RenderBoundary> {
    engine: Engine,
    boundary: B,
    state: PumpState,
    completion: Option<CompletionSender>,
    ticks: u64,
}

impl<B: RenderBoundary> Pump<B> {
    pub fn new(engine: Engine, boundary: B, completion: CompletionSender) -> Self {
        Pump {
            engine,
            boundary,
            state: PumpState::Idle,
            completion: Some(completion),
            ticks: 0,
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PumpState::Fatal | PumpState::Closed)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    /// Runs one update cycle: `Idle -> Updating -> Rendered -> Idle`.
    ///
    /// Any failure ends the session, panics included: the boundary is torn
    /// down and a fatal completion is sent.
    pub fn tick(&mut self, sample: &Sample) -> Result<()> {
        self.ensure_live()?;
        self.state = PumpState::Updating;

        match self.guarded(|pump| pump.update_and_render(sample)) {
            Ok(()) => {
                self.ticks += 1;
                self.state = PumpState::Idle;
                Ok(())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Redraws from current state after a resize. Never adds samples.
    pub fn resize(&mut self) -> Result<()> {
        self.ensure_live()?;

        match self.guarded(Self::relayout) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Ends the session normally with `reason`.
    pub fn quit(&mut self, reason: &str) {
        if self.is_finished() {
            return;
        }
        tracing::info!(reason, ticks = self.ticks, "session closed");
        self.teardown();
        self.state = PumpState::Closed;
        if let Some(completion) = self.completion.take() {
            completion.send(Completion::Quit {
                reason: reason.to_string(),
            });
        }
    }

    /// Ends the session on `err`. Returns the error callers should propagate.
    pub fn abort(&mut self, err: Error) -> Error {
        if self.is_finished() {
            return Error::Fatal(err.to_string());
        }

        let message = err.to_string();
        let backtrace = Backtrace::force_capture().to_string();
        tracing::error!(error = %message, state = ?self.state, "fatal error, ending session");

        self.teardown();
        self.state = PumpState::Fatal;
        if let Some(completion) = self.completion.take() {
            completion.send(Completion::Fatal {
                message: message.clone(),
                backtrace,
            });
        }
        Error::Fatal(message)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_finished() {
            return Err(Error::Fatal(format!("pump is {:?}", self.state)));
        }
        Ok(())
    }

    /// Runs `step`, turning a panic inside it into an error.
    fn guarded<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        panic::catch_unwind(AssertUnwindSafe(|| step(self)))
            .unwrap_or_else(|payload| Err(Error::Panic(panic_message(payload.as_ref()))))
    }

    fn update_and_render(&mut self, sample: &Sample) -> Result<()> {
        let width = self.boundary.inner_width(ChartId::System)?;
        let frame = self.engine.update(sample, width);
        tracing::debug!(
            tick = self.ticks,
            width,
            viewport = frame.system.viewport,
            tracked = self.engine.ranking().len(),
            series = self.engine.store().process_count(),
            "tick updated"
        );
        self.push(frame)?;
        self.state = PumpState::Rendered;
        Ok(())
    }

    fn relayout(&mut self) -> Result<()> {
        let width = self.boundary.inner_width(ChartId::System)?;
        let frame = self.engine.relayout(width);
        tracing::debug!(width, viewport = frame.system.viewport, "relayout");
        self.push(frame)
    }

    fn push(&mut self, frame: Frame) -> Result<()> {
        let Frame {
            system,
            processes,
            list,
        } = frame;
        self.boundary.set_list(list)?;
        self.boundary.render(Widget::List)?;
        self.boundary.set_chart(ChartId::System, system)?;
        self.boundary.render(Widget::Chart(ChartId::System))?;
        self.boundary.set_chart(ChartId::Processes, processes)?;
        self.boundary.render(Widget::Chart(ChartId::Processes))
    }

    fn teardown(&mut self) {
        if let Err(e) = self.boundary.teardown() {
            tracing::warn!(error = %e, "failed to restore display");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ClockResolution, EngineConfig, SampleInterval, ViewportGeometry};
    use crate::render::testing::RecordingBoundary;
    use crate::sampler::{Pid, SystemDelta};
    use std::collections::HashMap;

    fn pump(boundary: RecordingBoundary) -> (Pump<RecordingBoundary>, CompletionReceiver) {
        let engine = Engine::new(EngineConfig {
            clock: ClockResolution::new(100).unwrap(),
            interval: SampleInterval::from_millis(1000).unwrap(),
            geometry: ViewportGeometry::default(),
            reap_after: Some(60),
            sticky_colors: false,
        });
        let (tx, rx) = completion_channel();
        (Pump::new(engine, boundary, tx), rx)
    }

    fn boundary(width: u16) -> RecordingBoundary {
        RecordingBoundary::with_width(width)
    }

    fn sample(deltas: &[(Pid, u64)], ranking: &[Pid]) -> Sample {
        Sample {
            system: SystemDelta { usr: 50, sys: 25 },
            processes: deltas.iter().copied().collect(),
            ranking: ranking.to_vec(),
            names: HashMap::new(),
        }
    }

    #[test]
    fn test_tick_returns_to_idle() {
        let (mut pump, rx) = pump(boundary(100));
        pump.tick(&sample(&[(1, 10)], &[1])).unwrap();

        assert_eq!(pump.state(), PumpState::Idle);
        assert_eq!(pump.ticks(), 1);
        assert_eq!(
            pump.boundary().renders,
            vec![
                Widget::List,
                Widget::Chart(ChartId::System),
                Widget::Chart(ChartId::Processes),
            ]
        );
        assert_eq!(pump.boundary().charts[&ChartId::System].series["usr"], vec![50.0]);
        assert_eq!(pump.boundary().charts[&ChartId::Processes].series["1"], vec![10.0]);
        assert_eq!(pump.boundary().list.len(), 1);
        assert!(rx.try_wait().is_none());
    }

    #[test]
    fn test_end_to_end_through_pump() {
        let (mut pump, _rx) = pump(boundary(100));
        pump.tick(&sample(&[(10, 5)], &[10, 20])).unwrap();
        pump.tick(&sample(&[(10, 3), (20, 4)], &[10, 20])).unwrap();
        pump.tick(&sample(&[(20, 2)], &[10, 20])).unwrap();

        let procs = &pump.boundary().charts[&ChartId::Processes];
        assert_eq!(procs.series["10"], vec![5.0, 3.0, 0.0]);
        assert_eq!(procs.series["20"], vec![0.0, 4.0, 2.0]);
    }

    #[test]
    fn test_render_failure_is_fatal() {
        let mut b = boundary(100);
        b.fail_render = true;
        let (mut pump, rx) = pump(b);

        let err = pump.tick(&sample(&[], &[])).unwrap_err();
        assert!(matches!(err, Error::Fatal(_)));
        assert_eq!(pump.state(), PumpState::Fatal);
        assert_eq!(pump.boundary().teardowns, 1);

        let completion = rx.try_wait().unwrap();
        assert!(completion.is_fatal());
        let reason = completion.reason();
        assert!(reason.starts_with("Terminal error: draw failed"));
        match completion {
            Completion::Fatal { backtrace, .. } => assert!(!backtrace.is_empty()),
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[test]
    fn test_no_retry_after_fatal() {
        let mut b = boundary(100);
        b.fail_width = true;
        let (mut pump, rx) = pump(b);

        assert!(pump.tick(&sample(&[], &[])).is_err());
        assert!(pump.tick(&sample(&[], &[])).is_err());
        assert!(pump.resize().is_err());
        pump.quit("closing from keyboard");

        // one teardown, one completion
        assert_eq!(pump.boundary().teardowns, 1);
        assert!(rx.try_wait().unwrap().is_fatal());
        assert!(rx.try_wait().is_none());
        assert_eq!(pump.state(), PumpState::Fatal);
    }

    #[test]
    fn test_quit_is_benign() {
        let (mut pump, rx) = pump(boundary(100));
        pump.tick(&sample(&[], &[])).unwrap();
        pump.quit("closing from keyboard");

        assert_eq!(pump.state(), PumpState::Closed);
        assert_eq!(pump.boundary().teardowns, 1);
        let completion = rx.wait().unwrap();
        assert_eq!(
            completion,
            Completion::Quit {
                reason: "closing from keyboard".to_string()
            }
        );
        assert_eq!(completion.reason(), "closing from keyboard");
        assert!(pump.tick(&sample(&[], &[])).is_err());
    }

    #[test]
    fn test_resize_redraws_without_new_samples() {
        let (mut pump, _rx) = pump(boundary(100));
        for _ in 0..30 {
            pump.tick(&sample(&[(1, 1)], &[1])).unwrap();
        }
        pump.boundary.width = 12;
        pump.resize().unwrap();

        let system = &pump.boundary().charts[&ChartId::System];
        assert_eq!(system.viewport, 10);
        assert_eq!(system.series["usr"].len(), 10);
        assert_eq!(pump.engine.store().system("usr").map(<[f64]>::len), Some(30));
        assert_eq!(pump.ticks(), 30);
        assert_eq!(pump.state(), PumpState::Idle);
    }

    #[test]
    fn test_external_abort() {
        let (mut pump, rx) = pump(boundary(100));
        let err = pump.abort(Error::Collector("stat vanished".to_string()));
        assert!(matches!(err, Error::Fatal(_)));
        assert!(rx.try_wait().unwrap().is_fatal());
    }

    #[test]
    fn test_render_panic_is_fatal() {
        let mut b = boundary(100);
        b.panic_render = true;
        let (mut pump, rx) = pump(b);

        let err = pump.tick(&sample(&[(1, 10)], &[1])).unwrap_err();
        assert!(matches!(err, Error::Fatal(_)));
        assert_eq!(pump.state(), PumpState::Fatal);
        assert_eq!(pump.boundary().teardowns, 1);

        match rx.try_wait() {
            Some(Completion::Fatal { message, backtrace }) => {
                assert!(message.contains("widget state corrupt"));
                assert!(!backtrace.is_empty());
            }
            other => panic!("unexpected completion {other:?}"),
        }
        assert!(pump.tick(&sample(&[], &[])).is_err());
    }

    #[test]
    fn test_resize_panic_is_fatal() {
        let (mut pump, rx) = pump(boundary(100));
        pump.tick(&sample(&[], &[])).unwrap();
        pump.boundary.panic_render = true;

        assert!(pump.resize().is_err());
        assert_eq!(pump.state(), PumpState::Fatal);
        assert!(rx.try_wait().unwrap().reason().contains("widget state corrupt"));
    }

    #[test]
    fn test_panic_message_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
