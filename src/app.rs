//! Event loop: collector ticks, keyboard, and resize events feed the pump.

use crate::error::{Error, Result};
use crate::pump::Pump;
use crate::render::RenderBoundary;
use crate::sampler::{Sample, SampleSource};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const INPUT_POLL: Duration = Duration::from_millis(50);

pub const QUIT_REASON: &str = "closing from keyboard";

/// Messages from the collector thread.
#[derive(Debug)]
pub enum CollectorEvent {
    Sample(Sample),
    Failed(Error),
}

/// Samples `source` once per `interval` on its own thread until the receiver
/// goes away or the source fails.
pub fn spawn_collector<S>(
    mut source: S,
    interval: Duration,
    tx: Sender<CollectorEvent>,
) -> Result<JoinHandle<()>>
where
    S: SampleSource + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("collector".to_string())
        .spawn(move || {
            let mut next = Instant::now();
            loop {
                match source.observe() {
                    Ok(Some(sample)) => {
                        if tx.send(CollectorEvent::Sample(sample)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let _ = tx.send(CollectorEvent::Failed(e));
                        break;
                    }
                }
                next += interval;
                thread::sleep(next.saturating_duration_since(Instant::now()));
            }
            tracing::debug!("collector stopped");
        })?;
    Ok(handle)
}

pub struct App<B: RenderBoundary> {
    pump: Pump<B>,
    samples: Receiver<CollectorEvent>,
}

impl<B: RenderBoundary> App<B> {
    pub fn new(pump: Pump<B>, samples: Receiver<CollectorEvent>) -> Self {
        App { pump, samples }
    }

    /// Runs until the pump reaches a terminal state. The outcome is delivered
    /// on the pump's completion channel.
    pub fn run(mut self) {
        while !self.pump.is_finished() {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(ev) => self.handle_event(ev),
                    Err(e) => {
                        self.pump.abort(e.into());
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    self.pump.abort(e.into());
                }
            }
            self.drain_samples();
        }
        tracing::debug!(ticks = self.pump.ticks(), "event loop finished");
    }

    fn handle_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(cols, rows) => {
                tracing::debug!(cols, rows, "resize");
                // errors already ended the session
                let _ = self.pump.resize();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => self.pump.quit(QUIT_REASON),
            KeyCode::Char('q') | KeyCode::Esc => self.pump.quit(QUIT_REASON),
            _ => {}
        }
    }

    /// Feeds every queued sample to the pump, oldest first.
    fn drain_samples(&mut self) {
        while !self.pump.is_finished() {
            match self.samples.try_recv() {
                Ok(CollectorEvent::Sample(sample)) => {
                    let _ = self.pump.tick(&sample);
                }
                Ok(CollectorEvent::Failed(e)) => {
                    self.pump.abort(e);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.pump.abort(Error::Collector("collector thread exited".to_string()));
                }
            }
        }
    }
}
