use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::debug;

use crate::machine::{AutoScroller, ScrollConfig, ScrollState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollFrame {
    pub state: ScrollState,
    pub position: u32,
}

#[derive(Debug)]
enum Command {
    Kiosk(bool),
    Resize { content: u32, viewport: u32 },
}

/// Runs an [`AutoScroller`] on its own task.
///
/// The tick timer exists only while the scroller is active. Dropping the
/// driver stops the task together with any timer it holds.
pub struct ScrollDriver {
    commands: mpsc::UnboundedSender<Command>,
    frames: watch::Receiver<ScrollFrame>,
    task: JoinHandle<()>,
}

impl ScrollDriver {
    pub fn spawn(config: ScrollConfig) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let scroller = AutoScroller::new(config);
        let (frame_tx, frames) = watch::channel(frame_of(&scroller));
        let task = tokio::spawn(run(scroller, rx, frame_tx));
        Self {
            commands,
            frames,
            task,
        }
    }

    pub fn set_kiosk(&self, enabled: bool) {
        let _ = self.commands.send(Command::Kiosk(enabled));
    }

    pub fn resize(&self, content: u32, viewport: u32) {
        let _ = self.commands.send(Command::Resize { content, viewport });
    }

    pub fn frame(&self) -> ScrollFrame {
        *self.frames.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScrollFrame> {
        self.frames.clone()
    }

    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for ScrollDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut scroller: AutoScroller,
    mut commands: mpsc::UnboundedReceiver<Command>,
    frames: watch::Sender<ScrollFrame>,
) {
    let mut ticker: Option<Interval> = None;
    loop {
        let command = match ticker.as_mut() {
            Some(interval) => {
                tokio::select! {
                    command = commands.recv() => command,
                    _ = interval.tick() => {
                        scroller.tick();
                        publish(&frames, &scroller);
                        continue;
                    }
                }
            }
            None => commands.recv().await,
        };
        let Some(command) = command else {
            debug!("scroll driver closed");
            return;
        };

        match command {
            Command::Kiosk(enabled) => scroller.set_kiosk(enabled),
            Command::Resize { content, viewport } => scroller.resize(content, viewport),
        }
        publish(&frames, &scroller);

        match (scroller.is_active(), ticker.is_some()) {
            (true, false) => ticker = Some(start_ticker(scroller.config())),
            (false, true) => {
                debug!("scroll idle, timer cancelled");
                ticker = None;
            }
            _ => {}
        }
    }
}

fn start_ticker(config: &ScrollConfig) -> Interval {
    let start = time::Instant::now() + config.tick;
    let mut interval = time::interval_at(start, config.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(tick_ms = config.tick.as_millis() as u64, "scroll timer started");
    interval
}

fn publish(frames: &watch::Sender<ScrollFrame>, scroller: &AutoScroller) {
    let frame = frame_of(scroller);
    frames.send_if_modified(|current| {
        if *current == frame {
            return false;
        }
        *current = frame;
        true
    });
}

fn frame_of(scroller: &AutoScroller) -> ScrollFrame {
    ScrollFrame {
        state: scroller.state(),
        position: scroller.position(),
    }
}
