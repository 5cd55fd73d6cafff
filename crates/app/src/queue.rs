//! Command queue and its single worker.
//!
//! Producers call [`CommandQueue::submit`], which appends to an unbounded
//! channel and returns at once. One [`Worker`] drains the channel in FIFO
//! order, taking the shared medium for exactly one command at a time. A
//! failed command is logged, counted and reported; it never stops the loop.
//!
//! Polls travel the same channel as writes, so a read never overtakes a write
//! queued before it.

use std::error::Error as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use glowhub_domain::color::ColorState;
use glowhub_domain::command::{Command, CommandKind, GroupOperation};
use glowhub_domain::error::GlowHubError;
use glowhub_domain::event::HubEvent;
use glowhub_domain::id::{CommandId, DeviceAddress};
use glowhub_domain::time::Timestamp;
use glowhub_domain::zone::ZoneRange;

use crate::medium::SharedMedium;
use crate::ports::{EventPublisher, Transport};
use crate::registry::LightRegistry;
use crate::services::reconcile_service::{self, ReconcileOutcome};

const DEFAULT_OFFLINE_THRESHOLD: Duration = Duration::from_secs(60);

pub(crate) type PollReply = Result<ReconcileOutcome, GlowHubError>;

#[derive(Debug)]
enum Job {
    Write(Command),
    /// Read one light and fold the reading into the mirror.
    Poll {
        target: DeviceAddress,
        at: Timestamp,
        reply: oneshot::Sender<PollReply>,
    },
}

/// Counters describing queue throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub submitted: u64,
    pub executed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    executed: u64,
    failed: u64,
}

impl Progress {
    fn done(self) -> u64 {
        self.executed + self.failed
    }
}

/// Producer side of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    sender: mpsc::UnboundedSender<Job>,
    submitted: Arc<AtomicU64>,
    progress: watch::Receiver<Progress>,
}

/// Consumer side of the queue, handed to the [`Worker`].
#[derive(Debug)]
pub struct CommandReceiver {
    jobs: mpsc::UnboundedReceiver<Job>,
    progress: watch::Sender<Progress>,
}

impl CommandQueue {
    /// Create a connected queue and receiver pair.
    #[must_use]
    pub fn channel() -> (Self, CommandReceiver) {
        let (sender, jobs) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = watch::channel(Progress::default());
        (
            Self {
                sender,
                submitted: Arc::new(AtomicU64::new(0)),
                progress: progress_rx,
            },
            CommandReceiver {
                jobs,
                progress: progress_tx,
            },
        )
    }

    /// Append a command for `target` to the tail of the queue.
    ///
    /// Never waits on the shared medium.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::QueueClosed`] when the worker has stopped.
    pub fn submit(
        &self,
        target: DeviceAddress,
        kind: CommandKind,
    ) -> Result<CommandId, GlowHubError> {
        let command = Command::new(target, kind);
        let id = command.id;
        self.enqueue(Job::Write(command))?;
        tracing::trace!(command = %id, "command queued");
        Ok(id)
    }

    /// Append a read of `target` to the tail of the queue. The receiver
    /// resolves once the worker has folded the reading into the mirror.
    pub(crate) fn submit_poll(
        &self,
        target: DeviceAddress,
        at: Timestamp,
    ) -> Result<oneshot::Receiver<PollReply>, GlowHubError> {
        let (reply, outcome) = oneshot::channel();
        self.enqueue(Job::Poll { target, at, reply })?;
        Ok(outcome)
    }

    fn enqueue(&self, job: Job) -> Result<(), GlowHubError> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(job).is_err() {
            self.submitted.fetch_sub(1, Ordering::SeqCst);
            return Err(GlowHubError::QueueClosed);
        }
        Ok(())
    }

    /// Wait until every job submitted before this call has been handled.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::QueueClosed`] if the worker stops first.
    pub async fn flush(&self) -> Result<(), GlowHubError> {
        let target = self.submitted.load(Ordering::SeqCst);
        let mut progress = self.progress.clone();
        progress
            .wait_for(|p| p.done() >= target)
            .await
            .map(|_| ())
            .map_err(|_| GlowHubError::QueueClosed)
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let progress = *self.progress.borrow();
        QueueStats {
            submitted: self.submitted.load(Ordering::SeqCst),
            executed: progress.executed,
            failed: progress.failed,
        }
    }
}

/// The single consumer executing queued commands against the transport.
pub struct Worker<T, P> {
    receiver: CommandReceiver,
    medium: SharedMedium<T>,
    registry: LightRegistry,
    publisher: P,
    offline_threshold: Duration,
}

impl<T, P> Worker<T, P>
where
    T: Transport,
    P: EventPublisher + Send + Sync + 'static,
{
    pub fn new(
        receiver: CommandReceiver,
        medium: SharedMedium<T>,
        registry: LightRegistry,
        publisher: P,
    ) -> Self {
        Self {
            receiver,
            medium,
            registry,
            publisher,
            offline_threshold: DEFAULT_OFFLINE_THRESHOLD,
        }
    }

    /// Time without a successful poll after which a light is offline.
    #[must_use]
    pub fn with_offline_threshold(mut self, threshold: Duration) -> Self {
        self.offline_threshold = threshold;
        self
    }

    /// Run the worker on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain the queue until every producer is gone.
    pub async fn run(self) {
        let Self {
            receiver: CommandReceiver { mut jobs, progress },
            medium,
            registry,
            publisher,
            offline_threshold,
        } = self;

        while let Some(job) = jobs.recv().await {
            match job {
                Job::Write(command) => {
                    let ok = handle_write(&medium, &registry, &publisher, &command).await;
                    progress.send_modify(|p| {
                        if ok {
                            p.executed += 1;
                        } else {
                            p.failed += 1;
                        }
                    });
                }
                Job::Poll { target, at, reply } => {
                    let result = reconcile_service::poll(
                        &medium,
                        &registry,
                        &publisher,
                        &target,
                        at,
                        offline_threshold,
                    )
                    .await;
                    progress.send_modify(|p| {
                        if result.is_ok() {
                            p.executed += 1;
                        } else {
                            p.failed += 1;
                        }
                    });
                    // The caller may have stopped waiting.
                    let _ = reply.send(result);
                }
            }
        }
        tracing::debug!("command queue closed, worker stopping");
    }
}

/// Execute one write and report it. Returns whether it succeeded.
async fn handle_write<T: Transport, P: EventPublisher>(
    medium: &SharedMedium<T>,
    registry: &LightRegistry,
    publisher: &P,
    command: &Command,
) -> bool {
    match execute(medium, registry, command).await {
        Ok(()) => {
            tracing::debug!(
                command = %command.id,
                address = %command.target,
                kind = command.kind.name(),
                "command executed"
            );
            acknowledge(registry, publisher, command).await;
            true
        }
        Err(err) => {
            let reason = describe(&err);
            tracing::warn!(
                command = %command.id,
                address = %command.target,
                kind = command.kind.name(),
                %reason,
                "command failed"
            );
            publisher
                .publish(HubEvent::CommandFailed {
                    command: command.id,
                    target: command.target.clone(),
                    reason,
                })
                .await;
            false
        }
    }
}

/// Perform the write for one command while holding the medium.
async fn execute<T: Transport>(
    medium: &SharedMedium<T>,
    registry: &LightRegistry,
    command: &Command,
) -> Result<(), GlowHubError> {
    let target = &command.target;
    let zones = registry.inspect(target, |light| {
        light
            .colors()
            .is_zoned()
            .then(|| light.colors().zone_count())
    })?;

    let mut guard = medium.acquire().await;
    match &command.kind {
        CommandKind::PowerOn
        | CommandKind::GroupOp {
            op: GroupOperation::PowerOn,
            ..
        } => guard.write_power(target, true).await?,
        CommandKind::PowerOff
        | CommandKind::GroupOp {
            op: GroupOperation::PowerOff,
            ..
        } => guard.write_power(target, false).await?,
        CommandKind::SetColor {
            color,
            duration,
            zones: Some(range),
        } => {
            guard
                .write_zone_color(target, *range, *color, *duration)
                .await?;
        }
        CommandKind::SetColor {
            color,
            duration,
            zones: None,
        } => guard.write_color(target, *color, *duration).await?,
        CommandKind::GroupOp {
            op: GroupOperation::SetColor { color, duration },
            ..
        } => match zones {
            Some(count) => {
                guard
                    .write_zone_color(target, ZoneRange::all(count), *color, *duration)
                    .await?;
            }
            None => guard.write_color(target, *color, *duration).await?,
        },
        CommandKind::SetField { color, duration } => {
            guard.write_color(target, *color, *duration).await?;
        }
        CommandKind::SetZoneField {
            zones,
            color,
            duration,
        } => {
            guard
                .write_zone_color(target, *zones, *color, *duration)
                .await?;
        }
        CommandKind::Commit { colors, duration } => match colors {
            ColorState::Single(color) => guard.write_color(target, *color, *duration).await?,
            ColorState::Zones(list) => guard.write_zone_colors(target, list, *duration).await?,
        },
    }
    Ok(())
}

/// Reflect an acknowledged write in the mirror and notify subscribers.
///
/// Staged-edit writes are left alone: the staged snapshot owns those.
async fn acknowledge<P: EventPublisher>(
    registry: &LightRegistry,
    publisher: &P,
    command: &Command,
) {
    let changed = registry.update(&command.target, |light| match &command.kind {
        CommandKind::PowerOn
        | CommandKind::GroupOp {
            op: GroupOperation::PowerOn,
            ..
        } => {
            light.record_power_written(true);
            Some(light.state())
        }
        CommandKind::PowerOff
        | CommandKind::GroupOp {
            op: GroupOperation::PowerOff,
            ..
        } => {
            light.record_power_written(false);
            Some(light.state())
        }
        CommandKind::SetColor { color, zones, .. } => light
            .record_color_written(*color, *zones)
            .then(|| light.state()),
        CommandKind::GroupOp {
            op: GroupOperation::SetColor { color, .. },
            ..
        } => light
            .record_color_written(*color, None)
            .then(|| light.state()),
        CommandKind::SetField { .. }
        | CommandKind::SetZoneField { .. }
        | CommandKind::Commit { .. } => None,
    });
    if let Ok(Some(state)) = changed {
        publisher.publish(HubEvent::LightChanged(state)).await;
    }
}

/// Render an error with its source chain on one line.
fn describe(err: &GlowHubError) -> String {
    let mut reason = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}
