use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::alerts::dispatch::{Firing, Senders};
use super::alerts::engine::{AlertEngine, EngineConfig};
use super::alerts::model::{Alert, AlertId};
use super::clock::Clock;
use super::model::EngineEvent;

const COMMAND_BUFFER: usize = 256;

/// Commands accepted by the background loop.
#[derive(Debug, Clone)]
pub enum CoordinatorCommand {
    Event(EngineEvent),
    SetAlerts(Vec<Alert>),
    SetIntelChannels(Vec<String>),
    UpdateConfig(EngineConfig),
    TestSound(AlertId),
}

/// Sending side of a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<CoordinatorCommand>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl CoordinatorHandle {
    pub async fn send(
        &self,
        command: CoordinatorCommand,
    ) -> Result<(), mpsc::error::SendError<CoordinatorCommand>> {
        self.commands.send(command).await
    }

    pub async fn event(
        &self,
        event: EngineEvent,
    ) -> Result<(), mpsc::error::SendError<CoordinatorCommand>> {
        self.send(CoordinatorCommand::Event(event)).await
    }

    /// Stop the loop. Pending commands are dropped.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Drives the alert engine from one task: incoming events and edits in
/// arrival order, plus a periodic tick for time-based triggers.
pub struct Coordinator {
    engine: Arc<AlertEngine>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
}

impl Coordinator {
    pub fn new(engine: Arc<AlertEngine>, clock: Arc<dyn Clock>, tick_interval: Duration) -> Self {
        Self {
            engine,
            clock,
            tick_interval,
        }
    }

    /// Start the background loop on the current tokio runtime.
    pub fn spawn(self) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx, shutdown_rx));
        let handle = CoordinatorHandle {
            commands: tx,
            shutdown: Arc::new(shutdown_tx),
        };
        (handle, task)
    }

    async fn run(
        self,
        mut commands: mpsc::Receiver<CoordinatorCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!(
            "Alert coordinator started, tick every {} ms",
            self.tick_interval.as_millis()
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = ticker.tick() => {
                    let fired = self.engine.on_tick(self.clock.now());
                    if !fired.is_empty() {
                        log::debug!("Tick fired {} alert(s)", fired.len());
                    }
                }
            }
        }
        log::info!("Alert coordinator stopped");
    }

    fn handle(&self, command: CoordinatorCommand) {
        match command {
            CoordinatorCommand::Event(event) => {
                self.engine.on_event(&event);
            }
            CoordinatorCommand::SetAlerts(alerts) => {
                log::info!("Loaded {} alert(s)", alerts.len());
                self.engine.set_alerts(alerts);
            }
            CoordinatorCommand::SetIntelChannels(channels) => {
                self.engine.set_intel_channels(&channels);
            }
            CoordinatorCommand::UpdateConfig(config) => {
                self.engine.update_config(config);
            }
            CoordinatorCommand::TestSound(alert_id) => {
                if !self.engine.test_sound(&alert_id) {
                    log::warn!("Alert {alert_id} has no playable sound");
                }
            }
        }
    }
}

/// Drain queued firings into the senders. Senders may block, so each firing
/// runs on the blocking pool; firings are still delivered in order.
pub fn spawn_delivery_worker(
    senders: Senders,
    mut firings: mpsc::UnboundedReceiver<Firing>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(firing) = firings.recv().await {
            let senders = senders.clone();
            let alert_id = firing.alert_id.clone();
            let delivery = tokio::task::spawn_blocking(move || senders.deliver(&firing));
            if let Err(e) = delivery.await {
                log::warn!("Delivery of alert {alert_id} panicked: {e}");
            }
        }
        log::debug!("Delivery worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::dispatch::QueuedDelivery;
    use crate::core::alerts::location::{DistanceTable, TrackedCharacters};
    use crate::core::alerts::model::{AlertAction, AlertTrigger, ChatMessageChannel, IntelChannel};
    use crate::core::clock::ManualClock;
    use crate::core::model::ChatMessage;
    use chrono::{TimeZone, Utc};

    const WAIT: Duration = Duration::from_secs(5);

    fn setup() -> (Coordinator, mpsc::UnboundedReceiver<Firing>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let (delivery, firings) = QueuedDelivery::channel();
        let engine = AlertEngine::new(
            Arc::new(DistanceTable::new()),
            Arc::new(TrackedCharacters::new()),
            clock.clone(),
            Arc::new(delivery),
        );
        let coordinator = Coordinator::new(Arc::new(engine), clock, Duration::from_millis(10));
        (coordinator, firings)
    }

    fn alert(id: &str, trigger: AlertTrigger) -> Alert {
        Alert {
            id: id.to_string(),
            is_enabled: true,
            group: None,
            trigger,
            actions: vec![AlertAction::PushNotification],
            cooldown_seconds: 0,
        }
    }

    #[tokio::test]
    async fn test_events_are_evaluated_in_order() {
        let (coordinator, mut firings) = setup();
        let (handle, task) = coordinator.spawn();

        handle
            .send(CoordinatorCommand::SetAlerts(vec![alert(
                "chat",
                AlertTrigger::ChatMessage {
                    channel: ChatMessageChannel::Any,
                    sender: None,
                    message_containing: Some("help".to_string()),
                },
            )]))
            .await
            .unwrap();
        handle
            .event(EngineEvent::Chat(ChatMessage {
                timestamp: Utc::now(),
                channel: "Corp".to_string(),
                sender: "Alice".to_string(),
                message: "need help".to_string(),
                sender_character_id: None,
            }))
            .await
            .unwrap();

        let firing = tokio::time::timeout(WAIT, firings.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(firing.alert_id, "chat");
        assert_eq!(firing.title, "Chat message in Corp");

        handle.shutdown();
        tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_tick_evaluates_channel_silence() {
        let (coordinator, mut firings) = setup();
        let (handle, task) = coordinator.spawn();

        handle
            .send(CoordinatorCommand::SetIntelChannels(vec!["intel".to_string()]))
            .await
            .unwrap();
        handle
            .send(CoordinatorCommand::SetAlerts(vec![alert(
                "quiet",
                AlertTrigger::NoChannelActivity {
                    channel: IntelChannel::Any,
                    duration_seconds: 0,
                },
            )]))
            .await
            .unwrap();

        let firing = tokio::time::timeout(WAIT, firings.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(firing.title, "No intel received");

        handle.shutdown();
        tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_loop_stops_when_handles_are_dropped() {
        let (coordinator, _firings) = setup();
        let (handle, task) = coordinator.spawn();
        drop(handle);
        tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_delivery_worker_drains_and_stops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = spawn_delivery_worker(Senders::logging(), rx);
        tx.send(Firing {
            alert_id: "a".to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            effects: Vec::new(),
        })
        .unwrap();
        drop(tx);
        tokio::time::timeout(WAIT, worker).await.unwrap().unwrap();
    }
}
