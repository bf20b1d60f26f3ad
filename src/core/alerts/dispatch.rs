// Action fan-out.
//
// A firing is turned into a list of `Effect`s up front (sound debounce and
// catalog lookup happen there), then handed to a `Delivery`. Senders are
// collaborators behind traits; a failing sender is logged and skipped.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::gates::SoundDebounce;
use super::message::{RichNotification, Synthesized};
use super::model::{AlertAction, AlertId};
use crate::core::error::DeliveryError;
use crate::core::sounds;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppWindow {
    Pings,
    PlanetaryIndustry,
}

/// How OS notifications are presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStyle {
    pub app_name: String,
    pub icon_path: PathBuf,
    pub timeout_seconds: u32,
}

impl Default for NotificationStyle {
    fn default() -> Self {
        Self {
            app_name: "RIFT Intel Fusion Tool".to_string(),
            icon_path: PathBuf::from("icon/icon-512.png"),
            timeout_seconds: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNotification {
    pub app_name: String,
    pub icon_path: PathBuf,
    pub title: String,
    pub body: String,
    pub timeout_seconds: u32,
}

/// One side effect of a firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Rich { notification: RichNotification },
    System(SystemNotification),
    Push { title: String, body: String },
    /// Bundled sound, by resource file name
    Sound { resource: String },
    SoundFile { path: PathBuf },
    OpenWindow { window: AppWindow },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    pub alert_id: AlertId,
    pub title: String,
    pub body: String,
    pub effects: Vec<Effect>,
}

pub trait RichNotifier: Send + Sync {
    fn show(&self, notification: &RichNotification) -> Result<(), DeliveryError>;
}

pub trait SystemNotifier: Send + Sync {
    fn notify(&self, notification: &SystemNotification) -> Result<(), DeliveryError>;
}

pub trait PushNotifier: Send + Sync {
    fn push(&self, title: &str, body: &str) -> Result<(), DeliveryError>;
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self, resource: &str) -> Result<(), DeliveryError>;
    fn play_file(&self, path: &Path) -> Result<(), DeliveryError>;
}

pub trait WindowOpener: Send + Sync {
    fn open(&self, window: AppWindow) -> Result<(), DeliveryError>;
}

/// Telemetry hook, called once per firing.
pub trait Analytics: Send + Sync {
    fn alert_triggered(&self, alert_id: &str);
}

pub struct NoAnalytics;

impl Analytics for NoAnalytics {
    fn alert_triggered(&self, _alert_id: &str) {}
}

/// Turn an alert's actions into effects.
///
/// Sounds pass through the global debounce here, so a suppressed sound never
/// reaches a sender. Unknown sound ids are skipped before the debounce is
/// consulted.
pub fn build_effects(
    alert_id: &str,
    actions: &[AlertAction],
    synthesized: &Synthesized,
    style: &NotificationStyle,
    debounce: &Mutex<SoundDebounce>,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    let body = synthesized.body();
    let mut effects = Vec::with_capacity(actions.len());

    for action in actions {
        let effect = match action {
            AlertAction::RiftNotification => synthesized
                .rich
                .clone()
                .map(|notification| Effect::Rich { notification }),
            AlertAction::SystemNotification => Some(Effect::System(SystemNotification {
                app_name: style.app_name.clone(),
                icon_path: style.icon_path.clone(),
                title: synthesized.title.clone(),
                body: body.clone(),
                timeout_seconds: style.timeout_seconds,
            })),
            AlertAction::PushNotification => Some(Effect::Push {
                title: synthesized.title.clone(),
                body: body.clone(),
            }),
            AlertAction::Sound { id } => match sounds::find(*id) {
                Some(sound) => debounced(debounce, now, alert_id).then(|| Effect::Sound {
                    resource: sound.resource.to_string(),
                }),
                None => {
                    log::warn!("Alert {alert_id} references unknown sound {id}");
                    None
                }
            },
            AlertAction::CustomSound { path } => {
                debounced(debounce, now, alert_id).then(|| Effect::SoundFile {
                    path: PathBuf::from(path),
                })
            }
            AlertAction::ShowPing => Some(Effect::OpenWindow {
                window: AppWindow::Pings,
            }),
            AlertAction::ShowColonies => Some(Effect::OpenWindow {
                window: AppWindow::PlanetaryIndustry,
            }),
        };
        effects.extend(effect);
    }
    effects
}

fn debounced(debounce: &Mutex<SoundDebounce>, now: DateTime<Utc>, alert_id: &str) -> bool {
    let allowed = lock(debounce).try_play(now);
    if !allowed {
        log::debug!("Sound for alert {alert_id} suppressed by debounce");
    }
    allowed
}

/// The notification backends, shared by every delivery path.
#[derive(Clone)]
pub struct Senders {
    pub rich: Arc<dyn RichNotifier>,
    pub system: Arc<dyn SystemNotifier>,
    pub push: Arc<dyn PushNotifier>,
    pub sound: Arc<dyn SoundPlayer>,
    pub windows: Arc<dyn WindowOpener>,
}

impl Senders {
    /// Every backend logs instead of notifying.
    pub fn logging() -> Self {
        let sink = Arc::new(LoggingSenders);
        Self {
            rich: sink.clone(),
            system: sink.clone(),
            push: sink.clone(),
            sound: sink.clone(),
            windows: sink,
        }
    }

    pub fn execute(&self, effect: &Effect) -> Result<(), DeliveryError> {
        match effect {
            Effect::Rich { notification } => self.rich.show(notification),
            Effect::System(notification) => self.system.notify(notification),
            Effect::Push { title, body } => self.push.push(title, body),
            Effect::Sound { resource } => self.sound.play(resource),
            Effect::SoundFile { path } => self.sound.play_file(path),
            Effect::OpenWindow { window } => self.windows.open(*window),
        }
    }

    /// Run every effect; failures are logged and do not stop the rest.
    pub fn deliver(&self, firing: &Firing) {
        for effect in &firing.effects {
            if let Err(e) = self.execute(effect) {
                log::warn!("Alert {} action failed: {}", firing.alert_id, e);
            }
        }
    }
}

/// Where the engine sends firings. Must not block the caller for long.
pub trait Delivery: Send + Sync {
    fn deliver(&self, firing: Firing);
}

/// Runs effects on the calling thread.
pub struct DirectDelivery {
    senders: Senders,
}

impl DirectDelivery {
    pub fn new(senders: Senders) -> Self {
        Self { senders }
    }
}

impl Delivery for DirectDelivery {
    fn deliver(&self, firing: Firing) {
        self.senders.deliver(&firing);
    }
}

/// Hands firings to a worker through an unbounded channel.
pub struct QueuedDelivery {
    tx: mpsc::UnboundedSender<Firing>,
}

impl QueuedDelivery {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Firing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Delivery for QueuedDelivery {
    fn deliver(&self, firing: Firing) {
        if let Err(e) = self.tx.send(firing) {
            log::warn!("Delivery worker is gone, dropping alert {}", e.0.alert_id);
        }
    }
}

/// Logs every notification at info level. Used by the replay binary.
pub struct LoggingSenders;

impl RichNotifier for LoggingSenders {
    fn show(&self, notification: &RichNotification) -> Result<(), DeliveryError> {
        let json = serde_json::to_string(notification).map_err(|e| DeliveryError::Rejected(e.to_string()))?;
        log::info!("[rich] {json}");
        Ok(())
    }
}

impl SystemNotifier for LoggingSenders {
    fn notify(&self, notification: &SystemNotification) -> Result<(), DeliveryError> {
        log::info!("[system] {}: {}", notification.title, notification.body);
        Ok(())
    }
}

impl PushNotifier for LoggingSenders {
    fn push(&self, title: &str, body: &str) -> Result<(), DeliveryError> {
        log::info!("[push] {title}: {body}");
        Ok(())
    }
}

impl SoundPlayer for LoggingSenders {
    fn play(&self, resource: &str) -> Result<(), DeliveryError> {
        log::info!("[sound] {resource}");
        Ok(())
    }

    fn play_file(&self, path: &Path) -> Result<(), DeliveryError> {
        log::info!("[sound] {}", path.display());
        Ok(())
    }
}

impl WindowOpener for LoggingSenders {
    fn open(&self, window: AppWindow) -> Result<(), DeliveryError> {
        log::info!("[window] {window:?}");
        Ok(())
    }
}
