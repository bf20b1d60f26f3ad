// Alert engine - evaluates the alert set against incoming events and ticks,
// gates firings through cooldowns, and hands effects to the delivery path.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::activity::{ChannelActivity, CombatTracker};
use super::dispatch::{
    build_effects, lock, Analytics, Delivery, Effect, Firing, NoAnalytics, NotificationStyle,
};
use super::gates::{CooldownGate, SoundDebounce};
use super::location::{CharacterLocations, DistanceOracle, LocationMatcher};
use super::message::{self, Synthesized};
use super::model::{Alert, AlertAction, AlertId, AlertTrigger, GameActionType, IntelChannel};
use super::triggers;
use crate::core::clock::Clock;
use crate::core::model::{CharacterId, EngineEvent, GameLogAction};
use crate::core::sounds;

/// Idle characters are kept this long past the longest combat-stopped duration.
const COMBAT_RETENTION_MARGIN_SECONDS: i64 = 60;

/// Runtime options, taken from settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Forwarded to the distance oracle
    pub use_jump_bridges: bool,
    /// Translate ping keywords before building notifications
    pub translate_pings: bool,
    pub notification: NotificationStyle,
}

/// Snapshot of the silent channels an alert last fired for.
type SilenceLatch = Vec<(String, DateTime<Utc>)>;

/// Alert engine state. All methods take `&self`; the engine is shared behind
/// an `Arc` between the event intake and the tick loop.
pub struct AlertEngine {
    /// Copy-on-write alert set
    alerts: RwLock<Arc<Vec<Alert>>>,
    config: RwLock<EngineConfig>,
    cooldowns: Mutex<CooldownGate>,
    sound_debounce: Mutex<SoundDebounce>,
    channels: Mutex<ChannelActivity>,
    combat: Mutex<CombatTracker>,
    silence_latches: Mutex<HashMap<AlertId, SilenceLatch>>,
    /// Combat period (last combat instant) each alert already fired for, per character
    combat_latches: Mutex<HashMap<(AlertId, CharacterId), DateTime<Utc>>>,
    distances: Arc<dyn DistanceOracle>,
    characters: Arc<dyn CharacterLocations>,
    clock: Arc<dyn Clock>,
    delivery: Arc<dyn Delivery>,
    analytics: Arc<dyn Analytics>,
}

impl AlertEngine {
    pub fn new(
        distances: Arc<dyn DistanceOracle>,
        characters: Arc<dyn CharacterLocations>,
        clock: Arc<dyn Clock>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            alerts: RwLock::new(Arc::new(Vec::new())),
            config: RwLock::new(EngineConfig::default()),
            cooldowns: Mutex::new(CooldownGate::new()),
            sound_debounce: Mutex::new(SoundDebounce::new()),
            channels: Mutex::new(ChannelActivity::new()),
            combat: Mutex::new(CombatTracker::new()),
            silence_latches: Mutex::new(HashMap::new()),
            combat_latches: Mutex::new(HashMap::new()),
            distances,
            characters,
            clock,
            delivery,
            analytics: Arc::new(NoAnalytics),
        }
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_config(self, config: EngineConfig) -> Self {
        self.update_config(config);
        self
    }

    /// Update runtime options (hot-reload friendly)
    pub fn update_config(&self, config: EngineConfig) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
    }

    fn config(&self) -> EngineConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    // --- Alert set management ---

    /// Current alert set. Iterating it never observes a concurrent edit.
    pub fn alerts(&self) -> Arc<Vec<Alert>> {
        self.alerts.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the whole alert set.
    pub fn set_alerts(&self, alerts: Vec<Alert>) {
        self.edit_alerts(|current| *current = alerts);
    }

    /// Apply an edit to a copy of the alert set, then publish the copy.
    fn edit_alerts(&self, edit: impl FnOnce(&mut Vec<Alert>)) {
        let mut guard = self.alerts.write().unwrap_or_else(|e| e.into_inner());
        let mut next = guard.as_ref().clone();
        edit(&mut next);
        for alert in &mut next {
            alert.dedup_actions();
        }
        *guard = Arc::new(next);
    }

    pub fn set_enabled(&self, alert_id: &str, enabled: bool) {
        self.edit_alerts(|alerts| {
            for alert in alerts.iter_mut().filter(|a| a.id == alert_id) {
                alert.is_enabled = enabled;
            }
        });
    }

    pub fn set_group(&self, alert_id: &str, group: Option<String>) {
        self.edit_alerts(|alerts| {
            for alert in alerts.iter_mut().filter(|a| a.id == alert_id) {
                alert.group = group.clone();
            }
        });
    }

    /// Disable the whole group if any of it is enabled, otherwise enable it all.
    pub fn toggle_group(&self, group: Option<&str>) {
        self.edit_alerts(|alerts| {
            let any_enabled = alerts
                .iter()
                .any(|a| a.group.as_deref() == group && a.is_enabled);
            for alert in alerts.iter_mut().filter(|a| a.group.as_deref() == group) {
                alert.is_enabled = !any_enabled;
            }
        });
    }

    pub fn rename_group(&self, from: &str, to: &str) {
        self.edit_alerts(|alerts| {
            for alert in alerts.iter_mut().filter(|a| a.group.as_deref() == Some(from)) {
                alert.group = Some(to.to_string());
            }
        });
    }

    /// Alerts of a deleted group move back to the default group.
    pub fn delete_group(&self, group: &str) {
        self.edit_alerts(|alerts| {
            for alert in alerts.iter_mut().filter(|a| a.group.as_deref() == Some(group)) {
                alert.group = None;
            }
        });
    }

    pub fn delete_alert(&self, alert_id: &str) {
        self.edit_alerts(|alerts| alerts.retain(|a| a.id != alert_id));
        lock(&self.silence_latches).remove(alert_id);
        lock(&self.combat_latches).retain(|(id, _), _| id != alert_id);
    }

    /// Replace the tracked intel channels.
    pub fn set_intel_channels(&self, channels: &[String]) {
        let now = self.clock.now();
        lock(&self.channels).track(channels, now);
    }

    /// Distinct lead times of enabled planetary industry alerts, so the
    /// colony poller knows how far ahead to report.
    pub fn colony_alert_horizons(&self) -> Vec<u32> {
        let horizons: BTreeSet<u32> = self
            .alerts()
            .iter()
            .filter(|alert| alert.is_enabled)
            .filter_map(|alert| match &alert.trigger {
                AlertTrigger::PlanetaryIndustry {
                    alert_before_seconds,
                    ..
                } => Some(*alert_before_seconds),
                _ => None,
            })
            .collect();
        horizons.into_iter().collect()
    }

    // --- Evaluation ---

    /// Evaluate one incoming event. Returns the ids of the alerts that fired.
    pub fn on_event(&self, event: &EngineEvent) -> Vec<AlertId> {
        let now = self.clock.now();
        self.observe(event, now);

        let config = self.config();
        let alerts = self.alerts();
        let mut fired = Vec::new();

        for alert in alerts.iter().filter(|alert| alert.is_enabled) {
            let Some(synthesized) = self.evaluate(alert, event, &config, now) else {
                continue;
            };
            if self.fire(alert, synthesized, &config, now) {
                fired.push(alert.id.clone());
            }
        }
        fired
    }

    /// Feed liveness trackers before matching.
    fn observe(&self, event: &EngineEvent, now: DateTime<Utc>) {
        match event {
            EngineEvent::Intel(report) => {
                lock(&self.channels).touch(&report.channel, now);
            }
            EngineEvent::GameLog(log_event) if log_event.action.is_combat() => {
                lock(&self.combat).record(
                    log_event.character_id,
                    log_event.action.counterpart(),
                    now,
                );
            }
            _ => {}
        }
    }

    /// Match one alert against one event.
    fn evaluate(
        &self,
        alert: &Alert,
        event: &EngineEvent,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> Option<Synthesized> {
        match &alert.trigger {
            AlertTrigger::IntelReported {
                report_types,
                report_location,
            } => {
                let EngineEvent::Intel(report) = event else {
                    return None;
                };
                let locations = LocationMatcher::new(
                    self.distances.as_ref(),
                    self.characters.as_ref(),
                    config.use_jump_bridges,
                );
                let matched =
                    triggers::match_intel(report, report_types, report_location, &locations)?;
                Some(message::synthesize_intel(report, &matched))
            }
            AlertTrigger::GameAction { action_types } => {
                let EngineEvent::GameLog(log_event) = event else {
                    return None;
                };
                // Combat-stopped is timed by the tick, never taken from the feed
                if matches!(log_event.action, GameLogAction::CombatStopped { .. }) {
                    return None;
                }
                triggers::match_game_action(&log_event.action, action_types)?;
                Some(message::synthesize_game_action(
                    &log_event.action,
                    log_event.character_id,
                ))
            }
            AlertTrigger::PlanetaryIndustry {
                event_types,
                colonies_filter,
                ..
            } => {
                let EngineEvent::Colony(colony) = event else {
                    return None;
                };
                triggers::match_colony(colony, event_types, colonies_filter)
                    .then(|| message::synthesize_colony(colony, now))
            }
            AlertTrigger::ChatMessage {
                channel,
                sender,
                message_containing,
            } => {
                let EngineEvent::Chat(chat) = event else {
                    return None;
                };
                let matched =
                    triggers::match_chat_message(chat, channel, sender, message_containing)?;
                Some(message::synthesize_chat(chat, &matched))
            }
            AlertTrigger::JabberPing { ping_type } => {
                let EngineEvent::Ping(ping) = event else {
                    return None;
                };
                triggers::match_ping(ping, ping_type)
                    .then(|| message::synthesize_ping(ping, config.translate_pings))
            }
            AlertTrigger::JabberMessage {
                channel,
                sender,
                message_containing,
            } => {
                let EngineEvent::BridgeMessage(bridge) = event else {
                    return None;
                };
                let matched =
                    triggers::match_bridge_message(bridge, channel, sender, message_containing)?;
                Some(message::synthesize_bridge_message(bridge, &matched))
            }
            // Evaluated on tick
            AlertTrigger::NoChannelActivity { .. } => None,
        }
    }

    /// Periodic evaluation of time-based triggers: channel silence and
    /// combat-stopped. Returns the ids of the alerts that fired.
    pub fn on_tick(&self, now: DateTime<Utc>) -> Vec<AlertId> {
        let config = self.config();
        let alerts = self.alerts();
        let mut fired = Vec::new();

        let idle = {
            let mut combat = lock(&self.combat);
            combat.forget_idle(combat_retention(&alerts), now);
            combat.idle_characters(now)
        };

        for alert in alerts.iter() {
            if !alert.is_enabled {
                continue;
            }
            match &alert.trigger {
                AlertTrigger::NoChannelActivity {
                    channel,
                    duration_seconds,
                } => {
                    let Some((silent, snapshot)) =
                        self.silent_channels(&alert.id, channel, *duration_seconds, now)
                    else {
                        continue;
                    };
                    let synthesized = message::synthesize_silence(&silent);
                    if self.fire(alert, synthesized, &config, now) {
                        lock(&self.silence_latches).insert(alert.id.clone(), snapshot);
                        fired.push(alert.id.clone());
                    }
                }
                AlertTrigger::GameAction { action_types } => {
                    for character in &idle {
                        let action = GameLogAction::CombatStopped {
                            target: character.last_target.clone(),
                            idle_seconds: character.idle_seconds,
                        };
                        if triggers::match_game_action(&action, action_types).is_none() {
                            continue;
                        }
                        let key = (alert.id.clone(), character.character_id);
                        if lock(&self.combat_latches).get(&key) == Some(&character.combat_ended_at) {
                            continue;
                        }
                        let synthesized =
                            message::synthesize_game_action(&action, character.character_id);
                        if !self.fire(alert, synthesized, &config, now) {
                            continue;
                        }
                        lock(&self.combat_latches).insert(key, character.combat_ended_at);
                        if !fired.contains(&alert.id) {
                            fired.push(alert.id.clone());
                        }
                    }
                }
                AlertTrigger::IntelReported { .. }
                | AlertTrigger::PlanetaryIndustry { .. }
                | AlertTrigger::ChatMessage { .. }
                | AlertTrigger::JabberPing { .. }
                | AlertTrigger::JabberMessage { .. } => {}
            }
        }
        fired
    }

    /// Silent channels for a liveness alert plus the snapshot to latch once it
    /// fires, or `None` when it should not fire. Fires once per silence
    /// period: the latch holds until the set of silent channels (or their
    /// last message times) changes.
    fn silent_channels(
        &self,
        alert_id: &str,
        channel: &IntelChannel,
        duration_seconds: u32,
        now: DateTime<Utc>,
    ) -> Option<(Vec<String>, SilenceLatch)> {
        let (silent, snapshot) = {
            let activity = lock(&self.channels);
            let silent =
                triggers::match_no_channel_activity(&activity, channel, duration_seconds, now);
            let snapshot: Option<SilenceLatch> = silent.as_ref().map(|channels| {
                channels
                    .iter()
                    .filter_map(|c| Some((c.clone(), activity.last_message(c)?)))
                    .collect()
            });
            (silent, snapshot)
        };

        let mut latches = lock(&self.silence_latches);
        match (silent, snapshot) {
            (Some(silent), Some(snapshot)) => {
                (latches.get(alert_id) != Some(&snapshot)).then_some((silent, snapshot))
            }
            _ => {
                latches.remove(alert_id);
                None
            }
        }
    }

    /// Cooldown, analytics, effects, delivery. Returns false when the
    /// cooldown suppressed the firing.
    fn fire(
        &self,
        alert: &Alert,
        synthesized: Synthesized,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> bool {
        if !lock(&self.cooldowns).try_acquire(&alert.id, alert.cooldown_seconds, now) {
            log::debug!("Alert {} matched but is cooling down", alert.id);
            return false;
        }

        self.analytics.alert_triggered(&alert.id);
        log::info!("Alert {} fired: {}", alert.id, synthesized.title);

        let effects = build_effects(
            &alert.id,
            &alert.actions,
            &synthesized,
            &config.notification,
            &self.sound_debounce,
            now,
        );
        self.delivery.deliver(Firing {
            alert_id: alert.id.clone(),
            body: synthesized.body(),
            title: synthesized.title,
            effects,
        });
        true
    }

    /// Play an alert's first configured sound, skipping matching, cooldown
    /// and debounce. Returns false if the alert has no playable sound.
    pub fn test_sound(&self, alert_id: &str) -> bool {
        let alerts = self.alerts();
        let Some(alert) = alerts.iter().find(|a| a.id == alert_id) else {
            return false;
        };
        let effect = match alert.sound_action() {
            Some(AlertAction::Sound { id }) => sounds::find(*id).map(|sound| Effect::Sound {
                resource: sound.resource.to_string(),
            }),
            Some(AlertAction::CustomSound { path }) => Some(Effect::SoundFile {
                path: path.into(),
            }),
            _ => None,
        };
        let Some(effect) = effect else {
            return false;
        };
        self.delivery.deliver(Firing {
            alert_id: alert.id.clone(),
            title: "Sound test".to_string(),
            body: String::new(),
            effects: vec![effect],
        });
        true
    }
}

/// How long an idle character stays tracked.
fn combat_retention(alerts: &[Alert]) -> Duration {
    let longest = alerts
        .iter()
        .filter_map(|alert| match &alert.trigger {
            AlertTrigger::GameAction { action_types } => action_types
                .iter()
                .filter_map(|t| match t {
                    GameActionType::CombatStopped {
                        duration_seconds, ..
                    } => Some(i64::from(*duration_seconds)),
                    _ => None,
                })
                .max(),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    Duration::seconds(longest + COMBAT_RETENTION_MARGIN_SECONDS)
}
