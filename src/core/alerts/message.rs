// Notification text for a firing alert.
//
// Every trigger produces one `Synthesized` value. Rich notifications render
// `message` with highlights; system and push notifications use the same
// spans flattened to plain text.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::location::AlertLocationMatch;
use super::model::IntelReportType;
use super::triggers::{IntelMatch, MessageMatch};
use super::wording::{self as w, count, DAY, HOUR, MINUTE, SECOND};
use crate::core::model::{
    BridgeMessage, CharacterId, ChatMessage, ColonyEvent, GameLogAction, IntelReport, PingModel,
    SystemEntity,
};
use crate::core::translate;

/// Colony events predicted at least this far ahead are described as upcoming.
pub const COLONY_AHEAD_THRESHOLD_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub highlight: bool,
}

/// Text made of plain and highlighted spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    spans: Vec<Span>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.push(text.into(), false);
        self
    }

    pub fn highlight(mut self, text: impl Into<String>) -> Self {
        self.push(text.into(), true);
        self
    }

    fn push(&mut self, text: String, highlight: bool) {
        if text.is_empty() {
            return;
        }
        // Merge adjacent spans of the same kind
        if let Some(last) = self.spans.last_mut() {
            if last.highlight == highlight {
                last.text.push_str(&text);
                return;
            }
        }
        self.spans.push(Span { text, highlight });
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn highlighted(&self) -> impl Iterator<Item = &str> {
        self.spans
            .iter()
            .filter(|span| span.highlight)
            .map(|span| span.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn to_plain(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        StyledText::new().text(text)
    }
}

/// Payload for the in-app notification panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichNotification {
    Intel {
        title: String,
        location: AlertLocationMatch,
        entities: Vec<SystemEntity>,
        system: String,
    },
    Text {
        title: String,
        message: StyledText,
        character_id: Option<CharacterId>,
        /// Item type to show an icon for, resolved by the UI
        type_name: Option<String>,
    },
    ChatMessage {
        channel: String,
        sender: String,
        message: String,
        highlight: Option<String>,
        sender_character_id: Option<CharacterId>,
    },
    BridgeMessage {
        chat: String,
        sender: String,
        message: String,
        highlight: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    pub title: String,
    pub message: StyledText,
    /// `None` when the trigger has nothing to show in the notification panel
    pub rich: Option<RichNotification>,
}

impl Synthesized {
    /// Plain body for system and push notifications.
    pub fn body(&self) -> String {
        self.message.to_plain()
    }
}

/// Title for an intel firing. Fixed priority, independent of rule order.
pub fn intel_title<'a>(matched: impl IntoIterator<Item = &'a IntelReportType>) -> &'static str {
    let matched: Vec<&IntelReportType> = matched.into_iter().collect();
    let has = |wanted: &IntelReportType| matched.iter().any(|t| *t == wanted);

    if has(&IntelReportType::GateCamp) {
        w::INTEL_GATE_CAMP
    } else if has(&IntelReportType::AnyCharacter) {
        w::INTEL_HOSTILE
    } else if has(&IntelReportType::AnyShip) {
        w::INTEL_HOSTILE_SHIP
    } else if has(&IntelReportType::Bubbles) {
        w::INTEL_BUBBLES
    } else if has(&IntelReportType::Wormhole) {
        w::INTEL_WORMHOLE
    } else {
        w::INTEL_GENERIC
    }
}

pub fn distance_phrase(distance: u32) -> String {
    w::jumps_away(distance)
}

fn location_message(location: &AlertLocationMatch) -> StyledText {
    match location {
        AlertLocationMatch::System { system, distance: 0 } => {
            StyledText::new().text(w::IN_SYSTEM).text(" ").highlight(system)
        }
        AlertLocationMatch::System { system, distance } => StyledText::new()
            .highlight(distance_phrase(*distance))
            .text(w::FROM)
            .highlight(system),
        AlertLocationMatch::Character { distance: 0, .. } => {
            StyledText::new().highlight(w::IN_YOUR_SYSTEM)
        }
        AlertLocationMatch::Character { distance, .. } => {
            StyledText::new().highlight(distance_phrase(*distance))
        }
    }
}

pub fn synthesize_intel(report: &IntelReport, matched: &IntelMatch) -> Synthesized {
    let title = intel_title(matched.matched_types()).to_string();
    Synthesized {
        message: location_message(&matched.location),
        rich: Some(RichNotification::Intel {
            title: title.clone(),
            location: matched.location.clone(),
            entities: report.entities.clone(),
            system: report.system.clone(),
        }),
        title,
    }
}

pub fn game_action_title(action: &GameLogAction) -> &'static str {
    match action {
        GameLogAction::UnderAttack { .. } => w::UNDER_ATTACK,
        GameLogAction::Attacking { .. } => w::ATTACKING,
        GameLogAction::BeingWarpScrambled { .. } => w::WARP_SCRAMBLED,
        GameLogAction::Decloaked { .. } => w::DECLOAKED,
        GameLogAction::CombatStopped { .. } => w::COMBAT_STOPPED,
    }
}

fn game_action_message(action: &GameLogAction) -> StyledText {
    match action {
        GameLogAction::UnderAttack { target } => StyledText::new().text(w::ATTACKED_BY).highlight(target),
        GameLogAction::Attacking { target } => StyledText::new().text(w::YOUR_TARGET_IS).highlight(target),
        GameLogAction::BeingWarpScrambled { target } => {
            StyledText::new().text(w::SCRAMBLED_BY).highlight(target)
        }
        GameLogAction::Decloaked { by } => StyledText::new().highlight(by).text(w::IS_TOO_CLOSE),
        GameLogAction::CombatStopped {
            target,
            idle_seconds,
        } => StyledText::new()
            .text(w::OUT_OF_COMBAT_FOR)
            .highlight(format_idle(*idle_seconds))
            .text(w::LAST_TARGET_WAS)
            .highlight(target),
    }
}

/// Minutes (rounded down) from one minute up, seconds below that.
pub fn format_idle(seconds: u64) -> String {
    if seconds >= 60 {
        count(seconds / 60, MINUTE)
    } else {
        count(seconds, SECOND)
    }
}

pub fn synthesize_game_action(action: &GameLogAction, character_id: CharacterId) -> Synthesized {
    let title = game_action_title(action).to_string();
    let message = game_action_message(action);
    Synthesized {
        rich: Some(RichNotification::Text {
            title: title.clone(),
            message: message.clone(),
            character_id: Some(character_id),
            type_name: Some(action.counterpart().to_string()),
        }),
        title,
        message,
    }
}

pub fn synthesize_chat(message: &ChatMessage, matched: &MessageMatch) -> Synthesized {
    Synthesized {
        title: w::chat_title(&message.channel),
        message: StyledText::new()
            .highlight(&message.sender)
            .text(w::SENDER_SEPARATOR)
            .text(&message.message),
        rich: Some(RichNotification::ChatMessage {
            channel: message.channel.clone(),
            sender: message.sender.clone(),
            message: message.message.clone(),
            highlight: matched.highlight.clone(),
            sender_character_id: message.sender_character_id,
        }),
    }
}

pub fn synthesize_bridge_message(message: &BridgeMessage, matched: &MessageMatch) -> Synthesized {
    Synthesized {
        title: w::bridge_title(&message.chat),
        message: StyledText::from(message.message.as_str()),
        rich: Some(RichNotification::BridgeMessage {
            chat: message.chat.clone(),
            sender: message.sender.clone(),
            message: message.message.clone(),
            highlight: matched.highlight.clone(),
        }),
    }
}

/// Pings have their own window, so they never produce a rich payload.
pub fn synthesize_ping(ping: &PingModel, translate_text: bool) -> Synthesized {
    let (title, body) = match ping {
        PingModel::PlainText { text, .. } => (w::PING, text.clone()),
        PingModel::Fleet {
            description,
            fleet_commander,
            formup_systems,
            doctrine,
            ..
        } => {
            let mut lines = vec![description.clone()];
            if let Some(fc) = fleet_commander {
                lines.push(format!("{}{fc}", w::PING_FC));
            }
            if !formup_systems.is_empty() {
                lines.push(format!("{}{}", w::PING_FORMUP, formup_systems.join(", ")));
            }
            if let Some(doctrine) = doctrine {
                lines.push(format!("{}{doctrine}", w::PING_DOCTRINE));
            }
            (w::FLEET_PING, lines.join("\n"))
        }
    };
    let body = if translate_text {
        translate::translate(&body)
    } else {
        body
    };
    Synthesized {
        title: title.to_string(),
        message: StyledText::from(body.as_str()),
        rich: None,
    }
}

pub fn synthesize_silence(channels: &[String]) -> Synthesized {
    let title = w::NO_INTEL.to_string();
    let message = if channels.len() == 1 {
        StyledText::new()
            .text(w::CHANNEL)
            .highlight(&channels[0])
            .text(w::APPEARS_INACTIVE)
    } else {
        StyledText::new()
            .text(w::CHANNELS)
            .highlight(channels.join(", "))
            .text(w::APPEAR_INACTIVE)
    };
    Synthesized {
        rich: Some(RichNotification::Text {
            title: title.clone(),
            message: message.clone(),
            character_id: None,
            type_name: None,
        }),
        title,
        message,
    }
}

pub fn synthesize_colony(event: &ColonyEvent, now: DateTime<Utc>) -> Synthesized {
    let ahead = event.predicted_at - now;
    let is_upcoming = ahead >= Duration::minutes(COLONY_AHEAD_THRESHOLD_MINUTES);
    let title = if is_upcoming {
        w::COLONY_WILL_NEED_ATTENTION
    } else {
        w::COLONY_NEEDS_ATTENTION
    }
    .to_string();

    let owner = event
        .character_name
        .as_deref()
        .unwrap_or(w::COLONY_OWNER_PLACEHOLDER);
    let mut message = StyledText::new()
        .text(owner)
        .text(w::PLANET)
        .highlight(&event.planet_name);
    if is_upcoming {
        message = message
            .text(w::WILL_NEED_ATTENTION_IN)
            .highlight(format_duration_long(ahead));
    }

    Synthesized {
        rich: Some(RichNotification::Text {
            title: title.clone(),
            message: message.clone(),
            character_id: event.character_id,
            type_name: event.planet_type.clone(),
        }),
        title,
        message,
    }
}

/// "2 days 3 hours", "1 hour 5 minutes", "45 seconds". Largest two units.
pub fn format_duration_long(duration: Duration) -> String {
    let total = duration.num_seconds().max(0) as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let parts: Vec<String> = [(days, DAY), (hours, HOUR), (minutes, MINUTE)]
        .into_iter()
        .skip_while(|(n, _)| *n == 0)
        .take(2)
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| count(n, unit))
        .collect();

    if parts.is_empty() {
        count(seconds, SECOND)
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn intel_match(types: Vec<IntelReportType>, location: AlertLocationMatch) -> IntelMatch {
        IntelMatch {
            matched: types.into_iter().map(|t| (t, Vec::new())).collect(),
            location,
        }
    }

    #[test]
    fn test_styled_text_flattens_to_same_content() {
        let text = StyledText::new()
            .text("Attacked by ")
            .highlight("Guristas")
            .text("")
            .highlight(" Pirate");
        assert_eq!(text.to_plain(), "Attacked by Guristas Pirate");
        assert_eq!(text.to_string(), text.to_plain());
        assert_eq!(text.spans().len(), 2);
        assert_eq!(text.highlighted().collect::<Vec<_>>(), vec!["Guristas Pirate"]);
    }

    #[test]
    fn test_intel_title_priority() {
        let title = intel_title(&[IntelReportType::AnyShip, IntelReportType::GateCamp]);
        assert_eq!(title, "Gate camp reported");
        assert_eq!(
            intel_title(&[IntelReportType::Wormhole, IntelReportType::Bubbles]),
            "Bubbles reported"
        );
        assert_eq!(
            intel_title(&[IntelReportType::AnyShip, IntelReportType::AnyCharacter]),
            "Hostile reported"
        );
        assert_eq!(
            intel_title(&[IntelReportType::SpecificCharacters {
                characters: vec!["X".to_string()]
            }]),
            "Intel alert"
        );
    }

    #[test]
    fn test_distance_phrase() {
        assert_eq!(distance_phrase(0), "in system");
        assert_eq!(distance_phrase(1), "1 jump away");
        assert_eq!(distance_phrase(4), "4 jumps away");
    }

    #[test]
    fn test_intel_body() {
        let report = IntelReport {
            timestamp: t0(),
            channel: "intel".to_string(),
            system: "Perimeter".to_string(),
            entities: vec![SystemEntity::GateCamp],
        };
        let matched = intel_match(
            vec![IntelReportType::GateCamp],
            AlertLocationMatch::System {
                system: "Jita".to_string(),
                distance: 1,
            },
        );
        let synthesized = synthesize_intel(&report, &matched);
        assert_eq!(synthesized.title, "Gate camp reported");
        assert_eq!(synthesized.body(), "1 jump away from Jita");

        let matched = intel_match(
            vec![IntelReportType::AnyShip],
            AlertLocationMatch::Character {
                character_id: 1,
                system: "Perimeter".to_string(),
                distance: 0,
            },
        );
        assert_eq!(synthesize_intel(&report, &matched).body(), "in your system");
    }

    #[test]
    fn test_combat_stopped_duration_units() {
        let action = |idle_seconds| GameLogAction::CombatStopped {
            target: "Rat".to_string(),
            idle_seconds,
        };
        assert_eq!(
            synthesize_game_action(&action(45), 1).body(),
            "Out of combat for 45 seconds, last target was Rat"
        );
        assert_eq!(
            synthesize_game_action(&action(60), 1).body(),
            "Out of combat for 1 minute, last target was Rat"
        );
        assert_eq!(
            synthesize_game_action(&action(179), 1).body(),
            "Out of combat for 2 minutes, last target was Rat"
        );
    }

    #[test]
    fn test_rich_and_plain_share_content() {
        let action = GameLogAction::BeingWarpScrambled {
            target: "Sansha's Tyrant".to_string(),
        };
        let synthesized = synthesize_game_action(&action, 42);
        match &synthesized.rich {
            Some(RichNotification::Text {
                message,
                character_id,
                ..
            }) => {
                assert_eq!(message.to_plain(), synthesized.body());
                assert_eq!(*character_id, Some(42));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    fn colony(name: Option<&str>, predicted_at: DateTime<Utc>) -> ColonyEvent {
        ColonyEvent {
            timestamp: t0(),
            colony_id: "c1".to_string(),
            planet_name: "Jita IV".to_string(),
            planet_type: Some("Barren".to_string()),
            character_id: Some(9),
            character_name: name.map(str::to_string),
            event_type: crate::core::model::PiEventType::StorageFull,
            predicted_at,
        }
    }

    #[test]
    fn test_colony_messages() {
        let now_event = colony(Some("Alice"), t0());
        let synthesized = synthesize_colony(&now_event, t0());
        assert_eq!(synthesized.title, "Your colony needs attention");
        assert_eq!(synthesized.body(), "Alice: Planet Jita IV");

        let later = colony(None, t0() + Duration::minutes(90));
        let synthesized = synthesize_colony(&later, t0());
        assert_eq!(synthesized.title, "Your colony will need attention");
        assert_eq!(
            synthesized.body(),
            "Loading...: Planet Jita IV will need attention in 1 hour 30 minutes"
        );

        // Under the threshold reads as "now"
        let soon = colony(Some("Alice"), t0() + Duration::minutes(4));
        assert_eq!(synthesize_colony(&soon, t0()).title, "Your colony needs attention");
    }

    #[test]
    fn test_format_duration_long() {
        assert_eq!(format_duration_long(Duration::seconds(45)), "45 seconds");
        assert_eq!(format_duration_long(Duration::minutes(5)), "5 minutes");
        assert_eq!(format_duration_long(Duration::minutes(61)), "1 hour 1 minute");
        assert_eq!(format_duration_long(Duration::hours(49)), "2 days 1 hour");
        assert_eq!(format_duration_long(Duration::hours(48) + Duration::minutes(5)), "2 days");
    }

    #[test]
    fn test_silence_message() {
        let one = synthesize_silence(&["delve.imperium".to_string()]);
        assert_eq!(one.title, "No intel received");
        assert_eq!(one.body(), "Channel delve.imperium appears to be inactive");

        let two = synthesize_silence(&["a".to_string(), "b".to_string()]);
        assert_eq!(two.body(), "Channels a, b appear to be inactive");
    }

    #[test]
    fn test_ping_translation_and_no_rich_payload() {
        let ping = PingModel::PlainText {
            timestamp: t0(),
            text: "Need Logi".to_string(),
            target: None,
        };
        let plain = synthesize_ping(&ping, false);
        assert_eq!(plain.title, "Ping");
        assert_eq!(plain.body(), "Need Logi");
        assert!(plain.rich.is_none());

        assert_eq!(synthesize_ping(&ping, true).body(), "Need Logi(后勤)");
    }

    #[test]
    fn test_fleet_ping_body() {
        let ping = PingModel::Fleet {
            timestamp: t0(),
            description: "Strat op".to_string(),
            fleet_commander: Some("Ken".to_string()),
            fleet: None,
            formup_systems: vec!["1DQ1-A".to_string()],
            pap_type: None,
            doctrine: None,
            target: None,
        };
        let synthesized = synthesize_ping(&ping, false);
        assert_eq!(synthesized.title, "Fleet ping");
        assert_eq!(synthesized.body(), "Strat op\nFC: Ken\nFormup: 1DQ1-A");
    }

    #[test]
    fn test_chat_message() {
        let message = ChatMessage {
            timestamp: t0(),
            channel: "Corp".to_string(),
            sender: "Alice".to_string(),
            message: "Need help".to_string(),
            sender_character_id: Some(5),
        };
        let matched = MessageMatch {
            highlight: Some("help".to_string()),
        };
        let synthesized = synthesize_chat(&message, &matched);
        assert_eq!(synthesized.title, "Chat message in Corp");
        assert_eq!(synthesized.body(), "Alice: Need help");
        assert!(matches!(
            synthesized.rich,
            Some(RichNotification::ChatMessage { sender_character_id: Some(5), .. })
        ));
    }
}
