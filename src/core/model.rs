// Incoming event types delivered by the parsers and bridge clients.
//
// The engine never parses text itself; everything arrives already typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CharacterId = u64;
pub type ColonyId = String;

/// Something reported in an intel channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemEntity {
    Character {
        name: String,
        #[serde(default)]
        character_id: Option<CharacterId>,
    },
    Ship {
        /// Ship type as written in the report, e.g. "Sabre"
        name: String,
        /// Resolved ship class, e.g. "Interdictor"
        #[serde(default)]
        ship_class: Option<String>,
        #[serde(default = "default_ship_count")]
        count: u32,
    },
    Wormhole,
    GateCamp,
    Bubbles,
}

fn default_ship_count() -> u32 {
    1
}

/// A parsed intel channel message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelReport {
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    /// Solar system the report is about
    pub system: String,
    pub entities: Vec<SystemEntity>,
}

/// Game log actions relevant to alerts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameLogAction {
    UnderAttack { target: String },
    Attacking { target: String },
    BeingWarpScrambled { target: String },
    Decloaked { by: String },
    /// Emitted by the engine's combat tracker once a character has been idle
    CombatStopped { target: String, idle_seconds: u64 },
}

impl GameLogAction {
    /// Name of the other party in this action.
    pub fn counterpart(&self) -> &str {
        match self {
            Self::UnderAttack { target }
            | Self::Attacking { target }
            | Self::BeingWarpScrambled { target }
            | Self::CombatStopped { target, .. } => target,
            Self::Decloaked { by } => by,
        }
    }

    /// Whether this action means the character is (still) fighting.
    pub fn is_combat(&self) -> bool {
        matches!(
            self,
            Self::UnderAttack { .. } | Self::Attacking { .. } | Self::BeingWarpScrambled { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLogEvent {
    pub timestamp: DateTime<Utc>,
    pub character_id: CharacterId,
    pub action: GameLogAction,
}

/// A message from an in-game chat channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub sender: String,
    pub message: String,
    #[serde(default)]
    pub sender_character_id: Option<CharacterId>,
}

/// Participation type announced in a fleet ping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PapType {
    Strategic,
    Peacetime,
    Any,
}

/// A ping received over the messaging bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PingModel {
    PlainText {
        timestamp: DateTime<Utc>,
        text: String,
        #[serde(default)]
        target: Option<String>,
    },
    Fleet {
        timestamp: DateTime<Utc>,
        description: String,
        #[serde(default)]
        fleet_commander: Option<String>,
        #[serde(default)]
        fleet: Option<String>,
        #[serde(default)]
        formup_systems: Vec<String>,
        #[serde(default)]
        pap_type: Option<PapType>,
        #[serde(default)]
        doctrine: Option<String>,
        #[serde(default)]
        target: Option<String>,
    },
}

impl PingModel {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PlainText { timestamp, .. } | Self::Fleet { timestamp, .. } => *timestamp,
        }
    }
}

/// A chat message received over the messaging bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub timestamp: DateTime<Utc>,
    /// Room or user the conversation is with
    pub chat: String,
    pub sender: String,
    pub message: String,
    #[serde(default)]
    pub is_direct: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PiEventType {
    NotSetup,
    ExtractorInactive,
    StorageFull,
    Idle,
}

/// A colony needing (or about to need) attention, surfaced by the colony poller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonyEvent {
    pub timestamp: DateTime<Utc>,
    pub colony_id: ColonyId,
    pub planet_name: String,
    #[serde(default)]
    pub planet_type: Option<String>,
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    /// Owner name, `None` while it is still being resolved
    #[serde(default)]
    pub character_name: Option<String>,
    pub event_type: PiEventType,
    /// When the colony is predicted to need attention
    pub predicted_at: DateTime<Utc>,
}

/// Everything the engine reacts to, in one envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Intel(IntelReport),
    GameLog(GameLogEvent),
    Chat(ChatMessage),
    Ping(PingModel),
    BridgeMessage(BridgeMessage),
    Colony(ColonyEvent),
}

impl EngineEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Intel(e) => e.timestamp,
            Self::GameLog(e) => e.timestamp,
            Self::Chat(e) => e.timestamp,
            Self::Ping(e) => e.timestamp(),
            Self::BridgeMessage(e) => e.timestamp,
            Self::Colony(e) => e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_counterpart() {
        let action = GameLogAction::Decloaked {
            by: "Stargate (Jita)".to_string(),
        };
        assert_eq!(action.counterpart(), "Stargate (Jita)");
        assert!(!action.is_combat());

        let action = GameLogAction::BeingWarpScrambled {
            target: "Sansha's Tyrant".to_string(),
        };
        assert!(action.is_combat());
    }

    #[test]
    fn test_event_envelope_json_shape() {
        let event = EngineEvent::Intel(IntelReport {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            channel: "delve.imperium".to_string(),
            system: "1DQ1-A".to_string(),
            entities: vec![SystemEntity::GateCamp],
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "intel");
        assert_eq!(json["event"]["entities"][0]["type"], "gate_camp");

        let back: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
