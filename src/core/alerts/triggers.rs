// Trigger matching, one pure function per trigger category.
//
// Every matcher is total: it returns the match payload needed for message
// synthesis, or `None`.

use chrono::{DateTime, Utc};

use super::activity::ChannelActivity;
use super::location::{AlertLocationMatch, LocationMatcher};
use super::model::{
    ChatMessageChannel, GameActionType, IntelChannel, IntelReportLocation, IntelReportType,
    JabberMessageChannel, JabberPingType,
};
use crate::core::model::{
    BridgeMessage, ChatMessage, ColonyEvent, GameLogAction, IntelReport, PapType, PiEventType,
    PingModel, SystemEntity,
};

/// Report types that matched, with the entities that satisfied each.
#[derive(Debug, Clone, PartialEq)]
pub struct IntelMatch {
    pub matched: Vec<(IntelReportType, Vec<SystemEntity>)>,
    pub location: AlertLocationMatch,
}

impl IntelMatch {
    pub fn matched_types(&self) -> impl Iterator<Item = &IntelReportType> {
        self.matched.iter().map(|(report_type, _)| report_type)
    }
}

/// Text that caused a message trigger to match, for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMatch {
    pub highlight: Option<String>,
}

/// Treat empty filter strings the same as unset ones.
fn filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn contains_filter(haystack: &str, needle: &Option<String>) -> bool {
    filter(needle).map_or(true, |needle| haystack.contains(needle))
}

/// Intel reports: some configured report type must be present, and the
/// reported system must be inside the location constraint.
pub fn match_intel(
    report: &IntelReport,
    report_types: &[IntelReportType],
    report_location: &IntelReportLocation,
    locations: &LocationMatcher,
) -> Option<IntelMatch> {
    let matched: Vec<_> = report_types
        .iter()
        .filter_map(|report_type| {
            let entities = matching_entities(report_type, &report.entities);
            (!entities.is_empty()).then(|| (report_type.clone(), entities))
        })
        .collect();

    if matched.is_empty() {
        return None;
    }

    let location = locations.matches(&report.system, report_location)?;
    Some(IntelMatch { matched, location })
}

fn matching_entities(report_type: &IntelReportType, entities: &[SystemEntity]) -> Vec<SystemEntity> {
    entities
        .iter()
        .filter(|entity| match (report_type, entity) {
            (IntelReportType::AnyCharacter, SystemEntity::Character { .. }) => true,
            (IntelReportType::SpecificCharacters { characters }, SystemEntity::Character { name, .. }) => {
                characters.contains(name)
            }
            (IntelReportType::AnyShip, SystemEntity::Ship { .. }) => true,
            (
                IntelReportType::SpecificShipClasses { classes },
                SystemEntity::Ship {
                    ship_class: Some(ship_class),
                    ..
                },
            ) => classes.contains(ship_class),
            (IntelReportType::Wormhole, SystemEntity::Wormhole) => true,
            (IntelReportType::GateCamp, SystemEntity::GateCamp) => true,
            (IntelReportType::Bubbles, SystemEntity::Bubbles) => true,
            _ => false,
        })
        .cloned()
        .collect()
}

/// Game log actions: returns the first configured action type that matches.
///
/// Combat-stopped actions are produced by the engine's combat tracker, so
/// their idle time is already known here.
pub fn match_game_action<'a>(
    action: &GameLogAction,
    action_types: &'a [GameActionType],
) -> Option<&'a GameActionType> {
    action_types
        .iter()
        .find(|action_type| game_action_matches(action, action_type))
}

fn game_action_matches(action: &GameLogAction, action_type: &GameActionType) -> bool {
    use GameLogAction as A;

    match (action_type, action) {
        (
            GameActionType::InCombat { name_containing },
            A::UnderAttack { target } | A::Attacking { target } | A::BeingWarpScrambled { target },
        ) => contains_filter(target, name_containing),
        (
            GameActionType::UnderAttack { name_containing },
            A::UnderAttack { target } | A::BeingWarpScrambled { target },
        ) => contains_filter(target, name_containing),
        (GameActionType::Attacking { name_containing }, A::Attacking { target }) => {
            contains_filter(target, name_containing)
        }
        (GameActionType::BeingWarpScrambled, A::BeingWarpScrambled { .. }) => true,
        (GameActionType::Decloaked { ignored_keywords }, A::Decloaked { by }) => {
            match decloak_ignored_by(by, ignored_keywords) {
                Some(keyword) => {
                    log::debug!("Ignoring decloak by {by}, matched keyword \"{keyword}\"");
                    false
                }
                None => true,
            }
        }
        (
            GameActionType::CombatStopped {
                name_containing,
                duration_seconds,
            },
            A::CombatStopped {
                target,
                idle_seconds,
            },
        ) => *idle_seconds >= u64::from(*duration_seconds) && contains_filter(target, name_containing),
        _ => false,
    }
}

/// The first ignored keyword found in the decloaking entity's name,
/// ignoring case ("Gate" ignores "Stargate (Jita)").
pub fn decloak_ignored_by<'a>(by: &str, ignored_keywords: &'a [String]) -> Option<&'a str> {
    let by = by.to_lowercase();
    ignored_keywords
        .iter()
        .map(String::as_str)
        .filter(|keyword| !keyword.is_empty())
        .find(|keyword| by.contains(&keyword.to_lowercase()))
}

/// Colony events: kind must be configured, and the colony must pass the filter.
/// `alert_before_seconds` is the poller's concern, not a match condition.
pub fn match_colony(
    event: &ColonyEvent,
    event_types: &[PiEventType],
    colonies_filter: &Option<Vec<String>>,
) -> bool {
    event_types.contains(&event.event_type)
        && colonies_filter
            .as_ref()
            .map_or(true, |colonies| colonies.contains(&event.colony_id))
}

pub fn match_chat_message(
    message: &ChatMessage,
    channel: &ChatMessageChannel,
    sender: &Option<String>,
    message_containing: &Option<String>,
) -> Option<MessageMatch> {
    let channel_matches = match channel {
        ChatMessageChannel::Any => true,
        ChatMessageChannel::Channel { name } => message.channel == *name,
    };
    match_message_body(
        channel_matches,
        &message.sender,
        &message.message,
        sender,
        message_containing,
    )
}

pub fn match_bridge_message(
    message: &BridgeMessage,
    channel: &JabberMessageChannel,
    sender: &Option<String>,
    message_containing: &Option<String>,
) -> Option<MessageMatch> {
    let channel_matches = match channel {
        JabberMessageChannel::Any => true,
        JabberMessageChannel::Channel { name } => message.chat == *name,
        JabberMessageChannel::DirectMessage => message.is_direct,
    };
    match_message_body(
        channel_matches,
        &message.sender,
        &message.message,
        sender,
        message_containing,
    )
}

fn match_message_body(
    channel_matches: bool,
    message_sender: &str,
    text: &str,
    sender: &Option<String>,
    message_containing: &Option<String>,
) -> Option<MessageMatch> {
    if !channel_matches {
        return None;
    }
    if filter(sender).is_some_and(|sender| sender != message_sender) {
        return None;
    }
    if !contains_filter(text, message_containing) {
        return None;
    }
    Some(MessageMatch {
        highlight: filter(message_containing).map(str::to_string),
    })
}

pub fn match_ping(ping: &PingModel, ping_type: &JabberPingType) -> bool {
    match (ping_type, ping) {
        (JabberPingType::Message, PingModel::PlainText { .. }) => true,
        (JabberPingType::Message2 { target }, PingModel::PlainText { target: ping_target, .. }) => {
            target_matches(target, ping_target)
        }
        (
            JabberPingType::Fleet {
                target,
                fleet_commanders,
                formup_system,
                pap_type,
                doctrine_containing,
            },
            PingModel::Fleet {
                fleet_commander,
                formup_systems,
                pap_type: ping_pap_type,
                doctrine,
                target: ping_target,
                ..
            },
        ) => {
            let commander_matches = fleet_commanders.is_empty()
                || fleet_commander
                    .as_ref()
                    .is_some_and(|fc| fleet_commanders.contains(fc));
            let formup_matches = filter(formup_system)
                .map_or(true, |system| formup_systems.iter().any(|s| s == system));
            let pap_matches = *pap_type == PapType::Any || *ping_pap_type == Some(*pap_type);
            let doctrine_matches = match filter(doctrine_containing) {
                None => true,
                Some(needle) => doctrine.as_deref().is_some_and(|d| d.contains(needle)),
            };

            target_matches(target, ping_target)
                && commander_matches
                && formup_matches
                && pap_matches
                && doctrine_matches
        }
        _ => false,
    }
}

fn target_matches(configured: &Option<String>, reported: &Option<String>) -> bool {
    match filter(configured) {
        None => true,
        Some(needle) => reported.as_deref().is_some_and(|t| t.contains(needle)),
    }
}

/// Channel silence. Returns the silent channels that caused the match.
pub fn match_no_channel_activity(
    activity: &ChannelActivity,
    channel: &IntelChannel,
    duration_seconds: u32,
    now: DateTime<Utc>,
) -> Option<Vec<String>> {
    let threshold = chrono::Duration::seconds(i64::from(duration_seconds));
    let silent = activity.silent_channels(threshold, now);

    match channel {
        IntelChannel::All => {
            (activity.tracked_count() > 0 && silent.len() == activity.tracked_count()).then_some(silent)
        }
        IntelChannel::Any => (!silent.is_empty()).then_some(silent),
        IntelChannel::Channel { name } => silent
            .iter()
            .any(|c| c == name)
            .then(|| vec![name.clone()]),
    }
}
