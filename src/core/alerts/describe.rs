// One-line summaries of alerts for the alert list, e.g.
// "When a gate camp is reported within 5 jumps of Jita, play sound "Gate camp"".

use std::path::Path;

use super::message::{format_idle, StyledText};
use super::model::{
    Alert, AlertAction, AlertTrigger, ChatMessageChannel, GameActionType, IntelChannel,
    IntelReportLocation, IntelReportType, JabberMessageChannel, JabberPingType, JumpRange,
};
use crate::core::model::{CharacterId, PapType, PiEventType};
use crate::core::sounds;

/// Describe an alert. `character_name` resolves owned character ids for
/// display; unknown ids are shown as numbers.
pub fn describe(alert: &Alert, character_name: impl Fn(CharacterId) -> Option<String>) -> StyledText {
    let text = StyledText::new().text("When ");
    let text = describe_trigger(text, &alert.trigger, &character_name);
    let text = text.text(", ").highlight(describe_actions(&alert.actions));
    if alert.cooldown_seconds == 0 {
        text
    } else {
        text.text(", at most once every ")
            .highlight(format_idle(u64::from(alert.cooldown_seconds)))
    }
}

fn describe_trigger(
    text: StyledText,
    trigger: &AlertTrigger,
    character_name: &impl Fn(CharacterId) -> Option<String>,
) -> StyledText {
    match trigger {
        AlertTrigger::IntelReported {
            report_types,
            report_location,
        } => {
            let text = if report_types.len() == 1 {
                text
            } else {
                text.text("any of ")
            };
            let types = report_types
                .iter()
                .map(report_type_name)
                .collect::<Vec<_>>()
                .join(", ");
            let location = match report_location {
                IntelReportLocation::System {
                    system_name,
                    jumps_range,
                } => format!("{} {}", range_prefix(jumps_range), system_name),
                IntelReportLocation::AnyOwnedCharacter { jumps_range } => {
                    format!("{} any online character", range_prefix(jumps_range))
                }
                IntelReportLocation::OwnedCharacter {
                    character_id,
                    jumps_range,
                } => {
                    let name = character_name(*character_id).unwrap_or_else(|| character_id.to_string());
                    format!("{} {}", range_prefix(jumps_range), name)
                }
            };
            text.highlight(types).text(" is reported ").highlight(location)
        }
        AlertTrigger::GameAction { action_types } => {
            let mut text = text;
            for (index, action_type) in action_types.iter().enumerate() {
                let joiner = if index == 0 { "you " } else { " or you " };
                text = describe_game_action(text.text(joiner), action_type);
            }
            text
        }
        AlertTrigger::PlanetaryIndustry {
            event_types,
            colonies_filter,
            alert_before_seconds,
        } => {
            let colonies = match colonies_filter {
                None => "any colony".to_string(),
                Some(colonies) if colonies.len() == 1 => "a specific colony".to_string(),
                Some(colonies) => format!("{} specific colonies", colonies.len()),
            };
            let events = event_types
                .iter()
                .map(|event| pi_event_name(*event))
                .collect::<Vec<_>>()
                .join(", or ");
            let text = text.highlight(colonies).text(" has ").highlight(events);
            if *alert_before_seconds > 0 {
                let hours = alert_before_seconds / 3600;
                let ahead = if hours >= 1 {
                    format!("{hours} hour{}", if hours == 1 { "" } else { "s" })
                } else {
                    let minutes = alert_before_seconds / 60;
                    format!("{minutes} minute{}", if minutes == 1 { "" } else { "s" })
                };
                text.text(" ").highlight(ahead).text(" ahead")
            } else {
                text
            }
        }
        AlertTrigger::ChatMessage {
            channel,
            sender,
            message_containing,
        } => {
            let channel = match channel {
                ChatMessageChannel::Any => "any channel".to_string(),
                ChatMessageChannel::Channel { name } => name.clone(),
            };
            describe_message(text.text("a chat message"), sender, message_containing, channel)
        }
        AlertTrigger::JabberPing { ping_type } => describe_ping(text, ping_type),
        AlertTrigger::JabberMessage {
            channel,
            sender,
            message_containing,
        } => {
            let channel = match channel {
                JabberMessageChannel::Any => "any chat".to_string(),
                JabberMessageChannel::Channel { name } => name.clone(),
                JabberMessageChannel::DirectMessage => "a direct message".to_string(),
            };
            describe_message(text.text("a Jabber message"), sender, message_containing, channel)
        }
        AlertTrigger::NoChannelActivity {
            channel,
            duration_seconds,
        } => {
            let channel = match channel {
                IntelChannel::All => "all intel channels".to_string(),
                IntelChannel::Any => "any intel channel".to_string(),
                IntelChannel::Channel { name } => name.clone(),
            };
            text.text("there are no messages in ")
                .highlight(channel)
                .text(" for ")
                .highlight(format_idle(u64::from(*duration_seconds)))
        }
    }
}

fn report_type_name(report_type: &IntelReportType) -> String {
    match report_type {
        IntelReportType::AnyCharacter => "a hostile".to_string(),
        IntelReportType::SpecificCharacters { characters } if characters.len() == 1 => {
            characters[0].clone()
        }
        IntelReportType::SpecificCharacters { characters } => {
            format!("{} specific characters", characters.len())
        }
        IntelReportType::AnyShip => "a ship".to_string(),
        IntelReportType::SpecificShipClasses { classes } if classes.len() == 1 => {
            format!("a {}", classes[0])
        }
        IntelReportType::SpecificShipClasses { classes } => {
            format!("{} ship classes", classes.len())
        }
        IntelReportType::Wormhole => "a wormhole".to_string(),
        IntelReportType::GateCamp => "a gate camp".to_string(),
        IntelReportType::Bubbles => "bubbles".to_string(),
    }
}

/// "in", "within 5 jumps of", "exactly 2 jumps from", "2-5 jumps from".
pub fn range_prefix(range: &JumpRange) -> String {
    let unit = |n: u32| if n == 1 { "jump" } else { "jumps" };
    match (range.min, range.max) {
        (0, 0) => "in".to_string(),
        (0, max) => format!("within {max} {} of", unit(max)),
        (min, max) if min == max => format!("exactly {max} {} from", unit(max)),
        (min, max) => format!("{min}-{max} jumps from"),
    }
}

fn describe_game_action(text: StyledText, action_type: &GameActionType) -> StyledText {
    let with_target = |text: StyledText, name: &Option<String>| match name {
        Some(name) => text.text(" with ").highlight(name),
        None => text,
    };
    match action_type {
        GameActionType::InCombat { name_containing } => {
            with_target(text.highlight("are in combat"), name_containing)
        }
        GameActionType::UnderAttack { name_containing } => {
            with_target(text.highlight("are under attack"), name_containing)
        }
        GameActionType::Attacking { name_containing } => {
            with_target(text.highlight("are attacking"), name_containing)
        }
        GameActionType::BeingWarpScrambled => text.highlight("are warp scrambled"),
        GameActionType::Decloaked { ignored_keywords } => {
            let text = text.highlight("are decloaked");
            if ignored_keywords.is_empty() {
                text
            } else {
                text.text(" with exceptions")
            }
        }
        GameActionType::CombatStopped {
            name_containing,
            duration_seconds,
        } => with_target(text.highlight("leave combat"), name_containing)
            .text(" for ")
            .highlight(format_idle(u64::from(*duration_seconds))),
    }
}

fn pi_event_name(event: PiEventType) -> &'static str {
    match event {
        PiEventType::NotSetup => "an unfinished setup",
        PiEventType::ExtractorInactive => "an extractor stopped",
        PiEventType::StorageFull => "storage full",
        PiEventType::Idle => "production stopped",
    }
}

fn describe_message(
    text: StyledText,
    sender: &Option<String>,
    message_containing: &Option<String>,
    channel: String,
) -> StyledText {
    let text = match message_containing {
        Some(needle) => text.text(" containing ").highlight(needle),
        None => text,
    };
    let text = text.text(" is sent");
    let text = match sender {
        Some(sender) => text.text(" by ").highlight(sender),
        None => text,
    };
    text.text(" in ").highlight(channel)
}

fn describe_ping(text: StyledText, ping_type: &JabberPingType) -> StyledText {
    let with_target = |text: StyledText, target: &Option<String>| match target {
        Some(target) => text.text(" about ").highlight(target),
        None => text,
    };
    match ping_type {
        JabberPingType::Message => text.text("a ping is received"),
        JabberPingType::Message2 { target } => {
            with_target(text.text("a message ping"), target).text(" is received")
        }
        JabberPingType::Fleet {
            target,
            fleet_commanders,
            formup_system,
            pap_type,
            doctrine_containing,
        } => {
            let mut text = with_target(text.text("a fleet ping"), target).text(" is received");
            match fleet_commanders.len() {
                0 => {}
                1 => text = text.text(" from ").highlight(&fleet_commanders[0]),
                n => text = text.text(" from ").highlight(format!("{n} specific FCs")),
            }
            if let Some(system) = formup_system {
                text = text.text(", forming up in ").highlight(system);
            }
            match pap_type {
                PapType::Any => {}
                PapType::Strategic => text = text.text(", with ").highlight("strategic").text(" PAP"),
                PapType::Peacetime => text = text.text(", with ").highlight("peacetime").text(" PAP"),
            }
            if let Some(doctrine) = doctrine_containing {
                text = text.text(", with a doctrine containing ").highlight(doctrine);
            }
            text
        }
    }
}

fn describe_actions(actions: &[AlertAction]) -> String {
    actions
        .iter()
        .map(|action| match action {
            AlertAction::RiftNotification => "show a notification".to_string(),
            AlertAction::SystemNotification => "show a system notification".to_string(),
            AlertAction::PushNotification => "send a push notification".to_string(),
            AlertAction::Sound { id } => {
                let name = sounds::find(*id).map_or("?", |sound| sound.name);
                format!("play sound \"{name}\"")
            }
            AlertAction::CustomSound { path } => {
                let name = Path::new(path)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                format!("play sound {name}")
            }
            AlertAction::ShowPing => "show the ping".to_string(),
            AlertAction::ShowColonies => "show colonies".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
