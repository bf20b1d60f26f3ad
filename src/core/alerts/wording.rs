// Notification wording. Every fixed phrase a firing puts in front of the user
// lives here, so a localized catalog only has to replace this module.

/// Singular and plural form of a unit.
pub type Unit = (&'static str, &'static str);

pub const SECOND: Unit = ("second", "seconds");
pub const MINUTE: Unit = ("minute", "minutes");
pub const HOUR: Unit = ("hour", "hours");
pub const DAY: Unit = ("day", "days");
pub const JUMP: Unit = ("jump", "jumps");

pub fn count(count: u64, (singular, plural): Unit) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// Intel
pub const INTEL_GATE_CAMP: &str = "Gate camp reported";
pub const INTEL_HOSTILE: &str = "Hostile reported";
pub const INTEL_HOSTILE_SHIP: &str = "Hostile ship reported";
pub const INTEL_BUBBLES: &str = "Bubbles reported";
pub const INTEL_WORMHOLE: &str = "Wormhole reported";
pub const INTEL_GENERIC: &str = "Intel alert";
pub const IN_SYSTEM: &str = "in system";
pub const IN_YOUR_SYSTEM: &str = "in your system";
pub const FROM: &str = " from ";

pub fn jumps_away(distance: u32) -> String {
    match distance {
        0 => IN_SYSTEM.to_string(),
        n => format!("{} away", count(u64::from(n), JUMP)),
    }
}

// Game log
pub const UNDER_ATTACK: &str = "You are under attack";
pub const ATTACKING: &str = "You are attacking";
pub const WARP_SCRAMBLED: &str = "You are being warp scrambled";
pub const DECLOAKED: &str = "You have been decloaked";
pub const COMBAT_STOPPED: &str = "You left combat";
pub const ATTACKED_BY: &str = "Attacked by ";
pub const YOUR_TARGET_IS: &str = "Your target is ";
pub const SCRAMBLED_BY: &str = "Scrambled by ";
pub const IS_TOO_CLOSE: &str = " is too close";
pub const OUT_OF_COMBAT_FOR: &str = "Out of combat for ";
pub const LAST_TARGET_WAS: &str = ", last target was ";

// Chat and bridge
pub fn chat_title(channel: &str) -> String {
    format!("Chat message in {channel}")
}

pub fn bridge_title(chat: &str) -> String {
    format!("Jabber message in {chat}")
}

pub const SENDER_SEPARATOR: &str = ": ";

// Pings
pub const PING: &str = "Ping";
pub const FLEET_PING: &str = "Fleet ping";
pub const PING_FC: &str = "FC: ";
pub const PING_FORMUP: &str = "Formup: ";
pub const PING_DOCTRINE: &str = "Doctrine: ";

// Channel silence
pub const NO_INTEL: &str = "No intel received";
pub const CHANNEL: &str = "Channel ";
pub const CHANNELS: &str = "Channels ";
pub const APPEARS_INACTIVE: &str = " appears to be inactive";
pub const APPEAR_INACTIVE: &str = " appear to be inactive";

// Planetary industry
pub const COLONY_NEEDS_ATTENTION: &str = "Your colony needs attention";
pub const COLONY_WILL_NEED_ATTENTION: &str = "Your colony will need attention";
pub const COLONY_OWNER_PLACEHOLDER: &str = "Loading...";
pub const PLANET: &str = ": Planet ";
pub const WILL_NEED_ATTENTION_IN: &str = " will need attention in ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_pick_the_right_form() {
        assert_eq!(count(1, MINUTE), "1 minute");
        assert_eq!(count(0, SECOND), "0 seconds");
        assert_eq!(count(3, DAY), "3 days");
        assert_eq!(jumps_away(0), "in system");
        assert_eq!(jumps_away(1), "1 jump away");
        assert_eq!(jumps_away(7), "7 jumps away");
    }
}
