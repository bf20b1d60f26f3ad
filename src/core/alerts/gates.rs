// Rate limiting: per-alert cooldown and the global sound debounce.
//
// Both are plain state machines; the engine wraps each in its own mutex so
// check-and-record happens in one critical section.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::model::AlertId;

/// Minimum spacing between any two sounds, across all alerts.
pub const SOUND_DEBOUNCE_MILLIS: i64 = 200;

/// Last firing time per alert. Lives only for the process lifetime.
#[derive(Debug, Default, Clone)]
pub struct CooldownGate {
    last_fired: HashMap<AlertId, DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_fire(&self, alert_id: &str, cooldown_seconds: u32, now: DateTime<Utc>) -> bool {
        match self.last_fired.get(alert_id) {
            None => true,
            Some(last) => now - *last >= Duration::seconds(i64::from(cooldown_seconds)),
        }
    }

    pub fn record(&mut self, alert_id: &str, now: DateTime<Utc>) {
        self.last_fired.insert(alert_id.to_string(), now);
    }

    /// Check and, when allowed, record in one step.
    pub fn try_acquire(&mut self, alert_id: &str, cooldown_seconds: u32, now: DateTime<Utc>) -> bool {
        if self.should_fire(alert_id, cooldown_seconds, now) {
            self.record(alert_id, now);
            true
        } else {
            false
        }
    }

    pub fn last_fired(&self, alert_id: &str) -> Option<DateTime<Utc>> {
        self.last_fired.get(alert_id).copied()
    }
}

/// Global last-sound instant.
#[derive(Debug, Clone)]
pub struct SoundDebounce {
    last_played: Option<DateTime<Utc>>,
    min_spacing: Duration,
}

impl Default for SoundDebounce {
    fn default() -> Self {
        Self {
            last_played: None,
            min_spacing: Duration::milliseconds(SOUND_DEBOUNCE_MILLIS),
        }
    }
}

impl SoundDebounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records `now` if a sound may play.
    pub fn try_play(&mut self, now: DateTime<Utc>) -> bool {
        let allowed = self
            .last_played
            .map_or(true, |last| now - last >= self.min_spacing);
        if allowed {
            self.last_played = Some(now);
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_cooldown_sequence() {
        let mut gate = CooldownGate::new();
        assert!(gate.try_acquire("a", 60, t0()));
        assert!(!gate.try_acquire("a", 60, t0() + Duration::seconds(30)));
        assert!(gate.try_acquire("a", 60, t0() + Duration::seconds(61)));
        assert_eq!(gate.last_fired("a"), Some(t0() + Duration::seconds(61)));
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let mut gate = CooldownGate::new();
        gate.record("a", t0());
        assert!(gate.should_fire("a", 60, t0() + Duration::seconds(60)));
    }

    #[test]
    fn test_zero_cooldown_always_fires() {
        let mut gate = CooldownGate::new();
        assert!(gate.try_acquire("a", 0, t0()));
        assert!(gate.try_acquire("a", 0, t0()));
    }

    #[test]
    fn test_cooldowns_are_per_alert() {
        let mut gate = CooldownGate::new();
        assert!(gate.try_acquire("a", 60, t0()));
        assert!(gate.try_acquire("b", 60, t0()));
        assert!(!gate.should_fire("a", 60, t0()));
    }

    #[test]
    fn test_rejected_check_does_not_record() {
        let mut gate = CooldownGate::new();
        gate.record("a", t0());
        assert!(!gate.try_acquire("a", 60, t0() + Duration::seconds(59)));
        assert_eq!(gate.last_fired("a"), Some(t0()));
    }

    #[test]
    fn test_sound_debounce() {
        let mut debounce = SoundDebounce::new();
        assert!(debounce.try_play(t0()));
        assert!(!debounce.try_play(t0() + Duration::milliseconds(100)));
        assert!(debounce.try_play(t0() + Duration::milliseconds(250)));
        // Spacing is measured from the last sound that actually played
        assert!(!debounce.try_play(t0() + Duration::milliseconds(400)));
        assert!(debounce.try_play(t0() + Duration::milliseconds(450)));
    }
}
