// Alert system: user-authored rules evaluated against incoming events.
//
// Architecture:
// - model.rs: Alert rules, triggers and actions
// - location.rs: Jump-range matching against the distance oracle
// - triggers.rs: One matcher per trigger category
// - activity.rs: Channel silence and combat idle tracking
// - gates.rs: Per-alert cooldown and global sound debounce
// - message.rs: Notification titles and bodies
// - wording.rs: Fixed notification phrases
// - dispatch.rs: Effects, senders and delivery
// - engine.rs: Orchestrates matching, gating and dispatch
// - describe.rs: Human-readable alert summaries

pub mod activity;
pub mod describe;
pub mod dispatch;
pub mod engine;
pub mod gates;
pub mod location;
pub mod message;
pub mod model;
pub mod triggers;
pub mod wording;
