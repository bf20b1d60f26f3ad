// Replay of recorded event files through the alert engine.
//
// A recording is a JSON-lines file: one `EngineEvent` or control record
// per line, blank lines and `#` comments ignored. Several recordings are
// merged by timestamp, and the engine clock follows the replayed time so
// cooldowns and silence periods behave as they did live.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::alerts::engine::AlertEngine;
use super::alerts::location::TrackedCharacters;
use super::alerts::model::AlertId;
use super::clock::ManualClock;
use super::error::ReplayError;
use super::model::{CharacterId, EngineEvent};

/// Non-event lines of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlRecord {
    /// Run the periodic evaluation at this instant
    Tick { at: DateTime<Utc> },
    /// A tracked character moved or changed online state
    Location {
        at: DateTime<Utc>,
        character_id: CharacterId,
        system: String,
        #[serde(default = "default_online")]
        online: bool,
    },
}

fn default_online() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayRecord {
    Control(ControlRecord),
    Event(EngineEvent),
}

impl ReplayRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Control(ControlRecord::Tick { at })
            | Self::Control(ControlRecord::Location { at, .. }) => *at,
            Self::Event(event) => event.timestamp(),
        }
    }
}

struct RecordSource {
    reader: BufReader<File>,
    path: PathBuf,
    line_number: usize,
    next_record: Option<ReplayRecord>,
}

impl RecordSource {
    fn advance(&mut self) {
        self.next_record = self.read_next();
    }

    fn read_next(&mut self) -> Option<ReplayRecord> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Stopped reading {}: {}", self.path.display(), e);
                    return None;
                }
            }
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match serde_json::from_str(trimmed) {
                Ok(record) => return Some(record),
                Err(e) => log::warn!(
                    "Skipping {}:{}: {}",
                    self.path.display(),
                    self.line_number,
                    e
                ),
            }
        }
    }
}

/// Records from several files, yielded earliest first. Records with equal
/// timestamps come from the file listed first.
pub struct ReplayStream {
    sources: Vec<RecordSource>,
}

impl ReplayStream {
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ReplayError> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref().to_path_buf();
            let file = File::open(&path).map_err(|source| ReplayError::Open {
                path: path.clone(),
                source,
            })?;
            let mut source = RecordSource {
                reader: BufReader::new(file),
                path,
                line_number: 0,
                next_record: None,
            };
            source.advance();
            sources.push(source);
        }
        Ok(Self { sources })
    }

    pub fn peek_time(&self) -> Option<DateTime<Utc>> {
        self.sources
            .iter()
            .filter_map(|s| s.next_record.as_ref().map(ReplayRecord::timestamp))
            .min()
    }
}

impl Iterator for ReplayStream {
    type Item = ReplayRecord;

    fn next(&mut self) -> Option<ReplayRecord> {
        let mut earliest: Option<(usize, DateTime<Utc>)> = None;
        for (idx, source) in self.sources.iter().enumerate() {
            let Some(record) = &source.next_record else {
                continue;
            };
            let at = record.timestamp();
            if earliest.map_or(true, |(_, time)| at < time) {
                earliest = Some((idx, at));
            }
        }

        let (idx, _) = earliest?;
        let source = &mut self.sources[idx];
        let record = source.next_record.take();
        source.advance();
        record
    }
}

/// Outcome of one replay run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaySummary {
    pub records: usize,
    pub ticks: usize,
    /// Alerts fired, in order, one entry per firing
    pub fired: Vec<AlertId>,
}

/// Feeds records into an engine whose clock it controls.
pub struct Replayer {
    engine: Arc<AlertEngine>,
    clock: Arc<ManualClock>,
    characters: Arc<TrackedCharacters>,
    tick_every: Option<Duration>,
}

impl Replayer {
    pub fn new(
        engine: Arc<AlertEngine>,
        clock: Arc<ManualClock>,
        characters: Arc<TrackedCharacters>,
    ) -> Self {
        Self {
            engine,
            clock,
            characters,
            tick_every: None,
        }
    }

    /// Also run the periodic evaluation every `every` of replayed time,
    /// as the live coordinator would.
    pub fn with_ticks(mut self, every: Duration) -> Self {
        if every > Duration::zero() {
            self.tick_every = Some(every);
        }
        self
    }

    pub fn run<I>(&self, records: I) -> ReplaySummary
    where
        I: IntoIterator<Item = ReplayRecord>,
    {
        let mut summary = ReplaySummary::default();
        let mut next_tick: Option<DateTime<Utc>> = None;

        for record in records {
            let at = record.timestamp();
            if let Some(every) = self.tick_every {
                let mut due = next_tick.unwrap_or(at + every);
                while due <= at {
                    self.tick(due, &mut summary);
                    due += every;
                }
                next_tick = Some(due);
            }

            self.clock.set(at);
            summary.records += 1;
            match record {
                ReplayRecord::Event(event) => {
                    summary.fired.extend(self.engine.on_event(&event));
                }
                ReplayRecord::Control(ControlRecord::Tick { at }) => self.tick(at, &mut summary),
                ReplayRecord::Control(ControlRecord::Location {
                    character_id,
                    system,
                    online,
                    ..
                }) => self.characters.update(character_id, &system, online),
            }
        }

        log::info!(
            "Replayed {} record(s), {} tick(s), {} firing(s)",
            summary.records,
            summary.ticks,
            summary.fired.len()
        );
        summary
    }

    fn tick(&self, at: DateTime<Utc>, summary: &mut ReplaySummary) {
        self.clock.set(at);
        summary.ticks += 1;
        summary.fired.extend(self.engine.on_tick(at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::dispatch::{Firing, QueuedDelivery};
    use crate::core::alerts::location::{CharacterLocations, DistanceTable};
    use crate::core::alerts::model::{
        Alert, AlertAction, AlertTrigger, ChatMessageChannel, GameActionType, IntelChannel,
    };
    use crate::core::model::{ChatMessage, GameLogAction, GameLogEvent};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap() + Duration::seconds(second as i64)
    }

    fn chat_line(second: u32, channel: &str, message: &str) -> String {
        serde_json::to_string(&EngineEvent::Chat(ChatMessage {
            timestamp: at(second),
            channel: channel.to_string(),
            sender: "Scout".to_string(),
            message: message.to_string(),
            sender_character_id: None,
        }))
        .unwrap()
    }

    fn alert(id: &str, trigger: AlertTrigger, cooldown_seconds: u32) -> Alert {
        Alert {
            id: id.to_string(),
            is_enabled: true,
            group: None,
            trigger,
            actions: vec![AlertAction::PushNotification],
            cooldown_seconds,
        }
    }

    struct Setup {
        engine: Arc<AlertEngine>,
        replayer: Replayer,
        characters: Arc<TrackedCharacters>,
        firings: UnboundedReceiver<Firing>,
    }

    fn setup() -> Setup {
        let clock = Arc::new(ManualClock::new(at(0)));
        let characters = Arc::new(TrackedCharacters::new());
        let (delivery, firings) = QueuedDelivery::channel();
        let engine = Arc::new(AlertEngine::new(
            Arc::new(DistanceTable::new()),
            characters.clone(),
            clock.clone(),
            Arc::new(delivery),
        ));
        let replayer = Replayer::new(engine.clone(), clock, characters.clone());
        Setup {
            engine,
            replayer,
            characters,
            firings,
        }
    }

    #[test]
    fn test_parse_records() {
        let tick: ReplayRecord =
            serde_json::from_str(r#"{"control":"tick","at":"2025-03-01T18:00:00Z"}"#).unwrap();
        assert_eq!(tick, ReplayRecord::Control(ControlRecord::Tick { at: at(0) }));

        let location: ReplayRecord = serde_json::from_str(
            r#"{"control":"location","at":"2025-03-01T18:00:05Z","character_id":9,"system":"Jita"}"#,
        )
        .unwrap();
        assert!(matches!(
            location,
            ReplayRecord::Control(ControlRecord::Location { online: true, .. })
        ));
        assert_eq!(location.timestamp(), at(5));

        let event: ReplayRecord = serde_json::from_str(&chat_line(7, "Corp", "hi")).unwrap();
        assert!(matches!(event, ReplayRecord::Event(EngineEvent::Chat(_))));
        assert_eq!(event.timestamp(), at(7));
    }

    #[test]
    fn test_stream_merges_files_by_time() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("intel.jsonl");
        let second = dir.path().join("corp.jsonl");
        fs::write(
            &first,
            format!(
                "# recorded in Delve\n{}\n\n{}\n",
                chat_line(1, "A", "one"),
                chat_line(5, "A", "three")
            ),
        )
        .unwrap();
        fs::write(
            &second,
            format!(
                "{}\nnot a record\n{}\n",
                chat_line(3, "B", "two"),
                chat_line(5, "B", "four")
            ),
        )
        .unwrap();

        let stream = ReplayStream::open(&[&first, &second]).unwrap();
        assert_eq!(stream.peek_time(), Some(at(1)));

        let messages: Vec<String> = stream
            .map(|record| match record {
                ReplayRecord::Event(EngineEvent::Chat(chat)) => chat.message,
                other => panic!("unexpected record {other:?}"),
            })
            .collect();
        assert_eq!(messages, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = ReplayStream::open(&[dir.path().join("absent.jsonl")]);
        assert!(matches!(result, Err(ReplayError::Open { .. })));
    }

    #[test]
    fn test_replay_follows_recorded_time_for_cooldowns() {
        let mut setup = setup();
        setup.engine.set_alerts(vec![alert(
            "corp",
            AlertTrigger::ChatMessage {
                channel: ChatMessageChannel::Any,
                sender: None,
                message_containing: None,
            },
            60,
        )]);

        let records = [10, 40, 75].map(|second| {
            serde_json::from_str::<ReplayRecord>(&chat_line(second, "Corp", "ping")).unwrap()
        });
        let summary = setup.replayer.run(records);

        assert_eq!(summary.records, 3);
        assert_eq!(summary.fired, vec!["corp", "corp"]);
        assert!(setup.firings.try_recv().is_ok());
        assert!(setup.firings.try_recv().is_ok());
        assert!(setup.firings.try_recv().is_err());
    }

    #[test]
    fn test_injected_ticks_detect_silence() {
        let setup = setup();
        setup.engine.set_intel_channels(&["delve.imperium".to_string()]);
        setup.engine.set_alerts(vec![alert(
            "quiet",
            AlertTrigger::NoChannelActivity {
                channel: IntelChannel::Any,
                duration_seconds: 30,
            },
            0,
        )]);

        let records = vec![
            ReplayRecord::Control(ControlRecord::Tick { at: at(0) }),
            ReplayRecord::Control(ControlRecord::Tick { at: at(100) }),
        ];
        let summary = setup.replayer.with_ticks(Duration::seconds(10)).run(records);

        // Explicit ticks plus one every 10 s in between
        assert_eq!(summary.ticks, 2 + 10);
        assert_eq!(summary.fired, vec!["quiet"]);
    }

    #[test]
    fn test_location_records_update_tracked_characters() {
        let setup = setup();
        setup.engine.set_alerts(vec![alert(
            "hit",
            AlertTrigger::GameAction {
                action_types: vec![GameActionType::UnderAttack {
                    name_containing: None,
                }],
            },
            0,
        )]);

        let records = vec![
            ReplayRecord::Control(ControlRecord::Location {
                at: at(0),
                character_id: 7,
                system: "Jita".to_string(),
                online: true,
            }),
            ReplayRecord::Event(EngineEvent::GameLog(GameLogEvent {
                timestamp: at(2),
                character_id: 7,
                action: GameLogAction::UnderAttack {
                    target: "Pirate".to_string(),
                },
            })),
        ];
        let summary = setup.replayer.run(records);

        assert_eq!(summary.fired, vec!["hit"]);
        assert_eq!(
            setup.characters.online_characters(),
            vec![(7, "Jita".to_string())]
        );
    }
}
