// Bundled alert sounds.
//
// Alerts reference sounds by catalog id. Playback itself is done by a
// [`SoundPlayer`](crate::core::alerts::dispatch::SoundPlayer); with the
// `audio` feature enabled, [`RodioPlayer`] plays through the default device.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sound {
    pub id: u32,
    /// File name under the sound resource directory
    pub resource: &'static str,
    pub name: &'static str,
}

const fn sound(id: u32, resource: &'static str, name: &'static str) -> Sound {
    Sound { id, resource, name }
}

static SOUNDS: [Sound; 20] = [
    sound(1, "1j.wav", "Hostile 1 jump away"),
    sound(2, "2j.wav", "Hostile 2 jumps away"),
    sound(3, "3j.wav", "Hostile 3 jumps away"),
    sound(4, "4j.wav", "Hostile 4 jumps away"),
    sound(5, "5j.wav", "Hostile 5 jumps away"),
    sound(6, "local-alarm.wav", "Hostile in local"),
    sound(7, "bubbled.wav", "Bubbles"),
    sound(8, "gate-camp.wav", "Gate camp"),
    sound(9, "wormhole.wav", "Wormhole"),
    sound(10, "PAP.wav", "Fleet ping"),
    sound(11, "specific-character.wav", "Specific character"),
    sound(12, "specific-ship.wav", "Specific ship"),
    sound(13, "specific-system.wav", "Specific system"),
    sound(14, "Engage.wav", "Combat engaged"),
    sound(15, "Disengage.wav", "Combat disengaged"),
    sound(16, "tackled.wav", "Tackled"),
    sound(17, "decloacking.wav", "Decloaked"),
    sound(18, "chat-ingame.wav", "In-game chat"),
    sound(19, "chat-jabber.wav", "Jabber message"),
    sound(20, "PI.wav", "Planetary industry"),
];

pub fn all() -> &'static [Sound] {
    &SOUNDS
}

/// Look up a bundled sound. Unknown ids are not an error, callers skip them.
pub fn find(id: u32) -> Option<&'static Sound> {
    SOUNDS.iter().find(|sound| sound.id == id)
}

#[cfg(feature = "audio")]
pub use player::RodioPlayer;

#[cfg(feature = "audio")]
mod player {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    use crate::core::alerts::dispatch::SoundPlayer;
    use crate::core::error::DeliveryError;

    /// Plays sounds on a short-lived thread per sound, so callers never wait
    /// for playback to finish.
    pub struct RodioPlayer {
        sound_dir: PathBuf,
    }

    impl RodioPlayer {
        pub fn new(sound_dir: impl Into<PathBuf>) -> Self {
            Self {
                sound_dir: sound_dir.into(),
            }
        }

        fn spawn_playback(&self, path: PathBuf) -> Result<(), DeliveryError> {
            if !path.exists() {
                return Err(DeliveryError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("sound file not found: {}", path.display()),
                )));
            }
            std::thread::Builder::new()
                .name("alert-sound".to_string())
                .spawn(move || {
                    if let Err(e) = play_blocking(&path) {
                        log::warn!("{e}");
                    }
                })?;
            Ok(())
        }
    }

    fn play_blocking(path: &Path) -> Result<(), DeliveryError> {
        let sound_error = |message: String| DeliveryError::Sound {
            path: path.to_path_buf(),
            message,
        };
        let mut stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| sound_error(e.to_string()))?;
        stream.log_on_drop(false);
        let file = File::open(path)?;
        let sink = rodio::play(stream.mixer(), BufReader::new(file))
            .map_err(|e| sound_error(e.to_string()))?;
        sink.sleep_until_end();
        Ok(())
    }

    impl SoundPlayer for RodioPlayer {
        fn play(&self, resource: &str) -> Result<(), DeliveryError> {
            self.spawn_playback(self.sound_dir.join(resource))
        }

        fn play_file(&self, path: &Path) -> Result<(), DeliveryError> {
            self.spawn_playback(path.to_path_buf())
        }
    }
}
