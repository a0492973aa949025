//! Sink traits: the boundary between the scheduling core and the device.
//!
//! ```text
//!   Component ──▶ Dispatcher ──▶ Device::flush ──▶ UiSink / AudioSink / NotificationSink
//! ```
//!
//! Display, speaker and network adapters implement these. The core only
//! produces [`Effect`](crate::events::Effect)s.

use crate::events::{AudioCue, Notification};

/// Display surface: status bar, emotion glyph, chat area.
pub trait UiSink {
    fn set_status(&mut self, text: &str);
    fn set_emotion(&mut self, tag: &str);
    fn set_chat_message(&mut self, role: &str, text: &str);
}

/// Plays a named cue.
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
}

/// Sends a structured message to the remote channel.
pub trait NotificationSink {
    fn send(&mut self, message: &Notification);
}

/// Everything a flush can touch.
pub trait Sinks: UiSink + AudioSink + NotificationSink {}

impl<T: UiSink + AudioSink + NotificationSink> Sinks for T {}

/// Sink that remembers everything it was given, newest last.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingSinks {
    pub statuses: Vec<String>,
    pub emotions: Vec<String>,
    pub messages: Vec<(String, String)>,
    pub cues: Vec<AudioCue>,
    pub notifications: Vec<Notification>,
}

impl RecordingSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }

    pub fn last_emotion(&self) -> Option<&str> {
        self.emotions.last().map(String::as_str)
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|(_, text)| text.as_str())
    }
}

impl UiSink for RecordingSinks {
    fn set_status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }

    fn set_emotion(&mut self, tag: &str) {
        self.emotions.push(tag.to_string());
    }

    fn set_chat_message(&mut self, role: &str, text: &str) {
        self.messages.push((role.to_string(), text.to_string()));
    }
}

impl AudioSink for RecordingSinks {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}

impl NotificationSink for RecordingSinks {
    fn send(&mut self, message: &Notification) {
        self.notifications.push(message.clone());
    }
}
