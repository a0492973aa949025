//! Sinks that print effects as JSON lines.

use std::io::Write;

use aiclock_core::{AudioCue, AudioSink, Effect, Notification, NotificationSink, UiSink};

/// Writes every effect it receives as one JSON object per line, in the same
/// shape as [`Effect`] serializes.
pub struct JsonLines<W: Write> {
    out: W,
}

impl JsonLines<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Print any serializable value as one line.
    pub fn emit<T: serde::Serialize>(&mut self, value: &T) {
        let line = match serde_json::to_string(value) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize output line");
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write output line");
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> UiSink for JsonLines<W> {
    fn set_status(&mut self, text: &str) {
        self.emit(&Effect::status(text));
    }

    fn set_emotion(&mut self, tag: &str) {
        self.emit(&Effect::emotion(tag));
    }

    fn set_chat_message(&mut self, role: &str, text: &str) {
        self.emit(&Effect::ChatMessage {
            role: role.to_string(),
            text: text.to_string(),
        });
    }
}

impl<W: Write> AudioSink for JsonLines<W> {
    fn play(&mut self, cue: AudioCue) {
        self.emit(&Effect::Play { cue });
    }
}

impl<W: Write> NotificationSink for JsonLines<W> {
    fn send(&mut self, message: &Notification) {
        self.emit(&Effect::Notify {
            message: message.clone(),
        });
    }
}
