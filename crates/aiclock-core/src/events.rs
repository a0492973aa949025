use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::alarm::RingIntensity;

/// Named audio cues the device knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Success,
    Popup,
    Welcome,
}

/// What phase of an alarm a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmPhase {
    WakeUp,
    SleepStart,
    SleepStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsAction {
    Start,
    Stop,
}

/// Structured message for the remote channel.
///
/// Serializes as `{"type":"alarm","alarm_type":"wake_up","intensity":"gentle"}`
/// or `{"type":"news","action":"start"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Alarm {
        alarm_type: AlarmPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intensity: Option<RingIntensity>,
    },
    News {
        action: NewsAction,
    },
}

/// A side effect scheduled onto the application task.
///
/// Components never touch sinks directly; they enqueue effects and the
/// device drains them in order on its own loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Status { text: String },
    Emotion { tag: String },
    ChatMessage { role: String, text: String },
    Play { cue: AudioCue },
    Notify { message: Notification },
    /// Raise the news flag on the alarm manager once a wake-up is dismissed.
    StartNewsBroadcast,
}

impl Effect {
    pub fn status(text: impl Into<String>) -> Self {
        Effect::Status { text: text.into() }
    }

    pub fn emotion(tag: impl Into<String>) -> Self {
        Effect::Emotion { tag: tag.into() }
    }

    pub fn system_message(text: impl Into<String>) -> Self {
        Effect::ChatMessage {
            role: "system".into(),
            text: text.into(),
        }
    }
}

/// FIFO of effects shared between components and the application loop.
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    queue: Arc<Mutex<VecDeque<Effect>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, effect: Effect) {
        self.lock().push_back(effect);
    }

    pub fn schedule_all(&self, effects: impl IntoIterator<Item = Effect>) {
        self.lock().extend(effects);
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<Effect> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Effect>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_up_notification_wire_format() {
        let msg = Notification::Alarm {
            alarm_type: AlarmPhase::WakeUp,
            intensity: Some(RingIntensity::Gentle),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"alarm","alarm_type":"wake_up","intensity":"gentle"}"#
        );
    }

    #[test]
    fn sleep_and_news_notifications_omit_intensity() {
        let start = Notification::Alarm {
            alarm_type: AlarmPhase::SleepStart,
            intensity: None,
        };
        assert_eq!(
            serde_json::to_string(&start).unwrap(),
            r#"{"type":"alarm","alarm_type":"sleep_start"}"#
        );
        let news = Notification::News {
            action: NewsAction::Start,
        };
        assert_eq!(
            serde_json::to_string(&news).unwrap(),
            r#"{"type":"news","action":"start"}"#
        );
    }

    #[test]
    fn dispatcher_clones_share_queue_in_order() {
        let a = Dispatcher::new();
        let b = a.clone();
        a.schedule(Effect::status("one"));
        b.schedule(Effect::status("two"));
        assert_eq!(a.len(), 2);
        assert_eq!(
            b.drain(),
            vec![Effect::status("one"), Effect::status("two")]
        );
        assert!(a.is_empty());
    }
}
