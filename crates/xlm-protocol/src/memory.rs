use crate::channel::ControlChannel;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{SaveDecision, WorkerMessage};

/// In-memory control channel with a pre-scripted save decision.
///
/// Records every message the worker sends, in order. Intended for tests and
/// embedding the engine without a controller process.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    sent: Vec<WorkerMessage>,
    reply: Option<SaveDecision>,
    save_requested: bool,
}

impl ScriptedChannel {
    /// A channel that answers the save request with `decision`.
    pub fn replying(decision: SaveDecision) -> Self {
        Self {
            reply: Some(decision),
            ..Default::default()
        }
    }

    /// A channel that answers the save request with a path.
    pub fn saving_to(path: impl Into<String>) -> Self {
        Self::replying(SaveDecision::SaveTo(path.into()))
    }

    /// A channel whose controller never answers; a save request fails with
    /// [`ProtocolError::ChannelClosed`].
    pub fn silent() -> Self {
        Self::default()
    }

    /// Every message sent so far.
    pub fn sent(&self) -> &[WorkerMessage] {
        &self.sent
    }

    /// Text of every `LOG|` message.
    pub fn logs(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                WorkerMessage::Log { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `(current, total, file_name)` of every `PROGRESS|` message.
    pub fn progress_events(&self) -> Vec<(usize, usize, &str)> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                WorkerMessage::Progress {
                    current,
                    total,
                    file_name,
                } => Some((*current, *total, file_name.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Suggested names of every `REQUEST_SAVE|` message.
    pub fn save_requests(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                WorkerMessage::RequestSave { suggested_name } => Some(suggested_name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ControlChannel for ScriptedChannel {
    fn send(&mut self, message: &WorkerMessage) -> ProtocolResult<()> {
        self.sent.push(message.clone());
        Ok(())
    }

    fn request_save(&mut self, suggested_name: &str) -> ProtocolResult<SaveDecision> {
        if self.save_requested {
            return Err(ProtocolError::SaveAlreadyRequested);
        }
        self.save_requested = true;
        self.send(&WorkerMessage::RequestSave {
            suggested_name: suggested_name.to_string(),
        })?;
        self.reply.take().ok_or(ProtocolError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_messages_by_kind() {
        let mut ch = ScriptedChannel::saving_to("/out/m.xlsx");
        ch.log("hello").unwrap();
        ch.progress(1, 2, "a.xlsx").unwrap();
        let decision = ch.request_save("m.xlsx").unwrap();

        assert_eq!(decision, SaveDecision::SaveTo("/out/m.xlsx".into()));
        assert_eq!(ch.logs(), vec!["hello"]);
        assert_eq!(ch.progress_events(), vec![(1, 2, "a.xlsx")]);
        assert_eq!(ch.save_requests(), vec!["m.xlsx"]);
        assert_eq!(ch.sent().len(), 3);
    }

    #[test]
    fn silent_controller() {
        let mut ch = ScriptedChannel::silent();
        assert!(matches!(
            ch.request_save("m.xlsx").unwrap_err(),
            ProtocolError::ChannelClosed
        ));
    }

    #[test]
    fn only_one_request() {
        let mut ch = ScriptedChannel::replying(SaveDecision::Decline);
        ch.request_save("m.xlsx").unwrap();
        assert!(matches!(
            ch.request_save("m.xlsx").unwrap_err(),
            ProtocolError::SaveAlreadyRequested
        ));
    }
}
