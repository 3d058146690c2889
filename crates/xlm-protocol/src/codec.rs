use crate::error::{ProtocolError, ProtocolResult};
use crate::message::WorkerMessage;

const LOG_TAG: &str = "LOG|";
const PROGRESS_TAG: &str = "PROGRESS|";
const REQUEST_SAVE_TAG: &str = "REQUEST_SAVE|";

/// Codec for the line-oriented control channel.
pub struct LineCodec;

impl LineCodec {
    /// Encode a message as a single line, without the trailing newline.
    ///
    /// Embedded line breaks are flattened to spaces so a message can never
    /// span two lines.
    pub fn encode(msg: &WorkerMessage) -> String {
        match msg {
            WorkerMessage::Log { message } => format!("{LOG_TAG}{}", single_line(message)),
            WorkerMessage::Progress {
                current,
                total,
                file_name,
            } => format!("{PROGRESS_TAG}{current}|{total}|{}", single_line(file_name)),
            WorkerMessage::RequestSave { suggested_name } => {
                format!("{REQUEST_SAVE_TAG}{}", single_line(suggested_name))
            }
        }
    }

    /// Decode one line. A trailing `\r\n` or `\n` is ignored.
    ///
    /// The last field of every message may itself contain `|`.
    pub fn decode(line: &str) -> ProtocolResult<WorkerMessage> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(message) = line.strip_prefix(LOG_TAG) {
            return Ok(WorkerMessage::log(message));
        }

        if let Some(rest) = line.strip_prefix(PROGRESS_TAG) {
            let malformed = || ProtocolError::Malformed {
                kind: "PROGRESS",
                line: line.to_string(),
            };
            let mut parts = rest.splitn(3, '|');
            let current = parts.next().and_then(|p| p.trim().parse().ok());
            let total = parts.next().and_then(|p| p.trim().parse().ok());
            let file_name = parts.next();
            return match (current, total, file_name) {
                (Some(current), Some(total), Some(file_name)) => Ok(WorkerMessage::Progress {
                    current,
                    total,
                    file_name: file_name.to_string(),
                }),
                _ => Err(malformed()),
            };
        }

        if let Some(name) = line.strip_prefix(REQUEST_SAVE_TAG) {
            return Ok(WorkerMessage::RequestSave {
                suggested_name: name.to_string(),
            });
        }

        Err(ProtocolError::UnknownMessage(line.to_string()))
    }
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wire_format() {
        assert_eq!(LineCodec::encode(&WorkerMessage::log("File count: 2")), "LOG|File count: 2");
        assert_eq!(
            LineCodec::encode(&WorkerMessage::Progress {
                current: 1,
                total: 2,
                file_name: "a.xlsx".into()
            }),
            "PROGRESS|1|2|a.xlsx"
        );
        assert_eq!(
            LineCodec::encode(&WorkerMessage::RequestSave {
                suggested_name: "merged_q1_20240102_030405.xlsx".into()
            }),
            "REQUEST_SAVE|merged_q1_20240102_030405.xlsx"
        );
    }

    #[test]
    fn encode_flattens_newlines() {
        let line = LineCodec::encode(&WorkerMessage::log("first\r\nsecond\nthird"));
        assert_eq!(line, "LOG|first second third");
    }

    #[test]
    fn decode_progress_with_pipe_in_name() {
        let msg = LineCodec::decode("PROGRESS|3|10|odd|name.xlsx\r\n").unwrap();
        assert_eq!(
            msg,
            WorkerMessage::Progress {
                current: 3,
                total: 10,
                file_name: "odd|name.xlsx".into()
            }
        );
    }

    #[test]
    fn decode_log_keeps_pipes() {
        let msg = LineCodec::decode("LOG|a|b|c\n").unwrap();
        assert_eq!(msg, WorkerMessage::log("a|b|c"));
    }

    #[test]
    fn decode_request_save() {
        let msg = LineCodec::decode("REQUEST_SAVE|out.xlsx").unwrap();
        assert_eq!(
            msg,
            WorkerMessage::RequestSave {
                suggested_name: "out.xlsx".into()
            }
        );
    }

    #[test]
    fn decode_malformed_progress() {
        let err = LineCodec::decode("PROGRESS|x|2|a.xlsx").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { kind: "PROGRESS", .. }));
        let err = LineCodec::decode("PROGRESS|1|2").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { .. }));
    }

    #[test]
    fn decode_unknown() {
        let err = LineCodec::decode("HELLO|there").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessage(_)));
    }
}
