use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::codec::LineCodec;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{SaveDecision, WorkerMessage};

/// Worker side of the control channel.
///
/// At most one save request may be outstanding per run, and each request
/// receives exactly one decision.
pub trait ControlChannel {
    /// Send one message to the controller.
    fn send(&mut self, message: &WorkerMessage) -> ProtocolResult<()>;

    /// Emit the save request and block for the controller's decision.
    ///
    /// Fails with [`ProtocolError::SaveAlreadyRequested`] on a second call.
    fn request_save(&mut self, suggested_name: &str) -> ProtocolResult<SaveDecision>;

    /// Send a `LOG|` line.
    fn log(&mut self, message: &str) -> ProtocolResult<()> {
        self.send(&WorkerMessage::log(message))
    }

    /// Send a `PROGRESS|` line. `current` is 1-based.
    fn progress(&mut self, current: usize, total: usize, file_name: &str) -> ProtocolResult<()> {
        self.send(&WorkerMessage::Progress {
            current,
            total,
            file_name: file_name.to_string(),
        })
    }
}

impl<C: ControlChannel + ?Sized> ControlChannel for &mut C {
    fn send(&mut self, message: &WorkerMessage) -> ProtocolResult<()> {
        (**self).send(message)
    }

    fn request_save(&mut self, suggested_name: &str) -> ProtocolResult<SaveDecision> {
        (**self).request_save(suggested_name)
    }
}

/// Control channel over a pair of byte streams, normally stdin/stdout.
///
/// Every message is flushed as soon as it is written so the controller sees
/// progress live. When a reply timeout is configured the reply is read on a
/// helper thread so the wait can be bounded.
pub struct LineChannel<R, W> {
    reader: Option<R>,
    writer: W,
    reply_timeout: Option<Duration>,
    save_requested: bool,
}

impl<R, W> LineChannel<R, W>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Some(reader),
            writer,
            reply_timeout: None,
            save_requested: false,
        }
    }

    /// Bound the wait for a save decision. `None` waits forever.
    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Consume the channel and return the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_reply(&mut self) -> ProtocolResult<String> {
        let mut reader = self.reader.take().ok_or(ProtocolError::ChannelClosed)?;

        let Some(timeout) = self.reply_timeout else {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return Err(ProtocolError::ChannelClosed);
            }
            return Ok(line);
        };

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("xlm-save-reply".into())
            .spawn(move || {
                let mut line = String::new();
                let read = reader.read_line(&mut line).map(|n| (n, line));
                // The receiver may have given up already; nothing to report then.
                let _ = tx.send(read);
            })?;

        match rx.recv_timeout(timeout) {
            Ok(Ok((0, _))) => Err(ProtocolError::ChannelClosed),
            Ok(Ok((_, line))) => Ok(line),
            Ok(Err(e)) => Err(e.into()),
            Err(RecvTimeoutError::Timeout) => Err(ProtocolError::ReplyTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ProtocolError::ChannelClosed),
        }
    }
}

impl<R, W> ControlChannel for LineChannel<R, W>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    fn send(&mut self, message: &WorkerMessage) -> ProtocolResult<()> {
        writeln!(self.writer, "{}", LineCodec::encode(message))?;
        self.writer.flush()?;
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
        let reply = self.read_reply()?;
        let decision = SaveDecision::from_reply_line(&reply);
        debug!(?decision, "save decision received");
        Ok(decision)
    }
}
