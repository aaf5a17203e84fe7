//! Line-based [`InputSource`] implementation.
//!
//! The input surface (or any script standing in for it) writes one
//! JSON-encoded [`InputEvent`] per line.  The daemon reads them from
//! standard input.
//!
//! # Wire format
//!
//! ```json
//! {"TextChanged":"wo"}
//! {"Confirmed":"work"}
//! {"Confirmed":":rename personal stuff"}
//! "Abort"
//! {"Hotkey":{"modifiers":2,"key":38}}
//! ```

use crate::command::InputEvent;
use crate::traits::InputSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader, Stdin};
use std::sync::mpsc;

/// An [`InputSource`] reading newline-delimited JSON events from any
/// buffered reader.
///
/// Blank lines are skipped.  Malformed lines are logged and skipped.  The
/// source finishes at end of input.
pub struct LineSource<R> {
    reader: R,
}

/// Errors produced by the line source.
#[derive(Debug, thiserror::Error)]
pub enum LineSourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LineSource<BufReader<Stdin>> {
    /// A source reading the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send> InputSource for LineSource<R> {
    type Error = LineSourceError;

    /// Forward events until end of input or until the receiver is gone.
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<InputEvent>) -> Result<(), Self::Error> {
        let mut text = String::new();
        loop {
            text.clear();
            if self.reader.read_line(&mut text)? == 0 {
                info!("end of input");
                return Ok(());
            }
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<InputEvent>(line) {
                Ok(event) => {
                    debug!("received {:?}", event);
                    if sink.send(event).is_err() {
                        info!("sink closed, shutting down");
                        return Ok(());
                    }
                }
                Err(e) => error!("bad event {:?}: {}", line, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &str) -> Vec<InputEvent> {
        let (tx, rx) = mpsc::channel();
        let mut source = LineSource::new(Cursor::new(input.to_string()));
        source.run(tx).unwrap();
        rx.try_iter().collect()
    }

    #[test]
    fn reads_one_event_per_line() {
        let events = collect(concat!(
            "{\"TextChanged\":\"wo\"}\n",
            "{\"Confirmed\":\"work\"}\n",
            "\"Abort\"\n",
            "{\"Hotkey\":{\"modifiers\":2,\"key\":38}}\n",
        ));
        assert_eq!(
            events,
            vec![
                InputEvent::TextChanged("wo".into()),
                InputEvent::Confirmed("work".into()),
                InputEvent::Abort,
                InputEvent::Hotkey {
                    modifiers: 2,
                    key: 38
                },
            ]
        );
    }

    #[test]
    fn malformed_and_blank_lines_are_skipped() {
        let events = collect("not json at all\n\n   \n{\"Confirmed\":\":scan\"}");
        assert_eq!(events, vec![InputEvent::Confirmed(":scan".into())]);
    }

    #[test]
    fn stops_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut source = LineSource::new(Cursor::new("\"Abort\"\n\"Abort\"\n"));
        assert!(source.run(tx).is_ok());
    }
}
