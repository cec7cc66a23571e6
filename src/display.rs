use anyhow::Result;
use log::info;
use std::io::Write;

use crate::speller::SpellUpdate;

/// Receives the sentence and current character after every speller tick.
/// Called from the speller thread.
pub trait DisplaySink: Send + 'static {
    fn update(&mut self, update: &SpellUpdate) -> Result<()>;
}

/// Control characters are shown escaped; everything else verbatim.
pub fn printable(s: impl IntoIterator<Item = char>) -> String {
    s.into_iter()
        .map(|c| {
            if c.is_control() {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Two-field text display, one line per tick.
pub struct TerminalSink<W: Write + Send + 'static> {
    out: W,
}

impl<W: Write + Send + 'static> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> DisplaySink for TerminalSink<W> {
    fn update(&mut self, update: &SpellUpdate) -> Result<()> {
        writeln!(
            self.out,
            "Spelled Sentence: {}  |  Current Letter: {}",
            printable(update.sentence.chars()),
            printable([update.current])
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per tick, for piping into another program.
pub struct JsonLinesSink<W: Write + Send + 'static> {
    out: W,
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> DisplaySink for JsonLinesSink<W> {
    fn update(&mut self, update: &SpellUpdate) -> Result<()> {
        let line = serde_json::to_string(update)? + "\n";
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Only logs commits; used when stdout is reserved for something else.
pub struct LogSink;

impl DisplaySink for LogSink {
    fn update(&mut self, update: &SpellUpdate) -> Result<()> {
        if let Some(c) = update.committed {
            info!(
                "spelled '{}' -> {}",
                printable([c]),
                printable(update.sentence.chars())
            );
        }
        Ok(())
    }
}
