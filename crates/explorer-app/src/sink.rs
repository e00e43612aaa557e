//! Destinations for emitted call expressions

use std::io::Write;

use explorer_core::prelude::*;
use explorer_core::FormKey;

pub trait OutputSink {
    fn write_expression(&mut self, key: &FormKey, text: &str) -> Result<()>;
}

/// Writes each expression on its own stdout line
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_expression(&mut self, _key: &FormKey, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Keeps emitted expressions in memory, newest last
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    entries: Vec<(FormKey, String)>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(FormKey, String)] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(|(_, text)| text.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl OutputSink for BufferSink {
    fn write_expression(&mut self, key: &FormKey, text: &str) -> Result<()> {
        self.entries.push((key.clone(), text.to_string()));
        Ok(())
    }
}
