//! Where emitted records go.

use std::io::{self, Write};

use crate::record::Record;

/// Receives the records a job emits.
pub trait Sink {
    fn emit(&mut self, record: Record) -> io::Result<()>;
}

/// Encodes each record as one line on a writer.
pub struct LineSink<W: Write> {
    writer: W,
    delimiter: char,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, delimiter: char) -> Self {
        Self { writer, delimiter }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for LineSink<W> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        writeln!(self.writer, "{}", record.encode(self.delimiter))
    }
}

/// Keeps emitted records in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub records: Vec<Record>,
}

impl Sink for CaptureSink {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        self.records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_line_sink_writes_one_line_per_record() {
        let mut sink = LineSink::new(Vec::new(), '\x01');
        sink.emit(record!["a", 1]).unwrap();
        sink.emit(record!["b"]).unwrap();
        assert_eq!(sink.into_inner(), b"a\x011\nb\n");
    }
}
