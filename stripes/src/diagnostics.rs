use std::fmt::Display;
use std::io::{self, Write};

use tracing::debug;

/// Reports skipped records, one line each, away from the data stream.
pub struct Diagnostics<W: Write> {
    writer: W,
}

impl<W: Write> Diagnostics<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// `raw` is debug-escaped so control-character delimiters stay visible.
    pub fn skipped(&mut self, phase: &str, raw: &str, err: &anyhow::Error) -> io::Result<()> {
        debug!(phase, "skipped record: {err:#}");
        writeln!(self.writer, "--{phase} skipped-- {raw:?} - {}", OneLine(err))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl Diagnostics<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

struct OneLine<'a>(&'a anyhow::Error);

impl Display for OneLine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = format!("{:#}", self.0);
        f.write_str(&text.replace(['\r', '\n'], " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_one_line_per_skip() {
        let mut diag = Diagnostics::new(Vec::new());
        let err = anyhow!("bad\nvalue").context("mapper failed");
        diag.skipped("map", "a\x01b", &err).unwrap();
        let text = String::from_utf8(diag.into_inner()).unwrap();
        assert_eq!(text, "--map skipped-- \"a\\u{1}b\" - mapper failed: bad value\n");
    }
}
