use std::io::{self, Write};

/// Mirrors every write to each of its sinks, in order, flushing each one
/// straight away.
///
/// Failures are not isolated: the first sink that errors aborts the call and
/// the sinks after it are neither written nor flushed.
pub struct Tee<W: Write> {
    sinks: Vec<W>,
}

impl<W: Write> Tee<W> {
    pub fn new(sinks: Vec<W>) -> Self {
        Self { sinks }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Vec<W> {
        self.sinks
    }
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
            sink.flush()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sinks.iter_mut().try_for_each(Write::flush)
    }
}
