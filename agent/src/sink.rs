use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to a single output destination.
///
/// Every clone writes to the same underlying writer, so the driver can hand
/// one to the crew (and through it to every agent transcript) while keeping
/// its own copy for banners.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Box<dyn Write + Send>>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("shared writer lock poisoned"))
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock()?.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

/// In-memory writer whose clones share one buffer. Test support, enabled by
/// the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

#[cfg(any(test, feature = "test-util"))]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySink, SharedWriter};
    use std::io::Write;

    #[test]
    fn test_clones_share_destination() -> std::io::Result<()> {
        let buf = MemorySink::new();
        let mut a = SharedWriter::new(buf.clone());
        let mut b = a.clone();

        write!(a, "one ")?;
        write!(b, "two")?;
        a.flush()?;

        assert_eq!(buf.contents(), "one two");
        Ok(())
    }
}
