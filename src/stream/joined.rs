//! Lazy concatenation of byte streams
//!
//! Sources are read front to back. Each source is dropped (and so closed)
//! as soon as it reports EOF; closing the joined reader early drops every
//! source that was not consumed yet.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read};

/// Boxed byte source that can move to a worker thread
pub type ByteSource = Box<dyn Read + Send>;

/// Forward-only, single-pass concatenation of byte sources
pub struct JoinedReader {
    sources: VecDeque<ByteSource>,
}

impl JoinedReader {
    pub fn new(sources: impl IntoIterator<Item = ByteSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
        }
    }

    /// Sources not yet exhausted, the active one included
    pub fn remaining(&self) -> usize {
        self.sources.len()
    }

    /// Drop the active source and every pending one
    pub fn close(&mut self) {
        self.sources.clear();
    }
}

impl Read for JoinedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while let Some(current) = self.sources.front_mut() {
            let n = current.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.sources.pop_front();
        }

        Ok(0)
    }
}

impl fmt::Debug for JoinedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinedReader")
            .field("remaining", &self.sources.len())
            .finish()
    }
}

/// Join sources into one stream
pub fn join(sources: impl IntoIterator<Item = ByteSource>) -> JoinedReader {
    JoinedReader::new(sources)
}
