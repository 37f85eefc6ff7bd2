//! Persistent decision log.
//!
//! The journal is the bridge between runs: writing modes record every
//! decision as it is taken and append an `END` line on clean termination;
//! reloading parses records from the start of the file until the first
//! non-conforming byte and then probes for the sentinel. A file without the
//! sentinel is the footprint of a run that never finished, which the
//! depth-first search answers by re-attempting the same prefix.
//!
//! Plain streaming I/O keeps the on-disk artifact exactly `records + END`
//! with no padding, so a completed file is byte-for-byte reproducible.
//! The file handle stays open for the life of the governor; replay mode
//! never writes and never truncates.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::decision::Decision;

/// Line marking a cleanly terminated run.
const END_SENTINEL: &[u8] = b"END\n";

#[derive(Debug)]
pub(crate) struct Journal {
    file: File,
    writable: bool,
    sealed: bool,
}

impl Journal {
    /// Opens the journal at `path`.
    ///
    /// Writing modes create the file when absent; replay requires it to
    /// already exist, so a missing recording surfaces here as an error.
    pub(crate) fn open(path: &Path, writable: bool) -> io::Result<Self> {
        let file = if writable {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?
        } else {
            OpenOptions::new().read(true).open(path)?
        };
        debug!(path = %path.display(), writable, "opened schedule journal");
        Ok(Self {
            file,
            writable,
            sealed: false,
        })
    }

    /// Reads the whole journal: the parsed records and whether the
    /// termination sentinel follows them.
    pub(crate) fn load(&mut self) -> io::Result<(Vec<Decision>, bool)> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        self.file.read_to_end(&mut raw)?;

        let mut points = Vec::new();
        let mut pos = 0;
        while let Some((decision, used)) = Decision::parse(&raw[pos..]) {
            points.push(decision);
            pos += used;
        }
        let complete = raw[pos..].starts_with(END_SENTINEL);
        debug!(records = points.len(), complete, "loaded schedule journal");
        Ok((points, complete))
    }

    /// Truncates the journal and positions the writer at the start.
    /// No-op in replay mode: the recording must survive the run.
    pub(crate) fn begin(&mut self) -> io::Result<()> {
        if !self.writable {
            return Ok(());
        }
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.sealed = false;
        Ok(())
    }

    /// Appends one record. No-op in replay mode.
    pub(crate) fn append(&mut self, decision: &Decision) -> io::Result<()> {
        if !self.writable {
            return Ok(());
        }
        debug_assert!(!self.sealed, "append after the sentinel");
        self.file.write_all(format!("{decision}\n").as_bytes())
    }

    /// Appends the termination sentinel and flushes.
    ///
    /// Idempotent per run: once sealed, further calls do nothing until the
    /// next [`begin`](Self::begin). No-op in replay mode.
    pub(crate) fn seal(&mut self) -> io::Result<()> {
        if !self.writable || self.sealed {
            return Ok(());
        }
        self.file.write_all(END_SENTINEL)?;
        self.file.flush()?;
        self.sealed = true;
        Ok(())
    }
}
