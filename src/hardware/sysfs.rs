//! Writes to LED class attribute files.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, error};

/// Sink for attribute writes.
///
/// Backends only ever write; reads never happen on this path.
#[cfg_attr(test, mockall::automock)]
pub trait SysfsWriter: Send {
    fn write_str(&mut self, path: &Path, value: &str) -> Result<()>;

    /// Releases every handle held open by the writer.
    fn close_all(&mut self);
}

/// Best-effort write: failures are logged and otherwise ignored.
pub fn write_or_log(io: &mut dyn SysfsWriter, path: &Path, value: &str) {
    if let Err(e) = io.write_str(path, value) {
        error!("Failed to write '{value}' to {}: {e:#}", path.display());
    }
}

pub fn write_number_or_log(io: &mut dyn SysfsWriter, path: &Path, value: u32) {
    write_or_log(io, path, &value.to_string());
}

/// Writer keeping one open handle per attribute file.
///
/// Handles are opened on first use and rewound for every later write.
#[derive(Debug, Default)]
pub struct SysfsFiles {
    handles: HashMap<PathBuf, File>,
}

impl SysfsFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.handles.len()
    }

    fn handle(&mut self, path: &Path) -> Result<&mut File> {
        if !self.handles.contains_key(path) {
            let file = OpenOptions::new()
                .write(true)
                .open(path)
                .with_context(|| format!("Cannot open {}", path.display()))?;
            self.handles.insert(path.to_path_buf(), file);
        }

        self.handles
            .get_mut(path)
            .with_context(|| format!("No handle for {}", path.display()))
    }
}

impl SysfsWriter for SysfsFiles {
    fn write_str(&mut self, path: &Path, value: &str) -> Result<()> {
        let file = self.handle(path)?;
        let result = file
            .seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(value.as_bytes()))
            .and_then(|()| file.flush());

        if let Err(e) = result {
            // Reopen on the next write instead of reusing a broken handle.
            self.handles.remove(path);
            return Err(e).with_context(|| format!("Cannot write {}", path.display()));
        }

        // Attribute files reject this; regular files would keep a stale tail.
        if let Err(e) = file.set_len(value.len() as u64) {
            debug!("Not truncating {}: {e}", path.display());
        }
        Ok(())
    }

    fn close_all(&mut self) {
        debug!("Closing {} sysfs handles", self.handles.len());
        self.handles.clear();
    }
}
