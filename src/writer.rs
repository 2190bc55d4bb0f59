use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing_subscriber::fmt::MakeWriter;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::rotation::{RetentionPolicy, RotationWindow};

/// State of the current live file.
#[derive(Debug)]
struct WriterState {
    /// The open live file handle, opened lazily.
    file: Option<File>,
    /// Start of the window currently being written.
    window_start: OffsetDateTime,
}

/// A writer that appends to one live file per time window and relocates
/// completed windows into date-partitioned archive directories.
///
/// Layout under the writer's root, with `app.log` as the base path:
///
/// ```text
/// logs/
///   app.log                          live file
///   2024-03-16/
///     app_2024-03-16_20-14.log       archived window (compress = false)
///     app_2024-03-16_21-14.gz        archived window (compress = true)
/// ```
///
/// Once the number of dated directories exceeds the retention limit, the
/// oldest ones are deleted recursively.
pub struct RotatingWriter {
    /// Path of the live file.
    base_path: PathBuf,
    /// Directory holding the live file and the dated archive directories.
    root: PathBuf,
    /// Filename stem of the live file, reused for archive names.
    stem: String,
    /// Extension of the live file.
    ext: String,
    /// Window after which the live file is rotated.
    window: RotationWindow,
    /// Retention and compression settings.
    retention: RetentionPolicy,
    clock: Arc<dyn Clock>,
    /// Guards the whole check-rotate-append sequence.
    state: Mutex<WriterState>,
}

impl RotatingWriter {
    /// Create a new rotating writer on the system clock.
    pub fn new(
        base_path: &Path,
        window: RotationWindow,
        retention: RetentionPolicy,
    ) -> Result<Self> {
        Self::with_clock(base_path, window, retention, Arc::new(SystemClock))
    }

    /// Create a rotating writer with an injected clock.
    ///
    /// Ensures the parent directory exists, so callers may hand in paths
    /// like `logs/app.log` before `logs/` has been created.
    pub fn with_clock(
        base_path: &Path,
        window: RotationWindow,
        retention: RetentionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let root = match base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&root)?;

        let stem = base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Config(format!("invalid log path: {}", base_path.display())))?;
        let ext = base_path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());

        let window_start = clock.now();

        Ok(Self {
            base_path: base_path.to_path_buf(),
            root,
            stem,
            ext,
            window,
            retention,
            clock,
            state: Mutex::new(WriterState {
                file: None,
                window_start,
            }),
        })
    }

    /// Path of the live file.
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Append `chunk` to the live file, rotating first if the current
    /// window has elapsed.
    ///
    /// Rotation runs synchronously on the caller's thread, so calls that
    /// land on a window boundary absorb the rename/compress/prune latency.
    /// A failed retention sweep is returned as [`Error::Prune`] after the
    /// bytes have been written; any other error means the chunk was not
    /// appended.
    pub fn append(&self, chunk: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let now = self.clock.now();

        let mut prune_failure = None;
        if now >= state.window_start + self.window.length() {
            prune_failure = self.rotate_locked(&mut state, now)?;
        }

        if state.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.base_path)
                .map_err(|e| Error::Rotation {
                    stage: "opening live file",
                    source: e,
                })?;
            state.file = Some(file);
        }
        if let Some(file) = state.file.as_mut() {
            file.write_all(chunk)?;
        }

        match prune_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Sync the live file to disk.
    pub fn flush(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        if let Some(file) = state.file.as_ref() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Relocate the completed window and open a fresh live file.
    ///
    /// Ordering is rename, then compress, and only then delete the raw
    /// file, so no step can leave the window's bytes unreachable. If the
    /// live file was never written to, only the window start advances.
    fn rotate_locked(
        &self,
        state: &mut WriterState,
        now: OffsetDateTime,
    ) -> Result<Option<Error>> {
        // Release the live handle before renaming.
        state.file = None;

        let mut prune_failure = None;
        if self.base_path.exists() {
            // Archive under the window's start date rather than the trigger
            // date, so a window opened just before midnight lands under the
            // day it belongs to.
            let date_dir = self.root.join(format_date(state.window_start));
            fs::create_dir_all(&date_dir).map_err(|e| Error::Rotation {
                stage: "creating archive directory",
                source: e,
            })?;

            let archived = date_dir.join(format!(
                "{}_{}.{}",
                self.stem,
                format_stamp(state.window_start),
                self.ext
            ));
            fs::rename(&self.base_path, &archived).map_err(|e| Error::Rotation {
                stage: "renaming live file",
                source: e,
            })?;

            if self.retention.compress {
                self.compress_archive(&archived)?;
            }

            prune_failure = self.prune();
        }

        state.window_start = now;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)
            .map_err(|e| Error::Rotation {
                stage: "reopening live file",
                source: e,
            })?;
        state.file = Some(file);

        Ok(prune_failure)
    }

    /// Pack the rotated file into a single gzip archive with the extension
    /// swapped, then remove the raw file. A partial archive is removed
    /// before the error is surfaced.
    fn compress_archive(&self, archived: &Path) -> Result<()> {
        let packed = archived.with_extension("gz");
        let result = (|| -> io::Result<()> {
            let mut input = File::open(archived)?;
            let mut encoder = GzEncoder::new(File::create(&packed)?, Compression::default());
            io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
            Ok(())
        })();

        match result {
            Ok(()) => fs::remove_file(archived).map_err(|e| Error::Rotation {
                stage: "removing rotated file",
                source: e,
            }),
            Err(e) => {
                let _ = fs::remove_file(&packed);
                Err(Error::Rotation {
                    stage: "compressing archive",
                    source: e,
                })
            }
        }
    }

    /// Delete the oldest dated directories beyond the retention limit.
    ///
    /// Best-effort: one directory failing to delete does not stop the
    /// sweep, but any failure is reported to the caller.
    fn prune(&self) -> Option<Error> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                return Some(Error::Prune(format!(
                    "scanning {}: {}",
                    self.root.display(),
                    e
                )));
            }
        };

        let mut dated: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter(|entry| is_date_dir_name(&entry.file_name().to_string_lossy()))
            .map(|entry| entry.path())
            .collect();
        if dated.len() <= self.retention.max_days {
            return None;
        }

        // Lexicographic order is chronological for YYYY-MM-DD names.
        dated.sort();
        let excess = dated.len() - self.retention.max_days;

        let mut failures = Vec::new();
        for dir in &dated[..excess] {
            if let Err(e) = fs::remove_dir_all(dir) {
                failures.push(format!("{}: {}", dir.display(), e));
            }
        }

        if failures.is_empty() {
            None
        } else {
            Some(Error::Prune(failures.join("; ")))
        }
    }
}

/// Cloneable handle that lets a `tracing_subscriber` fmt layer write
/// through a shared [`RotatingWriter`].
#[derive(Clone)]
pub struct WriterHandle {
    writer: Arc<RotatingWriter>,
}

impl WriterHandle {
    pub fn new(writer: Arc<RotatingWriter>) -> Self {
        Self { writer }
    }
}

impl io::Write for WriterHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.append(buf) {
            Ok(()) => Ok(buf.len()),
            // The bytes reached the live file even when the sweep failed.
            Err(Error::Prune(_)) => Ok(buf.len()),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().map_err(io::Error::other)
    }
}

impl<'a> MakeWriter<'a> for WriterHandle {
    type Writer = WriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn format_date(t: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]");
    t.format(&format).unwrap()
}

fn format_stamp(t: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]_[hour]-[minute]");
    t.format(&format).unwrap()
}

fn is_date_dir_name(name: &str) -> bool {
    name.len() == 10
        && name.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}
