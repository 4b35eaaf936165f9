// crates/pipeline-collector-service/src/audit.rs
// ============================================================================
// Module: Rotating Audit Trail
// Description: Append-only JSON-lines audit file with size-based rotation.
// Purpose: Persist one summary line per collection under bounded disk usage.
// Dependencies: pipeline-collector-{config,core}, time, tracing
// ============================================================================

//! ## Overview
//! [`RotatingFileAuditSink`] appends one line per call under a mutex, so
//! concurrent collections interleave at line granularity only. Before a write
//! that would push the active file past the size threshold, the file is
//! renamed to `<stem>-<YYYY-MM-DDTHH-MM-SS.mmm>.<ext>` and a fresh file is
//! opened. A rotation landing on an existing name within the same millisecond
//! gets a `-<n>` counter after the stamp instead of replacing it. Rotated
//! files beyond the backup count or older than the retention period are then
//! removed. A zero backup count or zero retention disables
//! that bound.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use pipeline_collector_config::AuditConfig;
use pipeline_collector_core::AuditError;
use pipeline_collector_core::AuditSink;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::UtcOffset;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::debug;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timestamp embedded in rotated file names.
const BACKUP_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second].[subsecond digits:3]");

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Rotation and retention bounds for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes the active file may not exceed after an append.
    pub max_size_bytes: u64,
    /// Age after which rotated files are removed; zero keeps them.
    pub max_age: Duration,
    /// Number of rotated files kept; zero keeps all.
    pub max_backups: usize,
    /// Stamp rotated files with the local offset instead of UTC.
    pub local_time: bool,
}

impl From<&AuditConfig> for RotationPolicy {
    fn from(config: &AuditConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes(),
            max_age: config.max_age(),
            max_backups: config.max_backups,
            local_time: config.local_time,
        }
    }
}

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Open handle and byte count of the active audit file.
struct ActiveFile {
    /// Append-mode handle.
    file: File,
    /// Bytes currently in the file.
    size: u64,
}

/// Rotating file-backed audit sink.
pub struct RotatingFileAuditSink {
    /// Path of the active file.
    path: PathBuf,
    /// Rotation bounds.
    policy: RotationPolicy,
    /// Offset used for backup timestamps, fixed at open.
    offset: UtcOffset,
    /// Active file guarded for line-granular appends.
    active: Mutex<ActiveFile>,
}

impl RotatingFileAuditSink {
    /// Opens (creating if needed) the audit file and its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        let offset = if policy.local_time {
            UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
        } else {
            UtcOffset::UTC
        };
        Ok(Self {
            path,
            policy,
            offset,
            active: Mutex::new(ActiveFile {
                file,
                size,
            }),
        })
    }

    /// Opens the audit file described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn from_config(config: &AuditConfig) -> io::Result<Self> {
        Self::open(config.path(), RotationPolicy::from(config))
    }

    /// Returns the path of the active file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists rotated files, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self.backups_with_time()?.into_iter().map(|(path, _, _)| path).collect())
    }

    /// Moves the active file aside and opens a fresh one.
    fn rotate(&self, active: &mut ActiveFile) -> io::Result<()> {
        active.file.flush()?;
        let stamp = OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .format(BACKUP_TIMESTAMP)
            .map_err(io::Error::other)?;
        let backup = self.unused_backup_path(&stamp);
        fs::rename(&self.path, &backup)?;
        active.file = open_append(&self.path)?;
        active.size = 0;
        debug!(backup = %backup.display(), "audit trail rotated");
        if let Err(err) = self.prune() {
            warn!(error = %err, "failed to prune audit backups");
        }
        Ok(())
    }

    /// Removes backups beyond the retention bounds.
    fn prune(&self) -> io::Result<()> {
        let backups = self.backups_with_time()?;
        let cutoff = time::Duration::try_from(self.policy.max_age)
            .ok()
            .filter(|age| !age.is_zero())
            .and_then(|age| self.now_primitive().checked_sub(age));
        for (index, (path, stamped, _)) in backups.iter().enumerate() {
            let over_count = self.policy.max_backups > 0 && index >= self.policy.max_backups;
            let too_old = cutoff.is_some_and(|cutoff| *stamped < cutoff);
            if over_count || too_old {
                fs::remove_file(path)?;
                debug!(backup = %path.display(), "audit backup removed");
            }
        }
        Ok(())
    }

    /// Lists rotated files with their embedded timestamps and collision
    /// counters, newest first.
    fn backups_with_time(&self) -> io::Result<Vec<(PathBuf, PrimitiveDateTime, u32)>> {
        let (stem, extension) = self.name_parts();
        let prefix = format!("{stem}-");
        let suffix = extension.map(|ext| format!(".{ext}")).unwrap_or_default();
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut backups = Vec::new();
        for entry in fs::read_dir(&directory)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(stamp) = name.strip_prefix(&prefix).and_then(|rest| rest.strip_suffix(&suffix))
            else {
                continue;
            };
            if let Some((stamped, counter)) = parse_backup_stamp(stamp) {
                backups.push((entry.path(), stamped, counter));
            }
        }
        backups.sort_by(|left, right| (right.1, right.2).cmp(&(left.1, left.2)));
        Ok(backups)
    }

    /// Returns the first backup path for `stamp` that does not exist yet.
    fn unused_backup_path(&self, stamp: &str) -> PathBuf {
        let mut candidate = self.backup_path(stamp, 0);
        let mut counter = 0_u32;
        while candidate.exists() && counter < u32::MAX {
            counter += 1;
            candidate = self.backup_path(stamp, counter);
        }
        candidate
    }

    /// Builds the rotated file path for a timestamp and collision counter.
    fn backup_path(&self, stamp: &str, counter: u32) -> PathBuf {
        let (stem, extension) = self.name_parts();
        let stamp =
            if counter == 0 { stamp.to_string() } else { format!("{stamp}-{counter}") };
        let name = match extension {
            Some(ext) => format!("{stem}-{stamp}.{ext}"),
            None => format!("{stem}-{stamp}"),
        };
        self.path.with_file_name(name)
    }

    /// Splits the active file name into stem and extension.
    fn name_parts(&self) -> (String, Option<String>) {
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = self.path.extension().map(|ext| ext.to_string_lossy().into_owned());
        (stem, extension)
    }

    /// Current time in the sink's offset, without the offset.
    fn now_primitive(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc().to_offset(self.offset);
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

impl AuditSink for RotatingFileAuditSink {
    fn append(&self, line: &[u8]) -> Result<(), AuditError> {
        let mut active =
            self.active.lock().map_err(|_| AuditError::Io("audit lock poisoned".to_string()))?;
        let needed = u64::try_from(line.len()).unwrap_or(u64::MAX).saturating_add(1);
        if active.size > 0 && active.size.saturating_add(needed) > self.policy.max_size_bytes {
            self.rotate(&mut active).map_err(|err| AuditError::Io(err.to_string()))?;
        }
        active
            .file
            .write_all(line)
            .and_then(|()| active.file.write_all(b"\n"))
            .and_then(|()| active.file.flush())
            .map_err(|err| AuditError::Io(err.to_string()))?;
        active.size = active.size.saturating_add(needed);
        Ok(())
    }
}

/// Parses `<stamp>` or `<stamp>-<n>` from a backup file name.
fn parse_backup_stamp(raw: &str) -> Option<(PrimitiveDateTime, u32)> {
    if let Ok(stamped) = PrimitiveDateTime::parse(raw, BACKUP_TIMESTAMP) {
        return Some((stamped, 0));
    }
    let (stamp, counter) = raw.rsplit_once('-')?;
    let counter = counter.parse::<u32>().ok().filter(|counter| *counter > 0)?;
    let stamped = PrimitiveDateTime::parse(stamp, BACKUP_TIMESTAMP).ok()?;
    Some((stamped, counter))
}

/// Opens a file for appending, creating it when missing.
fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
