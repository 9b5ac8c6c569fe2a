// src/record/builder.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::model::WatchOptions;
use crate::errors::{GlobwatchError, Result};
use crate::fs::FileSystem;
use crate::record::{EventContext, FileRecord};
use crate::types::EventKind;

/// Turns correlated events into [`FileRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    fs: Arc<dyn FileSystem>,
    cwd: PathBuf,
    read_delay: Duration,
}

impl RecordBuilder {
    pub fn new(fs: Arc<dyn FileSystem>, opts: &WatchOptions) -> Self {
        Self {
            fs,
            cwd: opts.effective_cwd(),
            read_delay: opts.read_delay(),
        }
    }

    pub fn read_delay(&self) -> Duration {
        self.read_delay
    }

    /// Build the record for `ctx`.
    ///
    /// Deletions return immediately without touching the filesystem; every
    /// other kind waits for the read delay and then reads content + stat.
    pub async fn build(&self, ctx: EventContext) -> Result<FileRecord> {
        match ctx.kind {
            EventKind::Unlink | EventKind::UnlinkDir => Ok(self.deletion(&ctx)),
            EventKind::Add | EventKind::Change | EventKind::AddDir => self.read(ctx).await,
        }
    }

    /// Deletion marker: path, base and event tag only.
    pub fn deletion(&self, ctx: &EventContext) -> FileRecord {
        FileRecord::new(ctx.path.clone(), self.cwd.clone(), ctx.base.clone()).with_event(ctx.kind)
    }

    /// Sleep for the read delay, then read the file on the blocking pool.
    pub async fn read(&self, ctx: EventContext) -> Result<FileRecord> {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        let fs = Arc::clone(&self.fs);
        let cwd = self.cwd.clone();
        let path = ctx.path.clone();

        tokio::task::spawn_blocking(move || read_record(fs.as_ref(), cwd, ctx))
            .await
            .map_err(|err| GlobwatchError::FileRead {
                path,
                message: format!("read task failed: {err}"),
            })?
    }
}

fn read_record(fs: &dyn FileSystem, cwd: PathBuf, ctx: EventContext) -> Result<FileRecord> {
    let read_error = |err: anyhow::Error| GlobwatchError::FileRead {
        path: ctx.path.clone(),
        message: format!("{err:#}"),
    };

    let stat = fs.metadata(&ctx.path).map_err(read_error)?;
    let contents = if stat.is_dir {
        None
    } else {
        Some(fs.read(&ctx.path).map_err(read_error)?)
    };

    debug!(path = ?ctx.path, event = %ctx.kind, bytes = stat.len, "read file record");

    let mut record = FileRecord::new(ctx.path, cwd, ctx.base).with_event(ctx.kind);
    record.stat = Some(stat);
    record.contents = contents;
    Ok(record)
}
