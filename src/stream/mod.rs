// src/stream/mod.rs

//! The output stream: records downstream, pass-through writes upstream,
//! lifecycle controls, and mirrored watcher signals.
//!
//! Internally one driver task consumes backend signals in order. Deletions
//! are built inline on the driver, so they stay ordered relative to each
//! other; every other kind is spawned (read delay, then blocking read) and
//! completes in I/O order.

pub mod event;

use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::model::WatchOptions;
use crate::config::validate::validate_options;
use crate::errors::{GlobwatchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::glob::{BaseResolver, GlobInput, normalize_globs};
use crate::logging::{EventLogger, TracingLogger, unresolved_segments, verbose_segments};
use crate::record::{EventContext, FileRecord, RecordBuilder};
use crate::types::EventKind;
use crate::watch::backend::{BackendEvent, BackendEventReceiver, WatchBackend};
use crate::watch::correlate::Correlator;
use crate::watch::notify_backend::NotifyBackend;

pub use event::StreamEvent;

/// Synchronous per-record hook, called once per record before it is pushed.
pub trait RecordCallback: Send + Sync {
    fn on_record(&self, record: &FileRecord);
}

impl<F> RecordCallback for F
where
    F: Fn(&FileRecord) + Send + Sync,
{
    fn on_record(&self, record: &FileRecord) {
        self(record)
    }
}

/// Everything the stream delegates to.
pub struct Collaborators {
    pub backend: Box<dyn WatchBackend>,
    pub fs: Arc<dyn FileSystem>,
    pub logger: Arc<dyn EventLogger>,
    pub callback: Arc<dyn RecordCallback>,
}

impl Collaborators {
    /// Real filesystem, `notify` backend, `tracing` logger, no-op callback.
    pub fn notify() -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        Self {
            backend: Box::new(NotifyBackend::new(Arc::clone(&fs))),
            fs,
            logger: Arc::new(TracingLogger),
            callback: Arc::new(|_: &FileRecord| {}),
        }
    }

    /// Custom backend; everything else as in [`Collaborators::notify`].
    pub fn with_backend(backend: impl WatchBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            ..Self::notify()
        }
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn callback(mut self, callback: impl RecordCallback + 'static) -> Self {
        self.callback = Arc::new(callback);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

/// State shared by the stream handle, the driver and in-flight reads.
struct Shared {
    options: WatchOptions,
    bases: BaseResolver,
    correlator: Mutex<Correlator>,
    builder: RecordBuilder,
    logger: Arc<dyn EventLogger>,
    callback: Arc<dyn RecordCallback>,
    out: mpsc::UnboundedSender<StreamEvent>,
    closed: AtomicBool,
}

impl Shared {
    fn correlator(&self) -> MutexGuard<'_, Correlator> {
        self.correlator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn emit(&self, event: StreamEvent) {
        // The consumer may have dropped the stream already; nothing to do then.
        let _ = self.out.send(event);
    }

    /// Callback, then push. Verbose line first for built records.
    fn deliver(&self, record: FileRecord) {
        if self.options.verbose {
            if let Some(kind) = record.event {
                let segments = verbose_segments(self.options.name.as_deref(), &record, kind);
                self.logger.info(&segments);
            }
        }
        self.callback.on_record(&record);
        self.emit(StreamEvent::Data(record));
    }

    /// Correlate `path` and build its per-event context, or log the
    /// unresolved-path diagnostic and return `None`.
    fn context_for(&self, kind: EventKind, path: PathBuf) -> Option<EventContext> {
        let correlation = {
            let correlator = self.correlator();
            match correlator.correlate_event(kind, &path) {
                Some(c) => c,
                None => {
                    let segments =
                        unresolved_segments(&path, correlator.patterns(), &self.options);
                    self.logger.warn(&segments);
                    return None;
                }
            }
        };

        debug!(?path, pattern = %correlation.pattern, "correlated event");
        let base = self.options.absolutize(&self.bases.resolve(&correlation.pattern));
        Some(EventContext {
            kind,
            path: self.options.absolutize(&path),
            base,
            pattern: correlation.pattern,
        })
    }
}

async fn drive(shared: Arc<Shared>, mut backend_rx: BackendEventReceiver) {
    while let Some(signal) = backend_rx.recv().await {
        if shared.is_closed() {
            break;
        }

        match signal {
            BackendEvent::Path { kind, path } => {
                shared.emit(StreamEvent::Watcher {
                    kind,
                    path: path.clone(),
                });
                if shared.options.subscribes(kind) {
                    process(&shared, kind, path);
                }
            }
            BackendEvent::Ready => shared.emit(StreamEvent::Ready),
            BackendEvent::Error(err) => shared.emit(StreamEvent::Error(err)),
            BackendEvent::Raw(raw) => shared.emit(StreamEvent::Raw(raw)),
        }
    }
    debug!("watch driver finished");
}

fn process(shared: &Arc<Shared>, kind: EventKind, path: PathBuf) {
    let Some(ctx) = shared.context_for(kind, path) else {
        return;
    };

    match ctx.kind {
        EventKind::Unlink | EventKind::UnlinkDir => {
            let record = shared.builder.deletion(&ctx);
            shared.deliver(record);
        }
        EventKind::Add | EventKind::Change | EventKind::AddDir => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                match shared.builder.read(ctx).await {
                    Ok(record) => shared.deliver(record),
                    Err(err) => {
                        warn!(error = %err, "could not build file record");
                        shared.emit(StreamEvent::Error(err));
                    }
                }
            });
        }
    }
}

/// Watch `globs` with the `notify` backend.
///
/// Must be called from within a Tokio runtime.
pub fn watch(globs: impl Into<GlobInput>, options: WatchOptions) -> Result<WatchStream> {
    watch_with(globs, options, Collaborators::notify())
}

/// [`watch`] with a synchronous per-record callback.
pub fn watch_with_callback(
    globs: impl Into<GlobInput>,
    options: WatchOptions,
    callback: impl RecordCallback + 'static,
) -> Result<WatchStream> {
    watch_with(globs, options, Collaborators::notify().callback(callback))
}

/// Watch `globs` with explicit collaborators.
///
/// Fails synchronously with `InvalidArgument` for bad `globs`, and with
/// `Glob` / `ConfigError` / `Watcher` errors when the patterns, options or
/// backend are unusable. Must be called from within a Tokio runtime.
pub fn watch_with(
    globs: impl Into<GlobInput>,
    options: WatchOptions,
    collaborators: Collaborators,
) -> Result<WatchStream> {
    let patterns = normalize_globs(globs.into(), options.cwd.as_deref())?;
    validate_options(&options)?;
    let options = options.with_absolute_cwd()?;
    let correlator = Correlator::new(patterns.clone(), options.cwd.clone())?;

    let Collaborators {
        mut backend,
        fs,
        logger,
        callback,
    } = collaborators;

    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    backend.start(&patterns, &options, backend_tx)?;

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        bases: BaseResolver::from_options(&options),
        builder: RecordBuilder::new(fs, &options),
        correlator: Mutex::new(correlator),
        options,
        logger,
        callback,
        out: out_tx,
        closed: AtomicBool::new(false),
    });

    let driver = tokio::spawn(drive(Arc::clone(&shared), backend_rx));
    info!(?patterns, "watching");

    Ok(WatchStream {
        shared,
        backend,
        rx: out_rx,
        ended: false,
        driver,
    })
}

/// Handle returned by [`watch`].
///
/// Read with [`WatchStream::recv`] or as a `futures::Stream`. Dropping the
/// handle closes the backend.
pub struct WatchStream {
    shared: Arc<Shared>,
    backend: Box<dyn WatchBackend>,
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    ended: bool,
    driver: JoinHandle<()>,
}

impl std::fmt::Debug for WatchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchStream")
            .field("options", &self.shared.options)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl WatchStream {
    /// Next event, or `None` once `End` has been delivered.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.ended {
            return None;
        }
        let event = self.rx.recv().await?;
        self.observe(&event);
        Some(event)
    }

    /// Next `Data` record, skipping every other signal.
    pub async fn recv_record(&mut self) -> Option<FileRecord> {
        while let Some(event) = self.recv().await {
            if let StreamEvent::Data(record) = event {
                return Some(record);
            }
        }
        None
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        if self.ended {
            return None;
        }
        let event = self.rx.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    fn observe(&mut self, event: &StreamEvent) {
        if matches!(event, StreamEvent::End) {
            self.ended = true;
        }
    }

    /// Inject a record upstream: it goes to the callback and is pushed
    /// downstream unchanged.
    pub fn write(&self, record: FileRecord) -> Result<()> {
        if self.shared.is_closed() {
            return Err(GlobwatchError::StreamClosed);
        }
        self.shared.callback.on_record(&record);
        self.shared.emit(StreamEvent::Data(record));
        Ok(())
    }

    /// Resolve more patterns and add them to both the live watch and the
    /// correlator.
    pub fn add(&mut self, globs: impl Into<GlobInput>) -> Result<()> {
        if self.shared.is_closed() {
            return Err(GlobwatchError::StreamClosed);
        }
        let patterns = normalize_globs(globs.into(), self.shared.options.cwd.as_deref())?;
        self.shared.correlator().extend(patterns.iter().cloned())?;
        self.backend.add(&patterns)?;
        debug!(?patterns, "added patterns");
        Ok(())
    }

    /// Stop watching patterns. The correlator keeps them, so events already
    /// queued for those paths still correlate.
    pub fn unwatch(&mut self, globs: impl Into<GlobInput>) -> Result<()> {
        if self.shared.is_closed() {
            return Err(GlobwatchError::StreamClosed);
        }
        let patterns = normalize_globs(globs.into(), self.shared.options.cwd.as_deref())?;
        self.backend.unwatch(&patterns)?;
        debug!(?patterns, "unwatched patterns");
        Ok(())
    }

    /// Tear down the backend and signal `End`. Reads already in flight are
    /// not cancelled, but anything arriving after `End` is not yielded.
    pub fn close(&mut self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.backend.close()?;
        self.shared.emit(StreamEvent::End);
        info!("watch stream closed");
        Ok(())
    }

    /// Snapshot of the correlator's pattern list.
    pub fn patterns(&self) -> Vec<String> {
        self.shared.correlator().patterns().to_vec()
    }

    pub fn options(&self) -> &WatchOptions {
        &self.shared.options
    }
}

impl futures::Stream for WatchStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.ended {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                this.observe(&event);
                Poll::Ready(Some(event))
            }
            other => other,
        }
    }
}

impl Drop for WatchStream {
    fn drop(&mut self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            if let Err(err) = self.backend.close() {
                warn!(error = %err, "failed to close watcher backend");
            }
        }
        self.driver.abort();
    }
}
