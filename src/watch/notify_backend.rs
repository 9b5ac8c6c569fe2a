// src/watch/notify_backend.rs

//! Production [`WatchBackend`] on top of `notify`.
//!
//! `notify` watches directories, not globs, so this backend:
//! - watches the base directory of every positive pattern recursively,
//! - filters the raw notify paths through the live pattern set,
//! - maps notify's event kinds onto [`EventKind`],
//! - drops duplicate modify notifications whose size/mtime did not change,
//! - folds the burst of notifications one write produces into one event.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use globset::{GlobSet, GlobSetBuilder};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind as NotifyKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::config::model::WatchOptions;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::glob::normalize::NEGATION;
use crate::types::EventKind;
use crate::watch::backend::{BackendEvent, BackendEventSender, WatchBackend};
use crate::watch::correlate::{absolute_base, below_base, compile_glob};
use crate::watch::path_utils::{normalize_lexically, slash_string};

/// Lower bound for the per-path coalescing window.
const COALESCE_WINDOW_MS: u64 = 50;

/// Size + mtime, used to tell real changes from repeated notifications.
type Fingerprint = Option<(u64, Option<SystemTime>)>;

/// Compiled live pattern set, with every pattern made absolute.
struct PathFilter {
    positive: GlobSet,
    negative: GlobSet,
    bases: Vec<PathBuf>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            positive: GlobSet::empty(),
            negative: GlobSet::empty(),
            bases: Vec::new(),
        }
    }
}

impl PathFilter {
    fn build(patterns: &[String], cwd: &Path) -> Result<Self> {
        let mut positive = GlobSetBuilder::new();
        let mut negative = GlobSetBuilder::new();
        let mut bases = Vec::new();

        for pattern in patterns {
            let (negated, body) = match pattern.strip_prefix(NEGATION) {
                Some(rest) => (true, rest),
                None => (false, pattern.as_str()),
            };
            let absolute = if Path::new(body).is_absolute() {
                body.to_string()
            } else {
                slash_string(&normalize_lexically(&cwd.join(body)))
            };

            if negated {
                negative.add(compile_glob(&absolute)?);
            } else {
                positive.add(compile_glob(&absolute)?);
                let base = absolute_base(&absolute, None);
                if !bases.contains(&base) {
                    bases.push(base);
                }
            }
        }

        Ok(Self {
            positive: positive.build()?,
            negative: negative.build()?,
            bases,
        })
    }

    fn accepts_file(&self, path: &Path) -> bool {
        self.positive.is_match(path) && !self.negative.is_match(path)
    }

    /// Directories are reported anywhere below a watched base; the
    /// correlator claims them by the same rule.
    fn accepts_dir(&self, path: &Path) -> bool {
        !self.negative.is_match(path) && self.bases.iter().any(|base| below_base(path, base))
    }
}

/// State shared between the backend and the notify callback.
#[derive(Default)]
struct LiveSet {
    patterns: Vec<String>,
    filter: PathFilter,
    known_dirs: HashSet<PathBuf>,
    fingerprints: HashMap<PathBuf, Fingerprint>,
    /// Last time a file event was emitted per path.
    recent: HashMap<PathBuf, Instant>,
    window: Duration,
}

type Classified = Vec<(EventKind, PathBuf)>;

impl LiveSet {
    fn rebuild(&mut self, patterns: Vec<String>, cwd: &Path) -> Result<()> {
        self.filter = PathFilter::build(&patterns, cwd)?;
        self.patterns = patterns;
        Ok(())
    }

    /// Whether an event for `path` went out within the coalescing window.
    fn is_recent(&self, path: &Path) -> bool {
        self.recent
            .get(path)
            .is_some_and(|at| at.elapsed() < self.window)
    }

    fn created(&mut self, path: &Path, is_dir: bool, fs: &dyn FileSystem, out: &mut Classified) {
        if is_dir {
            if self.filter.accepts_dir(path) && self.known_dirs.insert(path.to_path_buf()) {
                out.push((EventKind::AddDir, path.to_path_buf()));
            }
            return;
        }

        if self.filter.accepts_file(path) {
            let previous = self.fingerprints.insert(path.to_path_buf(), fingerprint(fs, path));
            let kind = match previous {
                None => EventKind::Add,
                Some(_) if self.is_recent(path) => return,
                Some(_) => EventKind::Change,
            };
            self.recent.insert(path.to_path_buf(), Instant::now());
            out.push((kind, path.to_path_buf()));
        }
    }

    fn changed(&mut self, path: &Path, fs: &dyn FileSystem, out: &mut Classified) {
        if !self.filter.accepts_file(path) || !fs.is_file(path) {
            return;
        }

        let current = fingerprint(fs, path);
        let previous = self.fingerprints.insert(path.to_path_buf(), current);
        if self.is_recent(path) {
            return;
        }
        let kind = match previous {
            None => EventKind::Add,
            Some(previous) if previous == current => return,
            Some(_) => EventKind::Change,
        };
        self.recent.insert(path.to_path_buf(), Instant::now());
        out.push((kind, path.to_path_buf()));
    }

    fn removed(&mut self, path: &Path, is_dir: Option<bool>, out: &mut Classified) {
        let was_dir = self.known_dirs.remove(path);
        if is_dir.unwrap_or(was_dir) {
            self.known_dirs.retain(|dir| !dir.starts_with(path));
            self.fingerprints.retain(|file, _| !file.starts_with(path));
            self.recent.retain(|file, _| !file.starts_with(path));
            if self.filter.accepts_dir(path) {
                out.push((EventKind::UnlinkDir, path.to_path_buf()));
            }
        } else {
            self.fingerprints.remove(path);
            self.recent.remove(path);
            if self.filter.accepts_file(path) {
                out.push((EventKind::Unlink, path.to_path_buf()));
            }
        }
    }

    /// Walk `root`, recording what exists. Returns the entries that were not
    /// known before, as `add` / `addDir`.
    fn scan(&mut self, fs: &dyn FileSystem, root: &Path) -> Classified {
        let mut found = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = match fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(?dir, error = %err, "skipping unreadable directory during scan");
                    continue;
                }
            };

            for path in entries {
                if fs.is_dir(&path) {
                    if self.filter.accepts_dir(&path) && self.known_dirs.insert(path.clone()) {
                        found.push((EventKind::AddDir, path.clone()));
                    }
                    stack.push(path);
                } else if fs.is_file(&path) && self.filter.accepts_file(&path) {
                    let fp = fingerprint(fs, &path);
                    if self.fingerprints.insert(path.clone(), fp).is_none() {
                        found.push((EventKind::Add, path));
                    }
                }
            }
        }

        found
    }

    /// Directories to hand to notify: each base, or for a base that does
    /// not exist yet its nearest existing ancestor inside `cwd`. Roots nested
    /// inside other roots are dropped.
    fn roots(&self, fs: &dyn FileSystem, cwd: &Path) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for base in &self.filter.bases {
            let existing = base
                .ancestors()
                .take_while(|dir| *dir == base.as_path() || dir.starts_with(cwd))
                .find(|dir| fs.is_dir(dir));
            let Some(existing) = existing else {
                warn!(?base, "glob base does not exist; not watching it");
                continue;
            };
            let existing = existing.to_path_buf();
            if !roots.contains(&existing) {
                roots.push(existing);
            }
        }

        let snapshot = roots.clone();
        roots.retain(|root| {
            !snapshot
                .iter()
                .any(|other| other != root && root.starts_with(other))
        });
        roots
    }
}

fn fingerprint(fs: &dyn FileSystem, path: &Path) -> Fingerprint {
    fs.metadata(path).ok().map(|stat| (stat.len, stat.modified))
}

fn classify(event: &Event, fs: &dyn FileSystem, live: &mut LiveSet) -> Classified {
    let mut out = Vec::new();

    match &event.kind {
        NotifyKind::Create(CreateKind::Folder) => {
            for path in &event.paths {
                live.created(path, true, fs, &mut out);
            }
        }
        NotifyKind::Create(CreateKind::File) => {
            for path in &event.paths {
                live.created(path, false, fs, &mut out);
            }
        }
        NotifyKind::Create(_) => {
            for path in &event.paths {
                live.created(path, fs.is_dir(path), fs, &mut out);
            }
        }
        NotifyKind::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
            (RenameMode::From, paths) => {
                for path in paths {
                    live.removed(path, None, &mut out);
                }
            }
            (RenameMode::To, paths) => {
                for path in paths {
                    live.created(path, fs.is_dir(path), fs, &mut out);
                }
            }
            (RenameMode::Both, [from, to]) => {
                live.removed(from, None, &mut out);
                live.created(to, fs.is_dir(to), fs, &mut out);
            }
            (_, paths) => {
                for path in paths {
                    if fs.exists(path) {
                        live.created(path, fs.is_dir(path), fs, &mut out);
                    } else {
                        live.removed(path, None, &mut out);
                    }
                }
            }
        },
        NotifyKind::Modify(_) => {
            for path in &event.paths {
                live.changed(path, fs, &mut out);
            }
        }
        NotifyKind::Remove(RemoveKind::File) => {
            for path in &event.paths {
                live.removed(path, Some(false), &mut out);
            }
        }
        NotifyKind::Remove(RemoveKind::Folder) => {
            for path in &event.paths {
                live.removed(path, Some(true), &mut out);
            }
        }
        NotifyKind::Remove(_) => {
            for path in &event.paths {
                live.removed(path, None, &mut out);
            }
        }
        NotifyKind::Access(_) | NotifyKind::Any | NotifyKind::Other => {}
    }

    out
}

fn handle_notify(
    res: notify::Result<Event>,
    live: &Mutex<LiveSet>,
    fs: &dyn FileSystem,
    tx: &BackendEventSender,
) {
    match res {
        Ok(event) => {
            let _ = tx.send(BackendEvent::Raw(format!("{:?} {:?}", event.kind, event.paths)));

            let Ok(mut live) = live.lock() else {
                return;
            };
            for (kind, path) in classify(&event, fs, &mut live) {
                if tx.send(BackendEvent::Path { kind, path }).is_err() {
                    return;
                }
            }
        }
        Err(err) => {
            let _ = tx.send(BackendEvent::Error(err.into()));
        }
    }
}

/// [`WatchBackend`] using the platform's recommended `notify` watcher.
///
/// Dropping (or closing) the backend stops file watching.
pub struct NotifyBackend {
    fs: Arc<dyn FileSystem>,
    live: Arc<Mutex<LiveSet>>,
    watcher: Option<RecommendedWatcher>,
    roots: Vec<PathBuf>,
    cwd: PathBuf,
    ignore_initial: bool,
    events: Option<BackendEventSender>,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend")
            .field("roots", &self.roots)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl NotifyBackend {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            live: Arc::new(Mutex::new(LiveSet::default())),
            watcher: None,
            roots: Vec::new(),
            cwd: PathBuf::new(),
            ignore_initial: true,
            events: None,
        }
    }

    /// Directories currently handed to notify.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, LiveSet> {
        // Poisoned only if the notify callback panicked mid-update.
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bring the notify watch list in line with the live pattern set.
    fn sync_roots(&mut self) -> Result<()> {
        let desired = self.lock_live().roots(self.fs.as_ref(), &self.cwd);
        let Some(watcher) = self.watcher.as_mut() else {
            return Ok(());
        };

        for root in self.roots.iter().filter(|r| !desired.contains(r)) {
            if let Err(err) = watcher.unwatch(root) {
                debug!(?root, error = %err, "unwatch failed");
            }
        }
        for root in desired.iter().filter(|r| !self.roots.contains(r)) {
            watcher.watch(root, RecursiveMode::Recursive)?;
            info!("file watcher started on {:?}", root);
        }

        self.roots = desired;
        Ok(())
    }

    /// Scan `patterns`' roots and report unknown entries unless
    /// `ignore_initial` is set.
    fn scan(&self, patterns: &[String]) -> Result<()> {
        let scope = LiveSet {
            filter: PathFilter::build(patterns, &self.cwd)?,
            ..LiveSet::default()
        };
        let scan_roots = scope.roots(self.fs.as_ref(), &self.cwd);

        let mut found = Vec::new();
        {
            let mut live = self.lock_live();
            for root in &scan_roots {
                found.extend(live.scan(self.fs.as_ref(), root));
            }
        }
        debug!(entries = found.len(), "initial scan complete");

        if self.ignore_initial {
            return Ok(());
        }
        if let Some(tx) = &self.events {
            for (kind, path) in found {
                let _ = tx.send(BackendEvent::Path { kind, path });
            }
        }
        Ok(())
    }
}

impl WatchBackend for NotifyBackend {
    fn start(
        &mut self,
        patterns: &[String],
        opts: &WatchOptions,
        events: BackendEventSender,
    ) -> Result<()> {
        let cwd = opts.effective_cwd();
        self.cwd = if cwd.is_absolute() {
            cwd
        } else {
            normalize_lexically(&std::env::current_dir()?.join(cwd))
        };
        self.ignore_initial = opts.ignore_initial;
        {
            let mut live = self.lock_live();
            live.window = opts.read_delay().max(Duration::from_millis(COALESCE_WINDOW_MS));
            live.rebuild(patterns.to_vec(), &self.cwd)?;
        }

        let watcher = RecommendedWatcher::new(
            {
                let live = Arc::clone(&self.live);
                let fs = Arc::clone(&self.fs);
                let tx = events.clone();
                move |res: notify::Result<Event>| handle_notify(res, &live, fs.as_ref(), &tx)
            },
            notify::Config::default(),
        )?;
        self.watcher = Some(watcher);
        self.events = Some(events);

        self.sync_roots()?;
        self.scan(patterns)?;

        if let Some(tx) = &self.events {
            let _ = tx.send(BackendEvent::Ready);
        }
        Ok(())
    }

    fn add(&mut self, patterns: &[String]) -> Result<()> {
        {
            let mut live = self.lock_live();
            let mut all = live.patterns.clone();
            all.extend(patterns.iter().cloned());
            live.rebuild(all, &self.cwd)?;
        }
        self.sync_roots()?;
        self.scan(patterns)
    }

    fn unwatch(&mut self, patterns: &[String]) -> Result<()> {
        {
            let mut live = self.lock_live();
            let remaining: Vec<String> = live
                .patterns
                .iter()
                .filter(|p| !patterns.contains(p))
                .cloned()
                .collect();
            if remaining.len() == live.patterns.len() {
                warn!(?patterns, "unwatch: none of these patterns were being watched");
            }
            live.rebuild(remaining, &self.cwd)?;
        }
        self.sync_roots()
    }

    fn close(&mut self) -> Result<()> {
        if self.watcher.take().is_some() {
            info!("file watcher closed");
        }
        self.events = None;
        self.roots.clear();
        Ok(())
    }
}
