// tests/stream_fake_backend.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use globwatch::fs::mock::MockFileSystem;
use globwatch::logging::Style;
use globwatch::{
    Collaborators, EventKind, FileRecord, GlobInput, GlobwatchError, StreamEvent, WatchOptions,
    WatchStream, watch_with,
};
use globwatch_test_utils::builders::WatchOptionsBuilder;
use globwatch_test_utils::fake_backend::FakeBackend;
use globwatch_test_utils::recorders::{RecordingCallback, RecordingLogger};
use globwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    stream: WatchStream,
    backend: FakeBackend,
    fs: MockFileSystem,
    logger: RecordingLogger,
    callback: RecordingCallback,
}

fn start(globs: impl Into<GlobInput>, options: WatchOptions) -> Result<Harness, GlobwatchError> {
    init_tracing();

    let backend = FakeBackend::new();
    let fs = MockFileSystem::new();
    let logger = RecordingLogger::new();
    let callback = RecordingCallback::new();

    let collaborators = Collaborators::with_backend(backend.clone())
        .fs(Arc::new(fs.clone()))
        .logger(Arc::new(logger.clone()))
        .callback(callback.callback());

    let stream = watch_with(globs, options, collaborators)?;
    Ok(Harness {
        stream,
        backend,
        fs,
        logger,
        callback,
    })
}

fn start_err(globs: impl Into<GlobInput>, options: WatchOptions) -> GlobwatchError {
    match start(globs, options) {
        Ok(_) => panic!("expected watch to fail"),
        Err(err) => err,
    }
}

async fn next_record(stream: &mut WatchStream) -> FileRecord {
    with_timeout(stream.recv_record())
        .await
        .expect("stream ended before a record arrived")
}

#[tokio::test]
async fn add_event_yields_a_record_with_inferred_base() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;
    h.fs.add_file("/proj/src/a.js", "console.log(1)");

    h.backend.emit(EventKind::Add, "/proj/src/a.js");
    let record = next_record(&mut h.stream).await;

    assert_eq!(record.event, Some(EventKind::Add));
    assert_eq!(record.path, PathBuf::from("/proj/src/a.js"));
    assert_eq!(record.base, PathBuf::from("/proj/src"));
    assert_eq!(record.relative(), PathBuf::from("a.js"));
    assert_eq!(record.contents.as_deref(), Some("console.log(1)".as_bytes()));
    assert!(record.stat.is_some());

    Ok(())
}

#[tokio::test]
async fn forced_base_overrides_inference() -> TestResult {
    let opts = WatchOptionsBuilder::new().cwd("/proj").base("/proj").build();
    let mut h = start("src/**/*.js", opts)?;
    h.fs.add_file("/proj/src/lib/b.js", "b");

    h.backend.emit(EventKind::Change, "/proj/src/lib/b.js");
    let record = next_record(&mut h.stream).await;

    assert_eq!(record.base, PathBuf::from("/proj"));
    assert_eq!(record.relative(), PathBuf::from("src/lib/b.js"));

    Ok(())
}

#[tokio::test]
async fn unlink_is_emitted_without_waiting_for_read_delay() -> TestResult {
    let opts = WatchOptionsBuilder::new().cwd("/proj").read_delay(60_000).build();
    let mut h = start("src/**/*.js", opts)?;

    let started = Instant::now();
    h.backend.emit(EventKind::Unlink, "/proj/src/gone.js");
    let record = tokio::time::timeout(Duration::from_secs(1), h.stream.recv_record())
        .await?
        .expect("record");

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(record.event, Some(EventKind::Unlink));
    assert!(record.contents.is_none());
    assert!(record.stat.is_none());

    Ok(())
}

#[tokio::test]
async fn changes_are_read_no_earlier_than_read_delay() -> TestResult {
    let opts = WatchOptionsBuilder::new().cwd("/proj").read_delay(80).build();
    let mut h = start("src/**/*.js", opts)?;
    h.fs.add_file("/proj/src/a.js", "a");

    let started = Instant::now();
    h.backend.emit(EventKind::Change, "/proj/src/a.js");
    next_record(&mut h.stream).await;

    assert!(started.elapsed() >= Duration::from_millis(80));
    Ok(())
}

#[tokio::test]
async fn callback_sees_each_record_exactly_once() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;
    h.fs.add_file("/proj/src/a.js", "a");

    h.backend.emit(EventKind::Change, "/proj/src/a.js");
    let first = next_record(&mut h.stream).await;
    h.backend.emit(EventKind::Unlink, "/proj/src/a.js");
    let second = next_record(&mut h.stream).await;

    assert_eq!(h.callback.records(), vec![first, second]);
    Ok(())
}

#[tokio::test]
async fn unsubscribed_kinds_are_mirrored_but_not_recorded() -> TestResult {
    let opts = WatchOptionsBuilder::new()
        .cwd("/proj")
        .events(&[EventKind::Change])
        .build();
    let mut h = start("src/**/*.js", opts)?;
    h.fs.add_file("/proj/src/a.js", "a");
    h.fs.add_file("/proj/src/b.js", "b");

    h.backend.emit(EventKind::Add, "/proj/src/a.js");
    h.backend.emit(EventKind::Change, "/proj/src/b.js");

    let mut mirrored = Vec::new();
    let record = with_timeout(async {
        loop {
            match h.stream.recv().await {
                Some(StreamEvent::Watcher { kind, path }) => mirrored.push((kind, path)),
                Some(StreamEvent::Data(record)) => break record,
                Some(_) => {}
                None => panic!("stream ended"),
            }
        }
    })
    .await;

    assert_eq!(record.path, PathBuf::from("/proj/src/b.js"));
    assert_eq!(record.event, Some(EventKind::Change));
    assert_eq!(
        mirrored,
        vec![
            (EventKind::Add, PathBuf::from("/proj/src/a.js")),
            (EventKind::Change, PathBuf::from("/proj/src/b.js")),
        ]
    );
    assert_eq!(h.callback.records().len(), 1);

    Ok(())
}

#[tokio::test]
async fn verbose_mode_logs_one_line_per_record() -> TestResult {
    let opts = WatchOptionsBuilder::new()
        .cwd("/proj")
        .verbose(Some("app"))
        .build();
    let mut h = start("src/**/*.js", opts)?;
    h.fs.add_file("/proj/src/a.js", "a");

    h.backend.emit(EventKind::Change, "/proj/src/a.js");
    next_record(&mut h.stream).await;
    h.backend.emit(EventKind::Add, "/proj/src/a.js");
    next_record(&mut h.stream).await;

    assert_eq!(
        h.logger.infos(),
        vec![
            "app saw a.js was changed".to_string(),
            "app saw a.js was added".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn verbose_without_name_omits_the_subject() -> TestResult {
    let opts = WatchOptionsBuilder::new().cwd("/proj").verbose(None).build();
    let mut h = start("src/**/*.js", opts)?;

    h.backend.emit(EventKind::Unlink, "/proj/src/a.js");
    next_record(&mut h.stream).await;

    assert_eq!(h.logger.infos(), vec!["a.js was unlinked".to_string()]);
    Ok(())
}

#[tokio::test]
async fn quiet_mode_logs_nothing_per_record() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;

    h.backend.emit(EventKind::Unlink, "/proj/src/a.js");
    next_record(&mut h.stream).await;

    assert!(h.logger.infos().is_empty());
    Ok(())
}

#[tokio::test]
async fn unclaimed_paths_log_a_diagnostic_and_produce_no_record() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;

    h.backend.emit(EventKind::Unlink, "/elsewhere/x.txt");
    h.backend.emit(EventKind::Unlink, "/proj/src/a.js");

    let record = next_record(&mut h.stream).await;
    assert_eq!(record.path, PathBuf::from("/proj/src/a.js"));

    let warnings = h.logger.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Filepath: /elsewhere/x.txt"), "{}", warnings[0]);
    assert!(warnings[0].contains("src/**/*.js"), "{}", warnings[0]);
    assert!(warnings[0].contains("Options:"), "{}", warnings[0]);
    assert!(warnings[0].contains("cwd = \"/proj\""), "{}", warnings[0]);
    assert_eq!(h.callback.records().len(), 1);

    let segments = &h.logger.warning_segments()[0];
    assert_eq!(segments[0].style, Style::Cyan);
    assert_eq!(segments[0].text, "[globwatch]");
    assert_eq!(segments[1].style, Style::Yellow);

    Ok(())
}

#[tokio::test]
async fn directories_below_a_pattern_base_are_claimed_by_that_pattern() -> TestResult {
    let options = WatchOptionsBuilder::new()
        .cwd("/proj")
        .events(&[EventKind::AddDir, EventKind::UnlinkDir])
        .build();
    let mut h = start(["src/**/*.txt", "!src/skip/**"], options)?;
    h.fs.add_dir("/proj/src/nested/deeper");
    h.fs.add_dir("/proj/src/skip/inner");

    h.backend.emit(EventKind::AddDir, "/proj/src/skip/inner");
    h.backend.emit(EventKind::AddDir, "/proj/src/nested/deeper");

    let record = next_record(&mut h.stream).await;
    assert_eq!(record.path, PathBuf::from("/proj/src/nested/deeper"));
    assert_eq!(record.event, Some(EventKind::AddDir));
    assert_eq!(record.base, PathBuf::from("/proj/src"));
    assert_eq!(record.relative(), PathBuf::from("nested/deeper"));
    assert!(record.is_directory());

    h.backend.emit(EventKind::UnlinkDir, "/proj/src/nested/deeper");
    let record = next_record(&mut h.stream).await;
    assert_eq!(record.event, Some(EventKind::UnlinkDir));
    assert!(record.stat.is_none());

    // Only the negated directory went unclaimed.
    let warnings = h.logger.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Filepath: /proj/src/skip/inner"), "{}", warnings[0]);
    Ok(())
}

#[tokio::test]
async fn relative_cwd_is_resolved_against_the_process_directory() -> TestResult {
    let here = std::env::current_dir()?;
    let project = here.join("proj");
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("proj").build())?;
    h.fs.add_file(project.join("src/a.js"), "a");

    assert_eq!(h.stream.options().cwd.as_deref(), Some(project.as_path()));

    h.backend.emit(EventKind::Add, project.join("src/a.js"));
    let record = next_record(&mut h.stream).await;

    assert_eq!(record.path, project.join("src/a.js"));
    assert_eq!(record.base, project.join("src"));
    assert_eq!(record.cwd, project);
    assert_eq!(record.relative(), PathBuf::from("a.js"));
    Ok(())
}

#[tokio::test]
async fn read_failure_is_reported_and_the_stream_stays_open() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;
    h.fs.add_file("/proj/src/ok.js", "ok");

    h.backend.emit(EventKind::Change, "/proj/src/missing.js");

    let err = with_timeout(async {
        loop {
            match h.stream.recv().await {
                Some(StreamEvent::Error(err)) => break err,
                Some(StreamEvent::Data(record)) => panic!("unexpected record {record:?}"),
                Some(_) => {}
                None => panic!("stream ended"),
            }
        }
    })
    .await;
    assert!(matches!(err, GlobwatchError::FileRead { ref path, .. } if path == &PathBuf::from("/proj/src/missing.js")));

    h.backend.emit(EventKind::Change, "/proj/src/ok.js");
    let record = next_record(&mut h.stream).await;
    assert_eq!(record.path, PathBuf::from("/proj/src/ok.js"));

    Ok(())
}

#[tokio::test]
async fn backend_signals_are_forwarded() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;

    h.backend.raw("Create(File) [\"/proj/src/a.js\"]");
    h.backend.ready();
    h.backend.error("inotify limit reached");

    let mut names = Vec::new();
    for _ in 0..3 {
        let event = with_timeout(h.stream.recv()).await.expect("event");
        names.push(event.name());
    }
    assert_eq!(names, vec!["raw", "ready", "error"]);

    Ok(())
}

#[tokio::test]
async fn add_extends_watch_and_correlation() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;
    h.fs.add_file("/proj/lib/x.rs", "fn x() {}");

    h.stream.add("lib/**/*.rs")?;
    assert_eq!(h.backend.added(), vec!["lib/**/*.rs".to_string()]);
    assert_eq!(h.stream.patterns().len(), 2);

    h.backend.emit(EventKind::Add, "/proj/lib/x.rs");
    let record = next_record(&mut h.stream).await;
    assert_eq!(record.base, PathBuf::from("/proj/lib"));
    assert_eq!(record.relative(), PathBuf::from("x.rs"));

    Ok(())
}

#[tokio::test]
async fn add_rejects_invalid_globs() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;

    let err = h.stream.add("").unwrap_err();
    assert!(matches!(err, GlobwatchError::InvalidArgument(_)));
    assert!(h.backend.added().is_empty());

    Ok(())
}

#[tokio::test]
async fn unwatch_reaches_the_backend_but_keeps_correlating() -> TestResult {
    let mut h = start(
        ["src/**/*.js", "lib/**/*.rs"],
        WatchOptionsBuilder::new().cwd("/proj").build(),
    )?;

    h.stream.unwatch("lib/**/*.rs")?;
    assert_eq!(h.backend.unwatched(), vec!["lib/**/*.rs".to_string()]);
    assert_eq!(h.backend.live_patterns(), vec!["src/**/*.js".to_string()]);
    assert_eq!(h.stream.patterns().len(), 2);

    h.backend.emit(EventKind::Unlink, "/proj/lib/x.rs");
    let record = next_record(&mut h.stream).await;
    assert_eq!(record.base, PathBuf::from("/proj/lib"));
    assert!(h.logger.warnings().is_empty());

    Ok(())
}

#[tokio::test]
async fn write_passes_records_through() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;

    let injected = FileRecord::new("/proj/src/virtual.js", "/proj", "/proj/src").with_contents("v");
    h.stream.write(injected.clone())?;

    let record = next_record(&mut h.stream).await;
    assert_eq!(record, injected);
    assert_eq!(h.callback.records(), vec![injected]);

    Ok(())
}

#[tokio::test]
async fn close_ends_the_stream_and_stops_the_backend() -> TestResult {
    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;

    h.stream.close()?;
    assert!(h.backend.is_closed());

    let event = with_timeout(h.stream.recv()).await;
    assert!(matches!(event, Some(StreamEvent::End)));
    assert!(with_timeout(h.stream.recv()).await.is_none());

    h.backend.emit(EventKind::Unlink, "/proj/src/a.js");
    assert!(h.stream.try_recv().is_none());

    h.stream.close()?;
    let err = h.stream.write(FileRecord::new("/proj/a", "/proj", "/proj")).unwrap_err();
    assert!(matches!(err, GlobwatchError::StreamClosed));

    Ok(())
}

#[tokio::test]
async fn invalid_globs_fail_before_a_stream_exists() {
    let err = start_err("", WatchOptions::default());
    assert!(matches!(err, GlobwatchError::InvalidArgument(_)));

    let err = start_err(Vec::<String>::new(), WatchOptions::default());
    assert!(matches!(err, GlobwatchError::InvalidArgument(_)));
}

#[tokio::test]
async fn invalid_options_fail_before_a_stream_exists() {
    let opts = WatchOptionsBuilder::new().events(&[]).build();
    let err = start_err("src/*.js", opts);
    assert!(matches!(err, GlobwatchError::ConfigError(_)));
}

#[tokio::test]
async fn stream_trait_yields_the_same_events() -> TestResult {
    use futures::StreamExt;

    let mut h = start("src/**/*.js", WatchOptionsBuilder::new().cwd("/proj").build())?;
    h.backend.emit(EventKind::Unlink, "/proj/src/a.js");

    let names: Vec<&'static str> = with_timeout((&mut h.stream).take(2).map(|e| e.name()).collect()).await;
    assert_eq!(names, vec!["unlink", "data"]);

    Ok(())
}
