use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use globwatch::cli::CliArgs;
use globwatch::config::{DEFAULT_READ_DELAY_MS, load_and_validate};
use globwatch::{EventKind, GlobInput, GlobwatchError, load_config};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<(tempfile::TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Globwatch.toml");
    fs::write(&path, contents)?;
    Ok((dir, path))
}

#[test]
fn demo_config_loads() -> TestResult {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest_dir.join("demos/Globwatch.toml"))?;

    assert_eq!(
        cfg.globs,
        GlobInput::List(vec!["src/**/*.rs".into(), "!src/**/generated/**".into()])
    );
    assert_eq!(cfg.options.read_delay, 25);
    assert!(cfg.options.verbose);
    assert_eq!(cfg.options.name.as_deref(), Some("demo"));

    Ok(())
}

#[test]
fn options_default_when_section_is_missing() -> TestResult {
    let (_dir, path) = write_config("globs = \"*.md\"\n")?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.globs, GlobInput::Single("*.md".into()));
    assert_eq!(
        cfg.options.events,
        vec![EventKind::Add, EventKind::Change, EventKind::Unlink]
    );
    assert!(cfg.options.ignore_initial);
    assert_eq!(cfg.options.read_delay, DEFAULT_READ_DELAY_MS);
    assert!(!cfg.options.verbose);
    assert!(cfg.options.base.is_none());

    Ok(())
}

#[test]
fn event_names_accept_camel_case() -> TestResult {
    let (_dir, path) = write_config(
        "globs = [\"a/**\"]\n[options]\nevents = [\"addDir\", \"unlinkDir\"]\n",
    )?;
    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.options.events, vec![EventKind::AddDir, EventKind::UnlinkDir]);
    Ok(())
}

#[test]
fn missing_or_mistyped_globs_are_invalid_arguments() -> TestResult {
    for contents in ["[options]\nverbose = true\n", "globs = 7\n", "globs = { a = 1 }\n"] {
        let (_dir, path) = write_config(contents)?;
        let err = load_and_validate(&path).unwrap_err();
        assert!(
            matches!(err, GlobwatchError::InvalidArgument(_)),
            "{contents:?} gave {err:?}"
        );
    }
    Ok(())
}

#[test]
fn duplicate_events_are_config_errors() -> TestResult {
    let (_dir, path) = write_config(
        "globs = \"*.md\"\n[options]\nevents = [\"add\", \"add\"]\n",
    )?;
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, GlobwatchError::ConfigError(_)));
    Ok(())
}

#[test]
fn unknown_event_names_fail_to_parse() -> TestResult {
    let (_dir, path) = write_config(
        "globs = \"*.md\"\n[options]\nevents = [\"rename\"]\n",
    )?;
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, GlobwatchError::TomlError(_)));
    Ok(())
}

#[test]
fn cli_globs_and_flags_override_the_file() -> TestResult {
    let (dir, path) = write_config(
        "globs = \"docs/*.md\"\n[options]\ncwd = \"site\"\nread_delay = 40\n",
    )?;

    let args = CliArgs::try_parse_from([
        "globwatch",
        "--config",
        path.to_str().unwrap(),
        "--events",
        "change,unlinkDir",
        "--include-initial",
        "src/**/*.js",
        "!src/vendor/**",
    ])?;
    let cfg = load_config(&args)?;

    assert_eq!(
        cfg.globs,
        GlobInput::List(vec!["src/**/*.js".into(), "!src/vendor/**".into()])
    );
    assert_eq!(cfg.options.cwd, Some(dir.path().join("site")));
    assert_eq!(cfg.options.events, vec![EventKind::Change, EventKind::UnlinkDir]);
    assert!(!cfg.options.ignore_initial);
    assert_eq!(cfg.options.read_delay, 40);

    Ok(())
}

#[test]
fn cli_read_delay_of_zero_is_kept() -> TestResult {
    let (_dir, path) = write_config("globs = \"*.md\"\n")?;
    let args = CliArgs::try_parse_from([
        "globwatch",
        "--config",
        path.to_str().unwrap(),
        "--read-delay",
        "0",
    ])?;

    let cfg = load_config(&args)?;
    assert_eq!(cfg.options.read_delay, 0);
    Ok(())
}

#[test]
fn record_lines_show_event_relative_path_and_size() {
    use globwatch::{FileRecord, describe_record};

    let changed = FileRecord::new("/p/src/a.js", "/p", "/p/src")
        .with_event(EventKind::Change)
        .with_contents("12345");
    assert_eq!(describe_record(&changed), "change    a.js (5 bytes)");

    let removed = FileRecord::new("/p/src/lib/b.js", "/p", "/p/src").with_event(EventKind::Unlink);
    assert_eq!(describe_record(&removed), "unlink    lib/b.js (no content)");
}
