// src/watch/correlate.rs

//! Mapping raw event paths back onto the pattern that produced them.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::Result;
use crate::glob::base::glob_base;
use crate::glob::normalize::{NEGATION, is_negated};
use crate::types::EventKind;
use crate::watch::path_utils::{normalize_lexically, relative_str, slash_string};

/// Result of a successful correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    /// Position of the matching pattern in the correlator's list.
    pub index: usize,
    /// The matching pattern, as resolved.
    pub pattern: String,
    /// The path (the raw one or one of its ancestors) that matched.
    pub matched: PathBuf,
}

/// Compiled, ordered pattern list.
///
/// Positive and negated patterns are compiled into two `GlobSet`s so each
/// candidate path is tested with one batched call per set. `GlobSet`
/// reports indices in insertion order, which is the list order, so the
/// lowest index is the first matching pattern.
#[derive(Clone)]
pub struct Correlator {
    patterns: Vec<String>,
    cwd: Option<PathBuf>,
    positive: GlobSet,
    /// `positive` set index -> `patterns` index.
    positive_idx: Vec<usize>,
    negative: GlobSet,
    /// Absolute base of every positive pattern, in list order.
    dir_bases: Vec<(usize, PathBuf)>,
}

impl fmt::Debug for Correlator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correlator")
            .field("patterns", &self.patterns)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl Correlator {
    /// Compile `patterns` (already resolved).
    ///
    /// `cwd` must be the configured `cwd` option: when set, patterns are
    /// relative and raw paths are relativized against it before matching.
    pub fn new(patterns: Vec<String>, cwd: Option<PathBuf>) -> Result<Self> {
        let cwd = cwd.map(|cwd| {
            if cwd.is_absolute() {
                cwd
            } else {
                normalize_lexically(&std::env::current_dir().unwrap_or_default().join(cwd))
            }
        });
        let compiled = compile(&patterns, cwd.as_deref())?;
        Ok(Self {
            patterns,
            cwd,
            positive: compiled.positive,
            positive_idx: compiled.positive_idx,
            negative: compiled.negative,
            dir_bases: compiled.dir_bases,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Append patterns and recompile. On error the correlator is unchanged.
    pub fn extend<I>(&mut self, more: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut patterns = self.patterns.clone();
        patterns.extend(more);
        let compiled = compile(&patterns, self.cwd.as_deref())?;

        self.patterns = patterns;
        self.positive = compiled.positive;
        self.positive_idx = compiled.positive_idx;
        self.negative = compiled.negative;
        self.dir_bases = compiled.dir_bases;
        Ok(())
    }

    /// Index of the first positive pattern matching `candidate`, unless a
    /// negated pattern matches it.
    pub fn first_match(&self, candidate: &Path) -> Option<usize> {
        let forms = self.candidate_forms(candidate);
        if self.is_excluded(&forms) {
            return None;
        }

        forms
            .iter()
            .filter_map(|form| self.positive.matches(form).into_iter().next())
            .map(|set_idx| self.positive_idx[set_idx])
            .min()
    }

    /// Find the pattern owning `path`, climbing to parent directories until
    /// one matches or the root is passed.
    pub fn correlate(&self, path: &Path) -> Option<Correlation> {
        path.ancestors()
            .filter(|candidate| !candidate.as_os_str().is_empty())
            .find_map(|candidate| {
                self.first_match(candidate).map(|index| Correlation {
                    index,
                    pattern: self.patterns[index].clone(),
                    matched: candidate.to_path_buf(),
                })
            })
    }

    /// Directory rule: a directory belongs to the first positive pattern
    /// whose base lies strictly above it, unless a negated pattern matches
    /// the directory. The notify backend reports directories by the same
    /// rule (see [`below_base`]).
    pub fn correlate_dir(&self, path: &Path) -> Option<Correlation> {
        let path = match &self.cwd {
            Some(cwd) if path.is_relative() => normalize_lexically(&cwd.join(path)),
            _ => path.to_path_buf(),
        };
        if self.is_excluded(&self.candidate_forms(&path)) {
            return None;
        }

        self.dir_bases
            .iter()
            .find(|(_, base)| below_base(&path, base))
            .map(|(index, _)| Correlation {
                index: *index,
                pattern: self.patterns[*index].clone(),
                matched: path.clone(),
            })
    }

    /// [`Correlator::correlate`], falling back to the directory rule for
    /// `addDir` / `unlinkDir`.
    pub fn correlate_event(&self, kind: EventKind, path: &Path) -> Option<Correlation> {
        self.correlate(path).or_else(|| {
            if kind.is_dir() {
                self.correlate_dir(path)
            } else {
                None
            }
        })
    }

    fn is_excluded(&self, forms: &[String]) -> bool {
        forms.iter().any(|form| self.negative.is_match(form))
    }

    /// Strings to test for `candidate`: its slash form, plus its
    /// cwd-relative form when a cwd is configured.
    fn candidate_forms(&self, candidate: &Path) -> Vec<String> {
        let mut forms = vec![slash_string(candidate)];
        if let Some(cwd) = &self.cwd {
            if candidate.is_absolute() {
                if let Some(rel) = relative_str(cwd, candidate) {
                    if !rel.is_empty() {
                        forms.push(rel);
                    }
                }
            }
        }
        forms
    }
}

/// Compile a single pattern the way all matching in this crate expects:
/// `*` and `?` never cross a `/`.
pub fn compile_glob(pattern: &str) -> Result<Glob> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}

/// Whether a directory at `path` is reported for a pattern based at `base`:
/// strictly inside it, never the base itself.
pub fn below_base(path: &Path, base: &Path) -> bool {
    path != base && path.starts_with(base)
}

/// Absolute base directory of a resolved positive pattern.
pub fn absolute_base(pattern: &str, cwd: Option<&Path>) -> PathBuf {
    let base = glob_base(pattern);
    match cwd {
        Some(cwd) if base.is_relative() => normalize_lexically(&cwd.join(base)),
        _ => base,
    }
}

struct Compiled {
    positive: GlobSet,
    positive_idx: Vec<usize>,
    negative: GlobSet,
    dir_bases: Vec<(usize, PathBuf)>,
}

fn compile(patterns: &[String], cwd: Option<&Path>) -> Result<Compiled> {
    let mut positive = GlobSetBuilder::new();
    let mut positive_idx = Vec::new();
    let mut negative = GlobSetBuilder::new();
    let mut dir_bases = Vec::new();

    for (idx, pattern) in patterns.iter().enumerate() {
        if is_negated(pattern) {
            negative.add(compile_glob(pattern.strip_prefix(NEGATION).unwrap_or(pattern))?);
        } else {
            positive.add(compile_glob(pattern)?);
            positive_idx.push(idx);
            dir_bases.push((idx, absolute_base(pattern, cwd)));
        }
    }

    Ok(Compiled {
        positive: positive.build()?,
        positive_idx,
        negative: negative.build()?,
        dir_bases,
    })
}
