//! Minifying many files at once.
//!
//! Jobs run on a rayon pool; each job reads its input under the size limit,
//! runs the minifier, and writes the result through a temp file that is
//! renamed into place so readers never see a half-written output.

use crate::config::Config;
use crate::error::{CodeminError, Result};
use crate::languages::{Analysis, Issue, Language, Minifier, Registry};
use crate::pipeline::MinifyResult;
use rayon::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub strip_comments: bool,
    /// Lay the text out for reading instead of minifying it.
    pub prettify: bool,
    /// Validate only; nothing is written.
    pub check: bool,
    /// Report sizes and counts only; nothing is written.
    pub analyze: bool,
    pub max_input_size: u64,
}

impl Options {
    fn writes(&self) -> bool {
        !self.check && !self.analyze
    }
}

/// What [`transform`] produced for one text.
#[derive(Debug)]
pub struct Outcome {
    pub result: MinifyResult,
    pub issues: Vec<Issue>,
    pub analysis: Option<Analysis>,
}

#[derive(Debug)]
pub struct FileReport {
    pub job: Job,
    pub result: MinifyResult,
    pub issues: Vec<Issue>,
    pub analysis: Option<Analysis>,
}

/// `<stem><suffix>.<ext>` in `out_dir`, or next to the input.
pub fn output_path(input: &Path, out_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Resolves a language and an output path for every input.
pub fn plan(
    inputs: &[PathBuf],
    forced: Option<Language>,
    config: &Config,
    out_dir: Option<&Path>,
) -> Result<Vec<Job>> {
    inputs
        .iter()
        .map(|input| {
            let language = forced
                .or_else(|| config.language_for(input))
                .ok_or_else(|| CodeminError::UnsupportedLanguage(input.display().to_string()))?;
            Ok(Job {
                input: input.clone(),
                output: output_path(input, out_dir, &config.batch.suffix),
                language,
            })
        })
        .collect()
}

/// Reads at most `limit` bytes. Reaching the limit is an error rather than a
/// silent truncation.
pub fn read_limited<R: Read>(reader: R, limit: u64, path: &Path) -> Result<String> {
    let mut content = String::new();
    let bytes_read = reader
        .take(limit)
        .read_to_string(&mut content)
        .map_err(|source| CodeminError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if bytes_read as u64 == limit {
        return Err(CodeminError::InputTooLarge { limit });
    }
    Ok(content)
}

pub fn read_source(path: &Path, limit: u64) -> Result<String> {
    let file = fs::File::open(path).map_err(|source| CodeminError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    read_limited(file, limit, path)
}

/// Writes `contents` to a temp file beside `path`, then renames it over
/// `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let write_err = |source| CodeminError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Minifies, strips or prettifies one text, validating and analysing it
/// when asked. Only prettifying can fail.
pub fn transform(source: &str, minifier: &Minifier, options: &Options) -> Result<Outcome> {
    let issues = if options.check {
        minifier.validate(source)
    } else {
        Vec::new()
    };
    let analysis = options.analyze.then(|| minifier.analyze(source));
    let rewritten = |output: String| MinifyResult {
        language: minifier.language,
        original_len: source.len(),
        minified_len: output.len(),
        output,
        unclosed: None,
    };
    let result = if options.prettify {
        rewritten(minifier.prettify(source)?)
    } else if options.strip_comments {
        rewritten(minifier.strip_comments(source))
    } else {
        minifier.minify_with_stats(source)
    };
    Ok(Outcome {
        result,
        issues,
        analysis,
    })
}

pub fn process(job: Job, registry: &Registry, options: &Options) -> Result<FileReport> {
    let source = read_source(&job.input, options.max_input_size)?;
    let Outcome {
        result,
        issues,
        analysis,
    } = transform(&source, registry.get(job.language), options)?;
    if options.writes() {
        write_atomic(&job.output, &result.output)?;
    }
    tracing::info!(
        input = %job.input.display(),
        output = %job.output.display(),
        saved = result.saved(),
        "processed"
    );
    Ok(FileReport {
        job,
        result,
        issues,
        analysis,
    })
}

/// Runs every job, in parallel when a pool can be built. Results keep the
/// order of `jobs`.
pub fn run(
    jobs: Vec<Job>,
    registry: &Registry,
    options: &Options,
    threads: usize,
) -> Vec<Result<FileReport>> {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("codemin-{}", i))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!("failed to create thread pool: {}; processing sequentially", e);
            return jobs
                .into_iter()
                .map(|job| process(job, registry, options))
                .collect();
        }
    };

    pool.install(|| {
        jobs.into_par_iter()
            .map(|job| process(job, registry, options))
            .collect()
    })
}
