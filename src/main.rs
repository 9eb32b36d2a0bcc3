use anyhow::{bail, Context};
use clap::Parser;
use codemin::batch::{self, Options};
use codemin::reporter::{format_analysis, format_issues, format_stats, format_totals};
use codemin::{load_minifiers, logging, Config, Language, Registry};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit code when `--check` finds problems.
const EXIT_ISSUES: u8 = 2;

#[derive(Parser)]
#[command(name = "codemin")]
#[command(about = "Minify CSS, HTML, JavaScript, JSON, XML, SQL, PHP and Python")]
#[command(version)]
struct Cli {
    /// Input files; reads stdin when none are given
    files: Vec<PathBuf>,

    /// Language of the input (css, html, js, json, xml, sql, php, python, universal)
    #[arg(short, long)]
    language: Option<Language>,

    /// Write the result here instead of stdout (single input only)
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Write `<name><suffix>.<ext>` files into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Validate only; exit with status 2 when issues are found
    #[arg(long)]
    check: bool,

    /// Remove comments but keep whitespace
    #[arg(long)]
    strip_comments: bool,

    /// Pretty-print instead of minifying (json, sql)
    #[arg(long, conflicts_with = "strip_comments")]
    prettify: bool,

    /// Print line, size and construct counts; write nothing
    #[arg(long)]
    analyze: bool,

    /// Print size statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Config file (default: search next to the binary, ./codemin.json, then
    /// $XDG_CONFIG_HOME/codemin/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self, config: &Config) -> Options {
        Options {
            strip_comments: self.strip_comments,
            prettify: self.prettify,
            check: self.check,
            analyze: self.analyze,
            max_input_size: config.max_input_size,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("codemin: error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(),
    };
    let registry = load_minifiers(&config);

    match cli.files.as_slice() {
        [] => run_single(cli, &config, &registry, None),
        [file] if cli.out_dir.is_none() => run_single(cli, &config, &registry, Some(file)),
        _ if cli.output.is_some() => bail!("--output needs exactly one input; use --out-dir"),
        files => run_batch(cli, &config, &registry, files),
    }
}

/// One text in, one text out: stdin or a single file, to stdout or `-o`.
fn run_single(
    cli: &Cli,
    config: &Config,
    registry: &Registry,
    file: Option<&PathBuf>,
) -> anyhow::Result<ExitCode> {
    let (label, source, inferred) = match file {
        Some(path) => (
            path.display().to_string(),
            batch::read_source(path, config.max_input_size)?,
            config.language_for(path),
        ),
        None => (
            "<stdin>".to_string(),
            batch::read_limited(io::stdin().lock(), config.max_input_size, Path::new("<stdin>"))?,
            None,
        ),
    };
    let language = match cli.language.or(inferred) {
        Some(language) => language,
        None if file.is_none() => {
            tracing::info!("no --language given, using universal");
            Language::Universal
        }
        None => return Err(codemin::CodeminError::UnsupportedLanguage(label).into()),
    };

    let options = cli.options(config);
    let outcome = batch::transform(&source, registry.get(language), &options)?;

    if let Some(analysis) = &outcome.analysis {
        println!("{}", format_analysis(&label, analysis));
    }
    if cli.check || cli.analyze {
        if !outcome.issues.is_empty() {
            eprint!("{}", format_issues(&label, &outcome.issues));
            return Ok(ExitCode::from(EXIT_ISSUES));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let result = outcome.result;

    match &cli.output {
        Some(path) => batch::write_atomic(path, &result.output)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(result.output.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write stdout")?;
        }
    }
    if cli.stats {
        eprintln!("{}", format_stats(&label, &result));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_batch(
    cli: &Cli,
    config: &Config,
    registry: &Registry,
    files: &[PathBuf],
) -> anyhow::Result<ExitCode> {
    if let Some(dir) = &cli.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }
    let jobs = batch::plan(files, cli.language, config, cli.out_dir.as_deref())?;
    let reports = batch::run(jobs, registry, &cli.options(config), config.batch.threads);

    let mut failed = false;
    let mut with_issues = false;
    let mut done = Vec::new();
    for report in &reports {
        match report {
            Ok(report) => {
                let label = report.job.input.display().to_string();
                if !report.issues.is_empty() {
                    with_issues = true;
                    eprint!("{}", format_issues(&label, &report.issues));
                }
                if let Some(analysis) = &report.analysis {
                    println!("{}", format_analysis(&label, analysis));
                }
                if cli.stats && !cli.check && !cli.analyze {
                    eprintln!("{}", format_stats(&label, &report.result));
                }
                done.push(&report.result);
            }
            Err(e) => {
                failed = true;
                eprintln!("codemin: error: {}", e);
            }
        }
    }
    if cli.stats && !cli.check && !cli.analyze && done.len() > 1 {
        eprintln!("{}", format_totals(&done));
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else if with_issues {
        ExitCode::from(EXIT_ISSUES)
    } else {
        ExitCode::SUCCESS
    })
}
