use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use multireplace::config::load_from_path;
use multireplace::{Automaton, AutomatonBuilder, PatternSet};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Unchanged lines shown around each change in `--diff` output.
const DIFF_CONTEXT: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "multireplace")]
#[command(about = "Replace many strings at once, in files or from stdin to stdout", long_about = None)]
#[command(version)]
struct Cli {
    /// Replacement pairs: FROM TO [FROM TO ...]
    ///
    /// FROM may use \b (word boundary), \^ (start of line) and \$ (end of line).
    #[arg(value_name = "FROM TO")]
    pairs: Vec<String>,

    /// Files to rewrite in place (stdin to stdout if none)
    #[arg(last = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// TOML rules file, applied before pairs given on the command line
    #[arg(short = 'f', long = "rules", value_name = "FILE")]
    rules: Vec<PathBuf>,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    silent: bool,

    /// More output (repeat for debug logging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Show what would change without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Descend into directories
    #[arg(short, long)]
    recursive: bool,
}

/// Per-run counters for the summary line.
#[derive(Debug, Default)]
struct Totals {
    converted: usize,
    unchanged: usize,
    failed: usize,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(&cli);

    let automaton = match build_automaton(&cli) {
        Ok(automaton) => automaton,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            return ExitCode::from(1);
        }
    };

    if cli.files.is_empty() {
        return match rewrite_stdin(&automaton) {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{} {:#}", "error:".red().bold(), err);
                ExitCode::from(2)
            }
        };
    }

    let totals = rewrite_files(&cli, &automaton);
    if totals.failed > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn init_tracing(cli: &Cli) {
    let level = if cli.silent {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// Rules files first, then command-line pairs, all in one pattern set.
fn build_automaton(cli: &Cli) -> Result<Automaton> {
    if cli.pairs.len() % 2 != 0 {
        anyhow::bail!(
            "replacement pairs must come in FROM TO pairs (got {} arguments)",
            cli.pairs.len()
        );
    }

    let mut patterns = PatternSet::new();
    let mut configs = Vec::with_capacity(cli.rules.len());
    for path in &cli.rules {
        configs.push(load_from_path(path)?);
    }

    // The last file that sets word_end_chars decides.
    if let Some(config) = configs
        .iter()
        .rev()
        .find(|c| c.options.word_end_chars.is_some())
    {
        patterns = config.pattern_set();
    }
    for config in &configs {
        config.add_to(&mut patterns)?;
    }

    for pair in cli.pairs.chunks_exact(2) {
        patterns.add(&pair[0], &pair[1])?;
    }

    tracing::info!(patterns = patterns.len(), "compiling");
    Ok(AutomatonBuilder::new(&patterns).build()?)
}

fn rewrite_stdin(automaton: &Automaton) -> Result<bool> {
    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    automaton
        .transform(stdin, stdout)
        .context("failed to rewrite stdin")
}

fn rewrite_files(cli: &Cli, automaton: &Automaton) -> Totals {
    let mut totals = Totals::default();

    for path in &cli.files {
        for file in expand_path(path, cli.recursive) {
            let result = file.and_then(|file| {
                let changed = rewrite_file(cli, automaton, &file)?;
                Ok((file, changed))
            });

            match result {
                Ok((file, true)) => {
                    totals.converted += 1;
                    if !cli.silent {
                        let verb = if cli.dry_run { "would convert" } else { "converted" };
                        println!("{} {}: {}", "✓".green(), file.display(), verb);
                    }
                }
                Ok((file, false)) => {
                    totals.unchanged += 1;
                    if cli.verbose > 0 {
                        println!("{}", format!("  {}: unchanged", file.display()).dimmed());
                    }
                }
                Err(err) => {
                    totals.failed += 1;
                    eprintln!("{} {:#}", "✗".red(), err);
                }
            }
        }
    }

    if cli.verbose > 0 {
        println!("{}", "Summary:".bold());
        println!("  {} converted", format!("{}", totals.converted).green());
        println!("  {} unchanged", format!("{}", totals.unchanged).yellow());
        println!("  {} failed", format!("{}", totals.failed).red());
    }

    totals
}

/// A single file, or every file below a directory when `recursive` is set.
fn expand_path(path: &Path, recursive: bool) -> Vec<Result<PathBuf>> {
    if !path.is_dir() {
        return vec![Ok(path.to_path_buf())];
    }
    if !recursive {
        return vec![Err(anyhow::anyhow!(
            "{}: is a directory (use --recursive)",
            path.display()
        ))];
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(Ok(entry.into_path())),
            Ok(_) => {}
            Err(err) => files.push(Err(err.into())),
        }
    }
    files
}

fn rewrite_file(cli: &Cli, automaton: &Automaton, file: &Path) -> Result<bool> {
    if !cli.dry_run && !cli.diff {
        return Ok(automaton.transform_file(file)?);
    }

    let original =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let replaced = automaton.replace_bytes(&original);

    if cli.diff && replaced.changed {
        display_diff(
            file,
            &String::from_utf8_lossy(&original),
            &String::from_utf8_lossy(&replaced.output),
        );
    }

    if cli.dry_run {
        return Ok(replaced.changed);
    }
    Ok(automaton.transform_file(file)?)
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- a/{}", file.display()).dimmed());
    println!("{}", format!("+++ b/{}", file.display()).dimmed());

    for line in diff_hunks(original, modified) {
        let line = match line.as_bytes().first() {
            Some(b'@') => line.cyan(),
            Some(b'-') => line.red(),
            Some(b'+') => line.green(),
            _ => line.normal(),
        };
        println!("{line}");
    }
}

/// Changed lines grouped into unified-diff hunks with a little context.
fn diff_hunks(original: &str, modified: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(original, modified);
    let mut lines = Vec::new();

    for group in diff.grouped_ops(DIFF_CONTEXT) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old = first.old_range().start..last.old_range().end;
        let new = first.new_range().start..last.new_range().end;
        lines.push(format!(
            "@@ -{},{} +{},{} @@",
            old.start + 1,
            old.len(),
            new.start + 1,
            new.len()
        ));

        for op in &group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let text = change.value();
                lines.push(format!("{sign}{}", text.strip_suffix('\n').unwrap_or(text)));
                if change.missing_newline() {
                    lines.push("\\ No newline at end of file".to_string());
                }
            }
        }
    }
    lines
}
