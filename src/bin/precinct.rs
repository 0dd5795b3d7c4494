// src/bin/precinct.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use walkdir::WalkDir;

use precinct_core::config::Config;
use precinct_core::parse::parse_unit;
use precinct_core::rules::{InvestigationOptions, Offense, Qualified, Registry};
use precinct_core::team::Team;

/// Fix rounds per file: each rewrite reparses, so compounding corrections
/// land one round at a time.
const MAX_ROUNDS: usize = 10;

#[derive(Parser)]
#[command(
    name = "precinct",
    version,
    about = "Rule-based static analysis with autocorrection"
)]
struct Cli {
    /// Files or directories to investigate
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Apply corrections and rewrite files in place
    #[arg(long)]
    fix: bool,

    /// Skip autocorrections flagged unsafe by configuration
    #[arg(long)]
    safe: bool,

    /// Configuration file (defaults to .precinct.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// List registered rules and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

struct FileOutcome {
    path: PathBuf,
    offenses: Vec<Offense>,
    errors: Vec<String>,
    warnings: Vec<String>,
    rewritten: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        process::exit(2);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let registry = Registry::with_builtin_rules();

    if cli.list_rules {
        for class in registry.classes() {
            let fixable = if class.supports_autocorrect() {
                " (autocorrectable)"
            } else {
                ""
            };
            println!("{}{fixable}", class.badge());
        }
        return Ok(());
    }

    let config = Arc::new(load_config(cli.config.as_deref())?);
    check_rule_names(&registry, &config)?;
    let options = InvestigationOptions {
        autocorrect: cli.fix,
        safe: cli.safe,
    };
    let team = Team::new(registry.enabled(&config), config, options);

    let files = discover(&cli.paths);
    if files.is_empty() {
        eprintln!("{}", "nothing to investigate".dimmed());
        return Ok(());
    }

    let mut outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| investigate_file(&team, path, cli.fix))
        .collect::<Result<Vec<_>>>()?;
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    match cli.format {
        Format::Text => print_text(&outcomes),
        Format::Json => print_json(&outcomes)?,
    }

    let open_offenses = outcomes
        .iter()
        .flat_map(|o| o.offenses.iter())
        .filter(|o| !o.corrected())
        .count();
    if open_offenses > 0 {
        process::exit(1);
    }
    Ok(())
}

/// Resolves every rule name the configuration mentions against the
/// registry: wrong namespaces warn, ambiguity is fatal, unknown names get
/// a notice and are otherwise ignored.
fn check_rule_names(registry: &Registry, config: &Config) -> Result<()> {
    let mentioned = config.rules.keys().cloned().chain(config.only.iter().cloned());
    for name in mentioned {
        match registry.qualify(&name, "config")? {
            Qualified::Resolved {
                corrected_from: Some(warning),
                ..
            } => eprintln!("{} {warning}", "warning:".yellow().bold()),
            Qualified::Resolved { .. } => {}
            Qualified::Unchanged(name) => {
                eprintln!("{} unknown rule `{name}` in config", "warning:".yellow().bold());
            }
        }
    }
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => {
            let default = Path::new(".precinct.toml");
            if default.exists() {
                Config::load(default).context("loading .precinct.toml")
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn discover(paths: &[PathBuf]) -> Vec<PathBuf> {
    let roots: Vec<PathBuf> = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths.to_vec()
    };

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root);
            continue;
        }
        for entry in WalkDir::new(&root)
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "py") {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Investigates one file, looping rounds while `--fix` keeps landing
/// corrections: each rewrite changes offsets, so the next round works
/// against a fresh parse of the corrected text.
fn investigate_file(team: &Team, path: &Path, fix: bool) -> Result<FileOutcome> {
    let name = path.to_string_lossy().into_owned();
    let mut text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut outcome = FileOutcome {
        path: path.to_path_buf(),
        offenses: Vec::new(),
        errors: Vec::new(),
        warnings: Vec::new(),
        rewritten: false,
    };

    for _round in 0..MAX_ROUNDS {
        let unit = parse_unit(&name, &text)?;
        let report = team.investigate(&unit);

        outcome
            .errors
            .extend(report.errors.iter().map(ToString::to_string));
        outcome.warnings.extend(report.warnings);

        match report.corrected_source {
            Some(corrected) if report.updated => {
                // Another round runs against the rewritten text; only the
                // fixed offenses are final, the rest will be re-found.
                outcome
                    .offenses
                    .extend(report.offenses.into_iter().filter(Offense::corrected));
                text = corrected;
                outcome.rewritten = true;
            }
            _ => {
                outcome.offenses.extend(report.offenses);
                break;
            }
        }
    }

    if fix && outcome.rewritten {
        fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(outcome)
}

fn print_text(outcomes: &[FileOutcome]) {
    let mut total = 0;
    let mut corrected = 0;

    for outcome in outcomes {
        let file = outcome.path.display().to_string();
        for offense in &outcome.offenses {
            total += 1;
            if offense.corrected() {
                corrected += 1;
            }
            print_offense(&file, offense);
        }
        for warning in &outcome.warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
        for error in &outcome.errors {
            eprintln!("{} {error}", "rule error:".red().bold());
        }
    }

    if total == 0 {
        println!("{}", "no offenses".green());
    } else {
        println!(
            "{total} offense(s), {corrected} corrected",
        );
    }
}

fn print_offense(file: &str, offense: &Offense) {
    let tag = if offense.corrected() {
        "[fixed]".green().bold()
    } else {
        format!("{}:", offense.severity).red().bold()
    };
    println!("{tag} {} {}", offense.badge.to_string().bold(), offense.message);
    println!(
        "  {} {file}:{}:{}",
        "-->".blue(),
        offense.line,
        offense.column + 1
    );
    if !offense.source_line.is_empty() {
        let squiggle = offense.span.len().max(1).min(
            offense
                .source_line
                .len()
                .saturating_sub(offense.column)
                .max(1),
        );
        println!(
            "{:<3} {} {}",
            offense.line.to_string().blue(),
            "|".blue(),
            offense.source_line
        );
        println!(
            "    {} {}{}",
            "|".blue(),
            " ".repeat(offense.column),
            "^".repeat(squiggle).red()
        );
    }
    println!();
}

fn print_json(outcomes: &[FileOutcome]) -> Result<()> {
    let payload: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|o| {
            serde_json::json!({
                "path": o.path.display().to_string(),
                "offenses": &o.offenses,
                "errors": &o.errors,
                "warnings": &o.warnings,
                "rewritten": o.rewritten,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
