use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{Application, InitBuilder};
use crate::config::Backend;
use crate::diagnostics::DiagnosticPrinter;
use crate::executor::Document;
use crate::replay;
use crate::scripts::{discover_scripts, CompiledScript, ScriptFile};

/// Scripts directory used when `chat` is given no path
pub const DEFAULT_SCRIPT_DIR: &str = "scripts";

#[derive(Parser)]
#[command(name = "scenario")]
#[command(about = "Scenario - scripted customer-service dialogues", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the offline keyword classifier whatever the configuration says
    #[arg(long, global = true)]
    pub stub: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Talk to a script interactively
    Chat {
        /// Script file, or a directory to choose from (default: scripts/)
        script: Option<PathBuf>,
    },

    /// Load and validate scripts without running them
    Check {
        /// Script files to check
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
    },

    /// Replay recorded conversations against a script
    Replay {
        /// Script to run
        script: PathBuf,

        /// Case files: one `input ||| expected` per line
        #[arg(required = true)]
        cases: Vec<PathBuf>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

/// Install the stderr log subscriber.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "scenario_core=debug" } else { "scenario_core=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli_with_args(cli)
}

/// Internal function that handles CLI commands
pub fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Eagerly load and validate configuration before executing any command
    // This ensures config errors are shown immediately, not after command output
    let mut builder = InitBuilder::new();
    if let Some(path) = &cli.config {
        builder = builder.config_path(path);
    }
    if cli.stub {
        builder = builder.backend(Backend::Local);
    }
    let app = builder.init()?;

    match cli.command {
        Commands::Chat { script } => chat(&app, script),
        Commands::Check { scripts } => check(&scripts),
        Commands::Replay {
            script,
            cases,
            json,
        } => replay_cases(&app, &script, &cases, json),
        Commands::Config => {
            print!("{}", app.config().to_redacted_toml()?);
            Ok(())
        }
    }
}

/* ===================== chat ===================== */

fn chat(app: &Application, script: Option<PathBuf>) -> Result<()> {
    let path = match script {
        Some(path) if !path.is_dir() => path,
        Some(dir) => pick_script(&dir)?,
        None => pick_script(Path::new(DEFAULT_SCRIPT_DIR))?,
    };

    let (file, compiled) = load_reported(&path)?;
    let mut session = app.new_session(compiled.document.into());

    println!(
        "Domain: {} ({}, classifier: {})",
        session.document().domain(),
        file.short_fingerprint(),
        app.classifier.name()
    );
    println!("Bot: {}", session.run()?);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !session.is_finished() {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
            break;
        }

        println!("Bot: {}", session.step(input)?);
    }

    println!("(bye)");
    Ok(())
}

fn pick_script(dir: &Path) -> Result<PathBuf> {
    let scripts = discover_scripts(dir)
        .with_context(|| format!("Failed to list scripts in {}", dir.display()))?;
    if scripts.is_empty() {
        bail!("No .rsl or .dsl scripts found in {}", dir.display());
    }

    println!("Available scripts:");
    for (i, path) in scripts.iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }
    print!("Choose a script [1]: ");
    io::stdout().flush()?;

    choose_script(scripts, io::stdin().lock())
}

/// Read one selection line; empty picks the first script.
fn choose_script(mut scripts: Vec<PathBuf>, mut reader: impl BufRead) -> Result<PathBuf> {
    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    let answer = answer.trim();

    let index = if answer.is_empty() {
        0
    } else {
        match answer.parse::<usize>() {
            Ok(n) if (1..=scripts.len()).contains(&n) => n - 1,
            _ => bail!("Invalid choice '{}': expected 1-{}", answer, scripts.len()),
        }
    };
    Ok(scripts.swap_remove(index))
}

/* ===================== check ===================== */

fn check(paths: &[PathBuf]) -> Result<()> {
    let mut failed = 0;
    for path in paths {
        match load_reported(path) {
            Ok((file, compiled)) => {
                let doc = &compiled.document;
                println!(
                    "ok    {}  domain \"{}\", {} states, {} transitions, version {}{}",
                    path.display(),
                    doc.domain(),
                    doc.state_count(),
                    doc.transition_count(),
                    file.short_fingerprint(),
                    match compiled.warnings.len() {
                        0 => String::new(),
                        n => format!(", {} warning(s)", n),
                    }
                );
            }
            Err(e) => {
                failed += 1;
                println!("FAIL  {}  {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} script(s) failed to load", failed, paths.len());
    }
    Ok(())
}

/* ===================== replay ===================== */

fn replay_cases(app: &Application, script: &Path, cases: &[PathBuf], json: bool) -> Result<()> {
    let (_, compiled) = load_reported(script)?;
    let document: std::sync::Arc<Document> = compiled.document.into();

    let mut failed = 0;
    let mut reports = Vec::with_capacity(cases.len());
    for case_path in cases {
        let text = fs::read_to_string(case_path)
            .with_context(|| format!("Failed to read {}", case_path.display()))?;
        let parsed = replay::parse_cases(&text);

        let mut session = app.new_session(document.clone());
        let report = replay::run(&mut session, &parsed)?;
        failed += report.failed;

        if !json {
            println!("== {}", case_path.display());
            println!("   Bot: {}", report.opening);
            for result in &report.results {
                println!(
                    "{} {:>4}  You: {}\n           Bot: {}",
                    if result.passed { "  " } else { "✗ " },
                    result.line,
                    result.input,
                    result.reply
                );
                if !result.passed {
                    if let Some(expected) = &result.expected {
                        println!("           expected to contain: {}", expected);
                    }
                }
            }
            println!("   {} passed, {} failed\n", report.passed, report.failed);
        }
        reports.push((case_path.display().to_string(), report));
    }

    if json {
        let by_file: Vec<serde_json::Value> = reports
            .iter()
            .map(|(file, report)| serde_json::json!({ "file": file, "report": report }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&by_file)?);
    }

    if failed > 0 {
        bail!("{} replay case(s) failed", failed);
    }
    Ok(())
}

/* ===================== Helpers ===================== */

/// Load a script, printing diagnostics for errors and warnings to stderr.
fn load_reported(path: &Path) -> Result<(ScriptFile, CompiledScript)> {
    let file = ScriptFile::read(path)?;
    let file_name = path.display().to_string();
    let printer = DiagnosticPrinter::new(&file_name, &file.source);

    match file.compile() {
        Ok(compiled) => {
            if !compiled.warnings.is_empty() {
                eprintln!("{}", printer.render_findings(&compiled.warnings));
            }
            Ok((file, compiled))
        }
        Err(e) => {
            eprintln!("{}", printer.render(&e));
            Err(e).with_context(|| format!("Failed to load {}", file_name))
        }
    }
}
