use anyhow::{Context, Result};
use batchren_core::interrupt::{confirmation_prompt_active, interrupt_requested, request_interrupt};
use batchren_core::{
    BatchError, Config, ConfigError, Outcome, OutputFormatter, SequenceOptions, ValidationError,
    VersionResult,
};
use clap::{CommandFactory, Parser};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

mod batch;
mod cli;
mod history;
mod recover;
mod replace;
mod search;
mod sequence;

use cli::{Cli, Commands, OutputFormat};

/// Exit codes
const EXIT_OK: i32 = 0;
const EXIT_ROLLED_BACK: i32 = 1;
const EXIT_INVALID: i32 = 2;
const EXIT_PARTIAL: i32 = 3;
const EXIT_INTERNAL: i32 = 4;
const EXIT_INTERRUPTED: i32 = 130;

fn on_signal(name: &str) {
    if confirmation_prompt_active() {
        // Nothing has been renamed yet
        eprintln!("\nReceived {name}. Aborted.");
        process::exit(EXIT_INTERRUPTED);
    }
    if request_interrupt() {
        eprintln!("\nReceived {name}. Finishing the running batch before exiting...");
    } else {
        eprintln!("\nReceived {name}. Stopping before any file is renamed...");
    }
}

fn main() {
    // A batch that has started must finish or roll back, so signals only
    // record the request
    ctrlc::set_handler(|| on_signal("SIGINT")).expect("Error setting SIGINT handler");

    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || on_signal("SIGTERM"))
            .expect("Error setting SIGTERM handler");
    }

    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
            .unwrap_or_else(|e| {
                eprintln!("Error: {e:#}");
                process::exit(EXIT_INVALID);
            });
    }

    let config = match std::env::current_dir()
        .context("Failed to get current directory")
        .and_then(|dir| Config::load(&dir))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_INVALID);
        },
    };

    let result: Result<i32> = match cli.command {
        Commands::Search { dir, scan, output } => {
            search::handle_search(&dir, scan, &config, output).map(|()| EXIT_OK)
        },

        Commands::Replace {
            dir,
            old,
            new,
            scan,
            exec,
        } => {
            let options = batch::batch_options(&exec, &config, cli.yes, cli.no_color);
            replace::handle_replace(
                &dir,
                &old,
                &new,
                scan,
                &config,
                &options,
                exec.output,
                exec.quiet,
            )
            .map(outcome_exit_code)
        },

        Commands::Sequence {
            dir,
            include_hidden,
            list_ext: true,
            exec,
            ..
        } => sequence::handle_list_extensions(
            &dir,
            include_hidden || config.defaults.include_hidden,
            exec.output,
        )
        .map(|()| EXIT_OK),

        Commands::Sequence {
            dir,
            ext,
            sort,
            reverse,
            start,
            padding,
            prefix,
            suffix,
            no_keep_ext,
            include_hidden,
            exec,
            ..
        } => {
            let options = batch::batch_options(&exec, &config, cli.yes, cli.no_color);
            let sequence = SequenceOptions {
                extension: ext,
                sort: sort.into(),
                reverse,
                start,
                padding,
                prefix,
                suffix,
                keep_extension: !no_keep_ext,
                include_hidden: include_hidden || config.defaults.include_hidden,
            };
            sequence::handle_sequence(&dir, &sequence, &options, exec.output, exec.quiet)
                .map(outcome_exit_code)
        },

        Commands::History {
            limit,
            output,
            quiet,
        } => history::handle_history(limit, output, quiet).map(|()| EXIT_OK),

        Commands::Recover { dir, output } => recover::handle_recover(&dir, output).map(|clean| {
            if clean {
                EXIT_OK
            } else {
                EXIT_PARTIAL
            }
        }),

        Commands::Completions { shell, out_dir } => {
            handle_completions(shell, out_dir.as_deref()).map(|()| EXIT_OK)
        },

        Commands::Version { output } => {
            handle_version(output);
            Ok(EXIT_OK)
        },
    };

    let interrupted = interrupt_requested();
    if interrupted {
        eprintln!("Operation interrupted");
    }

    match result {
        Ok(code) => process::exit(interrupted_exit_code(code, interrupted)),
        Err(_) if interrupted => process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(validation) = validation_error(&e) {
                for violation in &validation.violations {
                    eprintln!("  {violation}");
                }
            }
            process::exit(error_exit_code(&e));
        },
    }
}

fn outcome_exit_code(outcome: Option<Outcome>) -> i32 {
    match outcome {
        // Declined at the prompt: nothing happened
        None | Some(Outcome::Applied | Outcome::DryRun | Outcome::Empty) => EXIT_OK,
        Some(Outcome::RolledBack) => EXIT_ROLLED_BACK,
        Some(Outcome::Partial) => EXIT_PARTIAL,
    }
}

/// A batch that ran to a rollback or a partial state reports that, signal or not
fn interrupted_exit_code(code: i32, interrupted: bool) -> i32 {
    match code {
        EXIT_ROLLED_BACK | EXIT_PARTIAL => code,
        _ if interrupted => EXIT_INTERRUPTED,
        _ => code,
    }
}

fn validation_error(e: &anyhow::Error) -> Option<&ValidationError> {
    match e.downcast_ref::<BatchError>() {
        Some(BatchError::Validation(v)) => Some(v),
        _ => e.downcast_ref::<ValidationError>(),
    }
}

fn error_exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<BatchError>() {
        Some(BatchError::Config(_) | BatchError::Validation(_) | BatchError::Scan { .. }) => {
            EXIT_INVALID
        },
        Some(BatchError::Io { .. }) => EXIT_INTERNAL,
        None if e.is::<ConfigError>() || e.is::<ValidationError>() => EXIT_INVALID,
        None => EXIT_INTERNAL,
    }
}

// Generate shell completions
pub fn generate_completions<G: clap_complete::Generator>(
    gen: G,
    cmd: &mut clap::Command,
    name: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    use clap_complete::generate_to;
    use std::fs;

    fs::create_dir_all(out_dir)?;
    let path = generate_to(gen, cmd, name, out_dir)?;
    Ok(path)
}

fn handle_completions(shell: clap_complete::Shell, out_dir: Option<&Path>) -> Result<()> {
    let mut cmd = Cli::command();
    match out_dir {
        Some(dir) => {
            let path = generate_completions(shell, &mut cmd, "batchren", dir)?;
            println!("Generated completion file: {}", path.display());
        },
        None => clap_complete::generate(shell, &mut cmd, "batchren", &mut io::stdout()),
    }
    Ok(())
}

fn handle_version(output: OutputFormat) {
    let result = VersionResult {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    match output {
        OutputFormat::Json => print!("{}", result.format_json()),
        OutputFormat::Summary => println!("{}", result.format_summary()),
    }
}
