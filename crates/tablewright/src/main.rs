//! Tablewright launcher
//!
//! With no subcommand (or `shell`) starts the interactive table builder.
//! The other subcommands inspect and export stored tables without a session.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tablewright::cli;
use tablewright::cli::database::{DatabasesArgs, ExportArgs, ShowArgs, TablesArgs};
use tablewright::cli::prompt::{ConsolePrompt, ConsoleSink};
use tablewright::cli::session::Session;
use tablewright::cli::shell::Shell;
use tablewright_logging::{init_logging, LogConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "tablewright",
    version,
    about = "Build tables in the terminal, save them to SQLite and export them"
)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive table builder (default)
    Shell,

    /// List databases
    Databases(DatabasesArgs),

    /// List the tables stored in a database
    Tables(TablesArgs),

    /// Print a stored table
    Show(ShowArgs),

    /// Export a stored table to CSV, JSON or PDF
    Export(ExportArgs),

    /// Show resolved paths and settings
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Option<Commands>) -> bool {
    match command {
        Some(Commands::Databases(args)) => args.json,
        Some(Commands::Tables(args)) => args.json,
        Some(Commands::Show(args)) => args.json,
        Some(Commands::Config(args)) => args.json,
        Some(Commands::Shell) | Some(Commands::Export(_)) | None => false,
    }
}

fn run_shell() -> Result<()> {
    let session = Session::from_home();
    let prompt = ConsolePrompt::new(Some(cli::config::history_path()))?;
    let mut shell = Shell::new(session, prompt, ConsoleSink);
    shell.run();
    Ok(())
}

fn run_command(command: Option<Commands>) -> Result<()> {
    let catalog = cli::config::default_catalog();
    match command {
        None | Some(Commands::Shell) => run_shell(),
        Some(Commands::Databases(args)) => cli::database::run_databases(&catalog, args),
        Some(Commands::Tables(args)) => cli::database::run_tables(&catalog, args),
        Some(Commands::Show(args)) => cli::database::run_show(&catalog, args),
        Some(Commands::Export(args)) => cli::database::run_export(&catalog, args),
        Some(Commands::Config(args)) => cli::config::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_mode = command_wants_json(&cli.command);
    let interactive = matches!(cli.command, None | Some(Commands::Shell));

    if let Err(err) = init_logging(LogConfig {
        app_name: "tablewright",
        verbose: cli.verbose,
        interactive,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }
    info!(version = env!("CARGO_PKG_VERSION"), "tablewright starting");

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if let Some(helpful) = err.downcast_ref::<cli::error::HelpfulError>() {
                eprint!("{}", helpful);
            } else {
                eprintln!("ERROR: {:#}", err);
            }
            ExitCode::from(1)
        }
    }
}
