// knockoff CLI - headless integer formula grid

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use knockoff_cli::exit_codes::{
    grid_exit_code, line_exit_code, EXIT_ERROR, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE,
};
use knockoff_cli::{output, repl, script};
use knockoff_config::Settings;
use knockoff_engine::formula::{parser, token, tree::ExpressionTree};
use knockoff_engine::{CellId, EngineError, Grid};

#[derive(Parser)]
#[command(name = "knockoff")]
#[command(about = "Integer formula grid (headless)")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/knockoff/settings.toml)
    #[arg(long, global = true, env = "KNOCKOFF_CONFIG")]
    config: Option<PathBuf>,

    /// Grid rows and columns (overrides settings)
    #[arg(long, global = true)]
    size: Option<usize>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an edit script and print the resulting cells
    #[command(after_help = "\
Script format (one edit per line, '#' starts a comment):
  A0 5
  B0 =A0+3
  C0 Total

Examples:
  knockoff run budget.grid
  printf 'A0 2\\nA1 =A0*21\\n' | knockoff run --format json")]
    Run {
        /// Script file (reads stdin when omitted)
        script: Option<PathBuf>,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Stop at the first failing line and exit with its code
        #[arg(long)]
        strict: bool,
    },

    /// Evaluate one formula against an empty grid
    Eval {
        /// Formula text, with or without the leading '='
        formula: String,

        /// Also print the postfix token sequence
        #[arg(long)]
        postfix: bool,
    },

    /// Interactive mode
    Repl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = load_settings(&cli).and_then(|settings| {
        init_logging(&settings, cli.verbose);
        let size = cli.size.unwrap_or(settings.grid.size).max(1);
        log::debug!("grid size {}", size);

        match cli.command {
            Commands::Run {
                script,
                format,
                strict,
            } => cmd_run(size, script, format, strict),
            Commands::Eval { formula, postfix } => cmd_eval(size, &formula, postfix),
            Commands::Repl => cmd_repl(size),
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
        }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Exit code already reported on stderr.
    pub fn silent(code: u8) -> Self {
        Self::new(code, "")
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    match &cli.config {
        Some(path) => Settings::load_from(path).map_err(|e| CliError::usage(e.to_string())),
        None => Ok(Settings::load()),
    }
}

fn new_grid(size: usize) -> Result<Grid, CliError> {
    Grid::try_new(size).map_err(|e| CliError::usage(e.to_string()))
}

fn init_logging(settings: &Settings, verbose: u8) {
    let level = match verbose {
        0 => settings.log.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(size: usize, path: Option<PathBuf>, format: Format, strict: bool) -> Result<(), CliError> {
    let text = match &path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::io(e.to_string()))?;
            buf
        }
    };

    let mut grid = new_grid(size)?;
    let outcome = script::run_script(&mut grid, &text, strict);
    log::info!(
        "applied {} edits, {} failed",
        outcome.applied,
        outcome.failures.len()
    );

    for failure in &outcome.failures {
        eprintln!("line {}: {}", failure.line, failure.error);
    }

    let rendered = match format {
        Format::Table => output::render_table(&grid),
        Format::Json => {
            let mut json = output::render_json(&grid)
                .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
            json.push('\n');
            json
        }
    };
    print!("{}", rendered);

    match outcome.failures.first() {
        Some(failure) if strict => Err(CliError::silent(line_exit_code(&failure.error))),
        _ => Ok(()),
    }
}

// ============================================================================
// eval
// ============================================================================

fn cmd_eval(size: usize, formula: &str, postfix: bool) -> Result<(), CliError> {
    let mut grid = new_grid(size)?;
    let text = formula.strip_prefix('=').unwrap_or(formula).to_ascii_uppercase();

    if postfix {
        let tokens = parser::parse(&text)
            .map_err(|e| CliError::new(EXIT_PARSE, format!("Parse error: {}", e)))?;
        let tree = ExpressionTree::build(tokens)
            .map_err(|e| CliError::new(EXIT_PARSE, format!("Parse error: {}", e)))?;
        println!("postfix: {}", token::join_tokens(&tree.postfix()));
        println!("infix:   {}", tree.render());
    }

    // Evaluate through a scratch grid so references resolve and bounds are checked
    let cell = CellId::new(0, 0);
    let input = format!("={}", text);
    grid.set_cell(cell, &input).map_err(|e| match &e {
        EngineError::Cycle(_) => CliError::new(
            grid_exit_code(&e),
            format!("{} (eval runs in cell A0; reference another cell)", e),
        ),
        _ => CliError::new(grid_exit_code(&e), e.to_string()),
    })?;

    println!("{}", grid.get_cell_display(cell.row, cell.col));
    Ok(())
}

// ============================================================================
// repl
// ============================================================================

fn cmd_repl(size: usize) -> Result<(), CliError> {
    let mut grid = new_grid(size)?;
    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    if prompt {
        println!("knockoff {} - {}x{} grid, `help` for commands", env!("CARGO_PKG_VERSION"), size, size);
    }

    repl::run_repl(&mut grid, stdin.lock(), io::stdout().lock(), prompt)
        .map_err(|e| CliError::io(e.to_string()))
}
