//! Respawn CLI: regenerate a session, rebuild it, and re-exec.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser as ClapParser, Subcommand};
use respawn_cli::colors::{bold, cyan, gray, green, status_label, yellow};
use respawn_cli::input;
use respawn_cli::report::Report;
use respawn_core::{
    DryRunHandoff, ExecHandoff, Pipeline, RespawnConfig, RespawnError, Session, StatementBlock,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "RESPAWN_LOG";

#[derive(ClapParser)]
#[command(
    name = "respawn",
    version,
    about = "Regenerate an interactive session as a program, rebuild it, and replace this process"
)]
struct Cli {
    /// Use this config file instead of searching for respawn.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve import paths and show where they were found
    Resolve {
        /// Import paths to resolve
        #[arg(required = true)]
        paths: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the program that would be generated for a session
    Synth {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Regenerate, build, and replace this process with the result
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Build and report the handoff without replacing the process
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct SessionArgs {
    /// Import path to add (repeatable, order preserved)
    #[arg(short, long = "import")]
    imports: Vec<String>,
    /// History file, one literal entry per line
    #[arg(long)]
    history: Option<PathBuf>,
    /// File holding the serialized environment statements
    #[arg(long)]
    env: Option<PathBuf>,
    /// Temporary build of the running session, deleted by its successor
    #[arg(long)]
    predecessor: PathBuf,
}

impl SessionArgs {
    fn load(&self) -> Result<(Session, StatementBlock), Report> {
        let history = match &self.history {
            Some(path) => input::load_history(path).map_err(|e| Report::from_error(&e))?,
            None => Vec::new(),
        };
        let environment =
            input::load_environment(self.env.as_deref()).map_err(|e| Report::from_error(&e))?;
        let session = Session::new(&self.predecessor)
            .with_imports(self.imports.iter().cloned())
            .with_history(history);
        Ok((session, environment))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return fail(&Report::from_respawn(&err)),
    };
    tracing::debug!(platform = %config.platform(), "configuration loaded");

    let result = match cli.command {
        Commands::Resolve { paths, json } => cmd_resolve(&config, &paths, json),
        Commands::Synth { session } => cmd_synth(&config, &session),
        Commands::Run { session, dry_run } => cmd_run(&config, &session, dry_run),
        Commands::Config => cmd_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => fail(&report),
    }
}

fn fail(report: &Report) -> ExitCode {
    eprintln!("{}", report.render());
    ExitCode::FAILURE
}

fn load_config(path: Option<&Path>) -> Result<RespawnConfig, RespawnError> {
    match path {
        Some(path) => {
            let mut config = RespawnConfig::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => RespawnConfig::load(),
    }
}

fn cmd_resolve(config: &RespawnConfig, paths: &[String], json: bool) -> Result<(), Report> {
    config.require_roots().map_err(|e| Report::from_respawn(&e))?;
    let empty = StatementBlock::default();
    let pipeline = Pipeline::new(config, &empty);
    let resolved = paths
        .iter()
        .map(|p| pipeline.resolver().resolve(p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Report::from_respawn(&e))?;

    if json {
        let text = serde_json::to_string_pretty(&resolved)
            .map_err(|e| Report::new(format!("cannot encode JSON: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }
    for import in &resolved {
        println!(
            "{} {} {}",
            green(&import.clean_path),
            gray("->"),
            import.directory.display()
        );
        println!("  {} {}", gray("package"), bold(&import.package_name));
    }
    Ok(())
}

fn cmd_synth(config: &RespawnConfig, args: &SessionArgs) -> Result<(), Report> {
    let (session, environment) = args.load()?;
    let program = Pipeline::new(config, &environment)
        .synthesize(&session)
        .map_err(|e| Report::from_respawn(&e))?;
    print!("{}", program.source);
    Ok(())
}

fn cmd_run(config: &RespawnConfig, args: &SessionArgs, dry_run: bool) -> Result<(), Report> {
    let (session, environment) = args.load()?;
    let pipeline = Pipeline::new(config, &environment);

    eprintln!(
        "{} {} import(s), {} history entr{}",
        status_label("Regenerating"),
        session.imports.len(),
        session.history.len(),
        if session.history.len() == 1 { "y" } else { "ies" }
    );

    if dry_run {
        let mut handoff = DryRunHandoff::default();
        let record = pipeline
            .respawn(&session, &mut handoff)
            .map_err(|e| Report::from_respawn(&e))?;
        eprintln!(
            "{} {}",
            status_label("Built"),
            cyan(&record.executable.display().to_string())
        );
        eprintln!(
            "{} would exec with argv {:?} and {} environment variable(s)",
            yellow("dry run:"),
            record.argv,
            record.env_len
        );
        return Ok(());
    }

    match pipeline.respawn(&session, &mut ExecHandoff) {
        Ok(never) => match never {},
        Err(err) => Err(Report::from_respawn(&err)),
    }
}

fn cmd_config(config: &RespawnConfig) -> Result<(), Report> {
    let text = config.to_toml().map_err(|e| Report::from_respawn(&e))?;
    print!("{}", text);
    println!(
        "{}",
        gray(&format!(
            "# compiler: {}\n# linker:   {}",
            config.compiler_path().display(),
            config.linker_path().display()
        ))
    );
    Ok(())
}
