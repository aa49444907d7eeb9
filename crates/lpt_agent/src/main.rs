mod config;
mod input;
mod output;
mod replay;

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use lpt_parser_core::{DirectiveLimits, DirectiveWriter, FileMode, LiveScanner, ScannerConfig, StreamSource, Untimed, read_directives, scan_live};

use crate::{
    config::{AgentConfig, verify_or_create_dir},
    output::JobGate,
    replay::PlainTextPrinter,
};

#[derive(Parser, Debug)]
#[command(version, about = "Receives line printer output and splits it into print jobs", long_about = None)]
pub struct Cli {
    /// Log raw lines and scanner state changes
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,

    /// Also log into rotating files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Connect to the configured printer sockets and write every job to a file")]
    Live {
        #[arg(long, short, value_name = "FILE", default_value = "lpt_agent.toml")]
        config: PathBuf,

        /// Print an example configuration and exit
        #[arg(long, default_value_t = false)]
        example_config: bool,
    },

    #[command(about = "Decode a local file into print directives")]
    File {
        /// Input file, `-` reads stdin
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Column 1 holds ASA carriage control
        #[arg(long, conflicts_with_all = ["cdc", "raw"])]
        asa: bool,

        /// Column 1 holds CDC NOS carriage control
        #[arg(long, conflicts_with = "raw")]
        cdc: bool,

        /// Raw printer channel capture, decoded like a live connection
        #[arg(long)]
        raw: bool,

        /// Job info reported at the end of the file; raw captures take it from separator lines
        #[arg(long, value_name = "NAME", default_value = "", conflicts_with = "raw")]
        job_name: String,

        /// Write directives here instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    #[command(about = "Print a directive file as plain text")]
    Replay {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Stop after this many directives
        #[arg(long, value_name = "N")]
        max_lines: Option<usize>,
    },
}

fn start_logger(trace: bool, log_dir: Option<&Path>) -> anyhow::Result<LoggerHandle> {
    let level = if trace { "trace" } else { "info" };
    let logger = Logger::try_with_env_or_str(level)?;
    let handle = match log_dir {
        Some(dir) => {
            verify_or_create_dir(dir)?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename("lpt_agent").suffix("log").suppress_timestamp())
                .rotate(Criterion::Size(1024 * 1024), Naming::Numbers, Cleanup::KeepLogFiles(5))
                .duplicate_to_stderr(Duplicate::Warn)
                .start()?
        }
        None => logger.start()?,
    };
    Ok(handle)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let _logger = start_logger(args.trace, args.log_dir.as_deref())?;

    match args.command {
        Commands::Live { config, example_config } => {
            if example_config {
                print!("{}", config::example_config());
                return Ok(());
            }
            run_live(&config, args.trace)
        }
        Commands::File {
            path,
            asa,
            cdc,
            raw,
            job_name,
            output,
        } => run_file(&path, FileMode::from_flags(asa, cdc)?, raw, job_name, output.as_deref(), args.trace),
        Commands::Replay { path, max_lines } => run_replay(&path, max_lines),
    }
}

fn run_live(config_path: &Path, trace: bool) -> anyhow::Result<()> {
    log::info!("starting lpt_agent {}", env!("CARGO_PKG_VERSION"));
    let config = AgentConfig::load(config_path)?;
    let inputs = config.validate(trace)?;
    for input in &inputs {
        verify_or_create_dir(&input.output_dir)?;
        log::info!("[{}] will write jobs to '{}'", input.scanner.name, input.output_dir.display());
    }

    let gate = JobGate::new(config.max_concurrent_jobs);
    let delay = config.reconnect_delay();
    thread::scope(|s| {
        for settings in &inputs {
            let gate = &gate;
            thread::Builder::new()
                .name(format!("input-{}", settings.scanner.name))
                .spawn_scoped(s, move || input::run_input(settings, gate, delay))
                .with_context(|| format!("starting input {}", settings.scanner.name))?;
        }
        Ok(())
    })
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run_file(path: &Path, mode: FileMode, raw: bool, job_name: String, output: Option<&Path>, trace: bool) -> anyhow::Result<()> {
    let mut reader = open_input(path)?;
    let out: Box<dyn Write> = match output {
        Some(out) => Box::new(File::create(out).with_context(|| format!("creating {}", out.display()))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = DirectiveWriter::new(BufWriter::new(out));

    let mut config = ScannerConfig::named(path.display().to_string());
    config.job_name = job_name;
    config.trace = trace;

    if raw {
        let mut source = StreamSource::new(Untimed(reader));
        let mut scanner = LiveScanner::new(config);
        scan_live(&mut source, &mut scanner, &mut sink)?;
    } else {
        log::debug!("decoding {} as {:?}", path.display(), mode);
        mode.scan(&mut reader, config, &mut sink)?;
    }
    sink.finish()?.flush()?;
    Ok(())
}

fn run_replay(path: &Path, max_lines: Option<usize>) -> anyhow::Result<()> {
    let mut reader = open_input(path)?;
    let mut printer = PlainTextPrinter::new(BufWriter::new(io::stdout().lock()));
    read_directives(&mut reader, &mut printer, DirectiveLimits { max_lines })
        .with_context(|| format!("replaying {}", path.display()))?;
    printer.finish()?.flush()?;
    Ok(())
}
