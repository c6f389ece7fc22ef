use clap::{ArgAction, Parser, Subcommand, ValueHint};
use fdvflow::backend::{BatchManifest, BatchProcessor, CommandHandler};
use fdvflow::utils::logger::{set_console_logging, Logger};
use log::LevelFilter;
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert logger exports to FDV flow and rainfall files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Suppress log output on stderr
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a flow file from depth and velocity readings
    Flow {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        /// e.g. "Circular", "Egg Type 2a", "Two Circles and a Rectangle"
        #[arg(long)]
        pipe_shape: String,
        /// Diameter/width in mm, or comma-separated dimensions in metres
        #[arg(long)]
        pipe_size: String,
        #[arg(long)]
        depth_col: Option<String>,
        #[arg(long)]
        velocity_col: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Write a rainfall intensity file
    Rainfall {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        #[arg(long)]
        rainfall_col: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Solve the side radius of an egg-shaped section
    R3 {
        width: f64,
        height: f64,
        /// "Egg Type 1" (or 1) / "Egg Type 2" (or 2)
        egg_form: String,
    },
    /// Convert every job in a JSON manifest and zip the results
    Batch {
        #[arg(value_hint = ValueHint::FilePath)]
        manifest: PathBuf,
        #[arg(value_hint = ValueHint::DirPath)]
        output_dir: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    /// Overrides the site name read from the file name
    #[arg(long)]
    site_name: Option<String>,
    /// "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DDTHH:MM"
    #[arg(long, requires = "end")]
    start: Option<String>,
    #[arg(long, requires = "start")]
    end: Option<String>,
}

fn open_session(input: &Path, session: &SessionArgs) -> Result<CommandHandler, Box<dyn Error>> {
    let mut handler = CommandHandler::new();
    handler.process_file(input)?;
    if let Some(site_name) = &session.site_name {
        handler.update_site_name(site_name.clone());
    }
    if let (Some(start), Some(end)) = (&session.start, &session.end) {
        handler.update_timestamps(start, end)?;
    }
    Ok(handler)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Flow {
            input,
            output,
            pipe_shape,
            pipe_size,
            depth_col,
            velocity_col,
            session,
        } => {
            let mut handler = open_session(&input, &session)?;
            let summary = handler.create_fdv_flow(
                &output,
                depth_col.as_deref(),
                velocity_col.as_deref(),
                &pipe_shape,
                &pipe_size,
            )?;
            print_json(&summary)
        }
        Command::Rainfall {
            input,
            output,
            rainfall_col,
            session,
        } => {
            let mut handler = open_session(&input, &session)?;
            let summary = handler.create_rainfall(&output, rainfall_col.as_deref())?;
            print_json(&summary)
        }
        Command::R3 {
            width,
            height,
            egg_form,
        } => {
            let summary = CommandHandler::new().calculate_r3(width, height, &egg_form)?;
            print_json(&summary)
        }
        Command::Batch {
            manifest,
            output_dir,
        } => {
            let manifest = BatchManifest::from_path(&manifest)?;
            let mut processor = BatchProcessor::new();
            let zip_path = processor.process_convert_and_zip(&manifest.jobs, &output_dir)?;
            print_json(&json!({
                "zipPath": zip_path,
                "processedFiles": processor.processed_files,
            }))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    if let Err(e) = Logger::init(100, LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    set_console_logging(!quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if quiet {
                eprintln!("error: {}", e);
            } else {
                log::error!("{}", e);
            }
            ExitCode::FAILURE
        }
    }
}
