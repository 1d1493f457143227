use anyhow::Result;
use clap::{Parser, Subcommand};
use heddle::commands::{consume, deploy, inspect, republish, submit, watch, Runtime};
use heddle::config::Config;
use heddle::logging::init_logging;
use heddle::validation::clap_job_id_validator;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heddle")]
#[command(about = "Job-stage orchestrator for multi-stage processing pipelines", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: $HEDDLE_CONFIG, then ~/.config/heddle/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a process definition after validating its stage layout
    Deploy {
        /// Process definition JSON file ("-" for stdin)
        file: PathBuf,
    },

    /// Create a job and queue its entry notification
    Submit {
        /// Process ID
        process_id: String,

        /// Process version
        version: String,

        /// Job inputs JSON file ("-" for stdin)
        inputs: PathBuf,

        /// Start the job immediately instead of queueing the entry notification
        #[arg(long)]
        now: bool,
    },

    /// Process notifications from a file or stdin
    ///
    /// Accepts a bare notification, a JSON array, a queue batch with
    /// `Records[].body`, or a topic envelope with `Message`.
    Consume {
        /// Notification file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Poll the inbox directory and process queued notifications
    Watch {
        /// Drain the inbox once and exit
        #[arg(long)]
        once: bool,
    },

    /// Show the status of a job
    Status {
        /// Job ID
        #[arg(value_parser = clap_job_id_validator)]
        job_id: String,
    },

    /// Show the results of a job
    Results {
        /// Job ID
        #[arg(value_parser = clap_job_id_validator)]
        job_id: String,
    },

    /// Show the log entries of a job
    Logs {
        /// Job ID
        #[arg(value_parser = clap_job_id_validator)]
        job_id: String,
    },

    /// Re-send the request for a job's current stage
    Republish {
        /// Job ID
        #[arg(value_parser = clap_job_id_validator)]
        job_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config.log.level);
    let runtime = Runtime::from_config(config)?;

    match cli.command {
        Commands::Deploy { file } => deploy::execute(&runtime, &file),
        Commands::Submit {
            process_id,
            version,
            inputs,
            now,
        } => submit::execute(&runtime, &process_id, &version, &inputs, now),
        Commands::Consume { file } => consume::execute(&runtime, file.as_deref()),
        Commands::Watch { once } => watch::execute(&runtime, once),
        Commands::Status { job_id } => inspect::status(&runtime, &job_id),
        Commands::Results { job_id } => inspect::results(&runtime, &job_id),
        Commands::Logs { job_id } => inspect::logs(&runtime, &job_id),
        Commands::Republish { job_id } => republish::execute(&runtime, &job_id),
    }
}
