mod commands;
mod output;

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "formbind",
    version,
    about = "Bind a recorded conversation to the fields of a scanned paper form"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Engine threshold selection shared by the image commands.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Predefined configuration: default, hires
    #[arg(short, long, default_value = "default")]
    preset: String,

    /// Custom JSON configuration file (overrides --preset)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect lines, boxes, checkboxes and text fields in a form image
    Analyze {
        /// Path to the scanned form image
        image: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Split OCR blocks of a form into labels and values
    Classify {
        /// Path to the scanned form image
        image: PathBuf,

        /// JSON file with pre-recognized OCR blocks
        #[arg(short, long, value_name = "FILE")]
        blocks: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Extract entities and citation facts from a transcript
    Parse {
        /// Transcript file (.txt, or .json with segments)
        transcript: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Run the full pipeline: structure, labels, entities and bindings
    #[command(group(ArgGroup::new("speech").required(true).args(["transcript", "media"])))]
    Bind {
        /// Path to the scanned form image
        image: PathBuf,

        /// JSON file with pre-recognized OCR blocks (default: run tesseract)
        #[arg(short, long, value_name = "FILE")]
        blocks: Option<PathBuf>,

        /// Transcript file (.txt, or .json with segments)
        #[arg(short, long, value_name = "FILE")]
        transcript: Option<PathBuf>,

        /// Audio or video recording to transcribe with whisper
        #[arg(short, long, value_name = "FILE")]
        media: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the full result as JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Show the decision trace for every field
        #[arg(long)]
        verbose: bool,
    },
    /// Fill the blanks of a JSON form template from a transcript
    Fill {
        /// JSON template with paragraphs and tables
        template: PathBuf,

        /// JSON list of fields to fill (default: detect blanks in the template)
        #[arg(short, long, value_name = "FILE")]
        fields: Option<PathBuf>,

        /// Transcript file (.txt, or .json with segments)
        #[arg(short, long, value_name = "FILE")]
        transcript: PathBuf,

        /// Write the filled template to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Process a list of jobs in the background, one at a time
    Batch {
        /// JSON list of {image, media, output} jobs
        jobs: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Manage and inspect engine configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List predefined configurations
    List,
    /// Print a predefined configuration as JSON
    Show {
        /// Preset name (e.g., "hires")
        preset: String,
    },
    /// Validate a custom configuration file
    Validate {
        /// Path to JSON configuration file
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            image,
            config,
            output,
        } => commands::analyze::run(&image, &config.preset, config.config.as_deref(), &output),
        Commands::Classify {
            image,
            blocks,
            config,
            output,
        } => commands::analyze::classify(
            &image,
            &blocks,
            &config.preset,
            config.config.as_deref(),
            &output,
        ),
        Commands::Parse { transcript, output } => commands::parse::run(&transcript, &output),
        Commands::Bind {
            image,
            blocks,
            transcript,
            media,
            config,
            output,
            out,
            verbose,
        } => commands::bind::run(commands::bind::BindArgs {
            image,
            blocks,
            transcript,
            media,
            preset: config.preset,
            config: config.config,
            output,
            out,
            verbose,
        }),
        Commands::Fill {
            template,
            fields,
            transcript,
            out,
            output,
        } => commands::fill::run(&template, fields.as_deref(), &transcript, out, &output),
        Commands::Batch { jobs, config } => {
            commands::bind::batch(&jobs, &config.preset, config.config.as_deref())
        }
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(),
            ConfigAction::Show { preset } => commands::config::show(&preset),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
