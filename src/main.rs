use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sequence_predictor::console::{Console, OutputFormat, SessionOptions};
use sequence_predictor::{DetectorKind, Predictor, PredictorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "sequence-predictor",
    version,
    about = "Predict the next number of a three-term sequence"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
    /// Emit one JSON object per prediction instead of text
    #[arg(long, global = true)]
    json: bool,
    /// Also show every detector's verdict
    #[arg(long, global = true)]
    explain: bool,
    /// Run only these detectors (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "DETECTORS", global = true)]
    only: Vec<DetectorKind>,
    /// Skip these detectors (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "DETECTORS", global = true)]
    skip: Vec<DetectorKind>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prompt for sequences until 'quit' (default)
    Interactive,
    /// Predict a single sequence given on the command line
    Predict {
        #[arg(allow_negative_numbers = true, num_args = 1.., value_name = "N")]
        terms: Vec<f64>,
    },
    /// Run the built-in example sequences
    Demo,
    /// Predict one sequence per line from a file (stdin when omitted)
    Batch {
        #[arg(short = 'i', long = "input", value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // stdout carries predictions; logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sequence_predictor=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut cfg = PredictorConfig::default();
    if !cli.only.is_empty() {
        cfg = cfg.only(&cli.only);
    }
    if !cli.skip.is_empty() {
        cfg = cfg.without(&cli.skip);
    }
    tracing::debug!(detectors = ?cfg.detectors, "predictor registry");
    let predictor = Predictor::with_config(cfg);

    let opts = SessionOptions {
        format: if cli.json { OutputFormat::Json } else { OutputFormat::Text },
        explain: cli.explain,
    };
    let console = Console::new(&predictor, opts);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.cmd.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let stats = console.interactive(io::stdin().lock(), &mut out)?;
            tracing::info!(predictions = stats.predictions, rejected = stats.rejected, "session finished");
        }
        Command::Predict { terms } => {
            let prediction = predictor.predict(&terms)?;
            let seq = [terms[0], terms[1], terms[2]];
            console.report(&mut out, None, seq, &prediction)?;
        }
        Command::Demo => {
            console.demo(&mut out)?;
        }
        Command::Batch { input } => {
            let stats = match input {
                Some(path) => {
                    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
                    console.batch(BufReader::new(file), &mut out)?
                }
                None => console.batch(io::stdin().lock(), &mut out)?,
            };
            if stats.rejected > 0 {
                tracing::warn!(rejected = stats.rejected, "some batch lines were skipped");
            }
            tracing::info!(predictions = stats.predictions, "batch finished");
        }
    }
    Ok(())
}
