use std::{
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;

use mpg_regressor::{
    config::{DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE},
    ingest::{self, Columns},
    report, FittedModel, Reduction, TrainConfig,
};

const DEFAULT_PREDICT_WEIGHT: f64 = 3968.0;

#[derive(Debug, Parser)]
#[command(
    name = "mpg_regressor",
    about = "Fit mpg against vehicle weight with gradient descent",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fit a model from a CSV file and predict one weight.
    Fit(FitArgs),

    /// Predict with a previously saved model.
    Predict(PredictArgs),
}

#[derive(Debug, Args)]
struct FitArgs {
    /// CSV file with a header row.
    data: PathBuf,

    #[arg(long, default_value = "weight")]
    x_column: String,

    #[arg(long, default_value = "mpg")]
    y_column: String,

    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    #[arg(long, default_value_t = DEFAULT_EPOCHS)]
    epochs: usize,

    /// Sum gradients across threads.
    #[arg(long)]
    parallel: bool,

    /// Abort the fit after this many seconds.
    #[arg(long)]
    max_seconds: Option<f64>,

    /// Raw weight to predict after fitting.
    #[arg(long, default_value_t = DEFAULT_PREDICT_WEIGHT)]
    predict: f64,

    /// Save the fitted model as a pickle.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write standardized points and the fitted line as CSV.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PredictArgs {
    model: PathBuf,

    /// Raw weights.
    #[arg(required = true)]
    weights: Vec<f64>,
}

impl FitArgs {
    fn train_config(&self) -> Result<TrainConfig> {
        let mut config = TrainConfig::default()
            .with_learning_rate(self.learning_rate)
            .with_epochs(self.epochs);
        if self.parallel {
            config = config.with_reduction(Reduction::Parallel);
        }
        if let Some(secs) = self.max_seconds {
            let deadline = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid --max-seconds {secs}"))?;
            config = config.with_deadline(deadline);
        }
        Ok(config)
    }
}

fn run_fit(args: FitArgs) -> Result<()> {
    let now = Instant::now();
    let columns = Columns {
        x: args.x_column.clone(),
        y: args.y_column.clone(),
    };
    let raw = ingest::read_dataset(&args.data, &columns)
        .with_context(|| format!("reading {}", args.data.display()))?;
    info!("loaded {} samples from {}", raw.len(), args.data.display());

    let model = FittedModel::fit(&raw, args.train_config()?).context("fitting model")?;
    println!("{} {}", model.params.slope, model.params.intercept);
    println!("MODELING DONE!");

    let prediction = model.predict(args.predict);
    println!("Predicted MPG for {} lbs: {:.2}", args.predict, prediction);

    if let Some(path) = &args.save {
        model
            .save(path)
            .with_context(|| format!("saving model to {}", path.display()))?;
        info!("saved model to {}", path.display());
    }
    if let Some(path) = &args.export {
        report::write_fit_file(path, &model.standardize(&raw), model.params)
            .with_context(|| format!("exporting fit to {}", path.display()))?;
        info!("exported fit to {}", path.display());
    }

    info!("Elapsed: {:.2?}", now.elapsed());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let model = FittedModel::load(&args.model)
        .with_context(|| format!("loading model from {}", args.model.display()))?;
    info!(
        "loaded model fitted at {} on {} samples",
        model.fitted_at, model.samples
    );

    for weight in args.weights {
        println!("Predicted MPG for {} lbs: {:.2}", weight, model.predict(weight));
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Fit(args) => run_fit(args),
        Commands::Predict(args) => run_predict(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
