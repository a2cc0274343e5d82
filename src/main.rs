use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::info;

use mnist_sgd::data::loader;
use mnist_sgd::{data, Sgd, TrainConfig, Trainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Idx,
}

/// Train a small MLP digit classifier with mini-batch SGD and record its
/// accuracy curve.
#[derive(Debug, Parser)]
#[command(name = "mnist-sgd", version)]
struct Args {
    /// Dataset layout.
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Training CSV file, or the directory holding the IDX files.
    train: PathBuf,

    /// Test CSV file (csv format only).
    test: Option<PathBuf>,

    /// Where to write the metric log: `.npz` archive, JSON otherwise.
    /// Discarded when omitted.
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// JSON file with training hyperparameters.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn train_config(&self) -> anyhow::Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::load_json(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => TrainConfig::default(),
        };
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.train_config()?;

    let (pool, test) = match args.format {
        Format::Csv => {
            let Some(test_path) = &args.test else {
                bail!("csv format needs both a training and a test file");
            };
            (
                loader::load_csv(&args.train, config.num_classes)?,
                loader::load_csv(test_path, config.num_classes)?,
            )
        }
        Format::Idx => {
            if args.test.is_some() {
                bail!("idx format takes a single directory");
            }
            loader::load_idx_dir(&args.train, config.num_classes)?
        }
    };

    let mut rng = config.rng();
    let mut network = config.network_spec(pool.feature_len()).build(&mut rng)?;
    let mut splits = data::split(pool, test, &config.split_plan())?;
    let mut optimizer = Sgd::new(config.learning_rate);

    let report = Trainer::new(&config)?.run(
        &mut network,
        &mut optimizer,
        &mut splits.train,
        &splits.validation,
        &splits.test,
        &mut rng,
    )?;
    info!(
        "Done after {} steps - test accuracy: {}",
        report.global_step,
        report.log.test_accuracy()
    );

    if let Some(path) = &args.logfile {
        report
            .log
            .save(path)
            .with_context(|| format!("failed to write metric log to {}", path.display()))?;
    }
    Ok(())
}
