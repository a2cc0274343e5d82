use std::fmt;
use std::time::Instant;

use log::{debug, info};
use rand::Rng;

use crate::data::batches::{BatchSource, Batches};
use crate::error::Result;
use crate::network::network::Network;
use crate::optim::schedule::ExponentialDecay;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::EpochSummary;
use crate::train::metric_log::{CompletedLog, MetricEntry, MetricLog};
use crate::train::step::train_step;
use crate::train::train_config::TrainConfig;
use crate::train::validator::evaluate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    EpochRunning(usize),
    Finalizing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initializing => write!(f, "initializing"),
            Phase::EpochRunning(e) => write!(f, "epoch {}", e),
            Phase::Finalizing => write!(f, "finalizing"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub log: CompletedLog,
    pub epochs: Vec<EpochSummary>,
    /// Total number of batches applied.
    pub global_step: u64,
}

/// Drives the epoch loop: learning-rate decay, one SGD step per batch,
/// online validation at a fixed step cadence and a single test pass at the
/// end.
#[derive(Debug)]
pub struct Trainer {
    phase: Phase,
    epochs: usize,
    schedule: ExponentialDecay,
    log_every_n_steps: u64,
    num_online_val_steps: usize,
    global_step: u64,
    log: MetricLog,
}

impl Trainer {
    pub fn new(config: &TrainConfig) -> Result<Trainer> {
        config.validate()?;
        Ok(Trainer {
            phase: Phase::Initializing,
            epochs: config.epochs,
            schedule: ExponentialDecay::new(config.learning_rate, config.decay_factor)?,
            log_every_n_steps: config.log_every_n_steps,
            num_online_val_steps: config.num_online_val_steps,
            global_step: 0,
            log: MetricLog::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!("trainer: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Runs the whole schedule.
    ///
    /// `train` is reshuffled with `rng` before every epoch; `validation` and
    /// `test` are only ever read.  `test` is evaluated exactly once, after
    /// the last epoch.
    pub fn run<V, T, R>(
        mut self,
        network: &mut Network,
        optimizer: &mut Sgd,
        train: &mut Batches,
        validation: &V,
        test: &T,
        rng: &mut R,
    ) -> Result<TrainReport>
    where
        V: BatchSource + ?Sized,
        T: BatchSource + ?Sized,
        R: Rng + ?Sized,
    {
        info!(
            "Training for {} epochs of {} batches ({} examples, batch size {})",
            self.epochs,
            train.num_batches(),
            train.num_examples(),
            train.batch_size()
        );

        let mut summaries = Vec::with_capacity(self.epochs);
        for epoch in 0..self.epochs {
            self.enter(Phase::EpochRunning(epoch));
            summaries.push(self.run_epoch(epoch, network, optimizer, train, validation, rng)?);
        }

        self.enter(Phase::Finalizing);
        let test_accuracy = evaluate(network, test)?.value();
        info!("{}", metric_line(self.global_step, "Test Accuracy", test_accuracy));

        self.enter(Phase::Done);
        Ok(TrainReport {
            log: self.log.finalize(test_accuracy),
            epochs: summaries,
            global_step: self.global_step,
        })
    }

    fn run_epoch<V, R>(
        &mut self,
        epoch: usize,
        network: &mut Network,
        optimizer: &mut Sgd,
        train: &mut Batches,
        validation: &V,
        rng: &mut R,
    ) -> Result<EpochSummary>
    where
        V: BatchSource + ?Sized,
        R: Rng + ?Sized,
    {
        let learning_rate = self.schedule.rate_at(epoch);
        optimizer.set_learning_rate(learning_rate);
        info!("Starting epoch {} - learning rate: {}", epoch, learning_rate);

        let t_start = Instant::now();
        train.reshuffle(rng);
        let train: &Batches = train;

        let batches = train.num_batches();
        let mut loss_sum = 0.0;
        for index in 0..batches {
            let batch = train.batch(index);
            let loss = train_step(network, optimizer, &batch)?;
            loss_sum += loss;

            if self.global_step % self.log_every_n_steps == 0 {
                self.log_metrics(loss, network, train, validation)?;
            }
            self.global_step += 1;
        }

        let summary = EpochSummary {
            epoch,
            learning_rate,
            batches,
            mean_loss: loss_sum / batches as f64,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            "Finished epoch {} - mean loss: {} ({} ms)",
            epoch, summary.mean_loss, summary.elapsed_ms
        );
        Ok(summary)
    }

    fn log_metrics<V>(&mut self, loss: f64, network: &Network, train: &Batches, validation: &V) -> Result<()>
    where
        V: BatchSource + ?Sized,
    {
        let val_accuracy = evaluate(network, validation)?.value();
        let val_accuracy_on_train = evaluate(network, &train.take(self.num_online_val_steps))?.value();

        let step = self.global_step;
        info!("{}", metric_line(step, "Loss", loss));
        info!("{}", metric_line(step, "Online VAL Accuracy", val_accuracy));
        info!("{}", metric_line(step, "Online VAL ON TRAIN Accuracy", val_accuracy_on_train));

        self.log.push(MetricEntry { global_step: step, loss, val_accuracy, val_accuracy_on_train });
        Ok(())
    }
}

/// `Step: N - <name>: x.xxxx`, the line format reference runs print.
fn metric_line(step: u64, name: &str, value: f64) -> String {
    format!("Step: {} - {}: {:.4}", step, name, value)
}
