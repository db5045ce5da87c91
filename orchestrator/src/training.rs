use std::num::NonZeroUsize;

use log::{debug, info};
use machine_learning::{MlErr, Result, arch::Sequential, dataset::Dataset};
use rand::{SeedableRng, rngs::StdRng};

use crate::{builder::Hyperparams, report::Reporter};

/// What happened during a training.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    /// The mean loss of every epoch that ran.
    pub losses: Vec<f32>,
    /// Whether the recipient of the updates asked to stop.
    pub cancelled: bool,
}

/// Owns the epoch loop.
pub struct Trainer {
    batch_size: NonZeroUsize,
    rng: StdRng,
}

impl Trainer {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `batch_size` - The maximum amount of samples per optimization step.
    /// * `seed` - The seed used for shuffling, random if `None`.
    pub fn new(batch_size: NonZeroUsize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self { batch_size, rng }
    }

    /// Trains a model for at most `hyperparams.epochs` epochs.
    ///
    /// After every epoch the mean loss is reported and the loop waits for the acknowledgment,
    /// it stops right away if the acknowledgment asks to.
    ///
    /// # Arguments
    /// * `model` - The model to train.
    /// * `data` - The training samples, shuffled on every epoch.
    /// * `hyperparams` - The loss, optimizer, learning rate and amount of epochs.
    /// * `reporter` - Where the progress goes.
    ///
    /// # Returns
    /// The outcome of the training or the backend failure that interrupted it.
    pub fn train(
        &mut self,
        model: &mut Sequential,
        data: &Dataset,
        hyperparams: &Hyperparams,
        reporter: &mut Reporter<'_>,
    ) -> Result<TrainOutcome> {
        if data.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let loss_fn = hyperparams.loss.build();
        let mut optimizer = hyperparams.optimizer.build(hyperparams.lr);
        let epochs = hyperparams.epochs.get();

        let mut outcome = TrainOutcome {
            losses: Vec::with_capacity(epochs),
            cancelled: false,
        };

        for epoch in 1..=epochs {
            let batches = data.shuffled_batches(self.batch_size, &mut self.rng);
            let nbatches = batches.count_total();
            let mut running_loss = 0.;

            for batch in batches {
                model.zero_grad();
                let y_pred = model.forward(batch.x.view(), true)?;
                let (loss, d) = loss_fn.evaluate(y_pred.view(), &batch.y)?;
                model.backward(d)?;
                model.step(&mut *optimizer)?;
                running_loss += loss;
            }

            let loss = running_loss / nbatches as f32;
            debug!(epoch = epoch, loss = loss; "epoch finished");
            outcome.losses.push(loss);

            if reporter.progress(epoch, epochs, loss).stop_training {
                info!(job_id = reporter.job_id(), epoch = epoch; "training stopped by user");
                outcome.cancelled = true;
                break;
            }
        }

        Ok(outcome)
    }
}
