use std::{fmt, num::NonZeroUsize};

use ndarray::{Array2, ArrayView2, Axis};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// The kind of problem a dataset poses, it dictates the label convention and the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    BinaryClassification,
    MulticlassClassification,
}

impl TaskKind {
    /// Returns the identifier of this task kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::BinaryClassification => "binary_classification",
            TaskKind::MulticlassClassification => "multiclass_classification",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The expected outputs of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets {
    /// Floating point targets, one row per sample.
    Values(Array2<f32>),
    /// Integer class labels, one per sample.
    Classes(Vec<usize>),
}

impl Targets {
    /// Returns the amount of samples these targets hold.
    pub fn len(&self) -> usize {
        match self {
            Targets::Values(values) => values.nrows(),
            Targets::Classes(classes) => classes.len(),
        }
    }

    /// Returns `true` if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the name of the element type, the way the numeric backend reports it.
    pub fn scalar_type(&self) -> &'static str {
        match self {
            Targets::Values(_) => "Float",
            Targets::Classes(_) => "Long",
        }
    }

    /// Gives the integer class labels.
    ///
    /// # Returns
    /// The class labels or `ScalarTypeMismatch` if these targets are floating point values.
    pub fn classes(&self) -> Result<&[usize]> {
        match self {
            Targets::Classes(classes) => Ok(classes),
            Targets::Values(_) => Err(MlErr::ScalarTypeMismatch {
                expected: "Long",
                found: self.scalar_type(),
            }),
        }
    }

    /// Views the targets with the shape of some prediction.
    ///
    /// # Arguments
    /// * `shape` - The shape of the prediction.
    ///
    /// # Returns
    /// The reshaped targets or `InvalidReshape` if the amount of elements differ.
    pub fn view_as(&self, shape: (usize, usize)) -> Result<Array2<f32>> {
        let flat: Vec<f32> = match self {
            Targets::Values(values) => values.iter().copied().collect(),
            Targets::Classes(classes) => classes.iter().map(|&c| c as f32).collect(),
        };

        let size = flat.len();
        Array2::from_shape_vec(shape, flat).map_err(|_| MlErr::InvalidReshape { shape, size })
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            Targets::Values(values) => Targets::Values(values.select(Axis(0), rows)),
            Targets::Classes(classes) => {
                Targets::Classes(rows.iter().map(|&row| classes[row]).collect())
            }
        }
    }
}

/// A group of samples fed to a model at once.
#[derive(Debug, Clone)]
pub struct Batch {
    pub x: Array2<f32>,
    pub y: Targets,
}

/// A set of samples and their expected outputs.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f32>,
    y: Targets,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The samples, one per row.
    /// * `y` - The targets, one per sample.
    ///
    /// # Returns
    /// A new `Dataset` or `TargetSizeMismatch` if the amount of samples and targets differ.
    pub fn new(x: Array2<f32>, y: Targets) -> Result<Self> {
        if x.nrows() != y.len() {
            let width = match &y {
                Targets::Values(values) => values.ncols(),
                Targets::Classes(_) => 1,
            };

            return Err(MlErr::TargetSizeMismatch {
                prediction: x.dim(),
                target: (y.len(), width),
            });
        }

        Ok(Self { x, y })
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    /// Returns `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the width of a single sample.
    pub fn x_size(&self) -> usize {
        self.x.ncols()
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn y(&self) -> &Targets {
        &self.y
    }

    /// Iterates the dataset in batches following the order of the samples.
    ///
    /// # Arguments
    /// * `batch_size` - The maximum amount of samples per batch, the last one may be smaller.
    pub fn batches(&self, batch_size: NonZeroUsize) -> Batches<'_> {
        Batches::new(self, (0..self.len()).collect(), batch_size)
    }

    /// Iterates the dataset in batches after shuffling the samples.
    ///
    /// # Arguments
    /// * `batch_size` - The maximum amount of samples per batch, the last one may be smaller.
    /// * `rng` - The random number generator used for shuffling.
    pub fn shuffled_batches<R: Rng + ?Sized>(
        &self,
        batch_size: NonZeroUsize,
        rng: &mut R,
    ) -> Batches<'_> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        Batches::new(self, order, batch_size)
    }
}

/// Iterator over the batches of a `Dataset`.
pub struct Batches<'a> {
    dataset: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl<'a> Batches<'a> {
    fn new(dataset: &'a Dataset, order: Vec<usize>, batch_size: NonZeroUsize) -> Self {
        Self {
            dataset,
            order,
            batch_size: batch_size.get(),
            cursor: 0,
        }
    }

    /// Returns the amount of batches this iterator yields in total.
    pub fn count_total(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.order.len());
        let rows = &self.order[self.cursor..end];
        self.cursor = end;

        Some(Batch {
            x: self.dataset.x.select(Axis(0), rows),
            y: self.dataset.y.select(rows),
        })
    }
}
