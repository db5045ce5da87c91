use std::collections::{BTreeMap, BTreeSet};

use machine_learning::{
    MlErr,
    dataset::{Dataset, TaskKind, Targets},
};
use ndarray::{Array2, Axis};
use orchestrator::{LoadedDataset, LossKind};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::{CsvTable, DatasetErr, Result};

const SPLIT_SEED: u64 = 42;

/// The datasets jobs can be run against, each with its own encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownDataset {
    /// Categorical mushroom features, one hot encoded, poisonous or not.
    Mushrooms,
    /// Email bodies as word counts, spam or not.
    Emails,
    /// Standardized daily measurements, one of a handful of weather kinds.
    Weather,
}

/// Encoded labels, before the train/test split.
enum Labels {
    Binary(Vec<bool>),
    Classes(Vec<usize>, usize),
}

impl KnownDataset {
    pub fn parse(name: &str) -> Option<Self> {
        let dataset = match name {
            "mushrooms" => Self::Mushrooms,
            "emails" => Self::Emails,
            "weather" => Self::Weather,
            _ => return None,
        };

        Some(dataset)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mushrooms => "mushrooms",
            Self::Emails => "emails",
            Self::Weather => "weather",
        }
    }

    /// Returns the name of the csv file inside the dataset's folder.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Mushrooms => "mushrooms.csv",
            Self::Emails => "emails.csv",
            Self::Weather => "weather.csv",
        }
    }

    pub fn task(&self) -> TaskKind {
        match self {
            Self::Mushrooms | Self::Emails => TaskKind::BinaryClassification,
            Self::Weather => TaskKind::MulticlassClassification,
        }
    }

    /// Encodes the rows of this dataset and splits them for training and testing.
    ///
    /// # Arguments
    /// * `table` - The raw rows.
    /// * `loss` - The loss the model will be trained with, binary labels are -1 and 1
    ///   for hinge and 0 and 1 otherwise.
    /// * `train_split` - The fraction of rows used for training.
    ///
    /// # Returns
    /// The split dataset or the reason the rows couldn't be encoded.
    pub fn load(
        &self,
        table: &CsvTable,
        loss: Option<LossKind>,
        train_split: f64,
    ) -> Result<LoadedDataset> {
        if table.is_empty() {
            return Err(MlErr::EmptyDataset.into());
        }

        let (x, labels) = match self {
            Self::Mushrooms => mushrooms(table)?,
            Self::Emails => emails(table)?,
            Self::Weather => weather(table)?,
        };

        let (targets, output_width) = match labels {
            Labels::Binary(positive) => {
                let negative = match loss {
                    Some(LossKind::Hinge) => -1.,
                    _ => 0.,
                };
                let y: Vec<f32> = positive
                    .iter()
                    .map(|&p| if p { 1. } else { negative })
                    .collect();
                let y = Array2::from_shape_vec((positive.len(), 1), y).map_err(|_| {
                    MlErr::InvalidReshape {
                        shape: (positive.len(), 1),
                        size: positive.len(),
                    }
                })?;
                (Targets::Values(y), 1)
            }
            Labels::Classes(classes, count) => (Targets::Classes(classes), count),
        };

        let (train, test) = split(x, targets, train_split)?;
        let input_width = train.x_size();

        Ok(LoadedDataset {
            train,
            test,
            input_width,
            output_width,
            task: self.task(),
        })
    }
}

/// Shuffles the rows with a fixed seed, the first ones are held out for testing.
fn split(x: Array2<f32>, y: Targets, train_split: f64) -> Result<(Dataset, Dataset)> {
    let n = x.nrows();
    let n_test = ((1. - train_split) * n as f64).ceil() as usize;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));
    let (test, train) = indices.split_at(n_test.min(n));

    let take = |rows: &[usize]| -> Result<Dataset> {
        let targets = match &y {
            Targets::Values(values) => Targets::Values(values.select(Axis(0), rows)),
            Targets::Classes(classes) => {
                Targets::Classes(rows.iter().map(|&i| classes[i]).collect())
            }
        };

        Ok(Dataset::new(x.select(Axis(0), rows), targets)?)
    };

    Ok((take(train)?, take(test)?))
}

fn binary_labels(table: &CsvTable, column: &str, positive: &str) -> Result<Labels> {
    let column = table.column(column)?;
    let labels = table.values(column).map(|(_, v)| v.trim() == positive).collect();
    Ok(Labels::Binary(labels))
}

/// Gives each distinct value its index in sorted order.
fn categories<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, usize> {
    let distinct: BTreeSet<&str> = values.map(str::trim).collect();
    distinct.into_iter().enumerate().map(|(i, v)| (v, i)).collect()
}

/// One column per category of every feature.
fn mushrooms(table: &CsvTable) -> Result<(Array2<f32>, Labels)> {
    let labels = binary_labels(table, "class", "p")?;
    let skipped = [table.column("class")?, table.column("veil-type").unwrap_or(usize::MAX)];

    let features: Vec<usize> = (0..table.headers().len())
        .filter(|c| !skipped.contains(c))
        .collect();

    let encodings: Vec<_> = features
        .iter()
        .map(|&c| categories(table.values(c).map(|(_, v)| v)))
        .collect();

    let width: usize = encodings.iter().map(BTreeMap::len).sum();
    let mut x = Array2::<f32>::zeros((table.len(), width));

    for (i, record) in table.records().iter().enumerate() {
        let mut offset = 0;
        for (&c, encoding) in features.iter().zip(&encodings) {
            if let Some(&j) = encoding.get(record.fields[c].trim()) {
                x[(i, offset + j)] = 1.;
            }
            offset += encoding.len();
        }
    }

    Ok((x, labels))
}

/// Lowercase words of at least two characters.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().count() >= 2)
        .map(str::to_lowercase)
}

/// One column per word of the vocabulary, counting its occurrences.
fn emails(table: &CsvTable) -> Result<(Array2<f32>, Labels)> {
    let labels = binary_labels(table, "label", "spam")?;
    let text = table.column("text")?;

    let vocabulary: BTreeSet<String> = table.values(text).flat_map(|(_, v)| tokens(v)).collect();
    let vocabulary: BTreeMap<String, usize> = vocabulary
        .into_iter()
        .enumerate()
        .map(|(i, word)| (word, i))
        .collect();

    let mut x = Array2::<f32>::zeros((table.len(), vocabulary.len()));
    for (i, (_, body)) in table.values(text).enumerate() {
        for word in tokens(body) {
            if let Some(&j) = vocabulary.get(&word) {
                x[(i, j)] += 1.;
            }
        }
    }

    Ok((x, labels))
}

/// Every numeric column standardized, the date is dropped.
fn weather(table: &CsvTable) -> Result<(Array2<f32>, Labels)> {
    let label = table.column("weather")?;
    let classes = categories(table.values(label).map(|(_, v)| v));
    let labels = table
        .values(label)
        .map(|(_, v)| classes.get(v.trim()).copied().unwrap_or_default())
        .collect();

    let skipped = [label, table.column("date").unwrap_or(usize::MAX)];
    let features: Vec<usize> = (0..table.headers().len())
        .filter(|c| !skipped.contains(c))
        .collect();

    let mut x = Array2::<f32>::zeros((table.len(), features.len()));
    for (j, &c) in features.iter().enumerate() {
        for (i, (line, value)) in table.values(c).enumerate() {
            x[(i, j)] = value.trim().parse::<f32>().map_err(|e| DatasetErr::Parse {
                line,
                reason: format!("{}: {e}", table.headers()[c]),
            })?;
        }
    }

    standardize(&mut x);
    Ok((x, Labels::Classes(labels, classes.len())))
}

/// Centers every column on 0 with unit variance, constant columns are only centered.
fn standardize(x: &mut Array2<f32>) {
    for mut column in x.columns_mut() {
        let n = column.len() as f32;
        let mean = column.sum() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        let std = if var > 0. { var.sqrt() } else { 1. };
        column.mapv_inplace(|v| (v - mean) / std);
    }
}
