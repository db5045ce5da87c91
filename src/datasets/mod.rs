mod csv;
mod registry;
mod store;

use std::{error::Error, fmt, io, path::PathBuf};

use log::info;
use machine_learning::MlErr;
use orchestrator::{LoadedDataset, LossKind};

use crate::config::EngineConfig;

pub use csv::{CsvTable, Record};
pub use registry::KnownDataset;
pub use store::DatasetStore;

/// Why a dataset couldn't be made available.
#[derive(Debug)]
pub enum DatasetErr {
    /// The dataset is not one of the known datasets.
    Unknown(String),
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Parse {
        line: usize,
        reason: String,
    },
    MissingColumn(String),
    /// The dataset is neither stored locally nor in the mirror.
    NotFound(String),
    /// The encoded samples couldn't be turned into a dataset.
    Backend(MlErr),
}

impl fmt::Display for DatasetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetErr::Unknown(name) => write!(f, "dataset not available: {name}"),
            DatasetErr::Io { path, source } => write!(f, "{}: {source}", path.display()),
            DatasetErr::Parse { line, reason } => write!(f, "line {line}: {reason}"),
            DatasetErr::MissingColumn(column) => write!(f, "missing column {column:?}"),
            DatasetErr::NotFound(name) => write!(f, "dataset {name} not found"),
            DatasetErr::Backend(e) => write!(f, "{e}"),
        }
    }
}

impl Error for DatasetErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DatasetErr::Io { source, .. } => Some(source),
            DatasetErr::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for DatasetErr {
    fn from(e: MlErr) -> Self {
        DatasetErr::Backend(e)
    }
}

pub type Result<T> = std::result::Result<T, DatasetErr>;

/// Makes a dataset available locally and loads it, ready to be fed to a model.
///
/// # Arguments
/// * `config` - Where datasets live and how they are split.
/// * `name` - The name of a known dataset.
/// * `loss` - The loss the model will be trained with, it decides the binary label convention.
///
/// # Returns
/// The split dataset or the reason it couldn't be loaded.
pub fn load(config: &EngineConfig, name: &str, loss: Option<LossKind>) -> Result<LoadedDataset> {
    let dataset = KnownDataset::parse(name).ok_or_else(|| DatasetErr::Unknown(name.to_string()))?;

    let store = DatasetStore::new(&config.datasets_path, config.mirror.clone());
    let dir = store.ensure_local(dataset.as_str())?;

    let table = CsvTable::from_path(dir.join(dataset.file_name()))?;
    info!(dataset = name, rows = table.len(); "dataset read");

    dataset.load(&table, loss, config.train_split)
}
