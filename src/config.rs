use std::{env, error::Error, fmt, num::NonZeroUsize, path::PathBuf, str::FromStr};

pub const DATASETS_PATH: &str = "ENGINE_DATASETS_PATH";
pub const DATASET_MIRROR: &str = "ENGINE_DATASET_MIRROR";
pub const BATCH_SIZE: &str = "ENGINE_BATCH_SIZE";
pub const TRAIN_SPLIT: &str = "ENGINE_TRAIN_SPLIT";
pub const SEED: &str = "ENGINE_SEED";

const DEFAULT_DATASETS_PATH: &str = "/tmp/datasets";
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(2).unwrap();
const DEFAULT_TRAIN_SPLIT: f64 = 0.8;

/// A configuration variable that couldn't be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErr {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.key, self.value)
    }
}

impl Error for ConfigErr {}

/// The settings of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Where datasets are kept locally.
    pub datasets_path: PathBuf,
    /// The directory datasets are fetched from when they are missing locally.
    pub mirror: Option<PathBuf>,
    pub batch_size: NonZeroUsize,
    /// The fraction of every dataset used for training, the rest is used for testing.
    pub train_split: f64,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            datasets_path: PathBuf::from(DEFAULT_DATASETS_PATH),
            mirror: None,
            batch_size: DEFAULT_BATCH_SIZE,
            train_split: DEFAULT_TRAIN_SPLIT,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigErr> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration out of a key lookup, unset keys take their default.
    ///
    /// # Arguments
    /// * `lookup` - Gives the value of a key, if it's set.
    ///
    /// # Returns
    /// The configuration or the first variable that couldn't be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DATASETS_PATH) {
            config.datasets_path = PathBuf::from(path);
        }

        config.mirror = lookup(DATASET_MIRROR).map(PathBuf::from);

        if let Some(batch_size) = parse(&lookup, BATCH_SIZE)? {
            config.batch_size = batch_size;
        }

        if let Some(split) = parse::<f64, _>(&lookup, TRAIN_SPLIT)? {
            if !(split > 0. && split < 1.) {
                return Err(ConfigErr {
                    key: TRAIN_SPLIT,
                    value: split.to_string(),
                });
            }
            config.train_split = split;
        }

        config.seed = parse(&lookup, SEED)?;
        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigErr>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigErr { key, value })
}
