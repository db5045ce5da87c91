use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{error, info, warn};

use super::{DatasetErr, Result};

/// The local copy of the datasets, filled on demand from a mirror directory.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
    mirror: Option<PathBuf>,
}

impl DatasetStore {
    /// Creates a new `DatasetStore`.
    ///
    /// # Arguments
    /// * `root` - Where datasets are kept locally, one folder each.
    /// * `mirror` - Where missing datasets are copied from, with `None` they must already
    ///   be present locally.
    pub fn new<P: AsRef<Path>>(root: P, mirror: Option<PathBuf>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mirror,
        }
    }

    /// Makes sure a dataset is present locally.
    ///
    /// A dataset whose folder exists is assumed to be complete. Otherwise every file of the
    /// mirror's folder is copied, if any copy fails the partially written folder is removed.
    ///
    /// # Arguments
    /// * `name` - The name of the dataset, which is also the name of its folder.
    ///
    /// # Returns
    /// The local folder of the dataset or the reason it couldn't be made available.
    pub fn ensure_local(&self, name: &str) -> Result<PathBuf> {
        let target = self.root.join(name);

        if target.exists() {
            info!("dataset {name} already exists at {}, skipping download", target.display());
            return Ok(target);
        }

        let Some(mirror) = &self.mirror else {
            warn!("dataset {name} is missing and there's no mirror to fetch it from");
            return Err(DatasetErr::NotFound(name.to_string()));
        };

        info!("starting download for dataset {name}");
        match copy_dir(&mirror.join(name), &target) {
            Ok(0) => {
                warn!("no files found for dataset {name}");
                remove(&target);
                Err(DatasetErr::NotFound(name.to_string()))
            }
            Ok(files) => {
                info!("dataset {name} downloaded, {files} files");
                Ok(target)
            }
            Err(e) => {
                error!("error downloading dataset {name}: {e}");
                remove(&target);
                Err(e)
            }
        }
    }
}

/// Copies every file under `from` into `to`, keeping the folder structure.
///
/// # Returns
/// The amount of files copied.
fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| DatasetErr::Io { path, source }
    };

    let entries = match fs::read_dir(from) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(io_err(from)(e)),
    };

    fs::create_dir_all(to).map_err(io_err(to))?;

    let mut files = 0;
    for entry in entries {
        let entry = entry.map_err(io_err(from))?;
        let path = entry.path();
        let dest = to.join(entry.file_name());

        if entry.file_type().map_err(io_err(path.as_path()))?.is_dir() {
            files += copy_dir(&path, &dest)?;
        } else {
            fs::copy(&path, &dest).map_err(io_err(path.as_path()))?;
            files += 1;
        }
    }

    Ok(files)
}

fn remove(dir: &Path) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!("couldn't clean up {}: {e}", dir.display());
        }
    }
}
