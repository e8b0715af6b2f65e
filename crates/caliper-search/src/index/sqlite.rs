use std::path::{Path, PathBuf};

use caliper_core::schema::Database;
use caliper_core::{IndexEntry, Metric, ProviderIdentity, QueryResult};

use crate::error::{IndexError, IndexResult};
use crate::index::{MemoryIndex, VectorIndex};

const META_METRIC: &str = "metric";
const META_MODEL: &str = "model";
const META_DIMENSION: &str = "dimension";

/// Index persisted to a SQLite file.
///
/// Every entry is written through to disk; searches are served from an
/// in-memory mirror loaded when the file is opened.
#[derive(Debug)]
pub struct SqliteIndex {
    db: Database,
    path: PathBuf,
    mirror: MemoryIndex,
}

impl SqliteIndex {
    /// Open (or create) the index at `path`.
    ///
    /// A new file records `metric`; an existing one must have been built with
    /// the same metric.
    pub fn open(path: impl AsRef<Path>, metric: Metric) -> IndexResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(caliper_core::Error::from)?;
        }

        let db = Database::open(path)?;
        if db.get_meta(META_METRIC)?.is_none() {
            db.set_meta(META_METRIC, metric.as_str())?;
        }
        Self::load(db, path, metric)
    }

    /// Open the index at `path` for searching, if the file exists.
    ///
    /// The file is opened read-only: no migrations are applied and no
    /// settings are recorded, so upserts on the result fail.
    pub fn open_existing(path: impl AsRef<Path>, metric: Metric) -> IndexResult<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let db = Database::open_read_only(path)?;
        Self::load(db, path, metric).map(Some)
    }

    fn load(db: Database, path: &Path, metric: Metric) -> IndexResult<Self> {
        if let Some(stored) = db.get_meta(META_METRIC)? {
            let stored: Metric = stored.parse().map_err(IndexError::Corrupt)?;
            if stored != metric {
                return Err(IndexError::MetricMismatch {
                    stored,
                    requested: metric,
                });
            }
        }

        let identity = read_identity(&db)?;
        let entries = db.list_entries()?;

        let mut mirror = MemoryIndex::new(metric);
        match identity {
            Some(identity) => {
                mirror.upsert(&identity, entries).map_err(|e| {
                    IndexError::Corrupt(format!("stored entries are inconsistent: {e}"))
                })?;
            }
            None if !entries.is_empty() => {
                return Err(IndexError::Corrupt(format!(
                    "{} entries stored without an embedding model",
                    entries.len()
                )));
            }
            None => {}
        }

        log::info!(
            "Opened index at {} ({} entries, {})",
            path.display(),
            mirror.len(),
            metric
        );

        Ok(Self {
            db,
            path: path.to_path_buf(),
            mirror,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_identity(db: &Database) -> IndexResult<Option<ProviderIdentity>> {
    let model = db.get_meta(META_MODEL)?;
    let dimension = db.get_meta(META_DIMENSION)?;

    match (model, dimension) {
        (Some(model), Some(dimension)) => {
            let dimension = dimension.parse::<usize>().map_err(|e| {
                IndexError::Corrupt(format!("invalid stored dimension '{dimension}': {e}"))
            })?;
            Ok(Some(ProviderIdentity::new(model, dimension)))
        }
        (None, None) => Ok(None),
        _ => Err(IndexError::Corrupt(
            "embedding model and dimension must be stored together".to_string(),
        )),
    }
}

impl VectorIndex for SqliteIndex {
    fn metric(&self) -> Metric {
        self.mirror.metric()
    }

    fn identity(&self) -> Option<&ProviderIdentity> {
        self.mirror.identity()
    }

    fn len(&self) -> usize {
        self.mirror.len()
    }

    fn upsert(
        &mut self,
        identity: &ProviderIdentity,
        entries: Vec<IndexEntry>,
    ) -> IndexResult<usize> {
        self.mirror.validate(identity, &entries)?;
        if entries.is_empty() {
            return Ok(0);
        }

        // The first batch binds the file to its provider.
        let dimension = identity.dimension.to_string();
        let binding = [
            (META_MODEL, identity.model.as_str()),
            (META_DIMENSION, dimension.as_str()),
        ];
        let meta: &[(&str, &str)] = if self.mirror.identity().is_none() {
            &binding
        } else {
            &[]
        };
        self.db.upsert_entries_with_meta(meta, &entries)?;

        let count = self.mirror.upsert(identity, entries)?;
        log::info!("Stored {} entries in {}", count, self.path.display());
        Ok(count)
    }

    fn search(&self, query: &[f32], top_k: usize) -> IndexResult<Vec<QueryResult>> {
        self.mirror.search(query, top_k)
    }

    fn categories(&self) -> Vec<String> {
        self.mirror.categories()
    }
}
