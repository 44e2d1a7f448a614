//! Drug and compatibility database.
//!
//! The database is loaded once and is read-only afterwards. Pairs are stored
//! under an order-independent key, so `compatibility(a, b)` and
//! `compatibility(b, a)` always agree.

use crate::{CompatibilityStatus, DrugEntry, Error, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Read-only source of drug metadata and pairwise compatibility
pub trait CompatibilityRepository {
    /// Look up a drug by id
    fn drug(&self, id: &str) -> Option<&DrugEntry>;

    /// Recorded status for a pair, or `None` when the pair has no entry
    fn compatibility(&self, a: &str, b: &str) -> Option<CompatibilityStatus>;
}

/// Process-wide database loaded from a file, paired with its source path
static SHARED_DATABASE: OnceCell<(PathBuf, DrugDatabase)> = OnceCell::new();

/// On-disk database format
#[derive(Debug, Deserialize)]
struct DatabaseFile {
    #[serde(default)]
    version: Option<String>,
    drugs: Vec<DrugEntry>,
    #[serde(default)]
    compatibility: Vec<PairRecord>,
}

#[derive(Debug, Deserialize)]
struct PairRecord {
    #[serde(alias = "drugIdA")]
    drug_a: String,
    #[serde(alias = "drugIdB")]
    drug_b: String,
    status: CompatibilityStatus,
}

/// Search filter for listing drugs
#[derive(Clone, Debug, Default)]
pub struct DrugFilter {
    /// Case-insensitive substring of id or either name
    pub query: Option<String>,
    pub cvc_required: Option<bool>,
    pub photosensitive: Option<bool>,
}

/// In-memory drug and compatibility database
#[derive(Clone, Debug, Default)]
pub struct DrugDatabase {
    version: Option<String>,
    drugs: BTreeMap<String, DrugEntry>,
    pairs: HashMap<(String, String), CompatibilityStatus>,
    issues: Vec<String>,
}

fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    let (a, b) = (normalize_id(a), normalize_id(b));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DrugDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a database from its JSON representation
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: DatabaseFile = serde_json::from_str(contents)?;

        let mut db = Self {
            version: file.version,
            ..Self::default()
        };

        for drug in file.drugs {
            let id = drug.id.clone();
            if db.insert_drug(drug).is_some() {
                return Err(Error::Database(format!("Duplicate drug id '{}'", id)));
            }
        }

        for record in file.compatibility {
            db.insert_pair(&record.drug_a, &record.drug_b, record.status);
        }

        Ok(db)
    }

    /// Load a database from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let db = Self::from_json_str(&contents)?;
        tracing::info!(
            "Loaded drug database from {:?}: {} drugs, {} pairs",
            path,
            db.len(),
            db.pair_count()
        );
        Ok(db)
    }

    /// Load a database file once per process and share it.
    ///
    /// Concurrent first calls are serialized by the initialization guard;
    /// later calls for the same path return the cached database. Asking for
    /// a different path after initialization is an error.
    pub fn load_shared(path: &Path) -> Result<&'static DrugDatabase> {
        let (loaded_from, db) =
            SHARED_DATABASE.get_or_try_init(|| Self::load(path).map(|db| (path.to_path_buf(), db)))?;

        if loaded_from != path {
            return Err(Error::Database(format!(
                "Database already loaded from {:?}, cannot switch to {:?}",
                loaded_from, path
            )));
        }

        Ok(db)
    }

    /// Insert a drug, normalizing its id. Returns the entry it replaced, if any.
    pub fn insert_drug(&mut self, mut drug: DrugEntry) -> Option<DrugEntry> {
        drug.id = normalize_id(&drug.id);
        self.drugs.insert(drug.id.clone(), drug)
    }

    /// Record the status of a pair.
    ///
    /// `Unknown` records are ignored. When a pair is recorded twice with
    /// different statuses the more severe one is kept and the disagreement
    /// is noted for [`DrugDatabase::validate`].
    pub fn insert_pair(&mut self, a: &str, b: &str, status: CompatibilityStatus) {
        if status == CompatibilityStatus::Unknown {
            return;
        }

        let key = pair_key(a, b);
        if key.0 == key.1 {
            self.issues
                .push(format!("Drug '{}' has a compatibility entry with itself", key.0));
            return;
        }

        match self.pairs.get(&key).copied() {
            Some(existing) if existing != status => {
                let kept = if status.severity() > existing.severity() {
                    status
                } else {
                    existing
                };
                tracing::warn!(
                    "Asymmetric compatibility for {} / {}: {:?} vs {:?}, keeping {:?}",
                    key.0,
                    key.1,
                    existing,
                    status,
                    kept
                );
                self.issues.push(format!(
                    "Asymmetric compatibility for '{}' and '{}': {:?} vs {:?}",
                    key.0, key.1, existing, status
                ));
                self.pairs.insert(key, kept);
            }
            Some(_) => {}
            None => {
                self.pairs.insert(key, status);
            }
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// All drugs, sorted by id
    pub fn drugs(&self) -> impl Iterator<Item = &DrugEntry> {
        self.drugs.values()
    }

    /// Find a drug by id or by Italian/English name, ignoring case
    pub fn resolve(&self, query: &str) -> Option<&DrugEntry> {
        let needle = normalize_id(query);
        if let Some(drug) = self.drugs.get(&needle) {
            return Some(drug);
        }

        self.drugs.values().find(|d| {
            d.name.it.to_lowercase() == needle || d.name.en.to_lowercase() == needle
        })
    }

    /// Drugs matching every criterion of the filter, sorted by id
    pub fn search(&self, filter: &DrugFilter) -> Vec<&DrugEntry> {
        let query = filter.query.as_deref().map(normalize_id);

        self.drugs
            .values()
            .filter(|d| match &query {
                Some(q) => {
                    d.id.contains(q.as_str())
                        || d.name.it.to_lowercase().contains(q.as_str())
                        || d.name.en.to_lowercase().contains(q.as_str())
                }
                None => true,
            })
            .filter(|d| filter.cvc_required.map_or(true, |v| d.cvc_required == v))
            .filter(|d| filter.photosensitive.map_or(true, |v| d.photosensitive == v))
            .collect()
    }

    /// Validate the database for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.issues.clone();

        for (id, drug) in &self.drugs {
            if id.is_empty() {
                errors.push("Drug has empty ID".to_string());
            }
            if drug.name.it.trim().is_empty() || drug.name.en.trim().is_empty() {
                errors.push(format!("Drug '{}' is missing a name translation", id));
            }
        }

        let mut dangling: Vec<String> = self
            .pairs
            .keys()
            .flat_map(|(a, b)| [a, b])
            .filter(|id| !self.drugs.contains_key(*id))
            .map(|id| format!("Compatibility entry references unknown drug '{}'", id))
            .collect();
        dangling.sort();
        dangling.dedup();
        errors.extend(dangling);

        errors
    }
}

impl CompatibilityRepository for DrugDatabase {
    fn drug(&self, id: &str) -> Option<&DrugEntry> {
        self.drugs.get(&normalize_id(id))
    }

    fn compatibility(&self, a: &str, b: &str) -> Option<CompatibilityStatus> {
        self.pairs.get(&pair_key(a, b)).copied()
    }
}
