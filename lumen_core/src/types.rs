//! Core domain types for the lumen allocation system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Bilingual text and locale selection
//! - Drug entries and pairwise compatibility statuses
//! - Lumen slots (configuration) and lumens (allocation output)
//! - Warnings and the allocation result

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Locale and Text
// ============================================================================

/// Display language for drug names and recommendations
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    It,
    En,
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "it" | "it-it" | "ita" | "italiano" => Ok(Locale::It),
            "en" | "en-us" | "en-gb" | "eng" | "english" => Ok(Locale::En),
            other => Err(Error::Config(format!("Unsupported locale '{}'", other))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::It => write!(f, "it"),
            Locale::En => write!(f, "en"),
        }
    }
}

/// Text carried in both supported languages
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LocalizedText {
    pub it: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(it: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            it: it.into(),
            en: en.into(),
        }
    }

    /// Select the text for a locale
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::It => &self.it,
            Locale::En => &self.en,
        }
    }
}

// ============================================================================
// Drugs and Compatibility
// ============================================================================

/// A drug as stored in the compatibility database. Immutable once loaded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrugEntry {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default, alias = "isPhotosensitive")]
    pub photosensitive: bool,
    #[serde(default, alias = "cvcRequired")]
    pub cvc_required: bool,
}

impl DrugEntry {
    pub fn display_name(&self, locale: Locale) -> &str {
        self.name.get(locale)
    }
}

/// Pairwise compatibility between two drugs.
///
/// Short codes (`C`, `Y`, `I`, `!`) and the legacy hyphenated spellings are
/// accepted on input; output always uses the snake_case names.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityStatus {
    #[serde(alias = "C")]
    Compatible,
    #[serde(alias = "I", alias = "incompatible-severe")]
    Incompatible,
    #[serde(alias = "Y", alias = "compatible-conditional")]
    YSiteOnly,
    #[serde(alias = "!")]
    ConflictingData,
    #[serde(alias = "")]
    Unknown,
}

impl CompatibilityStatus {
    /// Ordering used when two records for the same pair disagree (higher wins)
    pub fn severity(self) -> u8 {
        match self {
            CompatibilityStatus::Unknown => 0,
            CompatibilityStatus::Compatible => 1,
            CompatibilityStatus::YSiteOnly => 2,
            CompatibilityStatus::ConflictingData => 3,
            CompatibilityStatus::Incompatible => 4,
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (CompatibilityStatus::Compatible, Locale::It) => "COMPATIBILE",
            (CompatibilityStatus::Compatible, Locale::En) => "COMPATIBLE",
            (CompatibilityStatus::Incompatible, Locale::It) => "INCOMPATIBILE",
            (CompatibilityStatus::Incompatible, Locale::En) => "INCOMPATIBLE",
            (CompatibilityStatus::YSiteOnly, Locale::It) => "COMPATIBILE AL RUBINETTO",
            (CompatibilityStatus::YSiteOnly, Locale::En) => "Y-SITE COMPATIBLE",
            (CompatibilityStatus::ConflictingData, Locale::It) => "DATI CONTRASTANTI",
            (CompatibilityStatus::ConflictingData, Locale::En) => "CONFLICTING DATA",
            (CompatibilityStatus::Unknown, Locale::It) => "NESSUN DATO",
            (CompatibilityStatus::Unknown, Locale::En) => "NO DATA",
        }
    }
}

/// How `ConflictingData` pairs are treated when building the conflict graph
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictingDataPolicy {
    /// Conflicting data blocks co-location, same as `Incompatible`
    #[default]
    Block,
    /// Conflicting data is reported but does not constrain placement
    Warn,
}

impl FromStr for ConflictingDataPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(ConflictingDataPolicy::Block),
            "warn" => Ok(ConflictingDataPolicy::Warn),
            other => Err(Error::Config(format!(
                "Unknown conflicting-data policy '{}' (expected block or warn)",
                other
            ))),
        }
    }
}

// ============================================================================
// Lumens
// ============================================================================

/// Catheter type of a lumen
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LumenType {
    Cvc,
    Picc,
}

impl FromStr for LumenType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cvc" => Ok(LumenType::Cvc),
            "picc" => Ok(LumenType::Picc),
            other => Err(Error::InvalidConfiguration(format!(
                "Unknown lumen type '{}' (expected cvc or picc)",
                other
            ))),
        }
    }
}

impl fmt::Display for LumenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LumenType::Cvc => write!(f, "CVC"),
            LumenType::Picc => write!(f, "PICC"),
        }
    }
}

/// A configured lumen the allocator may place drugs into
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LumenSlot {
    pub index: usize,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub lumen_type: Option<LumenType>,
}

impl LumenSlot {
    pub fn untyped(index: usize) -> Self {
        Self {
            index,
            lumen_type: None,
        }
    }

    pub fn typed(index: usize, lumen_type: LumenType) -> Self {
        Self {
            index,
            lumen_type: Some(lumen_type),
        }
    }

    /// A CVC-only drug needs a CVC lumen; untyped lumens accept anything.
    pub fn accepts(&self, cvc_required: bool) -> bool {
        !cvc_required || matches!(self.lumen_type, None | Some(LumenType::Cvc))
    }
}

/// A lumen in the allocation output, with the drugs placed into it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lumen {
    pub index: usize,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub lumen_type: Option<LumenType>,
    /// Drug ids in placement order
    pub assigned: Vec<String>,
    /// At least one assigned drug is photosensitive
    #[serde(default)]
    pub light_protection: bool,
}

// ============================================================================
// Warnings and Results
// ============================================================================

/// A clinically meaningful observation attached to an allocation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Two drugs with a hard edge were forced into the same lumen
    HardConflict {
        drug_a: String,
        drug_b: String,
        lumen: usize,
    },
    /// Two Y-site-only drugs share a lumen and need a Y-site connector
    YSiteRequired {
        drug_a: String,
        drug_b: String,
        lumen: usize,
    },
    /// The database has no record for this pair
    NoCompatibilityData { drug_a: String, drug_b: String },
    /// Literature reports conflicting data for this pair
    ConflictingData { drug_a: String, drug_b: String },
    /// No configured lumen has a type this drug may use
    TypeMismatch { drug: String },
    /// The selected id is not in the database and was dropped
    UnknownDrug { drug: String },
}

/// Outcome of one allocation run. Recomputed, never mutated in place.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AllocationResult {
    /// Lumens that received at least one drug, in index order
    pub lumens: Vec<Lumen>,
    /// Drugs that could not be placed (shown as "NOT AVAILABLE")
    pub unallocated: Vec<String>,
    /// Additional lumens required to remove every forced hard conflict
    pub deficit: usize,
    /// Number of configured lumens
    pub available: usize,
    pub warnings: Vec<Warning>,
}

impl AllocationResult {
    /// Result for an empty selection
    pub fn empty(available: usize) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }

    /// Lumens the selection needs.
    ///
    /// With no deficit this is the number of lumens used. Otherwise every
    /// configured lumen is counted, plus the overflow lumens in `deficit`,
    /// so `needed - available == deficit`.
    pub fn lumens_needed(&self) -> usize {
        if self.deficit == 0 {
            self.lumens.len()
        } else {
            self.available.max(self.lumens.len()) + self.deficit
        }
    }

    /// Index of the lumen holding a drug, if it was placed
    pub fn lumen_of(&self, drug: &str) -> Option<usize> {
        self.lumens
            .iter()
            .find(|l| l.assigned.iter().any(|d| d == drug))
            .map(|l| l.index)
    }

    pub fn hard_conflict_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::HardConflict { .. }))
            .count()
    }
}
