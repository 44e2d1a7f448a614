#![forbid(unsafe_code)]

//! Core domain model and allocation logic for IV lumen planning.
//!
//! This crate provides:
//! - Domain types (drugs, compatibility statuses, lumens, warnings)
//! - The drug/compatibility database and a built-in sample set
//! - Pairwise classification and conflict graph construction
//! - Greedy lumen allocation and recommendations
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod database;
pub mod sample;
pub mod classifier;
pub mod graph;
pub mod allocator;
pub mod recommend;
pub mod planner;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use database::{CompatibilityRepository, DrugDatabase, DrugFilter};
pub use sample::{build_sample_database, sample_database};
pub use classifier::CompatibilityClassifier;
pub use graph::{ConflictGraph, ConflictGraphBuilder, DrugNode};
pub use allocator::{allocate, LumenConfiguration};
pub use recommend::{recommend, Recommendation};
pub use planner::{plan, LumenPlan, PlanOptions};
