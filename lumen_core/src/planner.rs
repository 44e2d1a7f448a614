//! One-call lumen planning pipeline.
//!
//! selection + lumen slots → conflict graph → allocation → recommendations

use crate::allocator::validate_slots;
use crate::{
    allocate, recommend, AllocationResult, CompatibilityRepository, ConflictGraphBuilder,
    ConflictingDataPolicy, LumenSlot, Recommendation, Result,
};
use serde::{Deserialize, Serialize};

/// Knobs for a planning run
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanOptions {
    pub policy: ConflictingDataPolicy,
}

/// Allocation plus the guidance derived from it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LumenPlan {
    pub allocation: AllocationResult,
    pub recommendations: Vec<Recommendation>,
}

/// Plan lumen usage for a selection.
///
/// The lumen configuration is validated before anything else is computed.
/// Each call is independent, so plans may be computed concurrently against a
/// shared repository.
pub fn plan<R, S>(
    repository: &R,
    selection: &[S],
    slots: &[LumenSlot],
    options: &PlanOptions,
) -> Result<LumenPlan>
where
    R: CompatibilityRepository + ?Sized,
    S: AsRef<str>,
{
    validate_slots(slots)?;

    tracing::info!(
        "Planning {} selected drugs over {} lumens ({:?} policy)",
        selection.len(),
        slots.len(),
        options.policy
    );

    let graph = ConflictGraphBuilder::new(repository)
        .with_policy(options.policy)
        .build(selection);
    let allocation = allocate(&graph, slots)?;
    let recommendations = recommend(&allocation);

    Ok(LumenPlan {
        allocation,
        recommendations,
    })
}
