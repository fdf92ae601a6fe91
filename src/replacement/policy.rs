// # Replacement Policies - Common Trait
//
// Every simulated policy sits behind `ReplacementPolicy`: the driver feeds
// one block id per step and counts the hit/miss answers; the policy owns all
// of its bookkeeping. Policies are single-threaded by design (one engine per
// cache size, replayed synchronously), so the trait takes `&mut self` rather
// than hiding a lock.

use crate::config::SimConfig;
use crate::error::Result;
use crate::replacement::block::BlockId;
use crate::replacement::lirs::LirsEngine;
use crate::replacement::lru::LruPolicy;

// ============================================================================
// Replacement Policy Trait
// ============================================================================

/// Outcome of a single reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Hit,
    Miss,
}

/// Base trait for trace-driven replacement policies.
pub trait ReplacementPolicy {
    /// Process one block reference and report whether it hit.
    ///
    /// Fails with `InputFormat` when `id` falls outside the block table and
    /// with `InvariantViolated` on internal bookkeeping bugs.
    fn access(&mut self, id: BlockId) -> Result<AccessKind>;

    /// Return the policy to its freshly-constructed state.
    fn reset(&mut self);

    /// Policy name, also used to derive output file names (`P_LIRS.cuv`).
    fn name(&self) -> &'static str;

    /// Cache frames managed by this policy.
    fn capacity(&self) -> usize;

    /// Metadata entries retained beyond the resident set (LIRS stack
    /// occupancy). Policies without history tracking report zero.
    fn history_len(&self) -> usize {
        0
    }

    /// Internal diagnostic counters.
    fn stats(&self) -> PolicyStats;
}

/// Diagnostic counters common to all policies. Hit/miss accounting lives in
/// the driver; these cover what happens inside the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyStats {
    /// Resident blocks dropped to make room.
    pub evictions: u64,
    /// HIR blocks reclassified as LIR.
    pub promotions: u64,
    /// LIR blocks pushed back to HIR.
    pub demotions: u64,
    /// History entries trimmed from the LIRS stack.
    pub pruned_entries: u64,
}

// ============================================================================
// Policy Factory
// ============================================================================

/// Replacement policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// LIRS (Low Inter-reference Recency Set), the policy under study.
    Lirs,
    /// Plain LRU, kept as the comparison baseline.
    Lru,
}

impl PolicyKind {
    /// Name used in logs and output file names; matches the corresponding
    /// `ReplacementPolicy::name`.
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Lirs => "LIRS",
            PolicyKind::Lru => "LRU",
        }
    }
}

/// Build a policy over `block_count` distinct blocks and `capacity` frames.
pub fn create_policy(
    kind: PolicyKind,
    block_count: usize,
    capacity: usize,
    config: &SimConfig,
) -> Result<Box<dyn ReplacementPolicy>> {
    match kind {
        PolicyKind::Lirs => Ok(Box::new(LirsEngine::new(block_count, capacity, config)?)),
        PolicyKind::Lru => Ok(Box::new(LruPolicy::new(block_count, capacity))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_factory() {
        let config = SimConfig::default();

        let lirs = create_policy(PolicyKind::Lirs, 100, 10, &config).unwrap();
        assert_eq!(lirs.name(), "LIRS");
        assert_eq!(lirs.capacity(), 10);

        let lru = create_policy(PolicyKind::Lru, 100, 10, &config).unwrap();
        assert_eq!(lru.name(), "LRU");
        assert_eq!(lru.history_len(), 0);
    }

    #[test]
    fn test_factory_rejects_degenerate_lirs_split() {
        let config = SimConfig::default();
        // min_hir of 2 leaves no LIR frame in a 2-frame cache
        assert!(create_policy(PolicyKind::Lirs, 10, 2, &config).is_err());
    }
}
