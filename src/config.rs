// # Simulator Tunables
//
// Central home for the knobs that shape a simulation run. Every constant here
// maps to a parameter of the LIRS policy as described in the SIGMETRICS '02
// paper; `SimConfig` bundles them so a driver can carry one value around
// instead of four.

use crate::error::{Result, SimError};

/// Percent of cache capacity reserved for resident HIR blocks.
///
/// The paper recommends ~1% of the cache for the HIR working area; the rest
/// holds the LIR set.
pub const HIR_RATE: f64 = 1.0;

/// Floor on the resident-HIR capacity.
///
/// With very small caches a 1% share rounds to nothing; the queue always
/// gets at least this many frames so eviction has a victim to pick.
pub const MIN_HIR_BLOCKS: usize = 2;

/// Number of leading references excluded from the miss counters (warmup).
pub const STAT_START: u64 = 0;

/// Smallest cache size the driver accepts from a parameter file.
pub const MIN_CACHE_SIZE: usize = 10;

/// Knobs for one simulation run.
///
/// `Default` reproduces the reference configuration: 1% HIR share with a
/// floor of two frames, no stack-length cap, no warmup.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Percent of capacity reserved for resident HIR blocks.
    pub hir_rate: f64,
    /// Floor on the resident-HIR capacity.
    pub min_hir: usize,
    /// Upper bound on LIRS stack entries; `None` leaves the stack unbounded.
    pub max_s_len: Option<usize>,
    /// References to process before miss counting starts.
    pub stat_start: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hir_rate: HIR_RATE,
            min_hir: MIN_HIR_BLOCKS,
            max_s_len: None,
            stat_start: STAT_START,
        }
    }
}

impl SimConfig {
    /// Resident-HIR capacity for a given cache size:
    /// `max(ceil(hir_rate% * capacity), min_hir)`.
    pub fn hir_capacity(&self, capacity: usize) -> usize {
        // Multiply before dividing so integer-valued shares stay exact
        // under ceil (1% of 1000 must be 10, not 11).
        let share = (self.hir_rate * capacity as f64 / 100.0).ceil() as usize;
        share.max(self.min_hir)
    }

    /// Reject capacities that leave no room for an LIR set.
    ///
    /// The split needs at least one LIR frame and one HIR frame; a `hir_cap`
    /// of zero would make eviction impossible, and `hir_cap >= capacity`
    /// would make promotion impossible.
    pub fn validate(&self, capacity: usize) -> Result<()> {
        if !(self.hir_rate > 0.0) || self.min_hir == 0 {
            return Err(SimError::ConfigInvalid(
                "HIR share must be positive".to_string(),
            ));
        }
        let hir_cap = self.hir_capacity(capacity);
        if hir_cap >= capacity {
            return Err(SimError::ConfigInvalid(format!(
                "cache size {} leaves no LIR frames (hir_cap = {})",
                capacity, hir_cap
            )));
        }
        Ok(())
    }
}
