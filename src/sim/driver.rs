// # Simulation Driver
//
// Replays the trace through one freshly built engine per cache size. The
// driver owns everything the policy does not: the reference counters and
// their warmup gate, the stack-occupancy sampler, and the assembly of the
// hit-rate curve across sizes.

use crate::config::SimConfig;
use crate::error::Result;
use crate::replacement::policy::{create_policy, AccessKind, PolicyKind, PolicyStats};
use crate::sim::trace::Trace;
use tracing::{debug, info};

/// Progress log interval, in references.
const PROGRESS_INTERVAL: u64 = 10_000;

// ============================================================================
// Run Accounting
// ============================================================================

/// Per-run reference counters. Misses are only charged after the warmup
/// threshold; duplicates count as references but can never miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total_refs: u64,
    pub warm_refs: u64,
    pub misses: u64,
}

impl RunCounters {
    /// Hit rate in percent over the warmed portion of the trace; 0.0 when
    /// nothing was warmed.
    pub fn hit_rate(&self) -> f64 {
        if self.warm_refs == 0 {
            return 0.0;
        }
        100.0 - self.misses as f64 * 100.0 / self.warm_refs as f64
    }
}

/// One stack-occupancy sample, taken whenever the LIRS stack outgrows the
/// cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// References processed when the sample was taken.
    pub total_refs: u64,
    /// Stack length relative to the cache size (always > 1.0).
    pub occupancy: f64,
}

/// One point of the hit-rate-vs-size curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub capacity: usize,
    pub hit_rate: f64,
}

/// Everything one replay produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub capacity: usize,
    pub counters: RunCounters,
    pub samples: Vec<Sample>,
    pub stats: PolicyStats,
}

/// A full simulation over all requested sizes. Only the last size's samples
/// are kept, matching the reference simulator's output files.
#[derive(Debug)]
pub struct SimReport {
    pub policy: &'static str,
    pub curve: Vec<CurvePoint>,
    pub last_samples: Vec<Sample>,
}

// ============================================================================
// Driver
// ============================================================================

/// Owns the trace and configuration; builds one engine per cache size.
pub struct Driver {
    trace: Trace,
    config: SimConfig,
}

impl Driver {
    pub fn new(trace: Trace, config: SimConfig) -> Self {
        Self { trace, config }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Replay the whole trace at one cache size.
    pub fn run_size(&self, kind: PolicyKind, capacity: usize) -> Result<RunOutcome> {
        let mut policy = create_policy(kind, self.trace.block_count(), capacity, &self.config)?;
        let mut counters = RunCounters::default();
        let mut samples = Vec::new();

        for &id in self.trace.refs() {
            counters.total_refs += 1;
            let warmed = counters.total_refs > self.config.stat_start;
            if warmed {
                counters.warm_refs += 1;
            }

            let outcome = policy.access(id)?;
            if warmed && outcome == AccessKind::Miss {
                counters.misses += 1;
            }

            if counters.total_refs % PROGRESS_INTERVAL == 0 {
                debug!(refs = counters.total_refs, capacity, "references processed");
            }

            let history = policy.history_len();
            if history > capacity {
                samples.push(Sample {
                    total_refs: counters.total_refs,
                    occupancy: history as f64 / capacity as f64,
                });
            }
        }

        if kind == PolicyKind::Lirs {
            info!(
                capacity,
                hir_cap = self.config.hir_capacity(capacity),
                "resident HIR share"
            );
        }
        let shortage = if self.trace.block_count() > 0 {
            capacity as f64 * 100.0 / self.trace.block_count() as f64
        } else {
            0.0
        };
        let hit_rate = format!("{:.1}%", counters.hit_rate());
        let shortage = format!("{:.1}%", shortage);
        info!(
            capacity,
            total_refs = counters.total_refs,
            misses = counters.misses,
            hit_rate = %hit_rate,
            shortage = %shortage,
            "run complete"
        );

        Ok(RunOutcome {
            capacity,
            counters,
            samples,
            stats: policy.stats(),
        })
    }

    /// Run every requested size in order and assemble the curve. Samples are
    /// kept for the last size only.
    pub fn run_all(&self, kind: PolicyKind, sizes: &[usize]) -> Result<SimReport> {
        let mut curve = Vec::with_capacity(sizes.len());
        let mut last_samples = Vec::new();

        for &capacity in sizes {
            let outcome = self.run_size(kind, capacity)?;
            curve.push(CurvePoint {
                capacity,
                hit_rate: outcome.counters.hit_rate(),
            });
            last_samples = outcome.samples;
        }

        Ok(SimReport {
            policy: kind.name(),
            curve,
            last_samples,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
