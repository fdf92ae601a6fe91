// # LIRS (Low Inter-reference Recency Set) Replacement Engine
//
// Reference-trace implementation of the LIRS policy from Jiang & Zhang,
// "LIRS: An Efficient Low Inter-reference Recency Set Replacement Policy to
// Improve Buffer Cache Performance", ACM SIGMETRICS 2002.
//
// ## Algorithm Overview
//
// LIRS ranks blocks by Inter-Reference Recency (IRR): the number of other
// distinct blocks touched between two consecutive references to the same
// block. Blocks with low IRR (LIR) own most of the cache; blocks with high
// IRR (HIR) share a small residual area and are the eviction victims.
//
// Two recency structures drive the policy:
//
// - **Stack S**: all LIR blocks plus recently seen HIR blocks, ordered by
//   recency of last reference. HIR entries may be history-only (the block
//   itself was evicted). An HIR block re-referenced while still in S has an
//   IRR no worse than the deepest LIR block's recency, so it swaps roles
//   with it.
// - **Queue Q**: the resident HIR blocks in FIFO-of-recency order; the tail
//   is the next eviction victim.
//
// A cursor (`lir_bottom`) tracks the deepest LIR entry in S, giving O(1)
// demotion and bounding the pruning walks. HIR entries below it carry no
// usable history and are unlinked as soon as the cursor moves.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::replacement::block::{BlockId, BlockTable};
use crate::replacement::policy::{AccessKind, PolicyStats, ReplacementPolicy};
use tracing::warn;

/// Where a missed block lands once a frame is found for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// The cache is still filling its LIR share; admit directly as LIR.
    Lir,
    /// Default admission: resident HIR, queued in Q.
    Hir,
}

// ============================================================================
// LIRS Engine
// ============================================================================

/// Single-threaded LIRS engine over a dense block table.
///
/// One engine simulates one cache size; the driver builds a fresh engine per
/// size and feeds it the trace one reference at a time. Both lists are
/// intrusive: links live in the block entries as `Option<BlockId>` indices,
/// so every list operation is O(1) index surgery on the flat table.
pub struct LirsEngine {
    table: BlockTable,

    /// Stack S, most recent at the head.
    s_head: Option<BlockId>,
    s_tail: Option<BlockId>,

    /// Queue Q of resident HIR blocks, most recent at the head.
    q_head: Option<BlockId>,
    q_tail: Option<BlockId>,

    /// Deepest LIR entry in S; `None` only while no LIR block exists.
    lir_bottom: Option<BlockId>,

    capacity: usize,
    hir_cap: usize,
    max_s_len: Option<usize>,

    free: usize,
    lir_count: usize,
    s_len: usize,
    q_len: usize,

    /// Duplicate-suppression sentinel; `None` before the first reference.
    last_ref: Option<BlockId>,

    stats: PolicyStats,
}

impl LirsEngine {
    /// Build an engine for `block_count` distinct blocks and `capacity`
    /// cache frames. Fails when the HIR/LIR split degenerates (the HIR share
    /// must be at least one frame and strictly smaller than the cache).
    pub fn new(block_count: usize, capacity: usize, config: &SimConfig) -> Result<Self> {
        config.validate(capacity)?;
        Ok(Self {
            table: BlockTable::new(block_count),
            s_head: None,
            s_tail: None,
            q_head: None,
            q_tail: None,
            lir_bottom: None,
            capacity,
            hir_cap: config.hir_capacity(capacity),
            max_s_len: config.max_s_len,
            free: capacity,
            lir_count: 0,
            s_len: 0,
            q_len: 0,
            last_ref: None,
            stats: PolicyStats::default(),
        })
    }

    #[inline]
    pub fn hir_capacity(&self) -> usize {
        self.hir_cap
    }

    /// Frames reserved for the LIR set.
    #[inline]
    pub fn lir_capacity(&self) -> usize {
        self.capacity - self.hir_cap
    }

    #[inline]
    pub fn s_len(&self) -> usize {
        self.s_len
    }

    #[inline]
    pub fn queue_len(&self) -> usize {
        self.q_len
    }

    #[inline]
    pub fn lir_count(&self) -> usize {
        self.lir_count
    }

    #[inline]
    pub fn free_frames(&self) -> usize {
        self.free
    }

    pub fn block_table(&self) -> &BlockTable {
        &self.table
    }

    // ========================================================================
    // Access State Machine
    // ========================================================================

    fn access_inner(&mut self, id: BlockId) -> Result<AccessKind> {
        if (id as usize) >= self.table.len() {
            return Err(SimError::InputFormat(format!(
                "reference to block {} outside the trace range 0..{}",
                id,
                self.table.len()
            )));
        }

        // A consecutive duplicate leaves the cache untouched; the block is
        // resident from its own previous reference.
        if self.last_ref == Some(id) {
            self.table.get_mut(id).ref_count += 1;
            return Ok(AccessKind::Hit);
        }
        self.last_ref = Some(id);
        self.table.get_mut(id).ref_count += 1;

        let (was_resident, was_in_stack) = {
            let block = self.table.get(id);
            (block.is_resident(), block.in_stack())
        };

        let mut fill_as_lir = false;
        let outcome = if was_resident {
            if self.table.get(id).is_hir() {
                // Pulled out of Q for re-insertion (or promotion) below.
                self.q_unlink(id);
            }
            AccessKind::Hit
        } else {
            self.table.get_mut(id).fault_count += 1;
            fill_as_lir = self.make_room()? == Placement::Lir;
            AccessKind::Miss
        };

        // Common path: the block takes a frame and its stack entry moves to
        // (or appears at) the top of S.
        if was_in_stack {
            self.s_unlink(id);
        }
        self.s_push_top(id);
        {
            let block = self.table.get_mut(id);
            block.enter_stack();
            block.set_resident(true);
        }
        if !was_in_stack {
            self.s_len += 1;
        }

        if fill_as_lir {
            // Admission during the fill phase cannot overflow the LIR share:
            // the branch only fires while more than `hir_cap` frames remain
            // free.
            self.table.get_mut(id).promote_to_lir();
            self.lir_count += 1;
            debug_assert!(self.lir_count <= self.lir_capacity());
        } else if self.table.get(id).is_hir() {
            if was_in_stack {
                self.promote(id)?;
            } else {
                // Cold miss, or hit on an HIR block whose history expired:
                // stays HIR, rejoins Q at the head.
                self.q_push_head(id);
            }
        }

        if self.lir_bottom.is_none() && self.table.get(id).is_lir() {
            self.lir_bottom = Some(id);
        }

        self.prune_s();
        Ok(outcome)
    }

    /// Miss path: find a frame for the incoming block and decide how it is
    /// admitted.
    fn make_room(&mut self) -> Result<Placement> {
        let placement = if self.free == 0 {
            let victim = self.q_pop_tail().ok_or_else(|| {
                SimError::InvariantViolated(
                    "eviction requested with an empty HIR queue".to_string(),
                )
            })?;
            // The victim gives up its frame but keeps any stack-S history.
            self.table.get_mut(victim).set_resident(false);
            self.stats.evictions += 1;
            self.free += 1;
            Placement::Hir
        } else if self.free > self.hir_cap {
            Placement::Lir
        } else {
            Placement::Hir
        };
        self.free -= 1;
        Ok(placement)
    }

    /// The heart of LIRS: an HIR block re-referenced while still in S has an
    /// IRR no worse than the LIR bottom's recency, so it joins the LIR set
    /// and the old bottom drops out.
    fn promote(&mut self, id: BlockId) -> Result<()> {
        self.table.get_mut(id).promote_to_lir();
        self.lir_count += 1;
        self.stats.promotions += 1;

        if self.lir_count > self.lir_capacity() {
            let old = self.lir_bottom.ok_or_else(|| {
                SimError::InvariantViolated(
                    "promotion with no LIR bottom to demote".to_string(),
                )
            })?;
            self.demote_bottom(old);
        } else {
            // Only reachable before the LIR set has ever filled, which the
            // admission path rules out.
            warn!(block = id, "promotion without a full LIR set");
        }
        Ok(())
    }

    /// Demote the deepest LIR block: it keeps its frame, loses its stack
    /// entry, and rejoins Q as the most recent resident HIR block.
    fn demote_bottom(&mut self, old: BlockId) {
        self.table.get_mut(old).demote_to_hir();
        self.q_push_head(old);
        self.s_unlink(old);
        self.s_len -= 1;
        self.lir_count -= 1;
        self.stats.demotions += 1;
    }

    // ========================================================================
    // Stack S
    // ========================================================================

    fn s_push_top(&mut self, id: BlockId) {
        let old_head = self.s_head;
        {
            let block = self.table.get_mut(id);
            block.s_prev = None;
            block.s_next = old_head;
        }
        match old_head {
            Some(head) => self.table.get_mut(head).s_prev = Some(id),
            None => self.s_tail = Some(id),
        }
        self.s_head = Some(id);
    }

    /// Splice a block out of S. Link surgery only: membership flags and
    /// `s_len` stay with the callers, because a re-referenced entry keeps
    /// its membership while it moves back to the top.
    fn s_unlink(&mut self, id: BlockId) {
        let (prev, next) = {
            let block = self.table.get(id);
            (block.s_prev, block.s_next)
        };
        match prev {
            Some(p) => self.table.get_mut(p).s_next = next,
            None => self.s_head = next,
        }
        match next {
            Some(n) => self.table.get_mut(n).s_prev = prev,
            None => self.s_tail = prev,
        }
        {
            let block = self.table.get_mut(id);
            block.s_prev = None;
            block.s_next = None;
        }
        if self.lir_bottom == Some(id) {
            self.refresh_lir_bottom();
        }
    }

    /// Re-aim the cursor at the deepest LIR entry, unlinking every HIR entry
    /// found below it on the way. HIR history below the LIR bottom can never
    /// beat the bottom's recency, so it carries no information; dropping it
    /// eagerly keeps the stack tail identical to the cursor.
    fn refresh_lir_bottom(&mut self) {
        while let Some(tail) = self.s_tail {
            if self.table.get(tail).is_lir() {
                self.lir_bottom = Some(tail);
                return;
            }
            self.prune_entry(tail);
        }
        self.lir_bottom = None;
    }

    /// Drop one HIR entry's stack metadata. A resident block stays in Q.
    fn prune_entry(&mut self, id: BlockId) {
        debug_assert!(self.table.get(id).is_hir());
        self.s_unlink(id);
        self.table.get_mut(id).leave_stack();
        self.s_len -= 1;
        self.stats.pruned_entries += 1;
    }

    /// Bound the stack: when `s_len` exceeds the cap, trim the oldest HIR
    /// history entry. Entries below the LIR bottom are already gone, so the
    /// walk runs from the cursor toward the top and stops at the first HIR
    /// entry it meets.
    fn prune_s(&mut self) {
        let Some(cap) = self.max_s_len else {
            return;
        };
        if self.s_len <= cap {
            return;
        }
        let mut cursor = self.lir_bottom;
        while let Some(id) = cursor {
            cursor = self.table.get(id).s_prev;
            if self.table.get(id).is_hir() {
                self.prune_entry(id);
                return;
            }
        }
    }

    // ========================================================================
    // Queue Q
    // ========================================================================

    fn q_push_head(&mut self, id: BlockId) {
        debug_assert!(
            self.table.get(id).is_hir() && self.table.get(id).is_resident(),
            "Q holds resident HIR blocks only"
        );
        let old_head = self.q_head;
        {
            let block = self.table.get_mut(id);
            block.q_prev = None;
            block.q_next = old_head;
        }
        match old_head {
            Some(head) => self.table.get_mut(head).q_prev = Some(id),
            None => self.q_tail = Some(id),
        }
        self.q_head = Some(id);
        self.q_len += 1;
    }

    fn q_unlink(&mut self, id: BlockId) {
        let (prev, next) = {
            let block = self.table.get(id);
            (block.q_prev, block.q_next)
        };
        match prev {
            Some(p) => self.table.get_mut(p).q_next = next,
            None => self.q_head = next,
        }
        match next {
            Some(n) => self.table.get_mut(n).q_prev = prev,
            None => self.q_tail = prev,
        }
        {
            let block = self.table.get_mut(id);
            block.q_prev = None;
            block.q_next = None;
        }
        self.q_len -= 1;
    }

    fn q_pop_tail(&mut self) -> Option<BlockId> {
        let tail = self.q_tail?;
        self.q_unlink(tail);
        Some(tail)
    }

    // ========================================================================
    // Invariant Checker
    // ========================================================================

    /// Walk every structure and confirm the LIRS invariants hold. Used by
    /// the property test suite after each access; O(N), not for hot paths.
    pub fn verify_invariants(&self) -> Result<()> {
        let fail = |msg: String| Err(SimError::InvariantViolated(msg));

        if self.lir_count + self.q_len + self.free != self.capacity {
            return fail(format!(
                "frame accounting broken: lir {} + q {} + free {} != capacity {}",
                self.lir_count, self.q_len, self.free, self.capacity
            ));
        }
        if self.q_len > self.hir_cap {
            return fail(format!("queue over capacity: {} > {}", self.q_len, self.hir_cap));
        }
        if self.lir_count > self.lir_capacity() {
            return fail(format!(
                "LIR set over capacity: {} > {}",
                self.lir_count,
                self.lir_capacity()
            ));
        }
        if let Some(cap) = self.max_s_len {
            if self.s_len > cap {
                return fail(format!("stack over its bound: {} > {}", self.s_len, cap));
            }
        }

        // Stack S: link consistency, counted length, LIR bottom.
        let mut seen_s = vec![false; self.table.len()];
        let mut walked = 0usize;
        let mut prev: Option<BlockId> = None;
        let mut cursor = self.s_head;
        let mut deepest_lir = None;
        while let Some(id) = cursor {
            let block = self.table.get(id);
            if seen_s[id as usize] {
                return fail(format!("block {} appears twice in S", id));
            }
            seen_s[id as usize] = true;
            if !block.in_stack() {
                return fail(format!("block {} linked in S without membership", id));
            }
            if block.s_prev != prev {
                return fail(format!("broken back-link at block {} in S", id));
            }
            if block.is_lir() {
                deepest_lir = Some(id);
            }
            walked += 1;
            prev = cursor;
            cursor = block.s_next;
        }
        if prev != self.s_tail {
            return fail("S tail does not terminate the list".to_string());
        }
        if walked != self.s_len {
            return fail(format!("s_len {} but walked {} entries", self.s_len, walked));
        }
        if let Some(tail) = self.s_tail {
            if !self.table.get(tail).is_lir() {
                return fail(format!("S bottom {} is not LIR", tail));
            }
        }
        if self.lir_bottom != deepest_lir {
            return fail(format!(
                "cursor {:?} disagrees with deepest LIR {:?}",
                self.lir_bottom, deepest_lir
            ));
        }
        if self.lir_bottom.is_none() && self.lir_count != 0 {
            return fail("cursor is null while LIR blocks exist".to_string());
        }

        // Queue Q: resident HIR blocks, each exactly once.
        let mut seen_q = vec![false; self.table.len()];
        let mut walked = 0usize;
        let mut prev: Option<BlockId> = None;
        let mut cursor = self.q_head;
        while let Some(id) = cursor {
            let block = self.table.get(id);
            if seen_q[id as usize] {
                return fail(format!("block {} appears twice in Q", id));
            }
            seen_q[id as usize] = true;
            if !block.is_hir() || !block.is_resident() {
                return fail(format!("block {} in Q is not a resident HIR block", id));
            }
            if block.q_prev != prev {
                return fail(format!("broken back-link at block {} in Q", id));
            }
            walked += 1;
            prev = cursor;
            cursor = block.q_next;
        }
        if prev != self.q_tail {
            return fail("Q tail does not terminate the list".to_string());
        }
        if walked != self.q_len {
            return fail(format!("q_len {} but walked {} entries", self.q_len, walked));
        }

        // Per-block classification against the table.
        let mut lir_blocks = 0usize;
        let mut in_stack_blocks = 0usize;
        for (id, block) in self.table.iter() {
            if block.is_lir() {
                lir_blocks += 1;
                if !block.is_resident() || !block.in_stack() {
                    return fail(format!("LIR block {} not resident and tracked", id));
                }
            }
            if block.in_stack() {
                in_stack_blocks += 1;
                if !seen_s[id as usize] {
                    return fail(format!("block {} claims S membership but is unlinked", id));
                }
            }
            let in_q = block.is_resident() && block.is_hir();
            if in_q != seen_q[id as usize] {
                return fail(format!("block {} residency disagrees with Q", id));
            }
        }
        if lir_blocks != self.lir_count {
            return fail(format!(
                "lir_count {} but table holds {}",
                self.lir_count, lir_blocks
            ));
        }
        if in_stack_blocks != self.s_len {
            return fail(format!(
                "s_len {} but table holds {} stack members",
                self.s_len, in_stack_blocks
            ));
        }

        Ok(())
    }
}

impl ReplacementPolicy for LirsEngine {
    fn access(&mut self, id: BlockId) -> Result<AccessKind> {
        self.access_inner(id)
    }

    fn reset(&mut self) {
        self.table.reset_all();
        self.s_head = None;
        self.s_tail = None;
        self.q_head = None;
        self.q_tail = None;
        self.lir_bottom = None;
        self.free = self.capacity;
        self.lir_count = 0;
        self.s_len = 0;
        self.q_len = 0;
        self.last_ref = None;
        self.stats = PolicyStats::default();
    }

    fn name(&self) -> &'static str {
        "LIRS"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn history_len(&self) -> usize {
        self.s_len
    }

    fn stats(&self) -> PolicyStats {
        self.stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacement::block::BlockStatus;

    /// Engine with an exact HIR capacity, steered through the MIN_HIR floor.
    fn engine(blocks: usize, capacity: usize, hir_cap: usize) -> LirsEngine {
        let config = SimConfig {
            min_hir: hir_cap,
            ..SimConfig::default()
        };
        let engine = LirsEngine::new(blocks, capacity, &config).unwrap();
        assert_eq!(engine.hir_capacity(), hir_cap);
        engine
    }

    fn run(engine: &mut LirsEngine, trace: &[BlockId]) -> (u64, u64) {
        let (mut hits, mut misses) = (0, 0);
        for &id in trace {
            match engine.access(id).unwrap() {
                AccessKind::Hit => hits += 1,
                AccessKind::Miss => misses += 1,
            }
            engine.verify_invariants().unwrap();
        }
        (hits, misses)
    }

    #[test]
    fn test_cold_fill_splits_lir_and_hir() {
        // Capacity 3 with one HIR frame: the first two blocks fill the LIR
        // share, everything after enters as HIR.
        let mut engine = engine(10, 3, 1);
        let (hits, misses) = run(&mut engine, &[1, 2, 3, 4, 5]);

        assert_eq!(hits, 0);
        assert_eq!(misses, 5);
        assert_eq!(engine.lir_count(), 2);
        assert!(engine.block_table().get(1).is_lir());
        assert!(engine.block_table().get(2).is_lir());
        // 3 and 4 were evicted through Q; 5 is the lone resident HIR block.
        assert_eq!(engine.queue_len(), 1);
        assert_eq!(
            engine.block_table().get(5).status(),
            BlockStatus::HirOutOfStack { resident: true }
        );
        assert!(!engine.block_table().get(3).is_resident());
        assert!(engine.block_table().get(3).in_stack());
    }

    #[test]
    fn test_eviction_keeps_stack_history() {
        let mut engine = engine(10, 3, 1);
        run(&mut engine, &[1, 2, 3, 4]);

        // 3 lost its frame to 4 but its S entry survived.
        let block = engine.block_table().get(3);
        assert_eq!(block.status(), BlockStatus::HirInStack { resident: false });
        assert_eq!(engine.stats().evictions, 1);
    }

    #[test]
    fn test_promotion_on_reference_with_history() {
        let mut engine = engine(10, 2, 1);
        // A becomes LIR, B becomes resident HIR, 1 evicts B; B still has an
        // S entry, so its return promotes it and demotes A.
        run(&mut engine, &[7, 8, 1, 8]);

        assert!(engine.block_table().get(8).is_lir());
        assert_eq!(
            engine.block_table().get(7).status(),
            BlockStatus::HirOutOfStack { resident: true }
        );
        assert_eq!(engine.stats().promotions, 1);
        assert_eq!(engine.stats().demotions, 1);
    }

    #[test]
    fn test_hit_on_hir_without_history_stays_hir() {
        // Cycling the two LIR blocks prunes 3's stack entry, so its next
        // reference finds a resident HIR block with no history: it stays
        // HIR and merely rejoins Q at the head.
        let mut engine = engine(10, 3, 1);
        run(&mut engine, &[1, 2, 3, 1, 2]);
        assert_eq!(
            engine.block_table().get(3).status(),
            BlockStatus::HirOutOfStack { resident: true }
        );

        let (hits, _) = run(&mut engine, &[3]);
        assert_eq!(hits, 1);
        assert_eq!(
            engine.block_table().get(3).status(),
            BlockStatus::HirInStack { resident: true }
        );
        assert_eq!(engine.stats().promotions, 0);
    }

    #[test]
    fn test_duplicate_references_are_noops() {
        let mut engine = engine(10, 10, 2);
        let (hits, misses) = run(&mut engine, &[1, 1, 1, 1, 1]);

        assert_eq!(misses, 1);
        assert_eq!(hits, 4);
        assert_eq!(engine.block_table().get(1).ref_count, 5);
        assert_eq!(engine.block_table().get(1).fault_count, 1);
    }

    #[test]
    fn test_out_of_range_reference_is_fatal() {
        let mut engine = engine(5, 3, 1);
        let err = engine.access(5).unwrap_err();
        assert!(matches!(err, SimError::InputFormat(_)));
    }

    #[test]
    fn test_stack_bound_trims_oldest_history() {
        let config = SimConfig {
            min_hir: 1,
            max_s_len: Some(4),
            ..SimConfig::default()
        };
        let mut engine = LirsEngine::new(20, 3, &config).unwrap();
        for id in [1, 2, 3, 4, 5, 6, 7] {
            engine.access(id).unwrap();
            engine.verify_invariants().unwrap();
            assert!(engine.s_len() <= 4);
        }
        assert!(engine.stats().pruned_entries > 0);
    }

    #[test]
    fn test_scan_resistance() {
        // B is re-referenced between one-shot scan blocks; it must become
        // and stay LIR while the scan blocks churn through the HIR frame.
        let mut engine = engine(10, 2, 1);
        let (hits, _) = run(&mut engine, &[9, 8, 1, 8, 2, 8, 3, 8, 4, 8]);

        assert!(engine.block_table().get(8).is_lir());
        // B's last three references all hit.
        assert!(hits >= 3);
    }

    #[test]
    fn test_reset_returns_to_cold_state() {
        let mut engine = engine(10, 3, 1);
        run(&mut engine, &[1, 2, 3, 4, 2]);

        engine.reset();
        assert_eq!(engine.free_frames(), 3);
        assert_eq!(engine.lir_count(), 0);
        assert_eq!(engine.s_len(), 0);
        assert_eq!(engine.queue_len(), 0);
        assert_eq!(engine.stats(), PolicyStats::default());
        engine.verify_invariants().unwrap();

        // The same trace replays identically after a reset.
        let (hits, misses) = run(&mut engine, &[1, 2, 3, 4, 2]);
        assert_eq!((hits, misses), (1, 4));
    }
}
