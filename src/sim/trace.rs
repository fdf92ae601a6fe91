// # Trace and Parameter Input
//
// Both input files are whitespace-separated decimal integers: the trace is
// one block reference per token, the parameter file one cache size per
// token. The trace is loaded into memory once and replayed per cache size,
// with a pre-pass establishing the reference space (`N = max id + 1`) so the
// block table can be sized up front.

use crate::config::MIN_CACHE_SIZE;
use crate::error::{Result, SimError};
use crate::replacement::block::BlockId;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ============================================================================
// Reference Trace
// ============================================================================

/// An in-memory reference trace.
#[derive(Debug, Clone)]
pub struct Trace {
    refs: Vec<BlockId>,
    block_count: usize,
}

impl Trace {
    /// Parse a trace from a reader. Any non-integer token is a fatal input
    /// error; an empty stream yields an empty trace.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let mut refs = Vec::new();
        let mut max_id: Option<BlockId> = None;
        for token in text.split_ascii_whitespace() {
            let id: BlockId = token.parse().map_err(|_| {
                SimError::InputFormat(format!("invalid block reference {:?} in trace", token))
            })?;
            max_id = Some(max_id.map_or(id, |m| m.max(id)));
            refs.push(id);
        }

        Ok(Self {
            refs,
            block_count: max_id.map_or(0, |m| m as usize + 1),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Size of the reference space: one more than the largest block id.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    #[inline]
    pub fn refs(&self) -> &[BlockId] {
        &self.refs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

// ============================================================================
// Cache Size Parameters
// ============================================================================

/// Parse the cache sizes to simulate, one replay per size.
///
/// A size below [`MIN_CACHE_SIZE`] is rejected with a warning and the rest
/// of the stream is skipped, matching the reference simulator's behavior.
pub fn read_cache_sizes<R: Read>(mut reader: R) -> Result<Vec<usize>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let mut sizes = Vec::new();
    for token in text.split_ascii_whitespace() {
        let size: usize = token.parse().map_err(|_| {
            SimError::InputFormat(format!("invalid cache size {:?} in parameter file", token))
        })?;
        if size < MIN_CACHE_SIZE {
            warn!(size, "cache size too small, skipping remaining parameters");
            break;
        }
        sizes.push(size);
    }
    Ok(sizes)
}

pub fn cache_sizes_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<usize>> {
    read_cache_sizes(File::open(path)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_pre_pass_establishes_range() {
        let trace = Trace::from_reader("0 1 0 1 2".as_bytes()).unwrap();
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.block_count(), 3);
        assert_eq!(trace.refs(), &[0, 1, 0, 1, 2]);
    }

    #[test]
    fn test_trace_accepts_arbitrary_whitespace() {
        let trace = Trace::from_reader("7\n\t42   9\n".as_bytes()).unwrap();
        assert_eq!(trace.refs(), &[7, 42, 9]);
        assert_eq!(trace.block_count(), 43);
    }

    #[test]
    fn test_trace_rejects_non_integer() {
        let err = Trace::from_reader("1 2 three".as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::InputFormat(_)));
    }

    #[test]
    fn test_empty_trace() {
        let trace = Trace::from_reader("".as_bytes()).unwrap();
        assert!(trace.is_empty());
        assert_eq!(trace.block_count(), 0);
    }

    #[test]
    fn test_cache_sizes() {
        let sizes = read_cache_sizes("100 200 400".as_bytes()).unwrap();
        assert_eq!(sizes, vec![100, 200, 400]);
    }

    #[test]
    fn test_small_cache_size_skips_remainder() {
        let sizes = read_cache_sizes("100 5 200".as_bytes()).unwrap();
        assert_eq!(sizes, vec![100]);
    }

    #[test]
    fn test_cache_sizes_reject_non_integer() {
        assert!(matches!(
            read_cache_sizes("100 big".as_bytes()).unwrap_err(),
            SimError::InputFormat(_)
        ));
    }
}
