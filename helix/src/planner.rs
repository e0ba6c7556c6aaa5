//! Batch planner: splits an identifier set into API-legal chunks.

use std::collections::{BTreeSet, VecDeque};

use crate::resolver::ResolveError;

/// Chunks identifier sets into batches of at most `limit`.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlanner {
    limit: usize,
}

impl BatchPlanner {
    /// Fails with [`ResolveError::Configuration`] when `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, ResolveError> {
        if limit == 0 {
            return Err(ResolveError::Configuration(
                "batch limit must be at least 1".to_string(),
            ));
        }
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Deduplicates `ids` and partitions them into chunks of at most `limit`, in
    /// ascending identifier order.
    pub fn plan<Id, I>(&self, ids: I) -> BatchPlan<Id>
    where
        Id: Ord,
        I: IntoIterator<Item = Id>,
    {
        let unique: BTreeSet<Id> = ids.into_iter().collect();
        let remaining = unique.len();
        let mut chunks = VecDeque::with_capacity(remaining.div_ceil(self.limit));
        let mut current = Vec::with_capacity(self.limit.min(remaining));
        for id in unique {
            current.push(id);
            if current.len() == self.limit {
                chunks.push_back(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            chunks.push_back(current);
        }
        BatchPlan { chunks, remaining }
    }
}

/// Chunks still to be fetched. Iterating hands out one chunk at a time.
#[derive(Debug)]
pub struct BatchPlan<Id> {
    chunks: VecDeque<Vec<Id>>,
    remaining: usize,
}

impl<Id> BatchPlan<Id> {
    /// Identifiers not yet handed out.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl<Id> Iterator for BatchPlan<Id> {
    type Item = Vec<Id>;

    fn next(&mut self) -> Option<Vec<Id>> {
        let chunk = self.chunks.pop_front()?;
        self.remaining -= chunk.len();
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_a_configuration_error() {
        assert!(matches!(
            BatchPlanner::new(0),
            Err(ResolveError::Configuration(_))
        ));
    }

    #[test]
    fn chunks_partition_the_input() {
        let planner = BatchPlanner::new(100).unwrap();
        let plan = planner.plan(1..=250u32);
        assert_eq!(plan.remaining(), 250);
        assert_eq!(plan.chunk_count(), 3);

        let chunks: Vec<Vec<u32>> = plan.collect();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        let flat: Vec<u32> = chunks.into_iter().flatten().collect();
        assert_eq!(flat, (1..=250).collect::<Vec<_>>());
    }

    #[test]
    fn duplicates_collapse_before_chunking() {
        let planner = BatchPlanner::new(2).unwrap();
        let chunks: Vec<Vec<u32>> = planner.plan([5, 5, 5, 7]).collect();
        assert_eq!(chunks, vec![vec![5, 7]]);
    }

    #[test]
    fn remaining_tracks_handed_out_chunks() {
        let planner = BatchPlanner::new(3).unwrap();
        let mut plan = planner.plan(1..=7u32);
        assert_eq!(plan.next().unwrap().len(), 3);
        assert_eq!(plan.remaining(), 4);
        plan.next();
        plan.next();
        assert_eq!(plan.remaining(), 0);
        assert!(plan.is_empty());
        assert!(plan.next().is_none());
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let planner = BatchPlanner::new(10).unwrap();
        let plan = planner.plan(Vec::<u32>::new());
        assert!(plan.is_empty());
        assert_eq!(plan.remaining(), 0);
    }
}
