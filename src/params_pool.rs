use std::time::{Duration, Instant};

use crate::constant::MAX_POOLED_PARAMETERS;
use crate::error::{Error, Result};
use crate::list::TimedFreeList;
use crate::params::Parameters;

pub const MIN_EVICT_DELTA: Duration = Duration::from_secs(1);
pub const MAX_EVICT_DELTA: Duration = Duration::from_secs(24 * 60 * 60);

/// Pool of parameter containers bucketed by parameter count
///
/// Containers with more than `MAX_POOLED_PARAMETERS` slots are never pooled.
/// Every `free` evicts containers that have been idle for longer than the
/// eviction delta, across all buckets.
#[derive(Debug)]
pub struct ParametersPool {
    buckets: Vec<Option<TimedFreeList<Parameters>>>,
    evict_delta: Duration,
}

impl ParametersPool {
    pub fn new(evict_delta: Duration) -> Result<Self> {
        if !(MIN_EVICT_DELTA..=MAX_EVICT_DELTA).contains(&evict_delta) {
            return Err(Error::BadConfigError(format!(
                "parameter pool eviction delta {:?} outside {:?}..={:?}",
                evict_delta, MIN_EVICT_DELTA, MAX_EVICT_DELTA
            )));
        }
        Ok(Self {
            buckets: (0..MAX_POOLED_PARAMETERS).map(|_| None).collect(),
            evict_delta,
        })
    }

    pub fn evict_delta(&self) -> Duration {
        self.evict_delta
    }

    /// A container of `count` unset slots, reusing the most recently freed one
    pub fn allocate(&mut self, count: usize) -> Result<Parameters> {
        if count == 0 {
            return Err(Error::BadUsageError(
                "cannot allocate an empty parameter container".to_string(),
            ));
        }
        let reused = self
            .bucket_mut(count)
            .and_then(|bucket| bucket.as_mut())
            .and_then(TimedFreeList::allocate);
        Ok(match reused {
            Some(mut parameters) => {
                parameters.clear();
                parameters
            }
            None => Parameters::new(count),
        })
    }

    /// A pooled container holding a deep copy of `source`
    pub fn allocate_copy(&mut self, source: &Parameters) -> Result<Parameters> {
        let mut parameters = self.allocate(source.len())?;
        parameters.copy_from(source)?;
        Ok(parameters)
    }

    /// Return `parameters` to its bucket, then evict idle containers
    ///
    /// Oversized containers are dropped, but eviction still runs.
    pub fn free(&mut self, parameters: Parameters, now: Instant) -> Result<()> {
        if let Some(bucket) = self.bucket_mut(parameters.len()) {
            bucket
                .get_or_insert_with(TimedFreeList::new)
                .free(parameters, now);
        }
        self.evict_timed_out(now)
    }

    /// Containers currently pooled for `count` parameters
    pub fn pooled(&self, count: usize) -> usize {
        count
            .checked_sub(1)
            .and_then(|index| self.buckets.get(index))
            .and_then(Option::as_ref)
            .map_or(0, TimedFreeList::len)
    }

    fn evict_timed_out(&mut self, now: Instant) -> Result<()> {
        let mut evicted = 0;
        for bucket in self.buckets.iter_mut().flatten() {
            evicted += bucket.evict_timed_out(now, self.evict_delta)?;
        }
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle parameter containers");
        }
        Ok(())
    }

    fn bucket_mut(&mut self, count: usize) -> Option<&mut Option<TimedFreeList<Parameters>>> {
        count
            .checked_sub(1)
            .and_then(|index| self.buckets.get_mut(index))
    }
}
