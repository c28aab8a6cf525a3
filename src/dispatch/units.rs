//! Built-in demonstration units.

use super::dispatcher::WorkUnit;

/// Upper bound (exclusive) summed by the heavy unit.
pub const HEAVY_RANGE: u64 = 10_000_000;

/// Upper bound (exclusive) summed by the light unit.
pub const LIGHT_RANGE: u64 = 10_000;

/// Steps between yields in cooperative units.
pub const CHECKPOINT_INTERVAL: u64 = 1_000;

/// Sum of `0..n`. Blocks until done.
pub fn sum_range(n: u64) -> u64 {
    (0..n).sum()
}

/// Sum of `0..n`, yielding to the runtime every [`CHECKPOINT_INTERVAL`] steps.
pub async fn sum_range_cooperative(n: u64) -> u64 {
    let mut total = 0u64;
    for i in 0..n {
        total += i;
        if i % CHECKPOINT_INTERVAL == CHECKPOINT_INTERVAL - 1 {
            tokio::task::yield_now().await;
        }
    }
    total
}

/// CPU-bound sum, run on the worker pool.
pub fn heavy_unit() -> WorkUnit<u64> {
    WorkUnit::pooled(|| sum_range(HEAVY_RANGE))
}

/// Short cooperative sum, run on the request task.
pub fn light_unit() -> WorkUnit<u64> {
    WorkUnit::inline(sum_range_cooperative(LIGHT_RANGE))
}
