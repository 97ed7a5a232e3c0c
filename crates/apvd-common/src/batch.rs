//! Chunked batch execution with bounded concurrency
//!
//! Upstream writes are split into fixed-size chunks and run a few at a time.
//! Chunk results are folded with `Stats::combine`, so completion order does
//! not change the aggregate.

use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::stats::Stats;

/// Values posted per request
pub const DEFAULT_CHUNK_SIZE: usize = 25;

/// Identifiers resolved per metadata request
pub const DEFAULT_METADATA_CHUNK_SIZE: usize = 50;

/// Requests in flight at once
pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    pub chunk_size: usize,
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl BatchOptions {
    pub fn new(chunk_size: usize, concurrency: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            concurrency: concurrency.max(1),
        }
    }
}

/// Split items into owned chunks of at most `chunk_size` elements
pub fn into_chunks<T>(items: Vec<T>, chunk_size: usize) -> Vec<Vec<T>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(chunk_size));
    let mut iter = items.into_iter();
    loop {
        let chunk: Vec<T> = iter.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}

/// Run `f` over every chunk and sum the resulting stats
pub async fn run_chunked<T, F, Fut>(items: Vec<T>, options: BatchOptions, f: F) -> Stats
where
    F: Fn(Vec<T>) -> Fut,
    Fut: Future<Output = Stats>,
{
    if items.is_empty() {
        return Stats::empty();
    }

    let chunks = into_chunks(items, options.chunk_size);
    tracing::debug!(
        chunks = chunks.len(),
        chunk_size = options.chunk_size,
        "running chunked batch"
    );

    stream::iter(chunks)
        .map(f)
        .buffer_unordered(options.concurrency.max(1))
        .fold(Stats::empty(), |acc, stats| async move { acc.combine(stats) })
        .await
}

/// Run fallible lookups over chunks, keeping chunk order in the output
pub async fn try_map_chunked<T, R, F, Fut>(
    items: Vec<T>,
    options: BatchOptions,
    f: F,
) -> anyhow::Result<Vec<R>>
where
    F: Fn(Vec<T>) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<R>>>,
{
    let chunks = into_chunks(items, options.chunk_size);
    let results: Vec<Vec<R>> = stream::iter(chunks)
        .map(f)
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await?;

    Ok(results.into_iter().flatten().collect())
}
