//! Parallel reverse addressing.
//!
//! Builds the transpose of a row graph (row `v` of the result lists every
//! origin row holding value `v`) as a phased fork-join over the rayon pool.
//! Workers own disjoint blocks of origin rows and disjoint windows of the
//! value space, exchange foreign values through per-pair outboxes instead of
//! locks, and write the result through a shared
//! [`BulkWriter`](crate::storage::BulkWriter) once its shape is fixed. The
//! same code runs at every scale; small inputs just get one worker.

use crate::check::CheckInvariants;
use crate::error::GraphError;
use crate::graph::VarWidthGraph;
use crate::graph::slot::{RowSpan, Slot};
use crate::graph::traits::RowGraph;
use crate::storage::BulkWriter;

/// Below this many origin rows the transpose runs on a single worker.
const PARALLEL_ROW_THRESHOLD: usize = 1000;

/// Transpose of `origin`, computed in parallel.
///
/// Matches [`VarWidthGraph::reverse_addressing`] entry for entry: the result
/// has `max value + 1` rows and row `v` lists the origin rows containing
/// `v`, in origin order, once per appearance.
pub fn reverse_addressing_par<G>(origin: &G) -> VarWidthGraph
where
    G: RowGraph + Sync + ?Sized,
{
    reverse_with(origin, |v| v)
}

/// Transpose with every stored value translated through `mapper` first.
///
/// Fails with [`GraphError::MapperOutOfRange`] before building anything if
/// some stored value has no mapper entry.
pub fn reverse_addressing_par_mapped<G>(
    mapper: &[u32],
    origin: &G,
) -> Result<VarWidthGraph, GraphError>
where
    G: RowGraph + Sync + ?Sized,
{
    let workers = worker_count(origin.row_count());
    if let Some((_, raw_max)) = value_span(origin, &|v| v, workers) {
        if raw_max as usize >= mapper.len() {
            return Err(GraphError::MapperOutOfRange {
                value: raw_max,
                mapper_len: mapper.len(),
            });
        }
    }
    Ok(reverse_with(origin, |v| mapper[v as usize]))
}

fn worker_count(rows: usize) -> usize {
    if rows < PARALLEL_ROW_THRESHOLD {
        1
    } else {
        rayon::current_num_threads().max(1)
    }
}

/// Origin rows assigned to worker `w`.
fn block(w: usize, workers: usize, rows: usize) -> core::ops::Range<usize> {
    w * rows / workers..(w + 1) * rows / workers
}

/// Global `(min, max)` of the translated values, or `None` when every row
/// is empty.
fn value_span<G, F>(origin: &G, f: &F, workers: usize) -> Option<(u32, u32)>
where
    G: RowGraph + Sync + ?Sized,
    F: Fn(u32) -> u32 + Sync,
{
    let rows = origin.row_count();
    let mut spans: Vec<Option<(u32, u32)>> = vec![None; workers];
    rayon::scope(|s| {
        for (w, span) in spans.iter_mut().enumerate() {
            s.spawn(move |_| {
                let mut local: Option<(u32, u32)> = None;
                for r in block(w, workers, rows) {
                    for c in 0..origin.row_len(r) {
                        let v = f(origin.entry(r, c));
                        local = Some(match local {
                            None => (v, v),
                            Some((lo, hi)) => (lo.min(v), hi.max(v)),
                        });
                    }
                }
                *span = local;
            });
        }
    });
    spans
        .into_iter()
        .flatten()
        .reduce(|(alo, ahi), (lo, hi)| (alo.min(lo), ahi.max(hi)))
}

/// Splits the value-indexed table into per-worker windows.
///
/// Worker `w` owns values `[min + w * per, min + (w + 1) * per)`; window 0
/// additionally absorbs `[0, min)` and the last window runs to the end of
/// the table. Returns `(window start, window)` pairs.
fn split_counters(
    counts: &mut [usize],
    min: usize,
    per: usize,
    workers: usize,
) -> Vec<(usize, &mut [usize])> {
    let total = counts.len();
    let mut windows = Vec::with_capacity(workers);
    let mut rest = counts;
    let mut lo = 0usize;
    for w in 1..=workers {
        let hi = if w == workers {
            total
        } else {
            (min + w * per).min(total)
        };
        let (window, tail) = rest.split_at_mut(hi - lo);
        windows.push((lo, window));
        rest = tail;
        lo = hi;
    }
    windows
}

/// Writes `row` into the next open cell of result row `value`.
#[inline]
fn deposit(
    writer: &BulkWriter<'_, Slot>,
    spans: &[RowSpan],
    window_lo: usize,
    cursors: &mut [usize],
    value: u32,
    row: u32,
) {
    let v = value as usize;
    let cursor = &mut cursors[v - window_lo];
    let cell = spans[v].start.unwrap_or(0) + *cursor;
    *cursor += 1;
    // SAFETY: workers own disjoint value windows, rows of one window are
    // disjoint cell ranges, and the cursor hands out each cell once.
    unsafe { writer.set(cell, Slot::Occupied(row)) };
}

fn reverse_with<G, F>(origin: &G, f: F) -> VarWidthGraph
where
    G: RowGraph + Sync + ?Sized,
    F: Fn(u32) -> u32 + Sync,
{
    let rows = origin.row_count();
    let workers = worker_count(rows);
    log::debug!("reverse addressing: {rows} origin rows on {workers} workers");

    let Some((min, max)) = value_span(origin, &f, workers) else {
        return VarWidthGraph::new();
    };
    let value_range = max as usize + 1;
    let per = ((max - min) as usize) / workers + 1;

    // Counting. Owned values bump the worker's own counter window; foreign
    // ones go to the owner's outbox as (value, origin row) pairs.
    let mut counts = vec![0usize; value_range];
    let mut outboxes: Vec<Vec<Vec<(u32, u32)>>> =
        (0..workers).map(|_| vec![Vec::new(); workers]).collect();
    {
        let f = &f;
        rayon::scope(|s| {
            for ((w, (window_lo, window)), outbox) in
                split_counters(&mut counts, min as usize, per, workers)
                    .into_iter()
                    .enumerate()
                    .zip(outboxes.iter_mut())
            {
                s.spawn(move |_| {
                    for r in block(w, workers, rows) {
                        for c in 0..origin.row_len(r) {
                            let v = f(origin.entry(r, c));
                            let owner = ((v - min) as usize) / per;
                            if owner == w {
                                window[v as usize - window_lo] += 1;
                            } else {
                                outbox[owner].push((v, r as u32));
                            }
                        }
                    }
                });
            }
        });
    }

    // Fold every foreign outbox into its owner's counters.
    rayon::scope(|s| {
        let outboxes = &outboxes;
        for (w, (window_lo, window)) in split_counters(&mut counts, min as usize, per, workers)
            .into_iter()
            .enumerate()
        {
            s.spawn(move |_| {
                for origin_box in outboxes {
                    for &(v, _) in &origin_box[w] {
                        window[v as usize - window_lo] += 1;
                    }
                }
            });
        }
    });

    // The one allocation of the result shape.
    let mut reverse = VarWidthGraph::new();
    reverse.set_row_count_and_widths(&counts);

    // Counters become write cursors.
    let mut cursors = counts;
    cursors.fill(0);

    // Fill. Each worker drains, in origin-row order, the outboxes addressed
    // to it from lower-ranked workers, then its own block, then the rest,
    // so entries land in the same order the sequential transpose produces.
    {
        let (spans, data) = reverse.parts_mut();
        let writer = data.bulk_writer();
        let writer = &writer;
        let outboxes = &outboxes;
        let f = &f;
        rayon::scope(|s| {
            for (w, (window_lo, window)) in split_counters(&mut cursors, min as usize, per, workers)
                .into_iter()
                .enumerate()
            {
                s.spawn(move |_| {
                    for origin_box in &outboxes[..w] {
                        for &(v, r) in &origin_box[w] {
                            deposit(writer, spans, window_lo, window, v, r);
                        }
                    }
                    for r in block(w, workers, rows) {
                        for c in 0..origin.row_len(r) {
                            let v = f(origin.entry(r, c));
                            if ((v - min) as usize) / per == w {
                                deposit(writer, spans, window_lo, window, v, r as u32);
                            }
                        }
                    }
                    for origin_box in &outboxes[w + 1..] {
                        for &(v, r) in &origin_box[w] {
                            deposit(writer, spans, window_lo, window, v, r);
                        }
                    }
                });
            }
        });
    }

    reverse.debug_assert_invariants();
    reverse
}
