//! Seeded watershed flooding over the territory mask.
//!
//! Pixels are flooded from the seed clusters in landscape order: lowest
//! outline response first for `Minima` seeds, highest first for `Maxima`
//! seeds. Membrane ridges (or dark gaps) are reached last and become the
//! boundaries between regions. Equal values are flooded in the order they
//! were queued, so flat areas grow breadth-first. A flooded pixel joins the
//! labelled neighbour whose seed centroid is nearest, ties going to the
//! smaller label. Labels are never overwritten.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::{Connectivity, SeedPolarity};
use crate::grid::{BitMask, Plane, neighbors};

use super::seeds::Seeds;

/// Queued pixel in the flood priority queue.
///
/// Ordered so that `BinaryHeap` (max-heap) pops the smallest key first and,
/// among equal keys, the pixel queued first.
#[derive(Debug, Clone, Copy)]
struct FloodEntry {
    key: f32,
    order: u64,
    idx: usize,
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodEntry {}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.order.cmp(&self.order))
    }
}

struct FloodQueue<'a> {
    heap: BinaryHeap<FloodEntry>,
    queued: Vec<bool>,
    next_order: u64,
    landscape: &'a Plane<f32>,
    polarity: SeedPolarity,
}

impl FloodQueue<'_> {
    fn push(&mut self, idx: usize) {
        let value = self.landscape[idx];
        let key = match self.polarity {
            SeedPolarity::Minima => value,
            SeedPolarity::Maxima => -value,
        };
        self.queued[idx] = true;
        self.heap.push(FloodEntry {
            key,
            order: self.next_order,
            idx,
        });
        self.next_order += 1;
    }
}

pub(crate) fn grow_regions(
    seeds: &Seeds,
    landscape: &Plane<f32>,
    territory: &BitMask,
    polarity: SeedPolarity,
    connectivity: Connectivity,
) -> Plane<u32> {
    let width = seeds.labels.width();
    let height = seeds.labels.height();
    debug_assert_eq!(landscape.shape(), (width, height));

    let mut labels = seeds.labels.clone();
    let mut queue = FloodQueue {
        heap: BinaryHeap::new(),
        queued: vec![false; width * height],
        next_order: 0,
        landscape,
        polarity,
    };

    let mut seed_pixels: Vec<usize> = seeds.clusters.iter().flatten().copied().collect();
    seed_pixels.sort_unstable();
    for &idx in &seed_pixels {
        queue.queued[idx] = true;
    }
    for &idx in &seed_pixels {
        for n in neighbors(width, height, idx, connectivity) {
            if !queue.queued[n] && territory.get(n) {
                queue.push(n);
            }
        }
    }

    while let Some(FloodEntry { idx, .. }) = queue.heap.pop() {
        let label = nearest_adjacent_region(&labels, seeds, idx, connectivity);
        debug_assert!(label > 0, "flooded pixel without a labelled neighbour");
        labels[idx] = label;

        for n in neighbors(width, height, idx, connectivity) {
            if !queue.queued[n] && territory.get(n) {
                queue.push(n);
            }
        }
    }

    labels
}

/// Winning region among the labelled neighbours of `idx`.
fn nearest_adjacent_region(
    labels: &Plane<u32>,
    seeds: &Seeds,
    idx: usize,
    connectivity: Connectivity,
) -> u32 {
    let (x, y) = labels.coords(idx);
    let (x, y) = (x as f32, y as f32);

    let mut best: Option<(f32, u32)> = None;
    for n in neighbors(labels.width(), labels.height(), idx, connectivity) {
        let label = labels[n];
        if label == 0 {
            continue;
        }
        let (cx, cy) = seeds.centroids[(label - 1) as usize];
        let dist_sq = (x - cx) * (x - cx) + (y - cy) * (y - cy);
        let better = match best {
            None => true,
            Some((best_dist, best_label)) => {
                dist_sq < best_dist || (dist_sq == best_dist && label < best_label)
            }
        };
        if better {
            best = Some((dist_sq, label));
        }
    }
    best.map_or(0, |(_, label)| label)
}
