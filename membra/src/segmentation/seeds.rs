//! Seed extraction from the spot response.
//!
//! A seed cluster is a plateau of equal response values inside the territory
//! whose territory neighbours are all strictly lower (for maxima) or higher
//! (for minima). Plateaus are found by flood fill, so every territory pixel
//! is visited once.

use crate::config::{Connectivity, SeedPolarity};
use crate::grid::{BitMask, Plane, neighbors};

/// Seed clusters labelled `1..=count` in row-major order of their first pixel.
#[derive(Debug, Clone)]
pub(crate) struct Seeds {
    pub labels: Plane<u32>,
    /// Seed pixel block per label, index `label - 1`.
    pub clusters: Vec<Vec<usize>>,
    /// `(x, y)` centroid per label, index `label - 1`.
    pub centroids: Vec<(f32, f32)>,
}

impl Seeds {
    pub fn count(&self) -> usize {
        self.clusters.len()
    }
}

pub(crate) fn find_seeds(
    response: &Plane<f32>,
    territory: &BitMask,
    polarity: SeedPolarity,
    connectivity: Connectivity,
) -> Seeds {
    let width = response.width();
    let height = response.height();
    debug_assert_eq!(response.shape(), territory.shape());

    let mut labels = Plane::new_default(width, height);
    let mut visited = vec![false; width * height];
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut centroids = Vec::new();

    let mut plateau: Vec<usize> = Vec::new();

    for start in territory.iter_ones() {
        if visited[start] {
            continue;
        }

        let value = response[start];
        let mut is_extremum = true;

        plateau.clear();
        plateau.push(start);
        visited[start] = true;

        // `plateau` doubles as the BFS queue.
        let mut head = 0;
        while head < plateau.len() {
            let idx = plateau[head];
            head += 1;

            for n in neighbors(width, height, idx, connectivity) {
                if !territory.get(n) {
                    continue;
                }
                let v = response[n];
                if v == value {
                    if !visited[n] {
                        visited[n] = true;
                        plateau.push(n);
                    }
                } else if polarity.dominates(v, value) {
                    is_extremum = false;
                }
            }
        }

        if !is_extremum {
            continue;
        }

        let label = clusters.len() as u32 + 1;
        let (mut sx, mut sy) = (0.0f64, 0.0f64);
        for &idx in &plateau {
            labels[idx] = label;
            sx += (idx % width) as f64;
            sy += (idx / width) as f64;
        }
        let n = plateau.len() as f64;
        centroids.push(((sx / n) as f32, (sy / n) as f32));

        let mut cluster = plateau.clone();
        cluster.sort_unstable();
        clusters.push(cluster);
    }

    Seeds {
        labels,
        clusters,
        centroids,
    }
}
