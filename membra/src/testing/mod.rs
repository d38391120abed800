//! Testing utilities for membra.

#![allow(dead_code)]

pub mod synthetic;

use crate::config::Connectivity;
use crate::grid::neighbors;
use crate::segmentation::LabelMap;

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Assert that every label forms exactly one connected component.
pub fn assert_regions_connected(labels: &LabelMap, connectivity: Connectivity) {
    let (width, height) = labels.shape();
    let mut seen = vec![false; width * height];
    let mut label_done = vec![false; labels.num_labels() + 1];

    for start in 0..width * height {
        let label = labels[start];
        if label == 0 || seen[start] {
            continue;
        }
        assert!(
            !label_done[label as usize],
            "label {} has more than one connected component",
            label
        );
        label_done[label as usize] = true;

        let mut stack = vec![start];
        seen[start] = true;
        while let Some(idx) = stack.pop() {
            for n in neighbors(width, height, idx, connectivity) {
                if !seen[n] && labels[n] == label {
                    seen[n] = true;
                    stack.push(n);
                }
            }
        }
    }
}
