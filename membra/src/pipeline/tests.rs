//! End-to-end tests of the segmentation pipeline.

use std::collections::HashSet;

use super::*;
use crate::ihc_image::IhcImage;
use crate::testing::{assert_regions_connected, init_tracing, synthetic};

const FILL: f32 = 100.0;

fn default_run(signal: &Plane<f32>) -> PipelineOutput {
    run(signal, 6.0, 3.0, 0.01).expect("pipeline should succeed")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn single_disk_gives_one_cell_on_its_perimeter() {
    init_tracing();
    let image = synthetic::disk(20, 20, (10, 10), 5, FILL);

    let output = default_run(&image);

    assert_eq!(output.cells.len(), 1);
    let cell = &output.cells[0];
    assert_eq!(cell.label, 1);
    assert!(!cell.outline_pixels.is_empty());
    assert_eq!(cell.pixel_count, cell.outline_pixels.len());
    assert_eq!(cell.mean_intensity, FILL as f64);
    assert_eq!(cell.median_intensity, FILL as f64);

    // Every outline pixel lies on the disk rim: radius in (4, 5].
    for &(row, col) in &cell.outline_pixels {
        let dy = row as i64 - 10;
        let dx = col as i64 - 10;
        let r_sq = dx * dx + dy * dy;
        assert!(r_sq > 16 && r_sq <= 25, "({}, {}) is not on the rim", row, col);
    }

    // The region is the disk itself.
    let disk_area = image.pixels().iter().filter(|&&v| v > 0.0).count();
    assert_eq!(cell.area, disk_area);
    assert_eq!(cell.centroid, (10.0, 10.0));
}

#[test]
fn two_disks_give_two_disjoint_cells() {
    let image = synthetic::two_disks(48, 20, FILL);

    let output = default_run(&image);

    assert_eq!(output.cells.len(), 2);
    let first: HashSet<_> = output.cells[0].outline_pixels.iter().copied().collect();
    let second: HashSet<_> = output.cells[1].outline_pixels.iter().copied().collect();
    assert!(!first.is_empty() && !second.is_empty());
    assert!(first.is_disjoint(&second));

    assert_eq!(output.cells[0].mean_intensity, output.cells[1].mean_intensity);
    assert_eq!(output.cells[0].mean_intensity, FILL as f64);
    assert_eq!(output.cells[0].pixel_count, output.cells[1].pixel_count);
    assert_eq!(output.mean_edge_intensity(), Some(FILL as f64));

    // Left disk is labelled first.
    assert!(output.cells[0].centroid.1 < output.cells[1].centroid.1);
    assert_regions_connected(output.artifacts.labels(), Connectivity::Four);
}

#[test]
fn full_threshold_detects_nothing() {
    let image = synthetic::two_disks(48, 20, FILL);

    let output = run(&image, 6.0, 3.0, 1.0).unwrap();

    assert!(output.cells.is_empty());
    assert_eq!(output.diagnostics.foreground_pixels, 0);
    assert_eq!(output.artifacts.labels().num_labels(), 0);
    assert_eq!(output.mean_edge_intensity(), None);
}

#[test]
fn all_zero_image_is_an_empty_result() {
    let image = synthetic::uniform(32, 24, 0.0);

    let output = default_run(&image);

    assert!(output.cells.is_empty());
    assert_eq!(output.diagnostics, Diagnostics::default());
}

#[test]
fn zero_sigma_fails_without_output() {
    let image = synthetic::disk(20, 20, (10, 10), 5, FILL);

    match run(&image, 0.0, 3.0, 0.01) {
        Err(Error::InvalidParameter { violations }) => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].contains("spot_sigma"));
        }
        other => panic!("expected InvalidParameter, got {:?}", other.map(|o| o.cells)),
    }
}

#[test]
fn all_violations_are_reported_together() {
    let image = synthetic::disk(20, 20, (10, 10), 5, FILL);

    match run(&image, -1.0, 0.0, 2.0) {
        Err(Error::InvalidParameter { violations }) => assert_eq!(violations.len(), 3),
        other => panic!("expected InvalidParameter, got {:?}", other.map(|o| o.cells)),
    }
}

#[test]
fn oversized_sigma_fails_without_output() {
    let image = synthetic::disk(20, 20, (10, 10), 5, FILL);

    match run(&image, 1.0e12, 3.0, 0.01) {
        Err(Error::InvalidParameter { violations }) => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].contains("spot_sigma"));
        }
        other => panic!("expected InvalidParameter, got {:?}", other.map(|o| o.cells)),
    }
}

#[test]
fn empty_and_invalid_samples_are_rejected() {
    let empty = Plane::<f32>::new(0, 0, Vec::new());
    assert!(matches!(
        CellSegmenter::new().run(&empty),
        Err(Error::EmptyInput)
    ));

    let mut image = synthetic::disk(20, 20, (10, 10), 5, FILL);
    image[(3, 4)] = f32::INFINITY;
    assert!(matches!(
        CellSegmenter::new().run(&image),
        Err(Error::InvalidSample { index: 83, .. })
    ));

    let mut image = synthetic::disk(20, 20, (10, 10), 5, FILL);
    image[(0, 0)] = -50.0;
    assert!(matches!(
        CellSegmenter::new().run(&image),
        Err(Error::InvalidSample { index: 0, value }) if value == -50.0
    ));
}

/// Dark cells separated by fully bright membrane columns 13 and 27.
fn membrane_columns() -> Plane<f32> {
    Plane::from_fn(41, 15, |x, _| if x == 13 || x == 27 { 200.0 } else { 20.0 })
}

#[test]
fn dark_cells_split_on_bright_membranes() {
    let image = membrane_columns();

    for connectivity in [Connectivity::Four, Connectivity::Eight] {
        let output = CellSegmenter::new()
            .with_spot_sigma(3.0)
            .with_outline_sigma(1.0)
            .with_threshold(0.0)
            .with_normalization(Normalization::Maximum)
            .with_seed_polarity(SeedPolarity::Minima)
            .with_connectivity(connectivity)
            .run(&image)
            .unwrap();

        assert_eq!(output.cells.len(), 3, "{:?}", connectivity);
        let labels = output.artifacts.labels();
        for y in 0..15 {
            for x in 0..41 {
                let expected = match x {
                    0..=12 => 1,
                    13..=27 => 2,
                    _ => 3,
                };
                assert_eq!(labels[y * 41 + x], expected, "({}, {}) {:?}", x, y, connectivity);
            }
        }
        assert_regions_connected(labels, connectivity);

        // The middle cell owns both membranes; its neighbours see only their
        // own dark side of the boundary.
        let [left, middle, right] = [&output.cells[0], &output.cells[1], &output.cells[2]];
        assert_eq!(middle.mean_intensity, 200.0);
        assert_eq!(middle.pixel_count, 30);
        assert!(middle.outline_pixels.iter().all(|&(_, col)| col == 13 || col == 27));
        assert_eq!(left.mean_intensity, 20.0);
        assert!(left.outline_pixels.iter().all(|&(_, col)| col == 12));
        assert_eq!(right.mean_intensity, 20.0);
        assert!(right.outline_pixels.iter().all(|&(_, col)| col == 28));
    }
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn identical_inputs_give_identical_outputs() {
    let image = synthetic::bumpy_field(40, 30);
    let segmenter = CellSegmenter::new().with_spot_sigma(2.0).with_outline_sigma(1.0);

    let first = segmenter.run(&image).unwrap();
    let second = segmenter.run(&image).unwrap();

    assert!(!first.cells.is_empty());
    assert_eq!(first.cells, second.cells);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.artifacts.labels(), second.artifacts.labels());
}

#[test]
fn cells_are_sorted_and_match_label_map() {
    let image = synthetic::bumpy_field(60, 40);
    let output = CellSegmenter::new()
        .with_spot_sigma(2.0)
        .with_outline_sigma(1.0)
        .run(&image)
        .unwrap();

    let labels: Vec<u32> = output.cells.iter().map(|c| c.label).collect();
    let mut sorted = labels.clone();
    sorted.sort_unstable();
    assert_eq!(labels, sorted);

    let label_map = output.artifacts.labels();
    for cell in &output.cells {
        for &(row, col) in &cell.outline_pixels {
            assert_eq!(label_map[row * 60 + col], cell.label);
        }
    }
    assert_eq!(
        output.diagnostics.cells + output.diagnostics.degenerate_regions,
        label_map.num_labels()
    );
    assert_regions_connected(label_map, Connectivity::Four);
}

// ============================================================================
// Region filters
// ============================================================================

#[test]
fn dim_regions_are_filtered_and_relabelled() {
    // Far enough apart that neither spot response reaches the other disk.
    let mut image = Plane::new_default(64, 20);
    synthetic::paint_disk(&mut image, (14, 10), 5, 5.0);
    synthetic::paint_disk(&mut image, (50, 10), 5, FILL);

    let output = CellSegmenter::new()
        .with_min_region_intensity(50.0)
        .run(&image)
        .unwrap();

    assert_eq!(output.cells.len(), 1);
    assert_eq!(output.cells[0].label, 1);
    assert_eq!(output.cells[0].mean_intensity, FILL as f64);
    assert_eq!(output.diagnostics.seeds, 2);
    assert_eq!(output.diagnostics.rejected_dim, 1);
    assert_eq!(output.artifacts.labels().num_labels(), 1);
}

#[test]
fn small_regions_are_filtered() {
    let image = synthetic::two_disks(48, 20, FILL);

    let output = CellSegmenter::new()
        .with_min_cell_area(1000)
        .run(&image)
        .unwrap();

    assert!(output.cells.is_empty());
    assert_eq!(output.diagnostics.rejected_small, 2);
}

// ============================================================================
// Batch and QC
// ============================================================================

#[test]
fn run_all_isolates_failures() {
    let images = vec![
        synthetic::disk(20, 20, (10, 10), 5, FILL),
        Plane::new(0, 0, Vec::new()),
        synthetic::two_disks(48, 20, FILL),
    ];

    let results = CellSegmenter::new().run_all(&images);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().cells.len(), 1);
    assert!(matches!(results[1], Err(Error::EmptyInput)));
    assert_eq!(results[2].as_ref().unwrap().cells.len(), 2);
}

#[test]
fn multichannel_image_uses_selected_channel() {
    let disk = synthetic::disk(20, 20, (10, 10), 5, FILL);
    // Channel 0 is empty, channel 1 carries the stain.
    let samples: Vec<f32> = disk.pixels().iter().flat_map(|&v| [0.0, v]).collect();
    let image = IhcImage::from_interleaved_f32(20, 20, 2, samples).unwrap();

    let background = default_run(&image.signal(0).unwrap());
    let stained = default_run(&image.signal(1).unwrap());

    assert!(background.cells.is_empty());
    assert_eq!(stained.cells.len(), 1);
}

#[test]
fn artifacts_are_consistent_with_diagnostics() {
    let image = synthetic::two_disks(48, 20, FILL);
    let output = default_run(&image);
    let artifacts = &output.artifacts;

    assert_eq!(artifacts.spot_response().shape(), image.shape());
    assert_eq!(artifacts.outline_response().shape(), image.shape());
    assert_eq!(
        artifacts.outline_mask().count_ones(),
        output.diagnostics.foreground_pixels
    );
    assert_eq!(artifacts.seeds().num_labels(), output.diagnostics.seeds);
    assert_eq!(artifacts.labels().num_labels(), output.cells.len());
}

#[test]
fn overlay_marks_outlines() {
    let image = synthetic::disk(20, 20, (10, 10), 5, FILL);
    let output = default_run(&image);

    let overlay = output.artifacts.render_overlay(&image).unwrap();

    assert_eq!(overlay.dimensions(), (20, 20));
    for &(row, col) in &output.cells[0].outline_pixels {
        assert_eq!(overlay.get_pixel(col as u32, row as u32).0, [255, 48, 48]);
    }
    assert_eq!(overlay.get_pixel(0, 0).0, [0, 0, 0]);
}

#[test]
fn overlay_rejects_mismatched_signal() {
    let image = synthetic::disk(20, 20, (10, 10), 5, FILL);
    let output = default_run(&image);

    assert!(matches!(
        output.artifacts.render_overlay(&Plane::new_default(20, 21)),
        Err(Error::ShapeMismatch {
            expected: (20, 20),
            actual: (20, 21)
        })
    ));
}
