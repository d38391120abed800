//! Spot and outline detectors.
//!
//! Both detectors are Gaussian smoothings of the signal channel at different
//! scales. The large spot sigma blurs away texture inside a cell so that each
//! interior becomes a single smooth extremum; the small outline sigma keeps
//! membrane-width structure while suppressing pixel noise.

use crate::config::check_sigma;
use crate::convolution::gaussian_smooth;
use crate::error::{Error, Result};
use crate::grid::Plane;

/// Response map whose local extrema approximate cell interiors.
pub fn detect_spots(image: &Plane<f32>, sigma: f32) -> Result<Plane<f32>> {
    smooth_checked(image, sigma, "spot_sigma")
}

/// Response map of membrane-scale structure, thresholded into the outline mask.
pub fn detect_outlines(image: &Plane<f32>, sigma: f32) -> Result<Plane<f32>> {
    smooth_checked(image, sigma, "outline_sigma")
}

fn smooth_checked(image: &Plane<f32>, sigma: f32, name: &str) -> Result<Plane<f32>> {
    let mut violations = Vec::new();
    check_sigma(name, sigma, &mut violations);
    if !violations.is_empty() {
        return Err(Error::InvalidParameter { violations });
    }
    if image.is_empty() {
        return Err(Error::EmptyInput);
    }

    tracing::debug!(
        "Gaussian smoothing ({}={:.2}) on {}x{} image",
        name,
        sigma,
        image.width(),
        image.height()
    );
    Ok(gaussian_smooth(image, sigma))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic;

    #[test]
    fn zero_sigma_is_invalid() {
        let image = synthetic::disk(20, 20, (10, 10), 5, 100.0);

        for result in [detect_spots(&image, 0.0), detect_outlines(&image, -2.0)] {
            match result {
                Err(Error::InvalidParameter { violations }) => assert_eq!(violations.len(), 1),
                other => panic!("expected InvalidParameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn huge_sigma_is_invalid() {
        let image = synthetic::disk(20, 20, (10, 10), 5, 100.0);

        for sigma in [1.0e12, f32::INFINITY, f32::NAN] {
            assert!(
                matches!(
                    detect_spots(&image, sigma),
                    Err(Error::InvalidParameter { .. })
                ),
                "sigma {}",
                sigma
            );
        }
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = Plane::<f32>::new(0, 7, Vec::new());
        assert!(matches!(detect_spots(&image, 6.0), Err(Error::EmptyInput)));
        assert!(matches!(detect_outlines(&image, 3.0), Err(Error::EmptyInput)));
    }

    #[test]
    fn responses_preserve_shape_and_sign() {
        let image = synthetic::two_disks(48, 20, 100.0);

        for sigma in [0.5, 3.0, 6.0] {
            let spots = detect_spots(&image, sigma).unwrap();
            let outlines = detect_outlines(&image, sigma).unwrap();
            for response in [&spots, &outlines] {
                assert_eq!(response.shape(), image.shape());
                assert!(response.pixels().iter().all(|v| v.is_finite() && *v >= 0.0));
            }
        }
    }

    #[test]
    fn larger_sigma_flattens_interior() {
        let image = synthetic::disk(40, 40, (20, 20), 8, 100.0);
        let narrow = detect_outlines(&image, 1.0).unwrap();
        let wide = detect_spots(&image, 6.0).unwrap();

        // The wide response peaks at the disk centre, the narrow one keeps
        // the plateau close to the fill value.
        assert!(wide[(20, 20)] < narrow[(20, 20)]);
        assert!(narrow[(20, 20)] > 99.0);
        assert!(wide[(20, 20)] > wide[(14, 20)]);
    }
}
