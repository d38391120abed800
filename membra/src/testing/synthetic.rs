//! Synthetic IHC-like test images.

use crate::grid::Plane;

/// Filled disk of `value` on a zero background.
pub fn disk(
    width: usize,
    height: usize,
    center: (usize, usize),
    radius: usize,
    value: f32,
) -> Plane<f32> {
    let mut plane = Plane::new_default(width, height);
    paint_disk(&mut plane, center, radius, value);
    plane
}

/// Two equal, well separated disks of radius 5 on the horizontal midline.
pub fn two_disks(width: usize, height: usize, value: f32) -> Plane<f32> {
    let mut plane = Plane::new_default(width, height);
    paint_disk(&mut plane, (width / 4, height / 2), 5, value);
    paint_disk(&mut plane, (3 * width / 4, height / 2), 5, value);
    plane
}

/// Paint a filled disk, the `(x - cx)^2 + (y - cy)^2 <= r^2` pixels.
pub fn paint_disk(plane: &mut Plane<f32>, center: (usize, usize), radius: usize, value: f32) {
    let (cx, cy) = (center.0 as i64, center.1 as i64);
    let r_sq = (radius * radius) as i64;
    for y in 0..plane.height() {
        for x in 0..plane.width() {
            let dx = x as i64 - cx;
            let dy = y as i64 - cy;
            if dx * dx + dy * dy <= r_sq {
                plane[(x, y)] = value;
            }
        }
    }
}

/// Strictly positive field with many separated local maxima.
pub fn bumpy_field(width: usize, height: usize) -> Plane<f32> {
    Plane::from_fn(width, height, |x, y| {
        let (x, y) = (x as f32, y as f32);
        10.0 + 5.0 * (x * 0.5).sin() * (y * 0.4).cos() + 0.01 * x + 0.003 * y
    })
}

/// Constant image.
pub fn uniform(width: usize, height: usize, value: f32) -> Plane<f32> {
    Plane::new_filled(width, height, value)
}
