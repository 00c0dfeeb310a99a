//! Orientation correction for rasterized pages.

use crate::error::PlansortError;
use std::path::Path;

/// Rotate the image file in place by `angle` degrees clockwise so the page
/// reads upright. Quadrant rotations swap the canvas dimensions, so nothing
/// is clipped. An angle of 0 leaves the file untouched.
pub fn rotate_upright(image_path: &Path, angle: i32) -> Result<(), PlansortError> {
    let quadrant = nearest_quadrant(angle);
    if quadrant == 0 {
        return Ok(());
    }

    let img = image::open(image_path)?;
    let rotated = match quadrant {
        90 => img.rotate90(),
        180 => img.rotate180(),
        _ => img.rotate270(),
    };
    rotated.save(image_path)?;
    Ok(())
}

/// Snap an angle in degrees to the nearest quadrant (0, 90, 180 or 270).
/// OSD only ever reports quadrants, but defend against odd values anyway.
fn nearest_quadrant(angle: i32) -> i32 {
    ((angle.rem_euclid(360) + 45) / 90) % 4 * 90
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn snaps_to_nearest_quadrant() {
        assert_eq!(nearest_quadrant(0), 0);
        assert_eq!(nearest_quadrant(90), 90);
        assert_eq!(nearest_quadrant(180), 180);
        assert_eq!(nearest_quadrant(270), 270);
        assert_eq!(nearest_quadrant(359), 0);
        assert_eq!(nearest_quadrant(44), 0);
        assert_eq!(nearest_quadrant(46), 90);
        assert_eq!(nearest_quadrant(-90), 270);
        assert_eq!(nearest_quadrant(450), 90);
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(4, 2);
        img.save(&path).unwrap();

        rotate_upright(&path, 90).unwrap();

        let rotated = image::open(&path).unwrap();
        assert_eq!(rotated.width(), 2);
        assert_eq!(rotated.height(), 4);
    }

    #[test]
    fn zero_angle_does_not_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jpg");
        // Not a real image; rotate by 0 must return before decoding it.
        std::fs::write(&path, b"not an image").unwrap();

        rotate_upright(&path, 0).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"not an image");
    }
}
