//! Base tile layer.

use trail_map_trail_models::LatLng;

/// Web-mercator raster tile layer drawn under the overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    /// URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    /// Attribution HTML.
    pub attribution: String,
}

impl TileLayer {
    /// Creates a tile layer.
    #[must_use]
    pub fn new(url_template: &str, attribution: &str) -> Self {
        Self {
            url_template: url_template.to_string(),
            attribution: attribution.to_string(),
        }
    }

    /// URL of one tile.
    #[must_use]
    pub fn url(&self, z: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    /// URL of the tile containing `location` at zoom `z`.
    #[must_use]
    pub fn url_at(&self, location: LatLng, z: u8) -> String {
        let (x, y) = tile_coords(location, z);
        self.url(z, x, y)
    }
}

/// Slippy-map tile coordinates of `location` at zoom `z`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn tile_coords(location: LatLng, z: u8) -> (u32, u32) {
    let n = f64::from(1_u32 << z.min(31));
    let lat = location.lat.clamp(-85.051_128, 85.051_128).to_radians();
    let x = ((location.lng + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - lat.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();
    let max = n - 1.0;
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}

/// Degrees of longitude covered by one pixel at zoom `z` (256 px tiles).
#[must_use]
pub fn degrees_per_pixel(z: u8) -> f64 {
    360.0 / (256.0 * f64::from(1_u32 << z.min(31)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_math_matches_known_tile() {
        // Philadelphia City Hall at z16
        let (x, y) = tile_coords(LatLng::new(39.9526, -75.1635), 16);
        assert_eq!((x, y), (19084, 24821));
    }

    #[test]
    fn url_template_substitution() {
        let layer = TileLayer::new("https://tiles.example/{z}/{x}/{y}.png", "");
        assert_eq!(layer.url(3, 1, 2), "https://tiles.example/3/1/2.png");
    }

    #[test]
    fn pixel_scale_halves_per_zoom() {
        assert!((degrees_per_pixel(0) - 360.0 / 256.0).abs() < 1e-12);
        assert!((degrees_per_pixel(1) * 2.0 - degrees_per_pixel(0)).abs() < 1e-12);
    }
}
