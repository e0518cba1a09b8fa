use std::f64::consts::PI;

/// Side of the Web Mercator world square at zoom level 0, in world units.
pub const WORLD_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Project WGS84 degrees onto the Web Mercator world square.
pub fn project(lat: f64, lon: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lon + 180.0) / 360.0 * WORLD_SIZE;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * WORLD_SIZE;
    (x, y)
}

/// Inverse of [`project`]. Returns (lat, lon) in degrees.
pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lon = x / WORLD_SIZE * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / WORLD_SIZE);
    let lat = n.sinh().atan().to_degrees();
    (lat, lon)
}

/// Pan/zoom transform from world units to canvas CSS pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

const MIN_SCALE: f64 = 1.0;
const MAX_SCALE: f64 = 1_048_576.0;
const ZOOM_SENSITIVITY: f64 = 0.002;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 4.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Zoom toward a focus point in screen coordinates.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        // Keep the point under the cursor fixed.
        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Fit world bounds into the canvas with padding. A single point (zero-sized
    /// bounds) is centered at the maximum zoom that keeps some context.
    pub fn fit_bounds(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        canvas_w: f64,
        canvas_h: f64,
    ) {
        if canvas_w <= 0.0 || canvas_h <= 0.0 {
            return;
        }
        let world_w = (max_x - min_x).max(WORLD_SIZE / 65_536.0);
        let world_h = (max_y - min_y).max(WORLD_SIZE / 65_536.0);

        let padding = 0.08;
        let scale_x = canvas_w / (world_w * (1.0 + padding * 2.0));
        let scale_y = canvas_h / (world_h * (1.0 + padding * 2.0));
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        self.offset_x = canvas_w / 2.0 - center_x * self.scale;
        self.offset_y = canvas_h / 2.0 - center_y * self.scale;
    }

    /// Degrees of longitude per screen pixel.
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / (WORLD_SIZE * self.scale)
    }
}
