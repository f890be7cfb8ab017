//! Geographic coordinates and the geo/screen projection.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Side length of a map tile at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 256.0;
/// Latitude limit of the Web Mercator projection.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// A WGS84 position in degrees.
///
/// Serialized as a `[lng, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Shift by a delta in degrees.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.lng + dx, self.lat + dy)
    }

    /// Componentwise difference `self - other`, as (dlng, dlat).
    pub fn delta_from(self, other: LngLat) -> Vec2 {
        Vec2::new(self.lng - other.lng, self.lat - other.lat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(c: LngLat) -> Self {
        [c.lng, c.lat]
    }
}

/// Converts between geographic coordinates and screen pixels.
pub trait Projection {
    /// Geographic position to screen pixels.
    fn project(&self, coords: LngLat) -> Point;

    /// Screen pixels to geographic position.
    fn unproject(&self, screen: Point) -> LngLat;

    /// Screen-space distance in pixels between a pointer and a geographic position.
    fn screen_distance(&self, screen: Point, coords: LngLat) -> f64 {
        self.project(coords).distance(screen)
    }
}

/// A Web Mercator map view.
///
/// `zoom` follows the slippy-map convention: the whole world spans
/// `TILE_SIZE * 2^zoom` pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Geographic position shown at the center of the screen.
    pub center: LngLat,
    /// Current zoom level.
    pub zoom: f64,
    /// Screen size in pixels.
    pub size: Size,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: LngLat::default(),
            zoom: 2.0,
            size: Size::new(800.0, 600.0),
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }
}

impl Viewport {
    pub fn new(center: LngLat, zoom: f64, size: Size) -> Self {
        let mut viewport = Self {
            center,
            size,
            ..Self::default()
        };
        viewport.zoom = zoom.clamp(viewport.min_zoom, viewport.max_zoom);
        viewport
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// Project to absolute world pixels at the current zoom.
    fn to_world(&self, coords: LngLat) -> Point {
        let scale = self.world_size();
        let lat = coords.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let x = (coords.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
        Point::new(x, y)
    }

    fn from_world(&self, world: Point) -> LngLat {
        let scale = self.world_size();
        let lng = world.x / scale * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * world.y / scale);
        let lat = n.sinh().atan().to_degrees();
        LngLat::new(lng, lat)
    }

    fn screen_center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Set the screen size.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    /// Pan the map by a delta in screen pixels (content follows the pointer).
    pub fn pan(&mut self, delta: Vec2) {
        self.center = self.unproject(self.screen_center() - delta);
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        let new_zoom = (self.zoom + factor.log2()).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.unproject(screen);
        self.zoom = new_zoom;

        // Shift the center so the anchor lands back under the pointer
        let drift = self.project(anchor) - screen;
        self.center = self.unproject(self.screen_center() + drift);
    }
}

impl Projection for Viewport {
    fn project(&self, coords: LngLat) -> Point {
        let world = self.to_world(coords);
        let origin = self.to_world(self.center);
        self.screen_center() + (world - origin)
    }

    fn unproject(&self, screen: Point) -> LngLat {
        let origin = self.to_world(self.center);
        self.from_world(origin + (screen - self.screen_center()))
    }
}
