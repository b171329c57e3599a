// Coordinate transforms: server cell -> virtual space -> output pixels.

use super::marker::{Marker, MarkerType};

/// Physical layout of the server grid and marker sizes in game units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldGeometry {
    pub servers_x: u32,
    pub servers_y: u32,
    /// Game-unit span of one server cell.
    pub grid_size: f64,
    pub land_radius: f64,
    pub water_radius: f64,
}

/// Maps cell-relative marker positions into one continuous virtual space.
///
/// Cells use a square pitch taken from the longer grid axis; the shorter axis leaves unused
/// virtual space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    virtual_pixels_per_cell: f64,
    land_radius: f64,
    water_radius: f64,
}

impl GridMapper {
    pub fn new(virtual_extent: u32, geometry: &WorldGeometry) -> Self {
        let servers = geometry.servers_x.max(geometry.servers_y).max(1);
        // Integer pitch: published coordinate scales were calibrated against it.
        let virtual_pixels_per_cell = f64::from(virtual_extent / servers);
        let to_virtual = |radius: f64| virtual_pixels_per_cell * radius / geometry.grid_size;

        Self {
            virtual_pixels_per_cell,
            land_radius: to_virtual(geometry.land_radius),
            water_radius: to_virtual(geometry.water_radius),
        }
    }

    pub fn virtual_pixels_per_cell(&self) -> f64 {
        self.virtual_pixels_per_cell
    }

    pub fn to_virtual(&self, marker: &Marker) -> (f64, f64) {
        let pitch = self.virtual_pixels_per_cell;
        (
            f64::from(marker.cell_x) * pitch + marker.rel_x * pitch,
            f64::from(marker.cell_y) * pitch + marker.rel_y * pitch,
        )
    }

    /// Water radius in virtual units; also the index box radius and the query gutter.
    pub fn water_radius(&self) -> f64 {
        self.water_radius
    }

    /// Type-specific rendered radius in virtual units.
    pub fn rendered_radius(&self, kind: MarkerType) -> f64 {
        match kind {
            MarkerType::Land => self.land_radius,
            MarkerType::Water => self.water_radius,
        }
    }
}

/// Axis-aligned virtual window with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl VirtualRect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square window of `size` virtual pixels starting at `(min_x, min_y)`.
    pub fn square(min_x: f64, min_y: f64, size: f64) -> Self {
        Self::new(min_x, min_y, min_x + size - 1.0, min_y + size - 1.0)
    }

    /// Area a footprint centre must fall in to touch the window: the window's exclusive
    /// end edges grown by `gutter` on every side.
    pub fn reach(&self, gutter: f64) -> Self {
        Self::new(
            self.min_x - gutter,
            self.min_y - gutter,
            self.max_x + 1.0 + gutter,
            self.max_y + 1.0 + gutter,
        )
    }

    /// True when a point lies within [`VirtualRect::reach`] (max edge exclusive).
    pub fn reaches(&self, x: f64, y: f64, gutter: f64) -> bool {
        let reach = self.reach(gutter);
        x >= reach.min_x && y >= reach.min_y && x < reach.max_x && y < reach.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x + 1.0
    }
}

/// Projects virtual coordinates into an output raster covering one clip window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelProjection {
    origin_x: f64,
    origin_y: f64,
    scale: f64,
}

impl PixelProjection {
    pub fn new(clip: &VirtualRect, output_pixels: u32) -> Self {
        Self {
            origin_x: clip.min_x,
            origin_y: clip.min_y,
            scale: f64::from(output_pixels) / clip.width(),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_pixel(&self, virtual_x: f64, virtual_y: f64) -> (f64, f64) {
        (
            (virtual_x - self.origin_x) * self.scale,
            (virtual_y - self.origin_y) * self.scale,
        )
    }

    pub fn radius(&self, virtual_radius: f64) -> f64 {
        virtual_radius * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(servers_x: u32, servers_y: u32) -> WorldGeometry {
        WorldGeometry {
            servers_x,
            servers_y,
            grid_size: 1_400_000.0,
            land_radius: 10_000.0,
            water_radius: 21_000.0,
        }
    }

    #[test]
    fn when_marker_is_mapped_then_cell_offset_and_relative_position_add_up() {
        let mapper = GridMapper::new(3000, &geometry(3, 3));
        let marker = Marker::new(2, 1, 9, 0.5, 0.25, MarkerType::Land).expect("valid marker");

        let (x, y) = mapper.to_virtual(&marker);

        assert_eq!(mapper.virtual_pixels_per_cell(), 1000.0);
        assert_eq!((x, y), (2500.0, 1250.0));
    }

    #[test]
    fn when_grid_is_not_square_then_pitch_follows_longer_axis() {
        let wide = GridMapper::new(3000, &geometry(3, 1));
        let tall = GridMapper::new(3000, &geometry(1, 3));

        assert_eq!(wide.virtual_pixels_per_cell(), 1000.0);
        assert_eq!(tall.virtual_pixels_per_cell(), 1000.0);
    }

    #[test]
    fn when_extent_does_not_divide_evenly_then_pitch_is_truncated() {
        let mapper = GridMapper::new(16384, &geometry(3, 3));

        assert_eq!(mapper.virtual_pixels_per_cell(), 5461.0);
    }

    #[test]
    fn when_radii_are_converted_then_they_scale_with_cell_pitch() {
        let mapper = GridMapper::new(1_400_000, &geometry(1, 1));

        assert_eq!(mapper.water_radius(), 21_000.0);
        assert_eq!(mapper.rendered_radius(MarkerType::Land), 10_000.0);
        assert_eq!(mapper.rendered_radius(MarkerType::Water), 21_000.0);
    }

    #[test]
    fn when_projecting_then_clip_origin_maps_to_zero_and_scale_applies() {
        let clip = VirtualRect::square(512.0, 256.0, 512.0);
        let projection = PixelProjection::new(&clip, 256);

        assert_eq!(projection.scale(), 0.5);
        assert_eq!(projection.to_pixel(512.0, 256.0), (0.0, 0.0));
        assert_eq!(projection.to_pixel(612.0, 356.0), (50.0, 50.0));
        assert_eq!(projection.radius(10.0), 5.0);
    }

    #[test]
    fn when_point_is_within_gutter_then_window_reaches_it() {
        let clip = VirtualRect::square(100.0, 100.0, 100.0);

        // Pixels 100..=199: the window spans [100, 200) and the gutter is 10 on each side.
        assert!(clip.reaches(90.0, 150.0, 10.0));
        assert!(!clip.reaches(89.9, 150.0, 10.0));
        assert!(clip.reaches(209.9, 150.0, 10.0));
        assert!(!clip.reaches(210.0, 150.0, 10.0));
        assert!(clip.reaches(150.0, 90.0, 10.0));
        assert!(!clip.reaches(150.0, 89.9, 10.0));
        assert!(clip.reaches(150.0, 209.9, 10.0));
        assert!(!clip.reaches(150.0, 210.0, 10.0));
    }
}
