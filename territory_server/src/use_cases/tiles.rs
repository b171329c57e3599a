// Tile pyramid generation for the web viewer.
//
// Every zoom level covers the same virtual extent (`tile_size * 2^(max_zoom - 1)` per
// axis) split into `2^zoom` tiles per axis, each rendered at `tile_size` pixels. Markers are
// drawn as opaque circles into a mask which then becomes the alpha channel of the tile,
// scaled by the configured circle alpha.

use crate::domain::{
    GridMapper, Marker, PixelProjection, PublishError, SpatialIndex, VirtualRect, WorldGeometry,
    owner_color,
};
use crate::use_cases::publish::publish;
use futures::future::join_all;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSettings {
    pub tile_size: u32,
    /// Number of zoom levels; levels are `0..max_zoom`.
    pub max_zoom: u32,
    pub circle_alpha: u8,
    pub geometry: WorldGeometry,
}

impl TileSettings {
    pub fn virtual_extent(&self) -> u32 {
        self.tile_size << self.max_zoom.saturating_sub(1)
    }

    pub fn tiles_per_axis(zoom: u32) -> u32 {
        1 << zoom
    }
}

/// Canonical location of one tile under the pyramid root.
pub fn tile_path(root: &Path, zoom: u32, tile_x: u32, tile_y: u32) -> PathBuf {
    root.join(zoom.to_string())
        .join(tile_x.to_string())
        .join(format!("{tile_y}.png"))
}

/// Virtual window covered by one tile.
pub fn tile_clip(settings: &TileSettings, zoom: u32, tile_x: u32, tile_y: u32) -> VirtualRect {
    let per_tile = settings.virtual_extent() / TileSettings::tiles_per_axis(zoom);
    VirtualRect::square(
        f64::from(tile_x * per_tile),
        f64::from(tile_y * per_tile),
        f64::from(per_tile),
    )
}

/// Rasterizes every entity reaching `clip` and applies the alpha mask.
pub fn render_tile(
    index: &SpatialIndex,
    mapper: &GridMapper,
    clip: &VirtualRect,
    tile_size: u32,
    circle_alpha: u8,
) -> RgbaImage {
    let projection = PixelProjection::new(clip, tile_size);
    let mut mask = RgbaImage::new(tile_size, tile_size);

    for entity in index.window(clip) {
        let (x, y) = projection.to_pixel(entity.virtual_x, entity.virtual_y);
        let radius = projection
            .radius(mapper.rendered_radius(entity.marker.kind))
            .max(1.0);
        fill_circle(&mut mask, x, y, radius, owner_color(entity.marker.owner_id));
    }

    apply_alpha(mask, circle_alpha)
}

// Fills pixels whose centres fall inside the circle.
fn fill_circle(image: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let (width, height) = image.dimensions();
    let min_y = (cy - radius).floor().max(0.0) as u32;
    let max_y = (cy + radius).ceil().min(f64::from(height)) as u32;
    let min_x = (cx - radius).floor().max(0.0) as u32;
    let max_x = (cx + radius).ceil().min(f64::from(width)) as u32;
    let radius_sq = radius * radius;

    for py in min_y..max_y {
        let dy = f64::from(py) + 0.5 - cy;
        for px in min_x..max_x {
            let dx = f64::from(px) + 0.5 - cx;
            if dx * dx + dy * dy <= radius_sq {
                image.put_pixel(px, py, color);
            }
        }
    }
}

fn apply_alpha(mut mask: RgbaImage, circle_alpha: u8) -> RgbaImage {
    for pixel in mask.pixels_mut() {
        let coverage = u16::from(pixel[3]);
        if coverage == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            pixel[3] = (coverage * u16::from(circle_alpha) / 255) as u8;
        }
    }
    mask
}

fn write_png(image: &RgbaImage, writer: &mut impl std::io::Write) -> Result<(), PublishError> {
    PngEncoder::new(writer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8.into(),
    )?;
    Ok(())
}

/// Renders and publishes every tile of one zoom level; stops at the first failure.
pub fn generate_zoom_level(
    root: &Path,
    zoom: u32,
    markers: &[Marker],
    settings: &TileSettings,
) -> Result<Vec<PathBuf>, PublishError> {
    let mapper = GridMapper::new(settings.virtual_extent(), &settings.geometry);
    let index = SpatialIndex::build(markers, &mapper);
    let tiles = TileSettings::tiles_per_axis(zoom);
    let mut published = Vec::with_capacity((tiles * tiles) as usize);

    for tile_x in 0..tiles {
        for tile_y in 0..tiles {
            let clip = tile_clip(settings, zoom, tile_x, tile_y);
            let image = render_tile(
                &index,
                &mapper,
                &clip,
                settings.tile_size,
                settings.circle_alpha,
            );
            let path = publish(&tile_path(root, zoom, tile_x, tile_y), |writer| {
                write_png(&image, writer)
            })?;
            published.push(path);
        }
    }

    debug!(zoom, tiles = published.len(), "zoom level published");
    Ok(published)
}

/// Generates all zoom levels concurrently and waits for every level before returning.
///
/// Each level builds its own index from the shared snapshot. Returns the first failure after
/// all levels have finished.
pub async fn generate_pyramid(
    root: PathBuf,
    markers: Arc<[Marker]>,
    settings: TileSettings,
) -> Result<Vec<PathBuf>, PublishError> {
    let tasks = (0..settings.max_zoom).map(|zoom| {
        let root = root.clone();
        let markers = Arc::clone(&markers);
        tokio::task::spawn_blocking(move || generate_zoom_level(&root, zoom, &markers, &settings))
    });

    let mut published = Vec::new();
    let mut first_error = None;
    for joined in join_all(tasks).await {
        match joined {
            Ok(Ok(paths)) => published.extend(paths),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(PublishError::Task(e.to_string()));
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    info!(tiles = published.len(), levels = settings.max_zoom, "tile pyramid published");
    Ok(published)
}
