//! Rendering boundary: asset resolution and composite export.
//!
//! # Responsibility
//! - Define the asset store and compositor contracts the session depends on.
//! - Provide a deterministic software compositor as the reference
//!   implementation.
//!
//! # Invariants
//! - `Compositor::render` is a pure function of its inputs.
//! - Export is all-or-nothing: a cancelled render returns no partial buffer.
//! - The asset store is read-only from the core's perspective.

use crate::model::element::{Arch, AssetCategory, AssetRef};
use crate::model::transform::{Transform, TransformError};
use image::{Rgba, RgbaImage};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub enum AssetStoreError {
    NotFound(String),
    Io(std::io::Error),
    Decode(image::ImageError),
}

impl Display for AssetStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "asset not found: {path}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssetStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AssetStoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<image::ImageError> for AssetStoreError {
    fn from(value: image::ImageError) -> Self {
        Self::Decode(value)
    }
}

/// Read-only source of element and background pixels.
pub trait AssetStore {
    /// Resolves an asset reference to decoded RGBA pixels.
    fn resolve(&self, asset: &AssetRef) -> Result<RgbaImage, AssetStoreError>;

    /// Resolves a background image by file name.
    fn resolve_background(&self, path: &str) -> Result<RgbaImage, AssetStoreError>;

    /// Cheap existence probe used by load-time reconciliation.
    fn contains(&self, asset: &AssetRef) -> bool {
        self.resolve(asset).is_ok()
    }
}

/// Asset store over the application's image directory layout:
/// `dents/` for tooth markers, `selles/selles_sup|selles_inf/` for saddles,
/// `fonds/` for arch backgrounds.
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn asset_path(&self, asset: &AssetRef) -> PathBuf {
        let folder: &Path = match (asset.category, asset.arch) {
            (AssetCategory::Tooth, _) => Path::new("dents"),
            (AssetCategory::Saddle, Arch::Upper) => Path::new("selles/selles_sup"),
            (AssetCategory::Saddle, Arch::Lower) => Path::new("selles/selles_inf"),
        };
        self.root.join(folder).join(&asset.path)
    }

    fn load(path: &Path) -> Result<RgbaImage, AssetStoreError> {
        if !path.is_file() {
            return Err(AssetStoreError::NotFound(path.display().to_string()));
        }
        let decoded = image::open(path)?;
        Ok(decoded.into_rgba8())
    }
}

impl AssetStore for DirAssetStore {
    fn resolve(&self, asset: &AssetRef) -> Result<RgbaImage, AssetStoreError> {
        Self::load(&self.asset_path(asset))
    }

    fn resolve_background(&self, path: &str) -> Result<RgbaImage, AssetStoreError> {
        Self::load(&self.root.join("fonds").join(path))
    }

    fn contains(&self, asset: &AssetRef) -> bool {
        self.asset_path(asset).is_file()
    }
}

/// Cooperative cancellation flag for long-running exports.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub enum CompositeError {
    /// The cancel token was triggered; no partial buffer is produced.
    Cancelled,
    Transform(TransformError),
}

impl Display for CompositeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "composite export cancelled"),
            Self::Transform(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CompositeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cancelled => None,
            Self::Transform(err) => Some(err),
        }
    }
}

impl From<TransformError> for CompositeError {
    fn from(value: TransformError) -> Self {
        Self::Transform(value)
    }
}

/// One already-resolved layer handed to the compositor, bottom first.
pub struct CompositeLayer<'a> {
    pub pixels: &'a RgbaImage,
    /// Placement of the sprite center on the output canvas.
    pub transform: Transform,
}

/// Flattens ordered layers over a background.
pub trait Compositor {
    fn render(
        &self,
        background: &RgbaImage,
        layers: &[CompositeLayer<'_>],
        cancel: &CancelToken,
    ) -> Result<RgbaImage, CompositeError>;
}

/// CPU reference compositor.
///
/// Each layer is drawn by inverse-mapping output pixels through the layer
/// transform and sampling the sprite nearest-neighbour, then blending
/// source-over. Deterministic given identical inputs.
pub struct SoftwareCompositor;

impl Compositor for SoftwareCompositor {
    fn render(
        &self,
        background: &RgbaImage,
        layers: &[CompositeLayer<'_>],
        cancel: &CancelToken,
    ) -> Result<RgbaImage, CompositeError> {
        if cancel.is_cancelled() {
            return Err(CompositeError::Cancelled);
        }
        let mut output = background.clone();
        for layer in layers {
            draw_layer(&mut output, layer, cancel)?;
        }
        if cancel.is_cancelled() {
            return Err(CompositeError::Cancelled);
        }
        Ok(output)
    }
}

fn draw_layer(
    output: &mut RgbaImage,
    layer: &CompositeLayer<'_>,
    cancel: &CancelToken,
) -> Result<(), CompositeError> {
    let sprite = layer.pixels;
    let (sprite_w, sprite_h) = (sprite.width() as f64, sprite.height() as f64);
    if sprite_w == 0.0 || sprite_h == 0.0 {
        return Ok(());
    }
    let inverse = layer.transform.invert()?;

    // Bounding box of the transformed sprite on the output canvas; the
    // transform anchors the sprite center.
    let (half_w, half_h) = (sprite_w / 2.0, sprite_h / 2.0);
    let corners = [
        layer.transform.apply((-half_w, -half_h)),
        layer.transform.apply((half_w, -half_h)),
        layer.transform.apply((-half_w, half_h)),
        layer.transform.apply((half_w, half_h)),
    ];
    let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

    let x_start = min_x.floor().max(0.0) as u32;
    let y_start = min_y.floor().max(0.0) as u32;
    let x_end = (max_x.ceil().min(output.width() as f64)).max(0.0) as u32;
    let y_end = (max_y.ceil().min(output.height() as f64)).max(0.0) as u32;

    for out_y in y_start..y_end {
        if cancel.is_cancelled() {
            return Err(CompositeError::Cancelled);
        }
        for out_x in x_start..x_end {
            let (local_x, local_y) = inverse.apply((out_x as f64 + 0.5, out_y as f64 + 0.5));
            let sample_x = local_x + half_w;
            let sample_y = local_y + half_h;
            if sample_x < 0.0 || sample_y < 0.0 || sample_x >= sprite_w || sample_y >= sprite_h {
                continue;
            }
            let src = *sprite.get_pixel(sample_x as u32, sample_y as u32);
            if src.0[3] == 0 {
                continue;
            }
            let dst = output.get_pixel_mut(out_x, out_y);
            *dst = blend_over(src, *dst);
        }
    }
    Ok(())
}

fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let src_a = src.0[3] as u32;
    if src_a == 255 {
        return src;
    }
    let inv_a = 255 - src_a;
    let channel = |s: u8, d: u8| ((s as u32 * src_a + d as u32 * inv_a + 127) / 255) as u8;
    let out_a = (src_a + dst.0[3] as u32 * inv_a / 255).min(255) as u8;
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        out_a,
    ])
}
