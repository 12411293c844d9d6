//! Built-in arch catalog: default dentition layout and backgrounds.
//!
//! # Responsibility
//! - Provide the canonical FDI tooth layout for each arch.
//! - Name the default background asset per arch.
//!
//! # Invariants
//! - Tooth numbers follow FDI notation: quadrants 1/2 on the upper arch,
//!   3/4 on the lower arch, positions 1..=8 from the midline outward.
//! - Coordinates are expressed on the 800x600 design canvas shared by the
//!   background images.

use crate::model::element::{Arch, AssetCategory, AssetRef};
use crate::model::transform::Transform;

/// Width of the design canvas the catalog coordinates refer to.
pub const CANVAS_WIDTH: u32 = 800;
/// Height of the design canvas the catalog coordinates refer to.
pub const CANVAS_HEIGHT: u32 = 600;

/// Canvas point where a saddle lands when it has no stored placement.
pub const DEFAULT_SADDLE_POSITION: (f64, f64) = (400.0, 300.0);

const UPPER_TEETH: &[(u8, f64, f64)] = &[
    (11, 419.0, 150.0),
    (12, 467.0, 165.0),
    (13, 502.0, 190.0),
    (14, 533.0, 225.0),
    (15, 555.0, 265.0),
    (16, 581.0, 310.0),
    (17, 596.0, 355.0),
    (18, 606.0, 400.0),
    (21, 366.0, 150.0),
    (22, 318.0, 165.0),
    (23, 284.0, 190.0),
    (24, 262.0, 225.0),
    (25, 243.0, 265.0),
    (26, 228.0, 310.0),
    (27, 216.0, 355.0),
    (28, 200.0, 400.0),
];

const LOWER_TEETH: &[(u8, f64, f64)] = &[
    (31, 419.0, 448.0),
    (32, 467.0, 432.0),
    (33, 502.0, 408.0),
    (34, 533.0, 373.0),
    (35, 555.0, 332.0),
    (36, 581.0, 289.0),
    (37, 596.0, 242.0),
    (38, 606.0, 194.0),
    (41, 366.0, 448.0),
    (42, 318.0, 433.0),
    (43, 284.0, 407.0),
    (44, 262.0, 369.0),
    (45, 243.0, 328.0),
    (46, 228.0, 283.0),
    (47, 216.0, 237.0),
    (48, 200.0, 190.0),
];

/// Default background asset for an arch.
pub fn default_background(arch: Arch) -> &'static str {
    match arch {
        Arch::Upper => "fond_superieur.png",
        Arch::Lower => "fond_inferieur.png",
    }
}

/// Full default dentition for an arch as (asset, placement) pairs.
///
/// Teeth are listed quadrant by quadrant, midline outward, which is also a
/// reasonable default paint order (markers do not overlap).
pub fn default_tooth_layout(arch: Arch) -> Vec<(AssetRef, Transform)> {
    let table = match arch {
        Arch::Upper => UPPER_TEETH,
        Arch::Lower => LOWER_TEETH,
    };
    table
        .iter()
        .map(|&(number, x, y)| {
            (
                AssetRef::new(format!("dent_{number}.png"), AssetCategory::Tooth, arch),
                Transform::at(x, y),
            )
        })
        .collect()
}
