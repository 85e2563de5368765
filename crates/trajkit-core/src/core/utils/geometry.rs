use crate::core::models::simbox::{Dimensions, SimBox};
use nalgebra::{Matrix3, Quaternion};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Magnitudes below this are treated as exact zeros when rebuilding a box.
pub const ZERO_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Degenerate box: edge {edge} evaluates to {value}")]
    DegenerateBox { edge: &'static str, value: f64 },
}

/// How the three angle slots of a stored unit cell are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleConvention {
    /// The slots hold the `xy`, `xz` and `yz` tilt factors directly, and the
    /// length slots hold `lx`, `ly` and `lz`.
    Legacy,
    /// CHARMM style: the slots hold the cosines of the cell angles.
    Modern,
}

impl AngleConvention {
    pub const LEGACY_MARKER: u32 = 0;
    pub const MODERN_MARKERS: RangeInclusive<u32> = 20..=99;

    /// Selects the convention from the version marker of a file header.
    ///
    /// Returns `None` for markers no known writer produces.
    pub fn from_marker(marker: u32) -> Option<Self> {
        if marker == Self::LEGACY_MARKER {
            Some(AngleConvention::Legacy)
        } else if Self::MODERN_MARKERS.contains(&marker) {
            Some(AngleConvention::Modern)
        } else {
            None
        }
    }
}

/// The six unit-cell scalars as stored in a frame header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredBox {
    pub a: f64,
    pub gamma: f64,
    pub b: f64,
    pub beta: f64,
    pub alpha: f64,
    pub c: f64,
}

impl StoredBox {
    /// Builds a stored box from its on-disk slot order `a, gamma, b, beta, alpha, c`.
    pub fn from_slots(slots: [f64; 6]) -> Self {
        let [a, gamma, b, beta, alpha, c] = slots;
        Self {
            a,
            gamma,
            b,
            beta,
            alpha,
            c,
        }
    }

    pub fn to_slots(&self) -> [f64; 6] {
        [self.a, self.gamma, self.b, self.beta, self.alpha, self.c]
    }
}

fn snap(value: f64) -> f64 {
    if value.abs() < ZERO_TOLERANCE { 0.0 } else { value }
}

fn check_edge(edge: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::DegenerateBox { edge, value })
    }
}

/// Rebuilds a [`SimBox`] from the six stored unit-cell scalars.
///
/// Under [`AngleConvention::Modern`] the angle slots hold cosines. The box
/// vectors are `a = (lx, 0, 0)`, `b = (xy', ly, 0)` and `c = (xz', yz', lz)`
/// with `|a|`, `|b|`, `|c|` equal to the stored lengths and the pairwise
/// angles given by the stored cosines.
///
/// Under [`AngleConvention::Legacy`] the angle slots already hold the tilt
/// factors `xy` (gamma slot), `xz` (beta slot) and `yz` (alpha slot), and the
/// length slots are the box edges.
///
/// Only magnitudes below [`ZERO_TOLERANCE`] are snapped to zero, so a
/// negative tilt keeps its sign. For [`Dimensions::Two`] the cross tilts are
/// zero and `lz` is the stored `c` as-is.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateBox`] if `lx`, `ly` or (in 3-D) `lz` is
/// not a positive finite number.
pub fn box_from_stored(
    stored: &StoredBox,
    convention: AngleConvention,
    dimensions: Dimensions,
) -> Result<SimBox, GeometryError> {
    let lx = check_edge("lx", stored.a)?;

    let (ly, lz, xy, xz, yz) = match convention {
        AngleConvention::Legacy => {
            let ly = check_edge("ly", stored.b)?;
            (ly, stored.c, snap(stored.gamma), snap(stored.beta), snap(stored.alpha))
        }
        AngleConvention::Modern => {
            let (cos_alpha, cos_beta, cos_gamma) = (stored.alpha, stored.beta, stored.gamma);
            let xy = snap(stored.b * cos_gamma);
            let ly = check_edge("ly", (stored.b * stored.b - xy * xy).max(0.0).sqrt())?;
            let xz = snap(stored.c * cos_beta);
            let yz = snap((stored.b * stored.c * cos_alpha - xy * xz) / ly);
            let lz = match dimensions {
                Dimensions::Two => stored.c,
                Dimensions::Three => (stored.c * stored.c - xz * xz - yz * yz).max(0.0).sqrt(),
            };
            (ly, lz, xy / ly, xz / lz, yz / lz)
        }
    };

    match dimensions {
        Dimensions::Two => Ok(SimBox::new(lx, ly, lz, xy, 0.0, 0.0, dimensions)),
        Dimensions::Three => {
            let lz = check_edge("lz", lz)?;
            Ok(SimBox::new(lx, ly, lz, xy, xz, yz, dimensions))
        }
    }
}

/// Computes the 3x3 box matrix (columns are box vectors) from six stored scalars.
pub fn compute_matrix(
    stored: &StoredBox,
    convention: AngleConvention,
) -> Result<Matrix3<f64>, GeometryError> {
    box_from_stored(stored, convention, Dimensions::Three).map(|simbox| simbox.matrix())
}

/// Converts an in-plane rotation angle into a quaternion about the z axis.
pub fn euler_to_quaternion(angle: f32) -> Quaternion<f32> {
    let half = angle * 0.5;
    Quaternion::new(half.cos(), 0.0, 0.0, half.sin())
}

/// Recovers the in-plane rotation angle from a quaternion about the z axis.
pub fn quaternion_to_euler(q: &Quaternion<f32>) -> f32 {
    2.0 * q.k.atan2(q.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn cosine_box(a: f64, b: f64, c: f64, cos_alpha: f64, cos_beta: f64, cos_gamma: f64) -> StoredBox {
        StoredBox {
            a,
            gamma: cos_gamma,
            b,
            beta: cos_beta,
            alpha: cos_alpha,
            c,
        }
    }

    #[test]
    fn right_angled_cube_yields_diagonal_matrix_in_modern_convention() {
        let stored = cosine_box(20.0, 20.0, 20.0, 0.0, 0.0, 0.0);
        let m = compute_matrix(&stored, AngleConvention::Modern).unwrap();
        assert_eq!(m, Matrix3::from_diagonal_element(20.0));
    }

    fn tilt_box(lx: f64, ly: f64, lz: f64, xy: f64, xz: f64, yz: f64) -> StoredBox {
        StoredBox {
            a: lx,
            gamma: xy,
            b: ly,
            beta: xz,
            alpha: yz,
            c: lz,
        }
    }

    #[test]
    fn untilted_cube_yields_diagonal_matrix_in_legacy_convention() {
        let stored = tilt_box(20.0, 20.0, 20.0, 0.0, 0.0, 0.0);
        let m = compute_matrix(&stored, AngleConvention::Legacy).unwrap();
        assert_eq!(m, Matrix3::from_diagonal_element(20.0));
    }

    #[test]
    fn legacy_slots_are_tilt_factors_scaled_by_edges() {
        let stored = tilt_box(10.0, 8.0, 6.0, 0.5, 0.25, -0.125);
        let simbox = box_from_stored(&stored, AngleConvention::Legacy, Dimensions::Three).unwrap();
        assert_eq!((simbox.lx, simbox.ly, simbox.lz), (10.0, 8.0, 6.0));
        assert_eq!((simbox.xy, simbox.xz, simbox.yz), (0.5, 0.25, -0.125));

        let m = simbox.matrix();
        assert_eq!(m[(0, 1)], 4.0);
        assert_eq!(m[(0, 2)], 1.5);
        assert_eq!(m[(1, 2)], -0.75);
    }

    #[test]
    fn negative_legacy_tilts_keep_their_sign() {
        let stored = tilt_box(10.0, 10.0, 10.0, -0.5, -1e-3, 0.0);
        let m = compute_matrix(&stored, AngleConvention::Legacy).unwrap();
        assert_eq!(m[(0, 1)], -5.0);
        assert!(f64_approx_equal(m[(0, 2)], -0.01));
        assert_eq!(m[(1, 2)], 0.0);
    }

    #[test]
    fn convention_is_chosen_by_marker_not_by_values() {
        // Read as a tilt factor 0.5 shears the cell; read as a cosine it shortens ly.
        let stored = tilt_box(10.0, 10.0, 10.0, 0.5, 0.0, 0.0);
        let legacy = box_from_stored(&stored, AngleConvention::Legacy, Dimensions::Three).unwrap();
        let modern = box_from_stored(&stored, AngleConvention::Modern, Dimensions::Three).unwrap();
        assert_eq!(legacy.matrix()[(0, 1)], 5.0);
        assert_eq!(legacy.ly, 10.0);
        assert!(f64_approx_equal(modern.matrix()[(0, 1)], 5.0));
        assert!(f64_approx_equal(modern.ly, 75f64.sqrt()));
    }

    #[test]
    fn negative_tilt_cosines_keep_their_sign() {
        let stored = cosine_box(10.0, 10.0, 10.0, -0.2, -0.3, -0.1);
        let m = compute_matrix(&stored, AngleConvention::Modern).unwrap();
        assert!(m[(0, 1)] < 0.0, "xy term lost its sign: {}", m[(0, 1)]);
        assert!(m[(0, 2)] < 0.0, "xz term lost its sign: {}", m[(0, 2)]);
        assert!(f64_approx_equal(m[(0, 1)], -1.0));
        assert!(f64_approx_equal(m[(0, 2)], -3.0));
    }

    #[test]
    fn legacy_two_dimensional_box_ignores_cross_tilts() {
        let stored = tilt_box(4.0, 4.0, 1.0, -0.25, 0.5, 0.5);
        let simbox = box_from_stored(&stored, AngleConvention::Legacy, Dimensions::Two).unwrap();
        assert_eq!(simbox.xy, -0.25);
        assert_eq!((simbox.xz, simbox.yz, simbox.lz), (0.0, 0.0, 1.0));
    }

    #[test]
    fn two_dimensional_box_keeps_stored_lz_and_drops_cross_tilts() {
        let stored = cosine_box(5.0, 5.0, 0.25, 0.3, 0.3, 0.1);
        let simbox = box_from_stored(&stored, AngleConvention::Modern, Dimensions::Two).unwrap();
        assert_eq!(simbox.lz, 0.25);
        assert_eq!(simbox.xz, 0.0);
        assert_eq!(simbox.yz, 0.0);
        assert!(f64_approx_equal(simbox.xy * simbox.ly, 0.5));
    }

    #[test]
    fn zero_length_edge_is_reported_as_degenerate() {
        let stored = cosine_box(0.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(
            compute_matrix(&stored, AngleConvention::Modern).unwrap_err(),
            GeometryError::DegenerateBox {
                edge: "lx",
                value: 0.0
            }
        );

        let collapsed = cosine_box(1.0, 1.0, 1.0, 0.0, 0.0, 1.0);
        assert!(matches!(
            compute_matrix(&collapsed, AngleConvention::Modern),
            Err(GeometryError::DegenerateBox { edge: "ly", .. })
        ));

        let flat = tilt_box(1.0, 1.0, -2.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            compute_matrix(&flat, AngleConvention::Legacy),
            Err(GeometryError::DegenerateBox { edge: "lz", .. })
        ));
    }

    #[test]
    fn markers_map_to_conventions() {
        assert_eq!(AngleConvention::from_marker(0), Some(AngleConvention::Legacy));
        assert_eq!(AngleConvention::from_marker(24), Some(AngleConvention::Modern));
        assert_eq!(AngleConvention::from_marker(7), None);
        assert_eq!(AngleConvention::from_marker(1000), None);
    }

    #[test]
    fn euler_angle_survives_quaternion_round_trip() {
        for angle in [-2.5f32, -0.3, 0.0, 0.7, 3.0] {
            let q = euler_to_quaternion(angle);
            assert!((q.norm() - 1.0).abs() < 1e-6);
            assert!((quaternion_to_euler(&q) - angle).abs() < 1e-5);
        }
    }

    proptest! {
        #[test]
        fn reconstructed_vectors_match_stored_lengths_and_angles(
            a in 1.0f64..100.0,
            b in 1.0f64..100.0,
            c in 1.0f64..100.0,
            cos_alpha in -0.4f64..0.4,
            cos_beta in -0.4f64..0.4,
            cos_gamma in -0.4f64..0.4,
        ) {
            let stored = cosine_box(a, b, c, cos_alpha, cos_beta, cos_gamma);
            let m = compute_matrix(&stored, AngleConvention::Modern).unwrap();
            let (va, vb, vc) = (m.column(0), m.column(1), m.column(2));

            prop_assert!((va.norm() - a).abs() < 1e-6 * a);
            prop_assert!((vb.norm() - b).abs() < 1e-6 * b);
            prop_assert!((vc.norm() - c).abs() < 1e-6 * c);
            prop_assert!((va.dot(&vb) - a * b * cos_gamma).abs() < 1e-6 * a * b);
            prop_assert!((va.dot(&vc) - a * c * cos_beta).abs() < 1e-6 * a * c);
            prop_assert!((vb.dot(&vc) - b * c * cos_alpha).abs() < 1e-6 * b * c);
        }

        #[test]
        fn xy_tilt_sign_follows_stored_gamma_cosine(
            a in 1.0f64..50.0,
            cos_gamma in -0.9f64..0.9,
        ) {
            prop_assume!(cos_gamma.abs() > 1e-6);
            let stored = cosine_box(a, a, a, 0.0, 0.0, cos_gamma);
            let m = compute_matrix(&stored, AngleConvention::Modern).unwrap();
            prop_assert_eq!(m[(0, 1)].signum(), cos_gamma.signum());
            prop_assert_eq!(m.diagonal()[0], a);
        }
    }
}
