//! Calibrated scalar volumes in normalized coordinates.
//!
//! Meshes live in a normalized frame: the longest real-world axis of the
//! volume spans one unit and the volume is centered on the origin. An
//! [`ImageVolume`] converts between that frame and voxel indices and samples
//! voxel values with trilinear interpolation.
//!
//! # Out-of-bounds handling
//!
//! Queries outside the volume never fail. The voxel index is clamped to the
//! grid, so the value at the nearest face is returned.
//!
//! # Example
//!
//! ```
//! use contour_energy::{ImageCalibration, ImageVolume};
//! use contour_types::Point3;
//!
//! // 20 x 20 x 10 voxels, slices twice as thick as pixels are wide.
//! let calibration = ImageCalibration::new(0.5, 0.5, 1.0);
//! let volume = ImageVolume::from_fn(20, 20, 10, calibration, |p| 1.0 - p.coords.norm())?;
//!
//! assert!((volume.scale() - 10.0).abs() < 1e-12);
//! assert!((volume.min_pixel() - 0.05).abs() < 1e-12);
//! assert!(volume.sample(&Point3::origin()) > volume.sample(&Point3::new(0.4, 0.0, 0.0)));
//! # Ok::<(), contour_energy::EnergyError>(())
//! ```

// Voxel indices are small and clamped before use.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use contour_types::{Bounds, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EnergyError, EnergyResult};

/// Interpolation fractions at or below this snap to the lower voxel.
const MIN_FRACTION: f64 = 1e-4;

/// Real-world size of one voxel along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageCalibration {
    /// Pixel width (x).
    pub pixel_width: f64,
    /// Pixel height (y).
    pub pixel_height: f64,
    /// Slice spacing (z).
    pub pixel_depth: f64,
}

impl Default for ImageCalibration {
    fn default() -> Self {
        Self::isotropic(1.0)
    }
}

impl ImageCalibration {
    /// Calibration with the given pixel sizes.
    #[must_use]
    pub const fn new(pixel_width: f64, pixel_height: f64, pixel_depth: f64) -> Self {
        Self {
            pixel_width,
            pixel_height,
            pixel_depth,
        }
    }

    /// Cubic voxels of edge `size`.
    #[must_use]
    pub const fn isotropic(size: f64) -> Self {
        Self::new(size, size, size)
    }

    /// Set the slice spacing.
    #[must_use]
    pub const fn with_pixel_depth(mut self, depth: f64) -> Self {
        self.pixel_depth = depth;
        self
    }

    /// Pixel sizes as a vector.
    #[must_use]
    pub const fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.pixel_width, self.pixel_height, self.pixel_depth)
    }

    /// Checks that every pixel size is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`EnergyError::InvalidCalibration`] naming the first bad axis.
    pub fn validate(&self) -> EnergyResult<()> {
        for (axis, value) in [
            ('x', self.pixel_width),
            ('y', self.pixel_height),
            ('z', self.pixel_depth),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EnergyError::InvalidCalibration { axis, value });
            }
        }
        Ok(())
    }
}

/// A 3D scalar image with calibration.
///
/// Values are stored in ZYX order: `values[z * width * height + y * width + x]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageVolume {
    values: Vec<f64>,
    width: usize,
    height: usize,
    depth: usize,
    calibration: ImageCalibration,
    /// Longest real-world extent.
    scale: f64,
    /// Half extents in normalized units.
    offsets: Vector3<f64>,
    /// Smallest pixel size in normalized units.
    min_pixel: f64,
}

impl ImageVolume {
    /// Creates a volume from voxel values.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero, `values` has the wrong length
    /// or the calibration is invalid.
    pub fn new(
        values: Vec<f64>,
        width: usize,
        height: usize,
        depth: usize,
        calibration: ImageCalibration,
    ) -> EnergyResult<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(EnergyError::EmptyVolume);
        }
        let expected = width * height * depth;
        if values.len() != expected {
            return Err(EnergyError::DimensionMismatch {
                expected,
                actual: values.len(),
            });
        }
        calibration.validate()?;

        let pixels = calibration.as_vector();
        let extent = Vector3::new(
            pixels.x * width as f64,
            pixels.y * height as f64,
            pixels.z * depth as f64,
        );
        let scale = extent.max();
        let offsets = extent * (0.5 / scale);
        let min_pixel = pixels.min() / scale;

        Ok(Self {
            values,
            width,
            height,
            depth,
            calibration,
            scale,
            offsets,
            min_pixel,
        })
    }

    /// Creates a volume by evaluating `f` at the normalized position of
    /// every voxel.
    ///
    /// # Errors
    ///
    /// See [`ImageVolume::new`].
    pub fn from_fn<F>(
        width: usize,
        height: usize,
        depth: usize,
        calibration: ImageCalibration,
        f: F,
    ) -> EnergyResult<Self>
    where
        F: Fn(Point3<f64>) -> f64,
    {
        let placeholder = Self::new(
            vec![0.0; width * height * depth],
            width,
            height,
            depth,
            calibration,
        )?;
        let mut values = Vec::with_capacity(width * height * depth);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let p = placeholder.to_normalized(&Point3::new(x as f64, y as f64, z as f64));
                    values.push(f(p));
                }
            }
        }
        Ok(Self { values, ..placeholder })
    }

    /// Number of voxels along x.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of voxels along y.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of slices.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Pixel sizes.
    #[must_use]
    pub const fn calibration(&self) -> &ImageCalibration {
        &self.calibration
    }

    /// Real-world length that maps to one normalized unit.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Half extents of the volume in normalized units.
    #[must_use]
    pub const fn offsets(&self) -> Vector3<f64> {
        self.offsets
    }

    /// Smallest pixel size in normalized units.
    ///
    /// Used as the finite-difference step of image energies.
    #[must_use]
    pub const fn min_pixel(&self) -> f64 {
        self.min_pixel
    }

    /// Normalized region covered by the volume.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(Point3::from(-self.offsets), Point3::from(self.offsets))
    }

    /// Voxel value, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        if x < self.width && y < self.height && z < self.depth {
            Some(self.values[self.index(x, y, z)])
        } else {
            None
        }
    }

    const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.width * self.height + y * self.width + x
    }

    /// Voxel coordinates of a normalized point.
    #[must_use]
    pub fn to_image(&self, p: &Point3<f64>) -> Point3<f64> {
        let pixels = self.calibration.as_vector();
        Point3::from((p.coords + self.offsets).component_div(&pixels) * self.scale)
    }

    /// Normalized position of voxel coordinates.
    #[must_use]
    pub fn to_normalized(&self, voxel: &Point3<f64>) -> Point3<f64> {
        let pixels = self.calibration.as_vector();
        Point3::from(voxel.coords.component_mul(&pixels) / self.scale - self.offsets)
    }

    /// Trilinearly interpolated value at a normalized point.
    ///
    /// Interpolation along an axis is skipped when the fractional offset is
    /// below `1e-4`, and out-of-range points take the value of the nearest
    /// face.
    #[must_use]
    #[allow(clippy::similar_names)]
    pub fn sample(&self, p: &Point3<f64>) -> f64 {
        let index = self.to_image(p);
        let max = [self.width - 1, self.height - 1, self.depth - 1];
        let mut base = [0usize; 3];
        let mut frac = [0.0; 3];
        for axis in 0..3 {
            let i = index[axis];
            let b = if i.is_nan() {
                0
            } else {
                (i.floor().max(0.0) as usize).min(max[axis])
            };
            base[axis] = b;
            frac[axis] = if b == max[axis] { 0.0 } else { i - b as f64 };
        }
        let [x, y, z] = base;
        let [fx, fy, fz] = frac.map(|f| f > MIN_FRACTION);
        let at = |dx: usize, dy: usize, dz: usize| self.values[self.index(x + dx, y + dy, z + dz)];

        let plane = |dz: usize| {
            let mut a = at(0, 0, dz);
            if fx {
                a += (at(1, 0, dz) - a) * frac[0];
            }
            if fy {
                let mut c = at(0, 1, dz);
                if fx {
                    c += (at(1, 1, dz) - c) * frac[0];
                }
                a += (c - a) * frac[1];
            }
            a
        };

        let v = plane(0);
        if fz { v + (plane(1) - v) * frac[2] } else { v }
    }
}
