//! Image-driven energies.

use std::sync::Arc;

use contour_curvature::node_normals;
use contour_types::{Point3, SurfaceMesh, Vector3};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::energy::{ExternalEnergy, accumulate};
use crate::image::ImageVolume;

/// Which image field drives the mesh and along which directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ImageEnergyKind {
    /// Climb the intensity along each axis.
    Intensity,
    /// Climb the gradient magnitude along each axis.
    Gradient,
    /// Climb the intensity along the surface normal only.
    PerpendicularIntensity,
    /// Climb the gradient magnitude along the surface normal only.
    PerpendicularGradient,
}

impl ImageEnergyKind {
    /// Whether forces are projected on the node normal.
    #[must_use]
    pub const fn is_perpendicular(self) -> bool {
        matches!(self, Self::PerpendicularIntensity | Self::PerpendicularGradient)
    }

    /// Whether the driving field is the gradient magnitude.
    #[must_use]
    pub const fn uses_gradient(self) -> bool {
        matches!(self, Self::Gradient | Self::PerpendicularGradient)
    }
}

/// Attraction towards bright regions or edges of an image.
///
/// Forces are central differences of a scalar field `S` with a step `dr`
/// equal to the smallest normalized pixel size:
///
/// - Axis-aligned kinds: `f = weight * (S(x + dr eᵢ) - S(x - dr eᵢ))` per axis
/// - Perpendicular kinds: `f = weight * (S(x + dr n̂) - S(x - dr n̂)) n̂`
///
/// `S` is either the sampled intensity `I` or the gradient magnitude
/// `G = |∂x I| + |∂y I| + |∂z I|`, itself a central difference of `I`.
/// A negative weight pushes the mesh away instead.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use contour_energy::{ExternalEnergy, ImageCalibration, ImageEnergy, ImageVolume};
/// use contour_types::{block, Point3};
///
/// // A bright ball of radius 0.3.
/// let volume = ImageVolume::from_fn(32, 32, 32, ImageCalibration::default(), |p| {
///     if p.coords.norm() < 0.3 { 1.0 } else { 0.0 }
/// })?;
/// let energy = ImageEnergy::intensity(Arc::new(volume), 1.0);
/// assert_eq!(energy.energy(&Point3::origin()), 1.0);
///
/// let mesh = block(0.6, 0.6, 0.6);
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// energy.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
/// # Ok::<(), contour_energy::EnergyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ImageEnergy {
    volume: Arc<ImageVolume>,
    kind: ImageEnergyKind,
    weight: f64,
    step: f64,
}

impl ImageEnergy {
    /// Creates an image energy of the given kind.
    #[must_use]
    pub fn new(volume: Arc<ImageVolume>, kind: ImageEnergyKind, weight: f64) -> Self {
        let step = volume.min_pixel();
        Self {
            volume,
            kind,
            weight,
            step,
        }
    }

    /// Axis-aligned intensity attraction.
    #[must_use]
    pub fn intensity(volume: Arc<ImageVolume>, weight: f64) -> Self {
        Self::new(volume, ImageEnergyKind::Intensity, weight)
    }

    /// Axis-aligned gradient-magnitude attraction.
    #[must_use]
    pub fn gradient(volume: Arc<ImageVolume>, weight: f64) -> Self {
        Self::new(volume, ImageEnergyKind::Gradient, weight)
    }

    /// Intensity attraction along node normals.
    #[must_use]
    pub fn perpendicular_intensity(volume: Arc<ImageVolume>, weight: f64) -> Self {
        Self::new(volume, ImageEnergyKind::PerpendicularIntensity, weight)
    }

    /// Gradient-magnitude attraction along node normals.
    #[must_use]
    pub fn perpendicular_gradient(volume: Arc<ImageVolume>, weight: f64) -> Self {
        Self::new(volume, ImageEnergyKind::PerpendicularGradient, weight)
    }

    /// The energy kind.
    #[must_use]
    pub const fn kind(&self) -> ImageEnergyKind {
        self.kind
    }

    /// Force weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Finite-difference step in normalized units.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Gradient magnitude `|∂x I| + |∂y I| + |∂z I|` at `p`.
    #[must_use]
    pub fn gradient_magnitude(&self, p: &Point3<f64>) -> f64 {
        central_difference(|q| self.volume.sample(q), p, self.step).abs().sum()
    }

    fn field(&self, p: &Point3<f64>) -> f64 {
        if self.kind.uses_gradient() {
            self.gradient_magnitude(p)
        } else {
            self.volume.sample(p)
        }
    }

    fn force_at(&self, p: &Point3<f64>, normal: Option<&Vector3<f64>>) -> Vector3<f64> {
        match normal {
            Some(n) => {
                let d = n * self.step;
                n * ((self.field(&(p + d)) - self.field(&(p - d))) * self.weight)
            }
            None => central_difference(|q| self.field(q), p, self.step) * self.weight,
        }
    }
}

/// Per-axis `f(p + h eᵢ) - f(p - h eᵢ)`.
fn central_difference<F>(f: F, p: &Point3<f64>, h: f64) -> Vector3<f64>
where
    F: Fn(&Point3<f64>) -> f64,
{
    Vector3::from_fn(|axis, _| {
        let mut offset = Vector3::zeros();
        offset[axis] = h;
        f(&(p + offset)) - f(&(p - offset))
    })
}

impl ExternalEnergy for ImageEnergy {
    fn name(&self) -> &'static str {
        match self.kind {
            ImageEnergyKind::Intensity => "intensity",
            ImageEnergyKind::Gradient => "gradient",
            ImageEnergyKind::PerpendicularIntensity => "perpendicular-intensity",
            ImageEnergyKind::PerpendicularGradient => "perpendicular-gradient",
        }
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        let normals = self.kind.is_perpendicular().then(|| node_normals(mesh));
        let forces: Vec<Vector3<f64>> = (0..mesh.node_count())
            .into_par_iter()
            .map(|i| {
                let p = mesh.position(i);
                self.force_at(&p, normals.as_ref().map(|n| &n[i]))
            })
            .collect();
        accumulate(&forces, fx, fy, fz);
    }

    fn energy(&self, point: &Point3<f64>) -> f64 {
        self.field(point)
    }
}
