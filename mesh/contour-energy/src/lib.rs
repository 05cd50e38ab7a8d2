//! External energies for active-contour meshes.
//!
//! Every energy implements [`ExternalEnergy`]: it reads the current mesh and
//! adds a force per node into three per-axis accumulators. The solver sums
//! all registered energies before each step.
//!
//! # Energies
//!
//! | Energy | Drives nodes towards |
//! |--------|----------------------|
//! | [`ImageEnergy`] | Bright voxels or strong edges of an [`ImageVolume`] |
//! | [`Pressure`] | Outwards (or inwards) along triangle normals |
//! | [`TriangleAreaDistributor`] | Evenly sized triangles |
//! | [`VolumeConservation`] | A fixed enclosed volume |
//! | [`Steric`], [`SofterSteric`] | Outside of a neighbouring mesh |
//! | [`CurveAttraction`] | A traced 3D curve |
//! | [`Smoothing`] | Lower mean curvature |
//! | [`NodeAttractor`] | A fixed anchor point |
//! | [`Ballooning`] | The walls of a bounding surface |
//!
//! # Example
//!
//! ```
//! use contour_energy::{ExternalEnergy, Pressure, PressureParams, Smoothing};
//! use contour_types::block;
//!
//! let mesh = block(1.0, 1.0, 1.0);
//! let energies: Vec<Box<dyn ExternalEnergy>> = vec![
//!     Box::new(Pressure::new(&mesh, PressureParams::new(0.5))),
//!     Box::new(Smoothing::new(0.1)),
//! ];
//!
//! let n = mesh.node_count();
//! let (mut fx, mut fy, mut fz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
//! for energy in &energies {
//!     energy.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
//! }
//! assert!(fx.iter().chain(&fy).chain(&fz).all(|f| f.is_finite()));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod area;
mod attractor;
mod balloon;
mod curve;
mod energy;
mod error;
mod image;
mod intensity;
mod pressure;
mod smoothing;
mod steric;
mod volume;

pub use area::TriangleAreaDistributor;
pub use attractor::NodeAttractor;
pub use balloon::Ballooning;
pub use curve::CurveAttraction;
pub use energy::ExternalEnergy;
pub use error::{EnergyError, EnergyResult};
pub use image::{ImageCalibration, ImageVolume};
pub use intensity::{ImageEnergy, ImageEnergyKind};
pub use pressure::{Pressure, PressureParams};
pub use smoothing::Smoothing;
pub use steric::{SofterSteric, Steric};
pub use volume::VolumeConservation;
