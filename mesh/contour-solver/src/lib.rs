//! Implicit stiffness solve for active-contour meshes.
//!
//! A [`DeformableMesh`] owns a [`SurfaceMesh`](contour_types::SurfaceMesh),
//! a set of [`Coefficients`] and any number of
//! [`ExternalEnergy`](contour_energy::ExternalEnergy) trait objects. Each
//! step sums the energies' forces and solves one pre-factorized linear
//! system per axis on a caller-supplied thread pool.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//!
//! use contour_energy::{Pressure, PressureParams, Smoothing};
//! use contour_solver::{Coefficients, DeformableMesh};
//! use contour_types::block;
//!
//! let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
//! let mesh = block(1.0, 1.0, 1.0);
//!
//! let mut deformable = DeformableMesh::new(mesh.clone(), Coefficients::default());
//! deformable.add_energy(Box::new(Pressure::new(&mesh, PressureParams::new(0.5))));
//! deformable.add_energy(Box::new(Smoothing::new(0.01)));
//!
//! let stop = AtomicBool::new(false);
//! let stats = deformable.run_until(&pool, &stop, Some(10))?;
//! assert_eq!(stats.steps, 10);
//! # Ok::<(), contour_solver::SolverError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod deformable;
mod error;
mod params;
mod stiffness;

pub use deformable::{DeformableMesh, PendingStep, RunStats};
pub use error::{SolverError, SolverResult};
pub use params::Coefficients;
pub use stiffness::assemble_stiffness;
