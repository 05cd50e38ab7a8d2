//! The deforming mesh and its implicit update step.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use contour_energy::ExternalEnergy;
use contour_types::SurfaceMesh;
use nalgebra::{DMatrix, DVector, Dyn, LU};
use rayon::ThreadPool;
use tracing::{debug, info, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::params::Coefficients;
use crate::stiffness::assemble_stiffness;

/// Statistics from [`DeformableMesh::run_until`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStats {
    /// Number of committed steps.
    pub steps: usize,
    /// Largest node displacement of the last step.
    pub last_displacement: f64,
    /// Whether the run ended because the stop flag was raised.
    pub stopped: bool,
    /// Wall time spent in the run.
    pub elapsed: Duration,
}

/// Positions solved for one step but not yet written to the mesh.
///
/// Produced by [`DeformableMesh::solve_step`] and applied with
/// [`DeformableMesh::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingStep {
    positions: Vec<f64>,
}

impl PendingStep {
    /// The solved flat position buffer.
    #[must_use]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }
}

/// A surface mesh advanced by an implicit stiffness solve.
///
/// Each step solves `M x = γ p + f` for every axis, where `M` is the
/// stiffness matrix from [`assemble_stiffness`], `p` the current positions
/// and `f` the summed forces of all attached energies. The solution becomes
/// the new positions.
///
/// `M` is factorized once and reused. Changing the coefficients or gamma
/// factors marks it dirty; after changing the topology through
/// [`mesh_mut`](Self::mesh_mut), call [`mark_dirty`](Self::mark_dirty).
///
/// # Example
///
/// ```
/// use contour_energy::{Pressure, PressureParams};
/// use contour_solver::{Coefficients, DeformableMesh};
/// use contour_types::block;
///
/// let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
/// let mesh = block(1.0, 1.0, 1.0);
/// let pressure = Pressure::new(&mesh, PressureParams::new(10.0));
///
/// let mut deformable = DeformableMesh::new(mesh, Coefficients::default());
/// deformable.add_energy(Box::new(pressure));
/// deformable.update(&pool)?;
///
/// // The push outweighs the edge springs pulling the block in.
/// assert!(deformable.mesh().signed_volume() > 1.0);
/// # Ok::<(), contour_solver::SolverError>(())
/// ```
pub struct DeformableMesh {
    mesh: SurfaceMesh,
    coefficients: Coefficients,
    gamma_factors: Vec<f64>,
    energies: Vec<Box<dyn ExternalEnergy>>,
    decomposition: Option<LU<f64, Dyn, Dyn>>,
    steps: usize,
}

impl fmt::Debug for DeformableMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let energies: Vec<&str> = self.energies.iter().map(|e| e.name()).collect();
        f.debug_struct("DeformableMesh")
            .field("nodes", &self.mesh.node_count())
            .field("coefficients", &self.coefficients)
            .field("energies", &energies)
            .field("dirty", &self.is_dirty())
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl DeformableMesh {
    /// Wraps `mesh` with the given coefficients. No energies are attached.
    #[must_use]
    pub fn new(mesh: SurfaceMesh, coefficients: Coefficients) -> Self {
        let gamma_factors = vec![1.0; mesh.node_count()];
        Self {
            mesh,
            coefficients,
            gamma_factors,
            energies: Vec::new(),
            decomposition: None,
            steps: 0,
        }
    }

    /// The current mesh.
    #[must_use]
    pub const fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// Mutable access to the mesh.
    ///
    /// Moving nodes needs nothing further. Topology changes require a call
    /// to [`mark_dirty`](Self::mark_dirty) before the next step.
    pub const fn mesh_mut(&mut self) -> &mut SurfaceMesh {
        &mut self.mesh
    }

    /// Swaps in a new mesh, typically a remeshed one, and returns the old.
    ///
    /// Gamma factors are reset to one since node indices no longer match.
    pub fn replace_mesh(&mut self, mesh: SurfaceMesh) -> SurfaceMesh {
        self.gamma_factors = vec![1.0; mesh.node_count()];
        self.decomposition = None;
        std::mem::replace(&mut self.mesh, mesh)
    }

    /// Unwraps the mesh.
    #[must_use]
    pub fn into_mesh(self) -> SurfaceMesh {
        self.mesh
    }

    /// The elastic coefficients.
    #[must_use]
    pub const fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Replace the coefficients.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
        self.decomposition = None;
    }

    /// Gamma multiplier of `node`; one unless changed.
    #[must_use]
    pub fn gamma_factor(&self, node: usize) -> Option<f64> {
        self.gamma_factors.get(node).copied()
    }

    /// Scales how strongly `node` resists moving. A factor above one makes
    /// the node move less than the rest of the mesh.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NodeOutOfRange`] if `node` is not in the mesh.
    pub fn set_gamma_factor(&mut self, node: usize, factor: f64) -> SolverResult<()> {
        let node_count = self.mesh.node_count();
        if node >= node_count {
            return Err(SolverError::NodeOutOfRange { node, node_count });
        }
        self.gamma_factors.resize(node_count, 1.0);
        self.gamma_factors[node] = factor;
        self.decomposition = None;
        Ok(())
    }

    /// Attaches an energy.
    pub fn add_energy(&mut self, energy: Box<dyn ExternalEnergy>) {
        self.energies.push(energy);
    }

    /// Attached energies in the order they were added.
    #[must_use]
    pub fn energies(&self) -> &[Box<dyn ExternalEnergy>] {
        &self.energies
    }

    /// Keeps only the energies for which `keep` returns true.
    pub fn retain_energies<F>(&mut self, mut keep: F)
    where
        F: FnMut(&dyn ExternalEnergy) -> bool,
    {
        self.energies.retain(|energy| keep(energy.as_ref()));
    }

    /// Detaches every energy.
    pub fn clear_energies(&mut self) {
        self.energies.clear();
    }

    /// Forces the stiffness matrix to be rebuilt before the next step.
    pub fn mark_dirty(&mut self) {
        self.decomposition = None;
    }

    /// Whether the next step will rebuild the stiffness matrix.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.decomposition.is_none()
    }

    /// Number of steps committed so far.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Assembles and factorizes the stiffness matrix.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::SingularMatrix`] if the matrix cannot be
    /// inverted, or [`SolverError::Topology`] if the bending term meets an
    /// inconsistent mesh.
    pub fn reshape(&mut self) -> SolverResult<()> {
        let start = Instant::now();
        let size = self.mesh.node_count();
        self.gamma_factors.resize(size, 1.0);

        let matrix = assemble_stiffness(&self.mesh, &self.coefficients, &self.gamma_factors)?;
        let lu = matrix.lu();
        if !lu.is_invertible() {
            return Err(SolverError::SingularMatrix { size });
        }
        self.decomposition = Some(lu);

        debug!(size, elapsed_ms = start.elapsed().as_millis(), "reshaped stiffness matrix");
        Ok(())
    }

    /// Base forces plus every energy's contribution, per axis.
    #[must_use]
    pub fn forces(&self) -> [Vec<f64>; 3] {
        let n = self.mesh.node_count();
        let (mut fx, mut fy, mut fz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        for (i, xyz) in self.mesh.positions().chunks_exact(3).enumerate() {
            let gamma = self.coefficients.gamma * self.gamma_factors.get(i).copied().unwrap_or(1.0);
            fx[i] = gamma * xyz[0];
            fy[i] = gamma * xyz[1];
            fz[i] = gamma * xyz[2];
        }
        for energy in &self.energies {
            energy.update_forces(&self.mesh, &mut fx, &mut fy, &mut fz);
        }
        [fx, fy, fz]
    }

    /// Solves one step without touching the mesh.
    ///
    /// The three axis solves run on `pool`. Rebuilds the stiffness matrix
    /// first if it is dirty.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::SingularMatrix`] if the system cannot be
    /// solved, or [`SolverError::NonFinite`] if any solved coordinate is
    /// NaN or infinite.
    pub fn solve_step(&mut self, pool: &ThreadPool) -> SolverResult<PendingStep> {
        if self.decomposition.is_none() {
            self.reshape()?;
        }
        let n = self.mesh.node_count();
        let [fx, fy, fz] = self.forces();
        let Some(lu) = self.decomposition.as_ref() else {
            return Err(SolverError::SingularMatrix { size: n });
        };

        let (x, (y, z)) = pool.install(|| {
            rayon::join(
                || solve_axis(lu, fx),
                || rayon::join(|| solve_axis(lu, fy), || solve_axis(lu, fz)),
            )
        });

        let mut positions = vec![0.0; 3 * n];
        for (axis, (name, solved)) in [('x', x), ('y', y), ('z', z)].into_iter().enumerate() {
            let solved = solved.ok_or(SolverError::SingularMatrix { size: n })?;
            for (node, &value) in solved.iter().enumerate() {
                if !value.is_finite() {
                    return Err(SolverError::NonFinite { node, axis: name });
                }
                positions[3 * node + axis] = value;
            }
        }
        Ok(PendingStep { positions })
    }

    /// Writes solved positions into the mesh and returns the largest node
    /// displacement.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Topology`] if the step was solved for a mesh
    /// with a different node count.
    pub fn commit(&mut self, step: PendingStep) -> SolverResult<f64> {
        let displacement = self
            .mesh
            .positions()
            .chunks_exact(3)
            .zip(step.positions.chunks_exact(3))
            .map(|(old, new)| {
                let (dx, dy, dz) = (new[0] - old[0], new[1] - old[1], new[2] - old[2]);
                (dx * dx + dy * dy + dz * dz).sqrt()
            })
            .fold(0.0, f64::max);
        self.mesh.set_positions(step.positions)?;
        self.steps += 1;
        trace!(step = self.steps, displacement, "committed step");
        Ok(displacement)
    }

    /// Advances the mesh by one step.
    ///
    /// Nothing is written unless all three axes solve cleanly.
    ///
    /// # Errors
    ///
    /// See [`solve_step`](Self::solve_step).
    pub fn update(&mut self, pool: &ThreadPool) -> SolverResult<()> {
        let step = self.solve_step(pool)?;
        self.commit(step)?;
        Ok(())
    }

    /// Steps until `stop` is raised or `max_steps` steps have run.
    ///
    /// The flag is polled between steps, so a step in progress always
    /// completes.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error; steps already
    /// committed remain applied.
    pub fn run_until(
        &mut self,
        pool: &ThreadPool,
        stop: &AtomicBool,
        max_steps: Option<usize>,
    ) -> SolverResult<RunStats> {
        let start = Instant::now();
        let mut stats = RunStats::default();
        loop {
            if stop.load(Ordering::Relaxed) {
                stats.stopped = true;
                break;
            }
            if max_steps.is_some_and(|max| stats.steps >= max) {
                break;
            }
            let step = self.solve_step(pool)?;
            stats.last_displacement = self.commit(step)?;
            stats.steps += 1;
        }
        stats.elapsed = start.elapsed();
        info!(
            steps = stats.steps,
            stopped = stats.stopped,
            last_displacement = stats.last_displacement,
            "deformation run finished"
        );
        Ok(stats)
    }

    /// Copies the stiffness matrix the next step would use.
    ///
    /// # Errors
    ///
    /// See [`assemble_stiffness`].
    pub fn stiffness_matrix(&self) -> SolverResult<DMatrix<f64>> {
        assemble_stiffness(&self.mesh, &self.coefficients, &self.gamma_factors)
    }
}

fn solve_axis(lu: &LU<f64, Dyn, Dyn>, forces: Vec<f64>) -> Option<DVector<f64>> {
    lu.solve(&DVector::from_vec(forces))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_energy::{NodeAttractor, Pressure, PressureParams};
    use contour_types::{Point3, Vector3, block};
    use rayon::ThreadPoolBuilder;

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    /// Pushes every node along +x.
    struct Wind(f64);

    impl ExternalEnergy for Wind {
        fn name(&self) -> &'static str {
            "wind"
        }

        fn update_forces(&self, _: &SurfaceMesh, fx: &mut [f64], _: &mut [f64], _: &mut [f64]) {
            for f in fx {
                *f += self.0;
            }
        }
    }

    /// Produces NaN forces.
    struct Broken;

    impl ExternalEnergy for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn update_forces(&self, _: &SurfaceMesh, _: &mut [f64], fy: &mut [f64], _: &mut [f64]) {
            fy[0] = f64::NAN;
        }
    }

    #[test]
    fn pure_gamma_step_is_a_fixed_point() {
        let mesh = block(1.0, 2.0, 3.0);
        let original = mesh.positions().to_vec();
        let mut deformable = DeformableMesh::new(mesh, Coefficients::new(0.0, 0.0, 5.0));
        deformable.update(&pool()).unwrap();
        for (a, b) in deformable.mesh().positions().iter().zip(&original) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        assert_eq!(deformable.steps(), 1);
    }

    #[test]
    fn uniform_force_translates_the_mesh() {
        // The Laplacian is symmetric with zero row sums, so a uniform push moves
        // the centroid by f / gamma.
        let mut deformable =
            DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::new(1.0, 0.0, 4.0));
        deformable.add_energy(Box::new(Wind(2.0)));
        let before = deformable.mesh().centroid();
        deformable.update(&pool()).unwrap();
        let moved = deformable.mesh().centroid() - before;
        assert_relative_eq!(moved, Vector3::new(0.5, 0.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn pressure_against_edge_springs() {
        // At this stiffness a weak pressure loses to the alpha term and the
        // block shrinks; a strong one inflates it.
        let volume_after = |pressure: f64| {
            let mesh = block(1.0, 1.0, 1.0);
            let energy = Pressure::new(&mesh, PressureParams::new(pressure));
            let mut deformable = DeformableMesh::new(mesh, Coefficients::default());
            deformable.add_energy(Box::new(energy));
            deformable.update(&pool()).unwrap();
            deformable.mesh().signed_volume()
        };
        assert!(volume_after(1.0) < 1.0);
        assert!(volume_after(10.0) > 1.0);
    }

    #[test]
    fn zero_matrix_is_singular() {
        let mut deformable =
            DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::new(0.0, 0.0, 0.0));
        let before = deformable.mesh().positions().to_vec();
        let err = deformable.update(&pool()).unwrap_err();
        assert!(matches!(err, SolverError::SingularMatrix { size: 8 }));
        assert_eq!(deformable.mesh().positions(), before.as_slice());
    }

    #[test]
    fn non_finite_solution_commits_nothing() {
        let mut deformable = DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::default());
        deformable.add_energy(Box::new(Broken));
        let before = deformable.mesh().positions().to_vec();
        let err = deformable.update(&pool()).unwrap_err();
        assert!(matches!(err, SolverError::NonFinite { axis: 'y', .. }));
        assert_eq!(deformable.mesh().positions(), before.as_slice());
        assert_eq!(deformable.steps(), 0);
    }

    #[test]
    fn coefficient_changes_mark_dirty() {
        let mut deformable = DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::default());
        assert!(deformable.is_dirty());
        deformable.reshape().unwrap();
        assert!(!deformable.is_dirty());
        deformable.set_coefficients(Coefficients::stiff());
        assert!(deformable.is_dirty());
        deformable.reshape().unwrap();
        deformable.set_gamma_factor(3, 2.0).unwrap();
        assert!(deformable.is_dirty());
        assert_eq!(deformable.gamma_factor(3), Some(2.0));
        assert!(matches!(
            deformable.set_gamma_factor(8, 1.0),
            Err(SolverError::NodeOutOfRange { node: 8, node_count: 8 })
        ));
    }

    #[test]
    fn heavy_node_moves_less() {
        let mut deformable =
            DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::new(0.0, 0.0, 1.0));
        deformable.set_gamma_factor(0, 10.0).unwrap();
        deformable.add_energy(Box::new(Wind(1.0)));
        let before: Vec<Point3<f64>> = deformable.mesh().points();
        deformable.update(&pool()).unwrap();
        let dx0 = deformable.mesh().position(0).x - before[0].x;
        let dx1 = deformable.mesh().position(1).x - before[1].x;
        assert_relative_eq!(dx0, 0.1, epsilon = 1e-12);
        assert_relative_eq!(dx1, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn attractor_converges_to_anchor() {
        let mesh = block(1.0, 1.0, 1.0);
        let anchor = mesh.position(2) + Vector3::new(0.5, 0.0, 0.0);
        let mut deformable = DeformableMesh::new(mesh, Coefficients::new(0.0, 0.0, 2.0));
        deformable.add_energy(Box::new(NodeAttractor::new(2, anchor, 1.0)));
        let stop = AtomicBool::new(false);
        let stats = deformable.run_until(&pool(), &stop, Some(60)).unwrap();
        assert_eq!(stats.steps, 60);
        assert!(!stats.stopped);
        assert_relative_eq!(deformable.mesh().position(2), anchor, epsilon = 1e-9);
    }

    #[test]
    fn raised_flag_stops_before_stepping() {
        let mut deformable = DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::default());
        let stop = AtomicBool::new(true);
        let stats = deformable.run_until(&pool(), &stop, None).unwrap();
        assert_eq!(stats.steps, 0);
        assert!(stats.stopped);
        assert_eq!(deformable.steps(), 0);
    }

    #[test]
    fn pending_step_applies_on_commit() {
        let mut deformable =
            DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::new(1.0, 0.0, 1.0));
        deformable.add_energy(Box::new(Wind(1.0)));
        let step = deformable.solve_step(&pool()).unwrap();
        assert_ne!(step.positions(), deformable.mesh().positions());
        let expected = step.positions().to_vec();
        let displacement = deformable.commit(step).unwrap();
        assert!(displacement > 0.0);
        assert_eq!(deformable.steps(), 1);
        assert_eq!(deformable.mesh().positions(), expected.as_slice());
    }

    #[test]
    fn replacing_the_mesh_resets_state() {
        let mut deformable = DeformableMesh::new(block(1.0, 1.0, 1.0), Coefficients::default());
        deformable.set_gamma_factor(0, 3.0).unwrap();
        deformable.reshape().unwrap();
        let old = deformable.replace_mesh(block(2.0, 2.0, 2.0));
        assert_eq!(old.node_count(), 8);
        assert!(deformable.is_dirty());
        assert_eq!(deformable.gamma_factor(0), Some(1.0));
    }
}
