use glam::{IVec3, Vec3};

use super::particles::Particle;

/// Uniform spatial index over the container volume.
///
/// Cells map discretized predicted positions to particle indices. The grid
/// is a derived structure: it is rebuilt wholesale from the particle store
/// every step and holds no state of its own across steps. A neighbor query
/// over the 27-cell stencil returns a superset of all particles within the
/// interaction radius as long as the cell edge is at least that radius;
/// callers prune by exact distance.
pub struct SpatialGrid {
    origin: Vec3,
    cell_size: f32,
    dims: IVec3,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(min: Vec3, max: Vec3, cell_size: f32) -> Self {
        let extent = (max - min).max(Vec3::splat(cell_size));
        let dims = (extent / cell_size).ceil().as_ivec3().max(IVec3::ONE);
        let cell_count = (dims.x * dims.y * dims.z) as usize;
        if cell_count > 2_000_000 {
            log::warn!("spatial grid has {} cells; consider a larger cell size", cell_count);
        }

        Self {
            origin: min,
            cell_size,
            dims,
            cells: vec![Vec::new(); cell_count],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell coordinate for a position, clamped to the grid so particles that
    /// momentarily escape the container are still indexed.
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        let relative = (position - self.origin) / self.cell_size;
        relative.floor().as_ivec3().clamp(IVec3::ZERO, self.dims - IVec3::ONE)
    }

    fn cell_index(&self, cell: IVec3) -> usize {
        ((cell.z * self.dims.y + cell.y) * self.dims.x + cell.x) as usize
    }

    /// Rebuild the index from predicted positions. O(N).
    pub fn rebuild(&mut self, particles: &[Particle]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for (i, p) in particles.iter().enumerate() {
            let idx = self.cell_index(self.cell_of(p.position));
            self.cells[idx].push(i);
        }
    }

    /// Collect the indices in the cell containing `position` and its 26
    /// adjacent cells into `out`. `out` is cleared first.
    pub fn gather(&self, position: Vec3, out: &mut Vec<usize>) {
        out.clear();
        let center = self.cell_of(position);
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let cell = center + IVec3::new(dx, dy, dz);
                    if cell.cmpge(IVec3::ZERO).all() && cell.cmplt(self.dims).all() {
                        out.extend_from_slice(&self.cells[self.cell_index(cell)]);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle_at(x: f32, y: f32, z: f32) -> Particle {
        Particle::new(Vec3::new(x, y, z), Vec3::ZERO)
    }

    #[test]
    fn cell_mapping_and_clamping() {
        let grid = SpatialGrid::new(Vec3::ZERO, Vec3::splat(1.0), 0.25);
        assert_eq!(grid.cell_of(Vec3::new(0.1, 0.1, 0.1)), IVec3::ZERO);
        assert_eq!(grid.cell_of(Vec3::new(0.3, 0.6, 0.9)), IVec3::new(1, 2, 3));
        // Escaped positions clamp to the boundary cells
        assert_eq!(grid.cell_of(Vec3::splat(-5.0)), IVec3::ZERO);
        assert_eq!(grid.cell_of(Vec3::splat(5.0)), IVec3::new(3, 3, 3));
    }

    #[test]
    fn gather_covers_adjacent_cells() {
        let mut grid = SpatialGrid::new(Vec3::ZERO, Vec3::splat(1.0), 0.25);
        let particles = vec![
            particle_at(0.1, 0.1, 0.1),
            particle_at(0.3, 0.1, 0.1), // adjacent cell
            particle_at(0.9, 0.9, 0.9), // far corner
        ];
        grid.rebuild(&particles);

        let mut out = Vec::new();
        grid.gather(Vec3::new(0.1, 0.1, 0.1), &mut out);
        assert!(out.contains(&0));
        assert!(out.contains(&1));
        assert!(!out.contains(&2));
    }
}
