use std::f64::consts::PI;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Atom {
    pub x: f64,
    pub y: f64,
}

impl Atom {
    pub fn new(x: f64, y: f64) -> Atom {
        Atom { x, y }
    }
}

pub const DEMO_N_ATOMS: usize = 10;
pub const DEMO_UC_SIZE: usize = 100;
pub const DEMO_N_TILES: usize = 20;
pub const DEMO_RADIUS: f64 = 20.0;
pub const DEMO_CENTRE: (f64, f64) = (50.0, 50.0);

/// Tile a unit cell of isotropic Gaussian atoms `n_tiles` x `n_tiles` times.
///
/// Each atom contributes a normalised 2D Gaussian density with variance
/// `uc_size / 10`; element (i, j) of the cell is evaluated at x = i, y = j.
/// Atoms are not wrapped at the cell boundary, so density near an edge is
/// not continued into the neighbouring tile.
pub fn gaussian_lattice(n_atoms: usize, uc_size: usize, n_tiles: usize, means: &[Atom]) -> Result<Array2<f64>> {
    if uc_size == 0 || n_tiles == 0 {
        return Err(Error::ConfigurationError(format!(
            "unit cell size and tile count must be non-zero, got {uc_size} and {n_tiles}"
        )));
    }
    if means.len() != n_atoms {
        return Err(Error::AtomCountMismatch { expected: n_atoms, found: means.len() });
    }
    let extent = uc_size as f64;
    for (atom, mean) in means.iter().enumerate() {
        let inside = |v: f64| v.is_finite() && v >= 0.0 && v < extent;
        if !inside(mean.x) || !inside(mean.y) {
            return Err(Error::InvalidMean { atom, x: mean.x, y: mean.y, uc_size });
        }
    }

    let unit_cell = unit_cell(uc_size, means);
    debug!(n_atoms, uc_size, n_tiles, "tiling gaussian lattice");

    let size = uc_size * n_tiles;
    Ok(Array2::from_shape_fn((size, size), |(i, j)| unit_cell[[i % uc_size, j % uc_size]]))
}

fn unit_cell(uc_size: usize, means: &[Atom]) -> Array2<f64> {
    let variance = uc_size as f64 / 10.0;
    let norm = 1.0 / (2.0 * PI * variance);

    let mut cell = Array2::<f64>::zeros((uc_size, uc_size));
    for mean in means {
        for ((i, j), density) in cell.indexed_iter_mut() {
            let dx = i as f64 - mean.x;
            let dy = j as f64 - mean.y;
            let exponent = -(dx * dx + dy * dy) / (2.0 * variance);
            *density += norm * exponent.exp();
        }
    }
    cell
}

/// `n_atoms` positions evenly spaced around a circle, the first at angle zero.
pub fn circle_lattice_means(n_atoms: usize, radius: f64, centre: (f64, f64)) -> Vec<Atom> {
    (0..n_atoms)
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / n_atoms as f64;
            Atom::new(centre.0 + radius * angle.cos(), centre.1 + radius * angle.sin())
        })
        .collect()
}

/// Ten atoms on a ring of radius 20 in a 100x100 cell, tiled 20x20 (a 2000x2000 map).
pub fn demo_lattice() -> Result<Array2<f64>> {
    let means = circle_lattice_means(DEMO_N_ATOMS, DEMO_RADIUS, DEMO_CENTRE);
    gaussian_lattice(DEMO_N_ATOMS, DEMO_UC_SIZE, DEMO_N_TILES, &means)
}
