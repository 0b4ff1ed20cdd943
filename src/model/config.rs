//! Coordinate (CONFIG) model.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigKeyError {
    #[error("invalid print level {0} (expected 0, 1 or 2)")]
    Level(i64),
    #[error("invalid periodic boundary key {0} (expected 0 to 3)")]
    Pbc(i64),
}

/// How much per-atom data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    #[default]
    Positions,
    Velocities,
    Forces,
}

impl Level {
    #[inline]
    pub fn key(self) -> i64 {
        self as i64
    }

    /// Coordinate lines per atom record.
    #[inline]
    pub fn vector_lines(self) -> usize {
        self as usize + 1
    }
}

impl TryFrom<i64> for Level {
    type Error = ConfigKeyError;

    fn try_from(key: i64) -> Result<Self, Self::Error> {
        match key {
            0 => Ok(Level::Positions),
            1 => Ok(Level::Velocities),
            2 => Ok(Level::Forces),
            _ => Err(ConfigKeyError::Level(key)),
        }
    }
}

/// Periodic boundary key; anything but `None` carries a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pbc {
    #[default]
    None,
    Cubic,
    Orthorhombic,
    Parallelepiped,
}

impl Pbc {
    #[inline]
    pub fn key(self) -> i64 {
        self as i64
    }

    #[inline]
    pub fn has_cell(self) -> bool {
        self != Pbc::None
    }
}

impl TryFrom<i64> for Pbc {
    type Error = ConfigKeyError;

    fn try_from(key: i64) -> Result<Self, Self::Error> {
        match key {
            0 => Ok(Pbc::None),
            1 => Ok(Pbc::Cubic),
            2 => Ok(Pbc::Orthorhombic),
            3 => Ok(Pbc::Parallelepiped),
            _ => Err(ConfigKeyError::Pbc(key)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atom {
    pub element: String,
    pub index: usize,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub forces: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, index: usize, position: [f64; 3]) -> Self {
        Self {
            element: element.into(),
            index,
            position,
            ..Self::default()
        }
    }
}

/// Geometric operation applied to a fragment before it is merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Translate([f64; 3]),
    /// Row-major 3×3 matrix applied to each position (rotation, stretch, ...).
    Transform([[f64; 3]; 3]),
}

impl Placement {
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        match self {
            Placement::Translate(t) => [p[0] + t[0], p[1] + t[1], p[2] + t[2]],
            Placement::Transform(m) => {
                let row = |r: &[f64; 3]| r[0] * p[0] + r[1] * p[1] + r[2] * p[2];
                [row(&m[0]), row(&m[1]), row(&m[2])]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub title: String,
    pub level: Level,
    pub pbc: Pbc,
    /// Cell vectors as rows; only meaningful when `pbc` has a cell.
    pub cell: [[f64; 3]; 3],
    pub atoms: Vec<Atom>,
}

impl Config {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    /// Appends copies of `atoms`, shifting their indices by the current atom
    /// count so the new atoms continue the sequence.
    pub fn add_atoms<'a>(&mut self, atoms: impl IntoIterator<Item = &'a Atom>) {
        self.add_atoms_placed(atoms, &[]);
    }

    /// Like [`add_atoms`](Self::add_atoms), applying each placement in order to
    /// the copied positions first.
    pub fn add_atoms_placed<'a>(
        &mut self,
        atoms: impl IntoIterator<Item = &'a Atom>,
        placements: &[Placement],
    ) {
        let offset = self.natoms();
        self.atoms.extend(atoms.into_iter().map(|atom| {
            let mut copy = atom.clone();
            copy.index += offset;
            copy.position = placements
                .iter()
                .fold(copy.position, |p, placement| placement.apply(p));
            copy
        }));
    }

    pub fn merge(&mut self, other: &Config) {
        self.add_atoms(&other.atoms);
    }

    /// Shifts positions so the bounding box is centred on the origin.
    pub fn centre(&mut self) {
        if self.atoms.is_empty() {
            return;
        }
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for atom in &self.atoms {
            for k in 0..3 {
                lo[k] = lo[k].min(atom.position[k]);
                hi[k] = hi[k].max(atom.position[k]);
            }
        }
        let shift: [f64; 3] = std::array::from_fn(|k| (lo[k] + hi[k]) / 2.0);
        for atom in &mut self.atoms {
            for k in 0..3 {
                atom.position[k] -= shift[k];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    fn fragment() -> Config {
        let mut c = Config::new("fragment");
        c.atoms.push(Atom::new("O", 1, [0.0, 0.0, 0.0]));
        c.atoms.push(Atom::new("H", 2, [1.0, 0.0, 0.0]));
        c
    }

    #[test]
    fn keys_convert_both_ways() {
        assert_eq!(Level::try_from(2).unwrap(), Level::Forces);
        assert_eq!(Level::Forces.vector_lines(), 3);
        assert!(Level::try_from(3).is_err());
        assert_eq!(Pbc::try_from(3).unwrap().key(), 3);
        assert!(!Pbc::None.has_cell());
        assert!(Pbc::try_from(4).is_err());
    }

    #[test]
    fn add_atoms_continues_index_sequence() {
        let mut c = fragment();
        let other = fragment();
        c.merge(&other);
        let indices: Vec<_> = c.atoms.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(c.natoms(), 4);
        assert_eq!(other.atoms[0].index, 1);
    }

    #[test]
    fn placements_apply_in_order() {
        let mut c = Config::new("box");
        let rotate_z = Placement::Transform([[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        c.add_atoms_placed(
            &fragment().atoms,
            &[rotate_z, Placement::Translate([0.0, 0.0, 5.0])],
        );
        assert!(approx_eq(c.atoms[1].position, [0.0, 1.0, 5.0]));
        assert!(approx_eq(c.atoms[0].position, [0.0, 0.0, 5.0]));
    }

    #[test]
    fn centre_moves_bounding_box_to_origin() {
        let mut c = fragment();
        c.atoms.push(Atom::new("H", 3, [0.0, 2.0, -4.0]));
        c.centre();
        assert!(approx_eq(c.atoms[0].position, [-0.5, -1.0, 2.0]));
        assert!(approx_eq(c.atoms[2].position, [-0.5, 1.0, -2.0]));
    }
}
