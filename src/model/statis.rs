//! Time-series (STATIS) model and column labelling.
//!
//! A STATIS matrix has three leading columns (iteration, time and the count of
//! entries that follow) before the per-quantity columns. Quantity labels carry
//! the `row-column` position they occupy in the five-wide block layout of the
//! file, e.g. `6-2 Pressure`.
//!
//! YAML STATIS documents carry their own labels and only two leading
//! columns (step and time); [`StatisLayout`] records which form was read.

use super::config::Config;
use super::control::Control;

pub const LEADING_LABELS: [&str; 3] = ["iteration", "time", "entries"];

/// Quantities always present, in file order.
pub const CATALOGUE: [&str; 37] = [
    "Total Extended System Energy",
    "System Temperature",
    "Configurational Energy",
    "Short Range Potential Energy",
    "Electrostatic Energy",
    "Chemical Bond Energy",
    "Valence Angle And 3-Body Potential Energy",
    "Dihedral, Inversion, And 4-Body Potential Energy",
    "Tethering Energy",
    "Enthalpy (Total Energy + Pv)",
    "Rotational Temperature",
    "Total Virial",
    "Short-Range Virial",
    "Electrostatic Virial",
    "Bond Virial",
    "Valence Angle And 3-Body Virial",
    "Constraint Bond Virial",
    "Tethering Virial",
    "Volume",
    "Core-Shell Temperature",
    "Core-Shell Potential Energy",
    "Core-Shell Virial",
    "Md Cell Angle Alpha",
    "Md Cell Angle Beta",
    "Md Cell Angle Gamma",
    "Pmf Constraint Virial",
    "Pressure",
    "External Degree Of Freedom",
    "stress xx",
    "stress xy",
    "stress xz",
    "stress yx",
    "stress yy",
    "stress yz",
    "stress zx",
    "stress zy",
    "stress zz",
];

struct Labeller(Vec<String>);

impl Labeller {
    fn push(&mut self, name: &str) {
        let n = self.0.len();
        self.0.push(format!("{}-{} {}", n / 5 + 1, n % 5 + 1, name));
    }
}

/// Quantity labels (without the leading columns) for a file with `quantities`
/// quantity columns.
///
/// Context-dependent extensions are appended after the catalogue: per-atom
/// MSD pairs when the run tracks them, cell dimensions and PV for
/// volume-fluctuating ensembles, and surface terms for anisotropic coupling.
/// The result is padded with `col_N` labels or truncated to `quantities`.
pub fn quantity_labels(
    quantities: usize,
    control: Option<&Control>,
    config: Option<&Config>,
) -> Vec<String> {
    let mut labels = Labeller(Vec::with_capacity(quantities.max(CATALOGUE.len())));
    for name in CATALOGUE {
        labels.push(name);
    }

    if let Some(control) = control {
        if let Some(config) = config.filter(|_| control.msd_enabled()) {
            for _ in 0..config.natoms() {
                labels.push("Mean Squared Displacement");
                labels.push("Velocity . Velocity");
            }
        }
        let ensemble = &control.ensemble;
        if ensemble.ensemble().is_volume_fluctuating() {
            for _ in 0..9 {
                labels.push("Cell Dimensions");
            }
            labels.push("Instantaneous PV");
            if ensemble.anisotropic() {
                labels.push("H_Z");
                labels.push("vol/h_z");
                if ensemble.surface_tension() {
                    labels.push("gamma_x");
                    labels.push("gamma_y");
                }
            }
        }
    }

    while labels.0.len() < quantities {
        let n = labels.0.len() + 1;
        labels.push(&format!("col_{}", n));
    }
    labels.0.truncate(quantities);
    labels.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatisLayout {
    /// `step time n` followed by `n` quantities per record.
    #[default]
    Plain,
    /// YAML document with a label row; records start with `step time`.
    Yaml,
}

impl StatisLayout {
    pub fn leading_columns(self) -> usize {
        match self {
            StatisLayout::Plain => LEADING_LABELS.len(),
            StatisLayout::Yaml => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statis {
    pub rows: usize,
    /// Total columns, including the leading ones.
    pub columns: usize,
    /// Row-major `rows × columns` values.
    pub data: Vec<f64>,
    pub labels: Vec<String>,
    pub layout: StatisLayout,
}

impl Statis {
    /// Number of per-quantity columns.
    #[inline]
    pub fn quantities(&self) -> usize {
        self.columns.saturating_sub(self.layout.leading_columns())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        (row < self.rows && column < self.columns)
            .then(|| self.data[row * self.columns + column])
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.columns..(row + 1) * self.columns])
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        let step = self.columns.max(1);
        self.data
            .iter()
            .skip(column)
            .step_by(step)
            .copied()
            .take(if column < self.columns { self.rows } else { 0 })
    }

    /// Column index of the first label whose name (ignoring its position
    /// prefix) equals `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|label| {
            label == name || label.split_once(' ').is_some_and(|(_, rest)| rest == name)
        })
    }

    pub fn label_columns(&mut self, control: Option<&Control>, config: Option<&Config>) {
        self.labels = LEADING_LABELS.iter().map(|s| s.to_string()).collect();
        self.labels
            .extend(quantity_labels(self.quantities(), control, config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::Atom;
    use crate::model::ensemble::{ArityCheck, EnsembleParam};

    fn control_with(tokens: &[&str]) -> Control {
        let mut control = Control::default();
        control.ensemble = EnsembleParam::parse(ArityCheck::Eager, tokens).unwrap();
        control
    }

    fn config_with(n: usize) -> Config {
        let mut config = Config::new("atoms");
        for i in 0..n {
            config.atoms.push(Atom::new("Ar", i + 1, [0.0; 3]));
        }
        config
    }

    #[test]
    fn catalogue_labels_carry_block_positions() {
        let labels = quantity_labels(37, None, None);
        assert_eq!(labels[0], "1-1 Total Extended System Energy");
        assert_eq!(labels[26], "6-2 Pressure");
        assert_eq!(labels[36], "8-2 stress zz");
    }

    #[test]
    fn nst_adds_cell_and_pv_then_pads() {
        let control = control_with(&["nst", "hoover", "0.5", "1.5"]);
        let config = config_with(10);
        let labels = quantity_labels(50, Some(&control), Some(&config));
        assert_eq!(labels.len(), 50);
        assert_eq!(labels[37], "8-3 Cell Dimensions");
        assert_eq!(labels[46], "10-2 Instantaneous PV");
        assert_eq!(labels[47], "10-3 col_48");
        assert_eq!(labels[49], "10-5 col_50");
    }

    #[test]
    fn msd_pairs_need_the_flag() {
        let mut control = control_with(&["nve"]);
        let config = config_with(2);
        let without = quantity_labels(41, Some(&control), Some(&config));
        assert!(without[37].ends_with("col_38"));

        control.params.set("l_msd", true).unwrap();
        let with = quantity_labels(41, Some(&control), Some(&config));
        assert!(with[37].ends_with("Mean Squared Displacement"));
        assert!(with[40].ends_with("Velocity . Velocity"));
    }

    #[test]
    fn surface_tension_coupling_adds_gamma_terms() {
        let control = control_with(&["nst", "berendsen", "0.5", "1.5", "tens", "2.0"]);
        let labels = quantity_labels(53, Some(&control), None);
        assert!(labels[47].ends_with("H_Z"));
        assert!(labels[48].ends_with("vol/h_z"));
        assert!(labels[49].ends_with("gamma_x"));
        assert!(labels[50].ends_with("gamma_y"));
    }

    #[test]
    fn accessors_index_row_major_data() {
        let mut s = Statis {
            rows: 2,
            columns: 4,
            data: vec![1.0, 0.1, 1.0, 7.0, 2.0, 0.2, 1.0, 8.0],
            labels: Vec::new(),
            layout: StatisLayout::Plain,
        };
        s.label_columns(None, None);
        assert_eq!(s.labels.len(), 4);
        assert_eq!(s.get(1, 3), Some(8.0));
        assert_eq!(s.get(2, 0), None);
        assert_eq!(s.row(0), Some(&[1.0, 0.1, 1.0, 7.0][..]));
        assert_eq!(s.column(1).collect::<Vec<_>>(), vec![0.1, 0.2]);
        assert_eq!(s.find("Total Extended System Energy"), Some(3));
        assert_eq!(s.find("time"), Some(1));
    }
}
