//! Per-atom mean-square displacements (MSDTMP).

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MsdEntry {
    pub species: String,
    pub index: usize,
    /// Root of the mean-square displacement, as stored in the file.
    pub root_msd: f64,
    pub temperature: f64,
}

impl MsdEntry {
    #[inline]
    pub fn msd(&self) -> f64 {
        self.root_msd * self.root_msd
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MsdFrame {
    pub step: u64,
    pub timestep: f64,
    pub time: f64,
    pub entries: Vec<MsdEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Msd {
    pub title: String,
    pub n_atoms: usize,
    pub frames: Vec<MsdFrame>,
}

impl Msd {
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Distinct species labels, sorted.
    pub fn species(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .frames
            .iter()
            .flat_map(|f| f.entries.iter().map(|e| e.species.as_str()))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Per-frame `(msd, temperature)` averages for each species.
    pub fn per_species(&self) -> Vec<BTreeMap<&str, (f64, f64)>> {
        self.frames
            .iter()
            .map(|frame| {
                let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
                for e in &frame.entries {
                    let acc = sums.entry(e.species.as_str()).or_insert((0.0, 0.0, 0));
                    acc.0 += e.msd();
                    acc.1 += e.temperature;
                    acc.2 += 1;
                }
                sums.into_iter()
                    .map(|(k, (m, t, n))| (k, (m / n as f64, t / n as f64)))
                    .collect()
            })
            .collect()
    }
}
