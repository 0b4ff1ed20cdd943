//! Topology (FIELD) model: molecules, species and interaction tables.
//!
//! Interactions are stored in maps keyed by their atom tuple. The tuple is
//! always kept in canonical (sorted) order, so two interactions over the same
//! atoms land under the same key regardless of how they were written.

use super::value::{format_real, parse_real};
use log::warn;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown potential class: '{0}'")]
pub struct ParsePotentialClassError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("{class} line needs at least {expected} token(s), found {found}")]
    TooFewTokens {
        class: PotentialClass,
        expected: usize,
        found: usize,
    },

    #[error("invalid {class} parameter '{token}'")]
    InvalidParameter {
        class: PotentialClass,
        token: String,
    },

    #[error("invalid rigid unit size '{0}'")]
    InvalidUnitSize(String),
}

/// Whether the potential type label precedes or follows the atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// `type atoms... params...`, intramolecular.
    BondLike,
    /// `atoms... type params...`, file-level.
    PotentialLike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PotentialClass {
    Bonds,
    Constraints,
    Angles,
    Dihedrals,
    Inversions,
    Shell,
    Teth,
    Rigid,
    Extern,
    Vdw,
    Metal,
    Rdf,
    Tbp,
    Fbp,
}

impl PotentialClass {
    pub const ALL: [PotentialClass; 14] = [
        PotentialClass::Bonds,
        PotentialClass::Constraints,
        PotentialClass::Angles,
        PotentialClass::Dihedrals,
        PotentialClass::Inversions,
        PotentialClass::Shell,
        PotentialClass::Teth,
        PotentialClass::Rigid,
        PotentialClass::Extern,
        PotentialClass::Vdw,
        PotentialClass::Metal,
        PotentialClass::Rdf,
        PotentialClass::Tbp,
        PotentialClass::Fbp,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            PotentialClass::Bonds => "bonds",
            PotentialClass::Constraints => "constraints",
            PotentialClass::Angles => "angles",
            PotentialClass::Dihedrals => "dihedrals",
            PotentialClass::Inversions => "inversions",
            PotentialClass::Shell => "shell",
            PotentialClass::Teth => "teth",
            PotentialClass::Rigid => "rigid",
            PotentialClass::Extern => "extern",
            PotentialClass::Vdw => "vdw",
            PotentialClass::Metal => "metal",
            PotentialClass::Rdf => "rdf",
            PotentialClass::Tbp => "tbp",
            PotentialClass::Fbp => "fbp",
        }
    }

    /// Number of atoms per line; `None` for variable-size classes.
    pub fn arity(self) -> Option<usize> {
        match self {
            PotentialClass::Extern => Some(0),
            PotentialClass::Teth => Some(1),
            PotentialClass::Bonds
            | PotentialClass::Constraints
            | PotentialClass::Shell
            | PotentialClass::Vdw
            | PotentialClass::Metal
            | PotentialClass::Rdf => Some(2),
            PotentialClass::Angles | PotentialClass::Tbp => Some(3),
            PotentialClass::Dihedrals | PotentialClass::Inversions | PotentialClass::Fbp => Some(4),
            PotentialClass::Rigid => None,
        }
    }

    pub fn family(self) -> Family {
        match self {
            PotentialClass::Extern
            | PotentialClass::Vdw
            | PotentialClass::Metal
            | PotentialClass::Rdf
            | PotentialClass::Tbp
            | PotentialClass::Fbp => Family::PotentialLike,
            _ => Family::BondLike,
        }
    }

    pub fn has_type_label(self) -> bool {
        !matches!(
            self,
            PotentialClass::Constraints | PotentialClass::Shell | PotentialClass::Rigid
        )
    }

    /// Classes whose lines may stop after the atom labels.
    pub fn type_label_optional(self) -> bool {
        self == PotentialClass::Rdf
    }

    /// Matches a block keyword on its first four letters, ignoring case.
    pub fn from_keyword(key: &str) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|class| {
            let kw = class.keyword();
            key.starts_with(&kw[..kw.len().min(4)])
        })
    }
}

impl fmt::Display for PotentialClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for PotentialClass {
    type Err = ParsePotentialClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_keyword(s).ok_or_else(|| ParsePotentialClassError(s.to_string()))
    }
}

/// Sorts atom labels numerically when every label is an integer index,
/// lexically otherwise.
pub fn canonical_atoms<S: AsRef<str>>(atoms: &[S]) -> Vec<String> {
    let mut out: Vec<String> = atoms.iter().map(|a| a.as_ref().to_string()).collect();
    let numeric: Option<Vec<i64>> = out.iter().map(|a| a.parse::<i64>().ok()).collect();
    match numeric {
        Some(mut indices) => {
            indices.sort_unstable();
            out = indices.into_iter().map(|i| i.to_string()).collect();
        }
        None => out.sort(),
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub class: PotentialClass,
    pub potential_type: String,
    atoms: Vec<String>,
    pub params: Vec<f64>,
}

impl Interaction {
    pub fn new<S: AsRef<str>>(
        class: PotentialClass,
        potential_type: impl Into<String>,
        atoms: &[S],
        params: Vec<f64>,
    ) -> Self {
        Self {
            class,
            potential_type: potential_type.into(),
            atoms: canonical_atoms(atoms),
            params,
        }
    }

    /// Parses one interaction line of the given class.
    pub fn parse(class: PotentialClass, tokens: &[&str]) -> Result<Self, InteractionError> {
        let too_few = |expected: usize| InteractionError::TooFewTokens {
            class,
            expected,
            found: tokens.len(),
        };

        let (potential_type, atoms, rest): (&str, &[&str], &[&str]) = match class.arity() {
            None => {
                let (count, rest) = tokens.split_first().ok_or_else(|| too_few(1))?;
                let n: usize = count
                    .parse()
                    .map_err(|_| InteractionError::InvalidUnitSize(count.to_string()))?;
                if rest.len() < n {
                    return Err(too_few(n + 1));
                }
                ("", &rest[..n], &rest[n..])
            }
            Some(n) if !class.has_type_label() => {
                if tokens.len() < n {
                    return Err(too_few(n));
                }
                ("", &tokens[..n], &tokens[n..])
            }
            Some(n) if class.type_label_optional() && tokens.len() == n => {
                ("", &tokens[..n], &tokens[n..])
            }
            Some(n) => {
                if tokens.len() < n + 1 {
                    return Err(too_few(n + 1));
                }
                match class.family() {
                    Family::BondLike => (tokens[0], &tokens[1..=n], &tokens[n + 1..]),
                    Family::PotentialLike => (tokens[n], &tokens[..n], &tokens[n + 1..]),
                }
            }
        };

        let params = rest
            .iter()
            .map(|t| {
                parse_real(t).ok_or_else(|| InteractionError::InvalidParameter {
                    class,
                    token: t.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(class, potential_type, atoms, params))
    }

    /// Atom labels in canonical order.
    #[inline]
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn involves(&self, label: &str) -> bool {
        self.atoms.iter().any(|a| a == label)
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<String> = Vec::with_capacity(self.atoms.len() + self.params.len() + 2);
        if self.class == PotentialClass::Rigid {
            tokens.push(self.atoms.len().to_string());
            tokens.extend(self.atoms.iter().cloned());
        } else if !self.class.has_type_label() {
            tokens.extend(self.atoms.iter().cloned());
        } else {
            match self.class.family() {
                Family::BondLike => {
                    tokens.push(self.potential_type.clone());
                    tokens.extend(self.atoms.iter().cloned());
                }
                Family::PotentialLike => {
                    tokens.extend(self.atoms.iter().cloned());
                    if !self.potential_type.is_empty() {
                        tokens.push(self.potential_type.clone());
                    }
                }
            }
        }
        tokens.extend(self.params.iter().map(|p| format_real(*p)));
        f.write_str(&tokens.join(" "))
    }
}

/// Interactions grouped by canonical atom tuple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionSet {
    map: BTreeMap<Vec<String>, Vec<Interaction>>,
}

impl InteractionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, interaction: Interaction) {
        self.map
            .entry(interaction.atoms.clone())
            .or_default()
            .push(interaction);
    }

    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.map.values().flatten()
    }

    /// Interactions over exactly this atom tuple (in any order).
    pub fn get<S: AsRef<str>>(&self, atoms: &[S]) -> &[Interaction] {
        self.map
            .get(&canonical_atoms(atoms))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Interactions whose atom tuple contains `label`.
    pub fn by_species<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Interaction> {
        announce(self.iter().filter(move |i| i.involves(label)), || {
            format!("no interactions involve species '{}'", label)
        })
    }

    pub fn by_class(&self, class: PotentialClass) -> impl Iterator<Item = &Interaction> {
        announce(self.iter().filter(move |i| i.class == class), || {
            format!("no interactions of class '{}'", class)
        })
    }

    pub fn by_type<'a>(&'a self, potential_type: &'a str) -> impl Iterator<Item = &'a Interaction> {
        announce(
            self.iter().filter(move |i| i.potential_type == potential_type),
            || format!("no interactions of type '{}'", potential_type),
        )
    }

    /// Distinct classes present, in class order.
    pub fn classes(&self) -> Vec<PotentialClass> {
        let mut classes: Vec<_> = self.iter().map(|i| i.class).collect();
        classes.sort();
        classes.dedup();
        classes
    }
}

fn announce<'a, I>(found: I, describe: impl FnOnce() -> String) -> Peekable<I>
where
    I: Iterator<Item = &'a Interaction>,
{
    let mut found = found.peekable();
    if found.peek().is_none() {
        warn!("{}", describe());
    }
    found
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub element: String,
    pub index: usize,
    pub charge: f64,
    pub mass: f64,
    pub frozen: bool,
    pub repeats: usize,
}

impl Species {
    pub fn new(element: impl Into<String>, mass: f64, charge: f64) -> Self {
        Self {
            element: element.into(),
            index: 0,
            charge,
            mass,
            frozen: false,
            repeats: 1,
        }
    }

    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Molecule {
    pub name: String,
    /// Number of copies of this molecule in the system (`nummols`).
    pub replicas: usize,
    pub species: BTreeMap<usize, Species>,
    pub interactions: InteractionSet,
}

impl Molecule {
    pub fn new(name: impl Into<String>, replicas: usize) -> Self {
        Self {
            name: name.into(),
            replicas,
            ..Self::default()
        }
    }

    /// Appends a species under the next local index.
    pub fn add_species(&mut self, mut species: Species) {
        let index = self.species.len();
        species.index = index;
        self.species.insert(index, species);
    }

    /// Atoms per molecule, counting repeats.
    pub fn n_atoms(&self) -> usize {
        self.species.values().map(|s| s.repeats).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub header: String,
    pub units: String,
    pub molecules: Vec<Molecule>,
    /// File-level potentials (vdw, metal, tbp, ...).
    pub interactions: InteractionSet,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            header: String::new(),
            units: "internal".to_string(),
            molecules: Vec::new(),
            interactions: InteractionSet::new(),
        }
    }
}

impl Field {
    pub fn new(header: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            units: units.into(),
            ..Self::default()
        }
    }

    /// Species across all molecules, keyed by element label.
    pub fn species(&self) -> BTreeMap<&str, &Species> {
        self.molecules
            .iter()
            .flat_map(|m| m.species.values())
            .map(|s| (s.element.as_str(), s))
            .collect()
    }

    /// Total atoms in the system.
    pub fn n_atoms(&self) -> usize {
        self.molecules.iter().map(|m| m.replicas * m.n_atoms()).sum()
    }
}
