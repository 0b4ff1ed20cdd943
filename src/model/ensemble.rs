//! Statistical-ensemble specifier and its validation tables.
//!
//! An [`EnsembleParam`] moves through `(ensemble, means)` states. Changing the
//! ensemble clears the means and arguments; changing the means clears the
//! arguments. The number of trailing arguments is checked against a fixed
//! arity table keyed by `(ensemble, means)`.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnsembleError {
    #[error("unknown ensemble '{0}' (expected one of nve, nvt, npt, nst)")]
    UnknownEnsemble(String),

    #[error("unknown integration means '{0}'")]
    UnknownMeans(String),

    #[error("means '{means}' is not valid for ensemble {ensemble} (valid: {allowed})")]
    InvalidMeans {
        ensemble: Ensemble,
        means: String,
        allowed: String,
    },

    #[error("ensemble {0} requires an integration means")]
    MeansRequired(Ensemble),

    #[error(
        "wrong number of arguments for ensemble {ensemble}{}: expected {expected}, received {received}",
        .means.map(|m| format!(" {}", m)).unwrap_or_default()
    )]
    ArityMismatch {
        ensemble: Ensemble,
        means: Option<Means>,
        expected: Arity,
        received: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ensemble {
    #[default]
    Nve,
    Nvt,
    Npt,
    Nst,
}

impl Ensemble {
    pub const ALL: [Ensemble; 4] = [Ensemble::Nve, Ensemble::Nvt, Ensemble::Npt, Ensemble::Nst];

    pub fn keyword(self) -> &'static str {
        match self {
            Ensemble::Nve => "nve",
            Ensemble::Nvt => "nvt",
            Ensemble::Npt => "npt",
            Ensemble::Nst => "nst",
        }
    }

    pub fn allowed_means(self) -> &'static [Means] {
        use Means::*;
        match self {
            Ensemble::Nve => &[],
            Ensemble::Nvt => &[Evans, Langevin, Andersen, Berendsen, Hoover, Gst],
            Ensemble::Npt | Ensemble::Nst => &[Langevin, Berendsen, Hoover, Mtk],
        }
    }

    /// Whether the cell volume changes during the run.
    #[inline]
    pub fn is_volume_fluctuating(self) -> bool {
        matches!(self, Ensemble::Npt | Ensemble::Nst)
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Ensemble {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Ensemble::ALL
            .into_iter()
            .find(|e| e.keyword() == lower)
            .ok_or_else(|| EnsembleError::UnknownEnsemble(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Means {
    Evans,
    Langevin,
    Andersen,
    Berendsen,
    Hoover,
    Gst,
    Mtk,
}

impl Means {
    pub fn keyword(self) -> &'static str {
        match self {
            Means::Evans => "evans",
            Means::Langevin => "langevin",
            Means::Andersen => "andersen",
            Means::Berendsen => "berendsen",
            Means::Hoover => "hoover",
            Means::Gst => "gst",
            Means::Mtk => "mtk",
        }
    }
}

impl fmt::Display for Means {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Means {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "evans" => Ok(Means::Evans),
            "langevin" => Ok(Means::Langevin),
            "andersen" => Ok(Means::Andersen),
            "berendsen" | "ber" => Ok(Means::Berendsen),
            "hoover" => Ok(Means::Hoover),
            "gst" => Ok(Means::Gst),
            "mtk" => Ok(Means::Mtk),
            _ => Err(EnsembleError::UnknownMeans(s.to_string())),
        }
    }
}

/// Required argument count: exact, or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
}

impl Arity {
    #[inline]
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{}", k),
            Arity::Between(lo, hi) => write!(f, "{} to {}", lo, hi),
        }
    }
}

/// Looks up the arity table. `None` means the pair has no entry.
pub fn arity(ensemble: Ensemble, means: Option<Means>) -> Option<Arity> {
    use Arity::*;
    use Means::*;
    match (ensemble, means) {
        (Ensemble::Nve, None) => Some(Exact(0)),
        (Ensemble::Nvt, Some(Evans)) => Some(Exact(0)),
        (Ensemble::Nvt, Some(Langevin | Berendsen)) => Some(Exact(1)),
        (Ensemble::Nvt, Some(Andersen | Gst)) => Some(Exact(2)),
        (Ensemble::Nvt, Some(Hoover)) => Some(Between(1, 2)),
        (Ensemble::Npt, Some(Langevin | Berendsen | Hoover | Mtk)) => Some(Exact(2)),
        (Ensemble::Nst, Some(Langevin | Berendsen | Hoover | Mtk)) => Some(Between(2, 5)),
        _ => None,
    }
}

/// When argument counts are checked.
///
/// `Eager` checks on every argument assignment and again on render.
/// `Deferred` only checks on render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArityCheck {
    #[default]
    Eager,
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnsembleParam {
    ensemble: Ensemble,
    means: Option<Means>,
    args: Vec<String>,
    check: ArityCheck,
}

impl EnsembleParam {
    pub fn new(check: ArityCheck) -> Self {
        Self {
            check,
            ..Self::default()
        }
    }

    /// Parses `ensemble [means] [args...]` tokens.
    pub fn parse(check: ArityCheck, tokens: &[&str]) -> Result<Self, EnsembleError> {
        let mut param = Self::new(check);
        let Some((first, rest)) = tokens.split_first() else {
            return Ok(param);
        };
        let ensemble: Ensemble = first.parse()?;
        let (means, args) = match (ensemble, rest.split_first()) {
            (Ensemble::Nve, _) | (_, None) => (None, rest),
            (_, Some((m, args))) => (Some(m.parse::<Means>()?), args),
        };
        param.configure(ensemble, means, args.iter().map(|s| s.to_string()).collect())?;
        Ok(param)
    }

    #[inline]
    pub fn ensemble(&self) -> Ensemble {
        self.ensemble
    }

    #[inline]
    pub fn means(&self) -> Option<Means> {
        self.means
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[inline]
    pub fn check(&self) -> ArityCheck {
        self.check
    }

    pub fn set_check(&mut self, check: ArityCheck) {
        self.check = check;
    }

    pub fn set_ensemble(&mut self, ensemble: Ensemble) {
        self.ensemble = ensemble;
        self.means = None;
        self.args.clear();
    }

    pub fn set_means(&mut self, means: Means) -> Result<(), EnsembleError> {
        ensure_allowed(self.ensemble, means)?;
        self.means = Some(means);
        self.args.clear();
        Ok(())
    }

    pub fn set_args<S: Into<String>>(
        &mut self,
        args: impl IntoIterator<Item = S>,
    ) -> Result<(), EnsembleError> {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if self.check == ArityCheck::Eager {
            validate(self.ensemble, self.means, args.len())?;
        }
        self.args = args;
        Ok(())
    }

    /// Replaces the whole state at once; the previous state is kept on error.
    pub fn configure(
        &mut self,
        ensemble: Ensemble,
        means: Option<Means>,
        args: Vec<String>,
    ) -> Result<(), EnsembleError> {
        if let Some(m) = means {
            ensure_allowed(ensemble, m)?;
        }
        if self.check == ArityCheck::Eager {
            validate(ensemble, means, args.len())?;
        }
        self.ensemble = ensemble;
        self.means = means;
        self.args = args;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EnsembleError> {
        validate(self.ensemble, self.means, self.args.len())
    }

    /// Renders `ensemble [means] [args...]`, checking the arity table regardless
    /// of the check policy.
    pub fn render(&self) -> Result<String, EnsembleError> {
        self.validate()?;
        let mut parts = vec![self.ensemble.keyword().to_string()];
        parts.extend(self.means.map(|m| m.keyword().to_string()));
        parts.extend(self.args.iter().cloned());
        Ok(parts.join(" "))
    }

    /// Whether the arguments request anisotropic cell coupling.
    pub fn anisotropic(&self) -> bool {
        self.has_arg(&["area", "tens", "semi", "orth"])
    }

    /// Whether the arguments request a surface-tension coupling.
    pub fn surface_tension(&self) -> bool {
        self.has_arg(&["tens", "semi"])
    }

    fn has_arg(&self, keys: &[&str]) -> bool {
        self.args.iter().any(|a| {
            let a = a.to_ascii_lowercase();
            keys.iter().any(|k| a.starts_with(k))
        })
    }
}

fn ensure_allowed(ensemble: Ensemble, means: Means) -> Result<(), EnsembleError> {
    let allowed = ensemble.allowed_means();
    if allowed.contains(&means) {
        return Ok(());
    }
    let names: Vec<_> = allowed.iter().map(|m| m.keyword()).collect();
    Err(EnsembleError::InvalidMeans {
        ensemble,
        means: means.keyword().to_string(),
        allowed: if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        },
    })
}

fn validate(ensemble: Ensemble, means: Option<Means>, received: usize) -> Result<(), EnsembleError> {
    let expected = match arity(ensemble, means) {
        Some(a) => a,
        None if means.is_none() => return Err(EnsembleError::MeansRequired(ensemble)),
        None => {
            return Err(EnsembleError::InvalidMeans {
                ensemble,
                means: means.map(|m| m.to_string()).unwrap_or_default(),
                allowed: String::new(),
            });
        }
    };
    if expected.accepts(received) {
        Ok(())
    } else {
        Err(EnsembleError::ArityMismatch {
            ensemble,
            means,
            expected,
            received,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_nve_without_means() {
        let p = EnsembleParam::default();
        assert_eq!(p.ensemble(), Ensemble::Nve);
        assert_eq!(p.means(), None);
        assert!(p.args().is_empty());
        assert_eq!(p.render().unwrap(), "nve");
    }

    #[test]
    fn arity_table_entries() {
        assert_eq!(arity(Ensemble::Nve, None), Some(Arity::Exact(0)));
        assert_eq!(
            arity(Ensemble::Nvt, Some(Means::Langevin)),
            Some(Arity::Exact(1))
        );
        let nst = arity(Ensemble::Nst, Some(Means::Hoover)).unwrap();
        assert!(!nst.accepts(1));
        assert!((2..=5).all(|n| nst.accepts(n)));
        assert!(!nst.accepts(6));
        assert_eq!(arity(Ensemble::Nvt, None), None);
    }

    #[test]
    fn set_ensemble_resets_means_and_args() {
        let mut p = EnsembleParam::parse(ArityCheck::Eager, &["nvt", "hoover", "0.5"]).unwrap();
        p.set_ensemble(Ensemble::Npt);
        assert_eq!(p.means(), None);
        assert!(p.args().is_empty());
    }

    #[test]
    fn set_means_checks_allowed_set_and_resets_args() {
        let mut p = EnsembleParam::parse(ArityCheck::Eager, &["npt", "hoover", "1.0", "2.0"]).unwrap();
        let err = p.set_means(Means::Evans).unwrap_err();
        assert!(matches!(err, EnsembleError::InvalidMeans { .. }));
        assert_eq!(p.means(), Some(Means::Hoover));
        assert_eq!(p.args().len(), 2);

        p.set_means(Means::Mtk).unwrap();
        assert!(p.args().is_empty());
    }

    #[test]
    fn eager_check_rejects_bad_args_immediately() {
        let mut p = EnsembleParam::new(ArityCheck::Eager);
        p.set_ensemble(Ensemble::Nvt);
        p.set_means(Means::Langevin).unwrap();
        let err = p.set_args(["1.0", "2.0"]).unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::ArityMismatch {
                received: 2,
                expected: Arity::Exact(1),
                ..
            }
        ));
        assert!(p.args().is_empty());
        p.set_args(["1.0"]).unwrap();
        assert_eq!(p.render().unwrap(), "nvt langevin 1.0");
    }

    #[test]
    fn deferred_check_only_fails_on_render() {
        let mut p = EnsembleParam::new(ArityCheck::Deferred);
        p.set_ensemble(Ensemble::Nvt);
        p.set_means(Means::Langevin).unwrap();
        p.set_args(["1.0", "2.0"]).unwrap();
        assert!(matches!(
            p.render(),
            Err(EnsembleError::ArityMismatch { received: 2, .. })
        ));
    }

    #[test]
    fn parse_accepts_ber_alias_and_rejects_unknowns() {
        let p = EnsembleParam::parse(ArityCheck::Eager, &["nvt", "ber", "0.1"]).unwrap();
        assert_eq!(p.means(), Some(Means::Berendsen));
        assert_eq!(p.render().unwrap(), "nvt berendsen 0.1");

        assert!(matches!(
            EnsembleParam::parse(ArityCheck::Eager, &["nxt"]),
            Err(EnsembleError::UnknownEnsemble(_))
        ));
        assert!(matches!(
            EnsembleParam::parse(ArityCheck::Eager, &["nvt", "mtk", "1"]),
            Err(EnsembleError::InvalidMeans { .. })
        ));
    }

    #[test]
    fn missing_means_fails_validation() {
        let mut p = EnsembleParam::default();
        p.set_ensemble(Ensemble::Nvt);
        assert_eq!(
            p.render().unwrap_err(),
            EnsembleError::MeansRequired(Ensemble::Nvt)
        );
    }

    #[test]
    fn coupling_detection_reads_args() {
        let p = EnsembleParam::parse(
            ArityCheck::Eager,
            &["nst", "hoover", "0.5", "1.5", "tension", "10.0"],
        )
        .unwrap();
        assert!(p.anisotropic());
        assert!(p.surface_tension());

        let iso = EnsembleParam::parse(ArityCheck::Eager, &["nst", "mtk", "0.5", "1.5"]).unwrap();
        assert!(!iso.anisotropic());
    }

    #[test]
    fn npt_hoover_renders_verbatim_args() {
        let p = EnsembleParam::parse(ArityCheck::Eager, &["npt", "hoover", "1.0", "2.0"]).unwrap();
        assert_eq!(p.render().unwrap(), "npt hoover 1.0 2.0");
    }
}
