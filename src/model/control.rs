//! Run-control (CONTROL) model.
//!
//! A [`Control`] is a top-level schema record of run parameters plus a closed
//! set of sub-records. Each sub-record claims a fixed set of directive
//! keywords through [`SubRecord::KEYWORDS`]; [`Section::route`] picks the
//! handler for a keyword, and anything unclaimed is cast into the top-level
//! record.

use super::ensemble::{ArityCheck, EnsembleError, EnsembleParam};
use super::schema::ScalarKind::{Bool, Float, Int, Str};
use super::schema::{FieldDescriptor, FieldKind, Preset, Record, Schema, SchemaViolation, Value};
use super::value::is_numeric;
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error(transparent)]
    Ensemble(#[from] EnsembleError),

    #[error("unrecognized directive '{0}'")]
    Unrecognized(String),
}

/// A group of directives parsed and rendered together.
pub trait SubRecord {
    /// Directive keywords this record handles.
    const KEYWORDS: &'static [&'static str];

    fn handles(key: &str) -> bool {
        Self::KEYWORDS.contains(&key)
    }

    fn parse(&mut self, key: &str, args: &[&str]) -> Result<(), DirectiveError>;

    /// One output line per directive.
    fn render(&self) -> Result<Vec<String>, DirectiveError>;
}

/// The sub-record a directive belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Io,
    Ignore,
    Print,
    ForceField,
    Ensemble,
}

impl Section {
    pub fn route(key: &str) -> Option<Section> {
        if IoParam::handles(key) {
            Some(Section::Io)
        } else if Ignore::handles(key) {
            Some(Section::Ignore)
        } else if PrintParam::handles(key) {
            Some(Section::Print)
        } else if ForceFieldParam::handles(key) {
            Some(Section::ForceField)
        } else if EnsembleParam::handles(key) {
            Some(Section::Ensemble)
        } else {
            None
        }
    }
}

/// Words that decorate directives without carrying a value.
const FILLER: &[&str] = &[
    "constant",
    "every",
    "sampling",
    "tolerance",
    "timestep",
    "temperature",
    "cutoff",
    "history",
    "field",
    "steps",
    "forces",
    "sum",
    "time",
];

pub fn strip_filler<'a>(args: &[&'a str]) -> Vec<&'a str> {
    args.iter()
        .copied()
        .filter(|a| !FILLER.contains(&a.to_ascii_lowercase().as_str()))
        .collect()
}

fn first_arg<'a>(field: &str, args: &[&'a str]) -> Result<&'a str, SchemaViolation> {
    args.first().copied().ok_or_else(|| SchemaViolation::MissingValue {
        field: field.to_string(),
    })
}

static IO_SCHEMA: Schema = Schema {
    name: "io",
    fields: &[
        FieldDescriptor::scalar("field", Str).with_default(Preset::Str("FIELD")),
        FieldDescriptor::scalar("config", Str).with_default(Preset::Str("CONFIG")),
        FieldDescriptor::scalar("statis", Str).with_default(Preset::Str("STATIS")),
        FieldDescriptor::scalar("output", Str).with_default(Preset::Str("OUTPUT")),
        FieldDescriptor::scalar("history", Str).with_default(Preset::Str("HISTORY")),
        FieldDescriptor::scalar("historf", Str).with_default(Preset::Str("HISTORF")),
        FieldDescriptor::scalar("revive", Str).with_default(Preset::Str("REVIVE")),
        FieldDescriptor::scalar("revcon", Str).with_default(Preset::Str("REVCON")),
        FieldDescriptor::scalar("revold", Str).with_default(Preset::Str("REVOLD")),
        FieldDescriptor::scalar("rdf", Str).with_default(Preset::Str("RDFDAT")),
        FieldDescriptor::scalar("msd", Str).with_default(Preset::Str("MSDTMP")),
        FieldDescriptor::scalar("tabvdw", Str).with_default(Preset::Str("TABLE")),
        FieldDescriptor::scalar("tabbnd", Str).with_default(Preset::Str("TABBND")),
        FieldDescriptor::scalar("tabang", Str).with_default(Preset::Str("TABANG")),
        FieldDescriptor::scalar("tabdih", Str).with_default(Preset::Str("TABDIH")),
        FieldDescriptor::scalar("tabinv", Str).with_default(Preset::Str("TABINV")),
        FieldDescriptor::scalar("tabeam", Str).with_default(Preset::Str("TABEAM")),
    ],
};

/// Auxiliary file names (`io <name> <path>`).
#[derive(Debug, Clone, PartialEq)]
pub struct IoParam {
    pub paths: Record,
}

impl Default for IoParam {
    fn default() -> Self {
        Self {
            paths: Record::new(&IO_SCHEMA),
        }
    }
}

impl IoParam {
    pub fn path(&self, name: &str) -> Result<Option<&str>, SchemaViolation> {
        self.paths.get_str(name)
    }

    pub fn set_path(&mut self, name: &str, path: impl Into<String>) -> Result<(), SchemaViolation> {
        self.paths.set(name, Value::Str(path.into()))
    }
}

impl SubRecord for IoParam {
    const KEYWORDS: &'static [&'static str] = &["io"];

    fn parse(&mut self, _key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let name = first_arg("io", args)?.to_ascii_lowercase();
        if args.len() < 2 {
            return Err(SchemaViolation::MissingValue { field: name }.into());
        }
        self.paths.set_tokens(&name, &args[1..])?;
        Ok(())
    }

    fn render(&self) -> Result<Vec<String>, DirectiveError> {
        Ok(self
            .paths
            .entries()
            .map(|(desc, entry)| format!("io {} {}", desc.name, entry.value))
            .collect())
    }
}

static IGNORE_SCHEMA: Schema = Schema {
    name: "ignore",
    fields: &[
        FieldDescriptor::scalar("elec", Bool),
        FieldDescriptor::scalar("index", Bool),
        FieldDescriptor::scalar("strict", Bool),
        FieldDescriptor::scalar("topology", Bool),
        FieldDescriptor::scalar("vdw", Bool),
        FieldDescriptor::scalar("vafaveraging", Bool),
        FieldDescriptor::scalar("link", Bool),
        FieldDescriptor::scalar("vom", Bool),
    ],
};

/// Disabled terms and checks (`no <name>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Ignore {
    pub flags: Record,
}

impl Default for Ignore {
    fn default() -> Self {
        Self {
            flags: Record::new(&IGNORE_SCHEMA),
        }
    }
}

impl Ignore {
    pub fn is_ignored(&self, name: &str) -> Result<bool, SchemaViolation> {
        self.flags.get_bool(name)
    }
}

impl SubRecord for Ignore {
    const KEYWORDS: &'static [&'static str] = &["no"];

    fn parse(&mut self, _key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let name = first_arg("no", args)?.to_ascii_lowercase();
        self.flags.set(&name, true)?;
        Ok(())
    }

    fn render(&self) -> Result<Vec<String>, DirectiveError> {
        Ok(self
            .flags
            .entries()
            .filter(|(_, entry)| entry.value.as_bool() == Some(true))
            .map(|(desc, _)| format!("no {}", desc.name))
            .collect())
    }
}

static ANALYSIS_SCHEMA: Schema = Schema {
    name: "analysis",
    fields: &[
        FieldDescriptor::tuple("all", &[Int, Int, Float]),
        FieldDescriptor::tuple("bonds", &[Int, Int, Float]),
        FieldDescriptor::tuple("angles", &[Int, Int]),
        FieldDescriptor::tuple("dihedrals", &[Int, Int]),
        FieldDescriptor::tuple("inversions", &[Int, Int]),
    ],
};

static PRINT_SCHEMA: Schema = Schema {
    name: "print",
    fields: &[
        FieldDescriptor::scalar("printevery", Int),
        FieldDescriptor::scalar("analysis", Bool),
        FieldDescriptor::scalar("rdf", Bool),
        FieldDescriptor::scalar("rdfevery", Int),
        FieldDescriptor::scalar("vaf", Bool),
        FieldDescriptor::scalar("vafevery", Int),
        FieldDescriptor::scalar("vafbin", Int),
        FieldDescriptor::scalar("zden", Bool),
        FieldDescriptor::scalar("zdenevery", Int),
        FieldDescriptor::scalar("statsevery", Int).with_default(Preset::Int(1)),
        FieldDescriptor::nested("analyse", &ANALYSIS_SCHEMA),
    ],
};

/// Output frequencies and analysis sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintParam {
    pub record: Record,
}

impl Default for PrintParam {
    fn default() -> Self {
        Self {
            record: Record::new(&PRINT_SCHEMA),
        }
    }
}

impl PrintParam {
    pub fn analysis(&self) -> Result<&Record, SchemaViolation> {
        self.record.nested("analyse")
    }
}

impl SubRecord for PrintParam {
    const KEYWORDS: &'static [&'static str] =
        &["print", "rdf", "zden", "stats", "analyse", "analysis", "vaf"];

    fn parse(&mut self, key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        match key {
            "print" => {
                let what = first_arg("print", args)?;
                if what.chars().all(|c| c.is_ascii_digit()) {
                    self.record.set_tokens("printevery", &[what])?;
                } else {
                    let what = what.to_ascii_lowercase();
                    self.record.set(&what, true)?;
                    let every = format!("{}every", what);
                    if self.record.schema().declares(&every) && !self.record.is_set(&every) {
                        self.record.set(&every, 1)?;
                    }
                }
            }
            "rdf" | "zden" | "stats" => {
                let every = format!("{}every", key);
                self.record.set_tokens(&every, &[first_arg(&every, args)?])?;
            }
            "vaf" => {
                self.record.set_tokens("vafevery", &[first_arg("vafevery", args)?])?;
                if let Some(bin) = args.get(1) {
                    self.record.set_tokens("vafbin", &[*bin])?;
                }
            }
            _ => {
                let kind = first_arg(key, args)?.to_ascii_lowercase();
                let values: Vec<&str> = args[1..]
                    .iter()
                    .copied()
                    .filter(|t| is_numeric(t))
                    .collect();
                self.record
                    .nested_mut("analyse")?
                    .set_tokens(&kind, &values)?;
            }
        }
        Ok(())
    }

    fn render(&self) -> Result<Vec<String>, DirectiveError> {
        let r = &self.record;
        let mut lines = Vec::new();
        if let Some(n) = r.get_int("printevery")? {
            lines.push(format!("print {}", n));
        }
        if r.get_bool("analysis")? {
            lines.push("print analysis".to_string());
        }
        for (desc, entry) in r.nested("analyse")?.entries() {
            if let Some(items) = entry.value.as_tuple() {
                let mut line = format!("analyse {} every {} nbins {}", desc.name, items[0], items[1]);
                if let Some(rmax) = items.get(2) {
                    line.push_str(&format!(" rmax {}", rmax));
                }
                lines.push(line);
            }
        }
        for what in ["rdf", "zden"] {
            if r.get_bool(what)? {
                lines.push(format!("print {}", what));
            }
            if let Some(every) = r.get_int(&format!("{}every", what))? {
                lines.push(format!("{} {}", what, every));
            }
        }
        if r.get_bool("vaf")? {
            lines.push("print vaf".to_string());
        }
        if let Some(every) = r.get_int("vafevery")? {
            match r.get_int("vafbin")? {
                Some(bin) => lines.push(format!("vaf {} {}", every, bin)),
                None => lines.push(format!("vaf {}", every)),
            }
        }
        if let Some(every) = r.get_int("statsevery")? {
            lines.push(format!("stats {}", every));
        }
        Ok(lines)
    }
}

static FFIELD_SCHEMA: Schema = Schema {
    name: "ffield",
    fields: &[
        FieldDescriptor::scalar("rcut", Float),
        FieldDescriptor::scalar("rvdw", Float),
        FieldDescriptor::scalar("rpad", Float),
        FieldDescriptor::scalar("elec", Bool),
        FieldDescriptor::scalar("elec_method", Str).with_default(Preset::Str("coulomb")),
        FieldDescriptor::scalar("elec_params", Str),
        FieldDescriptor::scalar("vdw", Bool),
        FieldDescriptor::scalar("vdw_params", Str),
        FieldDescriptor::scalar("metal", Bool),
        FieldDescriptor::scalar("metal_style", Str),
    ],
};

const ELEC_METHODS: &[&str] = &["reaction", "shift", "distance", "ewald", "coulomb"];

/// Cutoffs, electrostatics and non-bonded switches.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceFieldParam {
    pub record: Record,
}

impl Default for ForceFieldParam {
    fn default() -> Self {
        Self {
            record: Record::new(&FFIELD_SCHEMA),
        }
    }
}

impl SubRecord for ForceFieldParam {
    const KEYWORDS: &'static [&'static str] = &[
        "reaction", "shift", "distance", "ewald", "coulomb", "rpad", "delr", "padding", "cutoff",
        "rcut", "cut", "rvdw", "metal", "vdw",
    ];

    fn parse(&mut self, key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let r = &mut self.record;
        match key {
            k if ELEC_METHODS.contains(&k) => {
                r.set("elec", true)?;
                r.set("elec_method", k)?;
                r.set_tokens("elec_params", args)?;
            }
            "rpad" | "padding" => r.set_tokens("rpad", args)?,
            "delr" => {
                let mut staged = r.clone();
                staged.set_tokens("rpad", args)?;
                if let Some(entry) = staged.entry("rpad")?.cloned() {
                    let width = entry.value.as_float().unwrap_or_default() * 4.0;
                    staged.set_with_unit("rpad", width, entry.unit)?;
                }
                *r = staged;
            }
            "cutoff" | "rcut" | "cut" => r.set_tokens("rcut", args)?,
            "rvdw" => r.set_tokens("rvdw", args)?,
            "metal" => {
                r.set("metal", true)?;
                r.set_tokens("metal_style", args)?;
            }
            "vdw" => {
                r.set("vdw", true)?;
                r.set_tokens("vdw_params", args)?;
            }
            other => return Err(DirectiveError::Unrecognized(other.to_string())),
        }
        Ok(())
    }

    fn render(&self) -> Result<Vec<String>, DirectiveError> {
        let r = &self.record;
        let mut lines = Vec::new();
        let with_args = |key: &str, args: Option<&str>| match args.filter(|a| !a.is_empty()) {
            Some(a) => format!("{} {}", key, a),
            None => key.to_string(),
        };
        if r.get_bool("elec")? {
            let method = r.get_str("elec_method")?.unwrap_or("coulomb");
            lines.push(with_args(method, r.get_str("elec_params")?));
        }
        if r.get_bool("vdw")? {
            lines.push(with_args("vdw", r.get_str("vdw_params")?));
        }
        if r.get_bool("metal")? {
            lines.push(with_args("metal", r.get_str("metal_style")?));
        }
        for key in ["rcut", "rvdw", "rpad"] {
            if let Some(entry) = r.entry(key)? {
                lines.push(format!("{} {}", key, entry));
            }
        }
        Ok(lines)
    }
}

impl SubRecord for EnsembleParam {
    const KEYWORDS: &'static [&'static str] = &["ensemble"];

    fn parse(&mut self, _key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        *self = EnsembleParam::parse(self.check(), args)?;
        Ok(())
    }

    fn render(&self) -> Result<Vec<String>, DirectiveError> {
        Ok(vec![format!("ensemble {}", EnsembleParam::render(self)?)])
    }
}

static CONTROL_SCHEMA: Schema = Schema {
    name: "control",
    fields: &[
        FieldDescriptor::scalar("temperature", Float).with_default(Preset::Float(300.0)),
        FieldDescriptor::scalar("pressure", Float),
        FieldDescriptor::scalar("steps", Int).with_default(Preset::Int(10)),
        FieldDescriptor::scalar("equilibration", Int).with_default(Preset::Int(5)),
        FieldDescriptor::scalar("variable", Bool),
        FieldDescriptor::scalar("timestep", Float).with_default(Preset::Float(0.001)),
        FieldDescriptor::scalar("mxstep", Float),
        FieldDescriptor::scalar("maxdis", Float),
        FieldDescriptor::scalar("mindis", Float),
        FieldDescriptor::scalar("restart", Str),
        FieldDescriptor::scalar("scale", Int),
        FieldDescriptor::scalar("regauss", Int),
        FieldDescriptor::scalar("zero", Bool),
        FieldDescriptor::scalar("collect", Bool),
        FieldDescriptor::scalar("cap", Float),
        FieldDescriptor::scalar("shake", Float),
        FieldDescriptor::scalar("mxshak", Int),
        FieldDescriptor::scalar("quaternion", Float),
        FieldDescriptor::scalar("mxquat", Int),
        FieldDescriptor::scalar("exclude", Bool),
        FieldDescriptor::scalar("slab", Bool),
        FieldDescriptor::scalar("replay", Bool),
        FieldDescriptor::scalar("heat_flux", Bool),
        FieldDescriptor::scalar("epsilon", Float),
        FieldDescriptor::scalar("binsize", Float),
        FieldDescriptor::scalar("densvar", Float),
        FieldDescriptor::scalar("dump", Int),
        FieldDescriptor::scalar("stack", Int),
        FieldDescriptor::scalar("multiple", Int),
        FieldDescriptor::scalar("integrator", Str),
        FieldDescriptor::scalar("rlxtol", Float),
        FieldDescriptor::tuple("seed", &[Int, Int]),
        FieldDescriptor::tuple("nfold", &[Int, Int, Int]),
        FieldDescriptor::tuple("minimise", &[Str, Int, Float]),
        FieldDescriptor::tuple("optimise", &[Str, Float]),
        FieldDescriptor::tuple("pseudo", &[Str, Float, Float]),
        FieldDescriptor::tuple("impact", &[Int, Int, Float, Float, Float, Float]),
        FieldDescriptor::tuple("defects", &[Int, Int, Float]),
        FieldDescriptor::tuple("displacements", &[Int, Int, Float]),
        FieldDescriptor::tuple("trajectory", &[Int, Int, Int]),
        FieldDescriptor::tuple("msdtemp", &[Int, Int]),
        FieldDescriptor::scalar("l_msd", Bool),
        FieldDescriptor::scalar("l_scr", Bool),
        FieldDescriptor::scalar("l_tor", Bool),
        FieldDescriptor::scalar("l_eng", Bool),
        FieldDescriptor::scalar("l_rout", Bool),
        FieldDescriptor::scalar("l_rin", Bool),
        FieldDescriptor::scalar("job", Int),
        FieldDescriptor::scalar("close", Int),
    ],
};

/// Maps alternative spellings onto declared field names.
fn canonical_key(key: &str) -> &str {
    match key {
        "pres" | "press" => "pressure",
        "temp" => "temperature",
        "equil" => "equilibration",
        "minimize" => "minimise",
        "optimize" => "optimise",
        "traj" => "trajectory",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub title: String,
    pub params: Record,
    pub io: IoParam,
    pub ignore: Ignore,
    pub print: PrintParam,
    pub ffield: ForceFieldParam,
    pub ensemble: EnsembleParam,
}

impl Default for Control {
    fn default() -> Self {
        Self::new(ArityCheck::default())
    }
}

impl Control {
    pub fn new(check: ArityCheck) -> Self {
        Self {
            title: "no title".to_string(),
            params: Record::new(&CONTROL_SCHEMA),
            io: IoParam::default(),
            ignore: Ignore::default(),
            print: PrintParam::default(),
            ffield: ForceFieldParam::default(),
            ensemble: EnsembleParam::new(check),
        }
    }

    pub fn schema() -> &'static Schema {
        &CONTROL_SCHEMA
    }

    /// Applies one directive line split into keyword and arguments.
    pub fn apply(&mut self, key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let key = key.to_ascii_lowercase();
        let section = Section::route(&key);
        let args = match section {
            Some(Section::Io) => args.to_vec(),
            _ => strip_filler(args),
        };
        match section {
            Some(Section::Io) => self.io.parse(&key, &args),
            Some(Section::Ignore) => self.ignore.parse(&key, &args),
            Some(Section::Print) => self.print.parse(&key, &args),
            Some(Section::ForceField) => self.ffield.parse(&key, &args),
            Some(Section::Ensemble) => SubRecord::parse(&mut self.ensemble, &key, &args),
            None => self.apply_param(&key, &args),
        }
    }

    fn apply_param(&mut self, key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let name = canonical_key(key);
        if name == "variable" {
            let mut staged = self.params.clone();
            staged.set("variable", true)?;
            if !args.is_empty() {
                staged.set_tokens("timestep", args)?;
            }
            self.params = staged;
            return Ok(());
        }
        if CONTROL_SCHEMA.declares(name) {
            self.params.set_tokens(name, args)?;
            Ok(())
        } else if name.starts_with("l_") {
            debug!("skipping undeclared flag '{}'", name);
            Ok(())
        } else {
            Err(DirectiveError::Unrecognized(key.to_string()))
        }
    }

    /// Whether per-atom mean-square displacements are written to STATIS.
    pub fn msd_enabled(&self) -> bool {
        self.params.get_bool("l_msd").unwrap_or(false)
    }

    /// Directive lines between the title and `finish`.
    pub fn directives(&self) -> Result<Vec<String>, DirectiveError> {
        let variable = self.params.get_bool("variable")?;
        let mut lines = Vec::new();
        for (desc, entry) in self.params.entries() {
            match (desc.name, &desc.kind, &entry.value) {
                ("variable", _, _) => {}
                (_, FieldKind::Scalar(Bool), Value::Bool(on)) => {
                    if *on {
                        lines.push(desc.name.to_string());
                    }
                }
                ("job" | "close", _, _) => lines.push(format!("{} time {}", desc.name, entry)),
                ("timestep", _, _) if variable => lines.push(format!("variable timestep {}", entry)),
                (name, _, _) => lines.push(format!("{} {}", name, entry).trim_end().to_string()),
            }
        }
        if variable && !self.params.is_set("timestep") {
            lines.push("variable".to_string());
        }
        lines.extend(self.io.render()?);
        lines.extend(self.ignore.render()?);
        lines.extend(self.print.render()?);
        lines.extend(self.ffield.render()?);
        lines.extend(SubRecord::render(&self.ensemble)?);
        Ok(lines)
    }
}
