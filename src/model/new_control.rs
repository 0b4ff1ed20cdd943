//! Keyed run-control model (the DL_POLY 5 CONTROL layout).
//!
//! Every line is `key value... [unit]`, with multi-valued keys written as
//! `key [ v1 v2 ... ] unit` and switches written as `ON`/`OFF`. The whole
//! file is one flat [`Record`]; auxiliary file names live in `io_file_*`
//! slots rather than a sub-record.

use super::control::DirectiveError;
use super::ensemble::{Ensemble, EnsembleError, Means};
use super::schema::ScalarKind::{self, Bool, Float, Int, Str};
use super::schema::{FieldDescriptor, Record, Schema, SchemaViolation, Value};
use super::value::UnitValue;

const fn flag(name: &'static str) -> FieldDescriptor {
    FieldDescriptor::scalar(name, Bool)
}

const fn int(name: &'static str) -> FieldDescriptor {
    FieldDescriptor::scalar(name, Int)
}

const fn real(name: &'static str) -> FieldDescriptor {
    FieldDescriptor::scalar(name, Float)
}

const fn text(name: &'static str) -> FieldDescriptor {
    FieldDescriptor::scalar(name, Str)
}

const INT3: &[ScalarKind] = &[Int, Int, Int];
const REAL3: &[ScalarKind] = &[Float, Float, Float];
const REAL6: &[ScalarKind] = &[Float, Float, Float, Float, Float, Float];

/// Numeric slots take an optional trailing unit token (`time_run 100 steps`).
static NEW_CONTROL_SCHEMA: Schema = Schema {
    name: "new control",
    fields: &[
        text("title"),
        FieldDescriptor::tuple("random_seed", INT3),
        real("density_variance"),
        int("data_dump_frequency"),
        real("subcell_threshold"),
        real("time_run"),
        real("time_equilibration"),
        real("time_job"),
        real("time_close"),
        real("stats_frequency"),
        int("stack_size"),
        flag("record_equilibration"),
        flag("print_per_particle_contrib"),
        flag("print_probability_distribution"),
        flag("analyse_all"),
        flag("analyse_angles"),
        flag("analyse_bonds"),
        flag("analyse_dihedrals"),
        flag("analyse_inversions"),
        real("analyse_frequency"),
        real("analyse_frequency_bonds"),
        real("analyse_frequency_angles"),
        real("analyse_frequency_dihedrals"),
        real("analyse_frequency_inversions"),
        real("analyse_max_dist"),
        int("analyse_num_bins"),
        int("analyse_num_bins_bonds"),
        int("analyse_num_bins_angles"),
        int("analyse_num_bins_dihedrals"),
        int("analyse_num_bins_inversions"),
        flag("msd_calculate"),
        int("msd_start"),
        real("msd_frequency"),
        flag("traj_calculate"),
        text("traj_key"),
        real("traj_start"),
        real("traj_interval"),
        flag("defects_calculate"),
        real("defects_start"),
        real("defects_interval"),
        real("defects_distance"),
        flag("defects_backup"),
        flag("displacements_calculate"),
        real("displacements_start"),
        real("displacements_interval"),
        real("displacements_distance"),
        flag("coord_calculate"),
        int("coord_ops"),
        real("coord_start"),
        real("coord_interval"),
        flag("adf_calculate"),
        real("adf_frequency"),
        real("adf_precision"),
        flag("rdf_calculate"),
        flag("rdf_print"),
        real("rdf_frequency"),
        real("rdf_binsize"),
        text("rdf_error_analysis"),
        int("rdf_error_analysis_blocks"),
        flag("zden_calculate"),
        flag("zden_print"),
        real("zden_frequency"),
        real("zden_binsize"),
        flag("vaf_calculate"),
        flag("vaf_print"),
        real("vaf_frequency"),
        int("vaf_binsize"),
        flag("vaf_averaging"),
        flag("currents_calculate"),
        real("print_frequency"),
        text("io_units_scheme"),
        text("io_units_length"),
        text("io_units_time"),
        text("io_units_mass"),
        text("io_units_charge"),
        text("io_units_energy"),
        text("io_units_pressure"),
        text("io_units_force"),
        text("io_units_velocity"),
        text("io_units_power"),
        text("io_units_surface_tension"),
        text("io_units_emf"),
        text("io_read_method"),
        int("io_read_readers"),
        int("io_read_batch_size"),
        int("io_read_buffer_size"),
        flag("io_read_error_check"),
        flag("io_read_ascii_revold"),
        text("io_write_method"),
        int("io_write_writers"),
        int("io_write_batch_size"),
        int("io_write_buffer_size"),
        flag("io_write_sorted"),
        flag("io_write_error_check"),
        text("io_write_netcdf_format"),
        flag("io_write_ascii_revive"),
        text("io_file_output"),
        text("io_file_config"),
        text("io_file_field"),
        text("io_file_statis"),
        text("io_file_history"),
        text("io_file_historf"),
        text("io_file_revive"),
        text("io_file_revold"),
        text("io_file_revcon"),
        text("io_file_rdf"),
        text("io_file_msd"),
        text("io_file_tabbnd"),
        text("io_file_tabang"),
        text("io_file_tabdih"),
        text("io_file_tabinv"),
        text("io_file_tabvdw"),
        text("io_file_tabeam"),
        flag("output_energy"),
        flag("ignore_config_indices"),
        flag("print_topology_info"),
        int("print_level"),
        int("time_depth"),
        flag("timer_per_mpi"),
        real("timestep"),
        flag("timestep_variable"),
        real("timestep_variable_min_dist"),
        real("timestep_variable_max_dist"),
        real("timestep_variable_max_delta"),
        text("ensemble"),
        text("ensemble_method"),
        real("ensemble_thermostat_coupling"),
        text("ensemble_dpd_order"),
        real("ensemble_dpd_drag"),
        real("ensemble_thermostat_friction"),
        real("ensemble_thermostat_softness"),
        real("ensemble_barostat_coupling"),
        real("ensemble_barostat_friction"),
        text("ensemble_semi_isotropic"),
        flag("ensemble_semi_orthorhombic"),
        real("ensemble_tension"),
        FieldDescriptor::tuple("pressure_tensor", REAL6),
        real("pressure_hydrostatic"),
        FieldDescriptor::tuple("pressure_perpendicular", REAL3),
        real("temperature"),
        text("pseudo_thermostat_method"),
        real("pseudo_thermostat_width"),
        real("pseudo_thermostat_temperature"),
        int("impact_part_index"),
        real("impact_time"),
        real("impact_energy"),
        FieldDescriptor::tuple("impact_direction", REAL3),
        flag("ttm_calculate"),
        int("ttm_num_ion_cells"),
        FieldDescriptor::tuple("ttm_num_elec_cells", INT3),
        flag("ttm_metal"),
        text("ttm_heat_cap_model"),
        real("ttm_heat_cap"),
        real("ttm_temp_term"),
        real("ttm_fermi_temp"),
        text("ttm_elec_cond_model"),
        real("ttm_elec_cond"),
        text("ttm_diff_model"),
        real("ttm_diff"),
        text("ttm_dens_model"),
        real("ttm_dens"),
        int("ttm_min_atoms"),
        real("ttm_stopping_power"),
        text("ttm_spatial_dist"),
        real("ttm_spatial_sigma"),
        real("ttm_spatial_cutoff"),
        real("ttm_fluence"),
        real("ttm_penetration_depth"),
        text("ttm_laser_type"),
        text("ttm_temporal_dist"),
        real("ttm_temporal_duration"),
        real("ttm_temporal_cutoff"),
        text("ttm_variable_ep"),
        text("ttm_boundary_condition"),
        flag("ttm_boundary_xy"),
        text("ttm_boundary_heat_flux"),
        real("ttm_time_offset"),
        flag("ttm_oneway"),
        real("ttm_statis_frequency"),
        real("ttm_traj_frequency"),
        text("ttm_com_correction"),
        flag("ttm_redistribute"),
        real("ttm_e-phonon_friction"),
        real("ttm_e-stopping_friction"),
        real("ttm_e-stopping_velocity"),
        real("rlx_cgm_step"),
        real("rlx_tol"),
        int("shake_max_iter"),
        real("shake_tolerance"),
        flag("dftb"),
        flag("fixed_com"),
        real("reset_temperature_interval"),
        real("regauss_frequency"),
        real("rescale_frequency"),
        real("equilibration_force_cap"),
        text("minimisation_criterion"),
        real("minimisation_tolerance"),
        real("minimisation_step_length"),
        real("minimisation_frequency"),
        real("initial_minimum_separation"),
        text("restart"),
        FieldDescriptor::tuple("nfold", INT3),
        real("cutoff"),
        real("padding"),
        real("coul_damping"),
        real("coul_dielectric_constant"),
        flag("coul_extended_exclusion"),
        text("coul_method"),
        real("coul_precision"),
        real("ewald_precision"),
        real("ewald_alpha"),
        FieldDescriptor::tuple("ewald_kvec", INT3),
        real("ewald_kvec_spacing"),
        int("ewald_nsplines"),
        text("polarisation_model"),
        real("polarisation"),
        flag("metal_direct"),
        flag("metal_sqrtrho"),
        text("vdw_method"),
        real("vdw_cutoff"),
        text("vdw_mix_method"),
        flag("vdw_force_shift"),
        flag("plumed"),
        text("plumed_input"),
        text("plumed_log"),
        real("plumed_precision"),
        flag("plumed_restart"),
        flag("strict_checks"),
        flag("unsafe_comms"),
        flag("unit_test"),
    ],
};

const IO_FILE_PREFIX: &str = "io_file_";

/// Renders one set slot as a keyed line; empty text slots are omitted.
fn render_entry(name: &str, entry: &UnitValue<Value>) -> Option<String> {
    let mut line = match &entry.value {
        Value::Str(s) if s.is_empty() => return None,
        Value::Tuple(items) if items.len() > 1 => format!("{} [ {} ]", name, entry.value),
        value => format!("{} {}", name, value),
    };
    if let Some(unit) = entry.unit() {
        line.push(' ');
        line.push_str(unit);
    }
    Some(line)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewControl {
    pub params: Record,
}

impl Default for NewControl {
    fn default() -> Self {
        Self {
            params: Record::new(&NEW_CONTROL_SCHEMA),
        }
    }
}

impl NewControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema() -> &'static Schema {
        &NEW_CONTROL_SCHEMA
    }

    pub fn title(&self) -> Option<&str> {
        self.params.get_str("title").ok().flatten()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), SchemaViolation> {
        self.params.set("title", Value::Str(title.into()))
    }

    /// Applies one `key value... [unit]` line. Brackets around multi-valued
    /// arguments are dropped before casting.
    pub fn apply(&mut self, key: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let key = key.to_ascii_lowercase();
        if !NEW_CONTROL_SCHEMA.declares(&key) {
            return Err(DirectiveError::Unrecognized(key));
        }
        let values: Vec<&str> = args
            .iter()
            .map(|a| a.trim_matches(['[', ']']))
            .filter(|a| !a.is_empty())
            .collect();
        self.params.set_tokens(&key, &values)?;
        Ok(())
    }

    /// File name for an auxiliary output, e.g. `io_file("history")`.
    pub fn io_file(&self, name: &str) -> Result<Option<&str>, SchemaViolation> {
        self.params.get_str(&format!("{}{}", IO_FILE_PREFIX, name))
    }

    pub fn set_io_file(&mut self, name: &str, path: impl Into<String>) -> Result<(), SchemaViolation> {
        self.params
            .set(&format!("{}{}", IO_FILE_PREFIX, name), Value::Str(path.into()))
    }

    /// The declared ensemble and its method, validated against the known
    /// ensembles and means. `None` when no ensemble is set.
    pub fn ensemble(&self) -> Result<Option<(Ensemble, Option<Means>)>, EnsembleError> {
        let Some(name) = self.params.get_str("ensemble").ok().flatten() else {
            return Ok(None);
        };
        let ensemble: Ensemble = name.parse()?;
        let means = match self.params.get_str("ensemble_method").ok().flatten() {
            Some(method) if !method.is_empty() => Some(method.parse::<Means>()?),
            _ => None,
        };
        Ok(Some((ensemble, means)))
    }

    /// Output lines in declaration order, starting with the title.
    pub fn directives(&self) -> Vec<String> {
        self.params
            .entries()
            .filter_map(|(desc, entry)| render_entry(desc.name, entry))
            .collect()
    }
}
