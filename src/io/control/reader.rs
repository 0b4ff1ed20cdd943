use crate::io::{ReadOptions, error::Error, util};
use crate::model::control::{Control, DirectiveError};
use crate::model::schema::SchemaViolation;
use log::{debug, warn};
use std::io::BufRead;

pub fn read<R: BufRead>(reader: R, opts: &ReadOptions) -> Result<Control, Error> {
    let lines = util::collect_lines(reader)?;
    let mut control = Control::new(opts.arity_check);
    let mut cursor = 0;

    if let Some((_, title)) = util::next_line(&lines, &mut cursor) {
        control.title = title.to_string();
    }

    while let Some((ln, line)) = util::next_data_line(&lines, &mut cursor) {
        let parts = util::tokens(line);
        let Some((key, args)) = parts.split_first() else {
            continue;
        };
        if key.eq_ignore_ascii_case("finish") {
            debug!("CONTROL finished at line {}", ln);
            break;
        }
        match control.apply(key, args) {
            Ok(()) => {}
            Err(DirectiveError::Unrecognized(keyword)) if !opts.strict => {
                warn!("skipping unrecognized CONTROL directive '{}' at line {}", keyword, ln);
            }
            Err(DirectiveError::Schema(SchemaViolation::Undeclared { record, field }))
                if !opts.strict =>
            {
                warn!("skipping unknown {} option '{}' at line {}", record, field, ln);
            }
            Err(e) => return Err(Error::from(e).at_line(ln)),
        }
    }

    Ok(control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Format;
    use crate::model::ensemble::{ArityCheck, Ensemble, Means};
    use crate::model::schema::Value;
    use std::io::Cursor;

    const SAMPLE: &str = "\
Argon NVT test
# run length

temperature 120.0 K
steps 1000
equilibration steps 200
variable timestep 0.002
cutoff 9.0
delr 0.25
ensemble nvt hoover 0.1
trajectory 0 100 2
print every 50
stats every 10
print rdf
rdf sampling every 20
collect
no elec
io history traj.hst
job time 3600
finish
steps 5
";

    #[test]
    fn reads_directives_into_sections() {
        let control = read(Cursor::new(SAMPLE), &ReadOptions::default()).expect("valid CONTROL");

        assert_eq!(control.title, "Argon NVT test");
        let p = &control.params;
        assert_eq!(p.get_float("temperature").unwrap(), Some(120.0));
        assert_eq!(
            p.entry("temperature").unwrap().and_then(|e| e.unit()),
            Some("K")
        );
        assert_eq!(p.get_int("steps").unwrap(), Some(1000));
        assert_eq!(p.get_int("equilibration").unwrap(), Some(200));
        assert!(p.get_bool("variable").unwrap());
        assert_eq!(p.get_float("timestep").unwrap(), Some(0.002));
        assert_eq!(p.get_int("job").unwrap(), Some(3600));
        assert_eq!(
            p.get("trajectory").unwrap(),
            Some(&Value::Tuple(vec![Value::Int(0), Value::Int(100), Value::Int(2)]))
        );
        assert!(p.get_bool("collect").unwrap());

        assert_eq!(control.ffield.record.get_float("rcut").unwrap(), Some(9.0));
        assert_eq!(control.ffield.record.get_float("rpad").unwrap(), Some(1.0));
        assert_eq!(control.ensemble.ensemble(), Ensemble::Nvt);
        assert_eq!(control.ensemble.means(), Some(Means::Hoover));
        assert_eq!(control.print.record.get_int("printevery").unwrap(), Some(50));
        assert_eq!(control.print.record.get_int("statsevery").unwrap(), Some(10));
        assert_eq!(control.print.record.get_int("rdfevery").unwrap(), Some(20));
        assert!(control.ignore.is_ignored("elec").unwrap());
        assert_eq!(control.io.path("history").unwrap(), Some("traj.hst"));
    }

    #[test]
    fn strict_mode_rejects_unknown_directives_with_line() {
        let input = "title\nsteps 10\nwarp 9\nfinish\n";
        let err = read(Cursor::new(input), &ReadOptions::default()).unwrap_err();
        match err {
            Error::UnrecognizedBlock {
                format,
                line,
                keyword,
            } => {
                assert_eq!(format, Format::Control);
                assert_eq!(line, 3);
                assert_eq!(keyword, "warp");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn permissive_mode_skips_unknown_directives() {
        let input = "title\nwarp 9\nsteps 10\nfinish\n";
        let control = read(Cursor::new(input), &ReadOptions::permissive()).expect("permissive read");
        assert_eq!(control.params.get_int("steps").unwrap(), Some(10));
    }

    #[test]
    fn permissive_mode_skips_unknown_sub_keys() {
        let input = "title\nno gravity\nio nowhere x\nprint foo\nno elec\nfinish\n";
        let control = read(Cursor::new(input), &ReadOptions::permissive()).expect("permissive read");
        assert!(control.ignore.is_ignored("elec").unwrap());
        assert_eq!(control.io.path("field").unwrap(), Some("FIELD"));

        let err = read(Cursor::new(input), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaViolation::Undeclared { .. })));
    }

    #[test]
    fn bad_values_abort_even_when_permissive() {
        let input = "title\nsteps many\nfinish\n";
        let err = read(Cursor::new(input), &ReadOptions::permissive()).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn ensemble_arity_follows_check_policy() {
        let input = "title\nensemble nvt langevin 1.0 2.0\nfinish\n";
        let err = read(Cursor::new(input), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Ensemble(_)));

        let deferred = ReadOptions::default().with_arity_check(ArityCheck::Deferred);
        let control = read(Cursor::new(input), &deferred).expect("deferred check accepts");
        assert_eq!(control.ensemble.args(), ["1.0", "2.0"]);
    }

    #[test]
    fn empty_input_yields_defaults() {
        let control = read(Cursor::new(""), &ReadOptions::default()).unwrap();
        assert_eq!(control, crate::model::control::Control::default());
    }
}
