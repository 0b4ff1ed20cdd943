use crate::io::{ReadOptions, error::Error, util};
use crate::model::control::DirectiveError;
use crate::model::new_control::NewControl;
use log::{debug, warn};
use std::io::BufRead;

pub fn read<R: BufRead>(reader: R, opts: &ReadOptions) -> Result<NewControl, Error> {
    let lines = util::collect_lines(reader)?;
    let mut control = NewControl::new();
    let mut cursor = 0;

    while let Some((ln, line)) = util::next_data_line(&lines, &mut cursor) {
        // `!` also opens a comment in this layout.
        let parts: Vec<&str> = util::tokens(line)
            .into_iter()
            .take_while(|t| !t.starts_with('!'))
            .collect();
        let Some((key, args)) = parts.split_first() else {
            continue;
        };
        match control.apply(key, args) {
            Ok(()) => {}
            Err(DirectiveError::Unrecognized(keyword)) if !opts.strict => {
                warn!("skipping unrecognized CONTROL key '{}' at line {}", keyword, ln);
            }
            Err(e) => return Err(Error::from(e).at_line(ln)),
        }
    }

    debug!("read {} keyed CONTROL entries", control.params.entries().count());
    Ok(control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Format;
    use crate::model::schema::Value;
    use std::io::Cursor;

    const SAMPLE: &str = "\
title Argon NVT test
# run length
time_run 20000 steps
time_equilibration 1000 steps ! warm up
timestep 2.0 fs
temperature 120.0 K
cutoff 9.0 ang
ensemble nvt
ensemble_method hoover
ensemble_thermostat_coupling 0.5 ps
nfold [ 2 2 1 ]
rdf_calculate ON
vaf_print OFF
io_file_history traj.hst
";

    #[test]
    fn reads_keyed_lines() {
        let control = read(Cursor::new(SAMPLE), &ReadOptions::default()).expect("valid CONTROL");
        let p = &control.params;
        assert_eq!(control.title(), Some("Argon NVT test"));
        assert_eq!(p.get_float("time_run").unwrap(), Some(20000.0));
        assert_eq!(
            p.entry("time_equilibration").unwrap().and_then(|e| e.unit()),
            Some("steps")
        );
        assert_eq!(p.entry("timestep").unwrap().and_then(|e| e.unit()), Some("fs"));
        assert_eq!(
            p.get("nfold").unwrap(),
            Some(&Value::Tuple(vec![Value::Int(2), Value::Int(2), Value::Int(1)]))
        );
        assert!(p.get_bool("rdf_calculate").unwrap());
        assert!(!p.get_bool("vaf_print").unwrap());
        assert_eq!(control.io_file("history").unwrap(), Some("traj.hst"));
        assert!(control.ensemble().unwrap().is_some());
    }

    #[test]
    fn unknown_keys_follow_strictness() {
        let input = "title t\nwarp_drive 9\ncutoff 9.0\n";
        match read(Cursor::new(input), &ReadOptions::default()).unwrap_err() {
            Error::UnrecognizedBlock {
                format,
                line,
                keyword,
            } => {
                assert_eq!(format, Format::Control);
                assert_eq!(line, 2);
                assert_eq!(keyword, "warp_drive");
            }
            other => panic!("unexpected error: {other}"),
        }

        let control = read(Cursor::new(input), &ReadOptions::permissive()).expect("permissive read");
        assert_eq!(control.params.get_float("cutoff").unwrap(), Some(9.0));
    }

    #[test]
    fn bad_values_abort_even_when_permissive() {
        let input = "title t\nshake_max_iter lots\n";
        let err = read(Cursor::new(input), &ReadOptions::permissive()).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
