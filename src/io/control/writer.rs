use crate::io::error::Error;
use crate::model::control::Control;
use std::io::Write;

/// Writes a CONTROL file.
///
/// Every directive is rendered before anything is written, so an invalid
/// ensemble leaves the writer untouched.
pub fn write<W: Write>(mut writer: W, control: &Control) -> Result<(), Error> {
    let directives = control.directives()?;

    writeln!(writer, "{}", control.title.trim())?;
    for line in &directives {
        writeln!(writer, "{}", line)?;
    }
    writeln!(writer, "finish")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{ReadOptions, control::reader};
    use crate::model::ensemble::{ArityCheck, Ensemble, Means};
    use std::io::Cursor;

    const INPUT: &str = "\
Water box
temperature 300.0 K
pressure 0.001 katm
steps 5000
timestep 0.001
restart
seed 11 42
minimise energy 100 0.01
cutoff 10.0
rvdw 10.0
ewald precision 1e-6
ensemble npt hoover 1.0 2.0
print every 100
analyse all sampling every 5 nbins 200 rmax 8.0
print analysis
print vaf
vaf 10 50
no vdw
l_msd
close time 120
finish
";

    #[test]
    fn writes_and_reads_roundtrip() {
        let opts = ReadOptions::default();
        let first = reader::read(Cursor::new(INPUT), &opts).expect("valid CONTROL");

        let mut buffer = Vec::new();
        write(&mut buffer, &first).expect("write should succeed");
        let text = String::from_utf8(buffer).expect("utf8 output");

        assert!(text.starts_with("Water box\n"));
        assert!(text.ends_with("finish\n"));
        assert!(text.contains("ensemble npt hoover 1.0 2.0\n"));
        assert!(text.contains("temperature 300.0 K\n"));
        assert!(text.contains("close time 120\n"));
        assert!(text.contains("\nrestart\n"));

        let second = reader::read(Cursor::new(text), &opts).expect("rewritten CONTROL");
        assert_eq!(second, first);
    }

    #[test]
    fn variable_timestep_roundtrips() {
        let opts = ReadOptions::default();
        let first = reader::read(Cursor::new("t\nvariable timestep 0.0005\nfinish\n"), &opts).unwrap();
        let mut buffer = Vec::new();
        write(&mut buffer, &first).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("variable timestep 0.0005\n"));
        assert!(!text.contains("\ntimestep"));
        assert_eq!(reader::read(Cursor::new(text), &opts).unwrap(), first);
    }

    #[test]
    fn zero_print_frequency_roundtrips() {
        let opts = ReadOptions::default();
        let first = reader::read(Cursor::new("t\nprint 0\nfinish\n"), &opts).unwrap();
        assert_eq!(first.print.record.get_int("printevery").unwrap(), Some(0));

        let mut buffer = Vec::new();
        write(&mut buffer, &first).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\nprint 0\n"));
        assert_eq!(reader::read(Cursor::new(text), &opts).unwrap(), first);
    }

    #[test]
    fn arity_violation_fails_before_writing() {
        let mut control = Control::new(ArityCheck::Deferred);
        control.ensemble.set_ensemble(Ensemble::Nst);
        control.ensemble.set_means(Means::Hoover).unwrap();
        control.ensemble.set_args(["1.0"]).unwrap();

        let mut buffer = Vec::new();
        let err = write(&mut buffer, &control).unwrap_err();
        assert!(matches!(err, Error::Ensemble(_)));
        assert!(buffer.is_empty());
    }
}
