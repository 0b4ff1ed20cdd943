use crate::io::{Format, error::Error, util};
use crate::model::msd::{Msd, MsdEntry, MsdFrame};
use log::debug;
use std::io::BufRead;

pub fn read<R: BufRead>(reader: R) -> Result<Msd, Error> {
    let lines = util::collect_lines(reader)?;
    let mut cursor = 0;
    let ended = || {
        Error::parse(
            Format::Msd,
            util::last_line_no(&lines),
            "unexpected end of file",
        )
    };

    let (_, title) = util::next_line(&lines, &mut cursor).ok_or_else(ended)?;
    let (ln, counts) = util::next_data_line(&lines, &mut cursor).ok_or_else(ended)?;
    let (n_atoms, n_frames) = match util::tokens(counts).as_slice() {
        [atoms, frames, ..] => (
            util::parse_count(Format::Msd, ln, atoms, "atom count")?,
            util::parse_count(Format::Msd, ln, frames, "frame count")?,
        ),
        other => {
            return Err(Error::malformed(
                Format::Msd,
                ln,
                "atom and frame counts",
                format!("{} token(s)", other.len()),
            ));
        }
    };

    let mut msd = Msd {
        title: title.to_string(),
        n_atoms,
        frames: Vec::new(),
    };

    for _ in 0..n_frames {
        let (ln, header) = util::next_data_line(&lines, &mut cursor).ok_or_else(ended)?;
        let mut frame = read_frame_header(ln, header)?;

        for _ in 0..n_atoms {
            let (ln, line) = util::next_data_line(&lines, &mut cursor).ok_or_else(ended)?;
            let parts = util::tokens(line);
            let [species, index, root_msd, temperature] = parts.as_slice() else {
                return Err(Error::malformed(
                    Format::Msd,
                    ln,
                    "species index msd temperature",
                    format!("{} token(s)", parts.len()),
                ));
            };
            frame.entries.push(MsdEntry {
                species: species.to_string(),
                index: util::parse_count(Format::Msd, ln, index, "atom index")?,
                root_msd: util::parse_float(Format::Msd, ln, root_msd, "displacement")?,
                temperature: util::parse_float(Format::Msd, ln, temperature, "temperature")?,
            });
        }
        msd.frames.push(frame);
    }

    debug!("read {} MSD frames of {} atoms", msd.n_frames(), n_atoms);
    Ok(msd)
}

/// `timestep <step> <atoms> <dt> <time>`
fn read_frame_header(line_no: usize, line: &str) -> Result<MsdFrame, Error> {
    let parts = util::tokens(line);
    let [_, step, _, dt, time, ..] = parts.as_slice() else {
        return Err(Error::malformed(
            Format::Msd,
            line_no,
            "timestep step atoms dt time",
            format!("{} token(s)", parts.len()),
        ));
    };
    let step = step.parse::<u64>().map_err(|_| {
        Error::parse(Format::Msd, line_no, format!("invalid step '{}'", step))
    })?;
    Ok(MsdFrame {
        step,
        timestep: util::parse_float(Format::Msd, line_no, dt, "timestep")?,
        time: util::parse_float(Format::Msd, line_no, time, "time")?,
        entries: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
NaCl melt
         3         2         4
timestep         0         3  1.000000E-03  0.000000E+00
Na               1  0.000000E+00  0.000000E+00
Cl               2  0.000000E+00  0.000000E+00
Na               3  0.000000E+00  0.000000E+00
timestep       100         3  1.000000E-03  1.000000E-01
Na               1  2.000000E+00  1.200000E+03
Cl               2  1.000000E+00  1.100000E+03
Na               3  4.000000E+00  1.000000E+03
";

    #[test]
    fn reads_frames_and_entries() {
        let msd = read(Cursor::new(SAMPLE)).expect("valid MSDTMP");
        assert_eq!(msd.title, "NaCl melt");
        assert_eq!(msd.n_atoms, 3);
        assert_eq!(msd.n_frames(), 2);

        let last = &msd.frames[1];
        assert_eq!(last.step, 100);
        assert_eq!(last.timestep, 0.001);
        assert_eq!(last.time, 0.1);
        assert_eq!(last.entries[2].msd(), 16.0);
        assert_eq!(msd.species(), vec!["Cl", "Na"]);

        let averages = msd.per_species();
        assert_eq!(averages[1]["Na"], (10.0, 1100.0));
        assert_eq!(averages[1]["Cl"], (1.0, 1100.0));
    }

    #[test]
    fn short_entry_lines_are_malformed() {
        let input = "t\n1 1\ntimestep 0 1 0.001 0.0\nNa 1 0.0\n";
        assert!(matches!(
            read(Cursor::new(input)),
            Err(Error::MalformedRecord { line: 4, .. })
        ));
        assert!(read(Cursor::new("t\n1 2\ntimestep 0 1 0.001 0.0\nNa 1 0.0 0.0\n")).is_err());
    }

    #[test]
    fn oversized_counts_end_as_truncation() {
        assert!(matches!(
            read(Cursor::new("t\n1 1000000000000000000\n")),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            read(Cursor::new("t\n1000000000000000000 1\ntimestep 0 1 0.001 0.0\nNa 1 0.0 0.0\n")),
            Err(Error::Parse { line: 4, .. })
        ));
    }
}
