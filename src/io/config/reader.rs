use crate::io::{Format, error::Error, util};
use crate::model::config::{Atom, Config, Level, Pbc};
use std::io::BufRead;

pub fn read<R: BufRead>(reader: R) -> Result<Config, Error> {
    let lines = util::collect_lines(reader)?;
    let mut cursor = 0;

    let (_, title) = util::next_line(&lines, &mut cursor)
        .ok_or_else(|| Error::parse(Format::Config, 1, "missing title line"))?;
    let mut config = Config::new(title);

    let (ln, keys) = util::next_line(&lines, &mut cursor)
        .ok_or_else(|| Error::parse(Format::Config, 2, "missing level and periodic key line"))?;
    let (level, pbc) = parse_keys(ln, keys)?;
    config.level = level;
    config.pbc = pbc;

    if pbc.has_cell() {
        for row in config.cell.iter_mut() {
            let (ln, line) = util::next_line(&lines, &mut cursor).ok_or_else(|| {
                Error::parse(
                    Format::Config,
                    util::last_line_no(&lines),
                    "cell matrix ended early",
                )
            })?;
            *row = util::parse_vector(Format::Config, ln, line)?;
        }
    }

    // Atom records run to the end of file; a blank line also ends them.
    while let Some((ln, header)) = util::next_line(&lines, &mut cursor) {
        if header.is_empty() {
            break;
        }
        let atom = read_atom(&lines, &mut cursor, ln, header, level)?;
        config.atoms.push(atom);
    }

    Ok(config)
}

fn parse_keys(line_no: usize, line: &str) -> Result<(Level, Pbc), Error> {
    let parts = util::tokens(line);
    if parts.len() < 2 {
        return Err(Error::malformed(
            Format::Config,
            line_no,
            "print level and periodic key",
            format!("{} token(s)", parts.len()),
        ));
    }

    let key = |token: &str, what: &str| {
        token.parse::<i64>().map_err(|_| {
            Error::parse(Format::Config, line_no, format!("invalid {} '{}'", what, token))
        })
    };
    let level = Level::try_from(key(parts[0], "print level")?)
        .map_err(|e| Error::parse(Format::Config, line_no, e.to_string()))?;
    let pbc = Pbc::try_from(key(parts[1], "periodic key")?)
        .map_err(|e| Error::parse(Format::Config, line_no, e.to_string()))?;
    Ok((level, pbc))
}

fn read_atom(
    lines: &[util::Line],
    cursor: &mut usize,
    line_no: usize,
    header: &str,
    level: Level,
) -> Result<Atom, Error> {
    let parts = util::tokens(header);
    let [element, index] = parts.as_slice() else {
        return Err(Error::malformed(
            Format::Config,
            line_no,
            "element and index",
            format!("{} token(s)", parts.len()),
        ));
    };
    let index = util::parse_count(Format::Config, line_no, index, "atom index")?;
    let mut atom = Atom::new(*element, index, [0.0; 3]);

    for k in 0..level.vector_lines() {
        let (ln, line) = util::next_line(lines, cursor).ok_or_else(|| {
            Error::parse(
                Format::Config,
                util::last_line_no(lines),
                format!("record for atom {} ended early", index),
            )
        })?;
        let vector = util::parse_vector(Format::Config, ln, line)?;
        match k {
            0 => atom.position = vector,
            1 => atom.velocity = vector,
            _ => atom.forces = vector,
        }
    }
    Ok(atom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
Argon pair in a box
         1         2         2
       10.0000000000        0.0000000000        0.0000000000
        0.0000000000       12.0000000000        0.0000000000
        0.0000000000        0.0000000000       14.0000000000
Ar             1
        1.0000000000        2.0000000000        3.0000000000
        0.1000000000       -0.2000000000        0.3000000000
Ar             2
       -1.0000000000       -2.0000000000       -3.0000000000
        0.0000000000        0.0000000000        0.0000000000
";

    #[test]
    fn reads_cell_and_velocities() {
        let config = read(Cursor::new(SAMPLE)).expect("valid CONFIG");
        assert_eq!(config.title, "Argon pair in a box");
        assert_eq!(config.level, Level::Velocities);
        assert_eq!(config.pbc, Pbc::Orthorhombic);
        assert_eq!(config.cell[1], [0.0, 12.0, 0.0]);
        assert_eq!(config.natoms(), 2);
        assert_eq!(config.atoms[0].velocity, [0.1, -0.2, 0.3]);
        assert_eq!(config.atoms[1].index, 2);
        assert_eq!(config.atoms[1].forces, [0.0; 3]);
    }

    #[test]
    fn unbounded_config_has_no_cell_lines() {
        let input = "gas\n0 0\nHe 1\n0.0 0.0 1.5\n\n";
        let config = read(Cursor::new(input)).unwrap();
        assert_eq!(config.pbc, Pbc::None);
        assert_eq!(config.atoms[0].position, [0.0, 0.0, 1.5]);
    }

    #[test]
    fn invalid_keys_are_parse_errors() {
        assert!(matches!(
            read(Cursor::new("t\n5 0\n")),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(matches!(
            read(Cursor::new("t\n0\n")),
            Err(Error::MalformedRecord { line: 2, .. })
        ));
    }

    #[test]
    fn malformed_atom_records_are_reported() {
        assert!(matches!(
            read(Cursor::new("t\n0 0\nHe 1 extra\n0 0 0\n")),
            Err(Error::MalformedRecord { line: 3, .. })
        ));
        assert!(matches!(
            read(Cursor::new("t\n0 0\nHe 1\n0.0 0.0\n")),
            Err(Error::MalformedRecord { line: 4, .. })
        ));
        assert!(matches!(
            read(Cursor::new("t\n1 0\nHe 1\n0.0 0.0 0.0\n")),
            Err(Error::Parse { .. })
        ));
    }
}
