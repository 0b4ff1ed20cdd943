use crate::io::error::Error;
use crate::model::config::Config;
use std::io::Write;

pub fn write<W: Write>(mut writer: W, config: &Config) -> Result<(), Error> {
    writeln!(writer, "{:<72}", config.title)?;
    writeln!(
        writer,
        "{:>10}{:>10}{:>10}",
        config.level.key(),
        config.pbc.key(),
        config.natoms()
    )?;

    if config.pbc.has_cell() {
        for row in &config.cell {
            write_vector(&mut writer, row)?;
        }
    }

    for atom in &config.atoms {
        writeln!(writer, "{:<8}{:>10}", atom.element, atom.index)?;
        let vectors = [&atom.position, &atom.velocity, &atom.forces];
        for vector in vectors.into_iter().take(config.level.vector_lines()) {
            write_vector(&mut writer, vector)?;
        }
    }
    Ok(())
}

fn write_vector<W: Write>(writer: &mut W, v: &[f64; 3]) -> Result<(), Error> {
    writeln!(writer, "{:>20.10}{:>20.10}{:>20.10}", v[0], v[1], v[2])?;
    Ok(())
}
