use crate::io::error::Error;
use crate::model::field::{Field, InteractionSet, Molecule};
use crate::model::value::format_real;
use std::io::Write;

pub fn write<W: Write>(mut writer: W, field: &Field) -> Result<(), Error> {
    writeln!(writer, "{}", field.header.trim())?;
    writeln!(writer, "units {}", field.units)?;

    if !field.molecules.is_empty() {
        writeln!(writer, "molecules {}", field.molecules.len())?;
        for molecule in &field.molecules {
            write_molecule(&mut writer, molecule)?;
        }
    }

    write_blocks(&mut writer, &field.interactions)?;
    writeln!(writer, "close")?;
    Ok(())
}

fn write_molecule<W: Write>(writer: &mut W, molecule: &Molecule) -> Result<(), Error> {
    writeln!(writer, "{}", molecule.name)?;
    writeln!(writer, "nummols {}", molecule.replicas)?;
    writeln!(writer, "atoms {}", molecule.n_atoms())?;
    for species in molecule.species.values() {
        writeln!(
            writer,
            "{:<8} {} {} {} {}",
            species.element,
            format_real(species.mass),
            format_real(species.charge),
            species.repeats,
            u8::from(species.frozen)
        )?;
    }
    write_blocks(writer, &molecule.interactions)?;
    writeln!(writer, "finish")?;
    Ok(())
}

fn write_blocks<W: Write>(writer: &mut W, set: &InteractionSet) -> Result<(), Error> {
    for class in set.classes() {
        let members: Vec<_> = set.iter().filter(|i| i.class == class).collect();
        writeln!(writer, "{} {}", class, members.len())?;
        for interaction in members {
            writeln!(writer, "{}", interaction)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ReadOptions;
    use crate::io::field::read;
    use crate::model::field::{Interaction, PotentialClass, Species};
    use std::io::Cursor;

    fn sample() -> Field {
        let mut water = Molecule::new("water", 64);
        water.add_species(Species::new("OW", 15.9994, -0.8476));
        water.add_species(Species::new("HW", 1.008, 0.4238).with_repeats(2));
        for atoms in [["1", "2"], ["1", "3"]] {
            water.interactions.insert(Interaction::new(
                PotentialClass::Constraints,
                "",
                &atoms,
                vec![1.0],
            ));
        }

        let mut field = Field::new("SPC/E water", "kJ");
        field.molecules.push(water);
        field.interactions.insert(Interaction::new(
            PotentialClass::Vdw,
            "lj",
            &["OW", "OW"],
            vec![0.650, 3.166],
        ));
        field
    }

    #[test]
    fn writes_molecule_and_potential_blocks() {
        let mut buffer = Vec::new();
        write(&mut buffer, &sample()).expect("write should succeed");
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "SPC/E water");
        assert_eq!(lines[1], "units kJ");
        assert_eq!(lines[2], "molecules 1");
        assert_eq!(lines[5], "atoms 3");
        assert_eq!(lines[7], "HW       1.008 0.4238 2 0");
        assert_eq!(lines[8], "constraints 2");
        assert_eq!(lines[9], "1 2 1.0");
        assert_eq!(lines[11], "finish");
        assert_eq!(lines[12], "vdw 1");
        assert_eq!(lines[13], "OW OW lj 0.65 3.166");
        assert_eq!(lines.last(), Some(&"close"));
    }

    #[test]
    fn written_field_reads_back_equal() {
        let field = sample();
        let mut buffer = Vec::new();
        write(&mut buffer, &field).unwrap();
        let back = read(Cursor::new(buffer), &ReadOptions::default()).expect("re-read");
        assert_eq!(back, field);
    }
}
