use crate::io::{Format, ReadOptions, error::Error, util};
use crate::model::field::{Field, Interaction, InteractionSet, Molecule, PotentialClass, Species};
use log::{debug, warn};
use std::io::BufRead;

type Lines = [util::Line];

pub fn read<R: BufRead>(reader: R, opts: &ReadOptions) -> Result<Field, Error> {
    let lines = util::collect_lines(reader)?;
    let mut cursor = 0;

    let (_, header) = util::next_line(&lines, &mut cursor)
        .ok_or_else(|| Error::parse(Format::Field, 1, "missing header line"))?;
    let mut field = Field {
        header: header.to_string(),
        ..Field::default()
    };

    let (units_ln, units_line) = util::next_data_line(&lines, &mut cursor)
        .ok_or_else(|| Error::parse(Format::Field, 2, "missing units line"))?;
    field.units = parse_units(units_line, units_ln)?;

    loop {
        let Some((ln, line)) = util::next_data_line(&lines, &mut cursor) else {
            if opts.strict {
                return Err(Error::parse(
                    Format::Field,
                    util::last_line_no(&lines),
                    "unexpected end of file before 'close'",
                ));
            }
            warn!("FIELD ended without 'close'");
            break;
        };
        let parts = util::tokens(line);
        let key = parts[0].to_ascii_lowercase();

        if key == "close" {
            break;
        }
        if key.starts_with("molecul") {
            let count = block_count(&parts, ln, None)?;
            debug!("reading {} molecule type(s) from line {}", count, ln);
            for _ in 0..count {
                field.molecules.push(read_molecule(&lines, &mut cursor, opts)?);
            }
        } else if let Some(class) = PotentialClass::from_keyword(&key) {
            let count = block_count(&parts, ln, default_count(class))?;
            read_interactions(&lines, &mut cursor, class, count, &mut field.interactions)?;
        } else {
            skip_block(&lines, &mut cursor, &parts, ln, opts)?;
        }
    }

    Ok(field)
}

fn parse_units(line: &str, line_no: usize) -> Result<String, Error> {
    match util::tokens(line).as_slice() {
        [key, unit, ..] if key.eq_ignore_ascii_case("units") => Ok(unit.to_string()),
        _ => Err(Error::parse(
            Format::Field,
            line_no,
            "expected 'units <name>'",
        )),
    }
}

/// `extern` blocks carry a single potential and may omit the count.
fn default_count(class: PotentialClass) -> Option<usize> {
    (class == PotentialClass::Extern).then_some(1)
}

fn block_count(parts: &[&str], line_no: usize, default: Option<usize>) -> Result<usize, Error> {
    match (parts.last(), default) {
        (Some(token), _) if parts.len() > 1 => {
            util::parse_count(Format::Field, line_no, token, "block count")
        }
        (_, Some(n)) => Ok(n),
        _ => Err(Error::parse(
            Format::Field,
            line_no,
            format!("block '{}' has no count", parts[0]),
        )),
    }
}

fn skip_block(
    lines: &Lines,
    cursor: &mut usize,
    parts: &[&str],
    line_no: usize,
    opts: &ReadOptions,
) -> Result<(), Error> {
    if opts.strict {
        return Err(Error::unrecognized(Format::Field, line_no, parts[0]));
    }
    let count = parts
        .get(1)
        .and_then(|t| t.parse::<usize>().ok())
        .unwrap_or(0);
    warn!(
        "skipping unrecognized FIELD block '{}' ({} line(s)) at line {}",
        parts[0], count, line_no
    );
    for _ in 0..count {
        util::next_data_line(lines, cursor);
    }
    Ok(())
}

fn read_interactions(
    lines: &Lines,
    cursor: &mut usize,
    class: PotentialClass,
    count: usize,
    into: &mut InteractionSet,
) -> Result<(), Error> {
    for i in 0..count {
        let (ln, line) = util::next_data_line(lines, cursor).ok_or_else(|| {
            Error::parse(
                Format::Field,
                util::last_line_no(lines),
                format!("{} block ended after {} of {} entries", class, i, count),
            )
        })?;
        let interaction = Interaction::parse(class, &util::tokens(line))
            .map_err(|e| Error::parse(Format::Field, ln, e.to_string()))?;
        into.insert(interaction);
    }
    Ok(())
}

fn read_molecule(lines: &Lines, cursor: &mut usize, opts: &ReadOptions) -> Result<Molecule, Error> {
    let end = util::last_line_no(lines);
    let (_, name) = util::next_data_line(lines, cursor)
        .ok_or_else(|| Error::parse(Format::Field, end, "missing molecule name"))?;

    let (ln, line) = util::next_data_line(lines, cursor)
        .ok_or_else(|| Error::parse(Format::Field, end, "missing nummols line"))?;
    let replicas = match util::tokens(line).as_slice() {
        [key, n, ..] if key.to_ascii_lowercase().starts_with("nummol") => {
            util::parse_count(Format::Field, ln, n, "molecule count")?
        }
        _ => return Err(Error::parse(Format::Field, ln, "expected 'nummols <n>'")),
    };

    let mut molecule = Molecule::new(name, replicas);
    loop {
        let (ln, line) = util::next_data_line(lines, cursor).ok_or_else(|| {
            Error::parse(
                Format::Field,
                end,
                format!("molecule '{}' has no 'finish'", molecule.name),
            )
        })?;
        let parts = util::tokens(line);
        let key = parts[0].to_ascii_lowercase();

        if key == "finish" {
            break;
        }
        if key == "atoms" || key == "species" {
            let count = block_count(&parts, ln, None)?;
            read_species(lines, cursor, count, &mut molecule)?;
        } else if let Some(class) = PotentialClass::from_keyword(&key) {
            let count = block_count(&parts, ln, default_count(class))?;
            read_interactions(lines, cursor, class, count, &mut molecule.interactions)?;
        } else {
            skip_block(lines, cursor, &parts, ln, opts)?;
        }
    }
    Ok(molecule)
}

/// Reads species lines until `count` atoms are accounted for.
fn read_species(
    lines: &Lines,
    cursor: &mut usize,
    count: usize,
    molecule: &mut Molecule,
) -> Result<(), Error> {
    let mut atoms = 0;
    while atoms < count {
        let (ln, line) = util::next_data_line(lines, cursor).ok_or_else(|| {
            Error::parse(
                Format::Field,
                util::last_line_no(lines),
                format!("atoms block ended after {} of {} atoms", atoms, count),
            )
        })?;
        let parts = util::tokens(line);
        if parts.len() < 3 {
            return Err(Error::malformed(
                Format::Field,
                ln,
                "name mass charge [repeats [frozen]]",
                format!("{} token(s)", parts.len()),
            ));
        }
        let mass = util::parse_float(Format::Field, ln, parts[1], "mass")?;
        let charge = util::parse_float(Format::Field, ln, parts[2], "charge")?;
        let repeats = match parts.get(3) {
            Some(t) => util::parse_count(Format::Field, ln, t, "repeat count")?,
            None => 1,
        };
        if repeats == 0 {
            return Err(Error::parse(Format::Field, ln, "repeat count must be positive"));
        }
        let frozen = match parts.get(4) {
            Some(t) => util::parse_count(Format::Field, ln, t, "frozen flag")? != 0,
            None => false,
        };

        molecule.add_species(
            Species::new(parts[0], mass, charge)
                .with_repeats(repeats)
                .with_frozen(frozen),
        );
        atoms += repeats;
    }
    Ok(())
}
