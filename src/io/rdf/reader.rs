use crate::io::{Format, error::Error, util};
use crate::model::rdf::{Rdf, RdfPair};
use std::io::BufRead;

pub fn read<R: BufRead>(reader: R) -> Result<Rdf, Error> {
    let lines = util::collect_lines(reader)?;
    let mut cursor = 0;
    let ended = || {
        Error::parse(
            Format::Rdf,
            util::last_line_no(&lines),
            "unexpected end of file",
        )
    };

    let (_, title) = util::next_line(&lines, &mut cursor).ok_or_else(ended)?;
    let (ln, counts) = util::next_data_line(&lines, &mut cursor).ok_or_else(ended)?;
    let (n_rdf, points) = match util::tokens(counts).as_slice() {
        [n_rdf, points, ..] => (
            util::parse_count(Format::Rdf, ln, n_rdf, "pair count")?,
            util::parse_count(Format::Rdf, ln, points, "point count")?,
        ),
        other => {
            return Err(Error::malformed(
                Format::Rdf,
                ln,
                "pair and point counts",
                format!("{} token(s)", other.len()),
            ));
        }
    };

    let mut rdf = Rdf {
        title: title.to_string(),
        points,
        pairs: Vec::new(),
    };

    for _ in 0..n_rdf {
        let (ln, label) = util::next_data_line(&lines, &mut cursor).ok_or_else(ended)?;
        let species = match util::tokens(label).as_slice() {
            [a, b] => (a.to_string(), b.to_string()),
            other => {
                return Err(Error::malformed(
                    Format::Rdf,
                    ln,
                    "two species labels",
                    format!("{} token(s)", other.len()),
                ));
            }
        };

        let mut samples = Vec::new();
        for _ in 0..points {
            let (ln, line) = util::next_data_line(&lines, &mut cursor).ok_or_else(ended)?;
            let parts = util::tokens(line);
            let [r, g] = parts.as_slice() else {
                return Err(Error::malformed(
                    Format::Rdf,
                    ln,
                    "r and g(r)",
                    format!("{} token(s)", parts.len()),
                ));
            };
            samples.push((
                util::parse_float(Format::Rdf, ln, r, "radius")?,
                util::parse_float(Format::Rdf, ln, g, "g(r)")?,
            ));
        }
        rdf.pairs.push(RdfPair { species, samples });
    }

    Ok(rdf)
}
