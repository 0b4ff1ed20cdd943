use crate::io::{Format, error::Error, util};
use crate::model::config::Config;
use crate::model::control::Control;
use crate::model::statis::{LEADING_LABELS, Statis, StatisLayout};
use log::debug;
use serde::Deserialize;
use std::io::BufRead;

const HEADER_LINES: usize = 2;
const YAML_DIRECTIVE: &str = "%YAML";

/// Reads a STATIS stream and labels its columns.
///
/// Each record is `step time n` followed by `n` quantities, so the third
/// number of the stream fixes the row width for the whole file. A stream
/// opening with a `%YAML` directive is read as a YAML document instead, and
/// keeps the labels it carries.
pub fn read<R: BufRead>(
    reader: R,
    control: Option<&Control>,
    config: Option<&Config>,
) -> Result<Statis, Error> {
    let lines = util::collect_lines(reader)?;

    let is_yaml = lines
        .first()
        .and_then(|(_, line)| line.split_whitespace().next())
        .is_some_and(|word| word == YAML_DIRECTIVE);
    if is_yaml {
        return read_yaml(&lines);
    }

    let mut data = Vec::new();
    for (ln, line) in lines.iter().skip(HEADER_LINES) {
        for token in util::tokens(line) {
            data.push(util::parse_float(Format::Statis, *ln, token, "value")?);
        }
    }

    if data.is_empty() {
        debug!("STATIS holds no records");
        return Ok(Statis::default());
    }

    // A count larger than the whole stream can never form a record.
    let declared = match data.get(2) {
        Some(&n) if n >= 0.0 && n.fract() == 0.0 && n <= data.len() as f64 => n as usize,
        Some(&n) => {
            return Err(Error::parse(
                Format::Statis,
                HEADER_LINES + 1,
                format!("invalid entry count {}", n),
            ));
        }
        None => {
            return Err(Error::parse(
                Format::Statis,
                util::last_line_no(&lines),
                "first record is missing its entry count",
            ));
        }
    };

    let columns = declared + LEADING_LABELS.len();
    if data.len() % columns != 0 {
        return Err(Error::parse(
            Format::Statis,
            util::last_line_no(&lines),
            format!(
                "{} values do not form whole records of {} columns",
                data.len(),
                columns
            ),
        ));
    }

    let mut statis = Statis {
        rows: data.len() / columns,
        columns,
        data,
        labels: Vec::new(),
        layout: StatisLayout::Plain,
    };
    debug!("read {} STATIS records of {} quantities", statis.rows, declared);
    statis.label_columns(control, config);
    Ok(statis)
}

#[derive(Debug, Deserialize)]
struct YamlStatis {
    #[serde(default)]
    labels: Vec<Vec<String>>,
    #[serde(default)]
    timesteps: Vec<Vec<f64>>,
}

fn read_yaml(lines: &[util::Line]) -> Result<Statis, Error> {
    // Directive lines are dropped; the document starts at `---`.
    let body: Vec<&str> = lines
        .iter()
        .skip_while(|(_, line)| line.trim_start().starts_with('%'))
        .map(|(_, line)| line.as_str())
        .collect();
    let skipped = lines.len() - body.len();

    let document: YamlStatis = serde_yaml::from_str(&body.join("\n")).map_err(|e| {
        let line = e.location().map_or(skipped + 1, |at| at.line() + skipped);
        Error::parse(Format::Statis, line, e.to_string())
    })?;

    let labels = document.labels.into_iter().next().unwrap_or_default();
    if labels.is_empty() {
        return Err(Error::parse(
            Format::Statis,
            util::last_line_no(lines),
            "YAML document has no labels",
        ));
    }

    let columns = labels.len();
    let mut data = Vec::with_capacity(document.timesteps.len() * columns);
    for (row, values) in document.timesteps.iter().enumerate() {
        if values.len() != columns {
            return Err(Error::parse(
                Format::Statis,
                util::last_line_no(lines),
                format!(
                    "timestep {} has {} values for {} labels",
                    row + 1,
                    values.len(),
                    columns
                ),
            ));
        }
        data.extend_from_slice(values);
    }

    debug!("read {} YAML STATIS records of {} columns", document.timesteps.len(), columns);
    Ok(Statis {
        rows: document.timesteps.len(),
        columns,
        data,
        labels,
        layout: StatisLayout::Yaml,
    })
}
