use crate::io::error::Error;
use crate::model::statis::Statis;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one `time value` file per quantity column into `dir`, named after
/// the column label. Returns the paths written, in column order.
pub fn flatten(statis: &Statis, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let dir = dir.as_ref();
    let mut written = Vec::with_capacity(statis.quantities());

    for column in statis.layout.leading_columns()..statis.columns {
        let label = statis
            .labels
            .get(column)
            .cloned()
            .unwrap_or_else(|| format!("col_{}", column + 1));
        let path = dir.join(file_name(&label));

        let mut writer = BufWriter::new(File::create(&path)?);
        for (time, value) in statis.column(1).zip(statis.column(column)) {
            writeln!(writer, "{} {}", time, value)?;
        }
        writer.flush()?;
        written.push(path);
    }

    debug!("flattened {} STATIS columns into {}", written.len(), dir.display());
    Ok(written)
}

fn file_name(label: &str) -> String {
    label.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::statis::StatisLayout;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn one_file_per_quantity() {
        let mut statis = Statis {
            rows: 2,
            columns: 5,
            data: vec![0.0, 0.0, 2.0, -10.5, 300.0, 10.0, 0.01, 2.0, -11.0, 301.5],
            ..Statis::default()
        };
        statis.label_columns(None, None);

        let dir = tempdir().expect("tempdir");
        let paths = flatten(&statis, dir.path()).expect("flatten should succeed");
        assert_eq!(paths.len(), 2);
        assert_eq!(
            paths[1].file_name().and_then(|n| n.to_str()),
            Some("1-2 System Temperature")
        );

        let energy = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(energy, "0 -10.5\n0.01 -11\n");
    }

    #[test]
    fn yaml_layout_skips_only_step_and_time() {
        let statis = Statis {
            rows: 1,
            columns: 3,
            data: vec![5.0, 0.5, 42.0],
            labels: vec!["step".into(), "time".into(), "engcns".into()],
            layout: StatisLayout::Yaml,
        };

        let dir = tempdir().expect("tempdir");
        let paths = flatten(&statis, dir.path()).expect("flatten should succeed");
        assert_eq!(paths.len(), 1);
        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "0.5 42\n");
    }

    #[test]
    fn separators_in_labels_are_replaced() {
        assert_eq!(file_name("11-1 vol/h_z"), "11-1 vol_h_z");
    }
}
