use crate::io::error::Error;
use crate::model::new_control::NewControl;
use std::io::Write;

/// Writes a keyed CONTROL file, title first and then every set key in
/// declaration order.
pub fn write<W: Write>(mut writer: W, control: &NewControl) -> Result<(), Error> {
    for line in control.directives() {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}
