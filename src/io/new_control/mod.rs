//! Keyed CONTROL files: `key value... [unit]` lines, the first of which is
//! `title`. There is no terminator.

pub mod reader;
pub mod writer;

pub use reader::read;
pub use writer::write;

/// Whether `text` is a keyed CONTROL file: its first line with content,
/// ignoring `#` and `!` comments, starts with the `title` key.
pub fn is_new_control(text: &str) -> bool {
    text.lines()
        .map(|line| {
            let line = line.split_once('#').map_or(line, |(head, _)| head);
            line.split_once('!').map_or(line, |(head, _)| head).trim()
        })
        .find(|line| !line.is_empty())
        .and_then(|line| line.split_whitespace().next())
        .is_some_and(|key| key.eq_ignore_ascii_case("title"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_leading_title_key() {
        assert!(is_new_control("# keyed\n\nTITLE argon\ntime_run 10 steps\n"));
        assert!(is_new_control("! comment\ntitle argon\n"));
        assert!(!is_new_control("argon melt\ntemperature 120.0\nfinish\n"));
        assert!(!is_new_control(""));
    }
}
