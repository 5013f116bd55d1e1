//! Kernel source loading and macro injection.

use std::fs;
use std::io;
use std::path::Path;

use kernelrun_core::error::{Result, RuntimeError};

/// Load the source unit named `name` from `<dir>/<name>.cl`.
pub(crate) fn load(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(format!("{}.cl", name));
    match fs::read_to_string(&path) {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(RuntimeError::FileNotFound(path)),
        Err(e) => Err(e.into()),
    }
}

/// Prepend one `#define` line per macro entry.
///
/// Each entry is inserted at the front of the source in turn, so the
/// supplied list ends up in reverse order at the top of the unit.
pub(crate) fn inject_macros(source: &mut String, macros: &[&str]) {
    for m in macros {
        source.insert_str(0, &format!("#define {}\n", m));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_macros_reverses_order() {
        let mut source = String::from("body\n");
        inject_macros(&mut source, &["A 1", "B 2", "C 3"]);
        assert_eq!(source, "#define C 3\n#define B 2\n#define A 1\nbody\n");
    }

    #[test]
    fn test_inject_no_macros() {
        let mut source = String::from("body\n");
        inject_macros(&mut source, &[]);
        assert_eq!(source, "body\n");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path(), "ghost").err().unwrap();
        match err {
            RuntimeError::FileNotFound(path) => {
                assert!(path.ends_with("ghost.cl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_reads_unit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unit.cl"), "__kernel void noop() {}").unwrap();
        let source = load(dir.path(), "unit").unwrap();
        assert!(source.contains("noop"));
    }
}
