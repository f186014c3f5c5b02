use crate::load::LoadError;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub fn open_readable(path: impl AsRef<Path>) -> Result<BufReader<File>, LoadError> {
    let path = path.as_ref();
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) => {
            log::debug!("Unable to open {} for reading: {}", path.display(), e);
            Err(LoadError::FileNotFound(path.to_path_buf()))
        }
    }
}

pub fn open_writable(path: impl AsRef<Path>) -> Result<BufWriter<File>, LoadError> {
    let path = path.as_ref();
    match File::create(path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(e) => {
            log::debug!("Unable to open {} for writing: {}", path.display(), e);
            Err(LoadError::FileNotWritable(path.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_unwritable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(open_readable(&missing), Err(LoadError::FileNotFound(p)) if p == missing));
        let unwritable = dir.path().join("no_such_dir").join("out.json");
        assert!(matches!(open_writable(&unwritable), Err(LoadError::FileNotWritable(_))));
        assert!(open_writable(&missing).is_ok());
        assert!(open_readable(&missing).is_ok());
    }
}
