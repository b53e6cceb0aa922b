use crate::automaton::Automaton;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TEMP_PREFIX: &str = ".multireplace";

#[derive(Error, Debug)]
pub enum FileError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FileError {
    pub fn path(&self) -> &Path {
        match self {
            FileError::Io { path, .. } | FileError::Persist { path, .. } => path,
        }
    }

    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| FileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Automaton {
    /// Rewrite a file in place.
    ///
    /// Output goes to a temporary file in the same directory. If anything
    /// changed it is fsynced, given the original's permissions and renamed
    /// over the original; otherwise it is removed and the original is left
    /// untouched. Returns whether the file was rewritten.
    pub fn transform_file(&self, path: impl AsRef<Path>) -> Result<bool, FileError> {
        let path = path.as_ref();
        let source = fs::File::open(path).map_err(FileError::io(path))?;
        let permissions = source
            .metadata()
            .map_err(FileError::io(path))?
            .permissions();

        // Same directory as the target so the rename stays on one filesystem.
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent)
            .map_err(FileError::io(path))?;

        let mut writer = BufWriter::new(temp);
        let changed = self
            .transform(BufReader::new(source), &mut writer)
            .map_err(FileError::io(path))?;
        writer.flush().map_err(FileError::io(path))?;

        if !changed {
            tracing::debug!(path = %path.display(), "unchanged");
            return Ok(false);
        }

        let temp = writer
            .into_inner()
            .map_err(|err| FileError::io(path)(err.into_error()))?;
        temp.as_file().sync_all().map_err(FileError::io(path))?;
        fs::set_permissions(temp.path(), permissions).map_err(FileError::io(path))?;

        temp.persist(path).map_err(|err| FileError::Persist {
            path: path.to_path_buf(),
            source: err.error,
        })?;

        tracing::debug!(path = %path.display(), "converted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_transform_file_rewrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("input.txt");
        fs::write(&file_path, "hello world\n").unwrap();

        let automaton = compile([("hello", "hi")]).unwrap();
        assert!(automaton.transform_file(&file_path).unwrap());

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "hi world\n");
        assert_eq!(entries(temp_dir.path()), vec!["input.txt"]);
    }

    #[test]
    fn test_unchanged_file_left_alone() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("input.txt");
        fs::write(&file_path, "nothing to see").unwrap();
        let before = fs::metadata(&file_path).unwrap().modified().unwrap();

        let automaton = compile([("xyz", "abc")]).unwrap();
        assert!(!automaton.transform_file(&file_path).unwrap());

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "nothing to see");
        assert_eq!(fs::metadata(&file_path).unwrap().modified().unwrap(), before);
        assert_eq!(entries(temp_dir.path()), vec!["input.txt"]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("missing.txt");

        let automaton = compile([("a", "b")]).unwrap();
        let err = automaton.transform_file(&file_path).unwrap_err();
        assert!(matches!(err, FileError::Io { .. }));
        assert_eq!(err.path(), file_path);
        assert!(err.to_string().contains("missing.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("script.sh");
        fs::write(&file_path, "echo colour\n").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o754)).unwrap();

        let automaton = compile([("colour", "color")]).unwrap();
        assert!(automaton.transform_file(&file_path).unwrap());

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "echo color\n");
        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o754);
    }
}
