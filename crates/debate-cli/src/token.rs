//! Token file credential store.

use std::{fs, path::PathBuf};

use debate_client::CredentialStore;

/// Reads the bearer token from a file at every connect.
///
/// Surrounding whitespace is trimmed. A missing, unreadable or empty file
/// means no token. Rewriting the file between attempts is enough to refresh
/// credentials.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    /// Read from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileToken {
    fn bearer_token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents.trim().to_owned()).filter(|t| !t.is_empty()),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "cannot read token file");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn token_is_trimmed_and_reread() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  first-token  ").unwrap();
        let store = FileToken::new(file.path());

        assert_eq!(store.bearer_token().as_deref(), Some("first-token"));

        fs::write(file.path(), "second-token\n").unwrap();
        assert_eq!(store.bearer_token().as_deref(), Some("second-token"));
    }

    #[test]
    fn empty_or_missing_file_has_no_token() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(FileToken::new(file.path()).bearer_token(), None);

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(FileToken::new(dir.path().join("absent")).bearer_token(), None);
    }
}
