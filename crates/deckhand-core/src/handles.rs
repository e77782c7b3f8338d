//! Host-side handles that can be placed into a container

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CoreError, Result};

/// A directory on the host, mounted into containers by reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    path: PathBuf,
}

impl Directory {
    /// Open a host directory, failing if it does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(CoreError::DirectoryNotFound { path });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of an entry relative to this directory
    pub fn join<P: AsRef<Path>>(&self, entry: P) -> PathBuf {
        self.path.join(entry)
    }

    /// Read a file inside this directory
    pub fn file<P: AsRef<Path>>(&self, entry: P) -> Result<File> {
        File::from_path(self.join(entry))
    }
}

/// An in-memory file: a name and its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    name: String,
    contents: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Load a file from the host filesystem
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CoreError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self { name, contents })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Contents as text, replacing invalid UTF-8
    pub fn contents_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    /// Write this file into `dir` under its own name, returning the written path
    pub fn export<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let target = dir.join(&self.name);
        std::fs::write(&target, &self.contents)?;
        Ok(target)
    }
}

/// An opaque credential
///
/// Only a runtime reads the plaintext, to mount it or inject it into an exec
/// step. The `Debug` impl never prints it.
#[derive(Clone)]
pub struct Secret {
    name: String,
    plaintext: Arc<[u8]>,
}

impl Secret {
    pub fn new(name: impl Into<String>, plaintext: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.into(),
            plaintext: Arc::from(plaintext.as_ref()),
        }
    }

    /// Load a secret from a host file; the secret is named after the file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CoreError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let plaintext = std::fs::read(path)?;
        Ok(Self::new(path.display().to_string(), plaintext))
    }

    /// Load a secret from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let value = std::env::var(var).map_err(|_| CoreError::MissingEnvVar {
            name: var.to_string(),
        })?;
        Ok(Self::new(format!("env:{var}"), value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.plaintext.is_empty()
    }

    /// Raw secret bytes, for runtimes only
    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("plaintext", &"***")
            .finish()
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.plaintext == other.plaintext
    }
}

impl Eq for Secret {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("kubeconfig", "apiVersion: v1\ntoken: hunter2");
        let debug = format!("{:?}", secret);

        assert!(debug.contains("kubeconfig"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_secret_empty() {
        assert!(Secret::new("empty", "").is_empty());
        assert!(!Secret::new("full", "x").is_empty());
    }

    #[test]
    fn test_secret_from_missing_file() {
        let err = Secret::from_file("/definitely/not/here/kubeconfig").unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound { .. }));
    }

    #[test]
    fn test_file_from_path_and_export() {
        let src = TempDir::new().unwrap();
        let path = src.path().join("prod.yaml");
        std::fs::write(&path, "replicas: 3\n").unwrap();

        let file = File::from_path(&path).unwrap();
        assert_eq!(file.name(), "prod.yaml");
        assert_eq!(file.contents_str(), "replicas: 3\n");

        let out = TempDir::new().unwrap();
        let written = file.export(out.path().join("nested")).unwrap();
        assert_eq!(std::fs::read_to_string(written).unwrap(), "replicas: 3\n");
    }

    #[test]
    fn test_directory_open_missing() {
        let err = Directory::open("/definitely/not/here").unwrap_err();
        assert!(matches!(err, CoreError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_directory_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Chart.yaml"), "name: app\n").unwrap();

        let handle = Directory::open(dir.path()).unwrap();
        let chart = handle.file("Chart.yaml").unwrap();
        assert_eq!(chart.name(), "Chart.yaml");

        assert!(handle.file("values.yaml").is_err());
    }
}
