//! Declarative container description
//!
//! A `Container` records what should run, not how: the base image, what is
//! mounted where, the environment, and an ordered list of exec steps. Nothing
//! executes until a [`ContainerRuntime`](crate::ContainerRuntime) is asked for
//! the container's stdout or one of its files. Builder methods consume `self`,
//! so a configured base can be cloned and extended per call without sharing
//! state.

use std::collections::BTreeMap;

use crate::handles::{Directory, File, Secret};

/// Something placed into the container filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSource {
    Directory(Directory),
    File(File),
    Secret(Secret),
}

/// A mount at an absolute path inside the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub path: String,
    pub source: MountSource,
}

/// Per-step execution options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Write the step's stdout to this container path instead of capturing it
    pub redirect_stdout: Option<String>,

    /// Prefix the arguments with the container entrypoint
    pub use_entrypoint: bool,
}

/// One command to run inside the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecStep {
    pub args: Vec<String>,
    pub options: ExecOptions,
}

impl ExecStep {
    /// The full argument vector, with the entrypoint applied when requested
    pub fn command_line(&self, entrypoint: &[String]) -> Vec<String> {
        if self.options.use_entrypoint {
            entrypoint.iter().chain(self.args.iter()).cloned().collect()
        } else {
            self.args.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    image: String,
    user: Option<String>,
    workdir: Option<String>,
    env: BTreeMap<String, String>,
    removed_env: Vec<String>,
    secret_env: BTreeMap<String, Secret>,
    mounts: Vec<Mount>,
    entrypoint: Vec<String>,
    steps: Vec<ExecStep>,
}

impl Container {
    /// Start a container description from a base image reference
    pub fn from(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            user: None,
            workdir: None,
            env: BTreeMap::new(),
            removed_env: Vec::new(),
            secret_env: BTreeMap::new(),
            mounts: Vec::new(),
            entrypoint: Vec::new(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_workdir(mut self, path: impl Into<String>) -> Self {
        self.workdir = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_env_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.removed_env.retain(|n| n != &name);
        self.secret_env.remove(&name);
        self.env.insert(name, value.into());
        self
    }

    /// Remove a variable, including one inherited from the image
    #[must_use]
    pub fn without_env_variable(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.env.remove(&name);
        self.secret_env.remove(&name);
        if !self.removed_env.contains(&name) {
            self.removed_env.push(name);
        }
        self
    }

    /// Expose a secret as an environment variable
    #[must_use]
    pub fn with_secret_variable(mut self, name: impl Into<String>, secret: Secret) -> Self {
        let name = name.into();
        self.removed_env.retain(|n| n != &name);
        self.env.remove(&name);
        self.secret_env.insert(name, secret);
        self
    }

    #[must_use]
    pub fn with_mounted_secret(self, path: impl Into<String>, secret: Secret) -> Self {
        self.with_mount(path, MountSource::Secret(secret))
    }

    #[must_use]
    pub fn with_mounted_directory(self, path: impl Into<String>, dir: Directory) -> Self {
        self.with_mount(path, MountSource::Directory(dir))
    }

    /// Place a file at `path`
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, file: File) -> Self {
        self.with_mount(path, MountSource::File(file))
    }

    fn with_mount(mut self, path: impl Into<String>, source: MountSource) -> Self {
        let path = path.into();
        // A later mount at the same path replaces the earlier one.
        self.mounts.retain(|m| m.path != path);
        self.mounts.push(Mount { path, source });
        self
    }

    #[must_use]
    pub fn with_entrypoint<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append an exec step run without the entrypoint
    #[must_use]
    pub fn with_exec<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_exec_opts(args, ExecOptions::default())
    }

    #[must_use]
    pub fn with_exec_opts<I, S>(mut self, args: I, options: ExecOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(ExecStep {
            args: args.into_iter().map(Into::into).collect(),
            options,
        });
        self
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn workdir(&self) -> Option<&str> {
        self.workdir.as_deref()
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn removed_env(&self) -> &[String] {
        &self.removed_env
    }

    pub fn secret_env(&self) -> &BTreeMap<String, Secret> {
        &self.secret_env
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// The mount at an exact container path, if any
    pub fn mount_at(&self, path: &str) -> Option<&Mount> {
        self.mounts.iter().find(|m| m.path == path)
    }

    pub fn entrypoint(&self) -> &[String] {
        &self.entrypoint
    }

    pub fn steps(&self) -> &[ExecStep] {
        &self.steps
    }

    pub fn last_step(&self) -> Option<&ExecStep> {
        self.steps.last()
    }
}
