//! Runtime backed by the local `docker` CLI
//!
//! Each call gets a fresh container:
//! 1. mounts are staged into a scratch directory and bind-mounted, so nothing
//!    a step writes ever reaches the caller's own files
//! 2. the image is started detached, under a generated name, with
//!    `sleep infinity` as its command
//! 3. every exec step runs through `docker exec`
//! 4. the container is force-removed, whatever the outcome, including when
//!    the call's future is dropped before it completes

use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::ContainerRuntime;
use crate::container::{Container, MountSource};
use crate::error::RuntimeError;
use crate::handles::File;

const DEFAULT_BINARY: &str = "docker";

#[derive(Debug, Clone)]
pub struct DockerRuntime {
    binary: PathBuf,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Host-side copies of a container's mounts
struct Staging {
    // Held so the scratch directory outlives the container.
    _scratch: TempDir,
    /// Container name, unique per call
    name: String,
    binds: Vec<String>,
}

/// Force-removes a container unless disarmed
///
/// Covers the paths where the async cleanup never runs: the caller's future
/// dropped on timeout, cancellation, or shutdown.
struct ContainerGuard {
    binary: PathBuf,
    name: String,
    armed: bool,
}

impl ContainerGuard {
    fn new(binary: &Path, name: &str) -> Self {
        Self {
            binary: binary.to_path_buf(),
            name: name.to_string(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!(container = %self.name, "Call abandoned, removing container");
        let status = std::process::Command::new(&self.binary)
            .args(["rm", "-f", self.name.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(container = %self.name, %status, "Failed to remove container"),
            Err(err) => warn!(container = %self.name, error = %err, "Failed to remove container"),
        }
    }
}

/// What a finished run produced
struct Execution {
    stdout: Vec<u8>,
    fetched: Option<File>,
}

impl DockerRuntime {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
        }
    }

    /// Use a specific docker-compatible binary (docker, podman, nerdctl)
    #[must_use]
    pub fn with_binary<P: Into<PathBuf>>(mut self, binary: P) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Copy every mount into a scratch directory and build `-v` specs for it
    fn stage(container: &Container) -> Result<Staging, RuntimeError> {
        let scratch = tempfile::Builder::new()
            .prefix("deckhand-")
            .tempdir()
            .map_err(|source| RuntimeError::Staging {
                what: "scratch directory".to_string(),
                source,
            })?;

        let name = scratch
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deckhand".to_string());

        let mut binds = Vec::with_capacity(container.mounts().len());
        for (idx, mount) in container.mounts().iter().enumerate() {
            let host = scratch.path().join(format!("mount-{idx}"));
            let staging_err = |source| RuntimeError::Staging {
                what: mount.path.clone(),
                source,
            };

            let spec = match &mount.source {
                MountSource::Directory(dir) => {
                    copy_tree(dir.path(), &host).map_err(staging_err)?;
                    format!("{}:{}", host.display(), mount.path)
                }
                MountSource::File(file) => {
                    std::fs::write(&host, file.contents()).map_err(staging_err)?;
                    format!("{}:{}", host.display(), mount.path)
                }
                MountSource::Secret(secret) => {
                    write_private(&host, secret.plaintext()).map_err(staging_err)?;
                    format!("{}:{}:ro", host.display(), mount.path)
                }
            };
            binds.push(spec);
        }

        Ok(Staging {
            _scratch: scratch,
            name,
            binds,
        })
    }

    /// Arguments for starting the long-lived container
    fn run_args(container: &Container, name: &str, binds: &[String]) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "-d".into(),
            "--rm".into(),
            "--name".into(),
            name.to_string(),
            "--entrypoint".into(),
            "sleep".into(),
        ];
        for bind in binds {
            args.push("-v".into());
            args.push(bind.clone());
        }
        args.push(container.image().to_string());
        args.push("infinity".into());
        args
    }

    /// Arguments for one `docker exec`, secrets referenced by name only
    fn exec_args(id: &str, container: &Container, command: &[String]) -> Vec<String> {
        let mut args: Vec<String> = vec!["exec".into()];

        if let Some(user) = container.user() {
            args.push("-u".into());
            args.push(user.to_string());
        }
        if let Some(workdir) = container.workdir() {
            args.push("-w".into());
            args.push(workdir.to_string());
        }
        for (name, value) in container.env() {
            args.push("-e".into());
            args.push(format!("{name}={value}"));
        }
        for name in container.secret_env().keys() {
            args.push("-e".into());
            args.push(name.clone());
        }

        args.push(id.to_string());

        if !container.removed_env().is_empty() {
            args.push("env".into());
            for name in container.removed_env() {
                args.push("-u".into());
                args.push(name.clone());
            }
        }

        args.extend(command.iter().cloned());
        args
    }

    async fn docker(
        &self,
        args: &[String],
        container: Option<&Container>,
    ) -> Result<Output, RuntimeError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).kill_on_drop(true);

        // `-e NAME` without a value makes docker read it from its own environment.
        if let Some(container) = container {
            for (name, secret) in container.secret_env() {
                cmd.env(name, env_value(secret.plaintext()));
            }
        }

        cmd.output().await.map_err(|source| RuntimeError::Spawn {
            command: self.binary.display().to_string(),
            source,
        })
    }

    async fn engine(&self, operation: &str, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        let output = self.docker(args, None).await?;
        if !output.status.success() {
            return Err(RuntimeError::Engine {
                operation: operation.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    async fn execute(
        &self,
        container: &Container,
        fetch: Option<&str>,
    ) -> Result<Execution, RuntimeError> {
        let staging = Self::stage(container)?;
        let name = staging.name.as_str();

        let run_args = Self::run_args(container, name, &staging.binds);
        debug!(image = %container.image(), ?run_args, "Starting container");

        // Armed before `run` so a call dropped mid-start still cleans up.
        let guard = ContainerGuard::new(&self.binary, name);
        if let Err(err) = self.engine("run", &run_args).await {
            guard.disarm();
            return Err(err);
        }

        let outcome = self.drive(name, container, fetch).await;

        if let Err(err) = self
            .engine("rm", &["rm".into(), "-f".into(), name.to_string()])
            .await
        {
            warn!(container = %name, error = %err, "Failed to remove container");
        }
        guard.disarm();

        outcome
    }

    async fn drive(
        &self,
        id: &str,
        container: &Container,
        fetch: Option<&str>,
    ) -> Result<Execution, RuntimeError> {
        let mut redirects: HashMap<&str, Vec<u8>> = HashMap::new();
        let mut last_stdout = Vec::new();

        for step in container.steps() {
            let command = step.command_line(container.entrypoint());
            info!(container = %id, command = %command.join(" "), "Running step");

            let args = Self::exec_args(id, container, &command);
            let output = self.docker(&args, Some(container)).await?;

            if !output.status.success() {
                return Err(RuntimeError::ExecFailed {
                    args: command,
                    exit_code: output.status.code(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                });
            }

            match &step.options.redirect_stdout {
                Some(path) => {
                    redirects.insert(path.as_str(), output.stdout);
                    last_stdout = Vec::new();
                }
                None => last_stdout = output.stdout,
            }
        }

        let fetched = match fetch {
            None => None,
            Some(path) => Some(match redirects.remove(path) {
                Some(bytes) => File::new(file_name(path), bytes),
                None => self.copy_out(id, path).await?,
            }),
        };

        Ok(Execution {
            stdout: last_stdout,
            fetched,
        })
    }

    /// Read a single file out of a running container via `docker cp`
    async fn copy_out(&self, id: &str, path: &str) -> Result<File, RuntimeError> {
        let archive = self
            .engine("cp", &["cp".into(), format!("{id}:{path}"), "-".into()])
            .await
            .map_err(|_| RuntimeError::FileNotFound {
                path: path.to_string(),
            })?;

        let mut archive = tar::Archive::new(archive.as_slice());
        let entries = archive.entries().map_err(|source| RuntimeError::Staging {
            what: format!("archive of {path}"),
            source,
        })?;

        for entry in entries {
            let mut entry = entry.map_err(|source| RuntimeError::Staging {
                what: format!("archive of {path}"),
                source,
            })?;
            if entry.header().entry_type().is_file() {
                let mut contents = Vec::new();
                entry
                    .read_to_end(&mut contents)
                    .map_err(|source| RuntimeError::Staging {
                        what: format!("archive of {path}"),
                        source,
                    })?;
                return Ok(File::new(file_name(path), contents));
            }
        }

        Err(RuntimeError::FileNotFound {
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn stdout_bytes(&self, container: &Container) -> Result<Vec<u8>, RuntimeError> {
        if container.steps().is_empty() {
            return Err(RuntimeError::NothingToRun);
        }
        let execution = self.execute(container, None).await?;
        Ok(execution.stdout)
    }

    async fn file(&self, container: &Container, path: &str) -> Result<File, RuntimeError> {
        let execution = self.execute(container, Some(path)).await?;
        execution.fetched.ok_or_else(|| RuntimeError::FileNotFound {
            path: path.to_string(),
        })
    }
}

/// Secret bytes as an environment value, unchanged where the platform allows
fn env_value(bytes: &[u8]) -> OsString {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        std::ffi::OsStr::from_bytes(bytes).to_os_string()
    }
    #[cfg(not(unix))]
    {
        OsString::from(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Recursively copy `src` into `dst`
fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in walkdir::WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(std::io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Write a file readable only by the current user
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)
}
