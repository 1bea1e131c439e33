//! Compiler execution environments.
//!
//! The gateway runs its scripts with a Python interpreter that can
//! import the required compiler version. Resolution is discovery only:
//! - the system interpreter, when the installed compiler matches;
//! - a managed virtual environment under the user's data directory
//!   (`couleuvre/envs/<version>`), when one exists;
//! - otherwise the system interpreter anyway, letting the compile
//!   surface its own import error.
//!
//! Provisioning environments (creating venvs, installing compilers) is
//! out of scope here; an external tool populates the managed directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::error::GatewayError;
use crate::version;

/// Output of a gateway script run.
#[derive(Debug)]
pub struct ScriptOutput {
    /// Process exit code, when the process exited normally.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    /// Whether the script exited successfully.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A resolved execution environment.
#[derive(Debug, Clone)]
pub struct VyperEnvironment {
    python_bin: PathBuf,
    version: String,
}

impl VyperEnvironment {
    /// Resolve the environment for a compiler version.
    pub fn resolve(required_version: &str) -> VyperEnvironment {
        if let Some(installed) = version::installed_vyper_version() {
            if installed == required_version {
                info!(version = required_version, "using system compiler");
                return VyperEnvironment {
                    python_bin: system_python(),
                    version: required_version.to_string(),
                };
            }
        }

        if let Some(managed) = managed_python(required_version) {
            info!(
                version = required_version,
                python = %managed.display(),
                "using managed environment"
            );
            return VyperEnvironment {
                python_bin: managed,
                version: required_version.to_string(),
            };
        }

        warn!(
            version = required_version,
            "no matching environment found, falling back to the system interpreter"
        );
        VyperEnvironment {
            python_bin: system_python(),
            version: required_version.to_string(),
        }
    }

    /// The interpreter this environment runs.
    pub fn python_bin(&self) -> &Path {
        &self.python_bin
    }

    /// The compiler version this environment was resolved for.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Module search paths for the compiler's import resolution.
    ///
    /// The interpreter's own `sys.path` lets the compiler import modules
    /// installed as dependencies; `.` covers workspace-relative imports.
    pub fn search_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let output = Command::new(&self.python_bin)
            .args(["-c", "import json, sys; print(json.dumps(sys.path))"])
            .output();
        match output {
            Ok(output) if output.status.success() => {
                match serde_json::from_slice::<Vec<String>>(&output.stdout) {
                    Ok(sys_path) => paths.extend(sys_path),
                    Err(err) => warn!(error = %err, "unable to decode sys.path"),
                }
            }
            Ok(output) => {
                warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "unable to read sys.path"
                );
            }
            Err(err) => warn!(error = %err, "unable to launch interpreter for sys.path"),
        }
        if !paths.iter().any(|p| p == ".") {
            paths.push(".".to_string());
        }
        paths
    }

    /// Run a Python script in this environment, killing it after
    /// `timeout`.
    pub fn run_script(
        &self,
        script: &str,
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<ScriptOutput, GatewayError> {
        let mut command = Command::new(&self.python_bin);
        command
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn()?;
        match child.wait_timeout(timeout)? {
            Some(status) => {
                let stdout = read_pipe(child.stdout.take());
                let stderr = read_pipe(child.stderr.take());
                debug!(exit = ?status.code(), "gateway script finished");
                Ok(ScriptOutput {
                    exit_code: status.code(),
                    stdout,
                    stderr,
                })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(GatewayError::Timeout {
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }
}

fn read_pipe<R: std::io::Read>(pipe: Option<R>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = std::io::Read::read_to_end(&mut pipe, &mut buffer);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn system_python() -> PathBuf {
    which::which("python3")
        .or_else(|_| which::which("python"))
        .unwrap_or_else(|_| PathBuf::from("python3"))
}

/// The interpreter of a managed environment, when it exists on disk.
fn managed_python(version: &str) -> Option<PathBuf> {
    let base = dirs::data_dir()?;
    let python = base
        .join("couleuvre")
        .join("envs")
        .join(version)
        .join("bin")
        .join("python");
    python.exists().then_some(python)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_output_success_requires_zero_exit() {
        let ok = ScriptOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        let failed = ScriptOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        };
        let killed = ScriptOutput {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }
}
