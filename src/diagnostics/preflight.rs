//! Environment preflight: find the cluster CLI and prove it runs.
//!
//! A missing or broken tool is fatal to the run. Evidence of what was looked
//! at is persisted before the error is returned.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{evidence_ids, KUBECTL_ENV_VAR};
use crate::error::{FleetError, Result};
use crate::evidence::EvidenceStore;
use crate::execution::RemoteExecutor;
use crate::models::{Operation, RunMetadata, Target};
use crate::utils::text::shell_quote;

/// A binary the run depends on, with advice for installing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalTool {
    pub binary: &'static str,
    /// Environment variable that may point at the binary
    pub env_var: Option<&'static str>,
    pub install_advice: &'static str,
}

impl ExternalTool {
    pub const fn new(
        binary: &'static str,
        env_var: Option<&'static str>,
        install_advice: &'static str,
    ) -> Self {
        Self {
            binary,
            env_var,
            install_advice,
        }
    }
}

pub const KUBECTL: ExternalTool = ExternalTool::new(
    "kubectl",
    Some(KUBECTL_ENV_VAR),
    "export KUBECTL=/usr/local/bin/kubectl (or add /usr/local/bin to PATH)",
);

pub const SSH: ExternalTool = ExternalTool::new(
    "ssh",
    None,
    "Install the OpenSSH client (e.g. `apt install openssh-client`)",
);

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn search_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

/// Resolve `tool`: explicit path, then its environment variable, then `PATH`
pub fn locate_tool(tool: &ExternalTool, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        return Err(FleetError::environment(
            tool.binary,
            format!("configured path {} is not an executable file", path.display()),
            tool.install_advice,
        ));
    }

    if let Some(var) = tool.env_var {
        if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(value);
            if is_executable(&path) {
                return Ok(path);
            }
            warn!(
                tool = tool.binary,
                env_var = var,
                path = %path.display(),
                "Ignoring non-executable tool override"
            );
        }
    }

    search_path(tool.binary).ok_or_else(|| {
        FleetError::environment(tool.binary, "not found in PATH", tool.install_advice)
    })
}

/// Locate kubectl, prove it runs, and capture the report header context.
///
/// Persists `00_env_debug` when the binary cannot be found and
/// `00_kubectl_check` once it has been executed.
pub async fn preflight_cluster(
    executor: &RemoteExecutor,
    store: &EvidenceStore,
    run: &mut RunMetadata,
    explicit: Option<&Path>,
) -> Result<PathBuf> {
    let kubectl = match locate_tool(&KUBECTL, explicit) {
        Ok(path) => path,
        Err(e) => {
            let debug = format!(
                "PATH={}\n{}={}\n",
                env::var("PATH").unwrap_or_default(),
                KUBECTL_ENV_VAR,
                env::var(KUBECTL_ENV_VAR).unwrap_or_default()
            );
            store.persist_text(&run.run_id, evidence_ids::ENV_DEBUG, &debug)?;
            return Err(e);
        }
    };
    run.kubectl = Some(kubectl.clone());

    let local = Target::local("local");
    let quoted = shell_quote(&kubectl.display().to_string());
    let version = Operation::new("kubectl_version", format!("{quoted} version --client"))
        .with_timeout(Duration::from_secs(20));
    let outcome = executor.execute_default(&local, &version).await;
    store.persist(
        &run.run_id,
        evidence_ids::KUBECTL_CHECK,
        &outcome.command,
        outcome.exit_status,
        &format!("KUBECTL={}\n\n{}", kubectl.display(), outcome.stdout),
        &outcome.stderr,
    )?;
    if !outcome.is_ok() {
        return Err(FleetError::environment(
            KUBECTL.binary,
            format!("found at {} but cannot execute it: {}", kubectl.display(), outcome.summary),
            "Check the binary's permissions and architecture, or point KUBECTL at a working kubectl",
        ));
    }
    info!(kubectl = %kubectl.display(), version = %outcome.summary, "kubectl available");

    let context = Operation::new("current_context", format!("{quoted} config current-context"))
        .with_timeout(Duration::from_secs(15));
    let outcome = executor.execute_default(&local, &context).await;
    run.context = Some(if outcome.is_ok() {
        outcome.stdout.trim().to_string()
    } else {
        "(unavailable)".to_string()
    });

    let nodes = Operation::new("get_nodes_wide", format!("{quoted} get nodes -o wide"))
        .with_timeout(Duration::from_secs(60));
    let outcome = executor.execute_default(&local, &nodes).await;
    run.nodes_wide = Some(if outcome.is_ok() {
        outcome.stdout.trim_end().to_string()
    } else {
        outcome.summary
    });

    Ok(kubectl)
}
