//! `exec`: attach a shell to a running session container.

use std::path::Path;

use crate::docker::{ContainerInfo, ContainerRuntime};
use crate::errors::{Result, SessionError};
use crate::session::{prefixed, NAME_PREFIX, WORKSPACE_LABEL};
use crate::supervise::{self, SignalRelay};

/// Interactive choice among several candidates.
pub trait Prompter {
    /// Show `items` under `label` and return the chosen index.
    fn select(&self, label: &str, items: &[String]) -> Result<usize>;
}

/// `docker ps` filters for session containers, narrowed to `workspace_root` when known.
/// Passed together in one listing, so docker ORs the name filters and ANDs the label.
pub fn list_filters(default_container_name: &str, workspace_root: Option<&Path>) -> Vec<String> {
    let mut filters = vec![
        format!("name={NAME_PREFIX}"),
        format!("name={default_container_name}"),
    ];
    if let Some(root) = workspace_root {
        filters.push(format!("label={WORKSPACE_LABEL}={}", root.display()));
    }
    filters
}

/// Pick the container to attach to.
///
/// A target matches a container named exactly `target` or `devcontainer-<target>`.
/// Without a target a single candidate is taken as is; several need `prompter`,
/// and without one the choice is ambiguous.
pub fn resolve(
    target: Option<&str>,
    candidates: &[ContainerInfo],
    prompter: Option<&dyn Prompter>,
) -> Result<String> {
    if candidates.is_empty() {
        return Err(SessionError::NotFound(
            "no running devcontainers found".to_string(),
        ));
    }

    if let Some(target) = target {
        let wanted = prefixed(target);
        return candidates
            .iter()
            .flat_map(ContainerInfo::names)
            .find(|n| *n == target || *n == wanted)
            .map(str::to_string)
            .ok_or_else(|| {
                SessionError::NotFound(format!("no running devcontainer matching {target:?}"))
            });
    }

    if let [only] = candidates {
        return Ok(only.primary_name().to_string());
    }

    let Some(prompter) = prompter else {
        return Err(SessionError::AmbiguousTarget);
    };
    let items: Vec<String> = candidates
        .iter()
        .map(|c| c.primary_name().to_string())
        .collect();
    let idx = prompter.select("Select a devcontainer", &items)?;
    items
        .get(idx)
        .cloned()
        .ok_or_else(|| SessionError::NotFound("no container selected".to_string()))
}

/// List, resolve and `docker exec` into the chosen container, supervising the
/// exec process. Returns its exit code.
pub async fn attach(
    runtime: &dyn ContainerRuntime,
    target: Option<&str>,
    filters: &[String],
    tty: bool,
    prompter: Option<&dyn Prompter>,
) -> Result<i32> {
    let candidates = runtime.list(filters)?;
    tracing::debug!(count = candidates.len(), "session containers found");
    let name = resolve(target, &candidates, prompter)?;
    tracing::info!(container = %name, "attaching");

    let mut relay = SignalRelay::install()?;
    let result = match runtime.exec(&name, tty) {
        Ok(mut child) => relay
            .supervise(&mut child)
            .await
            .map(|status| supervise::exit_code(&status))
            .map_err(SessionError::from),
        Err(e) => Err(e),
    };
    relay.shutdown().await;
    result
}
