use anyhow::{Context, Result};
use maxfield::api::{Assignment, Plan};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced an artifact and what it holds.
pub struct Payload {
    pub params: Value,
    pub inputs: Vec<PathBuf>,
    /// Headline numbers of the artifact, stored next to its path.
    pub contents: Value,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            inputs: Vec::new(),
            contents: Value::Null,
        }
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Plan counts, action points, and the search that found it.
    pub fn with_plan(mut self, plan: &Plan) -> Self {
        let summary = plan.summary();
        self.contents = json!({
            "summary": summary,
            "action_points": summary.action_points().total(),
            "search": plan.search.as_ref().map(|s| json!({
                "seed": s.seed,
                "trials": s.trials,
                "failures": s.failures,
            })),
        });
        self
    }

    /// Agent count, per-agent links, and the estimated duration.
    pub fn with_assignment(mut self, assignment: &Assignment) -> Self {
        let links: Vec<usize> = assignment.movements.iter().map(Vec::len).collect();
        self.contents = json!({
            "agents": links.len(),
            "links_per_agent": links,
            "total_secs": assignment.total_secs,
        });
        self
    }
}

/// Write `<artifact>.provenance.json` next to a plan artifact.
///
/// Records the git commit, the planner version, the callsite, the params and
/// inputs, and the artifact path with its contents summary.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let inputs: Vec<_> = payload.inputs.iter().map(|p| p.to_string_lossy()).collect();
    let doc = json!({
        "code_rev": current_git_rev(),
        "planner_version": maxfield::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": payload.params,
        "inputs": inputs,
        "outputs": [{
            "path": artifact.to_string_lossy(),
            "contents": payload.contents,
        }]
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    tracing::debug!(path = %provenance_path.display(), "provenance written");
    Ok(provenance_path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("plan"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Commit the binary was built from, else the checkout it runs in.
pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|r| !r.is_empty()) {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
