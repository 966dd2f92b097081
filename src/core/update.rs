//! Update logic
//!
//! Finds prebuilt pods whose record no longer matches the resolved graph
//! (another version, another configuration, changed sources or a missing
//! artifact) and turns them into a build request.
//!
//! Records are compared the way a full build would compare them: per planned
//! group, with the configuration and record key that group builds with.

use std::cmp::Ordering;

use semver::Version;

use crate::core::cache::{Disposition, RebuildReason, ReuseDecision, ReuseEngine};
use crate::core::config::Configuration;
use crate::core::node::PackageNode;
use crate::core::planner::{buildable_nodes, plan, ALL_PODS};
use crate::error::PodBuilderError;

/// Stale prebuilt pods and the request that refreshes them
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Stale record keys (roots or split subspecs) with the reason they're stale
    pub stale: Vec<(String, RebuildReason)>,
    /// Root names to build: stale roots plus the roots depending on them
    pub request: Vec<String>,
}

impl UpdatePlan {
    pub fn is_up_to_date(&self) -> bool {
        self.stale.is_empty()
    }
}

/// Reuse decisions for everything buildable, taken group by group as
/// `build *` would plan it
///
/// Nothing buildable means nothing to decide.
pub fn planned_decisions(
    nodes: &[PackageNode],
    config: &Configuration,
    engine: &ReuseEngine<'_>,
) -> Result<Vec<ReuseDecision>, PodBuilderError> {
    if buildable_nodes(nodes, config).is_empty() {
        return Ok(Vec::new());
    }

    let build_plan = plan(nodes, &[ALL_PODS.to_string()], config)?;
    let mut decisions: Vec<ReuseDecision> = Vec::new();
    for group in &build_plan.groups {
        for decision in engine.decide_group(group, &group.members) {
            if !decisions.iter().any(|d| d.key == decision.key) {
                decisions.push(decision);
            }
        }
    }
    Ok(decisions)
}

/// Build an update plan from reuse decisions over the buildable nodes
///
/// Roots that were never built are not stale; `update` only refreshes what
/// already exists.
pub fn find_stale(nodes: &[&PackageNode], decisions: &[ReuseDecision]) -> UpdatePlan {
    let stale: Vec<(String, RebuildReason)> = decisions
        .iter()
        .filter_map(|d| match &d.disposition {
            Disposition::Rebuild(RebuildReason::NoRecord | RebuildReason::ForceRebuild) => None,
            Disposition::Rebuild(reason) => Some((d.key.clone(), reason.clone())),
            Disposition::Reuse(_) | Disposition::Vendored => None,
        })
        .collect();

    let stale_names: Vec<&str> = decisions
        .iter()
        .filter(|d| stale.iter().any(|(key, _)| key == &d.key))
        .map(|d| d.root_name.as_str())
        .collect();
    let mut request: Vec<String> = Vec::new();
    for node in nodes {
        let is_stale = stale_names.contains(&node.root_name.as_str());
        let depends_on_stale = node.dependency_names.iter().any(|d| {
            nodes
                .iter()
                .any(|n| &n.name == d && n.root_name != node.root_name && stale_names.contains(&n.root_name.as_str()))
        });
        if (is_stale || depends_on_stale) && !request.contains(&node.root_name) {
            request.push(node.root_name.clone());
        }
    }

    UpdatePlan { stale, request }
}

/// Human-readable description of a version change
///
/// CocoaPods versions may have fewer than three components; missing ones are
/// read as zero. Anything that still doesn't parse is just "changed".
pub fn describe_version_change(from: &str, to: &str) -> String {
    match (parse_lenient(from), parse_lenient(to)) {
        (Some(old), Some(new)) => {
            let kind = match new.cmp(&old) {
                Ordering::Less => "downgrade",
                Ordering::Equal => "rebuild",
                Ordering::Greater if new.major != old.major => "major update",
                Ordering::Greater if new.minor != old.minor => "minor update",
                Ordering::Greater => "patch update",
            };
            format!("{kind} {from} -> {to}")
        }
        _ => format!("changed {from} -> {to}"),
    }
}

fn parse_lenient(version: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(version) {
        return Some(v);
    }
    let parts: Vec<&str> = version.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.parse::<u64>().is_err()) {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    Version::parse(&padded).ok()
}
