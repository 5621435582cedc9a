//! Cluster health check set, run against the local kubectl context.
//!
//! Every verifier treats a non-zero exit or empty stdout from its probe as a
//! `FAIL` carrying the probe's stderr.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use super::registry::{Check, CheckRegistry, Verification};
use super::table::Table;
use crate::config::DiagnosticsConfig;
use crate::constants::cluster_checks as ids;
use crate::constants::defaults::SUMMARY_MAX_CHARS;
use crate::error::Result;
use crate::models::{EvidenceSection, Operation};
use crate::utils::text::{shell_quote, summarize};

const CONTROL_PLANE_COMPONENTS: [&str; 3] =
    ["kube-apiserver", "kube-scheduler", "kube-controller-manager"];
const DNS_LOOKUP_NAME: &str = "kubernetes.default.svc.cluster.local";

/// Build the cluster check registry for the given kubectl binary
pub fn cluster_registry(kubectl: &Path, config: &DiagnosticsConfig) -> Result<CheckRegistry> {
    let kubectl = shell_quote(&kubectl.display().to_string());
    let probe = |name: &str, args: &str, timeout_secs: u64| {
        Operation::new(name, format!("{kubectl} {args}"))
            .with_timeout(Duration::from_secs(timeout_secs))
    };

    let mut registry = CheckRegistry::new();
    registry.register(Check::new(
        ids::NODES_READY,
        "Nodes Ready",
        "2. Cluster state",
        vec![probe("get_nodes", "get nodes", 30)],
        verify_nodes_ready,
    ))?;
    registry.register(Check::new(
        ids::CONTROL_PLANE,
        "Control Plane Pods",
        "2. Cluster state",
        vec![probe("get_kube_system_pods", "get pods -n kube-system", 45)],
        verify_control_plane,
    ))?;
    registry.register(Check::new(
        ids::ETCD,
        "etcd Health",
        "2. Cluster state",
        vec![probe("get_kube_system_pods", "get pods -n kube-system", 45)],
        verify_etcd,
    ))?;
    registry.register(Check::new(
        ids::NODE_PRESSURE,
        "Node Pressure",
        "3. Capacity",
        vec![probe("describe_nodes", "describe nodes", 60)],
        verify_node_pressure,
    ))?;
    registry.register(Check::new(
        ids::DNS_RESOLUTION,
        "DNS Resolution",
        "4. Base connectivity",
        vec![probe(
            "dns_probe_pod",
            &format!(
                "run dns-check-{{nonce}} --rm -i --restart=Never --image={} \
                 -- nslookup {DNS_LOOKUP_NAME}",
                shell_quote(&config.dns_probe_image),
            ),
            90,
        )],
        verify_dns_resolution,
    ))?;
    registry.register(Check::new(
        ids::DNS_ENDPOINTS,
        "DNS Service Endpoints",
        "4. Base connectivity",
        vec![
            probe("get_kube_system_services", "get svc -n kube-system", 30),
            probe("get_kube_system_endpoints", "get endpoints -n kube-system", 30),
        ],
        verify_dns_endpoints,
    ))?;
    let infra_namespaces = config.infra_namespaces.clone();
    registry.register(Check::new(
        ids::INFRA_EVENTS,
        "Infra Warnings",
        "5. Events (infra)",
        vec![probe(
            "get_events",
            "get events -A --sort-by=.lastTimestamp",
            60,
        )],
        move |sections: &[EvidenceSection]| verify_infra_events(sections, &infra_namespaces),
    ))?;
    registry.register(Check::new(
        ids::VERSION_CONSISTENCY,
        "Version Consistency",
        "6. Upgrades",
        vec![probe("get_nodes_json", "get nodes -o json", 60)],
        verify_version_consistency,
    ))?;
    Ok(registry)
}

/// Stdout of the probe at `index`, or the failure verdict for a probe that
/// did not run cleanly
fn probe_stdout(
    sections: &[EvidenceSection],
    index: usize,
) -> std::result::Result<&str, Verification> {
    let Some(section) = sections.get(index) else {
        return Err(Verification::fail("probe did not run"));
    };
    if section.exit_status != Some(0) || section.stdout.trim().is_empty() {
        let reason = match section.stderr.trim() {
            "" => "no output",
            text => text,
        };
        return Err(Verification::fail(summarize(reason, SUMMARY_MAX_CHARS)));
    }
    Ok(&section.stdout)
}

pub fn verify_nodes_ready(sections: &[EvidenceSection]) -> Verification {
    let stdout = match probe_stdout(sections, 0) {
        Ok(stdout) => stdout,
        Err(verdict) => return verdict,
    };
    let table = Table::parse(stdout);
    if table.is_empty() {
        return Verification::fail("no nodes listed");
    }

    let not_ready: Vec<String> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let name = table.cell(row, "NAME", 0)?;
            let status = table.cell(row, "STATUS", 1)?;
            (!status.eq_ignore_ascii_case("ready")).then(|| format!("{name}:{status}"))
        })
        .collect();

    if not_ready.is_empty() {
        Verification::ok(format!("{} nodes Ready", table.len()))
    } else {
        Verification::fail(format!("Nodes not Ready: {}", not_ready.join(", ")))
    }
}

/// `n/n` with n > 0
fn fully_ready(ready: &str) -> bool {
    match ready.split_once('/') {
        Some((up, total)) => match (up.parse::<u32>(), total.parse::<u32>()) {
            (Ok(up), Ok(total)) => total > 0 && up == total,
            _ => false,
        },
        None => false,
    }
}

/// Missing components and unhealthy pods among kube-system pods whose name
/// contains one of `components`
fn pod_health(table: &Table, components: &[&str]) -> (Vec<String>, Vec<String>) {
    let mut missing = Vec::new();
    let mut unhealthy = Vec::new();
    for component in components {
        let mut found = false;
        for row in table.rows() {
            let Some(name) = table.cell(row, "NAME", 0) else {
                continue;
            };
            if !name.contains(component) {
                continue;
            }
            found = true;
            let ready = table.cell(row, "READY", 1).unwrap_or("?");
            let status = table.cell(row, "STATUS", 2).unwrap_or("?");
            if !status.eq_ignore_ascii_case("running") || !fully_ready(ready) {
                unhealthy.push(format!("{name}({ready},{status})"));
            }
        }
        if !found {
            missing.push((*component).to_string());
        }
    }
    (missing, unhealthy)
}

pub fn verify_control_plane(sections: &[EvidenceSection]) -> Verification {
    let stdout = match probe_stdout(sections, 0) {
        Ok(stdout) => stdout,
        Err(verdict) => return verdict,
    };
    let (missing, unhealthy) = pod_health(&Table::parse(stdout), &CONTROL_PLANE_COMPONENTS);
    if !missing.is_empty() {
        Verification::fail(format!("Missing: {}", missing.join(", ")))
    } else if !unhealthy.is_empty() {
        Verification::fail(format!("Not OK: {}", unhealthy.join(", ")))
    } else {
        Verification::ok("control-plane pods Running and Ready")
    }
}

pub fn verify_etcd(sections: &[EvidenceSection]) -> Verification {
    let stdout = match probe_stdout(sections, 0) {
        Ok(stdout) => stdout,
        Err(verdict) => return verdict,
    };
    let (missing, unhealthy) = pod_health(&Table::parse(stdout), &["etcd"]);
    if !missing.is_empty() {
        Verification::fail("no etcd pods in kube-system")
    } else if !unhealthy.is_empty() {
        Verification::fail(format!("Not OK: {}", unhealthy.join(", ")))
    } else {
        Verification::ok("etcd pods Running and Ready")
    }
}

fn pressure_regex() -> Option<&'static Regex> {
    static PRESSURE: OnceLock<Option<Regex>> = OnceLock::new();
    PRESSURE
        .get_or_init(|| Regex::new(r"\b(DiskPressure|MemoryPressure|PIDPressure)\s+(\w+)").ok())
        .as_ref()
}

/// A description without any pressure condition rows fails: the kubelet
/// always reports them, so their absence means unreadable output.
pub fn verify_node_pressure(sections: &[EvidenceSection]) -> Verification {
    let stdout = match probe_stdout(sections, 0) {
        Ok(stdout) => stdout,
        Err(verdict) => return verdict,
    };
    let Some(regex) = pressure_regex() else {
        return Verification::fail("pressure pattern unavailable");
    };

    let mut node = "?";
    let mut under_pressure = BTreeSet::new();
    let mut conditions_seen = 0;
    for line in stdout.lines() {
        if let Some(name) = line.strip_prefix("Name:") {
            node = name.trim();
            continue;
        }
        for capture in regex.captures_iter(line) {
            conditions_seen += 1;
            if capture[2].eq_ignore_ascii_case("true") {
                under_pressure.insert(format!("{node}:{}", &capture[1]));
            }
        }
    }

    if !under_pressure.is_empty() {
        Verification::fail(format!(
            "Pressure: {}",
            under_pressure.into_iter().collect::<Vec<_>>().join(", ")
        ))
    } else if conditions_seen == 0 {
        Verification::fail("no pressure conditions found in node description")
    } else {
        Verification::ok("no Disk/Memory/PID pressure")
    }
}

pub fn verify_dns_resolution(sections: &[EvidenceSection]) -> Verification {
    let Some(section) = sections.first() else {
        return Verification::fail("probe did not run");
    };
    if section.exit_status == Some(0)
        && (section.stdout.contains("Name:") || section.stdout.contains("Address"))
    {
        return Verification::ok(format!("{DNS_LOOKUP_NAME} resolves"));
    }

    let message = if section.stderr.trim().is_empty() {
        section.stdout.as_str()
    } else {
        section.stderr.as_str()
    };
    let lowered = message.to_lowercase();
    if lowered.contains("forbidden") || lowered.contains("rbac") {
        return Verification::not_applicable("RBAC does not allow the test pod");
    }
    match message.trim() {
        "" => Verification::fail("no output"),
        text => Verification::fail(summarize(text, SUMMARY_MAX_CHARS)),
    }
}

pub fn verify_dns_endpoints(sections: &[EvidenceSection]) -> Verification {
    let services = match probe_stdout(sections, 0) {
        Ok(stdout) => Table::parse(stdout),
        Err(_) => return Verification::fail("no DNS Service (port 53) in kube-system"),
    };
    let dns_services: Vec<&str> = services
        .rows()
        .iter()
        .filter(|row| {
            services
                .cell(row, "PORT(S)", 4)
                .is_some_and(|ports| ports.split(',').any(|p| p.starts_with("53/")))
        })
        .filter_map(|row| services.cell(row, "NAME", 0))
        .collect();
    if dns_services.is_empty() {
        return Verification::fail("no DNS Service (port 53) in kube-system");
    }

    let endpoints = match probe_stdout(sections, 1) {
        Ok(stdout) => Table::parse(stdout),
        Err(verdict) => return verdict,
    };
    let has_endpoints = endpoints.rows().iter().any(|row| {
        let name = endpoints.cell(row, "NAME", 0);
        let addresses = endpoints.cell(row, "ENDPOINTS", 1).unwrap_or("");
        name.is_some_and(|name| dns_services.contains(&name))
            && !addresses.is_empty()
            && !addresses.eq_ignore_ascii_case("<none>")
    });

    if has_endpoints {
        Verification::ok(format!("DNS Service {} has endpoints", dns_services.join(", ")))
    } else {
        Verification::fail(format!(
            "DNS Service ({}) has no endpoints",
            dns_services.join(", ")
        ))
    }
}

pub fn verify_infra_events(sections: &[EvidenceSection], namespaces: &[String]) -> Verification {
    let section = match sections.first() {
        Some(section) => section,
        None => return Verification::fail("probe did not run"),
    };
    if section.exit_status != Some(0) {
        return match probe_stdout(sections, 0) {
            Err(verdict) => verdict,
            Ok(_) => Verification::fail("event listing failed"),
        };
    }
    let table = Table::parse(&section.stdout);

    let warnings: Vec<String> = table
        .rows()
        .iter()
        .filter(|row| table.cell(row, "TYPE", 2) == Some("Warning"))
        .filter(|row| {
            table
                .cell(row, "NAMESPACE", 0)
                .is_some_and(|ns| namespaces.iter().any(|infra| infra == ns))
        })
        .map(|row| {
            format!(
                "{} {}",
                table.cell(row, "REASON", 3).unwrap_or("?"),
                table.cell(row, "OBJECT", 4).unwrap_or("?")
            )
        })
        .collect();

    match warnings.last() {
        None => Verification::ok("no Warning events in infra namespaces"),
        Some(latest) => Verification::fail(format!(
            "Infra warnings: {} (latest: {latest}; see evidence)",
            warnings.len()
        )),
    }
}

pub fn verify_version_consistency(sections: &[EvidenceSection]) -> Verification {
    let stdout = match probe_stdout(sections, 0) {
        Ok(stdout) => stdout,
        Err(verdict) => return verdict,
    };
    let nodes: Value = match serde_json::from_str(stdout) {
        Ok(value) => value,
        Err(e) => return Verification::fail(format!("unparseable node list: {e}")),
    };

    let versions: BTreeSet<&str> = nodes
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer("/status/nodeInfo/kubeletVersion"))
                .filter_map(Value::as_str)
                .collect()
        })
        .unwrap_or_default();

    match versions.len() {
        0 => Verification::fail("no kubelet versions reported"),
        1 => Verification::ok(format!(
            "kubelet {}",
            versions.iter().next().copied().unwrap_or_default()
        )),
        _ => Verification::fail(format!(
            "Inconsistent: {}",
            versions.into_iter().collect::<Vec<_>>().join(", ")
        )),
    }
}
