//! Static remediation hints, looked up by check id.

use crate::constants::cluster_checks;

pub const GENERIC_HINT: &str = "Review the evidence and escalate according to severity.";

pub fn hint(check_id: &str) -> &'static str {
    match check_id {
        cluster_checks::NODES_READY => {
            "NotReady nodes: check kubelet, node resources and network. \
             Run `kubectl describe node <node>` and review kube-system events."
        }
        cluster_checks::CONTROL_PLANE => {
            "Check the rke2-server service and its logs (`journalctl -u rke2-server`) on the control-plane nodes."
        }
        cluster_checks::ETCD => {
            "Possible quorum, disk I/O or network problem. Avoid mass restarts; escalate."
        }
        cluster_checks::NODE_PRESSURE => {
            "Free disk or memory on the affected node (prune unused images, clean logs)."
        }
        cluster_checks::DNS_RESOLUTION => {
            "Validate CoreDNS, its Service and Endpoints, and the CNI (cilium)."
        }
        cluster_checks::DNS_ENDPOINTS => "CoreDNS is down or its Service has no endpoints.",
        cluster_checks::INFRA_EVENTS => {
            "Warning events in infrastructure namespaces may indicate degradation; review them."
        }
        cluster_checks::VERSION_CONSISTENCY => {
            "Node versions are inconsistent (partial upgrade?); align them."
        }
        _ => GENERIC_HINT,
    }
}

/// The check's own remediation if it has one, else the static table
pub fn resolve(check_id: &str, own: Option<&str>) -> String {
    own.unwrap_or_else(|| hint(check_id)).to_string()
}
