//! Node preflight check set, run on each host over SSH.
//!
//! Checks are read-only. Each carries the command an operator would run to
//! fix a failure; it is shown in the preflight report and never executed.

use std::collections::BTreeMap;
use std::time::Duration;

use super::registry::{Check, CheckRegistry, Verification};
use crate::config::DiagnosticsConfig;
use crate::constants::preflight_checks as ids;
use crate::error::Result;
use crate::models::{EvidenceSection, Operation};
use crate::utils::text::{shell_quote, summarize};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const CATEGORY: &str = "Node preflight";

pub fn node_registry(config: &DiagnosticsConfig) -> Result<CheckRegistry> {
    let probe = |command: &str| Operation::new("probe", command).with_timeout(PROBE_TIMEOUT);
    let timezone = config.timezone.clone();

    let checks = vec![
        Check::new(
            ids::SWAP_DISABLED,
            "Swap disabled",
            CATEGORY,
            vec![probe("swapon --show --noheadings")],
            verify_swap_disabled,
        )
        .with_remediation("sudo swapoff -a && sudo sed -i '/swap/d' /etc/fstab"),
        Check::new(
            ids::KERNEL_MODULES,
            "Kernel modules (overlay, br_netfilter)",
            CATEGORY,
            vec![probe("lsmod")],
            verify_kernel_modules,
        )
        .with_remediation(
            "sudo modprobe overlay && sudo modprobe br_netfilter && \
             printf 'overlay\\nbr_netfilter\\n' | sudo tee /etc/modules-load.d/k8s.conf",
        ),
        Check::new(
            ids::NETWORK_SYSCTL,
            "Network sysctl",
            CATEGORY,
            vec![probe(
                "sysctl net.bridge.bridge-nf-call-iptables net.bridge.bridge-nf-call-ip6tables net.ipv4.ip_forward",
            )],
            verify_network_sysctl,
        )
        .with_remediation(
            "printf 'net.bridge.bridge-nf-call-iptables = 1\\nnet.bridge.bridge-nf-call-ip6tables = 1\\nnet.ipv4.ip_forward = 1\\n' \
             | sudo tee /etc/sysctl.d/99-kubernetes-cri.conf && sudo sysctl --system",
        ),
        Check::new(
            ids::RKE2_SYSCTL,
            "RKE2 sysctl",
            CATEGORY,
            vec![probe(
                "sysctl vm.swappiness fs.inotify.max_user_watches fs.inotify.max_user_instances",
            )],
            verify_rke2_sysctl,
        )
        .with_remediation(
            "printf 'vm.swappiness=0\\nfs.inotify.max_user_watches=1048576\\nfs.inotify.max_user_instances=8192\\n' \
             | sudo tee /etc/sysctl.d/99-rke2.conf && sudo sysctl --system",
        ),
        Check::new(
            ids::JOURNAL_DIR,
            "Persistent journal directory",
            CATEGORY,
            vec![probe("test -d /var/log/journal && echo present")],
            |sections: &[EvidenceSection]| {
                marker(sections, "present", "/var/log/journal is missing")
            },
        )
        .with_remediation(
            "sudo mkdir -p /var/log/journal && sudo systemctl restart systemd-journald",
        ),
        Check::new(
            ids::HOSTNAME,
            "Hostname in /etc/hosts",
            CATEGORY,
            vec![probe("h=$(hostname) && grep -qw \"$h\" /etc/hosts && echo \"$h\"")],
            |sections: &[EvidenceSection]| {
                non_empty(sections, "hostname not found in /etc/hosts")
            },
        )
        .with_remediation("echo \"127.0.0.1 $(hostname)\" | sudo tee -a /etc/hosts"),
        Check::new(
            ids::TIMEZONE,
            "Timezone and chrony",
            CATEGORY,
            vec![probe(
                "timedatectl show -p Timezone --value; systemctl is-active chrony",
            )],
            {
                let timezone = timezone.clone();
                move |sections: &[EvidenceSection]| verify_timezone(sections, &timezone)
            },
        )
        .with_remediation(format!(
            "sudo timedatectl set-timezone {} && sudo apt install -y chrony && sudo systemctl enable --now chrony",
            shell_quote(&timezone)
        )),
        Check::new(
            ids::SERVICES,
            "Services auditd, sysstat, watchdog",
            CATEGORY,
            vec![probe("systemctl is-active auditd sysstat watchdog")],
            verify_services,
        )
        .with_remediation(
            "sudo apt install -y auditd sysstat watchdog && \
             sudo systemctl enable --now auditd sysstat watchdog",
        ),
        Check::new(
            ids::LONGHORN_MOUNT,
            "Longhorn volume mounted",
            CATEGORY,
            vec![probe("findmnt -n /var/lib/longhorn")],
            |sections: &[EvidenceSection]| {
                non_empty(sections, "/var/lib/longhorn is not a mount point")
            },
        )
        .with_remediation("Verify the /var/lib/longhorn mount manually"),
        Check::new(
            ids::CONNECTIVITY,
            "Outbound connectivity",
            CATEGORY,
            vec![probe("ping -c 1 -W 3 8.8.8.8")],
            |sections: &[EvidenceSection]| marker(sections, "bytes from", "no reply from 8.8.8.8"),
        ),
        Check::new(
            ids::KUBECTL,
            "kubectl installed",
            CATEGORY,
            vec![probe("command -v kubectl")],
            |sections: &[EvidenceSection]| non_empty(sections, "kubectl not found in PATH"),
        )
        .with_remediation(
            "curl -LO \"https://dl.k8s.io/release/$(curl -L -s https://dl.k8s.io/release/stable.txt)/bin/linux/amd64/kubectl\" && \
             sudo install -o root -g root -m 0755 kubectl /usr/local/bin/kubectl",
        ),
        Check::new(
            ids::HELM,
            "helm installed",
            CATEGORY,
            vec![probe("command -v helm")],
            |sections: &[EvidenceSection]| non_empty(sections, "helm not found in PATH"),
        )
        .with_remediation(
            "curl -fsSL https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3 | bash",
        ),
    ];

    let mut registry = CheckRegistry::new();
    for check in checks {
        registry.register(check)?;
    }
    Ok(registry)
}

fn first(sections: &[EvidenceSection]) -> Option<&EvidenceSection> {
    sections.first()
}

fn marker(sections: &[EvidenceSection], needle: &str, failure: &str) -> Verification {
    match first(sections) {
        Some(s) if s.exit_status == Some(0) && s.stdout.contains(needle) => {
            Verification::ok(needle)
        }
        Some(s) if !s.stderr.trim().is_empty() => {
            Verification::fail(format!("{failure}: {}", summarize(&s.stderr, 120)))
        }
        _ => Verification::fail(failure),
    }
}

fn non_empty(sections: &[EvidenceSection], failure: &str) -> Verification {
    match first(sections) {
        Some(s) if s.exit_status == Some(0) && !s.stdout.trim().is_empty() => {
            Verification::ok(summarize(&s.stdout, 120))
        }
        _ => Verification::fail(failure),
    }
}

pub fn verify_swap_disabled(sections: &[EvidenceSection]) -> Verification {
    match first(sections) {
        Some(s) if s.exit_status == Some(0) && s.stdout.trim().is_empty() => {
            Verification::ok("no active swap")
        }
        Some(s) if s.exit_status == Some(0) => {
            let devices: Vec<&str> = s
                .stdout
                .lines()
                .filter_map(|line| line.split_whitespace().next())
                .collect();
            Verification::fail(format!("swap active: {}", devices.join(", ")))
        }
        Some(s) => Verification::fail(format!(
            "swapon failed: {}",
            summarize(&s.stderr, 120)
        )),
        None => Verification::fail("probe did not run"),
    }
}

pub fn verify_kernel_modules(sections: &[EvidenceSection]) -> Verification {
    let Some(section) = first(sections).filter(|s| s.exit_status == Some(0)) else {
        return Verification::fail("lsmod failed");
    };
    let loaded: Vec<&str> = section
        .stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    let missing: Vec<&str> = ["overlay", "br_netfilter"]
        .into_iter()
        .filter(|module| !loaded.contains(module))
        .collect();
    if missing.is_empty() {
        Verification::ok("overlay and br_netfilter loaded")
    } else {
        Verification::fail(format!("modules not loaded: {}", missing.join(", ")))
    }
}

/// `key = value` pairs printed by `sysctl`
fn sysctl_values(stdout: &str) -> BTreeMap<&str, &str> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

fn check_sysctl<F>(sections: &[EvidenceSection], expected: &[(&str, F)]) -> Verification
where
    F: Fn(&str) -> bool,
{
    let values = first(sections)
        .map(|s| sysctl_values(&s.stdout))
        .unwrap_or_default();
    let wrong: Vec<String> = expected
        .iter()
        .filter_map(|(key, accept)| match values.get(key) {
            Some(&value) if accept(value) => None,
            Some(&value) => Some(format!("{key}={value}")),
            None => Some(format!("{key} unset")),
        })
        .collect();
    if wrong.is_empty() {
        Verification::ok("sysctl values as expected")
    } else {
        Verification::fail(wrong.join(", "))
    }
}

pub fn verify_network_sysctl(sections: &[EvidenceSection]) -> Verification {
    let one = |value: &str| value == "1";
    check_sysctl(
        sections,
        &[
            ("net.bridge.bridge-nf-call-iptables", one),
            ("net.bridge.bridge-nf-call-ip6tables", one),
            ("net.ipv4.ip_forward", one),
        ],
    )
}

pub fn verify_rke2_sysctl(sections: &[EvidenceSection]) -> Verification {
    fn at_least(minimum: u64) -> impl Fn(&str) -> bool {
        move |value: &str| value.parse::<u64>().is_ok_and(|v| v >= minimum)
    }
    let checks: [(&str, Box<dyn Fn(&str) -> bool>); 3] = [
        ("vm.swappiness", Box::new(|value: &str| value == "0")),
        ("fs.inotify.max_user_watches", Box::new(at_least(1_048_576))),
        ("fs.inotify.max_user_instances", Box::new(at_least(8_192))),
    ];
    check_sysctl(sections, &checks)
}

pub fn verify_timezone(sections: &[EvidenceSection], timezone: &str) -> Verification {
    let Some(section) = first(sections) else {
        return Verification::fail("probe did not run");
    };
    let mut lines = section.stdout.lines().map(str::trim);
    let current = lines.next().unwrap_or("");
    let chrony = lines.next().unwrap_or("");
    match (current == timezone, chrony == "active") {
        (true, true) => Verification::ok(format!("{timezone}, chrony active")),
        (false, _) => Verification::fail(format!("timezone is '{current}', expected '{timezone}'")),
        (true, false) => Verification::fail(format!("chrony is '{chrony}'")),
    }
}

pub fn verify_services(sections: &[EvidenceSection]) -> Verification {
    let states: Vec<&str> = first(sections)
        .map(|s| s.stdout.lines().map(str::trim).collect())
        .unwrap_or_default();
    let inactive: Vec<String> = ["auditd", "sysstat", "watchdog"]
        .iter()
        .enumerate()
        .filter_map(|(index, service)| match states.get(index) {
            Some(&"active") => None,
            Some(state) => Some(format!("{service}:{state}")),
            None => Some(format!("{service}:unknown")),
        })
        .collect();
    if inactive.is_empty() {
        Verification::ok("auditd, sysstat, watchdog active")
    } else {
        Verification::fail(format!("inactive: {}", inactive.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;

    fn out(rc: i32, stdout: &str) -> Vec<EvidenceSection> {
        vec![EvidenceSection::new("probe", Some(rc), stdout, "")]
    }

    #[test]
    fn test_swap() {
        assert!(verify_swap_disabled(&out(0, "")).classification.is_ok());
        let verdict = verify_swap_disabled(&out(0, "/swap.img file 4G 0B -2\n"));
        assert_eq!(verdict.summary, "swap active: /swap.img");
    }

    #[test]
    fn test_kernel_modules() {
        let lsmod = "Module  Size  Used by\noverlay 151552 10\nbr_netfilter 32768 0\n";
        assert!(verify_kernel_modules(&out(0, lsmod)).classification.is_ok());
        let verdict = verify_kernel_modules(&out(0, "Module  Size  Used by\noverlay 1 0\n"));
        assert_eq!(verdict.summary, "modules not loaded: br_netfilter");
    }

    #[test]
    fn test_sysctl_checks() {
        let net = "net.bridge.bridge-nf-call-iptables = 1\nnet.bridge.bridge-nf-call-ip6tables = 1\nnet.ipv4.ip_forward = 0\n";
        let verdict = verify_network_sysctl(&out(0, net));
        assert_eq!(verdict.classification, Classification::Fail);
        assert_eq!(verdict.summary, "net.ipv4.ip_forward=0");

        let rke2 = "vm.swappiness = 0\nfs.inotify.max_user_watches = 2097152\nfs.inotify.max_user_instances = 8192\n";
        assert!(verify_rke2_sysctl(&out(0, rke2)).classification.is_ok());
        let verdict = verify_rke2_sysctl(&out(255, ""));
        assert!(verdict.summary.contains("vm.swappiness unset"));
    }

    #[test]
    fn test_timezone_and_services() {
        assert!(verify_timezone(&out(0, "America/Santiago\nactive\n"), "America/Santiago")
            .classification
            .is_ok());
        let verdict = verify_timezone(&out(3, "UTC\ninactive\n"), "America/Santiago");
        assert!(verdict.summary.contains("'UTC'"));

        let verdict = verify_services(&out(3, "active\ninactive\nactive\n"));
        assert_eq!(verdict.summary, "inactive: sysstat:inactive");
    }

    #[test]
    fn test_registry_every_check_has_remediation_except_connectivity() {
        let registry = node_registry(&DiagnosticsConfig::default()).unwrap();
        assert_eq!(registry.len(), 12);
        for check in registry.checks() {
            assert_eq!(check.remediation.is_none(), check.id == ids::CONNECTIVITY, "{}", check.id);
        }
    }
}
