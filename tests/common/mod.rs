//! Shared fakes for the integration tests.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fleetcheck_core::config::{DiagnosticsConfig, ExecutorConfig, FanoutConfig};
use fleetcheck_core::evidence::EvidenceStore;
use fleetcheck_core::execution::{
    CommandRunner, FanoutCoordinator, RawOutput, RemoteExecutor, RetryPolicy, TransportError,
};
use fleetcheck_core::models::Target;
use fleetcheck_core::DiagnosticEngine;

/// Scripted behaviour of one host
#[derive(Debug, Clone)]
pub enum HostBehavior {
    Succeed(String),
    Exit(i32, String),
    /// Never answers; only the executor timeout ends the call
    Hang,
    Refuse(String),
    /// Fails with exit 1 this many times, then succeeds
    FlakyFor(u32),
    Panic,
}

/// Runner answering per target name and counting calls
#[derive(Debug, Default)]
pub struct ScriptedHosts {
    behaviors: HashMap<String, HostBehavior>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedHosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, behavior: HostBehavior) -> Self {
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    pub fn calls(&self, name: &str) -> u32 {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CommandRunner for ScriptedHosts {
    async fn run(&self, target: &Target, _command: &str) -> Result<RawOutput, TransportError> {
        let call = {
            let mut calls = self.calls.lock();
            let count = calls.entry(target.name.clone()).or_insert(0);
            *count += 1;
            *count
        };
        match self.behaviors.get(&target.name) {
            None => Ok(RawOutput::new(0, format!("{} OK\n", target.name), "")),
            Some(HostBehavior::Succeed(stdout)) => Ok(RawOutput::new(0, stdout.clone(), "")),
            Some(HostBehavior::Exit(code, stderr)) => Ok(RawOutput::new(*code, "", stderr.clone())),
            Some(HostBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(RawOutput::new(0, "", ""))
            }
            Some(HostBehavior::Refuse(reason)) => Err(TransportError::Connection {
                address: target.address.clone(),
                reason: reason.clone(),
            }),
            Some(HostBehavior::FlakyFor(failures)) if call <= *failures => {
                Ok(RawOutput::new(1, "", format!("attempt {call} failed")))
            }
            Some(HostBehavior::FlakyFor(_)) => Ok(RawOutput::new(0, "OK\n", "")),
            Some(HostBehavior::Panic) => panic!("runner exploded on {}", target.name),
        }
    }
}

/// Kubectl stand-in: the first rule whose pattern occurs in the command wins
#[derive(Debug, Clone)]
pub struct FakeCluster {
    rules: Vec<(String, RawOutput)>,
}

pub const NODES: &str = "\
NAME   STATUS   ROLES                       AGE   VERSION
cp-1   Ready    control-plane,etcd,master   40d   v1.28.9+rke2r1
w-1    Ready    <none>                      40d   v1.28.9+rke2r1
";

pub const KUBE_SYSTEM_PODS: &str = "\
NAME                            READY   STATUS    RESTARTS   AGE
etcd-cp-1                       1/1     Running   0          40d
kube-apiserver-cp-1             1/1     Running   0          40d
kube-controller-manager-cp-1    1/1     Running   0          40d
kube-scheduler-cp-1             1/1     Running   0          40d
rke2-coredns-rke2-coredns-abc   1/1     Running   0          40d
";

pub const DESCRIBE_NODES: &str = "\
Name:               cp-1
Conditions:
  Type             Status
  MemoryPressure   False
  DiskPressure     False
  PIDPressure      False
  Ready            True
Name:               w-1
Conditions:
  MemoryPressure   False
  DiskPressure     False
  PIDPressure      False
";

pub const SERVICES: &str = "\
NAME                        TYPE        CLUSTER-IP   EXTERNAL-IP   PORT(S)         AGE
rke2-coredns-rke2-coredns   ClusterIP   10.43.0.10   <none>        53/UDP,53/TCP   40d
";

pub const ENDPOINTS: &str = "\
NAME                        ENDPOINTS                   AGE
rke2-coredns-rke2-coredns   10.42.0.5:53,10.42.0.5:53   40d
";

pub const EVENTS: &str = "\
NAMESPACE   LAST SEEN   TYPE      REASON   OBJECT      MESSAGE
default     2m          Warning   Failed   pod/app-1   Error: ImagePullBackOff
";

pub const DNS_OK: &str = "\
Server:    10.43.0.10
Address 1: 10.43.0.10
Name:      kubernetes.default.svc.cluster.local
Address 1: 10.43.0.1
";

pub fn nodes_json(versions: &[&str]) -> String {
    let items: Vec<String> = versions
        .iter()
        .map(|v| format!(r#"{{"status":{{"nodeInfo":{{"kubeletVersion":"{v}"}}}}}}"#))
        .collect();
    format!(r#"{{"items":[{}]}}"#, items.join(","))
}

impl FakeCluster {
    pub fn healthy() -> Self {
        let ok = |stdout: &str| RawOutput::new(0, stdout, "");
        Self {
            rules: vec![
                (
                    "get nodes -o json".to_string(),
                    ok(&nodes_json(&["v1.28.9+rke2r1", "v1.28.9+rke2r1"])),
                ),
                ("get nodes".to_string(), ok(NODES)),
                ("get pods -n kube-system".to_string(), ok(KUBE_SYSTEM_PODS)),
                ("describe nodes".to_string(), ok(DESCRIBE_NODES)),
                ("run dns-check-".to_string(), ok(DNS_OK)),
                ("get svc -n kube-system".to_string(), ok(SERVICES)),
                ("get endpoints -n kube-system".to_string(), ok(ENDPOINTS)),
                ("get events".to_string(), ok(EVENTS)),
            ],
        }
    }

    /// Answer commands containing `pattern` with `output`, ahead of every other rule
    pub fn answer(mut self, pattern: &str, output: RawOutput) -> Self {
        self.rules.insert(0, (pattern.to_string(), output));
        self
    }
}

#[async_trait]
impl CommandRunner for FakeCluster {
    async fn run(&self, _target: &Target, command: &str) -> Result<RawOutput, TransportError> {
        self.rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| TransportError::Io(format!("unexpected command: {command}")))
    }
}

pub fn executor<R: CommandRunner + 'static>(runner: Arc<R>, timeout: Duration) -> RemoteExecutor {
    let config = ExecutorConfig {
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap(),
        connect_allowance_ms: 0,
    };
    RemoteExecutor::new(runner, &config)
}

pub fn coordinator<R: CommandRunner + 'static>(
    runner: Arc<R>,
    retry: RetryPolicy,
    pool_size: usize,
) -> FanoutCoordinator {
    FanoutCoordinator::new(
        executor(runner, Duration::from_secs(5)),
        retry,
        &FanoutConfig { pool_size },
    )
}

pub fn engine<R: CommandRunner + 'static>(
    runner: Arc<R>,
    store: Arc<EvidenceStore>,
) -> DiagnosticEngine {
    DiagnosticEngine::new(
        executor(runner, Duration::from_secs(5)),
        RetryPolicy::no_retry(),
        store,
        &DiagnosticsConfig::default(),
    )
}

pub fn hosts(names: &[&str]) -> Vec<Target> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Target::ssh(*name, format!("10.0.0.{}", i + 1)))
        .collect()
}
