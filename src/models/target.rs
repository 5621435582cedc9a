use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a target; used as the sort key for deterministic output
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-target SSH overrides; unset fields fall back to [`SshConfig`](crate::config::SshConfig)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshParams {
    pub user: Option<String>,
    pub port: Option<u16>,
}

/// How commands reach the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transport {
    /// Commands run on this machine (e.g. the local control-plane context)
    Local,
    /// Commands run through the `ssh` client
    Ssh(SshParams),
}

/// An addressable endpoint. Immutable once dispatch begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// Human name (node name); defaults to the address
    pub name: String,
    /// Hostname or IP used by the transport
    pub address: String,
    pub transport: Transport,
}

impl Target {
    /// A remote host reached over SSH with default connection parameters
    pub fn ssh(name: impl Into<String>, address: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: TargetId::new(name.clone()),
            name,
            address: address.into(),
            transport: Transport::Ssh(SshParams::default()),
        }
    }

    /// The local machine, named after the context it represents
    pub fn local(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: TargetId::new(name.clone()),
            name,
            address: "localhost".to_string(),
            transport: Transport::Local,
        }
    }

    /// Parse a CLI host spec: `address`, `name=address` or `user@address:port`
    /// (the latter two may be combined as `name=user@address:port`).
    pub fn parse_host_spec(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        let (name, rest) = match spec.split_once('=') {
            Some((name, rest)) => (Some(name.trim()), rest.trim()),
            None => (None, spec),
        };
        let (user, host_port) = match rest.split_once('@') {
            Some((user, host_port)) => (Some(user.to_string()), host_port),
            None => (None, rest),
        };
        let (address, port) = match host_port.rsplit_once(':') {
            Some((address, port)) => (address, Some(port.parse::<u16>().ok()?)),
            None => (host_port, None),
        };
        if address.is_empty() || name.is_some_and(str::is_empty) {
            return None;
        }
        let name = name.unwrap_or(address).to_string();
        Some(Self {
            id: TargetId::new(name.clone()),
            name,
            address: address.to_string(),
            transport: Transport::Ssh(SshParams { user, port }),
        })
    }

    pub fn is_local(&self) -> bool {
        matches!(self.transport, Transport::Local)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.address {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.address)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_address() {
        let target = Target::parse_host_spec("10.0.0.14").unwrap();
        assert_eq!(target.name, "10.0.0.14");
        assert_eq!(target.address, "10.0.0.14");
        assert_eq!(target.transport, Transport::Ssh(SshParams::default()));
        assert_eq!(target.to_string(), "10.0.0.14");
    }

    #[test]
    fn test_parse_named_spec_with_user_and_port() {
        let target = Target::parse_host_spec("cp-1=admin@10.0.0.11:2222").unwrap();
        assert_eq!(target.id.as_str(), "cp-1");
        assert_eq!(target.address, "10.0.0.11");
        assert_eq!(
            target.transport,
            Transport::Ssh(SshParams {
                user: Some("admin".to_string()),
                port: Some(2222)
            })
        );
        assert_eq!(target.to_string(), "cp-1 (10.0.0.11)");
    }

    #[test]
    fn test_parse_rejects_malformed_specs() {
        assert!(Target::parse_host_spec("").is_none());
        assert!(Target::parse_host_spec("=10.0.0.1").is_none());
        assert!(Target::parse_host_spec("host:notaport").is_none());
    }

    #[test]
    fn test_local_target() {
        let target = Target::local("default");
        assert!(target.is_local());
        assert_eq!(target.address, "localhost");
    }
}
