//! Abstract container specification handed in by the cluster manager.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Workload to run as a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image reference, passed through by name.
    pub image: String,
    /// Literal argv vector. Never interpreted by a shell.
    #[serde(default)]
    pub cmd: Vec<String>,
    /// CPU share count. Values <= 0 mean "no claim".
    #[serde(default)]
    pub cpu_shares: i64,
    /// Memory limit in bytes. Values <= 0 mean "no claim".
    #[serde(default)]
    pub memory: i64,
    /// One of `none`, `host`, `bridge` or empty.
    #[serde(default)]
    pub network_mode: String,
    /// Container labels, passed to the runtime as `label` parameters.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Requested port mappings (`-p`).
    #[serde(default)]
    pub port_bindings: Vec<PortBinding>,
    /// Publish every exposed port (`-P`).
    #[serde(default)]
    pub publish_all_ports: bool,
}

/// A single container port mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub container_port: u16,
    pub host_port: Option<u16>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "tcp".to_string()
}

impl ContainerSpec {
    /// Create a spec for `image` with everything else defaulted.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Store `value` under `key` qualified by `namespace`.
    pub fn set_namespaced_label(&mut self, namespace: &str, key: &str, value: &str) {
        let key = if namespace.is_empty() {
            key.to_string()
        } else {
            format!("{namespace}.{key}")
        };
        self.labels.insert(key, value.to_string());
    }

    /// Returns `true` if any port mapping was requested.
    pub fn has_port_mappings(&self) -> bool {
        self.publish_all_ports || !self.port_bindings.is_empty()
    }
}
