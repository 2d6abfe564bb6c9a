//! Task descriptor wire format submitted to the cluster scheduler.

use serde::{Deserialize, Serialize};

/// Parameter key used for container labels.
pub const LABEL_PARAMETER: &str = "label";

/// Resource- and placement-annotated description of what to run and where.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: String,
    pub name: String,
    /// Execution node this task is bound to. Set last, by placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

/// Command to execute inside the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub shell: bool,
    /// Executable path. Unset means "use the image default".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Docker,
}

/// Container runtime binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    #[serde(rename = "type")]
    pub kind: ContainerType,
    pub docker: DockerInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerInfo {
    pub image: String,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

/// Container network modality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Network {
    /// Isolated, no network.
    None,
    /// Shared host network stack.
    Host,
    #[default]
    Bridge,
}

/// Free-form runtime parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Label parameter serialized as `key=value`.
    pub fn label(key: &str, value: &str) -> Self {
        Self::new(LABEL_PARAMETER, format!("{key}={value}"))
    }
}

/// Named scalar quantity claimed from a matched offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub scalar: f64,
}

impl Resource {
    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            scalar: value,
        }
    }
}

impl TaskDescriptor {
    /// Look up a resource claim by name.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Docker parameters, empty if no container is bound.
    pub fn parameters(&self) -> &[Parameter] {
        self.container
            .as_ref()
            .map(|c| c.docker.parameters.as_slice())
            .unwrap_or_default()
    }

    /// Label parameter values (`key=value`).
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.parameters()
            .iter()
            .filter(|p| p.key == LABEL_PARAMETER)
            .map(|p| p.value.as_str())
    }
}
