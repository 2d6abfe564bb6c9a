//! Task descriptor builder.
//!
//! Translates a [`ContainerSpec`] into the scheduler's descriptor format.
//! Building never fails: unsupported settings fall back to defaults and are
//! reported as [`BuildWarning`]s.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::descriptor::{
    CommandInfo, ContainerInfo, ContainerType, DockerInfo, Network, Parameter, Resource,
    TaskDescriptor,
};
use crate::spec::ContainerSpec;

/// Resource name for CPU share claims.
pub const CPUS: &str = "cpus";
/// Resource name for memory claims, in MiB.
pub const MEM: &str = "mem";

/// Non-fatal problem found while building a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// Network mode not understood; bridged networking was used instead.
    UnsupportedNetworkMode(String),
    /// Port mappings are not translated into the descriptor.
    PortMappingUnsupported { bindings: usize, publish_all: bool },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::UnsupportedNetworkMode(mode) => {
                write!(f, "unsupported network mode {mode:?}, using bridge")
            }
            BuildWarning::PortMappingUnsupported {
                bindings,
                publish_all,
            } => write!(
                f,
                "port mappings are not supported ({bindings} bindings, publish_all={publish_all})"
            ),
        }
    }
}

/// Warnings collected by one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Network chosen for a mode string, with the fallback made explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSelection {
    pub network: Network,
    pub warning: Option<BuildWarning>,
}

/// Command with shell interpretation disabled.
pub fn command_info(cmd: &[String]) -> CommandInfo {
    let mut command = CommandInfo {
        shell: false,
        ..Default::default()
    };

    if let Some(first) = cmd.first()
        && !first.is_empty()
    {
        command.value = Some(first.clone());
    }

    if cmd.len() > 1 {
        command.arguments = cmd[1..].to_vec();
    }

    command
}

/// Map a network mode string onto a container network.
pub fn select_network(mode: &str) -> NetworkSelection {
    let network = match mode {
        "none" => Network::None,
        "host" => Network::Host,
        "bridge" | "" => Network::Bridge,
        other => {
            return NetworkSelection {
                network: Network::Bridge,
                warning: Some(BuildWarning::UnsupportedNetworkMode(other.to_string())),
            };
        }
    };

    NetworkSelection {
        network,
        warning: None,
    }
}

/// Scalar resource claims. Non-positive values are omitted, not sent as zero.
pub fn resource_claims(spec: &ContainerSpec) -> Vec<Resource> {
    let mut resources = Vec::new();

    if spec.cpu_shares > 0 {
        resources.push(Resource::scalar(CPUS, spec.cpu_shares as f64));
    }

    if spec.memory > 0 {
        // Truncating, not rounding.
        resources.push(Resource::scalar(MEM, (spec.memory / 1024 / 1024) as f64));
    }

    resources
}

/// One `label` parameter per label, in the map's iteration order.
pub fn label_parameters(labels: &HashMap<String, String>) -> Vec<Parameter> {
    labels
        .iter()
        .map(|(key, value)| Parameter::label(key, value))
        .collect()
}

/// Populate `descriptor` from `spec` and bind it to `node`.
pub fn build(descriptor: &mut TaskDescriptor, spec: &ContainerSpec, node: &str) -> BuildReport {
    let mut report = BuildReport::default();

    descriptor.command = Some(command_info(&spec.cmd));

    let selection = select_network(&spec.network_mode);
    if let Some(warning) = selection.warning {
        warn!(task_id = %descriptor.task_id, "{warning}");
        report.warnings.push(warning);
    }

    // TODO: translate port bindings once the scheduler exposes port resources in offers.
    if spec.has_port_mappings() {
        let warning = BuildWarning::PortMappingUnsupported {
            bindings: spec.port_bindings.len(),
            publish_all: spec.publish_all_ports,
        };
        warn!(task_id = %descriptor.task_id, "{warning}");
        report.warnings.push(warning);
    }

    descriptor.container = Some(ContainerInfo {
        kind: ContainerType::Docker,
        docker: DockerInfo {
            image: spec.image.clone(),
            network: selection.network,
            parameters: label_parameters(&spec.labels),
        },
    });

    descriptor.resources = resource_claims(spec);

    // Placement goes last: everything above is independent of the node.
    descriptor.agent_id = Some(node.to_string());

    debug!(
        task_id = %descriptor.task_id,
        node,
        image = %spec.image,
        resources = descriptor.resources.len(),
        "built task descriptor"
    );

    report
}
