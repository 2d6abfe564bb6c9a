use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mvirt_task::config::DEFAULT_LABEL_NAMESPACE;
use mvirt_task::{ContainerSpec, PortBinding, Task, TaskConfig, TaskState, TaskStatus};

/// Build a task descriptor for a container and optionally replay status events.
#[derive(Parser, Debug)]
#[command(name = "mvirt-task", version, about)]
struct Args {
    /// Container image (e.g., docker.io/library/alpine:latest)
    #[arg(long)]
    image: String,

    /// Task name, used as prefix of the task ID
    #[arg(long, default_value = "")]
    name: String,

    /// Node ID the task is placed on
    #[arg(long)]
    node: String,

    /// CPU shares to claim
    #[arg(long, default_value = "0")]
    cpu_shares: i64,

    /// Memory limit in bytes
    #[arg(long, default_value = "0")]
    memory: i64,

    /// Network mode (none, host, bridge)
    #[arg(long, default_value = "")]
    network: String,

    /// Container labels (format: key=value, can be repeated)
    #[arg(long, value_parser = parse_label)]
    label: Vec<(String, String)>,

    /// Port bindings (format: [host:]container[/proto], can be repeated)
    #[arg(short, long, value_parser = parse_port)]
    publish: Vec<PortBinding>,

    /// Publish all exposed ports
    #[arg(short = 'P', long)]
    publish_all: bool,

    /// Namespace for labels reserved by mvirt
    #[arg(long, default_value = DEFAULT_LABEL_NAMESPACE)]
    label_namespace: String,

    /// Status events to replay through the monitor (format: STATE[:message], can be repeated)
    #[arg(long, value_parser = parse_status)]
    replay: Vec<(TaskState, Option<String>)>,

    /// Seconds to wait for each status event while replaying
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Command and arguments, passed verbatim (no shell)
    #[arg(last = true)]
    cmd: Vec<String>,
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or("Expected format: key=value".to_string())?;
    if key.is_empty() {
        return Err("Label key must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_port(s: &str) -> Result<PortBinding, String> {
    let (ports, protocol) = s.split_once('/').unwrap_or((s, "tcp"));
    let (host, container) = match ports.split_once(':') {
        Some((host, container)) => (Some(host), container),
        None => (None, ports),
    };
    let container_port = container
        .parse()
        .map_err(|_| format!("Invalid container port: {container}"))?;
    let host_port = host
        .map(|h| h.parse().map_err(|_| format!("Invalid host port: {h}")))
        .transpose()?;
    Ok(PortBinding {
        container_port,
        host_port,
        protocol: protocol.to_string(),
    })
}

fn parse_status(s: &str) -> Result<(TaskState, Option<String>), String> {
    let (state, message) = match s.split_once(':') {
        Some((state, message)) => (state, Some(message.to_string())),
        None => (s, None),
    };
    let state = state.parse().unwrap_or(TaskState::Other);
    Ok((state, message))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mvirt_task=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let spec = ContainerSpec {
        image: args.image,
        cmd: args.cmd,
        cpu_shares: args.cpu_shares,
        memory: args.memory,
        network_mode: args.network,
        labels: args.label.into_iter().collect(),
        port_bindings: args.publish,
        publish_all_ports: args.publish_all,
    };
    let config = TaskConfig {
        label_namespace: args.label_namespace,
        ..Default::default()
    };

    let mut task = Task::with_config(spec, &args.name, &config).context("Failed to create task")?;
    let report = task.build(&args.node);
    info!(
        "Built task {} for node {} ({} warnings)",
        task.id(),
        args.node,
        report.warnings.len()
    );

    println!(
        "{}",
        serde_json::to_string_pretty(task.descriptor()).context("Failed to encode descriptor")?
    );

    if args.replay.is_empty() {
        return Ok(());
    }

    let sender = task.status_sender();
    let replay = args.replay;
    let producer = tokio::spawn(async move {
        for (state, message) in replay {
            let status = TaskStatus {
                message,
                ..TaskStatus::new(sender.task_id(), state)
            };
            if let Err(e) = sender.send(status).await {
                warn!("Stopped replaying status events: {}", e);
                break;
            }
        }
    });

    let timeout = Duration::from_secs(args.timeout_secs);
    loop {
        match tokio::time::timeout(timeout, task.monitor()).await {
            Ok(Ok(false)) => continue,
            Ok(Ok(true)) => break,
            Ok(Err(e)) => {
                producer.abort();
                return Err(anyhow::Error::new(e).context(format!("Task {} failed", task.id())));
            }
            Err(_) => {
                producer.abort();
                bail!("Timed out waiting for status of task {}", task.id());
            }
        }
    }

    if !producer.is_finished() {
        warn!("Discarding status events received after terminal state");
        producer.abort();
    }

    if let Some(outcome) = task.outcome() {
        info!("Task {} ended in {}", task.id(), outcome.state());
    }

    Ok(())
}
