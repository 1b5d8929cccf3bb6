use clap::{Args, Subcommand};

use crate::client::PulseClient;
use crate::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check an ingest server's health endpoint.
    Health,
    /// Inspect quarantined telemetry for a tenant.
    Quarantine(QuarantineArgs),
    /// Inspect open alerts for a tenant.
    Alerts(AlertsArgs),
    /// Manage delivery jobs for a tenant.
    Jobs(JobsArgs),
}

#[derive(Args, Debug)]
pub struct QuarantineArgs {
    /// Tenant to inspect.
    pub tenant_id: String,
}

#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Tenant to inspect.
    pub tenant_id: String,
}

#[derive(Args, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// List dead (exhausted-retry) delivery jobs for a tenant.
    Dead {
        /// Tenant to inspect.
        tenant_id: String,
    },
    /// Requeue a dead job for another delivery attempt.
    Requeue {
        /// Tenant the job belongs to.
        tenant_id: String,
        /// Job to requeue.
        job_id: String,
    },
}

pub async fn health(client: &PulseClient) -> anyhow::Result<()> {
    match client.health().await {
        Ok(true) => {
            println!("pulse ingest server is healthy.");
            Ok(())
        }
        Ok(false) => {
            eprintln!("pulse ingest server returned unhealthy status.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("failed to reach server: {e}");
            std::process::exit(1);
        }
    }
}

pub async fn quarantine(
    client: &PulseClient,
    args: &QuarantineArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let events = client.list_quarantine(&args.tenant_id).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Text => {
            if events.is_empty() {
                println!("no quarantined telemetry for tenant {}", args.tenant_id);
            }
            for event in &events {
                println!(
                    "{observed} | {reason:?} | device={device} | {snippet}",
                    observed = event.observed_at,
                    reason = event.reason,
                    device = event
                        .device_id
                        .as_ref()
                        .map_or("<unknown>".to_string(), |id| id.to_string()),
                    snippet = event.payload_snippet,
                );
            }
        }
    }
    Ok(())
}

pub async fn alerts(
    client: &PulseClient,
    args: &AlertsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let alerts = client.list_alerts(&args.tenant_id).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&alerts)?),
        OutputFormat::Text => {
            if alerts.is_empty() {
                println!("no open alerts for tenant {}", args.tenant_id);
            }
            for alert in &alerts {
                println!(
                    "{id} | {severity:?} | {alert_type:?} | device={device} | opened={opened}",
                    id = alert.alert_id,
                    severity = alert.severity,
                    alert_type = alert.alert_type,
                    device = alert.device_id,
                    opened = alert.opened_at,
                );
            }
        }
    }
    Ok(())
}

pub async fn jobs(client: &PulseClient, args: &JobsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match &args.command {
        JobsCommand::Dead { tenant_id } => {
            let jobs = client.list_dead_jobs(tenant_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&jobs)?),
                OutputFormat::Text => {
                    if jobs.is_empty() {
                        println!("no dead jobs for tenant {tenant_id}");
                    }
                    for job in &jobs {
                        println!(
                            "{id} | alert={alert} | route={route} | attempts={attempt} | error={err}",
                            id = job.job_id,
                            alert = job.alert_id,
                            route = job.route_id,
                            attempt = job.attempt,
                            err = job.last_error.as_deref().unwrap_or("<none>"),
                        );
                    }
                }
            }
        }
        JobsCommand::Requeue { tenant_id, job_id } => {
            client.requeue_job(tenant_id, job_id).await?;
            println!("requeued job {job_id} for tenant {tenant_id}");
        }
    }
    Ok(())
}
