//! `fleetcheck exec`

use fleetcheck_core::config::FleetConfig;
use fleetcheck_core::execution::FanoutCoordinator;
use fleetcheck_core::models::{ExpectedOutput, Operation};
use fleetcheck_core::report::FleetSummary;

use crate::cli::{resolve_targets, ExecOptions, Services};

pub async fn handle_exec_command(
    mut config: FleetConfig,
    options: ExecOptions,
) -> anyhow::Result<i32> {
    options.overrides.apply(&mut config)?;
    let services = Services::remote(&config)?;
    let targets = resolve_targets(&options.selection, &config, &services.executor).await?;

    let mut operation = Operation::new(&options.name, &options.command);
    if let Some(needle) = options.expect_contains {
        operation = operation.expecting(ExpectedOutput::Contains(needle));
    }

    let fanout = FanoutCoordinator::new(services.executor, services.retry, &config.fanout);
    let outcomes = fanout.dispatch(&targets, &operation).await;

    let summary = FleetSummary::new(&operation.name, outcomes);
    println!("{}", summary.render(services.style));
    if let Some(path) = &options.json_report {
        summary.write_json(path)?;
        println!("summary written to {}", path.display());
    }
    Ok(summary.exit_code())
}
