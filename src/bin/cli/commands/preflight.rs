//! `fleetcheck preflight`

use std::sync::Arc;

use fleetcheck_core::config::FleetConfig;
use fleetcheck_core::constants::preflight_checks;
use fleetcheck_core::diagnostics::{
    fleet_verdict, node_registry, run_on_hosts, DiagnosticEngine, SeverityClassifier,
};
use fleetcheck_core::execution::FanoutCoordinator;
use fleetcheck_core::models::RunMetadata;
use fleetcheck_core::report::render_host_reports;

use crate::cli::{resolve_targets, Overrides, Services, TargetSelection};

pub async fn handle_preflight_command(
    mut config: FleetConfig,
    selection: TargetSelection,
    overrides: Overrides,
) -> anyhow::Result<i32> {
    overrides.apply(&mut config)?;
    let services = Services::remote(&config)?;
    let targets = resolve_targets(&selection, &config, &services.executor).await?;
    let run = RunMetadata::new("Node preflight");

    let registry = Arc::new(node_registry(&config.diagnostics)?);
    let classifier = SeverityClassifier::new(preflight_checks::CRITICAL);
    let engine = DiagnosticEngine::new(
        services.executor.clone(),
        services.retry,
        services.store.clone(),
        &config.diagnostics,
    );
    let fanout = FanoutCoordinator::new(services.executor, services.retry, &config.fanout);

    let reports =
        run_on_hosts(&fanout, &engine, registry, &classifier, &targets, &run.run_id).await;
    let verdict = fleet_verdict(&reports);

    println!("{}", render_host_reports(&reports, verdict, services.style));
    println!("evidence: {}", services.store.run_dir(&run.run_id).display());
    Ok(verdict.exit_code())
}
