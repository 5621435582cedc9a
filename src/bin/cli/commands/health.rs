//! `fleetcheck health`

use std::path::PathBuf;

use fleetcheck_core::config::FleetConfig;
use fleetcheck_core::diagnostics::{
    cluster_registry, preflight_cluster, DiagnosticEngine, SeverityClassifier,
};
use fleetcheck_core::models::{RunMetadata, Target};
use fleetcheck_core::report::ReportBuilder;

use crate::cli::Services;

pub async fn handle_health_command(
    config: &FleetConfig,
    kubectl: Option<PathBuf>,
    title: String,
) -> anyhow::Result<i32> {
    let services = Services::new(config, None);
    let mut run = RunMetadata::new(title);

    let explicit = kubectl.or_else(|| config.diagnostics.kubectl.clone());
    let kubectl =
        preflight_cluster(&services.executor, &services.store, &mut run, explicit.as_deref())
            .await?;

    let registry = cluster_registry(&kubectl, &config.diagnostics)?;
    let engine = DiagnosticEngine::new(
        services.executor.clone(),
        services.retry,
        services.store.clone(),
        &config.diagnostics,
    );
    let target = Target::local(run.context.clone().unwrap_or_else(|| "local".to_string()));
    let outcomes = engine.run_all(&registry, &target, &run.run_id).await?;

    let classifier = SeverityClassifier::from_config(&config.diagnostics);
    let verdict = classifier.classify(&outcomes);
    let tally = classifier.tally(&outcomes);
    tracing::info!(
        verdict = %verdict,
        ok = tally.ok,
        failed = tally.failed,
        critical_failed = tally.critical_failed,
        not_applicable = tally.not_applicable,
        "Cluster classified"
    );

    let report =
        ReportBuilder::new(&config.report).build(&run, &outcomes, verdict, &services.store);
    report.write(&services.store)?;
    println!("{}", report.render(services.style));

    Ok(report.exit_code())
}
