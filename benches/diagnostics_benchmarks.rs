use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fleetcheck_core::diagnostics::cluster_checks::verify_nodes_ready;
use fleetcheck_core::diagnostics::{CheckOutcome, CheckScope, SeverityClassifier, Table};
use fleetcheck_core::models::{Classification, EvidenceSection, Outcome, TargetId};

fn node_listing(rows: usize) -> String {
    let mut text = String::from("NAME        STATUS   ROLES    AGE   VERSION\n");
    for i in 0..rows {
        let status = if i % 17 == 0 { "NotReady" } else { "Ready" };
        text.push_str(&format!("node-{i:04}   {status}   <none>   40d   v1.28.9+rke2r1\n"));
    }
    text
}

fn benchmark_table_parse(c: &mut Criterion) {
    let listing = node_listing(200);
    c.bench_function("table_parse_200_rows", |b| {
        b.iter(|| Table::parse(black_box(&listing)))
    });
}

fn benchmark_verify_nodes_ready(c: &mut Criterion) {
    let sections = vec![EvidenceSection::new("kubectl get nodes", Some(0), node_listing(200), "")];
    c.bench_function("verify_nodes_ready_200_rows", |b| {
        b.iter(|| verify_nodes_ready(black_box(&sections)))
    });
}

fn benchmark_classify(c: &mut Criterion) {
    let ids = ["2.1", "2.2", "2.3", "3.2", "4.2", "4.3", "5.1", "6.1"];
    let outcomes: Vec<CheckOutcome> = (0..64)
        .map(|i| {
            let id = ids[i % ids.len()];
            let classification = match i % 5 {
                0 => Classification::Fail,
                1 => Classification::NotApplicable,
                _ => Classification::Ok,
            };
            CheckOutcome {
                check_id: id.to_string(),
                name: format!("check {id}"),
                category: "bench".to_string(),
                scope: CheckScope::InScope,
                remediation: String::new(),
                outcome: Outcome::classified(TargetId::new("ctx"), id, classification, "bench"),
            }
        })
        .collect();
    let classifier = SeverityClassifier::default();
    c.bench_function("classify_64_outcomes", |b| {
        b.iter(|| classifier.classify(black_box(&outcomes)))
    });
}

criterion_group!(
    benches,
    benchmark_table_parse,
    benchmark_verify_nodes_ready,
    benchmark_classify
);
criterion_main!(benches);
