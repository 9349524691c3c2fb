//! Tests for the run context.

use super::{Adapter, RunContext};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
struct StubStore {
    root: String,
}

impl Adapter for StubStore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_context_creation() {
    let ctx = RunContext::new()
        .with_config("learning_rate", json!(0.001))
        .with_state("count", json!(0));

    assert_eq!(ctx.config("learning_rate"), Some(&json!(0.001)));
    assert_eq!(ctx.state("count"), Some(&json!(0)));
    assert!(ctx.state("missing").is_none());
    assert!(ctx.current_stage().is_none());
}

#[test]
fn test_state_overwrite_and_remove() {
    let mut ctx = RunContext::new().with_state("count", json!(0));

    ctx.put_state("count", json!(5));
    assert_eq!(ctx.state("count"), Some(&json!(5)));

    let removed = ctx.remove_state("count");
    assert_eq!(removed, Some(json!(5)));
    assert!(ctx.state("count").is_none());
}

#[test]
fn test_adapter_lookup() {
    let ctx = RunContext::new().with_adapter(
        "dataset_store",
        Arc::new(StubStore {
            root: "/data".to_string(),
        }),
    );

    assert!(ctx.adapter("dataset_store").is_some());
    assert!(ctx.adapter("training_client").is_none());

    let store = ctx.adapter_as::<StubStore>("dataset_store");
    assert_eq!(store.map(|s| s.root.as_str()), Some("/data"));
}

#[test]
fn test_metrics_chronological_read() {
    let mut ctx = RunContext::new();
    ctx.record_metric_at_step("loss", 0.9, 1);
    ctx.record_metric_at_step("loss", 0.6, 2);
    ctx.record_metric("accuracy", 0.8);

    let metrics = ctx.metrics();
    assert_eq!(metrics.len(), 3);
    assert_eq!(metrics[0].value, 0.9);
    assert_eq!(metrics[1].value, 0.6);
    assert_eq!(metrics[2].name, "accuracy");
}

#[test]
fn test_stage_metadata_overwritten() {
    let mut ctx = RunContext::new();

    ctx.set_current_stage(
        "load",
        [("shuffle".to_string(), json!(true))].into_iter().collect(),
    );
    assert_eq!(ctx.current_stage(), Some("load"));
    assert_eq!(ctx.stage_opts().get("shuffle"), Some(&json!(true)));

    ctx.set_current_stage("sample", std::collections::HashMap::new());
    assert_eq!(ctx.current_stage(), Some("sample"));
    assert!(ctx.stage_opts().is_empty());
}

#[test]
fn test_clone_isolates_state() {
    let mut original = RunContext::new().with_state("count", json!(1));
    let snapshot = original.clone();

    original.put_state("count", json!(2));
    assert_eq!(snapshot.state("count"), Some(&json!(1)));
    assert_eq!(original.run_id(), snapshot.run_id());
}
