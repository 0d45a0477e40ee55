//! Plugin-instance and task-polling scenarios against the in-memory transport.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lodestone_client::memory::MemoryTransport;
use lodestone_client::{CreateIndexParams, CreatePluginInstanceParams, Lodestone};
use lodestone_core::error::LodestoneError;
use lodestone_core::models::{TaskState, TrainingParameters};

#[tokio::test]
async fn test_tagger_instance_returns_tags() {
    let client = Lodestone::with_transport(Arc::new(MemoryTransport::new()));

    let instance = client
        .create_plugin_instance(CreatePluginInstanceParams::new("acme-tagger"))
        .await
        .unwrap();
    assert_eq!(instance.handle.as_deref(), Some("acme-tagger"));

    let result = instance.tag("hello world").await.unwrap();
    assert_eq!(result.tags.len(), 1);
    assert_eq!(result.tags[0].name, "hello world");
}

#[tokio::test]
async fn test_instance_handle_and_config_pass_through() {
    let client = Lodestone::with_transport(Arc::new(MemoryTransport::new()));

    let instance = client
        .create_plugin_instance(
            CreatePluginInstanceParams::new("acme-tagger")
                .with_handle("tagger-prod")
                .with_config(serde_json::json!({ "lang": "en" })),
        )
        .await
        .unwrap();

    assert_eq!(instance.handle.as_deref(), Some("tagger-prod"));
}

#[tokio::test]
async fn test_trainable_instance_reports_training_parameters() {
    let transport = MemoryTransport::new();

    let mut expected = TrainingParameters {
        training_epochs: Some(3),
        testing_holdout_percent: Some(0.3),
        training_params: BTreeMap::new(),
    };
    expected
        .training_params
        .insert("learning_rate".to_string(), serde_json::json!(0.01));
    transport.set_training_parameters(expected.clone());

    let client = Lodestone::with_transport(Arc::new(transport));
    let instance = client
        .create_plugin_instance(CreatePluginInstanceParams::new("acme-trainer"))
        .await
        .unwrap();

    let params = instance.get_training_parameters().await.unwrap();
    assert_eq!(params.training_epochs, expected.training_epochs);
    let holdout = params.testing_holdout_percent.unwrap();
    assert!((holdout - 0.3).abs() < 0.0001);
    assert_eq!(params.training_params, expected.training_params);
}

#[tokio::test]
async fn test_train_task_polls_to_completion() {
    let transport = MemoryTransport::new().with_task_latency(2);
    let client = Lodestone::with_transport(Arc::new(transport));

    let instance = client
        .create_plugin_instance(CreatePluginInstanceParams::new("acme-trainer"))
        .await
        .unwrap();

    let mut task = instance.train(&TrainingParameters::default()).await.unwrap();
    assert_eq!(task.state, TaskState::Waiting);

    assert_eq!(task.refresh().await.unwrap(), TaskState::Running);

    task.wait_with(Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(task.state, TaskState::Succeeded);
}

#[tokio::test]
async fn test_embed_task_completes() {
    let client = Lodestone::with_transport(Arc::new(MemoryTransport::new()));
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    let mut task = index.embed().await.unwrap();
    task.wait().await.unwrap();
    assert_eq!(task.state, TaskState::Succeeded);
}

#[tokio::test]
async fn test_failed_task_surfaces_failure() {
    let transport = MemoryTransport::new().with_failing_tasks();
    let client = Lodestone::with_transport(Arc::new(transport));
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    let mut task = index.embed().await.unwrap();
    let err = task
        .wait_with(Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LodestoneError::TaskFailed { .. }));
}

#[tokio::test]
async fn test_slow_task_times_out() {
    let transport = MemoryTransport::new().with_task_latency(u32::MAX);
    let client = Lodestone::with_transport(Arc::new(transport));
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    let mut task = index.embed().await.unwrap();
    let err = task
        .wait_with(Duration::from_millis(5), Duration::from_millis(30))
        .await
        .unwrap_err();
    assert!(matches!(err, LodestoneError::TaskTimeout { .. }));
}

#[tokio::test]
async fn test_task_reattaches_by_id() {
    let transport = MemoryTransport::new().with_task_latency(1);
    let client = Lodestone::with_transport(Arc::new(transport));
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    let task = index.embed().await.unwrap();
    let task_id = task.task_id.clone();

    // A fresh handle from the bare id sees the same task
    let mut reattached = client.task(task_id).await.unwrap();
    reattached
        .wait_with(Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(reattached.state, TaskState::Succeeded);
}

#[tokio::test]
async fn test_deleted_instance_surfaces_not_found() {
    let client = Lodestone::with_transport(Arc::new(MemoryTransport::new()));
    let instance = client
        .create_plugin_instance(CreatePluginInstanceParams::new("acme-tagger"))
        .await
        .unwrap();

    instance.delete().await.unwrap();

    assert!(instance.tag("text").await.unwrap_err().is_not_found());
    assert!(instance
        .get_training_parameters()
        .await
        .unwrap_err()
        .is_not_found());
}
