//! End-to-end pipeline scenarios over the public API.

use async_trait::async_trait;
use nimbus_pipeline::{
    Artifact, Pipeline, PipelineConfig, PipelineError, RenderError, Renderer, Stage, State,
    TableRenderer,
};
use nimbus_table::{Column, Dataset, Matrix};
use std::sync::Arc;
use std::time::Duration;

fn noisy_ramp(rows: usize) -> Vec<f64> {
    (0..rows)
        .map(|i| i as f64 + 0.05 * ((i * 37) % 10) as f64)
        .collect()
}

fn scramble(i: u64) -> u64 {
    let mut z = i.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn scrambled(rows: usize) -> Vec<f64> {
    (0..rows as u64)
        .map(|i| (scramble(i) % 1000) as f64 / 100.0)
        .collect()
}

fn trend_dataset(rows: usize) -> Dataset {
    Dataset::new(vec![
        Column::numeric_dense("signal", noisy_ramp(rows)),
        Column::categorical(
            "tag",
            (0..rows).map(|i| Some(format!("t{}", i % 3))).collect(),
        ),
    ])
}

fn diff_variance(values: &[f64]) -> f64 {
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let mu = diffs.iter().sum::<f64>() / diffs.len() as f64;
    diffs.iter().map(|d| (d - mu).powi(2)).sum::<f64>() / diffs.len() as f64
}

fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }
    sxy / sxx
}

/// Sleeps before answering; used to exercise conflicts, cancels, timeouts.
struct SlowRenderer(Duration);

#[async_trait]
impl Renderer for SlowRenderer {
    async fn render(&self, stage: Stage, matrix: &Matrix) -> Result<Artifact, RenderError> {
        tokio::time::sleep(self.0).await;
        TableRenderer::new().render(stage, matrix).await
    }
}

/// Fails on one specific stage, succeeds on the rest.
struct FailOn(Stage);

#[async_trait]
impl Renderer for FailOn {
    async fn render(&self, stage: Stage, matrix: &Matrix) -> Result<Artifact, RenderError> {
        if stage == self.0 {
            return Err(RenderError::Failed("renderer crashed".to_string()));
        }
        TableRenderer::new().render(stage, matrix).await
    }
}

#[tokio::test]
async fn trend_dataset_completes_all_four_stages() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(trend_dataset(100));

    let state = pipeline.run(id).await.unwrap();
    assert_eq!(state, State::Completed);

    let results = pipeline.stage_results(id).unwrap();
    let stages: Vec<Stage> = results.iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    for result in &results {
        assert_eq!(result.matrix.rows(), 100);
        let artifact = result.artifact.as_ref().expect("artifact present");
        assert_eq!(artifact.content_type(), "application/json");
        assert!(!artifact.is_empty());
        // Categorical columns ride along untouched.
        assert_eq!(result.categorical.len(), 1);
        assert_eq!(result.categorical[0].name(), "tag");
    }

    let summary = pipeline.summary(id).unwrap();
    assert_eq!(summary.dataset.rows, 100);
    assert_eq!(summary.labels["signal"].name(), "trend");
}

#[tokio::test]
async fn salting_amplifies_and_smoothing_reduces_noise() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(trend_dataset(100));
    pipeline.run(id).await.unwrap();

    let original = pipeline.get_stage(id, Stage::Plot).unwrap();
    let salted = pipeline.get_stage(id, Stage::Salt).unwrap();
    let smoothed = pipeline.get_stage(id, Stage::Smooth).unwrap();

    let o = &original.matrix.series_named("signal").unwrap().values;
    let sa = &salted.matrix.series_named("signal").unwrap().values;
    let sm = &smoothed.matrix.series_named("signal").unwrap().values;

    assert_eq!(sa.len(), o.len());
    assert_eq!(sm.len(), o.len());
    assert_ne!(sa, o, "salting must perturb the series");
    // Noise reduction: smoothing damps point-to-point variation.
    assert!(diff_variance(sm) < diff_variance(sa));
    // The underlying upward trend survives both transformations.
    assert!(slope(sa) > 0.0);
    assert!(slope(sm) > 0.0);
}

#[tokio::test]
async fn graph_stage_carries_all_three_views() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(trend_dataset(60));
    pipeline.run(id).await.unwrap();

    let graph = pipeline.get_stage(id, Stage::Graph).unwrap();
    assert_eq!(graph.matrix.width(), 3);
    assert!(graph.matrix.series_named("signal").is_some());
    assert!(graph.matrix.series_named("signal_salted").is_some());
    assert!(graph.matrix.series_named("signal_smoothed").is_some());
    assert_eq!(graph.matrix.rows(), 60);
}

#[tokio::test]
async fn empty_dataset_fails_at_submit() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(Dataset::new(vec![]));

    let status = pipeline.status(id).unwrap();
    assert_eq!(status.state, State::Failed);
    let failure = status.failure.unwrap();
    assert_eq!(failure.during, State::Validating);
    assert_eq!(failure.error.kind(), "validation");

    // No stage ever ran.
    let err = pipeline.get_stage(id, Stage::Plot).unwrap_err();
    assert!(matches!(err, PipelineError::StageNotFound { .. }));

    // Running a terminal session is a no-op.
    assert_eq!(pipeline.run(id).await.unwrap(), State::Failed);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let ghost = nimbus_pipeline::SessionId::new();
    assert!(pipeline.status(ghost).unwrap_err().is_not_found());
    assert!(pipeline.run(ghost).await.unwrap_err().is_not_found());
    assert!(pipeline.cancel(ghost).unwrap_err().is_not_found());
}

#[tokio::test]
async fn concurrent_run_on_same_session_is_rejected() {
    let pipeline = Arc::new(Pipeline::new(
        PipelineConfig::default(),
        Arc::new(SlowRenderer(Duration::from_millis(300))),
    ));
    let id = pipeline.submit(trend_dataset(50));

    let racer = Arc::clone(&pipeline);
    let handle = tokio::spawn(async move { racer.run(id).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = pipeline.run(id).await.unwrap_err();
    assert!(err.is_conflict());

    // The winning run is unaffected.
    assert_eq!(handle.await.unwrap().unwrap(), State::Completed);
    // And the slot is free again afterwards.
    assert_eq!(pipeline.run(id).await.unwrap(), State::Completed);
}

#[tokio::test]
async fn renderer_failure_keeps_computed_results() {
    let pipeline = Pipeline::new(PipelineConfig::default(), Arc::new(FailOn(Stage::Smooth)));
    let id = pipeline.submit(trend_dataset(40));

    assert_eq!(pipeline.run(id).await.unwrap(), State::Failed);
    let failure = pipeline.status(id).unwrap().failure.unwrap();
    assert_eq!(failure.during, State::Rendering);
    assert!(matches!(
        failure.error,
        PipelineError::ExternalProcess {
            stage: Stage::Smooth,
            ..
        }
    ));

    // Earlier stages keep their artifacts.
    assert!(pipeline.get_stage(id, Stage::Plot).unwrap().artifact.is_some());
    assert!(pipeline.get_stage(id, Stage::Salt).unwrap().artifact.is_some());
    // The failed stage keeps its computed matrix, minus the artifact.
    let smooth = pipeline.get_stage(id, Stage::Smooth).unwrap();
    assert!(smooth.artifact.is_none());
    assert_eq!(smooth.matrix.rows(), 40);
    // The graph stage never ran.
    assert!(pipeline.get_stage(id, Stage::Graph).unwrap_err().is_not_found());
}

#[tokio::test]
async fn renderer_timeout_fails_the_session() {
    let config = PipelineConfig::default().with_render_timeout(Duration::from_millis(50));
    let pipeline = Pipeline::new(config, Arc::new(SlowRenderer(Duration::from_secs(5))));
    let id = pipeline.submit(trend_dataset(30));

    assert_eq!(pipeline.run(id).await.unwrap(), State::Failed);
    let failure = pipeline.status(id).unwrap().failure.unwrap();
    assert!(matches!(
        failure.error,
        PipelineError::ExternalProcess {
            stage: Stage::Plot,
            source: RenderError::Timeout(_),
        }
    ));
}

#[tokio::test]
async fn cancel_stops_between_stages_and_keeps_partial_results() {
    let pipeline = Arc::new(Pipeline::new(
        PipelineConfig::default(),
        Arc::new(SlowRenderer(Duration::from_millis(300))),
    ));
    let id = pipeline.submit(trend_dataset(50));

    let runner = Arc::clone(&pipeline);
    let handle = tokio::spawn(async move { runner.run(id).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    pipeline.cancel(id).unwrap();

    assert_eq!(handle.await.unwrap().unwrap(), State::Failed);
    let failure = pipeline.status(id).unwrap().failure.unwrap();
    assert_eq!(failure.error.kind(), "cancelled");

    // The first render finished before the flag was observed.
    assert!(pipeline.get_stage(id, Stage::Plot).is_ok());
    assert!(pipeline.get_stage(id, Stage::Graph).unwrap_err().is_not_found());
}

#[tokio::test]
async fn cancel_of_idle_session_is_a_no_op() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(trend_dataset(20));
    pipeline.cancel(id).unwrap();
    // A later run proceeds normally.
    assert_eq!(pipeline.run(id).await.unwrap(), State::Completed);
}

#[tokio::test]
async fn sessions_run_independently() {
    let pipeline = Arc::new(Pipeline::with_default_renderer(PipelineConfig::default()));
    let ids: Vec<_> = (0..4).map(|_| pipeline.submit(trend_dataset(80))).collect();

    let runs = ids.iter().map(|id| {
        let p = Arc::clone(&pipeline);
        let id = *id;
        async move { p.run(id).await }
    });
    for state in futures::future::join_all(runs).await {
        assert_eq!(state.unwrap(), State::Completed);
    }
    assert_eq!(pipeline.session_count(), 4);
}

#[tokio::test]
async fn salting_noise_is_isolated_per_session() {
    // A noise-like column salts from a seed derived per session, so two
    // sessions over identical data produce different salted series.
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let dataset = Dataset::new(vec![Column::numeric_dense("noise", scrambled(80))]);

    let a = pipeline.submit(dataset.clone());
    let b = pipeline.submit(dataset);
    assert_eq!(pipeline.run(a).await.unwrap(), State::Completed);
    assert_eq!(pipeline.run(b).await.unwrap(), State::Completed);
    assert_eq!(pipeline.summary(a).unwrap().labels["noise"].name(), "random");

    let salted_a = pipeline.get_stage(a, Stage::Salt).unwrap();
    let salted_b = pipeline.get_stage(b, Stage::Salt).unwrap();
    assert_ne!(
        salted_a.matrix.series_named("noise").unwrap().values,
        salted_b.matrix.series_named("noise").unwrap().values,
    );

    // Within one session, reads are stable.
    let again = pipeline.get_stage(a, Stage::Salt).unwrap();
    assert_eq!(
        salted_a.matrix.series_named("noise").unwrap().values,
        again.matrix.series_named("noise").unwrap().values,
    );
}

#[tokio::test]
async fn capacity_bound_evicts_idle_sessions() {
    let config = PipelineConfig::default().with_max_sessions(2);
    let pipeline = Pipeline::with_default_renderer(config);
    let first = pipeline.submit(trend_dataset(10));
    pipeline.submit(trend_dataset(10));
    pipeline.submit(trend_dataset(10));

    assert_eq!(pipeline.session_count(), 2);
    assert!(pipeline.status(first).unwrap_err().is_not_found());
}

#[tokio::test]
async fn expired_sessions_can_be_evicted() {
    let config = PipelineConfig::default().with_max_session_age(Duration::ZERO);
    let pipeline = Pipeline::with_default_renderer(config);
    let id = pipeline.submit(trend_dataset(10));
    pipeline.run(id).await.unwrap();

    assert_eq!(pipeline.evict_expired(), 1);
    assert_eq!(pipeline.session_count(), 0);
    assert!(pipeline.status(id).unwrap_err().is_not_found());
}

#[tokio::test]
async fn explicit_eviction_drops_artifacts() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(trend_dataset(10));
    pipeline.run(id).await.unwrap();

    assert!(pipeline.evict(id));
    assert!(!pipeline.evict(id));
    assert!(pipeline.get_stage(id, Stage::Plot).unwrap_err().is_not_found());
}

#[tokio::test]
async fn summary_labels_appear_after_classification() {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());
    let id = pipeline.submit(trend_dataset(50));

    assert!(pipeline.summary(id).unwrap().labels.is_empty());
    pipeline.run(id).await.unwrap();
    assert!(!pipeline.summary(id).unwrap().labels.is_empty());
}
