//! Render pass tests: cache short-circuit, event ordering, cropping, diffing
//! and single-flight behavior, with a fake rasterizer standing in for Java.

mod common;

use common::{
    CountingCache, FakeOutput, FakeRasterizer, Gate, REFERENCE_COLOR, TestSuiteDir,
    leftover_outputs,
};
use image::{Rgba, RgbaImage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vdiff::{
    Backend, CoordinatorError, CoordinatorState, EventLog, ImageSource, NullSink, RasterSize,
    RenderCoordinator, RenderEvent, RenderSettings, TestSuite,
};

fn settings_with(suite: TestSuite, work_dir: PathBuf, backends: &[Backend]) -> RenderSettings {
    backends
        .iter()
        .fold(RenderSettings::new(suite, 240, work_dir), |settings, backend| {
            settings.with_backend(*backend, format!("/opt/{}.jar", backend.stable_name()))
        })
        .with_workers(4)
}

fn all_external(suite: TestSuite, work_dir: PathBuf) -> RenderSettings {
    settings_with(suite, work_dir, Backend::external())
}

fn position(events: &[RenderEvent], pred: impl Fn(&RenderEvent) -> bool) -> Vec<usize> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e))
        .map(|(i, _)| i)
        .collect()
}

/// Cached backends are served without running the rasterizer, and every
/// ImageReady precedes the single AllRendered.
#[tokio::test]
async fn test_cache_hits_skip_dispatch() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("rect-01", 100, 80, true);

    let cache = Arc::new(CountingCache::default());
    for backend in [Backend::Batik, Backend::Jsvg, Backend::SvgSalamander] {
        cache.seed(backend, &document, RgbaImage::from_pixel(240, 192, REFERENCE_COLOR));
    }
    let runner = Arc::new(FakeRasterizer::new(FakeOutput::Solid(REFERENCE_COLOR)));
    let coordinator = RenderCoordinator::new(cache.clone(), runner.clone());
    let events = EventLog::new();

    let outcome = coordinator
        .render(&document, &all_external(TestSuite::Results, suite.work_dir()), &events)
        .await
        .unwrap();

    // Reference and EchoSVG are the only renders left to do.
    assert_eq!(outcome.cache_hits, 3);
    assert_eq!(outcome.dispatched, 2);
    assert_eq!(runner.calls(), 1);
    assert_eq!(cache.gets(), 4);
    assert_eq!(cache.puts(), 1);
    assert!(cache.contains(Backend::EchoSvg, &document));
    assert_eq!(outcome.renders.len(), 5);

    let events = events.take();
    let ready = position(&events, |e| matches!(e, RenderEvent::ImageReady { .. }));
    let all_rendered = position(&events, |e| matches!(e, RenderEvent::AllRendered { .. }));
    assert_eq!(ready.len(), 5);
    assert_eq!(all_rendered.len(), 1);
    assert!(ready.iter().all(|i| *i < all_rendered[0]));

    let cached = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                RenderEvent::ImageReady {
                    source: ImageSource::Cached,
                    ..
                }
            )
        })
        .count();
    assert_eq!(cached, 3);
}

/// With every external backend cached, the reference is the only render
/// task; the four ready events still precede AllRendered.
#[tokio::test]
async fn test_fully_cached_pass_dispatches_only_reference() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("rect-01", 100, 80, true);

    let cache = Arc::new(CountingCache::default());
    let externals = [Backend::Batik, Backend::Jsvg, Backend::EchoSvg];
    for backend in externals {
        cache.seed(backend, &document, RgbaImage::from_pixel(240, 192, REFERENCE_COLOR));
    }
    let runner = Arc::new(FakeRasterizer::new(FakeOutput::Nothing));
    let coordinator = RenderCoordinator::new(cache.clone(), runner.clone());
    let events = EventLog::new();
    let settings = settings_with(TestSuite::Results, suite.work_dir(), &externals);

    let outcome = coordinator.render(&document, &settings, &events).await.unwrap();

    assert_eq!(outcome.dispatched, 1);
    assert_eq!(runner.calls(), 0);
    assert_eq!(cache.puts(), 0);
    assert_eq!(outcome.diffs.len(), 3);

    let events = events.take();
    let ready = position(&events, |e| matches!(e, RenderEvent::ImageReady { .. }));
    let all_rendered = position(&events, |e| matches!(e, RenderEvent::AllRendered { .. }));
    assert_eq!(ready.len(), 4);
    assert_eq!(all_rendered, vec![4]);
}

/// The ad-hoc corpus never touches the cache and has no reference or diffs.
#[tokio::test]
async fn test_custom_suite_bypasses_cache() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("shape", 100, 100, false);

    let cache = Arc::new(CountingCache::default());
    cache.seed(Backend::Batik, &document, RgbaImage::new(240, 240));
    let runner = Arc::new(FakeRasterizer::new(FakeOutput::Solid(Rgba([1, 2, 3, 255]))));
    let coordinator = RenderCoordinator::new(cache.clone(), runner.clone());
    let events = EventLog::new();

    let outcome = coordinator
        .render(&document, &all_external(TestSuite::Custom, suite.work_dir()), &events)
        .await
        .unwrap();

    assert_eq!(cache.gets(), 0);
    assert_eq!(cache.puts(), 0);
    assert_eq!(outcome.dispatched, 4);
    assert_eq!(runner.calls(), 4);
    assert!(!outcome.renders.contains_key(&Backend::Reference));
    assert!(outcome.diffs.is_empty());

    let events = events.take();
    assert!(matches!(events.last(), Some(RenderEvent::AllRendered { .. })));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, RenderEvent::DiffReady { .. } | RenderEvent::AllDiffed { .. }))
    );
}

/// A 100x80 document at view size 240 is cropped to 240x192 starting at
/// row 24 of the square rasterizer output, then diffed at that size.
#[tokio::test]
async fn test_crop_and_diff_follow_document_aspect() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("rect-01", 100, 80, true);

    let runner = Arc::new(FakeRasterizer::new(FakeOutput::RowIndex));
    let coordinator = RenderCoordinator::new(Arc::new(CountingCache::default()), runner);
    let events = EventLog::new();
    let settings = settings_with(TestSuite::Results, suite.work_dir(), &[Backend::Batik]);

    let outcome = coordinator.render(&document, &settings, &events).await.unwrap();

    assert_eq!(outcome.image_size, RasterSize::new(240, 192));

    let batik = outcome.renders[&Backend::Batik].image();
    assert_eq!((batik.width(), batik.height()), (240, 192));
    assert_eq!(batik.get_pixel(0, 0), &Rgba([0, 24, 0, 255]));
    assert_eq!(batik.get_pixel(0, 191), &Rgba([0, 215, 0, 255]));

    let reference = outcome.renders[&Backend::Reference].image();
    assert_eq!((reference.width(), reference.height()), (240, 192));

    let diff = &outcome.diffs[&Backend::Batik];
    assert_eq!((diff.stats.width, diff.stats.height), (240, 192));
    assert_eq!(diff.stats.differing_pixels, 240 * 192);

    // The rasterizer's temporary output is gone.
    assert!(leftover_outputs(&suite.work_dir()).is_empty());

    let events = events.take();
    let all_rendered = position(&events, |e| matches!(e, RenderEvent::AllRendered { .. }));
    let diff_ready = position(&events, |e| matches!(e, RenderEvent::DiffReady { .. }));
    let all_diffed = position(&events, |e| matches!(e, RenderEvent::AllDiffed { .. }));
    assert_eq!(diff_ready.len(), 1);
    assert_eq!(all_diffed, vec![events.len() - 1]);
    assert!(diff_ready[0] > all_rendered[0]);
}

/// A backend matching the reference produces an all-white diff.
#[tokio::test]
async fn test_matching_backend_diffs_clean() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("square", 50, 50, true);

    let runner =
        Arc::new(FakeRasterizer::new(FakeOutput::Solid(REFERENCE_COLOR)).with_stdout("success"));
    let coordinator = RenderCoordinator::new(Arc::new(CountingCache::default()), runner);
    let backends = [Backend::Batik, Backend::Jsvg];
    let settings = settings_with(TestSuite::Results, suite.work_dir(), &backends);

    let outcome = coordinator.render(&document, &settings, &NullSink).await.unwrap();

    assert_eq!(outcome.diffs.len(), 2);
    for diff in outcome.diffs.values() {
        assert!(diff.stats.is_identical(), "{:?}", diff.stats);
        assert!(diff.image.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }
}

/// Every enabled backend reports exactly once, even with a single worker.
#[tokio::test]
async fn test_single_worker_completes_every_backend() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("rect-02", 120, 60, true);

    let runner = Arc::new(FakeRasterizer::new(FakeOutput::Solid(REFERENCE_COLOR)));
    let coordinator = RenderCoordinator::new(Arc::new(CountingCache::default()), runner.clone());
    let events = EventLog::new();
    let settings = all_external(TestSuite::Results, suite.work_dir()).with_workers(1);

    let outcome = coordinator.render(&document, &settings, &events).await.unwrap();

    assert_eq!(runner.calls(), 4);
    assert_eq!(outcome.renders.len(), 5);
    assert_eq!(outcome.diffs.len(), 4);
    let events = events.take();
    for backend in Backend::all() {
        let count = events
            .iter()
            .filter(|e| matches!(e, RenderEvent::ImageReady { backend: b, .. } if b == backend))
            .count();
        assert_eq!(count, 1, "{backend}");
    }
}

/// A second pass cannot start while the first is still rendering.
#[tokio::test]
async fn test_concurrent_pass_is_rejected() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("busy", 10, 10, false);

    let gate = Gate::default();
    let runner = Arc::new(
        FakeRasterizer::new(FakeOutput::Solid(REFERENCE_COLOR)).with_gate(gate.clone()),
    );
    let coordinator = RenderCoordinator::new(Arc::new(CountingCache::default()), runner);
    let settings = settings_with(TestSuite::Custom, suite.work_dir(), &[Backend::Batik]);

    let (first, second) = tokio::join!(coordinator.render(&document, &settings, &NullSink), async {
        let state = coordinator.state();
        let result = coordinator.render(&document, &settings, &NullSink).await;
        gate.open();
        (state, result)
    });

    assert!(first.is_ok());
    let (state, result) = second;
    assert_eq!(state, CoordinatorState::Rendering);
    assert!(matches!(result, Err(CoordinatorError::Busy)));

    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert!(coordinator.render(&document, &settings, &NullSink).await.is_ok());
}

/// Two coordinators sharing a working directory each load their own
/// rasterizer output, even while one render is still in flight.
#[tokio::test]
async fn test_shared_work_dir_keeps_outputs_apart() {
    let suite = TestSuiteDir::new();
    let slow_document = suite.add_document("slow", 10, 10, false);
    let fast_document = suite.add_document("fast", 10, 10, false);
    let red = Rgba([255, 0, 0, 255]);
    let blue = Rgba([0, 0, 255, 255]);

    // The slow render keeps its output on disk long enough for the fast one
    // to write and load its own in the same directory.
    let slow_runner =
        FakeRasterizer::new(FakeOutput::Solid(red)).with_delay(Duration::from_millis(400));
    let slow = RenderCoordinator::new(Arc::new(CountingCache::default()), Arc::new(slow_runner));
    let fast = RenderCoordinator::new(
        Arc::new(CountingCache::default()),
        Arc::new(FakeRasterizer::new(FakeOutput::Solid(blue))),
    );
    let settings = settings_with(TestSuite::Custom, suite.work_dir(), &[Backend::Batik]);

    let (slow_outcome, fast_outcome) = tokio::join!(
        slow.render(&slow_document, &settings, &NullSink),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fast.render(&fast_document, &settings, &NullSink).await
        }
    );

    let slow_batik = &slow_outcome.unwrap().renders[&Backend::Batik];
    let fast_batik = &fast_outcome.unwrap().renders[&Backend::Batik];
    assert!(!slow_batik.is_placeholder(), "{:?}", slow_batik.error_message());
    assert!(!fast_batik.is_placeholder(), "{:?}", fast_batik.error_message());
    assert!(slow_batik.image().pixels().all(|p| *p == red));
    assert!(fast_batik.image().pixels().all(|p| *p == blue));
    assert!(leftover_outputs(&suite.work_dir()).is_empty());
}

/// An unusable working directory is reported before anything renders.
#[tokio::test]
async fn test_work_dir_failure_is_an_error() {
    let suite = TestSuiteDir::new();
    let document = suite.add_document("doc", 10, 10, false);
    let blocker = suite.root.path().join("file");
    std::fs::write(&blocker, b"").unwrap();

    let runner = Arc::new(FakeRasterizer::new(FakeOutput::Nothing));
    let coordinator = RenderCoordinator::new(Arc::new(CountingCache::default()), runner.clone());
    let settings = settings_with(TestSuite::Custom, blocker.join("work"), &[Backend::Batik]);

    let result = coordinator.render(&document, &settings, &NullSink).await;

    assert!(matches!(result, Err(CoordinatorError::WorkDir { .. })));
    assert_eq!(runner.calls(), 0);
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
}
