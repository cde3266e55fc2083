use screenbridge_capture_engine::testing::{fake_window, FakeBackend, FakeEngine};
use screenbridge_capture_engine::{
    CaptureManager, CaptureTarget, EngineSettings, ManagerState, RecordingConfig, SourceType,
};
use screenbridge_common::error::ScreenBridgeError;
use screenbridge_platform_core::WindowFilter;

fn manager_with(backend: FakeBackend, engine: FakeEngine) -> CaptureManager {
    CaptureManager::new(Box::new(backend), Box::new(engine), EngineSettings::default())
}

fn fresh() -> (CaptureManager, FakeEngine) {
    let engine = FakeEngine::new();
    (manager_with(FakeBackend::default(), engine.clone()), engine)
}

#[test]
fn lifecycle_walks_every_state() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("take.mkv");
    let (mut manager, engine) = fresh();

    assert_eq!(manager.state(), ManagerState::Uninitialized);
    manager.initialize().unwrap();
    manager.initialize().unwrap();
    assert_eq!(manager.state(), ManagerState::Idle);
    assert_eq!(engine.log.lock().unwrap().startups, 1);

    manager
        .start_recording(&output, &RecordingConfig::default())
        .unwrap();
    assert_eq!(manager.state(), ManagerState::Recording);
    let status = manager.status();
    assert_eq!(status.output.as_deref(), Some(output.as_path()));
    assert!(status.elapsed_secs.is_some());

    let summary = manager.stop_recording().unwrap().unwrap();
    assert_eq!(manager.state(), ManagerState::Idle);
    assert_eq!(summary.path, output);
    assert!(summary.bytes_written > 0);
    assert!(manager.stop_recording().unwrap().is_none());

    manager.shutdown();
    assert_eq!(manager.state(), ManagerState::ShutDown);
    assert_eq!(engine.log.lock().unwrap().shutdowns, 1);

    manager.initialize().unwrap();
    assert_eq!(manager.state(), ManagerState::Idle);
}

#[test]
fn recording_requires_initialization() {
    let (mut manager, _) = fresh();
    let err = manager
        .start_recording("/tmp/never.mkv".as_ref(), &RecordingConfig::default())
        .unwrap_err();
    assert!(matches!(err, ScreenBridgeError::InvalidState { .. }));

    manager.initialize().unwrap();
    manager.shutdown();
    assert!(manager
        .start_recording("/tmp/never.mkv".as_ref(), &RecordingConfig::default())
        .is_err());
}

#[test]
fn second_start_is_rejected_while_recording() {
    let dir = tempfile::tempdir().unwrap();
    let (mut manager, _) = fresh();
    manager.initialize().unwrap();
    manager
        .start_recording(&dir.path().join("a.mp4"), &RecordingConfig::default())
        .unwrap();

    let err = manager
        .start_recording(&dir.path().join("b.mp4"), &RecordingConfig::default())
        .unwrap_err();
    assert!(matches!(err, ScreenBridgeError::InvalidState { .. }));
    assert_eq!(
        manager.status().output.as_deref(),
        Some(dir.path().join("a.mp4").as_path())
    );
}

#[test]
fn shutdown_stops_active_recording() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("take.mov");
    let (mut manager, _) = fresh();
    manager.initialize().unwrap();
    manager
        .start_recording(&output, &RecordingConfig::default())
        .unwrap();

    manager.shutdown();
    assert_eq!(manager.state(), ManagerState::ShutDown);
    assert!(output.exists());
}

#[test]
fn shutdown_before_initialize_is_a_no_op() {
    let (mut manager, engine) = fresh();
    manager.shutdown();
    assert_eq!(manager.state(), ManagerState::Uninitialized);
    assert_eq!(engine.log.lock().unwrap().shutdowns, 0);
}

#[test]
fn failed_engine_startup_leaves_manager_uninitialized() {
    let engine = FakeEngine {
        fail_startup: true,
        ..FakeEngine::new()
    };
    let mut manager = manager_with(FakeBackend::default(), engine.clone());

    assert!(manager.initialize().is_err());
    assert_eq!(manager.state(), ManagerState::Uninitialized);
    assert_eq!(engine.log.lock().unwrap().shutdowns, 1);
}

#[test]
fn missing_backend_element_fails_startup() {
    let engine = FakeEngine {
        missing: vec!["fakevideosrc"],
        ..FakeEngine::new()
    };
    let mut manager = manager_with(FakeBackend::default(), engine);
    let err = manager.initialize().unwrap_err();
    assert!(err.to_string().contains("fakevideosrc"));
}

#[test]
fn failed_pipeline_start_keeps_manager_idle() {
    let dir = tempfile::tempdir().unwrap();
    let engine = FakeEngine {
        fail_start: true,
        ..FakeEngine::new()
    };
    let mut manager = manager_with(FakeBackend::default(), engine);
    manager.initialize().unwrap();

    assert!(manager
        .start_recording(&dir.path().join("x.mkv"), &RecordingConfig::default())
        .is_err());
    assert_eq!(manager.state(), ManagerState::Idle);
    assert!(manager.status().output.is_none());
}

#[test]
fn invalid_output_or_config_keeps_manager_idle() {
    let (mut manager, engine) = fresh();
    manager.initialize().unwrap();

    assert!(manager
        .start_recording("/tmp/out.avi".as_ref(), &RecordingConfig::default())
        .is_err());
    let odd = RecordingConfig {
        width: 1001,
        ..RecordingConfig::default()
    };
    assert!(manager.start_recording("/tmp/out.mkv".as_ref(), &odd).is_err());

    assert_eq!(manager.state(), ManagerState::Idle);
    assert!(engine.log.lock().unwrap().plans.is_empty());
}

#[test]
fn display_target_defaults_to_primary() {
    let (manager, _) = fresh();
    match manager.resolve_target(&RecordingConfig::default()).unwrap() {
        CaptureTarget::Display { display, index } => {
            assert_eq!(display.id, "2");
            assert_eq!(index, 1);
        }
        other => panic!("unexpected target {other:?}"),
    }

    let explicit = RecordingConfig {
        display_id: "1".to_string(),
        ..RecordingConfig::default()
    };
    assert!(matches!(
        manager.resolve_target(&explicit).unwrap(),
        CaptureTarget::Display { index: 0, .. }
    ));

    let unknown = RecordingConfig {
        display_id: "99".to_string(),
        ..RecordingConfig::default()
    };
    let err = manager.resolve_target(&unknown).unwrap_err();
    assert!(matches!(err, ScreenBridgeError::SourceNotFound { .. }));
    assert!(err.to_string().contains("2:External"));
}

#[test]
fn no_displays_is_not_found() {
    let backend = FakeBackend {
        displays: Vec::new(),
        ..FakeBackend::default()
    };
    let manager = manager_with(backend, FakeEngine::new());
    let err = manager.resolve_target(&RecordingConfig::default()).unwrap_err();
    assert!(matches!(err, ScreenBridgeError::SourceNotFound { .. }));
}

#[test]
fn window_target_must_exist_even_if_hidden() {
    let (manager, _) = fresh();
    let hidden = RecordingConfig {
        source_type: SourceType::Window,
        window_id: 103,
        ..RecordingConfig::default()
    };
    assert_eq!(
        manager.resolve_target(&hidden).unwrap(),
        CaptureTarget::Window(fake_window(103, "Notes", "gedit", false))
    );

    let missing = RecordingConfig {
        window_id: 999,
        ..hidden
    };
    assert!(manager.resolve_target(&missing).is_err());
}

#[test]
fn application_target_prefers_titled_visible_window() {
    let backend = FakeBackend {
        windows: vec![
            fake_window(201, "", "thunderbird", true),
            fake_window(202, "Compose", "thunderbird", false),
            fake_window(203, "Inbox", "Thunderbird", true),
        ],
        ..FakeBackend::default()
    };
    let manager = manager_with(backend, FakeEngine::new());

    let config = RecordingConfig {
        source_type: SourceType::Application,
        application_id: "THUNDERBIRD".to_string(),
        ..RecordingConfig::default()
    };
    match manager.resolve_target(&config).unwrap() {
        CaptureTarget::Window(window) => assert_eq!(window.id, 203),
        other => panic!("unexpected target {other:?}"),
    }

    let fallback = FakeBackend {
        windows: vec![fake_window(301, "", "gedit", false)],
        ..FakeBackend::default()
    };
    let manager = manager_with(fallback, FakeEngine::new());
    let config = RecordingConfig {
        application_id: "gedit".to_string(),
        ..config
    };
    assert!(matches!(
        manager.resolve_target(&config).unwrap(),
        CaptureTarget::Window(ref w) if w.id == 301
    ));
}

#[test]
fn audio_branch_follows_flags_and_backend() {
    let dir = tempfile::tempdir().unwrap();
    let (mut manager, engine) = fresh();
    manager.initialize().unwrap();

    manager
        .start_recording(&dir.path().join("1.mkv"), &RecordingConfig::default())
        .unwrap();
    manager.stop_recording().unwrap();

    assert!(manager.set_system_audio_enabled(false));
    manager
        .start_recording(&dir.path().join("2.mkv"), &RecordingConfig::default())
        .unwrap();
    manager.stop_recording().unwrap();

    let log = engine.log.lock().unwrap();
    assert!(log.plans[0].audio.is_some());
    assert!(log.plans[1].audio.is_none());
}

#[test]
fn missing_audio_source_degrades_to_video_only() {
    let dir = tempfile::tempdir().unwrap();
    let engine = FakeEngine::new();
    let backend = FakeBackend {
        audio: false,
        ..FakeBackend::default()
    };
    let mut manager = manager_with(backend, engine.clone());
    manager.initialize().unwrap();
    assert!(!manager.is_capture_audio_supported());

    manager
        .start_recording(&dir.path().join("v.mp4"), &RecordingConfig::default())
        .unwrap();
    assert!(engine.log.lock().unwrap().plans[0].audio.is_none());
}

#[test]
fn audio_support_needs_encoder_elements() {
    let engine = FakeEngine {
        missing: vec!["avenc_aac"],
        ..FakeEngine::new()
    };
    let manager = manager_with(FakeBackend::default(), engine);
    assert!(!manager.is_capture_audio_supported());

    let (manager, _) = fresh();
    assert!(manager.is_capture_audio_supported());
}

#[test]
fn enumeration_works_without_initialize() {
    let (manager, _) = fresh();
    assert_eq!(manager.displays().unwrap().len(), 2);

    let visible = manager.windows(WindowFilter::default()).unwrap();
    assert_eq!(
        visible.iter().map(|w| w.id).collect::<Vec<_>>(),
        vec![101, 104]
    );
    assert_eq!(manager.windows(WindowFilter::all()).unwrap().len(), 4);
}

#[test]
fn permission_forwarding() {
    let backend = FakeBackend {
        permission: false,
        ..FakeBackend::default()
    };
    let mut manager = manager_with(backend, FakeEngine::new());
    assert!(!manager.check_screen_permission());
    assert!(manager.request_screen_permission());
    assert!(manager.check_screen_permission());
}
