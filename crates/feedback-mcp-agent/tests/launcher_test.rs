//! End-to-end launcher and gateway tests with `/bin/sh` standing in for the dialog.
//!
//! The fake dialog receives `--prompt <msg> --predefined-options <opts> --output-file <path>`
//! as `$1..$6`, so the handoff path is `$6`.
#![cfg(unix)]

use interactive_feedback_mcp::child_process;
use interactive_feedback_mcp::config::{GatewayConfig, LauncherConfig};
use interactive_feedback_mcp::error::{GatewayError, LaunchError};
use interactive_feedback_mcp::gateway::{AgentResponse, FeedbackGateway, FeedbackRequest};
use interactive_feedback_mcp::launcher::DialogLauncher;
use interactive_feedback_mcp::progress::{NoProgress, RecordingProgress};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn fake_dialog(script: &str, handoff_dir: &Path, heartbeat: Duration) -> DialogLauncher {
    DialogLauncher::new(LauncherConfig {
        ui_program: PathBuf::from("/bin/sh"),
        ui_args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        heartbeat_interval: heartbeat,
        progress_horizon: Duration::from_secs(600),
        handoff_dir: Some(handoff_dir.to_path_buf()),
    })
}

fn request(message: &str) -> FeedbackRequest {
    FeedbackRequest::new(message, vec!["Yes".to_string(), "No".to_string()])
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_submitted_feedback_is_returned_and_handoff_removed() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog(
        r#"printf '{"interactive_feedback":"looks good","images":[]}' > "$6""#,
        handoffs.path(),
        Duration::from_secs(5),
    );

    let result = launcher
        .launch(&request("Ship it?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.interactive_feedback, "looks good");
    assert!(result.images.is_empty());
    assert!(dir_is_empty(handoffs.path()));
}

#[tokio::test]
async fn test_dialog_receives_message_and_joined_options() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog(
        r#"printf '{"interactive_feedback":"%s|%s|%s"}' "$2" "$4" "$5" > "$6""#,
        handoffs.path(),
        Duration::from_secs(5),
    );

    let result = launcher
        .launch(&request("Ship it?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        result.interactive_feedback,
        "Ship it?|Yes|||No|--output-file"
    );
}

#[tokio::test]
async fn test_nonzero_exit_reports_code_and_stderr() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog(
        "echo boom >&2; exit 7",
        handoffs.path(),
        Duration::from_secs(5),
    );

    let err = launcher
        .launch(&request("?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    match &err {
        LaunchError::Exited { code, stderr } => {
            assert_eq!(*code, Some(7));
            assert_eq!(stderr, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "Feedback UI exited with code 7: boom");
    assert!(dir_is_empty(handoffs.path()));
}

#[tokio::test]
async fn test_heartbeats_are_reported_while_waiting() {
    let handoffs = tempfile::tempdir().unwrap();
    let interval = Duration::from_millis(50);
    let launcher = fake_dialog(
        r#"sleep 0.3; printf '{"interactive_feedback":"late"}' > "$6""#,
        handoffs.path(),
        interval,
    );
    let sink = RecordingProgress::new();

    let result = launcher
        .launch(&request("?"), &sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.interactive_feedback, "late");

    let reports = sink.reports();
    assert!(!reports.is_empty());
    for (i, (elapsed, total)) in reports.iter().enumerate() {
        assert_eq!(*elapsed, interval * (i as u32 + 1));
        assert_eq!(*total, *elapsed + Duration::from_secs(600));
    }
}

#[tokio::test]
async fn test_closed_dialog_yields_empty_text() {
    let handoffs = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let gateway = FeedbackGateway::new(
        fake_dialog(
            r#"printf '{"interactive_feedback":"","images":[]}' > "$6""#,
            handoffs.path(),
            Duration::from_secs(5),
        ),
        GatewayConfig {
            scratch_dir: scratch.path().to_path_buf(),
        },
    );

    let response = gateway
        .request_feedback(&request("?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response, AgentResponse::TextOnly(String::new()));
    assert!(dir_is_empty(scratch.path()));
}

#[tokio::test]
async fn test_screenshot_round_trip_through_gateway() {
    let handoffs = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();

    let bitmap = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
    let b64 = feedback_core::image_codec::encode_png_base64(&bitmap).unwrap();
    let script = format!(
        r#"printf '{{"interactive_feedback":"see","images":["{b64}"]}}' > "$6""#
    );
    let gateway = FeedbackGateway::new(
        fake_dialog(&script, handoffs.path(), Duration::from_secs(5)),
        GatewayConfig {
            scratch_dir: scratch.path().to_path_buf(),
        },
    );

    let response = gateway
        .request_feedback(&request("?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    let AgentResponse::TextWithImages { text, images } = response else {
        panic!("expected an image response");
    };
    assert_eq!(images.len(), 1);
    assert!(text.starts_with("see\n\n[Screenshots saved to:\n"));
    let decoded = image::load_from_memory(&std::fs::read(&images[0].path).unwrap())
        .unwrap()
        .to_rgba8();
    assert_eq!(decoded, bitmap);
    assert!(dir_is_empty(handoffs.path()));
}

#[tokio::test]
async fn test_cancellation_kills_dialog_and_removes_handoff() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog("exec sleep 30", handoffs.path(), Duration::from_millis(50));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = launcher
        .launch(&request("?"), &NoProgress, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, LaunchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(dir_is_empty(handoffs.path()));
    assert!(GatewayError::from(err).is_cancelled());
}

#[tokio::test]
async fn test_spawn_failure_leaves_no_handoff() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = DialogLauncher::new(LauncherConfig {
        ui_program: handoffs.path().join("no-such-dialog"),
        ui_args: Vec::new(),
        heartbeat_interval: Duration::from_secs(1),
        progress_horizon: Duration::from_secs(600),
        handoff_dir: Some(handoffs.path().to_path_buf()),
    });

    let err = launcher
        .launch(&request("?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LaunchError::Spawn { .. }));
    assert!(dir_is_empty(handoffs.path()));
}

#[tokio::test]
async fn test_clean_exit_without_result_is_corrupt_handoff() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog("exit 0", handoffs.path(), Duration::from_secs(5));

    let err = launcher
        .launch(&request("?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LaunchError::HandoffCorrupt { .. }));
    assert!(dir_is_empty(handoffs.path()));
}

#[tokio::test]
async fn test_dialog_that_deletes_handoff_is_missing() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog(r#"rm -f "$6""#, handoffs.path(), Duration::from_secs(5));

    let err = launcher
        .launch(&request("?"), &NoProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LaunchError::HandoffMissing { .. }));
}

#[tokio::test]
async fn test_concurrent_requests_use_separate_handoffs() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog(
        r#"sleep 0.1; printf '{"interactive_feedback":"%s"}' "$2" > "$6""#,
        handoffs.path(),
        Duration::from_secs(5),
    );

    let mut tasks = Vec::new();
    for i in 0..4 {
        let launcher = launcher.clone();
        tasks.push(tokio::spawn(async move {
            launcher
                .launch(
                    &request(&format!("question {i}")),
                    &NoProgress,
                    &CancellationToken::new(),
                )
                .await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.interactive_feedback, format!("question {i}"));
    }
    assert!(dir_is_empty(handoffs.path()));
}

#[tokio::test]
async fn test_finished_dialog_is_unregistered() {
    let handoffs = tempfile::tempdir().unwrap();
    let launcher = fake_dialog(
        r#"printf '{"interactive_feedback":"x"}' > "$6""#,
        handoffs.path(),
        Duration::from_secs(5),
    );
    let handoff = handoffs.path().join("manual.json");
    let mut process = launcher.spawn(&request("?"), &handoff).unwrap();
    let pid = process.pid().unwrap();
    assert!(child_process::is_registered(pid));

    let status = process
        .wait_with_heartbeat(
            Duration::from_secs(5),
            Duration::from_secs(600),
            &NoProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(status.success());
    drop(process);
    assert!(!child_process::is_registered(pid));
    assert_eq!(
        feedback_core::read_result(&handoff).unwrap().interactive_feedback,
        "x"
    );
}
