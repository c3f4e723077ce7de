//! The plugin driven through the host's hook chain.

mod common;

use common::{image, uploaded, FailingUploader, StampUploader, TestHost};
use picmirror::HookChain;
use picmirror_backup::plugin::{BACKUP_HOOK_NAME, CACHE_HOOK_NAME};
use picmirror_backup::{BackupOrchestrator, BackupPlugin, ContextSynthesizer, CycleState};
use std::time::Duration;

fn chain_with(plugin: &BackupPlugin) -> HookChain {
    let mut chain = HookChain::new();
    plugin.register(&mut chain);
    chain
}

#[tokio::test]
async fn test_hooks_back_up_after_primary_upload() {
    let host = TestHost::new("primary", &["github", "smms"]);
    let github = StampUploader::new("github");
    let smms = StampUploader::new("smms");
    host.register("github", github.clone());
    host.register("smms", smms.clone());

    let plugin = BackupPlugin::new(BackupOrchestrator::new(ContextSynthesizer::default()));
    let chain = chain_with(&plugin);
    assert_eq!(chain.before_upload_names(), vec![CACHE_HOOK_NAME]);
    assert_eq!(chain.after_upload_names(), vec![BACKUP_HOOK_NAME]);

    let before = host.context(vec![image("cat.png", b"meow")]);
    chain.run_before_upload(&before).await;
    assert_eq!(plugin.orchestrator().cached_files().len(), 1);

    let after = host.context(vec![uploaded("cat.png", "https://primary/cat.png")]);
    chain.run_after_upload(&after).await;

    assert_eq!(github.calls(), 1);
    assert_eq!(smms.calls(), 1);
    assert!(plugin.orchestrator().cached_files().is_empty());
    assert_eq!(plugin.orchestrator().state(), CycleState::Idle);

    // The host's own output is untouched by the backups.
    assert_eq!(after.output.len(), 1);
    assert_eq!(after.output[0].img_url.as_deref(), Some("https://primary/cat.png"));
}

#[tokio::test]
async fn test_failing_destination_does_not_reach_host() {
    let host = TestHost::new("primary", &["broken"]);
    let broken = FailingUploader::new("quota exceeded");
    host.register("broken", broken.clone());

    let plugin = BackupPlugin::new(BackupOrchestrator::new(ContextSynthesizer::default()));
    let chain = chain_with(&plugin);

    chain
        .run_before_upload(&host.context(vec![image("a.png", b"1")]))
        .await;
    // run_after_upload returns unit; reaching the next line is the assertion.
    chain
        .run_after_upload(&host.context(vec![uploaded("a.png", "https://primary/a.png")]))
        .await;

    assert_eq!(broken.calls(), 1);
    assert!(plugin.orchestrator().cached_files().is_empty());
}

#[tokio::test]
async fn test_detached_hook_returns_before_destinations_finish() {
    let host = TestHost::new("primary", &["slow"]);
    let slow = StampUploader::with_delay("slow", Duration::from_millis(200));
    host.register("slow", slow.clone());

    let plugin =
        BackupPlugin::new(BackupOrchestrator::new(ContextSynthesizer::default())).detached(true);
    let chain = chain_with(&plugin);

    chain
        .run_before_upload(&host.context(vec![image("a.png", b"1")]))
        .await;
    chain
        .run_after_upload(&host.context(vec![uploaded("a.png", "https://primary/a.png")]))
        .await;

    // The cycle task has not been polled yet on this runtime.
    assert_eq!(slow.calls(), 0);

    for _ in 0..50 {
        if plugin.orchestrator().state() == CycleState::Idle && slow.calls() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(slow.calls(), 1);
    assert_eq!(plugin.orchestrator().state(), CycleState::Idle);
    assert!(plugin.orchestrator().cached_files().is_empty());
}

#[tokio::test]
async fn test_capture_skipped_when_nothing_selected() {
    let host = TestHost::new("primary", &[]);
    let plugin = BackupPlugin::new(BackupOrchestrator::new(ContextSynthesizer::default()));
    let chain = chain_with(&plugin);

    chain
        .run_before_upload(&host.context(vec![image("a.png", b"1")]))
        .await;

    assert!(plugin.orchestrator().cached_files().is_empty());
    assert_eq!(plugin.orchestrator().state(), CycleState::Idle);
}

/// A second upload captured before the first detached cycle runs must not
/// replace the first cycle's payloads or lose its own.
#[tokio::test]
async fn test_overlapping_detached_cycles_keep_their_own_payloads() {
    let host = TestHost::new("primary", &["github"]);
    let github = StampUploader::new("github");
    host.register("github", github.clone());

    let plugin =
        BackupPlugin::new(BackupOrchestrator::new(ContextSynthesizer::default())).detached(true);
    let chain = chain_with(&plugin);

    chain
        .run_before_upload(&host.context(vec![image("first.png", b"FIRST")]))
        .await;
    chain
        .run_after_upload(&host.context(vec![uploaded(
            "first.png",
            "https://primary/first.png",
        )]))
        .await;
    chain
        .run_before_upload(&host.context(vec![image("second.png", b"SECOND")]))
        .await;
    chain
        .run_after_upload(&host.context(vec![uploaded(
            "second.png",
            "https://primary/second.png",
        )]))
        .await;

    for _ in 0..50 {
        if github.calls() == 2 && plugin.orchestrator().state() == CycleState::Idle {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(github.calls(), 2, "second cycle was not backed up");

    let mut seen: Vec<(String, Vec<u8>)> = github
        .seen()
        .into_iter()
        .map(|s| (s.file_name, s.payload.unwrap()))
        .collect();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("first.png".to_string(), b"FIRST".to_vec()),
            ("second.png".to_string(), b"SECOND".to_vec()),
        ]
    );
    assert!(plugin.orchestrator().cached_files().is_empty());
    assert_eq!(plugin.orchestrator().state(), CycleState::Idle);
}
