//! End-to-end update workflow scenarios against mocked collaborators.

mod common;

use appup::update::{
    CheckOutcome, DownloadOutcome, DownloadState, FetchOutcome, OrchestratorPhase, UpdateConfig,
};
use common::*;
use std::time::Duration;

#[tokio::test]
async fn test_optional_update_downloads_to_sequenced_path() {
    let h = Harness::builder().android().build();
    h.serve_update("1.0.1", false);
    h.transfer
        .push_script(TransferScript::succeed(progress_steps(&[25, 75, 100])));
    let mut states = h.orchestrator.coordinator().subscribe();
    assert_eq!(h.orchestrator.download_status(), DownloadState::idle());

    let outcome = h.orchestrator.check_version(false).await;

    let CheckOutcome::Confirmed(FetchOutcome::Download(DownloadOutcome::Completed {
        path,
        install_error: None,
    })) = outcome
    else {
        panic!("unexpected outcome: {:?}", outcome);
    };

    assert!(states.has_changed().unwrap());
    assert_eq!(states.borrow_and_update().progress_percent, 100);

    assert_eq!(path.parent().unwrap().to_str(), Some("/storage/emulated/0/download"));
    let name = path.file_name().unwrap().to_str().unwrap();
    let token = name
        .strip_prefix("android_")
        .and_then(|n| n.strip_suffix(".apk"))
        .unwrap();
    assert!(token.parse::<u64>().is_ok(), "{}", name);

    let confirm = &h.prompter.prompts()[0].config;
    assert_eq!(confirm.actions.len(), 2);
    assert!(!confirm.dismissible);
    assert_eq!(h.installer.opened()[0].0, path);
    assert_eq!(h.orchestrator.phase(), OrchestratorPhase::Idle);
}

#[tokio::test]
async fn test_download_leaves_state_at_100_until_next_attempt() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", false);
    h.transfer.push_script(TransferScript::succeed(progress_steps(&[100])));

    h.orchestrator.check_version(false).await;
    assert!(h.orchestrator.download_status().is_complete());

    // a later automatic check is allowed to start a fresh attempt
    h.transfer.push_script(TransferScript::succeed(progress_steps(&[100])));
    let outcome = h.orchestrator.check_new_version().await;
    assert!(matches!(outcome, CheckOutcome::Confirmed(_)));
    assert_eq!(h.transfer.calls().len(), 2);
    assert_ne!(h.transfer.calls()[0].destination, h.transfer.calls()[1].destination);
}

#[tokio::test]
async fn test_forced_update_has_single_undismissable_action() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", true);

    h.orchestrator.check_version(false).await;

    let prompts = h.prompter.prompts();
    let confirm = &prompts[0].config;
    assert_eq!(confirm.actions.len(), 1);
    assert!(confirm.actions[0].is_default);
    assert!(!confirm.dismissible);
    assert_eq!(confirm.title, UpdateConfig::default().texts.forced_title);
}

#[tokio::test]
async fn test_transfer_failure_resets_state_and_offers_fallback() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", false);
    h.transfer.push_script(TransferScript::fail(
        progress_steps(&[10, 40]),
        TransferError::Connection("connection reset".to_string()),
    ));

    let outcome = h.orchestrator.check_version(false).await;

    assert!(matches!(
        outcome,
        CheckOutcome::Confirmed(FetchOutcome::Download(DownloadOutcome::Failed(_)))
    ));
    assert_eq!(h.orchestrator.download_status().progress_percent, -1);
    assert!(h.installer.opened().is_empty());

    let prompts = h.prompter.prompts();
    assert_eq!(prompts.len(), 3); // confirm, progress, fallback
    assert!(prompts[1].dismissed);
    let fallback = &prompts[2].config;
    assert_eq!(fallback.actions.len(), 1);
    assert!(fallback.actions[0].is_default);
    assert_eq!(h.device.opened_urls(), vec![DOWNLOAD_PAGE.to_string()]);
}

#[tokio::test]
async fn test_fallback_can_be_dismissed() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", false);
    h.transfer.push_script(TransferScript::fail(
        Vec::new(),
        TransferError::Http { status: 500 },
    ));
    h.prompter.push_choice(PromptChoice::Select(1));
    h.prompter.push_choice(PromptChoice::Wait);
    h.prompter.push_choice(PromptChoice::Dismiss);

    h.orchestrator.check_version(false).await;

    assert!(h.device.opened_urls().is_empty());
}

#[tokio::test]
async fn test_non_mobile_host_does_nothing() {
    let h = Harness::builder().desktop().build();
    h.serve_update("1.0.1", true);

    assert!(matches!(
        h.orchestrator.check_version(true).await,
        CheckOutcome::UnsupportedHost
    ));
    assert!(matches!(
        h.orchestrator.check_new_version().await,
        CheckOutcome::UnsupportedHost
    ));
    assert!(h.http.get_requests().is_empty());
    assert_eq!(h.prompter.prompt_count(), 0);
    assert!(h.orchestrator.current_version().is_none());
}

#[tokio::test]
async fn test_ios_confirmation_opens_hosted_page() {
    let h = Harness::builder().ios().build();
    h.serve_update("1.0.1", false);

    let outcome = h.orchestrator.check_version(false).await;

    assert!(matches!(
        outcome,
        CheckOutcome::Confirmed(FetchOutcome::OpenedHostedPage { .. })
    ));
    assert_eq!(h.device.opened_urls(), vec![DOWNLOAD_PAGE.to_string()]);
    assert!(h.transfer.calls().is_empty());
    assert_eq!(h.device.permission_requests(), 0);
}

#[tokio::test]
async fn test_no_package_location_shows_notice() {
    let h = Harness::builder().build();
    h.http.set_json(
        &latest_url("android"),
        r#"{"code":1,"data":{"lastVersion":{"version":"1.0.1","isForcedUpdate":0},"fileRelationList":[]}}"#,
    );

    let outcome = h.orchestrator.check_version(false).await;

    assert!(matches!(outcome, CheckOutcome::Confirmed(FetchOutcome::NoDownloadTarget)));
    assert!(h.transfer.calls().is_empty());
    let notice = h.prompter.prompts().pop().unwrap();
    assert_eq!(notice.config.title, UpdateConfig::default().texts.no_download_target);
}

#[tokio::test]
async fn test_manual_check_on_latest_shows_notice() {
    let h = Harness::builder().build();
    h.serve_update("1.0.0", false);

    let outcome = h.orchestrator.check_version(true).await;

    assert!(matches!(outcome, CheckOutcome::NoUpdate));
    let prompts = h.prompter.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].config.actions.len(), 1);
    assert_eq!(h.orchestrator.latest_version().as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_rejected_metadata_is_distinct_from_missing() {
    use appup::update::{MetadataIssue, UpdateError};

    let h = Harness::builder().build();
    h.http
        .set_json(&latest_url("android"), r#"{"code":0,"msg":"unknown app"}"#);

    let CheckOutcome::MetadataUnavailable(UpdateError::MetadataUnavailable { reason }) =
        h.orchestrator.check_version(true).await
    else {
        panic!("expected metadata failure");
    };
    assert_eq!(
        reason,
        MetadataIssue::Rejected {
            code: 0,
            message: Some("unknown app".to_string())
        }
    );
    assert_eq!(h.prompter.prompt_count(), 0);
}

#[tokio::test]
async fn test_phase_transitions() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", false);
    h.transfer.push_script(TransferScript::succeed(progress_steps(&[100])));
    let mut phases = h.orchestrator.subscribe_phase();

    let collect = async {
        let mut seen = Vec::new();
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            seen.push(phase);
            if phase == OrchestratorPhase::Idle {
                break;
            }
        }
        seen
    };
    let (_, seen) = tokio::join!(h.orchestrator.check_version(false), collect);

    // watch receivers only see the latest phase, so intermediate ones may merge
    assert!(seen.contains(&OrchestratorPhase::AwaitingUserConfirmation), "{:?}", seen);
    assert_eq!(seen.last(), Some(&OrchestratorPhase::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_checks_attach_instead_of_restarting() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", false);
    h.prompter.push_choice(PromptChoice::Select(1)); // confirm update
    h.prompter.push_choice(PromptChoice::Wait); // progress dialog stays up
    h.transfer.push_script(TransferScript::succeed(vec![
        (Duration::ZERO, TransferProgress::new(5, 100)),
        (Duration::from_secs(3), TransferProgress::new(50, 100)),
        (Duration::from_secs(3), TransferProgress::new(100, 100)),
    ]));

    let first = h.orchestrator.check_version(false);
    let taps = async {
        while !h.orchestrator.download_status().is_active() {
            tokio::task::yield_now().await;
        }
        h.orchestrator.check_new_version().await
    };
    let (_, attached) = tokio::join!(first, taps);

    assert!(matches!(attached, CheckOutcome::Attached { percent: 100 }));
    assert_eq!(h.transfer.calls().len(), 1);
    assert_eq!(h.http.request_count(&latest_url("android")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watcher_dismisses_when_download_fails() {
    let h = Harness::builder().build();
    h.serve_update("1.0.1", false);
    h.prompter.push_choice(PromptChoice::Select(1));
    h.prompter.push_choice(PromptChoice::Wait);
    h.transfer.push_script(TransferScript::fail(
        vec![
            (Duration::ZERO, TransferProgress::new(5, 100)),
            (Duration::from_secs(2), TransferProgress::new(30, 100)),
        ],
        TransferError::Io("disk full".to_string()),
    ));

    let first = h.orchestrator.check_version(false);
    let watch = async {
        while !h.orchestrator.download_status().is_active() {
            tokio::task::yield_now().await;
        }
        h.orchestrator.check_new_version().await
    };
    let (_, watched) = tokio::join!(first, watch);

    assert!(matches!(watched, CheckOutcome::Attached { percent: -1 }));
    let watcher = h
        .prompter
        .prompts()
        .into_iter()
        .find(|p| p.config.dismissible && p.config.title.starts_with("Download progress"))
        .unwrap();
    assert!(watcher.dismissed);
}

#[tokio::test]
async fn test_version_history_empty_on_failure() {
    let h = Harness::builder().build();
    h.http.set_response(
        &format!("{}/v1/apply/findVersionList/demo/android", VERSION_SERVICE),
        MockResponse::Error(HttpError::Timeout("30s".to_string())),
    );

    assert!(h.orchestrator.version_history().await.is_empty());
}
