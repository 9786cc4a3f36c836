//! Top-level update workflow.
//!
//! [`UpdateOrchestrator`] resolves the app identity once, fetches the latest
//! version descriptor, asks [`decide`] what to do, prompts the user and, on
//! confirmation, either opens the hosted download page or drives the
//! [`DownloadCoordinator`] with a progress dialog on screen.
//!
//! Public operations never fail: every error is logged and converted into
//! a [`CheckOutcome`] or [`FetchOutcome`], and the phase always returns to
//! [`OrchestratorPhase::Idle`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, OnceCell};
use tokio::time::MissedTickBehavior;

use super::comparator::{decide, UpdateDecision};
use super::config::UpdateConfig;
use super::coordinator::{
    DownloadCoordinator, DownloadObserver, DownloadOutcome, DownloadRequest, DownloadState,
};
use super::errors::{MetadataIssue, UpdateError};
use super::identity::{AppIdentity, FetchStrategy};
use super::logger::{log_update_debug, log_update_error, log_update_warn, UpdateLogger};
use super::metadata::{MetadataClient, VersionDescriptor, VersionHistoryEntry};
use crate::traits::{
    DeviceHost, FileTransfer, HttpClient, PackageInstaller, PromptAction, PromptConfig,
    PromptHandle, PromptOutcome, Prompter,
};

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorPhase {
    Idle,
    CheckingMetadata,
    NoUpdate,
    AwaitingUserConfirmation,
    Downloading,
    Installing,
    Failed,
}

/// How a confirmed update was fetched.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The hosted download page was opened in the browser
    OpenedHostedPage { url: String },
    /// No package location was resolved; nothing was transferred
    NoDownloadTarget,
    /// A local download ran (or was already running)
    Download(DownloadOutcome),
    /// The fetch could not start
    Failed(UpdateError),
}

/// How a call to [`UpdateOrchestrator::check_version`] or
/// [`UpdateOrchestrator::check_new_version`] ended.
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// Not a mobile runtime; nothing happened
    UnsupportedHost,
    /// Already on the latest build
    NoUpdate,
    /// Version metadata could not be obtained
    MetadataUnavailable(UpdateError),
    /// The host could not tell us who we are
    Failed(UpdateError),
    /// An update was offered and the user declined it
    Declined(VersionDescriptor),
    /// An update was offered and confirmed
    Confirmed(FetchOutcome),
    /// A download was already running; its progress was shown instead
    Attached { percent: i8 },
}

/// Native and service collaborators of the workflow.
#[derive(Clone)]
pub struct UpdateServices {
    pub http: Arc<dyn HttpClient>,
    pub device: Arc<dyn DeviceHost>,
    pub transfer: Arc<dyn FileTransfer>,
    pub installer: Arc<dyn PackageInstaller>,
    pub prompter: Arc<dyn Prompter>,
}

/// Results of the most recent check.
#[derive(Debug, Default)]
struct CheckCycle {
    descriptor: Option<VersionDescriptor>,
    package_url: Option<String>,
}

pub struct UpdateOrchestrator {
    metadata: MetadataClient,
    coordinator: Arc<DownloadCoordinator>,
    device: Arc<dyn DeviceHost>,
    prompter: Arc<dyn Prompter>,
    config: Arc<UpdateConfig>,
    identity: OnceCell<AppIdentity>,
    cycle: Mutex<CheckCycle>,
    phase: watch::Sender<OrchestratorPhase>,
}

impl UpdateOrchestrator {
    pub fn new(config: UpdateConfig, services: UpdateServices) -> Self {
        let config = Arc::new(config);
        let coordinator = DownloadCoordinator::new(
            services.transfer,
            services.installer,
            services.device.clone(),
            config.clone(),
        );
        let (phase, _) = watch::channel(OrchestratorPhase::Idle);

        Self {
            metadata: MetadataClient::new(services.http, config.clone()),
            coordinator: Arc::new(coordinator),
            device: services.device,
            prompter: services.prompter,
            config,
            identity: OnceCell::new(),
            cycle: Mutex::new(CheckCycle::default()),
            phase,
        }
    }

    pub fn coordinator(&self) -> &Arc<DownloadCoordinator> {
        &self.coordinator
    }

    pub fn phase(&self) -> OrchestratorPhase {
        *self.phase.borrow()
    }

    /// Receive every phase transition.
    pub fn subscribe_phase(&self) -> watch::Receiver<OrchestratorPhase> {
        self.phase.subscribe()
    }

    pub fn download_status(&self) -> DownloadState {
        self.coordinator.status()
    }

    /// Version of the running build, once the identity has been resolved.
    pub fn current_version(&self) -> Option<String> {
        self.identity.get().map(|i| i.current_version.clone())
    }

    /// Latest version seen by the most recent check.
    pub fn latest_version(&self) -> Option<String> {
        self.cycle().descriptor.as_ref().map(|d| d.version_id.clone())
    }

    /// Descriptor fetched by the most recent check.
    pub fn last_version_info(&self) -> Option<VersionDescriptor> {
        self.cycle().descriptor.clone()
    }

    fn cycle(&self) -> MutexGuard<'_, CheckCycle> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: OrchestratorPhase) {
        self.phase.send_if_modified(|p| {
            if *p == phase {
                return false;
            }
            *p = phase;
            true
        });
    }

    async fn identity(&self) -> Result<&AppIdentity, UpdateError> {
        self.identity
            .get_or_try_init(|| async {
                let version = self.device.version_number().await?;
                let package = self.device.package_name().await?;
                Ok::<_, UpdateError>(AppIdentity::from_package(
                    &package,
                    self.device.platform(),
                    version,
                ))
            })
            .await
    }

    /// Check for a newer build and offer it.
    ///
    /// `is_manual` marks a user-initiated check, which additionally shows
    /// an "already latest" notice when there is nothing to do.
    pub async fn check_version(&self, is_manual: bool) -> CheckOutcome {
        let outcome = self.run_check(is_manual).await;
        self.set_phase(OrchestratorPhase::Idle);
        outcome
    }

    /// Entry point for repeated invocation.
    ///
    /// Runs an automatic check when no download is in flight; otherwise
    /// shows the running download's progress until it finishes, fails, or
    /// the user sends it to the background.
    pub async fn check_new_version(&self) -> CheckOutcome {
        match self.attach_to_download().await {
            Some(percent) => CheckOutcome::Attached { percent },
            None => self.check_version(false).await,
        }
    }

    /// Show the running download's progress, if there is one.
    ///
    /// Returns the last observed percentage, or `None` when nothing is in
    /// flight.
    async fn attach_to_download(&self) -> Option<i8> {
        let status = self.coordinator.status();
        if !status.is_active() {
            return None;
        }
        UpdateLogger::new().log_download_attached(status.progress_percent);
        Some(self.watch_download().await)
    }

    /// Fetch the update found by the last check.
    pub async fn download_app(&self) -> FetchOutcome {
        if !self.device.is_mobile() {
            return FetchOutcome::Failed(UpdateError::UnsupportedHost);
        }
        let identity = match self.identity().await {
            Ok(identity) => identity,
            Err(err) => {
                log_update_error(&err, "download");
                return FetchOutcome::Failed(err);
            }
        };
        let forced = self
            .cycle()
            .descriptor
            .as_ref()
            .is_some_and(|d| d.is_forced_update);

        let outcome = self.fetch_update(identity, forced).await;
        self.set_phase(OrchestratorPhase::Idle);
        outcome
    }

    /// Published releases; empty off-device or on any failure.
    pub async fn version_history(&self) -> Vec<VersionHistoryEntry> {
        if !self.device.is_mobile() {
            return Vec::new();
        }
        let history = match self.identity().await {
            Ok(identity) => self.metadata.version_history(identity).await,
            Err(err) => Err(err),
        };
        history.unwrap_or_else(|err| {
            log_update_error(&err, "version history");
            Vec::new()
        })
    }

    async fn run_check(&self, is_manual: bool) -> CheckOutcome {
        let mut logger = UpdateLogger::new();

        if !self.device.is_mobile() {
            logger.log_check_skipped("host is not a mobile runtime");
            return CheckOutcome::UnsupportedHost;
        }

        if let Some(percent) = self.attach_to_download().await {
            return CheckOutcome::Attached { percent };
        }

        self.set_phase(OrchestratorPhase::CheckingMetadata);

        let identity = match self.identity().await {
            Ok(identity) => identity,
            Err(err) => {
                logger.log_check_failed(&err);
                self.set_phase(OrchestratorPhase::Failed);
                return CheckOutcome::Failed(err);
            }
        };
        logger.log_check_started(&identity.current_version, is_manual);

        let fetched = match self.metadata.fetch_latest(identity).await {
            Ok(descriptor) => descriptor,
            Err(err) => {
                logger.log_check_failed(&err);
                self.set_phase(OrchestratorPhase::Failed);
                return CheckOutcome::MetadataUnavailable(err);
            }
        };

        let package_url = self.resolve_package_url(identity, &fetched).await;
        {
            let mut cycle = self.cycle();
            cycle.descriptor = Some(fetched.clone());
            cycle.package_url = package_url;
        }

        let latest = fetched.version_id.clone();
        let decision = decide(&identity.current_version, Some(fetched));
        logger.log_check_completed(&identity.current_version, &latest, decision.label());

        let (descriptor, forced) = match decision {
            UpdateDecision::NoUpdate => {
                self.set_phase(OrchestratorPhase::NoUpdate);
                if is_manual {
                    self.notify(&self.config.texts.already_latest).await;
                }
                return CheckOutcome::NoUpdate;
            }
            UpdateDecision::MetadataUnavailable => {
                let err = UpdateError::MetadataUnavailable {
                    reason: MetadataIssue::Malformed {
                        message: "latest version has an empty version id".to_string(),
                    },
                };
                logger.log_check_failed(&err);
                self.set_phase(OrchestratorPhase::Failed);
                return CheckOutcome::MetadataUnavailable(err);
            }
            UpdateDecision::OptionalUpdate(d) => (d, false),
            UpdateDecision::ForcedUpdate(d) => (d, true),
        };

        self.set_phase(OrchestratorPhase::AwaitingUserConfirmation);
        let prompt = self.confirmation_prompt(forced);
        let confirm = prompt.default_action();
        logger.log_prompt_shown(&prompt.title, prompt.actions.len());

        match self.prompter.create(prompt).present().await {
            PromptOutcome::Action(index) if Some(index) == confirm => {}
            _ => {
                log_update_debug(&format!("Update to {} declined", descriptor.version_id));
                return CheckOutcome::Declined(descriptor);
            }
        }

        CheckOutcome::Confirmed(self.fetch_update(identity, forced).await)
    }

    /// Forced updates get a single confirm. Neither variant closes from the
    /// backdrop; declining an optional update takes the cancel action.
    fn confirmation_prompt(&self, forced: bool) -> PromptConfig {
        let texts = &self.config.texts;
        if forced {
            PromptConfig::new(&texts.forced_title)
                .with_subtitle(&texts.forced_subtitle)
                .with_dismissible(false)
                .with_action(PromptAction::confirm(&texts.confirm))
        } else {
            PromptConfig::new(&texts.optional_title)
                .with_subtitle(&texts.optional_subtitle)
                .with_dismissible(false)
                .with_action(PromptAction::secondary(&texts.cancel))
                .with_action(PromptAction::confirm(&texts.confirm))
        }
    }

    /// Resolve the package's download location on platforms that download
    /// locally. Lookup failures leave the location unset.
    async fn resolve_package_url(
        &self,
        identity: &AppIdentity,
        descriptor: &VersionDescriptor,
    ) -> Option<String> {
        if identity.fetch_strategy() != FetchStrategy::LocalDownload {
            return None;
        }
        let file_id = descriptor.package_reference.as_deref()?;

        match self.metadata.lookup_file(file_id).await {
            Ok(url) => Some(url),
            Err(err) => {
                log_update_warn(&format!(
                    "Could not resolve package file {}: {}",
                    file_id, err
                ));
                None
            }
        }
    }

    async fn fetch_update(&self, identity: &AppIdentity, forced: bool) -> FetchOutcome {
        match identity.fetch_strategy() {
            FetchStrategy::HostedPage => self.open_download_page(identity).await,
            FetchStrategy::LocalDownload => self.download_locally(identity, forced).await,
        }
    }

    async fn open_download_page(&self, identity: &AppIdentity) -> FetchOutcome {
        let url = self.config.download_page_url(&identity.name);
        match self.device.open_url(&url).await {
            Ok(()) => {
                UpdateLogger::new().log_hosted_page_opened(&url);
                FetchOutcome::OpenedHostedPage { url }
            }
            Err(err) => {
                let err = UpdateError::from(err);
                log_update_error(&err, "open download page");
                self.set_phase(OrchestratorPhase::Failed);
                FetchOutcome::Failed(err)
            }
        }
    }

    async fn download_locally(&self, identity: &AppIdentity, forced: bool) -> FetchOutcome {
        let texts = &self.config.texts;
        let logger = UpdateLogger::new();

        let package_url = self.cycle().package_url.clone();
        let Some(source_url) = package_url else {
            logger.log_error(&UpdateError::NoDownloadTarget, "download");
            self.set_phase(OrchestratorPhase::Failed);
            self.notify(&texts.no_download_target).await;
            return FetchOutcome::NoDownloadTarget;
        };

        // another caller started a download while this one was prompting
        if let Some(percent) = self.attach_to_download().await {
            return FetchOutcome::Download(DownloadOutcome::AlreadyInFlight { percent });
        }

        if let Err(err) = self.device.request_storage_permission().await {
            let err = UpdateError::from(err);
            logger.log_error(&err, "storage permission");
            self.set_phase(OrchestratorPhase::Failed);
            return FetchOutcome::Failed(err);
        }

        self.set_phase(OrchestratorPhase::Downloading);

        let mut dialog_config = PromptConfig::new(texts.progress(0));
        if !forced {
            dialog_config = dialog_config.with_action(PromptAction::secondary(&texts.background));
        }
        logger.log_prompt_shown(&dialog_config.title, dialog_config.actions.len());
        let dialog = self.prompter.create(dialog_config);
        let observer = Arc::new(ProgressDialog {
            handle: dialog.clone(),
            config: self.config.clone(),
        });

        let watch_dialog = async {
            // the only button is "background"
            if let PromptOutcome::Action(_) = dialog.present().await {
                self.coordinator.set_backgrounded(true);
            }
        };
        let download = async {
            let outcome = self
                .coordinator
                .begin_download(DownloadRequest::new(source_url), observer)
                .await;
            dialog.dismiss();
            outcome
        };
        let ((), outcome) = tokio::join!(watch_dialog, download);

        match &outcome {
            DownloadOutcome::Completed { .. } => self.set_phase(OrchestratorPhase::Installing),
            DownloadOutcome::Failed(_) => {
                self.set_phase(OrchestratorPhase::Failed);
                self.offer_hosted_page(identity).await;
            }
            DownloadOutcome::AlreadyInFlight { .. } => {}
        }

        FetchOutcome::Download(outcome)
    }

    /// After a failed local download, offer the web page instead.
    async fn offer_hosted_page(&self, identity: &AppIdentity) {
        let texts = &self.config.texts;
        let prompt = PromptConfig::new(&texts.fallback_title)
            .with_subtitle(&texts.fallback_subtitle)
            .with_dismissible(true)
            .with_action(PromptAction::confirm(&texts.confirm));
        UpdateLogger::new().log_prompt_shown(&prompt.title, prompt.actions.len());

        if let PromptOutcome::Action(_) = self.prompter.create(prompt).present().await {
            self.open_download_page(identity).await;
        }
    }

    /// Show the running download's progress until it ends.
    ///
    /// Returns the last observed percentage.
    async fn watch_download(&self) -> i8 {
        let texts = &self.config.texts;
        let initial = self.coordinator.status().progress_percent;
        let prompt = PromptConfig::new(texts.progress(initial))
            .with_dismissible(true)
            .with_action(PromptAction::secondary(&texts.background));
        UpdateLogger::new().log_prompt_shown(&prompt.title, prompt.actions.len());
        let dialog = self.prompter.create(prompt);

        let mut ticker = tokio::time::interval(self.config.poll_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        let presented = dialog.present();
        tokio::pin!(presented);

        loop {
            tokio::select! {
                _ = &mut presented => return self.coordinator.status().progress_percent,
                _ = ticker.tick() => {
                    let status = self.coordinator.status();
                    dialog.set_title(&texts.progress(status.progress_percent));
                    if !status.is_active() {
                        dialog.dismiss();
                        return status.progress_percent;
                    }
                }
            }
        }
    }

    /// Single-button notice; waits until it is closed.
    async fn notify(&self, message: &str) {
        let prompt = PromptConfig::new(message)
            .with_dismissible(true)
            .with_action(PromptAction::confirm(&self.config.texts.confirm));
        UpdateLogger::new().log_prompt_shown(&prompt.title, prompt.actions.len());
        self.prompter.create(prompt).present().await;
    }
}

/// Drives the on-screen progress dialog of a local download.
struct ProgressDialog {
    handle: Arc<dyn PromptHandle>,
    config: Arc<UpdateConfig>,
}

impl DownloadObserver for ProgressDialog {
    fn on_progress(&self, state: &DownloadState) {
        if state.is_complete() {
            self.handle.dismiss();
        } else if !state.is_backgrounded {
            self.handle
                .set_title(&self.config.texts.progress(state.progress_percent));
        }
    }

    fn on_complete(&self, _path: &Path) {
        self.handle.dismiss();
    }

    fn on_error(&self, _error: &UpdateError) {
        self.handle.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{
        MockDeviceHost, MockFileTransfer, MockHttpClient, MockInstaller, MockPrompter,
        MockResponse, PromptChoice, TransferScript,
    };
    use crate::traits::{HttpError, TransferError, TransferProgress};
    use crate::update::Platform;
    use std::time::Duration;

    const LATEST_ANDROID: &str =
        "http://localhost:8080/v1/apply/getDownloadPageByEName/demo/android";
    const LATEST_IOS: &str = "http://localhost:8080/v1/apply/getDownloadPageByEName/demo/ios";
    const FILE_42: &str = "http://localhost:8081/v1/file/42";
    const DOWNLOAD_PAGE: &str = "http://localhost:8081/static/download.html?name=demo";

    struct Fixture {
        http: MockHttpClient,
        device: MockDeviceHost,
        transfer: MockFileTransfer,
        installer: MockInstaller,
        prompter: MockPrompter,
        orchestrator: UpdateOrchestrator,
    }

    fn fixture_with(device: MockDeviceHost) -> Fixture {
        let http = MockHttpClient::new();
        let transfer = MockFileTransfer::new();
        let installer = MockInstaller::new();
        let prompter = MockPrompter::new();
        let orchestrator = UpdateOrchestrator::new(
            UpdateConfig::default(),
            UpdateServices {
                http: Arc::new(http.clone()),
                device: Arc::new(device.clone()),
                transfer: Arc::new(transfer.clone()),
                installer: Arc::new(installer.clone()),
                prompter: Arc::new(prompter.clone()),
            },
        );
        Fixture {
            http,
            device,
            transfer,
            installer,
            prompter,
            orchestrator,
        }
    }

    fn android() -> Fixture {
        fixture_with(MockDeviceHost::new(Platform::Android).with_external_root("/sdcard"))
    }

    fn latest_json(version: &str, forced: bool) -> String {
        format!(
            r#"{{"code":1,"data":{{"lastVersion":{{"version":"{}","isForcedUpdate":{}}},"fileRelationList":[{{"type":"apk","fileId":"42"}}]}}}}"#,
            version,
            if forced { 1 } else { 0 }
        )
    }

    fn serve_update(f: &Fixture, forced: bool) {
        f.http.set_json(LATEST_ANDROID, &latest_json("1.0.1", forced));
        f.http
            .set_json(FILE_42, r#"{"code":1,"data":{"origPath":"https://cdn.test/demo.apk"}}"#);
    }

    #[tokio::test]
    async fn test_non_mobile_host_is_silent_noop() {
        let f = fixture_with(MockDeviceHost::desktop());

        let outcome = f.orchestrator.check_version(true).await;

        assert!(matches!(outcome, CheckOutcome::UnsupportedHost));
        assert!(f.http.get_requests().is_empty());
        assert_eq!(f.prompter.prompt_count(), 0);
        assert_eq!(f.device.version_queries(), 0);
        assert!(f.orchestrator.version_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_optional_update_confirmed_downloads_and_installs() {
        let f = android();
        serve_update(&f, false);
        f.transfer.push_script(TransferScript::succeed(vec![
            (Duration::ZERO, TransferProgress::new(50, 100)),
            (Duration::ZERO, TransferProgress::new(100, 100)),
        ]));

        let outcome = f.orchestrator.check_version(false).await;

        let CheckOutcome::Confirmed(FetchOutcome::Download(DownloadOutcome::Completed {
            path,
            install_error: None,
        })) = outcome
        else {
            panic!("unexpected outcome {:?}", outcome);
        };
        assert!(path.starts_with("/sdcard/download"));

        let prompts = f.prompter.prompts();
        let confirm = &prompts[0].config;
        assert_eq!(confirm.actions.len(), 2);
        assert_eq!(confirm.default_action(), Some(1));
        assert!(!confirm.dismissible);

        // progress dialog with a background button, closed at the end
        assert_eq!(prompts[1].config.actions.len(), 1);
        assert!(prompts[1].dismissed);

        assert_eq!(f.device.permission_requests(), 1);
        assert_eq!(f.transfer.calls()[0].source_url, "https://cdn.test/demo.apk");
        assert_eq!(f.installer.opened().len(), 1);
        assert_eq!(f.orchestrator.download_status().progress_percent, 100);
        assert_eq!(f.orchestrator.phase(), OrchestratorPhase::Idle);
        assert_eq!(f.orchestrator.latest_version().as_deref(), Some("1.0.1"));
        assert_eq!(f.orchestrator.current_version().as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_forced_update_prompt_shape() {
        let f = android();
        serve_update(&f, true);

        f.orchestrator.check_version(false).await;

        let prompts = f.prompter.prompts();
        assert_eq!(prompts[0].config.actions.len(), 1);
        assert!(!prompts[0].config.dismissible);
        // no background button on the progress dialog
        assert!(prompts[1].config.actions.is_empty());
        assert!(f.orchestrator.last_version_info().unwrap().is_forced_update);
    }

    #[tokio::test]
    async fn test_declined_update_starts_nothing() {
        let f = android();
        serve_update(&f, false);
        f.prompter.push_choice(PromptChoice::Select(0));

        let outcome = f.orchestrator.check_version(false).await;

        assert!(matches!(outcome, CheckOutcome::Declined(d) if d.version_id == "1.0.1"));
        assert!(f.transfer.calls().is_empty());
        assert_eq!(f.orchestrator.download_status(), DownloadState::idle());
    }

    #[tokio::test]
    async fn test_up_to_date_notice_only_on_manual_check() {
        let f = android();
        f.http.set_json(LATEST_ANDROID, &latest_json("1.0.0", false));

        assert!(matches!(f.orchestrator.check_version(false).await, CheckOutcome::NoUpdate));
        assert_eq!(f.prompter.prompt_count(), 0);

        assert!(matches!(f.orchestrator.check_version(true).await, CheckOutcome::NoUpdate));
        let prompts = f.prompter.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].config.title, UpdateConfig::default().texts.already_latest);
    }

    #[tokio::test]
    async fn test_metadata_failures_are_distinct_and_silent() {
        let f = android();
        f.http.set_json(LATEST_ANDROID, r#"{"code":1,"data":{}}"#);

        let outcome = f.orchestrator.check_version(true).await;
        assert!(matches!(
            outcome,
            CheckOutcome::MetadataUnavailable(UpdateError::MetadataUnavailable {
                reason: MetadataIssue::NoLatestVersion
            })
        ));

        f.http.set_response(
            LATEST_ANDROID,
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        let outcome = f.orchestrator.check_version(true).await;
        assert!(matches!(
            outcome,
            CheckOutcome::MetadataUnavailable(UpdateError::MetadataUnavailable {
                reason: MetadataIssue::RequestFailed { .. }
            })
        ));

        assert_eq!(f.prompter.prompt_count(), 0);
        assert_eq!(f.orchestrator.phase(), OrchestratorPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_package_location_fails_fast() {
        let f = android();
        f.http.set_json(LATEST_ANDROID, &latest_json("1.0.1", false));
        f.http.set_response(
            FILE_42,
            MockResponse::Error(HttpError::Timeout("30s".to_string())),
        );

        let outcome = f.orchestrator.check_version(false).await;

        assert!(matches!(outcome, CheckOutcome::Confirmed(FetchOutcome::NoDownloadTarget)));
        assert!(f.transfer.calls().is_empty());
        assert_eq!(f.device.permission_requests(), 0);
        let prompts = f.prompter.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[1].config.title, UpdateConfig::default().texts.no_download_target);
    }

    #[tokio::test]
    async fn test_ios_opens_hosted_page() {
        let f = fixture_with(MockDeviceHost::new(Platform::Ios));
        f.http.set_json(LATEST_IOS, &latest_json("1.0.1", false));

        let outcome = f.orchestrator.check_version(false).await;

        assert!(matches!(
            outcome,
            CheckOutcome::Confirmed(FetchOutcome::OpenedHostedPage { ref url }) if url == DOWNLOAD_PAGE
        ));
        assert_eq!(f.device.opened_urls(), vec![DOWNLOAD_PAGE.to_string()]);
        assert!(f.transfer.calls().is_empty());
        // no file lookup off Android
        assert_eq!(f.http.request_count("http://localhost:8081"), 0);
    }

    #[tokio::test]
    async fn test_transfer_failure_offers_web_fallback() {
        let f = android();
        serve_update(&f, false);
        f.transfer.push_script(TransferScript::fail(
            vec![(Duration::ZERO, TransferProgress::new(30, 100))],
            TransferError::Http { status: 404 },
        ));

        let outcome = f.orchestrator.check_version(false).await;

        assert!(matches!(
            outcome,
            CheckOutcome::Confirmed(FetchOutcome::Download(DownloadOutcome::Failed(_)))
        ));
        assert_eq!(f.orchestrator.download_status(), DownloadState::idle());

        let prompts = f.prompter.prompts();
        let fallback = prompts.last().unwrap();
        assert_eq!(fallback.config.title, UpdateConfig::default().texts.fallback_title);
        assert_eq!(fallback.config.actions.len(), 1);
        assert_eq!(f.device.opened_urls(), vec![DOWNLOAD_PAGE.to_string()]);
        assert_eq!(f.orchestrator.phase(), OrchestratorPhase::Idle);
    }

    #[tokio::test]
    async fn test_permission_denied_stops_before_transfer() {
        let f = fixture_with(
            MockDeviceHost::new(Platform::Android)
                .with_external_root("/sdcard")
                .with_permission_denied(),
        );
        serve_update(&f, false);

        let outcome = f.orchestrator.check_version(false).await;

        assert!(matches!(
            outcome,
            CheckOutcome::Confirmed(FetchOutcome::Failed(UpdateError::PermissionDenied { .. }))
        ));
        assert!(f.transfer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_background_button_hides_progress() {
        let f = android();
        serve_update(&f, false);
        f.prompter.push_choice(PromptChoice::Select(1)); // confirm
        f.prompter.push_choice(PromptChoice::Select(0)); // background
        let gate = f.transfer.push_gated_script(TransferScript::succeed(vec![(
            Duration::ZERO,
            TransferProgress::new(10, 100),
        )]));

        let check = f.orchestrator.check_version(false);
        let release = async {
            while !f.orchestrator.download_status().is_backgrounded {
                tokio::task::yield_now().await;
            }
            gate.release();
        };
        let (outcome, ()) = tokio::join!(check, release);

        assert!(matches!(
            outcome,
            CheckOutcome::Confirmed(FetchOutcome::Download(DownloadOutcome::Completed { .. }))
        ));
        assert!(f.orchestrator.download_status().is_backgrounded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_new_version_attaches_to_running_download() {
        let f = android();
        serve_update(&f, false);
        f.prompter.push_choice(PromptChoice::Select(1)); // confirm
        f.prompter.push_choice(PromptChoice::Wait); // progress dialog
        f.transfer.push_script(TransferScript::succeed(vec![
            (Duration::ZERO, TransferProgress::new(20, 100)),
            (Duration::from_millis(2500), TransferProgress::new(60, 100)),
            (Duration::from_millis(2500), TransferProgress::new(100, 100)),
        ]));

        let first = f.orchestrator.check_version(false);
        let second = async {
            while !f.orchestrator.download_status().is_active() {
                tokio::task::yield_now().await;
            }
            f.orchestrator.check_new_version().await
        };
        let (_, second) = tokio::join!(first, second);

        assert!(matches!(second, CheckOutcome::Attached { percent: 100 }));
        assert_eq!(f.transfer.calls().len(), 1);
        assert_eq!(f.http.request_count(LATEST_ANDROID), 1);

        let watcher = f.prompter.prompts().into_iter().last().unwrap();
        assert!(watcher.dismissed);
        assert!(watcher.titles.iter().any(|t| t == "Download progress: 60%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_version_attaches_to_running_download() {
        let f = android();
        serve_update(&f, false);
        f.prompter.push_choice(PromptChoice::Select(1)); // confirm
        f.prompter.push_choice(PromptChoice::Wait); // progress dialog
        let gate = f.transfer.push_gated_script(TransferScript::succeed(vec![(
            Duration::ZERO,
            TransferProgress::new(30, 100),
        )]));

        let first = f.orchestrator.check_version(false);
        let second = async {
            while f.orchestrator.download_status().progress_percent < 30 {
                tokio::task::yield_now().await;
            }
            let release = async {
                tokio::time::sleep(Duration::from_millis(1500)).await;
                gate.release();
            };
            let (outcome, ()) = tokio::join!(f.orchestrator.check_version(false), release);
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(
            first,
            CheckOutcome::Confirmed(FetchOutcome::Download(DownloadOutcome::Completed { .. }))
        ));
        assert!(matches!(second, CheckOutcome::Attached { percent: 100 }));
        assert_eq!(f.http.request_count(LATEST_ANDROID), 1);
        assert_eq!(f.device.permission_requests(), 1);
        assert_eq!(f.transfer.calls().len(), 1);

        // confirm, progress dialog, watcher
        let prompts = f.prompter.prompts();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[2].config.title, "Download progress: 30%");
        assert!(prompts[2].dismissed);
    }

    #[tokio::test]
    async fn test_check_new_version_runs_check_when_idle() {
        let f = android();
        f.http.set_json(LATEST_ANDROID, &latest_json("1.0.0", false));

        assert!(matches!(f.orchestrator.check_new_version().await, CheckOutcome::NoUpdate));
        // automatic check: no notice
        assert_eq!(f.prompter.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_version_history() {
        let f = android();
        f.http.set_json(
            "http://localhost:8080/v1/apply/findVersionList/demo/android",
            r#"{"code":1,"data":{"versions":[{"version":"1.0.1","note":"x"},{"version":"1.0.0"}]}}"#,
        );

        let history = f.orchestrator.version_history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version, "1.0.1");
    }

    #[tokio::test]
    async fn test_identity_resolved_once() {
        let f = android();
        f.http.set_json(LATEST_ANDROID, &latest_json("1.0.0", false));

        f.orchestrator.check_version(false).await;
        f.orchestrator.check_version(false).await;

        assert_eq!(f.device.version_queries(), 1);
    }
}
