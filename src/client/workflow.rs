//! Client-side generation state machine.
//!
//! `Idle -> Uploading -> Ready -> Generating -> {Succeeded, Failed}`. Any
//! edit after a terminal state returns to `Ready`; the last result stays
//! visible until the next dispatch replaces it.

use super::attachments::{AttachmentError, ImageAttachment};
use super::feedback::{Cue, Feedback};
use super::settings::{read_sound_enabled, SettingsStore, API_KEY_SETTING, SOUND_ENABLED_SETTING};
use super::transport::GenerationTransport;
use crate::models::{GeneratedImage, GenerationRequestBody, GenerationResult};
use crate::share::{self, ShareOutcome, SharePlatform};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error as ThisError;
use tracing::{error, info, warn};

/// Concurrent file reads during one upload batch.
const UPLOAD_CONCURRENCY: usize = 4;

pub const MISSING_PROMPT_MESSAGE: &str = "Please enter a prompt";
pub const MISSING_API_KEY_MESSAGE: &str = "Please enter your Gemini API key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Uploading,
    Ready,
    Generating,
    Succeeded,
    Failed,
}

/// Refusals raised before anything is sent.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{}", MISSING_PROMPT_MESSAGE)]
    MissingPrompt,

    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,
}

/// Synchronous user-facing warnings.
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn warn(&self, message: &str) {
        eprintln!("{}", message);
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// What one exchange carries. Only the first attachment reaches the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub images: Vec<ImageAttachment>,
    pub credential: String,
}

impl GenerationRequest {
    pub fn to_body(&self) -> GenerationRequestBody {
        GenerationRequestBody {
            prompt: Some(self.prompt.clone()),
            image_data: self.images.first().map(|image| image.raw_data.clone()),
            api_key: Some(self.credential.clone()),
        }
    }
}

/// Files accepted and refused by one `add_files` batch.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<AttachmentError>,
}

pub struct WorkflowServices {
    pub transport: Arc<dyn GenerationTransport>,
    pub settings: Arc<dyn SettingsStore>,
    pub feedback: Arc<Feedback>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct GenerationWorkflow {
    services: WorkflowServices,
    state: WorkflowState,
    prompt: String,
    api_key: String,
    attachments: Vec<ImageAttachment>,
    result: Option<GenerationResult>,
}

impl GenerationWorkflow {
    /// Loads the stored credential and sound preference once.
    pub fn new(services: WorkflowServices) -> Result<Self> {
        let api_key = services.settings.get(API_KEY_SETTING)?.unwrap_or_default();
        services
            .feedback
            .set_enabled(read_sound_enabled(services.settings.as_ref())?);

        Ok(Self {
            services,
            state: WorkflowState::Idle,
            prompt: String::new(),
            api_key,
            attachments: Vec::new(),
            result: None,
        })
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn attachments(&self) -> &[ImageAttachment] {
        &self.attachments
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn sound_enabled(&self) -> bool {
        self.services.feedback.is_enabled()
    }

    fn touch(&mut self) {
        self.services.feedback.init();
        if self.state != WorkflowState::Generating {
            self.state = WorkflowState::Ready;
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.touch();
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
        self.touch();
    }

    pub fn add_attachment(&mut self, attachment: ImageAttachment) {
        self.attachments.push(attachment);
        self.touch();
    }

    /// Read `paths` concurrently, appending accepted images in the order
    /// their reads finish. A refused file does not stop the others.
    pub async fn add_files(&mut self, paths: &[PathBuf]) -> UploadReport {
        self.services.feedback.init();
        self.state = WorkflowState::Uploading;

        let mut loads = stream::iter(paths.iter().cloned())
            .map(|path| async move { ImageAttachment::load(&path).await })
            .buffer_unordered(UPLOAD_CONCURRENCY);

        let mut report = UploadReport::default();
        while let Some(loaded) = loads.next().await {
            match loaded {
                Ok(attachment) => {
                    info!("Attached {}", attachment.display_name);
                    report.accepted.push(attachment.display_name.clone());
                    self.attachments.push(attachment);
                    self.services.feedback.play(Cue::Upload);
                }
                Err(e) => {
                    warn!("Rejected attachment: {}", e);
                    self.services.notifier.warn(&e.to_string());
                    report.rejected.push(e);
                }
            }
        }

        self.state = WorkflowState::Ready;
        report
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<ImageAttachment> {
        if index >= self.attachments.len() {
            return None;
        }
        let removed = self.attachments.remove(index);
        self.touch();
        self.services.feedback.play(Cue::Click);
        Some(removed)
    }

    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
        self.touch();
        self.services.feedback.play(Cue::Click);
    }

    fn build_request(&self) -> std::result::Result<GenerationRequest, WorkflowError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(WorkflowError::MissingPrompt);
        }
        let credential = self.api_key.trim();
        if credential.is_empty() {
            return Err(WorkflowError::MissingApiKey);
        }
        Ok(GenerationRequest {
            prompt: prompt.to_string(),
            images: self.attachments.clone(),
            credential: credential.to_string(),
        })
    }

    /// Dispatch exactly one request and wait for its result.
    ///
    /// A refused guard leaves the state untouched. Once dispatched, every
    /// outcome (including an unreachable server) ends in `Succeeded` or
    /// `Failed` with a result.
    pub async fn generate(&mut self) -> std::result::Result<&GenerationResult, WorkflowError> {
        self.services.feedback.init();
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                self.services.notifier.warn(&e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = self.services.settings.set(API_KEY_SETTING, &request.credential) {
            warn!("Failed to persist API key: {}", e);
        }
        self.result = None;
        self.state = WorkflowState::Generating;
        self.services.feedback.play(Cue::GenerateStart);
        info!(
            "Generating for prompt ({} chars, {} attachment(s))",
            request.prompt.len(),
            request.images.len()
        );

        let result = match self.services.transport.send(&request.to_body()).await {
            Ok(result) => result,
            Err(e) => {
                error!("Generation request failed: {}", e);
                GenerationResult::network_error()
            }
        };

        if result.success {
            self.state = WorkflowState::Succeeded;
            self.services.feedback.play(Cue::Success);
        } else {
            warn!(
                "Generation failed ({:?}): {}",
                result.code,
                result.error.as_deref().unwrap_or("unknown error")
            );
            self.state = WorkflowState::Failed;
            self.services.feedback.play(Cue::Error);
        }

        Ok(&*self.result.insert(result))
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<()> {
        self.services.feedback.set_enabled(enabled);
        self.services
            .settings
            .set(SOUND_ENABLED_SETTING, if enabled { "true" } else { "false" })?;
        // Audible confirmation only when turning sound on.
        self.services.feedback.play(Cue::Click);
        Ok(())
    }

    pub fn toggle_sound(&mut self) -> Result<bool> {
        let enabled = !self.sound_enabled();
        self.set_sound_enabled(enabled)?;
        Ok(enabled)
    }

    fn result_image(&self) -> Result<&GeneratedImage> {
        self.result
            .as_ref()
            .and_then(|result| result.image.as_ref())
            .ok_or_else(|| Error::Share("No generated image to export".to_string()))
    }

    pub async fn download_result(&self, platform: &dyn SharePlatform) -> Result<PathBuf> {
        let image = self.result_image()?;
        self.services.feedback.play(Cue::Click);
        match share::download_image(platform, image).await {
            Ok(path) => Ok(path),
            Err(e) => {
                self.services.feedback.play(Cue::Error);
                Err(e)
            }
        }
    }

    pub async fn share_result(&self, platform: &dyn SharePlatform) -> Result<ShareOutcome> {
        let image = self.result_image()?;
        let caption = self.result.as_ref().and_then(GenerationResult::share_caption);
        self.services.feedback.play(Cue::Click);

        match share::share_image(platform, image, caption).await {
            Ok(outcome) => {
                self.services.feedback.play(Cue::Success);
                Ok(outcome)
            }
            Err(e) => {
                self.services.feedback.play(Cue::Error);
                Err(e)
            }
        }
    }

    pub async fn copy_text(&self, platform: &dyn SharePlatform, text: &str) -> Result<()> {
        platform.copy_text(text).await?;
        self.services.feedback.play(Cue::Copy);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::feedback::RecordingSink;
    use crate::client::settings::MemorySettingsStore;
    use crate::client::transport::MockTransport;
    use crate::models::{ErrorCode, NETWORK_ERROR_MESSAGE};
    use crate::share::{MockSharePlatform, ShareCall};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct Harness {
        workflow: GenerationWorkflow,
        transport: MockTransport,
        settings: Arc<MemorySettingsStore>,
        sink: RecordingSink,
        notifier: RecordingNotifier,
    }

    fn harness_with(transport: MockTransport, settings: MemorySettingsStore) -> Harness {
        let settings = Arc::new(settings);
        let sink = RecordingSink::new();
        let notifier = RecordingNotifier::new();
        let workflow = GenerationWorkflow::new(WorkflowServices {
            transport: Arc::new(transport.clone()),
            settings: settings.clone(),
            feedback: Arc::new(Feedback::new(Box::new(sink.clone()))),
            notifier: Arc::new(notifier.clone()),
        })
        .unwrap();

        Harness {
            workflow,
            transport,
            settings,
            sink,
            notifier,
        }
    }

    fn harness(transport: MockTransport) -> Harness {
        harness_with(transport, MemorySettingsStore::new())
    }

    fn success() -> GenerationResult {
        GenerationResult {
            success: true,
            image: Some(GeneratedImage {
                data: "UE5HIQ==".to_string(),
                mime_type: "image/png".to_string(),
            }),
            text: Some("a friendly banana".to_string()),
            original_prompt: Some("banana".to_string()),
            message: Some("Image generated successfully!".to_string()),
            ..GenerationResult::default()
        }
    }

    fn attachment(name: &str) -> ImageAttachment {
        ImageAttachment::from_bytes(name, "image/png", &PNG_HEADER).unwrap()
    }

    #[test]
    fn test_new_reads_stored_settings() {
        let settings = MemorySettingsStore::new()
            .with_value(API_KEY_SETTING, "stored-key")
            .with_value(SOUND_ENABLED_SETTING, "false");

        let h = harness_with(MockTransport::new(), settings);

        assert_eq!(h.workflow.api_key(), "stored-key");
        assert!(!h.workflow.sound_enabled());
        assert_eq!(h.workflow.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_refused_without_dispatch() {
        let mut h = harness(MockTransport::new().with_response(success()));
        h.workflow.set_prompt("   ");
        h.workflow.set_api_key("key");

        let err = h.workflow.generate().await.unwrap_err();

        assert_eq!(err, WorkflowError::MissingPrompt);
        assert_eq!(h.workflow.state(), WorkflowState::Ready);
        assert_eq!(h.transport.get_call_count(), 0);
        assert_eq!(h.notifier.get_messages(), vec![MISSING_PROMPT_MESSAGE]);
    }

    #[tokio::test]
    async fn test_empty_api_key_is_refused_without_dispatch() {
        let mut h = harness(MockTransport::new().with_response(success()));
        h.workflow.set_prompt("banana");

        let err = h.workflow.generate().await.unwrap_err();

        assert_eq!(err, WorkflowError::MissingApiKey);
        assert_eq!(h.transport.get_call_count(), 0);
        assert_eq!(h.notifier.get_messages(), vec![MISSING_API_KEY_MESSAGE]);
    }

    #[tokio::test]
    async fn test_success_sends_trimmed_fields_and_first_image_only() {
        let mut h = harness(MockTransport::new().with_response(success()));
        h.workflow.set_prompt("  banana  ");
        h.workflow.set_api_key(" key ");
        h.workflow.add_attachment(attachment("first.png"));
        h.workflow.add_attachment(attachment("second.png"));

        let result = h.workflow.generate().await.unwrap().clone();

        assert!(result.success);
        assert_eq!(h.workflow.state(), WorkflowState::Succeeded);

        let sent = h.transport.get_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].prompt.as_deref(), Some("banana"));
        assert_eq!(sent[0].api_key.as_deref(), Some("key"));
        assert_eq!(
            sent[0].image_data.as_deref(),
            Some(h.workflow.attachments()[0].raw_data.as_str())
        );

        assert_eq!(
            h.settings.get(API_KEY_SETTING).unwrap().as_deref(),
            Some("key")
        );
        assert_eq!(h.sink.get_cues(), vec![Cue::GenerateStart, Cue::Success]);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_network_error() {
        let mut h = harness(MockTransport::new());
        h.workflow.set_prompt("banana");
        h.workflow.set_api_key("key");

        let result = h.workflow.generate().await.unwrap().clone();

        assert!(!result.success);
        assert_eq!(result.code, Some(ErrorCode::NetworkError));
        assert_eq!(result.error.as_deref(), Some(NETWORK_ERROR_MESSAGE));
        assert_eq!(h.workflow.state(), WorkflowState::Failed);
        assert_eq!(h.sink.get_cues().last(), Some(&Cue::Error));
    }

    #[tokio::test]
    async fn test_decoded_failure_goes_to_failed() {
        let failure = GenerationResult {
            success: false,
            error: Some("Invalid API key.".to_string()),
            code: Some(ErrorCode::InvalidApiKey),
            ..GenerationResult::default()
        };
        let mut h = harness(MockTransport::new().with_response(failure));
        h.workflow.set_prompt("banana");
        h.workflow.set_api_key("bad");

        let result = h.workflow.generate().await.unwrap().clone();

        assert_eq!(result.code, Some(ErrorCode::InvalidApiKey));
        assert_eq!(h.workflow.state(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn test_two_submissions_make_two_requests() {
        let mut h = harness(MockTransport::new().with_response(success()));
        h.workflow.set_prompt("banana");
        h.workflow.set_api_key("key");

        h.workflow.generate().await.unwrap();
        h.workflow.generate().await.unwrap();

        assert_eq!(h.transport.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_edit_after_result_returns_to_ready_and_keeps_result() {
        let mut h = harness(MockTransport::new().with_response(success()));
        h.workflow.set_prompt("banana");
        h.workflow.set_api_key("key");
        h.workflow.generate().await.unwrap();

        h.workflow.set_prompt("another banana");

        assert_eq!(h.workflow.state(), WorkflowState::Ready);
        assert!(h.workflow.result().is_some());
    }

    #[tokio::test]
    async fn test_add_files_keeps_accepted_and_reports_rejected() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("notes.txt");
        let big = dir.path().join("big.png");
        std::fs::write(&good, PNG_HEADER).unwrap();
        std::fs::write(&bad, "plain text").unwrap();
        std::fs::File::create(&big)
            .unwrap()
            .set_len(crate::client::attachments::MAX_ATTACHMENT_BYTES + 1)
            .unwrap();

        let mut h = harness(MockTransport::new());
        let report = h.workflow.add_files(&[good, bad, big]).await;

        assert_eq!(report.accepted, vec!["good.png".to_string()]);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(h.workflow.attachments().len(), 1);
        assert_eq!(h.notifier.get_messages().len(), 2);
        assert_eq!(h.workflow.state(), WorkflowState::Ready);
        assert_eq!(h.sink.get_cues(), vec![Cue::Upload]);
    }

    #[tokio::test]
    async fn test_add_files_accepts_every_image() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..6)
            .map(|i| {
                let path = dir.path().join(format!("{}.png", i));
                std::fs::write(&path, PNG_HEADER).unwrap();
                path
            })
            .collect();

        let mut h = harness(MockTransport::new());
        let report = h.workflow.add_files(&paths).await;

        assert_eq!(report.accepted.len(), 6);
        assert_eq!(h.workflow.attachments().len(), 6);
    }

    #[test]
    fn test_remove_and_clear_attachments() {
        let mut h = harness(MockTransport::new());
        h.workflow.add_attachment(attachment("a.png"));
        h.workflow.add_attachment(attachment("b.png"));

        let removed = h.workflow.remove_attachment(0).unwrap();
        assert_eq!(removed.display_name, "a.png");
        assert_eq!(h.workflow.attachments()[0].display_name, "b.png");
        assert!(h.workflow.remove_attachment(5).is_none());

        h.workflow.clear_attachments();
        assert!(h.workflow.attachments().is_empty());
    }

    #[test]
    fn test_toggle_sound_persists_flag() {
        let mut h = harness(MockTransport::new());
        assert!(h.workflow.sound_enabled());

        assert!(!h.workflow.toggle_sound().unwrap());
        assert_eq!(
            h.settings.get(SOUND_ENABLED_SETTING).unwrap().as_deref(),
            Some("false")
        );

        assert!(h.workflow.toggle_sound().unwrap());
        assert_eq!(
            h.settings.get(SOUND_ENABLED_SETTING).unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_share_result_uses_prompt_caption() {
        let mut h = harness(MockTransport::new().with_response(success()));
        h.workflow.set_prompt("banana");
        h.workflow.set_api_key("key");
        h.workflow.generate().await.unwrap();

        let platform = MockSharePlatform::new();
        let outcome = h.workflow.share_result(&platform).await.unwrap();

        assert!(matches!(
            outcome,
            ShareOutcome::Downloaded {
                caption_copied: true,
                ..
            }
        ));
        assert!(platform
            .get_calls()
            .contains(&ShareCall::CopyText("Created with: \"banana\"".to_string())));
    }

    #[tokio::test]
    async fn test_export_without_image_is_an_error() {
        let h = harness(MockTransport::new());
        let platform = MockSharePlatform::new();

        assert!(h.workflow.download_result(&platform).await.is_err());
        assert!(h.workflow.share_result(&platform).await.is_err());
        assert!(platform.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_copy_text_plays_copy_cue() {
        let mut h = harness(MockTransport::new());
        h.workflow.set_prompt("wake feedback");
        let platform = MockSharePlatform::new();

        h.workflow.copy_text(&platform, "hello").await.unwrap();

        assert_eq!(
            platform.get_calls(),
            vec![ShareCall::CopyText("hello".to_string())]
        );
        assert_eq!(h.sink.get_cues(), vec![Cue::Copy]);
    }
}
