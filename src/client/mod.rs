//! Client side of the pipeline: attachments, settings, feedback and the
//! workflow that drives a generation against the server.

pub mod attachments;
pub mod feedback;
pub mod settings;
pub mod transport;
pub mod workflow;

pub use attachments::{AttachmentError, ImageAttachment, MAX_ATTACHMENT_BYTES};
pub use feedback::{Cue, Feedback, FeedbackSink, RecordingSink, TerminalBell};
pub use settings::{FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use transport::{GenerationTransport, HttpTransport, MockTransport};
pub use workflow::{
    ConsoleNotifier, GenerationRequest, GenerationWorkflow, Notifier, RecordingNotifier,
    UploadReport, WorkflowError, WorkflowServices, WorkflowState,
};
