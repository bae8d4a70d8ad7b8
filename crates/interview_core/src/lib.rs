pub mod domain;
pub mod ports;
pub mod scoring;

pub use domain::{
    ConversationStats, InterviewKind, InterviewSession, Message, RealtimeUpdate, ScoreReport,
    Sender,
};
pub use ports::{
    ConversationStore, InterviewerService, PortError, PortResult, RealtimeTransport, ReplyStream,
    SpeechToTextService,
};
pub use scoring::{score_conversation, summarize};
