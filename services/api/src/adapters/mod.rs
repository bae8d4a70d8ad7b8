pub mod interviewer_llm;
pub mod sst;
pub mod store;
pub mod transport;

pub use interviewer_llm::OpenAiInterviewerAdapter;
pub use sst::OpenAiSstAdapter;
pub use store::JsonFileStore;
pub use transport::{HttpPollTransport, SimulatedPollTransport};
