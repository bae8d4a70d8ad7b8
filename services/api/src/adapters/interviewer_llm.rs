//! services/api/src/adapters/interviewer_llm.rs
//!
//! This module contains the adapter for the interviewer LLM.
//! It implements the `InterviewerService` port from the `core` crate.

const PERSONA_TEMPLATE: &str = "You are Sarah Chen, a senior {role} interviewer. Keep responses concise (max 2 sentences) and engaging. Ask one clear question at a time. Be conversational but professional.

Interview Context: {role} position";

/// How many trailing conversation turns are replayed to the model.
const HISTORY_WINDOW: usize = 6;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use interview_core::{
    domain::{Message, Sender},
    ports::{InterviewerService, PortError, PortResult, ReplyStream},
};
use regex::Regex;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `InterviewerService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiInterviewerAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    /// Strips a leaked speaker label ("Interviewer (Sarah Chen):") from replies.
    speaker_prefix: Regex,
}

impl OpenAiInterviewerAdapter {
    /// Creates a new `OpenAiInterviewerAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        let speaker_prefix = Regex::new(r"(?i)^interviewer \(sarah chen\):\s*").unwrap();
        Self {
            client,
            model,
            speaker_prefix,
        }
    }

    fn build_request(
        &self,
        candidate_text: &str,
        history: &[Message],
        role: &str,
        stream: bool,
    ) -> PortResult<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(PERSONA_TEMPLATE.replace("{role}", role))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        // Replay only the recent exchange; system notices never reach the model.
        let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        for message in recent {
            match message.sender {
                Sender::User => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(message.text.clone())
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                ),
                Sender::Interviewer => messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(message.text.clone())
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                ),
                Sender::System => {}
            }
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(candidate_text.to_string())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            // Short replies keep the spoken exchange snappy.
            .max_completion_tokens(150u32)
            .n(1);
        if stream {
            builder.stream(true);
        }
        builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn clean_reply(&self, raw: &str) -> String {
        self.speaker_prefix.replace(raw.trim(), "").to_string()
    }
}

//=========================================================================================
// `InterviewerService` Trait Implementation
//=========================================================================================

#[async_trait]
impl InterviewerService for OpenAiInterviewerAdapter {
    /// Produces the interviewer's next turn from the candidate's message and
    /// the recent conversation history.
    async fn reply(
        &self,
        candidate_text: &str,
        history: &[Message],
        role: &str,
    ) -> PortResult<String> {
        let request = self.build_request(candidate_text, history, role, false)?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(self.clean_reply(&content))
            } else {
                Err(PortError::Unexpected(
                    "Interviewer LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Interviewer LLM returned no choices in its response.".to_string(),
            ))
        }
    }

    /// Streaming variant of [`InterviewerService::reply`]; yields the reply
    /// in fragments as the model produces them.
    async fn reply_streaming(
        &self,
        candidate_text: &str,
        history: &[Message],
        role: &str,
    ) -> PortResult<ReplyStream> {
        let request = self.build_request(candidate_text, history, role, true)?;

        let mut upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let stream = async_stream::stream! {
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(chunk) => {
                        if let Some(choice) = chunk.choices.into_iter().next() {
                            if let Some(fragment) = choice.delta.content {
                                if !fragment.is_empty() {
                                    yield Ok(fragment);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(PortError::Unexpected(e.to_string()));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
