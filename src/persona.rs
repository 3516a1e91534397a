//! "Stocky Bhai" persona Q&A.
//!
//! The persona answers Indian stock market questions in a fixed voice and must
//! reply with strict JSON `{"answer": .., "youtube_links": [..]}`. Each
//! [`PersonaSession`] carries the conversation so far; the model sees every
//! earlier turn of the same session.

use crate::api::{AskAsync, ChatMessage};
use crate::error::ModelError;
use crate::models::PersonaAnswer;
use crate::utils::{strip_code_fences, truncate_for_log};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Conversation history of one user session.
///
/// Owned by the caller and passed by `&mut` to [`ask_persona`]. History is
/// never evicted.
#[derive(Debug, Clone, Default)]
pub struct PersonaSession {
    history: Vec<ChatMessage>,
}

impl PersonaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Number of completed question/reply exchanges.
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }

    fn record(&mut self, prompt: String, reply: String) {
        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(reply));
    }
}

#[derive(Deserialize)]
struct PersonaReply {
    answer: String,
    #[serde(default)]
    youtube_links: Option<Vec<String>>,
}

pub fn persona_prompt(question: &str) -> String {
    format!(
        "You are Stocky Bhai — You are a roleplay version of KGF's Rocky Bhai. You are like his cousin brother with the same personality. \
         You speak with the weight of experience. Every word matters. No soft talk, no sugarcoating. \
         You only focus on the Indian stock market: NSE, BSE, SEBI rules, IPOs, Indian mutual funds, and real-world investing.\n\n\
         When answering:\n\
         - Speak like a man who's already won — confident, blunt, and fearless.\n\
         - Slightly detailed if needed, but punchy — each sentence should hit like a hammer.\n\
         - If a video is **highly relevant and Indian**, include the YouTube link(s) in `youtube_links`.\n\
         - Never include foreign or generic content.\n\n\
         Your response must be in **strict JSON**, like this:\n\
         {{\n  \"answer\": \"<your punchy response>\",\n  \"youtube_links\": [\"<link1>\", \"<link2>\"]\n}}\n\n\
         User question: \"{question}\"\n\n\
         Output ONLY the JSON. No markdown. No titles. No quotes. No prefix."
    )
}

/// Decode a persona reply. Links must be absolute http(s) URLs.
pub fn parse_persona_reply(reply: &str) -> Result<PersonaAnswer, ModelError> {
    let parsed: PersonaReply =
        serde_json::from_str(strip_code_fences(reply)).map_err(ModelError::from_decode)?;

    let youtube_links = parsed.youtube_links.unwrap_or_default();
    for link in &youtube_links {
        let ok = Url::parse(link)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !ok {
            return Err(ModelError::InvalidLink(link.clone()));
        }
    }

    Ok(PersonaAnswer {
        answer: parsed.answer,
        youtube_links,
    })
}

/// Ask the persona a question within `session`.
///
/// A reply is always recorded in the session, even if it fails to parse. A
/// failed model call leaves the session untouched. Both failures yield
/// [`PersonaAnswer::fallback`].
#[instrument(level = "info", skip(model, session), fields(turns = session.turns()))]
pub async fn ask_persona<A: AskAsync>(
    model: &A,
    session: &mut PersonaSession,
    question: &str,
) -> PersonaAnswer {
    let prompt = persona_prompt(question);
    let mut messages = session.history().to_vec();
    messages.push(ChatMessage::user(prompt.clone()));

    let reply = match model.ask(&messages, None).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Persona model call failed");
            return PersonaAnswer::fallback();
        }
    };
    session.record(prompt, reply.clone());

    match parse_persona_reply(&reply) {
        Ok(answer) => {
            info!(links = answer.youtube_links.len(), "Persona answered");
            answer
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&reply, 300),
                "Persona reply was not valid JSON; using fallback"
            );
            PersonaAnswer::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ResponseFormat, Role};
    use std::sync::Mutex;

    /// Replays canned replies and records every conversation it was sent.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<String, ModelError>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AskAsync for ScriptedModel {
        async fn ask(
            &self,
            messages: &[ChatMessage],
            _format: Option<&ResponseFormat>,
        ) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies.lock().unwrap().pop().unwrap_or(Err(ModelError::EmptyReply))
        }
    }

    #[test]
    fn test_parse_valid_reply() {
        let reply = r#"{"answer": "Buy quality, hold long.", "youtube_links": ["https://www.youtube.com/watch?v=abc123"]}"#;
        let answer = parse_persona_reply(reply).unwrap();
        assert_eq!(answer.answer, "Buy quality, hold long.");
        assert_eq!(answer.youtube_links, vec!["https://www.youtube.com/watch?v=abc123"]);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"answer\": \"SIP every month.\", \"youtube_links\": []}\n```";
        assert_eq!(parse_persona_reply(reply).unwrap().answer, "SIP every month.");
    }

    #[test]
    fn test_parse_missing_or_null_links() {
        assert!(parse_persona_reply(r#"{"answer": "a"}"#).unwrap().youtube_links.is_empty());
        assert!(
            parse_persona_reply(r#"{"answer": "a", "youtube_links": null}"#)
                .unwrap()
                .youtube_links
                .is_empty()
        );
    }

    #[test]
    fn test_parse_rejects_invalid_links() {
        let err = parse_persona_reply(r#"{"answer": "a", "youtube_links": ["not a url"]}"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidLink(_)));
        let err = parse_persona_reply(r#"{"answer": "a", "youtube_links": ["ftp://x.in/v"]}"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidLink(_)));
    }

    #[test]
    fn test_prompt_embeds_question() {
        let prompt = persona_prompt("What is investing?");
        assert!(prompt.contains("User question: \"What is investing?\""));
        assert!(prompt.contains("\"youtube_links\""));
    }

    #[tokio::test]
    async fn test_non_json_reply_yields_exact_fallback() {
        let model = ScriptedModel::new(vec![Ok("Listen, kid. Markets reward patience.".to_string())]);
        let mut session = PersonaSession::new();

        let answer = ask_persona(&model, &mut session, "Should I buy?").await;
        assert_eq!(
            answer,
            PersonaAnswer {
                answer: "Sorry, couldn't parse the response.".to_string(),
                youtube_links: vec![],
            }
        );
        // The unparseable reply is still part of the conversation.
        assert_eq!(session.turns(), 1);
    }

    #[tokio::test]
    async fn test_history_grows_and_is_sent() {
        let model = ScriptedModel::new(vec![
            Ok(r#"{"answer": "First answer", "youtube_links": []}"#.to_string()),
            Ok(r#"{"answer": "Second answer", "youtube_links": []}"#.to_string()),
        ]);
        let mut session = PersonaSession::new();

        let first = ask_persona(&model, &mut session, "What is an IPO?").await;
        let second = ask_persona(&model, &mut session, "And a mutual fund?").await;
        assert_eq!(first.answer, "First answer");
        assert_eq!(second.answer, "Second answer");
        assert_eq!(session.turns(), 2);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[1].len(), 3);
        assert_eq!(seen[1][0].role, Role::User);
        assert!(seen[1][0].content.contains("What is an IPO?"));
        assert_eq!(seen[1][1], ChatMessage::assistant(r#"{"answer": "First answer", "youtube_links": []}"#));
        assert!(seen[1][2].content.contains("And a mutual fund?"));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let model = ScriptedModel::new(vec![
            Ok(r#"{"answer": "one"}"#.to_string()),
            Ok(r#"{"answer": "two"}"#.to_string()),
        ]);
        let mut alice = PersonaSession::new();
        let mut bob = PersonaSession::new();

        ask_persona(&model, &mut alice, "q1").await;
        ask_persona(&model, &mut bob, "q2").await;

        assert_eq!(alice.turns(), 1);
        assert_eq!(bob.turns(), 1);
        assert_eq!(model.seen.lock().unwrap()[1].len(), 1);
    }

    #[tokio::test]
    async fn test_model_failure_leaves_history_untouched() {
        let model = ScriptedModel::new(vec![Err(ModelError::Timeout)]);
        let mut session = PersonaSession::new();

        let answer = ask_persona(&model, &mut session, "Hello?").await;
        assert_eq!(answer, PersonaAnswer::fallback());
        assert!(session.history().is_empty());
    }
}
