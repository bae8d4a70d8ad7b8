//! crates/interview_core/src/scoring.rs
//!
//! The interview grading core: a pure function from a conversation log to a
//! structured score report, plus the paragraph generator that fills the
//! report's summary field.

use crate::domain::{ConversationStats, Message, ScoreReport, Sender};

/// Messages containing a fenced code block count as shared code.
const CODE_FENCE: &str = "```";

/// Per-dimension feedback, in sub-score order: communication, technical
/// knowledge, problem solving, code quality, engagement.
const DIMENSION_FEEDBACK: [(&str, &str); 5] = [
    ("Excellent communication skills", "Work on clear articulation"),
    ("Strong technical foundation", "Strengthen technical concepts"),
    ("Great problem-solving approach", "Practice structured problem-solving"),
    ("High-quality code examples", "Include more code examples"),
    ("Highly engaged throughout", "Maintain consistent engagement"),
];

const FALLBACK_STRENGTH: &str = "Good interview participation";
const FALLBACK_IMPROVEMENT: &str = "Continue practicing for improvement";

/// Grades a conversation log into a [`ScoreReport`].
///
/// Returns `None` for an empty log; callers are expected to present that as
/// a "no data available" state. For a non-empty log every sub-score and the
/// overall score is an integer in `0..=10`, and the result depends only on
/// the messages themselves, so scoring the same log twice yields an
/// identical report.
pub fn score_conversation(log: &[Message]) -> Option<ScoreReport> {
    if log.is_empty() {
        return None;
    }

    let total_messages = log.len();
    let user_messages: Vec<&Message> =
        log.iter().filter(|m| m.sender == Sender::User).collect();
    let interviewer_messages: Vec<&Message> =
        log.iter().filter(|m| m.sender == Sender::Interviewer).collect();

    let average_user_length = average_length(&user_messages);
    let average_interviewer_length = average_length(&interviewer_messages);

    // Each dimension is scaled onto 0..=10 independently. Code quality is
    // a binary threshold (only 5 or 8 ever occur), kept as-is for report
    // compatibility with existing logs.
    let communication_skills = scale_to_ten(average_user_length / 120.0);
    let technical_knowledge = scale_to_ten(average_interviewer_length / 140.0);
    let problem_solving =
        scale_to_ten(user_messages.len() as f64 / total_messages.max(1) as f64);
    let code_quality: u8 = if log.iter().any(contains_code) { 8 } else { 5 };
    let engagement_level = scale_to_ten(total_messages as f64 / 20.0);

    let overall = (f64::from(communication_skills) * 0.25
        + f64::from(technical_knowledge) * 0.25
        + f64::from(problem_solving) * 0.20
        + f64::from(code_quality) * 0.20
        + f64::from(engagement_level) * 0.10)
        .round() as u8;

    let sub_scores = [
        communication_skills,
        technical_knowledge,
        problem_solving,
        code_quality,
        engagement_level,
    ];

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    for (score, (praise, suggestion)) in sub_scores.iter().zip(DIMENSION_FEEDBACK) {
        if *score >= 8 {
            strengths.push(praise.to_string());
        }
        if *score < 6 {
            improvements.push(suggestion.to_string());
        }
    }
    if strengths.is_empty() {
        strengths.push(FALLBACK_STRENGTH.to_string());
    }
    if improvements.is_empty() {
        improvements.push(FALLBACK_IMPROVEMENT.to_string());
    }

    Some(ScoreReport {
        communication_skills,
        technical_knowledge,
        problem_solving,
        code_quality,
        engagement_level,
        overall,
        strengths,
        improvements,
        summary: summarize(overall, total_messages),
        conversation_stats: ConversationStats {
            total_messages,
            user_messages: user_messages.len(),
            ai_messages: interviewer_messages.len(),
            average_user_response_length: average_user_length.round() as u32,
            average_ai_response_length: average_interviewer_length.round() as u32,
        },
    })
}

/// Selects the summary paragraph for an overall score.
///
/// The message count is part of the signature but does not influence the
/// selected paragraph; only the overall score does.
pub fn summarize(overall: u8, _total_messages: usize) -> String {
    let text = match overall {
        9.. => {
            "Outstanding performance! You demonstrated exceptional skills across all areas. \
             Your communication was clear, technical knowledge was solid, and problem-solving \
             approach was excellent. You're well-prepared for technical interviews."
        }
        7..=8 => {
            "Strong performance with room for growth. You showed good technical understanding \
             and communication skills. Focus on the areas for improvement to reach the next level."
        }
        5..=6 => {
            "Good foundation with significant improvement opportunities. You have the basic \
             skills needed but should focus on strengthening technical knowledge and \
             communication clarity."
        }
        _ => {
            "This interview revealed areas that need attention. Focus on building technical \
             fundamentals and improving communication skills. Regular practice will help you \
             improve significantly."
        }
    };
    text.to_string()
}

/// Mean text length of a message partition. The divisor floor of 1 keeps
/// the division total on an empty partition.
fn average_length(messages: &[&Message]) -> f64 {
    let total_chars: usize = messages.iter().map(|m| m.text.chars().count()).sum();
    total_chars as f64 / messages.len().max(1) as f64
}

/// Maps a ratio onto the 0..=10 integer scale, capping at 10.
fn scale_to_ten(ratio: f64) -> u8 {
    (ratio * 10.0).round().min(10.0) as u8
}

fn contains_code(message: &Message) -> bool {
    message.is_code == Some(true) || message.text.contains(CODE_FENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, Sender};

    fn msg(sender: Sender, text: &str) -> Message {
        Message::new(sender, text, "10:00")
    }

    #[test]
    fn empty_log_produces_no_report() {
        assert!(score_conversation(&[]).is_none());
    }

    #[test]
    fn balanced_two_message_log_scores_seven_overall() {
        let log = vec![
            msg(Sender::User, &"a".repeat(120)),
            msg(Sender::Interviewer, &"b".repeat(140)),
        ];

        let report = score_conversation(&log).unwrap();

        assert_eq!(report.communication_skills, 10);
        assert_eq!(report.technical_knowledge, 10);
        assert_eq!(report.problem_solving, 5);
        assert_eq!(report.code_quality, 5);
        assert_eq!(report.engagement_level, 1);
        // 0.25*10 + 0.25*10 + 0.20*5 + 0.20*5 + 0.10*1 = 7.1
        assert_eq!(report.overall, 7);
    }

    #[test]
    fn code_flag_raises_code_quality_regardless_of_content() {
        let mut flagged = msg(Sender::User, "here is my solution");
        flagged.is_code = Some(true);
        let report = score_conversation(&[flagged]).unwrap();
        assert_eq!(report.code_quality, 8);
    }

    #[test]
    fn code_fence_in_text_raises_code_quality() {
        let log = vec![
            msg(Sender::User, "```rust\nfn main() {}\n```"),
            msg(Sender::Interviewer, "Looks reasonable."),
        ];
        let report = score_conversation(&log).unwrap();
        assert_eq!(report.code_quality, 8);
    }

    #[test]
    fn code_quality_is_binary() {
        let without = score_conversation(&[msg(Sender::User, "plain prose")]).unwrap();
        let with = score_conversation(&[msg(Sender::User, "see ```x```")]).unwrap();
        assert_eq!(without.code_quality, 5);
        assert_eq!(with.code_quality, 8);
    }

    #[test]
    fn all_scores_stay_within_bounds_on_a_large_log() {
        let mut log = Vec::new();
        for i in 0..40 {
            log.push(msg(Sender::User, &"long answer text ".repeat(i + 1)));
            log.push(msg(Sender::Interviewer, &"question ".repeat(i + 1)));
        }
        log.push(msg(Sender::System, "Connected to interview service"));

        let report = score_conversation(&log).unwrap();
        for score in [
            report.communication_skills,
            report.technical_knowledge,
            report.problem_solving,
            report.code_quality,
            report.engagement_level,
            report.overall,
        ] {
            assert!(score <= 10, "score {score} out of range");
        }
    }

    #[test]
    fn system_messages_count_toward_total_but_neither_partition() {
        let log = vec![
            msg(Sender::User, "hello"),
            msg(Sender::System, "Connected to interview service"),
            msg(Sender::Interviewer, "welcome"),
        ];

        let stats = score_conversation(&log).unwrap().conversation_stats;

        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.user_messages, 1);
        assert_eq!(stats.ai_messages, 1);
    }

    #[test]
    fn empty_text_counts_as_length_zero() {
        let log = vec![msg(Sender::User, ""), msg(Sender::Interviewer, "")];
        let report = score_conversation(&log).unwrap();
        assert_eq!(report.communication_skills, 0);
        assert_eq!(report.technical_knowledge, 0);
        assert_eq!(report.conversation_stats.average_user_response_length, 0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let log = vec![
            msg(Sender::User, "I would start by clarifying requirements."),
            msg(Sender::Interviewer, "Good. What would you ask first?"),
            msg(Sender::User, "Expected load and latency targets."),
        ];
        assert_eq!(score_conversation(&log), score_conversation(&log));
    }

    #[test]
    fn adding_code_never_lowers_the_overall_score() {
        let plain = vec![
            msg(Sender::User, "some moderately sized answer about systems"),
            msg(Sender::Interviewer, "a follow-up question"),
        ];
        let mut with_code = plain.clone();
        with_code[0].is_code = Some(true);

        let before = score_conversation(&plain).unwrap().overall;
        let after = score_conversation(&with_code).unwrap().overall;
        assert!(after >= before);
    }

    #[test]
    fn high_scores_collect_strengths_for_each_dimension() {
        // 20 messages, candidate-heavy, all of them long: every dimension
        // lands at 7 or above, so no improvement fires and the fallback
        // suggestion takes its place.
        let mut log = Vec::new();
        for _ in 0..13 {
            log.push(msg(Sender::User, &"a".repeat(200)));
        }
        for _ in 0..7 {
            let mut reply = msg(Sender::Interviewer, &"b".repeat(200));
            reply.is_code = Some(true);
            log.push(reply);
        }

        let report = score_conversation(&log).unwrap();

        assert!(report
            .strengths
            .contains(&"Excellent communication skills".to_string()));
        assert!(report
            .strengths
            .contains(&"High-quality code examples".to_string()));
        assert_eq!(
            report.improvements,
            vec!["Continue practicing for improvement".to_string()]
        );
    }

    #[test]
    fn weak_interview_falls_back_to_the_generic_strength() {
        let log = vec![msg(Sender::User, "hi"), msg(Sender::Interviewer, "hello")];
        let report = score_conversation(&log).unwrap();
        assert_eq!(
            report.strengths,
            vec!["Good interview participation".to_string()]
        );
        assert!(!report.improvements.is_empty());
    }

    #[test]
    fn summary_paragraph_follows_the_overall_thresholds() {
        assert!(summarize(10, 0).starts_with("Outstanding performance!"));
        assert!(summarize(9, 0).starts_with("Outstanding performance!"));
        assert!(summarize(7, 12).starts_with("Strong performance"));
        assert!(summarize(6, 3).starts_with("Good foundation"));
        assert!(summarize(5, 3).starts_with("Good foundation"));
        assert!(summarize(4, 99).starts_with("This interview revealed"));
    }

    #[test]
    fn report_summary_matches_the_standalone_generator() {
        let log = vec![
            msg(Sender::User, &"a".repeat(120)),
            msg(Sender::Interviewer, &"b".repeat(140)),
        ];
        let report = score_conversation(&log).unwrap();
        assert_eq!(report.summary, summarize(report.overall, log.len()));
    }
}
