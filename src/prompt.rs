// Prompt templates for the study features

use std::fmt;
use std::str::FromStr;

/// The study features offered in the feature selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    AskQuestion,
    Mathematics,
    ParagraphWriter,
    GrammarHelp,
    MakeNotes,
    ExplainConcept,
    CreateQuiz,
    StudyRoutine,
    FixWriting,
    TranslateSimplify,
    Summarize,
}

impl Feature {
    pub const ALL: [Self; 11] = [
        Self::AskQuestion,
        Self::Mathematics,
        Self::ParagraphWriter,
        Self::GrammarHelp,
        Self::MakeNotes,
        Self::ExplainConcept,
        Self::CreateQuiz,
        Self::StudyRoutine,
        Self::FixWriting,
        Self::TranslateSimplify,
        Self::Summarize,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Self::AskQuestion => "ask-question",
            Self::Mathematics => "mathematics",
            Self::ParagraphWriter => "paragraph-writer",
            Self::GrammarHelp => "grammar-help",
            Self::MakeNotes => "make-notes",
            Self::ExplainConcept => "explain-concept",
            Self::CreateQuiz => "create-quiz",
            Self::StudyRoutine => "study-routine",
            Self::FixWriting => "fix-writing",
            Self::TranslateSimplify => "translate-simplify",
            Self::Summarize => "summarize",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AskQuestion => "Ask a Question",
            Self::Mathematics => "Mathematics",
            Self::ParagraphWriter => "Paragraph Writer",
            Self::GrammarHelp => "Grammar Help",
            Self::MakeNotes => "Make Notes",
            Self::ExplainConcept => "Explain a Concept",
            Self::CreateQuiz => "Create a Quiz",
            Self::StudyRoutine => "Study Routine",
            Self::FixWriting => "Fix My Writing",
            Self::TranslateSimplify => "Simplify Text",
            Self::Summarize => "Summarize",
        }
    }

    /// Expand this feature's template around the user's text.
    pub fn expand(self, text: &str) -> String {
        match self {
            Self::AskQuestion => format!(
                "Answer the following question. If an image is provided, use it as context for your answer. Question: {text}"
            ),
            Self::Mathematics => format!(
                "You are a math expert. Solve the following math problem. If an image is provided, solve the problem shown in the image. Explain the steps clearly. Problem: {text}"
            ),
            Self::ParagraphWriter => format!(
                "Write a well-structured and detailed paragraph on the following topic. If an image is provided, describe the image or use it as inspiration for the paragraph. Topic: {text}"
            ),
            Self::GrammarHelp => format!(
                "You are an English grammar teacher. Analyze and correct the following text, explaining the grammatical mistakes and suggesting improvements: \"{text}\""
            ),
            Self::MakeNotes => {
                format!("Generate detailed, well-structured study notes on the topic: {text}")
            }
            Self::ExplainConcept => format!(
                "Explain the following concept in a simple and easy-to-understand way: {text}"
            ),
            Self::CreateQuiz => format!(
                "Create a short quiz with 5 multiple-choice questions and answers on the topic of: {text}"
            ),
            Self::StudyRoutine => {
                format!("Create a personalized one-week study routine for these subjects: {text}")
            }
            Self::FixWriting => format!(
                "Correct the grammar and improve the writing of the following text: \"{text}\""
            ),
            Self::TranslateSimplify => {
                format!("Simplify the following text for a 10th-grade student: \"{text}\"")
            }
            Self::Summarize => {
                format!("Summarize the following text in about 100 words: \"{text}\"")
            }
        }
    }

    /// The feature after this one, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeature(pub String);

impl fmt::Display for UnknownFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown feature: {}", self.0)
    }
}

impl std::error::Error for UnknownFeature {}

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.id() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// Directive appended to every prompt.
pub fn language_directive(language: &str) -> String {
    format!("\n\nPlease provide the response in {language}. Use proper Markdown formatting.")
}

/// Build the final prompt for a feature id. Unknown ids pass the text through unchanged.
pub fn build_prompt(feature_id: &str, text: &str, language: &str) -> String {
    let mut prompt = feature_id
        .parse::<Feature>()
        .map_or_else(|_| text.to_string(), |feature| feature.expand(text));
    prompt.push_str(&language_directive(language));
    prompt
}
