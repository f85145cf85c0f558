//! # Topic Classification
//!
//! Decision-table topic selection for context assembly. This is
//! deliberately not semantic search: a fixed keyword list per topic,
//! lowercase substring containment, evaluated in a fixed order. The
//! [`Classifier`] trait is the seam that would let an embedding-based
//! matcher replace the keyword table without touching the relay's control
//! flow.

/// A content bucket the assembled context can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Projects,
    Skills,
    Experience,
    Blog,
    Contact,
    Education,
}

impl Topic {
    /// Fixed evaluation order; also the order blocks appear in the context.
    pub const ALL: [Topic; 6] = [
        Topic::Projects,
        Topic::Skills,
        Topic::Experience,
        Topic::Blog,
        Topic::Contact,
        Topic::Education,
    ];

    /// The label heading the topic's context block.
    pub fn label(&self) -> &'static str {
        match self {
            Topic::Projects => "PROJECTS",
            Topic::Skills => "SKILLS",
            Topic::Experience => "EXPERIENCE",
            Topic::Blog => "BLOG",
            Topic::Contact => "CONTACT",
            Topic::Education => "EDUCATION",
        }
    }

    /// Keywords whose presence (substring, lowercased) selects this topic.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Projects => &[
                "project", "built", "build", "portfolio", "app", "application", "made",
                "created", "github", "demo",
            ],
            Topic::Skills => &[
                "skill", "technolog", "stack", "language", "framework", "tool", "proficien",
                "know how", "good at",
            ],
            Topic::Experience => &[
                "experience", "job", "career", "company", "companies", "role", "position",
                "intern", "worked",
            ],
            Topic::Blog => &["blog", "article", "post", "write", "written", "tutorial"],
            Topic::Contact => &[
                "contact", "email", "reach", "hire", "hiring", "linkedin", "connect",
                "get in touch",
            ],
            Topic::Education => &[
                "education", "degree", "study", "studied", "studies", "college",
                "university", "school", "certificat",
            ],
        }
    }
}

/// Classify one message into the topics whose content should ground it.
pub trait Classifier: Send + Sync {
    /// Returns matched topics in [`Topic::ALL`] order; empty when nothing
    /// matched (the caller falls back to a general overview).
    fn classify(&self, message: &str) -> Vec<Topic>;
}

/// Substring-containment classifier over the static keyword table.
#[derive(Debug, Default, Clone)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, message: &str) -> Vec<Topic> {
        let lowered = message.to_lowercase();
        Topic::ALL
            .into_iter()
            .filter(|topic| topic.keywords().iter().any(|kw| lowered.contains(kw)))
            .collect()
    }
}
