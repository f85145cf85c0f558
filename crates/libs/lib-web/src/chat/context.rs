//! # Context Assembly
//!
//! Builds the bounded plain-text context spliced into the system prompt.
//!
//! For each topic the classifier matched, a fixed-size slice of the
//! corresponding content table is rendered as a labeled block. When no
//! topic matches, a general-overview block (static biography plus top
//! skills) stands in. Blocks are concatenated in fixed topic order and the
//! result is hard-truncated to the character budget, so re-assembling over
//! the same rows always yields byte-identical text.

use super::classifier::{Classifier, Topic};
use lib_core::model::store::{
    BlogPostRepository, ExperienceRepository, ProjectRepository, SkillRepository,
};
use lib_core::{DbPool, Result};
use lib_utils::truncate_chars;

/// Static biography used by the general-overview fallback.
const PROFILE_OVERVIEW: &str = "I am a full-stack developer who builds and ships web \
applications end to end, from database schema to deployed frontend. This site is my \
personal portfolio; ask about my projects, skills, work experience, blog posts, \
education, or how to get in touch.";

/// Static contact block (no contact table; this text is authored once).
const CONTACT_BLOCK: &str = "CONTACT:\n- Email: hello@example.dev\n- LinkedIn: \
linkedin.com/in/example-dev\n- GitHub: github.com/example-dev\n- Open to freelance and \
full-time opportunities.";

/// Static education block.
const EDUCATION_BLOCK: &str = "EDUCATION:\n- B.Sc. Computer Science\n- Self-directed \
coursework in distributed systems and machine learning\n- Certifications listed under \
achievements on the site.";

/// Separator between labeled blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// An assembled, budget-bounded context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// The final text, at most `char_budget` characters.
    pub text: String,
    /// Topics that contributed blocks (empty means the overview fallback).
    pub topics: Vec<Topic>,
}

impl AssembledContext {
    /// Character count of the assembled text, as recorded in the log.
    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Assembles context blocks from the content tables.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    /// Hard character budget for the final text
    pub char_budget: usize,
    /// Rows fetched per matched bucket
    pub slice_size: i64,
}

impl ContextBuilder {
    pub fn new(char_budget: usize, slice_size: i64) -> Self {
        Self {
            char_budget,
            slice_size,
        }
    }

    /// Assemble the context for one message.
    ///
    /// Buckets are evaluated in fixed order and every match contributes;
    /// truncation happens only at the very end and may cut the last block.
    pub async fn assemble(
        &self,
        pool: &DbPool,
        classifier: &dyn Classifier,
        message: &str,
    ) -> Result<AssembledContext> {
        let topics = classifier.classify(message);

        let mut blocks: Vec<String> = Vec::new();
        for topic in &topics {
            blocks.push(self.render_topic(pool, *topic).await?);
        }

        if blocks.is_empty() {
            blocks.push(self.render_overview(pool).await?);
        }

        let text = truncate_chars(&blocks.join(BLOCK_SEPARATOR), self.char_budget);

        tracing::debug!(
            topics = ?topics,
            context_chars = text.chars().count(),
            "Assembled chat context"
        );

        Ok(AssembledContext { text, topics })
    }

    async fn render_topic(&self, pool: &DbPool, topic: Topic) -> Result<String> {
        let block = match topic {
            Topic::Projects => {
                let projects = ProjectRepository::list_recent(pool, self.slice_size).await?;
                let mut lines = vec![format!("{}:", topic.label())];
                for p in projects {
                    match &p.link {
                        Some(link) => lines.push(format!(
                            "- {}: {} (tech: {}) [{}]",
                            p.title, p.description, p.tech_stack, link
                        )),
                        None => lines.push(format!(
                            "- {}: {} (tech: {})",
                            p.title, p.description, p.tech_stack
                        )),
                    }
                }
                lines.join("\n")
            }
            Topic::Skills => {
                let skills = SkillRepository::list_top(pool, self.slice_size).await?;
                let mut lines = vec![format!("{}:", topic.label())];
                for s in skills {
                    lines.push(format!("- {} ({}, {}/100)", s.name, s.category, s.proficiency));
                }
                lines.join("\n")
            }
            Topic::Experience => {
                let entries = ExperienceRepository::list_recent(pool, self.slice_size).await?;
                let mut lines = vec![format!("{}:", topic.label())];
                for e in entries {
                    let end = e.end_date.as_deref().unwrap_or("present");
                    lines.push(format!(
                        "- {} at {} ({} to {}): {}",
                        e.role, e.company, e.start_date, end, e.summary
                    ));
                }
                lines.join("\n")
            }
            Topic::Blog => {
                let posts = BlogPostRepository::list_recent(pool, self.slice_size).await?;
                let mut lines = vec![format!("{}:", topic.label())];
                for p in posts {
                    lines.push(format!("- {}: {}", p.title, p.summary));
                }
                lines.join("\n")
            }
            Topic::Contact => CONTACT_BLOCK.to_string(),
            Topic::Education => EDUCATION_BLOCK.to_string(),
        };
        Ok(block)
    }

    /// General-overview fallback: biography plus top skills.
    async fn render_overview(&self, pool: &DbPool) -> Result<String> {
        let skills = SkillRepository::list_top(pool, self.slice_size).await?;
        let names: Vec<String> = skills.into_iter().map(|s| s.name).collect();

        if names.is_empty() {
            Ok(format!("OVERVIEW:\n{}", PROFILE_OVERVIEW))
        } else {
            Ok(format!(
                "OVERVIEW:\n{}\nTop skills: {}.",
                PROFILE_OVERVIEW,
                names.join(", ")
            ))
        }
    }
}

/// Render the full system prompt around an assembled context.
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are the assistant on a developer's portfolio website. Answer visitor \
questions about the developer using only the information below. Be concise and \
friendly; if the information below does not cover a question, say so rather than \
guessing.\n\n{}",
        context
    )
}
