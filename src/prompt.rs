//! System prompt template
//!
//! The system turn carries the assistant rules followed by the retrieved
//! reference material, fenced by start/end markers so the model can tell
//! the two apart.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REF_START: &str = "<<REF>>";
pub const DEFAULT_REF_END: &str = "<<END>>";
pub const DEFAULT_NO_RESULT_TEXT: &str = "（本轮无检索结果）";

/// Static prompt configuration
///
/// Unset marker fields fall back to the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplate {
    /// Behavioural rules placed ahead of the reference block
    pub rules: Option<String>,
    /// Marker opening the reference block
    pub ref_start: Option<String>,
    /// Marker closing the reference block
    pub ref_end: Option<String>,
    /// Placeholder used when retrieval returned nothing
    pub no_result_text: Option<String>,
}

impl PromptTemplate {
    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    pub fn ref_start(&self) -> &str {
        self.ref_start.as_deref().unwrap_or(DEFAULT_REF_START)
    }

    pub fn ref_end(&self) -> &str {
        self.ref_end.as_deref().unwrap_or(DEFAULT_REF_END)
    }

    pub fn no_result_text(&self) -> &str {
        self.no_result_text
            .as_deref()
            .unwrap_or(DEFAULT_NO_RESULT_TEXT)
    }

    /// Render the system turn content for one call
    pub fn render(&self, context: Option<&str>) -> String {
        let mut content = String::new();

        if let Some(rules) = &self.rules {
            content.push_str(rules);
            content.push_str("\n\n");
        }

        content.push_str(self.ref_start());
        content.push('\n');

        match context.filter(|c| !c.is_empty()) {
            Some(context) => content.push_str(context),
            None => {
                content.push_str(self.no_result_text());
                content.push('\n');
            }
        }

        content.push_str(self.ref_end());
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_rules_and_context() {
        let template = PromptTemplate::default().with_rules("Answer in Chinese.");
        let rendered = template.render(Some("[1] doc.pdf: some text\n"));
        assert_eq!(
            rendered,
            "Answer in Chinese.\n\n<<REF>>\n[1] doc.pdf: some text\n<<END>>"
        );
    }

    #[test]
    fn test_render_without_context_uses_placeholder() {
        let rendered = PromptTemplate::default().render(None);
        assert_eq!(rendered, "<<REF>>\n（本轮无检索结果）\n<<END>>");

        // empty context is treated like absent context
        assert_eq!(PromptTemplate::default().render(Some("")), rendered);
    }

    #[test]
    fn test_render_custom_markers() {
        let template = PromptTemplate {
            rules: None,
            ref_start: Some("[[".to_string()),
            ref_end: Some("]]".to_string()),
            no_result_text: Some("none".to_string()),
        };
        assert_eq!(template.render(None), "[[\nnone\n]]");
        assert_eq!(template.render(Some("ctx")), "[[\nctx]]");
    }
}
