//! Story prompt template with `{city}` substitution.
//!
//! The template is user-configurable (settings panel in the presentation
//! layer); the pipeline renders it once per run, just before the
//! text-generation call.

/// Placeholder replaced by the city name at render time.
pub const CITY_PLACEHOLDER: &str = "{city}";

/// Default narration prompt, tuned for a 2-3 minute spoken story.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Write a fascinating historical story about the city \
of {city}. Include interesting facts, notable events, and cultural significance. Keep it \
engaging and informative, suitable for a 2-3 minute audio narration.";

/// A story prompt with a single `{city}` substitution token.
///
/// # Example
/// ```rust
/// use city_stories::narrate::PromptTemplate;
///
/// let template = PromptTemplate::new("Tell me about {city}");
/// assert_eq!(template.render("Paris"), "Tell me about Paris");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template string, placeholder intact.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute every occurrence of `{city}` with the given name.
    ///
    /// A template without the placeholder renders unchanged — the user wrote
    /// a fixed prompt on purpose.
    pub fn render(&self, city: &str) -> String {
        self.template.replace(CITY_PLACEHOLDER, city)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
