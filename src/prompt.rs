//! Builds the final instruction sent alongside the product image.

use crate::style::StyleParameters;

/// Heading of the style inspiration section.
pub const STYLE_INSPIRATION: &str = "**Style Inspiration:**";
/// Heading of the user refinements section.
pub const USER_REFINEMENTS: &str = "**User Refinements:**";

/// Resolved style text, after any describe/expand call has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleFragment {
    /// A description of the reference image, plus optional verbatim keywords.
    Described {
        /// Text returned by the style describer.
        description: String,
        /// Raw keywords, not expanded.
        refinements: Option<String>,
    },
    /// A description expanded from keywords.
    Expanded(String),
    /// No style input.
    None,
}

/// The final instruction text. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt(String);

impl ComposedPrompt {
    /// The prompt text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the prompt, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Section headings present after the base template, in order.
    pub fn sections(&self) -> Vec<&'static str> {
        let mut found: Vec<(usize, &'static str)> = [STYLE_INSPIRATION, USER_REFINEMENTS]
            .into_iter()
            .flat_map(|h| self.0.match_indices(h).map(move |(i, _)| (i, h)))
            .collect();
        found.sort_by_key(|(i, _)| *i);
        found.into_iter().map(|(_, h)| h).collect()
    }
}

impl std::fmt::Display for ComposedPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComposedPrompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Renders the base template for the given parameters.
pub fn base_prompt(params: &StyleParameters) -> String {
    format!(
        "Generate a professional, high-quality product photograph of the subject in the provided image. Adhere to the following constraints:\n\
         - Aspect Ratio: {}\n\
         - Lighting Style: {}\n\
         - Camera Perspective: {}",
        params.aspect_ratio, params.lighting, params.perspective,
    )
}

/// Composes the final prompt. At most one style branch is ever rendered.
pub fn compose(params: &StyleParameters, style: &StyleFragment) -> ComposedPrompt {
    let mut prompt = base_prompt(params);

    match style {
        StyleFragment::Described {
            description,
            refinements,
        } => {
            prompt.push_str(&format!(
                "\n\n{STYLE_INSPIRATION} Emulate the visual style of the reference image, which is described as: *{description}*."
            ));
            if let Some(refinements) = refinements {
                prompt.push_str(&format!(
                    "\n\n{USER_REFINEMENTS} Additionally, apply these specific instructions: *{}*.",
                    refinements.trim()
                ));
            }
        }
        StyleFragment::Expanded(description) => {
            prompt.push_str(&format!(
                "\n\n{STYLE_INSPIRATION} Emulate the following visual style: *{description}*."
            ));
        }
        StyleFragment::None => {}
    }

    ComposedPrompt(prompt)
}
