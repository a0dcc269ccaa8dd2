//! # Prompt Composition
//!
//! The booth offers two ways to describe a background:
//!
//! - **Guide me**: three short fields (where, what, style) filled by typing or
//!   by toggling preset buttons, composed into one prompt.
//! - **Free form**: the guest writes the whole prompt.
//!
//! Before generation the prompt may be expanded with detailed phrasings and
//! rewritten by a chat model using [`ENHANCE_SYSTEM_PROMPT`] and
//! [`enhancement_user_message`].

use std::collections::BTreeSet;

use crate::error::{BoothError, BoothResult};

/// Subject ("what") preset buttons.
pub const PRESET_SUBJECTS: [&str; 10] = [
    "Kangaroo",
    "Tulip field",
    "Dutch windmill",
    "Milky Way",
    "German Shepherd",
    "Golden Gate Bridge",
    "Koala",
    "Roses",
    "Jasmyn flowers",
    "Hindu temple",
];

/// Place ("where") preset buttons.
pub const PRESET_PLACES: [&str; 7] = [
    "Australian outback",
    "Amsterdam houses",
    "Sydney Opera House",
    "Flinders Street Station",
    "Cambridge",
    "Indian wedding",
    "Northern Lights",
];

/// Style preset buttons.
pub const PRESET_STYLES: [&str; 6] = [
    "Oil painting",
    "Impressionist",
    "Photorealistic",
    "Van Gogh",
    "Pastel",
    "Photobooth background",
];

/// Button labels replaced by a more detailed phrasing before enhancement.
pub const DETAILED_PHRASINGS: [(&str, &str); 2] = [
    (
        "Photorealistic",
        "Photorealistic 4k image shot on Canon EOS 1000D",
    ),
    ("Cambridge", "Cambridge (UK)"),
];

/// Style used when the guest picked none.
pub const DEFAULT_STYLE: &str = "A 4k picture";

pub const ENHANCE_SYSTEM_PROMPT: &str = "You are a helpful assistant that is particularly good at describing images vividly and concisely.
You only output 1 description each time, and NOTHING else. For example, you do NOT say \"here is a description\".
You always make sure to include the mentioned style in your response in the first line. If a camera model is mentioned in the keywords, you include it in your response.
";

pub const ENHANCE_USER_PROMPT: &str = "
Imagine you're trying to explain an image to someone who can't see it.
You must stay under 400 characters, and because of how little space you have, you don't need to write in full sentences.
Use descriptive wording like \"the bridge is colored a bold red with broad brush strokes\", rather than subjective descriptions.
Make sure to include the style in the first line of your description.

I will give you just some key words about the images subject, and about the style of the image.
You need to then take those and paint a picture with your description.

Keywords:
";

/// User message sent to the chat model for `prompt`.
pub fn enhancement_user_message(prompt: &str) -> String {
    format!("{}{}", ENHANCE_USER_PROMPT, prompt)
}

/// Replace every preset label that has a detailed phrasing.
///
/// ```rust
/// use photobooth::prompt::expand_details;
///
/// assert_eq!(
///     expand_details("Koala, Cambridge, style: Pastel"),
///     "Koala, Cambridge (UK), style: Pastel"
/// );
/// ```
pub fn expand_details(prompt: &str) -> String {
    DETAILED_PHRASINGS
        .iter()
        .fold(prompt.to_string(), |acc, (label, detailed)| {
            acc.replace(label, detailed)
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    GuideMe,
    FreeForm,
}

/// Editable field of a [`PromptForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PromptField {
    /// "where"
    Place,
    /// "what"
    Subject,
    Style,
    /// The free-form prompt itself
    FreeText,
}

impl PromptField {
    /// Preset buttons offered for this field.
    pub fn presets(&self) -> &'static [&'static str] {
        match self {
            PromptField::Place => &PRESET_PLACES,
            PromptField::Subject => &PRESET_SUBJECTS,
            PromptField::Style => &PRESET_STYLES,
            PromptField::FreeText => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromptField::Place => "where",
            PromptField::Subject => "what",
            PromptField::Style => "style",
            PromptField::FreeText => "prompt",
        }
    }
}

/// Whether the guided fields can be composed into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStatus {
    /// Nothing entered yet
    Empty,
    /// Only a style was given
    MissingSubject,
    Ready,
}

impl PromptStatus {
    /// Message shown to the guest, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            PromptStatus::MissingSubject => Some("Specify at least the where or the what"),
            PromptStatus::Empty | PromptStatus::Ready => None,
        }
    }
}

/// State of the prompt form.
///
/// In guided mode `prompt` always holds the composition of the three
/// fields. Typing a free-form prompt clears the guided fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptForm {
    pub mode: PromptMode,
    pub place: String,
    pub subject: String,
    pub style: String,
    pub prompt: String,
    active_presets: BTreeSet<(PromptField, String)>,
}

impl PromptForm {
    pub fn new(mode: PromptMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Free-form form holding `prompt`.
    pub fn free_form(prompt: impl Into<String>) -> Self {
        let mut form = Self::new(PromptMode::FreeForm);
        form.set(PromptField::FreeText, prompt);
        form
    }

    /// Guided form with the three fields set.
    pub fn guided(
        place: impl Into<String>,
        subject: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        let mut form = Self::new(PromptMode::GuideMe);
        form.place = place.into();
        form.subject = subject.into();
        form.style = style.into();
        form.prompt = form.compose();
        form
    }

    pub fn get(&self, field: PromptField) -> &str {
        match field {
            PromptField::Place => &self.place,
            PromptField::Subject => &self.subject,
            PromptField::Style => &self.style,
            PromptField::FreeText => &self.prompt,
        }
    }

    pub fn set(&mut self, field: PromptField, value: impl Into<String>) {
        let value = value.into();
        match field {
            PromptField::FreeText => {
                self.prompt = value;
                self.place.clear();
                self.subject.clear();
                self.style.clear();
            }
            PromptField::Place => self.place = value,
            PromptField::Subject => self.subject = value,
            PromptField::Style => self.style = value,
        }
        if field != PromptField::FreeText {
            self.prompt = self.compose();
        }
    }

    pub fn status(&self) -> PromptStatus {
        if self.place.is_empty() && self.subject.is_empty() && self.style.is_empty() {
            PromptStatus::Empty
        } else if self.place.is_empty() && self.subject.is_empty() {
            PromptStatus::MissingSubject
        } else {
            PromptStatus::Ready
        }
    }

    /// Compose the guided fields; empty unless [`PromptStatus::Ready`].
    pub fn compose(&self) -> String {
        if self.status() != PromptStatus::Ready {
            return String::new();
        }
        let style = if self.style.is_empty() {
            DEFAULT_STYLE
        } else {
            &self.style
        };
        if self.place.is_empty() {
            format!("{}, style: {}", self.subject, style)
        } else if self.subject.is_empty() {
            format!("{}, style: {}", self.place, style)
        } else {
            format!("{}, {}, style: {}", self.subject, self.place, style)
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            PromptMode::GuideMe => PromptMode::FreeForm,
            PromptMode::FreeForm => PromptMode::GuideMe,
        };
    }

    /// Reset every field and preset button, keeping the mode.
    pub fn clear(&mut self) {
        *self = Self::new(self.mode);
    }

    pub fn is_preset_active(&self, field: PromptField, preset: &str) -> bool {
        self.active_presets.contains(&(field, preset.to_string()))
    }

    /// Press a preset button.
    ///
    /// An inactive preset is prepended to the field as `"{preset}, "`; an
    /// active one is cut out of the field again. Stray separators left by
    /// either edit are removed.
    pub fn toggle_preset(&mut self, field: PromptField, preset: &str) {
        let key = (field, preset.to_string());
        let current = self.get(field).to_string();
        let mut value = if self.active_presets.remove(&key) {
            current.replacen(preset, "", 1).replacen(", ,", ",", 1)
        } else {
            self.active_presets.insert(key);
            format!("{}, {}", preset, current)
        };
        if let Some(stripped) = value.strip_suffix(", ") {
            value = stripped.to_string();
        }
        if let Some(stripped) = value.strip_prefix(", ") {
            value = stripped.to_string();
        }
        self.set(field, value);
    }

    /// The prompt to generate from.
    ///
    /// Guided forms must be [`PromptStatus::Ready`]; free-form prompts must
    /// not be blank.
    pub fn final_prompt(&self) -> BoothResult<String> {
        match self.mode {
            PromptMode::GuideMe => {
                let status = self.status();
                if status != PromptStatus::Ready {
                    return Err(BoothError::validation(
                        "prompt",
                        status
                            .message()
                            .unwrap_or("enter a where, a what or a style"),
                        "",
                    ));
                }
                Ok(self.compose())
            }
            PromptMode::FreeForm => {
                let prompt = self.prompt.trim();
                if prompt.is_empty() {
                    return Err(BoothError::validation("prompt", "must not be empty", ""));
                }
                Ok(prompt.to_string())
            }
        }
    }
}
