//! Validation rules for form fields.
//!
//! A [`Rule`] bundles the checks configured for one validation unit:
//! `required`, `pattern`, `min_length`/`max_length`/`length`, `min`/`max`,
//! `format` and a caller-supplied `validator`. A field carries an ordered
//! list of rules; [`engine::validate_rules`] evaluates them concurrently and
//! collects every failure rather than stopping at the first one.
//!
//! # Example
//!
//! ```rust
//! use formfield::rules::{Format, Rule};
//!
//! let rules = vec![
//!     Rule::new().required().message("Alias name is required"),
//!     Rule::new().pattern(r"^[a-z0-9_-]+$").unwrap(),
//!     Rule::new().format(Format::Email),
//! ];
//! assert_eq!(rules.len(), 3);
//! ```

pub mod builtin;
pub mod custom;
pub mod engine;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

pub use custom::{CustomValidator, Validity};
pub use engine::{validate_rule, validate_rules};

/// The UI event on which a rule is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trigger {
    /// Re-run whenever the value changes.
    #[default]
    Change,
    /// Re-run when the control loses focus.
    Blur,
    /// Run only on explicit whole-form validation.
    Submit,
}

impl Trigger {
    /// Parses a trigger name (`change`, `onChange`, `blur`, `onBlur`, `submit`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "change" | "onchange" => Some(Trigger::Change),
            "blur" | "onblur" => Some(Trigger::Blur),
            "submit" | "onsubmit" => Some(Trigger::Submit),
            _ => None,
        }
    }
}

/// The fixed set of value formats a rule can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Url,
    Email,
    Tel,
    Number,
}

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("static pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w+\-.]+@[a-zA-Z\d\-]+(\.[a-zA-Z\d\-]+)*\.[a-zA-Z]+$").expect("static pattern")
});
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:https?|ftp)://)(?:\S+(?::\S*)?@)?(?:(?:[a-z\d\u{00a1}-\u{ffff}][a-z\d\u{00a1}-\u{ffff}\-]*)?[a-z\d\u{00a1}-\u{ffff}]\.?)+(?:[a-z\u{00a1}-\u{ffff}]{2,}\.?|localhost)(?::\d{2,5})?(?:[/?#]\S*)?$",
    )
    .expect("static pattern")
});
static TEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+?\d{1,3}[ -]?)?(\(\d{1,4}\)[ -]?)?[\d -]{4,14}\d$").expect("static pattern"));

impl Format {
    /// Parses a format name (`url`, `email`, `tel`, `number`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "url" => Some(Format::Url),
            "email" => Some(Format::Email),
            "tel" => Some(Format::Tel),
            "number" => Some(Format::Number),
            _ => None,
        }
    }

    /// Returns the lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Url => "url",
            Format::Email => "email",
            Format::Tel => "tel",
            Format::Number => "number",
        }
    }

    /// Returns true if `text` matches this format's fixed pattern.
    pub fn matches(&self, text: &str) -> bool {
        let regex: &Regex = match self {
            Format::Url => &URL_RE,
            Format::Email => &EMAIL_RE,
            Format::Tel => &TEL_RE,
            Format::Number => &NUMBER_RE,
        };
        regex.is_match(text)
    }
}

/// Errors raised while building a rule.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The pattern body is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A `/body/flags` literal used a flag that has no regex equivalent.
    #[error("unsupported flag '{flag}' in pattern '{pattern}'")]
    UnsupportedFlag { pattern: String, flag: char },
}

/// A compiled pattern plus the source text used in messages.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Compiles a pattern from either a plain regex or a `/body/flags` literal.
    ///
    /// Literal flags `i`, `m` and `s` map onto the regex options of the same
    /// name; `g`, `u` and `y` have no effect on a whole-value match and are
    /// accepted and ignored.
    ///
    /// ```rust
    /// use formfield::rules::Pattern;
    ///
    /// let pattern = Pattern::parse("/^logs-/i").unwrap();
    /// assert!(pattern.is_match("LOGS-2024"));
    ///
    /// let pattern = Pattern::parse(r"^\d+$").unwrap();
    /// assert!(!pattern.is_match("abc"));
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let literal = pattern
            .strip_prefix('/')
            .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])));

        let (body, flags) = literal.unwrap_or((pattern, ""));
        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'g' | 'u' | 'y' => {}
                other => {
                    return Err(PatternError::UnsupportedFlag {
                        pattern: pattern.to_string(),
                        flag: other,
                    })
                }
            }
        }

        let regex = builder.build().map_err(|source| PatternError::Invalid {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            source: pattern.to_string(),
        })
    }

    /// Returns true if the pattern matches somewhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns the pattern text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        let source = regex.as_str().to_string();
        Self { regex, source }
    }
}

/// One validation unit for a field.
///
/// Every check is optional. Within one rule the checks run in a fixed order
/// (`required`, `format`, `min`/`max`, length bounds, `pattern`, `validator`)
/// and the first failure is the rule's result. A field's rules are
/// independent: each contributes at most one message.
#[derive(Clone, Default)]
pub struct Rule {
    pub required: bool,
    pub pattern: Option<Pattern>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub format: Option<Format>,
    pub validator: Option<Arc<dyn CustomValidator>>,
    /// Replaces the default text of every built-in check in this rule.
    pub message: Option<String>,
    pub trigger: Trigger,
}

impl Rule {
    /// Creates a rule with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a non-empty value.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds a pattern check from a regex or a `/body/flags` literal.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, PatternError> {
        self.pattern = Some(Pattern::parse(pattern)?);
        Ok(self)
    }

    /// Adds a pattern check from an already compiled pattern.
    pub fn with_pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Requires at least `min` characters (strings) or items (arrays).
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Allows at most `max` characters (strings) or items (arrays).
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Requires exactly `len` characters (strings) or items (arrays).
    pub fn length(mut self, len: usize) -> Self {
        self.length = Some(len);
        self
    }

    /// Sets a lower numeric bound. Numeric strings are coerced before comparing.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets an upper numeric bound. Numeric strings are coerced before comparing.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Requires the value to match a fixed format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Attaches a custom, possibly asynchronous, validator.
    pub fn validator<V>(mut self, validator: V) -> Self
    where
        V: CustomValidator + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Overrides the message of the built-in checks.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the event that re-runs this rule.
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Returns true if this rule runs for `trigger`.
    ///
    /// Change-triggered rules also run on blur, so a blur never hides an
    /// error a keystroke would show.
    pub fn runs_on(&self, trigger: Trigger) -> bool {
        self.trigger == trigger || (trigger == Trigger::Blur && self.trigger == Trigger::Change)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("required", &self.required)
            .field("pattern", &self.pattern.as_ref().map(Pattern::as_str))
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("length", &self.length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("format", &self.format)
            .field("validator", &self.validator.is_some())
            .field("message", &self.message)
            .field("trigger", &self.trigger)
            .finish()
    }
}
