//! Selector predicates for element location.
//!
//! A [`Selector`] is a backend-neutral description of which element a
//! scenario wants. Backends either match it against their own page model
//! (see [`crate::MockDriver`]) or compile it to a JavaScript expression with
//! the `*_js` methods below (see `ChromiumDriver`).
//!
//! Text selectors follow the "deepest match" rule: among all elements whose
//! text content contains the fragment, only those with no child that also
//! contains it are candidates. This resolves `"Entrar al Chat"` to the button
//! rather than to `<body>`. Form controls never match text selectors: a
//! controlled `<textarea>` mirrors its value into its text content, and a
//! field holding a message is not that message on the page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute stamped on located elements so later actions can address them
pub const HANDLE_ATTRIBUTE: &str = "data-e2e-handle";

/// A rule used to find an element at the time of the check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// Deepest element whose text content contains the fragment
    Text {
        /// Substring to find
        text: String,
    },
    /// Element whose attribute value contains the fragment
    AttributeContains {
        /// Optional tag name restriction (e.g. `input`)
        tag: Option<String>,
        /// Attribute name (e.g. `placeholder`)
        attribute: String,
        /// Substring of the attribute value
        fragment: String,
    },
    /// Raw CSS selector
    Css {
        /// Selector text
        css: String,
    },
    /// First match, in document order, of any alternative
    AnyOf {
        /// Alternatives
        alternatives: Vec<Selector>,
    },
}

impl Selector {
    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self::Css { css: css.into() }
    }

    /// Create an attribute-substring selector without tag restriction
    #[must_use]
    pub fn attribute_contains(attribute: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::AttributeContains {
            tag: None,
            attribute: attribute.into(),
            fragment: fragment.into(),
        }
    }

    /// Create a placeholder-substring selector restricted to a tag
    #[must_use]
    pub fn placeholder(tag: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::AttributeContains {
            tag: Some(tag.into()),
            attribute: "placeholder".to_string(),
            fragment: fragment.into(),
        }
    }

    /// Create a union of selectors
    #[must_use]
    pub fn any_of(alternatives: impl IntoIterator<Item = Selector>) -> Self {
        Self::AnyOf {
            alternatives: alternatives.into_iter().collect(),
        }
    }

    /// Render attribute selectors as CSS; `None` for text and unions
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css { css } => Some(css.clone()),
            Self::AttributeContains {
                tag,
                attribute,
                fragment,
            } => Some(format!(
                "{}[{}*=\"{}\"]",
                tag.as_deref().unwrap_or(""),
                attribute,
                escape_css_string(fragment)
            )),
            Self::Text { .. } | Self::AnyOf { .. } => None,
        }
    }

    /// JavaScript expression evaluating to the array of candidate elements
    #[must_use]
    pub fn to_candidates_js(&self) -> String {
        match self {
            Self::Text { text } => {
                let t = js_string(text);
                format!(
                    "Array.from(document.querySelectorAll('body, body *')).filter(el => \
                     !['SCRIPT', 'STYLE', 'NOSCRIPT', 'INPUT', 'TEXTAREA', 'SELECT'].includes(el.tagName) && \
                     (el.textContent || '').includes({t}) && \
                     !Array.from(el.children).some(c => (c.textContent || '').includes({t})))"
                )
            }
            Self::Css { .. } | Self::AttributeContains { .. } => {
                let css = self.to_css().unwrap_or_default();
                format!("Array.from(document.querySelectorAll({}))", js_string(&css))
            }
            Self::AnyOf { alternatives } => {
                let parts = alternatives
                    .iter()
                    .map(|s| format!("...{}", s.to_candidates_js()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Array.from(new Set([{parts}])).sort((a, b) => a === b ? 0 : \
                     (a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1))"
                )
            }
        }
    }

    /// JavaScript returning the described first match (stamped with a handle id) or `null`
    #[must_use]
    pub fn to_locate_js(&self) -> String {
        format!(
            "(() => {{ {DESCRIBE_JS} const el = ({})[0]; if (!el) return null; \
             if (!el.hasAttribute('{HANDLE_ATTRIBUTE}')) {{ \
             window.__e2ePage = window.__e2ePage || Math.random().toString(36).slice(2); \
             window.__e2eSeq = (window.__e2eSeq || 0) + 1; \
             el.setAttribute('{HANDLE_ATTRIBUTE}', window.__e2ePage + '-' + window.__e2eSeq); }} \
             return __describe(el); }})()",
            self.to_candidates_js()
        )
    }

    /// JavaScript returning the number of matches
    #[must_use]
    pub fn to_count_js(&self) -> String {
        format!("({}).length", self.to_candidates_js())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => write!(f, "text {text:?}"),
            Self::Css { css } => f.write_str(css),
            Self::AttributeContains { .. } => f.write_str(&self.to_css().unwrap_or_default()),
            Self::AnyOf { alternatives } => {
                let parts: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
                write!(f, "any of [{}]", parts.join(", "))
            }
        }
    }
}

/// JavaScript re-describing a previously stamped element, or `null` when stale
#[must_use]
pub fn resolve_handle_js(handle_id: &str) -> String {
    format!(
        "(() => {{ {DESCRIBE_JS} const el = document.querySelector({}); \
         return el ? __describe(el) : null; }})()",
        js_string(&handle_css(handle_id))
    )
}

/// CSS addressing a stamped element
#[must_use]
pub fn handle_css(handle_id: &str) -> String {
    format!("[{HANDLE_ATTRIBUTE}=\"{}\"]", escape_css_string(handle_id))
}

// Serializes an element into the `ElementHandle` JSON shape.
const DESCRIBE_JS: &str = "const __describe = (el) => { \
    const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
    const field = ['INPUT', 'TEXTAREA', 'SELECT'].includes(el.tagName); \
    return { id: el.getAttribute('data-e2e-handle') || '', tag: el.tagName.toLowerCase(), \
    text: (el.textContent || '').trim(), value: field ? el.value : null, \
    visible: r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none', \
    disabled: !!el.disabled, \
    bounding_box: { x: r.x, y: r.y, width: r.width, height: r.height } }; };";

/// Encode a Rust string as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn escape_css_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
