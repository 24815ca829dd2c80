//! Driver seam between scenarios and a browser backend.
//!
//! ```text
//! ┌──────────────┐      ┌──────────────────────────────┐
//! │  Scenario    │      │  BrowserDriver               │
//! │  Runner      │─────►│   : SelectorEngine           │
//! │              │      ├──────────────┬───────────────┤
//! └──────────────┘      │ ChromiumDriver│  MockDriver   │
//!                       │ (CDP)         │  (in-memory)  │
//!                       └──────────────┴───────────────┘
//! ```
//!
//! Scenario definitions only ever see [`Selector`]; how a selector is matched
//! is the backend's business. Swapping the automation library means adding a
//! new `BrowserDriver` implementation, nothing else.

use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Snapshot of a located element.
///
/// A handle is only as fresh as the last `query`/`resolve`; the runner
/// re-resolves it before every interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Backend-specific identifier
    pub id: String,
    /// Lowercase tag name
    pub tag: String,
    /// Trimmed text content
    #[serde(default)]
    pub text: String,
    /// Current value for form fields
    #[serde(default)]
    pub value: Option<String>,
    /// Whether the element is rendered and visible
    pub visible: bool,
    /// Whether the element is disabled
    #[serde(default)]
    pub disabled: bool,
    /// Bounding box, when rendered
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl ElementHandle {
    /// Create a visible, enabled handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            text: String::new(),
            value: None,
            visible: true,
            disabled: false,
            bounding_box: None,
        }
    }

    /// Value for form fields, text content otherwise
    #[must_use]
    pub fn observed_text(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }

    /// Whether the element accepts clicks and typing
    #[must_use]
    pub const fn is_interactable(&self) -> bool {
        self.visible && !self.disabled
    }
}

/// Selector capability: resolve predicates to element handles
#[async_trait]
pub trait SelectorEngine: Send {
    /// First match in document order, if any
    async fn query(&mut self, selector: &Selector) -> E2eResult<Option<ElementHandle>>;

    /// Number of current matches
    async fn count(&mut self, selector: &Selector) -> E2eResult<usize>;

    /// Re-read a handle; `None` when it is stale
    async fn resolve(&mut self, handle: &ElementHandle) -> E2eResult<Option<ElementHandle>>;
}

/// Abstract browser backend
#[async_trait]
pub trait BrowserDriver: SelectorEngine {
    /// Load a URL and wait for the load event
    async fn navigate(&mut self, url: &str) -> E2eResult<()>;

    /// Click an element
    async fn click(&mut self, handle: &ElementHandle) -> E2eResult<()>;

    /// Type text into an element
    async fn type_text(&mut self, handle: &ElementHandle, text: &str) -> E2eResult<()>;

    /// Capture the current viewport as PNG bytes
    async fn screenshot(&mut self) -> E2eResult<Vec<u8>>;

    /// Current page URL
    async fn current_url(&mut self) -> E2eResult<String>;

    /// Release the browser session
    async fn close(&mut self) -> E2eResult<()>;
}

// ============================================================================
// Mock driver
// ============================================================================

/// Side effect applied when a mock element is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEffect {
    /// Make an element visible
    Reveal(String),
    /// Make an element visible after the given number of further queries
    RevealAfter {
        /// Element id
        id: String,
        /// Queries to wait
        queries: u32,
    },
    /// Hide an element
    Conceal(String),
    /// Remove an element from the page
    Remove(String),
    /// Load another page
    Goto(String),
}

/// Element in a [`MockPage`]
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Element id (unique within the page)
    pub id: String,
    /// Lowercase tag name
    pub tag: String,
    /// Own text (containers usually leave this empty)
    pub text: String,
    /// Attributes
    pub attributes: Vec<(String, String)>,
    /// Parent element id
    pub parent: Option<String>,
    /// Form value; `Some` for typeable fields
    pub value: Option<String>,
    /// Visibility of the element itself
    pub visible: bool,
    /// Disabled flag
    pub disabled: bool,
    /// Effects applied on click
    pub on_click: Vec<MockEffect>,
    /// Typing also updates the text content, as a controlled `<textarea>` does
    pub mirrors_value: bool,
}

impl MockElement {
    /// Create a visible element
    #[must_use]
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag = tag.into().to_lowercase();
        let value = matches!(tag.as_str(), "input" | "textarea").then(String::new);
        Self {
            id: id.into(),
            tag,
            text: String::new(),
            attributes: Vec::new(),
            parent: None,
            value,
            visible: true,
            disabled: false,
            on_click: Vec::new(),
            mirrors_value: false,
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set the parent element
    #[must_use]
    pub fn within(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Mirror typed text into the text content
    #[must_use]
    pub fn controlled(mut self) -> Self {
        self.mirrors_value = true;
        self
    }

    /// Add a click effect
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A page served by [`MockDriver`]
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    /// Elements in document order
    pub elements: Vec<MockElement>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element
    #[must_use]
    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    fn ancestors(&self, index: usize) -> Vec<&MockElement> {
        let mut out = Vec::new();
        let mut parent = self.elements[index].parent.clone();
        while let Some(pid) = parent {
            match self.index_of(&pid) {
                Some(i) => {
                    out.push(&self.elements[i]);
                    parent = self.elements[i].parent.clone();
                }
                None => break,
            }
        }
        out
    }

    fn is_visible(&self, index: usize) -> bool {
        self.elements[index].visible && self.ancestors(index).iter().all(|a| a.visible)
    }

    fn matches(&self, index: usize, selector: &Selector) -> E2eResult<bool> {
        let element = &self.elements[index];
        match selector {
            Selector::Text { text } => Ok(!FORM_TAGS.contains(&element.tag.as_str())
                && element.text.contains(text.as_str())),
            Selector::AttributeContains {
                tag,
                attribute,
                fragment,
            } => Ok(tag.as_deref().map_or(true, |t| t == element.tag)
                && element
                    .attribute(attribute)
                    .is_some_and(|v| v.contains(fragment.as_str()))),
            Selector::Css { css } => self.matches_tag_path(index, css),
            Selector::AnyOf { alternatives } => {
                for alternative in alternatives {
                    if self.matches(index, alternative)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    // Supports descendant tag paths such as `footer textarea`.
    fn matches_tag_path(&self, index: usize, css: &str) -> E2eResult<bool> {
        let parts: Vec<&str> = css.split_whitespace().collect();
        if parts.is_empty()
            || parts
                .iter()
                .any(|p| !p.chars().all(|c| c.is_ascii_alphanumeric() || c == '*'))
        {
            return Err(E2eError::driver(format!(
                "MockDriver only supports tag-path CSS, got {css:?}"
            )));
        }
        let Some((last, rest)) = parts.split_last() else {
            return Ok(false);
        };
        if !tag_matches(last, &self.elements[index].tag) {
            return Ok(false);
        }
        let mut pending: Vec<&str> = rest.to_vec();
        for ancestor in self.ancestors(index) {
            match pending.last() {
                Some(part) if tag_matches(part, &ancestor.tag) => {
                    pending.pop();
                }
                Some(_) => {}
                None => break,
            }
        }
        Ok(pending.is_empty())
    }

    fn first_match(&self, selector: &Selector) -> E2eResult<Option<usize>> {
        for index in 0..self.elements.len() {
            if self.matches(index, selector)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

/// Tags excluded from text matching
const FORM_TAGS: [&str; 3] = ["input", "textarea", "select"];

fn tag_matches(part: &str, tag: &str) -> bool {
    part == "*" || part.eq_ignore_ascii_case(tag)
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    page: MockPage,
    delayed: Vec<(String, u32)>,
}

/// In-memory browser for unit tests.
///
/// Pages are registered by URL; clicking an element applies its
/// [`MockEffect`]s. Handle ids embed a load generation so handles from a
/// previous navigation resolve as stale.
#[derive(Debug)]
pub struct MockDriver {
    pages: HashMap<String, MockPage>,
    unreachable: HashSet<String>,
    current: Option<LoadedPage>,
    generation: u64,
    navigation_delay: Option<Duration>,
    /// Bytes returned by `screenshot`
    pub screenshot_data: Option<Vec<u8>>,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            unreachable: HashSet::new(),
            current: None,
            generation: 0,
            navigation_delay: None,
            screenshot_data: Some(PNG_SIGNATURE.to_vec()),
            call_history: Vec::new(),
        }
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a page at a URL
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Make a URL fail to load
    #[must_use]
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }

    /// Delay every navigation
    #[must_use]
    pub const fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }

    /// Make `screenshot` fail
    #[must_use]
    pub fn without_screenshots(mut self) -> Self {
        self.screenshot_data = None;
        self
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Current value of a field on the loaded page
    #[must_use]
    pub fn field_value(&self, id: &str) -> Option<String> {
        let loaded = self.current.as_ref()?;
        let index = loaded.page.index_of(id)?;
        loaded.page.elements[index].value.clone()
    }

    fn load(&mut self, url: &str) -> E2eResult<()> {
        if self.unreachable.contains(url) {
            return Err(E2eError::Navigation {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        let page = self.pages.get(url).cloned().ok_or_else(|| E2eError::Navigation {
            url: url.to_string(),
            message: "404 Not Found".to_string(),
        })?;
        self.generation += 1;
        self.current = Some(LoadedPage {
            url: url.to_string(),
            page,
            delayed: Vec::new(),
        });
        Ok(())
    }

    fn loaded(&self) -> E2eResult<&LoadedPage> {
        self.current
            .as_ref()
            .ok_or_else(|| E2eError::driver("no page loaded"))
    }

    fn tick_delayed(&mut self) {
        let Some(loaded) = self.current.as_mut() else {
            return;
        };
        let mut ready = Vec::new();
        loaded.delayed.retain_mut(|(id, remaining)| {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                ready.push(id.clone());
                false
            } else {
                true
            }
        });
        for id in ready {
            if let Some(i) = loaded.page.index_of(&id) {
                loaded.page.elements[i].visible = true;
            }
        }
    }

    fn describe(&self, index: usize) -> E2eResult<ElementHandle> {
        let page = &self.loaded()?.page;
        let element = &page.elements[index];
        let visible = page.is_visible(index);
        Ok(ElementHandle {
            id: format!("{}:{}", self.generation, element.id),
            tag: element.tag.clone(),
            text: element.text.clone(),
            value: element.value.clone(),
            visible,
            disabled: element.disabled,
            bounding_box: visible.then(|| BoundingBox::new(0.0, 0.0, 100.0, 20.0)),
        })
    }

    fn index_for_handle(&self, handle: &ElementHandle) -> Option<usize> {
        let (generation, id) = handle.id.split_once(':')?;
        if generation.parse::<u64>().ok()? != self.generation {
            return None;
        }
        self.current.as_ref()?.page.index_of(id)
    }

    fn require_index(&self, handle: &ElementHandle) -> E2eResult<usize> {
        self.index_for_handle(handle)
            .ok_or_else(|| E2eError::interaction(format!("element {} is detached", handle.id)))
    }
}

#[async_trait]
impl SelectorEngine for MockDriver {
    async fn query(&mut self, selector: &Selector) -> E2eResult<Option<ElementHandle>> {
        self.call_history.push(format!("query:{selector}"));
        self.tick_delayed();
        match self.loaded()?.page.first_match(selector)? {
            Some(index) => Ok(Some(self.describe(index)?)),
            None => Ok(None),
        }
    }

    async fn count(&mut self, selector: &Selector) -> E2eResult<usize> {
        self.call_history.push(format!("count:{selector}"));
        let page = &self.loaded()?.page;
        let mut total = 0;
        for index in 0..page.elements.len() {
            if page.matches(index, selector)? {
                total += 1;
            }
        }
        Ok(total)
    }

    async fn resolve(&mut self, handle: &ElementHandle) -> E2eResult<Option<ElementHandle>> {
        match self.index_for_handle(handle) {
            Some(index) => Ok(Some(self.describe(index)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> E2eResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        if let Some(delay) = self.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        self.load(url)
    }

    async fn click(&mut self, handle: &ElementHandle) -> E2eResult<()> {
        self.call_history.push(format!("click:{}", handle.id));
        let index = self.require_index(handle)?;
        let effects = self.loaded()?.page.elements[index].on_click.clone();
        for effect in effects {
            if let MockEffect::Goto(url) = &effect {
                self.load(url)?;
                continue;
            }
            let Some(loaded) = self.current.as_mut() else {
                break;
            };
            match effect {
                MockEffect::Reveal(id) | MockEffect::Conceal(id) | MockEffect::Remove(id)
                    if loaded.page.index_of(&id).is_none() =>
                {
                    return Err(E2eError::driver(format!("unknown mock element {id}")));
                }
                MockEffect::Reveal(id) => {
                    if let Some(i) = loaded.page.index_of(&id) {
                        loaded.page.elements[i].visible = true;
                    }
                }
                MockEffect::Conceal(id) => {
                    if let Some(i) = loaded.page.index_of(&id) {
                        loaded.page.elements[i].visible = false;
                    }
                }
                MockEffect::Remove(id) => {
                    loaded.page.elements.retain(|e| e.id != id);
                }
                MockEffect::RevealAfter { id, queries } => {
                    loaded.delayed.push((id, queries.max(1)));
                }
                MockEffect::Goto(_) => {}
            }
        }
        Ok(())
    }

    async fn type_text(&mut self, handle: &ElementHandle, text: &str) -> E2eResult<()> {
        self.call_history.push(format!("type:{}:{text}", handle.id));
        let index = self.require_index(handle)?;
        let loaded = self
            .current
            .as_mut()
            .ok_or_else(|| E2eError::driver("no page loaded"))?;
        let element = &mut loaded.page.elements[index];
        match element.value.as_mut() {
            Some(value) => {
                value.push_str(text);
                if element.mirrors_value {
                    element.text = value.clone();
                }
                Ok(())
            }
            None => Err(E2eError::interaction(format!(
                "<{}> is not a typeable element",
                element.tag
            ))),
        }
    }

    async fn screenshot(&mut self) -> E2eResult<Vec<u8>> {
        self.call_history.push("screenshot".to_string());
        self.screenshot_data
            .clone()
            .ok_or_else(|| E2eError::driver("screenshot capture unavailable"))
    }

    async fn current_url(&mut self) -> E2eResult<String> {
        self.call_history.push("current_url".to_string());
        Ok(self.loaded()?.url.clone())
    }

    async fn close(&mut self) -> E2eResult<()> {
        self.call_history.push("close".to_string());
        self.current = None;
        Ok(())
    }
}
