#![allow(dead_code)]

use async_trait::async_trait;
use slidepilot_engine::backend::{Backend, BackendError};
use slidepilot_engine::protocol::{
    ElementHandle, ElementSnapshot, NavigationResult, Neighborhood, Rect, Scope,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

pub fn el(handle: &str, tag: &str, text: &str) -> ElementSnapshot {
    ElementSnapshot {
        handle: ElementHandle::from(handle),
        tag: tag.to_string(),
        text: text.to_string(),
        attributes: HashMap::new(),
        classes: vec![],
        visible: true,
        enabled: true,
        rect: Rect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 30.0,
        },
    }
}

pub fn disabled(mut element: ElementSnapshot) -> ElementSnapshot {
    element.enabled = false;
    element
}

pub fn hidden(mut element: ElementSnapshot) -> ElementSnapshot {
    element.visible = false;
    element
}

/// The page as it looks from `at` onwards.
#[derive(Debug, Default, Clone)]
pub struct Frame {
    pub at: Duration,
    /// Each element with the selectors it answers to.
    pub elements: Vec<(Vec<String>, ElementSnapshot)>,
    pub page_text: String,
}

/// Scripted page. Frames switch on tokio's clock, so tests run with a paused
/// clock and reason in poll ticks.
pub struct MockBackend {
    frames: Vec<Frame>,
    started: Instant,
    url: String,
    pub invalid_selectors: HashSet<String>,
    /// Handles whose next action is rejected as disabled.
    pub reject_once: HashSet<String>,
    /// Clicking a handle moves the page to a URL.
    pub redirects: HashMap<String, String>,
    /// Neighborhood answers, consumed one per call; the last one repeats.
    pub neighborhoods: VecDeque<Neighborhood>,
    pub screenshot_fails: bool,

    pub queries: Vec<String>,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub inserts: Vec<(String, String)>,
    pub clears: Vec<String>,
    pub keys: Vec<String>,
    pub navigations: Vec<String>,
    pub screenshots: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            started: Instant::now(),
            url: "about:blank".to_string(),
            invalid_selectors: HashSet::new(),
            reject_once: HashSet::new(),
            redirects: HashMap::new(),
            neighborhoods: VecDeque::new(),
            screenshot_fails: false,
            queries: vec![],
            clicks: vec![],
            fills: vec![],
            inserts: vec![],
            clears: vec![],
            keys: vec![],
            navigations: vec![],
            screenshots: 0,
        }
    }

    /// Add an element to the most recent frame.
    pub fn with(mut self, selectors: &[&str], element: ElementSnapshot) -> Self {
        let frame = self.frames.last_mut().expect("at least one frame");
        frame
            .elements
            .push((selectors.iter().map(|s| s.to_string()).collect(), element));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.frames.last_mut().expect("at least one frame").page_text = text.to_string();
        self
    }

    /// Start a new, empty frame at `offset` from construction.
    pub fn then_at(mut self, offset: Duration) -> Self {
        self.frames.push(Frame {
            at: offset,
            ..Frame::default()
        });
        self
    }

    pub fn at_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn redirect_on_click(mut self, handle: &str, url: &str) -> Self {
        self.redirects.insert(handle.to_string(), url.to_string());
        self
    }

    pub fn invalid(mut self, selector: &str) -> Self {
        self.invalid_selectors.insert(selector.to_string());
        self
    }

    pub fn current_frame(&self) -> &Frame {
        let elapsed = self.started.elapsed();
        self.frames
            .iter()
            .rev()
            .find(|f| f.at <= elapsed)
            .unwrap_or(&self.frames[0])
    }

    fn lookup(&self, handle: &ElementHandle) -> Result<ElementSnapshot, BackendError> {
        self.current_frame()
            .elements
            .iter()
            .map(|(_, el)| el)
            .find(|el| &el.handle == handle)
            .cloned()
            .ok_or_else(|| BackendError::ElementStale {
                handle: handle.clone(),
            })
    }

    /// Checks shared by every action.
    fn actionable(&mut self, handle: &ElementHandle) -> Result<ElementSnapshot, BackendError> {
        let element = self.lookup(handle)?;
        if self.reject_once.remove(handle.as_str()) || !element.enabled {
            return Err(BackendError::ElementDisabled {
                handle: handle.clone(),
            });
        }
        if !element.visible {
            return Err(BackendError::ElementNotVisible {
                handle: handle.clone(),
            });
        }
        Ok(element)
    }

    pub fn clicked(&self, handle: &str) -> bool {
        self.clicks.iter().any(|h| h == handle)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        self.navigations.push(url.to_string());
        self.url = url.to_string();
        Ok(NavigationResult {
            url: url.to_string(),
            title: "mock".to_string(),
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        Ok(self.url.clone())
    }

    async fn query(
        &mut self,
        scope: &Scope,
        selector: &str,
    ) -> Result<Vec<ElementSnapshot>, BackendError> {
        self.queries.push(selector.to_string());
        if self.invalid_selectors.contains(selector) {
            return Err(BackendError::SelectorInvalid {
                selector: selector.to_string(),
                reason: "unsupported".to_string(),
            });
        }
        if let Scope::Within { handle } = scope {
            self.lookup(handle)?;
        }
        let parts: Vec<&str> = selector.split(',').map(str::trim).collect();
        Ok(self
            .current_frame()
            .elements
            .iter()
            .filter(|(selectors, _)| {
                selectors
                    .iter()
                    .any(|s| s == selector || parts.contains(&s.as_str()))
            })
            .map(|(_, el)| el.clone())
            .collect())
    }

    async fn neighborhood(&mut self, handle: &ElementHandle) -> Result<Neighborhood, BackendError> {
        self.lookup(handle)?;
        if self.neighborhoods.len() > 1 {
            Ok(self.neighborhoods.pop_front().unwrap_or_default())
        } else {
            Ok(self.neighborhoods.front().cloned().unwrap_or_default())
        }
    }

    async fn page_text(&mut self) -> Result<String, BackendError> {
        Ok(self.current_frame().page_text.clone())
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), BackendError> {
        self.actionable(handle)?;
        self.clicks.push(handle.0.clone());
        if let Some(url) = self.redirects.get(handle.as_str()) {
            self.url = url.clone();
        }
        Ok(())
    }

    async fn fill(&mut self, handle: &ElementHandle, text: &str) -> Result<(), BackendError> {
        self.actionable(handle)?;
        self.fills.push((handle.0.clone(), text.to_string()));
        Ok(())
    }

    async fn clear(&mut self, handle: &ElementHandle) -> Result<(), BackendError> {
        self.actionable(handle)?;
        self.clears.push(handle.0.clone());
        Ok(())
    }

    async fn insert_text(&mut self, handle: &ElementHandle, text: &str) -> Result<(), BackendError> {
        self.actionable(handle)?;
        self.inserts.push((handle.0.clone(), text.to_string()));
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        if self.screenshot_fails {
            return Err(BackendError::Other("no page".into()));
        }
        self.screenshots += 1;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        self.keys.push(key.to_string());
        Ok(())
    }
}
