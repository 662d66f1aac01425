//! Markdown renderer using pulldown-cmark, sanitized with ammonia.

use std::{borrow::Cow, collections::HashSet, fmt};

use engrave_core::config::MarkdownConfig;
use pulldown_cmark::{Options, Parser, html};
use thiserror::Error;

/// Markdown rendering errors.
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// An allow-listed iframe host that is not a bare host name.
    #[error("invalid iframe host: {0:?}")]
    InvalidIframeHost(String),
}

/// Result type for markdown operations.
pub type Result<T> = std::result::Result<T, MarkdownError>;

/// Attributes kept on allow-listed iframes.
const IFRAME_ATTRIBUTES: [&str; 7] = [
    "src",
    "width",
    "height",
    "title",
    "allow",
    "allowfullscreen",
    "frameborder",
];

/// Renders untrusted Markdown into HTML that is safe to embed directly.
pub struct MarkdownRenderer {
    options: Options,
    sanitizer: ammonia::Builder<'static>,
    iframe_hosts: Vec<String>,
}

impl fmt::Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("options", &self.options)
            .field("iframe_hosts", &self.iframe_hosts)
            .finish_non_exhaustive()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer that allows no embedded frames.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self {
            options,
            sanitizer: ammonia::Builder::default(),
            iframe_hosts: Vec::new(),
        }
    }

    /// Create a renderer that keeps `<iframe>` elements whose `https` source
    /// host is one of `hosts`.
    pub fn with_iframe_hosts<I, S>(hosts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts: Vec<String> = hosts
            .into_iter()
            .map(|h| h.into().trim().to_ascii_lowercase())
            .collect();

        for host in &hosts {
            if host.is_empty() || host.contains(['/', ':', ' ']) {
                return Err(MarkdownError::InvalidIframeHost(host.clone()));
            }
        }

        let mut renderer = Self::new();
        if hosts.is_empty() {
            return Ok(renderer);
        }

        let allowed: HashSet<String> = hosts.iter().cloned().collect();
        renderer
            .sanitizer
            .add_tags(&["iframe"])
            .add_tag_attributes("iframe", &IFRAME_ATTRIBUTES)
            .attribute_filter(move |element, attribute, value| {
                if element == "iframe" && attribute == "src" && !iframe_src_allowed(&allowed, value)
                {
                    return None;
                }
                Some(Cow::Borrowed(value))
            });
        renderer.iframe_hosts = hosts;
        Ok(renderer)
    }

    /// Create a renderer from the `[markdown]` configuration section.
    pub fn from_config(config: &MarkdownConfig) -> Result<Self> {
        Self::with_iframe_hosts(config.iframe_hosts.iter().cloned())
    }

    /// Render a Markdown body to sanitized HTML.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut unsafe_html = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut unsafe_html, parser);
        self.sanitizer.clean(&unsafe_html).to_string()
    }

    /// Hosts whose iframes survive sanitizing.
    pub fn iframe_hosts(&self) -> &[String] {
        &self.iframe_hosts
    }
}

fn iframe_src_allowed(allowed: &HashSet<String>, src: &str) -> bool {
    let Ok(url) = url::Url::parse(src) else {
        return false;
    };
    url.scheme() == "https"
        && url
            .host_str()
            .is_some_and(|host| allowed.contains(&host.to_ascii_lowercase()))
}
