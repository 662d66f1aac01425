//! Page emission: per-locale JSON fragments, detail pages and the home page.

use std::path::{Path, PathBuf};

use engrave_core::{
    AvatarPath, Config, LocalizedContent, PersonRecord, Website,
    config::SiteConfig,
    record::PEOPLE_SEGMENT,
};
use engrave_parser::{MarkdownError, MarkdownRenderer};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    aggregate::InfoMap,
    output::write_atomic,
    template::{
        COMMENTS_SCRIPTS, HOME_SCRIPTS, PERSON_SCRIPTS, TemplateContext, TemplateError,
        TemplateRegistry, html_escape,
    },
};

/// National mental-health help line shown on every page.
pub const HOTLINE: &str = "400-161-9995";

/// Beijing crisis intervention line, listed on the home page.
pub const CRISIS_LINE: &str = "800-810-1117";

/// Page emission errors.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid discussion URL: {0}")]
    DiscussionUrl(#[from] url::ParseError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for page emission.
pub type Result<T> = std::result::Result<T, EmitError>;

/// One person in one locale, as consumed by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonFragment {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Relative to the person's own directory.
    pub avatar_path: String,
    pub structured_info: InfoMap,
    pub websites: Vec<Website>,
    /// Sanitized HTML.
    pub bio: String,
}

/// Renders every page and fragment of the site.
#[derive(Debug)]
pub struct PageEmitter {
    templates: TemplateRegistry,
    markdown: MarkdownRenderer,
    site: SiteConfig,
    listing_file: String,
    placeholder_avatar: String,
}

impl PageEmitter {
    /// Create an emitter with the built-in templates.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_templates(config, TemplateRegistry::new())
    }

    /// Create an emitter with a custom template registry.
    pub fn with_templates(config: &Config, templates: TemplateRegistry) -> Result<Self> {
        Ok(Self {
            templates,
            markdown: MarkdownRenderer::from_config(&config.markdown)?,
            site: config.site.clone(),
            listing_file: config.build.listing_file.clone(),
            placeholder_avatar: config.build.placeholder_avatar.clone(),
        })
    }

    /// Project one localized document.
    #[must_use]
    pub fn fragment(&self, record: &PersonRecord, content: &LocalizedContent) -> PersonFragment {
        PersonFragment {
            id: record.id.to_string(),
            name: record.display_name(content),
            description: content.front_matter.description.clone().unwrap_or_default(),
            avatar_path: record.derived.avatar.person_relative(),
            structured_info: InfoMap::from_record(record),
            websites: record.meta.websites.clone(),
            bio: self.markdown.render(&content.body),
        }
    }

    /// Render the default-locale detail page, or `None` for an unpublished
    /// record.
    pub fn person_page(&self, record: &PersonRecord) -> Result<Option<String>> {
        let Some(content) = record.default_content() else {
            return Ok(None);
        };

        let name = record.display_name(content);
        let mut ctx = TemplateContext::new()
            .with_var("name", &name)
            .with_var("avatar", record.derived.avatar.person_relative())
            .with_var(
                "placeholder",
                AvatarPath::Placeholder(self.placeholder_avatar.clone()).person_relative(),
            )
            .with_var("hotline", HOTLINE)
            .with_html("info", info_html(&InfoMap::from_record(record)))
            .with_html("bio", self.markdown.render(&content.body));

        if let Some(description) = &content.front_matter.description {
            ctx.insert("description", description);
        }
        if let Some(links) = websites_html(&record.meta.websites) {
            ctx.insert_html("websites", links);
        }
        let mut scripts = PERSON_SCRIPTS.to_string();
        if let Some(repo) = &self.site.comment_repo {
            let memories = TemplateContext::new()
                .with_var("comment_repo", repo)
                .with_var("comment_label", &self.site.comment_label)
                .with_var("name", &name)
                .with_var(
                    "discussion_url",
                    discussion_url(repo, &self.site.comment_label, &name)?.as_str(),
                );
            ctx.insert_html("memories", self.templates.render("memories", &memories)?);
            scripts.push('\n');
            scripts.push_str(COMMENTS_SCRIPTS);
        }

        let body = self.templates.render("person", &ctx)?;
        let page = self.wrap(
            &format!("{name} - {}", self.site.title),
            content.front_matter.description.as_deref(),
            "../../",
            body,
            &scripts,
        )?;
        Ok(Some(page))
    }

    /// Render the home page shell.
    pub fn home_page(&self) -> Result<String> {
        let ctx = TemplateContext::new()
            .with_var("site_title", &self.site.title)
            .with_var("listing_file", &self.listing_file)
            .with_var("hotline", HOTLINE)
            .with_var("crisis_line", CRISIS_LINE);
        let body = self.templates.render("home", &ctx)?;

        self.wrap(
            &format!("{} - engrave.ren", self.site.title),
            None,
            "",
            body,
            HOME_SCRIPTS,
        )
    }

    /// Write a person's fragments and detail page under `out_dir`.
    ///
    /// Everything is rendered before the first write, so a render error
    /// leaves no files behind. Returns the number of files written.
    /// Unpublished records write nothing.
    pub fn emit_person(&self, record: &PersonRecord, out_dir: &Path) -> Result<usize> {
        let Some(page) = self.person_page(record)? else {
            debug!(id = %record.id, "no default-locale document, nothing emitted");
            return Ok(0);
        };

        let person_dir = person_output_dir(out_dir, record);
        let mut files = Vec::with_capacity(record.content.len() + 1);
        for content in &record.content {
            let json = serde_json::to_string_pretty(&self.fragment(record, content))?;
            files.push((person_dir.join(content.locale.fragment_file()), json));
        }
        files.push((person_dir.join("index.html"), page));

        for (path, contents) in &files {
            write(path, contents)?;
        }

        debug!(id = %record.id, files = files.len(), "emitted person");
        Ok(files.len())
    }

    /// Write the home page to `out_dir/index.html`.
    pub fn emit_home(&self, out_dir: &Path) -> Result<()> {
        write(&out_dir.join("index.html"), self.home_page()?)
    }

    fn wrap(
        &self,
        title: &str,
        description: Option<&str>,
        root: &str,
        content: String,
        scripts: &str,
    ) -> Result<String> {
        let mut ctx = TemplateContext::new()
            .with_var("lang", &self.site.lang)
            .with_var("title", title)
            .with_var("site_title", &self.site.title)
            .with_var("footer", &self.site.footer)
            .with_var("root", root)
            .with_html("content", content)
            .with_html("scripts", scripts);
        if let Some(description) = description {
            ctx.insert("description", description);
        }
        Ok(self.templates.render("base", &ctx)?)
    }
}

/// Output directory of one person.
#[must_use]
pub fn person_output_dir(out_dir: &Path, record: &PersonRecord) -> PathBuf {
    out_dir.join(PEOPLE_SEGMENT).join(record.id.as_str())
}

/// Display label of a structured-info key on detail pages.
#[must_use]
pub fn info_label(key: &str) -> &str {
    match key {
        "location" => "地点",
        "born" => "出生",
        "died" => "去世",
        "age" => "年龄",
        "aliases" => "别名",
        other => other,
    }
}

fn info_html(info: &InfoMap) -> String {
    info.iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            format!(
                r#"<div class="profile-info-item"><strong>{}：</strong>{}</div>"#,
                html_escape(info_label(key)),
                html_escape(value)
            )
        })
        .collect()
}

/// Links list, with anything but `http(s)` URLs dropped.
fn websites_html(websites: &[Website]) -> Option<String> {
    let items: String = websites
        .iter()
        .filter(|site| {
            Url::parse(site.url()).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
        })
        .map(|site| {
            format!(
                r#"<li><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                html_escape(site.url()),
                html_escape(site.label())
            )
        })
        .collect();

    (!items.is_empty()).then(|| {
        format!(r#"                <ul class="profile-websites">{items}</ul>"#)
    })
}

/// New-discussion link for a person, titled `【label】name`.
fn discussion_url(repo: &str, label: &str, name: &str) -> std::result::Result<Url, url::ParseError> {
    let mut url = Url::parse("https://github.com/")?;
    url.set_path(&format!("{}/discussions/new", repo.trim_matches('/')));
    url.query_pairs_mut()
        .append_pair("category", "general")
        .append_pair("title", &format!("【{label}】{name}"));
    Ok(url)
}

fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    write_atomic(path, contents).map_err(|source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use engrave_core::{
        FrontMatter, Locale, PersonId, PersonMeta, StructuredInfo, derive_fields,
        record::AvatarSource,
    };
    use tempfile::TempDir;

    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.site.comment_repo = Some("NatsukoYamamura/engrave-ren".to_string());
        config
    }

    fn content(locale: Locale, name: Option<&str>, body: &str) -> LocalizedContent {
        LocalizedContent {
            locale,
            front_matter: FrontMatter {
                name: name.map(str::to_string),
                description: Some("一位朋友".to_string()),
                ..Default::default()
            },
            body: body.to_string(),
        }
    }

    fn record() -> PersonRecord {
        let meta = PersonMeta {
            display_id: Some("小林".to_string()),
            avatar: Some(AvatarSource::Photo("me.jpg".to_string())),
            info: StructuredInfo {
                location: Some("上海".to_string()),
                born: Some("1990-06-15".to_string()),
                died: Some("2020-06-10".to_string()),
                ..Default::default()
            },
            websites: vec![
                Website::Url("https://example.com".to_string()),
                Website::Url("javascript:alert(1)".to_string()),
            ],
        };
        let mut record = PersonRecord::new(PersonId::new("lin").unwrap(), meta);
        record.content.push(content(
            Locale::default_locale(),
            Some("林晓"),
            "**勇敢** <script>alert(1)</script>",
        ));
        record
            .content
            .push(content(Locale::variant("en"), Some("Lin Xiao"), "Brave"));
        derive_fields(record, "css/default-avatar.svg")
    }

    #[test]
    fn test_fragment_fields() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let record = record();

        let fragment = emitter.fragment(&record, &record.content[1]);
        assert_eq!(fragment.id, "lin");
        assert_eq!(fragment.name, "Lin Xiao");
        assert_eq!(fragment.avatar_path, "photos/me.jpg");
        assert_eq!(fragment.structured_info.get("age"), Some("29"));
        assert!(fragment.bio.contains("Brave"));

        let json = serde_json::to_value(&fragment).unwrap();
        assert_eq!(json["avatarPath"], "photos/me.jpg");
        assert_eq!(json["structuredInfo"]["location"], "上海");
    }

    #[test]
    fn test_fragment_name_fallback() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let mut record = record();
        record.content[0].front_matter.name = None;

        let fragment = emitter.fragment(&record, &record.content[0]);
        assert_eq!(fragment.name, "小林");
    }

    #[test]
    fn test_person_page() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let html = emitter.person_page(&record()).unwrap().unwrap();

        assert!(html.contains("<title>林晓 - 星语铭</title>"));
        assert!(html.contains("<strong>勇敢</strong>"));
        assert!(!html.contains("alert(1)"));
        assert!(html.contains("<strong>年龄：</strong>29"));
        assert!(html.contains("<strong>地点：</strong>上海"));
        assert!(html.contains(r#"src="photos/me.jpg""#));
        assert!(html.contains("href=\"https://example.com\""));
        assert!(!html.contains("javascript:"));
        assert!(html.contains(HOTLINE));
        assert!(html.contains(r#"data-person="林晓""#));
        assert!(html.contains("../../css/style.css"));
    }

    #[test]
    fn test_person_page_escapes_name() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let mut record = record();
        record.content[0].front_matter.name = Some("<b>\"x\"</b>".to_string());

        let html = emitter.person_page(&record).unwrap().unwrap();
        assert!(html.contains("&lt;b&gt;&quot;x&quot;&lt;/b&gt;"));
        assert!(!html.contains("<b>\"x\"</b>"));
    }

    #[test]
    fn test_person_page_without_comments() {
        let emitter = PageEmitter::new(&Config::default()).unwrap();
        let html = emitter.person_page(&record()).unwrap().unwrap();

        assert!(!html.contains(r#"id="commentsList""#));
        assert!(!html.contains("api.github.com"));
        assert!(html.contains("avatar.dataset.fallback"));
    }

    #[test]
    fn test_person_page_with_comments_has_script() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let html = emitter.person_page(&record()).unwrap().unwrap();

        assert!(html.contains(r#"id="commentsList""#));
        assert!(html.contains("api.github.com"));
    }

    #[test]
    fn test_absolute_placeholder_kept() {
        let mut config = config();
        config.build.placeholder_avatar = "https://cdn.example.com/avatar.svg".to_string();
        let emitter = PageEmitter::new(&config).unwrap();

        let html = emitter.person_page(&record()).unwrap().unwrap();
        assert!(html.contains(r#"data-fallback="https://cdn.example.com/avatar.svg""#));
        assert!(!html.contains("../../https://"));
    }

    #[test]
    fn test_unpublished_record_has_no_page() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let mut record = record();
        record.content.remove(0);

        assert!(emitter.person_page(&record).unwrap().is_none());

        let out = TempDir::new().unwrap();
        assert_eq!(emitter.emit_person(&record, out.path()).unwrap(), 0);
        assert!(!out.path().join("people/lin").exists());
    }

    #[test]
    fn test_discussion_url_encoded() {
        let url = discussion_url("owner/repo", "纪念", "林 晓&").unwrap();
        let text = url.as_str();

        assert!(text.starts_with("https://github.com/owner/repo/discussions/new?category=general&title="));
        assert!(!text.contains(' '));
        assert!(!text.contains("晓&"));

        let title = url
            .query_pairs()
            .find(|(k, _)| k == "title")
            .map(|(_, v)| v.into_owned());
        assert_eq!(title.as_deref(), Some("【纪念】林 晓&"));
    }

    #[test]
    fn test_home_page() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let html = emitter.home_page().unwrap();

        assert!(html.contains(r#"id="profilesGrid""#));
        assert!(html.contains(r#"<script src="js/main.js"></script>"#));
        assert!(html.contains(r#"data-listing="people-list.json""#));
        assert!(html.contains("<html lang=\"zh-CN\">"));
        assert!(html.contains("© 2025 星语铭"));
        assert!(html.contains(HOTLINE));
        assert!(html.contains(CRISIS_LINE));
        assert!(html.contains("如何贡献"));
        assert!(html.contains("平台立场声明"));
    }

    #[test]
    fn test_emit_person_files() {
        let emitter = PageEmitter::new(&config()).unwrap();
        let out = TempDir::new().unwrap();

        let written = emitter.emit_person(&record(), out.path()).unwrap();
        assert_eq!(written, 3);

        let dir = out.path().join("people/lin");
        assert!(dir.join("info.json").is_file());
        assert!(dir.join("info.en.json").is_file());
        assert!(!dir.join("info.zh_hant.json").exists());
        assert!(dir.join("index.html").is_file());

        let fragment: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("info.json")).unwrap()).unwrap();
        assert_eq!(fragment["name"], "林晓");
        assert_eq!(fragment["websites"][0], "https://example.com");
    }

    #[test]
    fn test_info_labels() {
        assert_eq!(info_label("born"), "出生");
        assert_eq!(info_label("zodiac"), "zodiac");
    }
}
