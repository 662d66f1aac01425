//! HTML templates for the memorial pages.
//!
//! A small `{{ variable }}` interpolation scheme. Text values are escaped when
//! they enter a [`TemplateContext`]; only values inserted through
//! [`TemplateContext::insert_html`] reach the page verbatim.

use std::collections::HashMap;

use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A placeholder without a value and without the `?` marker.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    #[error("template not found: {0}")]
    NotFound(String),

    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Values available to a template, already safe for HTML.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert plain text; it is HTML-escaped.
    pub fn insert(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        self.variables
            .insert(key.into(), html_escape(value.as_ref()));
    }

    /// Insert markup that is already safe to embed.
    pub fn insert_html(&mut self, key: impl Into<String>, html: impl Into<String>) {
        self.variables.insert(key.into(), html.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder form of [`insert_html`](Self::insert_html).
    #[must_use]
    pub fn with_html(mut self, key: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert_html(key, html);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// A named template.
///
/// `{{ name }}` requires a value, `{{ name? }}` renders as empty when unset.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Render with `context`. Substituted values are never re-scanned.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            let close = after_open.find("}}").ok_or_else(|| {
                TemplateError::InvalidSyntax(format!("unclosed {{{{ in template {}", self.name))
            })?;

            let placeholder = after_open[..close].trim();
            let (key, optional) = match placeholder.strip_suffix('?') {
                Some(key) => (key.trim_end(), true),
                None => (placeholder, false),
            };

            match context.get(key) {
                Some(value) => out.push_str(value),
                None if optional => {}
                None => return Err(TemplateError::MissingVariable(key.to_string())),
            }

            rest = &after_open[close + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Templates by name, pre-loaded with the built-in set.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// A registry holding the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Template::new("base", BASE_TEMPLATE));
        registry.register(Template::new("person", PERSON_TEMPLATE));
        registry.register(Template::new("memories", MEMORIES_TEMPLATE));
        registry.register(Template::new("home", HOME_TEMPLATE));
        registry
    }

    /// Add or replace a template.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
            .render(context)
    }
}

/// Escape text for use in element content and quoted attributes.
#[must_use]
pub fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Page chrome shared by every page. `root` is the relative path back to the
/// site root, e.g. `../../` for person pages.
pub const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <meta name="description" content="{{ description? }}">
    <link rel="stylesheet" href="{{ root }}css/style.css">
    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link href="https://fonts.googleapis.com/css2?family=Noto+Sans+SC:wght@300;400;500&display=swap" rel="stylesheet">
</head>
<body>
    <header>
        <nav>
            <div class="logo">{{ site_title }}</div>
            <ul class="nav-links">
                <li><a href="{{ root }}index.html">主页</a></li>
                <li><a href="{{ root }}about.html">关于我们</a></li>
            </ul>
        </nav>
    </header>
    <main>
        <div class="container">
{{ content }}
        </div>
    </main>
    <footer>
        <p>{{ footer }}</p>
    </footer>
{{ scripts? }}
</body>
</html>
"#;

/// Body of a person's detail page.
pub const PERSON_TEMPLATE: &str = r#"            <section class="profile-header">
                <img src="{{ avatar }}" alt="{{ name }}" class="profile-avatar-large" data-fallback="{{ placeholder }}">
                <h1>{{ name }}</h1>
                <p class="profile-description">{{ description? }}</p>
                <div class="profile-info">{{ info }}</div>
{{ websites? }}
            </section>
            <section class="profile-bio-section">
                <h2>生平介绍</h2>
                <div class="profile-bio">{{ bio }}</div>
            </section>
{{ memories? }}
            <section class="prevention-section">
                <h3>🌟 请记住</h3>
                <p>如果您正在经历困难时期，请不要犹豫寻求帮助。</p>
                <p>全国心理援助热线：<strong>{{ hotline }}</strong></p>
            </section>"#;

/// Comment mount point. The widget script reads the data attributes.
pub const MEMORIES_TEMPLATE: &str = r#"            <section class="memories-section">
                <h2>回忆与祝福</h2>
                <div id="commentsList" data-repo="{{ comment_repo }}" data-label="{{ comment_label }}" data-person="{{ name }}"></div>
                <div class="add-memory-form">
                    <h3>发表回忆</h3>
                    <p>由于是静态网站，评论功能需要 GitHub 账号</p>
                    <a href="{{ discussion_url }}" target="_blank" rel="noopener" class="btn">💬 在 GitHub 发表评论</a>
                </div>
            </section>"#;

/// Home page body. `#profilesGrid` is filled by `js/main.js` from the listing.
pub const HOME_TEMPLATE: &str = r#"            <section class="intro-section">
                <h2>{{ site_title }} · 自介</h2>
                <div class="intro-content">
                    <p>你好。我们是「星语铭」（engrave.ren）——一座以星光为墨、以记忆为碑的数字花园。</p>
                    <p>铭，是雕刻时光的温柔抵抗。</p>
                    <p>当现实中的痕迹随风雨淡去，我们选择将那些珍贵的存在，一寸一寸铭刻进永恒。不是用大理石，而是用你我共同的记忆；不是刻在墓碑上，而是刻进每一次被想起的微光里。engrave.ren——"人"在此相聚，"仁"在此长存。每一个名字，都值得被郑重镌刻；每一段生命，都配得上不被遗忘的尊严。</p>
                    <p>星语，是逝者化作星辰后的低语。</p>
                    <p>他们或许已隐入夜空，却从未真正离去。当月光漫过窗台，当风铃轻响，当某段旋律忽然浮现——那是他们在星海彼端，以光年为尺，向我们传递的絮语。尤其是那些因世界尚未温柔而早逝的跨性别同伴，那些以盟友之名默默守护的同行者：现实中的墓碑或许未能刻下他们认同的名字，但在这里，每一颗星辰都将以本真的模样闪耀，每一句低语都将被完整聆听。</p>
                    <p>我们相信：<br>存在，从不取决于肉身是否在场；<br>联结，亦无需地理或血缘的证明。</p>
                    <p>若一段对话曾照亮你的长夜，若一个笑容曾抚平你的褶皱——这份温暖本身，已是生命最真实的印记。</p>
                    <p>作为守夜人，我们以克莱因蓝的静谧为底色，轻轻拂去时光的尘埃，让每一段故事安然栖居。这里没有哀恸的挽歌，只有月光下的轻声叙说；没有黑暗的终点，只有星光铺就的归途。</p>
                    <p>请记住：<br>你怀念的，从未消失；<br>你铭刻的，终将永恒。</p>
                    <p>当万千星辰低语，我们在此回应——<br>"我听见了。我一直记得。"</p>
                    <p>—— 星语铭纪念计划 · 守夜人</p>
                    <p>愿所有灵魂，终将在没有黑暗的地方重逢</p>
                </div>
            </section>
            <div class="warning-box">
                <h3>⚠ 重要声明与使用须知</h3>
                <h4>一、内容性质与用户责任</h4>
                <p>本网站（engrave.ren）为非营利性数字纪念平台，所有内容均基于公开渠道整理，旨在为逝者留存人文记忆。您在浏览或提交内容前，请知悉并同意：</p>
                <ul>
                    <li>部分逝者生平涉及性暴力、家庭暴力、药物滥用、自残、自杀等创伤性经历，相关内容可能引发强烈情绪反应。若您感到不适，请立即停止浏览并寻求专业心理支持（文末提供援助资源）。</li>
                    <li>未成年人请在监护人陪同下访问本页。监护人应评估内容适宜性并承担监护责任。</li>
                    <li>您提交的回忆、照片等内容，须确保已获得相关权利人授权或属于合理使用范畴。因内容侵权引发的纠纷由提交者自行承担法律责任。</li>
                </ul>
                <h4>二、内容来源与版权说明</h4>
                <p>本页内容整理原则如下：</p>
                <ul>
                    <li>所有资料均来源于新闻媒体、社交媒体等长期可公开检索的渠道，不涉及未公开的隐私信息或需特别授权的敏感数据。</li>
                    <li>人物生平介绍经多方信源交叉验证，但无法保证100%准确。若您发现事实性错误，请联系我们修正。</li>
                    <li>肖像及文字内容的使用遵循《中华人民共和国著作权法》第二十四条关于"为介绍、评论某一作品或说明某一问题"的合理使用原则。权利人如需删除/修改内容，请提供身份证明及权属证明联系我们，我们将在48小时内响应。</li>
                </ul>
                <h4>三、平台立场声明</h4>
                <ul>
                    <li>本页仅为纪念空间，不对逝者生前行为进行道德评判或法律定性，亦不构成对其行为的背书、鼓励或美化。</li>
                    <li>我们尊重每一位逝者的人格尊严，尤其关注因性别认同、性取向等遭受不公的群体。页面呈现的姓名、代称均以逝者生前公开表达或亲友确认为准。</li>
                    <li>平台严格遵守中国法律法规，所有内容均通过人工审核。如监管部门要求删除特定内容，我们将依法配合处理。</li>
                </ul>
            </div>
            <section class="search-section">
                <form class="search-form" id="searchForm">
                    <input type="text" class="search-input" id="searchInput" placeholder="搜索姓名、昵称...">
                    <button type="submit" class="btn">搜索</button>
                </form>
            </section>
            <section class="profiles-grid" id="profilesGrid" data-listing="{{ listing_file }}"></section>
            <section class="prevention-section">
                <h3>🌟 自杀预防与心理援助资源</h3>
                <p>如果您正在经历困难时期，请记住您不是一个人。以下资源可以为您提供帮助：</p>
                <div class="prevention-resources">
                    <div class="resource-card">
                        <h4>📞 紧急热线</h4>
                        <p>全国心理援助热线：<strong>{{ hotline }}</strong></p>
                        <p>北京心理危机研究与干预中心：<strong>{{ crisis_line }}</strong></p>
                    </div>
                    <div class="resource-card">
                        <h4>🏥 医疗帮助</h4>
                        <p>请及时就医，寻求专业心理咨询师或精神科医生的帮助</p>
                    </div>
                    <div class="resource-card">
                        <h4>👥 社区支持</h4>
                        <p>联系当地心理健康中心、社区服务中心或宗教组织</p>
                    </div>
                </div>
            </section>
            <section class="intro-section">
                <h3>🤝 如何贡献</h3>
                <p>如果您希望为星语铭贡献内容或提供帮助，请通过以下方式联系我：</p>
                <p class="contact-links">
                    <a href="https://qm.qq.com/q/46Lb5fAm36" class="btn">QQ联系</a>
                    <a href="https://x.com/novihare" class="btn">推特联系</a>
                </p>
            </section>"#;

/// Script tag of the home page.
pub const HOME_SCRIPTS: &str = r#"    <script src="js/main.js"></script>"#;

/// Inline script of person pages: swaps a broken avatar for the placeholder.
pub const PERSON_SCRIPTS: &str = r#"    <script>
    (function () {
        var avatar = document.querySelector('.profile-avatar-large');
        if (!avatar) return;
        var fallback = function () {
            avatar.removeEventListener('error', fallback);
            avatar.src = avatar.dataset.fallback;
        };
        avatar.addEventListener('error', fallback);
        if (avatar.complete && avatar.naturalWidth === 0) fallback();
    })();
    </script>"#;

/// Inline script filling the comment list, only emitted with
/// [`MEMORIES_TEMPLATE`].
///
/// Contains no interpolated values; everything page-specific comes from data
/// attributes and comment text is inserted as text only.
pub const COMMENTS_SCRIPTS: &str = r#"    <script>
    (function () {
        var list = document.getElementById('commentsList');
        if (!list) return;

        function note(text) {
            var p = document.createElement('p');
            p.className = 'memory-note';
            p.textContent = text;
            list.replaceChildren(p);
        }

        var url = 'https://api.github.com/repos/' + list.dataset.repo +
            '/issues?labels=' + encodeURIComponent(list.dataset.label);
        fetch(url)
            .then(function (response) {
                if (!response.ok) throw new Error('failed to load');
                return response.json();
            })
            .then(function (issues) {
                var person = list.dataset.person;
                var matching = issues.filter(function (issue) {
                    return issue.title.indexOf(person) !== -1;
                });
                if (matching.length === 0) {
                    note('暂无回忆，快来发表第一条吧！');
                    return;
                }
                list.replaceChildren.apply(list, matching.map(function (issue) {
                    var item = document.createElement('div');
                    item.className = 'memory-item';
                    var body = document.createElement('p');
                    body.textContent = issue.body || '';
                    var meta = document.createElement('small');
                    meta.textContent = '—— ' + issue.user.login + ' · ' +
                        new Date(issue.created_at).toLocaleDateString(document.documentElement.lang);
                    item.append(body, meta);
                    return item;
                }));
            })
            .catch(function () {
                note('加载评论失败，请直接在 GitHub 发表评论');
            });
    })();
    </script>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_interpolation() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let ctx = TemplateContext::new().with_var("name", "World");

        assert_eq!(template.render(&ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_text_is_escaped() {
        let template = Template::new("test", "<p>{{ name }}</p>");
        let ctx = TemplateContext::new().with_var("name", "<script>alert('x')</script>");

        assert_eq!(
            template.render(&ctx).unwrap(),
            "<p>&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_html_is_verbatim() {
        let template = Template::new("test", "<div>{{ bio }}</div>");
        let ctx = TemplateContext::new().with_html("bio", "<p><em>hi</em></p>");

        assert_eq!(template.render(&ctx).unwrap(), "<div><p><em>hi</em></p></div>");
    }

    #[test]
    fn test_optional_variable() {
        let template = Template::new("test", "a{{ missing? }}b{{ present ? }}");
        let ctx = TemplateContext::new().with_var("present", "c");

        assert_eq!(template.render(&ctx).unwrap(), "abc");
    }

    #[test]
    fn test_missing_required_variable() {
        let template = Template::new("test", "{{ required }}");
        let result = template.render(&TemplateContext::new());

        assert!(matches!(result, Err(TemplateError::MissingVariable(v)) if v == "required"));
    }

    #[test]
    fn test_unclosed_placeholder() {
        let template = Template::new("test", "{{ open");
        assert!(matches!(
            template.render(&TemplateContext::new()),
            Err(TemplateError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_values_not_rescanned() {
        let template = Template::new("test", "{{ a }}");
        let ctx = TemplateContext::new().with_html("a", "{{ b }}");

        assert_eq!(template.render(&ctx).unwrap(), "{{ b }}");
    }

    #[test]
    fn test_registry_has_builtins() {
        let registry = TemplateRegistry::new();
        for name in ["base", "person", "memories", "home"] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
        assert!(matches!(
            registry.render("nope", &TemplateContext::new()),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_registry_override() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new("home", "custom {{ site_title }}"));

        let ctx = TemplateContext::new().with_var("site_title", "星语铭");
        assert_eq!(registry.render("home", &ctx).unwrap(), "custom 星语铭");
    }

    #[test]
    fn test_scripts_have_no_placeholders() {
        assert!(!PERSON_SCRIPTS.contains("{{"));
        assert!(!COMMENTS_SCRIPTS.contains("{{"));
        assert!(!HOME_SCRIPTS.contains("{{"));
    }

    #[test]
    fn test_comment_script_separate_from_person_script() {
        assert!(!PERSON_SCRIPTS.contains("commentsList"));
        assert!(COMMENTS_SCRIPTS.contains("commentsList"));
    }
}
