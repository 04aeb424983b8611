//! HTML helpers: escaping and the page shell shared by every page.
//!
//! Links between pages are relative. `index.html` sits at the root and uses
//! bare paths; every other page lives one directory down and gets a `../`
//! prefix, computed from the page depth.

use crate::generate::SiteOptions;
use crate::router::PageId;

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Relative prefix that climbs from a page at `depth` back to the site root.
pub fn depth_prefix(depth: usize) -> String {
    "../".repeat(depth)
}

/// A navigation link rendered in the page header after "Accueil".
#[derive(Debug, Clone)]
pub struct NavLink {
    /// Site-root relative target; receives the depth prefix.
    pub href: String,
    pub label: String,
}

/// Everything the shell needs besides the body markup.
pub struct ShellParams<'a> {
    pub depth: usize,
    /// Plain-text page title (escaped by the shell).
    pub title: &'a str,
    pub nav: &'a [NavLink],
}

/// Wrap page body markup in the site header, navigation and footer.
pub fn page_shell(site: &SiteOptions, params: &ShellParams<'_>, body: &str) -> String {
    let prefix = depth_prefix(params.depth);

    let stylesheets: String = site
        .stylesheets
        .iter()
        .map(|href| {
            format!(
                "    <link rel=\"stylesheet\" href=\"{}{}\">\n",
                prefix,
                escape(href)
            )
        })
        .collect();

    let scripts: String = site
        .scripts
        .iter()
        .map(|src| format!("    <script src=\"{}{}\"></script>\n", prefix, escape(src)))
        .collect();

    let mut nav_html = format!("<a href=\"{}index.html\">Accueil</a>", prefix);
    for link in params.nav {
        nav_html.push_str(&format!(
            " <span class=\"sep\">/</span> <a href=\"{}{}\">{}</a>",
            prefix,
            escape(&link.href),
            escape(&link.label)
        ));
    }

    let mut footer_links = Vec::new();
    if site.editorial.has_about() {
        footer_links.push((PageId::About, "À propos"));
    }
    if site.editorial.has_legal_mentions() {
        footer_links.push((PageId::LegalMentions, "Mentions légales"));
    }
    let footer_nav = if footer_links.is_empty() {
        String::new()
    } else {
        let links: Vec<String> = footer_links
            .iter()
            .map(|(id, label)| format!("<a href=\"{}{}\">{}</a>", prefix, id.href(), label))
            .collect();
        format!("<nav class=\"footer-links\">{}</nav>", links.join(" "))
    };

    let page_title = if params.title.is_empty() {
        escape(&site.title)
    } else {
        format!("{} - {}", escape(params.title), escape(&site.title))
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
{stylesheets}</head>
<body>
    <header class="site-header">
        <div class="container">
            <p class="site-title"><a href="{prefix}index.html">{site_title}</a></p>
            <nav class="site-nav">{nav_html}</nav>
        </div>
    </header>
    <main>
        <div class="container">
{body}
        </div>
    </main>
    <footer class="site-footer">
        <div class="container">{footer}{footer_nav}</div>
    </footer>
{scripts}</body>
</html>
"#,
        page_title = page_title,
        stylesheets = stylesheets,
        prefix = prefix,
        site_title = escape(&site.title),
        nav_html = nav_html,
        body = body,
        footer = site.footer_html,
        footer_nav = footer_nav,
        scripts = scripts,
    )
}
