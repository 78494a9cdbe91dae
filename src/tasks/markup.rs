// src/tasks/markup.rs

//! Markup task: HTML pages with `<img>` tags upgraded to `<picture>` so
//! browsers that understand WebP load the re-encoded image.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tokio::fs;

use crate::context::{layout, BuildContext};
use crate::tasks::selector::SourceSelector;
use crate::tasks::staging::Staging;
use crate::tasks::{TaskFuture, TaskId, TaskReport, Transform};

static PICTURE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<picture\b.*?</picture\s*>").unwrap());
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

#[derive(Debug)]
pub struct MarkupTask {
    selector: SourceSelector,
}

impl MarkupTask {
    /// Every page in the source tree except the static-files and vendored
    /// directories, which are copied verbatim by their own tasks.
    pub fn new() -> Result<Self> {
        let files = format!("{}/**", layout::FILES_DIR);
        let mailer = format!("{}/**", layout::MAILER_DIR);
        Ok(Self {
            selector: SourceSelector::new("", &["**/*.html"], &[files.as_str(), mailer.as_str()])?,
        })
    }

    async fn render_pages(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let pages = self.inputs(ctx)?;
        let mut staging = Staging::new()?;

        for page in &pages {
            let html = fs::read_to_string(&page.path)
                .await
                .with_context(|| format!("reading page {:?}", page.path))?;
            let target = staging.output(&page.rel).await?;
            fs::write(&target, rewrite_picture(&html))
                .await
                .with_context(|| format!("writing staged page {}", page.rel))?;
        }

        Ok(TaskReport {
            task: TaskId::Markup,
            written: staging.commit(ctx.output_root()).await?,
        })
    }
}

impl Transform for MarkupTask {
    fn id(&self) -> TaskId {
        TaskId::Markup
    }

    fn selectors(&self) -> Vec<&SourceSelector> {
        vec![&self.selector]
    }

    fn destination(&self) -> &'static str {
        ""
    }

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a> {
        Box::pin(self.render_pages(ctx))
    }
}

/// Wrap raster `<img>` tags in a `<picture>` with a WebP `<source>`.
///
/// Tags already inside a `<picture>` element, data URIs and non-raster
/// sources are left alone.
pub fn rewrite_picture(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    let mut last = 0;

    for block in PICTURE_BLOCK.find_iter(html) {
        out.push_str(&rewrite_imgs(&html[last..block.start()]));
        out.push_str(block.as_str());
        last = block.end();
    }
    out.push_str(&rewrite_imgs(&html[last..]));
    out
}

fn rewrite_imgs(fragment: &str) -> String {
    IMG_TAG
        .replace_all(fragment, |caps: &Captures| {
            let tag = &caps[0];
            match webp_source(tag) {
                Some(webp) => format!(
                    "<picture><source srcset=\"{webp}\" type=\"image/webp\">{tag}</picture>"
                ),
                None => tag.to_string(),
            }
        })
        .into_owned()
}

fn webp_source(img_tag: &str) -> Option<String> {
    let caps = SRC_ATTR.captures(img_tag)?;
    let src = caps.get(1).or_else(|| caps.get(2))?.as_str();
    webp_variant(src)
}

/// `images/a.jpg?v=2` -> `images/a.webp?v=2` for jpg/jpeg/png references.
pub(crate) fn webp_variant(src: &str) -> Option<String> {
    if src.starts_with("data:") {
        return None;
    }

    let (path, suffix) = match src.find(['?', '#']) {
        Some(i) => src.split_at(i),
        None => (src, ""),
    };
    let dot = path.rfind('.')?;
    let ext = path[dot + 1..].to_ascii_lowercase();
    if !matches!(ext.as_str(), "jpg" | "jpeg" | "png") {
        return None;
    }
    Some(format!("{}.webp{}", &path[..dot], suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_raster_images() {
        let html = r#"<p><img src="img/cat.jpg" alt="cat"></p>"#;
        assert_eq!(
            rewrite_picture(html),
            r#"<p><picture><source srcset="img/cat.webp" type="image/webp"><img src="img/cat.jpg" alt="cat"></picture></p>"#
        );
    }

    #[test]
    fn keeps_query_string_and_single_quotes() {
        let html = "<img class='hero' src='a/b.PNG?v=3'>";
        let out = rewrite_picture(html);
        assert!(out.contains(r#"<source srcset="a/b.webp?v=3" type="image/webp">"#), "{out}");
    }

    #[test]
    fn leaves_svg_gif_and_data_uris() {
        for html in [
            r#"<img src="logo.svg">"#,
            r#"<img src="spinner.gif">"#,
            r#"<img src="data:image/png;base64,AAAA">"#,
            r#"<img alt="no source">"#,
        ] {
            assert_eq!(rewrite_picture(html), html);
        }
    }

    #[test]
    fn existing_picture_elements_are_untouched() {
        let html = r#"<picture><source srcset="x.avif"><img src="x.jpg"></picture><img src="y.png">"#;
        let out = rewrite_picture(html);
        assert!(out.starts_with(r#"<picture><source srcset="x.avif"><img src="x.jpg"></picture>"#));
        assert!(out.ends_with(r#"<picture><source srcset="y.webp" type="image/webp"><img src="y.png"></picture>"#));
    }

    #[test]
    fn selector_skips_partials_and_copied_directories() {
        let task = MarkupTask::new().unwrap();
        assert!(task.selector.matches("index.html"));
        assert!(task.selector.matches("blog/post.html"));
        assert!(!task.selector.matches("_header.html"));
        assert!(!task.selector.matches("files/manual.html"));
        assert!(!task.selector.matches("phpMailer/examples/index.html"));
    }
}
