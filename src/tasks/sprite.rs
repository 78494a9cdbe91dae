// src/tasks/sprite.rs

//! Sprite task: every SVG icon under `img/` packed into one stack-mode
//! sprite sheet at `sprite.svg`.
//!
//! A stack sprite nests each icon as an `<svg id=…>` element that is hidden
//! unless targeted by a fragment (`sprite.svg#icons--arrow`).

use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tokio::fs;
use tracing::debug;

use crate::context::{layout, BuildContext};
use crate::tasks::command::ExternalTool;
use crate::tasks::selector::{SourceFile, SourceSelector};
use crate::tasks::staging::Staging;
use crate::tasks::{TaskFuture, TaskId, TaskReport, Transform};

static PRESENTATION_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s(?:fill|stroke|style)\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap()
});
static PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>|<!DOCTYPE[^>]*>|<!--.*?-->").unwrap());
static SVG_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b([^>]*)>(.*)</svg\s*>").unwrap());
// Names are anchored on whitespace: `\b` would let `width` match inside `stroke-width`.
static VIEW_BOX_ATTR: LazyLock<Regex> = LazyLock::new(|| root_attr("viewBox"));
static WIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| root_attr("width"));
static HEIGHT_ATTR: LazyLock<Regex> = LazyLock::new(|| root_attr("height"));

fn root_attr(name: &str) -> Regex {
    Regex::new(&format!(r#"(?:^|\s){name}\s*=\s*(?:"([^"]*)"|'([^']*)')"#)).unwrap()
}

const STACK_STYLE: &str = ":root>svg{display:none}:root>svg:target{display:block}";

/// One icon ready to be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSymbol {
    pub id: String,
    pub svg: String,
}

#[derive(Debug)]
pub struct SpriteTask {
    selector: SourceSelector,
}

impl SpriteTask {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selector: SourceSelector::new(layout::IMG_DIR, &["**/*.svg"], &[])?,
        })
    }

    async fn pack(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let icons = self.inputs(ctx)?;
        if icons.is_empty() {
            return Ok(TaskReport {
                task: TaskId::Sprite,
                written: Vec::new(),
            });
        }

        let mut staging = Staging::new()?;
        let mut symbols = Vec::with_capacity(icons.len());
        for icon in &icons {
            let svg = prepare_icon(ctx, &mut staging, icon)
                .await
                .with_context(|| format!("preparing {}", icon.rel))?;
            symbols.push(SpriteSymbol {
                id: symbol_id(&icon.rel),
                svg,
            });
        }

        let sheet = pack_stack(&symbols)?;
        let target = staging.output(layout::SPRITE_FILE).await?;
        fs::write(&target, sheet)
            .await
            .with_context(|| format!("writing {}", layout::SPRITE_FILE))?;
        debug!(icons = symbols.len(), "sprite sheet packed");

        Ok(TaskReport {
            task: TaskId::Sprite,
            written: staging.commit(ctx.output_root()).await?,
        })
    }
}

impl Transform for SpriteTask {
    fn id(&self) -> TaskId {
        TaskId::Sprite
    }

    fn selectors(&self) -> Vec<&SourceSelector> {
        vec![&self.selector]
    }

    fn destination(&self) -> &'static str {
        layout::SPRITE_FILE
    }

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a> {
        Box::pin(self.pack(ctx))
    }
}

async fn prepare_icon(ctx: &BuildContext, staging: &mut Staging, icon: &SourceFile) -> Result<String> {
    let tool = ExternalTool::new("svg_sprite", &ctx.tools().svg_sprite);
    let raw = if tool.is_disabled() {
        fs::read_to_string(&icon.path).await
    } else {
        let minified = staging.scratch("icon.svg").await?;
        tool.apply(&icon.path, &minified).await?;
        fs::read_to_string(&minified).await
    }
    .with_context(|| format!("reading {:?}", icon.path))?;

    Ok(repair_escaping(&strip_presentation(&raw)))
}

/// Remove `fill`, `stroke` and `style` attributes so icons inherit colour
/// from CSS. Attributes such as `fill-rule` or `stroke-width` stay.
pub fn strip_presentation(svg: &str) -> String {
    PRESENTATION_ATTR.replace_all(svg, "").into_owned()
}

/// The minifier escapes `>` inside attribute values and text.
pub fn repair_escaping(svg: &str) -> String {
    svg.replace("&gt;", ">")
}

/// `icons/arrow-left.svg` -> `icons--arrow-left`.
pub fn symbol_id(rel: &str) -> String {
    let stem = match rel.rfind('.') {
        Some(dot) if !rel[dot..].contains('/') => &rel[..dot],
        _ => rel,
    };
    stem.replace('/', "--")
}

/// Build a stack-mode sprite sheet from prepared icons, in the given order.
pub fn pack_stack(symbols: &[SpriteSymbol]) -> Result<String> {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?><svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
    );
    out.push_str("<style>");
    out.push_str(STACK_STYLE);
    out.push_str("</style>");

    for symbol in symbols {
        let cleaned = PROLOG.replace_all(&symbol.svg, "");
        let caps = SVG_ROOT
            .captures(&cleaned)
            .ok_or_else(|| anyhow!("icon '{}' has no <svg> root element", symbol.id))?;
        let attrs = &caps[1];
        let inner = caps[2].trim();

        out.push_str(&format!(r#"<svg id="{}""#, symbol.id));
        if let Some(view_box) = view_box(attrs) {
            out.push_str(&format!(r#" viewBox="{view_box}""#));
        }
        out.push_str(r#" xmlns="http://www.w3.org/2000/svg">"#);
        out.push_str(inner);
        out.push_str("</svg>");
    }

    out.push_str("</svg>");
    Ok(out)
}

/// `viewBox` from the root attributes, falling back to `0 0 width height`.
fn view_box(attrs: &str) -> Option<String> {
    if let Some(vb) = attr_value(attrs, &VIEW_BOX_ATTR) {
        return Some(vb);
    }
    let width = attr_value(attrs, &WIDTH_ATTR)?;
    let height = attr_value(attrs, &HEIGHT_ATTR)?;
    let number = |s: &str| s.trim_end_matches("px").parse::<f64>().ok();
    Some(format!("0 0 {} {}", number(&width)?, number(&height)?))
}

fn attr_value(attrs: &str, re: &Regex) -> Option<String> {
    let caps = re.captures(attrs)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}
