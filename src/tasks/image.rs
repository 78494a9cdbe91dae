// src/tasks/image.rs

//! Image task: compress every image with the tool configured for its format,
//! then re-encode raster photos (jpg, jpeg, png) to WebP next to the
//! compressed original.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;
use tokio::fs;
use tracing::debug;

use crate::config::ToolsSection;
use crate::context::{layout, BuildContext};
use crate::tasks::command::ExternalTool;
use crate::tasks::copy::join_rel;
use crate::tasks::selector::{SourceFile, SourceSelector};
use crate::tasks::staging::Staging;
use crate::tasks::{TaskFuture, TaskId, TaskReport, Transform};

/// Formats the image task understands, keyed by lowercase extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
    Svg,
    Webp,
}

impl ImageKind {
    pub fn from_path(rel: &str) -> Option<Self> {
        let ext = Path::new(rel).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gif" => Some(Self::Gif),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Whether a WebP sibling is produced in addition to the original.
    pub fn gets_webp(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }

    /// The compressor for this format; `None` means a straight copy.
    fn compressor(self, tools: &ToolsSection) -> Option<ExternalTool<'_>> {
        match self {
            Self::Gif => Some(ExternalTool::new("gif", &tools.gif)),
            Self::Jpeg => Some(ExternalTool::new("jpeg", &tools.jpeg)),
            Self::Png => Some(ExternalTool::new("png", &tools.png)),
            Self::Svg => Some(ExternalTool::new("svg", &tools.svg)),
            Self::Webp => None,
        }
    }
}

#[derive(Debug)]
pub struct ImageTask {
    selector: SourceSelector,
}

impl ImageTask {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selector: SourceSelector::new(
                layout::IMG_DIR,
                &["**/*.{svg,webp,png,jpg,jpeg,gif}"],
                &[],
            )?,
        })
    }

    async fn optimize_all(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let images = self.inputs(ctx)?;
        let mut staging = Staging::new()?;

        for img in &images {
            optimize_one(ctx.tools(), &mut staging, img)
                .await
                .with_context(|| format!("optimizing {}", img.rel))?;
        }

        Ok(TaskReport {
            task: TaskId::Image,
            written: staging.commit(ctx.output_root()).await?,
        })
    }
}

impl Transform for ImageTask {
    fn id(&self) -> TaskId {
        TaskId::Image
    }

    fn selectors(&self) -> Vec<&SourceSelector> {
        vec![&self.selector]
    }

    fn destination(&self) -> &'static str {
        layout::IMG_DIR
    }

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a> {
        Box::pin(self.optimize_all(ctx))
    }
}

async fn optimize_one(tools: &ToolsSection, staging: &mut Staging, img: &SourceFile) -> Result<()> {
    let Some(kind) = ImageKind::from_path(&img.rel) else {
        return Ok(());
    };

    let target = staging.output(&join_rel(layout::IMG_DIR, &img.rel)).await?;
    match kind.compressor(tools) {
        Some(tool) => tool.apply(&img.path, &target).await?,
        None => {
            fs::copy(&img.path, &target)
                .await
                .with_context(|| format!("copying {:?}", img.path))?;
        }
    }

    if kind.gets_webp() {
        let webp_rel = join_rel(layout::IMG_DIR, &webp_name(&img.rel));
        let webp_path = staging.output(&webp_rel).await?;
        encode_webp(img.path.clone(), webp_path).await?;
        debug!(image = %img.rel, "webp variant encoded");
    }

    Ok(())
}

/// `photos/a.JPG` -> `photos/a.webp`.
pub fn webp_name(rel: &str) -> String {
    match rel.rfind('.') {
        Some(dot) if !rel[dot..].contains('/') => format!("{}.webp", &rel[..dot]),
        _ => format!("{rel}.webp"),
    }
}

/// Decode the uncompressed source and write it as WebP. Runs on the
/// blocking pool; decoding a large photo can take a while.
async fn encode_webp(source: PathBuf, target: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let img = image::open(&source).with_context(|| format!("decoding {:?}", source))?;
        img.save_with_format(&target, ImageFormat::WebP)
            .with_context(|| format!("encoding webp {:?}", target))?;
        Ok(())
    })
    .await
    .context("webp encoder panicked")?
}
