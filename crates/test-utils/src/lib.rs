//! Shared helpers for `assetflow` tests: log capture, timeouts, and the
//! tool/image fixtures every temporary site needs. Site and config
//! builders live in [`builders`], the scripted executor in
//! [`fake_executor`].

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::io::Cursor;
use std::sync::Once;
use std::time::Duration;

use assetflow::config::ToolsSection;
use assetflow::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for one async test body. Builds spawn real `cp` processes,
/// so this is looser than a pure in-memory test would need.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Tool template that copies its input unchanged.
pub const COPY_TOOL: &str = "cp {input} {output}";

static INIT: Once = Once::new();

/// Capture `tracing` output per test. Honours `ASSETFLOW_LOG` the same
/// way the binary does (`ASSETFLOW_LOG=debug cargo test`), and stays at
/// `warn` otherwise so passing runs are quiet under `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, failing the test if it outlives [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("assetflow test did not finish within {TEST_TIMEOUT:?}"),
    }
}

/// `[tools]` where every stage is a plain `cp`, so tests need no sass,
/// terser or image optimizers on the machine.
pub fn copy_tools() -> ToolsSection {
    ToolsSection {
        sass: COPY_TOOL.to_string(),
        autoprefixer: COPY_TOOL.to_string(),
        css_minify: COPY_TOOL.to_string(),
        js_minify: COPY_TOOL.to_string(),
        gif: COPY_TOOL.to_string(),
        jpeg: COPY_TOOL.to_string(),
        png: COPY_TOOL.to_string(),
        svg: COPY_TOOL.to_string(),
        svg_sprite: COPY_TOOL.to_string(),
    }
}

/// A small valid PNG, for the image task's WebP encode.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encoding test png");
    out.into_inner()
}
