// tests/stylesheet_pipeline.rs

mod common;
use crate::common::{build, init_tracing, with_timeout};

use assetflow::context::BuildContext;
use assetflow::server::ReloadEvent;
use assetflow::tasks::TaskId;
use assetflow_test_utils::builders::SiteBuilder;

type TestResult = anyhow::Result<()>;

#[tokio::test]
async fn main_scss_yields_two_artifacts_and_partials_none() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new()
        .file("sass/main.scss", "body { color: red; }\n")
        .file("sass/_vars.scss", "$c: red;\n")
        .build()?;

    let summary = with_timeout(build(&site.context(), &[TaskId::Stylesheet])).await?;
    assert!(summary.is_success(), "{summary:?}");

    assert_eq!(site.output_files()?, vec!["css/main.css", "css/main.min.css"]);
    assert!(site.read_output("css/main.css")?.contains("color: red"));
    Ok(())
}

#[tokio::test]
async fn each_entry_point_gets_its_own_pair() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new()
        .file("sass/main.scss", "a { b: c; }\n")
        .file("sass/print.sass", "a\n  b: c\n")
        .file("sass/_mixins.scss", "")
        .build()?;

    build(&site.context(), &[TaskId::Stylesheet]).await?;

    assert_eq!(
        site.output_files()?,
        vec![
            "css/main.css",
            "css/main.min.css",
            "css/print.css",
            "css/print.min.css"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn raster_urls_get_webp_rules() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new()
        .file(
            "sass/main.scss",
            ".hero { background: url(\"../img/hero.jpg\") no-repeat; }\n",
        )
        .build()?;

    build(&site.context(), &[TaskId::Stylesheet]).await?;

    let css = site.read_output("css/main.css")?;
    assert!(css.contains("url(\"../img/hero.jpg\")"), "{css}");
    assert!(css.contains(".webp .hero"), "{css}");
    assert!(css.contains("../img/hero.webp"), "{css}");
    Ok(())
}

#[tokio::test]
async fn failing_compiler_keeps_previous_css_and_siblings_finish() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new()
        .file("sass/main.scss", "body { margin: 0; }\n")
        .file("fonts/a.woff2", "font-bytes")
        .build()?;

    build(&site.context(), &[TaskId::Stylesheet]).await?;
    let before = site.read_output("css/main.css")?;

    site.write_source("sass/main.scss", "body { margin: 1px; }\n")?;
    let mut tools = site.tools.clone();
    tools.sass = "echo 'syntax error' >&2; exit 3 # {input} {output}".to_string();
    let ctx = BuildContext::new(&site.source, &site.output, tools);
    let mut reload = ctx.reload().subscribe();

    let summary = with_timeout(build(&ctx, &[TaskId::Stylesheet, TaskId::Fonts])).await?;

    assert_eq!(summary.failed.iter().copied().collect::<Vec<_>>(), vec![TaskId::Stylesheet]);
    assert_eq!(site.read_output("css/main.css")?, before);
    assert_eq!(site.read_output("fonts/a.woff2")?, "font-bytes");

    let mut saw_failure = false;
    while let Ok(event) = reload.try_recv() {
        if let ReloadEvent::Failed { task, message } = event {
            assert_eq!(task, TaskId::Stylesheet);
            assert!(message.contains("syntax error"), "{message}");
            saw_failure = true;
        }
    }
    assert!(saw_failure);
    Ok(())
}
