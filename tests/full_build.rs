// tests/full_build.rs

mod common;
use crate::common::{build, init_tracing, with_timeout};

use assetflow::tasks::TaskId;
use assetflow_test_utils::builders::SiteBuilder;

type TestResult = anyhow::Result<()>;

#[tokio::test]
async fn every_task_writes_its_destination() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new()
        .file("index.html", "<body><img src=\"img/hero.jpg\" alt=\"\"></body>")
        .file("_header.html", "<header></header>")
        .file("sass/main.scss", "body{margin:0}")
        .file("img/icons/home.svg", "<svg viewBox=\"0 0 24 24\" fill=\"#000\"><path d=\"M0 0\"/></svg>")
        .png("img/hero.png")
        .file("js/app.js", "var a;")
        .file("fonts/a.woff", "woff")
        .file("contact.php", "<?php ?>")
        .file("files/cv.pdf", "pdf")
        .file("phpMailer/class.phpmailer.php", "<?php ?>")
        .build()?;

    let summary = with_timeout(build(&site.context(), &TaskId::ALL)).await?;
    assert!(summary.is_success(), "{summary:?}");
    assert_eq!(summary.invocations, TaskId::ALL.len());

    assert_eq!(
        site.output_files()?,
        vec![
            "contact.php",
            "css/main.css",
            "css/main.min.css",
            "files/cv.pdf",
            "fonts/a.woff",
            "img/hero.png",
            "img/hero.webp",
            "img/icons/home.svg",
            "index.html",
            "js/app.js",
            "js/app.min.js",
            "phpMailer/class.phpmailer.php",
            "sprite.svg",
        ]
    );

    let page = site.read_output("index.html")?;
    assert!(
        page.contains("<picture><source srcset=\"img/hero.webp\" type=\"image/webp\">"),
        "{page}"
    );

    let sprite = site.read_output("sprite.svg")?;
    assert!(sprite.contains("<svg id=\"icons--home\" viewBox=\"0 0 24 24\""), "{sprite}");
    assert!(!sprite.contains("fill=\"#000\""), "{sprite}");
    Ok(())
}

#[tokio::test]
async fn empty_source_tree_builds_nothing_and_succeeds() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new().build()?;

    let summary = build(&site.context(), &TaskId::ALL).await?;
    assert!(summary.is_success());
    assert!(site.output_files()?.is_empty());
    Ok(())
}
