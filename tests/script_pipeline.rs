// tests/script_pipeline.rs

mod common;
use crate::common::{build, init_tracing};

use assetflow::tasks::TaskId;
use assetflow_test_utils::builders::SiteBuilder;

type TestResult = anyhow::Result<()>;

#[tokio::test]
async fn many_sources_make_one_bundle_and_one_minified_bundle() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new()
        .file("js/a.js", "var a = 1;")
        .file("js/b.js", "var b = 2;")
        .file("js/vendor/c.js", "var c = 3;")
        .build()?;

    let summary = build(&site.context(), &[TaskId::Script]).await?;
    assert!(summary.is_success());

    assert_eq!(site.output_files()?, vec!["js/app.js", "js/app.min.js"]);
    let bundle = site.read_output("js/app.js")?;
    let (a, b, c) = (
        bundle.find("var a").unwrap(),
        bundle.find("var b").unwrap(),
        bundle.find("var c").unwrap(),
    );
    assert!(a < b && b < c, "{bundle}");
    Ok(())
}

#[tokio::test]
async fn single_source_still_makes_two_artifacts() -> TestResult {
    init_tracing();

    let site = SiteBuilder::new().file("js/only.js", "console.log(1);").build()?;
    build(&site.context(), &[TaskId::Script]).await?;

    assert_eq!(site.output_files()?, vec!["js/app.js", "js/app.min.js"]);
    Ok(())
}
