// tests/cli_run.rs

mod common;
use crate::common::init_tracing;

use std::fs;

use assetflow::cli::CliArgs;
use assetflow::{exit, exit_code_for, run};
use assetflow_test_utils::builders::SiteBuilder;
use clap::Parser;

type TestResult = anyhow::Result<()>;

const COPY_TOOLS: &str = r#"
[tools]
sass = "cp {input} {output}"
autoprefixer = "cp {input} {output}"
css_minify = "cp {input} {output}"
js_minify = "cp {input} {output}"
gif = "cp {input} {output}"
jpeg = "cp {input} {output}"
png = "cp {input} {output}"
svg = "cp {input} {output}"
svg_sprite = "cp {input} {output}"
"#;

fn args(config: &std::path::Path, rest: &[&str]) -> CliArgs {
    let mut argv = vec!["assetflow".to_string(), "--config".to_string(), config.display().to_string()];
    argv.extend(rest.iter().map(|s| s.to_string()));
    CliArgs::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn build_command_runs_the_configured_set() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new()
        .file("sass/main.scss", "a{b:c}")
        .file("js/a.js", "var a;")
        .build()?;
    let config = site.root().join("Assetflow.toml");
    fs::write(
        &config,
        format!("[build]\ntasks = [\"stylesheet\"]\n{COPY_TOOLS}"),
    )?;

    let code = run(args(&config, &["build"])).await?;
    assert_eq!(code, exit::SUCCESS);
    assert_eq!(site.output_files()?, vec!["css/main.css", "css/main.min.css"]);
    Ok(())
}

#[tokio::test]
async fn run_command_with_clean_removes_stale_output() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new().file("js/a.js", "var a;").build()?;
    let config = site.root().join("Assetflow.toml");
    fs::write(&config, COPY_TOOLS)?;
    fs::create_dir_all(&site.output)?;
    fs::write(site.output.join("stale.txt"), "old")?;

    let code = run(args(&config, &["run", "js", "--clean"])).await?;
    assert_eq!(code, exit::SUCCESS);
    assert_eq!(site.output_files()?, vec!["js/app.js", "js/app.min.js"]);
    Ok(())
}

#[tokio::test]
async fn failing_task_exits_with_one() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new().file("js/a.js", "var a;").build()?;
    let config = site.root().join("Assetflow.toml");
    fs::write(
        &config,
        COPY_TOOLS.replace(
            "js_minify = \"cp {input} {output}\"",
            "js_minify = \"exit 3 # {input} {output}\"",
        ),
    )?;

    let code = run(args(&config, &["run", "script"])).await?;
    assert_eq!(code, exit::TASK_FAILED);
    assert!(site.output_files()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_task_exits_with_two_before_anything_runs() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new().file("js/a.js", "var a;").build()?;
    let config = site.root().join("Assetflow.toml");
    fs::write(&config, COPY_TOOLS)?;

    let err = run(args(&config, &["run", "script", "coffee"])).await.unwrap_err();
    assert_eq!(exit_code_for(&err), exit::CONFIG_ERROR);

    fs::write(
        &config,
        format!("[[watch.rule]]\npattern = \"**/*.tpl\"\ntasks = [\"nope\"]\n{COPY_TOOLS}"),
    )?;
    let err = run(args(&config, &["build"])).await.unwrap_err();
    assert_eq!(exit_code_for(&err), exit::CONFIG_ERROR);

    assert!(!site.output.exists());
    Ok(())
}

#[tokio::test]
async fn missing_config_file_is_a_config_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let err = run(args(&dir.path().join("absent.toml"), &["plan"]))
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), exit::CONFIG_ERROR);
    Ok(())
}

#[tokio::test]
async fn plan_and_clean_succeed() -> TestResult {
    let site = SiteBuilder::new().build()?;
    let config = site.root().join("Assetflow.toml");
    fs::write(&config, COPY_TOOLS)?;
    fs::create_dir_all(site.output.join("css"))?;

    assert_eq!(run(args(&config, &["plan"])).await?, exit::SUCCESS);
    assert_eq!(run(args(&config, &["clean"])).await?, exit::SUCCESS);
    assert!(!site.output.exists());
    Ok(())
}
