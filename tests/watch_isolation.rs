// tests/watch_isolation.rs

mod common;
use crate::common::{build, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use assetflow::engine::RuntimeEvent;
use assetflow::fs::{FileSystem, RealFileSystem};
use assetflow::tasks::TaskId;
use assetflow::watch::{spawn_watcher, ChangeDispatcher, WatchRules};
use assetflow_test_utils::builders::{ConfigFileBuilder, Site, SiteBuilder};
use notify::event::{DataChange, EventKind, ModifyKind};
use tokio::sync::mpsc;

type TestResult = anyhow::Result<()>;

fn full_site() -> anyhow::Result<Site> {
    SiteBuilder::new()
        .file("index.html", "<html><body><img src=\"img/a.png\"></body></html>")
        .file("sass/main.scss", "p { margin: 0; }")
        .png("img/a.png")
        .file("img/icons/star.svg", "<svg viewBox=\"0 0 1 1\"><path d=\"M0 0\"/></svg>")
        .file("js/app.js", "var x;")
        .file("fonts/a.woff2", "v1")
        .file("files/doc.txt", "doc")
        .build()
}

fn dispatcher(site: &Site, rules: WatchRules) -> (ChangeDispatcher, mpsc::Receiver<RuntimeEvent>) {
    let (tx, rx) = mpsc::channel(8);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    (
        ChangeDispatcher::new(site.source.clone(), Arc::new(rules), fs, None, tx),
        rx,
    )
}

fn modified() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Content))
}

#[tokio::test]
async fn font_change_only_rebuilds_fonts() -> TestResult {
    init_tracing();
    let site = full_site()?;
    let all: Vec<TaskId> = TaskId::ALL.to_vec();
    build(&site.context(), &all).await?;

    let before_mtimes = site.output_mtimes()?;
    let before = site.output_snapshot()?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    site.write_source("fonts/a.woff2", "v2")?;

    let (d, _rx) = dispatcher(&site, WatchRules::standard()?);
    let tasks = d
        .tasks_for_change(&modified(), &site.source.join("fonts/a.woff2"))
        .await;
    assert_eq!(tasks.iter().copied().collect::<Vec<_>>(), vec![TaskId::Fonts]);

    let tasks: Vec<TaskId> = tasks.into_iter().collect();
    build(&site.context(), &tasks).await?;

    let after_mtimes = site.output_mtimes()?;
    let after = site.output_snapshot()?;
    for (rel, contents) in &before {
        if rel.starts_with("fonts/") {
            continue;
        }
        assert_eq!(after.get(rel), Some(contents), "{rel} changed");
        assert_eq!(after_mtimes.get(rel), before_mtimes.get(rel), "{rel} rewritten");
    }
    assert_eq!(site.read_output("fonts/a.woff2")?, "v2");
    Ok(())
}

#[tokio::test]
async fn partial_change_maps_to_stylesheet_and_svg_to_both_image_tasks() -> TestResult {
    init_tracing();
    let site = full_site()?;
    let (d, _rx) = dispatcher(&site, WatchRules::standard()?);

    let sass = d
        .tasks_for_change(&modified(), &site.source.join("sass/_vars.scss"))
        .await;
    assert_eq!(sass.into_iter().collect::<Vec<_>>(), vec![TaskId::Stylesheet]);

    let svg = d
        .tasks_for_change(&modified(), &site.source.join("img/icons/star.svg"))
        .await;
    assert_eq!(svg.into_iter().collect::<Vec<_>>(), vec![TaskId::Image, TaskId::Sprite]);

    let nothing = d
        .tasks_for_change(&modified(), &site.source.join("README.md"))
        .await;
    assert!(nothing.is_empty());
    Ok(())
}

#[tokio::test]
async fn configured_rules_add_to_the_standard_table() -> TestResult {
    init_tracing();
    let site = full_site()?;
    let cfg = ConfigFileBuilder::new()
        .watch_rule("partials/**/*.tpl", &["markup", "php"])
        .build();
    let (d, _rx) = dispatcher(&site, WatchRules::from_config(&cfg)?);

    let tasks = d
        .tasks_for_change(&modified(), &site.source.join("partials/head.tpl"))
        .await;
    assert_eq!(
        tasks.into_iter().collect::<Vec<_>>(),
        vec![TaskId::Markup, TaskId::ServerPages]
    );
    Ok(())
}

#[tokio::test]
async fn watcher_turns_a_file_write_into_a_trigger() -> TestResult {
    init_tracing();
    let site = full_site()?;
    let (tx, mut rx) = mpsc::channel(16);

    let _handle = spawn_watcher(
        site.source.clone(),
        Arc::new(WatchRules::standard()?),
        Arc::new(RealFileSystem),
        false,
        tx,
    )
    .await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    site.write_source("js/menu.js", "var menu;")?;

    let tasks = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(RuntimeEvent::TasksTriggered { tasks, .. }) => break tasks,
                Some(_) => continue,
                None => panic!("watcher channel closed"),
            }
        }
    })
    .await;
    assert_eq!(tasks, vec![TaskId::Script]);
    Ok(())
}
