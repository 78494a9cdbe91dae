// tests/partials_property.rs

use std::fs;

use assetflow::context::BuildContext;
use assetflow::tasks::{TaskRegistry, Transform};
use assetflow_test_utils::copy_tools;
use proptest::prelude::*;

/// Directories and extensions each task reads from.
const LOCATIONS: [(&str, &str); 9] = [
    ("", "html"),
    ("sass", "scss"),
    ("img", "png"),
    ("img", "svg"),
    ("js", "js"),
    ("fonts", "woff2"),
    ("", "php"),
    ("files", "txt"),
    ("phpMailer", "php"),
];

fn source_file_strategy() -> impl Strategy<Value = (usize, bool, String)> {
    (0..LOCATIONS.len(), any::<bool>(), "[a-z]{1,8}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn no_task_reads_an_underscore_partial(
        files in proptest::collection::vec(source_file_strategy(), 1..12)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app");

        for (loc, partial, stem) in &files {
            let (sub, ext) = LOCATIONS[*loc];
            let name = if *partial { format!("_{stem}.{ext}") } else { format!("{stem}.{ext}") };
            let path = if sub.is_empty() { source.join(&name) } else { source.join(sub).join(&name) };
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "x").unwrap();
        }

        let ctx = BuildContext::new(&source, dir.path().join("dist"), copy_tools());
        let registry = TaskRegistry::standard().unwrap();

        for (id, task) in registry.iter() {
            for input in task.inputs(&ctx).unwrap() {
                let file_name = input.rel.rsplit('/').next().unwrap_or(&input.rel);
                prop_assert!(
                    !file_name.starts_with('_'),
                    "task {} selected partial {}", id, input.rel
                );
            }
        }
    }

    #[test]
    fn every_regular_file_is_read_by_some_task(
        files in proptest::collection::vec(source_file_strategy(), 1..12)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app");
        let mut expected = Vec::new();

        for (loc, _, stem) in &files {
            let (sub, ext) = LOCATIONS[*loc];
            let name = format!("{stem}.{ext}");
            let rel = if sub.is_empty() { name.clone() } else { format!("{sub}/{name}") };
            let path = source.join(&rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "x").unwrap();
            expected.push(path);
        }

        let ctx = BuildContext::new(&source, dir.path().join("dist"), copy_tools());
        let registry = TaskRegistry::standard().unwrap();
        let mut read = Vec::new();
        for (_, task) in registry.iter() {
            read.extend(task.inputs(&ctx).unwrap().into_iter().map(|f| f.path));
        }

        for path in expected {
            prop_assert!(read.contains(&path), "{:?} is read by no task", path);
        }
    }
}
