// src/watch/rules.rs

use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::config::{ConfigFile, WatchRuleSpec};
use crate::context::layout;
use crate::errors::PipelineError;
use crate::tasks::selector::build_globset;
use crate::tasks::{TaskId, TaskRegistry};

/// One compiled watch rule: a glob relative to the source root and the
/// tasks to run when a matching file changes.
///
/// Unlike task selectors, rules match partials too: editing `_vars.scss`
/// must rebuild the stylesheets that import it.
#[derive(Clone)]
pub struct WatchRule {
    pattern: String,
    matcher: GlobSet,
    tasks: Vec<TaskId>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("pattern", &self.pattern)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn new(pattern: &str, tasks: Vec<TaskId>) -> Result<Self> {
        let matcher = build_globset(&[pattern])
            .with_context(|| format!("building watch rule for '{pattern}'"))?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            tasks,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn matches(&self, rel: &str) -> bool {
        self.matcher.is_match(rel)
    }
}

/// The full rule table consulted for every filesystem event.
#[derive(Debug, Clone, Default)]
pub struct WatchRules {
    rules: Vec<WatchRule>,
}

impl WatchRules {
    /// The built-in rules, one or more per task.
    pub fn standard() -> Result<Self> {
        let sass = format!("{}/**/*.{{scss,sass}}", layout::SASS_DIR);
        let images = format!("{}/**/*.{{svg,webp,png,jpg,jpeg,gif}}", layout::IMG_DIR);
        let icons = format!("{}/**/*.svg", layout::IMG_DIR);
        let scripts = format!("{}/**/*.js", layout::JS_DIR);
        let fonts = format!("{}/**/*.{{ttf,woff,woff2}}", layout::FONTS_DIR);
        let files = format!("{}/**", layout::FILES_DIR);
        let mailer = format!("{}/**", layout::MAILER_DIR);

        let table: [(&str, TaskId); 10] = [
            ("**/*.html", TaskId::Markup),
            (sass.as_str(), TaskId::Stylesheet),
            (images.as_str(), TaskId::Image),
            (icons.as_str(), TaskId::Sprite),
            (layout::SPRITE_FILE, TaskId::Sprite),
            (scripts.as_str(), TaskId::Script),
            ("**/*.php", TaskId::ServerPages),
            (fonts.as_str(), TaskId::Fonts),
            (files.as_str(), TaskId::StaticFiles),
            (mailer.as_str(), TaskId::MailerAssets),
        ];

        let rules = table
            .into_iter()
            .map(|(pattern, task)| WatchRule::new(pattern, vec![task]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Append rules declared in configuration.
    pub fn with_extra(mut self, specs: &[WatchRuleSpec]) -> Result<Self> {
        for spec in specs {
            self.rules.push(WatchRule::new(&spec.pattern, spec.tasks.clone())?);
        }
        Ok(self)
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::standard()?.with_extra(cfg.watch_rules())
    }

    /// Every task a rule names must exist in the registry.
    pub fn validate(&self, registry: &TaskRegistry) -> std::result::Result<(), PipelineError> {
        for rule in &self.rules {
            for task in &rule.tasks {
                if !registry.contains(*task) {
                    return Err(PipelineError::ConfigError(format!(
                        "watch rule '{}' names task '{task}', which is not registered",
                        rule.pattern
                    )));
                }
            }
        }
        Ok(())
    }

    /// Union of the tasks of every rule matching `rel` (relative to the
    /// source root, forward slashes).
    pub fn tasks_for(&self, rel: &str) -> BTreeSet<TaskId> {
        self.rules
            .iter()
            .filter(|r| r.matches(rel))
            .flat_map(|r| r.tasks.iter().copied())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(rules: &WatchRules, rel: &str) -> Vec<TaskId> {
        rules.tasks_for(rel).into_iter().collect()
    }

    #[test]
    fn standard_rules_route_each_category() {
        let rules = WatchRules::standard().unwrap();
        assert_eq!(tasks(&rules, "index.html"), vec![TaskId::Markup]);
        assert_eq!(tasks(&rules, "blog/post.html"), vec![TaskId::Markup]);
        assert_eq!(tasks(&rules, "sass/_vars.scss"), vec![TaskId::Stylesheet]);
        assert_eq!(tasks(&rules, "img/photo.jpg"), vec![TaskId::Image]);
        assert_eq!(tasks(&rules, "img/icons/arrow.svg"), vec![TaskId::Image, TaskId::Sprite]);
        assert_eq!(tasks(&rules, "sprite.svg"), vec![TaskId::Sprite]);
        assert_eq!(tasks(&rules, "js/menu.js"), vec![TaskId::Script]);
        assert_eq!(tasks(&rules, "contact.php"), vec![TaskId::ServerPages]);
        assert_eq!(tasks(&rules, "fonts/inter.woff2"), vec![TaskId::Fonts]);
        assert_eq!(tasks(&rules, "files/price.pdf"), vec![TaskId::StaticFiles]);
    }

    #[test]
    fn vendored_php_hits_both_rules() {
        let rules = WatchRules::standard().unwrap();
        assert_eq!(
            tasks(&rules, "phpMailer/src/SMTP.php"),
            vec![TaskId::ServerPages, TaskId::MailerAssets]
        );
    }

    #[test]
    fn unrelated_paths_trigger_nothing() {
        let rules = WatchRules::standard().unwrap();
        assert!(rules.tasks_for("README.md").is_empty());
        assert!(rules.tasks_for("sass/main.css").is_empty());
        assert!(rules.tasks_for("js/lib/vendor.ts").is_empty());
    }

    #[test]
    fn extra_rules_are_unioned() {
        let rules = WatchRules::standard()
            .unwrap()
            .with_extra(&[WatchRuleSpec {
                pattern: "data/*.json".into(),
                tasks: vec![TaskId::Markup, TaskId::Script],
            }])
            .unwrap();
        assert_eq!(tasks(&rules, "data/site.json"), vec![TaskId::Markup, TaskId::Script]);
        assert!(rules.tasks_for("data/nested/site.json").is_empty());
    }

    #[test]
    fn validate_rejects_unregistered_tasks() {
        let registry = TaskRegistry::builder()
            .register(crate::tasks::copy::CopyTask::fonts().unwrap())
            .build();
        let err = WatchRules::standard().unwrap().validate(&registry).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("not registered"));
    }
}
