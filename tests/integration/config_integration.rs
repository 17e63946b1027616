//! Integration tests for configuration driving content resolution

use super::test_utils::{Dom, ROOT};
use pagemodel::{
    ConfigLoader, ConfigurationError, ContentClass, ContentDsl, ContentError, ContentOwner,
    Session, Template,
};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct SearchPage;

impl ContentClass for SearchPage {
    fn define(content: &mut ContentDsl) {
        content
            .item("box", Template::find("input"))
            .item("pinned", Template::find("input").cache(true))
            .item("spinner", Template::find(".spinner"))
            .item("results", Template::find("li"));
    }
}

fn write_workspace_config(root: &Path, file: &str, contents: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), contents).unwrap();
}

fn load(root: &Path) -> pagemodel::PageModelConfig {
    ConfigLoader::new()
        .workspace(root)
        .without_global()
        .without_env_vars()
        .build()
        .unwrap()
}

fn document() -> std::sync::Arc<Dom> {
    let dom = Dom::new();
    dom.add(ROOT, "input");
    dom
}

#[test]
fn test_template_defaults_from_workspace_config() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        "pagemodel.toml",
        r#"
[defaults]
cache = false
required = false
"#,
    );

    let dom = document();
    let session = Session::builder(dom.document())
        .config(load(temp_dir.path()))
        .build()
        .unwrap();
    let page = session.page::<SearchPage>().unwrap();

    let first = page.content("box").unwrap();
    let second = page.content("box").unwrap();
    assert!(!first.same_as(&second));
    assert!(!page.is_cached("box"));

    // declared options still win over configured defaults
    let pinned = page.content("pinned").unwrap();
    assert!(pinned.same_as(&page.content("pinned").unwrap()));

    assert!(page.content("spinner").unwrap().is_absent());
}

#[test]
fn test_default_wait_preset_from_environment_file() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        "pagemodel.toml",
        r#"
[waiting]
retry_interval = 0.01

[waiting.presets.ci]
timeout = 0.08
"#,
    );
    write_workspace_config(
        temp_dir.path(),
        "pagemodel.ci.toml",
        r#"
[defaults]
wait = "ci"
"#,
    );

    let config = ConfigLoader::new()
        .workspace(temp_dir.path())
        .environment("ci")
        .without_global()
        .without_env_vars()
        .build()
        .unwrap();

    let dom = document();
    let session = Session::builder(dom.document())
        .config(config)
        .build()
        .unwrap();
    let page = session.page::<SearchPage>().unwrap();

    let start = Instant::now();
    let err = page.content("results").unwrap_err();
    assert!(matches!(err, ContentError::WaitTimeout { .. }));
    assert!(start.elapsed() >= Duration::from_millis(80));
}

#[test]
fn test_invalid_configuration_reports_every_problem() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        "pagemodel.toml",
        r#"
[waiting]
timeout = -1.0
retry_interval = 0.0

[defaults]
min = 3
max = 1
wait = "missing"
"#,
    );

    let err = ConfigLoader::new()
        .workspace(temp_dir.path())
        .without_global()
        .without_env_vars()
        .build()
        .unwrap_err();

    match err {
        ConfigurationError::Invalid(errors) => assert_eq!(errors.len(), 4),
        other => panic!("expected validation failure, got {other:?}"),
    }
}
