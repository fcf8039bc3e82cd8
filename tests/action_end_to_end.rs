mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;

use nb_runner::cli::Cli;
use nb_runner::errors::RunnerError;
use nb_runner::runner::run_with;
use nb_runner::settings::Settings;
use nb_runner::sinks::CollectingEventSink;
use nb_runner::tools::Toolchain;

use crate::common::{init_tracing, Behaviour, FakeConverter, FakeExecutor, FakeInstaller, Shared};

struct Harness {
    _temp: tempfile::TempDir,
    temp: PathBuf,
    workspace: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("runner-temp");
        let workspace = dir.path().join("workspace");
        std::fs::create_dir_all(&temp).unwrap();
        std::fs::create_dir_all(&workspace).unwrap();
        Self {
            _temp: dir,
            temp,
            workspace,
        }
    }

    fn settings(&self, params: Option<&Path>, extra: &[&str]) -> Settings {
        let runner = json!({ "os": "Linux", "temp": self.temp }).to_string();
        let github = json!({ "workspace": self.workspace, "repository": "acme/reports" }).to_string();
        let secrets = json!({ "NOTEABLE_DOMAIN": "app.noteable.io", "NOTEABLE_TOKEN": "t0k" }).to_string();
        let config = self.workspace.join("nb-runner.yaml");
        let params = params.map(|p| p.display().to_string());

        let mut args: Vec<String> = vec![
            "nb-runner".into(),
            "--notebook".into(),
            "notebooks/weekly.ipynb".into(),
            "--runner-context".into(),
            runner,
            "--secrets".into(),
            secrets,
            "--github-context".into(),
            github,
            "--config".into(),
            config.display().to_string(),
        ];
        if let Some(p) = params {
            args.push("--params".into());
            args.push(p);
        }
        args.extend(extra.iter().map(|s| s.to_string()));

        Settings::from_cli(Cli::try_parse_from(args).unwrap()).unwrap()
    }
}

struct Fakes {
    installer: Arc<FakeInstaller>,
    executor: Arc<FakeExecutor>,
    converter: Arc<FakeConverter>,
}

impl Fakes {
    fn new(executor: FakeExecutor) -> Self {
        Self {
            installer: Arc::new(FakeInstaller::default()),
            executor: Arc::new(executor),
            converter: Arc::new(FakeConverter::default()),
        }
    }

    fn toolchain(&self) -> Toolchain {
        Toolchain {
            installer: Box::new(Shared(Arc::clone(&self.installer))),
            executor: self.executor.clone(),
            converter: Box::new(Shared(Arc::clone(&self.converter))),
        }
    }
}

fn succeed_with(metadata: serde_json::Value) -> FakeExecutor {
    FakeExecutor::new(Behaviour::Succeed {
        after: Duration::from_millis(10),
        metadata,
    })
}

#[tokio::test]
async fn absent_params_file_passes_only_injected_parameters() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(Some(&h.workspace.join("params.json")), &[]);
    let layout = settings.layout();
    let fakes = Fakes::new(succeed_with(json!({})));

    let report = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();
    assert!(report.is_success());

    let request = fakes.executor.last_request();
    let params = request.parameters();
    assert_eq!(params.len(), 2);
    assert_eq!(params["secretsPath"], json!(layout.secrets_path.display().to_string()));
    assert_eq!(params["github"]["repository"], json!("acme/reports"));

    assert_eq!(request.input_path(), Path::new("notebooks/weekly.ipynb"));
    assert_eq!(request.output_path(), h.temp.join("nb-runner").join("weekly.ipynb"));
    assert!(!request.report_mode());

    // The same map is handed to papermill through the parameters file.
    let written: serde_json::Value =
        serde_yaml::from_str(&std::fs::read_to_string(layout.parameters_file()).unwrap()).unwrap();
    assert_eq!(written["secretsPath"], params["secretsPath"]);
    assert_eq!(written["github"]["repository"], json!("acme/reports"));
}

#[tokio::test]
async fn unwritable_parameters_file_is_a_setup_failure() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &[]);
    let layout = settings.layout();
    // A directory in its place makes the write fail.
    std::fs::create_dir_all(layout.parameters_file()).unwrap();
    let fakes = Fakes::new(succeed_with(json!({})));

    let err = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap_err();

    match err {
        RunnerError::Setup(message) => assert!(message.contains("parameters file"), "{}", message),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(fakes.executor.requests.lock().unwrap().is_empty());
    assert!(!layout.secrets_path.exists());
}

#[tokio::test]
async fn user_parameters_override_injected_ones() {
    init_tracing();
    let h = Harness::new();
    let params_file = h.workspace.join("params.json");
    std::fs::write(&params_file, r#"{"week": 42, "github": "overridden"}"#).unwrap();

    let settings = h.settings(Some(&params_file), &["--is-report", "true"]);
    let layout = settings.layout();
    let fakes = Fakes::new(succeed_with(json!({})));

    run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();

    let request = fakes.executor.last_request();
    assert_eq!(request.parameters()["week"], json!(42));
    assert_eq!(request.parameters()["github"], json!("overridden"));
    assert!(request.parameters().contains_key("secretsPath"));
    assert!(request.report_mode());
}

#[tokio::test]
async fn failing_execution_reports_the_message_and_fails_the_run() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &[]);
    let layout = settings.layout();
    let fakes = Fakes::new(FakeExecutor::new(Behaviour::Fail {
        after: Duration::from_millis(10),
        message: "RuntimeError(\"boom\")".to_string(),
    }));

    let report = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(report.conversion.is_none());
    assert_eq!(fakes.converter.calls.load(Ordering::SeqCst), 0);

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, RunnerError::Execution(_)));
    assert!(err.to_string().contains("boom"));

    // Secrets are not left behind after a failure.
    assert!(!layout.secrets_path.exists());
}

#[tokio::test]
async fn execution_url_is_reported_when_present() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &["--poll", "true", "--poll-interval", "1"]);
    let layout = settings.layout();
    let fakes = Fakes::new(succeed_with(json!({ "executed_notebook_url": "https://x" })));

    let report = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.execution_url.as_deref(), Some("https://x"));
    assert_eq!(
        report.html_path(),
        Some(&h.temp.join("nb-runner").join("weekly.html"))
    );
    assert_eq!(fakes.installer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.converter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_execution_url_is_still_a_success() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &[]);
    let layout = settings.layout();
    let fakes = Fakes::new(succeed_with(json!({ "kernelspec": { "name": "python3" } })));

    let report = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.execution_url, None);
    assert!(report.into_result().is_ok());
}

#[tokio::test]
async fn conversion_failure_fails_the_run_but_keeps_the_url() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &[]);
    let layout = settings.layout();
    let mut fakes = Fakes::new(succeed_with(json!({ "executed_notebook_url": "https://x" })));
    fakes.converter = Arc::new(FakeConverter {
        fail: true,
        ..Default::default()
    });

    let report = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();

    assert!(report.execution.is_ok());
    assert_eq!(report.execution_url.as_deref(), Some("https://x"));
    assert!(matches!(report.failure(), Some(RunnerError::Conversion(_))));
}

#[tokio::test]
async fn installer_failure_aborts_before_execution() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &[]);
    let layout = settings.layout();
    let mut fakes = Fakes::new(succeed_with(json!({})));
    fakes.installer = Arc::new(FakeInstaller {
        fail: true,
        ..Default::default()
    });

    let err = run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Setup(_)));
    assert!(fakes.executor.requests.lock().unwrap().is_empty());
    assert!(!layout.secrets_path.exists());
}

#[tokio::test]
async fn skip_install_never_calls_the_installer() {
    init_tracing();
    let h = Harness::new();
    let settings = h.settings(None, &["--skip-install", "--keep-secrets"]);
    let layout = settings.layout();
    let fakes = Fakes::new(succeed_with(json!({})));

    run_with(&settings, &layout, fakes.toolchain(), Arc::new(CollectingEventSink::new()))
        .await
        .unwrap();

    assert_eq!(fakes.installer.calls.load(Ordering::SeqCst), 0);

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&layout.secrets_path).unwrap()).unwrap();
    assert_eq!(written["NOTEABLE_TOKEN"], json!("t0k"));
}
