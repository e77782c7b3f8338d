//! Helm facade

use deckhand_core::config::DEFAULT_HELM_IMAGE;
use deckhand_core::{Container, ContainerRuntime, Directory, ExecOptions, File};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chart::ChartMetadata;
use crate::error::{HelmError, Result};
use crate::values::ValuesSource;

/// Where the chart directory is mounted inside the container
pub const WORK_DIR: &str = "/tmp/workdir";

/// Where the rendered manifest is written inside the container
pub const OUTPUT_DIR: &str = "/tmp";

/// Variables that would point helm at state outside the container
const SCRUBBED_ENV: [&str; 2] = ["HELM_HOME", "HELM_REGISTRY_CONFIG"];

/// Renders charts with the Helm CLI inside a container
#[derive(Clone)]
pub struct Helm {
    runtime: Arc<dyn ContainerRuntime>,
    base: Container,
}

impl Helm {
    /// Create the facade
    ///
    /// Without `base`, the default Helm image is used as is. A custom base is
    /// first checked by running `helm version` in it.
    pub async fn new(runtime: Arc<dyn ContainerRuntime>, base: Option<Container>) -> Result<Self> {
        let base = match base {
            None => Self::default_image(),
            Some(base) => {
                info!(image = %base.image(), "Checking custom helm base image");
                runtime
                    .sync(&base.clone().with_exec(["helm", "version"]))
                    .await
                    .map_err(HelmError::InvalidBase)?;
                base
            }
        };

        let base = SCRUBBED_ENV
            .iter()
            .fold(base.with_user("root"), |ctr, var| ctr.without_env_variable(*var));

        Ok(Self { runtime, base })
    }

    pub fn default_image() -> Container {
        Container::from(DEFAULT_HELM_IMAGE)
    }

    /// The configured base, before any chart is mounted
    pub fn base(&self) -> &Container {
        &self.base
    }

    /// Render `dir` with in-chart `values` and external `values_ext` files
    ///
    /// External files override in-chart ones. The result is a single manifest
    /// named `<name>-<version>.yaml` after the chart.
    pub async fn template<S: AsRef<str>>(
        &self,
        dir: &Directory,
        values: &[S],
        values_ext: Vec<File>,
    ) -> Result<File> {
        let source = ValuesSource::new()
            .in_chart(values.iter().map(|v| v.as_ref().to_string()))
            .external(values_ext);
        self.template_with(dir, &source).await
    }

    /// Render `dir` with an explicit values source
    pub async fn template_with(&self, dir: &Directory, source: &ValuesSource) -> Result<File> {
        let chart = ChartMetadata::resolve(dir)?;
        info!(
            chart = %chart.name,
            version = %chart.version,
            dependencies = chart.dependencies.len(),
            "Rendering chart"
        );

        let (ctr, output) = self.template_container(dir, &chart, source);
        let file = self.runtime.file(&ctr, &output).await?;

        debug!(file = %file.name(), bytes = file.contents().len(), "Rendered manifest");
        Ok(file)
    }

    /// Build the render container and the path its manifest is written to
    fn template_container(
        &self,
        dir: &Directory,
        chart: &ChartMetadata,
        source: &ValuesSource,
    ) -> (Container, String) {
        let ctr = self
            .base
            .clone()
            .with_mounted_directory(WORK_DIR, dir.clone())
            .with_workdir(WORK_DIR);

        let (ctr, flags) = source.apply(ctr);

        let mut cmd: Vec<String> = vec!["helm".into(), "template".into(), ".".into()];
        cmd.extend(flags);

        let output = format!("{}/{}", OUTPUT_DIR, chart.rendered_file_name());
        debug!(?cmd, %output, "Helm template command");

        let ctr = ctr.with_exec(["helm", "dependency", "build"]).with_exec_opts(
            cmd,
            ExecOptions {
                redirect_stdout: Some(output.clone()),
                ..Default::default()
            },
        );

        (ctr, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use deckhand_core::{MockRuntime, MountSource, RuntimeCall, RuntimeError};
    use tempfile::TempDir;

    fn chart_dir(chart_yaml: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Chart.yaml"), chart_yaml).unwrap();
        std::fs::write(dir.path().join("values.yaml"), "replicas: 1\n").unwrap();
        dir
    }

    async fn helm(runtime: &MockRuntime) -> Helm {
        Helm::new(Arc::new(runtime.clone()), None).await.unwrap()
    }

    #[tokio::test]
    async fn test_default_base_needs_no_runtime_call() {
        let runtime = MockRuntime::new();
        let helm = helm(&runtime).await;

        assert_eq!(runtime.call_count(), 0);
        assert_eq!(helm.base().image(), "alpine/helm:3.17");
        assert_eq!(helm.base().user(), Some("root"));
        assert_eq!(helm.base().removed_env(), ["HELM_HOME", "HELM_REGISTRY_CONFIG"]);
    }

    #[tokio::test]
    async fn test_custom_base_is_verified() {
        let runtime = MockRuntime::new();
        let base = Container::from("registry.local/helm:custom");
        let helm = Helm::new(Arc::new(runtime.clone()), Some(base)).await.unwrap();

        assert_eq!(helm.base().image(), "registry.local/helm:custom");
        let call = runtime.last_call().unwrap();
        assert_eq!(call.container().last_step().unwrap().args, ["helm", "version"]);
        // The verification step does not leak into the base.
        assert!(helm.base().steps().is_empty());
    }

    #[tokio::test]
    async fn test_custom_base_without_helm() {
        let runtime = MockRuntime::new();
        runtime.push_failure(RuntimeError::ExecFailed {
            args: vec!["helm".into(), "version".into()],
            exit_code: Some(127),
            stderr: "helm: not found".into(),
        });

        let result = Helm::new(Arc::new(runtime), Some(Container::from("alpine:3"))).await;
        assert!(matches!(result, Err(HelmError::InvalidBase(_))));
    }

    #[tokio::test]
    async fn test_template_builds_expected_container() {
        let dir = chart_dir("apiVersion: v2\nname: App\nversion: 1.0.0\n");
        let runtime = MockRuntime::new();
        runtime.push_output("kind: Deployment\n");
        let helm = helm(&runtime).await;

        let file = helm
            .template(
                &Directory::open(dir.path()).unwrap(),
                &["values.yaml", "values-ci.yaml"],
                vec![File::new("values.yaml", "replicas: 5\n")],
            )
            .await
            .unwrap();

        assert_eq!(file.name(), "app-1.0.0.yaml");
        assert_eq!(file.contents_str(), "kind: Deployment\n");

        let RuntimeCall::File { container, path } = runtime.last_call().unwrap() else {
            panic!("expected a file request");
        };
        assert_eq!(path, "/tmp/app-1.0.0.yaml");
        assert_eq!(container.workdir(), Some(WORK_DIR));

        let steps = container.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].args, ["helm", "dependency", "build"]);
        insta::assert_snapshot!(
            steps[1].args.join(" "),
            @"helm template . --values values.yaml --values values-ci.yaml --values /tmp/values/values-1.yaml"
        );
        assert_eq!(
            steps[1].options.redirect_stdout.as_deref(),
            Some("/tmp/app-1.0.0.yaml")
        );

        match &container.mount_at(WORK_DIR).unwrap().source {
            MountSource::Directory(d) => assert_eq!(d.path(), dir.path()),
            other => panic!("unexpected mount: {:?}", other),
        }
        match &container.mount_at("/tmp/values/values-1.yaml").unwrap().source {
            MountSource::File(f) => assert_eq!(f.contents_str(), "replicas: 5\n"),
            other => panic!("unexpected mount: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_template_flag_order_many_files() {
        let dir = chart_dir("name: app\nversion: 2.0.0\n");
        let runtime = MockRuntime::new();
        let helm = helm(&runtime).await;

        let in_chart = ["a.yaml", "b.yaml", "c.yaml"];
        let external = vec![
            File::new("x.yaml", "x: 1"),
            File::new("a.yaml", "a: 2"),
        ];
        helm.template(&Directory::open(dir.path()).unwrap(), &in_chart, external)
            .await
            .unwrap();

        let call = runtime.last_call().unwrap();
        let args = &call.container().last_step().unwrap().args;
        let value_args: Vec<&str> = args
            .iter()
            .skip(3)
            .filter(|a| a.as_str() != "--values")
            .map(String::as_str)
            .collect();

        assert_eq!(
            value_args,
            ["a.yaml", "b.yaml", "c.yaml", "/tmp/values/values-1.yaml", "/tmp/values/values-2.yaml"]
        );
    }

    #[tokio::test]
    async fn test_output_never_shadows_staged_values() {
        // Renders to `values-1.yaml`, the name external file 1 is staged under.
        let dir = chart_dir("name: Values\nversion: \"1\"\n");
        let runtime = MockRuntime::new();
        let helm = helm(&runtime).await;

        helm.template::<&str>(
            &Directory::open(dir.path()).unwrap(),
            &[],
            vec![File::new("override.yaml", "replicas: 3\n")],
        )
        .await
        .unwrap();

        let RuntimeCall::File { container, path } = runtime.last_call().unwrap() else {
            panic!("expected a file request");
        };
        assert_eq!(path, "/tmp/values-1.yaml");
        assert!(container.mount_at(&path).is_none());
        assert!(container.mount_at("/tmp/values/values-1.yaml").is_some());
    }

    #[tokio::test]
    async fn test_template_without_values() {
        let dir = chart_dir("name: app\nversion: 1.0.0\n");
        let runtime = MockRuntime::new();
        let helm = helm(&runtime).await;

        helm.template::<&str>(&Directory::open(dir.path()).unwrap(), &[], Vec::new())
            .await
            .unwrap();

        let call = runtime.last_call().unwrap();
        assert_eq!(
            call.container().last_step().unwrap().args,
            ["helm", "template", "."]
        );
    }

    #[tokio::test]
    async fn test_template_missing_chart_makes_no_call() {
        let dir = TempDir::new().unwrap();
        let runtime = MockRuntime::new();
        let helm = helm(&runtime).await;

        let err = helm
            .template(&Directory::open(dir.path()).unwrap(), &["values.yaml"], Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HelmError::Metadata(ChartError::NotFound { .. })));
        assert_eq!(runtime.call_count(), 0);
    }

    #[tokio::test]
    async fn test_template_render_failure_propagates_stderr() {
        let dir = chart_dir("name: app\nversion: 1.0.0\n");
        let runtime = MockRuntime::new();
        runtime.push_failure(RuntimeError::ExecFailed {
            args: vec!["helm".into(), "template".into(), ".".into()],
            exit_code: Some(1),
            stderr: "Error: parse error at (app/templates/svc.yaml:3)".into(),
        });
        let helm = helm(&runtime).await;

        let err = helm
            .template::<&str>(&Directory::open(dir.path()).unwrap(), &[], Vec::new())
            .await
            .unwrap_err();

        match err {
            HelmError::Execution(e) => assert!(e.stderr().unwrap().contains("parse error")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
