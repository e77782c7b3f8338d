//! Kubectl facade

use deckhand_core::config::{
    DEFAULT_EKS_IMAGE, DEFAULT_KUBECTL_IMAGE, DEFAULT_KUBECTL_VERSION, KubectlConfig,
};
use deckhand_core::{Container, ContainerRuntime, ExecOptions, Secret};
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{AuthStrategy, CloudCredentials, CloudProvider};
use crate::error::Result;

/// Where kubectl looks for its config inside the container
pub const KUBECONFIG_PATH: &str = "/root/.kube/config";

/// Image selection for kubectl containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubectlOptions {
    /// kubectl version, used as the image tag
    pub version: String,

    /// Image repository for static kubeconfig access
    pub image: String,

    /// Image repository for EKS access; must ship kubectl and aws-cli
    pub eks_image: String,
}

impl Default for KubectlOptions {
    fn default() -> Self {
        Self {
            version: DEFAULT_KUBECTL_VERSION.to_string(),
            image: DEFAULT_KUBECTL_IMAGE.to_string(),
            eks_image: DEFAULT_EKS_IMAGE.to_string(),
        }
    }
}

impl From<&KubectlConfig> for KubectlOptions {
    fn from(config: &KubectlConfig) -> Self {
        Self {
            version: config.version.clone(),
            image: config.image.clone(),
            eks_image: config.eks_image.clone(),
        }
    }
}

/// Builds authenticated kubectl containers
#[derive(Clone)]
pub struct Kubectl {
    runtime: Arc<dyn ContainerRuntime>,
    options: KubectlOptions,
}

impl Kubectl {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self::with_options(runtime, KubectlOptions::default())
    }

    pub fn with_options(runtime: Arc<dyn ContainerRuntime>, options: KubectlOptions) -> Self {
        Self { runtime, options }
    }

    pub fn options(&self) -> &KubectlOptions {
        &self.options
    }

    /// Bind a kubeconfig secret
    ///
    /// Fails with [`KubectlError::MissingConfig`](crate::KubectlError::MissingConfig)
    /// when `kubeconfig` is `None` or empty.
    pub fn bind_config(&self, kubeconfig: Option<Secret>) -> Result<KubectlCli> {
        self.bind(AuthStrategy::static_config(kubeconfig)?)
    }

    /// Bind any authentication strategy
    pub fn bind(&self, auth: AuthStrategy) -> Result<KubectlCli> {
        let container = match auth {
            AuthStrategy::StaticConfig(kubeconfig) => self.static_container(kubeconfig),
            AuthStrategy::CloudIam {
                provider,
                credentials,
            } => match (provider, credentials) {
                (CloudProvider::Eks { cluster, region }, CloudCredentials::Aws(aws)) => {
                    aws.validate()?;
                    info!(%cluster, %region, "Binding kubectl to EKS cluster");

                    let ctr = Container::from(self.image_ref(&self.options.eks_image))
                        .with_env_variable("AWS_REGION", region.as_str());
                    let ctr = aws.variables().into_iter().fold(ctr, |ctr, (name, secret)| {
                        ctr.with_secret_variable(name, secret.clone())
                    });

                    ctr.with_exec([
                        "aws",
                        "eks",
                        "update-kubeconfig",
                        "--name",
                        cluster.as_str(),
                        "--region",
                        region.as_str(),
                    ])
                    .with_entrypoint(["/usr/bin/kubectl"])
                }
            },
        };

        Ok(KubectlCli {
            runtime: Arc::clone(&self.runtime),
            container,
        })
    }

    fn static_container(&self, kubeconfig: Secret) -> Container {
        debug!(secret = %kubeconfig.name(), "Binding kubectl to static kubeconfig");
        Container::from(self.image_ref(&self.options.image))
            .with_mounted_secret(KUBECONFIG_PATH, kubeconfig)
            .with_entrypoint(["/bin/kubectl"])
    }

    fn image_ref(&self, repository: &str) -> String {
        format!("{}:{}", repository, self.options.version)
    }
}

/// A kubectl container already configured to talk to a cluster
#[derive(Clone)]
pub struct KubectlCli {
    runtime: Arc<dyn ContainerRuntime>,
    container: Container,
}

impl KubectlCli {
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Run a kubectl subcommand and return its stdout verbatim
    ///
    /// `args` excludes the `kubectl` binary itself, e.g.
    /// `["get", "pods", "-n", "default"]`. Output that is not valid UTF-8 is
    /// an error; use [`exec_bytes`](Self::exec_bytes) for binary output.
    pub async fn exec<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        Ok(self.runtime.stdout(&self.exec_container(args)).await?)
    }

    /// Run a kubectl subcommand and return its stdout byte for byte
    pub async fn exec_bytes<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<u8>> {
        Ok(self.runtime.stdout_bytes(&self.exec_container(args)).await?)
    }

    fn exec_container<S: AsRef<str>>(&self, args: &[S]) -> Container {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        debug!(?args, "Kubectl command");

        self.container.clone().with_exec_opts(
            args,
            ExecOptions {
                use_entrypoint: true,
                ..Default::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AwsCredentials;
    use crate::error::KubectlError;
    use deckhand_core::{MockRuntime, MountSource, RuntimeError};

    fn kubeconfig() -> Secret {
        Secret::new("kubeconfig", "apiVersion: v1\nkind: Config\n")
    }

    #[test]
    fn test_bind_config_missing() {
        let runtime = MockRuntime::new();
        let kubectl = Kubectl::new(Arc::new(runtime.clone()));

        assert!(matches!(
            kubectl.bind_config(None),
            Err(KubectlError::MissingConfig)
        ));
        assert!(matches!(
            kubectl.bind_config(Some(Secret::new("empty", ""))),
            Err(KubectlError::MissingConfig)
        ));
        assert_eq!(runtime.call_count(), 0);
    }

    #[test]
    fn test_bind_config_container() {
        let kubectl = Kubectl::new(Arc::new(MockRuntime::new()));
        let cli = kubectl.bind_config(Some(kubeconfig())).unwrap();
        let ctr = cli.container();

        assert_eq!(ctr.image(), "bitnami/kubectl:1.33.0");
        assert_eq!(ctr.entrypoint(), ["/bin/kubectl"]);
        assert!(ctr.steps().is_empty());
        match &ctr.mount_at(KUBECONFIG_PATH).unwrap().source {
            MountSource::Secret(s) => assert_eq!(s, &kubeconfig()),
            other => panic!("unexpected mount: {:?}", other),
        }
    }

    #[test]
    fn test_custom_version() {
        let options = KubectlOptions {
            version: "1.30.4".into(),
            ..Default::default()
        };
        let kubectl = Kubectl::with_options(Arc::new(MockRuntime::new()), options);
        let cli = kubectl.bind_config(Some(kubeconfig())).unwrap();

        assert_eq!(cli.container().image(), "bitnami/kubectl:1.30.4");
    }

    #[tokio::test]
    async fn test_exec_passes_stdout_through() {
        let listing = "NAME                     READY   STATUS    RESTARTS   AGE\nweb-7d4b9c8f5-x2x9q      1/1     Running   0          3d\n";
        let runtime = MockRuntime::new();
        runtime.push_output(listing);

        let cli = Kubectl::new(Arc::new(runtime.clone()))
            .bind_config(Some(kubeconfig()))
            .unwrap();
        let out = cli.exec(&["get", "pods", "-n", "default"]).await.unwrap();

        assert_eq!(out, listing);

        let call = runtime.last_call().unwrap();
        let ctr = call.container();
        let step = ctr.last_step().unwrap();
        assert_eq!(step.args, ["get", "pods", "-n", "default"]);
        assert_eq!(
            step.command_line(ctr.entrypoint()),
            ["/bin/kubectl", "get", "pods", "-n", "default"]
        );
    }

    #[tokio::test]
    async fn test_exec_is_repeatable() {
        let runtime = MockRuntime::new();
        let cli = Kubectl::new(Arc::new(runtime.clone()))
            .bind_config(Some(kubeconfig()))
            .unwrap();

        cli.exec(&["version", "--client"]).await.unwrap();
        cli.exec(&["get", "ns"]).await.unwrap();

        // Each call runs a single step on a fresh copy of the bound container.
        for call in runtime.calls() {
            assert_eq!(call.container().steps().len(), 1);
        }
        assert!(cli.container().steps().is_empty());
    }

    #[tokio::test]
    async fn test_exec_failure() {
        let runtime = MockRuntime::new();
        runtime.push_failure(RuntimeError::ExecFailed {
            args: vec!["/bin/kubectl".into(), "get".into(), "pods".into()],
            exit_code: Some(1),
            stderr: "error: You must be logged in to the server (Unauthorized)".into(),
        });

        let cli = Kubectl::new(Arc::new(runtime))
            .bind_config(Some(kubeconfig()))
            .unwrap();
        let err = cli.exec(&["get", "pods"]).await.unwrap_err();

        match err {
            KubectlError::Execution(e) => assert!(e.stderr().unwrap().contains("Unauthorized")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exec_bytes_are_untouched() {
        let payload = b"\x7fELF\x02\x01\x01\xff\xfe".to_vec();
        let runtime = MockRuntime::new();
        runtime.push_output(payload.clone()).push_output(payload.clone());

        let cli = Kubectl::new(Arc::new(runtime))
            .bind_config(Some(kubeconfig()))
            .unwrap();

        let args = ["exec", "web-0", "--", "cat", "/bin/app"];
        assert_eq!(cli.exec_bytes(&args).await.unwrap(), payload);

        match cli.exec(&args).await.unwrap_err() {
            KubectlError::Execution(e) => assert!(matches!(e, RuntimeError::InvalidUtf8(_))),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_eks_container() {
        let runtime = MockRuntime::new();
        let credentials = AwsCredentials {
            access_key_id: Secret::new("id", "AKIAEXAMPLE"),
            secret_access_key: Secret::new("key", "wJalrXUtnFEMI"),
            session_token: None,
        };

        let cli = Kubectl::new(Arc::new(runtime.clone()))
            .bind(AuthStrategy::eks("prod", "eu-west-1", credentials))
            .unwrap();
        let ctr = cli.container();

        assert_eq!(ctr.image(), "alpine/k8s:1.33.0");
        assert_eq!(ctr.entrypoint(), ["/usr/bin/kubectl"]);
        assert_eq!(
            ctr.env().get("AWS_REGION").map(String::as_str),
            Some("eu-west-1")
        );
        assert!(ctr.secret_env().contains_key("AWS_ACCESS_KEY_ID"));
        assert!(ctr.secret_env().contains_key("AWS_SECRET_ACCESS_KEY"));
        assert!(!ctr.secret_env().contains_key("AWS_SESSION_TOKEN"));
        assert_eq!(
            ctr.steps()[0].args,
            ["aws", "eks", "update-kubeconfig", "--name", "prod", "--region", "eu-west-1"]
        );

        cli.exec(&["get", "nodes"]).await.unwrap();
        let call = runtime.last_call().unwrap();
        assert_eq!(call.container().steps().len(), 2);
    }

    #[test]
    fn test_eks_missing_credential() {
        let runtime = MockRuntime::new();
        let credentials = AwsCredentials {
            access_key_id: Secret::new("id", ""),
            secret_access_key: Secret::new("key", "x"),
            session_token: None,
        };

        let result = Kubectl::new(Arc::new(runtime.clone()))
            .bind(AuthStrategy::eks("prod", "eu-west-1", credentials));

        assert!(matches!(result, Err(KubectlError::MissingCredential { .. })));
        assert_eq!(runtime.call_count(), 0);
    }
}
