//! Authentication strategies for the kubectl container

use deckhand_core::Secret;

use crate::error::{KubectlError, Result};

/// How a kubectl container reaches the cluster
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// A ready kubeconfig, mounted as is
    StaticConfig(Secret),

    /// Cloud credentials exchanged for a kubeconfig inside the container
    CloudIam {
        provider: CloudProvider,
        credentials: CloudCredentials,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudProvider {
    /// Amazon EKS, authenticated through aws-iam-authenticator / `aws eks get-token`
    Eks { cluster: String, region: String },
}

#[derive(Debug, Clone)]
pub enum CloudCredentials {
    Aws(AwsCredentials),
}

#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: Secret,
    pub secret_access_key: Secret,
    pub session_token: Option<Secret>,
}

impl AwsCredentials {
    pub const ACCESS_KEY_ID_VAR: &'static str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY_VAR: &'static str = "AWS_SECRET_ACCESS_KEY";
    pub const SESSION_TOKEN_VAR: &'static str = "AWS_SESSION_TOKEN";

    /// Read credentials from the standard AWS environment variables
    pub fn from_env() -> Result<Self> {
        let required = |var: &str| {
            Secret::from_env(var).map_err(|_| KubectlError::MissingCredential {
                name: var.to_string(),
            })
        };

        Ok(Self {
            access_key_id: required(Self::ACCESS_KEY_ID_VAR)?,
            secret_access_key: required(Self::SECRET_ACCESS_KEY_VAR)?,
            session_token: Secret::from_env(Self::SESSION_TOKEN_VAR)
                .ok()
                .filter(|s| !s.is_empty()),
        })
    }

    /// Secret environment variables to inject, in a stable order
    pub fn variables(&self) -> Vec<(&'static str, &Secret)> {
        let mut vars = vec![
            (Self::ACCESS_KEY_ID_VAR, &self.access_key_id),
            (Self::SECRET_ACCESS_KEY_VAR, &self.secret_access_key),
        ];
        if let Some(token) = &self.session_token {
            vars.push((Self::SESSION_TOKEN_VAR, token));
        }
        vars
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, secret) in [
            (Self::ACCESS_KEY_ID_VAR, &self.access_key_id),
            (Self::SECRET_ACCESS_KEY_VAR, &self.secret_access_key),
        ] {
            if secret.is_empty() {
                return Err(KubectlError::MissingCredential {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl AuthStrategy {
    /// Static kubeconfig strategy; `None` or an empty secret is an error
    pub fn static_config(kubeconfig: Option<Secret>) -> Result<Self> {
        match kubeconfig {
            Some(secret) if !secret.is_empty() => Ok(AuthStrategy::StaticConfig(secret)),
            _ => Err(KubectlError::MissingConfig),
        }
    }

    pub fn eks(
        cluster: impl Into<String>,
        region: impl Into<String>,
        credentials: AwsCredentials,
    ) -> Self {
        AuthStrategy::CloudIam {
            provider: CloudProvider::Eks {
                cluster: cluster.into(),
                region: region.into(),
            },
            credentials: CloudCredentials::Aws(credentials),
        }
    }
}
