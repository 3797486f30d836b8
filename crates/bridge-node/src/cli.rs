use std::time::Duration;

use clap::Parser;

fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Flags and environment variables for the model-serving bridge process.
/// Every flag can also be supplied as an environment variable: dashes
/// become underscores, uppercased (`--prom-address` / `PROM_ADDRESS`).
#[derive(Debug, Parser)]
#[command(name = "bridge-node", about = "Model-serving bridge control plane")]
pub struct Cli {
    /// Local working directory for scratch state.
    #[arg(long, env = "WORKING_DIR", default_value = ".")]
    pub working_dir: String,

    /// Address the Prometheus metrics scrape endpoint binds to.
    #[arg(long, env = "PROM_ADDRESS", default_value = "0.0.0.0:9184")]
    pub prom_address: String,

    /// How often the metrics registry is refreshed/collected.
    #[arg(long, env = "PROM_REFRESH", value_parser = parse_duration, default_value = "15s")]
    pub prom_refresh: Duration,

    /// Idle period between successful bucket scan passes.
    #[arg(long, env = "S3_REFRESH", value_parser = parse_duration, default_value = "30s")]
    pub s3_refresh: Duration,

    /// Kubernetes namespace the serving-config ConfigMap lives in.
    #[arg(long, env = "K8S_NAMESPACE")]
    pub k8s_namespace: Option<String>,

    /// Name of the serving-config ConfigMap (mutually exclusive with
    /// `k8s-cfg-params-mount`).
    #[arg(long, env = "K8S_CONFIGMAP")]
    pub k8s_configmap: Option<String>,

    /// Local filesystem path of a mounted serving-config file (mutually
    /// exclusive with `k8s-configmap`).
    #[arg(long, env = "K8S_CFG_PARAMS_MOUNT")]
    pub k8s_cfg_params_mount: Option<String>,

    /// Logical service name, used to label metrics and logs.
    #[arg(long, env = "SERVICE_NAME", default_value = "model-serving-bridge")]
    pub service_name: String,

    /// Name of the bucket the Bucket Scanner and TFX Reconciler operate on.
    #[arg(long, env = "BUCKET")]
    pub bucket: Option<String>,

    #[arg(long, env = "AWS_ENDPOINT")]
    pub aws_endpoint: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub aws_secret_access_key: Option<String>,

    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = "us-east-1")]
    pub aws_default_region: String,
}

impl Cli {
    pub fn initial_snapshot(&self) -> bridge_types::ConfigSnapshot {
        bridge_types::ConfigSnapshot {
            endpoint: self.aws_endpoint.clone(),
            access_key: self.aws_access_key_id.clone(),
            secret_key: self.aws_secret_access_key.clone(),
            bucket: self.bucket.clone(),
            tfx_config_fn: self.k8s_cfg_params_mount.clone(),
            tfx_config_cm: self.k8s_configmap.clone(),
        }
    }
}
