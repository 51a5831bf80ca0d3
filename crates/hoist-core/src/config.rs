use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::probe::ProbeErrorPolicy;

/// File name of the optional project configuration.
pub const CONFIG_FILE: &str = "hoist.toml";

/// hoist.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoistConfig {
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub function: FunctionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Repository name (defaults to the function name)
    pub name: Option<String>,
    /// Image tag
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Target platform passed to `docker buildx build --platform`
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Bypass the build cache
    #[serde(default)]
    pub no_cache: bool,
    /// Build descriptor, relative to the working directory
    #[serde(default = "default_descriptor")]
    pub descriptor: String,
    /// Name of the buildx builder context
    #[serde(default = "default_builder")]
    pub builder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region (defaults to us-east-1)
    #[serde(default = "default_region")]
    pub region: String,
    /// AWS account ID (looked up through STS when omitted)
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Lambda function name
    #[serde(default = "default_function_name")]
    pub name: String,
    /// Execution role name or full ARN
    #[serde(default = "default_role")]
    pub role: String,
    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    /// Memory size in MB
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    /// What to do when an existence check fails for a reason other than "not found"
    #[serde(default)]
    pub probe_errors: ProbeErrorPolicy,
    /// Secret references exposed to the function, keyed by environment variable.
    /// Each entry can be overridden by an environment variable of the same name.
    #[serde(default = "default_secrets")]
    pub secrets: BTreeMap<String, String>,
    /// Static environment variables set on the function.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: None,
            tag: default_tag(),
            platform: default_platform(),
            no_cache: false,
            descriptor: default_descriptor(),
            builder: default_builder(),
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            account_id: None,
        }
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            name: default_function_name(),
            role: default_role(),
            timeout: default_timeout(),
            memory_size: default_memory_size(),
            probe_errors: ProbeErrorPolicy::default(),
            secrets: default_secrets(),
            environment: BTreeMap::new(),
        }
    }
}

impl HoistConfig {
    /// Load from hoist.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            tracing::debug!(path = %config_path.display(), "loaded config file");
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            Ok(Self::default())
        }
    }
}

fn default_tag() -> String {
    "latest".to_owned()
}

fn default_platform() -> String {
    "linux/amd64".to_owned()
}

fn default_descriptor() -> String {
    "Dockerfile".to_owned()
}

fn default_builder() -> String {
    "hoist-builder".to_owned()
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

fn default_function_name() -> String {
    "tableau-export".to_owned()
}

fn default_role() -> String {
    "lambda-execution-role".to_owned()
}

fn default_timeout() -> u32 {
    300
}

fn default_memory_size() -> u32 {
    512
}

fn default_secrets() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "TABLEAU_SECRET_NAME".to_owned(),
            "tableau-export/tableau".to_owned(),
        ),
        ("S3_SECRET_NAME".to_owned(), "tableau-export/s3".to_owned()),
    ])
}
