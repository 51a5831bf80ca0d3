//! Configuration resolution.
//!
//! Values are layered, lowest precedence first:
//!
//! ```text
//! built-in defaults  <  hoist.toml  <  environment variables
//! ```
//!
//! The result is an immutable [`Settings`] record resolved once per process
//! and passed to every phase.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::HoistConfig;
use crate::image::ImageReference;
use crate::probe::ProbeErrorPolicy;

pub const ENV_FUNCTION_NAME: &str = "FUNCTION_NAME";
pub const ENV_IMAGE_NAME: &str = "IMAGE_NAME";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_IMAGE_TAG: &str = "IMAGE_TAG";
pub const ENV_ROLE: &str = "ROLE_ARN";
pub const ENV_PLATFORM: &str = "PLATFORM";
pub const ENV_NO_CACHE: &str = "NO_CACHE";
pub const ENV_ACCOUNT_ID: &str = "AWS_ACCOUNT_ID";
pub const ENV_DESCRIPTOR: &str = "DOCKERFILE";
pub const ENV_BUILDER: &str = "BUILDER_NAME";
pub const ENV_TIMEOUT: &str = "LAMBDA_TIMEOUT";
pub const ENV_MEMORY: &str = "LAMBDA_MEMORY";
pub const ENV_PROBE_POLICY: &str = "PROBE_ERROR_POLICY";

/// Resolved configuration shared by the build, push and deploy phases.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub function_name: String,
    pub image_name: String,
    pub region: String,
    pub tag: String,
    /// Execution role name or ARN, see [`Settings::role_arn`].
    pub role: String,
    pub platform: String,
    pub no_cache: bool,
    /// Explicit account ID. `None` means "ask STS".
    pub account_id: Option<String>,
    pub descriptor: PathBuf,
    pub builder: String,
    pub timeout: u32,
    pub memory_size: u32,
    pub probe_policy: ProbeErrorPolicy,
    pub secrets: BTreeMap<String, String>,
    pub environment: BTreeMap<String, String>,
}

impl Settings {
    /// Resolve settings for `project_dir` from hoist.toml and the process environment.
    pub fn resolve(project_dir: &Path) -> crate::Result<Self> {
        let config = HoistConfig::load(project_dir)?;
        Self::from_sources(config, |key| {
            // arch-lint: allow(no-silent-result-drop) reason="unset or non-UTF-8 variables fall back to hoist.toml and defaults"
            std::env::var(key).ok()
        })
    }

    /// Layer environment values from `lookup` over a loaded config.
    ///
    /// Empty values count as unset.
    pub fn from_sources<F>(config: HoistConfig, lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let env_or = |key: &str, configured: String| match var(key) {
            Some(value) => value,
            None => configured,
        };

        let function_name = env_or(ENV_FUNCTION_NAME, config.function.name);
        let image_name = match (var(ENV_IMAGE_NAME), config.image.name) {
            (Some(name), _) | (None, Some(name)) => name,
            (None, None) => function_name.clone(),
        };
        let region = match var(ENV_REGION) {
            Some(region) => region,
            None => env_or(ENV_DEFAULT_REGION, config.aws.region),
        };

        let no_cache = match var(ENV_NO_CACHE) {
            Some(v) => parse_bool(&v).ok_or_else(|| invalid(ENV_NO_CACHE, &v, "a boolean"))?,
            None => config.image.no_cache,
        };
        let timeout = match var(ENV_TIMEOUT) {
            Some(v) => parse_u32(ENV_TIMEOUT, &v)?,
            None => config.function.timeout,
        };
        let memory_size = match var(ENV_MEMORY) {
            Some(v) => parse_u32(ENV_MEMORY, &v)?,
            None => config.function.memory_size,
        };
        let probe_policy = match var(ENV_PROBE_POLICY) {
            Some(v) => ProbeErrorPolicy::parse(&v)
                .ok_or_else(|| invalid(ENV_PROBE_POLICY, &v, "`abort` or `assume-absent`"))?,
            None => config.function.probe_errors,
        };

        let secrets = config
            .function
            .secrets
            .into_iter()
            .map(|(key, default)| {
                let value = env_or(&key, default);
                (key, value)
            })
            .collect();

        let settings = Self {
            function_name,
            image_name,
            region,
            tag: env_or(ENV_IMAGE_TAG, config.image.tag),
            role: env_or(ENV_ROLE, config.function.role),
            platform: env_or(ENV_PLATFORM, config.image.platform),
            no_cache,
            account_id: match var(ENV_ACCOUNT_ID) {
                Some(id) => Some(id),
                None => config.aws.account_id,
            },
            descriptor: PathBuf::from(env_or(ENV_DESCRIPTOR, config.image.descriptor)),
            builder: env_or(ENV_BUILDER, config.image.builder),
            timeout,
            memory_size,
            probe_policy,
            secrets,
            environment: config.function.environment,
        };

        tracing::debug!(
            function = %settings.function_name,
            image = %settings.image_name,
            region = %settings.region,
            tag = %settings.tag,
            "settings resolved"
        );

        Ok(settings)
    }

    /// The one place the remote image reference is composed.
    pub fn image_reference(&self, account_id: &str) -> ImageReference {
        ImageReference::new(account_id, &self.region, &self.image_name, &self.tag)
    }

    /// Full execution role ARN. Bare role names are expanded within `account_id`.
    pub fn role_arn(&self, account_id: &str) -> String {
        if self.role.starts_with("arn:") {
            self.role.clone()
        } else {
            format!("arn:aws:iam::{account_id}:role/{}", self.role)
        }
    }

    /// Environment variables set on the function: static entries plus secret
    /// references. Secret references win on key collision.
    pub fn function_environment(&self) -> BTreeMap<String, String> {
        let mut env = self.environment.clone();
        env.extend(self.secrets.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}

/// Parse a shell-style boolean flag.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_u32(key: &str, value: &str) -> crate::Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "an unsigned integer"))
}

fn invalid(key: &str, value: &str, expected: &'static str) -> crate::Error {
    crate::Error::InvalidSetting {
        key: key.to_owned(),
        value: value.to_owned(),
        expected,
    }
}
