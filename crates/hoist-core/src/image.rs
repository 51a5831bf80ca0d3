//! Remote image references for Amazon ECR.

use serde::Serialize;

/// Fully qualified reference to an image in a private ECR registry:
/// `{account}.dkr.ecr.{region}.amazonaws.com/{name}:{tag}`.
///
/// Every phase (build, push, deploy) must agree on this value, so it is only
/// ever built through [`ImageReference::new`] or
/// [`Settings::image_reference`](crate::Settings::image_reference).
///
/// # Examples
///
/// ```
/// use hoist_core::ImageReference;
///
/// let image = ImageReference::new("123456789012", "eu-west-1", "exporter", "v3");
/// assert_eq!(
///     image.to_string(),
///     "123456789012.dkr.ecr.eu-west-1.amazonaws.com/exporter:v3"
/// );
/// assert_eq!(image.local_tag(), "exporter:v3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    account_id: String,
    region: String,
    name: String,
    tag: String,
}

impl ImageReference {
    pub fn new(account_id: &str, region: &str, name: &str, tag: &str) -> Self {
        Self {
            account_id: account_id.to_owned(),
            region: region.to_owned(),
            name: name.to_owned(),
            tag: tag.to_owned(),
        }
    }

    /// Registry host used for `docker login`.
    pub fn registry_host(&self) -> String {
        format!(
            "{account}.dkr.ecr.{region}.amazonaws.com",
            account = self.account_id,
            region = self.region,
        )
    }

    /// Tag given to the image by the local build, before re-tagging.
    pub fn local_tag(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }

    pub fn repository(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.registry_host(), self.name, self.tag)
    }
}
