//! Registry source abstraction: endpoint list and URL layout.

/// The default public registry's registration base.
pub const NUGET_ORG_URL: &str = "https://api.nuget.org/v3/registration5-semver1";

/// A configured registry endpoint.
#[derive(Debug, Clone)]
pub struct RegistrySource {
    pub name: String,
    pub url: String,
}

impl RegistrySource {
    pub fn new(name: impl Into<String>, url: &str) -> Self {
        Self {
            name: name.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Construct the default nuget.org source.
    pub fn nuget_org() -> Self {
        Self::new("nuget.org", NUGET_ORG_URL)
    }

    /// Build the source list from configured URLs, falling back to the
    /// default registry when none are configured.
    pub fn from_urls(urls: &[String]) -> Vec<Self> {
        let mut sources: Vec<Self> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .enumerate()
            .map(|(i, url)| Self::new(format!("registry-{i}"), url))
            .collect();
        if sources.is_empty() {
            sources.push(Self::nuget_org());
        }
        sources
    }

    /// URL of the registration index listing every version of a package.
    /// Package names are lowercased in the URL layout.
    pub fn registration_index_url(&self, package: &str) -> String {
        format!("{}/{}/index.json", self.url, package.to_ascii_lowercase())
    }
}
