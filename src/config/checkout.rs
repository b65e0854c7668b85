//! `[checkout]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// How the source tree is acquired for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStrategy {
    /// Use the project root in place (default; CI runners have already cloned it).
    #[default]
    Local,
    /// Shallow-clone `repository` into a temporary directory for the run.
    Clone,
}

/// `[checkout]` section in pressroom.toml.
///
/// # Example
/// ```toml
/// [checkout]
/// strategy = "clone"
/// repository = "https://github.com/alice/blog-source"
/// branch = "main"
/// submodules = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub strategy: CheckoutStrategy,

    /// Source repository URL (required for `clone`).
    #[serde(default)]
    pub repository: Option<String>,

    /// Source branch to clone; also the push branch in the generated CI workflow.
    #[serde(default = "defaults::checkout::branch")]
    #[educe(Default = defaults::checkout::branch())]
    pub branch: String,

    /// Fetch nested repositories (themes, shared snippets).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = defaults::r#true())]
    pub submodules: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_checkout_defaults() {
        let config: SiteConfig = toml::from_str("[base]\ntitle = \"T\"").unwrap();

        assert_eq!(config.checkout.strategy, CheckoutStrategy::Local);
        assert_eq!(config.checkout.branch, "main");
        assert!(config.checkout.submodules);
        assert!(config.checkout.repository.is_none());
    }

    #[test]
    fn test_checkout_clone() {
        let config = r#"
            [base]
            title = "T"
            [checkout]
            strategy = "clone"
            repository = "https://github.com/alice/blog"
            submodules = false
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.checkout.strategy, CheckoutStrategy::Clone);
        assert_eq!(config.checkout.repository.as_deref(), Some("https://github.com/alice/blog"));
        assert!(!config.checkout.submodules);
    }
}
