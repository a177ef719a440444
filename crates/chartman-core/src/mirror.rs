//! Registry mirror rewriting
//!
//! Rewrites chart references so pulls are served from a configured mirror
//! (for example in air-gapped environments) instead of the upstream
//! registry. The rewrite is a pure string transformation; it performs no
//! network access and holds no state beyond its configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A rewrite rule redirecting chart pulls to an alternate registry.
///
/// The endpoint replaces the registry component of a reference. When a
/// namespace prefix is configured for the source registry, it is inserted
/// in front of the repository path:
///
/// ```
/// use chartman_core::RegistryMirror;
///
/// let mirror = RegistryMirror::new("registry.local:8443")
///     .unwrap()
///     .with_namespace("public.ecr.aws", "mirror/ecr");
///
/// assert_eq!(
///     mirror.rewrite("oci://public.ecr.aws/acme/app"),
///     "oci://registry.local:8443/mirror/ecr/acme/app"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMirror {
    endpoint: String,
    #[serde(default)]
    namespaces: BTreeMap<String, String>,
}

impl RegistryMirror {
    /// Create a mirror pointing at `endpoint` (`host[:port]`, no scheme).
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() || endpoint.contains("://") || endpoint.contains('/') {
            return Err(CoreError::InvalidMirrorEndpoint { endpoint });
        }
        Ok(Self {
            endpoint,
            namespaces: BTreeMap::new(),
        })
    }

    /// Serve charts originating from `source` under a path prefix on the
    /// mirror. Later mappings for the same source overwrite earlier ones.
    pub fn with_namespace(mut self, source: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.namespaces.insert(source.into(), prefix.into());
        self
    }

    /// The mirror endpoint (`host[:port]`).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Rewrite a chart reference to point at the mirror.
    ///
    /// References without a registry component are returned unchanged.
    pub fn rewrite(&self, original: &str) -> String {
        let (scheme, rest) = match original.split_once("://") {
            Some((scheme, rest)) => (Some(scheme), rest),
            None => (None, original),
        };

        let Some((host, path)) = rest.split_once('/') else {
            return original.to_string();
        };

        let mut rewritten = self.endpoint.clone();
        if let Some(prefix) = self.namespaces.get(host) {
            rewritten.push('/');
            rewritten.push_str(prefix);
        }
        rewritten.push('/');
        rewritten.push_str(path);

        match scheme {
            Some(scheme) => format!("{}://{}", scheme, rewritten),
            None => rewritten,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_replaces_registry_host() {
        let mirror = RegistryMirror::new("registry.local:8443").unwrap();
        assert_eq!(
            mirror.rewrite("oci://public.ecr.aws/acme/app"),
            "oci://registry.local:8443/acme/app"
        );
    }

    #[test]
    fn rewrite_preserves_missing_scheme() {
        let mirror = RegistryMirror::new("registry.local").unwrap();
        assert_eq!(
            mirror.rewrite("docker.io/library/nginx"),
            "registry.local/library/nginx"
        );
    }

    #[test]
    fn rewrite_inserts_namespace_prefix_for_mapped_source() {
        let mirror = RegistryMirror::new("registry.local:8443")
            .unwrap()
            .with_namespace("public.ecr.aws", "mirror/ecr");
        assert_eq!(
            mirror.rewrite("oci://public.ecr.aws/acme/app"),
            "oci://registry.local:8443/mirror/ecr/acme/app"
        );
        // Unmapped sources still get the plain host replacement
        assert_eq!(
            mirror.rewrite("oci://ghcr.io/acme/app"),
            "oci://registry.local:8443/acme/app"
        );
    }

    #[test]
    fn rewrite_leaves_bare_names_untouched() {
        let mirror = RegistryMirror::new("registry.local").unwrap();
        assert_eq!(mirror.rewrite("mychart"), "mychart");
    }

    #[test]
    fn endpoint_with_scheme_or_path_is_rejected() {
        assert!(RegistryMirror::new("https://registry.local").is_err());
        assert!(RegistryMirror::new("registry.local/charts").is_err());
        assert!(RegistryMirror::new("").is_err());
    }
}
