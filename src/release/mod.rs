//! Release publishing.
//!
//! The orchestrator talks to the hosting platform only through
//! [`ReleaseClient`]. [`github::GitHubClient`] is the production
//! implementation; tests substitute a recording fake.

pub mod github;
pub mod updater;

pub use github::GitHubClient;
pub use updater::{UpdateManifest, UpdateManifestParams};

use crate::artifacts::Artifact;
use crate::error::Result;

/// Placeholder replaced by the resolved app version.
pub const VERSION_TEMPLATE: &str = "__VERSION__";

/// Release to upload into, identified by id or by tag.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReleaseTarget {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Tag of the release (may contain `__VERSION__` until templated)
    pub tag_name: String,
    /// Existing release id; skips lookup and creation
    pub release_id: Option<u64>,
    /// Release title used when creating
    pub name: String,
    /// Release body used when creating and as updater notes
    pub body: String,
    /// Commitish the tag is created from
    pub commitish: Option<String>,
    /// Create as draft
    pub draft: bool,
    /// Create as prerelease
    pub prerelease: bool,
}

impl ReleaseTarget {
    /// Substitutes every `__VERSION__` in tag, name and body with `version`.
    pub fn apply_templates(&mut self, version: &str) {
        for field in [&mut self.tag_name, &mut self.name, &mut self.body] {
            *field = field.replace(VERSION_TEMPLATE, version);
        }
    }

    /// Whether the caller asked for an upload (by id or by tag).
    pub fn upload_requested(&self) -> bool {
        self.release_id.is_some() || !self.tag_name.is_empty()
    }
}

/// A release as returned by the hosting platform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseData {
    /// Numeric release id
    pub id: u64,
    /// Asset upload URL
    pub upload_url: String,
    /// Release page URL
    pub html_url: String,
}

/// Release and asset operations of the hosting platform.
#[allow(async_fn_in_trait)]
pub trait ReleaseClient {
    /// Returns the release for `target.tag_name`, creating it if missing.
    async fn get_or_create_release(&self, target: &ReleaseTarget) -> Result<ReleaseData>;

    /// Uploads `artifacts` as assets of release `release_id`, replacing same-named assets.
    async fn upload_assets(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        artifacts: &[Artifact],
    ) -> Result<()>;

    /// Builds and uploads the updater manifest for the release.
    async fn upload_update_manifest(&self, params: &UpdateManifestParams<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_replace_every_occurrence() {
        let mut target = ReleaseTarget {
            tag_name: "app-v__VERSION__".into(),
            name: "App __VERSION__ (__VERSION__)".into(),
            body: "See the assets to download __VERSION__.".into(),
            ..Default::default()
        };
        target.apply_templates("1.4.0");
        assert_eq!(target.tag_name, "app-v1.4.0");
        assert_eq!(target.name, "App 1.4.0 (1.4.0)");
        assert_eq!(target.body, "See the assets to download 1.4.0.");
    }

    #[test]
    fn upload_requested_by_id_or_tag() {
        assert!(!ReleaseTarget::default().upload_requested());
        assert!(ReleaseTarget { release_id: Some(7), ..Default::default() }.upload_requested());
        assert!(ReleaseTarget { tag_name: "v1".into(), ..Default::default() }.upload_requested());
    }
}
