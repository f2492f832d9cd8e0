//! GitHub REST client for releases and release assets.

use super::updater::{self, MANIFEST_NAME, UpdateManifest, UpdateManifestParams};
use super::{ReleaseClient, ReleaseData, ReleaseTarget};
use crate::artifacts::Artifact;
use crate::error::{ActionError, CliError, ErrorExt, Result};
use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("kodegen_bundler_tauri/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Request body for `POST /repos/{owner}/{repo}/releases`.
#[derive(Serialize)]
struct CreateReleaseRequest<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_commitish: Option<&'a str>,
    draft: bool,
    prerelease: bool,
}

/// A release as returned by the API.
#[derive(Clone, Debug, Deserialize)]
pub struct Release {
    pub id: u64,
    pub upload_url: String,
    pub html_url: String,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
}

impl From<Release> for ReleaseData {
    fn from(release: Release) -> Self {
        Self {
            id: release.id,
            upload_url: release.upload_url,
            html_url: release.html_url,
        }
    }
}

/// A release asset.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub browser_download_url: String,
}

/// Async GitHub client.
///
/// Every call needs a token; constructing the client does not, so runs that
/// never upload work without one.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Creates a client for `api_url` (GitHub Enterprise or [`DEFAULT_API_URL`]).
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        self.request_accepting(method, url, "application/vnd.github+json")
    }

    fn request_accepting(&self, method: Method, url: &str, accept: &str) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or_else(|| CliError::MissingArgument {
            argument: "github-token (GITHUB_TOKEN)".to_string(),
        })?;

        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(header::ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url)?.send().await?;
        let body = check_status(response, url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches a release by id.
    pub async fn get_release(&self, owner: &str, repo: &str, release_id: u64) -> Result<Release> {
        self.get_json(&self.url(&format!("/repos/{owner}/{repo}/releases/{release_id}")))
            .await
    }

    /// Published release for `tag`, `None` on 404.
    pub async fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<Release>> {
        let url = self.url(&tag_path(owner, repo, tag));
        let response = self.request(Method::GET, &url)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = check_status(response, &url).await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Draft release for `tag`. Drafts are not reachable through the tag endpoint.
    pub async fn find_draft(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<Release>> {
        let mut page = 1;
        loop {
            let url = self.url(&format!(
                "/repos/{owner}/{repo}/releases?per_page={PER_PAGE}&page={page}"
            ));
            let releases: Vec<Release> = self.get_json(&url).await?;
            let last = releases.len() < PER_PAGE;
            if let Some(draft) = releases.into_iter().find(|r| r.draft && r.tag_name == tag) {
                return Ok(Some(draft));
            }
            if last {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn create_release(&self, target: &ReleaseTarget) -> Result<Release> {
        let url = self.url(&format!("/repos/{}/{}/releases", target.owner, target.repo));
        let name = if target.name.is_empty() {
            &target.tag_name
        } else {
            &target.name
        };
        let payload = CreateReleaseRequest {
            tag_name: &target.tag_name,
            name,
            body: &target.body,
            target_commitish: target.commitish.as_deref().filter(|c| !c.is_empty()),
            draft: target.draft,
            prerelease: target.prerelease,
        };

        let response = self.request(Method::POST, &url)?.json(&payload).send().await?;
        let body = check_status(response, &url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// All assets of a release.
    pub async fn list_assets(&self, owner: &str, repo: &str, release_id: u64) -> Result<Vec<ReleaseAsset>> {
        let mut assets = Vec::new();
        let mut page = 1;
        loop {
            let url = self.url(&format!(
                "/repos/{owner}/{repo}/releases/{release_id}/assets?per_page={PER_PAGE}&page={page}"
            ));
            let batch: Vec<ReleaseAsset> = self.get_json(&url).await?;
            let last = batch.len() < PER_PAGE;
            assets.extend(batch);
            if last {
                return Ok(assets);
            }
            page += 1;
        }
    }

    async fn delete_asset(&self, owner: &str, repo: &str, asset_id: u64) -> Result<()> {
        let url = self.url(&format!("/repos/{owner}/{repo}/releases/assets/{asset_id}"));
        let response = self.request(Method::DELETE, &url)?.send().await?;
        check_status(response, &url).await?;
        Ok(())
    }

    async fn download_asset(&self, owner: &str, repo: &str, asset_id: u64) -> Result<Vec<u8>> {
        let url = self.url(&format!("/repos/{owner}/{repo}/releases/assets/{asset_id}"));
        let response = self
            .request_accepting(Method::GET, &url, "application/octet-stream")?
            .send()
            .await?;
        let response = ensure_success(response, &url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(&self, upload_url: &str, name: &str, body: reqwest::Body, len: u64) -> Result<ReleaseAsset> {
        let url = asset_upload_url(upload_url, name)?;
        let response = self
            .request(Method::POST, url.as_str())?
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        let text = check_status(response, url.as_str()).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn upload_file(&self, upload_url: &str, name: &str, path: &Path) -> Result<ReleaseAsset> {
        let file = tokio::fs::File::open(path)
            .await
            .fs_context("opening artifact", path)?;
        let len = file
            .metadata()
            .await
            .fs_context("reading artifact metadata", path)?
            .len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        self.upload(upload_url, name, body, len).await
    }

    /// Removes assets named `name`.
    async fn delete_existing(
        &self,
        owner: &str,
        repo: &str,
        existing: &[ReleaseAsset],
        name: &str,
    ) -> Result<()> {
        for asset in existing.iter().filter(|a| a.name == name) {
            log::info!("Deleting existing {}...", asset.name);
            self.delete_asset(owner, repo, asset.id).await?;
        }
        Ok(())
    }
}

impl ReleaseClient for GitHubClient {
    async fn get_or_create_release(&self, target: &ReleaseTarget) -> Result<ReleaseData> {
        let ReleaseTarget { owner, repo, tag_name, .. } = target;

        let existing = if target.draft {
            log::info!("Looking for a draft release with tag {}...", tag_name);
            self.find_draft(owner, repo, tag_name).await?
        } else {
            log::info!("Looking for a release with tag {}...", tag_name);
            self.release_by_tag(owner, repo, tag_name).await?
        };

        let release = match existing {
            Some(release) => {
                log::info!("Found release with tag {}.", tag_name);
                release
            }
            None => {
                log::info!("Couldn't find release with tag {}. Creating one.", tag_name);
                self.create_release(target).await?
            }
        };
        Ok(release.into())
    }

    async fn upload_assets(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        artifacts: &[Artifact],
    ) -> Result<()> {
        let release = self.get_release(owner, repo, release_id).await?;
        let existing = self.list_assets(owner, repo, release_id).await?;

        for artifact in artifacts {
            let name = updater::asset_name(artifact);
            self.delete_existing(owner, repo, &existing, &name).await?;

            log::info!("Uploading {}...", name);
            self.upload_file(&release.upload_url, &name, &artifact.path).await?;
        }
        Ok(())
    }

    async fn upload_update_manifest(&self, params: &UpdateManifestParams<'_>) -> Result<()> {
        let UpdateManifestParams { owner, repo, release_id, .. } = *params;
        let release = self.get_release(owner, repo, release_id).await?;
        let assets = self.list_assets(owner, repo, release_id).await?;

        let existing = match assets.iter().find(|a| a.name == MANIFEST_NAME) {
            Some(asset) => {
                let bytes = self.download_asset(owner, repo, asset.id).await?;
                match serde_json::from_slice::<UpdateManifest>(&bytes) {
                    Ok(manifest) => Some(manifest),
                    Err(e) => {
                        log::warn!("Ignoring unreadable {}: {}", MANIFEST_NAME, e);
                        None
                    }
                }
            }
            None => None,
        };

        let download_urls: HashMap<String, String> = assets
            .iter()
            .map(|a| (a.name.clone(), a.browser_download_url.clone()))
            .collect();
        let pub_date = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let Some(manifest) = updater::build_manifest(params, existing, &download_urls, pub_date)? else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(&manifest)?;
        self.delete_existing(owner, repo, &assets, MANIFEST_NAME).await?;

        log::info!("Uploading {}...", MANIFEST_NAME);
        let len = json.len() as u64;
        self.upload(&release.upload_url, MANIFEST_NAME, reqwest::Body::from(json), len)
            .await?;
        Ok(())
    }
}

/// API path of the release for `tag`, with the tag encoded as one segment.
fn tag_path(owner: &str, repo: &str, tag: &str) -> String {
    let tag: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();
    format!("/repos/{owner}/{repo}/releases/tags/{tag}")
}

/// Strips the `{?name,label}` template from an upload URL and adds `name`.
pub fn asset_upload_url(upload_url: &str, name: &str) -> Result<url::Url> {
    let base = upload_url.split('{').next().unwrap_or(upload_url);
    let mut url = url::Url::parse(base)
        .map_err(|e| ActionError::Release(format!("invalid upload URL {upload_url}: {e}")))?;
    url.query_pairs_mut().append_pair("name", name);
    Ok(url)
}

/// Passes successful responses through and maps the rest to [`ActionError::Release`].
async fn ensure_success(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ActionError::Release(format!(
        "{} returned HTTP {}: {}",
        url,
        status,
        extract_message(&body)
    )))
}

/// Body of a successful response.
async fn check_status(response: reqwest::Response, url: &str) -> Result<String> {
    Ok(ensure_success(response, url).await?.text().await?)
}

fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
