//! Package feeds: where verified packages are pushed
//!
//! `HttpFeed` talks to a NuGet-style server (flat-container lookups, v2 push
//! endpoint). `FolderFeed` writes into a local directory or file share.

use crate::core::error::{CoherenceError, CoherenceResult, PublishError, ResultExt};
use crate::utils::is_local_path;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use semver::{BuildMetadata, Version};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the feed API key
pub const API_KEY_HEADER: &str = "X-NuGet-ApiKey";

/// A destination for packages
#[async_trait]
pub trait PackageFeed: Send + Sync {
  /// Human-readable location, for logs
  fn location(&self) -> &str;

  /// Whether the feed already has this exact package
  async fn exists(&self, id: &str, version: &Version) -> CoherenceResult<bool>;

  /// Upload one package archive
  async fn push(
    &self,
    id: &str,
    version: &Version,
    package_path: &Path,
    api_key: Option<&str>,
    timeout: Duration,
  ) -> CoherenceResult<()>;
}

/// Canonical archive name on a feed: `{id}.{version}.nupkg`, lowercased
pub fn package_file_name(id: &str, version: &Version) -> String {
  format!("{}.{}.nupkg", id.to_lowercase(), normalized_version(version))
}

/// Version as feeds store it: lowercased, build metadata dropped
fn normalized_version(version: &Version) -> String {
  let mut version = version.clone();
  version.build = BuildMetadata::EMPTY;
  version.to_string().to_lowercase()
}

/// Pick a feed implementation for a `--feed` argument
pub fn open_feed(source: &str) -> CoherenceResult<Arc<dyn PackageFeed>> {
  if let Some(path) = source.strip_prefix("file://") {
    return Ok(Arc::new(FolderFeed::new(path)));
  }
  if is_local_path(source) {
    return Ok(Arc::new(FolderFeed::new(source)));
  }
  if source.starts_with("http://") || source.starts_with("https://") {
    return Ok(Arc::new(HttpFeed::new(source)?));
  }

  Err(
    PublishError::InvalidFeed {
      feed: source.to_string(),
      reason: "expected an http(s):// URL, a file:// URL or a local path".to_string(),
    }
    .into(),
  )
}

/// NuGet-style HTTP feed
pub struct HttpFeed {
  base: String,
  client: reqwest::Client,
}

impl HttpFeed {
  pub fn new(base: &str) -> CoherenceResult<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("coherence-build/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      base: base.trim_end_matches('/').to_string(),
      client,
    })
  }

  fn flat_container_url(&self, id: &str, version: &Version) -> String {
    format!(
      "{}/v3-flatcontainer/{}/{}/{}",
      self.base,
      id.to_lowercase(),
      normalized_version(version),
      package_file_name(id, version)
    )
  }

  fn push_url(&self) -> String {
    format!("{}/api/v2/package", self.base)
  }
}

#[async_trait]
impl PackageFeed for HttpFeed {
  fn location(&self) -> &str {
    &self.base
  }

  async fn exists(&self, id: &str, version: &Version) -> CoherenceResult<bool> {
    let url = self.flat_container_url(id, version);
    let response = self.client.head(&url).send().await?;

    match response.status() {
      status if status.is_success() => Ok(true),
      StatusCode::NOT_FOUND => Ok(false),
      status => Err(CoherenceError::message(format!(
        "existence check for {} {} returned {}",
        id, version, status
      ))),
    }
  }

  async fn push(
    &self,
    id: &str,
    version: &Version,
    package_path: &Path,
    api_key: Option<&str>,
    timeout: Duration,
  ) -> CoherenceResult<()> {
    let bytes = tokio::fs::read(package_path)
      .await
      .with_context(|| format!("Failed to read package {}", package_path.display()))?;

    let part = Part::bytes(bytes)
      .file_name(package_file_name(id, version))
      .mime_str("application/octet-stream")?;
    let form = Form::new().part("package", part);

    let mut request = self.client.put(self.push_url()).timeout(timeout).multipart(form);
    if let Some(key) = api_key {
      request = request.header(API_KEY_HEADER, key);
    }

    let response = request.send().await?;
    let status = response.status();
    if status.is_success() || status == StatusCode::CONFLICT {
      return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(CoherenceError::message(format!(
      "feed rejected {} {}: {} {}",
      id,
      version,
      status,
      body.trim()
    )))
  }
}

/// Local directory (or mounted share) used as a feed
pub struct FolderFeed {
  dir: PathBuf,
  location: String,
}

impl FolderFeed {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    let dir = dir.into();
    let location = dir.display().to_string();
    Self { dir, location }
  }

  fn package_file(&self, id: &str, version: &Version) -> PathBuf {
    self.dir.join(package_file_name(id, version))
  }
}

#[async_trait]
impl PackageFeed for FolderFeed {
  fn location(&self) -> &str {
    &self.location
  }

  async fn exists(&self, id: &str, version: &Version) -> CoherenceResult<bool> {
    Ok(tokio::fs::try_exists(self.package_file(id, version)).await?)
  }

  async fn push(
    &self,
    id: &str,
    version: &Version,
    package_path: &Path,
    _api_key: Option<&str>,
    timeout: Duration,
  ) -> CoherenceResult<()> {
    let target = self.package_file(id, version);
    let partial = self.dir.join(format!(".{}.partial", package_file_name(id, version)));

    let copy = async {
      tokio::fs::create_dir_all(&self.dir).await?;
      tokio::fs::copy(package_path, &partial).await?;
      tokio::fs::rename(&partial, &target).await?;
      Ok::<(), std::io::Error>(())
    };

    let result = match tokio::time::timeout(timeout, copy).await {
      Ok(result) => result.with_context(|| {
        format!(
          "Failed to copy {} to {}",
          package_path.display(),
          target.display()
        )
      }),
      Err(_) => Err(CoherenceError::message(format!(
        "copy of {} timed out after {:?}",
        package_path.display(),
        timeout
      ))),
    };

    if result.is_err() {
      // The partial file may not exist yet; nothing to report either way
      let _ = tokio::fs::remove_file(&partial).await;
    }
    result
  }
}
