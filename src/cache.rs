use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::AssetClient;

/// Served when an asset is neither cached nor reachable.
pub const OFFLINE_NOTICE: &str =
    "You are offline. Please connect to the internet to view this content.";

// ─── Assets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Cache,
    Network,
    /// Body is [`OFFLINE_NOTICE`].
    Offline,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub url: Url,
    pub body: String,
    pub source: AssetSource,
}

// ─── Path ────────────────────────────────────────────────────────────────────

/// `<cache dir>/class-schedule`, shared with the log file.
pub fn app_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("class-schedule"))
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Disk cache for remote schedule files, partitioned by generation tag.
///
/// Entries live in `<root>/<generation>/`. Bumping the generation makes every
/// older entry unreachable, and [`AssetCache::purge_stale`] deletes them.
#[derive(Debug, Clone)]
pub struct AssetCache {
    root: PathBuf,
    generation: String,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>, generation: &str) -> Result<Self> {
        validate_generation(generation)?;
        Ok(Self {
            root: root.into(),
            generation: generation.to_string(),
        })
    }

    /// The cache under the user's cache directory.
    pub fn open(generation: &str) -> Result<Self> {
        let root = app_cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?
            .join("assets");
        Self::new(root, generation)
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    fn generation_dir(&self) -> PathBuf {
        self.root.join(&self.generation)
    }

    fn entry_path(&self, url: &Url) -> PathBuf {
        self.generation_dir().join(entry_name(url))
    }

    pub fn get(&self, url: &Url) -> Option<String> {
        std::fs::read_to_string(self.entry_path(url)).ok()
    }

    pub fn put(&self, url: &Url, body: &str) -> Result<()> {
        let path = self.entry_path(url);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)
            .with_context(|| format!("Failed to write cache entry {}", path.display()))?;
        Ok(())
    }

    /// Deletes every generation directory except the current one and returns
    /// the removed tags.
    pub fn purge_stale(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut removed = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == self.generation || !entry.file_type()?.is_dir() {
                continue;
            }
            std::fs::remove_dir_all(entry.path())
                .with_context(|| format!("Failed to delete stale cache {name}"))?;
            info!(generation = %name, "deleted stale asset cache");
            removed.push(name);
        }
        Ok(removed)
    }

    /// Cache first, then network (stored on success), then the offline
    /// notice. Never fails.
    pub async fn fetch(&self, client: &AssetClient, url: &Url) -> Asset {
        if let Some(body) = self.get(url) {
            debug!(%url, "serving from cache");
            return Asset {
                url: url.clone(),
                body,
                source: AssetSource::Cache,
            };
        }
        self.fetch_network(client, url).await
    }

    async fn fetch_network(&self, client: &AssetClient, url: &Url) -> Asset {
        match client.fetch_text(url).await {
            Ok(body) => {
                debug!(%url, "fetched from network");
                if let Err(e) = self.put(url, &body) {
                    warn!(%url, "could not cache asset: {e:#}");
                }
                Asset {
                    url: url.clone(),
                    body,
                    source: AssetSource::Network,
                }
            }
            Err(e) => {
                warn!(%url, "fetch failed, serving offline notice: {e}");
                Asset {
                    url: url.clone(),
                    body: OFFLINE_NOTICE.to_string(),
                    source: AssetSource::Offline,
                }
            }
        }
    }

    /// Downloads every manifest entry into the current generation, replacing
    /// cached copies. Returns how many were stored; failures are logged.
    pub async fn install(&self, client: &AssetClient, manifest: &[Url]) -> usize {
        let mut stored = 0;
        for url in manifest {
            if self.fetch_network(client, url).await.source == AssetSource::Network {
                stored += 1;
            }
        }
        info!(stored, total = manifest.len(), generation = %self.generation, "installed assets");
        stored
    }
}

/// Generation tags name a directory, so they must be a single safe path
/// component.
pub(crate) fn validate_generation(generation: &str) -> Result<()> {
    if generation.is_empty() || generation == "." || generation == ".." {
        bail!("cache generation must not be empty");
    }
    if !generation
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        bail!("cache generation {generation:?} may only contain letters, digits, '-', '_' and '.'");
    }
    Ok(())
}

fn entry_name(url: &Url) -> String {
    url.as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "class-schedule-test-{}-{name}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    /// Nothing listens on the discard port, so connections are refused.
    fn unreachable() -> Url {
        url("http://127.0.0.1:9/schedules/missing.json")
    }

    #[test]
    fn entries_are_scoped_to_their_generation() {
        let root = temp_root("scoped");
        let v1 = AssetCache::new(&root, "v1").unwrap();
        let v2 = AssetCache::new(&root, "v2").unwrap();
        let u = url("https://example.org/schedules/a.json");

        v1.put(&u, "{}").unwrap();
        assert_eq!(v1.get(&u).as_deref(), Some("{}"));
        assert_eq!(v2.get(&u), None);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn purge_keeps_only_current_generation() {
        let root = temp_root("purge");
        let u = url("https://example.org/a.json");
        AssetCache::new(&root, "v1").unwrap().put(&u, "old").unwrap();
        AssetCache::new(&root, "v2").unwrap().put(&u, "older").unwrap();
        let v3 = AssetCache::new(&root, "v3").unwrap();
        v3.put(&u, "new").unwrap();

        let mut removed = v3.purge_stale().unwrap();
        removed.sort();
        assert_eq!(removed, ["v1", "v2"]);
        assert_eq!(v3.get(&u).as_deref(), Some("new"));
        assert!(!root.join("v1").exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn purge_without_root_is_a_no_op() {
        let cache = AssetCache::new(temp_root("absent"), "v1").unwrap();
        assert!(cache.purge_stale().unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_generation_tags() {
        assert!(AssetCache::new("/tmp", "").is_err());
        assert!(AssetCache::new("/tmp", "..").is_err());
        assert!(AssetCache::new("/tmp", "a/b").is_err());
        assert!(AssetCache::new("/tmp", "college-schedule-app-v26").is_ok());
    }

    #[test]
    fn entry_names_are_flat() {
        let name = entry_name(&url("https://example.org/a/b.json?x=1"));
        assert!(!name.contains('/'));
        assert!(name.ends_with("b.json_x_1"));
    }

    #[tokio::test]
    async fn cache_hit_skips_network() {
        let root = temp_root("hit");
        let cache = AssetCache::new(&root, "v1").unwrap();
        let u = unreachable();
        cache.put(&u, "cached body").unwrap();

        let asset = cache.fetch(&AssetClient::new().unwrap(), &u).await;
        assert_eq!(asset.source, AssetSource::Cache);
        assert_eq!(asset.body, "cached body");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn miss_without_network_serves_offline_notice() {
        let root = temp_root("offline");
        let cache = AssetCache::new(&root, "v1").unwrap();
        let client = AssetClient::new().unwrap();

        let asset = cache.fetch(&client, &unreachable()).await;
        assert_eq!(asset.source, AssetSource::Offline);
        assert_eq!(asset.body, OFFLINE_NOTICE);
        assert_eq!(cache.get(&unreachable()), None);

        assert_eq!(cache.install(&client, &[unreachable()]).await, 0);
        let _ = std::fs::remove_dir_all(&root);
    }
}
