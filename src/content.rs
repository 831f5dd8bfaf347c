//! Content store client.
//!
//! Read-only queries against the headless content store's HTTP API. Queries
//! are GROQ strings passed as URL parameters; responses arrive wrapped in a
//! `{"result": ...}` envelope. Image asset references are resolved to CDN
//! URLs locally, without touching the store.

use crate::config::Config;
use crate::error::Error;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fields selected for every collection query. Creator is a reference and
/// gets dereferenced by the store.
const COLLECTION_FIELDS: &str = "{\
_id,title,address,description,nftCollectionName,\
mainImage{asset},previewImage{asset},\
slug{current},\
creator->{_id,name,address,slug{current}}}";

/// A curated collection entry with its on-chain drop contract address.
/// Immutable snapshot, fetched per request and discarded after the response.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Display name of the NFT collection itself.
    #[serde(rename = "nftCollectionName")]
    pub nft_collection_name: String,
    /// On-chain drop contract address.
    pub address: String,
    #[serde(rename = "mainImage")]
    pub main_image: ImageRef,
    #[serde(rename = "previewImage")]
    pub preview_image: ImageRef,
    pub slug: Slug,
    pub creator: Creator,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slug {
    pub current: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Creator {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub slug: Slug,
}

/// Reference to an image asset in the content store.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub asset: AssetRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
}

#[derive(Deserialize)]
struct QueryEnvelope<T> {
    result: T,
}

/// Client for the content store query API.
pub struct ContentClient {
    http: reqwest::Client,
    query_url: Url,
    cdn_url: Url,
    project_id: String,
    dataset: String,
}

impl ContentClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api = Url::parse(&config.content_api_url)
            .map_err(|e| Error::Config(format!("invalid content_api_url: {e}")))?;
        let query_url = api
            .join(&format!("data/query/{}", config.content_dataset))
            .map_err(|e| Error::Config(format!("invalid content query URL: {e}")))?;
        let cdn_url = Url::parse(&config.content_cdn_url)
            .map_err(|e| Error::Config(format!("invalid content_cdn_url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            query_url,
            cdn_url,
            project_id: config.content_project_id.clone(),
            dataset: config.content_dataset.clone(),
        })
    }

    /// Fetch all collection records. No filtering, no pagination; an empty
    /// store yields an empty vec.
    pub async fn collections(&self) -> Result<Vec<Collection>, Error> {
        let query = format!("*[_type == \"collection\"]{COLLECTION_FIELDS}");
        self.query(&query, &[]).await
    }

    /// Fetch the single collection matching `slug`, or `None` when unknown.
    pub async fn collection(&self, slug: &str) -> Result<Option<Collection>, Error> {
        let query =
            format!("*[_type == \"collection\" && slug.current == $slug][0]{COLLECTION_FIELDS}");
        self.query(&query, &[("$slug", slug)]).await
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let mut url = self.query_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", groq);
            // Parameter values are JSON-encoded, per the store's API.
            for (name, value) in params {
                let encoded = serde_json::to_string(value)
                    .map_err(|e| Error::Content(format!("failed to encode parameter: {e}")))?;
                pairs.append_pair(name, &encoded);
            }
        }

        debug!(url = %url, "Content store query");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Content(format!("content store unreachable: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Content(format!("content store query failed: {e}")))?;

        let envelope: QueryEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Content(format!("invalid content store response: {e}")))?;

        Ok(envelope.result)
    }

    /// Resolve an image asset reference to a CDN URL. Returns `None` for a
    /// malformed reference rather than failing the whole page.
    pub fn image_url(&self, image: &ImageRef) -> Option<String> {
        let (asset_id, dims, format) = parse_asset_ref(&image.asset.reference)?;
        let path = format!(
            "images/{}/{}/{}-{}.{}",
            self.project_id, self.dataset, asset_id, dims, format
        );
        self.cdn_url.join(&path).ok().map(String::from)
    }
}

/// Split an asset reference of the form `image-{assetId}-{WxH}-{format}`
/// into its parts. The asset id itself never contains dashes, but the
/// parse tolerates them by taking dims and format from the tail.
fn parse_asset_ref(reference: &str) -> Option<(&str, &str, &str)> {
    let rest = reference.strip_prefix("image-")?;
    let (rest, format) = rest.rsplit_once('-')?;
    let (asset_id, dims) = rest.rsplit_once('-')?;
    let (w, h) = dims.split_once('x')?;
    if asset_id.is_empty()
        || format.is_empty()
        || w.chars().any(|c| !c.is_ascii_digit())
        || h.chars().any(|c| !c.is_ascii_digit())
        || w.is_empty()
        || h.is_empty()
    {
        return None;
    }
    Some((asset_id, dims, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "result": [{
            "_id": "c1",
            "title": "Bored Ape Yacht Club",
            "description": "A club for apes",
            "nftCollectionName": "BAYC",
            "address": "0x1234567890abcdef1234567890abcdef12345678",
            "mainImage": {"asset": {"_ref": "image-abc123def456-800x800-png"}},
            "previewImage": {"asset": {"_ref": "image-0fee1deadbeef-400x400-jpg"}},
            "slug": {"current": "bayc"},
            "creator": {
                "_id": "p1",
                "name": "Yuga",
                "address": "0xcafe",
                "slug": {"current": "yuga"}
            }
        }]
    }"#;

    #[test]
    fn decodes_collection_records() {
        let envelope: QueryEnvelope<Vec<Collection>> = serde_json::from_str(SAMPLE).unwrap();
        let collections = envelope.result;
        assert_eq!(collections.len(), 1);
        let c = &collections[0];
        assert_eq!(c.slug.current, "bayc");
        assert_eq!(c.nft_collection_name, "BAYC");
        assert_eq!(c.creator.name, "Yuga");
        assert_eq!(c.main_image.asset.reference, "image-abc123def456-800x800-png");
    }

    #[test]
    fn null_result_is_not_found() {
        let envelope: QueryEnvelope<Option<Collection>> =
            serde_json::from_str(r#"{"result": null}"#).unwrap();
        assert!(envelope.result.is_none());
    }

    #[test]
    fn empty_result_set_is_valid() {
        let envelope: QueryEnvelope<Vec<Collection>> =
            serde_json::from_str(r#"{"result": []}"#).unwrap();
        assert!(envelope.result.is_empty());
    }

    #[test]
    fn parses_asset_refs() {
        assert_eq!(
            parse_asset_ref("image-abc123-400x400-png"),
            Some(("abc123", "400x400", "png"))
        );
        // Tolerates a dash inside the asset id.
        assert_eq!(
            parse_asset_ref("image-abc-123-400x400-webp"),
            Some(("abc-123", "400x400", "webp"))
        );
        assert_eq!(parse_asset_ref("file-abc123-400x400-png"), None);
        assert_eq!(parse_asset_ref("image-abc123-notdims-png"), None);
        assert_eq!(parse_asset_ref("image-"), None);
        assert_eq!(parse_asset_ref(""), None);
    }
}
