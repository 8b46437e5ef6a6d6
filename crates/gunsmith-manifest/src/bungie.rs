//! Minimal Bungie.net client: locate and download the manifest.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ManifestError, ManifestResult};

pub const BUNGIE_ROOT: &str = "https://www.bungie.net";
pub const MANIFEST_ENDPOINT: &str = "/Platform/Destiny2/Manifest/";

/// `ErrorCode` value of a successful platform response.
const PLATFORM_SUCCESS: i64 = 1;

/// Bungie.net API client.
#[derive(Debug, Clone)]
pub struct BungieClient {
    http: Client,
    api_key: String,
    root: String,
}

/// The platform response envelope wrapping every Bungie.net payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<T> {
    response: Option<T>,
    error_code: i64,
    #[serde(default)]
    error_status: String,
    #[serde(default)]
    message: String,
}

/// The parts of `DestinyManifest` gunsmith uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestInfo {
    pub version: String,
    /// Language code to the relative path of the zipped SQLite content.
    #[serde(default)]
    pub mobile_world_content_paths: HashMap<String, String>,
}

impl ManifestInfo {
    /// Relative content path for `language`.
    pub fn content_path(&self, language: &str) -> ManifestResult<&str> {
        self.mobile_world_content_paths
            .get(language)
            .map(String::as_str)
            .ok_or_else(|| ManifestError::MissingLanguage(language.to_string()))
    }
}

impl BungieClient {
    /// Create a new Bungie.net client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> ManifestResult<Self> {
        Self::with_root(api_key, BUNGIE_ROOT)
    }

    /// Create a client against another host, e.g. a local mirror.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_root(api_key: impl Into<String>, root: impl Into<String>) -> ManifestResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .user_agent(concat!(
                "gunsmith/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/gunsmith-bot/gunsmith)"
            ))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            root: root.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the current manifest description.
    pub async fn manifest_info(&self) -> ManifestResult<ManifestInfo> {
        let url = format!("{}{MANIFEST_ENDPOINT}", self.root);
        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        parse_envelope(&body)
    }

    /// Download the zipped manifest content at a relative `content_path`.
    pub async fn download_content(&self, content_path: &str) -> ManifestResult<Vec<u8>> {
        let url = format!("{}{content_path}", self.root);
        log::info!("Downloading manifest from {url}");
        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

async fn check_status(response: Response) -> ManifestResult<Response> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ManifestError::RateLimited);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ManifestError::Http {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

/// Unwrap a platform envelope, turning platform error codes into errors.
pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &str) -> ManifestResult<T> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| ManifestError::Api {
        code: 0,
        status: "Unparseable".to_string(),
        message: e.to_string(),
    })?;
    if envelope.error_code != PLATFORM_SUCCESS {
        return Err(ManifestError::Api {
            code: envelope.error_code,
            status: envelope.error_status,
            message: envelope.message,
        });
    }
    envelope.response.ok_or_else(|| ManifestError::Api {
        code: envelope.error_code,
        status: envelope.error_status,
        message: "response body missing".to_string(),
    })
}

/// File name of a content path, e.g. `world_sql_content_abc.content`.
pub fn content_file_name(content_path: &str) -> Option<&str> {
    content_path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_BODY: &str = r#"{
        "Response": {
            "version": "223072.24.05.02.1700-1",
            "mobileWorldContentPaths": {
                "en": "/common/destiny2_content/sqlite/en/world_sql_content_abc.content",
                "fr": "/common/destiny2_content/sqlite/fr/world_sql_content_def.content"
            }
        },
        "ErrorCode": 1,
        "ThrottleSeconds": 0,
        "ErrorStatus": "Success",
        "Message": "Ok",
        "MessageData": {}
    }"#;

    #[test]
    fn test_client_creation() {
        assert!(BungieClient::new("key").is_ok());
    }

    #[test]
    fn test_parse_manifest_envelope() {
        let info: ManifestInfo = parse_envelope(MANIFEST_BODY).unwrap();
        assert_eq!(info.version, "223072.24.05.02.1700-1");
        assert_eq!(
            info.content_path("en").unwrap(),
            "/common/destiny2_content/sqlite/en/world_sql_content_abc.content"
        );
        assert!(matches!(
            info.content_path("de"),
            Err(ManifestError::MissingLanguage(lang)) if lang == "de"
        ));
    }

    #[test]
    fn test_platform_error_code() {
        let body = r#"{
            "ErrorCode": 2101,
            "ErrorStatus": "ApiInvalidOrExpiredKey",
            "Message": "Invalid API key"
        }"#;
        let err = parse_envelope::<ManifestInfo>(body).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Api { code: 2101, ref status, .. } if status == "ApiInvalidOrExpiredKey"
        ));
    }

    #[test]
    fn test_unparseable_body() {
        let err = parse_envelope::<ManifestInfo>("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, ManifestError::Api { code: 0, .. }));
    }

    #[test]
    fn test_content_file_name() {
        assert_eq!(
            content_file_name("/common/destiny2_content/sqlite/en/world_sql_content_abc.content"),
            Some("world_sql_content_abc.content")
        );
        assert_eq!(content_file_name("/trailing/"), None);
    }
}
