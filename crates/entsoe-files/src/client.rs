//! Authenticated access to the file library.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use entsoe_fetch::{Clock, SystemClock, archive};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::token::{Token, TokenResponse};
use crate::{FileError, FileTransport, ReqwestFileTransport, Result, Table};

/// File library endpoint.
pub const FILES_URL: &str = "https://fms.tp.entsoe.eu/";

/// Token endpoint of the password grant.
pub const TOKEN_URL: &str = "https://keycloak.tp.entsoe.eu/realms/tp/protocol/openid-connect/token";

/// Environment variable consulted when no username is configured.
pub const USERNAME_ENV: &str = "ENTSOE_USERNAME";

/// Environment variable consulted when no password is configured.
pub const PASSWORD_ENV: &str = "ENTSOE_PWD";

const CLIENT_ID: &str = "tp-fms-public";
const EXPORT_ROOT: &str = "TP_export";
const PAGE_SIZE: u32 = 5000;

/// Configuration for the file library client.
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Account name; falls back to `ENTSOE_USERNAME`.
    pub username: Option<String>,
    /// Account password; falls back to `ENTSOE_PWD`.
    pub password: Option<String>,
    /// File library endpoint.
    pub base_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// User agent string.
    pub user_agent: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            base_url: FILES_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            timeout: None,
            user_agent: format!("entsoe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FileConfig {
    /// Creates a default configuration with explicit credentials.
    #[must_use]
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    fn resolve_credentials(&self) -> Result<(String, String)> {
        let username = self
            .username
            .clone()
            .or_else(|| std::env::var(USERNAME_ENV).ok());
        let password = self
            .password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok());
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
            _ => Err(FileError::MissingCredentials),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderListing {
    content_item_list: Vec<FolderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderItem {
    name: String,
    file_id: serde_json::Value,
}

/// Client for the file library.
///
/// A bearer token is obtained on first use and renewed whenever it has expired.
#[derive(Debug, Clone)]
pub struct FileClient {
    config: FileConfig,
    username: String,
    password: String,
    transport: Arc<dyn FileTransport>,
    clock: Arc<dyn Clock>,
    token: Arc<Mutex<Option<Token>>>,
}

impl FileClient {
    /// Creates a client using the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::MissingCredentials`] if no credentials are available.
    pub fn new(config: FileConfig) -> Result<Self> {
        let transport = ReqwestFileTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport), Arc::new(SystemClock))
    }

    /// Creates a client with an explicit transport and clock.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::MissingCredentials`] if no credentials are available.
    pub fn with_transport(
        config: FileConfig,
        transport: Arc<dyn FileTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let (username, password) = config.resolve_credentials()?;
        Ok(Self {
            config,
            username,
            password,
            transport,
            clock,
            token: Arc::new(Mutex::new(None)),
        })
    }

    async fn bearer(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        let now = self.clock.now();
        if let Some(token) = guard.as_ref().filter(|token| token.is_valid(now)) {
            return Ok(token.access().to_string());
        }

        let body = self
            .transport
            .post_form(
                &self.config.token_url,
                &[
                    ("client_id", CLIENT_ID),
                    ("grant_type", "password"),
                    ("username", self.username.as_str()),
                    ("password", self.password.as_str()),
                ],
            )
            .await?;
        let response: TokenResponse = serde_json::from_slice(&body)?;
        tracing::info!(expires_in = response.expires_in, "refreshed file library token");
        let token = Token::new(response, now);
        let access = token.access().to_string();
        *guard = Some(token);
        Ok(access)
    }

    async fn post(&self, operation: &str, body: serde_json::Value) -> Result<Bytes> {
        let token = self.bearer().await?;
        let url = format!("{}{operation}", self.config.base_url);
        tracing::debug!(%url, "file library request");
        self.transport.post_json(&url, &token, &body).await
    }

    /// Lists a folder of the export tree, returning file name to file id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing is malformed.
    pub async fn list_folder(&self, folder: &str) -> Result<BTreeMap<String, String>> {
        let body = json!({
            "path": format!("/{EXPORT_ROOT}/{}", with_slash(folder)),
            "sorterList": [{"key": "periodCovered.from", "ascending": true}],
            "pageInfo": {"pageIndex": 0, "pageSize": PAGE_SIZE},
        });
        let listing: FolderListing = serde_json::from_slice(&self.post("listFolder", body).await?)?;
        Ok(listing
            .content_item_list
            .into_iter()
            .map(|item| {
                let id = match item.file_id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (item.name, id)
            })
            .collect())
    }

    /// Downloads one file by folder and name, returning the raw ZIP archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn download_single_file_raw(&self, folder: &str, filename: &str) -> Result<Bytes> {
        let body = json!({
            "folder": format!("/{EXPORT_ROOT}/{}", with_slash(folder)),
            "filename": filename,
            "downloadAsZip": true,
            "topLevelFolder": EXPORT_ROOT,
        });
        self.post("downloadFileContent", body).await
    }

    /// Downloads one file and decodes its first archive member.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the archive is empty or unreadable,
    /// or the content is not valid TSV.
    pub async fn download_single_file(&self, folder: &str, filename: &str) -> Result<Table> {
        let zipped = self.download_single_file_raw(folder, filename).await?;
        let members = archive::members(&zipped, |_| true)?;
        let (_, content) = members
            .into_iter()
            .next()
            .ok_or_else(|| FileError::Response(format!("empty archive for '{filename}'")))?;
        Table::from_tsv(&content).await
    }

    /// Downloads several files by id, returning the raw ZIP archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn download_multiple_files_raw(&self, file_ids: &[String]) -> Result<Bytes> {
        let body = json!({
            "fileIdList": file_ids,
            "downloadAsZip": true,
            "topLevelFolder": EXPORT_ROOT,
        });
        self.post("downloadFileContent", body).await
    }

    /// Downloads several files by id and concatenates their tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any member is not valid TSV.
    pub async fn download_multiple_files(&self, file_ids: &[String]) -> Result<Table> {
        let zipped = self.download_multiple_files_raw(file_ids).await?;
        let mut table = Table::default();
        for (name, content) in archive::members(&zipped, |_| true)? {
            tracing::debug!(%name, "decoding archive member");
            table.append(Table::from_tsv(&content).await?);
        }
        Ok(table)
    }
}

fn with_slash(folder: &str) -> String {
    if folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use entsoe_fetch::ManualClock;
    use std::io::Write;
    use std::sync::Mutex as StdMutex;
    use zip::write::SimpleFileOptions;

    #[derive(Debug, Clone)]
    enum Call {
        Token,
        Json { url: String, token: String, body: serde_json::Value },
    }

    #[derive(Debug, Default)]
    struct FakeFiles {
        calls: StdMutex<Vec<Call>>,
        archive: Vec<u8>,
    }

    impl FakeFiles {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn token_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, Call::Token))
                .count()
        }
    }

    #[async_trait]
    impl FileTransport for FakeFiles {
        async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Bytes> {
            assert_eq!(url, TOKEN_URL);
            assert!(form.contains(&("grant_type", "password")));
            assert!(form.contains(&("client_id", "tp-fms-public")));
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Token);
            let n = calls.len();
            Ok(Bytes::from(format!(
                r#"{{"access_token":"token-{n}","expires_in":60}}"#
            )))
        }

        async fn post_json(&self, url: &str, token: &str, body: &serde_json::Value) -> Result<Bytes> {
            self.calls.lock().unwrap().push(Call::Json {
                url: url.to_string(),
                token: token.to_string(),
                body: body.clone(),
            });
            if url.ends_with("listFolder") {
                Ok(Bytes::from_static(
                    br#"{"contentItemList":[{"name":"2024_01_Prices.csv","fileId":"f1"},{"name":"2024_02_Prices.csv","fileId":2}]}"#,
                ))
            } else {
                Ok(Bytes::from(self.archive.clone()))
            }
        }
    }

    fn zipped(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in files {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn client(fake: Arc<FakeFiles>, clock: Arc<ManualClock>) -> FileClient {
        FileClient::with_transport(FileConfig::with_credentials("user", "pwd"), fake, clock)
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_folder() {
        let fake = Arc::new(FakeFiles::default());
        let files = client(fake.clone(), Arc::new(ManualClock::new()));

        let listing = files.list_folder("EnergyPrices_12.1.D_r3").await.unwrap();
        assert_eq!(listing.get("2024_01_Prices.csv").map(String::as_str), Some("f1"));
        assert_eq!(listing.get("2024_02_Prices.csv").map(String::as_str), Some("2"));

        match &fake.calls()[1] {
            Call::Json { url, token, body } => {
                assert_eq!(url, "https://fms.tp.entsoe.eu/listFolder");
                assert_eq!(token, "token-1");
                assert_eq!(body["path"], "/TP_export/EnergyPrices_12.1.D_r3/");
                assert_eq!(body["pageInfo"]["pageSize"], 5000);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_token_reused_until_expiry() {
        let fake = Arc::new(FakeFiles::default());
        let clock = Arc::new(ManualClock::new());
        let files = client(fake.clone(), clock.clone());

        files.list_folder("a").await.unwrap();
        files.list_folder("b").await.unwrap();
        assert_eq!(fake.token_calls(), 1);

        clock.advance(Duration::from_secs(61));
        files.list_folder("c").await.unwrap();
        assert_eq!(fake.token_calls(), 2);
    }

    #[tokio::test]
    async fn test_download_single_file() {
        let fake = Arc::new(FakeFiles {
            archive: zipped(&[("prices.csv", "\u{feff}DateTime\tPrice\n2024-01-01\t80.5\n")]),
            ..FakeFiles::default()
        });
        let files = client(fake.clone(), Arc::new(ManualClock::new()));

        let table = files
            .download_single_file("EnergyPrices_12.1.D_r3", "prices.csv")
            .await
            .unwrap();
        assert_eq!(table.headers(), ["DateTime", "Price"]);
        assert_eq!(table.column("Price"), Some(vec!["80.5"]));

        match &fake.calls()[1] {
            Call::Json { body, .. } => {
                assert_eq!(body["folder"], "/TP_export/EnergyPrices_12.1.D_r3/");
                assert_eq!(body["filename"], "prices.csv");
                assert_eq!(body["topLevelFolder"], "TP_export");
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_multiple_files_concatenates() {
        let fake = Arc::new(FakeFiles {
            archive: zipped(&[
                ("a.csv", "Area\tValue\nBE\t1\n"),
                ("b.csv", "\u{feff}Area\tValue\nNL\t2\nFR\t3\n"),
            ]),
            ..FakeFiles::default()
        });
        let files = client(fake.clone(), Arc::new(ManualClock::new()));

        let ids = vec!["f1".to_string(), "f2".to_string()];
        let table = files.download_multiple_files(&ids).await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("Area"), Some(vec!["BE", "NL", "FR"]));

        match &fake.calls()[1] {
            Call::Json { body, .. } => assert_eq!(body["fileIdList"], json!(["f1", "f2"])),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_missing_credentials() {
        let config = FileConfig {
            username: Some(String::new()),
            password: Some(String::new()),
            ..FileConfig::default()
        };
        assert!(matches!(
            config.resolve_credentials(),
            Err(FileError::MissingCredentials)
        ));
    }
}
