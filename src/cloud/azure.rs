use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response, StatusCode, Url};
use tokio::fs::File as AsyncFile;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use crate::cloud::store::{BlobStore, ContainerCreation, StoreConnector};
use crate::constants::{
    AZURE_API_VERSION, BLOCK_SIZE, DEFAULT_CONNECTION_TIMEOUT_SECS, LARGE_FILE_THRESHOLD,
    MAX_BLOCKS,
};

const VERSION_HEADER: &str = "x-ms-version";
const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
const ERROR_CODE_HEADER: &str = "x-ms-error-code";

/// Azure Blob Storage client speaking the REST API directly.
///
/// When built with a SAS token, the token is attached as the query string of
/// every request; otherwise requests are anonymous and only succeed against
/// containers with public read access.
pub struct AzureBlobClient {
    http: Client,
    endpoint: Url,
    sas: Option<String>,
    large_file_threshold: u64,
    block_size: usize,
}

impl AzureBlobClient {
    /// Create an anonymous client for `endpoint`
    pub fn anonymous(endpoint: &str) -> Result<Self> {
        Self::build(endpoint, None)
    }

    /// Create a client that authenticates every request with `sas`
    pub fn with_sas(endpoint: &str, sas: &str) -> Result<Self> {
        let sas = sas.trim().trim_start_matches('?');
        if sas.is_empty() {
            return Err(anyhow!("SAS token is empty"));
        }
        Self::build(endpoint, Some(sas.to_string()))
    }

    fn build(endpoint: &str, sas: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .context(format!("Invalid blob endpoint: {}", endpoint))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("Blob endpoint {} cannot be used as a base URL", endpoint));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(AzureBlobClient {
            http,
            endpoint,
            sas,
            large_file_threshold: LARGE_FILE_THRESHOLD,
            block_size: BLOCK_SIZE,
        })
    }

    /// Override when uploads switch to block lists and how large each block is
    pub fn with_block_layout(mut self, large_file_threshold: u64, block_size: usize) -> Self {
        self.large_file_threshold = large_file_threshold;
        self.block_size = block_size.max(1);
        self
    }

    /// Build the request URL for a container or blob path.
    ///
    /// Each `/`-separated part of `path` is percent-encoded as its own
    /// segment, then the SAS token and `params` form the query string.
    fn url(&self, path: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                anyhow!("Blob endpoint {} cannot be used as a base URL", self.endpoint)
            })?;
            segments.pop_if_empty();
            for part in path.iter().flat_map(|p| p.split('/')) {
                segments.push(part);
            }
        }

        url.set_query(self.sas.as_deref());
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }

    /// Upload a file too large for a single Put Blob as a block list
    async fn put_blocks(
        &self,
        container: &str,
        key: &str,
        mut file: AsyncFile,
        file_size: u64,
    ) -> Result<()> {
        let num_blocks = block_count(file_size, self.block_size)?;
        debug!("Uploading {} blocks to {}/{}", num_blocks, container, key);

        let mut block_ids = Vec::with_capacity(num_blocks as usize);
        let mut buffer = vec![0u8; self.block_size];

        for index in 0..num_blocks {
            let filled = read_block(&mut file, &mut buffer).await?;
            if filled == 0 {
                return Err(anyhow!("File shrank during upload after {} blocks", index));
            }

            let block_id = block_id(index);
            let url = self.url(&[container, key], &[("comp", "block"), ("blockid", &block_id)])?;
            let response = self
                .http
                .put(url)
                .header(VERSION_HEADER, AZURE_API_VERSION)
                .header(CONTENT_LENGTH, filled)
                .body(buffer[..filled].to_vec())
                .send()
                .await
                .context(format!("Put Block {} failed", index))?;
            expect_status(response, &[StatusCode::CREATED], "Put Block")?;

            block_ids.push(block_id);
        }

        let url = self.url(&[container, key], &[("comp", "blocklist")])?;
        let response = self
            .http
            .put(url)
            .header(VERSION_HEADER, AZURE_API_VERSION)
            .body(block_list_xml(&block_ids))
            .send()
            .await
            .context("Put Block List failed")?;
        expect_status(response, &[StatusCode::CREATED], "Put Block List")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for AzureBlobClient {
    fn store_name(&self) -> String {
        self.endpoint.as_str().trim_end_matches('/').to_string()
    }

    async fn read_blob_text(&self, container: &str, blob: &str) -> Result<String> {
        let url = self.url(&[container, blob], &[])?;
        let response = self
            .http
            .get(url)
            .header(VERSION_HEADER, AZURE_API_VERSION)
            .send()
            .await
            .context(format!("Get Blob {}/{} failed", container, blob))?;
        let response = expect_status(response, &[StatusCode::OK], "Get Blob")?;

        response
            .text()
            .await
            .context(format!("Failed to read body of {}/{}", container, blob))
    }

    async fn container_exists(&self, container: &str) -> Result<bool> {
        let url = self.url(&[container], &[("restype", "container")])?;
        let response = self
            .http
            .get(url)
            .header(VERSION_HEADER, AZURE_API_VERSION)
            .send()
            .await
            .context(format!("Get Container Properties for {} failed", container))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(&response, "Get Container Properties")),
        }
    }

    async fn create_container(&self, container: &str) -> Result<ContainerCreation> {
        let url = self.url(&[container], &[("restype", "container")])?;
        let response = self
            .http
            .put(url)
            .header(VERSION_HEADER, AZURE_API_VERSION)
            .header(CONTENT_LENGTH, 0)
            .send()
            .await
            .context(format!("Create Container {} failed", container))?;

        match response.status() {
            StatusCode::CREATED => Ok(ContainerCreation::Created),
            StatusCode::CONFLICT
                if error_code(&response).as_deref() != Some("ContainerBeingDeleted") =>
            {
                Ok(ContainerCreation::AlreadyExists)
            }
            _ => Err(status_error(&response, "Create Container")),
        }
    }

    async fn put_file(&self, container: &str, key: &str, path: &Path) -> Result<u64> {
        let file = AsyncFile::open(path)
            .await
            .context(format!("Failed to open {} for upload", path.display()))?;
        let file_size = file
            .metadata()
            .await
            .context(format!("Failed to get metadata for {}", path.display()))?
            .len();

        let start_time = Instant::now();

        if file_size > self.large_file_threshold {
            self.put_blocks(container, key, file, file_size).await?;
        } else {
            let url = self.url(&[container, key], &[])?;
            let response = self
                .http
                .put(url)
                .header(VERSION_HEADER, AZURE_API_VERSION)
                .header(BLOB_TYPE_HEADER, "BlockBlob")
                .header(CONTENT_LENGTH, file_size)
                .body(Body::wrap_stream(ReaderStream::new(file)))
                .send()
                .await
                .context("Put Blob failed")?;
            expect_status(response, &[StatusCode::CREATED], "Put Blob")?;
        }

        debug!(
            "Uploaded {} to {}/{} in {:?}",
            path.display(),
            container,
            key,
            start_time.elapsed()
        );
        Ok(file_size)
    }
}

/// Connector for one Azure storage endpoint.
pub struct AzureConnector {
    endpoint: String,
}

impl AzureConnector {
    pub fn new(endpoint: &str) -> Self {
        AzureConnector {
            endpoint: endpoint.to_string(),
        }
    }
}

impl StoreConnector for AzureConnector {
    fn anonymous(&self) -> Result<Box<dyn BlobStore>> {
        Ok(Box::new(AzureBlobClient::anonymous(&self.endpoint)?))
    }

    fn with_token(&self, token: &str) -> Result<Box<dyn BlobStore>> {
        Ok(Box::new(AzureBlobClient::with_sas(&self.endpoint, token)?))
    }
}

/// Fill `buffer` from `file`, returning how many bytes were read (0 at EOF)
async fn read_block(file: &mut AsyncFile, buffer: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..]).await.context("Failed to read block")?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Number of blocks needed for `file_size` bytes, the last one partial
fn block_count(file_size: u64, block_size: usize) -> Result<u64> {
    let block_size = block_size as u64;
    let num_blocks = (file_size + block_size - 1) / block_size;
    if num_blocks > MAX_BLOCKS {
        return Err(anyhow!(
            "File of {} bytes needs {} blocks, more than the {} allowed",
            file_size,
            num_blocks,
            MAX_BLOCKS
        ));
    }
    Ok(num_blocks)
}

/// Block IDs must all have the same length within a blob
fn block_id(index: u64) -> String {
    BASE64.encode(format!("block-{:08}", index))
}

fn block_list_xml(block_ids: &[String]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?><BlockList>");
    for id in block_ids {
        xml.push_str("<Latest>");
        xml.push_str(id);
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}

fn error_code(response: &Response) -> Option<String> {
    response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn status_error(response: &Response, operation: &str) -> anyhow::Error {
    let status = response.status();
    match error_code(response) {
        Some(code) => anyhow!("{} returned {} ({})", operation, status, code),
        None => anyhow!("{} returned {}", operation, status),
    }
}

fn expect_status(response: Response, expected: &[StatusCode], operation: &str) -> Result<Response> {
    if expected.contains(&response.status()) {
        Ok(response)
    } else {
        Err(status_error(&response, operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_temp_file;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        method: String,
        target: String,
        body: Vec<u8>,
    }

    type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

    /// Local HTTP/1.1 listener that records requests and answers 201 Created
    async fn spawn_recording_server() -> Result<(String, Recorded)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let endpoint = format!("http://{}", listener.local_addr()?);
        let requests: Recorded = Arc::default();
        let recorded = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve_connection(stream, recorded).await;
                });
            }
        });

        Ok((endpoint, requests))
    }

    async fn serve_connection(stream: TcpStream, recorded: Recorded) -> std::io::Result<()> {
        let mut reader = BufReader::new(stream);
        loop {
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).await? == 0 {
                return Ok(());
            }
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let target = parts.next().unwrap_or_default().to_string();

            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).await?;
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).await?;
            recorded.lock().unwrap().push(RecordedRequest { method, target, body });

            reader
                .get_mut()
                .write_all(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n")
                .await?;
        }
    }

    fn query_value(target: &str, name: &str) -> Option<String> {
        let url = Url::parse(&format!("http://localhost{}", target)).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_block_count() {
        assert_eq!(block_count(0, 4).unwrap(), 0);
        assert_eq!(block_count(8, 4).unwrap(), 2);
        assert_eq!(block_count(10, 4).unwrap(), 3);
        assert_eq!(
            block_count(LARGE_FILE_THRESHOLD + 1, BLOCK_SIZE).unwrap(),
            LARGE_FILE_THRESHOLD / BLOCK_SIZE as u64 + 1
        );
        assert!(block_count(MAX_BLOCKS * 4, 4).is_ok());
        assert!(block_count(MAX_BLOCKS * 4 + 1, 4).is_err());
    }

    #[tokio::test]
    async fn test_large_file_uploaded_as_ordered_blocks() -> Result<()> {
        let (endpoint, requests) = spawn_recording_server().await?;
        let client = AzureBlobClient::with_sas(&endpoint, "sv=1&sig=x")?.with_block_layout(8, 4);
        let file = create_temp_file(b"0123456789")?;

        let sent = client.put_file("ws01", "disks/c-1/big.bin", file.path()).await?;
        assert_eq!(sent, 10);

        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| r.method == "PUT"));
        assert!(requests.iter().all(|r| r.target.starts_with("/ws01/disks/c-1/big.bin?")));
        assert!(requests.iter().all(|r| query_value(&r.target, "sig").as_deref() == Some("x")));

        let expected_ids: Vec<String> = (0..3).map(block_id).collect();
        let bodies: [&[u8]; 3] = [b"0123", b"4567", b"89"];
        for (index, request) in requests[..3].iter().enumerate() {
            assert_eq!(query_value(&request.target, "comp").as_deref(), Some("block"));
            assert_eq!(query_value(&request.target, "blockid"), Some(expected_ids[index].clone()));
            assert_eq!(request.body, bodies[index]);
        }

        let commit = &requests[3];
        assert_eq!(query_value(&commit.target, "comp").as_deref(), Some("blocklist"));
        assert_eq!(commit.body, block_list_xml(&expected_ids).into_bytes());
        Ok(())
    }

    #[tokio::test]
    async fn test_shrinking_file_is_not_committed() -> Result<()> {
        let (endpoint, requests) = spawn_recording_server().await?;
        let client = AzureBlobClient::with_sas(&endpoint, "sv=1&sig=x")?.with_block_layout(8, 4);
        let file = create_temp_file(b"0123456789")?;

        let handle = AsyncFile::open(file.path()).await?;
        let err = client
            .put_blocks("ws01", "big.bin", handle, 20)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("shrank"));

        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| query_value(&r.target, "comp").as_deref() == Some("block")));
        Ok(())
    }

    #[test]
    fn test_url_encodes_key_segments() -> Result<()> {
        let client = AzureBlobClient::with_sas(
            "https://acct.blob.core.windows.net",
            "?sv=2021-08-06&sig=abc",
        )?;
        let url = client.url(&["ws01", "disks/c-01-02-2024-10-00-00/my docs/a#1.txt"], &[])?;

        assert_eq!(url.host_str(), Some("acct.blob.core.windows.net"));
        assert_eq!(url.path(), "/ws01/disks/c-01-02-2024-10-00-00/my%20docs/a%231.txt");
        assert_eq!(url.query(), Some("sv=2021-08-06&sig=abc"));
        Ok(())
    }

    #[test]
    fn test_url_keeps_endpoint_path() -> Result<()> {
        let client = AzureBlobClient::anonymous("http://127.0.0.1:10000/devstoreaccount1")?;
        let url = client.url(&["sas-token", "ws01.txt"], &[])?;

        assert_eq!(url.path(), "/devstoreaccount1/sas-token/ws01.txt");
        assert_eq!(url.query(), None);
        Ok(())
    }

    #[test]
    fn test_url_appends_params_after_sas() -> Result<()> {
        let client =
            AzureBlobClient::with_sas("https://acct.blob.core.windows.net/", "sv=1&sig=x")?;
        let url = client.url(&["ws01"], &[("restype", "container")])?;

        assert_eq!(url.path(), "/ws01");
        assert_eq!(url.query(), Some("sv=1&sig=x&restype=container"));
        Ok(())
    }

    #[test]
    fn test_empty_sas_rejected() {
        assert!(AzureBlobClient::with_sas("https://acct.blob.core.windows.net", " ? ").is_err());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(AzureBlobClient::anonymous("not a url").is_err());
        assert!(AzureBlobClient::anonymous("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_block_ids_have_equal_length() {
        let ids: Vec<String> = [0u64, 9, 10, 49_999].iter().map(|i| block_id(*i)).collect();
        assert!(ids.iter().all(|id| id.len() == ids[0].len()));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_block_list_xml() {
        let xml = block_list_xml(&["QQ==".to_string(), "Qg==".to_string()]);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><BlockList><Latest>QQ==</Latest><Latest>Qg==</Latest></BlockList>"
        );
    }

    #[test]
    fn test_store_name_is_endpoint() -> Result<()> {
        let client = AzureBlobClient::with_sas("https://acct.blob.core.windows.net", "sig=secret")?;
        assert_eq!(client.store_name(), "https://acct.blob.core.windows.net");
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_errors() -> Result<()> {
        let client = AzureBlobClient::anonymous("http://127.0.0.1:9")?;
        assert!(client.read_blob_text("sas-token", "ws01.txt").await.is_err());
        assert!(client.container_exists("ws01").await.is_err());
        Ok(())
    }
}
