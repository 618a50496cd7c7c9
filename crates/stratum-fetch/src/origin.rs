use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// User agent sent with every remote request.
pub const USER_AGENT: &str = concat!("stratum/", env!("CARGO_PKG_VERSION"));

/// Where repository objects come from.
///
/// An origin hands out the bytes of a named object exactly as stored.
/// Any failure to produce them is reported as [`FetchError::NotFound`],
/// whether the object is absent or the transfer broke.
pub trait Origin: Send + Sync {
    /// Open a stream over the stored bytes of `name`.
    fn open(&self, name: &str) -> FetchResult<Box<dyn Read + Send>>;

    /// Human-readable location of this origin (directory or base URL).
    fn location(&self) -> String;
}

/// Origin backed by a repository directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalOrigin {
    root: PathBuf,
}

impl LocalOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Origin for LocalOrigin {
    fn open(&self, name: &str) -> FetchResult<Box<dyn Read + Send>> {
        let path = self.root.join(name);
        let file = File::open(&path).map_err(|e| FetchError::not_found(name, e))?;
        debug!(path = %path.display(), "reading from local origin");
        Ok(Box::new(file))
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Origin backed by an HTTP endpoint serving the repository layout.
#[derive(Clone, Debug)]
pub struct RemoteOrigin {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RemoteOrigin {
    /// Create an origin for `base_url`; `timeout` bounds each whole request.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> FetchResult<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Full URL of an object.
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

impl Origin for RemoteOrigin {
    fn open(&self, name: &str) -> FetchResult<Box<dyn Read + Send>> {
        let url = self.url_for(name);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::not_found(name, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::not_found(name, format!("HTTP {status} from {url}")));
        }
        debug!(%url, "streaming from remote origin");
        Ok(Box::new(response))
    }

    fn location(&self) -> String {
        self.base_url.clone()
    }
}

/// HTTP origin for tests in this and dependent crates.
#[cfg(any(test, feature = "test-util"))]
pub mod test_server {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    use axum::http::{HeaderMap, StatusCode, Uri};

    /// Serve `dir` over HTTP on an ephemeral port and return its base URL.
    ///
    /// Requests without the Stratum user agent are refused with 403.
    pub fn serve_dir(dir: PathBuf) -> String {
        let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                let app = axum::Router::new().fallback(move |uri: Uri, headers: HeaderMap| {
                    let dir = dir.clone();
                    async move {
                        let agent = headers
                            .get("user-agent")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default();
                        if agent != super::USER_AGENT {
                            return (StatusCode::FORBIDDEN, Vec::new());
                        }
                        let path = dir.join(uri.path().trim_start_matches('/'));
                        match std::fs::read(path) {
                            Ok(bytes) => (StatusCode::OK, bytes),
                            Err(_) => (StatusCode::NOT_FOUND, Vec::new()),
                        }
                    }
                });
                axum::serve(listener, app).await.unwrap();
            });
        });
        format!("http://{}", rx.recv().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(mut reader: Box<dyn Read + Send>) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn local_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".published"), b"manifest").unwrap();
        let origin = LocalOrigin::new(dir.path());
        assert_eq!(read_all(origin.open(".published").unwrap()), b"manifest");
        assert_eq!(origin.location(), dir.path().display().to_string());
    }

    #[test]
    fn local_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let origin = LocalOrigin::new(dir.path());
        let err = origin.open("data/ab/cdef").err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn url_join_tolerates_trailing_slash() {
        let origin = RemoteOrigin::new("http://example.org/repo/", None).unwrap();
        assert_eq!(
            origin.url_for("data/ab/cd"),
            "http://example.org/repo/data/ab/cd"
        );
    }

    #[test]
    fn remote_serves_with_user_agent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data/ab")).unwrap();
        std::fs::write(dir.path().join("data/ab/cdef"), b"remote bytes").unwrap();
        let base = test_server::serve_dir(dir.path().to_path_buf());

        let origin = RemoteOrigin::new(base, Some(Duration::from_secs(10))).unwrap();
        assert_eq!(read_all(origin.open("data/ab/cdef").unwrap()), b"remote bytes");
    }

    #[test]
    fn remote_404_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let base = test_server::serve_dir(dir.path().to_path_buf());
        let origin = RemoteOrigin::new(base, Some(Duration::from_secs(10))).unwrap();
        let err = origin.open(".published").err().unwrap();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn unreachable_host_is_not_found() {
        // Port 9 (discard) on loopback is closed in test environments.
        let origin =
            RemoteOrigin::new("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();
        let err = origin.open(".published").err().unwrap();
        assert!(err.is_not_found());
    }
}
