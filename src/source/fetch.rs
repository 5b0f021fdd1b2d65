//! HTTP retrieval with bounded redirect following
//!
//! Downloads are streamed to disk in chunks while a running digest is
//! updated, so the body is never held in memory as a whole.

use crate::error::{FryerError, FryerResult};
use crate::source::checksum::{ChecksumAlgorithm, CHUNK_SIZE};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};
use ureq::Agent;
use url::Url;

/// Outcome of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// URL the body was finally served from, after redirects
    pub final_url: String,

    /// Lowercase hex digest of the body
    pub digest: String,

    /// Number of body bytes written
    pub bytes: u64,
}

/// Blocking HTTP client that follows a bounded number of redirects itself
#[derive(Clone)]
pub struct Fetcher {
    agent: Agent,
    max_redirects: u32,
}

impl Fetcher {
    pub const DEFAULT_MAX_REDIRECTS: u32 = 3;

    pub fn new() -> Self {
        Self::with_max_redirects(Self::DEFAULT_MAX_REDIRECTS)
    }

    pub fn with_max_redirects(max_redirects: u32) -> Self {
        // Redirects and error statuses are handled here, not by the agent
        let agent: Agent = Agent::config_builder()
            .max_redirects(0)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            max_redirects,
        }
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// GET `url`, following redirects, and stream the body into `dest`
    /// while hashing it with `algorithm`.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        algorithm: ChecksumAlgorithm,
    ) -> FryerResult<Fetched> {
        let mut current = Url::parse(url).map_err(|e| FryerError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let mut redirects_left = self.max_redirects;

        loop {
            let response = self
                .agent
                .get(current.as_str())
                .call()
                .map_err(|e| FryerError::Transport {
                    url: current.to_string(),
                    reason: e.to_string(),
                })?;

            let status = response.status();

            if status.is_redirection() {
                if redirects_left == 0 {
                    return Err(FryerError::TooManyRedirects {
                        url: url.to_string(),
                    });
                }

                let location = response
                    .headers()
                    .get("location")
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| FryerError::Transport {
                        url: current.to_string(),
                        reason: format!("redirect {} without a Location header", status.as_u16()),
                    })?;
                let next = current.join(location).map_err(|e| FryerError::InvalidUrl {
                    url: location.to_string(),
                    reason: e.to_string(),
                })?;

                debug!(url = %current, location = %next, "Following redirect");
                redirects_left -= 1;
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(FryerError::HttpStatus {
                    url: current.to_string(),
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("").to_string(),
                });
            }

            info!(url = %current, dest = %dest.display(), "Fetching");
            let body = response.into_body().into_reader();
            let (digest, bytes) = stream_to_file(body, dest, algorithm, current.as_str())?;
            debug!(url = %current, checksum = %digest, bytes, "Got checksum");

            return Ok(Fetched {
                final_url: current.to_string(),
                digest,
                bytes,
            });
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy `body` into a freshly created `dest`, hashing as it goes.
///
/// Read failures are transport errors, write failures are cache write
/// errors. The file handle is closed on every path when it goes out of scope.
fn stream_to_file(
    mut body: impl Read,
    dest: &Path,
    algorithm: ChecksumAlgorithm,
    url: &str,
) -> FryerResult<(String, u64)> {
    let write_err = |source: io::Error| FryerError::CacheWrite {
        path: dest.to_path_buf(),
        source,
    };

    let mut file = File::create(dest).map_err(write_err)?;
    let mut hasher = algorithm.hasher();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(FryerError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n]).map_err(write_err)?;
        total += n as u64;
    }

    file.flush().map_err(write_err)?;
    Ok((hasher.finalize_hex(), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BODY: &[u8] = b"hello world";
    const BODY_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn redirect(server: &mut mockito::Server, from: &str, to: &str) -> mockito::Mock {
        let location = format!("{}{}", server.url(), to);
        server
            .mock("GET", from)
            .with_status(302)
            .with_header("location", &location)
            .create()
    }

    #[test]
    fn fetch_streams_body_and_hashes() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/foo.tar")
            .with_status(200)
            .with_body(BODY)
            .expect(1)
            .create();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("foo.tar");

        let url = format!("{}/foo.tar", server.url());
        let fetched = Fetcher::new()
            .fetch(&url, &dest, ChecksumAlgorithm::Sha256)
            .unwrap();

        mock.assert();
        assert_eq!(fetched.digest, BODY_SHA256);
        assert_eq!(fetched.final_url, url);
        assert_eq!(fetched.bytes, BODY.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), BODY);
    }

    #[test]
    fn follows_three_redirects() {
        let mut server = mockito::Server::new();
        let _r1 = redirect(&mut server, "/r1", "/r2");
        let _r2 = redirect(&mut server, "/r2", "/r3");
        let _r3 = redirect(&mut server, "/r3", "/final.tar");
        let _final = server
            .mock("GET", "/final.tar")
            .with_status(200)
            .with_body(BODY)
            .create();
        let dir = TempDir::new().unwrap();

        let fetched = Fetcher::new()
            .fetch(
                &format!("{}/r1", server.url()),
                &dir.path().join("out"),
                ChecksumAlgorithm::Sha256,
            )
            .unwrap();

        assert_eq!(fetched.final_url, format!("{}/final.tar", server.url()));
        assert_eq!(fetched.digest, BODY_SHA256);
    }

    #[test]
    fn four_redirects_exceed_budget() {
        let mut server = mockito::Server::new();
        let _r1 = redirect(&mut server, "/r1", "/r2");
        let _r2 = redirect(&mut server, "/r2", "/r3");
        let _r3 = redirect(&mut server, "/r3", "/r4");
        let _r4 = redirect(&mut server, "/r4", "/final.tar");
        let never = server
            .mock("GET", "/final.tar")
            .with_status(200)
            .with_body(BODY)
            .expect(0)
            .create();
        let dir = TempDir::new().unwrap();

        let err = Fetcher::new()
            .fetch(
                &format!("{}/r1", server.url()),
                &dir.path().join("out"),
                ChecksumAlgorithm::Sha256,
            )
            .unwrap_err();

        never.assert();
        assert!(matches!(err, FryerError::TooManyRedirects { .. }));
        assert!(err.is_cache_failure());
    }

    #[test]
    fn relative_location_is_resolved() {
        let mut server = mockito::Server::new();
        let _r = server
            .mock("GET", "/dl/latest")
            .with_status(301)
            .with_header("location", "v2/foo.tar")
            .create();
        let _final = server
            .mock("GET", "/dl/v2/foo.tar")
            .with_status(200)
            .with_body(BODY)
            .create();
        let dir = TempDir::new().unwrap();

        let fetched = Fetcher::new()
            .fetch(
                &format!("{}/dl/latest", server.url()),
                &dir.path().join("out"),
                ChecksumAlgorithm::Sha256,
            )
            .unwrap();

        assert_eq!(fetched.final_url, format!("{}/dl/v2/foo.tar", server.url()));
    }

    #[test]
    fn error_status_carries_code_and_message() {
        let mut server = mockito::Server::new();
        let _m = server.mock("GET", "/missing.tar").with_status(404).create();
        let dir = TempDir::new().unwrap();
        let url = format!("{}/missing.tar", server.url());

        let err = Fetcher::new()
            .fetch(&url, &dir.path().join("out"), ChecksumAlgorithm::Sha256)
            .unwrap_err();

        match err {
            FryerError::HttpStatus {
                url: failed,
                status,
                message,
            } => {
                assert_eq!(failed, url);
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unwritable_destination_is_cache_write_error() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/foo.tar")
            .with_status(200)
            .with_body(BODY)
            .create();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("foo.tar");

        let err = Fetcher::new()
            .fetch(
                &format!("{}/foo.tar", server.url()),
                &dest,
                ChecksumAlgorithm::Sha256,
            )
            .unwrap_err();

        assert!(matches!(err, FryerError::CacheWrite { .. }));
        assert!(err.is_cache_failure());
    }

    fn fetch_via_redirect(location: &str, from: &str, to: &str) -> Fetched {
        let mut server = mockito::Server::new();
        let _r = server
            .mock("GET", from)
            .with_status(302)
            .with_header("location", location)
            .create();
        let _final = server
            .mock("GET", to)
            .with_status(200)
            .with_body(BODY)
            .create();
        let dir = TempDir::new().unwrap();

        let fetched = Fetcher::new()
            .fetch(
                &format!("{}{}", server.url(), from),
                &dir.path().join("out"),
                ChecksumAlgorithm::Sha256,
            )
            .unwrap();
        assert_eq!(fetched.final_url, format!("{}{}", server.url(), to));
        fetched
    }

    #[test]
    fn query_only_location_keeps_path() {
        let mut server = mockito::Server::new();
        let _r = server
            .mock("GET", "/dl/file.tar")
            .match_query(mockito::Matcher::Missing)
            .with_status(302)
            .with_header("location", "?v=2")
            .create();
        let _final = server
            .mock("GET", "/dl/file.tar")
            .match_query(mockito::Matcher::UrlEncoded("v".into(), "2".into()))
            .with_status(200)
            .with_body(BODY)
            .create();
        let dir = TempDir::new().unwrap();

        let fetched = Fetcher::new()
            .fetch(
                &format!("{}/dl/file.tar", server.url()),
                &dir.path().join("out"),
                ChecksumAlgorithm::Sha256,
            )
            .unwrap();

        assert_eq!(fetched.final_url, format!("{}/dl/file.tar?v=2", server.url()));
        assert_eq!(fetched.digest, BODY_SHA256);
    }

    #[test]
    fn dot_segments_in_location_are_removed() {
        let fetched = fetch_via_redirect("../c/x.tar", "/a/b/file", "/a/c/x.tar");
        assert_eq!(fetched.digest, BODY_SHA256);
    }

    #[test]
    fn absolute_path_location() {
        fetch_via_redirect("/root.tar", "/a/b/file", "/root.tar");
    }

    #[test]
    fn invalid_source_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = Fetcher::new()
            .fetch("not a url", &dir.path().join("out"), ChecksumAlgorithm::Sha256)
            .unwrap_err();
        assert!(matches!(err, FryerError::InvalidUrl { .. }));
    }
}
