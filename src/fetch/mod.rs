// src/fetch/mod.rs

use anyhow::{ensure, Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::{fs, path::Path};
use tracing::{info, warn};
use url::Url;

use crate::process::read_csv;

/// Build the blocking client shared by every request of a run.
pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("reopening/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}

/// GET `url` and return the body as-is.
///
/// Non-success statuses are logged but the body is still returned.
pub fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let url = Url::parse(url).with_context(|| format!("parsing URL {}", url))?;
    let resp = client
        .get(url.clone())
        .send()
        .with_context(|| format!("GET {}", url))?;
    let status = resp.status();
    if !status.is_success() {
        warn!(%url, %status, "non-success status; keeping body anyway");
    }
    let bytes = resp
        .bytes()
        .with_context(|| format!("reading body from {}", url))?;
    Ok(bytes.to_vec())
}

/// Download `url` verbatim into the `.csv` file at `dest`.
#[tracing::instrument(level = "info", skip(client), fields(dest = %dest.display()))]
pub fn download_csv(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let is_csv = dest
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(".csv"));
    ensure!(
        is_csv,
        "Incorrect file type in download_csv, expected csv, got: {}",
        dest.display()
    );

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }

    let bytes = fetch_bytes(client, url)?;
    fs::write(dest, &bytes).with_context(|| format!("writing {:?}", dest))?;
    info!(path = %dest.display(), bytes = bytes.len(), "downloaded");
    Ok(())
}

/// GET a CSV and deserialize it in memory without touching disk.
pub fn fetch_csv<T: DeserializeOwned>(client: &Client, url: &str) -> Result<Vec<T>> {
    let bytes = fetch_bytes(client, url)?;
    read_csv(bytes.as_slice()).with_context(|| format!("parsing CSV from {}", url))
}

/// One-shot HTTP stub for tests: answers the first request with
/// `status_line` and `body`, then closes. Returns the base URL.
#[cfg(test)]
pub(crate) fn serve_once(status_line: &str, body: &str) -> String {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut req = Vec::new();
            let mut buf = [0u8; 1024];
            while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => req.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    format!("http://{}", addr)
}
