//! Static file server for the output directory.
//!
//! A minimal HTTP/1.1 server: `GET` and `HEAD` only, one request per
//! connection. Directories serve their `index.html`, or a plain listing
//! when there is none.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Error while starting or running the server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: "text/plain; charset=utf-8", body: body.into().into_bytes() }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }
}

/// MIME type for a file extension.
fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Decode `%XX` escapes; `None` on malformed input.
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Map a request path onto `root`, refusing anything that escapes it.
fn local_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let path = request_path.split(['?', '#']).next().unwrap_or("");
    let decoded = percent_decode(path)?;

    let mut local = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(local)
}

async fn listing(dir: &Path, request_path: &str) -> std::io::Result<Response> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let base = if request_path.ends_with('/') { request_path.to_string() } else { format!("{}/", request_path) };
    let items: String = names
        .iter()
        .map(|n| format!("<li><a href=\"{}{}\">{}</a></li>", base, n, n))
        .collect();
    let body = format!("<!doctype html><title>{0}</title><h1>{0}</h1><ul>{1}</ul>", base, items);
    Ok(Response { status: 200, content_type: "text/html; charset=utf-8", body: body.into_bytes() })
}

/// Produce the response for `method` and `request_path` served from `root`.
pub async fn respond(root: &Path, method: &str, request_path: &str) -> Response {
    if method != "GET" && method != "HEAD" {
        return Response::text(405, "method not allowed");
    }
    let Some(path) = local_path(root, request_path) else {
        return Response::text(400, "bad request");
    };

    let result = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => {
            let index = path.join("index.html");
            if index.is_file() {
                tokio::fs::read(&index).await.map(|body| Response { status: 200, content_type: content_type(&index), body })
            } else {
                listing(&path, request_path).await
            }
        }
        Ok(_) => tokio::fs::read(&path).await.map(|body| Response { status: 200, content_type: content_type(&path), body }),
        Err(_) => return Response::text(404, "not found"),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!("failed to read {}: {}", path.display(), e);
        Response::text(500, "internal server error")
    })
}

async fn handle(root: &Path, stream: TcpStream) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    // Drain the remaining headers.
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let response = match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => {
            let response = respond(root, method, path).await;
            tracing::debug!(%method, %path, status = response.status, "request");
            if method == "HEAD" {
                Response { body: Vec::new(), ..response }
            } else {
                response
            }
        }
        _ => Response::text(400, "bad request"),
    };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.reason(),
        response.content_type,
        response.body.len()
    );
    let stream = reader.get_mut();
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    stream.shutdown().await
}

/// Bind the server socket.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ServeError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| ServeError::Bind { addr: format!("{}:{}", host, port), source })
}

/// Serve `root` on `listener` until the process exits.
pub async fn serve_listener(listener: TcpListener, root: PathBuf) -> Result<(), ServeError> {
    loop {
        let (stream, peer): (TcpStream, SocketAddr) = listener.accept().await?;
        let root = root.clone();
        tokio::spawn(async move {
            if let Err(e) = handle(&root, stream).await {
                tracing::debug!(%peer, "connection error: {}", e);
            }
        });
    }
}

/// Serve `root` on `host:port`, blocking the calling thread.
pub fn serve_blocking(root: PathBuf, host: &str, port: u16) -> Result<(), ServeError> {
    let rt = tokio::runtime::Runtime::new().map_err(ServeError::Runtime)?;
    rt.block_on(async {
        let listener = bind(host, port).await?;
        tracing::info!("serving {} on http://{}:{}", root.display(), host, port);
        serve_listener(listener, root).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("assets")).unwrap();
        fs::write(temp.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(temp.path().join("assets/main.css"), ".a{}").unwrap();
        fs::write(temp.path().join("assets/my icon.svg"), "<svg/>").unwrap();
        temp
    }

    #[test]
    fn test_local_path_rejects_traversal() {
        let root = Path::new("/srv");
        assert_eq!(local_path(root, "/a/b.css?v=1"), Some(PathBuf::from("/srv/a/b.css")));
        assert_eq!(local_path(root, "/../etc/passwd"), None);
        assert_eq!(local_path(root, "/%2e%2e/etc"), None);
        assert_eq!(local_path(root, "/%zz"), None);
    }

    #[tokio::test]
    async fn test_respond_serves_index_and_files() {
        let temp = site();

        let index = respond(temp.path(), "GET", "/").await;
        assert_eq!(index.status, 200);
        assert_eq!(index.body, b"<h1>home</h1>");

        let css = respond(temp.path(), "GET", "/assets/main.css").await;
        assert_eq!(css.content_type, "text/css; charset=utf-8");

        let icon = respond(temp.path(), "GET", "/assets/my%20icon.svg").await;
        assert_eq!(icon.status, 200);
        assert_eq!(icon.content_type, "image/svg+xml");
    }

    #[tokio::test]
    async fn test_respond_lists_directory_and_404s() {
        let temp = site();

        let listing = respond(temp.path(), "GET", "/assets").await;
        let body = String::from_utf8(listing.body).unwrap();
        assert!(body.contains("href=\"/assets/main.css\""));

        assert_eq!(respond(temp.path(), "GET", "/missing.css").await.status, 404);
        assert_eq!(respond(temp.path(), "POST", "/").await.status, 405);
    }

    #[tokio::test]
    async fn test_server_round_trip() {
        let temp = site();
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_listener(listener, temp.path().to_path_buf()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /assets/main.css HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Length: 4\r\n"));
        assert!(response.ends_with(".a{}"));
    }
}
