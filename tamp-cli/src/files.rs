//! Static file handler served by `tamp serve`

use async_trait::async_trait;
use http::{header, Method, Request, Response, StatusCode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tamp_core::response::{responses, ResponseBuilder};
use tamp_core::{Body, Error, Handler, Result};

/// Serves files below a root directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    /// Serve `root`, answering directory requests with `index`
    pub fn new(root: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index: index.into(),
        }
    }

    /// Map a request path onto the filesystem, refusing to leave the root
    fn resolve(&self, uri_path: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();

        for segment in uri_path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." || segment.contains('\\') {
                return Err(Error::Forbidden(uri_path.to_string()));
            }
            path.push(segment);
        }

        Ok(path)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => Error::Forbidden(path.display().to_string()),
            _ => Error::Io(e),
        })
    }
}

#[async_trait]
impl Handler for StaticFiles {
    async fn call(&self, req: Request<Body>) -> Result<Response<Body>> {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return ResponseBuilder::new(StatusCode::METHOD_NOT_ALLOWED)
                .header(header::ALLOW, "GET, HEAD")
                .build();
        }

        let mut path = match self.resolve(req.uri().path()) {
            Ok(path) => path,
            Err(e) => return responses::from_error(&e),
        };

        if tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            path.push(&self.index);
        }

        let data = match self.read(&path).await {
            Ok(data) => data,
            Err(e @ (Error::NotFound(_) | Error::Forbidden(_))) => {
                tracing::debug!(path = %path.display(), error = %e, "File not served");
                return responses::from_error(&e);
            }
            Err(e) => return Err(e),
        };

        responses::ok()
            .content_type(content_type_for(&path))
            .bytes(data)
    }
}

/// Content type for a served file
///
/// `mime_guess` reports scripts as `text/javascript`; they are served as
/// `application/javascript` so the default compressible set matches them.
fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    match mime.essence_str() {
        "text/javascript" => "application/javascript".to_string(),
        essence => essence.to_string(),
    }
}
