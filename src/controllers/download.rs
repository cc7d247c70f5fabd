use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::{
    error::{AppError, AppResult},
    infrastructure::store::{guess_mime, parse_range, resolve_within_root},
};

pub struct DownloadController {
    output_root: PathBuf,
}

impl DownloadController {
    pub fn new(output_root: PathBuf) -> Self {
        Self { output_root }
    }

    /// GET /download/{path} - Stream a stored file, honoring byte ranges.
    /// The path segment is attacker-controlled, so it is canonicalized
    /// against the output root before anything is opened.
    pub async fn download(
        State(controller): State<Arc<DownloadController>>,
        AxumPath(relative): AxumPath<String>,
        request_headers: HeaderMap,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let resolved = resolve_within_root(&controller.output_root, &relative).await?;

        let metadata = tokio::fs::metadata(&resolved).await?;
        if !metadata.is_file() {
            return Err(AppError::NotFound(format!("no such file: {}", relative)));
        }
        let file_size = metadata.len();

        let filename = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            guess_mime(&resolved).parse().unwrap(),
        );
        headers.insert(header::ACCEPT_RANGES, "bytes".parse().unwrap());

        let range_header = request_headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok());

        match range_header {
            None => {
                // Stream from disk; audio files can be large
                let file = tokio::fs::File::open(&resolved).await?;
                headers.insert(
                    header::CONTENT_LENGTH,
                    file_size.to_string().parse().unwrap(),
                );
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename)
                        .parse()
                        .unwrap(),
                );
                Ok((StatusCode::OK, headers, Body::from_stream(ReaderStream::new(file))))
            }
            Some(raw) => {
                let range = parse_range(raw, file_size)?;

                let mut file = tokio::fs::File::open(&resolved).await?;
                file.seek(std::io::SeekFrom::Start(range.start)).await?;
                let mut bytes = vec![0u8; range.len() as usize];
                file.read_exact(&mut bytes).await?;

                headers.insert(
                    header::CONTENT_LENGTH,
                    range.len().to_string().parse().unwrap(),
                );
                headers.insert(
                    header::CONTENT_RANGE,
                    range.content_range(file_size).parse().unwrap(),
                );
                headers.insert(header::CONTENT_DISPOSITION, "inline".parse().unwrap());
                Ok((StatusCode::PARTIAL_CONTENT, headers, Body::from(bytes)))
            }
        }
    }
}
