use crate::{ImportError, ImportResult};
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::codec::Transcoder;

/// Where an upload came from and how its bytes are packed.
#[derive(Debug, Clone)]
pub struct InputMeta {
    /// e.g. "application/gzip" or "text/csv"
    pub content_type: String,
    /// e.g. "gzip", "zstd", or empty
    pub content_encoding: String,
    /// original file name, used for extension fallback
    pub name_hint: String,
    /// Which character encoding to expect (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for InputMeta {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl InputMeta {
    /// Best-effort meta from a file name alone.
    pub fn from_file_name(name: &str) -> Self {
        let mut meta = Self {
            name_hint: name.to_string(),
            ..Default::default()
        };
        match Compression::from_extension(name) {
            Compression::Gzip => {
                meta.content_type = "application/gzip".into();
                meta.content_encoding = "gzip".into();
            }
            Compression::Zstd => {
                meta.content_type = "application/zstd".into();
                meta.content_encoding = "zstd".into();
            }
            Compression::None => meta.content_type = "text/csv".into(),
        }
        meta
    }

    /// Swap the expected charset, e.g. from a `--charset windows-1252` flag.
    pub fn with_charset(mut self, charset: &'static encoding_rs::Encoding) -> Self {
        self.charset = charset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// Content-Encoding wins over Content-Type, which wins over the file extension.
    pub fn detect(meta: &InputMeta) -> Self {
        let ce = meta.content_encoding.to_ascii_lowercase();
        let ct = meta.content_type.to_ascii_lowercase();

        if ce.split(',').any(|s| s.trim() == "gzip") {
            return Self::Gzip;
        }
        if ce.split(',').any(|s| s.trim() == "zstd") {
            return Self::Zstd;
        }
        match ct.as_str() {
            "application/gzip" | "application/x-gzip" => Self::Gzip,
            "application/zstd" => Self::Zstd,
            _ => Self::from_extension(&meta.name_hint),
        }
    }

    fn from_extension(name: &str) -> Self {
        if name.ends_with(".gz") {
            Self::Gzip
        } else if name.ends_with(".zst") {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

/// Wrap a raw byte source with decompression and UTF-8 transcoding as `meta` asks.
pub fn build_csv_reader<R>(raw: R, meta: &InputMeta) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = BufReader::with_capacity(64 * 1024, raw);
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = match Compression::detect(meta) {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::None => Box::new(buf),
    };

    if meta.charset == encoding_rs::UTF_8 {
        return decompressed;
    }

    let framed = FramedRead::new(decompressed, Transcoder::new(meta.charset));
    Box::new(StreamReader::new(framed))
}

/// Open a local upload. The returned reader owns the file handle, so dropping
/// it on any exit path closes the file.
pub async fn reader_from_path(
    path: &Path,
    charset: &'static encoding_rs::Encoding,
) -> ImportResult<(Box<dyn AsyncRead + Unpin + Send>, InputMeta)> {
    let file = File::open(path).await.map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let meta = InputMeta::from_file_name(name).with_charset(charset);
    let reader = build_csv_reader(file, &meta);
    Ok((reader, meta))
}
