//! Torrent payload validation.
//!
//! Uses librqbit-core to decode bencoded .torrent data so that only
//! well-formed metainfo files are written to the watch directory.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use thiserror::Error;

/// Errors that can occur when validating torrent files.
#[derive(Debug, Error)]
pub enum TorrentParseError {
    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("Empty torrent (no files)")]
    EmptyTorrent,
}

/// Summary of a decoded torrent, used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentInfo {
    pub name: Option<String>,
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub total_bytes: u64,
}

/// Decode `bytes` as a torrent and make sure it describes at least one file.
pub fn validate_torrent(bytes: &[u8]) -> Result<TorrentInfo, TorrentParseError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentParseError::ParseError(e.to_string()))?;

    let info = &torrent.info;
    let total_bytes = match (&info.files, info.length) {
        (Some(files), _) if !files.is_empty() => files.iter().map(|f| f.length).sum(),
        (None, Some(length)) => length,
        _ => return Err(TorrentParseError::EmptyTorrent),
    };

    Ok(TorrentInfo {
        name: info
            .name
            .as_ref()
            .map(|b| String::from_utf8_lossy(b.as_ref()).into_owned()),
        info_hash: torrent.info_hash.as_string(),
        total_bytes,
    })
}
