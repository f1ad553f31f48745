//! Replay file storage with Zstd compression.
//!
//! Replays are stored as compressed binary files in `{dir}/{hash}.r`.
//! Data is serialized with `bincode` before compression to minimize size.

use crate::error::{Error, Result};
use crate::models::replay::ReplayData;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zstd::stream::{decode_all, encode_all};

/// Zstd level used for new replays.
const COMPRESSION_LEVEL: i32 = 19;

/// Name a replay is stored under: its chart md5, or the md5 of its
/// encoded inputs when it has none.
pub fn replay_hash(data: &ReplayData) -> Result<String> {
    if let Some(md5) = &data.map_md5 {
        return Ok(md5.clone());
    }

    let binary_data = bincode::serde::encode_to_vec(data, bincode::config::standard())
        .map_err(|e| Error::ReplayDecode(format!("Serialization error: {}", e)))?;
    Ok(format!("{:x}", md5::compute(&binary_data)))
}

/// Get the path for a replay file given its hash.
pub fn replay_path(dir: &Path, hash: &str) -> PathBuf {
    dir.join(format!("{}.r", hash))
}

/// Save replay data to a compressed binary file. Returns the written path.
pub fn save_replay(dir: &Path, hash: &str, data: &ReplayData) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = replay_path(dir, hash);
    let mut file = File::create(&path)?;

    let binary_data = bincode::serde::encode_to_vec(data, bincode::config::standard())
        .map_err(|e| Error::ReplayDecode(format!("Serialization error: {}", e)))?;

    let compressed_data = encode_all(&binary_data[..], COMPRESSION_LEVEL)?;
    file.write_all(&compressed_data)?;

    log::debug!(
        "REPLAY: saved {} inputs to {:?}",
        data.inputs.len(),
        path
    );
    Ok(path)
}

/// Load and decompress replay data from file.
pub fn load_replay(dir: &Path, hash: &str) -> Result<ReplayData> {
    load_replay_from_path(&replay_path(dir, hash))
}

/// Load replay data from a specific path.
pub fn load_replay_from_path(path: &Path) -> Result<ReplayData> {
    let file = File::open(path)?;
    let binary_data = decode_all(file)?;

    let (mut data, _len): (ReplayData, usize) =
        bincode::serde::decode_from_slice(&binary_data, bincode::config::standard())
            .map_err(|e| Error::ReplayDecode(format!("Deserialization error: {}", e)))?;

    data.validate()?;
    Ok(data)
}

/// Check if a replay file exists.
pub fn replay_exists(dir: &Path, hash: &str) -> bool {
    replay_path(dir, hash).exists()
}
