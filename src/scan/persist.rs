//! Scan result serialization and disk I/O
//!
//! Binary form: a flat `[f32; 3]` list archived with rkyv and LZ4
//! compressed. JSON form goes through serde for hand editing.

use super::ScanResult;
use crate::core::Error;
use crate::core::types::{Result, Vec3};
use rkyv::{Archive, Deserialize, Serialize};
use std::path::Path;

/// Bumped whenever the archived layout changes.
pub const SCAN_FORMAT_VERSION: u32 = 1;

/// Serializable scan data
#[derive(Archive, Deserialize, Serialize)]
struct ScanArchive {
    version: u32,
    points: Vec<[f32; 3]>,
}

/// Serialize a scan result to bytes (uncompressed)
pub fn serialize_scan(result: &ScanResult) -> Result<Vec<u8>> {
    let data = ScanArchive {
        version: SCAN_FORMAT_VERSION,
        points: result.points().iter().map(|p| p.to_array()).collect(),
    };

    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&data)
        .map_err(|e| Error::Persist(e.to_string()))?;

    Ok(bytes.to_vec())
}

/// Deserialize a scan result from bytes (uncompressed)
pub fn deserialize_scan(data: &[u8]) -> Result<ScanResult> {
    // Archived data must be aligned; copies from disk or lz4 may not be.
    let mut aligned = rkyv::util::AlignedVec::<16>::new();
    aligned.extend_from_slice(data);

    let archived = rkyv::access::<ArchivedScanArchive, rkyv::rancor::Error>(&aligned[..])
        .map_err(|e| Error::Persist(e.to_string()))?;

    let scan: ScanArchive = rkyv::deserialize::<ScanArchive, rkyv::rancor::Error>(archived)
        .map_err(|e| Error::Persist(e.to_string()))?;

    if scan.version != SCAN_FORMAT_VERSION {
        return Err(Error::Persist(format!(
            "unsupported scan format version {} (expected {})",
            scan.version, SCAN_FORMAT_VERSION
        )));
    }

    Ok(ScanResult::from_points(
        scan.points.into_iter().map(Vec3::from_array).collect(),
    ))
}

/// Serialize and LZ4 compress a scan result
pub fn compress_scan(result: &ScanResult) -> Result<Vec<u8>> {
    let serialized = serialize_scan(result)?;
    Ok(lz4_flex::compress_prepend_size(&serialized))
}

/// Decompress and deserialize a scan result
pub fn decompress_scan(data: &[u8]) -> Result<ScanResult> {
    let decompressed = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| Error::Persist(format!("LZ4 decompression failed: {}", e)))?;
    deserialize_scan(&decompressed)
}

/// Save a scan result to disk (compressed)
pub fn save_scan(path: &Path, result: &ScanResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let data = compress_scan(result)?;
    std::fs::write(path, data)?;
    log::info!("Saved {} scan points to {}", result.len(), path.display());
    Ok(())
}

/// Load a scan result from disk (compressed)
pub fn load_scan(path: &Path) -> Result<ScanResult> {
    let data = std::fs::read(path)?;
    let result = decompress_scan(&data)?;
    log::info!("Loaded {} scan points from {}", result.len(), path.display());
    Ok(result)
}

/// JSON form of a scan result
pub fn scan_to_json(result: &ScanResult) -> Result<String> {
    Ok(serde_json::to_string(result)?)
}

pub fn scan_from_json(json: &str) -> Result<ScanResult> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scan() -> ScanResult {
        ScanResult::from_points(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.3, 0.1, 0.0),
            Vec3::new(-2.5, 7.25, 100.0),
        ])
    }

    #[test]
    fn test_compressed_roundtrip() {
        let scan = sample_scan();
        let bytes = compress_scan(&scan).unwrap();
        assert_eq!(decompress_scan(&bytes).unwrap(), scan);
    }

    #[test]
    fn test_empty_scan_roundtrip() {
        let bytes = compress_scan(&ScanResult::default()).unwrap();
        assert!(decompress_scan(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans").join("meadow.scan");
        let scan = sample_scan();
        save_scan(&path, &scan).unwrap();
        assert_eq!(load_scan(&path).unwrap(), scan);
    }

    #[test]
    fn test_corrupt_data_rejected() {
        assert!(matches!(decompress_scan(&[1, 2, 3]), Err(Error::Persist(_))));
        let mut bytes = serialize_scan(&sample_scan()).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(deserialize_scan(&bytes).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_scan(&dir.path().join("nope")), Err(Error::Io(_))));
    }

    #[test]
    fn test_json_form() {
        let scan = sample_scan();
        let json = scan_to_json(&scan).unwrap();
        assert!(json.contains("points"));
        assert_eq!(scan_from_json(&json).unwrap(), scan);
    }
}
