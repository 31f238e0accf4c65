//! Shared helpers for integration tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use surfacer::{ExtractionResult, Extractor, ExtractorConfig};

/// Write the given files into a temp dir and extract from the first one.
pub fn extract(files: &[(&str, &str)]) -> ExtractionResult {
    extract_with_config(files, ExtractorConfig::default())
}

#[allow(dead_code)]
pub fn extract_with_config(files: &[(&str, &str)], config: ExtractorConfig) -> ExtractionResult {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    Extractor::new(config)
        .run(&temp.path().join(files[0].0))
        .expect("extraction should succeed")
}

/// Path to a checked-in fixture package.
#[allow(dead_code)]
pub fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}
