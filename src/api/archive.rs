use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::SaltResult;

/// Name of the single entry in a submission archive
pub const BLOCK_ENTRY: &str = "Block.xml";

/// Zip archive in memory holding the serialized block as its only entry
pub fn block_archive(xml: &[u8]) -> SaltResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(BLOCK_ENTRY, options)?;
    writer.write_all(xml)?;
    Ok(writer.finish()?.into_inner())
}
