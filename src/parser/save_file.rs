use std::{error, fs::File, io::{Cursor, Read}, path::Path, rc::Rc};

use derive_more::{Display, From};
use flate2::read::GzDecoder;
use zip::{read::ZipArchive, result::ZipError};

use super::{
    game_object::GameObjectMap,
    section::{parse_root, Section},
    section_reader,
};

/// The magic of the binary save format, which this tool does not read.
const BINARY_HEADER: &[u8] = b"HOI4bin";
/// The header of a zip archive wrapped save.
const ZIP_HEADER: &[u8; 4] = b"PK\x03\x04";
/// The header of a gzip wrapped save.
const GZIP_HEADER: &[u8; 2] = &[0x1f, 0x8b];

/// How much of the document prefix [SaveFile::header] parses.
const HEADER_PREFIX_LEN: usize = 4096;

/// An error that can occur when opening a save file.
/// These are the only true errors in the crate: everything past the
/// I/O boundary degrades to absence instead of failing.
#[derive(Debug, Display, From)]
pub enum SaveFileError {
    #[display("IO error: {_0}")]
    #[from]
    IoError(std::io::Error),
    #[display("Parse error: {_0}")]
    ParseError(&'static str),
    #[display("Decompression error: {_0}")]
    #[from]
    DecompressionError(ZipError),
}

impl error::Error for SaveFileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SaveFileError::IoError(e) => Some(e),
            SaveFileError::DecompressionError(e) => Some(e),
            SaveFileError::ParseError(_) => None,
        }
    }
}

/// A HOI4 save file, held in memory as decompressed UTF-8 text.
///
/// The text is loaded once and then only ever scanned selectively:
/// country blocks and catalogue blocks are located by raw brace
/// counting and parsed individually, so repeated country queries
/// against one loaded save never re-read or re-tokenize the document.
pub struct SaveFile {
    /// The contents of the save file, shared between all sections
    contents: Rc<String>,
}

impl SaveFile {
    /// Open a save file from disk.
    ///
    /// # Compression
    ///
    /// Saves come in three shapes: plain text, a zip archive holding
    /// the text as its first entry, and a gzip stream. The wrapper is
    /// detected from the leading bytes and undone here, so everything
    /// downstream only ever sees text. The binary save format
    /// (`HOI4bin`) is rejected outright.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SaveFile, SaveFileError> {
        let mut file = File::open(path)?;
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        Self::from_bytes(raw)
    }

    /// Decode raw save bytes. Also the test and collaborator entry
    /// point for already-read data.
    pub fn from_bytes(raw: Vec<u8>) -> Result<SaveFile, SaveFileError> {
        if raw.starts_with(BINARY_HEADER) {
            return Err(SaveFileError::ParseError(
                "this is a binary save; switch the game to text saves and re-save",
            ));
        }
        let contents = if raw.starts_with(ZIP_HEADER) {
            let mut archive = ZipArchive::new(Cursor::new(raw))?;
            let mut gamestate = archive.by_index(0)?;
            if gamestate.is_dir() {
                return Err(SaveFileError::ParseError("save archive holds a directory"));
            }
            let mut contents = String::new();
            gamestate.read_to_string(&mut contents)?;
            contents
        } else if raw.starts_with(GZIP_HEADER) {
            let mut decoder = GzDecoder::new(Cursor::new(raw));
            let mut contents = String::new();
            decoder.read_to_string(&mut contents)?;
            contents
        } else {
            match String::from_utf8(raw) {
                Ok(contents) => contents,
                Err(_) => {
                    return Err(SaveFileError::ParseError("save file is not valid UTF-8"));
                }
            }
        };
        Ok(SaveFile::from_text(contents))
    }

    /// Wrap already-decompressed save text.
    pub fn from_text(contents: String) -> SaveFile {
        SaveFile {
            contents: Rc::new(contents),
        }
    }

    /// Best-effort parse of the document prefix, for cheap access to
    /// the top level scalars a save starts with (`player`, `date`).
    pub fn header(&self) -> GameObjectMap {
        let mut end = self.contents.len().min(HEADER_PREFIX_LEN);
        while end < self.contents.len() && !self.contents.is_char_boundary(end) {
            end -= 1;
        }
        // stop before the first big block so the truncation point
        // cannot fall inside one
        let prefix = &self.contents[..end];
        let prefix = match prefix.find('{') {
            Some(open) => &prefix[..open],
            None => prefix,
        };
        parse_root(prefix)
    }

    /// Locate a top level `key={...}` block, as a [Section].
    pub fn top_level_block(&self, key: &str) -> Option<Section> {
        let range = section_reader::find_top_level_block(&self.contents, key)?;
        Some(Section::new(key.to_owned(), &self.contents[range]))
    }

    /// Locate one named child block inside a top level container.
    pub fn child_block(&self, container_key: &str, child_tag: &str) -> Option<Section> {
        section_reader::find_child_block(&self.contents, container_key, child_tag)
    }

    /// Every child tag of a top level container, sorted.
    pub fn child_tags(&self, container_key: &str) -> Vec<String> {
        section_reader::list_child_tags(&self.contents, container_key)
    }
}

#[cfg(test)]
mod tests {

    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};
    use tempfile::NamedTempFile;
    use zip::{write::SimpleFileOptions, ZipWriter};

    use super::*;

    const SAVE: &str = "
        player=\"FRA\"
        date=\"1936.1.1\"
        countries={
            FRA={
                stability=0.55
            }
        }
    ";

    fn open_raw(bytes: &[u8]) -> Result<SaveFile, SaveFileError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        SaveFile::open(file.path())
    }

    #[test]
    fn test_plain_text() {
        let save = open_raw(SAVE.as_bytes()).unwrap();
        assert_eq!(save.child_tags("countries"), vec!["FRA"]);
    }

    #[test]
    fn test_header() {
        let save = SaveFile::from_text(SAVE.to_owned());
        let header = save.header();
        assert_eq!(*header.get_string("player").unwrap(), "FRA".to_owned());
        assert_eq!(*header.get_string("date").unwrap(), "1936.1.1".to_owned());
        // nothing behind the first block leaks into the header
        assert!(header.get("countries").is_none());
    }

    #[test]
    fn test_zip_wrapped() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("gamestate", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(SAVE.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let save = open_raw(&bytes).unwrap();
        assert_eq!(save.child_tags("countries"), vec!["FRA"]);
    }

    #[test]
    fn test_gzip_wrapped() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAVE.as_bytes()).unwrap();
        let bytes = encoder.finish().unwrap();
        let save = open_raw(&bytes).unwrap();
        assert_eq!(save.child_tags("countries"), vec!["FRA"]);
    }

    #[test]
    fn test_binary_rejected() {
        let mut bytes = b"HOI4bin".to_vec();
        bytes.extend_from_slice(&[0, 1, 2, 3]);
        assert!(matches!(
            open_raw(&bytes),
            Err(SaveFileError::ParseError(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(matches!(
            open_raw(&[0xff, 0xfe, 0x00]),
            Err(SaveFileError::ParseError(_))
        ));
    }

    #[test]
    fn test_child_block_parses() {
        let save = SaveFile::from_text(SAVE.to_owned());
        let obj = save.child_block("countries", "FRA").unwrap().parse();
        assert_eq!(obj.get_real("stability"), Some(0.55));
    }
}
