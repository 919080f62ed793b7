//! Persistence of the active forge set across restarts.
//!
//! The stream is a fixed 8-byte header followed by one frame per active
//! forge. A frame is a little-endian `u32` payload length and a bitcode
//! encoding of a [`LocationRecord`]. Readers consume frames until a clean
//! end of data.

use crate::id::Location;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying an active-forge stream.
pub const ACTIVE_MAGIC: u32 = 0xF0E6_0001;

/// Current format version. Increment when breaking the frame format.
pub const FORMAT_VERSION: u32 = 1;

/// File name used by [`FileStore::in_dir`].
pub const ACTIVE_FILE_NAME: &str = "active_forges";

/// Frames larger than this are treated as corruption.
const MAX_FRAME_LEN: u32 = 64 * 1024;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from saving or restoring the active set.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("data too short for header")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", ACTIVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("record {index} is truncated")]
    Truncated { index: usize },
    #[error("record {index} has implausible length {len}")]
    FrameTooLarge { index: usize, len: u32 },
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("record {index} failed to decode: {reason}")]
    Decode { index: usize, reason: String },
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One persisted forge location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl From<&Location> for LocationRecord {
    fn from(at: &Location) -> Self {
        Self {
            world: at.world.clone(),
            x: at.x,
            y: at.y,
            z: at.z,
        }
    }
}

impl From<LocationRecord> for Location {
    fn from(record: LocationRecord) -> Self {
        Location::new(record.world, record.x, record.y, record.z)
    }
}

/// What a restore recovered. `error` is set when reading stopped early;
/// `locations` still holds every record parsed before that point.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    pub locations: Vec<Location>,
    pub error: Option<PersistError>,
}

// ---------------------------------------------------------------------------
// Stream codec
// ---------------------------------------------------------------------------

/// Write the header and one frame per location. Returns the record count.
pub fn write_records<'a, W: Write>(
    out: &mut W,
    locations: impl IntoIterator<Item = &'a Location>,
) -> Result<usize, PersistError> {
    out.write_all(&ACTIVE_MAGIC.to_le_bytes())?;
    out.write_all(&FORMAT_VERSION.to_le_bytes())?;

    let mut count = 0;
    for at in locations {
        let payload = bitcode::serialize(&LocationRecord::from(at))
            .map_err(|e| PersistError::Encode(e.to_string()))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| PersistError::Encode(format!("record for {at} too large")))?;
        out.write_all(&len.to_le_bytes())?;
        out.write_all(&payload)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

/// Read a header and frames until end of data.
pub fn read_records<R: Read>(input: &mut R) -> RestoreOutcome {
    let mut outcome = RestoreOutcome::default();
    if let Err(e) = read_header(input) {
        outcome.error = Some(e);
        return outcome;
    }

    loop {
        let index = outcome.locations.len();
        match read_frame(input, index) {
            Ok(Some(record)) => outcome.locations.push(record.into()),
            Ok(None) => break,
            Err(e) => {
                outcome.error = Some(e);
                break;
            }
        }
    }
    outcome
}

fn read_header<R: Read>(input: &mut R) -> Result<(), PersistError> {
    let mut header = [0u8; 8];
    match fill(input, &mut header)? {
        8 => {}
        _ => return Err(PersistError::TooShort),
    }
    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if magic != ACTIVE_MAGIC {
        return Err(PersistError::InvalidMagic(magic));
    }
    if version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(version));
    }
    Ok(())
}

/// `Ok(None)` on a clean end of data at a frame boundary.
fn read_frame<R: Read>(
    input: &mut R,
    index: usize,
) -> Result<Option<LocationRecord>, PersistError> {
    let mut len_bytes = [0u8; 4];
    match fill(input, &mut len_bytes)? {
        0 => return Ok(None),
        4 => {}
        _ => return Err(PersistError::Truncated { index }),
    }
    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        return Err(PersistError::FrameTooLarge { index, len });
    }

    let mut payload = vec![0u8; len as usize];
    if fill(input, &mut payload)? != payload.len() {
        return Err(PersistError::Truncated { index });
    }
    bitcode::deserialize(&payload)
        .map(Some)
        .map_err(|e| PersistError::Decode {
            index,
            reason: e.to_string(),
        })
}

/// Read until `buf` is full or the stream ends. Returns bytes read.
fn fill<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Where the engine keeps its active set between runs.
pub trait ActiveStore {
    /// Replace the stored set. Returns the number of records written.
    fn save(&mut self, locations: &[Location]) -> Result<usize, PersistError>;

    /// Read the stored set. A store that has never been written is empty.
    fn load(&mut self) -> RestoreOutcome;
}

/// A store backed by a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at `dir/active_forges`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(ACTIVE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActiveStore for FileStore {
    fn save(&mut self, locations: &[Location]) -> Result<usize, PersistError> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        write_records(&mut out, locations)
    }

    fn load(&mut self) -> RestoreOutcome {
        match File::open(&self.path) {
            Ok(file) => read_records(&mut BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => RestoreOutcome::default(),
            Err(e) => RestoreOutcome {
                locations: Vec::new(),
                error: Some(e.into()),
            },
        }
    }
}

/// A store held in memory, using the same stream format as [`FileStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with raw stream bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl ActiveStore for MemoryStore {
    fn save(&mut self, locations: &[Location]) -> Result<usize, PersistError> {
        let mut buf = Vec::new();
        let count = write_records(&mut buf, locations)?;
        self.bytes = Some(buf);
        Ok(count)
    }

    fn load(&mut self) -> RestoreOutcome {
        match &self.bytes {
            Some(bytes) => read_records(&mut bytes.as_slice()),
            None => RestoreOutcome::default(),
        }
    }
}
