//! Manifest - append-only log of VersionEdits.
//!
//! The manifest persists every change to the database's file layout; on
//! startup it is replayed to reconstruct the current Version. Records use
//! the same block-based framing as the write-ahead log: 32KB blocks, each
//! record fragment carrying a masked CRC32, a length and a fragment type.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::util::crc::{crc32_multi, mask_crc, unmask_crc};
use crate::util::filename::manifest_file_path;
use crate::version::VersionEdit;
use crate::{Error, Result};

/// Block size for the record framing (32KB).
const BLOCK_SIZE: usize = 32 * 1024;

/// Header size: CRC (4) + Length (2) + Type (1) = 7 bytes.
const HEADER_SIZE: usize = 7;

/// Record fragment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum RecordType {
    /// Zero is reserved for block padding.
    Zero = 0,
    /// Complete record in a single fragment.
    Full = 1,
    /// First fragment of a record.
    First = 2,
    /// Middle fragment(s) of a record.
    Middle = 3,
    /// Last fragment of a record.
    Last = 4,
}

impl RecordType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(RecordType::Zero),
            1 => Some(RecordType::Full),
            2 => Some(RecordType::First),
            3 => Some(RecordType::Middle),
            4 => Some(RecordType::Last),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Manifest file writer.
///
/// Appends encoded VersionEdits using the block-based record framing.
pub struct ManifestWriter {
    writer: BufWriter<File>,
    /// Current position within the current block.
    block_offset: usize,
    /// Total bytes written, including padding. Drives rotation.
    written: u64,
    path: PathBuf,
}

impl ManifestWriter {
    /// Create a new manifest file, truncating any previous content.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::with_capacity(BLOCK_SIZE, file),
            block_offset: 0,
            written: 0,
            path: path.to_path_buf(),
        })
    }

    /// Open an existing manifest for appending.
    pub fn open_for_append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let file_size = file.metadata()?.len();
        let block_offset = (file_size as usize) % BLOCK_SIZE;

        Ok(Self {
            writer: BufWriter::with_capacity(BLOCK_SIZE, file),
            block_offset,
            written: file_size,
            path: path.to_path_buf(),
        })
    }

    /// Get the manifest file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the file so far.
    pub fn file_size(&self) -> u64 {
        self.written
    }

    /// Append an encoded VersionEdit.
    pub fn add_edit(&mut self, edit: &VersionEdit) -> Result<()> {
        self.add_record(&edit.encode())
    }

    /// Append a raw record, fragmenting across blocks as needed.
    fn add_record(&mut self, data: &[u8]) -> Result<()> {
        let mut left = data.len();
        let mut ptr = 0;
        let mut begin = true;

        loop {
            let leftover = BLOCK_SIZE - self.block_offset;

            // Switch to a new block if a header no longer fits.
            if leftover < HEADER_SIZE {
                if leftover > 0 {
                    self.writer.write_all(&[0u8; HEADER_SIZE - 1][..leftover])?;
                    self.written += leftover as u64;
                }
                self.block_offset = 0;
            }

            let avail = BLOCK_SIZE - self.block_offset - HEADER_SIZE;
            let fragment_length = std::cmp::min(left, avail);
            let end = left == fragment_length;

            let record_type = if begin && end {
                RecordType::Full
            } else if begin {
                RecordType::First
            } else if end {
                RecordType::Last
            } else {
                RecordType::Middle
            };

            self.emit_physical_record(record_type, &data[ptr..ptr + fragment_length])?;

            ptr += fragment_length;
            left -= fragment_length;
            begin = false;

            if left == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Write one physical record (header + fragment).
    fn emit_physical_record(&mut self, record_type: RecordType, data: &[u8]) -> Result<()> {
        debug_assert!(data.len() <= 0xFFFF);
        debug_assert!(self.block_offset + HEADER_SIZE + data.len() <= BLOCK_SIZE);

        let type_byte = [record_type.to_byte()];
        let crc = mask_crc(crc32_multi(&[&type_byte[..], data]));

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&crc.to_le_bytes());
        header[4..6].copy_from_slice(&(data.len() as u16).to_le_bytes());
        header[6] = record_type.to_byte();

        self.writer.write_all(&header)?;
        self.writer.write_all(data)?;

        let record_size = HEADER_SIZE + data.len();
        self.block_offset += record_size;
        self.written += record_size as u64;

        Ok(())
    }

    /// Flush buffered data and fsync to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Flush buffered data without syncing.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Manifest file reader.
///
/// Reassembles fragmented records and replays them as VersionEdits.
/// Any framing damage is fatal: the manifest is the root of truth on
/// recovery, so a bad checksum or fragment sequence fails the replay.
pub struct ManifestReader {
    reader: BufReader<File>,
    buffer: Vec<u8>,
    buffer_offset: usize,
    buffer_size: usize,
    eof: bool,
}

impl ManifestReader {
    /// Open a manifest for replay.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::with_capacity(BLOCK_SIZE, file),
            buffer: vec![0u8; BLOCK_SIZE],
            buffer_offset: 0,
            buffer_size: 0,
            eof: false,
        })
    }

    /// Read the next VersionEdit, or None at end of stream.
    pub fn read_edit(&mut self) -> Result<Option<VersionEdit>> {
        match self.read_record()? {
            Some(data) => Ok(Some(VersionEdit::decode(&data)?)),
            None => Ok(None),
        }
    }

    /// Read all remaining VersionEdits.
    pub fn read_all_edits(&mut self) -> Result<Vec<VersionEdit>> {
        let mut edits = Vec::new();
        while let Some(edit) = self.read_edit()? {
            edits.push(edit);
        }
        Ok(edits)
    }

    /// Read the next logical record, reassembling fragments.
    fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut scratch = Vec::new();
        let mut in_fragmented_record = false;

        loop {
            match self.read_physical_record()? {
                Some((record_type, data)) => match record_type {
                    RecordType::Full => {
                        if in_fragmented_record {
                            return Err(Error::corruption("partial record without end"));
                        }
                        return Ok(Some(data));
                    }
                    RecordType::First => {
                        if in_fragmented_record {
                            return Err(Error::corruption("partial record without end"));
                        }
                        scratch = data;
                        in_fragmented_record = true;
                    }
                    RecordType::Middle => {
                        if !in_fragmented_record {
                            return Err(Error::corruption("unexpected middle record fragment"));
                        }
                        scratch.extend_from_slice(&data);
                    }
                    RecordType::Last => {
                        if !in_fragmented_record {
                            return Err(Error::corruption("unexpected last record fragment"));
                        }
                        scratch.extend_from_slice(&data);
                        return Ok(Some(scratch));
                    }
                    RecordType::Zero => continue,
                },
                None => {
                    // A record cut off by a crash mid-append is dropped;
                    // everything before it was already synced.
                    return Ok(None);
                }
            }
        }
    }

    /// Read one physical record from the current position.
    fn read_physical_record(&mut self) -> Result<Option<(RecordType, Vec<u8>)>> {
        loop {
            if self.buffer_offset + HEADER_SIZE > self.buffer_size {
                if !self.read_block()? {
                    return Ok(None);
                }
                continue;
            }

            let header = &self.buffer[self.buffer_offset..self.buffer_offset + HEADER_SIZE];

            let crc_expected =
                unmask_crc(u32::from_le_bytes([header[0], header[1], header[2], header[3]]));
            let length = u16::from_le_bytes([header[4], header[5]]) as usize;
            let record_type_byte = header[6];

            // All-zero padding at a block tail parses as a Zero record of
            // length zero; skip it.
            let record_type = RecordType::from_byte(record_type_byte)
                .ok_or_else(|| Error::corruption("invalid record type"))?;

            if self.buffer_offset + HEADER_SIZE + length > self.buffer_size {
                if self.eof {
                    // Truncated tail from an interrupted write.
                    return Ok(None);
                }
                return Err(Error::corruption("record extends beyond block"));
            }

            let data_start = self.buffer_offset + HEADER_SIZE;
            let data = &self.buffer[data_start..data_start + length];

            if record_type != RecordType::Zero {
                let type_byte = [record_type_byte];
                let crc_actual = crc32_multi(&[&type_byte[..], data]);
                if crc_expected != crc_actual {
                    return Err(Error::corruption("record checksum mismatch"));
                }
            }

            let data = data.to_vec();
            self.buffer_offset = data_start + length;

            return Ok(Some((record_type, data)));
        }
    }

    /// Read the next block into the buffer.
    fn read_block(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }

        self.buffer_offset = 0;
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            let n = self.reader.read(&mut self.buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.eof = true;
            self.buffer_size = 0;
            return Ok(false);
        }

        self.buffer_size = filled;
        if filled < BLOCK_SIZE {
            self.eof = true;
        }

        Ok(true)
    }
}

/// Open manifest handle: a writer plus its identity.
pub struct Manifest {
    writer: ManifestWriter,
    manifest_number: u64,
}

impl Manifest {
    /// Create a new manifest file.
    pub fn create(db_path: &Path, manifest_number: u64) -> Result<Self> {
        let writer = ManifestWriter::create(&manifest_file_path(db_path, manifest_number))?;
        Ok(Self {
            writer,
            manifest_number,
        })
    }

    /// Open an existing manifest for appending.
    pub fn open(db_path: &Path, manifest_number: u64) -> Result<Self> {
        let writer =
            ManifestWriter::open_for_append(&manifest_file_path(db_path, manifest_number))?;
        Ok(Self {
            writer,
            manifest_number,
        })
    }

    /// Get the manifest file number.
    pub fn manifest_number(&self) -> u64 {
        self.manifest_number
    }

    /// Current file size, including padding.
    pub fn file_size(&self) -> u64 {
        self.writer.file_size()
    }

    /// Append a VersionEdit record.
    pub fn log_edit(&mut self, edit: &VersionEdit) -> Result<()> {
        self.writer.add_edit(edit)
    }

    /// Flush and fsync.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.sync()
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}
