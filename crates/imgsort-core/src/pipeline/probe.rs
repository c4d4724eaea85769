//! Header-level metadata extraction: dimensions, DPI and modification time.
//!
//! Only container headers are read. Pixel data is never decoded and the file
//! is never modified.

use chrono::{DateTime, Local};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::ProbeError;
use crate::types::ImageMetadata;

const CM_PER_INCH: f64 = 2.54;
const METERS_PER_INCH: f64 = 0.0254;
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Reads image dimensions, DPI and modification time.
pub struct MetadataProbe;

impl MetadataProbe {
    /// Probe a single file.
    ///
    /// Missing DPI is not an error. Anything that prevents reading the
    /// dimensions is reported as `ProbeError::Unreadable`.
    pub fn probe(path: &Path) -> Result<ImageMetadata, ProbeError> {
        let unreadable = |reason: String| ProbeError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };

        let fs_meta = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
        if !fs_meta.is_file() {
            return Err(unreadable("not a regular file".to_string()));
        }
        let modified = fs_meta
            .modified()
            .map_err(|e| unreadable(format!("no modification time: {e}")))?;

        let (width_px, height_px) = image::ImageReader::open(path)
            .map_err(|e| unreadable(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| unreadable(format!("cannot detect image format: {e}")))?
            .into_dimensions()
            .map_err(|e| unreadable(e.to_string()))?;

        if width_px == 0 || height_px == 0 {
            return Err(unreadable(format!(
                "invalid dimensions {width_px}x{height_px}"
            )));
        }

        let dpi = Self::read_dpi(path);
        tracing::trace!("Probed {:?}: {}x{} dpi={:?}", path, width_px, height_px, dpi);

        Ok(ImageMetadata {
            width_px,
            height_px,
            dpi,
            modified_at: DateTime::<Local>::from(modified),
        })
    }

    /// Look up the embedded resolution.
    ///
    /// Container-native density (JFIF, PNG pHYs) wins over EXIF.
    pub fn read_dpi(path: &Path) -> Option<u32> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);

        let native = Self::jfif_dpi(&mut reader).or_else(|| {
            reader.seek(SeekFrom::Start(0)).ok()?;
            Self::png_dpi(&mut reader)
        });
        if native.is_some() {
            return native;
        }

        reader.seek(SeekFrom::Start(0)).ok()?;
        Self::exif_dpi(&mut reader)
    }

    /// Density from a JPEG JFIF APP0 segment.
    ///
    /// Layout: SOI, `FF E0`, length, `JFIF\0`, version (2), units (1),
    /// x density (2), y density (2).
    fn jfif_dpi<R: Read>(reader: &mut R) -> Option<u32> {
        let mut header = [0u8; 18];
        reader.read_exact(&mut header).ok()?;

        if header[0..4] != [0xFF, 0xD8, 0xFF, 0xE0] || &header[6..11] != b"JFIF\0" {
            return None;
        }
        let units = header[13];
        let x_density = u16::from_be_bytes([header[14], header[15]]) as f64;
        match units {
            1 => to_dpi(x_density),
            2 => to_dpi(x_density * CM_PER_INCH),
            // 0 means the densities only express an aspect ratio
            _ => None,
        }
    }

    /// Density from a PNG `pHYs` chunk.
    ///
    /// Walks chunk headers until `pHYs`, `IDAT` or `IEND`, skipping chunk data.
    fn png_dpi<R: Read + Seek>(reader: &mut R) -> Option<u32> {
        let mut signature = [0u8; 8];
        reader.read_exact(&mut signature).ok()?;
        if signature != PNG_SIGNATURE {
            return None;
        }

        loop {
            let mut chunk_header = [0u8; 8];
            reader.read_exact(&mut chunk_header).ok()?;
            let length = u32::from_be_bytes([
                chunk_header[0],
                chunk_header[1],
                chunk_header[2],
                chunk_header[3],
            ]);
            let kind = &chunk_header[4..8];

            match kind {
                b"pHYs" => {
                    let mut data = [0u8; 9];
                    reader.read_exact(&mut data).ok()?;
                    let x_ppu = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as f64;
                    // Unit 1 is metres, 0 is unknown (aspect ratio only)
                    return match data[8] {
                        1 => to_dpi(x_ppu * METERS_PER_INCH),
                        _ => None,
                    };
                }
                b"IDAT" | b"IEND" => return None,
                _ => {
                    // Skip data and CRC
                    reader.seek(SeekFrom::Current(length as i64 + 4)).ok()?;
                }
            }
        }
    }

    /// Density from EXIF `XResolution` and `ResolutionUnit`.
    fn exif_dpi<R: std::io::BufRead + Seek>(reader: &mut R) -> Option<u32> {
        let exif = Reader::new().read_from_container(reader).ok()?;

        let x_resolution = exif
            .get_field(Tag::XResolution, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Rational(v) => v.first().map(|r| r.to_f64()),
                _ => None,
            })?;

        // EXIF default unit is inches (2); 3 is centimetres
        let unit = exif
            .get_field(Tag::ResolutionUnit, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .unwrap_or(2);

        match unit {
            2 => to_dpi(x_resolution),
            3 => to_dpi(x_resolution * CM_PER_INCH),
            _ => None,
        }
    }
}

/// Round a density to whole DPI; zero or non-finite values mean "unknown".
fn to_dpi(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.5 {
        return None;
    }
    Some(value.round().min(u32::MAX as f64) as u32)
}
