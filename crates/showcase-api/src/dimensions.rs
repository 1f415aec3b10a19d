//! Image dimension sniffing
//!
//! Reads width and height from the fixed header fields of PNG, GIF, BMP and
//! baseline/progressive JPEG files. No pixel data is decoded.

use crate::models::Dimensions;

/// Reported for bodies whose format is not recognized
pub const STUB_DIMENSIONS: Dimensions = Dimensions {
    width: 1024,
    height: 768,
};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Dimensions of `data`, or [`STUB_DIMENSIONS`] when the format is unknown
pub fn probe(data: &[u8]) -> Dimensions {
    sniff(data).unwrap_or(STUB_DIMENSIONS)
}

/// Dimensions of `data` if it starts with a recognized image header
pub fn sniff(data: &[u8]) -> Option<Dimensions> {
    if data.starts_with(PNG_SIGNATURE) {
        png(data)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        gif(data)
    } else if data.starts_with(b"BM") {
        bmp(data)
    } else if data.starts_with(&[0xFF, 0xD8]) {
        jpeg(data)
    } else {
        None
    }
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(data.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(data.get(at..at + 4)?.try_into().ok()?))
}

fn le_u16(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(data.get(at..at + 2)?.try_into().ok()?))
}

fn le_i32(data: &[u8], at: usize) -> Option<i32> {
    Some(i32::from_le_bytes(data.get(at..at + 4)?.try_into().ok()?))
}

// Signature, then the IHDR chunk: length, type, width, height
fn png(data: &[u8]) -> Option<Dimensions> {
    if data.get(12..16)? != b"IHDR" {
        return None;
    }
    Some(Dimensions {
        width: be_u32(data, 16)?,
        height: be_u32(data, 20)?,
    })
}

fn gif(data: &[u8]) -> Option<Dimensions> {
    Some(Dimensions {
        width: le_u16(data, 6)?.into(),
        height: le_u16(data, 8)?.into(),
    })
}

// BITMAPINFOHEADER; a negative height marks a top-down bitmap
fn bmp(data: &[u8]) -> Option<Dimensions> {
    Some(Dimensions {
        width: le_i32(data, 18)?.unsigned_abs(),
        height: le_i32(data, 22)?.unsigned_abs(),
    })
}

fn jpeg(data: &[u8]) -> Option<Dimensions> {
    let mut at = 2;

    loop {
        if *data.get(at)? != 0xFF {
            return None;
        }
        let marker = *data.get(at + 1)?;

        // Fill bytes
        if marker == 0xFF {
            at += 1;
            continue;
        }

        // SOF0..SOF15, excluding DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return Some(Dimensions {
                height: be_u16(data, at + 5)?.into(),
                width: be_u16(data, at + 7)?.into(),
            });
        }

        let length = usize::from(be_u16(data, at + 2)?);
        at += 2 + length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn test_png() {
        assert_eq!(
            sniff(&png_header(640, 480)),
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn test_truncated_png_falls_back_to_stub() {
        let data = &png_header(640, 480)[..18];
        assert_eq!(sniff(data), None);
        assert_eq!(probe(data), STUB_DIMENSIONS);
    }

    #[test]
    fn test_gif() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&320u16.to_le_bytes());
        data.extend_from_slice(&200u16.to_le_bytes());

        assert_eq!(
            sniff(&data),
            Some(Dimensions {
                width: 320,
                height: 200
            })
        );
    }

    #[test]
    fn test_bmp_top_down() {
        let mut data = vec![0u8; 26];
        data[..2].copy_from_slice(b"BM");
        data[18..22].copy_from_slice(&100i32.to_le_bytes());
        data[22..26].copy_from_slice(&(-50i32).to_le_bytes());

        assert_eq!(
            sniff(&data),
            Some(Dimensions {
                width: 100,
                height: 50
            })
        );
    }

    #[test]
    fn test_jpeg_skips_segments_until_sof() {
        let mut data = vec![0xFF, 0xD8];
        // APP0 segment with a 4-byte payload
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, 1, 2, 3, 4]);
        // SOF0: length, precision, height, width
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        data.extend_from_slice(&600u16.to_be_bytes());
        data.extend_from_slice(&800u16.to_be_bytes());

        assert_eq!(
            sniff(&data),
            Some(Dimensions {
                width: 800,
                height: 600
            })
        );
    }

    #[test]
    fn test_unknown_format_uses_stub() {
        assert_eq!(probe(b"plain text body"), STUB_DIMENSIONS);
    }
}
