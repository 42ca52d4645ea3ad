//! QR symbol construction and PNG rasterization

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use thiserror::Error;

use crate::qr::color::parse_color;

#[derive(Debug, Error)]
pub enum QrRenderError {
    #[error("payload exceeds QR code capacity")]
    CapacityExceeded,
    #[error("unrecognized color '{0}'")]
    InvalidColor(String),
    #[error("QR symbol construction failed: {0:?}")]
    Symbol(qrcode::types::QrError),
    #[error("failed to encode PNG image")]
    Encoding(#[source] image::ImageError),
}

/// Render `payload` as a QR code and return the PNG bytes base64-encoded.
///
/// The symbol is built at error-correction level High with the minimal
/// version that fits the payload, so identical inputs produce byte-identical
/// output. Each module is `box_size` pixels square and the quiet zone is
/// `border` modules wide.
pub fn render_png_base64(
    payload: &str,
    color: &str,
    bg_color: &str,
    box_size: u32,
    border: u32,
) -> Result<String, QrRenderError> {
    let fg = parse_color(color).ok_or_else(|| QrRenderError::InvalidColor(color.to_string()))?;
    let bg =
        parse_color(bg_color).ok_or_else(|| QrRenderError::InvalidColor(bg_color.to_string()))?;

    let code =
        QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H).map_err(
            |e| match e {
                qrcode::types::QrError::DataTooLong => QrRenderError::CapacityExceeded,
                other => QrRenderError::Symbol(other),
            },
        )?;

    let png = rasterize(&code, fg, bg, box_size.max(1), border);
    Ok(BASE64.encode(png_bytes(png)?))
}

fn rasterize(code: &QrCode, fg: Rgba<u8>, bg: Rgba<u8>, box_size: u32, border: u32) -> RgbaImage {
    let modules = code.to_colors();
    let width = code.width() as u32;
    let total = (width + 2 * border) * box_size;

    let mut img = RgbaImage::from_pixel(total, total, bg);

    for my in 0..width {
        for mx in 0..width {
            if modules[(my * width + mx) as usize] != qrcode::Color::Dark {
                continue;
            }
            let px0 = (mx + border) * box_size;
            let py0 = (my + border) * box_size;
            for py in py0..py0 + box_size {
                for px in px0..px0 + box_size {
                    img.put_pixel(px, py, fg);
                }
            }
        }
    }

    img
}

fn png_bytes(img: RgbaImage) -> Result<Vec<u8>, QrRenderError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(QrRenderError::Encoding)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn test_render_is_deterministic() {
        let a = render_png_base64("https://example.com", "black", "white", 10, 4).unwrap();
        let b = render_png_base64("https://example.com", "black", "white", 10, 4).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_differs_by_payload() {
        let a = render_png_base64("https://example.com/a", "black", "white", 10, 4).unwrap();
        let b = render_png_base64("https://example.com/b", "black", "white", 10, 4).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_render_produces_valid_png() {
        let encoded = render_png_base64("hello", "navy", "#ffffff", 4, 2).unwrap();
        let bytes = BASE64.decode(encoded).unwrap();
        // PNG signature
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_capacity_exceeded() {
        // At error-correction level High the largest symbol holds well under
        // 2000 bytes of arbitrary data.
        let payload = "x".repeat(3000);
        let err = render_png_base64(&payload, "black", "white", 10, 4).unwrap_err();
        assert!(matches!(err, QrRenderError::CapacityExceeded));
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let err = render_png_base64("hello", "blurple", "white", 10, 4).unwrap_err();
        assert!(matches!(err, QrRenderError::InvalidColor(_)));
    }

    #[test]
    fn test_zero_border_renders() {
        let encoded = render_png_base64("hello", "black", "white", 1, 0).unwrap();
        assert!(!encoded.is_empty());
    }
}
