//! Color name and hex parsing for QR rendering options

use image::Rgba;

/// Parse a color given as a CSS-style name or `#rgb` / `#rrggbb` hex string.
///
/// The named set covers the CSS basic colors, which is what the original
/// rendering options were written against. Returns None for anything else.
pub fn parse_color(input: &str) -> Option<Rgba<u8>> {
    let s = input.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let rgb: [u8; 3] = match s.to_ascii_lowercase().as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "fuchsia" | "magenta" => [255, 0, 255],
        "aqua" | "cyan" => [0, 255, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "navy" => [0, 0, 128],
        "teal" => [0, 128, 128],
        "olive" => [128, 128, 0],
        _ => return None,
    };

    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 16 + v;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba([r, g, b, 255]))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("black"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_color("White"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_color("  orange "), Some(Rgba([255, 165, 0, 255])));
        assert_eq!(parse_color("grey"), parse_color("gray"));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_color("#ff0000"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("#F00"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("#1a2b3c"), Some(Rgba([26, 43, 60, 255])));
    }

    #[test]
    fn test_invalid_colors() {
        assert_eq!(parse_color("not-a-color"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gggggg"), None);
        assert_eq!(parse_color(""), None);
    }
}
