//! User-agent device classification

use woothee::parser::Parser;

/// Device class derived from the raw user-agent string.
///
/// Every scan lands in exactly one class; tablets count as mobile, and
/// anything unparseable (including an empty string) counts as desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

/// Classify a raw user-agent string.
///
/// woothee buckets phones and tablets under the `smartphone` and
/// `mobilephone` categories; everything else (pc, crawler, appliance,
/// unknown) is treated as desktop.
pub fn classify_device(user_agent: &str) -> DeviceClass {
    let parser = Parser::new();
    match parser.parse(user_agent) {
        Some(result) if matches!(result.category, "smartphone" | "mobilephone") => {
            DeviceClass::Mobile
        }
        _ => DeviceClass::Desktop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36";
    const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 14_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";
    const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36";

    #[test]
    fn test_mobile_user_agents() {
        assert_eq!(classify_device(IPHONE_UA), DeviceClass::Mobile);
        assert_eq!(classify_device(ANDROID_UA), DeviceClass::Mobile);
    }

    #[test]
    fn test_tablet_counts_as_mobile() {
        assert_eq!(classify_device(IPAD_UA), DeviceClass::Mobile);
    }

    #[test]
    fn test_desktop_user_agent() {
        assert_eq!(classify_device(DESKTOP_UA), DeviceClass::Desktop);
    }

    #[test]
    fn test_unparseable_defaults_to_desktop() {
        assert_eq!(classify_device(""), DeviceClass::Desktop);
        assert_eq!(classify_device("definitely not a browser"), DeviceClass::Desktop);
    }
}
