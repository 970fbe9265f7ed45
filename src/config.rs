use serde::{Deserialize, Serialize};

/// Knobs for the standard decoder set.
///
/// Deserializes from camelCase keys; missing keys take their defaults.
///
/// ```rust
/// let config = imgmeta::Config { read_exif: false, ..imgmeta::Config::default() };
/// let inspector = imgmeta::Inspector::new(config);
/// # let _ = inspector;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Run the EXIF reader for JPEG and WebP files.
    pub read_exif: bool,
    /// Inflate compressed PNG text chunks (`zTXt`, compressed `iTXt`).
    pub inflate_text: bool,
    /// Largest inflated text value kept; longer values are dropped.
    pub max_text_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_exif: true,
            inflate_text: true,
            max_text_bytes: 1 << 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: Config = serde_json::from_str(r#"{"readExif": false}"#).unwrap();
        assert!(!c.read_exif);
        assert!(c.inflate_text);
        assert_eq!(c.max_text_bytes, 1 << 20);
    }

    #[test]
    fn test_round_trip() {
        let c = Config { inflate_text: false, max_text_bytes: 64, ..Config::default() };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"readExif":true,"inflateText":false,"maxTextBytes":64}"#);
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), c);
    }
}
