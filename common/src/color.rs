use thiserror::Error;

/// Errors that can occur when parsing a color string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Expected #RRGGBB or #RRGGBBAA, got: {0}")]
    InvalidFormat(String),

    #[error("Invalid hex digit in color: {0}")]
    InvalidDigit(String),
}

/// Parse a hex color string to normalized RGBA values.
/// Supports `#RRGGBB` (opaque) and `#RRGGBBAA`.
pub fn parse_hex_color(hex: &str) -> Result<[f32; 4], ColorError> {
    let digits = hex
        .strip_prefix('#')
        .filter(|digits| digits.is_ascii() && (digits.len() == 6 || digits.len() == 8))
        .ok_or_else(|| ColorError::InvalidFormat(hex.to_string()))?;

    // from_str_radix alone would accept a sign
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidDigit(hex.to_string()));
    }

    // Default to opaque
    let mut rgba = [0.0, 0.0, 0.0, 1.0];
    for (channel, chunk) in rgba.iter_mut().zip(digits.as_bytes().chunks(2)) {
        // chunks of an ASCII string are valid UTF-8
        let pair = std::str::from_utf8(chunk).map_err(|_| ColorError::InvalidDigit(hex.to_string()))?;
        let value =
            u8::from_str_radix(pair, 16).map_err(|_| ColorError::InvalidDigit(hex.to_string()))?;
        *channel = value as f32 / 255.0;
    }

    Ok(rgba)
}

/// Format normalized RGBA values as `#RRGGBBAA`
pub fn to_hex_color(rgba: [f32; 4]) -> String {
    let [r, g, b, a] = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
}
