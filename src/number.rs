//! Numeric literals as they appear in assembler sources and on the command line

/// Parses a number (hex `$XX` or `0xXX`, binary `%XXXXXXXX`, or decimal).
///
/// Values wider than 16 bits are accepted here; callers decide what range
/// they allow.
pub(crate) fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("empty number string".to_string());
    }

    if let Some(hex) = s.strip_prefix('$') {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex number '{}': {}", s, e))
    } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex number '{}': {}", s, e))
    } else if let Some(bin) = s.strip_prefix('%') {
        u32::from_str_radix(bin, 2).map_err(|e| format!("invalid binary number '{}': {}", s, e))
    } else {
        s.parse::<u32>()
            .map_err(|e| format!("invalid decimal number '{}': {}", s, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_formats() {
        assert_eq!(parse_number("$FF"), Ok(0xFF));
        assert_eq!(parse_number("$0801"), Ok(0x0801));
        assert_eq!(parse_number("0xd000"), Ok(0xD000));
        assert_eq!(parse_number("0XD000"), Ok(0xD000));
        assert_eq!(parse_number("%1010"), Ok(10));
        assert_eq!(parse_number("2048"), Ok(2048));
        assert_eq!(parse_number("  12  "), Ok(12));
    }

    #[test]
    fn test_parse_number_invalid() {
        assert!(parse_number("").is_err());
        assert!(parse_number("$").is_err());
        assert!(parse_number("$XYZ").is_err());
        assert!(parse_number("12ab").is_err());
        assert!(parse_number("-1").is_err());
    }
}
