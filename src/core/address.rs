//! EVM address helpers: validation and display truncation.

/// Shown wherever an address is expected but none is connected.
pub const ADDRESS_PLACEHOLDER: &str = "Not connected";

const PREFIX_CHARS: usize = 6;
const SUFFIX_CHARS: usize = 4;

/// `0x` followed by 40 hex digits (20 bytes). Checksum casing is not verified.
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) {
        Some(body) if body.len() == 40 => hex::decode(body).is_ok(),
        _ => false,
    }
}

/// Case-insensitive address comparison.
pub fn same_address(a: &str, b: &str) -> bool { a.eq_ignore_ascii_case(b) }

/// `0x1234...5678` form of an address. Short or non-ASCII input is returned unchanged.
pub fn shorten(address: &str) -> String {
    if !address.is_ascii() || address.len() <= PREFIX_CHARS + SUFFIX_CHARS + 3 {
        return address.to_string();
    }
    format!("{}...{}", &address[..PREFIX_CHARS], &address[address.len() - SUFFIX_CHARS..])
}

/// Display form for an optional address.
pub fn display(address: Option<&str>) -> String {
    address.map(shorten).unwrap_or_else(|| ADDRESS_PLACEHOLDER.to_string())
}
