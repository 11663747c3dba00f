use uuid::Uuid;

const SUFFIX_LEN: usize = 8;

/// Build a human-facing reference: `prefix` followed by 8 uppercase alphanumerics.
/// Example: reference_code("ACC") -> "ACC3F9A01BC"
pub fn reference_code(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, random[..SUFFIX_LEN].to_ascii_uppercase())
}

/// Returns true if `code` is `prefix` followed by exactly 8 uppercase alphanumerics.
pub fn is_reference_code(prefix: &str, code: &str) -> bool {
    code.strip_prefix(prefix).is_some_and(|suffix| {
        suffix.len() == SUFFIX_LEN
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    })
}
