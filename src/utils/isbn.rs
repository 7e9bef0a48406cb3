use crate::core::library::{LibraryError, LibraryResult};

// Normalizes an ISBN-10 or ISBN-13 (optionally prefixed with "ISBN", "ISBN-10" or "ISBN-13" and a
// colon, with hyphens or spaces between groups) and verifies its check digit. Returns the bare
// digits, keeping a trailing 'X' for ISBN-10.
pub fn normalize_isbn(raw: &str) -> LibraryResult<String> {
    let mut rest = raw.trim();
    for prefix in ["ISBN-13", "ISBN-10", "ISBN"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped.trim_start_matches(':').trim_start();
            break;
        }
    }
    let digits: String = rest.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let valid = match digits.len() {
        10 => is_valid_isbn10(&digits),
        13 => is_valid_isbn13(&digits),
        _ => false,
    };
    if valid {
        Ok(digits)
    } else {
        Err(LibraryError::validation(format!("invalid isbn {}", raw).as_str(), Some("400".to_string())))
    }
}

fn is_valid_isbn10(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().enumerate() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'X' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn is_valid_isbn13(digits: &str) -> bool {
    if !digits.starts_with("978") && !digits.starts_with("979") {
        return false;
    }
    let mut sum = 0;
    for (i, c) in digits.chars().enumerate() {
        let value = match c.to_digit(10) {
            Some(v) => v,
            None => return false,
        };
        sum += if i % 2 == 0 { value } else { value * 3 };
    }
    sum % 10 == 0
}
