//! Property tests for the URL classifier.

use domain::validate::{classify_url, UrlRejection};
use proptest::prelude::*;

const ALLOWED: [&str; 7] = ["http://", "https://", "/", "./", "../", "#", "?"];

fn random_case(s: &str, mask: u64) -> String {
    s.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask >> (i % 64) & 1 == 1 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

fn whitespace() -> impl Strategy<Value = String> {
    "[ \t\n]{0,4}"
}

proptest! {
    #[test]
    fn deterministic(value in ".*") {
        prop_assert_eq!(classify_url(&value), classify_url(&value));
    }

    #[test]
    fn idempotent_on_trimmed_output(value in ".*") {
        let trimmed = value.trim().to_string();
        prop_assert_eq!(classify_url(&trimmed), classify_url(&value));
        if let Ok(accepted) = classify_url(&value) {
            prop_assert_eq!(classify_url(accepted), Ok(accepted));
        }
    }

    #[test]
    fn dangerous_schemes_always_rejected(
        scheme in prop_oneof![Just("javascript:"), Just("data:")],
        mask in any::<u64>(),
        rest in ".*",
        lead in whitespace(),
        tail in whitespace(),
    ) {
        let value = format!("{}{}{}{}", lead, random_case(scheme, mask), rest, tail);
        prop_assert_eq!(classify_url(&value), Err(UrlRejection::DangerousScheme));
    }

    #[test]
    fn allowed_prefixes_accepted(
        idx in 0..ALLOWED.len(),
        mask in any::<u64>(),
        rest in "[a-zA-Z0-9/._?#=&-]{0,40}",
        lead in whitespace(),
        tail in whitespace(),
    ) {
        let value = format!("{}{}{}{}", lead, random_case(ALLOWED[idx], mask), rest, tail);
        let accepted = classify_url(&value);
        prop_assert_eq!(accepted, Ok(value.trim()));
    }

    #[test]
    fn bare_words_are_invalid_format(word in "[a-zA-Z0-9][a-zA-Z0-9.:-]{0,30}") {
        prop_assume!(!word.to_ascii_lowercase().starts_with("javascript:"));
        prop_assume!(!word.to_ascii_lowercase().starts_with("data:"));
        prop_assert_eq!(classify_url(&word), Err(UrlRejection::InvalidFormat));
    }

    #[test]
    fn blank_is_absent(value in whitespace()) {
        prop_assert_eq!(classify_url(&value), Err(UrlRejection::Absent));
    }
}
