//! Phone number normalization
//!
//! Providers store phone numbers in every imaginable format ("+61 412 345
//! 678", "(02) 9876-5432", "0412.345.678"). Before querying a provider by
//! phone, the number is reduced to digits plus an optional leading `+` so
//! lookups behave the same regardless of how the caller formatted it.

/// Normalizes a phone number to digits and an optional leading `+`.
///
/// Every non-digit character is dropped; a `+` survives only in the
/// leading position. The function is idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '+' && out.is_empty() {
            out.push('+');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_spaces_and_punctuation() {
        assert_eq!(normalize("(02) 9876-5432"), "0298765432");
        assert_eq!(normalize("0412.345.678"), "0412345678");
    }

    #[test]
    fn test_keeps_leading_plus() {
        assert_eq!(normalize("+61 412 345 678"), "+61412345678");
    }

    #[test]
    fn test_drops_interior_plus() {
        assert_eq!(normalize("0412+345+678"), "0412345678");
    }

    #[test]
    fn test_strips_letters() {
        assert_eq!(normalize("call 0412 345 678 (mobile)"), "0412345678");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("ext."), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("+61 (0) 412-345-678");
        assert_eq!(normalize(&once), once);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_output_is_digits_with_optional_leading_plus(raw in ".*") {
            let out = normalize(&raw);
            for (i, c) in out.chars().enumerate() {
                prop_assert!(
                    c.is_ascii_digit() || (c == '+' && i == 0),
                    "unexpected char {c:?} at {i} in {out:?}"
                );
            }
        }

        #[test]
        fn normalize_is_idempotent(raw in ".*") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn digits_are_preserved_in_order(raw in "[0-9 ()+.-]{0,30}") {
            let expected: String = raw.chars().filter(char::is_ascii_digit).collect();
            let out = normalize(&raw);
            let digits: String = out.chars().filter(char::is_ascii_digit).collect();
            prop_assert_eq!(digits, expected);
        }
    }
}
