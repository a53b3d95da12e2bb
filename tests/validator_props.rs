// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use fileserver::validator::{is_valid_name, is_valid_name_opt};
use proptest::prelude::*;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

proptest! {
    #[test]
    fn plain_names_with_extension_pass(stem in "[a-zA-Z0-9 _-]{1,20}", ext in "[a-z0-9]{1,6}") {
        let name = format!("{}.{}", stem, ext);
        prop_assert!(is_valid_name(&name));
        prop_assert!(is_valid_name_opt(Some(&name)));
    }

    #[test]
    fn forbidden_char_always_fails(
        prefix in "[a-z]{0,8}",
        index in 0..FORBIDDEN.len(),
        suffix in "[a-z]{0,8}",
    ) {
        let name = format!("{}{}{}.txt", prefix, FORBIDDEN[index], suffix);
        prop_assert!(!is_valid_name(&name));
    }

    #[test]
    fn control_char_always_fails(stem in "[a-z]{0,8}", code in 0u8..0x20) {
        let name = format!("{}{}.txt", stem, code as char);
        prop_assert!(!is_valid_name(&name));
    }

    #[test]
    fn names_without_dot_fail(name in "[^.]{0,30}") {
        prop_assert!(!is_valid_name(&name));
    }

    #[test]
    fn trailing_dot_fails(stem in "[a-z]{1,10}(\\.[a-z]{1,3})?") {
        let name = format!("{}.", stem);
        prop_assert!(!is_valid_name(&name));
    }
}

#[test]
fn missing_name_is_invalid() {
    assert!(!is_valid_name_opt(None));
    assert!(!is_valid_name(""));
}
