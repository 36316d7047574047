//! # Product Code Derivation
//!
//! Derives a business code for products whose draft omits one.
//!
//! ## Format
//! `CAT-IN-NNNN`
//! - `CAT`: two-letter category code (`MQ`, `SK`, `AC`, `FR`, `CB`, `OT`),
//!   or `PR` when no category is given
//! - `IN`: initials of the first two words of the name, or the first two
//!   characters when the name is a single word, uppercased
//! - `NNNN`: last four digits of the creation timestamp in milliseconds
//!
//! ## Example
//! `Pó Compacto` in `maquiagem` created at millis …1234 derives `MQ-PC-1234`.
//!
//! The derivation is deterministic given the same name, category, and
//! creation instant. It is not collision-proof: two products created in the
//! same millisecond window can collide. That is an accepted property, not
//! handled here.

use chrono::{DateTime, Utc};

use crate::types::Category;

/// Category code used when the draft carries no category.
const FALLBACK_CATEGORY_CODE: &str = "PR";

/// Derives a product code from the name, category, and creation instant.
pub fn derive_product_code(
    name: &str,
    category: Option<Category>,
    created_at: DateTime<Utc>,
) -> String {
    let cat_code = category.map_or(FALLBACK_CATEGORY_CODE, |c| c.code());
    let initials = name_initials(name);
    let suffix = created_at.timestamp_millis().rem_euclid(10_000);

    format!("{}-{}-{:04}", cat_code, initials, suffix)
}

/// Initials of the first two words, or the first two characters of a
/// single-word name, uppercased.
fn name_initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();

    let raw: String = match words.as_slice() {
        [] => String::new(),
        [only] => only.chars().take(2).collect(),
        [first, second, ..] => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect(),
    };

    raw.to_uppercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_two_word_name_uses_initials() {
        let code = derive_product_code("Pó Compacto", Some(Category::Maquiagem), at_millis(1_721_001_231_234));
        assert_eq!(code, "MQ-PC-1234");
    }

    #[test]
    fn test_single_word_name_uses_first_two_chars() {
        let code = derive_product_code("Batom", Some(Category::Maquiagem), at_millis(1_721_001_230_042));
        assert_eq!(code, "MQ-BA-0042");
    }

    #[test]
    fn test_missing_category_falls_back() {
        let code = derive_product_code("Creme Hidratante", None, at_millis(9_999));
        assert_eq!(code, "PR-CH-9999");
    }

    #[test]
    fn test_extra_words_ignored() {
        let code = derive_product_code(
            "Sérum Facial Vitamina C",
            Some(Category::Skincare),
            at_millis(1_721_001_230_000),
        );
        assert_eq!(code, "SK-SF-0000");
    }

    #[test]
    fn test_deterministic() {
        let ts = at_millis(1_721_001_235_678);
        let a = derive_product_code("Shampoo Nutritivo", Some(Category::Cabelos), ts);
        let b = derive_product_code("Shampoo Nutritivo", Some(Category::Cabelos), ts);
        assert_eq!(a, b);
        assert_eq!(a, "CB-SN-5678");
    }

    #[test]
    fn test_accented_initials_uppercase() {
        let code = derive_product_code("água micelar", Some(Category::Skincare), at_millis(1));
        assert_eq!(code, "SK-ÁM-0001");
    }
}
