//! Static data tables: the named character reference list and the C1
//! control replacement table for numeric references.

mod entities;

pub use entities::NAMED_ENTITIES;

/// Replacements for numeric references in the C1 range 0x80–0x9F
/// (indexed by `code - 0x80`). None means the code point stands, with an
/// error.
pub static C1_REPLACEMENTS: [Option<char>; 32] = [
    Some('\u{20ac}'),
    None,
    Some('\u{201a}'),
    Some('\u{0192}'),
    Some('\u{201e}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02c6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017d}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201c}'),
    Some('\u{201d}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02dc}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203a}'),
    Some('\u{0153}'),
    None,
    Some('\u{017e}'),
    Some('\u{0178}'),
];

/// Outcome of looking up a (partial) entity name.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum EntityLookup {
    /// No entity starts with this string.
    Missing,
    /// A strict prefix of at least one entity; not itself one.
    Prefix,
    /// Exactly an entity name; a longer one may still follow (`&not` vs
    /// `&notin;`), so callers keep consuming until a miss.
    Terminal([u32; 2]),
}

/// Longest-prefix-oriented lookup in the sorted entity table. The table is
/// sorted by byte order, so the first entry not less than `name` either is
/// `name`, starts with it, or rules out any match.
pub fn entity_lookup(name: &str) -> EntityLookup {
    let idx = NAMED_ENTITIES.partition_point(|&(n, _)| n < name);
    match NAMED_ENTITIES.get(idx) {
        Some(&(n, chars)) if n == name => EntityLookup::Terminal(chars),
        Some(&(n, _)) if n.starts_with(name) => EntityLookup::Prefix,
        _ => EntityLookup::Missing,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_sorted_and_complete() {
        assert!(NAMED_ENTITIES.windows(2).all(|w| w[0].0 < w[1].0));
        // The WHATWG list has 2231 entries, 106 of them legacy
        // (semicolon-less).
        assert_eq!(NAMED_ENTITIES.len(), 2231);
        assert_eq!(
            NAMED_ENTITIES
                .iter()
                .filter(|(n, _)| !n.ends_with(';'))
                .count(),
            106
        );
    }

    #[test]
    fn lookup_exact_and_prefix() {
        assert_eq!(entity_lookup("amp;"), EntityLookup::Terminal([0x26, 0]));
        // Legacy form without semicolon is terminal too.
        assert_eq!(entity_lookup("amp"), EntityLookup::Terminal([0x26, 0]));
        // "no" is a prefix of many entities but not one itself.
        assert_eq!(entity_lookup("no"), EntityLookup::Prefix);
        assert_eq!(entity_lookup("zzz"), EntityLookup::Missing);
    }

    #[test]
    fn lookup_two_codepoint_entity() {
        // &NotEqualTilde; decodes to U+2242 U+0338.
        assert_eq!(
            entity_lookup("NotEqualTilde;"),
            EntityLookup::Terminal([0x2242, 0x0338])
        );
    }

    #[test]
    fn terminal_with_longer_candidates() {
        // &not is terminal but &notin; continues past it.
        assert_eq!(entity_lookup("not"), EntityLookup::Terminal([0xAC, 0]));
        assert_eq!(entity_lookup("noti"), EntityLookup::Prefix);
        assert_eq!(entity_lookup("notin;"), EntityLookup::Terminal([0x2209, 0]));
    }
}
