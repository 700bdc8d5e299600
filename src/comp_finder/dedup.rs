use super::comp_finder_types::{Candidate, CompMatch, PropertyRecord};
use super::fields;

const PREFIX_LEN: usize = 6;
const MIN_PREFIX_LEN: usize = 4;

/// Lower-cased name with spaces and `.-,/` removed, cut to six characters.
pub fn name_prefix(value: Option<String>) -> String {
    value
        .unwrap_or_default()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '.' | '-' | ',' | '/'))
        .take(PREFIX_LEN)
        .collect()
}

fn prefix_collides(a: &PropertyRecord, b: &PropertyRecord, field: &str) -> bool {
    let pa = name_prefix(a.get(field).as_key());
    let pb = name_prefix(b.get(field).as_key());
    pa.chars().count() >= MIN_PREFIX_LEN && pb.chars().count() >= MIN_PREFIX_LEN && pa == pb
}

fn same_account(a: &PropertyRecord, b: &PropertyRecord) -> bool {
    match (a.normalized(fields::ACCOUNT), b.normalized(fields::ACCOUNT)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Whether two rows look like the same property or the same owner.
pub fn is_duplicate(a: &PropertyRecord, b: &PropertyRecord, is_hotel: bool) -> bool {
    if same_account(a, b) {
        return true;
    }
    if prefix_collides(a, b, fields::OWNER_NAME) || prefix_collides(a, b, fields::PROPERTY_ADDRESS) {
        return true;
    }
    is_hotel
        && (prefix_collides(a, b, fields::HOTEL_NAME)
            || prefix_collides(a, b, fields::OWNER_STREET_ADDRESS))
}

/**
 * Walks ranked candidates in order and admits each one that does not
 * duplicate the subject or an already admitted comp, until `max_comps`.
 */
pub fn select<'a>(
    subject: &PropertyRecord,
    ranked: Vec<Candidate<'a>>,
    max_comps: usize,
    is_hotel: bool,
) -> Vec<CompMatch<'a>> {
    let mut chosen: Vec<CompMatch<'a>> = Vec::with_capacity(max_comps.min(ranked.len()));

    for candidate in ranked {
        if chosen.len() >= max_comps {
            break;
        }
        let dup = is_duplicate(subject, candidate.record, is_hotel)
            || chosen
                .iter()
                .any(|c| is_duplicate(c.record, candidate.record, is_hotel));
        if !dup {
            chosen.push(candidate.into());
        }
    }

    chosen
}
