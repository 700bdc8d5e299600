use super::comp_finder_types::PropertyRecord;
use super::fields::FieldSet;

/// How two class codes are judged compatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassRule {
    /// Asymmetric tier rule; both codes required.
    Hotel,
    /// `|s - c| <= 2`, skipped when either code is missing.
    Symmetric,
    Disabled,
}

impl ClassRule {
    pub fn allows(&self, subject: Option<i64>, comp: Option<i64>) -> bool {
        match self {
            ClassRule::Hotel => match (subject, comp) {
                (Some(s), Some(c)) => hotel_class_ok(s, c),
                _ => false,
            },
            ClassRule::Symmetric => match (subject, comp) {
                (Some(s), Some(c)) => other_class_ok(s, c),
                _ => true,
            },
            ClassRule::Disabled => true,
        }
    }
}

pub fn hotel_class_ok(subject: i64, comp: i64) -> bool {
    if subject == 8 {
        return comp == 8;
    }
    if comp == 8 {
        return false;
    }
    match subject {
        7 => comp == 6 || comp == 7,
        6 => (5..=7).contains(&comp),
        _ => comp >= subject - 1 && comp <= subject + 2,
    }
}

#[inline]
pub fn other_class_ok(subject: i64, comp: i64) -> bool {
    (subject - comp).abs() <= 2
}

/// `|comp - subj| / subj <= pct`; any missing side or a zero subject fails.
pub fn tolerance_ok(subject: Option<f64>, comp: Option<f64>, pct: f64) -> bool {
    match (subject, comp) {
        (Some(s), Some(c)) if s != 0.0 => (c - s).abs() / s <= pct,
        _ => false,
    }
}

pub struct Thresholds {
    pub metric: f64,
    pub value: f64,
    pub size: f64,
}

/**
 * Runs the per-candidate filter chain and returns the metric gap
 * (subject - comp) when the candidate survives.
 */
pub fn check(
    subject: &PropertyRecord,
    comp: &PropertyRecord,
    fields: &FieldSet,
    class_rule: ClassRule,
    thresholds: &Thresholds,
) -> Option<f64> {
    if !class_rule.allows(subject.class_num(), comp.class_num()) {
        return None;
    }

    let subj_metric = subject.number(fields.metric)?;
    let comp_metric = comp.number(fields.metric)?;
    if comp_metric > subj_metric {
        return None;
    }

    let within = tolerance_ok(Some(subj_metric), Some(comp_metric), thresholds.metric)
        && tolerance_ok(
            subject.number(fields.value),
            comp.number(fields.value),
            thresholds.value,
        )
        && tolerance_ok(
            subject.number(fields.size),
            comp.number(fields.size),
            thresholds.size,
        );

    if within {
        Some(subj_metric - comp_metric)
    } else {
        None
    }
}
