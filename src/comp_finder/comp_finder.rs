use log::debug;

use super::comp_finder_types::{Candidate, CompMatch, FieldValue, PropertyRecord};
use super::dedup;
use super::eligibility::{self, ClassRule, Thresholds};
use super::fields::{self, FieldSet};
use super::geo_tier::{self, TierRules};
use super::ranking::SortMode;
use crate::config::MatchConfig;

/// Best-effort integer class: "6", "6.0", " 7.9 " all parse, truncating.
pub fn parse_class(raw: &FieldValue) -> Option<i64> {
    let value = match raw {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        FieldValue::Missing => return None,
    };
    if value.is_finite() {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

/**
 * Per-dataset preparation done once before matching: derives `Class_Num`
 * from the raw class label and forces longitudes west.
 */
pub fn prepare_dataset(records: &mut [PropertyRecord]) {
    for record in records.iter_mut() {
        let label = fields::CLASS_LABELS
            .iter()
            .find(|l| record.fields.contains_key(**l))
            .map(|l| record.get(l).clone())
            .unwrap_or_else(|| record.get(fields::CLASS_NUM).clone());
        let class = match parse_class(&label) {
            Some(c) => FieldValue::Number(c as f64),
            None => FieldValue::Missing,
        };
        record.set(fields::CLASS_NUM, class);

        if let Some(lon) = record.number(fields::LONGITUDE) {
            record.set(fields::LONGITUDE, FieldValue::Number(-lon.abs()));
        }
    }
}

/// The comp-matching engine, built once per batch from a validated config.
pub struct CompFinder {
    fields: FieldSet,
    class_rule: ClassRule,
    thresholds: Thresholds,
    tiers: TierRules,
    sort_mode: SortMode,
    max_comps: usize,
    is_hotel: bool,
}

impl CompFinder {
    pub fn new(config: &MatchConfig) -> CompFinder {
        let class_rule = match (config.is_hotel(), config.use_hotel_class_rule) {
            (true, true) => ClassRule::Hotel,
            (true, false) => ClassRule::Disabled,
            (false, _) => ClassRule::Symmetric,
        };

        CompFinder {
            fields: config.category.field_set(),
            class_rule,
            thresholds: Thresholds {
                metric: config.max_gap_pct_main,
                value: config.max_gap_pct_value,
                size: config.max_gap_pct_size,
            },
            tiers: TierRules {
                strict_distance: config.use_strict_distance,
                county_match: config.use_county_match,
                max_radius_miles: config.max_radius_miles,
            },
            sort_mode: config.sort_mode,
            max_comps: config.max_comps,
            is_hotel: config.is_hotel(),
        }
    }

    #[inline]
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Ordered, de-duplicated comps for one subject. Never fails; may be empty.
    pub fn find<'a>(&self, subject: &PropertyRecord, pool: &'a [PropertyRecord]) -> Vec<CompMatch<'a>> {
        if subject.number(self.fields.metric).is_none() {
            debug!("Subject has no {}, skipping", self.fields.metric);
            return Vec::new();
        }

        let mut eligible = 0;
        let mut candidates: Vec<Candidate<'a>> = Vec::new();

        for record in pool {
            let gap = match eligibility::check(
                subject,
                record,
                &self.fields,
                self.class_rule,
                &self.thresholds,
            ) {
                Some(gap) => gap,
                None => continue,
            };
            eligible += 1;

            let distance = geo_tier::distance_between(subject, record);
            if let Some((tier, priority)) = self.tiers.classify(subject, record, distance) {
                candidates.push(Candidate {
                    record,
                    tier,
                    priority,
                    distance,
                    metric_gap: gap,
                });
            }
        }

        self.sort_mode.rank(&mut candidates);
        let ranked = candidates.len();
        let comps = dedup::select(subject, candidates, self.max_comps, self.is_hotel);

        debug!(
            "Pool {}: {} eligible, {} in a tier, {} accepted",
            pool.len(),
            eligible,
            ranked,
            comps.len()
        );
        comps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comp_finder::comp_finder_types::{Distance, MatchTier};
    use crate::comp_finder::fields::PropertyCategory;
    use assert_matches::assert_matches;

    fn hotel(account: &str, metric: f64, class: f64, zip: &str) -> PropertyRecord {
        PropertyRecord::default()
            .with_text(fields::ACCOUNT, account)
            .with_text(fields::OWNER_NAME, &format!("{} Owner Group", account))
            .with_text(fields::HOTEL_NAME, &format!("{} Inn", account))
            .with_text(fields::PROPERTY_ADDRESS, &format!("{} Main St", account))
            .with_num(fields::VPR, metric)
            .with_num(fields::HOTEL_MARKET_VALUE, 1_000_000.0)
            .with_num(fields::ROOMS, 50.0)
            .with_num(fields::CLASS_NUM, class)
            .with_text(fields::ZIP, zip)
    }

    fn zip_only(sort_mode: SortMode) -> MatchConfig {
        MatchConfig {
            use_strict_distance: false,
            sort_mode,
            ..MatchConfig::default()
        }
    }

    fn accounts(comps: &[CompMatch]) -> Vec<String> {
        comps
            .iter()
            .map(|c| c.record.get(fields::ACCOUNT).to_string())
            .collect()
    }

    #[test]
    fn it_should_parse_class_labels() {
        assert_eq!(parse_class(&FieldValue::Text(" 6.0 ".to_owned())), Some(6));
        assert_eq!(parse_class(&FieldValue::Text("-2".to_owned())), Some(-2));
        assert_eq!(parse_class(&FieldValue::Number(7.9)), Some(7));
        assert_eq!(parse_class(&FieldValue::Text("Class A".to_owned())), None);
        assert_eq!(parse_class(&FieldValue::Missing), None);
    }

    #[test]
    fn it_should_prepare_class_and_longitude_once() {
        let mut rows = vec![
            PropertyRecord::default()
                .with_text("Hotel class values", "7")
                .with_num(fields::LONGITUDE, 95.36),
            PropertyRecord::default()
                .with_text("Class", "n/a")
                .with_num(fields::LONGITUDE, -95.36),
        ];
        prepare_dataset(&mut rows);

        assert_eq!(rows[0].class_num(), Some(7));
        assert_eq!(rows[0].number(fields::LONGITUDE), Some(-95.36));
        assert_eq!(rows[1].class_num(), None);
        assert_eq!(rows[1].number(fields::LONGITUDE), Some(-95.36));
    }

    #[test]
    fn it_should_return_nothing_for_a_subject_without_metric() {
        let subject = PropertyRecord::default().with_text(fields::ZIP, "77001");
        let pool = vec![hotel("A", 90.0, 6.0, "77001")];
        let finder = CompFinder::new(&MatchConfig::default());

        assert!(finder.find(&subject, &pool).is_empty());
    }

    #[test]
    fn it_should_rank_the_larger_gap_first_with_gap_priority() {
        let subject = hotel("S", 100.0, 6.0, "77001");
        let pool = vec![hotel("B", 95.0, 6.0, "77001"), hotel("A", 90.0, 6.0, "77001")];

        let comps = CompFinder::new(&zip_only(SortMode::GapPriority)).find(&subject, &pool);
        assert_eq!(accounts(&comps), vec!["A", "B"]);
        assert_matches!(comps[0].tier, MatchTier::Zip);
        assert_matches!(comps[0].distance, Distance::NotApplicable);
        assert_eq!(comps[0].metric_gap, 10.0);
    }

    #[test]
    fn it_should_break_equal_distances_by_gap() {
        let subject = hotel("S", 100.0, 6.0, "77001");
        let pool = vec![hotel("B", 95.0, 6.0, "77001"), hotel("A", 90.0, 6.0, "77001")];

        let comps = CompFinder::new(&zip_only(SortMode::DistancePriority)).find(&subject, &pool);
        assert_eq!(accounts(&comps), vec!["A", "B"]);
    }

    #[test]
    fn it_should_be_deterministic_on_full_ties() {
        let subject = hotel("S", 100.0, 6.0, "77001");
        let pool = vec![hotel("B", 90.0, 6.0, "77001"), hotel("A", 90.0, 6.0, "77001")];
        let finder = CompFinder::new(&zip_only(SortMode::DistancePriority));

        assert_eq!(accounts(&finder.find(&subject, &pool)), vec!["B", "A"]);
        assert_eq!(accounts(&finder.find(&subject, &pool)), vec!["B", "A"]);
    }

    #[test]
    fn it_should_admit_only_class_8_for_a_class_8_subject() {
        let subject = hotel("S", 100.0, 8.0, "77001");
        let pool = vec![hotel("Seven", 90.0, 7.0, "77001"), hotel("Eight", 92.0, 8.0, "77001")];

        let comps = CompFinder::new(&zip_only(SortMode::GapPriority)).find(&subject, &pool);
        assert_eq!(accounts(&comps), vec!["Eight"]);
    }

    #[test]
    fn it_should_ignore_hotel_classes_when_the_rule_is_off() {
        let subject = hotel("S", 100.0, 8.0, "77001");
        let pool = vec![hotel("Seven", 90.0, 7.0, "77001")];
        let config = MatchConfig {
            use_hotel_class_rule: false,
            ..zip_only(SortMode::GapPriority)
        };

        assert_eq!(accounts(&CompFinder::new(&config).find(&subject, &pool)), vec!["Seven"]);
    }

    #[test]
    fn it_should_drop_repeated_accounts() {
        let subject = hotel("S", 100.0, 6.0, "77001");
        let mut twin = hotel("Q", 95.0, 6.0, "77001");
        twin.set(fields::ACCOUNT, FieldValue::Text("A".to_owned()));
        let pool = vec![hotel("A", 90.0, 6.0, "77001"), twin];

        let comps = CompFinder::new(&zip_only(SortMode::DistancePriority)).find(&subject, &pool);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].metric_gap, 10.0);
    }

    #[test]
    fn it_should_accept_an_unbounded_comp_quota() {
        let subject = hotel("S", 100.0, 6.0, "77001");
        let pool = vec![hotel("A", 90.0, 6.0, "77001")];
        let config = MatchConfig {
            max_comps: usize::MAX,
            ..zip_only(SortMode::DistancePriority)
        };
        assert!(config.validate().is_ok());

        assert_eq!(accounts(&CompFinder::new(&config).find(&subject, &pool)), vec!["A"]);
    }

    #[test]
    fn it_should_drop_candidates_outside_every_tier() {
        let subject = hotel("S", 100.0, 6.0, "77001");
        let pool = vec![hotel("A", 90.0, 6.0, "78000")];

        assert!(CompFinder::new(&zip_only(SortMode::GapPriority))
            .find(&subject, &pool)
            .is_empty());
    }

    #[test]
    fn it_should_put_radius_matches_ahead_of_zip_matches() {
        let subject = hotel("S", 100.0, 6.0, "77001")
            .with_num(fields::LATITUDE, 29.76)
            .with_num(fields::LONGITUDE, -95.36);
        let far = hotel("Far", 60.0, 6.0, "77001")
            .with_num(fields::LATITUDE, 31.0)
            .with_num(fields::LONGITUDE, -97.0);
        let near = hotel("Near", 99.0, 6.0, "99999")
            .with_num(fields::LATITUDE, 29.77)
            .with_num(fields::LONGITUDE, -95.37);
        let pool = vec![far, near];

        let comps = CompFinder::new(&MatchConfig::default()).find(&subject, &pool);
        assert_eq!(accounts(&comps), vec!["Near", "Far"]);
        assert_matches!(comps[0].tier, MatchTier::Radius);
        assert_matches!(comps[1].tier, MatchTier::Zip);
    }

    #[test]
    fn it_should_honor_every_invariant_on_a_mixed_pool() {
        let config = MatchConfig {
            category: PropertyCategory::Office,
            max_gap_pct_main: 0.2,
            max_comps: 2,
            ..zip_only(SortMode::GapPriority)
        };
        let office = |account: &str, vpu: f64, gba: f64| {
            PropertyRecord::default()
                .with_text(fields::ACCOUNT, account)
                .with_text(fields::OWNER_NAME, &format!("{} Holdings", account))
                .with_num(fields::VPU, vpu)
                .with_num(fields::GBA, gba)
                .with_num(fields::TOTAL_MARKET_VALUE, 2_000_000.0)
                .with_text(fields::CITY, "Austin")
        };
        let subject = office("Subj", 100.0, 10_000.0);
        let pool = vec![
            office("Over", 101.0, 10_000.0),
            office("TooCheap", 70.0, 10_000.0),
            office("Tiny", 95.0, 1_000.0),
            office("Good1", 85.0, 9_000.0),
            office("Good2", 90.0, 11_000.0),
            office("Good3", 99.0, 10_000.0),
        ];

        let comps = CompFinder::new(&config).find(&subject, &pool);
        assert_eq!(accounts(&comps), vec!["Good1", "Good2"]);
        for c in &comps {
            assert!(c.metric_gap >= 0.0);
            assert_matches!(c.tier, MatchTier::City);
        }
    }
}
