use super::comp_finder_types::{Distance, MatchTier, PropertyRecord};
use super::fields;

const EARTH_RADIUS_MILES: f64 = 3956.0;

/// Great-circle distance in miles between two (lat, lon) pairs in degrees.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    if ![lat1, lon1, lat2, lon2].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let miles = 2.0 * a.min(1.0).sqrt().asin() * EARTH_RADIUS_MILES;

    if miles.is_finite() {
        Some(miles)
    } else {
        None
    }
}

pub fn distance_between(subject: &PropertyRecord, comp: &PropertyRecord) -> Distance {
    let subj = (subject.number(fields::LATITUDE), subject.number(fields::LONGITUDE));
    let other = (comp.number(fields::LATITUDE), comp.number(fields::LONGITUDE));

    match (subj, other) {
        ((Some(lat1), Some(lon1)), (Some(lat2), Some(lon2))) => {
            match haversine_miles(lat1, lon1, lat2, lon2) {
                Some(d) => Distance::Miles(d),
                None => Distance::NotApplicable,
            }
        }
        _ => Distance::NotApplicable,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TierRules {
    pub strict_distance: bool,
    pub county_match: bool,
    pub max_radius_miles: f64,
}

#[inline]
fn same(subject: &PropertyRecord, comp: &PropertyRecord, field: &str) -> bool {
    match (subject.normalized(field), comp.normalized(field)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl TierRules {
    /**
     * First tier the candidate satisfies, with its priority (1 is best).
     * Strict mode tries radius, ZIP, city, county; relaxed mode drops the
     * radius tier and shifts the rest up.
     */
    pub fn classify(
        &self,
        subject: &PropertyRecord,
        comp: &PropertyRecord,
        distance: Distance,
    ) -> Option<(MatchTier, u8)> {
        let mut priority = 0;
        let mut tiers = Vec::with_capacity(4);
        if self.strict_distance {
            tiers.push(MatchTier::Radius);
        }
        tiers.push(MatchTier::Zip);
        tiers.push(MatchTier::City);
        if self.county_match {
            tiers.push(MatchTier::County);
        }

        for tier in tiers {
            priority += 1;
            let hit = match tier {
                MatchTier::Radius => match distance {
                    Distance::Miles(d) => d <= self.max_radius_miles,
                    _ => false,
                },
                MatchTier::Zip => same(subject, comp, fields::ZIP),
                MatchTier::City => same(subject, comp, fields::CITY),
                MatchTier::County => same(subject, comp, fields::COUNTY),
            };
            if hit {
                return Some((tier, priority));
            }
        }
        None
    }
}
