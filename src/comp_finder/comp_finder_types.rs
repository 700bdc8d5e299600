use std::collections::HashMap;
use std::fmt;

/// A single cell of a property row, already coerced by the loader.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Missing,
}

impl FieldValue {
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /**
     * String form used for identity and geography comparisons. Integral
     * numbers drop the fraction so a ZIP read as 77001.0 still reads "77001".
     */
    pub fn as_key(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                Some(format!("{}", *n as i64))
            }
            FieldValue::Number(n) if n.is_finite() => Some(n.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(_) => write!(f, "{}", self.as_key().unwrap_or_default()),
            FieldValue::Missing => Ok(()),
        }
    }
}

pub type FieldMap = HashMap<String, FieldValue>;

static MISSING: FieldValue = FieldValue::Missing;

/// A subject or candidate row: column name to value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyRecord {
    pub fields: FieldMap,
}

impl PropertyRecord {
    pub fn new(fields: FieldMap) -> PropertyRecord {
        PropertyRecord { fields }
    }

    #[inline]
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_owned(), value);
    }

    #[inline]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_number()
    }

    /// Trimmed, lower-cased key; `None` when missing or blank.
    pub fn normalized(&self, field: &str) -> Option<String> {
        self.get(field)
            .as_key()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    pub fn class_num(&self) -> Option<i64> {
        self.number(super::fields::CLASS_NUM).map(|n| n.trunc() as i64)
    }

    #[cfg(test)]
    pub fn with(mut self, field: &str, value: FieldValue) -> PropertyRecord {
        self.set(field, value);
        self
    }

    #[cfg(test)]
    pub fn with_num(self, field: &str, value: f64) -> PropertyRecord {
        self.with(field, FieldValue::Number(value))
    }

    #[cfg(test)]
    pub fn with_text(self, field: &str, value: &str) -> PropertyRecord {
        self.with(field, FieldValue::Text(value.to_owned()))
    }
}

/// Geographic match category, in the order they are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchTier {
    Radius,
    Zip,
    City,
    County,
}

impl MatchTier {
    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Radius => "Radius",
            MatchTier::Zip => "Zip",
            MatchTier::City => "City",
            MatchTier::County => "County",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub const DISTANCE_FAILED: f64 = 999_999.0;
pub const DISTANCE_NOT_APPLICABLE: f64 = 999.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distance {
    Miles(f64),
    /**
     * Either side has no usable coordinates. Non-numeric and non-finite
     * coordinates are coerced to missing at load time, so this also covers
     * any distance that could not be computed.
     */
    NotApplicable,
}

impl Distance {
    /// Value used for ordering and the radius tier.
    #[inline]
    pub fn sort_miles(&self) -> f64 {
        match self {
            Distance::Miles(d) => *d,
            Distance::NotApplicable => DISTANCE_FAILED,
        }
    }

    /// Value reported to consumers.
    pub fn display_miles(&self) -> f64 {
        match self {
            Distance::Miles(d) => *d,
            Distance::NotApplicable => DISTANCE_NOT_APPLICABLE,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Miles(d) => write!(f, "{:.2}", d),
            Distance::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// A candidate that passed eligibility and got a tier.
#[derive(Clone, Debug)]
pub struct Candidate<'a> {
    pub record: &'a PropertyRecord,
    pub tier: MatchTier,
    pub priority: u8,
    pub distance: Distance,
    pub metric_gap: f64,
}

/// An accepted comp for one subject.
#[derive(Clone, Debug)]
pub struct CompMatch<'a> {
    pub record: &'a PropertyRecord,
    pub tier: MatchTier,
    pub distance: Distance,
    /// Subject metric minus comp metric, never negative.
    pub metric_gap: f64,
}

impl<'a> From<Candidate<'a>> for CompMatch<'a> {
    fn from(c: Candidate<'a>) -> CompMatch<'a> {
        CompMatch {
            record: c.record,
            tier: c.tier,
            distance: c.distance,
            metric_gap: c.metric_gap,
        }
    }
}
