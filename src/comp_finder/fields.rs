use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Column names as they appear in the county exports.
pub const ACCOUNT: &str = "Property Account No";
pub const OWNER_NAME: &str = "Owner Name/ LLC Name";
pub const OWNER_STREET_ADDRESS: &str = "Owner Street Address";
pub const HOTEL_NAME: &str = "Hotel Name";
pub const PROPERTY_ADDRESS: &str = "Property Address";

pub const LATITUDE: &str = "lat";
pub const LONGITUDE: &str = "lon";
pub const ZIP: &str = "Zip Code";
pub const CITY: &str = "City";
pub const COUNTY: &str = "County";

pub const CLASS_NUM: &str = "Class_Num";
/// Raw class label columns, first present wins.
pub const CLASS_LABELS: [&str; 2] = ["Hotel class values", "Class"];

pub const VPR: &str = "VPR";
pub const VPU: &str = "VPU";
pub const ROOMS: &str = "Rooms";
pub const UNITS: &str = "Units";
pub const GBA: &str = "GBA";
pub const HOTEL_MARKET_VALUE: &str = "Market Value-2023";
pub const TOTAL_MARKET_VALUE: &str = "Total Market value-2023";

/// Every column the loader coerces to number-or-missing.
pub const NUMERIC_COLUMNS: [&str; 9] = [
    VPR,
    VPU,
    ROOMS,
    UNITS,
    GBA,
    HOTEL_MARKET_VALUE,
    TOTAL_MARKET_VALUE,
    LATITUDE,
    LONGITUDE,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCategory {
    Hotel,
    Apartment,
    Office,
    Warehouse,
    Retail,
    Other,
}

impl PropertyCategory {
    #[inline]
    pub fn is_hotel(&self) -> bool {
        *self == PropertyCategory::Hotel
    }

    pub fn field_set(&self) -> FieldSet {
        match self {
            PropertyCategory::Hotel => FieldSet {
                metric: VPR,
                size: ROOMS,
                value: HOTEL_MARKET_VALUE,
            },
            PropertyCategory::Apartment => FieldSet {
                metric: VPU,
                size: UNITS,
                value: TOTAL_MARKET_VALUE,
            },
            PropertyCategory::Office
            | PropertyCategory::Warehouse
            | PropertyCategory::Retail
            | PropertyCategory::Other => FieldSet {
                metric: VPU,
                size: GBA,
                value: TOTAL_MARKET_VALUE,
            },
        }
    }
}

impl Default for PropertyCategory {
    fn default() -> Self {
        PropertyCategory::Hotel
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyCategory::Hotel => "hotel",
            PropertyCategory::Apartment => "apartment",
            PropertyCategory::Office => "office",
            PropertyCategory::Warehouse => "warehouse",
            PropertyCategory::Retail => "retail",
            PropertyCategory::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PropertyCategory {
    type Err = String;

    /// Unknown non-hotel sub-types land on `Other` (GBA sized).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "hotel" => PropertyCategory::Hotel,
            "apartment" | "apartments" => PropertyCategory::Apartment,
            "office" => PropertyCategory::Office,
            "warehouse" => PropertyCategory::Warehouse,
            "retail" => PropertyCategory::Retail,
            "" => return Err("empty property category".to_owned()),
            _ => PropertyCategory::Other,
        })
    }
}

/// The (metric, size, value) columns a category is compared on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSet {
    pub metric: &'static str,
    pub size: &'static str,
    pub value: &'static str,
}
