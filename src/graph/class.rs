use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The functional class of a road, named after OSM `highway` values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    PrimaryLink,
    Secondary,
    SecondaryLink,
    Tertiary,
    TertiaryLink,
    Residential,
    Unclassified,
    LivingStreet,
    Service,
    Busway,
    #[default]
    Road,
    Cycleway,
    Footway,
    Pedestrian,
    Path,
    Steps,
}

/// The max-speed table a road class is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SpeedTable {
    Motorway,
    Urban,
    Rural,
    Bike,
    Pedestrian,
}

impl RoadClass {
    /// Routing weight of the class. Lower values are more important roads.
    pub fn weight(&self) -> u32 {
        match self {
            // Primary roadways
            RoadClass::Motorway => 1,
            RoadClass::MotorwayLink => 2,
            RoadClass::Trunk => 3,
            RoadClass::TrunkLink => 4,
            RoadClass::Primary => 5,
            RoadClass::PrimaryLink => 6,
            RoadClass::Secondary => 7,
            RoadClass::SecondaryLink => 8,
            RoadClass::Tertiary => 9,
            RoadClass::TertiaryLink => 10,

            // Residential
            RoadClass::Residential => 11,
            RoadClass::Unclassified => 12,

            // Misc / Service. (Shouldn't be impossible to traverse, just difficult.)
            RoadClass::LivingStreet => 50,
            RoadClass::Service => 51,
            RoadClass::Busway => 52,
            RoadClass::Road => 53,

            // Non-motorised
            RoadClass::Cycleway => 60,
            RoadClass::Footway | RoadClass::Pedestrian | RoadClass::Path => 70,
            RoadClass::Steps => 80,
        }
    }

    /// Motorways and their slip roads, on which junctions are far apart.
    #[inline]
    pub fn is_motorway(&self) -> bool {
        matches!(self, RoadClass::Motorway | RoadClass::MotorwayLink)
    }

    pub fn speed_table(&self, urban: bool) -> SpeedTable {
        match self {
            RoadClass::Motorway | RoadClass::MotorwayLink | RoadClass::Trunk | RoadClass::TrunkLink => {
                SpeedTable::Motorway
            }
            RoadClass::Cycleway => SpeedTable::Bike,
            RoadClass::Footway | RoadClass::Pedestrian | RoadClass::Path | RoadClass::Steps => {
                SpeedTable::Pedestrian
            }
            _ if urban => SpeedTable::Urban,
            _ => SpeedTable::Rural,
        }
    }

    /// The highest plausible travel speed on the class, in km/h.
    pub fn max_speed(&self, urban: bool) -> f64 {
        match (self.speed_table(urban), self) {
            (SpeedTable::Motorway, RoadClass::Motorway) => 150.0,
            (SpeedTable::Motorway, RoadClass::Trunk) => 130.0,
            (SpeedTable::Motorway, _) => 100.0,

            (SpeedTable::Urban, RoadClass::Primary | RoadClass::PrimaryLink) => 80.0,
            (SpeedTable::Urban, RoadClass::Secondary | RoadClass::SecondaryLink) => 70.0,
            (SpeedTable::Urban, RoadClass::Tertiary | RoadClass::TertiaryLink) => 60.0,
            (SpeedTable::Urban, RoadClass::Service) => 30.0,
            (SpeedTable::Urban, RoadClass::LivingStreet) => 20.0,
            (SpeedTable::Urban, _) => 50.0,

            (SpeedTable::Rural, RoadClass::Primary | RoadClass::PrimaryLink) => 120.0,
            (SpeedTable::Rural, RoadClass::Secondary | RoadClass::SecondaryLink) => 110.0,
            (SpeedTable::Rural, RoadClass::Tertiary | RoadClass::TertiaryLink) => 100.0,
            (SpeedTable::Rural, RoadClass::Residential) => 70.0,
            (SpeedTable::Rural, RoadClass::Service) => 50.0,
            (SpeedTable::Rural, RoadClass::LivingStreet) => 30.0,
            (SpeedTable::Rural, _) => 100.0,

            (SpeedTable::Bike, _) => 35.0,
            (SpeedTable::Pedestrian, _) => 10.0,
        }
    }

    /// [`RoadClass::max_speed`] in meters per second.
    #[inline]
    pub fn max_speed_ms(&self, urban: bool) -> f64 {
        self.max_speed(urban) / 3.6
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_osm_values() {
        assert_eq!(RoadClass::from_str("motorway_link"), Ok(RoadClass::MotorwayLink));
        assert_eq!(RoadClass::from_str("living_street"), Ok(RoadClass::LivingStreet));
        assert!(RoadClass::from_str("runway").is_err());
        assert_eq!(RoadClass::Residential.as_ref(), "residential");
    }

    #[test]
    fn weights_order_importance() {
        assert!(RoadClass::Motorway.weight() < RoadClass::Primary.weight());
        assert!(RoadClass::Primary.weight() < RoadClass::Service.weight());
    }

    #[test]
    fn every_class_has_a_speed() {
        for class in RoadClass::iter() {
            assert!(class.max_speed(true) > 0.0, "{class} has no urban speed");
            assert!(class.max_speed(false) >= class.max_speed(true), "{class} is faster in town");
        }
    }
}
