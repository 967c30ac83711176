use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub enum Weather {
    Rain,
    Sun,
    Sandstorm,
    Hail,
    Fog,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            Weather::Rain => "rain",
            Weather::Sun => "harsh sunlight",
            Weather::Sandstorm => "a sandstorm",
            Weather::Hail => "hail",
            Weather::Fog => "thick fog",
        };

        write!(f, "{}", display_name)
    }
}

impl Weather {
    /// Weather that chips creatures at the end of each turn.
    pub fn deals_chip_damage(&self) -> bool {
        matches!(self, Weather::Sandstorm | Weather::Hail)
    }
}
