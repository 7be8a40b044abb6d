use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of {News, Disclosure, Chart, Flow, Report, User}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    News,
    Disclosure,
    Chart,
    Flow,
    Report,
    User,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 6] = [
        ServiceKind::News,
        ServiceKind::Disclosure,
        ServiceKind::Chart,
        ServiceKind::Flow,
        ServiceKind::Report,
        ServiceKind::User,
    ];

    /// Path prefix this service is routed under (`/api/<prefix>/...`).
    pub fn path_prefix(&self) -> &'static str {
        match self {
            ServiceKind::News => "news",
            ServiceKind::Disclosure => "disclosure",
            ServiceKind::Chart => "chart",
            ServiceKind::Flow => "flow",
            ServiceKind::Report => "report",
            ServiceKind::User => "user",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_prefix())
    }
}

impl FromStr for ServiceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "news" => Ok(ServiceKind::News),
            "disclosure" => Ok(ServiceKind::Disclosure),
            "chart" => Ok(ServiceKind::Chart),
            "flow" => Ok(ServiceKind::Flow),
            "report" => Ok(ServiceKind::Report),
            "user" => Ok(ServiceKind::User),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in ServiceKind::ALL {
            let s = kind.to_string();
            assert_eq!(ServiceKind::from_str(&s).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_prefix_fails() {
        assert!(ServiceKind::from_str("nonexistent").is_err());
    }
}
