use serde::{Deserialize, Serialize};

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Lite,
    Plus,
    #[serde(other)]
    Unknown,
}

impl Plan {
    /// Plans a user can pick, in menu order
    pub const SELECTABLE: [Plan; 2] = [Plan::Lite, Plan::Plus];

    /// Value sent as the `plan_in` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            Plan::Lite => "lite",
            Plan::Plus => "plus",
            Plan::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Plan::Lite => "Lite - Free",
            Plan::Plus => "Plus - $9.99/month",
            Plan::Unknown => "Unknown plan",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Plan::Lite => Plan::Plus,
            Plan::Plus | Plan::Unknown => Plan::Lite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parse() {
        let p: Plan = serde_json::from_str("\"plus\"").unwrap();
        assert_eq!(p, Plan::Plus);
        let p: Plan = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(p, Plan::Unknown);
    }

    #[test]
    fn test_plan_toggle() {
        assert_eq!(Plan::Lite.toggle(), Plan::Plus);
        assert_eq!(Plan::Plus.toggle(), Plan::Lite);
        assert_eq!(Plan::Plus.as_param(), "plus");
    }
}
