use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ScenarioType {
    Positive,
    Negative,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Positive => "Positive",
            ScenarioType::Negative => "Negative",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(ScenarioType::Positive),
            "negative" => Ok(ScenarioType::Negative),
            other => Err(format!("unknown scenario type '{}'", other)),
        }
    }
}

/// Which rows a consumer is willing to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioFilter {
    Positive,
    Negative,
    #[default]
    Any,
}

impl ScenarioFilter {
    pub fn accepts(&self, scenario: ScenarioType) -> bool {
        match self {
            ScenarioFilter::Any => true,
            ScenarioFilter::Positive => scenario == ScenarioType::Positive,
            ScenarioFilter::Negative => scenario == ScenarioType::Negative,
        }
    }
}

/// One fixture row: label/value pairs in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    values: Vec<(String, String)>,
    pub scenario: ScenarioType,
    pub used: bool,
}

impl DataRow {
    pub fn new(scenario: ScenarioType) -> Self {
        Self {
            values: Vec::new(),
            scenario,
            used: false,
        }
    }

    /// Appends a value, replacing any existing value for the same label.
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.values.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.values.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(l, _)| l.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
