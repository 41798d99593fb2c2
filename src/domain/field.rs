use serde::{Deserialize, Serialize};

/// Marker returned for choice fields that have no usable options.
pub const NO_VALID_DATA: &str = "No valid data";

/// Longest text value the generator will produce. Larger declared bounds
/// are clamped to it.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Option texts (after trimming dashes, whitespace and case) that mean
/// "no selection".
const CLEAR_SENTINELS: &[&str] = &[
    "clear",
    "select",
    "select one",
    "select an option",
    "please select",
    "no selection",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Select,
    Multiselect,
    Number,
}

impl FieldType {
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Multiselect)
    }
}

/// Declarative description of one form field and its validation constraints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldSchema {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minlength: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldSchema {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required: false,
            field_type,
            pattern: None,
            minlength: None,
            maxlength: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_lengths(mut self, minlength: Option<usize>, maxlength: Option<usize>) -> Self {
        self.minlength = minlength;
        self.maxlength = maxlength;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Returns a copy with blank patterns removed, options trimmed and
    /// `maxlength >= minlength` enforced.
    pub fn normalized(&self) -> Self {
        let mut field = self.clone();
        field.pattern = field
            .pattern
            .take()
            .filter(|p| !p.trim().is_empty());
        let mut options: Vec<String> = Vec::with_capacity(field.options.len());
        for option in field.options.iter().map(|o| o.trim()) {
            if !option.is_empty() && !options.iter().any(|o| o == option) {
                options.push(option.to_string());
            }
        }
        field.options = options;
        if let (Some(min), Some(max)) = (field.minlength, field.maxlength) {
            if max < min {
                field.maxlength = Some(min);
            }
        }
        field
    }

    /// Header label for this field: the label, or the key when the label is blank.
    pub fn display_label(&self) -> &str {
        let label = self.label.trim();
        if label.is_empty() {
            self.key.as_str()
        } else {
            label
        }
    }

    /// The clear-sentinel option, if this field offers one.
    pub fn clear_option(&self) -> Option<&str> {
        self.options
            .iter()
            .map(String::as_str)
            .find(|o| is_clear_sentinel(o))
    }

    /// Options that represent an actual selection.
    pub fn usable_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(String::as_str)
            .filter(|o| !o.trim().is_empty() && !is_clear_sentinel(o))
            .collect()
    }

    /// Whether any value can break one of the declared constraints. An
    /// optional free-text field with no pattern and no usable length bound
    /// accepts everything.
    pub fn can_be_violated(&self) -> bool {
        self.required
            || self.pattern.as_deref().map_or(false, |p| !p.trim().is_empty())
            || self.field_type.is_choice()
            || self.field_type == FieldType::Number
            || self.maxlength.map_or(false, |max| max < MAX_TEXT_LENGTH)
            || self.minlength.map_or(false, |min| min >= 2)
    }

    /// The value that means "left blank" for this field.
    pub fn empty_representation(&self) -> String {
        if self.field_type.is_choice() {
            self.clear_option().unwrap_or_default().to_string()
        } else {
            String::new()
        }
    }
}

/// Words that are a real choice on their own but a sentinel when decorated,
/// as in `-- None --`.
const DECORATED_SENTINELS: &[&str] = &["none"];

pub fn is_clear_sentinel(option: &str) -> bool {
    let trimmed = option.trim();
    let core = trimmed
        .trim_matches(|c: char| c == '-' || c == '=' || c.is_whitespace())
        .to_lowercase();
    if core.is_empty() || CLEAR_SENTINELS.contains(&core.as_str()) {
        return true;
    }
    let decorated = trimmed.starts_with(['-', '=']) && trimmed.ends_with(['-', '=']);
    decorated && DECORATED_SENTINELS.contains(&core.as_str())
}

/// One page of a multi-page form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SchemaPage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// Field schemas as delivered by the upstream extraction step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub pages: Vec<SchemaPage>,
}

impl SchemaDocument {
    /// All fields in page order.
    pub fn fields(&self) -> Vec<FieldSchema> {
        self.pages
            .iter()
            .flat_map(|page| page.fields.iter().cloned())
            .collect()
    }

    pub fn page(&self, name: &str) -> Option<&SchemaPage> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.pages
            .iter()
            .flat_map(|p| p.fields.iter())
            .find(|f| f.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_clamps_maxlength() {
        let field = FieldSchema::new("name", "Name", FieldType::Text)
            .with_lengths(Some(10), Some(4))
            .with_pattern("   ");
        let normalized = field.normalized();
        assert_eq!(normalized.maxlength, Some(10));
        assert!(normalized.pattern.is_none());
    }

    #[test]
    fn test_clear_sentinel_detection() {
        assert!(is_clear_sentinel("-- Clear --"));
        assert!(is_clear_sentinel("--Select--"));
        assert!(is_clear_sentinel("Please select"));
        assert!(!is_clear_sentinel("Red"));
        assert!(!is_clear_sentinel("Clearwater"));
    }

    #[test]
    fn test_bare_none_is_a_real_option() {
        assert!(!is_clear_sentinel("None"));
        assert!(is_clear_sentinel("-- None --"));
        assert!(is_clear_sentinel("==none=="));

        let field = FieldSchema::new("allergies", "Allergies", FieldType::Select)
            .with_options(["None", "Peanuts", "-- None --"]);
        assert_eq!(field.usable_options(), vec!["None", "Peanuts"]);
        assert_eq!(field.empty_representation(), "-- None --");
    }

    #[test]
    fn test_can_be_violated() {
        let free = FieldSchema::new("notes", "Notes", FieldType::Textarea);
        assert!(!free.can_be_violated());
        assert!(!free.clone().with_lengths(Some(1), Some(MAX_TEXT_LENGTH)).can_be_violated());
        assert!(!free.clone().with_pattern("  ").can_be_violated());

        assert!(free.clone().required(true).can_be_violated());
        assert!(free.clone().with_pattern("[a-z]+").can_be_violated());
        assert!(free.clone().with_lengths(None, Some(20)).can_be_violated());
        assert!(free.clone().with_lengths(Some(2), None).can_be_violated());
        assert!(FieldSchema::new("n", "N", FieldType::Number).can_be_violated());
        assert!(FieldSchema::new("c", "C", FieldType::Select).can_be_violated());
    }

    #[test]
    fn test_field_type_defaults_to_text() {
        assert_eq!(FieldType::default(), FieldType::Text);
        let field: FieldSchema = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert_eq!(field.field_type, FieldType::Text);
    }

    #[test]
    fn test_usable_options_exclude_sentinel() {
        let field = FieldSchema::new("color", "Color", FieldType::Select)
            .with_options(["Red", "Blue", "-- Clear --"]);
        assert_eq!(field.usable_options(), vec!["Red", "Blue"]);
        assert_eq!(field.empty_representation(), "-- Clear --");
    }

    #[test]
    fn test_empty_representation_for_text() {
        let field = FieldSchema::new("notes", "Notes", FieldType::Textarea);
        assert_eq!(field.empty_representation(), "");
    }

    #[test]
    fn test_deserialize_type_field() {
        let field: FieldSchema = serde_json::from_str(
            r#"{"key": "count", "label": "Count", "type": "number", "required": true}"#,
        )
        .unwrap();
        assert_eq!(field.field_type, FieldType::Number);
        assert!(field.required);
        assert!(field.options.is_empty());
    }

    #[test]
    fn test_display_label_falls_back_to_key() {
        let field = FieldSchema::new("county_count", "  ", FieldType::Number);
        assert_eq!(field.display_label(), "county_count");
    }
}
