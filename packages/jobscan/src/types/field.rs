//! Form field classification types.
//!
//! A detected field exists in two shapes: [`DetectedField`] holds the arena
//! handle of its element and never leaves the context that produced it, while
//! [`WireField`] is plain data safe to hand to another context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Semantic type assigned to a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    Location,
    Address,
    City,
    State,
    ZipCode,
    Country,
    LinkedinUrl,
    PortfolioUrl,
    WebsiteUrl,
    ResumeUpload,
    CoverLetterUpload,
    CoverLetterText,
    YearsExperience,
    Education,
    Salary,
    StartDate,
    CurrentCompany,
    CurrentTitle,
    WorkAuthorization,
    SponsorshipRequired,
    EeoGender,
    EeoRaceEthnicity,
    EeoVeteranStatus,
    EeoDisabilityStatus,
    CustomQuestion,
    Unknown,
}

impl FieldType {
    pub fn category(&self) -> FieldCategory {
        use FieldType::*;
        match self {
            FirstName | LastName | FullName | Email | Phone | Location | Address | City | State
            | ZipCode | Country | LinkedinUrl | PortfolioUrl | WebsiteUrl => FieldCategory::Personal,
            ResumeUpload | CoverLetterUpload | CoverLetterText => FieldCategory::Resume,
            YearsExperience | Education | Salary | StartDate | CurrentCompany | CurrentTitle => {
                FieldCategory::Professional
            }
            WorkAuthorization | SponsorshipRequired => FieldCategory::Authorization,
            EeoGender | EeoRaceEthnicity | EeoVeteranStatus | EeoDisabilityStatus => FieldCategory::Eeo,
            CustomQuestion | Unknown => FieldCategory::Custom,
        }
    }
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        use FieldType::*;
        match self {
            FirstName => "firstName",
            LastName => "lastName",
            FullName => "fullName",
            Email => "email",
            Phone => "phone",
            Location => "location",
            Address => "address",
            City => "city",
            State => "state",
            ZipCode => "zipCode",
            Country => "country",
            LinkedinUrl => "linkedinUrl",
            PortfolioUrl => "portfolioUrl",
            WebsiteUrl => "websiteUrl",
            ResumeUpload => "resumeUpload",
            CoverLetterUpload => "coverLetterUpload",
            CoverLetterText => "coverLetterText",
            YearsExperience => "yearsExperience",
            Education => "education",
            Salary => "salary",
            StartDate => "startDate",
            CurrentCompany => "currentCompany",
            CurrentTitle => "currentTitle",
            WorkAuthorization => "workAuthorization",
            SponsorshipRequired => "sponsorshipRequired",
            EeoGender => "eeoGender",
            EeoRaceEthnicity => "eeoRaceEthnicity",
            EeoVeteranStatus => "eeoVeteranStatus",
            EeoDisabilityStatus => "eeoDisabilityStatus",
            CustomQuestion => "customQuestion",
            Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldCategory {
    Personal,
    Resume,
    Professional,
    Authorization,
    Eeo,
    Custom,
}

/// The twelve independent observations made about a candidate element.
///
/// Declaration order is evaluation order, which also breaks voting ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Autocomplete,
    NameIdRegex,
    InputType,
    LabelFor,
    AriaLabel,
    Placeholder,
    ParentLabel,
    SiblingText,
    CssDataAttr,
    HeadingContext,
    SectionContext,
    BoardSelector,
}

impl SignalKind {
    /// Fixed prior weight of the signal.
    pub fn weight(&self) -> f64 {
        match self {
            SignalKind::Autocomplete => 0.95,
            SignalKind::NameIdRegex => 0.85,
            SignalKind::BoardSelector => 0.85,
            SignalKind::InputType => 0.80,
            SignalKind::LabelFor => 0.75,
            SignalKind::AriaLabel => 0.75,
            SignalKind::ParentLabel => 0.70,
            SignalKind::Placeholder => 0.65,
            SignalKind::SiblingText => 0.50,
            SignalKind::CssDataAttr => 0.50,
            SignalKind::HeadingContext => 0.40,
            SignalKind::SectionContext => 0.30,
        }
    }
}

/// Audit record of one signal evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalEvaluation {
    pub signal: SignalKind,
    pub raw_value: String,
    pub suggested_type: FieldType,
    pub weight: f64,
    pub matched: bool,
    pub reason: String,
}

impl SignalEvaluation {
    pub fn matched(signal: SignalKind, raw_value: impl Into<String>, suggested: FieldType, reason: String) -> Self {
        Self {
            signal,
            raw_value: raw_value.into(),
            suggested_type: suggested,
            weight: signal.weight(),
            matched: true,
            reason,
        }
    }

    pub fn unmatched(signal: SignalKind, raw_value: impl Into<String>, suggested: FieldType, reason: String) -> Self {
        Self {
            signal,
            raw_value: raw_value.into(),
            suggested_type: suggested,
            weight: signal.weight(),
            matched: false,
            reason,
        }
    }
}

/// Element kind that selects the fill strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputKind {
    Text,
    Email,
    Tel,
    Url,
    Number,
    Password,
    Date,
    Search,
    File,
    Checkbox,
    Radio,
    Select,
    Textarea,
    ContentEditable,
    Other(String),
}

impl InputKind {
    pub fn as_str(&self) -> &str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Tel => "tel",
            InputKind::Url => "url",
            InputKind::Number => "number",
            InputKind::Password => "password",
            InputKind::Date => "date",
            InputKind::Search => "search",
            InputKind::File => "file",
            InputKind::Checkbox => "checkbox",
            InputKind::Radio => "radio",
            InputKind::Select => "select",
            InputKind::Textarea => "textarea",
            InputKind::ContentEditable => "contenteditable",
            InputKind::Other(s) => s,
        }
    }

    /// Checkbox and radio values are checked state, not text.
    pub fn is_toggle(&self) -> bool {
        matches!(self, InputKind::Checkbox | InputKind::Radio)
    }
}

impl From<&str> for InputKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" => InputKind::Text,
            "email" => InputKind::Email,
            "tel" => InputKind::Tel,
            "url" => InputKind::Url,
            "number" => InputKind::Number,
            "password" => InputKind::Password,
            "date" => InputKind::Date,
            "search" => InputKind::Search,
            "file" => InputKind::File,
            "checkbox" => InputKind::Checkbox,
            "radio" => InputKind::Radio,
            "select" => InputKind::Select,
            "textarea" => InputKind::Textarea,
            "contenteditable" => InputKind::ContentEditable,
            other => InputKind::Other(other.to_string()),
        }
    }
}

impl From<String> for InputKind {
    fn from(s: String) -> Self {
        InputKind::from(s.as_str())
    }
}

impl From<InputKind> for String {
    fn from(kind: InputKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected field as seen inside its own context.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedField {
    /// Arena handle of the live element. Never serialized.
    pub element: NodeId,
    pub stable_id: String,
    pub selector: String,
    pub label: String,
    pub field_type: FieldType,
    pub confidence: f64,
    pub category: FieldCategory,
    pub signals: Vec<SignalEvaluation>,
    pub is_visible: bool,
    pub is_disabled: bool,
    pub is_required: bool,
    pub current_value: String,
    pub input_kind: InputKind,
    pub registry_entry_id: Option<String>,
    pub board: Option<String>,
    pub context_id: u32,
}

/// Plain-data projection of [`DetectedField`] for crossing context boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireField {
    pub stable_id: String,
    pub selector: String,
    pub label: String,
    pub field_type: FieldType,
    pub confidence: f64,
    pub category: FieldCategory,
    pub signals: Vec<SignalEvaluation>,
    pub is_visible: bool,
    pub is_disabled: bool,
    pub is_required: bool,
    pub current_value: String,
    pub input_kind: InputKind,
    pub registry_entry_id: Option<String>,
    pub board: Option<String>,
    pub context_id: u32,
}

impl From<&DetectedField> for WireField {
    fn from(field: &DetectedField) -> Self {
        Self {
            stable_id: field.stable_id.clone(),
            selector: field.selector.clone(),
            label: field.label.clone(),
            field_type: field.field_type,
            confidence: field.confidence,
            category: field.category,
            signals: field.signals.clone(),
            is_visible: field.is_visible,
            is_disabled: field.is_disabled,
            is_required: field.is_required,
            current_value: field.current_value.clone(),
            input_kind: field.input_kind.clone(),
            registry_entry_id: field.registry_entry_id.clone(),
            board: field.board.clone(),
            context_id: field.context_id,
        }
    }
}

impl From<DetectedField> for WireField {
    fn from(field: DetectedField) -> Self {
        WireField::from(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(FieldType::ZipCode.category(), FieldCategory::Personal);
        assert_eq!(FieldType::CoverLetterText.category(), FieldCategory::Resume);
        assert_eq!(FieldType::StartDate.category(), FieldCategory::Professional);
        assert_eq!(FieldType::SponsorshipRequired.category(), FieldCategory::Authorization);
        assert_eq!(FieldType::EeoVeteranStatus.category(), FieldCategory::Eeo);
        assert_eq!(FieldType::Unknown.category(), FieldCategory::Custom);
    }

    #[test]
    fn test_input_kind_string_form() {
        let kind: InputKind = serde_json::from_str("\"contenteditable\"").unwrap();
        assert_eq!(kind, InputKind::ContentEditable);
        let other: InputKind = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(other, InputKind::Other("week".into()));
        assert_eq!(serde_json::to_string(&InputKind::Tel).unwrap(), "\"tel\"");
    }

    #[test]
    fn test_signal_kind_names() {
        assert_eq!(serde_json::to_string(&SignalKind::NameIdRegex).unwrap(), "\"name-id-regex\"");
        assert_eq!(FieldType::EeoRaceEthnicity.to_string(), "eeoRaceEthnicity");
    }

    #[test]
    fn test_wire_field_has_no_element_handle() {
        let field = DetectedField {
            element: NodeId(7),
            stable_id: "jf-field-0".into(),
            selector: "[data-jf-opid=\"jf-field-0\"]".into(),
            label: "Email".into(),
            field_type: FieldType::Email,
            confidence: 0.8,
            category: FieldCategory::Personal,
            signals: vec![],
            is_visible: true,
            is_disabled: false,
            is_required: true,
            current_value: String::new(),
            input_kind: InputKind::Email,
            registry_entry_id: None,
            board: Some("greenhouse".into()),
            context_id: 2,
        };
        let json = serde_json::to_value(WireField::from(&field)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("element"));
        assert_eq!(obj["stableId"], "jf-field-0");
        assert_eq!(obj["inputKind"], "email");
        assert_eq!(obj["contextId"], 2);
    }
}
