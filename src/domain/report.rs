//! Daily status report model
//!
//! Status tags are a closed enumeration held in an ordered,
//! duplicate-free set so color derivation and aggregation stay
//! type-safe. Results are derived on every read and never persisted, so
//! policy changes apply retroactively to historical reports.

use serde::Serialize;
use smallvec::SmallVec;

/// Semantic classification labels for one employee-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusTag {
    WeekOff,
    WeekOffWorked,
    Leave,
    PresentOnLeave,
    Absent,
    LateIn,
    PermissionIn,
    HalfDayIn,
    EarlyIn,
    Working,
    MissedPunchOut,
    EarlyOut,
    HalfDayOut,
    LateOut,
    Present,
}

impl StatusTag {
    /// Human-facing label, kept byte-identical to the report wording
    pub fn label(&self) -> &'static str {
        match self {
            StatusTag::WeekOff => "Week off",
            StatusTag::WeekOffWorked => "Week off worked",
            StatusTag::Leave => "Leave",
            StatusTag::PresentOnLeave => "Present (On Leave)",
            StatusTag::Absent => "Absent",
            StatusTag::LateIn => "Late in",
            StatusTag::PermissionIn => "Permission in",
            StatusTag::HalfDayIn => "Half day in",
            StatusTag::EarlyIn => "Early in",
            StatusTag::Working => "Working",
            StatusTag::MissedPunchOut => "Shift out punch not done",
            StatusTag::EarlyOut => "Early out",
            StatusTag::HalfDayOut => "Half day out",
            StatusTag::LateOut => "Late out",
            StatusTag::Present => "Present",
        }
    }
}

/// Severity bucket for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Gray,
    Orange,
    Red,
    Blue,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Green => "green",
            StatusColor::Gray => "gray",
            StatusColor::Orange => "orange",
            StatusColor::Red => "red",
            StatusColor::Blue => "blue",
        }
    }
}

/// Ordered, duplicate-free set of status tags
///
/// Insertion order is the resolution order of the status engine; a tag
/// appended twice keeps its first position.
#[derive(Debug, Clone, Default)]
pub struct TagSet(SmallVec<[StatusTag; 4]>);

impl TagSet {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Append a tag unless it is already present
    pub fn push(&mut self, tag: StatusTag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn contains(&self, tag: StatusTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[StatusTag] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusTag> {
        self.0.iter()
    }

    /// Labels in resolution order
    pub fn labels(&self) -> Vec<&'static str> {
        self.0.iter().map(|t| t.label()).collect()
    }
}

/// Formatted in/out times for display ("HH:MM")
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportTimes {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
}

/// Derived daily classification; recomputed on every report request
#[derive(Debug, Clone)]
pub struct DailyStatusResult {
    pub tags: TagSet,
    pub remarks: String,
    pub color: StatusColor,
    pub times: ReportTimes,
}

impl DailyStatusResult {
    /// Convert to the wire JSON shape consumed by the API layer
    pub fn to_json(&self) -> String {
        let mut obj = serde_json::Map::new();
        obj.insert("status".to_string(), serde_json::json!(self.tags.labels()));
        obj.insert("remarks".to_string(), serde_json::Value::String(self.remarks.clone()));
        obj.insert(
            "color".to_string(),
            serde_json::Value::String(self.color.as_str().to_string()),
        );

        let mut times = serde_json::Map::new();
        times.insert("in".to_string(), serde_json::json!(self.times.check_in));
        times.insert("out".to_string(), serde_json::json!(self.times.check_out));
        obj.insert("times".to_string(), serde_json::Value::Object(times));

        serde_json::Value::Object(obj).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set_dedups_and_keeps_order() {
        let mut tags = TagSet::new();
        tags.push(StatusTag::LateIn);
        tags.push(StatusTag::HalfDayIn);
        tags.push(StatusTag::LateIn);

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.as_slice(), &[StatusTag::LateIn, StatusTag::HalfDayIn]);
        assert_eq!(tags.labels(), vec!["Late in", "Half day in"]);
    }

    #[test]
    fn test_labels_match_report_wording() {
        assert_eq!(StatusTag::WeekOff.label(), "Week off");
        assert_eq!(StatusTag::PresentOnLeave.label(), "Present (On Leave)");
        assert_eq!(StatusTag::MissedPunchOut.label(), "Shift out punch not done");
        assert_eq!(StatusColor::Gray.as_str(), "gray");
    }

    #[test]
    fn test_result_to_json() {
        let mut tags = TagSet::new();
        tags.push(StatusTag::LateIn);
        tags.push(StatusTag::EarlyOut);

        let result = DailyStatusResult {
            tags,
            remarks: "Late arrival".to_string(),
            color: StatusColor::Orange,
            times: ReportTimes {
                check_in: Some("09:25".to_string()),
                check_out: Some("17:10".to_string()),
            },
        };

        let parsed: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(parsed["status"], serde_json::json!(["Late in", "Early out"]));
        assert_eq!(parsed["color"], "orange");
        assert_eq!(parsed["times"]["in"], "09:25");
        assert_eq!(parsed["times"]["out"], "17:10");
    }
}
