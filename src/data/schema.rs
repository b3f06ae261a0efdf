use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::SchemaError;

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Every column the dashboard knows how to use, keyed by role.
///
/// Filters and reducers refer to roles, never to raw header strings; the
/// mapping to header names lives here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum Column {
    Class,
    Topic,
    Question,
    AgeGroup,
    Demographic,
    DemographicCategory,
    YearStart,
    YearEnd,
    #[serde(rename = "Data_Value")]
    DataValue,
    #[serde(rename = "Low_Confidence_Limit")]
    LowConfidenceLimit,
    #[serde(rename = "High_Confidence_Limit")]
    HighConfidenceLimit,
    LocationAbbr,
    Geolocation,
    Latitude,
    Longitude,
}

impl Column {
    pub const ALL: [Column; 15] = [
        Column::Class,
        Column::Topic,
        Column::Question,
        Column::AgeGroup,
        Column::Demographic,
        Column::DemographicCategory,
        Column::YearStart,
        Column::YearEnd,
        Column::DataValue,
        Column::LowConfidenceLimit,
        Column::HighConfidenceLimit,
        Column::LocationAbbr,
        Column::Geolocation,
        Column::Latitude,
        Column::Longitude,
    ];

    /// Header name of this role in the source file.
    pub fn header(self) -> &'static str {
        match self {
            Column::Class => "Class",
            Column::Topic => "Topic",
            Column::Question => "Question",
            Column::AgeGroup => "AgeGroup",
            Column::Demographic => "Demographic",
            Column::DemographicCategory => "DemographicCategory",
            Column::YearStart => "YearStart",
            Column::YearEnd => "YearEnd",
            Column::DataValue => "Data_Value",
            Column::LowConfidenceLimit => "Low_Confidence_Limit",
            Column::HighConfidenceLimit => "High_Confidence_Limit",
            Column::LocationAbbr => "LocationAbbr",
            Column::Geolocation => "Geolocation",
            Column::Latitude => "Latitude",
            Column::Longitude => "Longitude",
        }
    }
}

// ---------------------------------------------------------------------------
// Capabilities – optional features advertised by a schema
// ---------------------------------------------------------------------------

/// Which optional parts of the survey layout a table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Both confidence-limit columns are present.
    pub confidence_interval: bool,
    /// Fine-grained topic column: `Topic`, falling back to `Question`.
    pub topic: Option<Column>,
    pub location: bool,
    pub geolocation: bool,
    /// Derived `Latitude`/`Longitude` columns are present.
    pub coordinates: bool,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Ordered headers of a table plus the resolved position of every known role.
///
/// Building a schema never fails: absent roles only surface as
/// [`SchemaError`] when something actually asks for them.
#[derive(Debug, Clone)]
pub struct Schema {
    headers: Vec<String>,
    roles: BTreeMap<Column, usize>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.headers == other.headers
    }
}

impl Schema {
    pub fn from_headers(headers: Vec<String>) -> Self {
        let mut roles = BTreeMap::new();
        for role in Column::ALL {
            if let Some(idx) = headers.iter().position(|h| h == role.header()) {
                roles.insert(role, idx);
            }
        }
        Schema { headers, roles }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn index_of(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn position(&self, role: Column) -> Option<usize> {
        self.roles.get(&role).copied()
    }

    pub fn has(&self, role: Column) -> bool {
        self.roles.contains_key(&role)
    }

    /// Position of `role`, or a [`SchemaError`] naming its header.
    pub fn require(&self, role: Column) -> Result<usize, SchemaError> {
        self.position(role)
            .ok_or(SchemaError::MissingColumn(role.header()))
    }

    pub fn capabilities(&self) -> Capabilities {
        let topic = if self.has(Column::Topic) {
            Some(Column::Topic)
        } else if self.has(Column::Question) {
            Some(Column::Question)
        } else {
            None
        };
        Capabilities {
            confidence_interval: self.has(Column::LowConfidenceLimit)
                && self.has(Column::HighConfidenceLimit),
            topic,
            location: self.has(Column::LocationAbbr),
            geolocation: self.has(Column::Geolocation),
            coordinates: self.has(Column::Latitude) && self.has(Column::Longitude),
        }
    }

    /// The fine-grained topic role, or [`SchemaError::NoTopicColumn`].
    pub fn topic_column(&self) -> Result<Column, SchemaError> {
        self.capabilities().topic.ok_or(SchemaError::NoTopicColumn)
    }

    /// Schema with `header` appended, unless it is already present.
    /// Returns the new schema and the header's position in it.
    pub fn with_header(&self, header: &str) -> (Schema, usize) {
        match self.index_of(header) {
            Some(idx) => (self.clone(), idx),
            None => {
                let mut headers = self.headers.clone();
                headers.push(header.to_string());
                let idx = headers.len() - 1;
                (Schema::from_headers(headers), idx)
            }
        }
    }
}
