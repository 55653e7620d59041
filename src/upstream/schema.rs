//! Named structured-output presets
//!
//! Callers normally send their own `response_format`; presets are shortcuts
//! for schemas existing clients already depend on.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPreset {
    /// `{semester_start, semester_end}`, each `{year, month, day}`
    SemesterDates,
}

impl SchemaPreset {
    pub fn name(self) -> &'static str {
        match self {
            SchemaPreset::SemesterDates => "semester_dates",
        }
    }

    /// OpenAI-style `response_format` object enforcing this schema
    pub fn response_format(self) -> Value {
        match self {
            SchemaPreset::SemesterDates => {
                let date = json!({
                    "type": "object",
                    "properties": {
                        "year": { "type": "integer" },
                        "month": { "type": "integer" },
                        "day": { "type": "integer" }
                    },
                    "required": ["year", "month", "day"]
                });
                json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": self.name(),
                        "strict": true,
                        "schema": {
                            "type": "object",
                            "properties": {
                                "semester_start": date,
                                "semester_end": date
                            },
                            "required": ["semester_start", "semester_end"]
                        }
                    }
                })
            }
        }
    }
}
