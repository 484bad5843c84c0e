use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identity of the current user as handed over by the WebView host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostIdentity {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Server ids show up both as integers and as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserProfile {
    pub level: Option<u32>,
    #[serde(default)]
    pub xp: u64,
    #[serde(default, deserialize_with = "lenient_theme")]
    pub theme: Option<Theme>,
    pub notifications: Option<bool>,
    pub daily_goal: Option<u32>,
    pub break_reminder: Option<u32>,
}

/// A theme the client does not know is treated as unset.
fn lenient_theme<'de, D>(deserializer: D) -> Result<Option<Theme>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
}

/// `/api/stats/categories` returns a list of records; older servers return
/// a map of category name to minutes tracked.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CategoriesPayload {
    List(Vec<Category>),
    Totals(BTreeMap<String, serde_json::Value>),
}

impl CategoriesPayload {
    pub fn into_categories(self) -> Vec<Category> {
        match self {
            CategoriesPayload::List(list) => list,
            CategoriesPayload::Totals(totals) => totals
                .into_keys()
                .map(|name| Category {
                    id: RecordId::Text(name.clone()),
                    name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DailyStatsPayload {
    Hourly {
        hours: Vec<u32>,
        durations: Vec<f64>,
    },
    Summary {
        total_time: f64,
        total_tasks: u64,
        productivity: f64,
    },
    ByCategory {
        total_time: f64,
        categories: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StartActivityRequest {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityRecord {
    pub id: RecordId,
    pub name: String,
    pub category: Option<String>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FinishActivityRequest {
    pub activity_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub productivity: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FinishActivityResponse {
    #[serde(default)]
    pub xp_earned: u64,
    pub duration: Option<u64>,
    pub level: Option<u32>,
    pub xp: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

pub const MAX_DAILY_GOAL: u32 = 24 * 60;
pub const MAX_BREAK_REMINDER: u32 = 240;

/// A single settings field. Serializes as a one-key object, e.g. `{"theme":"dark"}`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettingsUpdate {
    Theme(Theme),
    Notifications(bool),
    DailyGoal(u32),
    BreakReminder(u32),
}

impl SettingsUpdate {
    /// Builds an update from a field name and its raw form value.
    pub fn parse(field: &str, value: &str) -> Result<Self, String> {
        let value = value.trim();
        match field {
            "theme" => value.parse().map(SettingsUpdate::Theme),
            "notifications" => match value {
                "true" | "on" | "1" => Ok(SettingsUpdate::Notifications(true)),
                "false" | "off" | "0" | "" => Ok(SettingsUpdate::Notifications(false)),
                other => Err(format!("invalid notifications value '{other}'")),
            },
            "daily_goal" | "daily-goal" => {
                let minutes = parse_minutes(value)?;
                if minutes == 0 || minutes > MAX_DAILY_GOAL {
                    return Err(format!("daily goal must be between 1 and {MAX_DAILY_GOAL} minutes"));
                }
                Ok(SettingsUpdate::DailyGoal(minutes))
            }
            "break_reminder" | "break-reminder" => {
                let minutes = parse_minutes(value)?;
                if minutes > MAX_BREAK_REMINDER {
                    return Err(format!(
                        "break reminder must be at most {MAX_BREAK_REMINDER} minutes"
                    ));
                }
                Ok(SettingsUpdate::BreakReminder(minutes))
            }
            other => Err(format!("unknown setting '{other}'")),
        }
    }
}

fn parse_minutes(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("'{value}' is not a number of minutes"))
}
