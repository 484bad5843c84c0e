use crate::models::{Category, HostIdentity, RecordId, Theme, UserProfile};
use crate::stats::ChartBar;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const XP_PER_LEVEL: u64 = 100;
pub const DEFAULT_CATEGORY: &str = "other";
const DISPLAY_NAME_LIMIT: usize = 15;
const DISPLAY_NAME_KEEP: usize = 12;
const AVATAR_PLACEHOLDER: &str = "https://via.placeholder.com/100?text=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Main,
    Stats,
    Profile,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Main, Screen::Stats, Screen::Profile, Screen::Settings];

    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Main => "main",
            Screen::Stats => "stats",
            Screen::Profile => "profile",
            Screen::Settings => "settings",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str() == value)
            .ok_or_else(|| format!("unknown screen '{value}'"))
    }
}

/// What the session knows about the user beyond the host identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub level: Option<u32>,
    pub xp: u64,
    pub theme: Theme,
    pub notifications: bool,
    pub daily_goal: u32,
    pub break_reminder: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            level: None,
            xp: 0,
            theme: Theme::Light,
            notifications: true,
            daily_goal: 120,
            break_reminder: 60,
        }
    }
}

impl Profile {
    pub fn apply_user(&mut self, user: UserProfile) {
        self.level = user.level.or(self.level);
        self.xp = user.xp;
        if let Some(theme) = user.theme {
            self.theme = theme;
        }
        if let Some(notifications) = user.notifications {
            self.notifications = notifications;
        }
        if let Some(goal) = user.daily_goal {
            self.daily_goal = goal;
        }
        if let Some(reminder) = user.break_reminder {
            self.break_reminder = reminder;
        }
    }

    pub fn level(&self) -> u32 {
        self.level
            .unwrap_or_else(|| 1 + (self.xp / XP_PER_LEVEL) as u32)
    }

    /// Progress through the current level, in percent.
    pub fn xp_progress_pct(&self) -> f64 {
        (self.xp % XP_PER_LEVEL) as f64 * 100.0 / XP_PER_LEVEL as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub remaining_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub display_name: String,
    pub full_name: String,
    pub avatar_url: String,
    pub level: u32,
    pub xp: u64,
    pub xp_progress_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub running: bool,
    pub display: String,
    pub task_name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsView {
    pub theme: Theme,
    pub notifications: bool,
    pub daily_goal: u32,
    pub break_reminder: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_minutes: u64,
    pub total_tasks: Option<u64>,
    pub productivity: Option<f64>,
    pub goal_pct: f64,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub minutes: u64,
}

/// Everything the page needs; produced by the session and rendered by `ui`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub screen: Screen,
    pub date_line: String,
    pub profile: ProfileView,
    pub timer: TimerView,
    pub categories: Vec<CategoryOption>,
    pub chart: Vec<ChartBar>,
    pub summary: StatsSummary,
    pub settings: SettingsView,
    pub toast: Option<ToastView>,
}

pub fn full_name(identity: &HostIdentity) -> String {
    identity
        .username
        .as_deref()
        .or(identity.first_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("User")
        .to_string()
}

pub fn display_name(name: &str) -> String {
    if name.chars().count() > DISPLAY_NAME_LIMIT {
        let kept: String = name.chars().take(DISPLAY_NAME_KEEP).collect();
        format!("{kept}...")
    } else {
        name.to_string()
    }
}

pub fn avatar_url(identity: &HostIdentity, name: &str) -> String {
    match identity.photo_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => url.to_string(),
        None => {
            let initial: String = name.chars().take(1).flat_map(char::to_uppercase).collect();
            format!("{AVATAR_PLACEHOLDER}{initial}")
        }
    }
}

pub fn profile_view(identity: &HostIdentity, profile: &Profile) -> ProfileView {
    let full = full_name(identity);
    ProfileView {
        display_name: display_name(&full),
        avatar_url: avatar_url(identity, &full),
        full_name: full,
        level: profile.level(),
        xp: profile.xp,
        xp_progress_pct: profile.xp_progress_pct(),
    }
}

/// The default category always comes first; a server-side "other" is folded into it.
pub fn category_options(categories: &[Category]) -> Vec<CategoryOption> {
    let mut options = vec![CategoryOption {
        value: DEFAULT_CATEGORY.to_string(),
        label: "Other".to_string(),
    }];
    options.extend(
        categories
            .iter()
            .filter(|category| !category.name.eq_ignore_ascii_case(DEFAULT_CATEGORY))
            .map(|category| CategoryOption {
                value: match &category.id {
                    RecordId::Number(id) => id.to_string(),
                    RecordId::Text(_) => category.name.clone(),
                },
                label: category.name.clone(),
            }),
    );
    options
}

/// Category totals, largest first.
pub fn category_totals(totals: &BTreeMap<String, f64>) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = totals
        .iter()
        .filter(|(_, minutes)| minutes.is_finite())
        .map(|(name, minutes)| CategoryTotal {
            name: name.clone(),
            minutes: minutes.max(0.0).round() as u64,
        })
        .collect();
    totals.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.name.cmp(&b.name)));
    totals
}

pub fn toast_view(toast: &Toast, now: DateTime<Utc>) -> Option<ToastView> {
    let remaining_ms = (toast.expires_at - now).num_milliseconds();
    (remaining_ms > 0).then(|| ToastView {
        message: toast.message.clone(),
        kind: toast.kind,
        remaining_ms,
    })
}

pub fn date_line(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%A, %-d %B %Y").to_string()
}
