use crate::api::StatsService;
use crate::errors::ClientError;
use crate::models::{
    ActivityRecord, Category, FinishActivityRequest, FinishActivityResponse, HostIdentity,
    SettingsUpdate, StartActivityRequest,
};
use crate::stats::{DailyStats, build_chart};
use crate::timer::{IDLE_DISPLAY, Ticker, format_elapsed};
use crate::view::{
    self, DEFAULT_CATEGORY, Profile, Screen, SettingsView, StatsSummary, TimerView, Toast,
    ToastKind, ViewModel,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub chart_scale_floor: f64,
    pub toast_ttl: Duration,
    pub tick_period: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chart_scale_floor: 60.0,
            toast_ttl: Duration::from_secs(3),
            tick_period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveActivity {
    pub record: ActivityRecord,
    pub started_at: DateTime<Utc>,
}

/// State of the one user session: the active activity, its tick source and
/// everything the view renders. All transitions go through `&mut self`, so the
/// "one activity, one tick source" rule is checked in a single place.
pub struct Session {
    service: Arc<dyn StatsService>,
    identity: HostIdentity,
    options: SessionOptions,
    profile: Profile,
    categories: Vec<Category>,
    stats: DailyStats,
    active: Option<ActiveActivity>,
    ticker: Ticker,
    screen: Screen,
    toast: Option<Toast>,
}

impl Session {
    pub fn new(
        service: Arc<dyn StatsService>,
        identity: HostIdentity,
        options: SessionOptions,
    ) -> Self {
        let ticker = Ticker::new(options.tick_period);
        Self {
            service,
            identity,
            options,
            profile: Profile::default(),
            categories: Vec::new(),
            stats: DailyStats::default(),
            active: None,
            ticker,
            screen: Screen::Main,
            toast: None,
        }
    }

    /// Initial load. Profile, categories and stats are fetched concurrently
    /// and each result lands in its own part of the view.
    pub async fn load(&mut self) {
        let service = Arc::clone(&self.service);
        let (user, categories, stats) = tokio::join!(
            service.fetch_user(),
            service.fetch_categories(),
            service.fetch_daily_stats()
        );

        match user {
            Ok(user) => self.profile.apply_user(user),
            Err(err) => self.report("load profile", &err),
        }
        match categories {
            Ok(categories) => self.categories = categories,
            Err(err) => self.report("load categories", &err),
        }
        match stats {
            Ok(stats) => self.stats = stats,
            Err(err) => self.report("load daily stats", &err),
        }
    }

    pub fn state(&self) -> TimerState {
        if self.active.is_some() {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    pub fn active(&self) -> Option<&ActiveActivity> {
        self.active.as_ref()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn subscribe_ticks(&self) -> watch::Receiver<String> {
        self.ticker.subscribe()
    }

    pub async fn start(
        &mut self,
        name: &str,
        category: Option<&str>,
    ) -> Result<&ActiveActivity, ClientError> {
        if self.active.is_some() {
            let err = ClientError::AlreadyRunning;
            self.report("start activity", &err);
            return Err(err);
        }

        let name = name.trim();
        if name.is_empty() {
            let err = ClientError::Validation("Enter a task name".to_string());
            self.report("start activity", &err);
            return Err(err);
        }

        let request = StartActivityRequest {
            name: name.to_string(),
            category: category
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
        };

        let record = match self.service.start_activity(&request).await {
            Ok(record) => record,
            Err(err) => {
                self.report("start activity", &err);
                return Err(err);
            }
        };

        let started_at = Utc::now();
        info!(activity_id = %record.id, name = %record.name, "activity started");
        self.ticker.start(started_at);
        self.notify(ToastKind::Success, "Task started".to_string());
        Ok(&*self.active.insert(ActiveActivity { record, started_at }))
    }

    /// Finishes the active activity. Returns `Ok(None)` when nothing is running.
    pub async fn finish(
        &mut self,
        notes: Option<String>,
        productivity: Option<u8>,
    ) -> Result<Option<FinishActivityResponse>, ClientError> {
        let Some(activity_id) = self.active.as_ref().map(|active| active.record.id.clone()) else {
            return Ok(None);
        };

        if let Some(rating) = productivity {
            if !(1..=5).contains(&rating) {
                let err = ClientError::Validation("Productivity must be from 1 to 5".to_string());
                self.report("finish activity", &err);
                return Err(err);
            }
        }

        let request = FinishActivityRequest {
            activity_id,
            notes: notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            productivity,
        };

        let response = match self.service.finish_activity(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.report("finish activity", &err);
                return Err(err);
            }
        };

        self.ticker.stop();
        self.active = None;
        // Without a server level, derive it from XP so level and progress agree.
        self.profile.level = response.level;
        match response.xp {
            Some(xp) => self.profile.xp = xp,
            None => self.profile.xp = self.profile.xp.saturating_add(response.xp_earned),
        }
        info!(
            activity_id = %request.activity_id,
            xp_earned = response.xp_earned,
            "activity finished"
        );
        self.notify(
            ToastKind::Success,
            format!("Task finished: +{} XP", response.xp_earned),
        );

        // The finish toast stays unless the refresh fails.
        let _ = self.refresh_stats().await;
        Ok(Some(response))
    }

    pub async fn refresh_stats(&mut self) -> Result<(), ClientError> {
        match self.service.fetch_daily_stats().await {
            Ok(stats) => {
                self.stats = stats;
                Ok(())
            }
            Err(err) => {
                self.report("load daily stats", &err);
                Err(err)
            }
        }
    }

    /// Applies the setting locally, then persists it.
    pub async fn update_setting(&mut self, update: SettingsUpdate) -> Result<(), ClientError> {
        match update {
            SettingsUpdate::Theme(theme) => self.profile.theme = theme,
            SettingsUpdate::Notifications(enabled) => self.profile.notifications = enabled,
            SettingsUpdate::DailyGoal(minutes) => self.profile.daily_goal = minutes,
            SettingsUpdate::BreakReminder(minutes) => self.profile.break_reminder = minutes,
        }

        match self.service.update_settings(&update).await {
            Ok(()) => {
                self.notify(ToastKind::Success, "Settings saved".to_string());
                Ok(())
            }
            Err(err) => {
                self.report("update settings", &err);
                Err(err)
            }
        }
    }

    pub fn navigate(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn view(&self) -> ViewModel {
        self.view_at(Utc::now())
    }

    pub fn view_at(&self, now: DateTime<Utc>) -> ViewModel {
        let timer = match &self.active {
            Some(active) => TimerView {
                running: true,
                display: format_elapsed(active.started_at, now),
                task_name: Some(active.record.name.clone()),
                category: active.record.category.clone(),
            },
            None => TimerView {
                running: false,
                display: IDLE_DISPLAY.to_string(),
                task_name: None,
                category: None,
            },
        };

        let total_minutes = self.stats.total_minutes.max(0.0).round() as u64;
        let goal_pct = if self.profile.daily_goal == 0 {
            0.0
        } else {
            (total_minutes as f64 * 100.0 / f64::from(self.profile.daily_goal)).min(100.0)
        };

        ViewModel {
            screen: self.screen,
            date_line: view::date_line(now),
            profile: view::profile_view(&self.identity, &self.profile),
            timer,
            categories: view::category_options(&self.categories),
            chart: build_chart(&self.stats, self.options.chart_scale_floor),
            summary: StatsSummary {
                total_minutes,
                total_tasks: self.stats.total_tasks,
                productivity: self.stats.productivity,
                goal_pct,
                categories: view::category_totals(&self.stats.categories),
            },
            settings: SettingsView {
                theme: self.profile.theme,
                notifications: self.profile.notifications,
                daily_goal: self.profile.daily_goal,
                break_reminder: self.profile.break_reminder,
            },
            toast: self
                .toast
                .as_ref()
                .and_then(|toast| view::toast_view(toast, now)),
        }
    }

    fn notify(&mut self, kind: ToastKind, message: String) {
        let ttl = chrono::Duration::from_std(self.options.toast_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(3));
        self.toast = Some(Toast {
            message,
            kind,
            expires_at: Utc::now() + ttl,
        });
    }

    fn report(&mut self, action: &str, err: &ClientError) {
        warn!("{action} failed: {err}");
        self.notify(ToastKind::Error, err.user_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordId, Theme, UserProfile};
    use crate::stats::HourBucket;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<&'static str>>,
        fail_start: Mutex<bool>,
        fail_finish: Mutex<bool>,
        fail_stats: Mutex<bool>,
        xp_in_finish: bool,
    }

    impl FakeService {
        fn count(&self, call: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|made| **made == call)
                .count()
        }

        fn total(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl StatsService for FakeService {
        async fn fetch_user(&self) -> Result<UserProfile, ClientError> {
            self.record("user");
            Ok(UserProfile {
                level: Some(2),
                xp: 140,
                theme: Some(Theme::Dark),
                ..UserProfile::default()
            })
        }

        async fn fetch_categories(&self) -> Result<Vec<Category>, ClientError> {
            self.record("categories");
            Ok(vec![Category {
                id: RecordId::Number(1),
                name: "Work".to_string(),
            }])
        }

        async fn fetch_daily_stats(&self) -> Result<DailyStats, ClientError> {
            self.record("stats");
            if *self.fail_stats.lock().unwrap() {
                return Err(ClientError::Malformed("expected hours".to_string()));
            }
            Ok(DailyStats {
                hours: vec![
                    HourBucket { hour: 9, minutes: 0.0 },
                    HourBucket { hour: 10, minutes: 10.0 },
                    HourBucket { hour: 11, minutes: 40.0 },
                    HourBucket { hour: 12, minutes: 0.0 },
                ],
                total_minutes: 50.0,
                ..DailyStats::default()
            })
        }

        async fn start_activity(
            &self,
            request: &StartActivityRequest,
        ) -> Result<ActivityRecord, ClientError> {
            self.record("start");
            if *self.fail_start.lock().unwrap() {
                return Err(ClientError::Server {
                    status: 400,
                    message: "Category not found".to_string(),
                });
            }
            Ok(ActivityRecord {
                id: RecordId::Number(11),
                name: request.name.clone(),
                category: Some(request.category.clone()),
                start_time: None,
            })
        }

        async fn finish_activity(
            &self,
            _request: &FinishActivityRequest,
        ) -> Result<FinishActivityResponse, ClientError> {
            self.record("finish");
            if *self.fail_finish.lock().unwrap() {
                return Err(ClientError::Transport("connection reset".to_string()));
            }
            Ok(FinishActivityResponse {
                xp_earned: 25,
                duration: Some(25),
                level: None,
                xp: self.xp_in_finish.then_some(165),
            })
        }

        async fn update_settings(&self, _update: &SettingsUpdate) -> Result<(), ClientError> {
            self.record("settings");
            Ok(())
        }
    }

    fn identity() -> HostIdentity {
        HostIdentity {
            id: 42,
            username: Some("tester".to_string()),
            first_name: None,
            photo_url: None,
        }
    }

    fn options() -> SessionOptions {
        SessionOptions {
            chart_scale_floor: 0.0,
            ..SessionOptions::default()
        }
    }

    fn session_with(service: &Arc<FakeService>) -> Session {
        let service: Arc<dyn StatsService> = service.clone();
        Session::new(service, identity(), options())
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_network_call() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);

        let err = session.start("   ", Some("1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(service.total(), 0);
        assert_eq!(session.state(), TimerState::Idle);
        assert!(!session.is_ticking());
        let toast = session.view().toast.expect("error toast");
        assert_eq!(toast.kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);

        let active = session.start("Write report", None).await.unwrap();
        assert_eq!(active.record.category.as_deref(), Some("other"));
        assert_eq!(session.state(), TimerState::Running);
        assert!(session.is_ticking());

        let err = session.start("Another", Some("1")).await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyRunning));
        assert_eq!(service.count("start"), 1);
        assert_eq!(session.active().unwrap().record.name, "Write report");
        assert!(session.is_ticking());
    }

    #[tokio::test]
    async fn finish_when_idle_is_a_noop() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);

        let result = session.finish(None, Some(3)).await.unwrap();
        assert!(result.is_none());
        assert_eq!(service.total(), 0);
        assert!(session.view().toast.is_none());
    }

    #[tokio::test]
    async fn finish_stops_ticking_and_refreshes_stats_once() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        session.start("Deep work", Some("1")).await.unwrap();

        let response = session
            .finish(Some("  wrapped up ".to_string()), Some(5))
            .await
            .unwrap()
            .expect("finish response");

        assert_eq!(response.xp_earned, 25);
        assert_eq!(session.state(), TimerState::Idle);
        assert!(!session.is_ticking());
        assert_eq!(service.count("finish"), 1);
        assert_eq!(service.count("stats"), 1);

        let view = session.view();
        assert_eq!(view.timer.display, "00:00:00");
        assert!(!view.timer.running);
        assert_eq!(view.profile.xp, 25);
        assert_eq!(view.toast.unwrap().message, "Task finished: +25 XP");
        let heights: Vec<f64> = view.chart.iter().map(|bar| bar.height_pct).collect();
        assert_eq!(heights, vec![0.0, 25.0, 100.0, 0.0]);
    }

    #[tokio::test]
    async fn failed_finish_keeps_activity_running() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        session.start("Reading", None).await.unwrap();

        *service.fail_finish.lock().unwrap() = true;
        let err = session.finish(None, None).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(session.state(), TimerState::Running);
        assert!(session.is_ticking());
        assert_eq!(service.count("stats"), 0);

        *service.fail_finish.lock().unwrap() = false;
        assert!(session.finish(None, None).await.unwrap().is_some());
        assert_eq!(session.state(), TimerState::Idle);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_locally() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        session.start("Reading", None).await.unwrap();

        let err = session.finish(None, Some(7)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(service.count("finish"), 0);
        assert_eq!(session.state(), TimerState::Running);
    }

    #[tokio::test]
    async fn same_theme_twice_is_idempotent() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);

        session
            .update_setting(SettingsUpdate::Theme(Theme::Dark))
            .await
            .unwrap();
        let first = session.profile().clone();
        session
            .update_setting(SettingsUpdate::Theme(Theme::Dark))
            .await
            .unwrap();

        assert_eq!(session.profile(), &first);
        assert_eq!(session.profile().theme, Theme::Dark);
        assert_eq!(service.count("settings"), 2);
    }

    #[tokio::test]
    async fn load_degrades_to_empty_chart_on_bad_stats() {
        let service = Arc::new(FakeService {
            fail_stats: Mutex::new(true),
            ..FakeService::default()
        });
        let mut session = session_with(&service);
        session.load().await;

        let view = session.view();
        assert!(view.chart.is_empty());
        assert_eq!(view.profile.level, 2);
        assert_eq!(view.settings.theme, Theme::Dark);
        assert_eq!(view.categories.len(), 2);
        assert_eq!(view.toast.unwrap().kind, ToastKind::Error);
        assert_eq!(service.count("user"), 1);
        assert_eq!(service.count("categories"), 1);
    }

    #[tokio::test]
    async fn view_recomputes_elapsed_from_start() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        let started_at = session.start("Focus", None).await.unwrap().started_at;

        let view = session.view_at(started_at + chrono::Duration::seconds(3725));
        assert!(view.timer.running);
        assert_eq!(view.timer.display, "01:02:05");
        assert_eq!(view.timer.task_name.as_deref(), Some("Focus"));
    }

    #[tokio::test]
    async fn rejected_start_stays_idle() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        *service.fail_start.lock().unwrap() = true;

        let err = session.start("Write report", Some("99")).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 400, .. }));
        assert_eq!(service.count("start"), 1);
        assert_eq!(session.state(), TimerState::Idle);
        assert!(!session.is_ticking());
        let view = session.view();
        assert!(!view.timer.running);
        let toast = view.toast.expect("error toast");
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Category not found");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_chart() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        session.load().await;
        let before = session.view().chart;
        assert_eq!(before.len(), 4);

        *service.fail_stats.lock().unwrap() = true;
        let err = session.refresh_stats().await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));

        let view = session.view();
        assert_eq!(view.chart, before);
        assert_eq!(view.toast.expect("error toast").kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn level_follows_xp_when_finish_omits_it() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        session.load().await;
        assert_eq!(session.view().profile.level, 2);

        for _ in 0..3 {
            session.start("Sprint", None).await.unwrap();
            session.finish(None, None).await.unwrap();
        }

        let profile = session.view().profile;
        assert_eq!(profile.xp, 215);
        assert_eq!(profile.level, 3);
        assert_eq!(profile.xp_progress_pct, 15.0);
    }

    #[tokio::test]
    async fn server_xp_replaces_local_total() {
        let service = Arc::new(FakeService {
            xp_in_finish: true,
            ..FakeService::default()
        });
        let mut session = session_with(&service);
        session.load().await;
        session.start("Sprint", None).await.unwrap();
        session.finish(None, None).await.unwrap();

        let profile = session.view().profile;
        assert_eq!(profile.xp, 165);
        assert_eq!(profile.level, 2);
    }

    #[tokio::test]
    async fn category_totals_reach_the_view() {
        let service = Arc::new(FakeService::default());
        let mut session = session_with(&service);
        let payload: crate::models::DailyStatsPayload =
            serde_json::from_str(r#"{"total_time": 50, "categories": {"Work": 50}}"#).unwrap();
        session.stats = DailyStats::from(payload);

        let view = session.view();
        assert_eq!(view.summary.total_minutes, 50);
        assert_eq!(view.summary.categories.len(), 1);
        assert_eq!(view.summary.categories[0].name, "Work");
        assert_eq!(view.summary.categories[0].minutes, 50);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"Work\""));
    }
}
