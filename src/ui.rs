use crate::models::Theme;
use crate::view::{Screen, ToastKind, ViewModel};

pub fn render_index(view: &ViewModel) -> String {
    let profile = &view.profile;
    let timer = &view.timer;
    let settings = &view.settings;

    let mut page = INDEX_HTML.to_string();
    for screen in Screen::ALL {
        let hidden = if screen == view.screen { "" } else { " hidden" };
        page = page
            .replace(&format!("{{{{HIDDEN_{}}}}}", screen.as_str().to_uppercase()), hidden)
            .replace(
                &format!("{{{{NAV_{}}}}}", screen.as_str().to_uppercase()),
                if screen == view.screen { " active" } else { "" },
            );
    }

    let current_task = match (&timer.task_name, &timer.category) {
        (Some(name), Some(category)) => format!("{} · {}", escape(name), escape(category)),
        (Some(name), None) => escape(name),
        _ => "No task running".to_string(),
    };

    let productivity = view
        .summary
        .productivity
        .map(|value| format!("{value:.1}"))
        .unwrap_or_else(|| "--".to_string());
    let total_tasks = view
        .summary
        .total_tasks
        .map(|value| value.to_string())
        .unwrap_or_else(|| "--".to_string());

    page.replace("{{THEME}}", settings.theme.as_str())
        .replace("{{DATE}}", &escape(&view.date_line))
        .replace("{{DISPLAY_NAME}}", &escape(&profile.display_name))
        .replace("{{FULL_NAME}}", &escape(&profile.full_name))
        .replace("{{AVATAR}}", &escape(&profile.avatar_url))
        .replace("{{LEVEL}}", &profile.level.to_string())
        .replace("{{XP}}", &profile.xp.to_string())
        .replace("{{XP_PCT}}", &format!("{:.0}", profile.xp_progress_pct))
        .replace("{{TIMER}}", &timer.display)
        .replace("{{CURRENT_TASK}}", &current_task)
        .replace("{{START_HIDDEN}}", if timer.running { " hidden" } else { "" })
        .replace("{{FINISH_HIDDEN}}", if timer.running { "" } else { " hidden" })
        .replace("{{CATEGORY_OPTIONS}}", &render_categories(view))
        .replace("{{CHART}}", &render_chart(view))
        .replace("{{CATEGORY_TOTALS}}", &render_category_totals(view))
        .replace("{{TOTAL_MINUTES}}", &view.summary.total_minutes.to_string())
        .replace("{{TOTAL_TASKS}}", &total_tasks)
        .replace("{{PRODUCTIVITY}}", &productivity)
        .replace("{{GOAL_PCT}}", &format!("{:.0}", view.summary.goal_pct))
        .replace("{{DAILY_GOAL}}", &settings.daily_goal.to_string())
        .replace("{{BREAK_REMINDER}}", &settings.break_reminder.to_string())
        .replace(
            "{{LIGHT_SELECTED}}",
            if settings.theme == Theme::Light { " selected" } else { "" },
        )
        .replace(
            "{{DARK_SELECTED}}",
            if settings.theme == Theme::Dark { " selected" } else { "" },
        )
        .replace(
            "{{NOTIFICATIONS_ON}}",
            if settings.notifications { " selected" } else { "" },
        )
        .replace(
            "{{NOTIFICATIONS_OFF}}",
            if settings.notifications { "" } else { " selected" },
        )
        .replace("{{TOAST}}", &render_toast(view))
}

fn render_categories(view: &ViewModel) -> String {
    view.categories
        .iter()
        .map(|option| {
            format!(
                r#"<option value="{}">{}</option>"#,
                escape(&option.value),
                escape(&option.label)
            )
        })
        .collect()
}

fn render_chart(view: &ViewModel) -> String {
    if view.chart.is_empty() {
        return r#"<p class="empty">No activity tracked today</p>"#.to_string();
    }
    view.chart
        .iter()
        .map(|bar| {
            format!(
                r#"<div class="chart-column" data-time="{hour}"><div class="chart-bar" style="height: {height:.1}%" title="{label}"></div><span>{hour}</span></div>"#,
                hour = bar.hour,
                height = bar.height_pct,
                label = escape(&bar.label),
            )
        })
        .collect()
}

fn render_category_totals(view: &ViewModel) -> String {
    if view.summary.categories.is_empty() {
        return String::new();
    }
    let rows: String = view
        .summary
        .categories
        .iter()
        .map(|total| {
            format!(
                r#"<li><span>{}</span><span>{} min</span></li>"#,
                escape(&total.name),
                total.minutes
            )
        })
        .collect();
    format!(r#"<ul class="category-totals">{rows}</ul>"#)
}

fn render_toast(view: &ViewModel) -> String {
    match &view.toast {
        Some(toast) => {
            let kind = match toast.kind {
                ToastKind::Success => "success",
                ToastKind::Error => "error",
            };
            format!(
                r#"<div class="toast {kind}" id="toast" data-remaining="{}">{}</div>"#,
                toast.remaining_ms,
                escape(&toast.message)
            )
        }
        None => String::new(),
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Pixel Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Press+Start+2P&display=swap');

    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: #ffffff;
      --muted: #8b857d;
    }

    body[data-theme="dark"] {
      --bg: #1d1f24;
      --ink: #f2efe9;
      --accent-2: #8fb8cc;
      --card: #2a2d34;
      --muted: #a49d94;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 18px 16px 88px;
    }

    header {
      display: flex;
      align-items: center;
      gap: 12px;
    }

    header img {
      width: 44px;
      height: 44px;
      border-radius: 50%;
    }

    .level {
      font-family: "Press Start 2P", monospace;
      font-size: 0.7rem;
      color: var(--accent);
    }

    .xp-track {
      height: 8px;
      background: rgba(47, 72, 88, 0.15);
      border-radius: 999px;
      overflow: hidden;
    }

    .xp-fill {
      height: 100%;
      background: var(--accent);
    }

    .date {
      color: var(--muted);
      font-size: 0.9rem;
    }

    .card {
      background: var(--card);
      border-radius: 18px;
      padding: 18px;
      margin-top: 16px;
      display: grid;
      gap: 12px;
    }

    #timer {
      font-family: "Press Start 2P", monospace;
      font-size: 2rem;
      text-align: center;
      color: var(--accent-2);
    }

    input, select, textarea, button {
      font: inherit;
      padding: 10px 12px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      border: none;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    .chart {
      display: flex;
      align-items: flex-end;
      gap: 6px;
      height: 160px;
    }

    .chart-column {
      flex: 1;
      height: 100%;
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      align-items: center;
      font-size: 0.7rem;
      color: var(--muted);
    }

    .chart-bar {
      width: 100%;
      min-height: 2px;
      background: var(--accent-2);
      border-radius: 4px 4px 0 0;
    }

    .metrics {
      display: grid;
      grid-template-columns: repeat(3, 1fr);
      gap: 8px;
      text-align: center;
    }

    .metrics .label {
      display: block;
      font-size: 0.75rem;
      text-transform: uppercase;
      color: var(--muted);
    }

    nav {
      position: fixed;
      bottom: 0;
      left: 0;
      right: 0;
      display: flex;
      background: var(--card);
      box-shadow: 0 -6px 18px rgba(0, 0, 0, 0.08);
    }

    nav form {
      flex: 1;
    }

    nav button {
      width: 100%;
      border-radius: 0;
      background: transparent;
      color: var(--muted);
    }

    nav button.active {
      color: var(--accent);
    }

    .toast {
      position: fixed;
      top: 12px;
      left: 50%;
      transform: translateX(-50%);
      padding: 10px 16px;
      border-radius: 12px;
      color: white;
    }

    .toast.success {
      background: #2d7a4b;
    }

    .toast.error {
      background: #c63b2b;
    }

    .category-totals {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 6px;
    }

    .category-totals li {
      display: flex;
      justify-content: space-between;
    }

    .hidden {
      display: none !important;
    }

    .empty {
      margin: auto;
      color: var(--muted);
    }
  </style>
</head>
<body data-theme="{{THEME}}">
  {{TOAST}}
  <header>
    <img id="userAvatar" src="{{AVATAR}}" alt="" />
    <div>
      <div id="username" title="{{FULL_NAME}}">{{DISPLAY_NAME}}</div>
      <div class="level">LVL <span id="userLevel">{{LEVEL}}</span></div>
    </div>
  </header>
  <p class="date" id="currentDate">{{DATE}}</p>

  <section class="screen{{HIDDEN_MAIN}}" id="main-screen">
    <div class="card">
      <div id="timer">{{TIMER}}</div>
      <p id="currentTask">{{CURRENT_TASK}}</p>
      <form class="card{{START_HIDDEN}}" method="post" action="/activity/start">
        <input id="taskInput" name="name" placeholder="What are you working on?" autocomplete="off" />
        <select id="categorySelect" name="category">{{CATEGORY_OPTIONS}}</select>
        <button id="startTaskBtn" type="submit">Start</button>
      </form>
      <form class="card{{FINISH_HIDDEN}}" method="post" action="/activity/finish">
        <textarea name="notes" placeholder="Notes (optional)"></textarea>
        <select name="productivity">
          <option value="">Productivity</option>
          <option value="1">1</option>
          <option value="2">2</option>
          <option value="3">3</option>
          <option value="4">4</option>
          <option value="5">5</option>
        </select>
        <button id="finishTaskBtn" type="submit">Finish</button>
      </form>
    </div>
    <div class="card">
      <div class="chart" id="activityChart">{{CHART}}</div>
    </div>
  </section>

  <section class="screen{{HIDDEN_STATS}}" id="stats-screen">
    <div class="card">
      <div class="metrics">
        <div><span class="label">Minutes</span>{{TOTAL_MINUTES}}</div>
        <div><span class="label">Tasks</span>{{TOTAL_TASKS}}</div>
        <div><span class="label">Productivity</span>{{PRODUCTIVITY}}</div>
      </div>
      <div class="xp-track"><div class="xp-fill" style="width: {{GOAL_PCT}}%"></div></div>
      {{CATEGORY_TOTALS}}
      <form method="post" action="/stats/refresh"><button type="submit">Refresh</button></form>
    </div>
  </section>

  <section class="screen{{HIDDEN_PROFILE}}" id="profile-screen">
    <div class="card">
      <h2 id="profileUsername">{{FULL_NAME}}</h2>
      <p>Level {{LEVEL}} · {{XP}} XP</p>
      <div class="xp-track"><div class="xp-fill" id="xpProgress" style="width: {{XP_PCT}}%"></div></div>
    </div>
  </section>

  <section class="screen{{HIDDEN_SETTINGS}}" id="settings-screen">
    <form class="card" method="post" action="/settings/theme">
      <label>Theme
        <select id="themeSelect" name="value">
          <option value="light"{{LIGHT_SELECTED}}>Light</option>
          <option value="dark"{{DARK_SELECTED}}>Dark</option>
        </select>
      </label>
      <button type="submit">Save</button>
    </form>
    <form class="card" method="post" action="/settings/notifications">
      <label>Notifications
        <select id="notificationsToggle" name="value">
          <option value="true"{{NOTIFICATIONS_ON}}>On</option>
          <option value="false"{{NOTIFICATIONS_OFF}}>Off</option>
        </select>
      </label>
      <button type="submit">Save</button>
    </form>
    <form class="card" method="post" action="/settings/daily_goal">
      <label>Daily goal (minutes) <input type="number" name="value" min="1" max="1440" value="{{DAILY_GOAL}}" /></label>
      <button type="submit">Save</button>
    </form>
    <form class="card" method="post" action="/settings/break_reminder">
      <label>Break reminder (minutes, 0 = off) <input type="number" name="value" min="0" max="240" value="{{BREAK_REMINDER}}" /></label>
      <button type="submit">Save</button>
    </form>
  </section>

  <nav>
    <form method="post" action="/screen/main"><button class="nav-item{{NAV_MAIN}}" type="submit">Timer</button></form>
    <form method="post" action="/screen/stats"><button class="nav-item{{NAV_STATS}}" type="submit">Stats</button></form>
    <form method="post" action="/screen/profile"><button class="nav-item{{NAV_PROFILE}}" type="submit">Profile</button></form>
    <form method="post" action="/screen/settings"><button class="nav-item{{NAV_SETTINGS}}" type="submit">Settings</button></form>
  </nav>

  <script>
    const timerEl = document.getElementById('timer');
    const toastEl = document.getElementById('toast');

    if (window.Telegram && window.Telegram.WebApp) {
      window.Telegram.WebApp.expand();
    }

    if (toastEl) {
      setTimeout(() => toastEl.classList.add('hidden'), Number(toastEl.dataset.remaining) || 0);
    }

    const pollTimer = async () => {
      try {
        const res = await fetch('/api/timer');
        if (res.ok) {
          const timer = await res.json();
          timerEl.textContent = timer.display;
        }
      } catch (err) {
        await new Promise((resolve) => setTimeout(resolve, 1000));
      }
      pollTimer();
    };

    pollTimer();
  </script>
</body>
</html>
"#;
