/// Renders the dashboard page, optionally scoped to one user.
pub fn render_index(username: Option<&str>) -> String {
    let (title, user) = match username {
        Some(name) => (format!("{} &middot; R-Watch", escape_html(name)), escape_html(name)),
        None => ("Global Analytics Dashboard".to_string(), String::new()),
    };
    INDEX_HTML.replace("{{TITLE}}", &title).replace("{{USER}}", &user)
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #0f172a;
      --bg-2: #1e293b;
      --ink: #e2e8f0;
      --muted: #94a3b8;
      --accent: #3b82f6;
      --card: rgba(30, 41, 59, 0.86);
      --shadow: 0 24px 60px rgba(2, 6, 23, 0.45);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #111c33 60%, #0b1220 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1080px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: end;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.6rem);
      margin: 0;
    }

    .subtitle {
      margin: 6px 0 0;
      color: var(--muted);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .stat {
      background: rgba(15, 23, 42, 0.6);
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(148, 163, 184, 0.15);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
      overflow: hidden;
      text-overflow: ellipsis;
    }

    .tabs {
      display: flex;
      flex-wrap: wrap;
      gap: 6px;
      padding: 6px;
      background: rgba(148, 163, 184, 0.1);
      border-radius: 999px;
    }

    .tab {
      appearance: none;
      background: transparent;
      border: none;
      border-radius: 999px;
      padding: 8px 14px;
      font: inherit;
      font-size: 0.9rem;
      font-weight: 600;
      color: var(--muted);
      cursor: pointer;
    }

    .tab.active {
      background: var(--accent);
      color: white;
    }

    .chart-card {
      background: rgba(15, 23, 42, 0.6);
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(148, 163, 184, 0.15);
      height: 380px;
    }

    .status {
      font-size: 0.95rem;
      color: var(--muted);
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #f87171;
    }
  </style>
</head>
<body data-user="{{USER}}">
  <main class="app">
    <header>
      <div>
        <h1>R-Watch</h1>
        <p class="subtitle">{{TITLE}}</p>
      </div>
      <div class="tabs" role="tablist" id="units">
        <button class="tab active" data-unit="minutes">Minutes</button>
        <button class="tab" data-unit="seconds">Seconds</button>
      </div>
    </header>

    <section class="panel">
      <div class="stat"><span class="label">Total users</span><span class="value" id="users">--</span></div>
      <div class="stat"><span class="label" id="total-label">Total time</span><span class="value" id="total">--</span></div>
      <div class="stat"><span class="label">Most visited site</span><span class="value" id="top-site">--</span></div>
    </section>

    <div class="tabs" role="tablist" id="charts">
      <button class="tab active" data-chart="time_by_site">Time by site</button>
      <button class="tab" data-chart="users_per_site">Users per site</button>
      <button class="tab" data-chart="daily_time">Daily time</button>
      <button class="tab" data-chart="activity_over_time">Over time</button>
      <button class="tab" data-chart="last_24h">Last 24 hours</button>
    </div>

    <div class="chart-card"><canvas id="chart"></canvas></div>
    <div class="status" id="status"></div>
  </main>

  <script>
    const user = document.body.dataset.user;
    const statusEl = document.getElementById('status');
    const chartEl = document.getElementById('chart');
    const unitTabs = Array.from(document.querySelectorAll('[data-unit]'));
    const chartTabs = Array.from(document.querySelectorAll('[data-chart]'));
    const chartTypes = {
      time_by_site: 'pie',
      users_per_site: 'bar',
      daily_time: 'bar',
      activity_over_time: 'line',
      last_24h: 'pie'
    };

    let unit = 'minutes';
    let activeChart = 'time_by_site';
    let dashboard = null;
    let chart = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const endpoint = () => {
      const base = user
        ? `/api/users/${encodeURIComponent(user)}/dashboard`
        : '/api/dashboard';
      return `${base}?unit=${unit}`;
    };

    const colorize = (type, data) => {
      const datasets = data.datasets.map((dataset, i) => {
        if (type === 'pie') {
          return {
            ...dataset,
            backgroundColor: data.labels.map((_, j) => `hsl(${(j * 40) % 360}, 70%, 60%)`)
          };
        }
        const color = `hsl(${(i * 60) % 360}, 70%, 60%)`;
        return type === 'line'
          ? { ...dataset, borderColor: color, backgroundColor: 'transparent', tension: 0.3 }
          : { ...dataset, backgroundColor: color, borderRadius: 6 };
      });
      return { labels: data.labels, datasets };
    };

    const renderChart = () => {
      if (!dashboard) {
        return;
      }
      const type = chartTypes[activeChart];
      if (chart) {
        chart.destroy();
      }
      chart = new Chart(chartEl, {
        type,
        data: colorize(type, dashboard[activeChart]),
        options: { maintainAspectRatio: false, plugins: { legend: { labels: { color: '#e2e8f0' } } } }
      });
    };

    const renderSummary = () => {
      const summary = dashboard.summary;
      document.getElementById('users').textContent = summary.user_count;
      document.getElementById('total-label').textContent = `Total time (${unit === 'minutes' ? 'mins' : 'secs'})`;
      document.getElementById('total').textContent = summary.total_time_spent.toLocaleString();
      document.getElementById('top-site').textContent = summary.most_visited_site || 'N/A';
    };

    const load = async () => {
      setStatus('Loading...', '');
      const token = localStorage.getItem('token');
      const headers = user && token ? { Authorization: `Bearer ${token}` } : {};
      const res = await fetch(endpoint(), { headers });
      if (!res.ok) {
        throw new Error(await res.text() || `HTTP error: ${res.status}`);
      }
      dashboard = await res.json();
      renderSummary();
      renderChart();
      const skipped = dashboard.summary.skipped_records;
      setStatus(skipped ? `${skipped} record(s) without a usable site or date were left out of daily charts` : '', '');
    };

    const activate = (tabs, key, value) => {
      tabs.forEach((button) => button.classList.toggle('active', button.dataset[key] === value));
    };

    unitTabs.forEach((button) => {
      button.addEventListener('click', () => {
        unit = button.dataset.unit;
        activate(unitTabs, 'unit', unit);
        load().catch((err) => setStatus(err.message, 'error'));
      });
    });

    chartTabs.forEach((button) => {
      button.addEventListener('click', () => {
        activeChart = button.dataset.chart;
        activate(chartTabs, 'chart', activeChart);
        renderChart();
      });
    });

    load().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
