//! The chat page itself

use axum::{Router, response::Html, routing::get};

const PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Haven</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #222; }
  h1 { font-weight: 600; }
  #history { border: 1px solid #ddd; border-radius: 8px; padding: 1rem; min-height: 300px; max-height: 60vh; overflow-y: auto; }
  .entry { margin: 0.4rem 0; white-space: pre-wrap; }
  .entry b { margin-right: 0.3rem; }
  .greeting { color: #666; font-style: italic; }
  .notice { color: #a33; margin: 0.5rem 0; min-height: 1.2rem; }
  .emotions { color: #777; font-size: 0.85rem; }
  form { display: flex; gap: 0.5rem; margin-top: 1rem; }
  input[type=text] { flex: 1; padding: 0.5rem; }
  button { padding: 0.5rem 1rem; }
</style>
</head>
<body>
<h1>Haven</h1>
<div id="history"></div>
<div id="notice" class="notice"></div>
<div id="emotions" class="emotions"></div>
<form id="chat">
  <input type="text" id="text" placeholder="Type your message..." autocomplete="off">
  <button type="submit">Submit</button>
  <button type="button" id="speak">Speak</button>
</form>
<script>
const historyEl = document.getElementById('history');
const noticeEl = document.getElementById('notice');
const emotionsEl = document.getElementById('emotions');
const textEl = document.getElementById('text');
const buttons = document.querySelectorAll('button');

function busy(on) { buttons.forEach(b => b.disabled = on); }

function render(data) {
  historyEl.innerHTML = '';
  if (data.greeting) {
    const p = document.createElement('div');
    p.className = 'entry greeting';
    p.textContent = data.greeting;
    historyEl.appendChild(p);
  }
  for (const e of data.entries) {
    const p = document.createElement('div');
    p.className = 'entry';
    const who = document.createElement('b');
    who.textContent = e.label + ':';
    p.appendChild(who);
    p.appendChild(document.createTextNode(e.text));
    historyEl.appendChild(p);
  }
  historyEl.scrollTop = historyEl.scrollHeight;
}

async function refresh() {
  const res = await fetch('/api/history');
  render(await res.json());
}

function show(outcome) {
  noticeEl.textContent = '';
  emotionsEl.textContent = '';
  if (outcome.outcome === 'aborted') {
    noticeEl.textContent = outcome.notice;
  } else if (outcome.outcome === 'completed') {
    if (outcome.origin === 'voice') noticeEl.textContent = 'You said: ' + outcome.user;
    if (outcome.emotions.length) {
      emotionsEl.textContent = 'Detected emotions: ' +
        outcome.emotions.map(e => e.label + ' (' + e.confidence.toFixed(2) + ')').join(', ');
    }
  }
}

async function turn(url, body) {
  busy(true);
  try {
    const res = await fetch(url, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: body ? JSON.stringify(body) : null,
    });
    const data = await res.json();
    if (!res.ok) {
      noticeEl.textContent = data.error ? data.error.message : 'Request failed';
    } else {
      show(data);
    }
    await refresh();
  } catch (err) {
    noticeEl.textContent = 'Could not reach the server.';
  } finally {
    busy(false);
  }
}

document.getElementById('chat').addEventListener('submit', async (ev) => {
  ev.preventDefault();
  const text = textEl.value;
  if (!text.trim()) return;
  textEl.value = '';
  await turn('/api/chat', { text });
});

document.getElementById('speak').addEventListener('click', async () => {
  noticeEl.textContent = 'Listening...';
  await turn('/api/speak');
});

refresh();
</script>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(PAGE)
}

/// Build page router
pub fn router() -> Router {
    Router::new().route("/", get(index))
}
