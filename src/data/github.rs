//! GitHub organization activity collector.
//!
//! Polls the public events of every member of an organization, counts push
//! activity per UTC day and merges the result into the metric CSVs the chart
//! reads. Event fetches are conditional (`If-None-Match`), so a member with no
//! new activity costs a `304` and nothing else; their last fetched push events
//! are cached beside the ETags and counted again.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::domain::{CollectConfig, DailyInfo};
use crate::error::AppError;
use crate::io::{read_etags, read_event_cache, write_daily_series, write_etags, write_event_cache};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const PUSH_EVENT: &str = "PushEvent";
const PRIVACY_TEMPLATE: &str = "{/privacy}";

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub login: String,
    pub events_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: EventPayload,
    pub actor: Actor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    /// Number of commits in a push.
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
}

/// Result of a conditional events request.
#[derive(Debug, Clone)]
pub enum EventsPage {
    NotModified,
    Fresh { events: Vec<Event>, etag: Option<String> },
}

/// Counters for one collector run.
#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub members: usize,
    pub fresh: usize,
    pub not_modified: usize,
    pub failed: usize,
    pub events: usize,
    pub days: Vec<DailyInfo>,
    pub written: Vec<std::path::PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_base: String,
    token: String,
}

impl GithubClient {
    pub fn new(api_base: &str, token: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vibe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Read the API token from `ACCESS_TOKEN` (a `.env` file is honored).
    pub fn from_env(api_base: &str, timeout: Duration) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let token = std::env::var("ACCESS_TOKEN")
            .map_err(|_| AppError::new(2, "Missing ACCESS_TOKEN in environment (.env)."))?;
        Self::new(api_base, token, timeout)
    }

    pub async fn fetch_members(&self, org: &str) -> Result<Vec<Member>, AppError> {
        let url = format!("{}/orgs/{org}/members", self.api_base);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .send()
            .await
            .map_err(|e| AppError::new(4, format!("Failed to fetch members of '{org}': {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::new(
                4,
                format!("Fetching members of '{org}' returned {status}: {body}"),
            ));
        }

        resp.json::<Vec<Member>>()
            .await
            .map_err(|e| AppError::new(4, format!("Invalid members response for '{org}': {e}")))
    }

    pub async fn fetch_events(&self, url: &str, etag: Option<&str>) -> Result<EventsPage, AppError> {
        let mut req = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token));
        if let Some(etag) = etag {
            req = req.header(IF_NONE_MATCH, etag);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::new(4, format!("Failed to fetch events from {url}: {e}")))?;

        match resp.status() {
            StatusCode::NOT_MODIFIED => Ok(EventsPage::NotModified),
            StatusCode::OK => {
                let etag = resp
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let events = resp
                    .json::<Vec<Event>>()
                    .await
                    .map_err(|e| AppError::new(4, format!("Invalid events response from {url}: {e}")))?;
                Ok(EventsPage::Fresh { events, etag })
            }
            status => Err(AppError::new(
                4,
                format!("Fetching events from {url} returned {status}"),
            )),
        }
    }
}

/// Turn a member's `events_url` template into a plain URL.
pub fn events_url(template: &str) -> String {
    template.replacen(PRIVACY_TEMPLATE, "", 1)
}

/// Count push activity per UTC day, ascending by date.
pub fn aggregate_push_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<DailyInfo> {
    let mut days: BTreeMap<NaiveDate, (u64, u64, HashSet<&str>)> = BTreeMap::new();

    for event in events.into_iter().filter(|e| e.kind == PUSH_EVENT) {
        let entry = days.entry(event.created_at.date_naive()).or_default();
        entry.0 += event.payload.size;
        entry.1 += 1;
        entry.2.insert(event.actor.login.as_str());
    }

    days.into_iter()
        .map(|(date, (commits, pushes, users))| DailyInfo {
            date,
            commits,
            pushes,
            users: users.len() as u64,
        })
        .collect()
}

/// Events of each current member: this run's fetch when there is one, the
/// cached events otherwise. Members no longer listed are dropped.
fn merge_with_cache(
    logins: &[String],
    mut fetched: HashMap<String, Vec<Event>>,
    mut cache: HashMap<String, Vec<Event>>,
) -> HashMap<String, Vec<Event>> {
    logins
        .iter()
        .filter_map(|login| {
            let events = fetched.remove(login).or_else(|| cache.remove(login))?;
            Some((login.clone(), events))
        })
        .collect()
}

/// Run one collection: fetch, aggregate, write series, ETags and event cache.
pub async fn collect_once(client: Arc<GithubClient>, config: &CollectConfig) -> Result<CollectSummary, AppError> {
    let members = client.fetch_members(&config.org).await?;
    tracing::info!(org = %config.org, members = members.len(), "organization members fetched");

    let mut etags = match read_etags(&config.etags_path) {
        Ok(etags) => etags,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable etags store");
            Default::default()
        }
    };
    let cache: HashMap<String, Vec<Event>> = match read_event_cache(&config.cache_path) {
        Ok(cache) => cache,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable event cache");
            HashMap::new()
        }
    };

    let mut summary = CollectSummary {
        members: members.len(),
        ..CollectSummary::default()
    };
    let logins: Vec<String> = members.iter().map(|m| m.login.clone()).collect();

    let mut tasks = JoinSet::new();
    for member in members {
        let client = Arc::clone(&client);
        // A 304 is only usable while the events behind the ETag are cached.
        let etag = if cache.contains_key(&member.login) {
            etags.get(&member.login).cloned()
        } else {
            None
        };
        let url = events_url(&member.events_url);
        tasks.spawn(async move {
            let page = client.fetch_events(&url, etag.as_deref()).await;
            (member.login, page)
        });
    }

    let mut fetched = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (user, page) = match joined {
            Ok(done) => done,
            Err(err) => {
                tracing::warn!(error = %err, "event fetch task failed; keeping cached events");
                summary.failed += 1;
                continue;
            }
        };
        match page {
            Ok(EventsPage::NotModified) => {
                tracing::debug!(user = %user, "no new events");
                summary.not_modified += 1;
            }
            Ok(EventsPage::Fresh { events, etag }) => {
                tracing::debug!(user = %user, events = events.len(), "events fetched");
                if let Some(etag) = etag {
                    etags.insert(user.clone(), etag);
                } else {
                    etags.remove(&user);
                }
                let pushes: Vec<Event> = events.into_iter().filter(|e| e.kind == PUSH_EVENT).collect();
                fetched.insert(user, pushes);
                summary.fresh += 1;
            }
            Err(err) => {
                tracing::warn!(user = %user, error = %err, "fetch failed; keeping cached events");
                summary.failed += 1;
            }
        }
    }

    let current = merge_with_cache(&logins, fetched, cache);
    etags.retain(|user, _| current.contains_key(user));
    summary.events = current.values().map(Vec::len).sum();
    tracing::info!(events = summary.events, members = current.len(), "member events gathered");

    summary.days = aggregate_push_events(current.values().flatten());
    summary.written = write_daily_series(&config.output_dir, &summary.days)?;
    write_etags(&config.etags_path, &etags)?;
    write_event_cache(&config.cache_path, &current)?;
    tracing::info!(
        etags = %config.etags_path.display(),
        cache = %config.cache_path.display(),
        "etags and event cache written"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(login: &str, at: &str, size: u64) -> Event {
        Event {
            kind: PUSH_EVENT.to_string(),
            created_at: at.parse().unwrap(),
            payload: EventPayload { size },
            actor: Actor {
                login: login.to_string(),
            },
        }
    }

    #[test]
    fn strips_privacy_template() {
        assert_eq!(
            events_url("https://api.github.com/users/ana/events{/privacy}"),
            "https://api.github.com/users/ana/events"
        );
    }

    #[test]
    fn aggregates_pushes_per_utc_day() {
        let mut watch = push("zoe", "2008-07-01T10:00:00Z", 0);
        watch.kind = "WatchEvent".to_string();

        let events = vec![
            push("ana", "2008-07-01T23:59:59Z", 3),
            push("ana", "2008-07-01T08:00:00Z", 2),
            push("bob", "2008-07-01T12:00:00Z", 1),
            push("bob", "2008-07-02T00:00:00Z", 4),
            watch,
        ];

        let days = aggregate_push_events(&events);
        assert_eq!(
            days,
            vec![
                DailyInfo {
                    date: NaiveDate::from_ymd_opt(2008, 7, 1).unwrap(),
                    commits: 6,
                    pushes: 3,
                    users: 2,
                },
                DailyInfo {
                    date: NaiveDate::from_ymd_opt(2008, 7, 2).unwrap(),
                    commits: 4,
                    pushes: 1,
                    users: 1,
                },
            ]
        );
    }

    #[test]
    fn decodes_event_payloads() {
        let raw = r#"[
            {"type": "PushEvent", "created_at": "2008-07-01T12:00:00Z",
             "payload": {"size": 2, "ref": "refs/heads/main"}, "actor": {"login": "ana", "id": 1}},
            {"type": "IssuesEvent", "created_at": "2008-07-01T13:00:00Z",
             "payload": {"action": "opened"}, "actor": {"login": "bob"}}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload.size, 2);
        assert_eq!(events[1].payload.size, 0);
        assert_eq!(aggregate_push_events(&events).len(), 1);
    }

    #[test]
    fn members_without_a_fresh_fetch_fall_back_to_the_cache() {
        let logins = vec!["ana".to_string(), "bob".to_string(), "cy".to_string()];
        let fetched = HashMap::from([("bob".to_string(), vec![push("bob", "2008-07-02T09:00:00Z", 2)])]);
        let cache = HashMap::from([
            ("ana".to_string(), vec![push("ana", "2008-07-01T09:00:00Z", 5)]),
            ("bob".to_string(), vec![push("bob", "2008-06-30T09:00:00Z", 9)]),
            ("gone".to_string(), vec![push("gone", "2008-07-01T09:00:00Z", 1)]),
        ]);

        let current = merge_with_cache(&logins, fetched, cache);
        let mut users: Vec<&str> = current.keys().map(String::as_str).collect();
        users.sort();
        assert_eq!(users, ["ana", "bob"]);
        assert_eq!(current["ana"][0].payload.size, 5);
        assert_eq!(current["bob"][0].payload.size, 2);
    }

    #[test]
    fn api_base_is_normalized() {
        let client = GithubClient::new("https://example.test/", "t".to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_base, "https://example.test");
    }

    mod mock_api {
        use super::super::*;
        use axum::extract::{Path, State};
        use axum::http::{HeaderMap, StatusCode, header};
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::json;

        async fn members(State(base): State<Arc<String>>) -> Json<serde_json::Value> {
            Json(json!([
                {"login": "ana", "events_url": format!("{base}/users/ana/events{{/privacy}}")},
                {"login": "bob", "events_url": format!("{base}/users/bob/events{{/privacy}}")},
            ]))
        }

        /// `ana` pushed 5 commits and answers `304` to her ETag; `bob` pushed 2
        /// and always answers in full. Both pushed on 2008-07-01.
        async fn events(Path(login): Path<String>, headers: HeaderMap) -> Response {
            let (size, etag) = match login.as_str() {
                "ana" => (5, "\"ana-1\""),
                _ => (2, "\"bob-1\""),
            };
            let sent = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok());
            if login == "ana" && sent == Some(etag) {
                return StatusCode::NOT_MODIFIED.into_response();
            }

            let body = json!([
                {"type": "PushEvent", "created_at": "2008-07-01T12:00:00Z",
                 "payload": {"size": size}, "actor": {"login": login}},
                {"type": "WatchEvent", "created_at": "2008-07-01T13:00:00Z",
                 "payload": {}, "actor": {"login": login}},
            ]);
            ([(header::ETAG, etag)], Json(body)).into_response()
        }

        async fn serve() -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let app = Router::new()
                .route("/orgs/acme/members", get(members))
                .route("/users/{login}/events", get(events))
                .with_state(Arc::new(base.clone()));
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
            base
        }

        fn config(dir: &std::path::Path, api_base: &str) -> CollectConfig {
            CollectConfig {
                org: "acme".to_string(),
                api_base: api_base.to_string(),
                output_dir: dir.to_path_buf(),
                etags_path: dir.join("etags.json"),
                cache_path: dir.join("events-cache.json"),
                timeout: Duration::from_secs(5),
                watch: false,
                interval: Duration::from_secs(3600),
            }
        }

        fn read(dir: &std::path::Path, file: &str) -> String {
            std::fs::read_to_string(dir.join(file)).unwrap()
        }

        #[tokio::test]
        async fn not_modified_members_keep_their_counts() {
            let base = serve().await;
            let dir = tempfile::tempdir().unwrap();
            let config = config(dir.path(), &base);
            let client = Arc::new(GithubClient::new(&base, "t".to_string(), config.timeout).unwrap());

            let first = collect_once(Arc::clone(&client), &config).await.unwrap();
            assert_eq!((first.fresh, first.not_modified, first.failed), (2, 0, 0));
            assert_eq!(read(dir.path(), "commits.csv"), "1214870400,7\n");
            assert_eq!(read(dir.path(), "users.csv"), "1214870400,2\n");

            let second = collect_once(client, &config).await.unwrap();
            assert_eq!((second.fresh, second.not_modified, second.failed), (1, 1, 0));
            assert_eq!(second.events, 2);
            assert_eq!(read(dir.path(), "commits.csv"), "1214870400,7\n");
            assert_eq!(read(dir.path(), "pushes.csv"), "1214870400,2\n");
            assert_eq!(read(dir.path(), "users.csv"), "1214870400,2\n");

            let etags = read_etags(&config.etags_path).unwrap();
            assert_eq!(etags.get("ana").map(String::as_str), Some("\"ana-1\""));
        }

        #[tokio::test]
        async fn etag_without_cached_events_is_not_sent() {
            let base = serve().await;
            let dir = tempfile::tempdir().unwrap();
            let config = config(dir.path(), &base);
            std::fs::write(&config.etags_path, r#"[{"user":"ana","etag":"\"ana-1\""}]"#).unwrap();
            let client = Arc::new(GithubClient::new(&base, "t".to_string(), config.timeout).unwrap());

            let summary = collect_once(client, &config).await.unwrap();
            assert_eq!(summary.not_modified, 0);
            assert_eq!(read(dir.path(), "commits.csv"), "1214870400,7\n");
        }
    }
}
