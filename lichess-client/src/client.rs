//! Blocking HTTP implementation of [`GameTransport`].

use std::io::{BufRead, BufReader, Read};
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};
use crate::events::{GameEvent, LobbyEvent};
use crate::traits::{AiChallengeParams, EventStream, GameTransport, SeekParams};

const DEFAULT_BASE_URL: &str = "https://lichess.org";

/// Network client for a lichess-style board API.
pub struct LichessClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl LichessClient {
    /// Build a client with the given API token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Build a client against a non-default server (tests, proxies).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        // No global timeout: stream requests are expected to stay open for
        // the lifetime of a session. Connect timeout still applies.
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn get_stream(&self, path: &str) -> ClientResult<reqwest::blocking::Response> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()?;
        check_status(response)
    }

    fn post(&self, path: &str, form: &[(&str, String)]) -> ClientResult<()> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .form(form)
            .send()?;
        check_status(response).map(|_| ())
    }
}

fn check_status(response: reqwest::blocking::Response) -> ClientResult<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // Error bodies look like {"error":"Not your turn, or game already over"}.
    let message = response
        .text()
        .ok()
        .and_then(|body| {
            serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .or(Some(body))
        })
        .unwrap_or_default();
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Iterator over one NDJSON response body. Empty lines are keep-alives and
/// are skipped without surfacing.
struct NdjsonEvents<T> {
    lines: std::io::Lines<BufReader<Box<dyn Read + Send>>>,
    _marker: PhantomData<T>,
}

impl<T> NdjsonEvents<T> {
    fn new(response: reqwest::blocking::Response) -> Self {
        let reader: Box<dyn Read + Send> = Box::new(response);
        Self {
            lines: BufReader::new(reader).lines(),
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Iterator for NdjsonEvents<T> {
    type Item = ClientResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(ClientError::from));
        }
    }
}

impl GameTransport for LichessClient {
    fn stream_lobby(&self) -> ClientResult<EventStream<LobbyEvent>> {
        let response = self.get_stream("/api/stream/event")?;
        tracing::info!("lobby stream opened");
        Ok(Box::new(NdjsonEvents::new(response)))
    }

    fn stream_game(&self, game_id: &str) -> ClientResult<EventStream<GameEvent>> {
        let response = self.get_stream(&format!("/api/board/game/stream/{game_id}"))?;
        tracing::info!(game_id, "game stream opened");
        Ok(Box::new(NdjsonEvents::new(response)))
    }

    fn submit_move(&self, game_id: &str, uci: &str) -> ClientResult<()> {
        self.post(&format!("/api/board/game/{game_id}/move/{uci}"), &[])
    }

    fn resign(&self, game_id: &str) -> ClientResult<()> {
        self.post(&format!("/api/board/game/{game_id}/resign"), &[])
    }

    fn abort(&self, game_id: &str) -> ClientResult<()> {
        self.post(&format!("/api/board/game/{game_id}/abort"), &[])
    }

    fn seek_opponent(&self, params: &SeekParams) -> ClientResult<()> {
        self.post(
            "/api/board/seek",
            &[
                ("time", params.time_minutes.to_string()),
                ("increment", params.increment_secs.to_string()),
                ("rated", params.rated.to_string()),
            ],
        )
    }

    fn challenge_computer(&self, params: &AiChallengeParams) -> ClientResult<()> {
        let mut form = vec![
            ("level", params.level.to_string()),
            ("clock.limit", (params.time_minutes * 60).to_string()),
            ("clock.increment", params.increment_secs.to_string()),
        ];
        if let Some(color) = &params.color {
            form.push(("color", color.clone()));
        }
        self.post("/api/challenge/ai", &form)
    }
}
