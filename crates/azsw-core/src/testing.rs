//! Scripted collaborators for unit tests.

use crate::error::{Result, SwError};
use crate::models::{Request, Response};
use crate::network::Fetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

enum Scripted {
    Respond(Response),
    Fail,
    Hang,
}

/// Fetcher answering from a URL → behaviour table; unknown URLs fail as if offline.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, url: &str, response: Response) -> Self {
        self.set(url, Scripted::Respond(response));
        self
    }

    pub(crate) fn hang(self, url: &str) -> Self {
        self.set(url, Scripted::Hang);
        self
    }

    /// Make a previously answering URL fail from now on.
    pub(crate) fn go_offline(&self, url: &str) {
        self.set(url, Scripted::Fail);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn set(&self, url: &str, behaviour: Scripted) {
        self.routes.lock().unwrap().insert(url.to_string(), behaviour);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        let answer = match self.routes.lock().unwrap().get(&url) {
            Some(Scripted::Respond(response)) => Some(Ok(response.clone())),
            Some(Scripted::Hang) => None,
            Some(Scripted::Fail) | None => Some(Err(SwError::network(&url, "offline"))),
        };
        match answer {
            Some(result) => result,
            None => futures::future::pending().await,
        }
    }
}
