// Copyright 2025 The kube-forge Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::builder::{Builder, BuilderKind};
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for the polling primitives.
///
/// Defaults to a one-second poll cadence; override per kind where a shorter
/// or longer cadence is documented.
#[derive(Clone, Debug)]
pub struct WaitOptions {
    pub(crate) timeout: Duration,
    pub(crate) interval: Duration,
    pub(crate) cancel: Option<CancellationToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::timeout(DEFAULT_TIMEOUT)
    }
}

impl WaitOptions {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_INTERVAL,
            cancel: None,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Honour a cancellation signal while waiting. Cancellation surfaces as
    /// [`Error::Cancelled`], distinct from [`Error::Timeout`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Run a cooperative poll loop until it finishes, the timeout elapses, or the
/// cancellation token fires. No concurrent work is spawned; the loop blocks
/// the calling flow.
async fn run<F: Future<Output = ()>>(goal: String, options: &WaitOptions, poll: F) -> Result<()> {
    let timed = time::timeout(options.timeout, poll);
    match options.cancel.as_ref() {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled(goal)),
            outcome = timed => outcome.map_err(|_| Error::Timeout(goal)),
        },
        None => timed.await.map_err(|_| Error::Timeout(goal)),
    }
}

impl<K: BuilderKind> Builder<K> {
    /// Poll `exists` until the resource is present.
    pub async fn wait_until_exists(&mut self, options: &WaitOptions) -> Result<()> {
        self.validate()?;
        let goal = format!("{} {} to exist", K::LABEL, self.name());
        debug!("waiting for {goal}");
        let interval = options.interval;
        let poll = async {
            let mut ticker = time::interval(interval);
            loop {
                ticker.tick().await;
                if self.exists().await {
                    return;
                }
            }
        };
        run(goal, options, poll).await
    }

    /// Poll `get` until the server reports Not-Found. The observed slot keeps
    /// the last successful read.
    pub async fn wait_until_deleted(&mut self, options: &WaitOptions) -> Result<()> {
        self.validate()?;
        let goal = format!("{} {} to be deleted", K::LABEL, self.name());
        debug!("waiting for {goal}");
        let interval = options.interval;
        let poll = async {
            let mut ticker = time::interval(interval);
            loop {
                ticker.tick().await;
                match self.get().await {
                    Err(err) if err.is_not_found() => return,
                    Ok(object) => self.object = Some(object),
                    Err(err) => trace!("poll failed: {err}"),
                }
            }
        };
        run(goal, options, poll).await
    }

    /// Poll `get` and apply `condition` to every sample. On success the
    /// accepted document is the observed one; on timeout the observed slot
    /// holds the last successful read.
    pub async fn wait_until_condition(
        &mut self,
        options: &WaitOptions,
        condition: impl Fn(&K) -> bool,
    ) -> Result<()> {
        self.validate()?;
        let goal = format!("{} {} to satisfy condition", K::LABEL, self.name());
        debug!("waiting for {goal}");
        let interval = options.interval;
        let poll = async {
            let mut ticker = time::interval(interval);
            loop {
                ticker.tick().await;
                match self.get().await {
                    Ok(object) => {
                        let accepted = condition(&object);
                        self.object = Some(object);
                        if accepted {
                            return;
                        }
                    }
                    Err(err) => trace!("poll failed: {err}"),
                }
            }
        };
        run(goal, options, poll).await
    }

    /// Specialisation of [`Self::wait_until_condition`] for kinds with a
    /// scalar phase field.
    pub async fn wait_until_status(&mut self, phase: &str, options: &WaitOptions) -> Result<()> {
        self.wait_until_condition(options, |object| {
            K::phase(object).as_deref() == Some(phase)
        })
        .await
    }

    /// `create` followed by `wait_until_exists`; adds no semantics of its own.
    pub async fn create_and_wait(self, options: &WaitOptions) -> Result<Self> {
        let mut builder = self.create().await?;
        builder.wait_until_exists(options).await?;
        Ok(builder)
    }

    /// `delete` followed by `wait_until_deleted`; adds no semantics of its own.
    pub async fn delete_and_wait(self, options: &WaitOptions) -> Result<Self> {
        let mut builder = self.delete().await?;
        builder.wait_until_deleted(options).await?;
        Ok(builder)
    }
}
