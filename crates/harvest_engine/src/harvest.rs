//! Sequential story harvest: metadata page first, then chapter pages linked
//! by their next-chapter control until the chain ends.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};

use crate::client::{ClientError, PageClient, PageClientFactory};
use crate::cursor::{resolve_link, TraversalCursor};
use crate::gate::PauseGate;
use crate::preview::body_preview;
use crate::settings::HarvestSettings;
use crate::sink::ProgressSink;
use crate::store::{Entry, StoryStore};
use crate::{EngineEvent, HarvestError, HarvestPhase, HarvestReport, LogLine, Termination};

const SEPARATOR_WIDTH: usize = 60;

/// Per-chapter failures. These end the traversal but are never raised to
/// the caller of [`HarvestController::run`].
#[derive(Debug, thiserror::Error)]
enum TraversalError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("next-chapter control has no link target")]
    MissingNextTarget,
    #[error("next-chapter link {0:?} cannot be resolved")]
    UnusableNextTarget(String),
}

enum ChapterStep {
    Continue(String),
    Stop(Termination),
}

pub struct HarvestController {
    factory: Arc<dyn PageClientFactory>,
    settings: HarvestSettings,
    gate: PauseGate,
    store: StoryStore,
    sink: Arc<dyn ProgressSink>,
}

impl HarvestController {
    pub fn new(
        factory: Arc<dyn PageClientFactory>,
        settings: HarvestSettings,
        gate: PauseGate,
        store: StoryStore,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            factory,
            settings,
            gate,
            store,
            sink,
        }
    }

    /// Harvests one story into the store.
    ///
    /// Empty URLs are rejected before anything is touched. Once a page client
    /// is acquired it is released on every exit path, after which the pause
    /// gate is reopened and the phase returns to `Idle`.
    pub async fn run(
        &self,
        metadata_url: &str,
        first_chapter_url: &str,
    ) -> Result<HarvestReport, HarvestError> {
        let metadata_url = metadata_url.trim();
        let first_chapter_url = first_chapter_url.trim();
        if metadata_url.is_empty() {
            return Err(HarvestError::MissingInput {
                field: "metadata URL",
            });
        }
        if first_chapter_url.is_empty() {
            return Err(HarvestError::MissingInput {
                field: "first chapter URL",
            });
        }

        self.store.reset();
        self.phase(HarvestPhase::FetchingMetadata);

        let mut client = match self.factory.connect().await {
            Ok(client) => client,
            Err(err) => {
                harvest_error!("Could not acquire page client: {}", err);
                self.phase(HarvestPhase::Failed);
                self.cleanup();
                return Err(HarvestError::ResourceAcquisition(err));
            }
        };

        let outcome = AssertUnwindSafe(self.drive(client.as_mut(), metadata_url, first_chapter_url))
            .catch_unwind()
            .await;
        let result = outcome.unwrap_or_else(|_| {
            harvest_error!("Harvest task panicked");
            Err(HarvestError::Aborted)
        });

        match &result {
            Ok(report) => {
                harvest_info!(
                    "Harvest finished with {} chapters ({})",
                    report.chapters,
                    report.termination
                );
                self.phase(HarvestPhase::Completed);
            }
            Err(err) => {
                harvest_error!("Harvest failed: {}", err);
                self.line(format!("Harvest failed: {err}"));
                self.phase(HarvestPhase::Failed);
            }
        }

        if let Err(err) = client.release().await {
            harvest_warn!("Failed to release page client: {}", err);
        }
        drop(client);
        self.cleanup();
        result
    }

    fn cleanup(&self) {
        self.gate.set_paused(false);
        self.phase(HarvestPhase::Idle);
    }

    async fn drive(
        &self,
        client: &mut dyn PageClient,
        metadata_url: &str,
        first_chapter_url: &str,
    ) -> Result<HarvestReport, HarvestError> {
        let selectors = &self.settings.selectors;

        self.header("Scraping story metadata...");
        client
            .navigate(metadata_url)
            .await
            .map_err(HarvestError::Navigation)?;
        self.settle_with_countdown(self.settings.metadata_settle)
            .await;

        let title = self
            .lookup_or(client, &selectors.story_title, &self.settings.untitled_placeholder)
            .await;
        let description = self
            .lookup_or(
                client,
                &selectors.story_description,
                &self.settings.no_description_placeholder,
            )
            .await;
        self.line(format!("TITLE: {title}"));
        self.line(format!("DESCRIPTION: {description}"));
        self.append(Entry::new(title, description));

        self.header("Starting chapter scrape...");
        self.phase(HarvestPhase::TraversingChapters);

        let mut cursor = TraversalCursor::new(first_chapter_url);
        let mut chapters = 0;
        let mut termination = Termination::EndOfChapters;

        while let Some(url) = cursor.current().map(str::to_owned) {
            self.wait_if_paused(HarvestPhase::TraversingChapters).await;
            match self.harvest_chapter(client, &url, &mut chapters).await {
                Ok(ChapterStep::Continue(next)) => {
                    harvest_debug!("Following next-chapter link to {}", next);
                    cursor.advance(next);
                }
                Ok(ChapterStep::Stop(reason)) => {
                    termination = reason;
                    cursor.exhaust();
                }
                Err(err) => {
                    harvest_warn!("Chapter at {} failed: {}", url, err);
                    self.line(format!("Chapter error: {err}"));
                    termination = Termination::Interrupted(err.to_string());
                    cursor.exhaust();
                }
            }
        }

        Ok(HarvestReport {
            chapters,
            termination,
        })
    }

    async fn harvest_chapter(
        &self,
        client: &mut dyn PageClient,
        url: &str,
        chapters: &mut usize,
    ) -> Result<ChapterStep, TraversalError> {
        let selectors = &self.settings.selectors;

        client.navigate(url).await?;
        self.settle(self.settings.chapter_settle).await;

        let title = client.query_text(&selectors.chapter_title).await?;
        let body = client.query_text(&selectors.chapter_body).await?;
        let (Some(title), Some(body)) = (title, body) else {
            self.line("End of chapters reached.");
            return Ok(ChapterStep::Stop(Termination::EndOfChapters));
        };

        self.line(format!("Scraped: {title}"));
        self.line(format!(
            "Body: {}...\n\n{}",
            body_preview(&body, self.settings.preview_chars),
            "-".repeat(SEPARATOR_WIDTH)
        ));
        self.append(Entry::new(title, body));
        *chapters += 1;

        if !client.exists(&selectors.next_link).await? {
            self.line("End of chapters reached.");
            return Ok(ChapterStep::Stop(Termination::EndOfChapters));
        }
        if self.next_link_disabled(client).await? {
            self.header("--- Completed ---");
            return Ok(ChapterStep::Stop(Termination::LastChapter));
        }

        let href = client
            .query_attribute(&selectors.next_link, "href")
            .await?
            .ok_or(TraversalError::MissingNextTarget)?;
        let base = client.current_url().unwrap_or(url);
        let next = resolve_link(&href, Some(base))
            .ok_or_else(|| TraversalError::UnusableNextTarget(href.clone()))?;
        Ok(ChapterStep::Continue(next))
    }

    async fn next_link_disabled(&self, client: &mut dyn PageClient) -> Result<bool, ClientError> {
        let selectors = &self.settings.selectors;
        let class = client
            .query_attribute(&selectors.next_link, "class")
            .await?
            .unwrap_or_default();
        if class
            .split_whitespace()
            .any(|token| token == selectors.disabled_class)
        {
            return Ok(true);
        }
        Ok(client
            .query_attribute(&selectors.next_link, "disabled")
            .await?
            .is_some())
    }

    /// Selector lookup where a miss, or a failed lookup, means "use the placeholder".
    async fn lookup_or(&self, client: &mut dyn PageClient, selector: &str, placeholder: &str) -> String {
        match client.query_text(selector).await {
            Ok(Some(text)) => text,
            Ok(None) => placeholder.to_string(),
            Err(err) => {
                harvest_warn!("Lookup of {} failed: {}", selector, err);
                placeholder.to_string()
            }
        }
    }

    /// Suspends while the gate is closed, reporting `Paused` and then
    /// `resume_phase` once it reopens.
    async fn wait_if_paused(&self, resume_phase: HarvestPhase) {
        let paused = self.gate.is_paused();
        if paused {
            harvest_info!("Harvest paused");
            self.phase(HarvestPhase::Paused);
        }
        let waited = self.gate.await_resumed().await;
        if paused || waited {
            harvest_info!("Harvest resumed");
            self.phase(resume_phase);
        }
    }

    async fn settle(&self, interval: Duration) {
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    /// Settling wait shown as a per-second countdown. The pause gate is
    /// honoured between ticks so a long wait does not ignore a pause.
    async fn settle_with_countdown(&self, interval: Duration) {
        let whole_secs = interval.as_secs();
        if !self.settings.countdown || whole_secs == 0 {
            self.settle(interval).await;
            return;
        }

        for remaining in (1..=whole_secs).rev() {
            self.wait_if_paused(HarvestPhase::FetchingMetadata).await;
            self.sink.log(LogLine::countdown(format!(
                "Waiting... {remaining} seconds remaining."
            )));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        self.settle(interval - Duration::from_secs(whole_secs)).await;
        self.sink
            .log(LogLine::countdown_done("Ready! Resuming operations..."));
    }

    fn append(&self, entry: Entry) {
        let title = entry.title.clone();
        let index = self.store.push(entry);
        self.sink.emit(EngineEvent::EntryAppended { index, title });
    }

    fn phase(&self, phase: HarvestPhase) {
        harvest_debug!("Harvest phase -> {:?}", phase);
        self.sink.emit(EngineEvent::Phase(phase));
    }

    fn line(&self, message: impl Into<String>) {
        let message = message.into();
        harvest_info!("{}", message);
        self.sink.log(LogLine::plain(message));
    }

    fn header(&self, message: &str) {
        harvest_info!("== {} ==", message);
        self.sink.log(LogLine::header(message));
    }
}
