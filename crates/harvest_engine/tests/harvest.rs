mod common;

use std::sync::Arc;

use common::{fast_settings, url, wait_until, with_timeout, RecordingSink, StubPage, StubSite};
use harvest_engine::{
    Entry, HarvestController, HarvestError, HarvestPhase, HarvestSettings, LogStyle, PauseGate,
    StoryStore, Termination,
};
use pretty_assertions::assert_eq;

struct Fixture {
    controller: HarvestController,
    site: StubSite,
    store: StoryStore,
    gate: PauseGate,
    sink: Arc<RecordingSink>,
}

fn fixture(site: StubSite, gate: PauseGate, settings: HarvestSettings) -> Fixture {
    let store = StoryStore::new();
    let sink = RecordingSink::new();
    let controller = HarvestController::new(
        site.factory(),
        settings,
        gate.clone(),
        store.clone(),
        sink.clone(),
    );
    Fixture {
        controller,
        site,
        store,
        gate,
        sink,
    }
}

fn three_chapter_site() -> StubSite {
    StubSite::new()
        .page(url("about"), StubPage::metadata("My Story", "A tale."))
        .page(
            url("chapter-1"),
            StubPage::chapter("Chapter 1", "One.").next(&url("chapter-2")),
        )
        .page(
            url("chapter-2"),
            StubPage::chapter("Chapter 2", "Two.").next(&url("chapter-3")),
        )
        .page(
            url("chapter-3"),
            StubPage::chapter("Chapter 3", "Three.").next_disabled(),
        )
}

#[tokio::test]
async fn harvests_metadata_then_every_chapter_in_order() {
    let fx = fixture(three_chapter_site(), PauseGate::new(), fast_settings());

    let report = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .expect("harvest ok");

    assert_eq!(report.chapters, 3);
    assert_eq!(report.termination, Termination::LastChapter);
    assert_eq!(
        fx.store.snapshot(),
        vec![
            Entry::new("My Story", "A tale."),
            Entry::new("Chapter 1", "One."),
            Entry::new("Chapter 2", "Two."),
            Entry::new("Chapter 3", "Three."),
        ]
    );
    assert_eq!(
        fx.site.navigations(),
        vec![url("about"), url("chapter-1"), url("chapter-2"), url("chapter-3")]
    );
    assert_eq!(
        fx.sink.phases(),
        vec![
            HarvestPhase::FetchingMetadata,
            HarvestPhase::TraversingChapters,
            HarvestPhase::Completed,
            HarvestPhase::Idle,
        ]
    );
    assert_eq!(fx.site.connects(), 1);
    assert_eq!(fx.site.releases(), 1);

    let messages = fx.sink.messages();
    assert!(messages.contains(&"TITLE: My Story".to_string()));
    assert!(messages.contains(&"DESCRIPTION: A tale.".to_string()));
    assert!(messages.contains(&"Scraped: Chapter 2".to_string()));
    let completed = fx
        .sink
        .lines()
        .into_iter()
        .find(|line| line.message == "--- Completed ---")
        .expect("completion banner");
    assert_eq!(completed.style, LogStyle::Header);
}

#[tokio::test]
async fn missing_chapter_title_ends_traversal_without_error() {
    let site = StubSite::new()
        .page(url("about"), StubPage::metadata("My Story", "A tale."))
        .page(
            url("chapter-1"),
            StubPage::default()
                .text("#chapter_content", "Body without a title.")
                .next(&url("chapter-2")),
        );
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let report = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    assert_eq!(report.chapters, 0);
    assert_eq!(report.termination, Termination::EndOfChapters);
    assert_eq!(fx.store.len(), 1);
    assert!(fx
        .sink
        .messages()
        .contains(&"End of chapters reached.".to_string()));
    assert_eq!(fx.site.releases(), 1);
}

#[tokio::test]
async fn missing_next_link_ends_after_current_chapter() {
    let site = StubSite::new()
        .page(url("about"), StubPage::metadata("My Story", "A tale."))
        .page(url("chapter-1"), StubPage::chapter("Only", "Lonely chapter."));
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let report = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    assert_eq!(report.chapters, 1);
    assert_eq!(report.termination, Termination::EndOfChapters);
    assert_eq!(fx.sink.appended_titles(), vec!["My Story", "Only"]);
}

#[tokio::test]
async fn three_linked_chapters_then_a_disabled_one() {
    let site = StubSite::new()
        .page(url("about"), StubPage::metadata("Long Story", "Four parts."))
        .page(url("c1"), StubPage::chapter("Part 1", "a").next(&url("c2")))
        .page(url("c2"), StubPage::chapter("Part 2", "b").next(&url("c3")))
        .page(url("c3"), StubPage::chapter("Part 3", "c").next(&url("c4")))
        .page(url("c4"), StubPage::chapter("Part 4", "d").next_disabled());
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let report = fx.controller.run(&url("about"), &url("c1")).await.unwrap();

    assert_eq!(report.chapters, 4);
    assert_eq!(report.termination, Termination::LastChapter);
    let titles: Vec<_> = fx.store.snapshot().into_iter().map(|e| e.title).collect();
    assert_eq!(titles, vec!["Long Story", "Part 1", "Part 2", "Part 3", "Part 4"]);
    assert_eq!(fx.site.navigations().len(), 5);
    assert!(fx.sink.phases().contains(&HarvestPhase::Completed));
}

#[tokio::test]
async fn disabled_attribute_marks_last_chapter() {
    let site = StubSite::new()
        .page(url("about"), StubPage::metadata("My Story", "A tale."))
        .page(
            url("chapter-1"),
            StubPage::chapter("Final", "The end.")
                .next(&url("chapter-2"))
                .attr("#next-chap", "disabled", ""),
        );
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let report = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::LastChapter);
    assert_eq!(fx.site.navigations().len(), 2);
}

#[tokio::test]
async fn relative_next_link_resolves_against_current_page() {
    let site = StubSite::new()
        .page(url("about"), StubPage::metadata("My Story", "A tale."))
        .page(url("chapter-1"), StubPage::chapter("One", "1").next("chapter-2"))
        .page(url("chapter-2"), StubPage::chapter("Two", "2").next_disabled());
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let report = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    assert_eq!(report.chapters, 2);
    assert_eq!(fx.site.navigations()[2], url("chapter-2"));
}

#[tokio::test]
async fn metadata_placeholders_are_used_when_fields_are_missing() {
    let site = StubSite::new()
        .page(url("about"), StubPage::default())
        .page(url("chapter-1"), StubPage::chapter("One", "1").next_disabled());
    let fx = fixture(site, PauseGate::new(), fast_settings());

    fx.controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    assert_eq!(
        fx.store.snapshot()[0],
        Entry::new("Untitled Story", "No description.")
    );
}

#[tokio::test]
async fn empty_urls_are_rejected_before_any_navigation() {
    let fx = fixture(three_chapter_site(), PauseGate::new(), fast_settings());
    fx.store.push(Entry::new("previous", "run"));

    let err = fx.controller.run("", &url("chapter-1")).await.unwrap_err();
    assert!(matches!(err, HarvestError::MissingInput { .. }));
    let err = fx.controller.run(&url("about"), "   ").await.unwrap_err();
    assert!(matches!(err, HarvestError::MissingInput { .. }));

    assert_eq!(fx.site.connects(), 0);
    assert!(fx.site.navigations().is_empty());
    assert!(fx.sink.is_empty());
    assert_eq!(fx.store.len(), 1);
}

#[tokio::test]
async fn acquisition_failure_fails_run_and_returns_to_idle() {
    let fx = fixture(
        three_chapter_site().fail_connect(),
        PauseGate::new(),
        fast_settings(),
    );

    let err = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::ResourceAcquisition(_)));
    assert_eq!(
        fx.sink.phases(),
        vec![
            HarvestPhase::FetchingMetadata,
            HarvestPhase::Failed,
            HarvestPhase::Idle
        ]
    );
    assert!(fx.store.is_empty());
    assert_eq!(fx.site.releases(), 0);
}

#[tokio::test]
async fn metadata_navigation_failure_escapes_and_releases_client() {
    let site = StubSite::new().page(url("chapter-1"), StubPage::chapter("One", "1"));
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let err = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Navigation(_)));
    assert_eq!(fx.site.navigations(), vec![url("about")]);
    assert_eq!(fx.site.releases(), 1);
    assert_eq!(
        fx.sink.phases().last().copied(),
        Some(HarvestPhase::Idle)
    );
    assert!(fx.sink.phases().contains(&HarvestPhase::Failed));
}

#[tokio::test]
async fn chapter_navigation_failure_is_absorbed() {
    let site = StubSite::new()
        .page(url("about"), StubPage::metadata("My Story", "A tale."))
        .page(
            url("chapter-1"),
            StubPage::chapter("One", "1").next(&url("gone")),
        );
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let report = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .expect("chapter errors do not fail the run");

    assert_eq!(report.chapters, 1);
    assert!(matches!(report.termination, Termination::Interrupted(_)));
    assert_eq!(fx.store.len(), 2);
    assert!(fx
        .sink
        .messages()
        .iter()
        .any(|message| message.starts_with("Chapter error:")));
    assert_eq!(fx.site.releases(), 1);
}

#[tokio::test]
async fn panic_inside_harvest_is_contained() {
    let site = three_chapter_site().panic_on(url("chapter-2"));
    let fx = fixture(site, PauseGate::new(), fast_settings());

    let err = fx
        .controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Aborted));
    assert_eq!(fx.site.releases(), 1);
    assert_eq!(fx.sink.phases().last().copied(), Some(HarvestPhase::Idle));
}

#[tokio::test]
async fn each_run_starts_from_an_empty_store() {
    let fx = fixture(three_chapter_site(), PauseGate::new(), fast_settings());

    fx.controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();
    fx.controller
        .run(&url("about"), &url("chapter-3"))
        .await
        .unwrap();

    let titles: Vec<_> = fx.store.snapshot().into_iter().map(|e| e.title).collect();
    assert_eq!(titles, vec!["My Story", "Chapter 3"]);
    assert_eq!(fx.site.connects(), 2);
    assert_eq!(fx.site.releases(), 2);
}

#[tokio::test]
async fn pause_holds_next_page_until_resumed() {
    let gate = PauseGate::new();
    let site = three_chapter_site()
        .pause_on(url("chapter-1"), &gate)
        .pause_on(url("chapter-2"), &gate);
    let fx = fixture(site, gate, fast_settings());
    let Fixture {
        controller,
        site,
        store,
        gate,
        sink,
    } = fx;

    let run = tokio::spawn(async move {
        controller
            .run(&url("about"), &url("chapter-1"))
            .await
    });

    wait_until(|| sink.phases().contains(&HarvestPhase::Paused)).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(site.navigations().len(), 2);
    assert_eq!(store.len(), 2);

    gate.set_paused(false);
    wait_until(|| site.navigations().len() == 3 && gate.is_paused()).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(site.navigations().len(), 3);

    gate.set_paused(false);
    let report = with_timeout(run).await.unwrap().unwrap();
    assert_eq!(report.chapters, 3);
    assert_eq!(site.navigations().len(), 4);
    assert!(!gate.is_paused());

    let phases = sink.phases();
    let pauses = phases
        .iter()
        .filter(|phase| **phase == HarvestPhase::Paused)
        .count();
    assert_eq!(pauses, 2);
}

#[tokio::test]
async fn gate_is_reopened_when_run_ends_paused() {
    let gate = PauseGate::new();
    let site = three_chapter_site().pause_on(url("chapter-3"), &gate);
    let fx = fixture(site, gate, fast_settings());

    fx.controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    assert!(!fx.gate.is_paused());
}

#[tokio::test(start_paused = true)]
async fn metadata_countdown_ticks_each_second() {
    let settings = HarvestSettings {
        metadata_settle: std::time::Duration::from_secs(3),
        countdown: true,
        ..fast_settings()
    };
    let fx = fixture(three_chapter_site(), PauseGate::new(), settings);

    fx.controller
        .run(&url("about"), &url("chapter-1"))
        .await
        .unwrap();

    let ticks: Vec<_> = fx
        .sink
        .lines()
        .into_iter()
        .filter(|line| matches!(line.style, LogStyle::Countdown | LogStyle::CountdownDone))
        .map(|line| line.message)
        .collect();
    assert_eq!(
        ticks,
        vec![
            "Waiting... 3 seconds remaining.",
            "Waiting... 2 seconds remaining.",
            "Waiting... 1 seconds remaining.",
            "Ready! Resuming operations...",
        ]
    );
}

fn countdown_lines(sink: &RecordingSink) -> Vec<String> {
    sink.lines()
        .into_iter()
        .filter(|line| matches!(line.style, LogStyle::Countdown | LogStyle::CountdownDone))
        .map(|line| line.message)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn pause_during_metadata_countdown_holds_the_ticks() {
    let settings = HarvestSettings {
        metadata_settle: std::time::Duration::from_secs(5),
        countdown: true,
        ..fast_settings()
    };
    let fx = fixture(three_chapter_site(), PauseGate::new(), settings);

    let script = async {
        wait_until(|| countdown_lines(&fx.sink).len() == 2).await;
        fx.gate.set_paused(true);
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        let held = countdown_lines(&fx.sink);
        let phases = fx.sink.phases();
        let navigations = fx.site.navigations();
        fx.gate.set_paused(false);
        (held, phases, navigations)
    };
    let (about, chapter_1) = (url("about"), url("chapter-1"));
    let (result, (held, phases_while_paused, navigations_while_paused)) =
        tokio::join!(fx.controller.run(&about, &chapter_1), script);

    assert_eq!(
        held,
        vec![
            "Waiting... 5 seconds remaining.",
            "Waiting... 4 seconds remaining.",
        ]
    );
    assert_eq!(phases_while_paused.last(), Some(&HarvestPhase::Paused));
    assert_eq!(navigations_while_paused, vec![url("about")]);

    assert_eq!(result.unwrap().chapters, 3);
    assert_eq!(
        countdown_lines(&fx.sink),
        vec![
            "Waiting... 5 seconds remaining.",
            "Waiting... 4 seconds remaining.",
            "Waiting... 3 seconds remaining.",
            "Waiting... 2 seconds remaining.",
            "Waiting... 1 seconds remaining.",
            "Ready! Resuming operations...",
        ]
    );
    assert_eq!(
        fx.sink.phases(),
        vec![
            HarvestPhase::FetchingMetadata,
            HarvestPhase::Paused,
            HarvestPhase::FetchingMetadata,
            HarvestPhase::TraversingChapters,
            HarvestPhase::Completed,
            HarvestPhase::Idle,
        ]
    );
}
