use std::sync::Arc;

use guessr_core::model::{
    AttemptOutcome, ItemId, Mode, SessionConfigDraft, SessionScore, StreakChange,
};
use guessr_core::time::fixed_now;
use services::catalog::{InMemoryCatalog, ItemCatalog};
use services::{AppServices, Clock, ReadinessConfig, SessionError, Step};
use storage::repository::Storage;

fn catalog() -> InMemoryCatalog {
    (1..=9)
        .fold(InMemoryCatalog::new(), |catalog, category| {
            let first = category * 100;
            catalog.with_category(category, first..first + 5)
        })
        .with_name(100, "Bulbizarre")
        .with_name(101, "Pikachu")
        .with_name(102, "Nidoran♀")
        .with_name(103, "Flabébé")
        .with_name(104, "Évoli")
}

async fn services(catalog: InMemoryCatalog) -> AppServices {
    let app = AppServices::assemble(
        Storage::in_memory(),
        Arc::new(catalog),
        Clock::fixed(fixed_now()),
        ReadinessConfig::default(),
    );
    app.initializer().ensure_snapshot().await.unwrap();
    app
}

fn draft(mode: Mode, target: u32, max_attempts: u32) -> SessionConfigDraft {
    SessionConfigDraft {
        categories: vec![1],
        target_count: target,
        max_attempts_per_item: max_attempts,
        mode,
    }
}

#[tokio::test]
async fn normal_session_persists_stats_and_summarizes() {
    let app = services(catalog()).await;
    let (config, generation) = app.settings().save(draft(Mode::Normal, 20, 1)).await.unwrap();
    let session_loop = app.session_loop();

    let mut session = session_loop.start_session(&config, generation).await.unwrap();
    // Pool of 5 items with a target of 20.
    assert_eq!(session.runner().planned(), 5);

    while !session.is_complete() {
        let question = session_loop.present(&mut session).await.unwrap();
        let name = question.name.unwrap();
        let result = session_loop.submit(&mut session, &name.to_lowercase()).await.unwrap();
        assert!(matches!(result.step, Step::Terminal(_)));
        assert_eq!(result.stat.successes(), 1);
    }

    let (summary, recap) = session_loop.finish(&session).await.unwrap();
    assert_eq!(summary.correct(), 5);
    assert_eq!(summary.score(), SessionScore::Ratio { correct: 5, out_of: 5 });
    assert_eq!(recap.len(), 5);
    assert!(recap.iter().all(|row| row.lifetime_attempts == 1));
    assert_eq!(session.runner().streak().count(), 5);

    let stats = app.stats().snapshot().await.unwrap();
    assert_eq!(stats.len(), 5);
    assert!(matches!(
        session_loop.submit(&mut session, "x").await,
        Err(SessionError::Completed)
    ));
}

#[tokio::test]
async fn two_wrong_answers_count_twice_but_log_once() {
    let catalog = InMemoryCatalog::new()
        .with_category(1, [25])
        .with_category(2, [152])
        .with_category(3, [252])
        .with_category(4, [387])
        .with_category(5, [494])
        .with_category(6, [650])
        .with_category(7, [722])
        .with_category(8, [810])
        .with_category(9, [906])
        .with_name(25, "Pikachu");
    let app = services(catalog).await;
    let (config, generation) = app.settings().save(draft(Mode::Normal, 20, 2)).await.unwrap();
    let session_loop = app.session_loop();
    let mut session = session_loop.start_session(&config, generation).await.unwrap();

    let first = session_loop.submit(&mut session, "raichu").await.unwrap();
    assert!(matches!(first.step, Step::Retry { attempts_left: 1, .. }));
    assert!(session.runner().log().is_empty());

    let second = session_loop.submit(&mut session, "pichu").await.unwrap();
    assert!(second.is_complete);
    assert_eq!(second.stat.failures(), 2);
    assert_eq!(second.stat.attempts(), 2);
    assert_eq!(session.runner().log().len(), 1);
    assert!(!session.runner().log()[0].is_correct);
    assert_eq!(session.runner().streak().count(), 0);
    assert_eq!(session.runner_mut().settle_streak(), StreakChange::Reset);
}

#[tokio::test]
async fn progressive_session_requeues_and_scores_answers_given() {
    let app = services(catalog()).await;
    let (config, generation) = app
        .settings()
        .save(draft(Mode::Progressive, 5, 1))
        .await
        .unwrap();
    let session_loop = app.session_loop();
    let mut session = session_loop.start_session(&config, generation).await.unwrap();

    let first = session.runner().current().unwrap();
    let passed = session_loop.pass(&mut session, "").await.unwrap();
    let Step::Terminal(terminal) = passed.step else {
        panic!("pass is always terminal");
    };
    assert_eq!(terminal.outcome, AttemptOutcome::Pass);
    assert_eq!(terminal.requeued_at, Some(3));
    assert_eq!(session.runner().queue().items()[3], first);

    while !session.is_complete() {
        let question = session_loop.present(&mut session).await.unwrap();
        let name = question.name.unwrap();
        session_loop.submit(&mut session, &name).await.unwrap();
    }
    let (summary, _) = session_loop.finish(&session).await.unwrap();
    assert_eq!(summary.score(), SessionScore::AnswersGiven(6));
    assert_eq!(summary.passed(), 1);
}

#[tokio::test]
async fn settings_change_invalidates_pending_start() {
    let app = services(catalog()).await;
    let (config, generation) = app.settings().save(draft(Mode::Normal, 3, 1)).await.unwrap();
    app.settings().save(draft(Mode::Revision, 3, 1)).await.unwrap();

    let err = app
        .session_loop()
        .start_session(&config, generation)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Readiness(services::ReadinessError::Stale)
    ));
}

#[tokio::test]
async fn revision_session_starts_with_weak_items() {
    let app = services(catalog()).await;
    let stats = app.stats();
    let catalog = catalog();
    for id in [101, 103] {
        let category = catalog.category_of(ItemId::new(id)).await;
        stats
            .record_attempt(ItemId::new(id), category, AttemptOutcome::Failure)
            .await
            .unwrap();
    }

    let (config, generation) = app.settings().save(draft(Mode::Revision, 2, 1)).await.unwrap();
    let session = app
        .session_loop()
        .start_session(&config, generation)
        .await
        .unwrap();
    let mut picked: Vec<u32> = session
        .runner()
        .queue()
        .items()
        .iter()
        .map(ItemId::value)
        .collect();
    picked.sort_unstable();
    assert_eq!(picked, vec![101, 103]);
}

#[tokio::test]
async fn unresolved_name_blocks_scoring_but_allows_pass() {
    let app = services(catalog()).await;
    let (config, generation) = app
        .settings()
        .save(SessionConfigDraft {
            categories: vec![2],
            ..draft(Mode::Normal, 5, 1)
        })
        .await
        .unwrap();
    let session_loop = app.session_loop();
    let mut session = session_loop.start_session(&config, generation).await.unwrap();

    let question = session_loop.present(&mut session).await.unwrap();
    assert_eq!(question.name, None);
    assert!(matches!(
        session_loop.submit(&mut session, "bulbizarre").await,
        Err(SessionError::Unresolved)
    ));
    assert_eq!(app.stats().get(question.item_id).await.unwrap(), None);
    assert_eq!(session.runner().attempts_on_item(), 0);
    assert_eq!(session.runner().current(), Some(question.item_id));
    assert!(session.runner().log().is_empty());

    let passed = session_loop.pass(&mut session, "").await.unwrap();
    assert_eq!(passed.stat.passes(), 1);
    assert_eq!(passed.stat.attempts(), 1);
}

#[tokio::test]
async fn finish_before_the_end_reports_not_finished() {
    let app = services(catalog()).await;
    let (config, generation) = app.settings().save(draft(Mode::Normal, 3, 1)).await.unwrap();
    let session_loop = app.session_loop();
    let session = session_loop.start_session(&config, generation).await.unwrap();

    assert!(matches!(
        session_loop.finish(&session).await,
        Err(SessionError::NotFinished)
    ));
}

#[tokio::test(start_paused = true)]
async fn failed_catalog_init_fails_session_start_promptly() {
    // Categories 2..=9 come back empty, so nothing is ever persisted.
    let app = AppServices::assemble(
        Storage::in_memory(),
        Arc::new(InMemoryCatalog::new().with_category(1, [1, 2])),
        Clock::fixed(fixed_now()),
        ReadinessConfig::default(),
    );
    let config = SessionConfigDraft {
        categories: vec![1],
        target_count: 5,
        max_attempts_per_item: 1,
        mode: Mode::Normal,
    }
    .validate()
    .unwrap();
    let generation = app.settings().generation().current();

    let started = tokio::time::Instant::now();
    app.spawn_catalog_init().await.unwrap();
    let err = app
        .session_loop()
        .start_session(&config, generation)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Readiness(services::ReadinessError::CatalogUnavailable(_))
    ));
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}
