use std::error::Error;

use tokio::io::{AsyncBufReadExt, BufReader};

use guessr_core::model::{
    CategoryId, MAX_CATEGORY, MIN_CATEGORY, Mode, RecapRow, SessionConfigDraft, SessionScore,
    SessionSummary, StreakChange, TARGET_COUNT_OPTIONS,
};
use services::catalog::InitOutcome;
use services::{AppServices, SessionError, Step};

const PASS_COMMAND: &str = ":pass";
const QUIT_COMMAND: &str = ":quit";

/// Settings overrides collected from the command line.
#[derive(Debug, Default)]
pub struct SettingsChanges {
    pub categories: Option<Vec<u32>>,
    pub target_count: Option<u32>,
    pub max_attempts: Option<u32>,
    pub mode: Option<Mode>,
}

impl SettingsChanges {
    pub fn is_empty(&self) -> bool {
        self.categories.is_none()
            && self.target_count.is_none()
            && self.max_attempts.is_none()
            && self.mode.is_none()
    }

    fn apply(self, mut draft: SessionConfigDraft) -> SessionConfigDraft {
        if let Some(categories) = self.categories {
            draft.categories = categories;
        }
        if let Some(target_count) = self.target_count {
            draft.target_count = target_count;
        }
        if let Some(max_attempts) = self.max_attempts {
            draft.max_attempts_per_item = max_attempts;
        }
        if let Some(mode) = self.mode {
            draft.mode = mode;
        }
        draft
    }
}

/// Play one session. `changes` apply to this session only and are not saved.
pub async fn play(app: &AppServices, changes: SettingsChanges) -> Result<(), Box<dyn Error>> {
    let _init = app.spawn_catalog_init();
    let settings = app.settings();
    let saved = settings.load().await?;
    let config = if changes.is_empty() {
        saved
    } else {
        changes.apply(saved.to_draft()).validate()?
    };
    let generation = settings.generation().current();
    let session_loop = app.session_loop();

    println!(
        "Mode {}, {} item(s), categories {}. Type {PASS_COMMAND} to pass, {QUIT_COMMAND} to stop.",
        config.mode(),
        config.target_count(),
        join_categories(config.categories().iter().copied()),
    );
    let mut session = session_loop.start_session(&config, generation).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_complete() {
        let question = session_loop.present(&mut session).await?;
        let runner = session.runner();
        println!(
            "\n[{}/{}] Who is #{}?",
            runner.log().len() + 1,
            runner.planned(),
            question.item_id
        );
        if question.name.is_none() {
            println!("(name unavailable: this one can only be passed)");
        }

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let input = line.trim();
        let result = match input {
            QUIT_COMMAND => return Ok(()),
            PASS_COMMAND => session_loop.pass(&mut session, "").await?,
            _ if question.name.is_none() => {
                println!("Only {PASS_COMMAND} or {QUIT_COMMAND} are accepted for this one.");
                continue;
            }
            _ => match session_loop.submit(&mut session, input).await {
                Err(SessionError::Unresolved) => continue,
                other => other?,
            },
        };

        match &result.step {
            Step::Retry { attempts_left, .. } => {
                println!("Wrong, {attempts_left} try(ies) left.");
            }
            Step::Terminal(terminal) => {
                let expected = terminal.result.correct_name.as_deref().unwrap_or("?");
                if terminal.result.is_correct {
                    println!("Correct!");
                } else if terminal.result.passed {
                    println!("Passed, it was {expected}.");
                } else {
                    println!("Wrong, it was {expected}.");
                }
            }
        }
        let streak = session.runner().streak().count();
        match session.runner_mut().settle_streak() {
            StreakChange::Increase if streak > 1 => println!("Streak: {streak}"),
            StreakChange::Reset => println!("Streak lost."),
            _ => {}
        }
    }

    let (summary, recap) = session_loop.finish(&session).await?;
    print_summary(&summary, &recap);
    Ok(())
}

fn print_summary(summary: &SessionSummary, recap: &[RecapRow]) {
    println!();
    match summary.score() {
        SessionScore::Ratio { correct, out_of } => println!("Score: {correct}/{out_of}"),
        SessionScore::AnswersGiven(answers) => println!("Answers given: {answers}"),
    }
    println!(
        "{} correct, {} wrong, {} passed in {}s",
        summary.correct(),
        summary.incorrect(),
        summary.passed(),
        summary.total_elapsed_seconds()
    );
    for row in recap {
        let status = if row.result.is_correct {
            "ok"
        } else if row.result.passed {
            "pass"
        } else {
            "miss"
        };
        println!(
            "  #{:<5} {:<4} {:<20} {:<20} {:>3}s  {}/{}",
            row.result.item_id.value(),
            status,
            row.result.correct_name.as_deref().unwrap_or("?"),
            row.result.user_answer,
            row.result.elapsed_seconds,
            row.lifetime_successes,
            row.lifetime_attempts,
        );
    }
}

pub async fn init_catalog(app: &AppServices, refresh: bool) -> Result<(), Box<dyn Error>> {
    let initializer = app.initializer();
    let outcome = if refresh {
        initializer.refresh().await?
    } else {
        initializer.ensure_snapshot().await?
    };
    match outcome {
        InitOutcome::AlreadyPresent => println!("Catalog already stored."),
        InitOutcome::Invalid => {
            println!("Stored catalog is malformed; run with --refresh to replace it.");
        }
        InitOutcome::Fetched { categories, items } => {
            println!("Stored {items} items across {categories} categories.");
        }
    }
    Ok(())
}

pub async fn stats(app: &AppServices, details: bool) -> Result<(), Box<dyn Error>> {
    let Some(snapshot) = app.catalog_snapshot().await? else {
        println!("No catalog stored yet; run `guessr init-catalog` first.");
        return Ok(());
    };
    let categories = (MIN_CATEGORY..=MAX_CATEGORY).map(CategoryId::new);
    for progress in app.stats().overview(categories, &snapshot).await? {
        println!(
            "Category {}: {}/{} found ({}%), {} tested",
            progress.category, progress.found, progress.total, progress.percent, progress.tested
        );
        if details {
            for item in progress.items.iter().filter(|item| item.attempts > 0) {
                println!(
                    "  #{:<5} {:>3}%  {}/{}",
                    item.id.value(),
                    item.success_percent,
                    item.successes,
                    item.attempts
                );
            }
        }
    }
    Ok(())
}

pub async fn settings(app: &AppServices, changes: SettingsChanges) -> Result<(), Box<dyn Error>> {
    let service = app.settings();
    let mut config = service.load().await?;
    if !changes.is_empty() {
        config = service.save(changes.apply(config.to_draft())).await?.0;
        println!("Settings saved.");
    }

    println!("categories:   {}", join_categories(config.categories().iter().copied()));
    println!(
        "count:        {} (common: {})",
        config.target_count(),
        TARGET_COUNT_OPTIONS.map(|count| count.to_string()).join(", ")
    );
    println!("max attempts: {}", config.max_attempts_per_item());
    println!("mode:         {}", config.mode());
    Ok(())
}

fn join_categories(categories: impl Iterator<Item = CategoryId>) -> String {
    categories
        .map(|category| category.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
