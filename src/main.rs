use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banana_brain::client::{ApiClient, CredentialStore, FileCredentials};
use banana_brain::config::ClientConfig;
use banana_brain::game::{
    Collaborators, GameController, RoundEvent, RoundPhase, SubmitOutcome, TerminationCause,
};
use banana_brain::services::{AuthService, GameService, LeaderboardService};
use banana_brain::session::AuthStore;
use banana_brain::types::User;
use banana_brain::view;

type Input = Lines<BufReader<Stdin>>;

const LEADERBOARD_SIZE: u32 = 10;
const HISTORY_SIZE: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Logs go to stderr so they don't interleave with the game screen
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banana_brain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    tracing::info!("Using backend {}", config.api_base_url);

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentials::new(config.token_file.clone()));
    let client = ApiClient::new(
        config.api_base_url.clone(),
        config.request_timeout,
        credentials.clone(),
    )?;

    let auth = AuthStore::new(AuthService::new(client.clone()), credentials);
    let game_service = GameService::new(client.clone());
    let leaderboard = LeaderboardService::new(client, config.game.game_type.clone());

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let Some(user) = authenticate(&auth, &mut input).await? else {
        return Ok(());
    };
    println!("Welcome, {}!", user.username);
    match game_service.stats().await {
        Ok(stats) => println!(
            "Games played: {} | Best score: {} | Highest level: {}",
            stats.total_games, stats.highest_score, stats.highest_level
        ),
        Err(e) => tracing::warn!("Could not load stats: {}", e),
    }

    let game = GameController::new(
        Collaborators::from_services(game_service.clone(), leaderboard.clone()),
        config.game.clone(),
        Some(user.id.clone()),
    );
    spawn_event_printer(&game);

    print_help();
    if let Err(e) = game.new_round().await {
        tracing::warn!("First puzzle failed to load: {}", e);
    }
    println!("{}", view::round_screen(&game.snapshot().await));

    while let Some(line) = prompt(&mut input, "> ").await? {
        match line.as_str() {
            "" => {}
            "1" | "2" | "3" | "4" => {
                let index = line.parse::<usize>().unwrap_or(1) - 1;
                match game.snapshot().await.choices.get(index) {
                    Some(&value) => {
                        game.select_answer(value).await;
                    }
                    None => println!("No such choice."),
                }
            }
            "s" => match game.submit_answer().await {
                SubmitOutcome::Ignored => println!("Pick an answer first."),
                SubmitOutcome::Correct { leveled_up: true } => println!("Correct! Level up!"),
                SubmitOutcome::Correct { leveled_up: false } => println!("Correct!"),
                SubmitOutcome::Incorrect { terminated: false } => {
                    println!("Wrong! Streak lost.")
                }
                SubmitOutcome::Incorrect { terminated: true } => println!("Wrong!"),
            },
            "p" => game.pause_for_overlay().await,
            "c" => game.resume_from_overlay().await,
            "r" => {
                let snapshot = game.snapshot().await;
                if snapshot.state.is_terminated() {
                    game.retry_high_score_check().await;
                } else if let Err(e) = game.retry_puzzle().await {
                    println!("Still failing: {}", e.user_message());
                }
            }
            "n" => {
                if let Err(e) = game.new_round().await {
                    tracing::warn!("Puzzle failed to load: {}", e);
                }
            }
            "l" => {
                if game.snapshot().await.state.is_active() {
                    game.pause_for_overlay().await;
                }
                match leaderboard
                    .leaderboard(LEADERBOARD_SIZE, Some(&config.game.game_type))
                    .await
                {
                    Ok(entries) => println!("{}", view::leaderboard_table(&entries, Some(&user.id))),
                    Err(e) => println!("Could not load leaderboard: {}", e.user_message()),
                }
                let position = leaderboard
                    .user_position(&user.id, Some(&config.game.game_type))
                    .await;
                if let Ok(position) = position {
                    match position.position {
                        Some(rank) => println!("Your rank: #{} ({} points)", rank, position.score),
                        None => println!("You are not ranked yet."),
                    }
                }
                continue;
            }
            "h" => {
                match game_service.sessions(1, HISTORY_SIZE).await {
                    Ok(page) => {
                        for session in &page.sessions {
                            println!(
                                "score {:>5}  level {:>3}  {}s{}",
                                session.score,
                                session.level,
                                session.time_spent,
                                if session.completed { "" } else { "  (abandoned)" }
                            );
                        }
                        println!("{} sessions in total", page.pagination.total);
                    }
                    Err(e) => println!("Could not load history: {}", e.user_message()),
                }
                continue;
            }
            "logout" => {
                abandon_if_playing(&game).await;
                auth.logout().await;
                println!("Logged out.");
                return Ok(());
            }
            "q" => break,
            "?" | "help" => {
                print_help();
                continue;
            }
            other => {
                println!("Unknown command {:?} (? for help)", other);
                continue;
            }
        }
        println!("{}", view::round_screen(&game.snapshot().await));
    }

    abandon_if_playing(&game).await;
    Ok(())
}

/// Use the stored token if it is still valid, otherwise prompt for credentials.
/// Returns `None` when input ends before a successful login.
async fn authenticate(auth: &AuthStore, input: &mut Input) -> std::io::Result<Option<User>> {
    if auth.state().await.token.is_some() {
        if let Ok(user) = auth.check_auth().await {
            return Ok(Some(user));
        }
    }

    loop {
        let Some(email) = prompt(input, "Email (or 'register'): ").await? else {
            return Ok(None);
        };

        let result = if email == "register" {
            let Some(username) = prompt(input, "Username: ").await? else {
                return Ok(None);
            };
            let Some(email) = prompt(input, "Email: ").await? else {
                return Ok(None);
            };
            let Some(password) = prompt(input, "Password: ").await? else {
                return Ok(None);
            };
            auth.register(&username, &email, &password).await
        } else {
            let Some(password) = prompt(input, "Password: ").await? else {
                return Ok(None);
            };
            auth.login(&email, &password).await
        };

        match result {
            Ok(user) => return Ok(Some(user)),
            Err(message) => {
                println!("{}", message);
                auth.clear_error().await;
            }
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

async fn abandon_if_playing(game: &GameController) {
    let snapshot = game.snapshot().await;
    if !snapshot.state.is_terminated() && snapshot.state.phase != RoundPhase::Idle {
        game.abandon_round().await;
    }
}

/// Report things that happen without player input (the clock running out)
fn spawn_event_printer(game: &GameController) {
    let mut events = game.subscribe();
    tokio::spawn(async move {
        let mut timed_out = false;
        loop {
            match events.recv().await {
                Ok(RoundEvent::Tick { remaining, .. })
                    if remaining == view::HURRY_THRESHOLD_SECONDS =>
                {
                    println!("\n{} seconds left!", remaining);
                }
                Ok(RoundEvent::RoundStarted { .. }) => timed_out = false,
                Ok(RoundEvent::Terminated {
                    cause: TerminationCause::Timeout,
                    score,
                    level,
                    ..
                }) => {
                    timed_out = true;
                    println!("\nTime's up! Final score {} at level {}.", score, level);
                }
                Ok(RoundEvent::HighScoreChecked { comparison, .. }) if timed_out => {
                    if comparison.is_new_high_score {
                        println!("New High Score!");
                    }
                    println!("Press n for a new game.");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Event printer skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn print_help() {
    println!(
        "Commands: 1-4 select | s submit | p pause | c continue | r retry | \
         n new game | l leaderboard | h history | q quit | logout"
    );
}
