use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use moodbinge_client::{
    config::Config,
    error::AppError,
    models::{Credentials, FeatureFlags, Mood, Movie, Registration},
    services::{load_movie_detail, RecommendationOrchestrator, ViewState},
    ClientContext, GatewayEvent, MoodBingeApi,
};

#[derive(Parser)]
#[command(name = "moodbinge")]
#[command(about = "MoodBinge - movie recommendations for how you feel", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Create an account
    Register {
        email: String,
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// List available moods
    Moods,
    /// Recommend movies for a mood
    Recommend {
        mood: String,
        #[arg(long)]
        limit: Option<u32>,
        /// Start a new session to get different movies
        #[arg(long)]
        refresh: bool,
    },
    /// Show one movie and similar titles
    Movie { id: String },
    /// Infer a mood from free text
    Analyze { text: String },
    /// Manage the recommendation session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Backend health and enhanced feature status
    Health,
    /// Compare original and enhanced recommendations
    Compare {
        mood: String,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Server-side statistics for the current session
    Stats,
    /// Reset server-side history and forget the local session
    Clear,
    /// Start a new local session
    Rotate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = Config::from_env().context("Failed to load configuration")?;
    let context = ClientContext::with_file_storage(config);
    let api = MoodBingeApi::new(context.clone());

    let mut events = api.gateway().subscribe();
    let result = run(cli.command, &api, &context).await;

    if let Ok(GatewayEvent::Unauthorized { path }) = events.try_recv() {
        tracing::debug!(path = %path, "Signed out after unauthorized response");
        eprintln!("Your session has expired. Run `moodbinge login <username>` to sign in again.");
    }

    result
}

async fn run(command: Commands, api: &MoodBingeApi, context: &ClientContext) -> Result<()> {
    let default_limit = context.config.default_limit;

    match command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            api.login(&Credentials { username, password }).await?;
            let name = context.auth.username().unwrap_or_default();
            println!("Welcome back, {}!", name);
        }
        Commands::Logout => {
            api.logout();
            println!("Signed out.");
        }
        Commands::Register {
            email,
            username,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            match api
                .register(&Registration {
                    email,
                    username,
                    password,
                })
                .await
            {
                Ok(()) => println!("Account created. You can now log in."),
                Err(AppError::Validation(validation)) => anyhow::bail!("{}", validation),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Moods => {
            for mood in api.moods().await? {
                let name = mood.name.clone().unwrap_or_else(|| Mood::display_name(&mood.id));
                println!("{} {:<24} {}", mood.emoji, name, mood.description);
            }
        }
        Commands::Recommend {
            mood,
            limit,
            refresh,
        } => {
            let limit = limit.unwrap_or(default_limit);
            let view = RecommendationOrchestrator::new(
                Arc::new(api.clone()),
                context.sessions.clone(),
                context.config.recommendation_timeout(),
            );
            let state = if refresh {
                view.refresh_recommendations(&mood, limit).await
            } else {
                view.load_recommendations(&mood, limit).await
            };
            if let ViewState::Failed(kind) = state {
                anyhow::bail!("{}", kind.message());
            }
            print_view(&mood, &state);
        }
        Commands::Movie { id } => {
            let detail = load_movie_detail(api, &id).await?;
            print_movie(&detail.movie);
            if let Some(overview) = &detail.movie.overview {
                println!("\n{}", overview);
            }
            if !detail.similar.is_empty() {
                println!("\nSimilar movies:");
                for movie in &detail.similar {
                    print_movie(movie);
                }
            }
        }
        Commands::Analyze { text } => match api.analyze_mood(&text).await {
            Ok(analysis) => {
                println!(
                    "{} ({:.0}% confidence)",
                    Mood::display_name(&analysis.mood),
                    analysis.confidence * 100.0
                );
                if let Some(message) = &analysis.message {
                    println!("{}", message);
                }
            }
            Err(AppError::Validation(validation)) => {
                for issue in &validation.issues {
                    eprintln!("  - {}", issue);
                }
                for suggestion in &validation.suggestions {
                    eprintln!("  try: {}", suggestion);
                }
                anyhow::bail!("{}", validation);
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Session { action } => match action {
            SessionAction::Stats => {
                let stats = api.current_session_stats().await?;
                println!("Session:     {}", context.sessions.resolve_session());
                println!("Movies seen: {}", stats.total_movies_seen);
                println!("Moods:       {}", stats.moods_requested.join(", "));
            }
            SessionAction::Clear => {
                let ack = api.clear_server_session(None).await?;
                context.sessions.clear();
                println!("{}", ack.message);
            }
            SessionAction::Rotate => {
                println!("New session: {}", context.sessions.rotate_session());
            }
        },
        Commands::Health => {
            let health = api.health().await?;
            let flags = FeatureFlags::from(health.clone());
            println!("Status:   {}", health.status.as_deref().unwrap_or("unknown"));
            println!("Version:  {}", flags.version);
            println!(
                "Enhanced: available={} enabled={}",
                flags.available, flags.enabled
            );
        }
        Commands::Compare { mood, limit } => {
            let comparison = api.compare(&mood, limit.unwrap_or(default_limit)).await?;
            let metrics = &comparison.comparison;
            println!(
                "Original: {} movies, enhanced: {} movies",
                comparison.original_system.count, comparison.enhanced_system.count
            );
            println!(
                "Overlap: {} ({:.1}%), unique to enhanced: {}",
                metrics.overlap_count, metrics.overlap_percentage, metrics.unique_to_enhanced
            );
        }
    }

    Ok(())
}

fn print_view(mood: &str, state: &ViewState) {
    match state {
        ViewState::Loaded(set) => {
            println!("{} picks:", Mood::display_name(mood));
            for movie in &set.movies {
                print_movie(movie);
            }
            if let Some(stats) = &set.stats {
                println!("\n{} movies seen this session", stats.total_movies_seen);
            }
        }
        ViewState::Idle => {}
        other => {
            if let Some(message) = other.message() {
                eprintln!("{}", message);
            }
        }
    }
}

fn print_movie(movie: &Movie) {
    let year = movie
        .release_year()
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    let rating = movie
        .rating
        .map(|r| format!("  ★ {:.1}", r))
        .unwrap_or_default();
    let id = movie.key().unwrap_or_default();
    println!("  [{}] {}{}{}", id, movie.clean_title(), year, rating);
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("moodbinge_client={level},moodbinge={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
