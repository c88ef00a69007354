use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use minishiur_core::{
    CompletionSet, DurationConfig, LessonOutcome, LessonRow, PlannerError, PlannerSession, Source,
    lesson_rows, parse_hms, partition, play_lesson, plan_summary,
};
use tokio::{
    fs,
    sync::{broadcast, mpsc},
};

use crate::{
    player::{ExternalPlayer, PlayerConfig},
    store::{KeyValueStore, default_state_path, keys},
};

mod player;
mod store;

#[derive(Parser)]
#[command(name = "minishiur")]
#[command(about = "Split a course of YouTube videos into mini-shiurim and play them one by one")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Args)]
struct GlobalOpts {
    /// Milliseconds between duration polls
    #[arg(long, global = true, env = "MINISHIUR_POLL_INTERVAL_MS", default_value_t = 400)]
    poll_interval_ms: u64,

    /// Seconds to wait for one video's duration before giving up
    #[arg(long, global = true, env = "MINISHIUR_BUDGET_SECS", default_value_t = 10)]
    budget_secs: u64,

    /// yt-dlp executable used to read video metadata
    #[arg(long, global = true, env = "MINISHIUR_YT_DLP", default_value = "yt-dlp")]
    yt_dlp: String,

    /// mpv executable used for playback
    #[arg(long, global = true, env = "MINISHIUR_MPV", default_value = "mpv")]
    mpv: String,

    /// State file (defaults to the user data directory)
    #[arg(long, global = true, env = "MINISHIUR_STATE")]
    state: Option<PathBuf>,
}

impl GlobalOpts {
    fn duration_config(&self) -> DurationConfig {
        DurationConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            budget: Duration::from_secs(self.budget_secs),
        }
    }

    fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            yt_dlp: self.yt_dlp.clone(),
            mpv: self.mpv.clone(),
        }
    }

    async fn open_store(&self) -> Result<KeyValueStore> {
        let path = self.state.clone().unwrap_or_else(default_state_path);
        KeyValueStore::open(path).await
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build mini-shiurim from course videos
    Build {
        /// Mini-shiur length (HH:MM:SS, MM:SS, or SS)
        #[arg(short, long)]
        length: String,

        /// File with one video URL per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Video URLs, in course order
        urls: Vec<String>,
    },
    /// Show the saved mini-shiurim
    List,
    /// Play a mini-shiur segment by segment
    Play {
        /// Mini-shiur number
        lesson: usize,

        /// Mark the mini-shiur complete once it finishes
        #[arg(short, long)]
        mark: bool,
    },
    /// Mark a mini-shiur complete
    Done { lesson: usize },
    /// Clear the completion mark of a mini-shiur
    Undone { lesson: usize },
    /// Forget the saved course
    Reset,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_rows(rows: &[LessonRow], completed: &CompletionSet) {
    if rows.is_empty() {
        println!(
            "{}",
            style("No mini-shiurim yet. Run `minishiur build` with course videos and a duration.")
                .dim()
        );
        return;
    }

    for row in rows {
        let mark = if completed.is_complete(row.index) {
            style("✓").green().bold()
        } else {
            style("·").dim()
        };
        println!(
            "{} {:>4}  {} – {}  {}",
            mark,
            row.index,
            row.start_label,
            row.end_label,
            style(&row.url).dim()
        );
    }
}

async fn build(
    opts: &GlobalOpts,
    length: String,
    file: Option<PathBuf>,
    urls: Vec<String>,
) -> Result<()> {
    let mut lines = urls;
    if let Some(path) = file {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        lines.extend(content.lines().map(str::to_string));
    }
    let videos_text = lines.join("\n");

    let (events_tx, _events_rx) = mpsc::channel(8);
    let mut player = ExternalPlayer::connect(opts.player_config(), events_tx, false).await;

    let spinner = create_spinner("Loading videos and calculating durations…");
    let mut session = PlannerSession::new();
    let built = session
        .build(&mut player, &videos_text, &length, &opts.duration_config())
        .await;
    spinner.finish_and_clear();
    let plan = built?;

    let rows = lesson_rows(plan);
    let completed = CompletionSet::new();

    let mut store = opts.open_store().await?;
    store.set(keys::VIDEOS, &videos_text)?;
    store.set(keys::DURATION, &length.trim())?;
    store.set(keys::SOURCES, &plan.sources)?;
    store.set(keys::SEGMENTS, &rows)?;
    store.set(keys::COMPLETED, &completed)?;
    store.save().await?;

    println!(
        "{} Generated {} mini-shiurim from {} video(s)\n",
        style("✓").green().bold(),
        rows.len(),
        plan.sources.len()
    );
    print_rows(&rows, &completed);
    println!("\n{}", style(plan_summary(plan)).cyan());
    Ok(())
}

fn saved_rows(store: &KeyValueStore) -> (Vec<LessonRow>, CompletionSet) {
    let rows: Vec<LessonRow> = store.get(keys::SEGMENTS).unwrap_or_default();
    let mut completed: CompletionSet = store.get(keys::COMPLETED).unwrap_or_default();
    completed.retain_rows(&rows);
    (rows, completed)
}

async fn list(opts: &GlobalOpts) -> Result<()> {
    let store = opts.open_store().await?;
    let (rows, completed) = saved_rows(&store);
    print_rows(&rows, &completed);

    if let (Some(sources), Some(length)) = (
        store.get::<Vec<Source>>(keys::SOURCES),
        store.get::<String>(keys::DURATION),
    ) {
        let plan = partition(sources, parse_hms(&length)?)?;
        println!(
            "\n{} {}",
            style(plan_summary(&plan)).cyan(),
            style(format!("({} done)", completed.len())).dim()
        );
    }
    Ok(())
}

async fn set_complete(opts: &GlobalOpts, lesson: usize, complete: bool) -> Result<()> {
    let mut store = opts.open_store().await?;
    let (rows, mut completed) = saved_rows(&store);
    if !rows.iter().any(|r| r.index == lesson) {
        bail!("Mini-shiur {lesson} does not exist. Build the course first.");
    }

    if complete {
        completed.mark(lesson);
    } else {
        completed.unmark(lesson);
    }
    store.set(keys::COMPLETED, &completed)?;
    store.save().await?;
    print_rows(&rows, &completed);
    Ok(())
}

async fn play(opts: &GlobalOpts, lesson: usize, mark: bool) -> Result<()> {
    let store = opts.open_store().await?;
    let (Some(sources), Some(length)) = (
        store.get::<Vec<Source>>(keys::SOURCES),
        store.get::<String>(keys::DURATION),
    ) else {
        bail!("Please rebuild the course to play this mini-shiur.");
    };
    // Partitioning is deterministic, so this is the plan the rows were rendered from.
    let plan = partition(sources, parse_hms(&length)?)?;
    let position = lesson.checked_sub(1).unwrap_or(usize::MAX);
    let mut session = PlannerSession::with_plan(plan);

    let (events_tx, mut events_rx) = mpsc::channel(8);
    let mut player = ExternalPlayer::connect(opts.player_config(), events_tx, true).await;

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    if let Some(l) = session.plan().lesson(position) {
        println!(
            "{} Playing mini-shiur {} ({} segment(s))",
            style("▶").cyan().bold(),
            l.index,
            l.segments.len()
        );
    }

    let outcome = play_lesson(
        &mut session,
        &mut player,
        position,
        &mut events_rx,
        &mut shutdown_rx,
    )
    .await
    .map_err(|e| match e {
        PlannerError::LessonIndexOutOfRange { len, .. } => {
            anyhow::anyhow!("Mini-shiur {lesson} does not exist (course has {len}).")
        }
        other => other.into(),
    })?;

    match outcome {
        LessonOutcome::Completed { .. } => {
            println!(
                "{} Mini-shiur {} finished. Choose the next mini-shiur to continue.",
                style("✓").green().bold(),
                lesson
            );
            if mark {
                set_complete(opts, lesson, true).await?;
            }
        }
        LessonOutcome::Failed { message } => {
            bail!("Playback failed: {message}");
        }
        LessonOutcome::Interrupted => {
            println!("{}", style("Playback stopped.").dim());
        }
    }
    Ok(())
}

async fn reset(opts: &GlobalOpts) -> Result<()> {
    let mut store = opts.open_store().await?;
    store.clear();
    store.save().await?;
    println!(
        "{} Cleared {}",
        style("✓").green().bold(),
        style(store.path().display()).dim()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Build { length, file, urls } => build(&cli.opts, length, file, urls).await,
        Command::List => list(&cli.opts).await,
        Command::Play { lesson, mark } => play(&cli.opts, lesson, mark).await,
        Command::Done { lesson } => set_complete(&cli.opts, lesson, true).await,
        Command::Undone { lesson } => set_complete(&cli.opts, lesson, false).await,
        Command::Reset => reset(&cli.opts).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
