use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::EnvFilter;

use wcr_lineup::fatigue::FatigueParams;
use wcr_lineup::{GameState, OptimizerConfig, Recommendation, Roster, display_name, recommend_at};

const DEFAULT_ROSTER: &str = "data/player_values.csv";
const DEFAULT_GAME: &str = "game.json";

const USAGE: &str = "\
usage:
  lineup teams     [--roster <csv>]
  lineup recommend --team <name> [--roster <csv>] [--game <json>] [--goal-diff <n>] [--json]
  lineup stint     --players a,b,c,d --duration <min> [--home <n>] [--away <n>] [--game <json>]
  lineup reset     [--game <json>] [--home-team <name>] [--away-team <name>]
  lineup status    [--game <json>]";

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match command.as_str() {
        "teams" => cmd_teams(&args),
        "recommend" => cmd_recommend(&args),
        "stint" => cmd_stint(&args),
        "reset" => cmd_reset(&args),
        "status" => cmd_status(&args),
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'\n{USAGE}")),
    }
}

fn cmd_teams(args: &[String]) -> Result<()> {
    let roster = load_roster(args)?;
    for team in roster.teams() {
        let n = roster.team_players(&team).len();
        println!("{team} ({n} players)");
    }
    Ok(())
}

fn cmd_recommend(args: &[String]) -> Result<()> {
    let team = parse_str_arg(args, "--team").context("--team is required")?;
    let roster = load_roster(args)?;
    let game = GameState::load_or_default(&game_path(args))?;
    let config = OptimizerConfig::from_env();
    let goal_diff = match parse_str_arg(args, "--goal-diff") {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid --goal-diff '{raw}'"))?,
        None => game.goal_diff_for(&team),
    };

    let rec = recommend_at(&roster, &team, goal_diff, &game, &config)?;
    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&rec)?);
    } else {
        print_recommendation(&rec, config.fatigue);
    }
    Ok(())
}

fn cmd_stint(args: &[String]) -> Result<()> {
    let path = game_path(args);
    let mut game = GameState::load_or_default(&path)?;
    let players = parse_str_arg(args, "--players")
        .context("--players is required")?
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();
    let duration = parse_f64_arg(args, "--duration").context("--duration is required")?;
    let home = parse_u32_arg(args, "--home")?.unwrap_or(0);
    let away = parse_u32_arg(args, "--away")?.unwrap_or(0);

    let stint = game.add_stint(&players, home, away, duration)?.clone();
    game.save(&path)?;
    let (h, a) = game.total_score();
    println!(
        "stint {} recorded ({:.1} min, {}-{}); score now {h}-{a}",
        stint.number, stint.duration_minutes, stint.home_goals, stint.away_goals
    );
    Ok(())
}

fn cmd_reset(args: &[String]) -> Result<()> {
    let path = game_path(args);
    let mut game = GameState::load_or_default(&path)?;
    game.reset();
    if let Some(home) = parse_str_arg(args, "--home-team") {
        game.home_team = Some(home);
    }
    if let Some(away) = parse_str_arg(args, "--away-team") {
        game.away_team = Some(away);
    }
    game.save(&path)?;
    println!("game reset: {}", path.display());
    Ok(())
}

fn cmd_status(args: &[String]) -> Result<()> {
    let game = GameState::load_or_default(&game_path(args))?;
    let fatigue = OptimizerConfig::from_env().fatigue;
    let (h, a) = game.total_score();
    println!(
        "{} {h} - {a} {}",
        game.home_team.as_deref().unwrap_or("Home"),
        game.away_team.as_deref().unwrap_or("Away")
    );
    println!(
        "stints: {}  time played: {:.1} min",
        game.stints.len(),
        game.total_minutes()
    );
    for (id, minutes) in game.minutes_leaderboard() {
        println!(
            "  {:<20} {:>5.1} min  fatigue {:>4.1}%",
            display_name(id),
            minutes,
            fatigue.percent(minutes)
        );
    }
    Ok(())
}

fn print_recommendation(rec: &Recommendation, fatigue: FatigueParams) {
    println!(
        "{}: goal diff {:+}, strategy {} ({:.0}% offense / {:.0}% defense)",
        rec.team,
        rec.goal_diff,
        rec.strategy,
        rec.weights.offense * 100.0,
        rec.weights.defense * 100.0
    );
    for p in &rec.lineup.players {
        println!(
            "  {:<20} class {:.1}  O {:>6.2}  D {:>6.2}  min {:>4.1}  fatigue {:>4.1}%",
            display_name(&p.id),
            p.mobility_rating,
            p.offensive_adjusted,
            p.defensive_adjusted,
            p.minutes_played,
            fatigue.percent(p.minutes_played)
        );
    }
    println!(
        "  classification {:.1} / {:.1}  score {:.3}",
        rec.lineup.total_mobility, rec.lineup.cap, rec.lineup.score
    );
}

fn load_roster(args: &[String]) -> Result<Roster> {
    let path = parse_str_arg(args, "--roster")
        .map(PathBuf::from)
        .or_else(|| std::env::var("LINEUP_ROSTER").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROSTER));
    let roster = Roster::from_csv_path(&path)?;
    if roster.is_empty() {
        bail!("roster {} has no players", path.display());
    }
    Ok(roster)
}

fn game_path(args: &[String]) -> PathBuf {
    parse_str_arg(args, "--game")
        .map(PathBuf::from)
        .or_else(|| std::env::var("LINEUP_GAME").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GAME))
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn parse_str_arg(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&format!("{name}="))
            && !v.trim().is_empty()
        {
            return Some(v.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

/// `Ok(None)` when the flag is absent; a present but malformed value is an error.
fn parse_u32_arg(args: &[String], name: &str) -> Result<Option<u32>> {
    parse_str_arg(args, name)
        .map(|raw| {
            raw.parse::<u32>()
                .with_context(|| format!("invalid {name} '{raw}'"))
        })
        .transpose()
}

fn parse_f64_arg(args: &[String], name: &str) -> Option<f64> {
    parse_str_arg(args, name).and_then(|v| v.parse::<f64>().ok())
}
