use chrono::{SecondsFormat, Utc};
use clap::Parser;
use dot_chase::constants::{DOT_SCORE, MAX_LEVEL, MAX_PURSUERS, POWER_DURATION_TICKS};
use dot_chase::engine::GameEngine;
use dot_chase::geometry::Rect;
use dot_chase::types::{Difficulty, Direction, RuntimeEvent, Snapshot};
use dot_chase::walls::walls_for;
use rand::Rng as _;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    ticks: Option<u64>,
    /// Comma-separated opening moves (up/down/left/right/none) that
    /// override the intent policy for the first ticks of a single run.
    #[arg(long)]
    script: Option<String>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    difficulty: Difficulty,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    script: Vec<Direction>,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    difficulty: Difficulty,
    #[serde(rename = "durationTicks")]
    duration_ticks: u64,
    score: i32,
    level: i32,
    #[serde(rename = "dotsEaten")]
    dots_eaten: i32,
    #[serde(rename = "powerTaken")]
    power_taken: i32,
    #[serde(rename = "gameOver")]
    game_over: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    #[serde(rename = "averageScore")]
    average_score: i32,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let started_at = timestamp();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_score = 0i64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        let mut engine = GameEngine::new(scenario.seed);
        engine.start_session(scenario.difficulty);
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "maxTicks": scenario.max_ticks,
                "config": engine.config(),
            }),
        );
        let scenario_run = run_scenario(engine, &scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_score += scenario_run.result.score as i64;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.game_over))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.duration_ticks),
            json!({
                "score": scenario_run.result.score,
                "level": scenario_run.result.level,
                "gameOver": scenario_run.result.game_over,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at,
        timestamp(),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_score,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "outcomeCounts": summary.outcome_counts,
            "averageScore": summary.average_score,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(mut engine: GameEngine, scenario: &Scenario) -> ScenarioRunResult {
    let mut dots_eaten = 0;
    let mut power_taken = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    let mut snapshot = engine.build_snapshot(true);
    while !engine.is_ended() && snapshot.tick < scenario.max_ticks {
        let intent = scenario
            .script
            .get(snapshot.tick as usize)
            .copied()
            .unwrap_or_else(|| choose_intent(&snapshot));
        engine.tick(intent);
        snapshot = engine.build_snapshot(true);

        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::DotEaten { .. } => dots_eaten += 1,
                RuntimeEvent::PowerTaken => power_taken += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            difficulty: scenario.difficulty,
            duration_ticks: summary.duration_ticks,
            score: summary.score,
            level: summary.level,
            dots_eaten,
            power_taken,
            game_over: summary.game_over,
            anomalies,
        },
        anomaly_records,
    }
}

/// Scripted player: flee a close pursuer, otherwise head for the
/// nearest dot. Dominant-axis steps only, matching the intent contract.
fn choose_intent(snapshot: &Snapshot) -> Direction {
    let player = snapshot.player;
    let center = |rect: Rect| (rect.x + rect.w / 2, rect.y + rect.h / 2);
    let (px, py) = center(player);

    if !snapshot.power_active {
        let threat = snapshot
            .pursuers
            .iter()
            .map(|pursuer| center(pursuer.rect))
            .min_by_key(|&(x, y)| (px - x).abs() + (py - y).abs());
        if let Some((tx, ty)) = threat {
            if (px - tx).abs() + (py - ty).abs() < 60 {
                return if (px - tx).abs() >= (py - ty).abs() {
                    if px >= tx {
                        Direction::Right
                    } else {
                        Direction::Left
                    }
                } else if py >= ty {
                    Direction::Down
                } else {
                    Direction::Up
                };
            }
        }
    }

    let target = snapshot
        .dots
        .iter()
        .map(|dot| center(*dot))
        .min_by_key(|&(x, y)| (px - x).abs() + (py - y).abs());
    match target {
        Some((tx, ty)) if (px - tx).abs() >= (py - ty).abs() && px != tx => {
            if tx > px {
                Direction::Right
            } else {
                Direction::Left
            }
        }
        Some((_, ty)) if ty != py => {
            if ty > py {
                Direction::Down
            } else {
                Direction::Up
            }
        }
        _ => Direction::None,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < 0 || snapshot.score % DOT_SCORE != 0 {
        anomalies.push(format!("invalid score: {}", snapshot.score));
    }
    if snapshot.level < 1 || snapshot.level > MAX_LEVEL {
        anomalies.push(format!("level out of range: {}", snapshot.level));
    }
    if snapshot.pursuers.len() > MAX_PURSUERS {
        anomalies.push(format!("too many pursuers: {}", snapshot.pursuers.len()));
    }
    if snapshot.power_ticks_left > POWER_DURATION_TICKS {
        anomalies.push(format!(
            "power countdown out of range: {}",
            snapshot.power_ticks_left
        ));
    }

    let walls = walls_for(snapshot.level);
    for (idx, pursuer) in snapshot.pursuers.iter().enumerate() {
        for wall in walls {
            if pursuer.rect.overlaps(wall) {
                anomalies.push(format!("pursuer {idx} inside a wall"));
            }
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let difficulty = cli
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(Difficulty::Medium);
    let max_ticks = cli.ticks.unwrap_or(6_000).clamp(1, 1_000_000);
    let script = cli.script.as_deref().map(parse_script).unwrap_or_default();

    if cli.single || cli.difficulty.is_some() || cli.ticks.is_some() || cli.script.is_some() {
        return vec![Scenario {
            name: format!("custom-{difficulty:?}").to_lowercase(),
            difficulty,
            seed,
            max_ticks,
            script,
        }];
    }

    vec![
        Scenario {
            name: "smoke-easy".to_string(),
            difficulty: Difficulty::Easy,
            seed,
            max_ticks: 2_000,
            script: Vec::new(),
        },
        Scenario {
            name: "standard-medium".to_string(),
            difficulty: Difficulty::Medium,
            seed: seed.wrapping_add(1),
            max_ticks: 6_000,
            script: Vec::new(),
        },
        Scenario {
            name: "pressure-hard".to_string(),
            difficulty: Difficulty::Hard,
            seed: seed.wrapping_add(2),
            max_ticks: 6_000,
            script: Vec::new(),
        },
    ]
}

/// Comma-separated move names; unknown tokens are dropped.
fn parse_script(raw: &str) -> Vec<Direction> {
    raw.split(',')
        .filter_map(|token| Direction::parse_move(token.trim()))
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    records: &mut Vec<AnomalyRecord>,
    seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: timestamp(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_score: i64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as i64) as i32
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        outcome_counts,
        average_score,
        scenarios,
    }
}

fn outcome_key(game_over: bool) -> String {
    if game_over { "terminal" } else { "tick_limit" }.to_string()
}

fn default_run_id(seed: u32) -> String {
    format!("sim-{}-{}", seed, Utc::now().timestamp_millis())
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
