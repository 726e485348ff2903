use std::str::FromStr;

use clap::{Arg, ArgMatches, Command};
use tracing::{debug, info};

use eotsim::logging::{LogConfig, LogOutput, init_logging, level_for_verbosity, parse_log_level};
use eotsim::models::{ActuatorType, SimulationMode};
use eotsim::scenario::ScenarioConfig;
use eotsim::simulation::{RunSummary, SimulationEngine};

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("eotsim")
        .version("0.1.0")
        .about("EO照準安定化シミュレーション (Gimbal + FSM)")
        .long_about("載機外乱下でのジンバル・FSM二段安定化シミュレータ\n\
                     多重レート制御ループを固定刻みで進め、LOS誤差を評価します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、組み込みの既定シナリオで実行されます。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("制御モードを上書き (PASSIVE / STABILIZED / TRACKING)")
        )
        .arg(
            Arg::new("actuator")
                .short('a')
                .long("actuator")
                .value_name("TYPE")
                .help("FSMアクチュエータを上書き (VCM / PZT)")
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("実行フレーム数を上書き")
        )
        .arg(
            Arg::new("dt")
                .long("dt")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(f64))
                .help("1フレームの経過時間（秒）を上書き")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(clap::value_parser!(u64))
                .help("乱数シードを上書き")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: トレース)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .help("ログ出力先 (console / file / both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace / debug / info / warn / error)")
        )
        .get_matches();

    println!("EO照準安定化シミュレーション - eotsim v0.1.0");
    println!();

    if let Err(e) = run(&matches) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let verbose_level = matches.get_count("verbose");

    // ログ設定（ガードはプログラム終了まで保持する）
    let output = match matches.get_one::<String>("log-output") {
        Some(s) => LogOutput::from_str(s)?,
        None => LogOutput::Console,
    };
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| level_for_verbosity(verbose_level));
    let _guard = init_logging(LogConfig {
        level,
        output,
        ..LogConfig::default()
    })?;

    let mut scenario = match matches.get_one::<String>("scenario") {
        Some(path) => {
            let scenario = ScenarioConfig::from_file(path)?;
            info!(path = %path, "シナリオファイル読み込み完了");
            scenario
        }
        None => {
            debug!("シナリオ未指定のため既定シナリオを使用します");
            ScenarioConfig::default()
        }
    };

    apply_overrides(&mut scenario, matches)?;
    scenario.validate()?;

    // 情報表示のみの場合
    if matches.get_flag("info") {
        scenario.print_summary();
        return Ok(());
    }

    scenario.print_summary();
    println!();

    let mut engine = SimulationEngine::from_scenario(&scenario, verbose_level);
    let summary = engine.run(scenario.run.frames, scenario.run.frame_dt_s);
    print_results(&engine, &summary);

    Ok(())
}

/// コマンドラインの上書き指定をシナリオに反映
fn apply_overrides(scenario: &mut ScenarioConfig, matches: &ArgMatches) -> Result<(), String> {
    if let Some(mode) = matches.get_one::<String>("mode") {
        scenario.params.mode = SimulationMode::from_str(mode)?;
    }
    if let Some(actuator) = matches.get_one::<String>("actuator") {
        scenario.params.actuator_type = ActuatorType::from_str(actuator)?;
    }
    if let Some(&frames) = matches.get_one::<u64>("frames") {
        scenario.run.frames = frames;
    }
    if let Some(&dt) = matches.get_one::<f64>("dt") {
        scenario.run.frame_dt_s = dt;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        scenario.run.seed = seed;
    }
    Ok(())
}

fn print_results(engine: &SimulationEngine, summary: &RunSummary) {
    let state = engine.state();

    println!("=== 実行結果 ===");
    println!("フレーム数: {}", summary.frames);
    println!("シミュレーション時刻: {:.3}秒", summary.sim_time);
    println!("サブステップ: ジンバル {} 回 / FSM {} 回", summary.gimbal_steps, summary.fsm_steps);
    println!();

    println!("=== 最終状態 ===");
    println!(
        "載機姿勢: roll {:.3}° / pitch {:.3}° / yaw {:.3}°",
        state.aircraft_attitude.roll.to_degrees(),
        state.aircraft_attitude.pitch.to_degrees(),
        state.aircraft_attitude.yaw.to_degrees()
    );
    println!(
        "ジンバル: az {:.4}° / el {:.4}° (指令 az {:.4}° / el {:.4}°)",
        state.gimbal_angle.az.to_degrees(),
        state.gimbal_angle.el.to_degrees(),
        state.gimbal_command.az.to_degrees(),
        state.gimbal_command.el.to_degrees()
    );
    println!(
        "FSM: x {:.3} mrad / y {:.3} mrad",
        state.fsm_angle.x * 1000.0,
        state.fsm_angle.y * 1000.0
    );
    println!(
        "ターゲット: ({:.1}, {:.1}, {:.1}) m",
        state.target_position.x, state.target_position.y, state.target_position.z
    );
    println!();

    println!("=== LOS誤差 ===");
    println!("最終: {:.1} µrad", summary.final_error * 1e6);
    println!("RMS: {:.1} µrad (履歴 {} 件)", summary.rms_error * 1e6, engine.history().len());
    println!("最大: {:.1} µrad", summary.peak_error * 1e6);
}
