//! # Simulation モジュール
//!
//! 機載光電追尾システムのシミュレーションエンジンを提供します。
//!
//! このモジュールは、ホストのフレームコールバックから渡される壁時計の経過時間で
//! 外側の時刻を進め、制御周期の異なる2つのループ（ジンバル 50Hz、FSM 500Hz）を
//! 固定ステップのアキュムレータで駆動します。1フレームの処理量は経過時間の
//! 上限（0.1秒）で抑えられ、ジンバルは最大5ステップ、FSMは最大50ステップです。
//!
//! ## フレーム処理順序
//!
//! 1. **パラメータ反映**: `set_parameters` で予約された設定をフレーム境界で切り替え
//! 2. **外乱・ターゲット**: 時刻 `t` の載機姿勢とターゲット位置を計算
//! 3. **理想LOS**: ジンバル基点からターゲットへの理想角を計算
//! 4. **ジンバル処理**: 溜まった 20ms ステップをすべて消化
//! 5. **FSM処理**: ジンバルの残差を指令として 2ms ステップをすべて消化
//! 6. **誤差計算**: 更新後の関節角から指向ベクトルとLOS誤差を再計算
//! 7. **スナップショット**: 新しい状態を確定し、0.05秒以上経っていれば履歴に追加
//!
//! ジンバルのサブステップは必ずFSMより先に消化されます。
//!
//! ## 使用例
//!
//! ```rust
//! use eotsim::models::{SimulationMode, SimulationParameters};
//! use eotsim::simulation::SimulationEngine;
//!
//! let params = SimulationParameters::default().with_mode(SimulationMode::Tracking);
//! let mut engine = SimulationEngine::new(params, 42, 100);
//!
//! for _ in 0..60 {
//!     let state = engine.step(1.0 / 60.0);
//!     assert!(state.error.is_finite());
//! }
//! assert!(engine.history().len() <= 100);
//! ```

use tracing::{debug, info, trace, warn};

use crate::models::*;
use crate::scenario::ScenarioConfig;

/// 1フレームで進める時間の上限（秒）
pub const MAX_FRAME_DT_S: f64 = 0.1;

/// 固定ステップのアキュムレータ
///
/// 可変長のフレーム時間を貯め、固定幅のステップを整数回取り出します。
/// 取り出した分だけ減算するので、シミュレーション時間は失われません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepAccumulator {
    step: f64,
    pending: f64,
}

impl FixedStepAccumulator {
    pub fn new(step: f64) -> Self {
        Self { step, pending: 0.0 }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// 未消化の時間（秒）
    pub fn pending(&self) -> f64 {
        self.pending
    }

    pub fn advance(&mut self, dt: f64) {
        self.pending += dt;
    }

    /// 1ステップ分溜まっていれば取り出して true
    pub fn consume(&mut self) -> bool {
        if self.pending >= self.step {
            self.pending -= self.step;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.pending = 0.0;
    }
}

/// 溜まったステップをすべて制御ループに流す
fn drain<L: IControlLoop>(
    clock: &mut FixedStepAccumulator,
    control: &mut L,
    command: L::Command,
    params: &SimulationParameters,
    ctx: &mut SimulationContext,
) -> u64 {
    let mut steps = 0;
    while clock.consume() {
        control.update(command, params, ctx);
        steps += 1;
    }
    steps
}

/// バッチ実行の結果
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// 実行フレーム数
    pub frames: u64,
    /// 最終シミュレーション時刻（秒）
    pub sim_time: f64,
    /// 最終LOS誤差（rad）
    pub final_error: f64,
    /// 履歴ウィンドウのRMS誤差（rad）
    pub rms_error: f64,
    /// 履歴ウィンドウの最大誤差（rad）
    pub peak_error: f64,
    /// ジンバルの累積サブステップ数
    pub gimbal_steps: u64,
    /// FSMの累積サブステップ数
    pub fsm_steps: u64,
}

pub struct SimulationEngine {
    /// 現在有効なパラメータ
    params: SimulationParameters,
    /// 次フレームから有効になるパラメータ
    pending_params: Option<SimulationParameters>,

    ctx: SimulationContext,
    disturbance: DisturbanceSynthesizer,
    target_motion: TargetMotion,
    kinematics: Kinematics,
    gimbal: GimbalLoop,
    fsm: FsmLoop,
    gimbal_clock: FixedStepAccumulator,
    fsm_clock: FixedStepAccumulator,

    state: SystemState,
    history: HistoryBuffer,

    pub step_count: u64,
    pub gimbal_steps: u64,
    pub fsm_steps: u64,
    pub verbose_level: u8,
}

impl SimulationEngine {
    pub fn new(params: SimulationParameters, seed: u64, history_capacity: usize) -> Self {
        let gimbal = GimbalLoop::new();
        let mut fsm = FsmLoop::new();
        fsm.actuator = FsmActuator::for_type(params.actuator_type);

        Self {
            gimbal_clock: FixedStepAccumulator::new(gimbal.step_interval()),
            fsm_clock: FixedStepAccumulator::new(fsm.step_interval()),
            params,
            pending_params: None,
            ctx: SimulationContext::new(seed),
            disturbance: DisturbanceSynthesizer::new(),
            target_motion: TargetMotion::new(),
            kinematics: Kinematics::new(),
            gimbal,
            fsm,
            state: SystemState::initial(),
            history: HistoryBuffer::new(history_capacity),
            step_count: 0,
            gimbal_steps: 0,
            fsm_steps: 0,
            verbose_level: 0,
        }
    }

    /// シナリオ設定からエンジンを作成
    pub fn from_scenario(scenario: &ScenarioConfig, verbose_level: u8) -> Self {
        let mut engine = Self::new(
            scenario.params.clone(),
            scenario.run.seed,
            scenario.run.history_capacity,
        );
        engine.verbose_level = verbose_level;

        if verbose_level > 0 {
            info!(
                mode = %engine.params.mode,
                actuator = %engine.params.actuator_type,
                seed = scenario.run.seed,
                history_capacity = scenario.run.history_capacity,
                "シミュレーションエンジンを初期化しました"
            );
        }
        engine
    }

    /// 現在の状態スナップショット
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// 次のステップで使われるパラメータ
    pub fn parameters(&self) -> &SimulationParameters {
        self.pending_params.as_ref().unwrap_or(&self.params)
    }

    /// 状態履歴（古い順）
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// パラメータを差し替える
    ///
    /// 反映は次の `step` の先頭で行われ、フレームの途中で設定が混ざることはない。
    /// 既存の履歴には影響しない。
    pub fn set_parameters(&mut self, params: SimulationParameters) {
        self.pending_params = Some(params);
    }

    /// 初期状態に戻す（乱数源も同じシードで再初期化）
    pub fn reset(&mut self) {
        self.apply_pending_parameters();
        self.ctx.reset();
        self.gimbal.reset();
        self.fsm.reset();
        self.gimbal_clock.reset();
        self.fsm_clock.reset();
        self.state = SystemState::initial();
        self.history.clear();
        self.step_count = 0;
        self.gimbal_steps = 0;
        self.fsm_steps = 0;
        debug!(seed = self.ctx.seed, "シミュレーションをリセットしました");
    }

    /// 1フレーム進める
    ///
    /// `wall_dt` は壁時計の経過秒数。負値・非有限値は0、上限を超えた分は切り捨てる。
    pub fn step(&mut self, wall_dt: f64) -> SystemState {
        self.apply_pending_parameters();
        let dt = Self::clamp_frame_dt(wall_dt);

        self.ctx.time = self.state.time + dt;
        let attitude = self.process_disturbance();
        let target = self.target_motion.position(self.ctx.time, &self.params);
        let line_of_sight = self.kinematics.line_of_sight(&attitude, &target);
        let ideal = line_of_sight.ideal_angles;

        self.process_gimbal(dt, ideal);
        let residual = FsmAngles::from_gimbal_residual(ideal - self.gimbal.angles);
        self.process_fsm(dt, residual);

        let error = Kinematics::los_error(&line_of_sight, self.gimbal.angles, self.fsm.angles);
        let fsm_command = if self.params.mode == SimulationMode::Tracking {
            residual
        } else {
            FsmAngles::zero()
        };

        self.state = SystemState {
            time: self.ctx.time,
            aircraft_attitude: attitude,
            gimbal_angle: self.gimbal.angles,
            gimbal_command: ideal,
            fsm_angle: self.fsm.angles,
            fsm_command,
            fsm_hysteresis_state: self.fsm.hysteresis_state(),
            target_position: target,
            error,
            control_signal: GimbalAngles::zero(),
        };
        self.process_history();
        self.step_count += 1;

        if self.verbose_level > 2 {
            trace!(
                time = self.state.time,
                error_rad = self.state.error,
                gimbal_az = self.state.gimbal_angle.az,
                gimbal_el = self.state.gimbal_angle.el,
                fsm_x = self.state.fsm_angle.x,
                fsm_y = self.state.fsm_angle.y,
                "フレーム完了"
            );
        }

        self.state.clone()
    }

    /// 一定のフレーム時間で `frames` 回進める（ヘッドレス実行用）
    pub fn run(&mut self, frames: u64, frame_dt: f64) -> RunSummary {
        info!(
            frames,
            frame_dt,
            mode = %self.parameters().mode,
            actuator = %self.parameters().actuator_type,
            "=== シミュレーション実行開始 ==="
        );

        let progress_interval = (frames / 10).max(1);
        for frame in 1..=frames {
            self.step(frame_dt);

            if self.verbose_level > 0 && frame % progress_interval == 0 {
                let progress = frame as f64 / frames as f64 * 100.0;
                info!(
                    "進行状況: {:.0}% (時刻 {:.2}秒, 誤差 {:.3} mrad)",
                    progress,
                    self.state.time,
                    self.state.error * 1000.0
                );
            }
        }

        let summary = self.summary(frames);
        info!("=== シミュレーション完了 ===");
        info!(
            sim_time = summary.sim_time,
            final_error_rad = summary.final_error,
            rms_error_rad = summary.rms_error,
            gimbal_steps = summary.gimbal_steps,
            fsm_steps = summary.fsm_steps,
            "実行結果"
        );
        summary
    }

    fn summary(&self, frames: u64) -> RunSummary {
        RunSummary {
            frames,
            sim_time: self.state.time,
            final_error: self.state.error,
            rms_error: self.history.rms_error(),
            peak_error: self.history.peak_error(),
            gimbal_steps: self.gimbal_steps,
            fsm_steps: self.fsm_steps,
        }
    }

    fn clamp_frame_dt(wall_dt: f64) -> f64 {
        if !wall_dt.is_finite() || wall_dt < 0.0 {
            warn!(wall_dt, "不正なフレーム時間を0として扱います");
            return 0.0;
        }
        if wall_dt > MAX_FRAME_DT_S {
            warn!(
                wall_dt,
                clamped = MAX_FRAME_DT_S,
                "フレーム時間が上限を超えたため切り詰めました"
            );
            return MAX_FRAME_DT_S;
        }
        wall_dt
    }

    fn apply_pending_parameters(&mut self) {
        let Some(next) = self.pending_params.take() else {
            return;
        };

        if next.mode != self.params.mode {
            info!(from = %self.params.mode, to = %next.mode, time = self.state.time, "制御モードを変更しました");
        }
        if next.actuator_type != self.params.actuator_type {
            info!(
                from = %self.params.actuator_type,
                to = %next.actuator_type,
                time = self.state.time,
                "FSMアクチュエータを変更しました"
            );
        }
        self.params = next;
        self.fsm.actuator.ensure_type(self.params.actuator_type);
    }

    fn process_disturbance(&mut self) -> Attitude {
        self.disturbance
            .sample(self.ctx.time, &self.params, &mut self.ctx.rng)
    }

    fn process_gimbal(&mut self, dt: f64, ideal: GimbalAngles) {
        self.gimbal_clock.advance(dt);
        let steps = drain(
            &mut self.gimbal_clock,
            &mut self.gimbal,
            ideal,
            &self.params,
            &mut self.ctx,
        );
        self.gimbal_steps += steps;
        trace!(steps, pending = self.gimbal_clock.pending(), "ジンバルサブステップ");
    }

    fn process_fsm(&mut self, dt: f64, residual: FsmAngles) {
        self.fsm_clock.advance(dt);
        let steps = drain(
            &mut self.fsm_clock,
            &mut self.fsm,
            residual,
            &self.params,
            &mut self.ctx,
        );
        self.fsm_steps += steps;
        trace!(steps, pending = self.fsm_clock.pending(), "FSMサブステップ");
    }

    fn process_history(&mut self) {
        if self.history.push_throttled(&self.state) {
            trace!(time = self.state.time, len = self.history.len(), "履歴に追加しました");
        }
    }
}
