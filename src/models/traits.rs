use crate::models::{
    common::{FsmAngles, HysteresisState},
    context::SimulationContext,
    params::{ActuatorType, SimulationParameters},
};

/// 固定周期で駆動される制御ループの共通インターフェース
///
/// エンジンは固定ステップのアキュムレータに溜まったステップ数だけ
/// `update` を呼び出します。1回の呼び出しは `step_interval()` 秒分の
/// 積分に相当します。
pub trait IControlLoop {
    /// ループに与える目標値の型
    type Command: Copy;

    /// 制御周波数（Hz）
    fn rate_hz(&self) -> f64;

    /// 固定ステップ幅（秒）
    fn step_interval(&self) -> f64 {
        1.0 / self.rate_hz()
    }

    /// 1サブステップ分の更新
    fn update(
        &mut self,
        command: Self::Command,
        params: &SimulationParameters,
        ctx: &mut SimulationContext,
    );

    /// 角度と内部状態をゼロに戻す
    fn reset(&mut self);
}

/// 1サブステップ分のアクチュエータ入力
#[derive(Debug, Clone, Copy)]
pub struct ActuatorInput {
    /// 今回の指令値（ジンバル残差）
    pub command: FsmAngles,
    /// 前回サブステップの指令値
    pub previous_command: FsmAngles,
    /// 外乱評価に使う時刻（秒）
    pub time: f64,
    /// サブステップ幅（秒）
    pub dt: f64,
}

/// FSMアクチュエータのインターフェース
///
/// 各サブステップで指令値に対する外乱角を返します。ヒステリシスのような
/// 内部状態は実装側が保持します。
pub trait IActuator {
    /// 外乱角を計算（必要なら内部状態を更新）
    fn disturbance(&mut self, input: &ActuatorInput, params: &SimulationParameters) -> FsmAngles;

    /// ヒステリシス内部状態（持たない実装は常に0）
    fn hysteresis_state(&self) -> HysteresisState;

    /// アクチュエータ種別
    fn actuator_type(&self) -> ActuatorType;
}
