//! # FSMアクチュエータモデル
//!
//! FSMの駆動素子ごとの外乱特性を表します。
//!
//! - **VCM**: 線形性が高く、200Hz / 180Hz の微小なトルクリップルのみ
//! - **PZT**: Bouc-Wen 動的ヒステリシスを持ち、内部状態 (hx, hy) をサブステップ間で保持
//!
//! どちらも [`IActuator`] を実装し、[`FsmActuator`] がタグ付きの切り替えを担います。

use tracing::debug;

use crate::models::{
    common::{FsmAngles, HysteresisState, math_utils::phase},
    params::{ActuatorType, SimulationParameters},
    traits::{ActuatorInput, IActuator},
};

/// Bouc-Wen モデルの出力係数 d
pub const BOUC_WEN_D: f64 = 1.408;
/// 角度変換の焦点距離パラメータ l
pub const BOUC_WEN_L: f64 = 0.02;
/// Bouc-Wen モデルの指数 n
pub const BOUC_WEN_N: i32 = 1;

/// ボイスコイルモータ
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VcmActuator;

impl IActuator for VcmActuator {
    fn disturbance(&mut self, input: &ActuatorInput, params: &SimulationParameters) -> FsmAngles {
        let scale = params.vcm_ripple;
        FsmAngles::new(
            scale * 0.0002 * (phase(200.0, input.time) + std::f64::consts::FRAC_PI_4).sin(),
            scale * 0.0002 * phase(180.0, input.time).cos(),
        )
    }

    fn hysteresis_state(&self) -> HysteresisState {
        HysteresisState::zero()
    }

    fn actuator_type(&self) -> ActuatorType {
        ActuatorType::Vcm
    }
}

/// 圧電アクチュエータ（Bouc-Wen ヒステリシス）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PztActuator {
    /// ヒステリシス内部状態
    pub state: HysteresisState,
}

impl PztActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// ḣ = α·u̇ + β·|u̇|·|h|^(n−1)·h − γ·u̇·|h|^n
    pub fn hysteresis_rate(u_rate: f64, h: f64, params: &SimulationParameters) -> f64 {
        let alpha = params.pzt_hysteresis_alpha;
        let beta = params.pzt_hysteresis_beta;
        let gamma = params.pzt_hysteresis_gamma;

        alpha * u_rate + beta * u_rate.abs() * h.abs().powi(BOUC_WEN_N - 1) * h
            - gamma * u_rate * h.abs().powi(BOUC_WEN_N)
    }

    /// ヒステリシス出力 y = d·u + h から角度偏差 −(atan(y/l) − u) を求める
    pub fn angular_deviation(u: f64, h: f64) -> f64 {
        let y = BOUC_WEN_D * u + h;
        -((y / BOUC_WEN_L).atan() - u)
    }

    /// 1軸分の積分（陽的オイラー法）と外乱角
    fn integrate_axis(
        h: f64,
        u: f64,
        u_previous: f64,
        dt: f64,
        params: &SimulationParameters,
    ) -> (f64, f64) {
        let u_rate = (u - u_previous) / dt;
        let h_next = h + Self::hysteresis_rate(u_rate, h, params) * dt * params.pzt_hysteresis;
        (h_next, Self::angular_deviation(u, h_next))
    }
}

impl IActuator for PztActuator {
    fn disturbance(&mut self, input: &ActuatorInput, params: &SimulationParameters) -> FsmAngles {
        let (hx, dx) = Self::integrate_axis(
            self.state.hx,
            input.command.x,
            input.previous_command.x,
            input.dt,
            params,
        );
        let (hy, dy) = Self::integrate_axis(
            self.state.hy,
            input.command.y,
            input.previous_command.y,
            input.dt,
            params,
        );
        self.state = HysteresisState::new(hx, hy);
        FsmAngles::new(dx, dy)
    }

    fn hysteresis_state(&self) -> HysteresisState {
        self.state
    }

    fn actuator_type(&self) -> ActuatorType {
        ActuatorType::Pzt
    }
}

/// FSMアクチュエータ（VCM / PZT のタグ付き共用体）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FsmActuator {
    Vcm(VcmActuator),
    Pzt(PztActuator),
}

impl FsmActuator {
    /// 種別に対応する初期状態のアクチュエータ
    pub fn for_type(actuator_type: ActuatorType) -> Self {
        match actuator_type {
            ActuatorType::Vcm => FsmActuator::Vcm(VcmActuator),
            ActuatorType::Pzt => FsmActuator::Pzt(PztActuator::new()),
        }
    }

    /// 要求された種別と異なれば作り直す
    ///
    /// VCM へ切り替えるとヒステリシス状態は即座に0になる。
    pub fn ensure_type(&mut self, actuator_type: ActuatorType) {
        if self.actuator_type() != actuator_type {
            debug!(
                from = %self.actuator_type(),
                to = %actuator_type,
                discarded_hx = self.hysteresis_state().hx,
                discarded_hy = self.hysteresis_state().hy,
                "ACTUATOR_SWITCH: FSMアクチュエータを切り替えました"
            );
            *self = Self::for_type(actuator_type);
        }
    }
}

impl Default for FsmActuator {
    fn default() -> Self {
        Self::for_type(ActuatorType::Vcm)
    }
}

impl IActuator for FsmActuator {
    fn disturbance(&mut self, input: &ActuatorInput, params: &SimulationParameters) -> FsmAngles {
        match self {
            FsmActuator::Vcm(vcm) => vcm.disturbance(input, params),
            FsmActuator::Pzt(pzt) => pzt.disturbance(input, params),
        }
    }

    fn hysteresis_state(&self) -> HysteresisState {
        match self {
            FsmActuator::Vcm(vcm) => vcm.hysteresis_state(),
            FsmActuator::Pzt(pzt) => pzt.hysteresis_state(),
        }
    }

    fn actuator_type(&self) -> ActuatorType {
        match self {
            FsmActuator::Vcm(vcm) => vcm.actuator_type(),
            FsmActuator::Pzt(pzt) => pzt.actuator_type(),
        }
    }
}
