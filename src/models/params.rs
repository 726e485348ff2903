use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 制御モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SimulationMode {
    /// 制御なし（載機に追従して揺れるだけ）
    Passive,
    /// ジンバルによる粗安定化
    Stabilized,
    /// ジンバル＋FSMによる精追尾
    Tracking,
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passive" => Ok(SimulationMode::Passive),
            "stabilized" | "stable" => Ok(SimulationMode::Stabilized),
            "tracking" | "track" => Ok(SimulationMode::Tracking),
            _ => Err(format!("無効なモード: {}. 利用可能: passive, stabilized, tracking", s)),
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulationMode::Passive => "PASSIVE",
            SimulationMode::Stabilized => "STABILIZED",
            SimulationMode::Tracking => "TRACKING",
        };
        write!(f, "{}", name)
    }
}

/// FSMアクチュエータの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorType {
    /// ボイスコイルモータ（高線形・ヒステリシスほぼなし）
    Vcm,
    /// 圧電素子（Bouc-Wenヒステリシスあり）
    Pzt,
}

impl FromStr for ActuatorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vcm" => Ok(ActuatorType::Vcm),
            "pzt" => Ok(ActuatorType::Pzt),
            _ => Err(format!("無効なアクチュエータ: {}. 利用可能: vcm, pzt", s)),
        }
    }
}

impl fmt::Display for ActuatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorType::Vcm => write!(f, "VCM"),
            ActuatorType::Pzt => write!(f, "PZT"),
        }
    }
}

/// シミュレーションパラメータ
///
/// 1ステップの間は不変として扱われ、次の `step` 呼び出しから反映されます。
/// 外乱強度はすべて [0, 1] の無次元スケールです。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// 機動外乱の基本周波数（Hz）
    pub disturbance_freq: f64,
    /// 機動外乱の振幅（rad）
    pub disturbance_amp: f64,
    /// ターゲット運動の速度倍率
    pub target_speed: f64,
    /// ターゲットまでの距離（m）
    pub target_distance: f64,
    /// ジンバル比例ゲイン
    pub kp_gimbal: f64,
    /// FSM比例ゲイン
    pub kp_fsm: f64,
    pub mode: SimulationMode,
    pub actuator_type: ActuatorType,

    // 載機層の外乱
    pub atmospheric_turbulence: f64,
    pub wind_gust_intensity: f64,
    pub aircraft_vibration: f64,
    pub unbalanced_torque: f64,

    // サーボ層の外乱
    pub motor_torque_ripple: f64,
    pub nonlinear_friction: f64,

    // 精追尾層の外乱
    pub vcm_ripple: f64,
    pub pzt_hysteresis: f64,
    pub pzt_hysteresis_alpha: f64,
    pub pzt_hysteresis_beta: f64,
    pub pzt_hysteresis_gamma: f64,

    /// パラメータ不確かさ（FSMゲインの摂動幅）
    pub parameter_uncertainty: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            disturbance_freq: 0.5,
            disturbance_amp: 0.15,
            target_speed: 0.8,
            target_distance: 2000.0,
            kp_gimbal: 0.2,
            kp_fsm: 0.8,
            mode: SimulationMode::Passive,
            actuator_type: ActuatorType::Vcm,
            atmospheric_turbulence: 0.1,
            wind_gust_intensity: 0.05,
            aircraft_vibration: 0.08,
            unbalanced_torque: 0.06,
            motor_torque_ripple: 0.03,
            nonlinear_friction: 0.04,
            vcm_ripple: 0.02,
            pzt_hysteresis: 0.07,
            pzt_hysteresis_alpha: -0.475,
            pzt_hysteresis_beta: 0.023,
            pzt_hysteresis_gamma: -0.0025,
            parameter_uncertainty: 0.05,
        }
    }
}

impl SimulationParameters {
    /// すべての外乱と不確かさを0にしたパラメータ（機動振幅も0）
    pub fn quiet() -> Self {
        Self {
            disturbance_amp: 0.0,
            atmospheric_turbulence: 0.0,
            wind_gust_intensity: 0.0,
            aircraft_vibration: 0.0,
            unbalanced_torque: 0.0,
            motor_torque_ripple: 0.0,
            nonlinear_friction: 0.0,
            vcm_ripple: 0.0,
            pzt_hysteresis: 0.0,
            parameter_uncertainty: 0.0,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_actuator(mut self, actuator_type: ActuatorType) -> Self {
        self.actuator_type = actuator_type;
        self
    }

    /// [0, 1] に収まるべき外乱強度の一覧（名前付き）
    pub fn intensities(&self) -> [(&'static str, f64); 9] {
        [
            ("atmospheric_turbulence", self.atmospheric_turbulence),
            ("wind_gust_intensity", self.wind_gust_intensity),
            ("aircraft_vibration", self.aircraft_vibration),
            ("unbalanced_torque", self.unbalanced_torque),
            ("motor_torque_ripple", self.motor_torque_ripple),
            ("nonlinear_friction", self.nonlinear_friction),
            ("vcm_ripple", self.vcm_ripple),
            ("pzt_hysteresis", self.pzt_hysteresis),
            ("parameter_uncertainty", self.parameter_uncertainty),
        ]
    }

    /// 物理量を持つスカラー（有限値であるべきもの）の一覧
    pub fn scalars(&self) -> [(&'static str, f64); 9] {
        [
            ("disturbance_freq", self.disturbance_freq),
            ("disturbance_amp", self.disturbance_amp),
            ("target_speed", self.target_speed),
            ("target_distance", self.target_distance),
            ("kp_gimbal", self.kp_gimbal),
            ("kp_fsm", self.kp_fsm),
            ("pzt_hysteresis_alpha", self.pzt_hysteresis_alpha),
            ("pzt_hysteresis_beta", self.pzt_hysteresis_beta),
            ("pzt_hysteresis_gamma", self.pzt_hysteresis_gamma),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(SimulationMode::from_str("TRACKING"), Ok(SimulationMode::Tracking));
        assert_eq!(SimulationMode::from_str("passive"), Ok(SimulationMode::Passive));
        assert!(SimulationMode::from_str("auto").is_err());
    }

    #[test]
    fn test_actuator_from_str() {
        assert_eq!(ActuatorType::from_str("pzt"), Ok(ActuatorType::Pzt));
        assert_eq!(ActuatorType::from_str("VCM"), Ok(ActuatorType::Vcm));
        assert!(ActuatorType::from_str("hydraulic").is_err());
    }

    #[test]
    fn test_quiet_keeps_gains() {
        let quiet = SimulationParameters::quiet();
        let defaults = SimulationParameters::default();
        assert_eq!(quiet.kp_gimbal, defaults.kp_gimbal);
        assert_eq!(quiet.kp_fsm, defaults.kp_fsm);
        assert!(quiet.intensities().iter().all(|(_, v)| *v == 0.0));
    }
}
