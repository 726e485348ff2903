use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// 載機の姿勢（オイラー角）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,  // rad
    pub pitch: f64, // rad
    pub yaw: f64,   // rad
}

impl Attitude {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

impl Add for Attitude {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(
            self.roll + other.roll,
            self.pitch + other.pitch,
            self.yaw + other.yaw,
        )
    }
}

/// ジンバル2軸の角度（方位角・仰角）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GimbalAngles {
    pub az: f64, // rad
    pub el: f64, // rad
}

impl GimbalAngles {
    pub fn new(az: f64, el: f64) -> Self {
        Self { az, el }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// 各軸に同じ係数を掛ける（減衰処理用）
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.az * factor, self.el * factor)
    }
}

impl Sub for GimbalAngles {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.az - other.az, self.el - other.el)
    }
}

/// FSMミラー2軸の角度
///
/// X軸はピッチ（仰角方向）、Y軸はヨー（方位角方向）を補正します。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FsmAngles {
    pub x: f64, // rad
    pub y: f64, // rad
}

impl FsmAngles {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// ジンバルの残差（方位角・仰角）をFSM軸へ割り当てる
    pub fn from_gimbal_residual(residual: GimbalAngles) -> Self {
        Self::new(residual.el, residual.az)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// 各軸を ±limit に制限
    pub fn clamp(&self, limit: f64) -> Self {
        Self::new(self.x.clamp(-limit, limit), self.y.clamp(-limit, limit))
    }
}

impl Add for FsmAngles {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for FsmAngles {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// PZTヒステリシス（Bouc-Wenモデル）の内部状態
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HysteresisState {
    pub hx: f64,
    pub hy: f64,
}

impl HysteresisState {
    pub fn new(hx: f64, hy: f64) -> Self {
        Self { hx, hy }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.hx == 0.0 && self.hy == 0.0
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    use std::f64::consts::PI;

    /// 符号関数（sign(0) = 0）
    ///
    /// `f64::signum` は +0.0 に対して 1.0 を返すため摩擦項には使えない。
    pub fn sign(value: f64) -> f64 {
        if value > 0.0 {
            1.0
        } else if value < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    /// 周波数 [Hz] と時刻 [s] から位相 2πft を計算
    pub fn phase(freq_hz: f64, t: f64) -> f64 {
        2.0 * PI * freq_hz * t
    }

    /// asinの入力を[-1, 1]に制限して計算
    pub fn safe_asin(value: f64) -> f64 {
        value.clamp(-1.0, 1.0).asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_of_zero_is_zero() {
        assert_eq!(math_utils::sign(0.0), 0.0);
        assert_eq!(math_utils::sign(-0.0), 0.0);
        assert_eq!(math_utils::sign(1e-300), 1.0);
        assert_eq!(math_utils::sign(-3.0), -1.0);
    }

    #[test]
    fn test_safe_asin_clamps_overshoot() {
        assert_eq!(math_utils::safe_asin(1.0 + 1e-12), std::f64::consts::FRAC_PI_2);
        assert_eq!(math_utils::safe_asin(-1.0 - 1e-12), -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_fsm_axes_follow_gimbal_residual() {
        let residual = GimbalAngles::new(0.01, -0.02);
        let fsm = FsmAngles::from_gimbal_residual(residual);
        assert_eq!(fsm, FsmAngles::new(-0.02, 0.01));
    }

    #[test]
    fn test_fsm_clamp() {
        let fsm = FsmAngles::new(0.5, -0.5).clamp(0.025);
        assert_eq!(fsm, FsmAngles::new(0.025, -0.025));
    }
}
