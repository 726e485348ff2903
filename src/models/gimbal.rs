use crate::models::{
    common::{GimbalAngles, math_utils::{phase, sign}},
    context::SimulationContext,
    params::{SimulationMode, SimulationParameters},
    traits::IControlLoop,
};

/// ジンバル制御周波数（Hz）
pub const GIMBAL_RATE_HZ: f64 = 50.0;

/// ジンバル制御ループ（50Hz 比例制御）
///
/// PASSIVE では摩擦による減衰のみ、それ以外では理想角への比例補正に
/// モータトルクリップル・非線形摩擦・未配平トルクの外乱を加えて積分します。
/// FSMと違い角度の機械的制限はありません。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GimbalLoop {
    /// 実際のジンバル角
    pub angles: GimbalAngles,
}

/// サーボ層の外乱（角速度、rad/s）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoDisturbance {
    pub ripple: GimbalAngles,
    pub friction: GimbalAngles,
    pub unbalance: GimbalAngles,
}

impl GimbalLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// PASSIVE時の1ステップあたりの保持率（摩擦が強いほど速く減衰）
    pub fn passive_retention(params: &SimulationParameters) -> f64 {
        0.98 - params.nonlinear_friction * 0.02
    }

    /// 非線形摩擦（LuGreモデルの簡略版）
    ///
    /// 誤差の奇関数で、誤差0で0、大誤差で飽和する。
    pub fn friction(error: f64, params: &SimulationParameters) -> f64 {
        params.nonlinear_friction * 0.0005 * sign(error) * (1.0 - (-error.abs() * 100.0).exp())
    }

    /// 時刻 `t`・追従誤差 `error` に対するサーボ層外乱
    pub fn servo_disturbance(
        t: f64,
        error: GimbalAngles,
        params: &SimulationParameters,
    ) -> ServoDisturbance {
        let ripple_scale = params.motor_torque_ripple;
        let unbalance_scale = params.unbalanced_torque;

        ServoDisturbance {
            ripple: GimbalAngles::new(
                ripple_scale * 0.001 * phase(70.0, t).sin(),
                ripple_scale * 0.001 * phase(75.0, t).cos(),
            ),
            friction: GimbalAngles::new(
                Self::friction(error.az, params),
                Self::friction(error.el, params),
            ),
            unbalance: GimbalAngles::new(
                unbalance_scale * 0.002 * phase(0.5, t).sin(),
                unbalance_scale * 0.0015 * phase(0.3, t).cos(),
            ),
        }
    }
}

impl IControlLoop for GimbalLoop {
    type Command = GimbalAngles;

    fn rate_hz(&self) -> f64 {
        GIMBAL_RATE_HZ
    }

    fn update(
        &mut self,
        ideal: GimbalAngles,
        params: &SimulationParameters,
        ctx: &mut SimulationContext,
    ) {
        if params.mode == SimulationMode::Passive {
            self.angles = self.angles.scale(Self::passive_retention(params));
            return;
        }

        let dt = self.step_interval();
        let error = ideal - self.angles;
        let gain = params.kp_gimbal * GIMBAL_RATE_HZ;
        let d = Self::servo_disturbance(ctx.time, error, params);

        self.angles.az +=
            (error.az * gain + d.ripple.az - d.friction.az + d.unbalance.az) * dt;
        self.angles.el +=
            (error.el * gain + d.ripple.el - d.friction.el + d.unbalance.el) * dt;
    }

    fn reset(&mut self) {
        self.angles = GimbalAngles::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_friction_is_odd_and_saturating() {
        let params = SimulationParameters {
            nonlinear_friction: 1.0,
            ..SimulationParameters::default()
        };
        assert_eq!(GimbalLoop::friction(0.0, &params), 0.0);
        assert_abs_diff_eq!(
            GimbalLoop::friction(0.01, &params),
            -GimbalLoop::friction(-0.01, &params)
        );
        assert_abs_diff_eq!(GimbalLoop::friction(10.0, &params), 0.0005, epsilon = 1e-12);
        assert!(GimbalLoop::friction(1e-4, &params) < GimbalLoop::friction(1e-2, &params));
    }

    #[test]
    fn test_passive_decays_toward_zero() {
        let mut gimbal = GimbalLoop {
            angles: GimbalAngles::new(0.2, -0.1),
        };
        let params = SimulationParameters::default();
        let mut ctx = SimulationContext::new(0);

        let mut previous = gimbal.angles;
        for _ in 0..50 {
            gimbal.update(GimbalAngles::new(1.0, 1.0), &params, &mut ctx);
            assert!(gimbal.angles.az.abs() < previous.az.abs());
            assert!(gimbal.angles.el.abs() < previous.el.abs());
            previous = gimbal.angles;
        }
    }

    #[test]
    fn test_stronger_friction_decays_faster() {
        let weak = SimulationParameters {
            nonlinear_friction: 0.0,
            ..SimulationParameters::default()
        };
        let strong = SimulationParameters {
            nonlinear_friction: 1.0,
            ..SimulationParameters::default()
        };
        assert!(GimbalLoop::passive_retention(&strong) < GimbalLoop::passive_retention(&weak));
    }

    #[test]
    fn test_tracking_converges_to_ideal() {
        let mut gimbal = GimbalLoop::new();
        let params = SimulationParameters::quiet().with_mode(SimulationMode::Stabilized);
        let mut ctx = SimulationContext::new(0);
        let ideal = GimbalAngles::new(0.05, -0.03);

        for _ in 0..200 {
            gimbal.update(ideal, &params, &mut ctx);
        }
        assert_abs_diff_eq!(gimbal.angles.az, ideal.az, epsilon = 1e-9);
        assert_abs_diff_eq!(gimbal.angles.el, ideal.el, epsilon = 1e-9);
    }

    #[test]
    fn test_single_step_matches_proportional_law() {
        let mut gimbal = GimbalLoop::new();
        let params = SimulationParameters::quiet().with_mode(SimulationMode::Tracking);
        let mut ctx = SimulationContext::new(0);
        gimbal.update(GimbalAngles::new(0.1, 0.0), &params, &mut ctx);
        // 誤差 × (kp × 50) × (1/50) = 0.1 × 0.2
        assert_abs_diff_eq!(gimbal.angles.az, 0.02, epsilon = 1e-15);
        assert_eq!(gimbal.angles.el, 0.0);
    }
}
