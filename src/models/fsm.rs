use rand::Rng;

use crate::models::{
    actuator::FsmActuator,
    common::{FsmAngles, HysteresisState},
    context::SimulationContext,
    params::{SimulationMode, SimulationParameters},
    traits::{ActuatorInput, IActuator, IControlLoop},
};

/// FSM制御周波数（Hz）
pub const FSM_RATE_HZ: f64 = 500.0;
/// FSMの機械的可動限界（rad）
pub const FSM_LIMIT_RAD: f64 = 0.025;
/// TRACKING以外でのセンタリング保持率
pub const FSM_CENTERING_RETENTION: f64 = 0.9;

/// FSM制御ループ（500Hz 比例制御）
///
/// ジンバルが補正しきれなかった残差を指令値として追従します。
/// 駆動素子ごとの外乱は [`FsmActuator`] が計算し、PZTのヒステリシス状態は
/// アクチュエータ内部に保持されます。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FsmLoop {
    /// 実際のFSM角（常に ±FSM_LIMIT_RAD 以内）
    pub angles: FsmAngles,
    /// 駆動素子モデル
    pub actuator: FsmActuator,
    /// 前回サブステップの指令値（PZTの入力変化率の計算に使う）
    pub last_command: FsmAngles,
}

impl FsmLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hysteresis_state(&self) -> HysteresisState {
        self.actuator.hysteresis_state()
    }

    /// 未モデル化動特性を模したゲイン摂動
    ///
    /// 基本ゲインを ±(parameter_uncertainty × 0.2) の範囲で一様にずらす。
    /// 乱数は不確かさが0でも1回引く。
    pub fn effective_gain<R: Rng + ?Sized>(params: &SimulationParameters, rng: &mut R) -> f64 {
        let jitter: f64 = rng.gen_range(-1.0..1.0);
        params.kp_fsm * (1.0 + params.parameter_uncertainty * 0.2 * jitter)
    }
}

impl IControlLoop for FsmLoop {
    type Command = FsmAngles;

    fn rate_hz(&self) -> f64 {
        FSM_RATE_HZ
    }

    fn update(
        &mut self,
        residual: FsmAngles,
        params: &SimulationParameters,
        ctx: &mut SimulationContext,
    ) {
        self.actuator.ensure_type(params.actuator_type);

        if params.mode != SimulationMode::Tracking {
            self.angles = self.angles.scale(FSM_CENTERING_RETENTION);
            self.last_command = FsmAngles::zero();
            return;
        }

        let input = ActuatorInput {
            command: residual,
            previous_command: self.last_command,
            time: ctx.time,
            dt: self.step_interval(),
        };
        let disturbance = self.actuator.disturbance(&input, params);
        let gain = Self::effective_gain(params, &mut ctx.rng);

        let correction = (residual - self.angles).scale(gain) + disturbance;
        self.angles = (self.angles + correction).clamp(FSM_LIMIT_RAD);
        self.last_command = residual;
    }

    fn reset(&mut self) {
        *self = Self {
            actuator: FsmActuator::for_type(self.actuator.actuator_type()),
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::params::ActuatorType;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tracking(actuator: ActuatorType) -> SimulationParameters {
        SimulationParameters::default()
            .with_mode(SimulationMode::Tracking)
            .with_actuator(actuator)
    }

    #[test]
    fn test_angles_stay_within_hard_limit() {
        let mut rng = StdRng::seed_from_u64(99);
        for actuator in [ActuatorType::Vcm, ActuatorType::Pzt] {
            let mut fsm = FsmLoop::new();
            let mut ctx = SimulationContext::new(3);
            let params = SimulationParameters {
                pzt_hysteresis: 1.0,
                vcm_ripple: 1.0,
                parameter_uncertainty: 1.0,
                kp_fsm: 3.0,
                ..tracking(actuator)
            };
            for i in 0..2000 {
                ctx.time = i as f64 / FSM_RATE_HZ;
                let residual = FsmAngles::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                fsm.update(residual, &params, &mut ctx);
                assert!(fsm.angles.x.abs() <= FSM_LIMIT_RAD);
                assert!(fsm.angles.y.abs() <= FSM_LIMIT_RAD);
            }
        }
    }

    #[test]
    fn test_switch_to_vcm_resets_hysteresis_in_one_step() {
        let mut fsm = FsmLoop::new();
        let mut ctx = SimulationContext::new(5);
        let pzt = SimulationParameters {
            pzt_hysteresis: 1.0,
            ..tracking(ActuatorType::Pzt)
        };
        for i in 0..20 {
            let residual = FsmAngles::new(0.001 * i as f64, -0.0005 * i as f64);
            fsm.update(residual, &pzt, &mut ctx);
        }
        assert!(!fsm.hysteresis_state().is_zero());

        let vcm = tracking(ActuatorType::Vcm);
        fsm.update(FsmAngles::new(0.01, 0.0), &vcm, &mut ctx);
        assert_eq!(fsm.hysteresis_state(), HysteresisState::zero());
    }

    #[test]
    fn test_non_tracking_centers_and_keeps_hysteresis() {
        let mut fsm = FsmLoop::new();
        let mut ctx = SimulationContext::new(5);
        let pzt = SimulationParameters {
            pzt_hysteresis: 1.0,
            ..tracking(ActuatorType::Pzt)
        };
        for i in 0..10 {
            fsm.update(FsmAngles::new(0.0003 * i as f64, 0.0), &pzt, &mut ctx);
        }
        let hysteresis = fsm.hysteresis_state();
        let start = fsm.angles;

        let stabilized = SimulationParameters {
            mode: SimulationMode::Stabilized,
            ..pzt
        };
        fsm.update(FsmAngles::new(0.02, 0.02), &stabilized, &mut ctx);
        assert_abs_diff_eq!(fsm.angles.x, start.x * 0.9);
        assert_abs_diff_eq!(fsm.angles.y, start.y * 0.9);
        assert_eq!(fsm.hysteresis_state(), hysteresis);
        assert_eq!(fsm.last_command, FsmAngles::zero());
    }

    #[test]
    fn test_vcm_tracks_residual_without_disturbance() {
        let mut fsm = FsmLoop::new();
        let mut ctx = SimulationContext::new(0);
        let params = SimulationParameters::quiet()
            .with_mode(SimulationMode::Tracking)
            .with_actuator(ActuatorType::Vcm);
        let residual = FsmAngles::new(0.004, -0.006);
        for _ in 0..50 {
            fsm.update(residual, &params, &mut ctx);
        }
        assert_abs_diff_eq!(fsm.angles.x, residual.x, epsilon = 1e-12);
        assert_abs_diff_eq!(fsm.angles.y, residual.y, epsilon = 1e-12);
    }

    #[test]
    fn test_effective_gain_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = SimulationParameters {
            kp_fsm: 1.0,
            parameter_uncertainty: 0.5,
            ..SimulationParameters::default()
        };
        for _ in 0..1000 {
            let gain = FsmLoop::effective_gain(&params, &mut rng);
            assert!((0.9..=1.1).contains(&gain));
        }

        let exact = SimulationParameters {
            parameter_uncertainty: 0.0,
            ..params
        };
        assert_eq!(FsmLoop::effective_gain(&exact, &mut rng), 1.0);
    }

    #[test]
    fn test_reset_keeps_actuator_type() {
        let mut fsm = FsmLoop::new();
        let mut ctx = SimulationContext::new(0);
        fsm.update(FsmAngles::new(0.01, 0.01), &tracking(ActuatorType::Pzt), &mut ctx);
        fsm.reset();
        assert_eq!(fsm.angles, FsmAngles::zero());
        assert!(fsm.hysteresis_state().is_zero());
        assert_eq!(fsm.actuator.actuator_type(), ActuatorType::Pzt);
    }
}
