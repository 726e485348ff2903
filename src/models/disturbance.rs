//! # 載機外乱モデル
//!
//! 載機プラットフォームの姿勢変動（ロール・ピッチ・ヨー）を時刻 `t` の関数として
//! 合成します。以下の独立した外乱源を加算します。
//!
//! 1. **機動**: 基本周波数とその倍率による正弦波運動
//! 2. **大気乱流**: 乱数による乗算ジッタを固定周波数の正弦波で変調
//! 3. **突風**: 4秒周期の前半にだけ現れる 1−cos パルス（ロール・ピッチのみ）
//! 4. **機体振動**: 15Hz 主成分と高調波

use rand::Rng;

use crate::models::{
    common::{Attitude, math_utils::phase},
    params::SimulationParameters,
};

/// 機体振動の主周波数（Hz）
pub const VIBRATION_FREQ_HZ: f64 = 15.0;
/// 突風の周期（秒）
pub const GUST_PERIOD_S: f64 = 4.0;

/// 載機外乱の合成器
#[derive(Debug, Clone, Copy, Default)]
pub struct DisturbanceSynthesizer;

impl DisturbanceSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// 時刻 `t` における全外乱の合計
    pub fn sample<R: Rng + ?Sized>(
        &self,
        t: f64,
        params: &SimulationParameters,
        rng: &mut R,
    ) -> Attitude {
        self.maneuver(t, params)
            + self.turbulence(t, params, rng)
            + self.gust(t, params)
            + self.vibration(t, params)
    }

    /// 機動による低周波の姿勢変動
    pub fn maneuver(&self, t: f64, params: &SimulationParameters) -> Attitude {
        let amp = params.disturbance_amp;
        let freq = params.disturbance_freq;

        Attitude::new(
            amp * phase(freq, t).sin(),
            0.5 * amp * phase(freq * 0.8, t).cos(),
            0.3 * amp * (t * 0.5).sin(),
        )
    }

    /// 大気乱流（Drydenモデルの簡略版）
    ///
    /// 呼び出しごとに乱数を3回引きます。強度が0でも引くので、
    /// 乱数列の消費は強度に依存しません。
    pub fn turbulence<R: Rng + ?Sized>(
        &self,
        t: f64,
        params: &SimulationParameters,
        rng: &mut R,
    ) -> Attitude {
        let scale = params.atmospheric_turbulence;
        let jitter_roll: f64 = rng.gen_range(-0.5..0.5);
        let jitter_pitch: f64 = rng.gen_range(-0.5..0.5);
        let jitter_yaw: f64 = rng.gen_range(-0.5..0.5);

        Attitude::new(
            scale * 0.02 * jitter_roll * phase(2.5, t).sin(),
            scale * 0.015 * jitter_pitch * phase(3.2, t).cos(),
            scale * 0.01 * jitter_yaw * phase(1.8, t).sin(),
        )
    }

    /// 突風（1−cosモデル）
    pub fn gust(&self, t: f64, params: &SimulationParameters) -> Attitude {
        let gust_phase = t.rem_euclid(GUST_PERIOD_S) / GUST_PERIOD_S;
        if gust_phase >= 0.5 {
            return Attitude::zero();
        }

        let scale = params.wind_gust_intensity;
        let factor = 0.5 * (1.0 - (4.0 * std::f64::consts::PI * gust_phase).cos());
        Attitude::new(scale * 0.03 * factor, scale * 0.025 * factor, 0.0)
    }

    /// 機体振動（多調波モデル）
    pub fn vibration(&self, t: f64, params: &SimulationParameters) -> Attitude {
        let scale = params.aircraft_vibration;
        let f = VIBRATION_FREQ_HZ;

        let primary = Attitude::new(
            scale * 0.008 * phase(f, t).sin(),
            scale * 0.006 * phase(f, t).cos(),
            scale * 0.004 * phase(f * 1.2, t).sin(),
        );
        let harmonics = Attitude::new(
            scale * 0.003 * phase(f * 3.0, t).sin(),
            scale * 0.002 * phase(f * 5.0, t).cos(),
            0.0,
        );
        primary + harmonics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn no_layers() -> SimulationParameters {
        SimulationParameters {
            atmospheric_turbulence: 0.0,
            wind_gust_intensity: 0.0,
            aircraft_vibration: 0.0,
            ..SimulationParameters::default()
        }
    }

    #[test]
    fn test_zero_scales_leave_only_maneuver() {
        let synth = DisturbanceSynthesizer::new();
        let params = no_layers();
        let mut rng = StdRng::seed_from_u64(7);

        for i in 0..500 {
            let t = i as f64 * 0.037;
            assert_eq!(synth.turbulence(t, &params, &mut rng), Attitude::zero());
            assert_eq!(synth.gust(t, &params), Attitude::zero());
            assert_eq!(synth.vibration(t, &params), Attitude::zero());

            let total = synth.sample(t, &params, &mut rng);
            assert_eq!(total, synth.maneuver(t, &params));
        }
    }

    #[test]
    fn test_gust_is_zero_in_second_half_of_period() {
        let synth = DisturbanceSynthesizer::new();
        let params = SimulationParameters {
            wind_gust_intensity: 1.0,
            ..SimulationParameters::default()
        };

        for period in 0..5 {
            let base = period as f64 * GUST_PERIOD_S;
            for i in 0..200 {
                let t = base + i as f64 * (GUST_PERIOD_S / 200.0);
                let gust = synth.gust(t, &params);
                let phase = t.rem_euclid(GUST_PERIOD_S) / GUST_PERIOD_S;
                if phase >= 0.5 {
                    assert_eq!(gust, Attitude::zero(), "t = {}", t);
                } else {
                    assert!(gust.roll >= 0.0 && gust.pitch >= 0.0, "t = {}", t);
                    assert_eq!(gust.yaw, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_gust_peaks_at_quarter_period() {
        let synth = DisturbanceSynthesizer::new();
        let params = SimulationParameters {
            wind_gust_intensity: 1.0,
            ..SimulationParameters::default()
        };
        let gust = synth.gust(1.0, &params);
        assert_abs_diff_eq!(gust.roll, 0.03, epsilon = 1e-12);
        assert_abs_diff_eq!(gust.pitch, 0.025, epsilon = 1e-12);
    }

    #[test]
    fn test_maneuver_at_time_zero() {
        let synth = DisturbanceSynthesizer::new();
        let params = SimulationParameters::default();
        let m = synth.maneuver(0.0, &params);
        assert_abs_diff_eq!(m.roll, 0.0);
        assert_abs_diff_eq!(m.pitch, 0.5 * params.disturbance_amp);
        assert_abs_diff_eq!(m.yaw, 0.0);
    }

    #[test]
    fn test_turbulence_is_bounded() {
        let synth = DisturbanceSynthesizer::new();
        let params = SimulationParameters {
            atmospheric_turbulence: 1.0,
            ..SimulationParameters::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        for i in 0..1000 {
            let turb = synth.turbulence(i as f64 * 0.01, &params, &mut rng);
            assert!(turb.roll.abs() <= 0.01);
            assert!(turb.pitch.abs() <= 0.0075);
            assert!(turb.yaw.abs() <= 0.005);
        }
    }
}
