use nalgebra::Vector3;

use crate::models::params::SimulationParameters;

/// 運動振幅の基準距離（m）
pub const BASELINE_DISTANCE_M: f64 = 2000.0;
/// ターゲットの基準高度（m）
pub const BASE_ALTITUDE_M: f64 = 20.0;

/// ターゲット運動モデル
///
/// 前方 `target_distance` の位置で水平（X）・垂直（Y）方向に正弦運動します。
/// 振幅は基準距離 2000m に対する距離比で拡大され、角度としての見かけの
/// 運動量が距離によらずほぼ一定になります。奥行き（Z）方向の運動はありません。
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetMotion;

impl TargetMotion {
    pub fn new() -> Self {
        Self
    }

    /// 時刻 `t` におけるターゲットのワールド座標
    pub fn position(&self, t: f64, params: &SimulationParameters) -> Vector3<f64> {
        let distance_scale = params.target_distance / BASELINE_DISTANCE_M;
        let x = 150.0 * distance_scale * (t * params.target_speed * 0.5).sin();
        let y = BASE_ALTITUDE_M + 120.0 * distance_scale * (t * params.target_speed * 0.3).sin();
        Vector3::new(x, y, params.target_distance)
    }
}
