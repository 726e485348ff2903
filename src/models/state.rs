use std::collections::VecDeque;

use nalgebra::Vector3;
use tracing::trace;

use crate::models::common::{Attitude, FsmAngles, GimbalAngles, HysteresisState};

/// 履歴バッファの既定容量
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
/// 履歴追加の最小間隔（シミュレーション時間、秒）
pub const HISTORY_INTERVAL_S: f64 = 0.05;

/// システム状態のスナップショット
///
/// 1ティックごとに新しく作られ、描画やUIなど下流の利用者には
/// 不変の値として渡されます。
#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    /// シミュレーション時刻（秒）
    pub time: f64,
    /// 載機姿勢（外乱）
    pub aircraft_attitude: Attitude,
    /// ジンバル実角
    pub gimbal_angle: GimbalAngles,
    /// ジンバル指令角（理想角）
    pub gimbal_command: GimbalAngles,
    /// FSM実角
    pub fsm_angle: FsmAngles,
    /// FSM指令角（TRACKING時のジンバル残差、それ以外は0）
    pub fsm_command: FsmAngles,
    /// PZTヒステリシス内部状態（VCM時は常に0）
    pub fsm_hysteresis_state: HysteresisState,
    /// ターゲット位置（m）
    pub target_position: Vector3<f64>,
    /// LOS誤差（rad）
    pub error: f64,
    /// 予約済みの制御信号（常に0）
    pub control_signal: GimbalAngles,
}

impl SystemState {
    /// 初期状態: 運動学はすべて0、ターゲットは前方 2000m
    pub fn initial() -> Self {
        Self {
            time: 0.0,
            aircraft_attitude: Attitude::zero(),
            gimbal_angle: GimbalAngles::zero(),
            gimbal_command: GimbalAngles::zero(),
            fsm_angle: FsmAngles::zero(),
            fsm_command: FsmAngles::zero(),
            fsm_hysteresis_state: HysteresisState::zero(),
            target_position: Vector3::new(0.0, 5.0, 2000.0),
            error: 0.0,
            control_signal: GimbalAngles::zero(),
        }
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::initial()
    }
}

/// 容量制限付きの状態履歴（古いものから破棄）
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<SystemState>,
    capacity: usize,
}

impl HistoryBuffer {
    /// 容量0は1として扱う
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&SystemState> {
        self.entries.back()
    }

    /// 古い順のイテレータ
    pub fn iter(&self) -> impl Iterator<Item = &SystemState> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<SystemState> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 無条件に追加し、容量を超えた分を先頭から破棄
    pub fn push(&mut self, state: SystemState) {
        self.entries.push_back(state);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(evicted_time = evicted.time, "履歴の最古エントリを破棄しました");
            }
        }
    }

    /// 直前の追加から HISTORY_INTERVAL_S 以上経過していれば追加
    ///
    /// 履歴が空のときは時刻0を基準にする。追加したら true。
    pub fn push_throttled(&mut self, state: &SystemState) -> bool {
        let last_time = self.latest().map(|s| s.time).unwrap_or(0.0);
        if state.time - last_time >= HISTORY_INTERVAL_S {
            self.push(state.clone());
            true
        } else {
            false
        }
    }

    /// 履歴ウィンドウ内のLOS誤差の二乗平均平方根（rad、空なら0）
    pub fn rms_error(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.entries.iter().map(|s| s.error * s.error).sum();
        (sum_sq / self.entries.len() as f64).sqrt()
    }

    /// 履歴ウィンドウ内の最大LOS誤差（rad、空なら0）
    pub fn peak_error(&self) -> f64 {
        self.entries.iter().map(|s| s.error).fold(0.0, f64::max)
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
