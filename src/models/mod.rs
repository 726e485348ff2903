// 基本的なデータ型と数学ユーティリティ
pub mod common;

// パラメータとモード定義
pub mod params;

// 1ティック分の可変コンテキスト（乱数源・時刻）
pub mod context;

// 制御ループ・アクチュエータの基本インターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod disturbance;
pub mod target;
pub mod kinematics;
pub mod gimbal;
pub mod actuator;
pub mod fsm;
pub mod state;

// 便利な re-export
pub use common::*;
pub use params::{ActuatorType, SimulationMode, SimulationParameters};
pub use context::SimulationContext;
pub use traits::*;
pub use disturbance::DisturbanceSynthesizer;
pub use target::TargetMotion;
pub use kinematics::{Kinematics, LineOfSight};
pub use gimbal::{GimbalLoop, ServoDisturbance, GIMBAL_RATE_HZ};
pub use actuator::{FsmActuator, PztActuator, VcmActuator};
pub use fsm::{FsmLoop, FSM_LIMIT_RAD, FSM_RATE_HZ};
pub use state::{HistoryBuffer, SystemState, DEFAULT_HISTORY_CAPACITY, HISTORY_INTERVAL_S};
