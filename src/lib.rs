//! 電子光学照準（EO/IR）ジンバル・FSM 二段安定化シミュレータ
//!
//! 載機外乱を受けるジンバル（50Hz）と高速ステアリングミラー（500Hz）の
//! 多重レート制御ループを固定刻みで積分し、視線（LOS）誤差を評価します。

pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
