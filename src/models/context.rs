use rand::SeedableRng;
use rand::rngs::StdRng;

/// 1ティック分の可変コンテキスト
///
/// シミュレーションエンジンが唯一の所有者で、各コンポーネントの更新処理に
/// 参照で渡されます。乱数源はシード付きで、同じシードと同じ入力列からは
/// ビット単位で同一の結果が得られます。
#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// 現在のシミュレーション時刻（秒）
    pub time: f64,
    /// 乱流・ゲイン摂動用の乱数源
    pub rng: StdRng,
    /// 乱数源の初期シード（リセット用）
    pub seed: u64,
}

impl SimulationContext {
    pub fn new(seed: u64) -> Self {
        Self {
            time: 0.0,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// 時刻と乱数源を初期状態に戻す
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
