use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{SimulationParameters, DEFAULT_HISTORY_CAPACITY};

/// シナリオメタデータ
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "default".to_string(),
            description: "組み込みの既定シナリオ".to_string(),
        }
    }
}

/// 実行設定
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// 実行フレーム数
    pub frames: u64,
    /// 1フレームの経過時間（秒）
    pub frame_dt_s: f64,
    /// 乱数シード
    pub seed: u64,
    /// 履歴バッファの容量
    pub history_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_dt_s: 1.0 / 60.0,
            seed: 0,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// 完全なシナリオ設定
///
/// すべての項目に既定値があり、一部だけを書いたYAMLも受け付けます。
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub run: RunConfig,
    pub params: SimulationParameters,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.run.frame_dt_s.is_finite() || self.run.frame_dt_s <= 0.0 {
            return Err(ScenarioError::Validation("frame_dt_s must be positive".to_string()));
        }
        if self.run.frames == 0 {
            return Err(ScenarioError::Validation("frames must be positive".to_string()));
        }
        if self.run.history_capacity == 0 {
            return Err(ScenarioError::Validation("history_capacity must be positive".to_string()));
        }

        for (name, value) in self.params.scalars() {
            if !value.is_finite() {
                return Err(ScenarioError::Validation(format!("{} must be finite (got {})", name, value)));
            }
        }
        if self.params.target_distance <= 0.0 {
            return Err(ScenarioError::Validation("target_distance must be positive".to_string()));
        }

        for (name, value) in self.params.intensities() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::Validation(format!(
                    "{} must be within [0, 1] (got {})",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        let p = &self.params;

        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== 実行設定 ===");
        println!("フレーム数: {}", self.run.frames);
        println!("フレーム時間: {:.4}秒", self.run.frame_dt_s);
        println!("総時間: {:.2}秒", self.run.frames as f64 * self.run.frame_dt_s);
        println!("シード値: {}", self.run.seed);
        println!("履歴容量: {}", self.run.history_capacity);
        println!();

        println!("=== 制御設定 ===");
        println!("モード: {}", p.mode);
        println!("FSMアクチュエータ: {}", p.actuator_type);
        println!("ジンバルゲイン: {:.2}", p.kp_gimbal);
        println!("FSMゲイン: {:.2}", p.kp_fsm);
        println!();

        println!("=== 外乱設定 ===");
        println!("機動: {:.2}Hz / {:.1}°", p.disturbance_freq, p.disturbance_amp.to_degrees());
        println!("ターゲット: {:.1}km (速度倍率 {:.1}x)", p.target_distance / 1000.0, p.target_speed);
        for (name, value) in p.intensities() {
            println!("  {}: {:.0}%", name, value * 100.0);
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {path}", path = .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {path}: {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {path}: {1}", path = .0.display())]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
}
