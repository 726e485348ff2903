//! # 幾何計算モジュール
//!
//! 載機姿勢とターゲット位置から理想的なジンバル角（方位角・仰角）を求め、
//! 関節角の連鎖（載機 → ジンバル方位 → ジンバル仰角 → FSMヨー → FSMピッチ）
//! から実際の指向ベクトルとLOS誤差を計算します。
//!
//! ## 座標系
//!
//! - 前方: +Z、上方: +Y、横方向: +X
//! - 載機姿勢は YXZ 順（ヨー → ピッチ → ロール）の内因性回転
//! - 仰角とFSMピッチは X軸まわりに符号反転して適用（仰角が正のとき指向が +Y 側へ向く）

use nalgebra::{UnitQuaternion, Vector3};

use crate::models::common::{Attitude, FsmAngles, GimbalAngles, math_utils::safe_asin};

/// ジンバル2軸の交点までの機体座標オフセット（m）
///
/// 視差誤差を避けるため、必ず回転軸の交点を基準にする。
pub const GIMBAL_OFFSET_M: [f64; 3] = [0.0, -1.2, 2.0];

/// 理想LOSの計算結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOfSight {
    /// 載機の姿勢クォータニオン
    pub platform: UnitQuaternion<f64>,
    /// ジンバル基点からターゲットへの単位ベクトル（ワールド座標）
    pub ideal_world: Vector3<f64>,
    /// 理想LOSの機体座標表現
    pub ideal_body: Vector3<f64>,
    /// 理想ジンバル角
    pub ideal_angles: GimbalAngles,
}

/// 載機・ジンバル・FSMの剛体運動学
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    /// 載機のワールド位置（m）
    pub aircraft_position: Vector3<f64>,
    /// ジンバル回転中心の機体座標オフセット（m）
    pub gimbal_offset: Vector3<f64>,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            aircraft_position: Vector3::zeros(),
            gimbal_offset: Vector3::from(GIMBAL_OFFSET_M),
        }
    }
}

impl Kinematics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 載機姿勢のクォータニオン
    ///
    /// YXZ 順で (−pitch, yaw, −roll) を合成する。
    pub fn platform_orientation(attitude: &Attitude) -> UnitQuaternion<f64> {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), attitude.yaw);
        let pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -attitude.pitch);
        let roll = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -attitude.roll);
        yaw * pitch * roll
    }

    /// ジンバル回転中心のワールド位置
    pub fn gimbal_mount_position(&self, platform: &UnitQuaternion<f64>) -> Vector3<f64> {
        platform * self.gimbal_offset + self.aircraft_position
    }

    /// 理想LOSと理想ジンバル角を計算
    pub fn line_of_sight(&self, attitude: &Attitude, target: &Vector3<f64>) -> LineOfSight {
        let platform = Self::platform_orientation(attitude);
        let mount = self.gimbal_mount_position(&platform);

        let ideal_world = (target - mount).normalize();
        let ideal_body = platform.inverse() * ideal_world;

        let ideal_angles = GimbalAngles::new(
            ideal_body.x.atan2(ideal_body.z),
            safe_asin(ideal_body.y),
        );

        LineOfSight {
            platform,
            ideal_world,
            ideal_body,
            ideal_angles,
        }
    }

    /// 関節角の連鎖から実際の指向ベクトル（ワールド座標、単位長）を計算
    ///
    /// 合成順は親 → 子: 載機, ジンバル方位(Y), ジンバル仰角(−X), FSMヨー(Y), FSMピッチ(−X)。
    pub fn pointing_vector(
        platform: &UnitQuaternion<f64>,
        gimbal: GimbalAngles,
        fsm: FsmAngles,
    ) -> Vector3<f64> {
        let gimbal_az = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), gimbal.az);
        let gimbal_el = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -gimbal.el);
        let fsm_yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), fsm.y);
        let fsm_pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -fsm.x);

        let total = platform * gimbal_az * gimbal_el * fsm_yaw * fsm_pitch;
        (total * Vector3::z()).normalize()
    }

    /// 2つの方向ベクトルのなす角（rad、[0, π]）
    ///
    /// acos より 0 と π 付近で安定な atan2(|a×b|, a·b) を使う。
    pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        a.cross(b).norm().atan2(a.dot(b))
    }

    /// 実際の指向とLOSの角度誤差
    pub fn los_error(
        line_of_sight: &LineOfSight,
        gimbal: GimbalAngles,
        fsm: FsmAngles,
    ) -> f64 {
        let pointing = Self::pointing_vector(&line_of_sight.platform, gimbal, fsm);
        Self::angle_between(&pointing, &line_of_sight.ideal_world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_level_platform_points_forward() {
        let pointing = Kinematics::pointing_vector(
            &UnitQuaternion::identity(),
            GimbalAngles::zero(),
            FsmAngles::zero(),
        );
        assert_abs_diff_eq!(pointing.x, 0.0);
        assert_abs_diff_eq!(pointing.y, 0.0);
        assert_abs_diff_eq!(pointing.z, 1.0);
    }

    #[test]
    fn test_positive_elevation_points_up() {
        let pointing = Kinematics::pointing_vector(
            &UnitQuaternion::identity(),
            GimbalAngles::new(0.0, 0.1),
            FsmAngles::zero(),
        );
        assert_abs_diff_eq!(pointing.y, 0.1_f64.sin(), epsilon = 1e-12);
        assert!(pointing.z > 0.0);
    }

    #[test]
    fn test_ideal_angles_reproduce_los() {
        let kin = Kinematics::new();
        let attitude = Attitude::new(0.05, -0.08, 0.12);
        let target = Vector3::new(140.0, 95.0, 2500.0);

        let los = kin.line_of_sight(&attitude, &target);
        let error = Kinematics::los_error(&los, los.ideal_angles, FsmAngles::zero());
        assert_abs_diff_eq!(error, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fsm_adds_to_gimbal_on_same_axis() {
        let kin = Kinematics::new();
        let target = Vector3::new(0.0, 20.0, 2000.0);
        let los = kin.line_of_sight(&Attitude::zero(), &target);

        let ideal = los.ideal_angles;
        let gimbal = GimbalAngles::new(ideal.az, ideal.el - 0.004);
        let fsm = FsmAngles::new(0.004, 0.0);
        let error = Kinematics::los_error(&los, gimbal, fsm);
        assert_abs_diff_eq!(error, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gimbal_mount_offset_is_rotated_by_platform() {
        let kin = Kinematics::new();
        let platform = Kinematics::platform_orientation(&Attitude::new(0.0, 0.0, std::f64::consts::PI));
        let mount = kin.gimbal_mount_position(&platform);
        assert_abs_diff_eq!(mount.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mount.y, -1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(mount.z, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_between_extremes() {
        let z = Vector3::z();
        assert_eq!(Kinematics::angle_between(&z, &z), 0.0);
        assert_abs_diff_eq!(
            Kinematics::angle_between(&z, &-z),
            std::f64::consts::PI,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            Kinematics::angle_between(&z, &Vector3::x()),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_elevation_never_nan() {
        let kin = Kinematics::new();
        // 真上のターゲット（機体Y成分が1付近）
        let los = kin.line_of_sight(&Attitude::zero(), &Vector3::new(0.0, 5000.0, 2.0));
        assert!(los.ideal_angles.el.is_finite());
        assert!(los.ideal_angles.az.is_finite());
    }
}
