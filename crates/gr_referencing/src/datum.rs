// georef\crates\gr_referencing\src/datum.rs

//! 基准面定义
//!
//! 基准面将坐标系统锚定到物理地球（或其他参考体/历元）。
//! 大地基准面携带椭球体、本初子午线与若干组面向具名目标
//! 基准面的 Bursa-Wolf 位移参数。
//!
//! # Bursa-Wolf 参数
//!
//! 7 参数模型（3 平移 + 3 旋转 + 1 尺度），在地心笛卡尔空间中
//! 完成基准面位移。旋转矩阵采用小角近似，支持 position vector
//! 与 coordinate frame 两种旋转约定（二者旋转角互为相反数）。

use crate::ellipsoid::Ellipsoid;
use crate::extent::GeographicBoundingBox;
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};

// ============================================================================
// 本初子午线
// ============================================================================

/// 本初子午线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimeMeridian {
    /// 名称
    pub name: String,
    /// 相对格林尼治的经度（度，向东为正）
    pub greenwich_longitude: f64,
}

impl PrimeMeridian {
    /// 格林尼治
    #[must_use]
    pub fn greenwich() -> Self {
        Self {
            name: "Greenwich".into(),
            greenwich_longitude: 0.0,
        }
    }

    /// 创建本初子午线
    #[must_use]
    pub fn new(name: impl Into<String>, greenwich_longitude: f64) -> Self {
        Self {
            name: name.into(),
            greenwich_longitude,
        }
    }

    /// 是否为格林尼治
    #[must_use]
    pub fn is_greenwich(&self) -> bool {
        self.greenwich_longitude == 0.0
    }
}

// ============================================================================
// Bursa-Wolf 位移参数
// ============================================================================

/// Bursa-Wolf 位移参数（7 参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BursaWolfParameters {
    /// X 平移 (m)
    pub tx: f64,
    /// Y 平移 (m)
    pub ty: f64,
    /// Z 平移 (m)
    pub tz: f64,
    /// X 旋转 (角秒)
    pub rx: f64,
    /// Y 旋转 (角秒)
    pub ry: f64,
    /// Z 旋转 (角秒)
    pub rz: f64,
    /// 尺度改正 (ppm)
    pub ds_ppm: f64,
    /// 有效域（无则视为全球）
    pub domain: Option<GeographicBoundingBox>,
    /// 经验精度 (m)
    pub accuracy: Option<f64>,
}

impl BursaWolfParameters {
    /// 仅平移的 3 参数位移
    #[must_use]
    pub fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self {
            tx,
            ty,
            tz,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
            ds_ppm: 0.0,
            domain: None,
            accuracy: None,
        }
    }

    /// 恒等位移（基准面不同但无经验参数时的占位）
    #[must_use]
    pub fn identity() -> Self {
        Self::translation(0.0, 0.0, 0.0)
    }

    /// 是否为恒等位移
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.tx == 0.0
            && self.ty == 0.0
            && self.tz == 0.0
            && self.is_translation_only()
    }

    /// 是否仅含平移（Molodensky 族只接受纯平移）
    #[must_use]
    pub fn is_translation_only(&self) -> bool {
        self.rx == 0.0 && self.ry == 0.0 && self.rz == 0.0 && self.ds_ppm == 0.0
    }

    /// 在给定兴趣区内是否有效
    #[must_use]
    pub fn covers(&self, aoi: Option<&GeographicBoundingBox>) -> bool {
        match (&self.domain, aoi) {
            (None, _) | (_, None) => true,
            (Some(domain), Some(aoi)) => domain.intersection(aoi).is_some(),
        }
    }

    /// Position vector 约定的 4×4 位移矩阵（小角近似）
    ///
    /// |  1+ds   -rz    ry   tx |
    /// |   rz   1+ds   -rx   ty |
    /// |  -ry    rx   1+ds   tz |
    #[must_use]
    pub fn position_vector_matrix(&self) -> Matrix {
        let s = 1.0 + self.ds_ppm * 1e-6;
        let rx = arcsec_to_rad(self.rx);
        let ry = arcsec_to_rad(self.ry);
        let rz = arcsec_to_rad(self.rz);

        let mut m = Matrix::identity(4);
        m.set(0, 0, s);
        m.set(0, 1, -rz);
        m.set(0, 2, ry);
        m.set(0, 3, self.tx);
        m.set(1, 0, rz);
        m.set(1, 1, s);
        m.set(1, 2, -rx);
        m.set(1, 3, self.ty);
        m.set(2, 0, -ry);
        m.set(2, 1, rx);
        m.set(2, 2, s);
        m.set(2, 3, self.tz);
        m
    }

    /// Coordinate frame 约定的 4×4 位移矩阵（旋转角取反）
    #[must_use]
    pub fn coordinate_frame_matrix(&self) -> Matrix {
        self.flip_rotation().position_vector_matrix()
    }

    /// 反向位移参数（小角近似下取负即可）
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
            ds_ppm: -self.ds_ppm,
            domain: self.domain,
            accuracy: self.accuracy,
        }
    }

    fn flip_rotation(&self) -> Self {
        Self {
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
            ..self.clone()
        }
    }
}

#[inline]
fn arcsec_to_rad(arcsec: f64) -> f64 {
    (arcsec / 3600.0).to_radians()
}

// ============================================================================
// 基准面
// ============================================================================

/// 大地基准面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodeticDatum {
    /// 名称
    pub name: String,
    /// 椭球体
    pub ellipsoid: Ellipsoid,
    /// 本初子午线
    pub prime_meridian: PrimeMeridian,
    /// 面向具名目标基准面的位移参数
    pub bursa_wolf: Vec<(String, BursaWolfParameters)>,
}

impl GeodeticDatum {
    /// 创建大地基准面（格林尼治本初子午线，无位移参数）
    #[must_use]
    pub fn new(name: impl Into<String>, ellipsoid: Ellipsoid) -> Self {
        Self {
            name: name.into(),
            ellipsoid,
            prime_meridian: PrimeMeridian::greenwich(),
            bursa_wolf: Vec::new(),
        }
    }

    /// WGS84 基准面
    #[must_use]
    pub fn wgs84() -> Self {
        Self::new("World Geodetic System 1984", Ellipsoid::WGS84)
    }

    /// 追加一组面向目标基准面的位移参数
    #[must_use]
    pub fn with_bursa_wolf(mut self, target: impl Into<String>, bw: BursaWolfParameters) -> Self {
        self.bursa_wolf.push((target.into(), bw));
        self
    }

    /// 忽略元数据（名称）的等价判断
    #[must_use]
    pub fn equals_ignore_metadata(&self, other: &Self) -> bool {
        self.ellipsoid == other.ellipsoid && self.prime_meridian.greenwich_longitude
            == other.prime_meridian.greenwich_longitude
    }

    /// 查找面向目标基准面、在兴趣区内有效的位移参数
    ///
    /// 先查本基准面的正向声明，再查目标基准面的反向声明。
    #[must_use]
    pub fn bursa_wolf_to(
        &self,
        target: &GeodeticDatum,
        aoi: Option<&GeographicBoundingBox>,
    ) -> Option<BursaWolfParameters> {
        for (name, bw) in &self.bursa_wolf {
            if name == &target.name && bw.covers(aoi) {
                return Some(bw.clone());
            }
        }
        for (name, bw) in &target.bursa_wolf {
            if name == &self.name && bw.covers(aoi) {
                return Some(bw.inverse());
            }
        }
        None
    }
}

/// 垂直基准面类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalDatumKind {
    /// 大地水准面（正高/海拔）
    Geoidal,
    /// 椭球面（椭球高）
    Ellipsoidal,
    /// 水深基准
    Depth,
}

/// 垂直基准面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalDatum {
    /// 名称
    pub name: String,
    /// 类别
    pub kind: VerticalDatumKind,
}

impl VerticalDatum {
    /// 创建垂直基准面
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VerticalDatumKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// 椭球高基准面
    #[must_use]
    pub fn ellipsoidal() -> Self {
        Self::new("Ellipsoid", VerticalDatumKind::Ellipsoidal)
    }

    /// 忽略元数据的等价判断
    #[must_use]
    pub fn equals_ignore_metadata(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// 时间基准面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalDatum {
    /// 名称
    pub name: String,
    /// 时间原点（Unix 纪元秒）
    pub origin: f64,
}

impl TemporalDatum {
    /// 创建时间基准面
    #[must_use]
    pub fn new(name: impl Into<String>, origin: f64) -> Self {
        Self {
            name: name.into(),
            origin,
        }
    }

    /// Unix 纪元
    #[must_use]
    pub fn unix_epoch() -> Self {
        Self::new("Unix epoch", 0.0)
    }

    /// 忽略元数据的等价判断
    #[must_use]
    pub fn equals_ignore_metadata(&self, other: &Self) -> bool {
        self.origin == other.origin
    }
}

/// 工程基准面（局地、与地球无固定关系）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringDatum {
    /// 名称
    pub name: String,
}

impl EngineeringDatum {
    /// 创建工程基准面
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// 忽略元数据的等价判断（工程基准面只有名义身份）
    #[must_use]
    pub fn equals_ignore_metadata(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

// ============================================================================
// 测试
// ============================================================================
