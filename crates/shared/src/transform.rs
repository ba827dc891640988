//! Перевод трансформации из единиц просмотрщика в единицы целевого движка.
//!
//! Константы откалиброваны под соглашения двух движков и являются частью контракта.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Трёхкомпонентный вектор (x, y, z)
pub type Vec3 = [f64; 3];

/// Множитель позиции: просмотрщик -> целевое пространство
pub const POSITION_SCALE: f64 = 5.3;

/// Делитель значения ползунка масштаба
pub const SCALE_DIVISOR: f64 = 533.34;

/// Ошибки разбора трансформации
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("invalid vector '{0}': expected three comma-separated numbers")]
    InvalidVector(String),
    #[error("invalid scalar '{0}'")]
    InvalidScalar(String),
    #[error("{0} contains a non-finite value")]
    NonFinite(&'static str),
}

/// Флаги перестановки осей Y и Z для групп позиции и вращения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisFlip {
    #[serde(default)]
    pub position: bool,
    #[serde(default)]
    pub rotation: bool,
}

/// Трансформация в пространстве просмотрщика (ввод пользователя)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub position: Vec3,
    /// Градусы
    pub rotation: Vec3,
    /// Значение ползунка масштаба
    pub scale: f64,
    #[serde(default)]
    pub flip: AxisFlip,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: SCALE_DIVISOR,
            flip: AxisFlip::default(),
        }
    }
}

impl TransformSpec {
    pub fn new(position: Vec3, rotation: Vec3, scale: f64) -> Self {
        Self {
            position,
            rotation,
            scale,
            flip: AxisFlip::default(),
        }
    }

    pub fn with_flip(mut self, flip: AxisFlip) -> Self {
        self.flip = flip;
        self
    }

    /// Клиент уже переставил оси, повторно не переставляем
    pub fn already_swapped(mut self) -> Self {
        self.flip = AxisFlip::default();
        self
    }

    /// Перевести в целевое пространство
    pub fn normalize(&self) -> NormalizedTransform {
        let position = if self.flip.position {
            swap_yz(self.position)
        } else {
            self.position
        };
        let rotation = if self.flip.rotation {
            swap_yz(self.rotation)
        } else {
            self.rotation
        };

        NormalizedTransform {
            position: position.map(|v| v * POSITION_SCALE),
            rotation,
            scale: self.scale / SCALE_DIVISOR,
        }
    }
}

fn swap_yz([x, y, z]: Vec3) -> Vec3 {
    [x, z, y]
}

/// Трансформация в целевом пространстве
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransform {
    pub position: Vec3,
    /// Градусы; перевод в радианы на стороне получателя
    pub rotation: Vec3,
    /// Единый масштаб по всем осям
    pub scale: f64,
}

impl Default for NormalizedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl NormalizedTransform {
    pub fn identity() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
        }
    }

    pub fn rotation_radians(&self) -> Vec3 {
        self.rotation.map(f64::to_radians)
    }

    /// Все компоненты конечны
    pub fn validate(&self) -> Result<(), TransformError> {
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(TransformError::NonFinite("position"));
        }
        if !self.rotation.iter().all(|v| v.is_finite()) {
            return Err(TransformError::NonFinite("rotation"));
        }
        if !self.scale.is_finite() {
            return Err(TransformError::NonFinite("scale"));
        }
        Ok(())
    }
}

/// Сериализовать вектор для командной строки: `[x,y,z]`
pub fn format_vector(v: &Vec3) -> String {
    format!("[{},{},{}]", v[0], v[1], v[2])
}

/// Разобрать вектор `[x,y,z]` (кавычки и скобки необязательны)
pub fn parse_vector(s: &str) -> Result<Vec3, TransformError> {
    let invalid = || TransformError::InvalidVector(s.to_string());
    let inner = s
        .trim()
        .trim_matches('"')
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');

    let parts = inner
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(invalid()),
    }
}

pub fn format_scalar(v: f64) -> String {
    v.to_string()
}

pub fn parse_scalar(s: &str) -> Result<f64, TransformError> {
    s.trim()
        .trim_matches('"')
        .trim()
        .parse::<f64>()
        .map_err(|_| TransformError::InvalidScalar(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_eq(actual: Vec3, expected: Vec3) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_position_scaled() {
        let spec = TransformSpec::new([1.0, 2.0, 3.0], [0.0; 3], SCALE_DIVISOR);
        assert_vec_eq(spec.normalize().position, [5.3, 10.6, 15.9]);
    }

    #[test]
    fn test_position_flip_swaps_before_scaling() {
        let spec = TransformSpec::new([1.0, 2.0, 3.0], [0.0; 3], SCALE_DIVISOR).with_flip(AxisFlip {
            position: true,
            rotation: false,
        });
        assert_vec_eq(spec.normalize().position, [5.3, 15.9, 10.6]);
    }

    #[test]
    fn test_rotation_stays_in_degrees() {
        let spec = TransformSpec::new([0.0; 3], [90.0, 45.0, 10.0], SCALE_DIVISOR);
        assert_eq!(spec.normalize().rotation, [90.0, 45.0, 10.0]);

        let flipped = spec.with_flip(AxisFlip {
            position: false,
            rotation: true,
        });
        assert_eq!(flipped.normalize().rotation, [90.0, 10.0, 45.0]);
    }

    #[test]
    fn test_scale_divided() {
        let spec = TransformSpec::new([0.0; 3], [0.0; 3], 533.34);
        assert_eq!(spec.normalize().scale, 1.0);
    }

    #[test]
    fn test_already_swapped_ignores_flip() {
        let spec = TransformSpec::new([1.0, 2.0, 3.0], [0.0, 1.0, 2.0], SCALE_DIVISOR)
            .with_flip(AxisFlip {
                position: true,
                rotation: true,
            })
            .already_swapped();
        let n = spec.normalize();
        assert_vec_eq(n.position, [5.3, 10.6, 15.9]);
        assert_eq!(n.rotation, [0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_rotation_radians() {
        let n = NormalizedTransform {
            rotation: [180.0, 90.0, 0.0],
            ..NormalizedTransform::identity()
        };
        assert_vec_eq(n.rotation_radians(), [std::f64::consts::PI, std::f64::consts::FRAC_PI_2, 0.0]);
    }

    #[test]
    fn test_vector_text_roundtrip() {
        let text = format_vector(&[5.3, -1.0, 0.25]);
        assert_eq!(text, "[5.3,-1,0.25]");
        assert_eq!(parse_vector(&text).unwrap(), [5.3, -1.0, 0.25]);
    }

    #[test]
    fn test_parse_vector_accepts_quotes_and_spaces() {
        assert_eq!(parse_vector("\"[1, 2, 3]\"").unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(parse_vector("1,2,3").unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_vector_rejects_bad_input() {
        assert!(parse_vector("[1,2]").is_err());
        assert!(parse_vector("[1,2,3,4]").is_err());
        assert!(parse_vector("[a,b,c]").is_err());
        assert!(parse_vector("").is_err());
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("\"533.34\"").unwrap(), 533.34);
        assert!(parse_scalar("big").is_err());
    }

    #[test]
    fn test_validate_non_finite() {
        let mut n = NormalizedTransform::identity();
        assert!(n.validate().is_ok());
        n.scale = f64::NAN;
        assert_eq!(n.validate(), Err(TransformError::NonFinite("scale")));
    }

    #[test]
    fn test_spec_serde_default_flip() {
        let spec: TransformSpec =
            serde_json::from_str(r#"{"position":[1,2,3],"rotation":[0,0,0],"scale":10}"#).unwrap();
        assert_eq!(spec.flip, AxisFlip::default());
    }
}
