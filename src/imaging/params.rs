//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are decoded
//! once from the raw configuration values of an
//! [`OperationSpec`](crate::types::OperationSpec) and then handed to the pixel
//! code in [`geometry`](super::geometry).
//!
//! ## Types
//!
//! - [`ResizeParams`]: target box, method, filter, anchor and background of one resize.
//! - [`ResizeMethod`]: `stretch` | `fit` | `fill` | `fit_expand`.
//! - [`Resampling`]: named resampling filter, mapped onto `fast_image_resize` algorithms.
//! - [`Offset`]: normalized anchor used to place a crop window or a pasted image.

use crate::error::TransformError;
use fast_image_resize as fr;
use toml::Value;

/// Largest accepted target edge, in pixels.
pub const MAX_EDGE: i64 = 9999;

const OP: &str = "resize";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMethod {
    /// Scale to exactly the target box, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Scale to fit inside the target box.
    Fit,
    /// Scale to cover the target box, then crop.
    Fill,
    /// Fit, then pad onto an opaque canvas of the target size.
    FitExpand,
}

impl ResizeMethod {
    pub fn from_tag(tag: &str) -> Result<Self, TransformError> {
        match tag {
            "stretch" => Ok(Self::Stretch),
            "fit" => Ok(Self::Fit),
            "fill" => Ok(Self::Fill),
            "fit_expand" => Ok(Self::FitExpand),
            other => Err(TransformError::UnsupportedMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampling {
    Nearest,
    Box,
    Bilinear,
    Hamming,
    Bicubic,
    #[default]
    Lanczos,
}

impl Resampling {
    pub fn from_tag(tag: &str) -> Result<Self, TransformError> {
        match tag {
            "nearest" => Ok(Self::Nearest),
            "box" => Ok(Self::Box),
            "bilinear" => Ok(Self::Bilinear),
            "hamming" => Ok(Self::Hamming),
            "bicubic" => Ok(Self::Bicubic),
            "lanczos" => Ok(Self::Lanczos),
            other => Err(TransformError::UnsupportedResampling(other.to_string())),
        }
    }

    pub fn resize_alg(self) -> fr::ResizeAlg {
        match self {
            Self::Nearest => fr::ResizeAlg::Nearest,
            Self::Box => fr::ResizeAlg::Convolution(fr::FilterType::Box),
            Self::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            Self::Hamming => fr::ResizeAlg::Convolution(fr::FilterType::Hamming),
            Self::Bicubic => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            Self::Lanczos => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }
}

/// Normalized anchor within the slack space, each axis in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn as_tuple(self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Parameters for one resize operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub method: ResizeMethod,
    pub resampling: Resampling,
    pub offset: Offset,
    /// Canvas color for `fit_expand`, opaque RGB.
    pub color: [u8; 3],
}

impl ResizeParams {
    /// Decode the `resize = { ... }` table of an operation sequence.
    pub fn from_value(value: &Value) -> Result<Self, TransformError> {
        let table = value
            .as_table()
            .ok_or_else(|| TransformError::invalid(OP, "expected a table of resize parameters"))?;

        if let Some(key) = table.keys().find(|k| {
            !matches!(
                k.as_str(),
                "width" | "height" | "method" | "resampling" | "offset" | "color"
            )
        }) {
            return Err(TransformError::invalid(OP, format!("unknown key '{key}'")));
        }

        let width = edge(table.get("width"), "width")?;
        let height = edge(table.get("height"), "height")?;

        let method = match table.get("method") {
            None => ResizeMethod::default(),
            Some(v) => ResizeMethod::from_tag(tag(v, "method")?)?,
        };
        let resampling = match table.get("resampling") {
            None => Resampling::default(),
            Some(v) => Resampling::from_tag(tag(v, "resampling")?)?,
        };
        let offset = match table.get("offset") {
            None => Offset::default(),
            Some(v) => offset(v)?,
        };
        let color = match table.get("color") {
            None => [0, 0, 0],
            Some(v) => color(v)?,
        };

        Ok(Self {
            width,
            height,
            method,
            resampling,
            offset,
            color,
        })
    }

    pub fn target(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn edge(value: Option<&Value>, name: &str) -> Result<u32, TransformError> {
    let value = value.ok_or_else(|| TransformError::invalid(OP, format!("'{name}' is required")))?;
    match value.as_integer() {
        Some(n) if (1..=MAX_EDGE).contains(&n) => Ok(n as u32),
        Some(n) => Err(TransformError::invalid(
            OP,
            format!("'{name}' must be between 1 and {MAX_EDGE}, got {n}"),
        )),
        None => Err(TransformError::invalid(OP, format!("'{name}' must be an integer"))),
    }
}

fn tag<'a>(value: &'a Value, name: &str) -> Result<&'a str, TransformError> {
    value
        .as_str()
        .ok_or_else(|| TransformError::invalid(OP, format!("'{name}' must be a string")))
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn offset(value: &Value) -> Result<Offset, TransformError> {
    let bad = || TransformError::invalid(OP, "'offset' must be [x, y] with both values in 0.0..=1.0");
    let items = value.as_array().ok_or_else(bad)?;
    let [x, y] = items.as_slice() else {
        return Err(bad());
    };
    let x = number(x).ok_or_else(bad)?;
    let y = number(y).ok_or_else(bad)?;
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err(bad());
    }
    Ok(Offset { x, y })
}

fn color(value: &Value) -> Result<[u8; 3], TransformError> {
    let bad = || TransformError::invalid(OP, "'color' must be [r, g, b] (0-255) or \"#rrggbb\"");
    match value {
        Value::String(hex) => {
            let digits = hex.strip_prefix('#').ok_or_else(bad)?;
            if digits.len() != 6 || !digits.is_ascii() {
                return Err(bad());
            }
            let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad());
            Ok([channel(0)?, channel(2)?, channel(4)?])
        }
        Value::Array(items) => {
            let [r, g, b] = items.as_slice() else {
                return Err(bad());
            };
            let channel = |v: &Value| {
                v.as_integer()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(bad)
            };
            Ok([channel(r)?, channel(g)?, channel(b)?])
        }
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<ResizeParams, TransformError> {
        let value: Value = toml::from_str::<toml::Table>(src).unwrap()["resize"].clone();
        ResizeParams::from_value(&value)
    }

    #[test]
    fn defaults_apply() {
        let p = parse("resize = { width = 100, height = 50 }").unwrap();
        assert_eq!(p.target(), (100, 50));
        assert_eq!(p.method, ResizeMethod::Stretch);
        assert_eq!(p.resampling, Resampling::Lanczos);
        assert_eq!(p.offset, Offset { x: 0.5, y: 0.5 });
        assert_eq!(p.color, [0, 0, 0]);
    }

    #[test]
    fn full_table_decodes() {
        let p = parse(
            r##"resize = { width = 10, height = 20, method = "fit_expand", resampling = "nearest", offset = [0, 1.0], color = "#ff8000" }"##,
        )
        .unwrap();
        assert_eq!(p.method, ResizeMethod::FitExpand);
        assert_eq!(p.resampling, Resampling::Nearest);
        assert_eq!(p.offset, Offset { x: 0.0, y: 1.0 });
        assert_eq!(p.color, [255, 128, 0]);
    }

    #[test]
    fn color_array_form() {
        let p = parse("resize = { width = 1, height = 1, color = [1, 2, 3] }").unwrap();
        assert_eq!(p.color, [1, 2, 3]);
        assert!(parse("resize = { width = 1, height = 1, color = [1, 2, 300] }").is_err());
    }

    #[test]
    fn missing_height_is_invalid() {
        let err = parse("resize = { width = 100 }").unwrap_err();
        assert_eq!(err, TransformError::invalid("resize", "'height' is required"));
    }

    #[test]
    fn out_of_range_edges_are_invalid() {
        assert!(parse("resize = { width = 0, height = 50 }").is_err());
        assert!(parse("resize = { width = 10000, height = 50 }").is_err());
        assert!(parse("resize = { width = -5, height = 50 }").is_err());
    }

    #[test]
    fn unknown_method_and_filter() {
        assert_eq!(
            parse(r#"resize = { width = 1, height = 1, method = "squash" }"#).unwrap_err(),
            TransformError::UnsupportedMethod("squash".into())
        );
        assert_eq!(
            parse(r#"resize = { width = 1, height = 1, resampling = "sinc" }"#).unwrap_err(),
            TransformError::UnsupportedResampling("sinc".into())
        );
    }

    #[test]
    fn offset_outside_unit_square_is_invalid() {
        assert!(parse("resize = { width = 1, height = 1, offset = [1.5, 0.0] }").is_err());
        assert!(parse("resize = { width = 1, height = 1, offset = [0.5] }").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("resize = { width = 1, height = 1, quality = 80 }").is_err());
    }

    #[test]
    fn non_table_is_invalid() {
        let err = ResizeParams::from_value(&Value::Integer(3)).unwrap_err();
        assert!(matches!(err, TransformError::InvalidParams { .. }));
    }
}
