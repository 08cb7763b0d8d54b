//! Image operations and the transform fold.
//!
//! An [`OperationSpec`] arrives as ordered `(name, raw value)` pairs. It is
//! decoded in one pass into [`Operation`]s, so a bad entry anywhere in the
//! sequence is reported before any pixel is touched. The decoded list is then
//! applied left to right, each output feeding the next operation.

use super::buffer::{ColorMode, PixelBuffer};
use super::color::convert;
use super::enhance::{EnhanceKind, enhance};
use super::geometry::{resize, rotate};
use super::params::ResizeParams;
use crate::error::TransformError;
use crate::pipeline::Transformer;
use crate::types::OperationSpec;
use toml::Value;

/// One decoded image operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Counter-clockwise rotation in whole degrees, canvas kept.
    Rotate { degrees: u32 },
    Resize(ResizeParams),
    ColorMode(ColorMode),
    /// `factor` is `None` when the configured value was not a float; the
    /// operation is then a no-op.
    Enhance { kind: EnhanceKind, factor: Option<f32> },
}

impl Operation {
    /// Decode one `(name, value)` entry.
    pub fn decode(name: &str, value: &Value) -> Result<Self, TransformError> {
        match name {
            "rotate" => match value.as_integer() {
                Some(d) if (0..=360).contains(&d) => Ok(Operation::Rotate { degrees: d as u32 }),
                _ => Err(TransformError::invalid(
                    name,
                    "expected an integer between 0 and 360",
                )),
            },
            "resize" => ResizeParams::from_value(value).map(Operation::Resize),
            "color_mode" => {
                let tag = value
                    .as_str()
                    .ok_or_else(|| TransformError::invalid(name, "expected a color mode name"))?;
                ColorMode::from_tag(tag).map(Operation::ColorMode)
            }
            "color_balance" => Ok(Self::enhance(EnhanceKind::ColorBalance, value)),
            "contrast" => Ok(Self::enhance(EnhanceKind::Contrast, value)),
            "brightness" => Ok(Self::enhance(EnhanceKind::Brightness, value)),
            "sharpness" => Ok(Self::enhance(EnhanceKind::Sharpness, value)),
            other => Err(TransformError::UnsupportedOperation(other.to_string())),
        }
    }

    fn enhance(kind: EnhanceKind, value: &Value) -> Self {
        let factor = value.as_float().map(|f| f as f32);
        if factor.is_none() {
            log::debug!("{}: ignoring non-float factor {value}", kind.name());
        }
        Operation::Enhance { kind, factor }
    }

    /// Apply to an owned buffer, producing a new one.
    pub fn apply(&self, buffer: PixelBuffer) -> Result<PixelBuffer, TransformError> {
        match self {
            Operation::Rotate { degrees } if degrees % 360 == 0 => Ok(buffer),
            Operation::Rotate { degrees } => rotate(&buffer, *degrees),
            Operation::Resize(params) => resize(&buffer, params),
            Operation::ColorMode(mode) if buffer.mode() == *mode => Ok(buffer),
            Operation::ColorMode(mode) => convert(&buffer, *mode),
            Operation::Enhance { factor: None, .. } => Ok(buffer),
            Operation::Enhance {
                kind,
                factor: Some(f),
            } => enhance(&buffer, *kind, *f),
        }
    }
}

/// Decode every entry of `spec`, failing on the first bad one.
pub fn decode_operations(spec: &OperationSpec) -> Result<Vec<Operation>, TransformError> {
    spec.iter()
        .map(|(name, value)| Operation::decode(name, value))
        .collect()
}

/// Strict left fold of `operations` over `buffer`.
pub fn apply_operations(
    buffer: PixelBuffer,
    operations: &[Operation],
) -> Result<PixelBuffer, TransformError> {
    operations.iter().try_fold(buffer, |buf, op| op.apply(buf))
}

/// Transform stage of the image pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTransformer;

impl Transformer for ImageTransformer {
    type Item = PixelBuffer;

    fn check(&self, operations: &OperationSpec) -> Result<(), TransformError> {
        decode_operations(operations).map(|_| ())
    }

    fn transform(
        &self,
        buffer: PixelBuffer,
        operations: &OperationSpec,
    ) -> Result<PixelBuffer, TransformError> {
        let decoded = decode_operations(operations)?;
        apply_operations(buffer, &decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::ResizeMethod;
    use crate::test_helpers::{gradient_rgb, spec};

    #[test]
    fn empty_spec_leaves_buffer_unchanged() {
        let img = gradient_rgb(12, 5);
        let out = ImageTransformer
            .transform(img.clone(), &OperationSpec::default())
            .unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn operations_apply_in_declared_order() {
        let img = gradient_rgb(300, 100);
        let fit = ResizeParams::from_value(
            &toml::from_str::<toml::Table>("v = { width = 100, height = 50, method = \"fit\" }")
                .unwrap()["v"],
        )
        .unwrap();

        let rotate_first = spec(
            r#"
            rotate = 90
            resize = { width = 100, height = 50, method = "fit" }
            "#,
        );
        let out = ImageTransformer.transform(img.clone(), &rotate_first).unwrap();
        let expected = resize(&rotate(&img, 90).unwrap(), &fit).unwrap();
        assert_eq!(out.dimensions(), (100, 33));
        assert_eq!(out, expected);

        let resize_first = spec(
            r#"
            resize = { width = 100, height = 50, method = "fit" }
            rotate = 90
            "#,
        );
        let other = ImageTransformer.transform(img.clone(), &resize_first).unwrap();
        assert_eq!(other, rotate(&resize(&img, &fit).unwrap(), 90).unwrap());
        assert_ne!(out, other);
    }

    #[test]
    fn decode_preserves_order() {
        let ops = spec(
            r#"
            color_mode = "rgb"
            rotate = 45
            brightness = 1.2
            "#,
        );
        let decoded = decode_operations(&ops).unwrap();
        assert_eq!(decoded[0], Operation::ColorMode(ColorMode::Rgb));
        assert_eq!(decoded[1], Operation::Rotate { degrees: 45 });
        assert_eq!(
            decoded[2],
            Operation::Enhance {
                kind: EnhanceKind::Brightness,
                factor: Some(1.2)
            }
        );
    }

    #[test]
    fn unsupported_operation_aborts_whole_sequence() {
        let ops = spec(
            r#"
            rotate = 90
            blur = 3
            "#,
        );
        let err = ImageTransformer.transform(gradient_rgb(4, 4), &ops).unwrap_err();
        assert_eq!(err, TransformError::UnsupportedOperation("blur".into()));
        assert_eq!(
            ImageTransformer.check(&ops).unwrap_err(),
            TransformError::UnsupportedOperation("blur".into())
        );
    }

    #[test]
    fn non_float_enhance_factor_is_a_no_op() {
        let ops = spec("contrast = 2\nbrightness = \"high\"");
        let img = gradient_rgb(6, 6);
        assert_eq!(ImageTransformer.transform(img.clone(), &ops).unwrap(), img);
    }

    #[test]
    fn rotate_rejects_out_of_range() {
        assert!(matches!(
            Operation::decode("rotate", &Value::Integer(361)),
            Err(TransformError::InvalidParams { .. })
        ));
        assert!(matches!(
            Operation::decode("rotate", &Value::Float(90.0)),
            Err(TransformError::InvalidParams { .. })
        ));
    }

    #[test]
    fn resize_decodes_through_params() {
        let ops = spec(r#"resize = { width = 10, height = 10, method = "fill" }"#);
        match &decode_operations(&ops).unwrap()[0] {
            Operation::Resize(p) => assert_eq!(p.method, ResizeMethod::Fill),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_color_mode_is_reported() {
        let ops = spec(r#"color_mode = "sepia""#);
        assert_eq!(
            decode_operations(&ops).unwrap_err(),
            TransformError::UnsupportedColorMode("sepia".into())
        );
    }
}
