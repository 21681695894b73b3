//! Declarative field descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::bitfield;
use crate::eep::message::{EepMessageValue, EepValue};
use crate::error::ProtocolError;

/// Fields of the current telegram decoded so far.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    values: &'a BTreeMap<String, EepMessageValue>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(values: &'a BTreeMap<String, EepMessageValue>) -> Self {
        Self { values }
    }

    /// Raw value of an already decoded field.
    pub fn raw(&self, field_id: &str) -> Option<u64> {
        self.values.get(field_id).map(|v| v.raw)
    }
}

/// A scale bound that may depend on previously decoded fields.
pub trait ScaleBound: Send + Sync {
    fn evaluate(&self, ctx: &DecodeContext<'_>) -> f64;
}

impl ScaleBound for f64 {
    fn evaluate(&self, _ctx: &DecodeContext<'_>) -> f64 {
        *self
    }
}

/// Bound computed from the raw value of another field.
///
/// Falls back to `map(0)` when the field has not been decoded.
#[derive(Clone, Copy)]
pub struct FieldBound {
    pub field_id: &'static str,
    pub map: fn(u64) -> f64,
}

impl ScaleBound for FieldBound {
    fn evaluate(&self, ctx: &DecodeContext<'_>) -> f64 {
        (self.map)(ctx.raw(self.field_id).unwrap_or(0))
    }
}

/// Unit of a field, possibly selected by another field.
pub trait UnitSource: Send + Sync {
    fn resolve(&self, ctx: &DecodeContext<'_>) -> Option<String>;
}

impl UnitSource for &'static str {
    fn resolve(&self, _ctx: &DecodeContext<'_>) -> Option<String> {
        Some((*self).to_string())
    }
}

/// Unit selected from the raw value of another field.
#[derive(Clone, Copy)]
pub struct FieldUnit {
    pub field_id: &'static str,
    pub map: fn(u64) -> Option<&'static str>,
}

impl UnitSource for FieldUnit {
    fn resolve(&self, ctx: &DecodeContext<'_>) -> Option<String> {
        ctx.raw(self.field_id).and_then(self.map).map(str::to_string)
    }
}

/// Descriptor of one bit field inside a telegram layout.
#[derive(Clone)]
pub struct EepDataField {
    pub id: &'static str,
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    /// Raw interval mapped onto the scale; may be descending.
    pub range: Option<(f64, f64)>,
    pub scale_min: Option<Arc<dyn ScaleBound>>,
    pub scale_max: Option<Arc<dyn ScaleBound>>,
    pub unit: Option<Arc<dyn UnitSource>>,
    pub range_enum: Option<BTreeMap<u64, &'static str>>,
    pub observable_uid: Option<&'static str>,
    /// Raw value written when an encoder leaves the field untouched.
    pub default_raw: u64,
}

impl fmt::Debug for EepDataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EepDataField")
            .field("id", &self.id)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("range", &self.range)
            .field("range_enum", &self.range_enum)
            .field("observable_uid", &self.observable_uid)
            .finish_non_exhaustive()
    }
}

impl EepDataField {
    pub fn new(id: &'static str, name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            id,
            name,
            offset,
            size,
            range: None,
            scale_min: None,
            scale_max: None,
            unit: None,
            range_enum: None,
            observable_uid: None,
            default_raw: 0,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Constant scale bounds.
    pub fn scale(self, min: f64, max: f64) -> Self {
        self.scale_with(Arc::new(min), Arc::new(max))
    }

    /// Scale bounds evaluated against the decode context.
    pub fn scale_with(mut self, min: Arc<dyn ScaleBound>, max: Arc<dyn ScaleBound>) -> Self {
        self.scale_min = Some(min);
        self.scale_max = Some(max);
        self
    }

    pub fn unit(self, unit: &'static str) -> Self {
        self.unit_with(Arc::new(unit))
    }

    pub fn unit_with(mut self, unit: Arc<dyn UnitSource>) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn enumeration<I>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (u64, &'static str)>,
    {
        self.range_enum = Some(labels.into_iter().collect());
        self
    }

    pub fn observable(mut self, uid: &'static str) -> Self {
        self.observable_uid = Some(uid);
        self
    }

    pub fn default_raw(mut self, raw: u64) -> Self {
        self.default_raw = raw;
        self
    }

    /// First bit after this field.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Extract and interpret this field from `data`.
    pub fn decode(&self, data: &[u8], ctx: &DecodeContext<'_>) -> Result<EepMessageValue, ProtocolError> {
        let raw = bitfield::raw_bits(data, self.offset, self.size)?;
        Ok(EepMessageValue {
            raw,
            value: self.interpret(raw, ctx),
            unit: self.unit.as_ref().and_then(|u| u.resolve(ctx)),
        })
    }

    /// Map a raw value to its label or physical value.
    pub fn interpret(&self, raw: u64, ctx: &DecodeContext<'_>) -> Option<EepValue> {
        if let Some(labels) = &self.range_enum {
            return labels.get(&raw).map(|label| EepValue::Label((*label).to_string()));
        }

        let (Some(scale_min), Some(scale_max)) = (&self.scale_min, &self.scale_max) else {
            return Some(EepValue::Number(raw as f64));
        };
        let lo = scale_min.evaluate(ctx);
        let hi = scale_max.evaluate(ctx);
        let (range_min, range_max) = self
            .range
            .unwrap_or((0.0, bitfield::max_raw(self.size) as f64));
        if range_min == range_max {
            return Some(EepValue::Number(lo));
        }
        let value = lo + (raw as f64 - range_min) / (range_max - range_min) * (hi - lo);
        Some(EepValue::Number(value))
    }
}
