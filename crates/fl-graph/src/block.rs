//! Blocks, pins and the values that flow between them.

use std::collections::BTreeMap;
use std::fmt;

use fl_core::{BlockId, Real};
use serde::{Deserialize, Serialize};

/// Payload type carried by a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Scalar or sequence of numbers.
    #[serde(rename = "n")]
    Numeric,
    /// Encoded image frame.
    #[serde(rename = "i")]
    Image,
}

impl DataType {
    /// Single-letter code used in program files.
    pub fn code(self) -> &'static str {
        match self {
            DataType::Numeric => "n",
            DataType::Image => "i",
        }
    }
}

/// Direction of a pin relative to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    pub fn opposite(self) -> Self {
        match self {
            PinDirection::Input => PinDirection::Output,
            PinDirection::Output => PinDirection::Input,
        }
    }
}

/// Address of a pin: owning block, direction and position within that
/// direction's pin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinRef {
    pub block: BlockId,
    pub direction: PinDirection,
    pub index: usize,
}

impl PinRef {
    pub fn input(block: BlockId, index: usize) -> Self {
        Self {
            block,
            direction: PinDirection::Input,
            index,
        }
    }

    pub fn output(block: BlockId, index: usize) -> Self {
        Self {
            block,
            direction: PinDirection::Output,
            index,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }
}

/// A typed endpoint owned by a block.
///
/// Only input pins carry a `source`; fan-in is exactly one while an output may
/// feed any number of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub direction: PinDirection,
    pub data_type: DataType,
    /// Upstream output pin, for inputs only.
    pub source: Option<PinRef>,
}

impl Pin {
    pub fn input(data_type: DataType) -> Self {
        Self {
            direction: PinDirection::Input,
            data_type,
            source: None,
        }
    }

    pub fn output(data_type: DataType) -> Self {
        Self {
            direction: PinDirection::Output,
            data_type,
            source: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }
}

/// Current value of a block. `None` on the block means "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(Real),
    Array(Vec<Real>),
    /// Base64-encoded image payload.
    Image(String),
}

impl Value {
    pub fn as_number(&self) -> Option<Real> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Parameter payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(Real),
    Text(String),
    /// String-keyed labels, e.g. sequence names keyed by source block id.
    Map(BTreeMap<String, String>),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<Real> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ParamValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// A named, user-editable block parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Real>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            value: None,
            default: None,
            min: None,
            max: None,
        }
    }

    pub fn with_value(mut self, value: ParamValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_default(mut self, default: ParamValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_range(mut self, min: Real, max: Real) -> Self {
        self.data_type = Some(DataType::Numeric);
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// The value in effect: the explicit value, else the default.
    pub fn effective(&self) -> Option<&ParamValue> {
        self.value.as_ref().or(self.default.as_ref())
    }

    pub fn effective_number(&self) -> Option<Real> {
        self.effective().and_then(ParamValue::as_number)
    }

    /// Clamp a number into this parameter's `[min, max]` range, if it has one.
    pub fn clamp(&self, v: Real) -> Real {
        let v = self.min.map_or(v, |min| v.max(min));
        self.max.map_or(v, |max| v.min(max))
    }
}

/// Block position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Real,
    pub y: Real,
}

impl Point {
    pub fn new(x: Real, y: Real) -> Self {
        Self { x, y }
    }
}

/// Sensor type reported by a device, e.g. `"temperature"` or `"camera"`.
///
/// The set of device types comes from the connected hardware, so this is an
/// open newtype rather than an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceType(String);

impl DeviceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_camera(&self) -> bool {
        self.0 == "camera"
    }

    /// Display units for known sensor types.
    pub fn units(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "temperature" => Some("degrees C"),
            "humidity" => Some("%"),
            "light" => Some("lux"),
            "soil moisture" | "soilmoisture" => Some("%"),
            "CO2" | "co2" => Some("PPM"),
            "O2" | "o2" => Some("%"),
            "pressure" => Some("kPa"),
            _ => None,
        }
    }

    /// Output payload type of blocks of this device type.
    pub fn data_type(&self) -> DataType {
        if self.is_camera() {
            DataType::Image
        } else {
            DataType::Numeric
        }
    }
}

/// Filter operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Not,
    And,
    Or,
    Xor,
    Nand,
    Plus,
    Minus,
    Times,
    DividedBy,
    AbsoluteValue,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    SimpleMovingAverage,
    ExponentialMovingAverage,
    Blur,
    Brightness,
}

impl FilterKind {
    pub const ALL: [FilterKind; 18] = [
        FilterKind::Not,
        FilterKind::And,
        FilterKind::Or,
        FilterKind::Xor,
        FilterKind::Nand,
        FilterKind::Plus,
        FilterKind::Minus,
        FilterKind::Times,
        FilterKind::DividedBy,
        FilterKind::AbsoluteValue,
        FilterKind::Equals,
        FilterKind::NotEquals,
        FilterKind::LessThan,
        FilterKind::GreaterThan,
        FilterKind::SimpleMovingAverage,
        FilterKind::ExponentialMovingAverage,
        FilterKind::Blur,
        FilterKind::Brightness,
    ];

    /// Type string stored in program files.
    pub fn type_name(self) -> &'static str {
        match self {
            FilterKind::Not => "not",
            FilterKind::And => "and",
            FilterKind::Or => "or",
            FilterKind::Xor => "xor",
            FilterKind::Nand => "nand",
            FilterKind::Plus => "plus",
            FilterKind::Minus => "minus",
            FilterKind::Times => "times",
            FilterKind::DividedBy => "divided by",
            FilterKind::AbsoluteValue => "absolute value",
            FilterKind::Equals => "equals",
            FilterKind::NotEquals => "not equals",
            FilterKind::LessThan => "less than",
            FilterKind::GreaterThan => "greater than",
            FilterKind::SimpleMovingAverage => "simple moving average",
            FilterKind::ExponentialMovingAverage => "exponential moving average",
            FilterKind::Blur => "blur",
            FilterKind::Brightness => "brightness",
        }
    }

    /// Label shown in the palette; also the default block name.
    pub fn palette_label(self) -> &'static str {
        match self {
            FilterKind::SimpleMovingAverage => "moving average",
            FilterKind::ExponentialMovingAverage => "exp moving average",
            other => other.type_name(),
        }
    }

    /// Accepts both the stored type string and the palette label.
    pub fn from_type_name(s: &str) -> Option<Self> {
        match s {
            "moving average" => return Some(FilterKind::SimpleMovingAverage),
            "exp moving average" => return Some(FilterKind::ExponentialMovingAverage),
            _ => {}
        }
        Self::ALL.into_iter().find(|k| k.type_name() == s)
    }

    pub fn input_count(self) -> usize {
        if self.is_unary() { 1 } else { 2 }
    }

    pub fn is_unary(self) -> bool {
        matches!(
            self,
            FilterKind::Not
                | FilterKind::AbsoluteValue
                | FilterKind::SimpleMovingAverage
                | FilterKind::ExponentialMovingAverage
                | FilterKind::Blur
                | FilterKind::Brightness
        )
    }

    pub fn data_type(self) -> DataType {
        match self {
            FilterKind::Blur | FilterKind::Brightness => DataType::Image,
            _ => DataType::Numeric,
        }
    }
}

/// The closed set of block kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Device(DeviceType),
    Timer,
    Filter(FilterKind),
    NumberEntry,
    Relay,
    DataStorage,
    Plot,
}

impl BlockKind {
    /// Type string stored in program files.
    pub fn type_name(&self) -> &str {
        match self {
            BlockKind::Device(d) => d.as_str(),
            BlockKind::Timer => "timer",
            BlockKind::Filter(f) => f.type_name(),
            BlockKind::NumberEntry => "number_entry",
            BlockKind::Relay => "relay",
            BlockKind::DataStorage => "data storage",
            BlockKind::Plot => "plot",
        }
    }

    /// Any type string that is not a known kind is a device type.
    pub fn from_type_name(s: &str) -> Self {
        match s {
            "timer" => BlockKind::Timer,
            "number_entry" => BlockKind::NumberEntry,
            "relay" => BlockKind::Relay,
            "data storage" => BlockKind::DataStorage,
            "plot" => BlockKind::Plot,
            other => match FilterKind::from_type_name(other) {
                Some(f) => BlockKind::Filter(f),
                None => BlockKind::Device(DeviceType::new(other)),
            },
        }
    }

    /// Device and timer blocks are addressed by name from the device feed,
    /// so their names live in the diagram's name registry.
    pub fn is_named_source(&self) -> bool {
        matches!(self, BlockKind::Device(_) | BlockKind::Timer)
    }

    /// Leaves get their value pushed from outside rather than computed.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            BlockKind::Device(_) | BlockKind::Timer | BlockKind::NumberEntry
        )
    }

    pub fn allows_rename(&self) -> bool {
        !matches!(
            self,
            BlockKind::Filter(_) | BlockKind::Device(_) | BlockKind::Plot | BlockKind::Timer
        )
    }

    pub fn is_data_storage(&self) -> bool {
        matches!(self, BlockKind::DataStorage)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A processing node in the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub name: String,
    pub units: Option<String>,
    pub has_seq: bool,
    pub value: Option<Value>,
    pub params: Vec<Param>,
    pub inputs: Vec<Pin>,
    pub outputs: Vec<Pin>,
    pub position: Point,
}

impl Block {
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut Param> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    pub fn pin(&self, direction: PinDirection, index: usize) -> Option<&Pin> {
        match direction {
            PinDirection::Input => self.inputs.get(index),
            PinDirection::Output => self.outputs.get(index),
        }
    }

    /// Shared payload type of the input pins, if the block has any.
    pub fn input_type(&self) -> Option<DataType> {
        self.inputs.first().map(|p| p.data_type)
    }

    pub fn output_type(&self) -> Option<DataType> {
        self.outputs.first().map(|p| p.data_type)
    }

    pub fn connected_inputs(&self) -> usize {
        self.inputs.iter().filter(|p| p.is_connected()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_type_names_round_trip() {
        for f in FilterKind::ALL {
            assert_eq!(
                BlockKind::from_type_name(f.type_name()),
                BlockKind::Filter(f)
            );
        }
        for kind in [
            BlockKind::Timer,
            BlockKind::NumberEntry,
            BlockKind::Relay,
            BlockKind::DataStorage,
            BlockKind::Plot,
        ] {
            assert_eq!(BlockKind::from_type_name(kind.type_name()), kind);
        }
        assert_eq!(
            BlockKind::from_type_name("humidity"),
            BlockKind::Device(DeviceType::new("humidity"))
        );
    }

    #[test]
    fn palette_labels_map_to_moving_averages() {
        assert_eq!(
            FilterKind::from_type_name("moving average"),
            Some(FilterKind::SimpleMovingAverage)
        );
        assert_eq!(
            FilterKind::from_type_name("exp moving average"),
            Some(FilterKind::ExponentialMovingAverage)
        );
        assert_eq!(
            FilterKind::ExponentialMovingAverage.type_name(),
            "exponential moving average"
        );
    }

    #[test]
    fn arity_and_types() {
        assert_eq!(FilterKind::Plus.input_count(), 2);
        assert_eq!(FilterKind::Not.input_count(), 1);
        assert_eq!(FilterKind::AbsoluteValue.input_count(), 1);
        assert_eq!(FilterKind::Blur.data_type(), DataType::Image);
        assert_eq!(DeviceType::new("camera").data_type(), DataType::Image);
        assert_eq!(DeviceType::new("temperature").units(), Some("degrees C"));
    }

    #[test]
    fn rename_policy() {
        assert!(BlockKind::NumberEntry.allows_rename());
        assert!(BlockKind::Relay.allows_rename());
        assert!(BlockKind::DataStorage.allows_rename());
        assert!(!BlockKind::Timer.allows_rename());
        assert!(!BlockKind::Plot.allows_rename());
        assert!(!BlockKind::Filter(FilterKind::Plus).allows_rename());
        assert!(!BlockKind::Device(DeviceType::new("light")).allows_rename());
    }

    #[test]
    fn param_effective_and_clamp() {
        let p = Param::new("blur_amount")
            .with_range(0.0, 50.0)
            .with_default(ParamValue::Number(5.0));
        assert_eq!(p.effective_number(), Some(5.0));
        assert_eq!(p.clamp(80.0), 50.0);
        assert_eq!(p.clamp(-3.0), 0.0);
    }

    #[test]
    fn untagged_values_deserialize() {
        let v: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, Value::Number(2.5));
        let v: Value = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(v, Value::Array(vec![1.0, 2.0]));
        let p: ParamValue = serde_json::from_str(r#"{"3": "temp"}"#).unwrap();
        assert_eq!(p.as_map().and_then(|m| m.get("3")).map(String::as_str), Some("temp"));
    }
}
