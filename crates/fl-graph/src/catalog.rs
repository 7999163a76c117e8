//! Block palette: templates for every block the editor can add.

use fl_core::Real;

use crate::block::{BlockKind, DataType, DeviceType, FilterKind, Param, ParamValue, Point};

/// Everything needed to create a block except its id and position.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTemplate {
    pub kind: BlockKind,
    pub name: String,
    pub units: Option<String>,
    pub has_seq: bool,
    pub input_type: Option<DataType>,
    pub input_count: usize,
    pub output_type: Option<DataType>,
    pub output_count: usize,
    pub params: Vec<Param>,
}

impl BlockTemplate {
    fn base(kind: BlockKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            units: None,
            has_seq: false,
            input_type: None,
            input_count: 0,
            output_type: None,
            output_count: 0,
            params: Vec::new(),
        }
    }

    fn with_inputs(mut self, data_type: DataType, count: usize) -> Self {
        self.input_type = Some(data_type);
        self.input_count = count;
        self
    }

    fn with_outputs(mut self, data_type: DataType, count: usize) -> Self {
        self.output_type = Some(data_type);
        self.output_count = count;
        self
    }

    /// A sensor block. Name defaults to the device type.
    pub fn device(device: DeviceType) -> Self {
        let data_type = device.data_type();
        let units = device.units().map(str::to_string);
        let name = device.as_str().to_string();
        let mut t = Self::base(BlockKind::Device(device), name).with_outputs(data_type, 1);
        t.units = units;
        t.has_seq = true;
        t
    }

    pub fn relay() -> Self {
        Self::base(BlockKind::Relay, "relay").with_inputs(DataType::Numeric, 1)
    }

    pub fn timer() -> Self {
        let mut t = Self::base(BlockKind::Timer, "timer").with_outputs(DataType::Numeric, 1);
        t.params = vec![
            Param::new("seconds_on")
                .with_value(ParamValue::Number(5.0))
                .with_default(ParamValue::Number(5.0)),
            Param::new("seconds_off")
                .with_value(ParamValue::Number(5.0))
                .with_default(ParamValue::Number(5.0)),
        ];
        t
    }

    /// The recording block. `program_name` seeds the dataset location.
    pub fn data_storage(program_name: &str) -> Self {
        let mut t =
            Self::base(BlockKind::DataStorage, "data storage").with_inputs(DataType::Numeric, 1);
        t.params = vec![
            Param::new("recording_interval")
                .with_value(ParamValue::Number(1.0))
                .with_default(ParamValue::Number(1.0)),
            Param::new("dataset_location")
                .with_value(ParamValue::Text(format!("{program_name} dataset")))
                .with_default(ParamValue::Text("mydataset".to_string())),
            Param::new("sequence_names").with_value(ParamValue::Map(Default::default())),
        ];
        t
    }

    pub fn filter(kind: FilterKind) -> Self {
        let data_type = kind.data_type();
        let mut t = Self::base(BlockKind::Filter(kind), kind.palette_label())
            .with_inputs(data_type, kind.input_count())
            .with_outputs(data_type, 1);
        t.params = match kind {
            FilterKind::SimpleMovingAverage | FilterKind::ExponentialMovingAverage => {
                vec![
                    Param::new("period")
                        .with_range(0.0, 9999.0)
                        .with_value(ParamValue::Number(10.0))
                        .with_default(ParamValue::Number(10.0)),
                ]
            }
            FilterKind::Blur => vec![
                Param::new("blur_amount")
                    .with_range(0.0, 50.0)
                    .with_default(ParamValue::Number(5.0)),
            ],
            FilterKind::Brightness => vec![
                Param::new("brightness_adjustment")
                    .with_range(-100.0, 100.0)
                    .with_default(ParamValue::Number(0.0)),
            ],
            _ => Vec::new(),
        };
        t
    }

    pub fn number_entry() -> Self {
        Self::base(BlockKind::NumberEntry, "number").with_outputs(DataType::Numeric, 1)
    }

    pub fn plot() -> Self {
        Self::base(BlockKind::Plot, "plot").with_inputs(DataType::Numeric, 1)
    }

    /// The palette template for `kind`. `program_name` is only used by data
    /// storage.
    pub fn for_kind(kind: &BlockKind, program_name: &str) -> Self {
        match kind {
            BlockKind::Device(device) => Self::device(device.clone()),
            BlockKind::Timer => Self::timer(),
            BlockKind::Filter(f) => Self::filter(*f),
            BlockKind::NumberEntry => Self::number_entry(),
            BlockKind::Relay => Self::relay(),
            BlockKind::DataStorage => Self::data_storage(program_name),
            BlockKind::Plot => Self::plot(),
        }
    }
}

const PALETTE_ORIGIN: Real = 35.0;
const PALETTE_ROWS: usize = 18;
const PALETTE_WRAP: usize = 72;

/// Initial position of the block added after `existing` blocks.
///
/// Blocks cascade down in columns of 18, with the pattern repeating after 72.
pub fn palette_position(existing: usize) -> Point {
    let n = existing % PALETTE_WRAP;
    let row = n % PALETTE_ROWS;
    let column = n / PALETTE_ROWS;
    Point::new(
        PALETTE_ORIGIN + (column * 250 + row * 5) as Real,
        PALETTE_ORIGIN + (row * 35) as Real,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_defaults() {
        let t = BlockTemplate::timer();
        assert_eq!(t.output_count, 1);
        assert_eq!(t.input_count, 0);
        let on = t.params.iter().find(|p| p.name == "seconds_on").unwrap();
        assert_eq!(on.effective_number(), Some(5.0));
    }

    #[test]
    fn data_storage_seeds_dataset_location() {
        let t = BlockTemplate::data_storage("greenhouse");
        let loc = t.params.iter().find(|p| p.name == "dataset_location").unwrap();
        assert_eq!(
            loc.effective().and_then(ParamValue::as_text),
            Some("greenhouse dataset")
        );
        assert_eq!(t.input_count, 1);
        assert_eq!(t.output_count, 0);
    }

    #[test]
    fn image_filters_use_image_pins() {
        let t = BlockTemplate::filter(FilterKind::Brightness);
        assert_eq!(t.input_type, Some(DataType::Image));
        assert_eq!(t.output_type, Some(DataType::Image));
        assert_eq!(t.input_count, 1);
        assert_eq!(t.params[0].min, Some(-100.0));
    }

    #[test]
    fn moving_average_names() {
        let t = BlockTemplate::filter(FilterKind::ExponentialMovingAverage);
        assert_eq!(t.name, "exp moving average");
        assert_eq!(t.kind.type_name(), "exponential moving average");
        assert_eq!(t.params[0].effective_number(), Some(10.0));
    }

    #[test]
    fn template_for_kind_matches_constructor() {
        let kind = BlockKind::Device(DeviceType::new("camera"));
        let t = BlockTemplate::for_kind(&kind, "p");
        assert_eq!(t.kind, kind);
        assert_eq!(t.output_type, Some(DataType::Image));
        assert_eq!(
            BlockTemplate::for_kind(&BlockKind::DataStorage, "p"),
            BlockTemplate::data_storage("p")
        );
    }

    #[test]
    fn palette_cascade() {
        assert_eq!(palette_position(0), Point::new(35.0, 35.0));
        assert_eq!(palette_position(1), Point::new(40.0, 70.0));
        assert_eq!(palette_position(18), Point::new(285.0, 35.0));
        assert_eq!(palette_position(72), palette_position(0));
    }
}
