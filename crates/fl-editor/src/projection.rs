//! Read-only view of the editor for the presentation layer.
//!
//! Everything here is computed from the diagram on demand. Layout sizes are
//! canvas units; pin centers are absolute canvas positions.

use std::collections::HashMap;

use fl_core::{BlockId, Real, round_for_display};
use fl_graph::{Block, BlockKind, DataType, Diagram, FilterKind, ParamValue, PinRef, Point, Value};
use fl_program::ProgramInfo;

use crate::interaction::PointerTarget;
use crate::save::SaveStatus;

pub const BLOCK_WIDTH: Real = 200.0;
pub const BLOCK_HEIGHT: Real = 100.0;
/// Height of blocks that show parameter fields under their value.
pub const TALL_BLOCK_HEIGHT: Real = 142.0;
const STORAGE_PIN_TOP: Real = 124.0;
const STORAGE_PIN_PITCH: Real = 36.0;
const PIN_INSET: Real = 4.0;
const PLOT_SIZE: (Real, Real) = (340.0, 260.0);
const IMAGE_BLOCK_SIZE: (Real, Real) = (340.0, 310.0);
const CONNECTION_HIT_DISTANCE: Real = 4.0;

/// Shown for values that are not known yet.
pub const UNKNOWN_VALUE: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: Real,
    pub y: Real,
    pub w: Real,
    pub h: Real,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

/// Geometry of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub rect: Rect,
    pub inputs: Vec<Point>,
    pub outputs: Vec<Point>,
}

impl BlockLayout {
    pub fn pin_center(&self, pin: PinRef) -> Option<Point> {
        if pin.is_input() {
            self.inputs.get(pin.index).copied()
        } else {
            self.outputs.get(pin.index).copied()
        }
    }
}

pub fn block_size(block: &Block) -> (Real, Real) {
    match &block.kind {
        BlockKind::DataStorage => {
            let extra = block.inputs.len().saturating_sub(1) as Real;
            (BLOCK_WIDTH, TALL_BLOCK_HEIGHT + extra * STORAGE_PIN_PITCH)
        }
        BlockKind::Plot => PLOT_SIZE,
        BlockKind::Timer
        | BlockKind::Filter(FilterKind::SimpleMovingAverage | FilterKind::ExponentialMovingAverage) => {
            (BLOCK_WIDTH, TALL_BLOCK_HEIGHT)
        }
        _ if block.output_type() == Some(DataType::Image) => IMAGE_BLOCK_SIZE,
        _ => (BLOCK_WIDTH, BLOCK_HEIGHT),
    }
}

/// Block rectangle and pin centers.
///
/// Inputs sit on the left edge: a single input is centered, two inputs sit
/// near the top and bottom, more are spread from the top. Data storage
/// inputs are stacked one field row apart. Outputs sit centered on the right
/// edge.
pub fn layout_block(block: &Block) -> BlockLayout {
    let (w, h) = block_size(block);
    let origin = block.position;
    let count = block.inputs.len();

    let inputs = (0..count)
        .map(|i| {
            let i = i as Real;
            let (dx, dy) = if block.kind.is_data_storage() {
                (-PIN_INSET, STORAGE_PIN_TOP + STORAGE_PIN_PITCH * i)
            } else if count == 1 {
                (-PIN_INSET, h / 2.0)
            } else if count == 2 {
                (0.0, h / 10.0 + 4.0 * h / 5.0 * i)
            } else {
                (0.0, h / 10.0 + 2.0 * h / 5.0 * i)
            };
            Point::new(origin.x + dx, origin.y + dy)
        })
        .collect();
    let outputs = block
        .outputs
        .iter()
        .map(|_| Point::new(origin.x + w + PIN_INSET, origin.y + h / 2.0))
        .collect();

    BlockLayout {
        rect: Rect {
            x: origin.x,
            y: origin.y,
            w,
            h,
        },
        inputs,
        outputs,
    }
}

/// What a block shows as its value.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Text(String),
    /// Latest frame, if any.
    Image(Option<String>),
    /// Contents of a number entry field.
    Entry(String),
    /// Latest sample appended to the plot.
    Plot(Option<Real>),
    Blank,
}

/// Format a value for display, rounding numbers by magnitude.
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        None => UNKNOWN_VALUE.to_string(),
        Some(Value::Number(v)) => format!("{}", round_for_display(*v)),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| format!("{}", round_for_display(*v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Image(_)) => String::new(),
    }
}

pub fn display_value(block: &Block) -> DisplayValue {
    match &block.kind {
        BlockKind::DataStorage => DisplayValue::Blank,
        BlockKind::Plot => DisplayValue::Plot(block.value.as_ref().and_then(Value::as_number)),
        BlockKind::NumberEntry => DisplayValue::Entry(
            block
                .value
                .as_ref()
                .and_then(Value::as_number)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        ),
        BlockKind::Relay => {
            let on = block
                .value
                .as_ref()
                .and_then(Value::as_number)
                .is_some_and(|v| v.abs() >= 1.0);
            DisplayValue::Text(if on { "on" } else { "off" }.to_string())
        }
        _ if block.output_type() == Some(DataType::Image) => {
            DisplayValue::Image(match &block.value {
                Some(Value::Image(data)) => Some(data.clone()),
                _ => None,
            })
        }
        _ => DisplayValue::Text(format_value(block.value.as_ref())),
    }
}

/// Units as shown next to the value. Timers show none.
pub fn display_units(block: &Block) -> Option<String> {
    if matches!(block.kind, BlockKind::Timer) {
        return None;
    }
    block
        .units
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| u.replace("degrees ", "\u{b0}").replace("percent", "%"))
}

/// One editable parameter field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamView {
    pub name: String,
    pub label: String,
    /// Map entry this field edits.
    pub key: Option<String>,
    pub text: String,
}

fn param_label(name: &str) -> String {
    match name {
        "period" => "last".to_string(),
        "recording_interval" => "interval".to_string(),
        "dataset_location" => "name".to_string(),
        "sequence_names" => "type".to_string(),
        other => other.replace('_', " "),
    }
}

fn param_views(block: &Block) -> Vec<ParamView> {
    let mut views = Vec::new();
    for param in &block.params {
        let label = param_label(&param.name);
        match param.effective() {
            Some(ParamValue::Map(map)) => {
                // One field per connected source, in pin order
                let mut seen: Vec<BlockId> = Vec::new();
                for src in block.inputs.iter().filter_map(|p| p.source) {
                    if seen.contains(&src.block) {
                        continue;
                    }
                    seen.push(src.block);
                    let key = src.block.to_string();
                    views.push(ParamView {
                        name: param.name.clone(),
                        label: label.clone(),
                        text: map.get(&key).cloned().unwrap_or_default(),
                        key: Some(key),
                    });
                }
            }
            value => views.push(ParamView {
                name: param.name.clone(),
                label,
                key: None,
                text: match value {
                    Some(ParamValue::Number(v)) => v.to_string(),
                    Some(ParamValue::Text(s)) => s.clone(),
                    _ => String::new(),
                },
            }),
        }
    }
    views
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinView {
    pub pin: PinRef,
    pub center: Point,
    pub data_type: DataType,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub id: BlockId,
    pub kind: String,
    /// Plots show no name.
    pub name: Option<String>,
    pub units: Option<String>,
    pub rect: Rect,
    pub value: DisplayValue,
    pub inputs: Vec<PinView>,
    pub outputs: Vec<PinView>,
    pub params: Vec<ParamView>,
    pub can_rename: bool,
}

impl BlockView {
    pub fn new(block: &Block) -> Self {
        let layout = layout_block(block);
        let pin_views = |dir_inputs: bool| -> Vec<PinView> {
            let (pins, centers) = if dir_inputs {
                (&block.inputs, &layout.inputs)
            } else {
                (&block.outputs, &layout.outputs)
            };
            pins.iter()
                .zip(centers)
                .enumerate()
                .map(|(i, (pin, center))| PinView {
                    pin: if dir_inputs {
                        PinRef::input(block.id, i)
                    } else {
                        PinRef::output(block.id, i)
                    },
                    center: *center,
                    data_type: pin.data_type,
                    connected: pin.is_connected(),
                })
                .collect()
        };

        Self {
            id: block.id,
            kind: block.kind.type_name().to_string(),
            name: (!matches!(block.kind, BlockKind::Plot)).then(|| block.name.clone()),
            units: display_units(block),
            rect: layout.rect,
            value: display_value(block),
            inputs: pin_views(true),
            outputs: pin_views(false),
            params: param_views(block),
            can_rename: block.kind.allows_rename(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionView {
    pub source: PinRef,
    pub dest: PinRef,
    pub from: Point,
    pub to: Point,
}

/// Everything the presentation layer needs to draw the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub name: String,
    pub displayed_name: String,
    pub blocks: Vec<BlockView>,
    pub connections: Vec<ConnectionView>,
    /// Connection being drawn: pin center to pointer.
    pub transient: Option<(Point, Point)>,
    pub save_status: SaveStatus,
    pub running: bool,
    pub can_undo: bool,
}

impl Projection {
    /// Project the diagram. Editor state fields start out idle.
    pub fn new(diagram: &Diagram, info: &ProgramInfo) -> Self {
        let layouts = layouts(diagram);
        let connections = diagram
            .connections()
            .into_iter()
            .filter_map(|(source, dest)| {
                Some(ConnectionView {
                    source,
                    dest,
                    from: layouts.get(&source.block)?.pin_center(source)?,
                    to: layouts.get(&dest.block)?.pin_center(dest)?,
                })
            })
            .collect();

        Self {
            name: info.name.clone(),
            displayed_name: info.displayed_name.clone(),
            blocks: diagram.blocks().iter().map(BlockView::new).collect(),
            connections,
            transient: None,
            save_status: SaveStatus::Idle,
            running: false,
            can_undo: false,
        }
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockView> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

fn layouts(diagram: &Diagram) -> HashMap<BlockId, BlockLayout> {
    diagram
        .blocks()
        .iter()
        .map(|b| (b.id, layout_block(b)))
        .collect()
}

/// Center of a pin on the canvas.
pub fn pin_center(diagram: &Diagram, pin: PinRef) -> Option<Point> {
    layout_block(diagram.find_block(pin.block)?).pin_center(pin)
}

fn distance(a: Point, b: Point) -> Real {
    (a.x - b.x).hypot(a.y - b.y)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> Real {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    distance(p, Point::new(a.x + t * dx, a.y + t * dy))
}

/// Element under a canvas point.
///
/// Pins win over block bodies, block bodies over connections. Among
/// overlapping blocks the last drawn (topmost) wins.
pub fn hit_test(diagram: &Diagram, point: Point, pin_radius: Real) -> Option<PointerTarget> {
    let laid_out: Vec<(&Block, BlockLayout)> = diagram
        .blocks()
        .iter()
        .map(|b| (b, layout_block(b)))
        .collect();

    for (block, layout) in laid_out.iter().rev() {
        let inputs = layout
            .inputs
            .iter()
            .enumerate()
            .map(|(i, c)| (PinRef::input(block.id, i), *c));
        let outputs = layout
            .outputs
            .iter()
            .enumerate()
            .map(|(i, c)| (PinRef::output(block.id, i), *c));
        if let Some((pin, _)) = inputs
            .chain(outputs)
            .find(|(_, c)| distance(*c, point) <= pin_radius)
        {
            return Some(PointerTarget::Pin(pin));
        }
    }

    if let Some((block, _)) = laid_out
        .iter()
        .rev()
        .find(|(_, layout)| layout.rect.contains(point))
    {
        return Some(PointerTarget::Block(block.id));
    }

    let by_id: HashMap<BlockId, &BlockLayout> =
        laid_out.iter().map(|(b, l)| (b.id, l)).collect();
    diagram.connections().into_iter().find_map(|(source, dest)| {
        let from = by_id.get(&source.block)?.pin_center(source)?;
        let to = by_id.get(&dest.block)?.pin_center(dest)?;
        (distance_to_segment(point, from, to) <= CONNECTION_HIT_DISTANCE)
            .then_some(PointerTarget::Connection(dest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fl_graph::{BlockTemplate, DeviceType};

    fn placed(d: &mut Diagram, t: BlockTemplate, x: Real, y: Real) -> BlockId {
        let id = d.add_block(t).unwrap();
        d.set_position(id, Point::new(x, y)).unwrap();
        id
    }

    #[test]
    fn pin_layouts() {
        let mut d = Diagram::new();
        let plus = placed(&mut d, BlockTemplate::filter(FilterKind::Plus), 0.0, 0.0);
        let layout = layout_block(d.find_block(plus).unwrap());
        assert_eq!(layout.inputs, vec![Point::new(0.0, 10.0), Point::new(0.0, 90.0)]);
        assert_eq!(layout.outputs, vec![Point::new(204.0, 50.0)]);

        let relay = placed(&mut d, BlockTemplate::relay(), 300.0, 0.0);
        let layout = layout_block(d.find_block(relay).unwrap());
        assert_eq!(layout.inputs, vec![Point::new(296.0, 50.0)]);
    }

    #[test]
    fn data_storage_grows_with_inputs() {
        let mut d = Diagram::new();
        let a = placed(&mut d, BlockTemplate::number_entry(), 0.0, 0.0);
        let ds = placed(&mut d, BlockTemplate::data_storage("p"), 400.0, 0.0);
        d.connect(PinRef::output(a, 0), PinRef::input(ds, 0)).unwrap();
        d.reconcile_data_storage();
        let layout = layout_block(d.find_block(ds).unwrap());
        assert_eq!(layout.rect.h, 178.0);
        assert_eq!(layout.inputs[1], Point::new(396.0, 160.0));
    }

    #[test]
    fn display_strings() {
        let mut d = Diagram::new();
        let temp = d
            .add_block(BlockTemplate::device(DeviceType::new("temperature")))
            .unwrap();
        let relay = d.add_block(BlockTemplate::relay()).unwrap();
        let block = d.find_block(temp).unwrap();
        assert_eq!(display_value(block), DisplayValue::Text("...".into()));
        assert_eq!(display_units(block).as_deref(), Some("\u{b0}C"));

        d.set_value(temp, Some(Value::Number(1234.5678))).unwrap();
        assert_eq!(
            display_value(d.find_block(temp).unwrap()),
            DisplayValue::Text("1234.6".into())
        );
        assert_eq!(
            display_value(d.find_block(relay).unwrap()),
            DisplayValue::Text("off".into())
        );
        d.set_value(relay, Some(Value::Number(1.0))).unwrap();
        assert_eq!(
            display_value(d.find_block(relay).unwrap()),
            DisplayValue::Text("on".into())
        );
    }

    #[test]
    fn hit_test_priorities() {
        let mut d = Diagram::new();
        let a = placed(&mut d, BlockTemplate::number_entry(), 0.0, 0.0);
        let b = placed(&mut d, BlockTemplate::plot(), 100.0, 20.0);
        let c = placed(&mut d, BlockTemplate::relay(), 600.0, 0.0);
        d.connect(PinRef::output(a, 0), PinRef::input(c, 0)).unwrap();

        // Output pin of `a` lies inside the plot body; the pin wins
        assert_eq!(
            hit_test(&d, Point::new(204.0, 50.0), 10.0),
            Some(PointerTarget::Pin(PinRef::output(a, 0)))
        );
        // Overlap of both bodies: the plot was drawn last
        assert_eq!(
            hit_test(&d, Point::new(150.0, 80.0), 10.0),
            Some(PointerTarget::Block(b))
        );
        // The connection runs along y = 50 to the relay's input
        assert_eq!(
            hit_test(&d, Point::new(500.0, 52.0), 10.0),
            Some(PointerTarget::Connection(PinRef::input(c, 0)))
        );
        assert_eq!(hit_test(&d, Point::new(500.0, 300.0), 10.0), None);
    }

    #[test]
    fn projection_lists_connections() {
        let mut d = Diagram::new();
        let t = d.add_block(BlockTemplate::timer()).unwrap();
        let p = d.add_block(BlockTemplate::plot()).unwrap();
        d.connect(PinRef::output(t, 0), PinRef::input(p, 0)).unwrap();
        let proj = Projection::new(&d, &ProgramInfo::default());
        assert_eq!(proj.blocks.len(), 2);
        assert_eq!(proj.connections.len(), 1);
        assert_eq!(
            Some(proj.connections[0].from),
            pin_center(&d, PinRef::output(t, 0))
        );
        assert_eq!(proj.block(p).unwrap().name, None);
        let timer = proj.block(t).unwrap();
        assert_eq!(timer.params[0].label, "seconds on");
        assert_eq!(timer.params[0].text, "5");
    }
}
