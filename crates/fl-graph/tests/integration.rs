//! Integration tests for fl-graph.

use fl_graph::{
    BlockKind, BlockTemplate, DeviceType, Diagram, FilterKind, GraphError, PinRef,
};
use proptest::prelude::*;

#[test]
fn timer_to_plot() {
    let mut d = Diagram::new();
    let timer = d.add_block(BlockTemplate::timer()).unwrap();
    let plot = d.add_block(BlockTemplate::plot()).unwrap();
    d.connect(PinRef::output(timer, 0), PinRef::input(plot, 0))
        .unwrap();

    assert_eq!(d.len(), 2);
    assert_eq!(
        d.connections(),
        vec![(PinRef::output(timer, 0), PinRef::input(plot, 0))]
    );
}

#[test]
fn sensor_chain_through_filters() {
    // temperature -> absolute value -> plus <- number
    let mut d = Diagram::new();
    let temp = d
        .add_block(BlockTemplate::device(DeviceType::new("temperature")))
        .unwrap();
    let abs = d
        .add_block(BlockTemplate::filter(FilterKind::AbsoluteValue))
        .unwrap();
    let num = d.add_block(BlockTemplate::number_entry()).unwrap();
    let plus = d.add_block(BlockTemplate::filter(FilterKind::Plus)).unwrap();

    d.connect(PinRef::output(temp, 0), PinRef::input(abs, 0)).unwrap();
    d.connect(PinRef::output(abs, 0), PinRef::input(plus, 0)).unwrap();
    d.connect(PinRef::input(plus, 1), PinRef::output(num, 0)).unwrap();

    let order = d.evaluation_order().unwrap();
    let pos = |id| order.iter().position(|x| *x == id).unwrap();
    assert!(pos(temp) < pos(abs));
    assert!(pos(abs) < pos(plus));
    assert!(pos(num) < pos(plus));

    let mut dests = d.find_dest_pins(abs);
    dests.sort();
    assert_eq!(dests, vec![PinRef::input(plus, 0)]);
}

#[test]
fn data_storage_tracks_many_sources() {
    let mut d = Diagram::new();
    let ds = d.add_block(BlockTemplate::data_storage("lab")).unwrap();
    let sources: Vec<_> = ["temperature", "humidity", "light", "temperature"]
        .into_iter()
        .map(|t| d.add_block(BlockTemplate::device(DeviceType::new(t))).unwrap())
        .collect();

    for (i, src) in sources.iter().enumerate() {
        d.connect(PinRef::output(*src, 0), PinRef::input(ds, i))
            .unwrap();
        d.reconcile_data_storage();
    }

    let block = d.find_block(ds).unwrap();
    assert_eq!(block.inputs.len(), sources.len() + 1);
    assert_eq!(block.connected_inputs(), sources.len());
    let labels = block
        .param(fl_graph::SEQUENCE_NAMES)
        .and_then(|p| p.value.as_ref())
        .and_then(|v| v.as_map())
        .unwrap();
    assert_eq!(labels.len(), sources.len());
    let mut values: Vec<_> = labels.values().cloned().collect();
    values.sort();
    values.dedup();
    assert_eq!(values.len(), sources.len());
}

#[test]
fn duplicate_link_to_data_storage_rejected() {
    let mut d = Diagram::new();
    let ds = d.add_block(BlockTemplate::data_storage("lab")).unwrap();
    let n = d.add_block(BlockTemplate::number_entry()).unwrap();
    d.connect(PinRef::output(n, 0), PinRef::input(ds, 0)).unwrap();
    d.reconcile_data_storage();
    let err = d
        .connect(PinRef::output(n, 0), PinRef::input(ds, 1))
        .unwrap_err();
    assert!(matches!(err, GraphError::DuplicateStorageLink { .. }));
}

#[test]
fn removing_a_source_nulls_downstream_link() {
    let mut d = Diagram::new();
    let t = d.add_block(BlockTemplate::timer()).unwrap();
    let relay = d.add_block(BlockTemplate::relay()).unwrap();
    d.connect(PinRef::output(t, 0), PinRef::input(relay, 0)).unwrap();
    d.remove_block(t).unwrap();
    assert!(d.find_block(relay).unwrap().inputs[0].source.is_none());
    assert_eq!(d.find_block(relay).unwrap().kind, BlockKind::Relay);
    assert_eq!(d.remove_block(t), Err(GraphError::BlockNotFound(t)));
}

fn template(choice: u8) -> BlockTemplate {
    match choice % 5 {
        0 => BlockTemplate::number_entry(),
        1 => BlockTemplate::filter(FilterKind::Plus),
        2 => BlockTemplate::filter(FilterKind::Not),
        3 => BlockTemplate::plot(),
        _ => BlockTemplate::timer(),
    }
}

proptest! {
    #[test]
    fn connect_never_admits_a_cycle(
        kinds in prop::collection::vec(any::<u8>(), 1..12),
        edges in prop::collection::vec((any::<usize>(), any::<usize>(), 0usize..2), 0..40),
    ) {
        let mut d = Diagram::new();
        let ids: Vec<_> = kinds
            .into_iter()
            .map(|k| d.add_block(template(k)).unwrap())
            .collect();

        for (from, to, pin) in edges {
            let a = ids[from % ids.len()];
            let b = ids[to % ids.len()];
            let _ = d.connect(PinRef::output(a, 0), PinRef::input(b, pin));
        }

        let order = d.evaluation_order();
        prop_assert!(order.is_ok());
        prop_assert_eq!(order.unwrap().len(), d.len());
        for (src, dest) in d.connections() {
            prop_assert!(d.find_dest_pins(src.block).contains(&dest));
        }
    }
}
