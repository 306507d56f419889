use mesh_rowgraph::prelude::*;

#[test]
fn list_survives_both_formats() {
    let list: ChunkedList<u32> = (0..40).collect();
    for format in [IoFormat::Ascii, IoFormat::Binary] {
        let mut out = Vec::new();
        list.write(format, &mut out).unwrap();
        let mut back: ChunkedList<u32> = ChunkedList::new();
        back.read(format, &mut &out[..]).unwrap();
        assert_eq!(back, list);
    }
}

#[test]
fn graph_with_vacant_rows_survives_both_formats() {
    let mut g = VarWidthGraph::from_rows(vec![vec![], vec![42], vec![], vec![7, 8]]);
    g.set_row_len(3, 1);
    for format in [IoFormat::Ascii, IoFormat::Binary] {
        let mut out = Vec::new();
        g.write(format, &mut out).unwrap();
        let mut back = VarWidthGraph::new();
        back.read(format, &mut &out[..]).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.row_len(0), 0);
        assert_eq!(back.row(1).to_vec(), vec![42]);
    }
}

#[test]
fn whitespace_layout_is_free_form() {
    let text = "3 ( 2 ( 4 7 )\n\t0 ( )\n 1 ( 9 ) )";
    let mut g = VarWidthGraph::new();
    g.read_ascii(&mut text.as_bytes()).unwrap();
    assert_eq!(
        g,
        VarWidthGraph::from_rows(vec![vec![4, 7], vec![], vec![9]])
    );
}

#[test]
fn missing_rows_are_reported_as_parse_errors() {
    let text = "3\n(\n1(1)\n1(2)\n)\n";
    let mut g = VarWidthGraph::new();
    let err = g.read_ascii(&mut text.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        ReadError::Parse { expected: "row length", found, .. } if found == ")"
    ));
}

#[test]
fn truncated_binary_input_is_an_io_error() {
    let g = VarWidthGraph::from_rows(vec![vec![1, 2, 3], vec![4]]);
    let mut out = Vec::new();
    g.write_binary(&mut out).unwrap();
    out.truncate(out.len() - 2);
    let mut back = VarWidthGraph::new();
    let err = back.read_binary(&mut &out[..]).unwrap_err();
    assert!(matches!(err, ReadError::Io(_)));
}

#[test]
fn one_stream_carries_a_list_then_a_graph() {
    let list: ChunkedList<u32> = vec![3, 1, 4].into();
    let graph = VarWidthGraph::from_rows(vec![vec![1], vec![5, 9]]);
    let mut out = Vec::new();
    list.write_ascii(&mut out).unwrap();
    graph.write_ascii(&mut out).unwrap();

    let mut input = &out[..];
    let mut list_back: ChunkedList<u32> = ChunkedList::new();
    list_back.read_ascii(&mut input).unwrap();
    let mut graph_back = VarWidthGraph::new();
    graph_back.read_ascii(&mut input).unwrap();
    assert_eq!(list_back, list);
    assert_eq!(graph_back, graph);
}

#[test]
fn fixed_graph_survives_both_formats() {
    let g = FixedWidthGraph::<u64, 4>::from_rows(&[[1, 2, 3, 4], [5, 6, 7, 8]]);
    for format in [IoFormat::Ascii, IoFormat::Binary] {
        let mut out = Vec::new();
        g.write(format, &mut out).unwrap();
        let mut back = FixedWidthGraph::<u64, 4>::new();
        back.read(format, &mut &out[..]).unwrap();
        assert_eq!(back, g);
    }
}
