use mesh_rowgraph::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum GraphOp {
    Append { row: usize, value: u32 },
    SetRowLen { row: usize, len: usize },
    SetRow { row: usize, values: Vec<u32> },
    Compact,
}

fn graph_op(rows: usize) -> impl Strategy<Value = GraphOp> {
    prop_oneof![
        (0..rows, any::<u32>()).prop_map(|(row, value)| GraphOp::Append { row, value }),
        (0..rows, 0..12usize).prop_map(|(row, len)| GraphOp::SetRowLen { row, len }),
        (0..rows, proptest::collection::vec(any::<u32>(), 0..8))
            .prop_map(|(row, values)| GraphOp::SetRow { row, values }),
        Just(GraphOp::Compact),
    ]
}

proptest! {
    #[test]
    fn graph_matches_a_vec_of_vec_model(
        ops in proptest::collection::vec(graph_op(6), 0..60)
    ) {
        let mut g = VarWidthGraph::with_row_count(6);
        let mut model: Vec<Vec<u32>> = vec![Vec::new(); 6];
        for op in ops {
            match op {
                GraphOp::Append { row, value } => {
                    g.append(row, value);
                    model[row].push(value);
                }
                GraphOp::SetRowLen { row, len } => {
                    g.set_row_len(row, len);
                    model[row].resize(len, 0);
                }
                GraphOp::SetRow { row, values } => {
                    g.set_row(row, &values);
                    model[row] = values;
                }
                GraphOp::Compact => g.compact(),
            }
            prop_assert!(g.validate_invariants().is_ok());
        }
        prop_assert_eq!(g.row_count(), 6);
        for r in 0..6 {
            prop_assert_eq!(g.row(r).to_vec(), model[r].clone());
        }
        prop_assert_eq!(g.element_count(), model.iter().map(Vec::len).sum::<usize>());
    }
}

/// Chunk capacity used by the list model below.
const CHUNK: usize = 8;

/// Mirror of the list's physical behavior: shrinking drops whole chunks,
/// and cells inside the last retained chunk keep their bytes.
#[derive(Debug, Default)]
struct VecModel {
    cells: Vec<u32>,
    len: usize,
}

impl VecModel {
    fn trim(&mut self) {
        self.cells.truncate(self.len.div_ceil(CHUNK) * CHUNK);
    }

    fn push(&mut self, v: u32) {
        if self.len < self.cells.len() {
            self.cells[self.len] = v;
        } else {
            self.cells.push(v);
        }
        self.len += 1;
    }

    fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let v = self.cells[self.len];
        self.trim();
        Some(v)
    }

    fn swap_remove(&mut self, i: usize) -> u32 {
        let tail = self.cells[self.len - 1];
        let v = std::mem::replace(&mut self.cells[i], tail);
        self.len -= 1;
        self.trim();
        v
    }

    fn resize(&mut self, n: usize) {
        if n > self.len {
            while self.cells.len() < n {
                self.cells.push(0);
            }
        }
        self.len = n;
        self.trim();
    }

    fn fill(&mut self, v: u32) {
        for cell in &mut self.cells[..self.len] {
            *cell = v;
        }
    }

    fn live(&self) -> &[u32] {
        &self.cells[..self.len]
    }
}

#[derive(Debug, Clone)]
enum ListOp {
    Push(u32),
    Pop,
    SwapRemove(usize),
    Resize(usize),
    Fill(u32),
}

fn list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        any::<u32>().prop_map(ListOp::Push),
        Just(ListOp::Pop),
        (0..64usize).prop_map(ListOp::SwapRemove),
        (0..40usize).prop_map(ListOp::Resize),
        any::<u32>().prop_map(ListOp::Fill),
    ]
}

proptest! {
    #[test]
    fn chunked_list_matches_a_vec_model(
        ops in proptest::collection::vec(list_op(), 0..80)
    ) {
        let mut list: ChunkedList<u32> = ChunkedList::with_chunk_size(CHUNK);
        let mut model = VecModel::default();
        for op in ops {
            match op {
                ListOp::Push(v) => {
                    list.push(v);
                    model.push(v);
                }
                ListOp::Pop => {
                    prop_assert_eq!(list.pop(), model.pop());
                }
                ListOp::SwapRemove(i) => {
                    if model.len == 0 {
                        prop_assert!(list.try_swap_remove(i).is_err());
                    } else {
                        let i = i % model.len;
                        prop_assert_eq!(list.swap_remove(i), model.swap_remove(i));
                    }
                }
                ListOp::Resize(n) => {
                    list.resize(n);
                    model.resize(n);
                }
                ListOp::Fill(v) => {
                    list.fill(v);
                    model.fill(v);
                }
            }
            prop_assert!(list.validate_invariants().is_ok());
        }
        prop_assert_eq!(list.len(), model.len);
        prop_assert!(list.iter().eq(model.live().iter()));
    }
}
