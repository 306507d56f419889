//! Text and raw binary forms for lists and graphs.
//!
//! The text form is a whitespace-insensitive token grammar: an element
//! count followed by the parenthesized elements, `3(10 20 30)`. Counts of
//! fifteen and above switch to a long form with one element per line. A
//! plain list may abbreviate `N` equal elements as `N(v)`; graph rows never
//! do, their declared lengths are binding. The binary form writes `u64`
//! counts and raw element bytes in host order, chunk by chunk.

use std::fmt;
use std::io::{BufRead, Read, Write};
use std::str::FromStr;

use bytemuck::Pod;
use itertools::Itertools;

use crate::error::{GraphError, ReadError};
use crate::graph::{FixedWidthGraph, VarWidthGraph};
use crate::storage::ChunkedList;

/// On-stream representation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFormat {
    Ascii,
    Binary,
}

/// Counts below this print on one line.
const SHORT_FORM_MAX: usize = 15;

/// Whitespace-separated token reader that treats each parenthesis as its
/// own token.
struct TokenStream<'r, R: BufRead> {
    reader: &'r mut R,
    /// Bytes consumed so far, for error positions.
    at: usize,
}

impl<'r, R: BufRead> TokenStream<'r, R> {
    fn new(reader: &'r mut R) -> Self {
        Self { reader, at: 0 }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, ReadError> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.at += 1;
    }

    fn next_token(&mut self) -> Result<Option<String>, ReadError> {
        loop {
            match self.peek_byte()? {
                None => return Ok(None),
                Some(b) if b.is_ascii_whitespace() => self.bump(),
                Some(b @ (b'(' | b')')) => {
                    self.bump();
                    return Ok(Some((b as char).to_string()));
                }
                Some(_) => break,
            }
        }
        let mut token = String::new();
        while let Some(b) = self.peek_byte()? {
            if b.is_ascii_whitespace() || b == b'(' || b == b')' {
                break;
            }
            self.bump();
            token.push(b as char);
        }
        Ok(Some(token))
    }

    fn expect_token(&mut self, expected: &'static str) -> Result<String, ReadError> {
        match self.next_token()? {
            Some(t) => Ok(t),
            None => Err(ReadError::Parse {
                expected,
                found: "end of input".into(),
                at: self.at,
            }),
        }
    }

    fn expect(&mut self, expected: &'static str) -> Result<(), ReadError> {
        let t = self.expect_token(expected)?;
        if t == expected {
            Ok(())
        } else {
            Err(ReadError::Parse {
                expected,
                found: t,
                at: self.at,
            })
        }
    }

    fn number<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ReadError> {
        let t = self.expect_token(expected)?;
        t.parse().map_err(|_| ReadError::Parse {
            expected,
            found: t,
            at: self.at,
        })
    }
}

fn read_u64<R: Read>(input: &mut R) -> Result<usize, ReadError> {
    let mut word = [0u8; 8];
    input.read_exact(&mut word)?;
    Ok(u64::from_ne_bytes(word) as usize)
}

fn write_u64<W: Write>(out: &mut W, value: usize) -> std::io::Result<()> {
    out.write_all(bytemuck::bytes_of(&(value as u64)))
}

fn write_list_ascii<W, T, I>(out: &mut W, len: usize, elems: I) -> std::io::Result<()>
where
    W: Write,
    T: fmt::Display,
    I: Iterator<Item = T>,
{
    if len < SHORT_FORM_MAX {
        writeln!(out, "{len}({})", elems.format(" "))
    } else {
        writeln!(out, "{len}\n(")?;
        for e in elems {
            writeln!(out, "{e}")?;
        }
        writeln!(out, ")")
    }
}

/// Parses one `N(...)` list, expanding the uniform `N(v)` abbreviation.
fn read_list_ascii<T, R>(tokens: &mut TokenStream<'_, R>) -> Result<Vec<T>, ReadError>
where
    T: FromStr + Clone,
    R: BufRead,
{
    let count: usize = tokens.number("element count")?;
    tokens.expect("(")?;
    let mut elems = Vec::with_capacity(count.min(4096));
    loop {
        let t = tokens.expect_token("element or `)`")?;
        if t == ")" {
            break;
        }
        if t == "(" {
            return Err(ReadError::Parse {
                expected: "element or `)`",
                found: t,
                at: tokens.at,
            });
        }
        let v = t.parse().map_err(|_| ReadError::Parse {
            expected: "element",
            found: t,
            at: tokens.at,
        })?;
        elems.push(v);
    }
    if elems.len() == count {
        Ok(elems)
    } else if count > 1 && elems.len() == 1 {
        let v = elems.remove(0);
        Ok(vec![v; count])
    } else {
        Err(ReadError::Parse {
            expected: "as many elements as declared",
            found: format!("{} of {}", elems.len(), count),
            at: tokens.at,
        })
    }
}

impl<T: fmt::Display> ChunkedList<T> {
    /// Writes the list in the text form.
    pub fn write_ascii<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write_list_ascii(out, self.len(), self.iter())
    }
}

impl<T: Clone + Default + FromStr> ChunkedList<T> {
    /// Replaces the contents with one list parsed from `input`.
    pub fn read_ascii<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let mut tokens = TokenStream::new(input);
        let elems = read_list_ascii(&mut tokens)?;
        self.clear();
        self.extend(elems);
        Ok(())
    }

    /// Parses one more list from `input` and appends its elements.
    pub fn read_ascii_more<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let mut tokens = TokenStream::new(input);
        let elems = read_list_ascii(&mut tokens)?;
        self.extend(elems);
        Ok(())
    }
}

impl<T: Pod> ChunkedList<T> {
    /// Writes the element count and the raw element bytes.
    pub fn write_binary<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write_u64(out, self.len())?;
        for chunk in self.live_chunks() {
            out.write_all(bytemuck::cast_slice(chunk))?;
        }
        Ok(())
    }
}

impl<T: Pod + Default> ChunkedList<T> {
    /// Replaces the contents with one binary list read from `input`.
    pub fn read_binary<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let count = read_u64(input)?;
        self.clear();
        self.resize(count);
        for chunk in self.live_chunks_mut() {
            input.read_exact(bytemuck::cast_slice_mut(chunk))?;
        }
        Ok(())
    }
}

impl<T: Default + fmt::Display + FromStr + Pod> ChunkedList<T> {
    pub fn write<W: Write>(&self, format: IoFormat, out: &mut W) -> std::io::Result<()> {
        match format {
            IoFormat::Ascii => self.write_ascii(out),
            IoFormat::Binary => self.write_binary(out),
        }
    }

    pub fn read<R: BufRead>(&mut self, format: IoFormat, input: &mut R) -> Result<(), ReadError> {
        match format {
            IoFormat::Ascii => self.read_ascii(input),
            IoFormat::Binary => self.read_binary(input),
        }
    }
}

impl VarWidthGraph {
    /// Writes the graph as a row count and one `len(...)` list per row.
    pub fn write_ascii<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}\n(", self.row_count())?;
        for row in self.rows() {
            writeln!(out, "{}({})", row.len(), row.iter().format(" "))?;
        }
        writeln!(out, ")")
    }

    /// Replaces the contents with one graph parsed from `input`.
    ///
    /// Every row must hold exactly as many elements as it declares; the
    /// uniform-value abbreviation does not apply to rows.
    pub fn read_ascii<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let mut tokens = TokenStream::new(input);
        let n: usize = tokens.number("row count")?;
        tokens.expect("(")?;
        let mut rows: Vec<Vec<u32>> = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            let len: usize = tokens.number("row length")?;
            tokens.expect("(")?;
            let mut row = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                row.push(tokens.number("row element")?);
            }
            tokens.expect(")")?;
            rows.push(row);
        }
        tokens.expect(")")?;
        *self = Self::from_rows(rows);
        Ok(())
    }

    /// Writes the row count, all row lengths, then the packed row payloads.
    ///
    /// Vacant cells never reach the stream.
    pub fn write_binary<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write_u64(out, self.row_count())?;
        for row in self.rows() {
            write_u64(out, row.len())?;
        }
        let mut buf: Vec<u32> = Vec::new();
        for row in self.rows() {
            buf.clear();
            buf.extend(row.iter());
            out.write_all(bytemuck::cast_slice(&buf))?;
        }
        Ok(())
    }

    /// Replaces the contents with one binary graph read from `input`.
    pub fn read_binary<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let n = read_u64(input)?;
        let mut widths = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            widths.push(read_u64(input)?);
        }
        self.set_row_count_and_widths(&widths);
        let mut buf: Vec<u32> = Vec::new();
        for (r, &w) in widths.iter().enumerate() {
            buf.clear();
            buf.resize(w, 0);
            input.read_exact(bytemuck::cast_slice_mut(&mut buf))?;
            for (c, &v) in buf.iter().enumerate() {
                self.set(r, c, v);
            }
        }
        Ok(())
    }

    pub fn write<W: Write>(&self, format: IoFormat, out: &mut W) -> std::io::Result<()> {
        match format {
            IoFormat::Ascii => self.write_ascii(out),
            IoFormat::Binary => self.write_binary(out),
        }
    }

    pub fn read<R: BufRead>(&mut self, format: IoFormat, input: &mut R) -> Result<(), ReadError> {
        match format {
            IoFormat::Ascii => self.read_ascii(input),
            IoFormat::Binary => self.read_binary(input),
        }
    }
}

impl<T: fmt::Display, const W: usize> FixedWidthGraph<T, W> {
    /// Writes the graph as a row count and one `W(...)` list per row.
    pub fn write_ascii<Out: Write>(&self, out: &mut Out) -> std::io::Result<()> {
        writeln!(out, "{}\n(", self.row_count())?;
        for r in 0..self.row_count() {
            writeln!(out, "{}({})", W, self.row_iter(r).format(" "))?;
        }
        writeln!(out, ")")
    }
}

impl<T: Clone + Default + FromStr, const W: usize> FixedWidthGraph<T, W> {
    /// Replaces the contents with one graph parsed from `input`.
    ///
    /// Every row must declare exactly the compile-time width.
    pub fn read_ascii<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let mut tokens = TokenStream::new(input);
        let n: usize = tokens.number("row count")?;
        tokens.expect("(")?;
        self.clear();
        self.set_row_count(n);
        for r in 0..n {
            let w: usize = tokens.number("row width")?;
            if w != W {
                return Err(ReadError::Graph(GraphError::ShapeMismatch {
                    op: "read_ascii",
                    expected: W,
                    found: w,
                }));
            }
            tokens.expect("(")?;
            for c in 0..W {
                let v: T = tokens.number("row element")?;
                self.set(r, c, v);
            }
            tokens.expect(")")?;
        }
        tokens.expect(")")?;
        Ok(())
    }
}

impl<T: Pod, const W: usize> FixedWidthGraph<T, W> {
    /// Writes the row count, then the backing list.
    pub fn write_binary<Out: Write>(&self, out: &mut Out) -> std::io::Result<()> {
        write_u64(out, self.row_count())?;
        self.cells().write_binary(out)
    }
}

impl<T: Pod + Default, const W: usize> FixedWidthGraph<T, W> {
    /// Replaces the contents with one binary graph read from `input`.
    pub fn read_binary<R: BufRead>(&mut self, input: &mut R) -> Result<(), ReadError> {
        let n = read_u64(input)?;
        self.cells_mut().read_binary(input)?;
        if self.element_count() != n * W {
            return Err(ReadError::Graph(GraphError::ShapeMismatch {
                op: "read_binary",
                expected: n * W,
                found: self.element_count(),
            }));
        }
        Ok(())
    }
}

impl<T: Default + fmt::Display + FromStr + Pod, const W: usize> FixedWidthGraph<T, W> {
    pub fn write<Out: Write>(&self, format: IoFormat, out: &mut Out) -> std::io::Result<()> {
        match format {
            IoFormat::Ascii => self.write_ascii(out),
            IoFormat::Binary => self.write_binary(out),
        }
    }

    pub fn read<R: BufRead>(&mut self, format: IoFormat, input: &mut R) -> Result<(), ReadError> {
        match format {
            IoFormat::Ascii => self.read_ascii(input),
            IoFormat::Binary => self.read_binary(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_list(text: &str) -> Result<Vec<u32>, ReadError> {
        let mut input = text.as_bytes();
        let mut list: ChunkedList<u32> = ChunkedList::new();
        list.read_ascii(&mut input)?;
        Ok(list.iter().copied().collect())
    }

    #[test]
    fn short_lists_stay_on_one_line() {
        let list: ChunkedList<u32> = vec![10, 20, 30].into();
        let mut out = Vec::new();
        list.write_ascii(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3(10 20 30)\n");
    }

    #[test]
    fn long_lists_break_across_lines() {
        let list: ChunkedList<u32> = (0..15).collect();
        let mut out = Vec::new();
        list.write_ascii(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("15\n(\n0\n1\n"));
        assert!(text.ends_with("14\n)\n"));
        assert_eq!(parse_list(&text).unwrap(), (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn uniform_abbreviation_expands() {
        assert_eq!(parse_list("4(7)").unwrap(), vec![7, 7, 7, 7]);
        assert_eq!(parse_list("1(7)").unwrap(), vec![7]);
        assert_eq!(parse_list("0()").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn element_count_mismatch_is_rejected() {
        let err = parse_list("3(1 2)").unwrap_err();
        assert!(matches!(err, ReadError::Parse { expected, .. }
            if expected == "as many elements as declared"));
    }

    #[test]
    fn junk_tokens_are_rejected_with_position() {
        let err = parse_list("3(1 x 3)").unwrap_err();
        match err {
            ReadError::Parse { expected, found, at } => {
                assert_eq!(expected, "element");
                assert_eq!(found, "x");
                assert_eq!(at, 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn truncated_input_reports_end_of_input() {
        let err = parse_list("3(1 2").unwrap_err();
        assert!(matches!(err, ReadError::Parse { found, .. } if found == "end of input"));
    }

    #[test]
    fn rows_never_expand_the_uniform_form() {
        let mut g = VarWidthGraph::new();
        let mut input = "1\n(\n3(5)\n)\n".as_bytes();
        assert!(g.read_ascii(&mut input).is_err());
    }

    #[test]
    fn graph_text_round_trip() {
        let g = VarWidthGraph::from_rows(vec![vec![4, 7], vec![], vec![9]]);
        let mut out = Vec::new();
        g.write_ascii(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out.clone()).unwrap(),
            "3\n(\n2(4 7)\n0()\n1(9)\n)\n"
        );
        let mut back = VarWidthGraph::new();
        let mut input = &out[..];
        back.read_ascii(&mut input).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn graph_binary_round_trip_drops_holes() {
        let mut g = VarWidthGraph::with_row_count(2);
        g.append(0, 1);
        g.append(1, 2);
        g.append(0, 3);
        assert!(g.vacant_cells() > 0);
        let mut out = Vec::new();
        g.write_binary(&mut out).unwrap();
        assert_eq!(out.len(), 8 + 2 * 8 + 3 * 4);
        let mut back = VarWidthGraph::new();
        let mut input = &out[..];
        back.read_binary(&mut input).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.vacant_cells(), 0);
    }

    #[test]
    fn fixed_graph_both_formats() {
        let g = FixedWidthGraph::<u32, 3>::from_rows(&[[1, 2, 3], [4, 5, 6]]);
        let mut out = Vec::new();
        g.write(IoFormat::Ascii, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2\n(\n3(1 2 3)\n3(4 5 6)\n)\n"
        );
        let mut out = Vec::new();
        g.write(IoFormat::Binary, &mut out).unwrap();
        let mut back = FixedWidthGraph::<u32, 3>::new();
        let mut input = &out[..];
        back.read(IoFormat::Binary, &mut input).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn fixed_graph_rejects_foreign_width() {
        let mut g = FixedWidthGraph::<u32, 2>::new();
        let mut input = "1\n(\n3(1 2 3)\n)\n".as_bytes();
        let err = g.read_ascii(&mut input).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Graph(GraphError::ShapeMismatch {
                op: "read_ascii",
                expected: 2,
                found: 3,
            })
        ));
    }
}
